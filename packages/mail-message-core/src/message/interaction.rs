//! Click dispatch, reply intent and visibility geometry of a message view.

use crate::content::{Document, NodeId};
use crate::i18n::Catalog;
use crate::quotes::{group_id_of_toggle, GroupId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class of mentions that link to a channel.
pub const CHANNEL_REDIRECT_CLASS: &str = "o_channel_redirect";

/// Model of the profile opened by channel mentions.
pub const CHANNEL_MODEL: &str = "mail.channel";

/// Slack, in pixels, of the partial visibility test.
pub const PARTIAL_VISIBILITY_SLACK: f64 = 5.0;

/// Vertical extent of a rendered box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }
}

/// Whether the bottom of `element` shows inside `parent`, within `offset`.
pub fn is_bottom_visible(element: Option<Rect>, parent: Option<Rect>, offset: f64) -> bool {
    let (Some(el), Some(parent)) = (element, parent) else {
        return false;
    };
    el.bottom < parent.bottom + offset && parent.top < el.bottom + offset
}

/// Whether any part of `element` shows inside `parent`.
pub fn is_partially_visible(element: Rect, parent: Option<Rect>) -> bool {
    let Some(parent) = parent else {
        return false;
    };
    element.top < parent.bottom + PARTIAL_VISIBILITY_SLACK
        && parent.top < element.bottom + PARTIAL_VISIBILITY_SLACK
}

/// Child handlers that may already have consumed a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandledMark {
    AuthorAvatar,
    AuthorName,
    Failure,
}

/// What a click inside the message should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickIntent {
    /// Open the profile of a record; the link's navigation is suppressed
    OpenProfile { model: String, id: i64 },
    /// Flip a quote group
    ToggleQuote(GroupId),
    /// A plain link, left to the host
    FollowLink,
    /// Flip the message's clicked state
    ToggleClicked,
    /// Already handled, or nothing to do
    Ignore,
}

impl ClickIntent {
    /// Whether the host must cancel the default action of the click.
    pub fn prevents_default(&self) -> bool {
        matches!(
            self,
            ClickIntent::OpenProfile { .. } | ClickIntent::ToggleQuote(_)
        )
    }
}

/// Decide what a click on `target` means.
pub fn classify_click(doc: &Document, target: NodeId, handled: &[HandledMark]) -> ClickIntent {
    let Some(element) = doc.element(target) else {
        return toggle_unless_handled(handled);
    };

    let in_channel_redirect = std::iter::successors(Some(target), |&node| doc.parent(node))
        .any(|node| {
            doc.element(node)
                .is_some_and(|e| e.has_class(CHANNEL_REDIRECT_CLASS))
        });
    if in_channel_redirect {
        return match record_id(element.attr("data-oe-id")) {
            Some(id) => ClickIntent::OpenProfile {
                model: CHANNEL_MODEL.to_string(),
                id,
            },
            None => {
                tracing::warn!("Channel mention without a valid data-oe-id");
                ClickIntent::Ignore
            }
        };
    }

    if element.is("a") {
        if let Some(group) = group_id_of_toggle(doc, target) {
            return ClickIntent::ToggleQuote(group);
        }
        return match (record_id(element.attr("data-oe-id")), element.attr("data-oe-model")) {
            (Some(id), Some(model)) if !model.is_empty() => ClickIntent::OpenProfile {
                model: model.to_string(),
                id,
            },
            _ => ClickIntent::FollowLink,
        };
    }

    toggle_unless_handled(handled)
}

fn toggle_unless_handled(handled: &[HandledMark]) -> ClickIntent {
    if handled.is_empty() {
        ClickIntent::ToggleClicked
    } else {
        ClickIntent::Ignore
    }
}

fn record_id(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse().ok()
}

/// Effect of the reply button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyIntent {
    /// Stop replying to the message
    ClearReplyingTo,
    /// Start replying to the message
    ReplyTo,
}

/// The reply button toggles: a message already selected at last render stops
/// being replied to.
pub fn reply_intent(was_selected: bool) -> ReplyIntent {
    if was_selected {
        ReplyIntent::ClearReplyingTo
    } else {
        ReplyIntent::ReplyTo
    }
}

/// Whether the author gets an "Open chat" action.
///
/// There is none without an author, nor when the author already is the
/// correspondent of the thread being viewed.
pub fn has_author_open_chat<T: PartialEq>(author: Option<&T>, correspondent: Option<&T>) -> bool {
    match author {
        None => false,
        Some(author) => correspondent != Some(author),
    }
}

/// Localized title of the author's "Open chat" action, when there is one.
pub fn author_open_chat_title<T: PartialEq>(
    catalog: &Catalog,
    author: Option<&T>,
    correspondent: Option<&T>,
) -> Option<String> {
    has_author_open_chat(author, correspondent).then(|| catalog.t("Open chat"))
}

/// How attachments of the message are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentsDetailsMode {
    #[default]
    Auto,
    Card,
    Hover,
    None,
}

impl FromStr for AttachmentsDetailsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(AttachmentsDetailsMode::Auto),
            "card" => Ok(AttachmentsDetailsMode::Card),
            "hover" => Ok(AttachmentsDetailsMode::Hover),
            "none" => Ok(AttachmentsDetailsMode::None),
            other => Err(Error::InvalidProp(format!(
                "attachmentsDetailsMode must be one of auto, card, hover, none (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for AttachmentsDetailsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttachmentsDetailsMode::Auto => "auto",
            AttachmentsDetailsMode::Card => "card",
            AttachmentsDetailsMode::Hover => "hover",
            AttachmentsDetailsMode::None => "none",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotes::{insert_read_more_less, ReadMoreLabels};

    fn find(doc: &Document, tag: &str) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|&node| doc.element(node).is_some_and(|e| e.is(tag)))
            .unwrap()
    }

    #[test]
    fn test_bottom_visibility() {
        let parent = Some(Rect::new(0.0, 500.0));
        assert!(is_bottom_visible(Some(Rect::new(100.0, 400.0)), parent, 0.0));
        assert!(!is_bottom_visible(Some(Rect::new(100.0, 520.0)), parent, 0.0));
        assert!(is_bottom_visible(Some(Rect::new(100.0, 520.0)), parent, 30.0));
        assert!(!is_bottom_visible(Some(Rect::new(-300.0, -20.0)), parent, 10.0));
        assert!(!is_bottom_visible(None, parent, 0.0));
        assert!(!is_bottom_visible(Some(Rect::new(0.0, 10.0)), None, 0.0));
    }

    #[test]
    fn test_partial_visibility() {
        let parent = Some(Rect::new(100.0, 500.0));
        assert!(is_partially_visible(Rect::new(450.0, 900.0), parent));
        assert!(is_partially_visible(Rect::new(503.0, 900.0), parent));
        assert!(!is_partially_visible(Rect::new(506.0, 900.0), parent));
        assert!(is_partially_visible(Rect::new(0.0, 97.0), parent));
        assert!(!is_partially_visible(Rect::new(0.0, 90.0), parent));
        assert!(!is_partially_visible(Rect::new(0.0, 200.0), None));
    }

    #[test]
    fn test_click_channel_mention() {
        let doc = Document::parse_fragment(
            r##"<a class="o_channel_redirect" data-oe-id="12" href="#">#general</a>"##,
        );
        let intent = classify_click(&doc, find(&doc, "a"), &[]);
        assert_eq!(
            intent,
            ClickIntent::OpenProfile {
                model: "mail.channel".to_string(),
                id: 12
            }
        );
        assert!(intent.prevents_default());
    }

    #[test]
    fn test_click_inside_channel_mention_without_id() {
        let doc = Document::parse_fragment(
            r#"<span class="o_channel_redirect" data-oe-id="3"><b>#general</b></span>"#,
        );
        // The id is read from the clicked element itself
        assert_eq!(classify_click(&doc, find(&doc, "b"), &[]), ClickIntent::Ignore);
    }

    #[test]
    fn test_click_record_link() {
        let doc = Document::parse_fragment(
            r#"<a href="/web" data-oe-id="7" data-oe-model="res.partner">@Demo</a>"#,
        );
        assert_eq!(
            classify_click(&doc, find(&doc, "a"), &[]),
            ClickIntent::OpenProfile {
                model: "res.partner".to_string(),
                id: 7
            }
        );
    }

    #[test]
    fn test_click_plain_link() {
        let doc = Document::parse_fragment(r#"<a href="https://odoo.com" data-oe-id="7">x</a>"#);
        let intent = classify_click(&doc, find(&doc, "a"), &[]);
        assert_eq!(intent, ClickIntent::FollowLink);
        assert!(!intent.prevents_default());
    }

    #[test]
    fn test_click_read_more_toggle() {
        let mut doc = Document::parse_fragment(r#"<p data-o-mail-quote="1">old</p>"#);
        let root = doc.root();
        let groups = insert_read_more_less(&mut doc, root, &ReadMoreLabels::default());

        let intent = classify_click(&doc, groups[0].toggle, &[]);
        assert_eq!(intent, ClickIntent::ToggleQuote(groups[0].id));
        assert!(intent.prevents_default());
    }

    #[test]
    fn test_click_body_toggles_unless_handled() {
        let doc = Document::parse_fragment("<p>hello <b>world</b></p>");
        let bold = find(&doc, "b");
        let text = doc.children(bold)[0];

        assert_eq!(classify_click(&doc, bold, &[]), ClickIntent::ToggleClicked);
        assert_eq!(classify_click(&doc, text, &[]), ClickIntent::ToggleClicked);
        assert_eq!(
            classify_click(&doc, bold, &[HandledMark::AuthorAvatar]),
            ClickIntent::Ignore
        );
        assert_eq!(
            classify_click(&doc, bold, &[HandledMark::Failure]),
            ClickIntent::Ignore
        );
    }

    #[test]
    fn test_reply_intent() {
        assert_eq!(reply_intent(true), ReplyIntent::ClearReplyingTo);
        assert_eq!(reply_intent(false), ReplyIntent::ReplyTo);
    }

    #[test]
    fn test_author_open_chat() {
        let author = "partner-3";
        let other = "partner-4";
        assert!(!has_author_open_chat::<&str>(None, Some(&other)));
        assert!(!has_author_open_chat(Some(&author), Some(&author)));
        assert!(has_author_open_chat(Some(&author), Some(&other)));
        assert!(has_author_open_chat(Some(&author), None));
    }

    #[test]
    fn test_author_open_chat_title() {
        let author = 3;
        let english = Catalog::default();
        assert_eq!(
            author_open_chat_title(&english, Some(&author), None).as_deref(),
            Some("Open chat")
        );
        assert_eq!(author_open_chat_title(&english, Some(&author), Some(&author)), None);
        assert_eq!(author_open_chat_title::<i32>(&english, None, None), None);

        let french = Catalog::load("fr_FR");
        assert_eq!(
            author_open_chat_title(&french, Some(&author), Some(&4)).as_deref(),
            Some("Ouvrir la discussion")
        );
    }

    #[test]
    fn test_attachments_details_mode() {
        assert_eq!(
            "card".parse::<AttachmentsDetailsMode>().unwrap(),
            AttachmentsDetailsMode::Card
        );
        assert_eq!(AttachmentsDetailsMode::default().to_string(), "auto");
        assert!(matches!(
            "grid".parse::<AttachmentsDetailsMode>(),
            Err(Error::InvalidProp(_))
        ));
    }
}
