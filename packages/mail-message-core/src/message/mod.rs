//! Message view driver.
//!
//! [`MessageBody`] keeps the rendered body of one message in sync with the
//! quote collapsing transformer across re-renders.

mod interaction;

pub use interaction::{
    author_open_chat_title, classify_click, has_author_open_chat, is_bottom_visible,
    is_partially_visible, reply_intent, AttachmentsDetailsMode, ClickIntent, HandledMark, Rect,
    ReplyIntent, CHANNEL_MODEL, CHANNEL_REDIRECT_CLASS,
};

use crate::config::Localization;
use crate::content::{Document, NodeId};
use crate::quotes::{
    self, insert_read_more_less, strip_read_more_less, GroupId, QuoteGroup, ReadMoreLabels,
    ToggleClick, ToggleStates,
};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

/// Rendered body of a message with its quote groups.
#[derive(Debug, Clone)]
pub struct MessageBody {
    document: Document,
    last_pretty_body: Option<String>,
    groups: Vec<QuoteGroup>,
    toggles: ToggleStates,
    labels: ReadMoreLabels,
}

impl MessageBody {
    /// Create an empty body using the given toggle labels.
    pub fn new(labels: ReadMoreLabels) -> Self {
        Self {
            document: Document::new(),
            last_pretty_body: None,
            groups: Vec::new(),
            toggles: ToggleStates::new(),
            labels,
        }
    }

    /// Bring the body up to date with `pretty_body`.
    ///
    /// The body is re-parsed only when it changed since the last update.
    /// Toggle controls are always stripped and re-inserted afterwards, so
    /// every group starts collapsed again. Nodes detached by earlier passes
    /// are freed, which invalidates previously returned node ids.
    pub fn update(&mut self, pretty_body: &str) {
        if self.last_pretty_body.as_deref() != Some(pretty_body) {
            self.document = Document::parse_fragment(pretty_body);
            self.last_pretty_body = Some(pretty_body.to_string());
        }
        let root = self.document.root();
        let stripped = strip_read_more_less(&mut self.document, root);
        let freed = self.document.compact();
        self.groups = insert_read_more_less(&mut self.document, root, &self.labels);
        self.toggles.clear();
        tracing::debug!(
            "Message body updated: {} toggles stripped, {} nodes freed, {} groups",
            stripped,
            freed,
            self.groups.len()
        );
    }

    /// Flip a group; `None` when no group has this id.
    pub fn click_toggle(&mut self, group: GroupId) -> Option<ToggleClick> {
        let group = self.groups.iter().find(|g| g.id == group)?;
        Some(quotes::click_toggle(
            &mut self.document,
            group,
            &mut self.toggles,
            &self.labels,
        ))
    }

    /// Dispatch a click on a node of the body.
    ///
    /// Quote toggles are handled in place; every other intent is returned
    /// for the host to act on.
    pub fn handle_click(&mut self, target: NodeId, handled: &[HandledMark]) -> ClickIntent {
        let intent = classify_click(&self.document, target, handled);
        if let ClickIntent::ToggleQuote(group) = intent {
            if self.click_toggle(group).is_none() {
                tracing::warn!("Click on stale read more toggle {}", group);
                return ClickIntent::Ignore;
            }
        }
        intent
    }

    pub fn groups(&self) -> &[QuoteGroup] {
        &self.groups
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_expanded(&self, group: GroupId) -> bool {
        self.toggles.is_expanded(group)
    }

    /// Serialize the current body.
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }
}

impl Default for MessageBody {
    fn default() -> Self {
        Self::new(ReadMoreLabels::default())
    }
}

/// Full date and time of a message in the user's timezone.
pub fn format_message_datetime(
    date: DateTime<Utc>,
    localization: &Localization,
    timezone: FixedOffset,
) -> Result<String> {
    let pattern = localization.datetime_format();
    let mut out = String::new();
    write!(out, "{}", date.with_timezone(&timezone).format(&pattern))
        .map_err(|_| Error::InvalidFormat(pattern))?;
    Ok(out)
}

/// Hours and minutes on a 12-hour clock, e.g. `01:34`.
pub fn short_time(date: DateTime<Utc>, timezone: FixedOffset) -> String {
    date.with_timezone(&timezone).format("%I:%M").to_string()
}
