//! "Read more / read less" collapsing of quoted content.
//!
//! Element nodes carrying `data-o-mail-quote` are quoted content, and so are
//! text nodes following an element whose id contains `stopSpelling`. Those
//! text nodes are wrapped in a span so they can be hidden. Consecutive quoted
//! siblings are joined under a single toggle control.

mod toggle;

pub use toggle::{apply_visibility, click_toggle, group_id_of_toggle, ToggleClick, ToggleStates};

use crate::content::{Document, Element, NodeId};
use crate::i18n::Catalog;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of the inserted toggle controls.
pub const READ_MORE_LESS_CLASS: &str = "o_Message_readMoreLess";

/// Attribute tagging an element as quoted content.
pub const QUOTE_ATTR: &str = "data-o-mail-quote";

/// Attribute linking a toggle control to its group.
pub const GROUP_ATTR: &str = "data-o-mail-group";

/// Marker contained in the id of the element after which text is quoted.
pub const STOP_SPELLING: &str = "stopSpelling";

/// Identifier of a quote group, unique within one transformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A run of consecutive quoted siblings sharing one toggle control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteGroup {
    pub id: GroupId,
    /// The inserted `<a>` control, placed right before the first member
    pub toggle: NodeId,
    /// Quoted siblings in document order
    pub members: Vec<NodeId>,
}

/// Labels of the toggle control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMoreLabels {
    pub more: String,
    pub less: String,
}

impl ReadMoreLabels {
    /// Labels translated through a catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            more: catalog.t("read more"),
            less: catalog.t("read less"),
        }
    }

    /// Label to show for the given state.
    pub fn label(&self, expanded: bool) -> &str {
        if expanded {
            &self.less
        } else {
            &self.more
        }
    }
}

impl Default for ReadMoreLabels {
    fn default() -> Self {
        Self {
            more: "read more".to_string(),
            less: "read less".to_string(),
        }
    }
}

/// Hide quoted content below `element` behind "read more" toggles.
///
/// Quoted members are hidden and each group gets a collapsed toggle control
/// inserted before its first member. Groups are returned in the order their
/// toggles were inserted: nested levels complete before their parent level.
///
/// Running this again on the same tree duplicates the toggles; call
/// [`strip_read_more_less`] first.
pub fn insert_read_more_less(
    doc: &mut Document,
    element: NodeId,
    labels: &ReadMoreLabels,
) -> Vec<QuoteGroup> {
    let mut inserter = ReadMoreInserter {
        labels,
        groups: Vec::new(),
    };
    inserter.visit(doc, element);
    tracing::debug!("Inserted {} read more toggles", inserter.groups.len());
    inserter.groups
}

/// Remove every toggle control below `element`, returning how many.
pub fn strip_read_more_less(doc: &mut Document, element: NodeId) -> usize {
    let toggles: Vec<NodeId> = doc
        .descendants(element)
        .into_iter()
        .filter(|&node| {
            doc.element(node)
                .is_some_and(|e| e.has_class(READ_MORE_LESS_CLASS))
        })
        .collect();
    for &toggle in &toggles {
        doc.detach(toggle);
    }
    toggles.len()
}

struct ReadMoreInserter<'a> {
    labels: &'a ReadMoreLabels,
    groups: Vec<QuoteGroup>,
}

impl ReadMoreInserter<'_> {
    fn visit(&mut self, doc: &mut Document, element: NodeId) {
        let children: Vec<NodeId> = doc
            .children(element)
            .iter()
            .copied()
            .filter(|&child| {
                doc.is_element(child) || doc.text(child).is_some_and(|t| !t.trim().is_empty())
            })
            .collect();

        let mut level: Vec<Vec<NodeId>> = Vec::new();
        let mut open_group: Option<usize> = None;

        for child in children {
            let child = promote_stop_spelling_text(doc, child);

            if is_quote_marked(doc, child) {
                doc.set_hidden(child, true);
                let index = *open_group.get_or_insert_with(|| {
                    level.push(Vec::new());
                    level.len() - 1
                });
                level[index].push(child);
            } else {
                open_group = None;
                self.visit(doc, child);
            }
        }

        for members in level {
            let id = GroupId(self.groups.len());
            let toggle = self.insert_toggle(doc, id, members[0]);
            self.groups.push(QuoteGroup {
                id,
                toggle,
                members,
            });
        }
    }

    fn insert_toggle(&self, doc: &mut Document, id: GroupId, before: NodeId) -> NodeId {
        let toggle = doc.create_element(
            Element::new("a")
                .with_attr("class", READ_MORE_LESS_CLASS)
                .with_attr("href", "#")
                .with_attr(GROUP_ATTR, &id.to_string()),
        );
        doc.set_text(toggle, self.labels.label(false));
        doc.insert_before(before, toggle);
        toggle
    }
}

/// Wrap a text node following a `stopSpelling` element into a quoted span.
///
/// Every preceding sibling is considered, not only the adjacent one.
fn promote_stop_spelling_text(doc: &mut Document, child: NodeId) -> NodeId {
    let Some(text) = doc.text(child) else {
        return child;
    };
    let after_stop_spelling = doc.previous_siblings(child).into_iter().any(|sibling| {
        doc.element(sibling)
            .and_then(|e| e.attr("id"))
            .is_some_and(|id| id.contains(STOP_SPELLING))
    });
    if !after_stop_spelling {
        return child;
    }

    let text = text.to_string();
    let span = doc.create_element(Element::new("span").with_attr(QUOTE_ATTR, "1"));
    doc.set_text(span, &text);
    doc.replace(child, span);
    tracing::trace!("Promoted text after stopSpelling marker to quote");
    span
}

/// Quoted content, or a `<br>` right after an element marked `data-o-mail-quote="1"`.
fn is_quote_marked(doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if element.attr(QUOTE_ATTR).is_some_and(|value| !value.is_empty()) {
        return true;
    }
    element.is("br")
        && doc
            .previous_element_sibling(node)
            .and_then(|previous| doc.element(previous))
            .is_some_and(|previous| previous.attr(QUOTE_ATTR) == Some("1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(html: &str) -> (Document, Vec<QuoteGroup>) {
        let mut doc = Document::parse_fragment(html);
        let root = doc.root();
        let groups = insert_read_more_less(&mut doc, root, &ReadMoreLabels::default());
        (doc, groups)
    }

    fn toggle_count(doc: &Document) -> usize {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|&n| {
                doc.element(n)
                    .is_some_and(|e| e.has_class(READ_MORE_LESS_CLASS))
            })
            .count()
    }

    #[test]
    fn test_no_quotes_leaves_tree_unchanged() {
        let html = "<div><p>Hello</p> <p>World<br>again</p></div>";
        let (doc, groups) = transform(html);

        assert!(groups.is_empty());
        assert_eq!(toggle_count(&doc), 0);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_empty_fragment() {
        let (doc, groups) = transform("");
        assert!(groups.is_empty());
        assert_eq!(doc.to_html(), "");
    }

    #[test]
    fn test_groups_are_maximal_runs() {
        let (doc, groups) = transform(
            r#"<p data-o-mail-quote="1">a</p><p data-o-mail-quote="1">b</p><p>n</p><p data-o-mail-quote="1">c</p>"#,
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].members.len(), 1);

        let root_children = doc.children(doc.root()).to_vec();
        assert_eq!(root_children.len(), 6);
        assert_eq!(root_children[0], groups[0].toggle);
        assert_eq!(&root_children[1..3], groups[0].members.as_slice());
        assert_eq!(doc.text_content(root_children[3]), "n");
        assert_eq!(root_children[4], groups[1].toggle);
        assert_eq!(root_children[5], groups[1].members[0]);

        for group in &groups {
            assert!(group.members.iter().all(|&m| doc.is_hidden(m)));
            assert_eq!(doc.text_content(group.toggle), "read more");
        }
        assert!(!doc.is_hidden(root_children[3]));
    }

    #[test]
    fn test_toggle_markup() {
        let (doc, _) = transform(r#"<p data-o-mail-quote="1">q</p>"#);
        assert_eq!(
            doc.to_html(),
            r##"<a class="o_Message_readMoreLess" href="#" data-o-mail-group="0">read more</a><p data-o-mail-quote="1" style="display: none;">q</p>"##
        );
    }

    #[test]
    fn test_whitespace_text_does_not_split_group() {
        let (_, groups) = transform(
            "<p data-o-mail-quote=\"1\">a</p>\n  <p data-o-mail-quote=\"1\">b</p>",
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn test_text_splits_group() {
        let (_, groups) = transform(
            r#"<p data-o-mail-quote="1">a</p>between<p data-o-mail-quote="1">b</p>"#,
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_empty_quote_attribute_is_not_quoted() {
        let (_, groups) = transform(r#"<p data-o-mail-quote="">a</p>"#);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_stop_spelling_promotes_distant_text() {
        let (doc, groups) =
            transform(r#"<div id="mail_stopSpelling">--</div><p>normal</p>Best regards"#);

        assert_eq!(groups.len(), 1);
        let span = groups[0].members[0];
        let element = doc.element(span).unwrap();
        assert!(element.is("span"));
        assert_eq!(element.attr(QUOTE_ATTR), Some("1"));
        assert_eq!(doc.text_content(span), "Best regards");
        assert!(doc.is_hidden(span));
        assert_eq!(doc.parent(span), Some(doc.root()));

        // The marker and the paragraph stay visible
        assert!(doc.to_html().starts_with(r#"<div id="mail_stopSpelling">--</div><p>normal</p><a "#));
    }

    #[test]
    fn test_text_without_stop_spelling_is_kept() {
        let (doc, groups) = transform(r#"<div id="signature">--</div>Best regards"#);
        assert!(groups.is_empty());
        assert_eq!(doc.to_html(), r#"<div id="signature">--</div>Best regards"#);
    }

    #[test]
    fn test_line_break_after_quote_joins_group() {
        let (doc, groups) =
            transform(r#"<p data-o-mail-quote="1">q</p><br><p>n</p><br>"#);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
        let br = groups[0].members[1];
        assert!(doc.element(br).unwrap().is("br"));

        let last = *doc.children(doc.root()).last().unwrap();
        assert!(doc.element(last).unwrap().is("br"));
        assert!(!doc.is_hidden(last));
    }

    #[test]
    fn test_nested_quotes() {
        let (doc, groups) = transform(
            r#"<div><p>hi</p><blockquote data-o-mail-quote="1">old</blockquote></div>"#,
        );

        assert_eq!(groups.len(), 1);
        let div = doc.children(doc.root())[0];
        assert_eq!(doc.parent(groups[0].toggle), Some(div));
        assert_eq!(doc.children(div)[1], groups[0].toggle);
    }

    #[test]
    fn test_quoted_subtree_is_not_searched() {
        let (_, groups) = transform(
            r#"<div data-o-mail-quote="1"><p data-o-mail-quote="1">inner</p></div>"#,
        );
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_group_ids_are_unique() {
        let (doc, groups) = transform(
            r#"<div><p data-o-mail-quote="1">a</p></div><p data-o-mail-quote="1">b</p>"#,
        );
        assert_eq!(groups.len(), 2);
        assert_ne!(groups[0].id, groups[1].id);
        for group in &groups {
            assert_eq!(group_id_of_toggle(&doc, group.toggle), Some(group.id));
        }
    }

    #[test]
    fn test_strip_then_reinsert() {
        let (mut doc, groups) = transform(
            r#"<p data-o-mail-quote="1">a</p><p>n</p><p data-o-mail-quote="1">b</p>"#,
        );
        let root = doc.root();
        assert_eq!(groups.len(), 2);

        assert_eq!(strip_read_more_less(&mut doc, root), 2);
        assert_eq!(toggle_count(&doc), 0);

        let again = insert_read_more_less(&mut doc, root, &ReadMoreLabels::default());
        assert_eq!(again.len(), 2);
        assert_eq!(toggle_count(&doc), 2);
    }

    #[test]
    fn test_rerun_without_strip_duplicates_toggles() {
        let (mut doc, _) = transform(r#"<p data-o-mail-quote="1">a</p>"#);
        let root = doc.root();
        insert_read_more_less(&mut doc, root, &ReadMoreLabels::default());
        assert_eq!(toggle_count(&doc), 2);
    }

    #[test]
    fn test_labels_from_catalog() {
        let labels = ReadMoreLabels::from_catalog(&Catalog::default());
        assert_eq!(labels.label(false), "read more");
        assert_eq!(labels.label(true), "read less");
    }
}
