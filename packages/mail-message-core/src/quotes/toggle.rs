//! Expanded/collapsed state of quote groups.

use super::{GroupId, QuoteGroup, ReadMoreLabels, GROUP_ATTR};
use crate::content::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-group expansion flags, owned by the host view.
///
/// Groups start collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleStates {
    expanded: BTreeMap<GroupId, bool>,
}

impl ToggleStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, group: GroupId) -> bool {
        self.expanded.get(&group).copied().unwrap_or(false)
    }

    pub fn set(&mut self, group: GroupId, expanded: bool) {
        self.expanded.insert(group, expanded);
    }

    /// Flip a group and return its new state.
    pub fn toggle(&mut self, group: GroupId) -> bool {
        let expanded = !self.is_expanded(group);
        self.set(group, expanded);
        expanded
    }

    /// Forget every group, collapsing them all.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

/// Outcome of a click on a toggle control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleClick {
    pub group: GroupId,
    pub expanded: bool,
    /// The control is a dummy `href="#"` link whose navigation must not happen
    pub prevent_default: bool,
}

/// Show or hide a group's members and relabel its control.
pub fn apply_visibility(
    doc: &mut Document,
    group: &QuoteGroup,
    expanded: bool,
    labels: &ReadMoreLabels,
) {
    for &member in &group.members {
        doc.set_hidden(member, !expanded);
    }
    doc.set_text(group.toggle, labels.label(expanded));
}

/// Handle a click on a group's control: flip its state and re-render it.
pub fn click_toggle(
    doc: &mut Document,
    group: &QuoteGroup,
    states: &mut ToggleStates,
    labels: &ReadMoreLabels,
) -> ToggleClick {
    let expanded = states.toggle(group.id);
    apply_visibility(doc, group, expanded, labels);
    ToggleClick {
        group: group.id,
        expanded,
        prevent_default: true,
    }
}

/// Group a toggle control belongs to, read from its `data-o-mail-group`.
pub fn group_id_of_toggle(doc: &Document, node: NodeId) -> Option<GroupId> {
    doc.element(node)?
        .attr(GROUP_ATTR)?
        .parse()
        .ok()
        .map(GroupId)
}
