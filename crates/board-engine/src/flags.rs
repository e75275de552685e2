//! User Configuration
//!
//! Flags are always fully populated. Partial updates arrive as a
//! [`FlagsPatch`] and are merged over the current value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flags {
    pub group_children: bool,
    pub highlight_in_progress: bool,
    pub highlight_in_review: bool,
    pub mute_done: bool,
    pub separate_task_counts: bool,
    pub in_review_board: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            group_children: true,
            highlight_in_progress: true,
            highlight_in_review: true,
            mute_done: true,
            separate_task_counts: false,
            in_review_board: false,
        }
    }
}

/// A full-or-partial configuration object as stored or broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlagsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_children: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_in_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_in_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_task_counts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_review_board: Option<bool>,
}

impl Flags {
    /// Storage keys, in the order the settings form lists them.
    pub const KEYS: [&'static str; 6] = [
        "groupChildren",
        "highlightInProgress",
        "highlightInReview",
        "muteDone",
        "separateTaskCounts",
        "inReviewBoard",
    ];

    pub fn merge(&mut self, patch: &FlagsPatch) {
        if let Some(v) = patch.group_children {
            self.group_children = v;
        }
        if let Some(v) = patch.highlight_in_progress {
            self.highlight_in_progress = v;
        }
        if let Some(v) = patch.highlight_in_review {
            self.highlight_in_review = v;
        }
        if let Some(v) = patch.mute_done {
            self.mute_done = v;
        }
        if let Some(v) = patch.separate_task_counts {
            self.separate_task_counts = v;
        }
        if let Some(v) = patch.in_review_board {
            self.in_review_board = v;
        }
    }

    pub fn merged(mut self, patch: &FlagsPatch) -> Self {
        self.merge(patch);
        self
    }

    /// Reads a stored or broadcast JSON object; anything unreadable is an empty patch.
    pub fn patch_from_json(value: &serde_json::Value) -> FlagsPatch {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

impl From<Flags> for FlagsPatch {
    fn from(flags: Flags) -> Self {
        Self {
            group_children: Some(flags.group_children),
            highlight_in_progress: Some(flags.highlight_in_progress),
            highlight_in_review: Some(flags.highlight_in_review),
            mute_done: Some(flags.mute_done),
            separate_task_counts: Some(flags.separate_task_counts),
            in_review_board: Some(flags.in_review_board),
        }
    }
}
