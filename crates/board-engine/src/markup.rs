//! GitLab Milestone Markup Conventions
//!
//! Class names, data attributes and label patterns the overlay relies on.
//! When GitLab changes its markup, this is the file to touch.

use crate::dom::Selector;

/// Container holding every milestone column.
pub const BOARD_ID: &str = "tab-issues";
/// Attribute carrying the numeric project id somewhere on the page.
pub const PROJECT_ID_ATTR: &str = "data-project-id";

pub const COLUMN_LIST_CLASS: &str = "milestone-work_items-list";
pub const COLUMN_LIST: Selector = Selector::All(&[Selector::Tag("ul"), Selector::Class(COLUMN_LIST_CLASS)]);
pub const COLUMN: Selector = Selector::Class("gl-col-md-4");
pub const CARD: Selector = Selector::Class("gl-card");
pub const CARD_HEADER: Selector = Selector::Class("gl-card-header");
pub const CARD_BODY: Selector = Selector::Class("gl-card-body");
pub const HEADER_TITLE: Selector = Selector::Class("gl-text-default");
pub const HEADER_SUBTITLE: Selector = Selector::All(&[Selector::Class("gl-text-subtle"), Selector::Class("gl-text-sm")]);
pub const STATS_CONTAINER: Selector = Selector::All(&[
    Selector::Class("gl-font-bold"),
    Selector::Class("gl-whitespace-nowrap"),
]);

/// Item boundary: every card is an `li`.
pub const ITEM: Selector = Selector::Tag("li");
pub const SPAN: Selector = Selector::Tag("span");
pub const TEST_ID_ATTR: &str = "data-testid";
pub const ANY_TEST_ID: Selector = Selector::HasAttr(TEST_ID_ATTR);
pub const TASK_ICON_ID: &str = "work-item-task-icon";
pub const ISSUE_ICON_ID: &str = "work-item-issue-icon";
pub const WEIGHT_ICON_ID: &str = "weight-icon";
pub const TASK_ICON: Selector = Selector::Attr(TEST_ID_ATTR, TASK_ICON_ID);
pub const ISSUE_ICON: Selector = Selector::Attr(TEST_ID_ATTR, ISSUE_ICON_ID);
pub const WEIGHT_ICON: Selector = Selector::Attr(TEST_ID_ATTR, WEIGHT_ICON_ID);
pub const STATUS: Selector = Selector::Class("work-item-status");
pub const NUMBER: Selector = Selector::Class("issuable-number");
pub const WEIGHT: Selector = Selector::Any(&[
    Selector::Class("weight"),
    Selector::Class("issuable-weight"),
    WEIGHT_ICON,
]);
pub const REVIEW_LABEL: Selector = Selector::All(&[
    Selector::Tag("a"),
    Selector::Class("gl-label-link"),
    Selector::AttrContains("href", "label_name=stage%3A%3AIn-review"),
]);

/// Sub-list created under an issue to hold its grouped tasks.
pub const CHILD_LIST_CLASS: &str = "milestone-lens-children";
pub const CHILD_LIST: Selector = Selector::All(&[Selector::Tag("ul"), Selector::Class(CHILD_LIST_CLASS)]);

pub const REVIEW_LIST_ID: &str = "work_items-list-in-review-extension";
pub const REVIEW_MARKER_ATTR: &str = "data-extension-in-review-board";
pub const COMPLETED_TITLE: &str = "Completed";
pub const REVIEW_TITLE: &str = "In review";
pub const REVIEW_SUBTITLE: &str = "(in review)";

pub const DONE_STATUS: &str = "Done";
pub const IN_PROGRESS_STATUS: &str = "In progress";
pub const MUTED_OPACITY: &str = "0.5";
pub const REVIEW_BACKGROUND: &str = "rgba(88, 67, 173, 0.16)";
pub const IN_PROGRESS_BACKGROUND: &str = "lightgreen";
