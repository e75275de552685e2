//! Node Classifier
//!
//! Pure, best-effort facts about a single board item. Nothing here fails:
//! a missing sub-element just yields the default for that fact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::{closest, closest_ancestor, descendants, query_all, BoardDom, Selector};
use crate::markup;

/// Project-scoped item number, shown as `#123` on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Accepts both `#123` and `123`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let digits = text.strip_prefix('#').unwrap_or(text);
        digits.trim().parse().ok().map(ItemId)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Issue,
    Task,
}

impl ItemKind {
    /// Maps a GitLab work item type name ("Task", "Issue", ...) to a kind.
    pub fn from_type_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("task") {
            ItemKind::Task
        } else {
            ItemKind::Issue
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub kind: ItemKind,
    pub status: String,
    pub identifier: Option<ItemId>,
    pub weight: u32,
    pub in_review: bool,
}

/// One classified item, valid for the duration of a single pass.
#[derive(Debug, Clone)]
pub struct BoardItem<N> {
    pub node: N,
    pub facts: Classification,
    pub has_visible_children: bool,
}

impl<N> BoardItem<N> {
    pub fn id(&self) -> Option<ItemId> {
        self.facts.identifier
    }

    pub fn kind(&self) -> ItemKind {
        self.facts.kind
    }
}

pub fn classify<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> Classification {
    Classification {
        kind: item_kind(dom, node),
        status: item_status(dom, node),
        identifier: item_identifier(dom, node),
        weight: item_weight(dom, node),
        in_review: is_in_review(dom, node),
    }
}

/// Whether `candidate`'s nearest enclosing item is `node` itself.
fn owned_by<D: BoardDom + ?Sized>(dom: &D, candidate: &D::Node, node: &D::Node) -> bool {
    closest(dom, candidate, markup::ITEM).as_ref() == Some(node)
}

fn own_matches<D: BoardDom + ?Sized>(dom: &D, node: &D::Node, selector: Selector) -> Vec<D::Node> {
    query_all(dom, node, selector)
        .into_iter()
        .filter(|c| owned_by(dom, c, node))
        .collect()
}

fn first_own<D: BoardDom + ?Sized>(dom: &D, node: &D::Node, selector: Selector) -> Option<D::Node> {
    own_matches(dom, node, selector).into_iter().next()
}

pub fn item_kind<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> ItemKind {
    match first_own(dom, node, markup::ANY_TEST_ID).and_then(|icon| dom.attribute(&icon, markup::TEST_ID_ATTR)) {
        Some(id) if id == markup::TASK_ICON_ID => ItemKind::Task,
        _ => ItemKind::Issue,
    }
}

pub fn item_status<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> String {
    first_own(dom, node, markup::STATUS)
        .map(|status| dom.text_content(&status).trim().to_string())
        .unwrap_or_default()
}

pub fn item_identifier<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> Option<ItemId> {
    first_own(dom, node, markup::NUMBER).and_then(|number| ItemId::parse(&dom.text_content(&number)))
}

/// The item's own weight; nested items' indicators are never counted.
pub fn item_weight<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> u32 {
    let Some(candidate) = first_own(dom, node, markup::WEIGHT) else {
        return 0;
    };
    let container = if markup::WEIGHT_ICON.matches(dom, &candidate) {
        closest(dom, &candidate, markup::SPAN)
            .filter(|span| owned_by(dom, span, node))
            .or_else(|| dom.parent(&candidate))
            .unwrap_or_else(|| candidate.clone())
    } else {
        candidate
    };
    parse_weight(&dom.text_content(&container))
}

/// First integer in `text`; negatives and garbage read as zero.
pub fn parse_weight(text: &str) -> u32 {
    let text = text.replace('\u{a0}', " ");
    let bytes = text.as_bytes();
    let Some(start) = bytes.iter().position(|b| b.is_ascii_digit()) else {
        return 0;
    };
    if start > 0 && bytes[start - 1] == b'-' {
        return 0;
    }
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map(|len| start + len)
        .unwrap_or(bytes.len());
    text[start..end].parse().unwrap_or(0)
}

pub fn is_in_review<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    first_own(dom, node, markup::REVIEW_LABEL).is_some()
}

/// An `li` carrying its own `#number` label.
pub fn is_item<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    markup::ITEM.matches(dom, node) && first_own(dom, node, markup::NUMBER).is_some()
}

/// Items nested under another item (grouped tasks) are not top-level.
pub fn is_top_level<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    closest_ancestor(dom, node, markup::ITEM).is_none()
}

/// True when at least one other item is nested under this one.
pub fn has_nested_items<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> bool {
    descendants(dom, node).iter().any(|d| is_item(dom, d))
}

pub fn column_lists<D: BoardDom + ?Sized>(dom: &D) -> Vec<D::Node> {
    query_all(dom, &dom.board(), markup::COLUMN_LIST)
}

/// Items below `root` in document order, nested ones included.
pub fn items_in<D: BoardDom + ?Sized>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    descendants(dom, root)
        .into_iter()
        .filter(|n| is_item(dom, n))
        .collect()
}

/// Every item inside any column list, including grouped tasks.
pub fn item_nodes<D: BoardDom + ?Sized>(dom: &D) -> Vec<D::Node> {
    column_lists(dom)
        .iter()
        .flat_map(|list| items_in(dom, list))
        .collect()
}

pub fn board_items<D: BoardDom + ?Sized>(dom: &D) -> Vec<BoardItem<D::Node>> {
    item_nodes(dom)
        .into_iter()
        .map(|node| {
            let facts = classify(dom, &node);
            let has_visible_children = facts.kind == ItemKind::Issue && has_nested_items(dom, &node);
            BoardItem {
                node,
                facts,
                has_visible_children,
            }
        })
        .collect()
}

/// Item numbers are shared between issues and tasks within a project.
pub fn find_by_id<D: BoardDom + ?Sized>(dom: &D, id: ItemId) -> Option<D::Node> {
    item_nodes(dom)
        .into_iter()
        .find(|n| item_identifier(dom, n) == Some(id))
}

pub fn find_item<D: BoardDom + ?Sized>(dom: &D, kind: ItemKind, id: ItemId) -> Option<D::Node> {
    item_nodes(dom)
        .into_iter()
        .find(|n| item_identifier(dom, n) == Some(id) && item_kind(dom, n) == kind)
}
