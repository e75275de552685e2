//! Review-Column Synthesizer
//!
//! Maintains an extra "In review" column, cloned from the "Completed" one,
//! that collects every top-level item carrying the review-stage label.
//! Items remember the list they came from and go back there when they leave
//! review or when the column is torn down.

use tracing::{debug, info, warn};

use crate::classify::{column_lists, find_by_id, is_in_review, is_item, is_top_level, item_identifier, item_nodes};
use crate::dom::{closest, element_children, first_text_child, query, query_all, BoardDom, Selector};
use crate::error::ReviewColumnError;
use crate::flags::Flags;
use crate::markup;
use crate::stats::{card_title, zero_indicators};
use crate::store::SessionStore;

const REVIEW_LIST: Selector = Selector::Id(markup::REVIEW_LIST_ID);

/// Whether the synthetic column currently exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewColumn<N> {
    Absent,
    Present { list: N },
}

impl<N> Default for ReviewColumn<N> {
    fn default() -> Self {
        ReviewColumn::Absent
    }
}

/// What one review sweep moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewSweep {
    pub returned: usize,
    pub admitted: usize,
}

/// First card on the board whose header title equals `title`.
pub fn find_column_card_by_title<D: BoardDom + ?Sized>(dom: &D, title: &str) -> Option<D::Node> {
    query_all(dom, &dom.board(), markup::CARD)
        .into_iter()
        .find(|card| card_title(dom, card) == title)
}

fn is_review_list<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> bool {
    dom.attribute(list, markup::REVIEW_MARKER_ATTR).as_deref() == Some("true")
}

/// First ordinary column list, used when an item's origin is gone.
fn fallback_list<D: BoardDom + ?Sized>(dom: &D) -> Option<D::Node> {
    column_lists(dom)
        .into_iter()
        .find(|list| !is_review_list(dom, list))
}

/// Items sitting directly in the review list; grouped tasks travel with them.
fn top_level_items<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> Vec<D::Node> {
    element_children(dom, list)
        .into_iter()
        .filter(|c| is_item(dom, c))
        .collect()
}

impl<N: Clone + PartialEq + std::fmt::Debug> ReviewColumn<N> {
    pub fn list(&self) -> Option<&N> {
        match self {
            ReviewColumn::Absent => None,
            ReviewColumn::Present { list } => Some(list),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ReviewColumn::Present { .. })
    }

    /// The live review list, re-discovering it on the board if our handle went stale.
    fn locate<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &D) -> Option<N> {
        if let ReviewColumn::Present { list } = self {
            if dom.is_connected(list) {
                return Some(list.clone());
            }
        }
        match query(dom, &dom.board(), REVIEW_LIST) {
            Some(list) => {
                *self = ReviewColumn::Present { list: list.clone() };
                Some(list)
            }
            None => {
                *self = ReviewColumn::Absent;
                None
            }
        }
    }

    /// Returns the review list, creating the column if needed.
    pub fn ensure_present<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D) -> Result<N, ReviewColumnError> {
        if let Some(list) = self.locate(dom) {
            return Ok(list);
        }

        let completed_card = find_column_card_by_title(dom, markup::COMPLETED_TITLE)
            .ok_or(ReviewColumnError::TemplateMissing(markup::COMPLETED_TITLE))?;
        let completed_column = closest(dom, &completed_card, markup::COLUMN)
            .or_else(|| dom.parent(&completed_card))
            .ok_or(ReviewColumnError::UnexpectedStructure("card has no column"))?;
        let row = dom
            .parent(&completed_column)
            .ok_or(ReviewColumnError::UnexpectedStructure("column has no row"))?;

        let column = dom.deep_clone(&completed_column);
        let card = if markup::CARD.matches(dom, &column) {
            column.clone()
        } else {
            query(dom, &column, markup::CARD).unwrap_or_else(|| column.clone())
        };

        if let Some(header) = query(dom, &card, markup::CARD_HEADER) {
            let title = query(dom, &header, markup::HEADER_TITLE).unwrap_or(header);
            match first_text_child(dom, &title) {
                Some(text) => dom.set_text_content(&text, markup::REVIEW_TITLE),
                None => {
                    let text = dom.create_text(markup::REVIEW_TITLE);
                    match dom.children(&title).first() {
                        Some(first) => dom.insert_before(&title, &text, first),
                        None => dom.append_child(&title, &text),
                    }
                }
            }
        }
        if let Some(subtitle) = query(dom, &card, markup::HEADER_SUBTITLE) {
            dom.set_text_content(&subtitle, markup::REVIEW_SUBTITLE);
        }

        let list = match query(dom, &card, markup::COLUMN_LIST) {
            Some(list) => list,
            None => {
                let body = query(dom, &card, markup::CARD_BODY)
                    .ok_or(ReviewColumnError::UnexpectedStructure("card has no body"))?;
                let list = dom.create_element("ul");
                dom.set_attribute(&list, "class", &format!("content-list {}", markup::COLUMN_LIST_CLASS));
                dom.append_child(&body, &list);
                list
            }
        };
        for child in dom.children(&list) {
            dom.remove(&child);
        }
        dom.set_attribute(&list, "id", markup::REVIEW_LIST_ID);
        dom.set_attribute(&list, markup::REVIEW_MARKER_ATTR, "true");
        zero_indicators(dom, &list);

        dom.insert_before(&row, &column, &completed_column);
        relax_row_layout(dom, &row);

        info!("inserted '{}' column before '{}'", markup::REVIEW_TITLE, markup::COMPLETED_TITLE);
        *self = ReviewColumn::Present { list: list.clone() };
        Ok(list)
    }

    /// Moves items in and out of the review column according to their labels.
    pub fn reconcile<D: BoardDom<Node = N> + ?Sized>(
        &mut self,
        dom: &mut D,
        store: &mut SessionStore<N>,
    ) -> Result<ReviewSweep, ReviewColumnError> {
        let review_list = self.ensure_present(dom)?;
        let mut sweep = ReviewSweep::default();

        for node in top_level_items(dom, &review_list) {
            if is_in_review(dom, &node) {
                continue;
            }
            let Some(id) = item_identifier(dom, &node) else {
                continue;
            };
            let origin = store
                .take_original_review_list(id)
                .filter(|list| dom.is_connected(list) && *list != review_list)
                .or_else(|| fallback_list(dom));
            if let Some(origin) = origin {
                debug!("item {} left review, moving it back", id);
                dom.append_child(&origin, &node);
                sweep.returned += 1;
            }
        }

        for node in item_nodes(dom) {
            if !is_top_level(dom, &node) || !is_in_review(dom, &node) {
                continue;
            }
            let current = closest(dom, &node, markup::COLUMN_LIST);
            if current.as_ref() == Some(&review_list) {
                continue;
            }
            let Some(id) = item_identifier(dom, &node) else {
                continue;
            };
            if let Some(origin) = current.or_else(|| fallback_list(dom)) {
                store.refresh_review_list(id, origin);
            }
            debug!("item {} is in review, moving it to the review column", id);
            dom.append_child(&review_list, &node);
            sweep.admitted += 1;
        }

        if sweep != ReviewSweep::default() {
            info!("review column: {} returned, {} admitted", sweep.returned, sweep.admitted);
        }
        Ok(sweep)
    }

    /// Removes the column when the feature is off, returning every item first.
    pub fn teardown_if_disabled<D: BoardDom<Node = N> + ?Sized>(
        &mut self,
        dom: &mut D,
        store: &mut SessionStore<N>,
        flags: &Flags,
    ) -> usize {
        if flags.in_review_board {
            return 0;
        }
        let Some(review_list) = self.locate(dom) else {
            return 0;
        };

        let mut returned = 0;
        for node in top_level_items(dom, &review_list) {
            let origin = item_identifier(dom, &node)
                .and_then(|id| store.take_original_review_list(id))
                .filter(|list| dom.is_connected(list) && *list != review_list)
                .or_else(|| fallback_list(dom));
            match origin {
                Some(origin) => {
                    dom.append_child(&origin, &node);
                    returned += 1;
                }
                None => warn!("no list to return a review item to"),
            }
        }

        let container = closest(dom, &review_list, markup::COLUMN)
            .or_else(|| closest(dom, &review_list, markup::CARD))
            .unwrap_or_else(|| review_list.clone());
        dom.remove(&container);
        *self = ReviewColumn::Absent;
        info!("removed '{}' column, returned {} items", markup::REVIEW_TITLE, returned);
        returned
    }

    /// Puts review-moved items that sit outside their recorded list back,
    /// without touching the column itself.
    pub fn restore_moved<D: BoardDom<Node = N> + ?Sized>(dom: &mut D, store: &mut SessionStore<N>) -> usize {
        let mut restored = 0;
        for (id, origin) in store.review_moved() {
            let Some(node) = find_by_id(dom, id) else {
                store.take_original_review_list(id);
                continue;
            };
            if dom.parent(&node).as_ref() == Some(&origin) {
                continue;
            }
            store.take_original_review_list(id);
            let target = Some(origin)
                .filter(|list| dom.is_connected(list))
                .or_else(|| fallback_list(dom));
            if let Some(target) = target {
                dom.append_child(&target, &node);
                restored += 1;
            }
        }
        restored
    }
}

fn relax_row_layout<D: BoardDom + ?Sized>(dom: &mut D, row: &D::Node) {
    if dom.style(row, "display").is_empty() {
        dom.set_style(row, "display", "flex");
    }
    dom.set_style(row, "flex-wrap", "nowrap");
    dom.set_style(row, "overflow-x", "auto");
    dom.set_style(row, "align-items", "stretch");
    for column in element_children(dom, row) {
        dom.set_style(&column, "flex", "0 0 auto");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{items_in, ItemId};
    use crate::fixture::{BoardBuilder, Card};
    use crate::memory::MemoryDom;
    use crate::stats::header_indicators;

    fn board() -> MemoryDom {
        BoardBuilder::new()
            .column("Ongoing", vec![Card::issue(200).in_review(), Card::issue(201)])
            .column("Completed", vec![Card::issue(202).status("Done").weight(2)])
            .build()
    }

    fn titles(dom: &MemoryDom) -> Vec<String> {
        query_all(dom, &dom.board(), markup::CARD)
            .iter()
            .map(|card| card_title(dom, card))
            .collect()
    }

    #[test]
    fn test_ensure_present_clones_completed_column() {
        let mut dom = board();
        let mut column = ReviewColumn::default();
        let list = column.ensure_present(&mut dom).unwrap();

        assert_eq!(titles(&dom), vec!["Ongoing", "In review", "Completed"]);
        assert!(items_in(&dom, &list).is_empty());
        assert_eq!(dom.attribute(&list, "id").as_deref(), Some(markup::REVIEW_LIST_ID));
        let subtitle = query(&dom, &closest(&dom, &list, markup::CARD).unwrap(), markup::HEADER_SUBTITLE).unwrap();
        assert_eq!(dom.text_content(&subtitle), markup::REVIEW_SUBTITLE);
        let count = header_indicators(&dom, &list).issue.unwrap();
        assert_eq!(dom.text_content(&count).trim(), "0");

        let row = dom.parent(&closest(&dom, &list, markup::COLUMN).unwrap()).unwrap();
        assert_eq!(dom.style(&row, "display"), "flex");
        assert_eq!(dom.style(&row, "flex-wrap"), "nowrap");

        let before = dom.mutation_count();
        assert_eq!(column.ensure_present(&mut dom).unwrap(), list);
        assert_eq!(dom.mutation_count(), before);
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let mut dom = BoardBuilder::new().column("Ongoing", vec![]).build();
        let mut column = ReviewColumn::default();
        assert_eq!(
            column.ensure_present(&mut dom),
            Err(ReviewColumnError::TemplateMissing(markup::COMPLETED_TITLE))
        );
        assert!(!column.is_present());
    }

    #[test]
    fn test_reconcile_then_teardown() {
        let mut dom = board();
        let mut store = SessionStore::new();
        let mut column = ReviewColumn::default();
        let ongoing = column_lists(&dom)[0];

        let sweep = column.reconcile(&mut dom, &mut store).unwrap();
        assert_eq!(sweep, ReviewSweep { returned: 0, admitted: 1 });
        let list = *column.list().unwrap();
        let moved = find_by_id(&dom, ItemId(200)).unwrap();
        assert_eq!(dom.parent(&moved), Some(list));
        assert_eq!(store.original_review_list(ItemId(200)), Some(ongoing));

        let off = Flags::default();
        assert_eq!(column.teardown_if_disabled(&mut dom, &mut store, &off), 1);
        assert_eq!(dom.parent(&moved), Some(ongoing));
        assert!(dom.find_by_id(markup::REVIEW_LIST_ID).is_none());
        assert_eq!(titles(&dom), vec!["Ongoing", "Completed"]);
        assert!(store.is_empty());
        assert_eq!(column, ReviewColumn::Absent);
    }

    #[test]
    fn test_item_leaving_review_goes_back() {
        let mut dom = board();
        let mut store = SessionStore::new();
        let mut column = ReviewColumn::default();
        let ongoing = column_lists(&dom)[0];
        column.reconcile(&mut dom, &mut store).unwrap();

        let moved = find_by_id(&dom, ItemId(200)).unwrap();
        let label = query(&dom, &moved, markup::REVIEW_LABEL).unwrap();
        dom.remove(&label);

        let sweep = column.reconcile(&mut dom, &mut store).unwrap();
        assert_eq!(sweep, ReviewSweep { returned: 1, admitted: 0 });
        assert_eq!(dom.parent(&moved), Some(ongoing));
    }

    #[test]
    fn test_teardown_is_noop_when_enabled_or_absent() {
        let mut dom = board();
        let mut store = SessionStore::new();
        let mut column = ReviewColumn::default();
        let on = Flags {
            in_review_board: true,
            ..Flags::default()
        };
        assert_eq!(column.teardown_if_disabled(&mut dom, &mut store, &on), 0);
        assert_eq!(column.teardown_if_disabled(&mut dom, &mut store, &Flags::default()), 0);
        assert_eq!(dom.mutation_count(), 0);
    }
}
