//! Session Store
//!
//! Per-item bookkeeping for the lifetime of one page, keyed by item number
//! rather than stashed on the nodes themselves.

use std::collections::HashMap;

use crate::classify::ItemId;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord<N> {
    /// Where a grouped task lived before it was nested under its issue.
    pub original_parent: Option<N>,
    /// Where an item lived before it was moved into the review column.
    pub original_review_list: Option<N>,
    /// The issue has at least one task nested under it.
    pub grouped: bool,
    /// A child-hierarchy fetch for the issue is outstanding.
    pub in_flight: bool,
}

impl<N> Default for ItemRecord<N> {
    fn default() -> Self {
        Self {
            original_parent: None,
            original_review_list: None,
            grouped: false,
            in_flight: false,
        }
    }
}

impl<N> ItemRecord<N> {
    fn is_empty(&self) -> bool {
        self.original_parent.is_none() && self.original_review_list.is_none() && !self.grouped && !self.in_flight
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore<N> {
    records: HashMap<ItemId, ItemRecord<N>>,
}

impl<N> Default for SessionStore<N> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<N: Clone> SessionStore<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemRecord<N>> {
        self.records.get(&id)
    }

    pub fn entry(&mut self, id: ItemId) -> &mut ItemRecord<N> {
        self.records.entry(id).or_default()
    }

    pub fn is_grouped(&self, id: ItemId) -> bool {
        self.get(id).map(|r| r.grouped).unwrap_or(false)
    }

    pub fn is_in_flight(&self, id: ItemId) -> bool {
        self.get(id).map(|r| r.in_flight).unwrap_or(false)
    }

    pub fn original_parent(&self, id: ItemId) -> Option<N> {
        self.get(id).and_then(|r| r.original_parent.clone())
    }

    pub fn original_review_list(&self, id: ItemId) -> Option<N> {
        self.get(id).and_then(|r| r.original_review_list.clone())
    }

    /// Records the parent only the first time; later moves keep the original.
    pub fn remember_parent(&mut self, id: ItemId, parent: N) -> bool {
        let record = self.entry(id);
        if record.original_parent.is_some() {
            return false;
        }
        record.original_parent = Some(parent);
        true
    }

    /// Overwrites the recorded parent. Used when the item sits in an ordinary
    /// list again, e.g. after the host rebuilt the list it came from.
    pub fn refresh_parent(&mut self, id: ItemId, parent: N) -> bool
    where
        N: PartialEq,
    {
        let record = self.entry(id);
        if record.original_parent.as_ref() == Some(&parent) {
            return false;
        }
        record.original_parent = Some(parent);
        true
    }

    /// Overwrites the recorded pre-review list with the one the item is
    /// leaving now.
    pub fn refresh_review_list(&mut self, id: ItemId, list: N) -> bool
    where
        N: PartialEq,
    {
        let record = self.entry(id);
        if record.original_review_list.as_ref() == Some(&list) {
            return false;
        }
        record.original_review_list = Some(list);
        true
    }

    pub fn take_original_parent(&mut self, id: ItemId) -> Option<N> {
        let parent = self.records.get_mut(&id).and_then(|r| r.original_parent.take());
        self.prune(id);
        parent
    }

    pub fn take_original_review_list(&mut self, id: ItemId) -> Option<N> {
        let list = self.records.get_mut(&id).and_then(|r| r.original_review_list.take());
        self.prune(id);
        list
    }

    pub fn set_in_flight(&mut self, id: ItemId, in_flight: bool) {
        self.entry(id).in_flight = in_flight;
        self.prune(id);
    }

    pub fn set_grouped(&mut self, id: ItemId, grouped: bool) {
        self.entry(id).grouped = grouped;
        self.prune(id);
    }

    /// Items that currently have a recorded original parent.
    pub fn reparented(&self) -> Vec<(ItemId, N)> {
        let mut out: Vec<(ItemId, N)> = self
            .records
            .iter()
            .filter_map(|(id, r)| r.original_parent.clone().map(|p| (*id, p)))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Items that currently have a recorded pre-review list.
    pub fn review_moved(&self) -> Vec<(ItemId, N)> {
        let mut out: Vec<(ItemId, N)> = self
            .records
            .iter()
            .filter_map(|(id, r)| r.original_review_list.clone().map(|l| (*id, l)))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Drops grouped/in-flight markers on every item.
    pub fn clear_grouping_markers(&mut self) {
        for record in self.records.values_mut() {
            record.grouped = false;
            record.in_flight = false;
        }
        self.records.retain(|_, r| !r.is_empty());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn prune(&mut self, id: ItemId) {
        if self.records.get(&id).map(|r| r.is_empty()).unwrap_or(false) {
            self.records.remove(&id);
        }
    }
}
