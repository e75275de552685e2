//! Child Hierarchy Contract
//!
//! What the grouping engine asks the data fetcher for, and what it gets back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::classify::{ItemId, ItemKind};
use crate::error::FetchError;

/// One child of an issue as reported by the hierarchy service.
///
/// Only `identifier` matters to the overlay; the rest rides along for
/// logging and future use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildDescriptor {
    pub identifier: ItemId,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub weight: Option<u32>,
}

impl ChildDescriptor {
    pub fn new(identifier: u64, kind: ItemKind) -> Self {
        Self {
            identifier: ItemId(identifier),
            kind,
            ..Default::default()
        }
    }
}

/// A scheduled request for one issue's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildFetch {
    pub issue: ItemId,
    pub project: Option<String>,
}

/// Out-of-band source of issue hierarchies.
///
/// Futures are `?Send`: everything runs on the page's single thread.
#[async_trait(?Send)]
pub trait HierarchySource {
    async fn fetch_children(&self, request: &ChildFetch) -> Result<Vec<ChildDescriptor>, FetchError>;
}

/// Scripted source for tests: canned responses per issue, with call counting.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct StaticHierarchy {
    responses: std::collections::HashMap<ItemId, Result<Vec<ChildDescriptor>, FetchError>>,
    calls: std::cell::RefCell<Vec<ItemId>>,
}

#[cfg(any(test, feature = "test-support"))]
impl StaticHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, issue: u64, tasks: &[u64]) -> Self {
        let children = tasks.iter().map(|t| ChildDescriptor::new(*t, ItemKind::Task)).collect();
        self.responses.insert(ItemId(issue), Ok(children));
        self
    }

    pub fn with_error(mut self, issue: u64, error: FetchError) -> Self {
        self.responses.insert(ItemId(issue), Err(error));
        self
    }

    /// Issues requested so far, in call order.
    pub fn calls(&self) -> Vec<ItemId> {
        self.calls.borrow().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait(?Send)]
impl HierarchySource for StaticHierarchy {
    async fn fetch_children(&self, request: &ChildFetch) -> Result<Vec<ChildDescriptor>, FetchError> {
        self.calls.borrow_mut().push(request.issue);
        self.responses
            .get(&request.issue)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
