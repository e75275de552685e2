//! Board Engine
//!
//! Keeps a derived overlay (grouping, highlighting, column statistics and a
//! synthetic "In review" column) in sync with a GitLab milestone board that
//! the host page keeps re-rendering underneath us.
//!
//! Layered like this:
//! - dom / memory: the host-tree abstraction and an arena implementation
//! - classify: pure facts about a single board item
//! - stats, grouping, style, review: the overlay components
//! - reconciler: one idempotent pass over the whole board
//! - session: the single-threaded async driver around the reconciler

pub mod classify;
pub mod dom;
pub mod error;
pub mod flags;
pub mod grouping;
pub mod hierarchy;
pub mod markup;
pub mod memory;
pub mod reconciler;
pub mod review;
pub mod session;
pub mod stats;
pub mod store;
pub mod style;

#[cfg(any(test, feature = "test-support"))]
pub mod fixture;

#[cfg(test)]
mod tests;

pub use classify::{BoardItem, Classification, ItemId, ItemKind};
pub use dom::{BoardDom, Selector};
pub use error::{FetchError, ReviewColumnError};
pub use flags::{Flags, FlagsPatch};
pub use hierarchy::{ChildDescriptor, ChildFetch, HierarchySource};
pub use memory::{MemoryDom, NodeId};
pub use reconciler::{MutationKind, Reconciler};
pub use session::Session;
