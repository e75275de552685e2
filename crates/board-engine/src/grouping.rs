//! Grouping Engine
//!
//! Nests tasks under their parent issue once the issue's child hierarchy has
//! been fetched. The fetch is the only suspension point, so grouping is split
//! into [`begin`] (decide and mark in flight) and [`complete`] (apply the
//! result). Everything is undone by [`ungroup_all`].

use tracing::{debug, info, warn};

use crate::classify::{column_lists, find_item, is_item, BoardItem, ItemId, ItemKind};
use crate::dom::{closest_ancestor, element_children, query_all, BoardDom};
use crate::error::FetchError;
use crate::flags::Flags;
use crate::hierarchy::{ChildDescriptor, ChildFetch};
use crate::markup;
use crate::store::SessionStore;

/// The issue's own synthetic sub-list, if it has one.
pub fn child_list<D: BoardDom + ?Sized>(dom: &D, issue: &D::Node) -> Option<D::Node> {
    element_children(dom, issue)
        .into_iter()
        .find(|c| markup::CHILD_LIST.matches(dom, c))
}

fn nested_count<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> usize {
    element_children(dom, list)
        .iter()
        .filter(|c| is_item(dom, c))
        .count()
}

/// Decides whether `issue` needs its children fetched and marks it in flight.
///
/// Returns `None` when grouping is off, the item is not an issue, a fetch is
/// already outstanding, or the issue is grouped and still shows its sub-list.
pub fn begin<D: BoardDom + ?Sized>(
    dom: &D,
    store: &mut SessionStore<D::Node>,
    flags: &Flags,
    issue: &BoardItem<D::Node>,
    project: Option<&str>,
) -> Option<ChildFetch> {
    if !flags.group_children || issue.kind() != ItemKind::Issue {
        return None;
    }
    let id = issue.id()?;
    if store.is_in_flight(id) {
        debug!("issue {} has a child fetch in flight, skipping", id);
        return None;
    }
    if store.is_grouped(id) {
        if child_list(dom, &issue.node).is_some() {
            return None;
        }
        // host re-rendered the card and dropped our sub-list
        debug!("issue {} lost its sub-list, grouping again", id);
        store.set_grouped(id, false);
    }

    store.set_in_flight(id, true);
    debug!("fetching children of issue {}", id);
    Some(ChildFetch {
        issue: id,
        project: project.map(str::to_string),
    })
}

/// Applies a fetch result. Always clears the in-flight marker.
///
/// Returns the number of tasks moved under the issue.
pub fn complete<D: BoardDom + ?Sized>(
    dom: &mut D,
    store: &mut SessionStore<D::Node>,
    flags: &Flags,
    fetch: &ChildFetch,
    result: Result<Vec<ChildDescriptor>, FetchError>,
) -> usize {
    store.set_in_flight(fetch.issue, false);

    let children = match result {
        Ok(children) => children,
        Err(e) => {
            warn!("could not fetch children of issue {}: {}", fetch.issue, e);
            return 0;
        }
    };
    if !flags.group_children {
        debug!("grouping turned off while issue {} was in flight", fetch.issue);
        return 0;
    }
    let Some(issue) = find_item(dom, ItemKind::Issue, fetch.issue) else {
        debug!("issue {} is no longer on the board", fetch.issue);
        return 0;
    };

    let mut moved = 0;
    for child in &children {
        if nest_task(dom, store, &issue, child.identifier) {
            moved += 1;
        }
    }

    let grouped = child_list(dom, &issue)
        .map(|list| nested_count(dom, &list) > 0)
        .unwrap_or(false);
    if grouped {
        dom.set_style(&issue, "background-color", "");
    }
    store.set_grouped(fetch.issue, grouped);
    info!(
        "issue {}: {} children reported, {} moved, grouped={}",
        fetch.issue,
        children.len(),
        moved,
        grouped
    );
    moved
}

fn nest_task<D: BoardDom + ?Sized>(dom: &mut D, store: &mut SessionStore<D::Node>, issue: &D::Node, task_id: ItemId) -> bool {
    let Some(task) = find_item(dom, ItemKind::Task, task_id) else {
        debug!("task {} is not on this board, skipping", task_id);
        return false;
    };
    if let Some(owner) = closest_ancestor(dom, &task, markup::ITEM) {
        if &owner != issue {
            debug!("task {} is already nested elsewhere, leaving it", task_id);
            return false;
        }
    }

    let list = match child_list(dom, issue) {
        Some(list) => list,
        None => {
            let list = dom.create_element("ul");
            dom.set_attribute(&list, "class", markup::CHILD_LIST_CLASS);
            dom.append_child(issue, &list);
            list
        }
    };
    let Some(parent) = dom.parent(&task) else {
        return false;
    };
    if parent == list {
        return false;
    }
    if markup::CHILD_LIST.matches(dom, &parent) {
        store.remember_parent(task_id, parent);
    } else {
        // A task in an ordinary list is ungrouped there, whatever was recorded before.
        store.refresh_parent(task_id, parent);
    }
    dom.append_child(&list, &task);
    true
}

/// Puts every nested task back where it came from and forgets all grouping.
///
/// Returns the number of tasks restored.
pub fn ungroup_all<D: BoardDom + ?Sized>(dom: &mut D, store: &mut SessionStore<D::Node>) -> usize {
    let fallback = column_lists(dom).into_iter().next();
    let mut restored = 0;

    for (id, original) in store.reparented() {
        store.take_original_parent(id);
        let Some(task) = find_item(dom, ItemKind::Task, id) else {
            continue;
        };
        let Some(parent) = dom.parent(&task) else {
            continue;
        };
        // Only nested tasks need a way back; a re-rendered list already holds them flat.
        if parent == original || !markup::CHILD_LIST.matches(dom, &parent) {
            continue;
        }
        let target = if dom.is_connected(&original) {
            Some(original)
        } else {
            fallback.clone()
        };
        match target {
            Some(target) => {
                debug!("restoring task {} to its original list", id);
                dom.append_child(&target, &task);
                restored += 1;
            }
            None => warn!("no list to restore task {} into", id),
        }
    }

    store.clear_grouping_markers();
    let removed = remove_empty_child_lists(dom);
    if restored > 0 || removed > 0 {
        info!("ungrouped {} tasks, removed {} empty sub-lists", restored, removed);
    }
    restored
}

/// Removes synthetic sub-lists that no longer hold anything.
pub fn remove_empty_child_lists<D: BoardDom + ?Sized>(dom: &mut D) -> usize {
    let empty: Vec<D::Node> = query_all(dom, &dom.board(), markup::CHILD_LIST)
        .into_iter()
        .filter(|list| element_children(dom, list).is_empty())
        .collect();
    for list in &empty {
        dom.remove(list);
    }
    empty.len()
}
