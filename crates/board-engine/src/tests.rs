//! End-to-end scenarios: a [`Session`] over a fixture board, driven by a
//! local executor and a scripted hierarchy source.

use futures::executor::{LocalPool, LocalSpawner};

use crate::classify::{classify, column_lists, find_by_id, find_item, items_in};
use crate::dom::{closest_ancestor, query, query_all, BoardDom};
use crate::fixture::{BoardBuilder, Card};
use crate::grouping::child_list;
use crate::hierarchy::StaticHierarchy;
use crate::markup;
use crate::stats::header_indicators;
use crate::{FetchError, FlagsPatch, ItemId, ItemKind, MemoryDom, MutationKind, NodeId, Session};

type TestSession = Session<MemoryDom, StaticHierarchy, LocalSpawner>;

fn start(dom: MemoryDom, source: StaticHierarchy) -> (LocalPool, TestSession) {
    let pool = LocalPool::new();
    let session = Session::new(dom, Some("42".into()), source, pool.spawner());
    (pool, session)
}

fn load(pool: &mut LocalPool, session: &TestSession, patch: FlagsPatch) {
    session.apply_config(&patch);
    pool.run_until_stalled();
}

fn ongoing_board() -> MemoryDom {
    BoardBuilder::new()
        .column(
            "Ongoing",
            vec![
                Card::issue(100).status("In progress").weight(3),
                Card::task(101).status("To do").weight(5),
            ],
        )
        .column("Completed", vec![])
        .build()
}

fn indicator_text(dom: &MemoryDom, node: Option<NodeId>) -> String {
    node.map(|n| dom.text_content(&n).trim().to_string()).unwrap_or_default()
}

fn parent_item(dom: &MemoryDom, id: u64) -> Option<NodeId> {
    let node = find_by_id(dom, ItemId(id))?;
    closest_ancestor(dom, &node, markup::ITEM)
}

/// Swaps a column's list for a fresh one holding flat copies of its items,
/// the way the host re-renders a column.
fn rerender_column(session: &TestSession, column: usize) -> NodeId {
    session.with_dom_mut(|dom| {
        let old = column_lists(dom)[column];
        let body = dom.parent(&old).unwrap();
        let fresh = dom.create_element("ul");
        dom.set_attribute(&fresh, "class", &format!("content-list {}", markup::COLUMN_LIST_CLASS));
        for item in items_in(dom, &old) {
            let copy = dom.deep_clone(&item);
            for nested in query_all(dom, &copy, markup::CHILD_LIST) {
                dom.remove(&nested);
            }
            dom.append_child(&fresh, &copy);
        }
        dom.insert_before(&body, &fresh, &old);
        dom.remove(&old);
        fresh
    })
}

fn two_column_board() -> MemoryDom {
    BoardBuilder::new()
        .column("Open", vec![Card::issue(1)])
        .column("Ongoing", vec![Card::issue(100).status("In progress"), Card::task(101)])
        .column("Completed", vec![])
        .build()
}

fn review_on() -> FlagsPatch {
    FlagsPatch {
        in_review_board: Some(true),
        ..FlagsPatch::default()
    }
}

#[test]
fn test_task_is_grouped_under_its_issue() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());

    session.inspect(|dom, reconciler| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        let task = find_item(dom, ItemKind::Task, ItemId(101)).unwrap();
        let sub_list = child_list(dom, &issue).expect("issue hosts a sub-list");
        assert_eq!(dom.parent(&task), Some(sub_list));
        assert!(reconciler.store().is_grouped(ItemId(100)));

        // in progress, but grouped parents carry no highlight
        assert_eq!(dom.style(&issue, "background-color"), "");
        assert_eq!(classify(dom, &issue).weight, 3);

        let list = column_lists(dom)[0];
        let indicators = header_indicators(dom, &list);
        assert_eq!(indicator_text(dom, indicators.issue), "2");
        assert_eq!(indicator_text(dom, indicators.weight), "8");
    });

    let separate = FlagsPatch {
        separate_task_counts: Some(true),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, separate);
    session.inspect(|dom, _| {
        let list = column_lists(dom)[0];
        let indicators = header_indicators(dom, &list);
        assert_eq!(indicator_text(dom, indicators.issue), "1");
        assert_eq!(indicator_text(dom, indicators.task), "1");
        assert_eq!(indicator_text(dom, indicators.weight), "8");
    });
}

#[test]
fn test_pass_on_unchanged_board_mutates_nothing() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());

    let before = session.inspect(|dom, _| dom.mutation_count());
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert_eq!(session.inspect(|dom, _| dom.mutation_count()), before);
    assert_eq!(session.source().calls(), vec![ItemId(100)], "grouped issue is not fetched again");
}

#[test]
fn test_grouping_survives_as_column_membership() {
    let dom = BoardBuilder::new()
        .column("Open", vec![Card::issue(1).weight(1)])
        .column("Ongoing", vec![Card::task(2).weight(2), Card::task(3).weight(4)])
        .column("Completed", vec![])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new().with_children(1, &[2, 3, 77]));
    load(&mut pool, &session, FlagsPatch::default());

    session.inspect(|dom, _| {
        let lists = column_lists(dom);
        assert_eq!(items_in(dom, &lists[0]).len(), 3);
        assert!(items_in(dom, &lists[1]).is_empty());
        let open = header_indicators(dom, &lists[0]);
        assert_eq!(indicator_text(dom, open.issue), "3");
        assert_eq!(indicator_text(dom, open.weight), "7");
        let ongoing = header_indicators(dom, &lists[1]);
        assert_eq!(indicator_text(dom, ongoing.issue), "0");
        assert_eq!(indicator_text(dom, ongoing.weight), "0");
    });
}

#[test]
fn test_toggling_grouping_off_and_on() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());
    let original_list = session.inspect(|dom, _| column_lists(dom)[0]);

    let off = FlagsPatch {
        group_children: Some(false),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, off);
    session.inspect(|dom, reconciler| {
        let task = find_item(dom, ItemKind::Task, ItemId(101)).unwrap();
        assert_eq!(dom.parent(&task), Some(original_list));
        assert!(query_all(dom, &dom.board(), markup::CHILD_LIST).is_empty());
        assert!(reconciler.store().reparented().is_empty());
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(dom.style(&issue, "background-color"), markup::IN_PROGRESS_BACKGROUND);
    });

    let on = FlagsPatch {
        group_children: Some(true),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, on);
    session.inspect(|dom, _| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(parent_item(dom, 101), Some(issue));
    });
    assert_eq!(session.source().calls(), vec![ItemId(100), ItemId(100)]);
}

#[test]
fn test_review_highlight_wins_over_in_progress() {
    let dom = BoardBuilder::new()
        .column("Ongoing", vec![Card::issue(5).status("In progress").in_review(), Card::issue(6).status("In progress")])
        .column("Completed", vec![Card::issue(7).status("Done")])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new());
    load(&mut pool, &session, FlagsPatch::default());

    session.inspect(|dom, _| {
        let style_of = |id| dom.style(&find_by_id(dom, ItemId(id)).unwrap(), "background-color");
        assert_eq!(style_of(5), markup::REVIEW_BACKGROUND);
        assert_eq!(style_of(6), markup::IN_PROGRESS_BACKGROUND);
        let done = find_by_id(dom, ItemId(7)).unwrap();
        assert_eq!(dom.style(&done, "opacity"), markup::MUTED_OPACITY);
    });
}

#[test]
fn test_grouped_parent_stays_unhighlighted() {
    let dom = BoardBuilder::new()
        .column(
            "Ongoing",
            vec![Card::issue(10).status("In progress").in_review(), Card::task(11).status("In progress")],
        )
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new().with_children(10, &[11]));
    load(&mut pool, &session, FlagsPatch::default());
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();

    session.inspect(|dom, _| {
        let issue = find_by_id(dom, ItemId(10)).unwrap();
        let task = find_by_id(dom, ItemId(11)).unwrap();
        assert_eq!(dom.style(&issue, "background-color"), "");
        assert_eq!(dom.style(&task, "background-color"), markup::IN_PROGRESS_BACKGROUND);
    });
}

#[test]
fn test_review_column_collects_and_returns_items() {
    let dom = BoardBuilder::new()
        .column("Ongoing", vec![Card::issue(200).in_review(), Card::issue(201)])
        .column("Completed", vec![Card::issue(202).status("Done")])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new());
    let ongoing = session.inspect(|dom, _| column_lists(dom)[0]);

    let on = FlagsPatch {
        in_review_board: Some(true),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, on);
    session.inspect(|dom, reconciler| {
        let list = *reconciler.review().list().expect("column present");
        let item = find_by_id(dom, ItemId(200)).unwrap();
        assert_eq!(dom.parent(&item), Some(list));
        let indicators = header_indicators(dom, &list);
        assert_eq!(indicator_text(dom, indicators.issue), "1");
    });

    let off = FlagsPatch {
        in_review_board: Some(false),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, off);
    session.inspect(|dom, reconciler| {
        let item = find_by_id(dom, ItemId(200)).unwrap();
        assert_eq!(dom.parent(&item), Some(ongoing));
        assert!(dom.find_by_id(markup::REVIEW_LIST_ID).is_none());
        assert!(query(dom, &dom.board(), crate::dom::Selector::HasAttr(markup::REVIEW_MARKER_ATTR)).is_none());
        assert!(!reconciler.review().is_present());
        assert_eq!(column_lists(dom).len(), 2);
    });
}

#[test]
fn test_missing_completed_column_degrades_only_the_review_column() {
    let dom = BoardBuilder::new()
        .column("Ongoing", vec![Card::issue(300).in_review().status("In progress")])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new());
    let on = FlagsPatch {
        in_review_board: Some(true),
        ..FlagsPatch::default()
    };
    load(&mut pool, &session, on);

    session.inspect(|dom, reconciler| {
        assert!(!reconciler.review().is_present());
        let item = find_by_id(dom, ItemId(300)).unwrap();
        assert_eq!(dom.parent(&item), Some(column_lists(dom)[0]));
        assert_eq!(dom.style(&item, "background-color"), markup::REVIEW_BACKGROUND);
    });
}

#[test]
fn test_outstanding_fetch_is_not_duplicated() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    session.apply_config(&FlagsPatch::default());
    session.handle_mutations(&[MutationKind::ChildList]);
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert_eq!(session.source().calls(), vec![ItemId(100)]);
}

#[test]
fn test_failed_fetch_is_retried_on_next_pass() {
    let source = StaticHierarchy::new().with_error(100, FetchError::Status {
        status: 502,
        url: "https://gitlab.example/api/graphql".into(),
    });
    let (mut pool, session) = start(ongoing_board(), source);
    load(&mut pool, &session, FlagsPatch::default());
    session.inspect(|dom, reconciler| {
        assert!(!reconciler.store().is_in_flight(ItemId(100)));
        assert!(!reconciler.store().is_grouped(ItemId(100)));
        assert_eq!(parent_item(dom, 101), None);
    });

    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert_eq!(session.source().calls(), vec![ItemId(100), ItemId(100)]);
}

#[test]
fn test_late_result_after_grouping_turned_off_is_discarded() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    session.apply_config(&FlagsPatch::default());
    session.apply_config(&FlagsPatch {
        group_children: Some(false),
        ..FlagsPatch::default()
    });
    pool.run_until_stalled();

    session.inspect(|dom, reconciler| {
        assert_eq!(parent_item(dom, 101), None);
        assert!(query_all(dom, &dom.board(), markup::CHILD_LIST).is_empty());
        assert!(!reconciler.store().is_in_flight(ItemId(100)));
    });
}

#[test]
fn test_host_rerender_of_the_issue_is_regrouped() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());

    // the host re-renders the column: a fresh issue card, the task flat again
    let fresh = session.with_dom_mut(|dom| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        let task = find_item(dom, ItemKind::Task, ItemId(101)).unwrap();
        let list = dom.parent(&issue).unwrap();
        let fresh = dom.deep_clone(&issue);
        let stale = child_list(dom, &fresh).unwrap();
        dom.remove(&stale);
        dom.insert_before(&list, &fresh, &issue);
        dom.remove(&issue);
        dom.append_child(&list, &task);
        fresh
    });
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();

    assert_eq!(session.source().calls(), vec![ItemId(100), ItemId(100)]);
    session.inspect(|dom, reconciler| {
        assert_eq!(parent_item(dom, 101), Some(fresh));
        assert!(reconciler.store().is_grouped(ItemId(100)));
    });
}

#[test]
fn test_unloaded_session_ignores_mutations() {
    let (mut pool, session) = start(ongoing_board(), StaticHierarchy::new());
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert!(session.source().calls().is_empty());
    assert_eq!(session.inspect(|dom, _| dom.mutation_count()), 0);
}

#[test]
fn test_rerendered_column_receives_its_tasks_back() {
    let (mut pool, session) = start(two_column_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());
    let open = session.inspect(|dom, _| column_lists(dom)[0]);
    assert!(session.inspect(|dom, _| parent_item(dom, 101)).is_some());

    let fresh = rerender_column(&session, 1);
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    session.inspect(|dom, _| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(dom.parent(&issue), Some(fresh));
        assert_eq!(parent_item(dom, 101), Some(issue));
    });

    load(
        &mut pool,
        &session,
        FlagsPatch {
            group_children: Some(false),
            ..FlagsPatch::default()
        },
    );
    session.inspect(|dom, _| {
        let task = find_item(dom, ItemKind::Task, ItemId(101)).unwrap();
        assert_eq!(dom.parent(&task), Some(fresh));
        assert_eq!(items_in(dom, &open).len(), 1);
    });
}

#[test]
fn test_flat_tasks_in_a_rerendered_column_stay_put_on_ungroup() {
    let (mut pool, session) = start(two_column_board(), StaticHierarchy::new().with_children(100, &[101]));
    load(&mut pool, &session, FlagsPatch::default());
    let open = session.inspect(|dom, _| column_lists(dom)[0]);

    // no pass in between: the recorded list is gone and the task is flat already
    let fresh = rerender_column(&session, 1);
    load(
        &mut pool,
        &session,
        FlagsPatch {
            group_children: Some(false),
            ..FlagsPatch::default()
        },
    );
    session.inspect(|dom, reconciler| {
        let task = find_item(dom, ItemKind::Task, ItemId(101)).unwrap();
        assert_eq!(dom.parent(&task), Some(fresh));
        assert_eq!(items_in(dom, &open).len(), 1);
        assert!(reconciler.store().reparented().is_empty());
    });
}

#[test]
fn test_grouped_children_travel_through_the_review_column() {
    let dom = BoardBuilder::new()
        .column(
            "Ongoing",
            vec![
                Card::issue(100).status("In progress").weight(3).in_review(),
                Card::task(101).status("To do").weight(2),
            ],
        )
        .column("Completed", vec![])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new().with_children(100, &[101]));
    let ongoing = session.inspect(|dom, _| column_lists(dom)[0]);
    load(&mut pool, &session, review_on());

    session.inspect(|dom, reconciler| {
        let list = *reconciler.review().list().expect("column present");
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(dom.parent(&issue), Some(list));
        assert_eq!(parent_item(dom, 101), Some(issue));
        let indicators = header_indicators(dom, &list);
        assert_eq!(indicator_text(dom, indicators.issue), "2");
        assert_eq!(indicator_text(dom, indicators.weight), "5");
        assert!(items_in(dom, &ongoing).is_empty());
    });

    let before = session.inspect(|dom, _| dom.mutation_count());
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert_eq!(session.inspect(|dom, _| dom.mutation_count()), before);
    assert_eq!(session.source().calls(), vec![ItemId(100)]);

    load(
        &mut pool,
        &session,
        FlagsPatch {
            in_review_board: Some(false),
            ..FlagsPatch::default()
        },
    );
    session.inspect(|dom, reconciler| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(dom.parent(&issue), Some(ongoing));
        assert_eq!(parent_item(dom, 101), Some(issue));
        assert!(!reconciler.review().is_present());
        assert!(reconciler.store().is_grouped(ItemId(100)));
    });
}

#[test]
fn test_in_review_task_stays_nested_under_its_issue() {
    let dom = BoardBuilder::new()
        .column(
            "Ongoing",
            vec![Card::issue(100).status("In progress"), Card::task(101).status("In progress").in_review()],
        )
        .column("Completed", vec![])
        .build();
    let (mut pool, session) = start(dom, StaticHierarchy::new().with_children(100, &[101]));
    let ongoing = session.inspect(|dom, _| column_lists(dom)[0]);
    load(&mut pool, &session, review_on());

    session.inspect(|dom, reconciler| {
        let issue = find_item(dom, ItemKind::Issue, ItemId(100)).unwrap();
        assert_eq!(dom.parent(&issue), Some(ongoing));
        assert_eq!(parent_item(dom, 101), Some(issue));
        let list = *reconciler.review().list().expect("column present");
        assert!(items_in(dom, &list).is_empty());
    });

    let before = session.inspect(|dom, _| dom.mutation_count());
    session.handle_mutations(&[MutationKind::ChildList]);
    pool.run_until_stalled();
    assert_eq!(session.inspect(|dom, _| dom.mutation_count()), before);
}
