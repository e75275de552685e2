//! Statistics Aggregator
//!
//! Per-column issue/task counts and weight totals, rendered into the column
//! header's indicator spans. Indicators are created lazily from templates
//! found elsewhere on the board and only ever hidden, never removed.

use tracing::{debug, warn};

use crate::classify::{classify, column_lists, items_in, ItemKind};
use crate::dom::{closest, first_text_child, query, query_all, BoardDom};
use crate::flags::Flags;
use crate::markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnStats {
    pub issues: usize,
    pub tasks: usize,
    pub weight: u64,
}

impl ColumnStats {
    /// Value shown next to the issue icon.
    pub fn issue_count(&self, flags: &Flags) -> usize {
        if flags.separate_task_counts {
            self.issues
        } else {
            self.issues + self.tasks
        }
    }
}

/// The header spans of one column; any of them may not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicators<N> {
    pub issue: Option<N>,
    pub task: Option<N>,
    pub weight: Option<N>,
}

/// Counts every item in the list, grouped tasks included.
pub fn column_stats<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> ColumnStats {
    let mut stats = ColumnStats::default();
    for item in items_in(dom, list) {
        let facts = classify(dom, &item);
        match facts.kind {
            ItemKind::Issue => stats.issues += 1,
            ItemKind::Task => stats.tasks += 1,
        }
        stats.weight += u64::from(facts.weight);
    }
    stats
}

fn header_of<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> Option<D::Node> {
    let card = closest(dom, list, markup::CARD)?;
    query(dom, &card, markup::CARD_HEADER)
}

/// The span wrapping a header icon, or the icon's parent.
fn indicator_for_icon<D: BoardDom + ?Sized>(dom: &D, icon: &D::Node) -> Option<D::Node> {
    closest(dom, icon, markup::SPAN).or_else(|| dom.parent(icon))
}

pub fn header_indicators<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> Indicators<D::Node> {
    let Some(header) = header_of(dom, list) else {
        return Indicators {
            issue: None,
            task: None,
            weight: None,
        };
    };
    let find = |selector| query(dom, &header, selector).and_then(|icon| indicator_for_icon(dom, &icon));
    Indicators {
        issue: find(markup::ISSUE_ICON),
        task: find(markup::TASK_ICON),
        weight: find(markup::WEIGHT_ICON),
    }
}

/// Column title: first non-empty text node of the header title, else its text.
pub fn card_title<D: BoardDom + ?Sized>(dom: &D, card: &D::Node) -> String {
    let Some(header) = query(dom, card, markup::CARD_HEADER) else {
        return String::new();
    };
    let title = query(dom, &header, markup::HEADER_TITLE).unwrap_or(header);
    match first_text_child(dom, &title) {
        Some(text) => dom.text_content(&text).trim().to_string(),
        None => dom.text_content(&title).trim().to_string(),
    }
}

/// Writes ` {value}` into the indicator's text node, creating it if needed.
/// Returns whether anything changed.
pub fn set_indicator_value<D: BoardDom + ?Sized>(dom: &mut D, indicator: &D::Node, value: impl std::fmt::Display) -> bool {
    let text = format!(" {}", value);
    match first_text_child(dom, indicator) {
        Some(node) if dom.text_content(&node) == text => false,
        Some(node) => {
            dom.set_text_content(&node, &text);
            true
        }
        None => {
            let node = dom.create_text(&text);
            dom.append_child(indicator, &node);
            true
        }
    }
}

fn stats_container<D: BoardDom + ?Sized>(dom: &D, list: &D::Node, indicators: &Indicators<D::Node>) -> Option<D::Node> {
    if let Some(parent) = indicators.issue.as_ref().and_then(|span| dom.parent(span)) {
        return Some(parent);
    }
    let card = closest(dom, list, markup::CARD)?;
    query(dom, &card, markup::STATS_CONTAINER)
}

fn ensure_task_indicator<D: BoardDom + ?Sized>(dom: &mut D, list: &D::Node) -> Option<D::Node> {
    let indicators = header_indicators(dom, list);
    if let Some(task) = indicators.task.clone() {
        return Some(task);
    }
    let container = stats_container(dom, list, &indicators)?;
    let Some(template) = query(dom, &dom.board(), markup::TASK_ICON) else {
        debug!("no task icon on the board to build a task indicator from");
        return None;
    };

    let span = dom.create_element("span");
    dom.set_attribute(&span, "class", "gl-ml-3");
    let icon = dom.deep_clone(&template);
    dom.append_child(&span, &icon);
    match indicators.weight.filter(|w| dom.parent(w).as_ref() == Some(&container)) {
        Some(weight) => dom.insert_before(&container, &span, &weight),
        None => dom.append_child(&container, &span),
    }
    debug!("created task indicator for column '{}'", column_label(dom, list));
    Some(span)
}

fn ensure_weight_indicator<D: BoardDom + ?Sized>(dom: &mut D, list: &D::Node) -> Option<D::Node> {
    let indicators = header_indicators(dom, list);
    if let Some(weight) = indicators.weight.clone() {
        return Some(weight);
    }
    let container = stats_container(dom, list, &indicators)?;
    let icons = query_all(dom, &dom.board(), markup::WEIGHT_ICON);
    let template_icon = icons
        .iter()
        .find(|icon| closest(dom, icon, markup::CARD_HEADER).is_some())
        .or_else(|| icons.first())
        .cloned();
    let Some(template) = template_icon.and_then(|icon| indicator_for_icon(dom, &icon)) else {
        warn!("no weight indicator on the page to clone for column '{}'", column_label(dom, list));
        return None;
    };

    let span = dom.deep_clone(&template);
    dom.append_child(&container, &span);
    debug!("created weight indicator for column '{}'", column_label(dom, list));
    Some(span)
}

fn column_label<D: BoardDom + ?Sized>(dom: &D, list: &D::Node) -> String {
    closest(dom, list, markup::CARD)
        .map(|card| card_title(dom, &card))
        .unwrap_or_default()
}

/// Recomputes one column and renders it into the header.
pub fn recompute_column<D: BoardDom + ?Sized>(dom: &mut D, list: &D::Node, flags: &Flags) -> ColumnStats {
    let stats = column_stats(dom, list);
    debug!(
        "column '{}': issues={} tasks={} weight={}",
        column_label(dom, list),
        stats.issues,
        stats.tasks,
        stats.weight
    );

    let mut indicators = header_indicators(dom, list);
    if flags.separate_task_counts {
        if stats.tasks > 0 && indicators.task.is_none() {
            indicators.task = ensure_task_indicator(dom, list);
        }
        if let Some(task) = &indicators.task {
            dom.set_style(task, "display", "");
            set_indicator_value(dom, task, stats.tasks);
        }
    } else if let Some(task) = &indicators.task {
        dom.set_style(task, "display", "none");
    }

    if stats.weight > 0 && indicators.weight.is_none() {
        indicators.weight = ensure_weight_indicator(dom, list);
    }

    if let Some(issue) = &indicators.issue {
        set_indicator_value(dom, issue, stats.issue_count(flags));
    }
    if let Some(weight) = &indicators.weight {
        set_indicator_value(dom, weight, stats.weight);
    }
    stats
}

pub fn recompute_all<D: BoardDom + ?Sized>(dom: &mut D, flags: &Flags) {
    for list in column_lists(dom) {
        recompute_column(dom, &list, flags);
    }
}

/// Resets every existing indicator of a column to zero.
pub fn zero_indicators<D: BoardDom + ?Sized>(dom: &mut D, list: &D::Node) {
    let indicators = header_indicators(dom, list);
    for indicator in [indicators.issue, indicators.task, indicators.weight].into_iter().flatten() {
        set_indicator_value(dom, &indicator, 0);
    }
}
