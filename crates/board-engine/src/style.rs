//! Style Annotator

use crate::classify::BoardItem;
use crate::dom::BoardDom;
use crate::flags::Flags;
use crate::markup;

const OPACITY: &str = "opacity";
const BACKGROUND: &str = "background-color";

/// The background an item should carry, if any.
pub fn background_for<N>(item: &BoardItem<N>, flags: &Flags) -> Option<&'static str> {
    if item.has_visible_children {
        return None;
    }
    if flags.highlight_in_review && item.facts.in_review {
        Some(markup::REVIEW_BACKGROUND)
    } else if flags.highlight_in_progress && item.facts.status == markup::IN_PROGRESS_STATUS {
        Some(markup::IN_PROGRESS_BACKGROUND)
    } else {
        None
    }
}

pub fn is_muted<N>(item: &BoardItem<N>, flags: &Flags) -> bool {
    flags.mute_done && item.facts.status == markup::DONE_STATUS
}

pub fn apply_styles<D: BoardDom + ?Sized>(dom: &mut D, item: &BoardItem<D::Node>, flags: &Flags) {
    let opacity = if is_muted(item, flags) { markup::MUTED_OPACITY } else { "" };
    dom.set_style(&item.node, OPACITY, opacity);
    dom.set_style(&item.node, BACKGROUND, background_for(item, flags).unwrap_or(""));
}

pub fn clear_styles<D: BoardDom + ?Sized>(dom: &mut D, node: &D::Node) {
    dom.set_style(node, OPACITY, "");
    dom.set_style(node, BACKGROUND, "");
}
