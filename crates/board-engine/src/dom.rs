//! Host Tree Abstraction
//!
//! Everything the engine does to the board goes through [`BoardDom`]. The
//! browser build implements it over `web_sys::Node`, tests use
//! [`crate::memory::MemoryDom`].

use std::fmt;

/// Minimal tree API the overlay components need.
///
/// Nodes are cheap handles. Mutating methods take `&mut self` even where the
/// backing implementation does not need it, so callers cannot interleave a
/// traversal snapshot with writes by accident.
pub trait BoardDom {
    type Node: Clone + PartialEq + fmt::Debug;

    /// The board container every query is scoped to.
    fn board(&self) -> Self::Node;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn is_element(&self, node: &Self::Node) -> bool;
    /// Lowercase tag name; empty for text nodes.
    fn tag_name(&self, node: &Self::Node) -> String;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&mut self, node: &Self::Node, text: &str);
    /// Inline style property value, empty when unset.
    fn style(&self, node: &Self::Node, property: &str) -> String;
    /// Setting an empty value removes the property.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);
    fn create_element(&mut self, tag: &str) -> Self::Node;
    fn create_text(&mut self, text: &str) -> Self::Node;
    fn deep_clone(&mut self, node: &Self::Node) -> Self::Node;
    /// Appends `child`, detaching it from its current parent first.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);
    fn remove(&mut self, node: &Self::Node);
    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Declarative element matcher, a tiny stand-in for CSS selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Tag(&'static str),
    Class(&'static str),
    Id(&'static str),
    HasAttr(&'static str),
    Attr(&'static str, &'static str),
    AttrContains(&'static str, &'static str),
    /// Every selector must match.
    All(&'static [Selector]),
    /// At least one selector must match.
    Any(&'static [Selector]),
}

impl Selector {
    pub fn matches<D: BoardDom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        if !dom.is_element(node) {
            return false;
        }
        match *self {
            Selector::Tag(tag) => dom.tag_name(node) == tag,
            Selector::Class(class) => dom.has_class(node, class),
            Selector::Id(id) => dom.attribute(node, "id").as_deref() == Some(id),
            Selector::HasAttr(name) => dom.attribute(node, name).is_some(),
            Selector::Attr(name, value) => dom.attribute(node, name).as_deref() == Some(value),
            Selector::AttrContains(name, needle) => dom
                .attribute(node, name)
                .map(|v| v.contains(needle))
                .unwrap_or(false),
            Selector::All(parts) => parts.iter().all(|s| s.matches(dom, node)),
            Selector::Any(parts) => parts.iter().any(|s| s.matches(dom, node)),
        }
    }
}

/// All nodes below `root` in document order, `root` excluded.
pub fn descendants<D: BoardDom + ?Sized>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut stack: Vec<D::Node> = dom.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        stack.extend(dom.children(&node).into_iter().rev());
        out.push(node);
    }
    out
}

pub fn query_all<D: BoardDom + ?Sized>(dom: &D, root: &D::Node, selector: Selector) -> Vec<D::Node> {
    descendants(dom, root)
        .into_iter()
        .filter(|n| selector.matches(dom, n))
        .collect()
}

pub fn query<D: BoardDom + ?Sized>(dom: &D, root: &D::Node, selector: Selector) -> Option<D::Node> {
    descendants(dom, root)
        .into_iter()
        .find(|n| selector.matches(dom, n))
}

/// Nearest inclusive ancestor matching `selector`, like `Element.closest`.
pub fn closest<D: BoardDom + ?Sized>(dom: &D, node: &D::Node, selector: Selector) -> Option<D::Node> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if selector.matches(dom, &n) {
            return Some(n);
        }
        current = dom.parent(&n);
    }
    None
}

/// Nearest strict ancestor matching `selector`.
pub fn closest_ancestor<D: BoardDom + ?Sized>(dom: &D, node: &D::Node, selector: Selector) -> Option<D::Node> {
    dom.parent(node).and_then(|p| closest(dom, &p, selector))
}

pub fn element_children<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    dom.children(node)
        .into_iter()
        .filter(|c| dom.is_element(c))
        .collect()
}

/// First direct text child whose trimmed content is non-empty.
pub fn first_text_child<D: BoardDom + ?Sized>(dom: &D, node: &D::Node) -> Option<D::Node> {
    dom.children(node)
        .into_iter()
        .find(|c| !dom.is_element(c) && !dom.text_content(c).trim().is_empty())
}

/// Moves `child` to the end of `parent` unless it already sits there.
pub fn move_to_end<D: BoardDom + ?Sized>(dom: &mut D, parent: &D::Node, child: &D::Node) -> bool {
    if dom.parent(child).as_ref() == Some(parent) && dom.children(parent).last() == Some(child) {
        return false;
    }
    dom.append_child(parent, child);
    true
}
