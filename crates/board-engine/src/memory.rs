//! In-Memory Board Tree
//!
//! Arena-backed [`BoardDom`] used by tests and native tooling. It counts
//! effective mutations so idempotence can be asserted directly.

use crate::dom::BoardDom;
#[cfg(any(test, feature = "test-support"))]
use crate::markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        style: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    document: NodeId,
    board: NodeId,
    mutations: usize,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document whose body doubles as the board.
    pub fn new() -> Self {
        let body = NodeData {
            kind: NodeKind::Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
                style: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            document: NodeId(0),
            board: NodeId(0),
            mutations: 0,
        }
    }

    /// Parse an HTML fragment; the board is the `#tab-issues` element when present.
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_html(html: &str) -> Self {
        use std::collections::HashMap;

        let parsed = scraper::Html::parse_fragment(html);
        let mut dom = Self::new();
        let document = dom.document;
        let mut mapping = HashMap::new();

        for node in parsed.tree.root().descendants() {
            let parent = node
                .parent()
                .and_then(|p| mapping.get(&p.id()).copied())
                .unwrap_or(document);
            let created = match node.value() {
                scraper::Node::Element(el) if el.name() == "html" => {
                    mapping.insert(node.id(), parent);
                    continue;
                }
                scraper::Node::Element(el) => {
                    let mut attrs = Vec::new();
                    let mut style = Vec::new();
                    for (name, value) in el.attrs() {
                        if name == "style" {
                            style = parse_style(value);
                        } else {
                            attrs.push((name.to_string(), value.to_string()));
                        }
                    }
                    Some(dom.push(NodeKind::Element {
                        tag: el.name().to_ascii_lowercase(),
                        attrs,
                        style,
                    }))
                }
                scraper::Node::Text(text) => {
                    let text: &str = text;
                    Some(dom.push(NodeKind::Text(text.to_string())))
                }
                _ => None,
            };
            if let Some(id) = created {
                dom.attach(parent, id, None);
                mapping.insert(node.id(), id);
            }
        }

        dom.board = dom.find_by_id(markup::BOARD_ID).unwrap_or(document);
        dom.mutations = 0;
        dom
    }

    /// Number of effective changes applied since construction.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.document)
            .chain(crate::dom::descendants(self, &self.document))
            .find(|n| self.attribute(n, "id").as_deref() == Some(id))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.0].parent;
        }
        false
    }

    fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let kind = self.nodes[node.0].kind.clone();
        let children = self.nodes[node.0].children.clone();
        let copy = self.push(kind);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.attach(copy, child_copy, None);
        }
        copy
    }
}

fn parse_style(css: &str) -> Vec<(String, String)> {
    css.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            (!name.is_empty() && !value.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

impl BoardDom for MemoryDom {
    type Node = NodeId;

    fn board(&self) -> NodeId {
        self.board
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Element { .. })
    }

    fn tag_name(&self, node: &NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => tag.clone(),
            NodeKind::Text(_) => String::new(),
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) if v == value => return,
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
            self.mutations += 1;
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element { .. } => self.nodes[node.0]
                .children
                .iter()
                .map(|c| self.text_content(c))
                .collect(),
        }
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        if let NodeKind::Text(current) = &mut self.nodes[node.0].kind {
            if current != text {
                *current = text.to_string();
                self.mutations += 1;
            }
            return;
        }
        let children = self.nodes[node.0].children.clone();
        if let [only] = children.as_slice() {
            if matches!(&self.nodes[only.0].kind, NodeKind::Text(t) if t == text) {
                return;
            }
        }
        for child in children {
            self.detach(child);
        }
        if !text.is_empty() {
            let text_node = self.push(NodeKind::Text(text.to_string()));
            self.attach(*node, text_node, None);
        }
        self.mutations += 1;
    }

    fn style(&self, node: &NodeId, property: &str) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Element { style, .. } => style
                .iter()
                .find(|(k, _)| k == property)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
            NodeKind::Text(_) => String::new(),
        }
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        if let NodeKind::Element { style, .. } = &mut self.nodes[node.0].kind {
            let position = style.iter().position(|(k, _)| k == property);
            match (position, value.is_empty()) {
                (None, true) => return,
                (Some(i), true) => {
                    style.remove(i);
                }
                (Some(i), false) if style[i].1 == value => return,
                (Some(i), false) => style[i].1 = value.to_string(),
                (None, false) => style.push((property.to_string(), value.to_string())),
            }
            self.mutations += 1;
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            style: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn deep_clone(&mut self, node: &NodeId) -> NodeId {
        self.clone_subtree(*node)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.is_inclusive_ancestor(*child, *parent) {
            return;
        }
        self.detach(*child);
        self.attach(*parent, *child, None);
        self.mutations += 1;
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        if self.is_inclusive_ancestor(*child, *parent) || child == reference {
            return;
        }
        self.detach(*child);
        let index = self.nodes[parent.0].children.iter().position(|c| c == reference);
        self.attach(*parent, *child, index);
        self.mutations += 1;
    }

    fn remove(&mut self, node: &NodeId) {
        if self.nodes[node.0].parent.is_some() {
            self.detach(*node);
            self.mutations += 1;
        }
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.is_inclusive_ancestor(self.document, *node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{query, Selector};

    #[test]
    fn test_from_html_locates_board() {
        let dom = MemoryDom::from_html(
            r#"<main><div id="tab-issues" data-project-id="7"><ul></ul></div></main>"#,
        );
        assert_eq!(dom.attribute(&dom.board(), "data-project-id").as_deref(), Some("7"));
        assert_eq!(dom.mutation_count(), 0);
    }

    #[test]
    fn test_inline_style_roundtrip() {
        let mut dom = MemoryDom::from_html(r#"<div id="tab-issues" style="display: flex"></div>"#);
        let board = dom.board();
        assert_eq!(dom.style(&board, "display"), "flex");
        dom.set_style(&board, "display", "flex");
        assert_eq!(dom.mutation_count(), 0);
        dom.set_style(&board, "display", "");
        assert_eq!(dom.style(&board, "display"), "");
        assert_eq!(dom.mutation_count(), 1);
    }

    #[test]
    fn test_remove_disconnects_subtree() {
        let mut dom = MemoryDom::from_html(r#"<div id="tab-issues"><ul><li>x</li></ul></div>"#);
        let board = dom.board();
        let ul = query(&dom, &board, Selector::Tag("ul")).unwrap();
        let li = query(&dom, &board, Selector::Tag("li")).unwrap();
        dom.remove(&ul);
        assert!(!dom.is_connected(&li));
        assert!(dom.is_connected(&board));
    }

    #[test]
    fn test_append_refuses_cycles() {
        let mut dom = MemoryDom::from_html(r#"<div id="tab-issues"><ul><li></li></ul></div>"#);
        let board = dom.board();
        let ul = query(&dom, &board, Selector::Tag("ul")).unwrap();
        let li = query(&dom, &board, Selector::Tag("li")).unwrap();
        dom.append_child(&li, &ul);
        assert_eq!(dom.parent(&li), Some(ul));
        assert_eq!(dom.mutation_count(), 0);
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut dom = MemoryDom::from_html(r#"<div id="tab-issues"><p class="x">hi</p></div>"#);
        let board = dom.board();
        let p = query(&dom, &board, Selector::Tag("p")).unwrap();
        let copy = dom.deep_clone(&p);
        assert_ne!(copy, p);
        assert!(!dom.is_connected(&copy));
        assert_eq!(dom.text_content(&copy), "hi");
        assert!(dom.has_class(&copy, "x"));
    }
}
