//! Live Page Tree
//!
//! [`BoardDom`] over `web_sys::Node`. Writes that would not change anything
//! are skipped so the page's own observers stay quiet.

use board_engine::BoardDom;
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

pub struct WebDom {
    document: Document,
    board: Element,
}

impl WebDom {
    pub fn new(document: Document, board: Element) -> Self {
        Self { document, board }
    }

    /// Stands in when the page refuses to create a node.
    fn placeholder(&self) -> Node {
        self.document.create_text_node("").into()
    }
}

fn element(node: &Node) -> Option<&Element> {
    node.dyn_ref::<Element>()
}

impl BoardDom for WebDom {
    type Node = Node;

    fn board(&self) -> Node {
        self.board.clone().into()
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn tag_name(&self, node: &Node) -> String {
        element(node).map(|e| e.tag_name().to_lowercase()).unwrap_or_default()
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        element(node).and_then(|e| e.get_attribute(name))
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) {
        let Some(el) = element(node) else { return };
        if el.get_attribute(name).as_deref() == Some(value) {
            return;
        }
        if let Err(e) = el.set_attribute(name, value) {
            warn!("set_attribute {}={:?} failed: {:?}", name, value, e);
        }
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, node: &Node, text: &str) {
        if node.text_content().as_deref() != Some(text) {
            node.set_text_content(Some(text));
        }
    }

    fn style(&self, node: &Node, property: &str) -> String {
        node.dyn_ref::<HtmlElement>()
            .and_then(|e| e.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&mut self, node: &Node, property: &str, value: &str) {
        let Some(el) = node.dyn_ref::<HtmlElement>() else { return };
        let style = el.style();
        if style.get_property_value(property).ok().as_deref() == Some(value) {
            return;
        }
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        if let Err(e) = result {
            warn!("style {}={:?} failed: {:?}", property, value, e);
        }
    }

    fn create_element(&mut self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(el) => el.into(),
            Err(e) => {
                warn!("create_element({}) failed: {:?}", tag, e);
                self.placeholder()
            }
        }
    }

    fn create_text(&mut self, text: &str) -> Node {
        self.document.create_text_node(text).into()
    }

    fn deep_clone(&mut self, node: &Node) -> Node {
        match node.clone_node_with_deep(true) {
            Ok(copy) => copy,
            Err(e) => {
                warn!("clone failed: {:?}", e);
                self.placeholder()
            }
        }
    }

    fn append_child(&mut self, parent: &Node, child: &Node) {
        if let Err(e) = parent.append_child(child) {
            warn!("append_child failed: {:?}", e);
        }
    }

    fn insert_before(&mut self, parent: &Node, child: &Node, reference: &Node) {
        if let Err(e) = parent.insert_before(child, Some(reference)) {
            warn!("insert_before failed: {:?}", e);
        }
    }

    fn remove(&mut self, node: &Node) {
        if let Some(parent) = node.parent_node() {
            if let Err(e) = parent.remove_child(node) {
                warn!("remove_child failed: {:?}", e);
            }
        }
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        element(node).map(|e| e.class_list().contains(class)).unwrap_or(false)
    }
}
