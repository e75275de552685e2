//! Board Fixtures
//!
//! Builds milestone-board markup shaped like the real page, so tests and
//! downstream crates can exercise the engine without a browser.

use crate::classify::ItemKind;
use crate::markup;
use crate::memory::MemoryDom;

#[derive(Debug, Clone)]
pub struct Card {
    id: u64,
    kind: ItemKind,
    status: Option<String>,
    weight: Option<i64>,
    in_review: bool,
    children: Vec<Card>,
}

impl Card {
    pub fn issue(id: u64) -> Self {
        Self::new(id, ItemKind::Issue)
    }

    pub fn task(id: u64) -> Self {
        Self::new(id, ItemKind::Task)
    }

    fn new(id: u64, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            status: None,
            weight: None,
            in_review: false,
            children: Vec::new(),
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Carries the `stage::In-review` label.
    pub fn in_review(mut self) -> Self {
        self.in_review = true;
        self
    }

    /// Renders `child` already nested under this card.
    pub fn child(mut self, child: Card) -> Self {
        self.children.push(child);
        self
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Card::count).sum::<usize>()
    }

    fn render(&self, out: &mut String) {
        let icon = match self.kind {
            ItemKind::Issue => markup::ISSUE_ICON_ID,
            ItemKind::Task => markup::TASK_ICON_ID,
        };
        out.push_str(r#"<li class="gl-py-3">"#);
        out.push_str(&format!(r#"<svg {}="{}"></svg>"#, markup::TEST_ID_ATTR, icon));
        out.push_str(&format!(r#"<span class="issuable-number">#{}</span>"#, self.id));
        out.push_str(&format!(r#"<a class="gl-link" href="/acme/web/-/issues/{0}">Item {0}</a>"#, self.id));
        if let Some(status) = &self.status {
            out.push_str(&format!(r#"<span class="work-item-status">{}</span>"#, status));
        }
        if let Some(weight) = self.weight {
            out.push_str(&format!(
                r#"<span class="weight"><svg {}="{}"></svg> {}</span>"#,
                markup::TEST_ID_ATTR,
                markup::WEIGHT_ICON_ID,
                weight
            ));
        }
        if self.in_review {
            out.push_str(
                r#"<a class="gl-link gl-label-link" href="/acme/web/-/issues?label_name=stage%3A%3AIn-review">stage::In-review</a>"#,
            );
        }
        if !self.children.is_empty() {
            out.push_str(&format!(r#"<ul class="{}">"#, markup::CHILD_LIST_CLASS));
            for child in &self.children {
                child.render(out);
            }
            out.push_str("</ul>");
        }
        out.push_str("</li>");
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoardBuilder {
    columns: Vec<(String, Vec<Card>)>,
    project_id: Option<String>,
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, title: &str, cards: Vec<Card>) -> Self {
        self.columns.push((title.to_string(), cards));
        self
    }

    pub fn project(mut self, id: &str) -> Self {
        self.project_id = Some(id.to_string());
        self
    }

    pub fn html(&self) -> String {
        let mut out = String::new();
        if let Some(project) = &self.project_id {
            out.push_str(&format!(r#"<div {}="{}"></div>"#, markup::PROJECT_ID_ATTR, project));
        }
        out.push_str(&format!(r#"<div id="{}"><div class="gl-flex gl-flex-wrap">"#, markup::BOARD_ID));
        for (title, cards) in &self.columns {
            let count: usize = cards.iter().map(Card::count).sum();
            out.push_str(r#"<div class="gl-col-md-4"><div class="gl-card gl-mb-5">"#);
            out.push_str(r#"<div class="gl-card-header">"#);
            out.push_str(&format!(
                r#"<div class="gl-text-default">{}<span class="gl-text-subtle gl-text-sm">({} items)</span></div>"#,
                title, count
            ));
            out.push_str(&format!(
                r#"<div class="gl-font-bold gl-whitespace-nowrap"><span><svg {}="{}"></svg> {}</span></div>"#,
                markup::TEST_ID_ATTR,
                markup::ISSUE_ICON_ID,
                count
            ));
            out.push_str("</div>");
            out.push_str(&format!(
                r#"<div class="gl-card-body"><ul class="content-list {}">"#,
                markup::COLUMN_LIST_CLASS
            ));
            for card in cards {
                card.render(&mut out);
            }
            out.push_str("</ul></div></div></div>");
        }
        out.push_str("</div></div>");
        out
    }

    pub fn build(&self) -> MemoryDom {
        MemoryDom::from_html(&self.html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{board_items, column_lists, ItemId};
    use crate::dom::BoardDom;

    #[test]
    fn test_builder_produces_classifiable_board() {
        let dom = BoardBuilder::new()
            .project("42")
            .column("Ongoing", vec![Card::issue(1).status("In progress").weight(3).in_review()])
            .column("Completed", vec![])
            .build();
        assert_eq!(column_lists(&dom).len(), 2);
        let items = board_items(&dom);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), Some(ItemId(1)));
        assert_eq!(items[0].facts.weight, 3);
        assert!(items[0].facts.in_review);
        assert_eq!(dom.attribute(&dom.board(), "id").as_deref(), Some(markup::BOARD_ID));
    }
}
