use serde::Serialize;
use shared::domain::{CoordinatorId, CoordinatorKind, PagePosition};

use crate::{coordinator::Coordinator, modal_stack::SlotSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    pub id: CoordinatorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub kind: CoordinatorKind,
    pub main_route: Option<String>,
    pub push_stack: Vec<String>,
    pub modal_slots: Vec<SlotSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_page: Option<PagePosition>,
    pub children: Vec<TreeSnapshot>,
}

impl TreeSnapshot {
    pub fn find(&self, id: &CoordinatorId) -> Option<&TreeSnapshot> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeSnapshot::node_count).sum::<usize>()
    }
}

impl Coordinator {
    pub fn snapshot(&self) -> TreeSnapshot {
        let router = self.router();
        TreeSnapshot {
            id: self.id().clone(),
            tag: self.tag(),
            kind: self.kind(),
            main_route: router
                .main_route()
                .map(|route| route.identity().to_string()),
            push_stack: router.push_identities(),
            modal_slots: router.modal_stack().snapshot(),
            selected_page: self
                .as_tab_host()
                .map(|tab_host| tab_host.current_page().position()),
            children: self.children().iter().map(Coordinator::snapshot).collect(),
        }
    }
}
