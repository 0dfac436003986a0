use std::{cell::RefCell, fmt};

use shared::protocol::PresentationStyle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    config::NavigationContext,
    coordinator::{Coordinator, WeakCoordinator},
    events::NavigationEvent,
    modal_stack::{ModalStack, PresentableItem},
    route::Route,
};

pub struct Router {
    main_route: RefCell<Option<Route>>,
    push_stack: RefCell<Vec<Route>>,
    modal: ModalStack,
    owner: RefCell<WeakCoordinator>,
    events: broadcast::Sender<NavigationEvent>,
}

impl Router {
    pub(crate) fn new(context: NavigationContext) -> Self {
        let (events, _) = broadcast::channel(context.event_capacity.max(1));
        Self {
            main_route: RefCell::new(None),
            push_stack: RefCell::new(Vec::new()),
            modal: ModalStack::new(context, events.clone()),
            owner: RefCell::new(WeakCoordinator::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    pub fn main_route(&self) -> Option<Route> {
        self.main_route.borrow().clone()
    }

    pub fn push_stack(&self) -> Vec<Route> {
        self.push_stack.borrow().clone()
    }

    pub fn push_identities(&self) -> Vec<String> {
        self.push_stack
            .borrow()
            .iter()
            .map(|route| route.identity().to_string())
            .collect()
    }

    pub fn modal_stack(&self) -> &ModalStack {
        &self.modal
    }

    pub fn owner(&self) -> Option<Coordinator> {
        self.owner.borrow().upgrade()
    }

    pub(crate) fn set_owner(&self, owner: WeakCoordinator) {
        *self.owner.borrow_mut() = owner;
    }

    pub(crate) fn set_context(&self, context: NavigationContext) {
        self.modal.set_context(context);
    }

    pub(crate) fn set_main_route(&self, route: Route) {
        let identity = route.identity().to_string();
        *self.main_route.borrow_mut() = Some(route);
        self.emit(NavigationEvent::MainRouteSet { identity });
    }

    pub async fn navigate(&self, route: Route, style: Option<PresentationStyle>, animated: bool) {
        let style = style.unwrap_or_else(|| route.style().clone());
        if style.is_push() {
            self.push(route, animated);
        } else {
            self.present(route, Some(style), animated).await;
        }
    }

    pub async fn present(&self, route: Route, style: Option<PresentationStyle>, animated: bool) {
        let style = style.unwrap_or_else(|| route.style().clone());
        if style.is_push() {
            self.push(route, animated);
        } else {
            self.present_with_style(route, style, animated).await;
        }
    }

    pub(crate) async fn present_item(&self, item: PresentableItem) {
        debug!(item = item.id(), style = ?item.style(), "router: presenting");
        self.modal.present(item).await;
    }

    pub fn pop(&self, animated: bool) -> Option<Route> {
        let popped = self.push_stack.borrow_mut().pop()?;
        self.emit(NavigationEvent::Popped {
            identities: vec![popped.identity().to_string()],
            animated,
        });
        Some(popped)
    }

    pub fn pop_to_root(&self, animated: bool) {
        let popped = std::mem::take(&mut *self.push_stack.borrow_mut());
        self.emit_popped(popped, animated);
    }

    /// Truncates the push stack after the first route matching `is_target`.
    /// A match that is already topmost still counts as success. Returns
    /// whether any route matched.
    pub fn pop_to_view(&self, is_target: impl Fn(&Route) -> bool, animated: bool) -> bool {
        let popped = {
            let mut stack = self.push_stack.borrow_mut();
            let Some(index) = stack.iter().position(|route| is_target(route)) else {
                return false;
            };
            stack.split_off(index + 1)
        };
        self.emit_popped(popped, animated);
        true
    }

    /// Identity-based [`Router::pop_to_view`]. Logs a miss instead of failing,
    /// since the target may have left the stack in the meantime.
    pub fn pop_to(&self, identity: &str, animated: bool) -> bool {
        let found = self.pop_to_view(|route| route.identity() == identity, animated);
        if !found {
            warn!(identity, "router: pop target not on the push stack");
        }
        found
    }

    pub fn sync_push_stack(&self, len: usize) {
        let popped = {
            let mut stack = self.push_stack.borrow_mut();
            if len >= stack.len() {
                return;
            }
            stack.split_off(len)
        };
        self.emit_popped(popped, false);
    }

    pub async fn dismiss(&self, animated: bool) {
        self.modal.remove_last(animated).await;
    }

    /// With `finish_flow`, the hosting entry in the parent coordinator is
    /// dismissed (no-op without a parent). Otherwise the newest modal entry is
    /// dismissed, or the push stack popped when there is none.
    pub async fn close(&self, animated: bool, finish_flow: bool) {
        if finish_flow {
            // Entries on this router's own modal stack are not drained first.
            let Some(parent) = self.owner().and_then(|owner| owner.parent()) else {
                debug!("router: close without a parent is a no-op");
                return;
            };
            parent.router().dismiss(animated).await;
            return;
        }

        if self.modal.is_empty() {
            self.pop(animated);
        } else {
            self.dismiss(animated).await;
        }
    }

    pub async fn clean(&self, animated: bool, with_main_route: bool) {
        let popped = std::mem::take(&mut *self.push_stack.borrow_mut());
        self.emit_popped(popped, animated);
        self.modal.clean(animated).await;
        *self.owner.borrow_mut() = WeakCoordinator::default();
        if with_main_route && self.main_route.borrow_mut().take().is_some() {
            self.emit(NavigationEvent::MainRouteCleared);
        }
    }

    pub async fn restart(&self, animated: bool) {
        self.pop_to_root(animated);
        self.modal.clean(animated).await;
    }

    pub async fn handle_external_dismiss(&self, item_id: &str) -> bool {
        let dismissed = self.modal.dismiss_item(item_id).await;
        if !dismissed {
            debug!(item = item_id, "router: externally dismissed item already gone");
        }
        dismissed
    }

    fn push(&self, route: Route, animated: bool) {
        let identity = route.identity().to_string();
        self.push_stack.borrow_mut().push(route);
        debug!(%identity, "router: pushed");
        self.emit(NavigationEvent::Pushed { identity, animated });
    }

    async fn present_with_style(&self, route: Route, style: PresentationStyle, animated: bool) {
        let item = PresentableItem::new(route.identity(), style, route.factory()).animated(animated);
        self.present_item(item).await;
    }

    fn emit_popped(&self, popped: Vec<Route>, animated: bool) {
        if popped.is_empty() {
            return;
        }
        self.emit(NavigationEvent::Popped {
            identities: popped
                .iter()
                .map(|route| route.identity().to_string())
                .collect(),
            animated,
        });
    }

    fn emit(&self, event: NavigationEvent) {
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("main_route", &self.main_route.borrow())
            .field("push_stack", &self.push_identities())
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
