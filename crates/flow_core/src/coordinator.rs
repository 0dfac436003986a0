use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use async_trait::async_trait;
use futures::FutureExt;
use shared::{
    domain::{CoordinatorId, CoordinatorKind},
    error::NavigationError,
    protocol::PresentationStyle,
};
use tracing::{debug, info, warn};

use crate::{
    config::NavigationContext,
    content::ScreenContent,
    modal_stack::{DismissSignal, PresentableItem},
    route::Route,
    router::Router,
    tab_host::TabHostState,
    Result,
};

/// Entry point of a concrete flow. A plain coordinator cannot be built
/// without one.
#[async_trait(?Send)]
pub trait Flow {
    fn label(&self) -> &str {
        "flow"
    }

    async fn start(&self, coordinator: &Coordinator) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct EntryFlow {
    label: String,
    route: Route,
}

impl EntryFlow {
    pub fn new(label: impl Into<String>, route: Route) -> Self {
        Self {
            label: label.into(),
            route,
        }
    }
}

#[async_trait(?Send)]
impl Flow for EntryFlow {
    fn label(&self) -> &str {
        &self.label
    }

    async fn start(&self, coordinator: &Coordinator) -> anyhow::Result<()> {
        coordinator.start_flow(self.route.clone(), false).await;
        Ok(())
    }
}

pub(crate) enum Role {
    Plain(Rc<dyn Flow>),
    TabHost(TabHostState),
}

pub(crate) struct Node {
    id: CoordinatorId,
    tag: RefCell<Option<String>>,
    parent: RefCell<Weak<Node>>,
    children: RefCell<Vec<Coordinator>>,
    router: Router,
    context: RefCell<NavigationContext>,
    pub(crate) role: Role,
}

/// Parents own their children; a child only holds a weak reference back to
/// its parent, so a detached subtree is released with its last handle.
#[derive(Clone)]
pub struct Coordinator {
    pub(crate) node: Rc<Node>,
}

#[derive(Clone, Default)]
pub struct WeakCoordinator {
    node: Weak<Node>,
}

impl WeakCoordinator {
    pub fn upgrade(&self) -> Option<Coordinator> {
        self.node.upgrade().map(|node| Coordinator { node })
    }
}

impl Coordinator {
    pub fn new(flow: impl Flow + 'static) -> Self {
        Self::with_context(flow, NavigationContext::default())
    }

    pub fn with_context(flow: impl Flow + 'static, context: NavigationContext) -> Self {
        let id = CoordinatorId::generate(flow.label());
        Self::build(id, Role::Plain(Rc::new(flow)), context)
    }

    pub(crate) fn build(id: CoordinatorId, role: Role, context: NavigationContext) -> Self {
        let node = Rc::new_cyclic(|weak: &Weak<Node>| {
            let router = Router::new(context.clone());
            router.set_owner(WeakCoordinator { node: weak.clone() });
            Node {
                id,
                tag: RefCell::new(None),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                router,
                context: RefCell::new(context),
                role,
            }
        });
        Self { node }
    }

    pub fn id(&self) -> &CoordinatorId {
        &self.node.id
    }

    pub fn tag(&self) -> Option<String> {
        self.node.tag.borrow().clone()
    }

    pub(crate) fn set_tag(&self, tag: Option<String>) {
        *self.node.tag.borrow_mut() = tag;
    }

    pub fn kind(&self) -> CoordinatorKind {
        match self.node.role {
            Role::Plain(_) => CoordinatorKind::Plain,
            Role::TabHost(_) => CoordinatorKind::TabHost,
        }
    }

    pub fn is_tab_host(&self) -> bool {
        self.kind() == CoordinatorKind::TabHost
    }

    pub fn router(&self) -> &Router {
        &self.node.router
    }

    pub fn context(&self) -> NavigationContext {
        self.node.context.borrow().clone()
    }

    pub fn parent(&self) -> Option<Coordinator> {
        self.node
            .parent
            .borrow()
            .upgrade()
            .map(|node| Coordinator { node })
    }

    pub fn children(&self) -> Vec<Coordinator> {
        self.node.children.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    pub fn require_parent(&self) -> Result<Coordinator> {
        self.parent()
            .ok_or_else(|| NavigationError::DetachedCoordinator {
                coordinator: self.id().clone(),
            })
    }

    pub fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            node: Rc::downgrade(&self.node),
        }
    }

    pub fn ptr_eq(&self, other: &Coordinator) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub async fn start(&self) -> Result<()> {
        info!(coordinator = %self.id(), kind = ?self.kind(), "starting flow");
        match &self.node.role {
            Role::Plain(flow) => {
                let flow = Rc::clone(flow);
                flow.start(self)
                    .await
                    .map_err(|source| NavigationError::FlowStart {
                        coordinator: self.id().clone(),
                        source,
                    })
            }
            Role::TabHost(_) => self.start_tab_host().await,
        }
    }

    pub async fn start_flow(&self, route: Route, animated: bool) {
        self.node.router.restart(animated).await;
        self.node.router.set_owner(self.downgrade());
        self.node.router.set_main_route(route);
    }

    /// Attaches `child` and presents it on this coordinator's modal stack.
    /// A `Push` style becomes a sheet: push navigation never crosses a
    /// coordinator boundary.
    pub async fn navigate_to(
        &self,
        child: &Coordinator,
        style: PresentationStyle,
        animated: bool,
    ) -> Result<()> {
        if child.ptr_eq(self) || child.is_ancestor_of(self) {
            warn!(parent = %self.id(), child = %child.id(), "navigate_to: cycle rejected");
            return Ok(());
        }
        self.attach_child(child);

        let style = style.across_coordinator_boundary();
        let content = child.downgrade();
        let item = PresentableItem::new(
            child.id().to_string(),
            style,
            Rc::new(move || ScreenContent::Coordinator(content.clone())),
        )
        .animated(animated)
        .hosting_coordinator(teardown_signal(self, child));

        self.node.router.present_item(item).await;
        child.start().await
    }

    /// Plain coordinators descend into their most recently attached child; a
    /// tab host child is entered through its selected page, or is itself the
    /// top while it has no pages.
    pub fn top_coordinator(&self) -> Result<Coordinator> {
        let Some(last) = self.node.children.borrow().last().cloned() else {
            return Ok(self.clone());
        };
        let next = match last.as_tab_host() {
            Some(_) if last.node.children.borrow().is_empty() => return Ok(last),
            Some(tab_host) => tab_host.selected_coordinator()?,
            None => last,
        };
        next.top_coordinator()
    }

    /// Detaches this coordinator after finishing its children and emptying its
    /// stacks. With `with_dismiss` the hosting presentation is closed first;
    /// without it the content is assumed to be gone already.
    pub async fn finish_flow(&self, animated: bool, with_dismiss: bool) {
        info!(coordinator = %self.id(), with_dismiss, "finishing flow");
        if with_dismiss {
            match self.parent() {
                // A tab cannot dismiss the shared container on its own.
                Some(parent) if parent.is_tab_host() => {
                    parent.router().close(animated, true).await;
                }
                _ => self.node.router.close(animated, true).await,
            }
        }

        self.remove_children(animated).await;
        self.node.router.clean(animated, true).await;
        self.detach_from_parent();
    }

    /// Inserts this detached coordinator on top of whatever flow is currently
    /// topmost under `main`. Returns `false` when there is nothing to do.
    pub async fn force_presentation(
        &self,
        style: PresentationStyle,
        main: &Coordinator,
        animated: bool,
    ) -> Result<bool> {
        let top = main.top_coordinator()?;
        if self.is_attached() || top.ptr_eq(self) {
            warn!(coordinator = %self.id(), "force presentation: coordinator already in the tree");
            return Ok(false);
        }
        top.navigate_to(self, style, animated).await?;
        Ok(true)
    }

    pub async fn remove_child(&self, child: &Coordinator, animated: bool) {
        if !child.parent().is_some_and(|parent| parent.ptr_eq(self)) {
            debug!(parent = %self.id(), child = %child.id(), "remove_child: not a child");
            return;
        }
        Box::pin(child.finish_flow(animated, false)).await;
        self.node
            .children
            .borrow_mut()
            .retain(|candidate| !candidate.ptr_eq(child));
    }

    pub async fn remove_children(&self, animated: bool) {
        loop {
            let first = self.node.children.borrow().first().cloned();
            let Some(child) = first else {
                break;
            };
            self.remove_child(&child, animated).await;
            // A child whose parent link was already broken is dropped here.
            self.node
                .children
                .borrow_mut()
                .retain(|candidate| !candidate.ptr_eq(&child));
        }
    }

    pub async fn close(&self, animated: bool, finish_flow: bool) {
        self.node.router.close(animated, finish_flow).await;
    }

    pub async fn restart(&self, animated: bool) {
        self.node.router.restart(animated).await;
    }

    pub(crate) fn attach_child(&self, child: &Coordinator) {
        if let Some(previous) = child.parent() {
            if previous.ptr_eq(self) {
                return;
            }
            child.detach_from_parent();
        }
        *child.node.parent.borrow_mut() = Rc::downgrade(&self.node);
        self.node.children.borrow_mut().push(child.clone());
        child.adopt_context(self.context());
        debug!(parent = %self.id(), child = %child.id(), "attached child");
    }

    fn detach_from_parent(&self) {
        let parent = std::mem::take(&mut *self.node.parent.borrow_mut());
        if let Some(parent) = parent.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|candidate| !Rc::ptr_eq(&candidate.node, &self.node));
            debug!(parent = %parent.id, child = %self.id(), "detached child");
        }
    }

    fn is_ancestor_of(&self, other: &Coordinator) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    fn adopt_context(&self, context: NavigationContext) {
        self.node.router.set_context(context.clone());
        *self.node.context.borrow_mut() = context.clone();
        for child in self.children() {
            child.adopt_context(context.clone());
        }
    }
}

/// Soft-finishes `child` once its hosting entry leaves `parent`'s modal stack,
/// as long as `parent` still owns it.
fn teardown_signal(parent: &Coordinator, child: &Coordinator) -> DismissSignal {
    let parent = parent.downgrade();
    let child = child.downgrade();
    Box::new(move || {
        async move {
            let (Some(parent), Some(child)) = (parent.upgrade(), child.upgrade()) else {
                return;
            };
            if child.parent().is_some_and(|current| current.ptr_eq(&parent)) {
                child.finish_flow(false, false).await;
            }
        }
        .boxed_local()
    })
}

impl PartialEq for Coordinator {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Coordinator {}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("id", self.id())
            .field("kind", &self.kind())
            .field("tag", &self.tag())
            .field("children", &self.node.children.borrow().len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for WeakCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(coordinator) => write!(f, "WeakCoordinator({})", coordinator.id()),
            None => f.write_str("WeakCoordinator(<released>)"),
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
