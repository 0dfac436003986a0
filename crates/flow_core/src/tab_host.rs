use std::{cell::RefCell, fmt, rc::Rc};

use serde::Serialize;
use shared::{
    domain::{CoordinatorId, PagePosition},
    error::NavigationError,
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::{
    config::NavigationContext,
    coordinator::{Coordinator, Role},
    route::Route,
    Result,
};

const BADGE_CAPACITY: usize = 16;

/// One tab. Pages compare by position.
#[derive(Clone)]
pub struct Page {
    position: PagePosition,
    title: String,
    factory: Rc<dyn Fn() -> Coordinator>,
}

impl Page {
    pub fn new<F>(position: usize, title: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Coordinator + 'static,
    {
        Self {
            position: PagePosition(position),
            title: title.into(),
            factory: Rc::new(factory),
        }
    }

    pub fn position(&self) -> PagePosition {
        self.position
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn make_coordinator(&self) -> Coordinator {
        (self.factory)()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for Page {}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("position", &self.position)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Badge change for a page; `None` clears the badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeUpdate {
    pub label: Option<String>,
    pub page: PagePosition,
}

pub(crate) struct TabHostState {
    frame: Route,
    pages: RefCell<Vec<Page>>,
    current: RefCell<Page>,
    badges: broadcast::Sender<BadgeUpdate>,
}

/// Coordinator whose children are addressed by page position, with a single
/// selected page.
#[derive(Clone, PartialEq, Eq)]
pub struct TabHost {
    coordinator: Coordinator,
}

impl TabHost {
    /// `frame` is the container route rendered around the selected page.
    pub fn new(frame: Route, pages: Vec<Page>, current: Page) -> Self {
        Self::with_context(frame, pages, current, NavigationContext::default())
    }

    pub fn with_context(
        frame: Route,
        pages: Vec<Page>,
        current: Page,
        context: NavigationContext,
    ) -> Self {
        let (badges, _) = broadcast::channel(BADGE_CAPACITY);
        let state = TabHostState {
            frame,
            pages: RefCell::new(pages),
            current: RefCell::new(current),
            badges,
        };
        let coordinator =
            Coordinator::build(CoordinatorId::generate("tabs"), Role::TabHost(state), context);
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn state(&self) -> &TabHostState {
        match &self.coordinator.node.role {
            Role::TabHost(state) => state,
            Role::Plain(_) => unreachable!("TabHost handles are only built around tab host nodes"),
        }
    }

    pub fn pages(&self) -> Vec<Page> {
        self.state().pages.borrow().clone()
    }

    pub fn current_page(&self) -> Page {
        self.state().current.borrow().clone()
    }

    pub async fn setup_pages(&self, pages: Vec<Page>, current: Option<Page>) -> Result<()> {
        let state = self.state();
        *state.pages.borrow_mut() = pages.clone();
        if let Some(current) = current {
            *state.current.borrow_mut() = current;
        }

        for page in &pages {
            let child = page.make_coordinator();
            child.set_tag(Some(page.position.tag()));
            self.coordinator.attach_child(&child);
            Box::pin(child.start()).await?;
        }
        debug!(tab_host = %self.coordinator.id(), pages = pages.len(), "pages set up");
        Ok(())
    }

    pub async fn set_pages(&self, pages: Vec<Page>, current: Option<Page>) -> Result<()> {
        self.coordinator.remove_children(false).await;
        self.setup_pages(pages, current).await
    }

    pub fn coordinator_at(&self, position: PagePosition) -> Option<Coordinator> {
        let tag = position.tag();
        self.coordinator
            .children()
            .into_iter()
            .find(|child| child.tag().as_deref() == Some(tag.as_str()))
    }

    pub fn selected_coordinator(&self) -> Result<Coordinator> {
        let position = self.state().current.borrow().position;
        self.coordinator_at(position)
            .ok_or_else(|| NavigationError::CoordinatorSelection {
                tab_host: self.coordinator.id().clone(),
                position,
            })
    }

    /// Swaps the selection. Pages outside `pages()` and the current page are
    /// ignored. Returns whether the selection changed.
    pub fn set_current_page(&self, page: &Page) -> bool {
        let state = self.state();
        if !state.pages.borrow().contains(page) || *state.current.borrow() == *page {
            return false;
        }
        *state.current.borrow_mut() = page.clone();
        debug!(tab_host = %self.coordinator.id(), page = %page.position, "selected page");
        true
    }

    pub fn set_badge(&self, label: Option<String>, page: &Page) {
        let _ = self.state().badges.send(BadgeUpdate {
            label,
            page: page.position,
        });
    }

    pub fn badges(&self) -> BroadcastStream<BadgeUpdate> {
        BroadcastStream::new(self.state().badges.subscribe())
    }

    pub fn page_coordinators(&self) -> Vec<(PagePosition, Option<CoordinatorId>)> {
        self.pages()
            .iter()
            .map(|page| {
                let id = self.coordinator_at(page.position).map(|c| c.id().clone());
                (page.position, id)
            })
            .collect()
    }
}

impl From<TabHost> for Coordinator {
    fn from(value: TabHost) -> Self {
        value.coordinator
    }
}

impl fmt::Debug for TabHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabHost")
            .field("coordinator", &self.coordinator)
            .field("current", &self.current_page())
            .finish()
    }
}

impl Coordinator {
    pub fn as_tab_host(&self) -> Option<TabHost> {
        match self.node.role {
            Role::TabHost(_) => Some(TabHost {
                coordinator: self.clone(),
            }),
            Role::Plain(_) => None,
        }
    }

    pub(crate) async fn start_tab_host(&self) -> Result<()> {
        let Some(tab_host) = self.as_tab_host() else {
            return Ok(());
        };
        let (frame, pages, current) = {
            let state = tab_host.state();
            (
                state.frame.clone(),
                state.pages.borrow().clone(),
                state.current.borrow().clone(),
            )
        };
        self.start_flow(frame, false).await;
        tab_host.set_pages(pages, Some(current)).await
    }
}

#[cfg(test)]
#[path = "tests/tab_host_tests.rs"]
mod tests;
