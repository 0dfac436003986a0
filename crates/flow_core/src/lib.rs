//! Coordinator tree, routers and modal choreography for tree-structured UI
//! flows. All types are confined to a single thread; futures returned here
//! are `!Send` and are meant to be awaited on a current-thread runtime.

pub mod config;
pub mod content;
pub mod coordinator;
pub mod events;
pub mod modal_stack;
pub mod route;
pub mod router;
pub mod snapshot;
pub mod tab_host;

pub use config::{load_settings, load_settings_from, NavigationContext, NavigationSettings};
pub use content::{ContentFactory, ScreenContent};
pub use coordinator::{Coordinator, EntryFlow, Flow, WeakCoordinator};
pub use events::NavigationEvent;
pub use modal_stack::{ModalStack, PresentableItem, SlotPhase, SlotSnapshot};
pub use route::{Destination, Route};
pub use router::Router;
pub use shared::{
    domain::{CoordinatorId, CoordinatorKind, PagePosition, SlotId},
    error::{ErrorCode, NavigationError},
    protocol::PresentationStyle,
};
pub use snapshot::TreeSnapshot;
pub use tab_host::{BadgeUpdate, Page, TabHost};

pub type Result<T, E = NavigationError> = std::result::Result<T, E>;

#[cfg(test)]
pub(crate) mod test_support;
