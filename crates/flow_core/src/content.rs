use std::{any::Any, fmt, rc::Rc};

use crate::coordinator::{Coordinator, WeakCoordinator};

/// Opaque screen content handed to the rendering collaborator.
///
/// Content that hosts a nested coordinator only keeps a weak handle; the
/// owning edge lives in the parent's children list.
#[derive(Clone)]
pub enum ScreenContent {
    View(Rc<dyn Any>),
    Coordinator(WeakCoordinator),
}

pub type ContentFactory = Rc<dyn Fn() -> ScreenContent>;

impl ScreenContent {
    pub fn view<T: Any>(value: T) -> Self {
        Self::View(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::View(value) => value.downcast_ref::<T>(),
            Self::Coordinator(_) => None,
        }
    }

    pub fn coordinator(&self) -> Option<Coordinator> {
        match self {
            Self::View(_) => None,
            Self::Coordinator(weak) => weak.upgrade(),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self, Self::Coordinator(_))
    }
}

impl fmt::Debug for ScreenContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(_) => f.write_str("ScreenContent::View(..)"),
            Self::Coordinator(weak) => match weak.upgrade() {
                Some(coordinator) => write!(f, "ScreenContent::Coordinator({})", coordinator.id()),
                None => f.write_str("ScreenContent::Coordinator(<released>)"),
            },
        }
    }
}
