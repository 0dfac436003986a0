use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CoordinatorId, PagePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    CoordinatorSelection,
    FlowStart,
    DetachedCoordinator,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("tab host {tab_host} has no child for selected page {position}")]
    CoordinatorSelection {
        tab_host: CoordinatorId,
        position: PagePosition,
    },
    #[error("coordinator {coordinator} failed to start: {source}")]
    FlowStart {
        coordinator: CoordinatorId,
        source: anyhow::Error,
    },
    #[error("coordinator {coordinator} was released while a navigation still referenced it")]
    DetachedCoordinator { coordinator: CoordinatorId },
}

impl NavigationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::CoordinatorSelection { .. } => ErrorCode::CoordinatorSelection,
            Self::FlowStart { .. } => ErrorCode::FlowStart,
            Self::DetachedCoordinator { .. } => ErrorCode::DetachedCoordinator,
        }
    }
}
