use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Sheet breakpoint. Fractions are expressed in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Detent {
    Medium,
    Large,
    Fraction(u8),
    Height(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    Leading,
    Bottom,
    Trailing,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TransitionDescriptor {
    Opacity,
    Scale,
    Slide { edge: Edge },
    Move { edge: Edge },
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationCurve {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Spring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Animation {
    pub curve: AnimationCurve,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PresentationStyle {
    #[default]
    Push,
    Sheet,
    FullScreenCover,
    Detents(BTreeSet<Detent>),
    Custom {
        transition: TransitionDescriptor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<Animation>,
        is_full_screen: bool,
    },
}

impl PresentationStyle {
    pub fn detents(detents: impl IntoIterator<Item = Detent>) -> Self {
        Self::Detents(detents.into_iter().collect())
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push)
    }

    pub fn is_full_screen(&self) -> bool {
        match self {
            Self::FullScreenCover => true,
            Self::Custom { is_full_screen, .. } => *is_full_screen,
            _ => false,
        }
    }

    /// Push cannot cross a coordinator boundary, so a coordinator requested
    /// with `Push` is presented as a sheet.
    pub fn across_coordinator_boundary(self) -> Self {
        match self {
            Self::Push => Self::Sheet,
            other => other,
        }
    }
}
