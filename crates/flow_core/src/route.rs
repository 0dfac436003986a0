use std::{any::type_name, fmt, rc::Rc};

use shared::protocol::PresentationStyle;

use crate::content::{ContentFactory, ScreenContent};

/// Application-side description of a destination, typically an enum of
/// screens. Converted into a [`Route`] with [`Route::from_destination`].
pub trait Destination {
    fn presentation_style(&self) -> PresentationStyle;
    fn identity(&self) -> String;
    fn content(&self) -> ScreenContent;
}

/// Immutable destination: presentation style, lazy content factory and a
/// stable identity. Equality is identity equality.
#[derive(Clone)]
pub struct Route {
    identity: String,
    style: PresentationStyle,
    factory: ContentFactory,
}

impl Route {
    pub fn new<F>(identity: impl Into<String>, style: PresentationStyle, factory: F) -> Self
    where
        F: Fn() -> ScreenContent + 'static,
    {
        Self {
            identity: identity.into(),
            style,
            factory: Rc::new(factory),
        }
    }

    /// Route whose identity is the content type's name.
    ///
    /// Two differently-parameterized values of `T` share one identity, so
    /// identity-based matching cannot tell them apart.
    pub fn of<T, F>(style: PresentationStyle, factory: F) -> Self
    where
        T: 'static,
        F: Fn() -> T + 'static,
    {
        Self::new(type_name::<T>(), style, move || ScreenContent::view(factory()))
    }

    pub fn from_destination<D>(destination: D) -> Self
    where
        D: Destination + 'static,
    {
        let identity = destination.identity();
        let style = destination.presentation_style();
        let destination = Rc::new(destination);
        Self::new(identity, style, move || destination.content())
    }

    pub fn with_style(mut self, style: PresentationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn style(&self) -> &PresentationStyle {
        &self.style
    }

    pub fn factory(&self) -> ContentFactory {
        Rc::clone(&self.factory)
    }

    pub fn content(&self) -> ScreenContent {
        (self.factory)()
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Route {}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("identity", &self.identity)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}
