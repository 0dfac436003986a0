use std::rc::Rc;

use shared::protocol::PresentationStyle;

use crate::{
    config::NavigationContext,
    content::ScreenContent,
    coordinator::{Coordinator, EntryFlow},
    modal_stack::PresentableItem,
    route::Route,
};

pub(crate) fn screen(identity: &str, style: PresentationStyle) -> Route {
    let label = identity.to_string();
    Route::new(identity, style, move || ScreenContent::view(label.clone()))
}

pub(crate) fn pushed(identity: &str) -> Route {
    screen(identity, PresentationStyle::Push)
}

pub(crate) fn sheet(identity: &str) -> Route {
    screen(identity, PresentationStyle::Sheet)
}

pub(crate) fn item(id: &str, animated: bool) -> PresentableItem {
    let label = id.to_string();
    PresentableItem::new(
        id,
        PresentationStyle::Sheet,
        Rc::new(move || ScreenContent::view(label.clone())),
    )
    .animated(animated)
}

pub(crate) fn entry(label: &str) -> Coordinator {
    entry_with(label, NavigationContext::instant())
}

pub(crate) fn entry_with(label: &str, context: NavigationContext) -> Coordinator {
    Coordinator::with_context(
        EntryFlow::new(label, pushed(&format!("{label}.main"))),
        context,
    )
}

pub(crate) fn assert_tree_links(coordinator: &Coordinator) {
    for child in coordinator.children() {
        let parent = child.parent().expect("child has a parent");
        assert!(
            parent.ptr_eq(coordinator),
            "child {} points at {} instead of {}",
            child.id(),
            parent.id(),
            coordinator.id()
        );
        assert_eq!(parent.id(), coordinator.id());
        assert_tree_links(&child);
    }
}
