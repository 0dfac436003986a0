//! Layered presentation slots.
//!
//! Every slot moves through `Entering -> Present -> Exiting` and is purged
//! once its exit delay has elapsed. An `Entering` slot is a placeholder that
//! gives the rendering collaborator one tick to register the upcoming
//! presentation before the real content mounts. An `Exiting` slot keeps its
//! item alive until the purge so the collaborator can finish the exit
//! transition against live content.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use futures::future::LocalBoxFuture;
use serde::Serialize;
use shared::{domain::SlotId, protocol::PresentationStyle};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    config::NavigationContext,
    content::{ContentFactory, ScreenContent},
    events::NavigationEvent,
};

/// Runs when an entry leaves the stack. Entries hosting a coordinator use it
/// to tear the nested subtree down.
pub type DismissSignal = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()>>;

pub struct PresentableItem {
    id: String,
    content: ContentFactory,
    animated: bool,
    style: PresentationStyle,
    is_coordinator_content: bool,
    dismiss_signal: Option<DismissSignal>,
}

impl PresentableItem {
    pub fn new(id: impl Into<String>, style: PresentationStyle, content: ContentFactory) -> Self {
        Self {
            id: id.into(),
            content,
            animated: true,
            style,
            is_coordinator_content: false,
            dismiss_signal: None,
        }
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn on_dismiss(mut self, signal: DismissSignal) -> Self {
        self.dismiss_signal = Some(signal);
        self
    }

    pub(crate) fn hosting_coordinator(mut self, signal: DismissSignal) -> Self {
        self.is_coordinator_content = true;
        self.dismiss_signal = Some(signal);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn style(&self) -> &PresentationStyle {
        &self.style
    }

    pub fn is_coordinator_content(&self) -> bool {
        self.is_coordinator_content
    }

    pub fn content(&self) -> ScreenContent {
        (self.content)()
    }

    async fn dismissed(mut self) {
        if let Some(signal) = self.dismiss_signal.take() {
            signal().await;
        }
    }
}

impl fmt::Debug for PresentableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentableItem")
            .field("id", &self.id)
            .field("animated", &self.animated)
            .field("style", &self.style)
            .field("is_coordinator_content", &self.is_coordinator_content)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPhase {
    Entering,
    Present,
    Exiting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub slot: SlotId,
    pub phase: SlotPhase,
    pub item_id: Option<String>,
    pub style: Option<PresentationStyle>,
    pub hosts_coordinator: bool,
}

enum SlotState {
    Entering,
    Present(PresentableItem),
    /// `None` marks a placeholder whose arrival was cancelled.
    Exiting(Option<PresentableItem>),
}

struct Slot {
    id: SlotId,
    state: SlotState,
}

impl Slot {
    fn is_exiting(&self) -> bool {
        matches!(self.state, SlotState::Exiting(_))
    }

    fn item(&self) -> Option<&PresentableItem> {
        match &self.state {
            SlotState::Present(item) | SlotState::Exiting(Some(item)) => Some(item),
            SlotState::Entering | SlotState::Exiting(None) => None,
        }
    }

    fn begin_exit(&mut self) -> Option<String> {
        let state = std::mem::replace(&mut self.state, SlotState::Exiting(None));
        self.state = match state {
            SlotState::Present(item) => SlotState::Exiting(Some(item)),
            SlotState::Entering => SlotState::Exiting(None),
            exiting @ SlotState::Exiting(_) => exiting,
        };
        self.item().map(|item| item.id.clone())
    }

    fn into_item(self) -> Option<PresentableItem> {
        match self.state {
            SlotState::Present(item) | SlotState::Exiting(Some(item)) => Some(item),
            SlotState::Entering | SlotState::Exiting(None) => None,
        }
    }

    fn snapshot(&self) -> SlotSnapshot {
        let phase = match self.state {
            SlotState::Entering => SlotPhase::Entering,
            SlotState::Present(_) => SlotPhase::Present,
            SlotState::Exiting(_) => SlotPhase::Exiting,
        };
        let item = self.item();
        SlotSnapshot {
            slot: self.id,
            phase,
            item_id: item.map(|item| item.id.clone()),
            style: item.map(|item| item.style.clone()),
            hosts_coordinator: item.is_some_and(|item| item.is_coordinator_content),
        }
    }
}

pub struct ModalStack {
    slots: RefCell<Vec<Slot>>,
    cleaning: Cell<bool>,
    last_style: RefCell<Option<PresentationStyle>>,
    next_slot: Cell<u64>,
    context: RefCell<NavigationContext>,
    events: broadcast::Sender<NavigationEvent>,
}

impl ModalStack {
    pub(crate) fn new(
        context: NavigationContext,
        events: broadcast::Sender<NavigationEvent>,
    ) -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            cleaning: Cell::new(false),
            last_style: RefCell::new(None),
            next_slot: Cell::new(0),
            context: RefCell::new(context),
            events,
        }
    }

    pub(crate) fn set_context(&self, context: NavigationContext) {
        *self.context.borrow_mut() = context;
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Index of the topmost slot, `0` when the stack is empty. Recursive
    /// renderers compare against it to know whether a slot is the last one.
    pub fn total_items(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn is_cleaning(&self) -> bool {
        self.cleaning.get()
    }

    pub fn last_style(&self) -> Option<PresentationStyle> {
        self.last_style.borrow().clone()
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots.borrow().iter().map(Slot::snapshot).collect()
    }

    pub fn presented_ids(&self) -> Vec<String> {
        self.slots
            .borrow()
            .iter()
            .filter_map(|slot| match &slot.state {
                SlotState::Present(item) => Some(item.id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn top_item_id(&self) -> Option<String> {
        self.presented_ids().pop()
    }

    /// Content of the slot at `index`, including content that is still
    /// running its exit transition.
    pub fn content_at(&self, index: usize) -> Option<ScreenContent> {
        let factory = {
            let slots = self.slots.borrow();
            slots.get(index)?.item().map(|item| Rc::clone(&item.content))
        };
        factory.map(|factory| factory())
    }

    pub async fn present(&self, item: PresentableItem) {
        let slot = self.allocate_slot();
        *self.last_style.borrow_mut() = Some(item.style.clone());
        self.slots.borrow_mut().push(Slot {
            id: slot,
            state: SlotState::Entering,
        });
        self.emit(NavigationEvent::SlotEntering { slot });

        if item.animated {
            let (scheduler, delay) = {
                let context = self.context.borrow();
                (context.scheduler.clone(), context.timings.present_delay())
            };
            scheduler.wait(delay).await;
        }

        if let Some(discarded) = self.mount(slot, item) {
            discarded.dismissed().await;
        }
        self.compact();
    }

    pub async fn remove_last(&self, animated: bool) {
        let target = {
            let mut slots = self.slots.borrow_mut();
            slots
                .iter_mut()
                .rev()
                .find(|slot| !slot.is_exiting())
                .map(|slot| (slot.id, slot.begin_exit()))
        };
        let Some((slot, item)) = target else {
            debug!("modal stack: nothing to remove");
            return;
        };
        self.emit(NavigationEvent::SlotExiting {
            slot,
            item,
            animated,
        });

        self.wait_dismiss_delay(animated).await;
        self.purge(|candidate| candidate.id == slot).await;
    }

    /// Removes the slot at `index` without an exit delay. Rejected while the
    /// stack is being cleaned.
    pub async fn remove_at(&self, index: usize) -> bool {
        if self.cleaning.get() {
            warn!(index, "modal stack: remove rejected while cleaning");
            return false;
        }
        let removed = {
            let mut slots = self.slots.borrow_mut();
            if index >= slots.len() {
                return false;
            }
            slots.remove(index)
        };
        self.emit(NavigationEvent::SlotsPurged {
            slots: vec![removed.id],
        });
        if let Some(item) = removed.into_item() {
            item.dismissed().await;
        }
        true
    }

    pub async fn dismiss_item(&self, item_id: &str) -> bool {
        let target = {
            let mut slots = self.slots.borrow_mut();
            slots
                .iter_mut()
                .rev()
                .find(|slot| {
                    matches!(&slot.state, SlotState::Present(item) if item.id == item_id)
                })
                .map(|slot| (slot.id, slot.begin_exit()))
        };
        let Some((slot, item)) = target else {
            return false;
        };
        self.emit(NavigationEvent::SlotExiting {
            slot,
            item,
            animated: false,
        });

        self.wait_dismiss_delay(false).await;
        self.purge(|candidate| candidate.id == slot).await;
        true
    }

    /// Tears the whole stack down. Re-entrant calls while a clean is running
    /// return immediately.
    pub async fn clean(&self, animated: bool) {
        if self.cleaning.get() {
            return;
        }
        if self.is_empty() {
            *self.last_style.borrow_mut() = None;
            return;
        }
        self.cleaning.set(true);

        let first = {
            let mut slots = self.slots.borrow_mut();
            slots.first_mut().map(|slot| (slot.id, slot.begin_exit()))
        };
        if let Some((slot, item)) = first {
            self.emit(NavigationEvent::SlotExiting {
                slot,
                item,
                animated,
            });
        }

        self.wait_dismiss_delay(animated).await;

        let removed = std::mem::take(&mut *self.slots.borrow_mut());
        *self.last_style.borrow_mut() = None;
        self.cleaning.set(false);
        self.emit(NavigationEvent::ModalCleared);
        debug!(slots = removed.len(), "modal stack cleaned");

        for item in removed.into_iter().filter_map(Slot::into_item) {
            item.dismissed().await;
        }
    }

    fn allocate_slot(&self) -> SlotId {
        let id = self.next_slot.get();
        self.next_slot.set(id + 1);
        SlotId(id)
    }

    fn mount(&self, slot: SlotId, item: PresentableItem) -> Option<PresentableItem> {
        let mut slots = self.slots.borrow_mut();
        let Some(target) = slots.iter_mut().find(|candidate| candidate.id == slot) else {
            debug!(%slot, item = %item.id, "modal stack: placeholder gone, arrival discarded");
            return Some(item);
        };
        if !matches!(target.state, SlotState::Entering) {
            debug!(%slot, item = %item.id, "modal stack: arrival cancelled");
            return Some(item);
        }
        let event = NavigationEvent::SlotPresented {
            slot,
            item: item.id.clone(),
            style: item.style.clone(),
        };
        target.state = SlotState::Present(item);
        drop(slots);
        self.emit(event);
        None
    }

    fn compact(&self) {
        let mut purged = Vec::new();
        self.slots.borrow_mut().retain(|slot| {
            let cancelled = matches!(slot.state, SlotState::Exiting(None));
            if cancelled {
                purged.push(slot.id);
            }
            !cancelled
        });
        if !purged.is_empty() {
            self.emit(NavigationEvent::SlotsPurged { slots: purged });
        }
    }

    async fn purge(&self, selected: impl Fn(&Slot) -> bool) {
        let removed: Vec<Slot> = {
            let mut slots = self.slots.borrow_mut();
            let (removed, kept) = std::mem::take(&mut *slots).into_iter().partition(|slot| {
                selected(slot) || matches!(slot.state, SlotState::Exiting(None))
            });
            *slots = kept;
            removed
        };
        if removed.is_empty() {
            return;
        }
        self.emit(NavigationEvent::SlotsPurged {
            slots: removed.iter().map(|slot| slot.id).collect(),
        });
        for item in removed.into_iter().filter_map(Slot::into_item) {
            item.dismissed().await;
        }
    }

    async fn wait_dismiss_delay(&self, animated: bool) {
        let (scheduler, delay) = {
            let context = self.context.borrow();
            (context.scheduler.clone(), context.timings.dismiss_delay(animated))
        };
        scheduler.wait(delay).await;
    }

    fn emit(&self, event: NavigationEvent) {
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalStack")
            .field("slots", &self.snapshot())
            .field("cleaning", &self.cleaning.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/modal_stack_tests.rs"]
mod tests;
