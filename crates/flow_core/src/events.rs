use serde::Serialize;
use shared::{domain::SlotId, protocol::PresentationStyle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    MainRouteSet {
        identity: String,
    },
    MainRouteCleared,
    Pushed {
        identity: String,
        animated: bool,
    },
    Popped {
        identities: Vec<String>,
        animated: bool,
    },
    SlotEntering {
        slot: SlotId,
    },
    SlotPresented {
        slot: SlotId,
        item: String,
        style: PresentationStyle,
    },
    SlotExiting {
        slot: SlotId,
        item: Option<String>,
        animated: bool,
    },
    SlotsPurged {
        slots: Vec<SlotId>,
    },
    ModalCleared,
}
