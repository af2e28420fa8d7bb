//! Alert dispatch.
//!
//! - [`AlertDispatcher`] - presentation seam (speech, alert screen)
//! - [`AlertCatalog`] - category → spoken message, per language
//! - [`DispatchGate`] - at most one dispatch per cooldown window

mod catalog;
mod dispatcher;
mod gate;

pub use catalog::{AlertCatalog, AlertMessage, CatalogError, FALLBACK_LANGUAGE};
pub use dispatcher::{
    AlertDispatcher, DispatchCall, DispatchError, RecordingDispatcher, SpeechOptions,
};
pub use gate::{DispatchGate, DispatchTicket};
