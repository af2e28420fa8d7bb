//! Alert presentation abstraction.
//!
//! The engine decides *when* to alert; an [`AlertDispatcher`] decides *how*
//! (text-to-speech, a chime, navigating to an alert screen). Implementations
//! live in the host app. [`RecordingDispatcher`] is provided for replays and
//! tests.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::geo::Meters;
use crate::hazard::{HazardCategory, HazardId};
use crate::BoxFuture;

/// Errors reported by a dispatcher.
///
/// The engine logs and swallows these; they never reach the caller.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Text-to-speech or audio playback failed.
    #[error("Speech failed: {0}")]
    Speech(String),

    /// Showing the alert screen failed.
    #[error("Alert presentation failed: {0}")]
    Presentation(String),
}

/// Parameters passed to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    /// Language code, e.g. "en" or "ar".
    pub language: String,
    /// Volume in [0, 1].
    pub volume: f32,
}

/// Presents a fired alert to the user.
pub trait AlertDispatcher: Send + Sync {
    /// Speak `message`.
    fn speak(&self, message: String, options: SpeechOptions)
        -> BoxFuture<'_, Result<(), DispatchError>>;

    /// Show the alert for a hazard (e.g. navigate to an alert screen).
    fn present_alert(
        &self,
        hazard_id: HazardId,
        distance: Meters,
        category: HazardCategory,
    ) -> BoxFuture<'_, Result<(), DispatchError>>;
}

/// A call received by a [`RecordingDispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCall {
    Speak {
        message: String,
        options: SpeechOptions,
    },
    Present {
        hazard_id: HazardId,
        distance: Meters,
        category: HazardCategory,
    },
}

/// Dispatcher that records every call, optionally failing them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<DispatchCall>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    /// Create a dispatcher whose calls succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher whose calls are recorded and then fail.
    pub fn failing() -> Self {
        let dispatcher = Self::new();
        dispatcher.set_failing(true);
        dispatcher
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().clone()
    }

    /// Hazard ids passed to `present_alert`, in order.
    pub fn presented(&self) -> Vec<HazardId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DispatchCall::Present { hazard_id, .. } => Some(hazard_id.clone()),
                DispatchCall::Speak { .. } => None,
            })
            .collect()
    }

    /// Messages passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DispatchCall::Speak { message, .. } => Some(message.clone()),
                DispatchCall::Present { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: DispatchCall) -> bool {
        self.calls.lock().push(call);
        self.fail.load(Ordering::SeqCst)
    }
}

impl AlertDispatcher for RecordingDispatcher {
    fn speak(
        &self,
        message: String,
        options: SpeechOptions,
    ) -> BoxFuture<'_, Result<(), DispatchError>> {
        let failed = self.record(DispatchCall::Speak { message, options });
        Box::pin(async move {
            if failed {
                Err(DispatchError::Speech("speech engine unavailable".to_string()))
            } else {
                Ok(())
            }
        })
    }

    fn present_alert(
        &self,
        hazard_id: HazardId,
        distance: Meters,
        category: HazardCategory,
    ) -> BoxFuture<'_, Result<(), DispatchError>> {
        let failed = self.record(DispatchCall::Present {
            hazard_id,
            distance,
            category,
        });
        Box::pin(async move {
            if failed {
                Err(DispatchError::Presentation("alert screen unavailable".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SpeechOptions {
        SpeechOptions {
            language: "en".to_string(),
            volume: 0.5,
        }
    }

    #[tokio::test]
    async fn test_recording_dispatcher_records_in_order() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.speak("hello".to_string(), options()).await.unwrap();
        dispatcher
            .present_alert(HazardId::new("h1"), Meters(120.0), HazardCategory::Pothole)
            .await
            .unwrap();

        assert_eq!(dispatcher.calls().len(), 2);
        assert_eq!(dispatcher.spoken(), vec!["hello".to_string()]);
        assert_eq!(dispatcher.presented(), vec![HazardId::new("h1")]);
    }

    #[tokio::test]
    async fn test_failing_dispatcher_still_records() {
        let dispatcher = RecordingDispatcher::failing();
        let result = dispatcher.speak("hello".to_string(), options()).await;
        assert!(matches!(result, Err(DispatchError::Speech(_))));
        assert_eq!(dispatcher.spoken().len(), 1);

        dispatcher.set_failing(false);
        assert!(dispatcher.speak("again".to_string(), options()).await.is_ok());
    }

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::Presentation("no screen".to_string());
        assert_eq!(err.to_string(), "Alert presentation failed: no screen");
    }
}
