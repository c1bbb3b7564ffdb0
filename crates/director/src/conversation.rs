//! The conversation the tour runs alongside.
//!
//! The director only ever posts status lines; reading the user's messages and
//! counting them belongs to the caller, which reports the count through
//! [`PhaseController::on_trigger_count_changed`](crate::PhaseController::on_trigger_count_changed).

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tour_model::TourPhase;

/// A status line posted by the director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub text: String,
    /// Phase the message announces
    pub topic: TourPhase,
}

impl SystemMessage {
    pub fn new(text: impl Into<String>, topic: TourPhase) -> Self {
        Self {
            text: text.into(),
            topic,
        }
    }
}

/// Sink for director status lines.
pub trait Conversation: Send + Sync {
    fn append_system_message(&self, message: SystemMessage);
}

/// In-memory conversation that keeps every posted message.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Arc<Mutex<Vec<SystemMessage>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SystemMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Conversation for Transcript {
    fn append_system_message(&self, message: SystemMessage) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_keeps_order() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.append_system_message(SystemMessage::new("hotels", TourPhase::Hotels));
        transcript.append_system_message(SystemMessage::new("flights", TourPhase::Flights));

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].topic, TourPhase::Hotels);
        assert_eq!(messages[1].text, "flights");
    }

    #[test]
    fn test_transcript_clones_share_messages() {
        let transcript = Transcript::new();
        let shared = transcript.clone();

        shared.append_system_message(SystemMessage::new("hi", TourPhase::Hotels));

        assert_eq!(transcript.len(), 1);
    }
}
