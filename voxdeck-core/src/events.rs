use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::composition::SegmentId;

/// `StudioEvent`s report generation and playback progress to whatever front
/// end is driving the studio (CLI, tests, a UI bridge). Events are
/// informational; the studio never waits on a receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum StudioEvent {
    GenerationStarted {
        segment_id: SegmentId,
    },
    GenerationSucceeded {
        segment_id: SegmentId,
        bytes: usize,
    },
    GenerationFailed {
        segment_id: SegmentId,
        error: String,
    },
    PlaybackStarted {
        segment_id: SegmentId,
        timestamp: u64,
    },
    PlaybackFinished {
        segment_id: SegmentId,
    },
    PlaybackStopped {
        segment_id: SegmentId,
    },
    Exported {
        path: PathBuf,
        entries: usize,
    },
}

#[derive(Clone)]
pub struct EventSender {
    event_tx: mpsc::UnboundedSender<StudioEvent>,
    event_history: Arc<Mutex<Vec<StudioEvent>>>,
}

impl EventSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StudioEvent>) {
        let (event_tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                event_tx,
                event_history: Arc::new(Mutex::new(Vec::new())),
            },
            rx,
        )
    }

    /// A sender whose receiver is already gone; events are only kept in the
    /// history.
    pub fn detached() -> Self {
        let (sender, _) = Self::new();
        sender
    }

    pub fn send(&self, event: StudioEvent) {
        self.event_history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        let _ = self.event_tx.send(event);
    }

    pub fn event_history(&self) -> Vec<StudioEvent> {
        self.event_history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_history(&self) {
        self.event_history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
