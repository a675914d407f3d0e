//! Progress reporting for uploads and processing runs.
//!
//! Orchestrators push [`ProgressEvent`]s into a [`ProgressSender`]; callers
//! consume them as a [`ProgressStream`]. Dropping the stream detaches the
//! caller: the run continues and later events are discarded.

use crate::models::ChapterMarker;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

/// Stage of a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Uploading,
    Downloading,
    Processing,
    SavingResults,
    Complete,
    Error,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Uploading => "uploading",
            ProgressStage::Downloading => "downloading",
            ProgressStage::Processing => "processing",
            ProgressStage::SavingResults => "saving_results",
            ProgressStage::Complete => "complete",
            ProgressStage::Error => "error",
        }
    }

    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStage::Complete | ProgressStage::Error)
    }
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub stage: ProgressStage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<ChapterMarker>>,
}

/// Receiving half of a progress channel
pub type ProgressStream = UnboundedReceiverStream<ProgressEvent>;

/// Sending half of a progress channel
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

/// Create a connected sender/stream pair
pub fn channel() -> (ProgressSender, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender { tx: Some(tx) },
        UnboundedReceiverStream::new(rx),
    )
}

impl ProgressSender {
    /// A sender nobody listens to
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event; a detached receiver is not an error
    pub fn emit(&self, percent: u8, stage: ProgressStage, message: impl Into<String>) {
        self.send(ProgressEvent {
            percent,
            stage,
            message: message.into(),
            chapters: None,
        });
    }

    /// Emit the final `complete` event carrying the chapter list
    pub fn complete(&self, message: impl Into<String>, chapters: Vec<ChapterMarker>) {
        self.send(ProgressEvent {
            percent: 100,
            stage: ProgressStage::Complete,
            message: message.into(),
            chapters: Some(chapters),
        });
    }

    /// Emit an `error` event
    pub fn error(&self, message: impl Into<String>) {
        self.emit(0, ProgressStage::Error, message);
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                trace!("Progress receiver detached, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (tx, rx) = channel();
        tx.emit(10, ProgressStage::Uploading, "Uploading file...");
        tx.error("Upload failed");
        drop(tx);

        let events: Vec<ProgressEvent> = rx.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].percent, 10);
        assert_eq!(events[1].stage, ProgressStage::Error);
        assert!(events[1].stage.is_terminal());
    }

    #[test]
    fn test_detached_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit(50, ProgressStage::Processing, "still running");
        ProgressSender::disabled().complete("done", Vec::new());
    }

    #[test]
    fn test_event_json_shape() {
        let event = ProgressEvent {
            percent: 80,
            stage: ProgressStage::SavingResults,
            message: "Saving chapters to database...".to_string(),
            chapters: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "saving_results");
        assert!(json.get("chapters").is_none());
    }
}
