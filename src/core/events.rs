//! Event recorder: a channel-backed sink, translating the teacher's typed
//! `core/events.rs` event structs (delivered via simulated `cast!`
//! dispatch) into a real non-blocking enqueue / dedicated-flush-thread
//! split (see the concurrency notes on the event recorder).

use std::sync::mpsc::{Receiver, Sender};

#[derive(Debug, Clone)]
pub enum AutoscalerEvent {
    TriggeredScaleUp { pod: String, node_group: String },
    NotTriggerScaleUp { pod: String, reason: String },
    ScaleDownEmpty { nodes: Vec<String> },
    NodeDeleted { node: String },
    NoUnneeded,
    NoNodeDeleted,
    Error { message: String },
}

pub struct EventRecorder {
    sender: Sender<AutoscalerEvent>,
}

impl EventRecorder {
    /// Returns the recorder plus the receiving half, which the caller
    /// hands off to a dedicated flushing thread.
    pub fn channel() -> (Self, Receiver<AutoscalerEvent>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: AutoscalerEvent) {
        log::info!("event: {:?}", event);
        // A full receiver (e.g. the process is shutting down) is not a
        // failure the control loop should propagate.
        let _ = self.sender.send(event);
    }
}
