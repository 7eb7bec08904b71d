//! Processing-unit capability interface and its message channel.
//!
//! A unit is configured once per session and then runs inside the audio
//! capture callback through the [`CapturePort`] it hands back. Runtime
//! messages travel over a bounded channel: the audio side never blocks
//! ([`UnitOutbox::post`] drops and counts when full), the control side
//! drains them in order with [`MessagePort::dispatch`].

use crate::{InitPayload, Result, RuntimeMessage};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Receives runtime messages on the control context.
pub type MessageHandler = Box<dyn FnMut(RuntimeMessage) + Send>;

/// Default number of in-flight messages between audio and control contexts.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 64;

/// Black-box real-time numeric engine.
pub trait ProcessingUnit: Send {
    /// Apply the one-time configuration and return the port the input
    /// stream must feed. Failure means the module could not be instantiated.
    fn configure(&mut self, payload: InitPayload) -> Result<Box<dyn CapturePort>>;

    /// Register the single message handler, replacing any previous one.
    fn subscribe(&mut self, handler: MessageHandler) -> Subscription;

    /// Deliver every pending message to the handler, in arrival order.
    /// Returns the number delivered.
    fn dispatch(&mut self) -> usize;

    /// Called before a suspended session's capture resumes. Whatever pulse
    /// or frame was half assembled when the stream paused is discarded.
    fn restart(&mut self) {}

    /// Messages the unit discarded because the control side fell behind.
    fn dropped_messages(&self) -> u64 {
        0
    }
}

/// Audio-context half of a configured unit.
pub trait CapturePort: Send {
    /// Interleaved input samples, `channels` per frame.
    fn process(&mut self, input: &[f32], channels: usize);
}

/// Create a connected outbox/port pair.
pub fn message_channel(capacity: usize) -> (UnitOutbox, MessagePort) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        UnitOutbox {
            tx,
            dropped: Arc::clone(&dropped),
        },
        MessagePort {
            rx,
            handler: None,
            active: Arc::new(AtomicBool::new(false)),
            dropped,
        },
    )
}

/// Sending half, owned by the audio context.
#[derive(Clone)]
pub struct UnitOutbox {
    tx: Sender<RuntimeMessage>,
    dropped: Arc<AtomicU64>,
}

impl UnitOutbox {
    /// Non-blocking send. Returns false if the message was dropped.
    #[inline]
    pub fn post(&self, message: RuntimeMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receiving half, owned by the control context.
pub struct MessagePort {
    rx: Receiver<RuntimeMessage>,
    handler: Option<MessageHandler>,
    active: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl MessagePort {
    pub fn subscribe(&mut self, handler: MessageHandler) -> Subscription {
        self.active.store(false, Ordering::Release);
        let active = Arc::new(AtomicBool::new(true));
        self.active = Arc::clone(&active);
        self.handler = Some(handler);
        Subscription { active }
    }

    pub fn has_subscriber(&self) -> bool {
        self.handler.is_some() && self.active.load(Ordering::Acquire)
    }

    /// Drain pending messages into the handler.
    ///
    /// Without a live subscription pending messages are discarded.
    pub fn dispatch(&mut self) -> usize {
        if !self.active.load(Ordering::Acquire) {
            self.handler = None;
        }

        let mut delivered = 0;
        while let Ok(message) = self.rx.try_recv() {
            if let Some(handler) = self.handler.as_mut() {
                handler(message);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Keeps a handler registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the handler"]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
