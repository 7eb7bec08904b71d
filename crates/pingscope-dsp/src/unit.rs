//! Built-in [`ProcessingUnit`].

use crate::DopplerKernel;
use pingscope_core::unit::DEFAULT_MESSAGE_CAPACITY;
use pingscope_core::{
    message_channel, CapturePort, InitPayload, MessageHandler, MessagePort, ProcessingUnit,
    Result, Subscription,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pulse-Doppler processor compiled into the binary.
///
/// Each `configure` starts a fresh message channel, so nothing from a
/// previous session reaches the new handler.
pub struct PulseDopplerUnit {
    capacity: usize,
    port: MessagePort,
    restart: Option<Arc<AtomicBool>>,
}

impl PulseDopplerUnit {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }

    /// `capacity` bounds the messages in flight between capture and relay.
    pub fn with_capacity(capacity: usize) -> Self {
        let (_, port) = message_channel(capacity);
        Self {
            capacity,
            port,
            restart: None,
        }
    }

    pub fn pending(&self) -> usize {
        self.port.pending()
    }
}

impl Default for PulseDopplerUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingUnit for PulseDopplerUnit {
    fn configure(&mut self, payload: InitPayload) -> Result<Box<dyn CapturePort>> {
        if !payload.module_bytes.is_empty() {
            tracing::debug!(
                bytes = payload.module_bytes.len(),
                "built-in unit ignores module bytes"
            );
        }

        let (outbox, port) = message_channel(self.capacity);
        let kernel = DopplerKernel::new(&payload, outbox)?;
        self.port = port;
        self.restart = Some(kernel.restart_flag());

        tracing::info!(
            fast_bins = kernel.fast_bins(),
            pulses = kernel.slow_pulse_count(),
            clutter = payload.clutter_filter.label(),
            offset_compensation = payload.offset_compensation,
            "pulse-Doppler unit configured"
        );
        Ok(Box::new(kernel))
    }

    fn subscribe(&mut self, handler: MessageHandler) -> Subscription {
        self.port.subscribe(handler)
    }

    fn dispatch(&mut self) -> usize {
        self.port.dispatch()
    }

    fn restart(&mut self) {
        if let Some(flag) = &self.restart {
            flag.store(true, Ordering::Release);
        }
    }

    fn dropped_messages(&self) -> u64 {
        self.port.dropped()
    }
}
