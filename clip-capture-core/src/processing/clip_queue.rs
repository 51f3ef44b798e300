use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};

use super::clip::Clip;

/// Bounded FIFO handing completed clips from the capture thread to the consumer.
///
/// Cloning yields another handle onto the same queue. Each clip is moved
/// through the channel, so the producer never touches a clip once it has
/// been handed over.
///
/// Overflow behavior: a send that cannot find a free slot within its timeout
/// drops the clip. The producer keeps running; the loss is only counted.
#[derive(Debug, Clone)]
pub struct ClipQueue {
    sender: Sender<Clip>,
    receiver: Receiver<Clip>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl ClipQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue `clip`, waiting up to `timeout` for a free slot.
    ///
    /// Returns `false` if the clip was dropped.
    pub fn try_send(&self, clip: Clip, timeout: Duration) -> bool {
        match self.sender.send_timeout(clip, timeout) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(clip)) | Err(SendTimeoutError::Disconnected(clip)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Clip queue full, dropping clip of {} samples", clip.len());
                false
            }
        }
    }

    /// Pop the oldest clip, waiting up to `timeout`. A zero timeout never blocks.
    pub fn try_receive(&self, timeout: Duration) -> Option<Clip> {
        let clip = if timeout.is_zero() {
            self.receiver.try_recv().ok()
        } else {
            self.receiver.recv_timeout(timeout).ok()
        };
        if let Some(ref clip) = clip {
            log::debug!("Received clip of {} samples", clip.len());
        }
        clip
    }

    /// Clips currently waiting to be received.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total clips dropped on a full queue since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
