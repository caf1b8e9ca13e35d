//! Sequence-correlated reply dispatch and event subscriptions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::warn;

use super::genl::GenlMessage;

/// One-shot callback consuming the reply to a sent request.
pub type ReplyHandler = Box<dyn FnOnce(GenlMessage) + Send>;

/// Multi-shot callback invoked once per matching unsolicited message.
pub type EventHandler = Box<dyn FnMut(&GenlMessage) + Send>;

/// Handle owning an event subscription.
///
/// Dropping the handle (or calling [`cancel`](Self::cancel)) deactivates
/// the subscription; the dispatch table prunes the entry on its next pass.
/// This ties the subscription's lifetime to the subscriber instead of
/// relying on an explicit unsubscribe call.
pub struct SubscriptionHandle {
    active: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    /// Deactivate the subscription now.
    pub fn cancel(self) {}
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

struct Subscriber {
    family_id: u16,
    active: Arc<AtomicBool>,
    handler: EventHandler,
}

/// Mapping from outstanding sequence numbers to reply callbacks, plus the
/// unsolicited-event subscriber list.
///
/// Exclusively owned and mutated by the protocol manager on its event-loop
/// task; the only atomics are the sequence counter and the subscription
/// active flags, so handles can be dropped from anywhere.
pub(crate) struct DispatchTable {
    next_seq: AtomicU32,
    pending: HashMap<u32, ReplyHandler>,
    subscribers: Vec<Subscriber>,
}

impl DispatchTable {
    pub(crate) fn new() -> Self {
        Self {
            next_seq: AtomicU32::new(1),
            pending: HashMap::new(),
            subscribers: Vec::new(),
        }
    }

    /// Allocate a fresh sequence number.
    ///
    /// Monotonic and wrapping; never returns 0, which is the sequence
    /// number the kernel uses for unsolicited events. A wrap-around
    /// collision with a still-outstanding request is accepted as a
    /// theoretical risk given the small number of concurrent requests.
    pub(crate) fn allocate_seq(&self) -> u32 {
        loop {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            if seq != 0 {
                return seq;
            }
        }
    }

    /// Register a one-shot reply callback for a sequence number.
    pub(crate) fn register(&mut self, seq: u32, handler: ReplyHandler) {
        if self.pending.insert(seq, handler).is_some() {
            warn!(seq, "sequence number reused while a reply was still pending");
        }
    }

    /// Take the reply callback for a sequence number, removing it.
    pub(crate) fn take(&mut self, seq: u32) -> Option<ReplyHandler> {
        self.pending.remove(&seq)
    }

    /// Number of requests still awaiting a reply.
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Add an event subscriber for a family. Returns its owning handle.
    pub(crate) fn subscribe(&mut self, family_id: u16, handler: EventHandler) -> SubscriptionHandle {
        let active = Arc::new(AtomicBool::new(true));
        self.subscribers.push(Subscriber {
            family_id,
            active: Arc::clone(&active),
            handler,
        });
        SubscriptionHandle { active }
    }

    /// Deliver an unsolicited message to every live subscriber for its
    /// family, in subscription order. Returns the number of deliveries;
    /// cancelled subscriptions are pruned along the way.
    pub(crate) fn dispatch_event(&mut self, msg: &GenlMessage) -> usize {
        let mut delivered = 0;
        self.subscribers.retain_mut(|sub| {
            if !sub.active.load(Ordering::Acquire) {
                return false;
            }
            if sub.family_id == msg.msg_type() {
                (sub.handler)(msg);
                delivered += 1;
            }
            true
        });
        delivered
    }

    /// Drop every pending callback (unfired) and subscriber. Returns the
    /// number of pending requests forfeited.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.subscribers.clear();
        dropped
    }
}
