//! The netlink protocol manager.
//!
//! Composes the codec, the family resolver, the dispatch table and the
//! socket transport into the daemon's single interface to the kernel:
//! "send a request, get one async reply" and "subscribe to unsolicited
//! events". Incoming frames are routed by sequence number first - a match
//! resolves the pending request's one-shot callback - and otherwise handed
//! to every subscriber registered for the frame's family. Frames matching
//! neither are dropped; the kernel multicasts categories nobody asked for.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};

use super::builder::MessageBuilder;
use super::dispatch::{DispatchTable, SubscriptionHandle};
use super::error::{Error, Result};
use super::genl::GenlMessage;
use super::message::NlMsgType;
use super::resolver::{self, FamilyInfo};
use super::socket::NetlinkSocket;

/// Manager lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Constructed, not started.
    Uninitialized,
    /// Transport opening / discovery in flight.
    Starting,
    /// Accepting requests and dispatching events.
    Ready,
    /// Terminal; no further operations accepted.
    Closed,
}

/// Owner of the netlink socket and all request/event routing.
///
/// Single-threaded by contract: every callback runs on the task that calls
/// [`process_incoming`](Self::process_incoming) or [`run`](Self::run), and
/// the dispatch and family tables are only ever touched from there, so the
/// core needs no locking.
///
/// There are no timeouts and no retries anywhere in the manager; a reply
/// that never arrives simply never fires its callback. Callers that need
/// liveness wrap their requests in their own supervision (for startup,
/// `tokio::time::timeout` around [`start`](Self::start)).
pub struct NetlinkManager {
    state: State,
    socket: Option<NetlinkSocket>,
    table: DispatchTable,
    /// Family name -> resolved metadata. Written once per family by
    /// discovery, read-only afterward.
    families: HashMap<String, FamilyInfo>,
    /// Multicast group ids this socket already joined.
    joined_groups: HashSet<u32>,
}

impl NetlinkManager {
    /// Create an unstarted manager.
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
            socket: None,
            table: DispatchTable::new(),
            families: HashMap::new(),
            joined_groups: HashSet::new(),
        }
    }

    /// Open the transport and resolve the given family's id and multicast
    /// groups from the kernel.
    ///
    /// Must be called exactly once. Discovery failure (socket setup,
    /// unknown family, malformed reply) is terminal: the manager closes
    /// and cannot be restarted.
    pub async fn start(&mut self, family_name: &str) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(Error::AlreadyStarted);
        }
        self.state = State::Starting;

        match self.discover(family_name).await {
            Ok(info) => {
                debug!(
                    family = family_name,
                    id = info.id,
                    groups = info.mcast_groups.len(),
                    "generic netlink family resolved"
                );
                self.families.insert(family_name.to_string(), info);
                self.state = State::Ready;
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    async fn discover(&mut self, family_name: &str) -> Result<FamilyInfo> {
        let socket = NetlinkSocket::open()?;
        let pid = socket.pid();
        self.socket = Some(socket);

        // The reply lands here from the one-shot callback; discovery is
        // the one request whose completion start() synchronously awaits.
        let slot: Arc<Mutex<Option<GenlMessage>>> = Arc::new(Mutex::new(None));
        let reply_slot = Arc::clone(&slot);

        let seq = self.table.allocate_seq();
        let mut request = resolver::family_request(family_name);
        request.set_seq(seq);
        request.set_pid(pid);
        self.socket()?.send(&request.finish()).await?;
        self.table.register(
            seq,
            Box::new(move |msg| {
                *reply_slot.lock().unwrap() = Some(msg);
            }),
        );

        loop {
            self.process_incoming().await?;
            if let Some(reply) = slot.lock().unwrap().take() {
                return resolver::parse_family_reply(family_name, &reply);
            }
        }
    }

    /// Whether the manager accepts requests.
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// Resolved metadata for a discovered family.
    pub fn family(&self, name: &str) -> Option<&FamilyInfo> {
        self.families.get(name)
    }

    /// Resolved id of a family's multicast group.
    pub fn group_id(&self, family: &str, group: &str) -> Option<u32> {
        self.families.get(family).and_then(|f| f.group_id(group))
    }

    /// Returns a sequence number available for use.
    ///
    /// Exposed so callers can pre-bind the number into a request before
    /// handing it to [`send_request`](Self::send_request).
    pub fn next_sequence_number(&self) -> u32 {
        self.table.allocate_seq()
    }

    /// Number of requests still awaiting a reply.
    pub fn pending_replies(&self) -> usize {
        self.table.pending_len()
    }

    /// Encode and send a request; `on_reply` fires once when a frame with
    /// the request's sequence number arrives.
    ///
    /// Uses the sequence number already bound into the message, assigning
    /// a fresh one if unset. The result covers the send step only - reply
    /// delivery is asynchronous and has no failure signal of its own.
    pub async fn send_request<F>(&mut self, mut message: MessageBuilder, on_reply: F) -> Result<u32>
    where
        F: FnOnce(GenlMessage) + Send + 'static,
    {
        if self.state != State::Ready {
            return Err(Error::NotReady);
        }

        let seq = match message.seq() {
            0 => self.table.allocate_seq(),
            bound => bound,
        };
        message.set_seq(seq);
        let pid = self.socket()?.pid();
        message.set_pid(pid);

        let frame = message.finish();
        self.socket()?.send(&frame).await?;
        self.table.register(seq, Box::new(on_reply));
        Ok(seq)
    }

    /// Register a handler for unsolicited messages of a family.
    ///
    /// Handlers are invoked in subscription order, once per matching
    /// message, until the returned handle is dropped.
    pub fn subscribe<F>(&mut self, family_id: u16, handler: F) -> Result<SubscriptionHandle>
    where
        F: FnMut(&GenlMessage) + Send + 'static,
    {
        if self.state == State::Closed {
            return Err(Error::NotReady);
        }
        Ok(self.table.subscribe(family_id, Box::new(handler)))
    }

    /// Join one of a discovered family's multicast groups, making the
    /// kernel deliver that group's events to this socket. Idempotent.
    pub fn join_group(&mut self, family: &str, group: &str) -> Result<u32> {
        let id = self
            .group_id(family, group)
            .ok_or_else(|| Error::GroupNotFound {
                family: family.to_string(),
                name: group.to_string(),
            })?;

        if !self.joined_groups.contains(&id) {
            self.socket
                .as_mut()
                .ok_or(Error::NotReady)?
                .join_group(id)?;
            self.joined_groups.insert(id);
            debug!(family, group, id, "joined multicast group");
        }
        Ok(id)
    }

    /// Wait for the socket to become readable and route every decoded
    /// frame from that batch.
    pub async fn process_incoming(&mut self) -> Result<()> {
        match self.state {
            State::Starting | State::Ready => {}
            _ => return Err(Error::NotReady),
        }

        let datagrams = self.socket()?.recv_batch().await?;
        for datagram in datagrams {
            let (frames, failures) = GenlMessage::parse_all(&datagram);
            for failure in failures {
                warn!(error = %failure, "dropping malformed netlink frame");
            }
            for frame in frames {
                self.route(frame);
            }
        }
        Ok(())
    }

    /// Drive the manager until an I/O error or close.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.process_incoming().await?;
        }
    }

    /// Route one decoded frame: pending reply first, then subscribers.
    fn route(&mut self, msg: GenlMessage) {
        if msg.msg_type() == NlMsgType::NOOP {
            return;
        }
        if msg.msg_type() == NlMsgType::OVERRUN {
            warn!("netlink socket overrun, kernel events were lost");
            return;
        }

        if let Some(handler) = self.table.take(msg.seq()) {
            handler(msg);
            return;
        }

        let delivered = self.table.dispatch_event(&msg);
        if delivered == 0 {
            trace!(
                msg_type = msg.msg_type(),
                seq = msg.seq(),
                "no subscriber for message, dropping"
            );
        }
    }

    /// Tear the manager down: pending callbacks are dropped unfired,
    /// subscriptions are discarded and the socket is released. Idempotent.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        let forfeited = self.table.clear();
        if forfeited > 0 {
            debug!(forfeited, "closing with requests still pending");
        }
        self.joined_groups.clear();
        self.socket = None;
        self.state = State::Closed;
    }

    fn socket(&self) -> Result<&NetlinkSocket> {
        self.socket.as_ref().ok_or(Error::NotReady)
    }
}

impl Default for NetlinkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetlinkManager {
    fn drop(&mut self) {
        self.close();
    }
}
