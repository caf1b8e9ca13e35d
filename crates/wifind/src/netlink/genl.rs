//! Generic netlink framing and the decoded message type.
//!
//! Generic netlink messages carry an extra header after the standard
//! netlink header:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ nlmsghdr (16 bytes)                     │
//! │   nlmsg_len, nlmsg_type (family_id),    │
//! │   nlmsg_flags, nlmsg_seq, nlmsg_pid     │
//! ├─────────────────────────────────────────┤
//! │ genlmsghdr (4 bytes)                    │
//! │   cmd (u8), version (u8), reserved (u16)│
//! ├─────────────────────────────────────────┤
//! │ Attributes (TLV format)                 │
//! └─────────────────────────────────────────┘
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::AttrIter;
use super::error::{Error, Result};
use super::message::{MessageIter, NLM_F_MULTI, NlMsgError, NlMsgHdr, NlMsgType};

/// Generic netlink message header.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Command identifier (family-specific)
    pub cmd: u8,
    /// Interface version
    pub version: u8,
    /// Reserved for future use
    pub reserved: u16,
}

/// Size of the genl header in bytes.
pub const GENL_HDRLEN: usize = std::mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    /// Create a new genl header with the given command and version.
    #[inline]
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Get the header as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Copy a header out of a byte buffer.
    pub fn read_from(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(h, _)| h)
    }
}

/// The generic netlink controller's fixed family id.
pub const GENL_ID_CTRL: u16 = 0x10;

/// Controller protocol version used in requests.
pub const CTRL_VERSION: u8 = 1;

/// Controller commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
}

/// Controller attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
}

/// Controller multicast group sub-attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Name = 1,
    Id = 2,
}

/// A decoded netlink frame.
///
/// Owns the frame payload; header fields and attributes are read through
/// accessors. Immutable once decoded - requests are built with
/// [`MessageBuilder`](super::MessageBuilder) instead.
#[derive(Debug, Clone)]
pub struct GenlMessage {
    msg_type: u16,
    flags: u16,
    seq: u32,
    pid: u32,
    payload: Vec<u8>,
}

impl GenlMessage {
    /// Decode every frame in a received datagram.
    ///
    /// Frames are yielded in receipt order. A malformed frame is reported in
    /// the error list without discarding the frames decoded before it; a
    /// framing error (bad declared length) ends the walk since the next
    /// frame boundary is unknowable.
    pub fn parse_all(data: &[u8]) -> (Vec<GenlMessage>, Vec<Error>) {
        let mut frames = Vec::new();
        let mut failures = Vec::new();

        for result in MessageIter::new(data) {
            match result {
                Ok((header, payload)) => match Self::from_parts(header, payload) {
                    Ok(msg) => frames.push(msg),
                    Err(e) => failures.push(e),
                },
                Err(e) => {
                    failures.push(e);
                    break;
                }
            }
        }

        (frames, failures)
    }

    /// Build a decoded frame from a validated header and its payload.
    fn from_parts(header: NlMsgHdr, payload: &[u8]) -> Result<Self> {
        let msg = Self {
            msg_type: header.nlmsg_type,
            flags: header.nlmsg_flags,
            seq: header.nlmsg_seq,
            pid: header.nlmsg_pid,
            payload: payload.to_vec(),
        };

        // Reject frames with a corrupt attribute region up front, before
        // they reach any handler.
        if !msg.is_control() {
            for item in msg.attrs() {
                item?;
            }
        }

        Ok(msg)
    }

    /// Message type: a control type or the family id this frame belongs to.
    pub fn msg_type(&self) -> u16 {
        self.msg_type
    }

    /// Header flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Sequence number (0 for unsolicited kernel events).
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Sender port id (0 for the kernel).
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Check if this is a netlink control frame (error, done, noop, ...).
    pub fn is_control(&self) -> bool {
        self.msg_type < NlMsgType::MIN_FAMILY
    }

    /// Check if this is an error/ACK frame.
    pub fn is_error(&self) -> bool {
        self.msg_type == NlMsgType::ERROR
    }

    /// Check if this frame ends a multipart reply.
    pub fn is_done(&self) -> bool {
        self.msg_type == NlMsgType::DONE
    }

    /// Check if this frame is part of a multipart reply.
    pub fn is_multi(&self) -> bool {
        self.flags & NLM_F_MULTI != 0
    }

    /// Error code carried by an error frame (negative errno, 0 for ACK).
    pub fn error_code(&self) -> Option<i32> {
        if !self.is_error() {
            return None;
        }
        NlMsgError::read_from(&self.payload).ok().map(|e| e.error)
    }

    /// Generic netlink command, if the frame carries a genl header.
    pub fn cmd(&self) -> Option<u8> {
        if self.is_control() {
            return None;
        }
        GenlMsgHdr::read_from(&self.payload).map(|h| h.cmd)
    }

    /// Generic netlink version, if the frame carries a genl header.
    pub fn version(&self) -> Option<u8> {
        if self.is_control() {
            return None;
        }
        GenlMsgHdr::read_from(&self.payload).map(|h| h.version)
    }

    /// Iterate the frame's top-level attributes.
    pub fn attrs(&self) -> AttrIter<'_> {
        if self.is_control() || self.payload.len() < GENL_HDRLEN {
            return AttrIter::new(&[]);
        }
        AttrIter::new(&self.payload[GENL_HDRLEN..])
    }

    /// Look up a top-level attribute by type. Duplicates resolve last-wins.
    pub fn attr(&self, kind: u16) -> Option<&[u8]> {
        let mut found = None;
        for item in self.attrs() {
            match item {
                Ok((k, payload)) if k == kind => found = Some(payload),
                Ok(_) => {}
                Err(_) => break,
            }
        }
        found
    }

    /// Iterate the attributes nested inside a top-level attribute.
    pub fn nested(&self, kind: u16) -> Option<AttrIter<'_>> {
        self.attr(kind).map(AttrIter::new)
    }
}
