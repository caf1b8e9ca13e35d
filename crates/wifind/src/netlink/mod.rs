//! Generic netlink protocol core.
//!
//! Everything between the daemon's Wi-Fi logic and the kernel's netlink
//! transport lives here: wire codec, family discovery, sequence-number
//! correlated dispatch and the socket transport, composed by
//! [`NetlinkManager`].
//!
//! # Quick Start
//!
//! ```ignore
//! use wifind::netlink::NetlinkManager;
//! use wifind::nl80211;
//!
//! let mut manager = NetlinkManager::new();
//! manager.start(nl80211::FAMILY_NAME).await?;
//!
//! let family = manager.family(nl80211::FAMILY_NAME).unwrap().id;
//! let builder = MessageBuilder::genl(family, NLM_F_REQUEST, cmd, 0);
//! manager.send_request(builder, |reply| {
//!     // one-shot, fires when the kernel answers
//! }).await?;
//!
//! loop {
//!     manager.process_incoming().await?;
//! }
//! ```

pub mod attr;
mod builder;
mod dispatch;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod genl;
mod manager;
pub mod message;
mod resolver;
mod socket;

pub use builder::{MessageBuilder, NestToken};
pub use dispatch::SubscriptionHandle;
pub use error::{Error, Result};
pub use genl::GenlMessage;
pub use manager::NetlinkManager;
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use resolver::FamilyInfo;
pub use socket::NetlinkSocket;
