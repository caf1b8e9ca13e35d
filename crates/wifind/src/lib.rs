//! Netlink protocol core for a Wi-Fi control daemon.
//!
//! This crate is the layer between Wi-Fi driver control logic and the
//! kernel's nl80211 interface. It owns the generic netlink socket,
//! discovers the kernel-assigned family and multicast-group ids once at
//! startup, encodes and decodes netlink frames, correlates each request
//! with its asynchronous reply by sequence number, and routes unsolicited
//! kernel events to per-interface subscribers.
//!
//! What it deliberately is not: a general netlink library (only generic
//! netlink is spoken), an interpreter of Wi-Fi semantics beyond event
//! routing, or an IPC surface - those belong to the daemon built on top.
//!
//! # Example
//!
//! ```ignore
//! use wifind::netlink::NetlinkManager;
//! use wifind::nl80211::{self, ap::ApInterface};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> wifind::Result<()> {
//!     let mut manager = NetlinkManager::new();
//!     manager.start(nl80211::FAMILY_NAME).await?;
//!
//!     let ap = ApInterface::new(&mut manager, "wlan0", 3)?;
//!     ap.on_clients_changed(|clients| {
//!         println!("{} stations connected", clients.len());
//!     });
//!
//!     manager.run().await
//! }
//! ```

pub mod netlink;
pub mod nl80211;

pub use netlink::{Error, NetlinkManager, Result};
