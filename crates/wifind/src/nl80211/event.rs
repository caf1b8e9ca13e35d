//! Typed nl80211 events and per-interface subscriptions.
//!
//! Subscribers get decoded, semantically typed events, not raw frames: the
//! closures registered here join the right multicast group, filter by
//! command and interface index, and parse the attributes once.

use std::fmt;

use tracing::warn;

use crate::netlink::attr::get;
use crate::netlink::{Error, GenlMessage, NetlinkManager, Result, SubscriptionHandle};

use super::{ChannelBandwidth, FAMILY_NAME, Nl80211Attr, Nl80211Cmd, group};

/// A MAC address as carried in `NL80211_ATTR_MAC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// Build from octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The address octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse a MAC attribute payload.
    pub fn from_attr(data: &[u8]) -> Result<Self> {
        let octets: [u8; 6] = data.try_into().map_err(|_| {
            Error::InvalidAttribute(format!("mac address attribute of {} bytes", data.len()))
        })?;
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// A station joined or left the BSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    /// `NL80211_CMD_NEW_STATION`: a station associated.
    Connected(MacAddr),
    /// `NL80211_CMD_DEL_STATION`: a station disassociated.
    Disconnected(MacAddr),
}

/// The interface moved to a new channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSwitch {
    /// Center frequency in MHz.
    pub frequency_mhz: u32,
    /// Operating bandwidth.
    pub bandwidth: ChannelBandwidth,
}

/// Decode a station event, with the interface it happened on.
///
/// Returns `None` for frames that are not station events.
pub fn station_event(msg: &GenlMessage) -> Result<Option<(u32, StationEvent)>> {
    let kind = match msg.cmd() {
        Some(c) if c == Nl80211Cmd::NewStation as u8 => Nl80211Cmd::NewStation,
        Some(c) if c == Nl80211Cmd::DelStation as u8 => Nl80211Cmd::DelStation,
        _ => return Ok(None),
    };

    let ifindex = msg
        .attr(Nl80211Attr::Ifindex as u16)
        .ok_or_else(|| Error::InvalidMessage("station event without interface index".into()))?;
    let ifindex = get::u32_ne(ifindex)?;

    let mac = msg
        .attr(Nl80211Attr::Mac as u16)
        .ok_or_else(|| Error::InvalidMessage("station event without mac address".into()))?;
    let mac = MacAddr::from_attr(mac)?;

    let event = match kind {
        Nl80211Cmd::NewStation => StationEvent::Connected(mac),
        _ => StationEvent::Disconnected(mac),
    };
    Ok(Some((ifindex, event)))
}

/// Decode a channel-switch notification, with the interface it happened on.
///
/// Returns `None` for frames that are not channel-switch notifications.
pub fn channel_switch(msg: &GenlMessage) -> Result<Option<(u32, ChannelSwitch)>> {
    match msg.cmd() {
        Some(c) if c == Nl80211Cmd::ChSwitchNotify as u8 => {}
        _ => return Ok(None),
    }

    let ifindex = msg
        .attr(Nl80211Attr::Ifindex as u16)
        .ok_or_else(|| Error::InvalidMessage("channel switch without interface index".into()))?;
    let ifindex = get::u32_ne(ifindex)?;

    let freq = msg
        .attr(Nl80211Attr::WiphyFreq as u16)
        .ok_or_else(|| Error::InvalidMessage("channel switch without frequency".into()))?;
    let frequency_mhz = get::u32_ne(freq)?;

    let bandwidth = match msg.attr(Nl80211Attr::ChannelWidth as u16) {
        Some(payload) => ChannelBandwidth::from_wire(get::u32_ne(payload)?),
        None => ChannelBandwidth::Invalid,
    };

    Ok(Some((
        ifindex,
        ChannelSwitch {
            frequency_mhz,
            bandwidth,
        },
    )))
}

/// Subscribe to station lifecycle events on one interface.
///
/// Joins the "mlme" multicast group and hands the handler every decoded
/// [`StationEvent`] for `ifindex` until the returned handle is dropped.
pub fn subscribe_station_events<F>(
    manager: &mut NetlinkManager,
    ifindex: u32,
    mut handler: F,
) -> Result<SubscriptionHandle>
where
    F: FnMut(StationEvent) + Send + 'static,
{
    let family_id = nl80211_family_id(manager)?;
    manager.join_group(FAMILY_NAME, group::MLME)?;
    manager.subscribe(family_id, move |msg| match station_event(msg) {
        Ok(Some((idx, event))) if idx == ifindex => handler(event),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "malformed station event"),
    })
}

/// Subscribe to channel-switch notifications on one interface.
pub fn subscribe_channel_switch<F>(
    manager: &mut NetlinkManager,
    ifindex: u32,
    mut handler: F,
) -> Result<SubscriptionHandle>
where
    F: FnMut(ChannelSwitch) + Send + 'static,
{
    let family_id = nl80211_family_id(manager)?;
    manager.join_group(FAMILY_NAME, group::MLME)?;
    manager.subscribe(family_id, move |msg| match channel_switch(msg) {
        Ok(Some((idx, event))) if idx == ifindex => handler(event),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "malformed channel switch event"),
    })
}

fn nl80211_family_id(manager: &NetlinkManager) -> Result<u16> {
    manager
        .family(FAMILY_NAME)
        .map(|f| f.id)
        .ok_or_else(|| Error::FamilyNotFound {
            name: FAMILY_NAME.to_string(),
        })
}
