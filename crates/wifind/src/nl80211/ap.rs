//! Derived state for an access-point mode interface.
//!
//! Tracks the set of connected stations and the last announced channel
//! from the interface's event stream. The daemon shell republishes changes
//! to its own clients; this type only maintains the state and invokes the
//! registered change listener.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::netlink::{NetlinkManager, Result, SubscriptionHandle};

use super::event::{self, ChannelSwitch, MacAddr, StationEvent};

/// Listener invoked with the full client list after every change.
pub type ClientsChanged = Box<dyn FnMut(&[MacAddr]) + Send>;

struct ApState {
    interface: String,
    clients: Vec<MacAddr>,
    channel: Option<ChannelSwitch>,
    on_clients_changed: Option<ClientsChanged>,
}

impl ApState {
    fn handle_station_event(&mut self, event: StationEvent) {
        match event {
            StationEvent::Connected(mac) => {
                // The kernel re-announces stations on reassociation; adding
                // must be idempotent.
                if self.clients.contains(&mac) {
                    return;
                }
                info!(interface = %self.interface, station = %mac, "station connected");
                self.clients.push(mac);
                self.notify();
            }
            StationEvent::Disconnected(mac) => {
                let Some(position) = self.clients.iter().position(|m| *m == mac) else {
                    warn!(
                        interface = %self.interface,
                        station = %mac,
                        "disconnect for unknown station, ignoring"
                    );
                    return;
                };
                info!(interface = %self.interface, station = %mac, "station disconnected");
                self.clients.remove(position);
                self.notify();
            }
        }
    }

    fn handle_channel_switch(&mut self, event: ChannelSwitch) {
        info!(
            interface = %self.interface,
            frequency_mhz = event.frequency_mhz,
            bandwidth = %event.bandwidth,
            "channel switched"
        );
        self.channel = Some(event);
    }

    fn notify(&mut self) {
        if let Some(listener) = self.on_clients_changed.as_mut() {
            listener(&self.clients);
        }
    }
}

/// Connected-client and channel tracking for one AP interface.
///
/// Subscribes to the interface's station and channel-switch events on
/// construction; dropping the value ends both subscriptions.
pub struct ApInterface {
    name: String,
    ifindex: u32,
    state: Arc<Mutex<ApState>>,
    _station_sub: SubscriptionHandle,
    _channel_sub: SubscriptionHandle,
}

impl ApInterface {
    /// Start tracking an AP interface.
    ///
    /// The manager must have been started with the nl80211 family.
    pub fn new(
        manager: &mut NetlinkManager,
        name: impl Into<String>,
        ifindex: u32,
    ) -> Result<Self> {
        let name = name.into();
        let state = Arc::new(Mutex::new(ApState {
            interface: name.clone(),
            clients: Vec::new(),
            channel: None,
            on_clients_changed: None,
        }));

        let station_state = Arc::clone(&state);
        let station_sub = event::subscribe_station_events(manager, ifindex, move |event| {
            station_state.lock().unwrap().handle_station_event(event);
        })?;

        let channel_state = Arc::clone(&state);
        let channel_sub = event::subscribe_channel_switch(manager, ifindex, move |event| {
            channel_state.lock().unwrap().handle_channel_switch(event);
        })?;

        debug!(interface = %name, ifindex, "ap interface tracking started");
        Ok(Self {
            name,
            ifindex,
            state,
            _station_sub: station_sub,
            _channel_sub: channel_sub,
        })
    }

    /// Interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Snapshot of the currently connected stations.
    pub fn connected_clients(&self) -> Vec<MacAddr> {
        self.state.lock().unwrap().clients.clone()
    }

    /// Last announced channel, if any switch was observed.
    pub fn channel(&self) -> Option<ChannelSwitch> {
        self.state.lock().unwrap().channel
    }

    /// Register the listener invoked after every client-list change.
    pub fn on_clients_changed(&self, listener: impl FnMut(&[MacAddr]) + Send + 'static) {
        self.state.lock().unwrap().on_clients_changed = Some(Box::new(listener));
    }
}
