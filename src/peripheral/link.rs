// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BLE session with the wearable: scan, connect, relay heart rate, and the
//! stop/summary handshake.

use super::frame::{self, CommandFrame, ExerciseSummaryFrame, HeartRateFrame};
use super::{BleAdapter, BleConnection, LinkError};
use crate::config::Config;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Workout service exposed by the wearable.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x6e40_0001_b5a3_f393_e0a9_e50e_24dc_ca9e);
/// Heart-rate notify characteristic.
pub const HEART_RATE_UUID: Uuid = Uuid::from_u128(0x6e40_0002_b5a3_f393_e0a9_e50e_24dc_ca9e);
/// Stop-command write characteristic.
pub const COMMAND_UUID: Uuid = Uuid::from_u128(0x6e40_0003_b5a3_f393_e0a9_e50e_24dc_ca9e);
/// Exercise-summary notify characteristic.
pub const SUMMARY_UUID: Uuid = Uuid::from_u128(0x6e40_0004_b5a3_f393_e0a9_e50e_24dc_ca9e);

pub const DEFAULT_MTU: u16 = 512;

/// Identifiers and limits for one link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Exact advertised name of the wearable
    pub peripheral_name: String,
    pub scan_timeout: Duration,
    pub service: Uuid,
    pub heart_rate: Uuid,
    pub command: Uuid,
    pub summary: Uuid,
    pub mtu: u16,
}

impl LinkConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            peripheral_name: config.peripheral_name.clone(),
            scan_timeout: config.scan_timeout,
            ..Self::default()
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            peripheral_name: crate::config::DEFAULT_PERIPHERAL_NAME.to_string(),
            scan_timeout: Duration::from_secs(crate::config::DEFAULT_SCAN_TIMEOUT_SECS),
            service: SERVICE_UUID,
            heart_rate: HEART_RATE_UUID,
            command: COMMAND_UUID,
            summary: SUMMARY_UUID,
            mtu: DEFAULT_MTU,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Scanning,
    /// Subscribed to heart rate
    Connected,
    /// Stop command sent, waiting for the exercise summary
    StopRequested,
    Disconnected,
}

/// Data relayed upward from the device.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    HeartRate(f64),
    ExerciseSummary { exercise: String, reps: u32 },
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was written
    NotConnected,
    /// Stop command acknowledged; a summary event will follow
    Requested,
}

struct LinkInner {
    state: LinkState,
    connection: Option<Arc<dyn BleConnection>>,
    tasks: Vec<JoinHandle<()>>,
}

/// One session with the wearable.
pub struct PeripheralLink {
    adapter: Arc<dyn BleAdapter>,
    config: LinkConfig,
    paused: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<LinkEvent>,
    inner: Mutex<LinkInner>,
}

impl PeripheralLink {
    /// Create an idle link. `paused` is read at notification delivery time.
    pub fn new(
        adapter: Arc<dyn BleAdapter>,
        config: LinkConfig,
        paused: Arc<AtomicBool>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let link = Self {
            adapter,
            config,
            paused,
            events,
            inner: Mutex::new(LinkInner {
                state: LinkState::Idle,
                connection: None,
                tasks: Vec::new(),
            }),
        };
        (link, receiver)
    }

    pub async fn state(&self) -> LinkState {
        self.inner.lock().await.state
    }

    /// Whether a device is connected and not yet disconnected.
    pub async fn is_connected(&self) -> bool {
        matches!(
            self.state().await,
            LinkState::Connected | LinkState::StopRequested
        )
    }

    /// Scan for the wearable, connect and subscribe to heart rate.
    ///
    /// Returns whether the link ended up connected. Errors are logged and
    /// leave the link unconnected.
    pub async fn start(&self) -> bool {
        match self.try_start().await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start peripheral link");
                let mut inner = self.inner.lock().await;
                if inner.state == LinkState::Scanning {
                    inner.state = LinkState::Idle;
                }
                false
            }
        }
    }

    async fn try_start(&self) -> Result<bool, LinkError> {
        {
            let mut inner = self.inner.lock().await;
            match inner.state {
                LinkState::Idle | LinkState::Disconnected => inner.state = LinkState::Scanning,
                state => {
                    tracing::warn!(?state, "Link already active");
                    return Ok(matches!(
                        state,
                        LinkState::Connected | LinkState::StopRequested
                    ));
                }
            }
        }

        self.adapter.request_permissions().await?;

        let Some(device_id) = self.scan_for_device().await? else {
            tracing::info!(
                name = %self.config.peripheral_name,
                timeout_secs = self.config.scan_timeout.as_secs(),
                "Peripheral not found"
            );
            let mut inner = self.inner.lock().await;
            if inner.state == LinkState::Scanning {
                inner.state = LinkState::Idle;
            }
            return Ok(false);
        };

        tracing::info!(device_id = %device_id, "Connecting to peripheral");
        let connection = self.adapter.connect(&device_id).await?;

        let opened = self.open(connection.as_ref()).await;
        match opened {
            Ok(notifications) => {
                let mut inner = self.inner.lock().await;
                if inner.state != LinkState::Scanning {
                    // Torn down while connecting
                    drop(inner);
                    let _ = connection.disconnect().await;
                    return Ok(false);
                }

                let task = tokio::spawn(relay_heart_rate(
                    notifications,
                    Arc::clone(&self.paused),
                    self.events.clone(),
                ));
                inner.tasks.push(task);
                inner.connection = Some(connection);
                inner.state = LinkState::Connected;
                tracing::info!("Peripheral connected");
                Ok(true)
            }
            Err(e) => {
                let _ = connection.disconnect().await;
                Err(e)
            }
        }
    }

    /// Scan until a device with the configured name shows up or the timeout
    /// passes. Scanning is stopped either way.
    async fn scan_for_device(&self) -> Result<Option<String>, LinkError> {
        let mut devices = self.adapter.start_scan().await?;
        let wanted = self.config.peripheral_name.as_str();

        let found = tokio::time::timeout(self.config.scan_timeout, async {
            while let Some(device) = devices.next().await {
                if device.name.as_deref() == Some(wanted) {
                    return Some(device.id);
                }
            }
            None
        })
        .await
        .unwrap_or(None);

        if let Err(e) = self.adapter.stop_scan().await {
            tracing::warn!(error = %e, "Failed to stop scan");
        }
        Ok(found)
    }

    async fn open(
        &self,
        connection: &dyn BleConnection,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError> {
        connection.discover().await?;
        let mtu = connection.request_mtu(self.config.mtu).await?;
        tracing::debug!(mtu, "MTU negotiated");
        connection
            .subscribe(self.config.service, self.config.heart_rate)
            .await
    }

    /// Send the stop command and wait (in the background) for one exercise
    /// summary.
    ///
    /// Does nothing unless a device is connected.
    pub async fn request_stop(&self) -> Result<StopOutcome, LinkError> {
        let connection = {
            let inner = self.inner.lock().await;
            match (&inner.state, &inner.connection) {
                (LinkState::Connected, Some(connection)) => Arc::clone(connection),
                _ => return Ok(StopOutcome::NotConnected),
            }
        };

        let payload = frame::encode(&CommandFrame::stop())?;
        connection
            .write_with_response(self.config.service, self.config.command, &payload)
            .await?;
        tracing::info!("Stop command sent");

        let summaries = connection
            .subscribe(self.config.service, self.config.summary)
            .await?;

        let task = tokio::spawn(await_summary(
            connection,
            summaries,
            self.config.service,
            self.config.summary,
            self.events.clone(),
        ));

        let mut inner = self.inner.lock().await;
        inner.tasks.push(task);
        inner.state = LinkState::StopRequested;
        Ok(StopOutcome::Requested)
    }

    /// Cancel the connection and background tasks and release the adapter's
    /// cached peripherals. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        if inner.state == LinkState::Disconnected {
            return;
        }
        inner.state = LinkState::Disconnected;

        if let Some(connection) = inner.connection.take() {
            if let Err(e) = connection.disconnect().await {
                tracing::warn!(error = %e, "Error while disconnecting");
            }
            let _ = self.events.send(LinkEvent::Disconnected);
            tracing::info!("Peripheral disconnected");
        }

        if let Err(e) = self.adapter.release().await {
            tracing::warn!(error = %e, "Failed to release Bluetooth adapter");
        }
    }

    /// The owning screen lost focus: hard teardown.
    pub async fn on_focus_lost(&self) {
        self.disconnect().await;
    }
}

async fn relay_heart_rate(
    mut notifications: BoxStream<'static, Vec<u8>>,
    paused: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(payload) = notifications.next().await {
        if paused.load(Ordering::SeqCst) {
            continue;
        }
        match frame::decode::<HeartRateFrame>(&payload) {
            Ok(frame) => {
                if events.send(LinkEvent::HeartRate(frame.heart_rate)).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Dropping heart-rate frame"),
        }
    }
}

async fn await_summary(
    connection: Arc<dyn BleConnection>,
    mut summaries: BoxStream<'static, Vec<u8>>,
    service: Uuid,
    characteristic: Uuid,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(payload) = summaries.next().await {
        match frame::decode::<ExerciseSummaryFrame>(&payload) {
            Ok(summary) => {
                tracing::info!(exercise = %summary.exercise, reps = summary.reps, "Exercise summary received");
                if let Err(e) = connection.unsubscribe(service, characteristic).await {
                    tracing::warn!(error = %e, "Failed to cancel summary subscription");
                }
                let _ = events.send(LinkEvent::ExerciseSummary {
                    exercise: summary.exercise,
                    reps: summary.reps,
                });
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Dropping summary frame"),
        }
    }
}
