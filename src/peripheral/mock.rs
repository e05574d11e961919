// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scripted in-process peripheral for tests and demos.

use super::{BleAdapter, BleConnection, DiscoveredDevice, LinkError};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Adapter that "sees" a fixed list of devices, all backed by one
/// [`MockConnection`].
pub struct MockAdapter {
    devices: Vec<DiscoveredDevice>,
    connection: Arc<MockConnection>,
    scans: AtomicUsize,
    stopped_scans: AtomicUsize,
    releases: AtomicUsize,
    connects: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn new(devices: Vec<DiscoveredDevice>) -> Self {
        Self {
            devices,
            connection: Arc::new(MockConnection::default()),
            scans: AtomicUsize::new(0),
            stopped_scans: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            connects: Mutex::new(Vec::new()),
        }
    }

    /// Adapter that advertises a single named device.
    pub fn with_device(name: &str) -> Self {
        Self::new(vec![DiscoveredDevice {
            id: format!("mock-{}", name),
            name: Some(name.to_string()),
        }])
    }

    pub fn connection(&self) -> Arc<MockConnection> {
        Arc::clone(&self.connection)
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn stop_scan_count(&self) -> usize {
        self.stopped_scans.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.connects
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BleAdapter for MockAdapter {
    async fn start_scan(&self) -> Result<BoxStream<'static, DiscoveredDevice>, LinkError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        // Advertise the known devices, then keep scanning forever
        Ok(stream::iter(self.devices.clone())
            .chain(stream::pending())
            .boxed())
    }

    async fn stop_scan(&self) -> Result<(), LinkError> {
        self.stopped_scans.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self, device_id: &str) -> Result<Arc<dyn BleConnection>, LinkError> {
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(LinkError::Connect(format!("unknown device {}", device_id)));
        }
        if let Ok(mut connects) = self.connects.lock() {
            connects.push(device_id.to_string());
        }
        let connection: Arc<dyn BleConnection> = self.connection.clone();
        Ok(connection)
    }

    async fn release(&self) -> Result<(), LinkError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connection that records writes and lets tests push notifications.
#[derive(Default)]
pub struct MockConnection {
    senders: DashMap<Uuid, mpsc::UnboundedSender<Vec<u8>>>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    unsubscribed: Mutex<Vec<Uuid>>,
    mtu: AtomicU16,
    disconnects: AtomicUsize,
}

impl MockConnection {
    /// Deliver a notification on a characteristic. Returns false if nothing
    /// is subscribed to it.
    pub fn notify(&self, characteristic: Uuid, value: impl Into<Vec<u8>>) -> bool {
        self.senders
            .get(&characteristic)
            .map(|tx| tx.send(value.into()).is_ok())
            .unwrap_or(false)
    }

    pub fn is_subscribed(&self, characteristic: Uuid) -> bool {
        self.senders.contains_key(&characteristic)
    }

    /// Every acknowledged write, in order.
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn unsubscribed(&self) -> Vec<Uuid> {
        self.unsubscribed
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    /// MTU requested by the link, 0 if never negotiated.
    pub fn negotiated_mtu(&self) -> u16 {
        self.mtu.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BleConnection for MockConnection {
    async fn discover(&self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn request_mtu(&self, mtu: u16) -> Result<u16, LinkError> {
        self.mtu.store(mtu, Ordering::SeqCst);
        Ok(mtu)
    }

    async fn subscribe(
        &self,
        _service: Uuid,
        characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(characteristic, tx);
        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|value| (value, rx))
        })
        .boxed())
    }

    async fn unsubscribe(&self, _service: Uuid, characteristic: Uuid) -> Result<(), LinkError> {
        self.senders.remove(&characteristic);
        if let Ok(mut unsubscribed) = self.unsubscribed.lock() {
            unsubscribed.push(characteristic);
        }
        Ok(())
    }

    async fn write_with_response(
        &self,
        _service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), LinkError> {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((characteristic, value.to_vec()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.senders.clear();
        Ok(())
    }
}
