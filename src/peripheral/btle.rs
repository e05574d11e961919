// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `btleplug` implementation of the BLE traits.

use super::{BleAdapter, BleConnection, DiscoveredDevice, LinkError};
use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use dashmap::DashMap;
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

/// First Bluetooth adapter of the host.
pub struct BtleAdapter {
    adapter: Adapter,
    /// Peripherals seen since the last release, keyed by their ID string
    seen: Arc<DashMap<String, Peripheral>>,
}

impl BtleAdapter {
    pub async fn new() -> Result<Self, LinkError> {
        let manager = Manager::new()
            .await
            .map_err(|e| LinkError::Scan(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| LinkError::Scan(e.to_string()))?
            .into_iter()
            .next()
            .ok_or(LinkError::NoAdapter)?;

        Ok(Self {
            adapter,
            seen: Arc::new(DashMap::new()),
        })
    }
}

#[async_trait]
impl BleAdapter for BtleAdapter {
    async fn start_scan(&self) -> Result<BoxStream<'static, DiscoveredDevice>, LinkError> {
        let events = self
            .adapter
            .events()
            .await
            .map_err(|e| LinkError::Scan(e.to_string()))?;
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| LinkError::Scan(e.to_string()))?;

        let adapter = self.adapter.clone();
        let seen = Arc::clone(&self.seen);
        let devices = events.filter_map(move |event| {
            let adapter = adapter.clone();
            let seen = Arc::clone(&seen);
            async move {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => return None,
                };
                let peripheral = adapter.peripheral(&id).await.ok()?;
                let name = peripheral
                    .properties()
                    .await
                    .ok()
                    .flatten()
                    .and_then(|p| p.local_name);
                let key = format!("{:?}", id);
                seen.insert(key.clone(), peripheral);
                Some(DiscoveredDevice { id: key, name })
            }
        });

        Ok(devices.boxed())
    }

    async fn stop_scan(&self) -> Result<(), LinkError> {
        self.adapter
            .stop_scan()
            .await
            .map_err(|e| LinkError::Scan(e.to_string()))
    }

    async fn connect(&self, device_id: &str) -> Result<Arc<dyn BleConnection>, LinkError> {
        let peripheral = self
            .seen
            .get(device_id)
            .map(|p| p.clone())
            .ok_or_else(|| LinkError::Connect(format!("device {} not seen", device_id)))?;

        peripheral
            .connect()
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))?;

        Ok(Arc::new(BtleConnection { peripheral }))
    }

    async fn release(&self) -> Result<(), LinkError> {
        tracing::debug!(cached = self.seen.len(), "Releasing scanned peripherals");
        self.seen.clear();
        Ok(())
    }
}

/// Connected `btleplug` peripheral.
pub struct BtleConnection {
    peripheral: Peripheral,
}

impl BtleConnection {
    fn characteristic(&self, service: Uuid, uuid: Uuid) -> Result<Characteristic, LinkError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.service_uuid == service && c.uuid == uuid)
            .ok_or_else(|| LinkError::Characteristic {
                uuid,
                message: "not found".to_string(),
            })
    }
}

#[async_trait]
impl BleConnection for BtleConnection {
    async fn discover(&self) -> Result<(), LinkError> {
        self.peripheral
            .discover_services()
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))
    }

    async fn request_mtu(&self, mtu: u16) -> Result<u16, LinkError> {
        // Desktop stacks negotiate the MTU themselves during connection
        tracing::debug!(requested = mtu, "MTU negotiation handled by the OS");
        Ok(mtu)
    }

    async fn subscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError> {
        let target = self.characteristic(service, characteristic)?;
        let to_error = |e: btleplug::Error| LinkError::Characteristic {
            uuid: characteristic,
            message: e.to_string(),
        };

        let notifications = self.peripheral.notifications().await.map_err(to_error)?;
        self.peripheral.subscribe(&target).await.map_err(to_error)?;

        Ok(notifications
            .filter_map(move |n| async move { (n.uuid == characteristic).then_some(n.value) })
            .boxed())
    }

    async fn unsubscribe(&self, service: Uuid, characteristic: Uuid) -> Result<(), LinkError> {
        let target = self.characteristic(service, characteristic)?;
        self.peripheral
            .unsubscribe(&target)
            .await
            .map_err(|e| LinkError::Characteristic {
                uuid: characteristic,
                message: e.to_string(),
            })
    }

    async fn write_with_response(
        &self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), LinkError> {
        let target = self.characteristic(service, characteristic)?;
        self.peripheral
            .write(&target, value, WriteType::WithResponse)
            .await
            .map_err(|e| LinkError::Characteristic {
                uuid: characteristic,
                message: e.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))
    }
}
