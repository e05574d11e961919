// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bluetooth Low Energy link to the wearable.
//!
//! The radio is reached through the [`BleAdapter`] / [`BleConnection`] traits
//! so the session logic in [`PeripheralLink`] runs the same against
//! `btleplug` and against the in-process [`mock`] used in tests.

#[cfg(feature = "ble")]
pub mod btle;
pub mod frame;
pub mod link;
pub mod mock;

pub use frame::FrameError;
pub use link::{LinkConfig, LinkEvent, LinkState, PeripheralLink, StopOutcome};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;
use uuid::Uuid;

/// Errors raised while talking to the peripheral.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("No Bluetooth adapter available")]
    NoAdapter,

    #[error("Bluetooth permission denied: {0}")]
    Permission(String),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Characteristic {uuid} error: {message}")]
    Characteristic { uuid: Uuid, message: String },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Not connected")]
    NotConnected,
}

/// A device seen during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    pub id: String,
    /// Advertised local name, if any
    pub name: Option<String>,
}

/// Entry point to the platform Bluetooth stack.
#[async_trait]
pub trait BleAdapter: Send + Sync {
    /// Ask the OS for Bluetooth/location permissions. Desktop stacks have none.
    async fn request_permissions(&self) -> Result<(), LinkError> {
        Ok(())
    }

    /// Start an unfiltered scan. The stream yields devices as they are seen.
    async fn start_scan(&self) -> Result<BoxStream<'static, DiscoveredDevice>, LinkError>;

    async fn stop_scan(&self) -> Result<(), LinkError>;

    async fn connect(&self, device_id: &str) -> Result<Arc<dyn BleConnection>, LinkError>;

    /// Drop peripherals cached by earlier scans. Called when a session ends.
    async fn release(&self) -> Result<(), LinkError> {
        Ok(())
    }
}

/// An open connection to one peripheral.
#[async_trait]
pub trait BleConnection: Send + Sync {
    /// Discover all services and characteristics.
    async fn discover(&self) -> Result<(), LinkError>;

    /// Negotiate the transmission unit. Returns the value in effect.
    async fn request_mtu(&self, mtu: u16) -> Result<u16, LinkError>;

    /// Subscribe to notifications of one characteristic.
    async fn subscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError>;

    async fn unsubscribe(&self, service: Uuid, characteristic: Uuid) -> Result<(), LinkError>;

    /// Write a value and wait for the device's acknowledgement.
    async fn write_with_response(
        &self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), LinkError>;

    async fn disconnect(&self) -> Result<(), LinkError>;
}
