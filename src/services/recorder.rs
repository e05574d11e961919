// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording screen controller.
//!
//! Feeds a [`HeartRateMonitor`] either from the wearable (via
//! [`PeripheralLink`] events) or from a local simulation, and turns a stop
//! into uploaded sets.

use crate::error::Result;
use crate::peripheral::{LinkEvent, LinkState, PeripheralLink, StopOutcome};
use crate::services::recording::{RecordingUploader, UploadResult};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Displayed heart rate before any sample and after a stop.
pub const BASELINE_HEART_RATE: f64 = 70.0;

/// Samples kept for the chart.
pub const WINDOW_SIZE: usize = 20;

pub const SIMULATION_INTERVAL: Duration = Duration::from_millis(500);
const SIMULATION_MIN: f64 = 60.0;
const SIMULATION_MAX: f64 = 120.0;
const SIMULATION_STEP: f64 = 5.0;

/// Sets uploaded when a recording is stopped without a wearable.
pub const FALLBACK_RECORDINGS: &[(&str, u32)] = &[("bench press", 15), ("deadlift", 9)];

/// Live heart-rate state for one recording.
#[derive(Debug, Clone)]
pub struct HeartRateMonitor {
    current: f64,
    window: VecDeque<f64>,
    sum: f64,
    count: u32,
}

impl Default for HeartRateMonitor {
    fn default() -> Self {
        Self {
            current: BASELINE_HEART_RATE,
            window: VecDeque::from([BASELINE_HEART_RATE]),
            sum: 0.0,
            count: 0,
        }
    }
}

impl HeartRateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, heart_rate: f64) {
        self.current = heart_rate;
        self.window.push_back(heart_rate);
        while self.window.len() > WINDOW_SIZE {
            self.window.pop_front();
        }
        self.sum += heart_rate;
        self.count += 1;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Most recent samples, oldest first.
    pub fn window(&self) -> Vec<f64> {
        self.window.iter().copied().collect()
    }

    /// Session average; `None` before the first sample.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }

    /// Average as displayed, one decimal or "N/A".
    pub fn average_label(&self) -> String {
        match self.average() {
            Some(avg) => format!("{:.1}", avg),
            None => "N/A".to_string(),
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Next simulated heart rate: a uniform step of at most 5 bpm, kept in
/// [60, 120].
pub fn next_simulated_rate<R: Rng + ?Sized>(previous: f64, rng: &mut R) -> f64 {
    let step = rng.gen_range(-SIMULATION_STEP..=SIMULATION_STEP);
    (previous + step).clamp(SIMULATION_MIN, SIMULATION_MAX)
}

/// What a stop did.
#[derive(Debug)]
pub enum StopResult {
    /// Simulation variant: the fallback sets were uploaded
    Uploaded(Vec<UploadResult>),
    /// Stop command sent; the upload happens when the summary arrives
    AwaitingSummary,
    /// No wearable connected: local state reset only
    Reset,
}

/// Recording controller shared between the UI loop and the event pump.
#[derive(Clone)]
pub struct Recorder {
    uploader: RecordingUploader,
    link: Option<Arc<PeripheralLink>>,
    paused: Arc<AtomicBool>,
    monitor: Arc<Mutex<HeartRateMonitor>>,
    simulation: Arc<Mutex<Option<JoinHandle<()>>>>,
    started_at: Arc<Mutex<Option<Instant>>>,
    pending_average: Arc<Mutex<Option<f64>>>,
}

impl Recorder {
    /// Simulation-only recorder.
    pub fn simulated(uploader: RecordingUploader) -> Self {
        Self::build(uploader, None, Arc::new(AtomicBool::new(true)))
    }

    /// Recorder backed by a wearable. `paused` must be the flag the link was
    /// created with.
    pub fn with_link(
        uploader: RecordingUploader,
        link: Arc<PeripheralLink>,
        paused: Arc<AtomicBool>,
    ) -> Self {
        Self::build(uploader, Some(link), paused)
    }

    fn build(
        uploader: RecordingUploader,
        link: Option<Arc<PeripheralLink>>,
        paused: Arc<AtomicBool>,
    ) -> Self {
        Self {
            uploader,
            link,
            paused,
            monitor: Arc::new(Mutex::new(HeartRateMonitor::new())),
            simulation: Arc::new(Mutex::new(None)),
            started_at: Arc::new(Mutex::new(None)),
            pending_average: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_playing(&self) -> bool {
        !self.paused.load(Ordering::SeqCst)
    }

    /// Snapshot of the heart-rate state.
    pub async fn monitor(&self) -> HeartRateMonitor {
        self.monitor.lock().await.clone()
    }

    async fn live(&self) -> bool {
        match &self.link {
            Some(link) => link.is_connected().await,
            None => false,
        }
    }

    /// Resume recording. Starts the simulation when no wearable is connected.
    pub async fn play(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.started_at.lock().await.get_or_insert_with(Instant::now);

        if !self.live().await {
            let mut simulation = self.simulation.lock().await;
            if simulation.is_none() {
                *simulation = Some(self.spawn_simulation());
                tracing::debug!("Heart-rate simulation started");
            }
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Flip between playing and paused. Returns whether it is now playing.
    pub async fn toggle_play(&self) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play().await;
            true
        }
    }

    fn spawn_simulation(&self) -> JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        let paused = Arc::clone(&self.paused);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SIMULATION_INTERVAL);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if paused.load(Ordering::SeqCst) {
                    continue;
                }
                let mut monitor = monitor.lock().await;
                let next = next_simulated_rate(monitor.current(), &mut rand::thread_rng());
                monitor.record(next);
            }
        })
    }

    /// Stop the recording.
    ///
    /// Halts updates and resets the display to the baseline. Without a
    /// wearable, the fallback sets are uploaded. With a connected wearable,
    /// the stop command is sent and the upload waits for its summary. With a
    /// wearable configured but not connected, nothing is written anywhere.
    pub async fn stop(&self) -> Result<StopResult> {
        self.pause();
        if let Some(task) = self.simulation.lock().await.take() {
            task.abort();
        }

        let average = {
            let mut monitor = self.monitor.lock().await;
            let average = monitor.average();
            monitor.reset();
            average
        };

        let Some(link) = &self.link else {
            self.started_at.lock().await.take();
            return self.upload_fallback(average).await.map(StopResult::Uploaded);
        };

        match link.request_stop().await? {
            StopOutcome::Requested => {
                *self.pending_average.lock().await = average;
                Ok(StopResult::AwaitingSummary)
            }
            StopOutcome::NotConnected => {
                self.started_at.lock().await.take();
                tracing::info!("Stop without a connected device");
                Ok(StopResult::Reset)
            }
        }
    }

    async fn upload_fallback(&self, average: Option<f64>) -> Result<Vec<UploadResult>> {
        let average = average.unwrap_or(BASELINE_HEART_RATE);
        let mut uploaded = Vec::with_capacity(FALLBACK_RECORDINGS.len());
        for (exercise, reps) in FALLBACK_RECORDINGS {
            uploaded.push(
                self.uploader
                    .upload_recording(average, exercise, *reps, None)
                    .await?,
            );
        }
        Ok(uploaded)
    }

    /// Apply one event from the link.
    ///
    /// An exercise summary uploads the set and disconnects the wearable.
    pub async fn handle_event(&self, event: LinkEvent) -> Result<Option<UploadResult>> {
        match event {
            LinkEvent::HeartRate(heart_rate) => {
                self.monitor.lock().await.record(heart_rate);
                Ok(None)
            }
            LinkEvent::ExerciseSummary { exercise, reps } => {
                let average = self
                    .pending_average
                    .lock()
                    .await
                    .take()
                    .unwrap_or(BASELINE_HEART_RATE);
                let elapsed_seconds = self
                    .started_at
                    .lock()
                    .await
                    .take()
                    .map(|started| u32::try_from(started.elapsed().as_secs()).unwrap_or(u32::MAX));

                let result = self
                    .uploader
                    .upload_recording(average, &exercise, reps, elapsed_seconds)
                    .await;

                if let Some(link) = &self.link {
                    link.disconnect().await;
                }
                result.map(Some)
            }
            LinkEvent::Disconnected => {
                tracing::info!("Wearable disconnected");
                Ok(None)
            }
        }
    }

    /// Feed link events into the recorder until the link is dropped.
    pub async fn run_events(&self, mut events: mpsc::UnboundedReceiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::error!(error = %e, "Error uploading recording");
            }
        }
    }

    /// Whether no stop handshake is outstanding.
    pub async fn summary_handled(&self) -> bool {
        match &self.link {
            Some(link) => link.state().await != LinkState::StopRequested,
            None => true,
        }
    }

    /// The screen lost focus: stop everything without uploading.
    pub async fn on_focus_lost(&self) {
        self.pause();
        if let Some(task) = self.simulation.lock().await.take() {
            task.abort();
        }
        if let Some(link) = &self.link {
            link.on_focus_lost().await;
        }
    }
}
