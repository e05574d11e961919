// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout-Tracker recorder
//!
//! Signs in, shows the home snapshot and records one session, from the
//! wearable when it can be found and from the heart-rate simulation otherwise.

use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker::{
    config::Config,
    services::{Recorder, StopResult},
    App,
};

/// How long to wait for the wearable's exercise summary after stopping.
const SUMMARY_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        peripheral = %config.peripheral_name,
        window_minutes = config.workout_window.num_minutes(),
        "Starting Workout-Tracker"
    );

    let app = App::connect(config);

    if let (Ok(email), Ok(password)) = (
        std::env::var("WORKOUT_EMAIL"),
        std::env::var("WORKOUT_PASSWORD"),
    ) {
        if let Err(e) = app.accounts.sign_in(&email, &password).await {
            tracing::error!(error = %e, "{}", e.user_message());
            return Err(e.into());
        }
    }

    match app.history.home().await {
        Ok(home) => tracing::info!(
            goal = ?home.current_goal,
            total_reps = home.week.total_reps,
            workouts = home.week.workouts,
            average_heart_rate = ?home.week.average_heart_rate,
            "Home snapshot"
        ),
        Err(e) => tracing::error!(error = %e, "Error fetching home data"),
    }

    let recorder = build_recorder(&app).await;
    recorder.play().await;
    tracing::info!("Recording, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    match recorder.stop().await {
        Ok(StopResult::Uploaded(sets)) => {
            tracing::info!(count = sets.len(), "Recording uploaded");
        }
        Ok(StopResult::AwaitingSummary) => {
            tracing::info!("Waiting for exercise summary");
            wait_for_summary(&recorder).await;
        }
        Ok(StopResult::Reset) => tracing::info!("Recording discarded"),
        Err(e) => tracing::error!(error = %e, "Error uploading recording"),
    }

    recorder.on_focus_lost().await;
    Ok(())
}

#[cfg(feature = "ble")]
async fn build_recorder(app: &App) -> Recorder {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use workout_tracker::peripheral::{btle::BtleAdapter, LinkConfig, PeripheralLink};

    let adapter = match BtleAdapter::new().await {
        Ok(adapter) => adapter,
        Err(e) => {
            tracing::warn!(error = %e, "Bluetooth unavailable, using simulation");
            return Recorder::simulated(app.recordings.clone());
        }
    };

    let paused = Arc::new(AtomicBool::new(true));
    let (link, events) = PeripheralLink::new(
        Arc::new(adapter),
        LinkConfig::from_config(&app.config),
        Arc::clone(&paused),
    );
    let link = Arc::new(link);
    let recorder = Recorder::with_link(app.recordings.clone(), Arc::clone(&link), paused);

    let pump = recorder.clone();
    tokio::spawn(async move { pump.run_events(events).await });

    if !link.start().await {
        tracing::warn!("Wearable not connected, using simulation");
    }
    recorder
}

#[cfg(not(feature = "ble"))]
async fn build_recorder(app: &App) -> Recorder {
    Recorder::simulated(app.recordings.clone())
}

/// Wait until the summary has been uploaded and the wearable released.
async fn wait_for_summary(recorder: &Recorder) {
    let waited = tokio::time::timeout(SUMMARY_TIMEOUT, async {
        while !recorder.summary_handled().await {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    })
    .await;

    if waited.is_err() {
        tracing::warn!("No exercise summary received");
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("workout_tracker=debug".parse().expect("valid directive"))
                .add_directive("info".parse().expect("valid directive")),
        )
        .with(format)
        .init();
}
