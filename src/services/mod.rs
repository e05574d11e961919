// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod forms;
pub mod functions;
pub mod goals;
pub mod history;
pub mod recorder;
pub mod recording;
pub mod session;

pub use account::{AccountService, DeletionOutcome};
pub use forms::SignUpForm;
pub use functions::{AppwriteFunctions, Execution, FunctionRunner, StaticFunctionRunner};
pub use goals::GoalService;
pub use history::HistoryService;
pub use recorder::{HeartRateMonitor, Recorder, StopResult};
pub use recording::{RecordingUploader, UploadResult};
pub use session::{AppwriteAccount, MemorySessionStore, SessionStore};
