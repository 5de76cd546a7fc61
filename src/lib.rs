//! # encceja-boletim
//!
//! Read the scores on an Encceja report card (boletim) with a Vision Language
//! Model and forward the confirmed result to a spreadsheet webhook.
//!
//! A participant types their CPF, attaches a photo or PDF of the boletim,
//! Gemini reads the five area scores (and the name, when visible), the
//! participant confirms them, and the row is posted to a Google Apps Script
//! webhook. The document understanding and the storage are both external;
//! this crate owns the flow between them.
//!
//! ## Flow Overview
//!
//! ```text
//! form ──▶ analyzing ──▶ review ──▶ success
//!  │  ├─ 1. Input    CPF mask, file selection, preview copy
//!  │  ├─ 2. Encode   file → base64 payload + content type
//!  │  ├─ 3. Extract  one Gemini call with a fixed schema
//!  │  ├─ 4. Review   per-subject pass/fail rows
//!  │  └─ 5. Submit   fire-and-forget webhook POST
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use encceja_boletim::{FlowConfig, FlowController, SelectedFile, AppStep};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY (or API_KEY)
//!     let config = FlowConfig::from_env();
//!     let mut flow = FlowController::from_config(&config)?;
//!
//!     flow.input_cpf("12345678901");
//!     flow.select_file(SelectedFile::detect("boletim.jpg")?);
//!
//!     if flow.submit().await == AppStep::Review {
//!         if let Some(delivery) = flow.confirm() {
//!             delivery.settled().await;
//!         }
//!     } else {
//!         eprintln!("{}", flow.state().error_message().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `boletim` terminal front-end (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod flow;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FlowConfig, FlowConfigBuilder};
pub use error::{BoletimError, ValidationError};
pub use flow::{FlowController, FlowState};
pub use output::{AppStep, ReportCardData, Score, Subject};
pub use pipeline::encode::{EncodedDocument, Preview};
pub use pipeline::extract::{GeminiExtractor, ScoreExtractor};
pub use pipeline::input::{normalize_cpf, SelectedFile};
pub use pipeline::review::{review_rows, ReviewIntent, RowStatus, ScoreRow};
pub use pipeline::submit::{
    DeliveryHandle, SubmissionDispatcher, SubmissionPayload, SubmissionSink, WebhookSink,
};
pub use progress::{FlowObserver, NoopObserver, SharedObserver};
