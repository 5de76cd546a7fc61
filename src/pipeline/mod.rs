//! Pipeline stages for reading and submitting a boletim.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without the others and without a network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ postprocess ──▶ review ──▶ submit
//! (CPF/file) (base64)   (VLM)      (JSON→scores)  (rows)     (webhook)
//! ```
//!
//! 1. [`input`]       — CPF mask and file selection checks
//! 2. [`encode`]      — read the document and keep only the base64 payload;
//!    also owns the on-disk preview copy
//! 3. [`extract`]     — the single Gemini call; the only stage that waits on
//!    network I/O
//! 4. [`postprocess`] — tolerant parsing of the model's JSON into scores
//! 5. [`review`]      — per-subject rows for the confirmation screen
//! 6. [`submit`]      — payload construction and fire-and-forget delivery

pub mod encode;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod review;
pub mod submit;
