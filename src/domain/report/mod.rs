//! Report domain - session aggregate, slot schema, and canned dialogue.
//!
//! This module contains:
//! - `ReportSession`: the conversation aggregate persisted between turns
//! - `SlotName` / `SlotValues` / `SlotUpdate`: the closed slot schema
//! - `script`: deterministic question and summary fallbacks

mod session;
mod slots;

pub mod script;

pub use session::{Exchange, ReportSession};
pub use slots::{ParsedSlotUpdate, SlotName, SlotUpdate, SlotValues};
