//! Fieldscribe - Conversational Activity Report Assistant
//!
//! This crate implements the slot-filling session core that turns a
//! multi-turn conversation with a field worker into a structured
//! activity report.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
