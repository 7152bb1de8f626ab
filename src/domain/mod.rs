//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `report` - Report session aggregate, slot schema, and canned dialogue
//! - `policy` - Pure completion and urgent-follow-up decisions

pub mod foundation;
pub mod policy;
pub mod report;
