//! Slot schema for the activity report.
//!
//! The schema is closed: every slot a session can hold is declared here,
//! and everything written into a session passes through `SlotName`, so a
//! hallucinated key from the generation backend can never reach storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The fixed report schema: 3 required slots followed by 8 quality slots.
///
/// Declaration order is priority order; the deterministic fallback
/// question walks it front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Customer,
    Project,
    NextAction,
    Budget,
    Schedule,
    Participants,
    Location,
    Issues,
    Reaction,
    Competitors,
    CloseLikelihood,
}

impl SlotName {
    /// Returns all slots in priority order (required first).
    pub fn all() -> &'static [SlotName] {
        &[
            SlotName::Customer,
            SlotName::Project,
            SlotName::NextAction,
            SlotName::Budget,
            SlotName::Schedule,
            SlotName::Participants,
            SlotName::Location,
            SlotName::Issues,
            SlotName::Reaction,
            SlotName::Competitors,
            SlotName::CloseLikelihood,
        ]
    }

    /// Returns the slots that gate basic completion.
    pub fn required() -> &'static [SlotName] {
        &[SlotName::Customer, SlotName::Project, SlotName::NextAction]
    }

    /// Returns the slots that gate depth of completion.
    pub fn quality() -> &'static [SlotName] {
        &[
            SlotName::Budget,
            SlotName::Schedule,
            SlotName::Participants,
            SlotName::Location,
            SlotName::Issues,
            SlotName::Reaction,
            SlotName::Competitors,
            SlotName::CloseLikelihood,
        ]
    }

    /// Returns true if this slot gates basic completion.
    pub fn is_required(&self) -> bool {
        Self::required().contains(self)
    }

    /// Returns the wire key, matching the serde snake_case form.
    pub fn key(&self) -> &'static str {
        match self {
            SlotName::Customer => "customer",
            SlotName::Project => "project",
            SlotName::NextAction => "next_action",
            SlotName::Budget => "budget",
            SlotName::Schedule => "schedule",
            SlotName::Participants => "participants",
            SlotName::Location => "location",
            SlotName::Issues => "issues",
            SlotName::Reaction => "reaction",
            SlotName::Competitors => "competitors",
            SlotName::CloseLikelihood => "close_likelihood",
        }
    }

    /// Parses a wire key back into a SlotName.
    pub fn parse_key(key: &str) -> Option<SlotName> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            SlotName::Customer => "Customer",
            SlotName::Project => "Project",
            SlotName::NextAction => "Next action",
            SlotName::Budget => "Budget",
            SlotName::Schedule => "Schedule",
            SlotName::Participants => "Participants",
            SlotName::Location => "Location",
            SlotName::Issues => "Issues",
            SlotName::Reaction => "Reaction",
            SlotName::Competitors => "Competitors",
            SlotName::CloseLikelihood => "Close likelihood",
        }
    }

    /// Returns the short description used in extraction and question prompts.
    pub fn description(&self) -> &'static str {
        match self {
            SlotName::Customer => "the customer or account that was visited",
            SlotName::Project => "the project or deal that was discussed",
            SlotName::NextAction => "the agreed next action or follow-up step",
            SlotName::Budget => "budget, pricing, or monetary figures mentioned",
            SlotName::Schedule => "schedule, deadlines, or timing constraints",
            SlotName::Participants => "who attended the meeting",
            SlotName::Location => "where the meeting took place",
            SlotName::Issues => "problems, risks, or concerns raised",
            SlotName::Reaction => "how the counterpart reacted",
            SlotName::Competitors => "competitors or rival offers in play",
            SlotName::CloseLikelihood => "estimated likelihood of closing the deal",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The slot values of one session: every declared slot, always present,
/// empty string meaning unfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SlotName, String>")]
pub struct SlotValues(BTreeMap<SlotName, String>);

impl SlotValues {
    /// Creates an all-unfilled slot map.
    pub fn new() -> Self {
        Self(
            SlotName::all()
                .iter()
                .map(|s| (*s, String::new()))
                .collect(),
        )
    }

    /// Returns the value of a slot ("" when unfilled).
    pub fn get(&self, name: SlotName) -> &str {
        self.0.get(&name).map(String::as_str).unwrap_or_default()
    }

    /// Sets a slot value directly.
    pub fn set(&mut self, name: SlotName, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }

    /// Returns true if the slot holds a non-empty value.
    pub fn is_filled(&self, name: SlotName) -> bool {
        !self.get(name).is_empty()
    }

    /// Lists unfilled slots in priority order.
    pub fn unfilled(&self) -> Vec<SlotName> {
        SlotName::all()
            .iter()
            .copied()
            .filter(|s| !self.is_filled(*s))
            .collect()
    }

    /// Returns the first unfilled slot in priority order, if any.
    pub fn first_unfilled(&self) -> Option<SlotName> {
        SlotName::all().iter().copied().find(|s| !self.is_filled(*s))
    }

    /// Lists filled quality slots.
    pub fn filled_quality(&self) -> Vec<SlotName> {
        SlotName::quality()
            .iter()
            .copied()
            .filter(|s| self.is_filled(*s))
            .collect()
    }

    /// Lists filled slots with their values, in priority order.
    pub fn filled(&self) -> Vec<(SlotName, &str)> {
        SlotName::all()
            .iter()
            .copied()
            .filter(|s| self.is_filled(*s))
            .map(|s| (s, self.get(s)))
            .collect()
    }

    /// True iff every required slot is filled.
    pub fn required_complete(&self) -> bool {
        SlotName::required().iter().all(|s| self.is_filled(*s))
    }

    /// Ratio of filled quality slots to all quality slots, in [0, 1].
    pub fn quality_ratio(&self) -> f64 {
        let filled = self.filled_quality().len();
        filled as f64 / SlotName::quality().len() as f64
    }

    /// Merges an update into these values and returns the slots that
    /// actually changed.
    ///
    /// Empty incoming values are skipped, so a filled slot is never
    /// un-filled; re-applying the same update changes nothing.
    pub fn merge(&mut self, update: &SlotUpdate) -> Vec<SlotName> {
        let mut changed = Vec::new();
        for (name, value) in update.iter() {
            if value.is_empty() {
                continue;
            }
            if self.get(name) != value {
                self.set(name, value);
                changed.push(name);
            }
        }
        changed
    }
}

impl Default for SlotValues {
    fn default() -> Self {
        Self::new()
    }
}

// Repairs records that are missing keys, so a deserialized map always
// satisfies the full-key invariant.
impl From<BTreeMap<SlotName, String>> for SlotValues {
    fn from(mut map: BTreeMap<SlotName, String>) -> Self {
        for slot in SlotName::all() {
            map.entry(*slot).or_default();
        }
        Self(map)
    }
}

/// A partial slot update, as produced by extraction or a creation seed.
///
/// Keys are `SlotName` by construction, so anything outside the schema
/// has already been dropped by the time an update exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotUpdate(BTreeMap<SlotName, String>);

/// Outcome of validating raw generation output against the schema.
#[derive(Debug, Clone, Default)]
pub struct ParsedSlotUpdate {
    pub update: SlotUpdate,
    /// Keys the generation backend invented; dropped, reported for logging.
    pub unknown_keys: Vec<String>,
}

impl SlotUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: SlotName, value: impl Into<String>) -> Self {
        self.0.insert(name, value.into());
        self
    }

    /// Inserts or replaces a slot value.
    pub fn insert(&mut self, name: SlotName, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }

    /// Returns true when the update carries no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of carried values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates carried (slot, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SlotName, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Validates a raw JSON object from the generation backend.
    ///
    /// Returns `None` when the value is not an object. String and number
    /// values are accepted (numbers stringified); anything else is
    /// skipped. Whitespace is trimmed and blank values dropped. Unknown
    /// keys are collected instead of admitted.
    pub fn from_json(value: &Value) -> Option<ParsedSlotUpdate> {
        let object = value.as_object()?;
        let mut parsed = ParsedSlotUpdate::default();

        for (key, raw) in object {
            let Some(name) = SlotName::parse_key(key) else {
                parsed.unknown_keys.push(key.clone());
                continue;
            };
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if text.is_empty() {
                continue;
            }
            parsed.update.insert(name, text);
        }

        Some(parsed)
    }
}
