//! Urgent follow-up detection - trigger phrases that demand a probe.
//!
//! A small, fixed rule table scans the most recent answer for signals
//! (competitor talk, money talk, strong buying signals, trouble) whose
//! matching slot is still empty. The orchestrator steers the next
//! question toward that slot, and may defer one completion decision
//! for it.

use crate::domain::report::{ReportSession, SlotName};

/// One detection rule: any phrase hit points at the slot to probe.
struct FollowUpRule {
    slot: SlotName,
    phrases: &'static [&'static str],
}

/// The rule table, checked in order; the first hit wins.
///
/// Matching is lowercase substring matching. Crude on purpose: this is
/// a cheap deterministic net under the generation service, not NLP.
const FOLLOW_UP_RULES: &[FollowUpRule] = &[
    FollowUpRule {
        slot: SlotName::Competitors,
        phrases: &[
            "competitor",
            "competing",
            "competition",
            "rival",
            "other vendor",
            "other supplier",
            "another vendor",
            "comparing us",
        ],
    },
    FollowUpRule {
        slot: SlotName::Budget,
        phrases: &[
            "budget",
            "price",
            "pricing",
            "cost",
            "quote",
            "expensive",
            "cheap",
            "discount",
            "$",
            "dollar",
            "euro",
        ],
    },
    FollowUpRule {
        slot: SlotName::CloseLikelihood,
        phrases: &[
            "very interested",
            "really interested",
            "loved it",
            "love it",
            "impressed",
            "enthusiastic",
            "ready to sign",
            "ready to buy",
            "move forward",
            "green light",
        ],
    },
    FollowUpRule {
        slot: SlotName::Issues,
        phrases: &[
            "problem",
            "issue",
            "concern",
            "complaint",
            "complained",
            "worried",
            "risk",
            "blocker",
            "unhappy",
            "frustrated",
        ],
    },
];

/// Scans the most recent answer for an urgent gap to probe.
///
/// Returns the slot to target, or `None` when nothing urgent is open.
/// Only unfilled slots qualify; once the slot has a value the trigger
/// goes quiet.
///
/// # Edge Cases
/// - No history yet: `None`
/// - Several rules match: the first in table order wins
pub fn urgent_follow_up(session: &ReportSession) -> Option<SlotName> {
    let last = session.history().last()?;
    let answer = last.answer.to_lowercase();

    FOLLOW_UP_RULES
        .iter()
        .find(|rule| {
            !session.slots().is_filled(rule.slot)
                && rule.phrases.iter().any(|phrase| answer.contains(phrase))
        })
        .map(|rule| rule.slot)
}
