//! Fixed conversational script.
//!
//! Every text the orchestrator can fall back to when the generation
//! backend is degraded lives here: the opening question, the neutral
//! acknowledgement, one canned question per slot, and the placeholder
//! summary renderer. All of it is deterministic, so a session stays
//! usable through a full backend outage.

use super::slots::{SlotName, SlotValues};

/// First question of every session. Fixed, never generated, so session
/// creation works without the generation backend.
pub const OPENING_QUESTION: &str =
    "Let's put your activity report together. Which customer did you visit, and what was the occasion?";

/// Acknowledgement substituted when generation fails.
pub const NEUTRAL_ACKNOWLEDGEMENT: &str = "Got it, thanks.";

/// Question asked when every slot is already filled but the session
/// continues (below the minimum-turn floor).
pub const WRAP_UP_QUESTION: &str = "Anything else worth adding to the report?";

/// Returns the canned question targeting one slot.
pub fn fallback_question(slot: SlotName) -> &'static str {
    match slot {
        SlotName::Customer => "Which customer or account did you visit?",
        SlotName::Project => "Which project or deal did you discuss?",
        SlotName::NextAction => "What was agreed as the next action?",
        SlotName::Budget => "Did budget or pricing come up? What figures were mentioned?",
        SlotName::Schedule => "What schedule or deadlines were discussed?",
        SlotName::Participants => "Who attended the meeting?",
        SlotName::Location => "Where did the meeting take place?",
        SlotName::Issues => "Were any problems or risks raised?",
        SlotName::Reaction => "How did the customer react to what you presented?",
        SlotName::Competitors => "Were any competitors or rival offers mentioned?",
        SlotName::CloseLikelihood => "How likely do you think this deal is to close?",
    }
}

/// Deterministic next question: the first unfilled slot in priority
/// order, or the wrap-up question when nothing is missing.
pub fn next_fallback_question(slots: &SlotValues) -> &'static str {
    match slots.first_unfilled() {
        Some(slot) => fallback_question(slot),
        None => WRAP_UP_QUESTION,
    }
}

/// Renders the placeholder summary from the slot values alone.
///
/// Used whenever summary generation fails; always non-empty.
pub fn placeholder_summary(slots: &SlotValues, turn_count: usize) -> String {
    let mut lines = vec![format!(
        "Activity report ({} {} recorded).",
        turn_count,
        if turn_count == 1 { "answer" } else { "answers" }
    )];

    for (slot, value) in slots.filled() {
        lines.push(format!("{}: {}", slot.label(), value));
    }

    let missing = slots.unfilled();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|s| s.label()).collect();
        lines.push(format!("Not captured: {}.", names.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_slot_has_a_fallback_question() {
        for slot in SlotName::all() {
            let question = fallback_question(*slot);
            assert!(!question.is_empty());
            assert!(question.ends_with('?'));
        }
    }

    #[test]
    fn next_fallback_question_picks_first_unfilled() {
        let mut slots = SlotValues::new();
        assert_eq!(
            next_fallback_question(&slots),
            fallback_question(SlotName::Customer)
        );

        slots.set(SlotName::Customer, "Acme");
        slots.set(SlotName::Project, "Project X");
        assert_eq!(
            next_fallback_question(&slots),
            fallback_question(SlotName::NextAction)
        );
    }

    #[test]
    fn next_fallback_question_wraps_up_when_everything_is_filled() {
        let mut slots = SlotValues::new();
        for slot in SlotName::all() {
            slots.set(*slot, "x");
        }
        assert_eq!(next_fallback_question(&slots), WRAP_UP_QUESTION);
    }

    #[test]
    fn placeholder_summary_is_never_empty() {
        let summary = placeholder_summary(&SlotValues::new(), 0);
        assert!(!summary.is_empty());
        assert!(summary.contains("Not captured"));
    }

    #[test]
    fn placeholder_summary_lists_filled_slots() {
        let mut slots = SlotValues::new();
        slots.set(SlotName::Customer, "Acme");
        slots.set(SlotName::NextAction, "send a quote");

        let summary = placeholder_summary(&slots, 3);
        assert!(summary.contains("3 answers"));
        assert!(summary.contains("Customer: Acme"));
        assert!(summary.contains("Next action: send a quote"));
        assert!(summary.contains("Not captured"));
    }

    #[test]
    fn placeholder_summary_omits_missing_line_when_complete() {
        let mut slots = SlotValues::new();
        for slot in SlotName::all() {
            slots.set(*slot, "x");
        }

        let summary = placeholder_summary(&slots, 11);
        assert!(!summary.contains("Not captured"));
    }
}
