//! Completion policy - decides when a session has gathered enough.
//!
//! Blends three signals into a staged gate: required-slot coverage,
//! quality-slot coverage, and recent answer depth. Every bound is a
//! tunable, not a constant; callers build [`CompletionTunables`] from
//! configuration.

use crate::domain::report::ReportSession;

/// Tunable weights and bounds for the completion decision.
///
/// The three weights are expected to sum to 1.0 (enforced at config
/// validation, not here).
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionTunables {
    /// Weight of the required-coverage signal (boolean, 0 or 1).
    pub required_weight: f64,
    /// Weight of the quality-coverage ratio.
    pub quality_weight: f64,
    /// Weight of the answer-depth signal.
    pub depth_weight: f64,
    /// No session completes before this many turns.
    pub min_turns: usize,
    /// Every session completes at this many turns, filled or not.
    pub hard_turn_cap: usize,
    /// Turn from which the blended score can complete the session.
    pub score_gate_turn: usize,
    /// Blended score needed at the score gate.
    pub score_threshold: f64,
    /// Turn from which quality coverage alone can complete the session.
    pub quality_gate_turn: usize,
    /// Quality ratio needed at the quality gate (above `score_threshold`).
    pub quality_threshold: f64,
    /// How many recent answers feed the depth signal.
    pub depth_window: usize,
    /// Average answer length (chars) that counts as full depth.
    pub depth_target_chars: usize,
}

impl Default for CompletionTunables {
    fn default() -> Self {
        Self {
            required_weight: 0.4,
            quality_weight: 0.4,
            depth_weight: 0.2,
            min_turns: 3,
            hard_turn_cap: 12,
            score_gate_turn: 5,
            score_threshold: 0.8,
            quality_gate_turn: 8,
            quality_threshold: 0.875,
            depth_window: 3,
            depth_target_chars: 120,
        }
    }
}

/// Completion decision engine.
///
/// Pure with respect to the session: reads state, never mutates it.
#[derive(Debug, Clone)]
pub struct CompletionPolicy {
    tunables: CompletionTunables,
}

impl CompletionPolicy {
    /// Creates a policy with the given tunables.
    pub fn new(tunables: CompletionTunables) -> Self {
        Self { tunables }
    }

    /// Returns the tunables in effect.
    pub fn tunables(&self) -> &CompletionTunables {
        &self.tunables
    }

    /// Decides whether the session should complete after this turn.
    ///
    /// Staged gate, in order:
    /// 1. Below the minimum turn floor: never.
    /// 2. At or past the hard cap: always (termination guarantee).
    /// 3. Required slots incomplete: continue.
    /// 4. Blended score past its threshold at the score gate, or quality
    ///    coverage alone past its threshold at the quality gate: complete.
    ///
    /// # Edge Cases
    /// - A fresh session (zero turns) never completes
    /// - At the hard cap the decision ignores slot contents entirely
    pub fn should_complete(&self, session: &ReportSession) -> bool {
        let turns = session.turn_count();

        if turns < self.tunables.min_turns {
            return false;
        }
        if turns >= self.tunables.hard_turn_cap {
            return true;
        }
        if !session.slots().required_complete() {
            return false;
        }

        let quality = session.slots().quality_ratio();
        let score_gate = turns >= self.tunables.score_gate_turn
            && self.blended_score(session) >= self.tunables.score_threshold;
        let quality_gate = turns >= self.tunables.quality_gate_turn
            && quality >= self.tunables.quality_threshold;

        score_gate || quality_gate
    }

    /// Weighted blend of the three coverage signals, in `0.0..=1.0`.
    pub fn blended_score(&self, session: &ReportSession) -> f64 {
        let required = if session.slots().required_complete() {
            1.0
        } else {
            0.0
        };
        let quality = session.slots().quality_ratio();
        let depth = self.answer_depth(session);

        required * self.tunables.required_weight
            + quality * self.tunables.quality_weight
            + depth * self.tunables.depth_weight
    }

    /// Depth signal: average character length of the recent answers,
    /// as a ratio of the target length, capped at 1.0.
    ///
    /// # Edge Cases
    /// - No answers yet: 0.0
    pub fn answer_depth(&self, session: &ReportSession) -> f64 {
        let recent = session.recent_answers(self.tunables.depth_window);
        if recent.is_empty() {
            return 0.0;
        }

        let total_chars: usize = recent.iter().map(|a| a.chars().count()).sum();
        let average = total_chars as f64 / recent.len() as f64;
        (average / self.tunables.depth_target_chars as f64).min(1.0)
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new(CompletionTunables::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, UserId};
    use crate::domain::report::{SlotName, SlotUpdate};
    use proptest::prelude::*;

    fn session_with_turns(turns: usize, answer: &str) -> ReportSession {
        let mut session =
            ReportSession::new(SessionId::new(), UserId::new("worker-1").unwrap());
        for _ in 0..turns {
            session.record_answer(answer).unwrap();
            session.set_current_question("next?").unwrap();
        }
        session
    }

    fn fill_required(session: &mut ReportSession) {
        let update = SlotUpdate::new()
            .with(SlotName::Customer, "Acme")
            .with(SlotName::Project, "Rollout")
            .with(SlotName::NextAction, "Send quote");
        session.merge_slots(&update).unwrap();
    }

    fn fill_all_quality(session: &mut ReportSession) {
        let mut update = SlotUpdate::new();
        for slot in SlotName::quality() {
            update.insert(*slot, "captured");
        }
        session.merge_slots(&update).unwrap();
    }

    mod should_complete {
        use super::*;

        #[test]
        fn never_before_minimum_turns() {
            let policy = CompletionPolicy::default();
            let mut session = session_with_turns(2, &"x".repeat(300));
            fill_required(&mut session);
            fill_all_quality(&mut session);

            assert!(!policy.should_complete(&session));
        }

        #[test]
        fn always_at_hard_cap_even_with_empty_slots() {
            let policy = CompletionPolicy::default();
            let session = session_with_turns(12, "eh");

            assert!(policy.should_complete(&session));
        }

        #[test]
        fn missing_required_slot_forces_continuation() {
            let policy = CompletionPolicy::default();
            let mut session = session_with_turns(7, &"x".repeat(300));
            fill_all_quality(&mut session);
            session
                .merge_slots(
                    &SlotUpdate::new()
                        .with(SlotName::Customer, "Acme")
                        .with(SlotName::Project, "Rollout"),
                )
                .unwrap();

            assert!(!policy.should_complete(&session));
        }

        #[test]
        fn rich_answers_complete_at_score_gate() {
            let policy = CompletionPolicy::default();
            // Required done, six of eight quality slots, long answers:
            // 0.4 + 0.4 * 0.75 + 0.2 = 0.9 >= 0.8.
            let mut session = session_with_turns(5, &"x".repeat(200));
            fill_required(&mut session);
            let update = SlotUpdate::new()
                .with(SlotName::Budget, "50k")
                .with(SlotName::Schedule, "Q3")
                .with(SlotName::Participants, "CTO")
                .with(SlotName::Location, "On site")
                .with(SlotName::Issues, "None")
                .with(SlotName::Reaction, "Positive");
            session.merge_slots(&update).unwrap();

            assert!(policy.should_complete(&session));
        }

        #[test]
        fn short_answers_and_thin_quality_hold_at_score_gate() {
            let policy = CompletionPolicy::default();
            // 0.4 + 0.4 * 0.125 + depth(2/120) ~= 0.45 < 0.8.
            let mut session = session_with_turns(5, "ok");
            fill_required(&mut session);
            session
                .merge_slots(&SlotUpdate::new().with(SlotName::Budget, "50k"))
                .unwrap();

            assert!(!policy.should_complete(&session));
        }

        #[test]
        fn quality_coverage_alone_completes_at_quality_gate() {
            let policy = CompletionPolicy::default();
            // Terse answers hold the blended score at roughly
            // 0.4 + 0.4 * 0.875 + 0.003 = 0.753 < 0.8, so the score gate
            // never fires; 7 of 8 quality slots crosses the quality gate.
            let mut session = session_with_turns(7, "ok");
            fill_required(&mut session);
            let mut update = SlotUpdate::new();
            for slot in &SlotName::quality()[..7] {
                update.insert(*slot, "captured");
            }
            session.merge_slots(&update).unwrap();

            assert!(!policy.should_complete(&session));

            session.record_answer("ok").unwrap();
            assert!(policy.should_complete(&session));
        }
    }

    mod signals {
        use super::*;

        #[test]
        fn depth_is_zero_without_answers() {
            let policy = CompletionPolicy::default();
            let session = session_with_turns(0, "");
            assert_eq!(policy.answer_depth(&session), 0.0);
        }

        #[test]
        fn depth_caps_at_one() {
            let policy = CompletionPolicy::default();
            let session = session_with_turns(3, &"x".repeat(500));
            assert_eq!(policy.answer_depth(&session), 1.0);
        }

        #[test]
        fn depth_uses_only_the_recent_window() {
            let policy = CompletionPolicy::default();
            let mut session = session_with_turns(4, &"x".repeat(400));
            for _ in 0..3 {
                session.record_answer("hm").unwrap();
                session.set_current_question("next?").unwrap();
            }

            // Window of 3 sees only the terse answers.
            assert!(policy.answer_depth(&session) < 0.05);
        }

        #[test]
        fn blended_score_weights_sum_to_full_coverage() {
            let policy = CompletionPolicy::default();
            let mut session = session_with_turns(3, &"x".repeat(200));
            fill_required(&mut session);
            fill_all_quality(&mut session);

            let score = policy.blended_score(&session);
            assert!((score - 1.0).abs() < 1e-9);
        }
    }

    mod properties {
        use super::*;

        proptest! {
            /// The floor holds regardless of slot contents and answer length.
            #[test]
            fn never_completes_below_floor(
                turns in 0usize..3,
                answer_len in 0usize..400,
                fill in proptest::collection::vec(any::<bool>(), 11),
            ) {
                let policy = CompletionPolicy::default();
                let mut session = session_with_turns(turns, &"x".repeat(answer_len));
                let mut update = SlotUpdate::new();
                for (slot, filled) in SlotName::all().iter().zip(fill) {
                    if filled {
                        update.insert(*slot, "value");
                    }
                }
                session.merge_slots(&update).unwrap();

                prop_assert!(!policy.should_complete(&session));
            }

            /// The hard cap holds regardless of slot contents and answer length.
            #[test]
            fn always_completes_at_hard_cap(
                extra_turns in 0usize..4,
                answer_len in 0usize..400,
                fill in proptest::collection::vec(any::<bool>(), 11),
            ) {
                let policy = CompletionPolicy::default();
                let cap = policy.tunables().hard_turn_cap;
                let mut session =
                    session_with_turns(cap + extra_turns, &"x".repeat(answer_len));
                let mut update = SlotUpdate::new();
                for (slot, filled) in SlotName::all().iter().zip(fill) {
                    if filled {
                        update.insert(*slot, "value");
                    }
                }
                session.merge_slots(&update).unwrap();

                prop_assert!(policy.should_complete(&session));
            }
        }
    }
}
