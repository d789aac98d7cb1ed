//! Merged score + win-probability timeline for one archived game.
//!
//! [`ProbabilityEngine`] is the serving-time orchestrator. For every replayed
//! state of a game it picks one of three estimation strategies:
//!
//! 1. **Locked** — the leader is mathematically uncatchable; emit the one-hot
//!    vector and skip the model entirely.
//! 2. **Closed-form endgame** — at the last replayed state (the moment before
//!    the final clue), use the empirical ratio-state table instead of the
//!    regression.
//! 3. **Learned model** — everywhere else, query the fitted classifier on
//!    `[score, score, score, remaining board value]`.
//!
//! The replayed rows are then concatenated with one terminal row carrying the
//! true recorded result, and wager-clue markers are derived by finite
//! difference on the wagers-remaining column rather than copied from the
//! event flags. The merged timeline is what the dashboard renders; the engine
//! itself catches nothing, so a bad archive row or a broken model asset
//! surfaces to the caller instead of becoming a silently wrong chart.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::db::models::{ArchivedGame, ContestantSlot};

use super::endgame::{estimate_final_clue, FinalRoundOdds};
use super::error::EngineError;
use super::lock::{is_locked, locked_outcome};
use super::model::OutcomeModel;
use super::replay::{parse_events, replay, BoardRules, Roster};

/// One row of the merged timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineRow {
    /// 0 = before any clue; the last row is the true end-of-game result.
    pub event_number: u32,
    pub scores: [i64; 3],
    pub board_value_remaining: i64,
    pub wagers_remaining: u32,
    /// Outcome probabilities in slot order. One-hot when locked and on the
    /// terminal row.
    pub probabilities: [f64; 3],
    pub locked: bool,
    /// True when a hidden-wager clue resolved at this row.
    pub wager_clue: bool,
}

/// Full artifact handed to presentation: per-clue scores, probabilities and
/// lock/wager markers, ending with the recorded result.
#[derive(Debug, Clone, Serialize)]
pub struct WinProbabilityTimeline {
    pub show_number: u32,
    pub contestants: [String; 3],
    pub winner: ContestantSlot,
    pub rows: Vec<TimelineRow>,
}

/// Serving-time estimator shared read-only across all requests.
pub struct ProbabilityEngine {
    model: Arc<dyn OutcomeModel>,
    odds: FinalRoundOdds,
    rules: BoardRules,
}

impl fmt::Debug for ProbabilityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbabilityEngine")
            .field("odds", &self.odds)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl ProbabilityEngine {
    pub fn new(
        model: Arc<dyn OutcomeModel>,
        odds: FinalRoundOdds,
        rules: BoardRules,
    ) -> Result<ProbabilityEngine, EngineError> {
        rules.validate()?;
        Ok(ProbabilityEngine { model, odds, rules })
    }

    /// Build the merged timeline for one fully-materialized archived game.
    ///
    /// Row count is always `scored clues + 2`: the initial state, one row per
    /// clue, and the terminal true-result row.
    pub fn estimate(&self, game: &ArchivedGame) -> Result<WinProbabilityTimeline, EngineError> {
        let show_number = game.record.show_number;
        let roster = Roster::new(game.record.names())?;
        let events = parse_events(&game.scored_clues, &roster)?;
        let states = replay(show_number, &events, &self.rules)?;
        let winner = ContestantSlot::from_code(&game.record.winner).ok_or_else(|| {
            EngineError::DataIntegrity(format!(
                "show {}: unknown winner code '{}'",
                show_number, game.record.winner
            ))
        })?;

        let final_index = states.len() - 1;
        let mut rows = Vec::with_capacity(states.len() + 1);
        for (i, state) in states.iter().enumerate() {
            let (leader, second) = top_two(&state.scores);
            let locked = is_locked(
                leader,
                second,
                state.board_value_remaining,
                state.wagers_remaining,
            );
            let probabilities = if locked {
                let one_hot = locked_outcome(&state.scores);
                debug_assert!(
                    (one_hot.iter().sum::<f64>() - 1.0).abs() < f64::EPSILON,
                    "a locked state must have a strict leader, scores {:?}",
                    state.scores
                );
                one_hot
            } else if i == final_index {
                estimate_final_clue(&state.scores, &self.odds)?
            } else {
                self.model.predict([
                    state.scores[0] as f64,
                    state.scores[1] as f64,
                    state.scores[2] as f64,
                    state.board_value_remaining as f64,
                ])?
            };
            rows.push(TimelineRow {
                event_number: state.event_number,
                scores: state.scores,
                board_value_remaining: state.board_value_remaining,
                wagers_remaining: state.wagers_remaining,
                probabilities,
                locked,
                wager_clue: false,
            });
        }

        // Terminal row: the recorded result after the final clue.
        let final_scores = game.record.final_scores;
        let mut terminal_probs = [0.0; 3];
        terminal_probs[winner.index()] = 1.0;
        let (leader, second) = top_two(&final_scores);
        rows.push(TimelineRow {
            event_number: states[final_index].event_number + 1,
            scores: final_scores,
            board_value_remaining: 0,
            wagers_remaining: 0,
            probabilities: terminal_probs,
            locked: is_locked(leader, second, 0, 0),
            wager_clue: false,
        });

        // A drop of exactly one in the wagers-remaining column marks the row
        // where a hidden-wager clue resolved.
        for i in 1..rows.len() {
            rows[i].wager_clue =
                rows[i - 1].wagers_remaining.saturating_sub(rows[i].wagers_remaining) == 1;
        }

        Ok(WinProbabilityTimeline {
            show_number,
            contestants: roster.display_names().clone(),
            winner,
            rows,
        })
    }
}

/// Highest and second-highest of the three scores.
fn top_two(scores: &[i64; 3]) -> (i64, i64) {
    let mut sorted = *scores;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    (sorted[0], sorted[1])
}
