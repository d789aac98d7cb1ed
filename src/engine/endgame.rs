//! Closed-form outcome estimation at the final clue.
//!
//! Immediately before the final clue the regression model is at its weakest:
//! every game funnels through the same handful of score configurations, and
//! decades of archived games say more about what happens next than an
//! extrapolated linear model does. So at that single point the engine switches
//! to an empirical lookup keyed by **score-ratio states** between the ranked
//! contestants.
//!
//! Ratio bins for `lower / upper` between two ranked scores:
//! - `Tied` — exactly 1
//! - `Locked` — below 1/2 (the trailer cannot double past the leader)
//! - `LockTie` — exactly 1/2 (doubling reaches a tie at best)
//! - `Crush` — (1/2, 2/3)
//! - `TwoThirds` — [2/3, 3/4)
//! - `ThreeFourths` — [3/4, 4/5)
//! - `FourFifths` — [4/5, 1)
//!
//! Classification uses exact integer comparisons, so the boundary cases land
//! in the stricter bin without any float-epsilon guesswork. The odds table
//! itself is an offline-derived asset: a default built from the full archive
//! ships inside the binary, and deployments can point at their own JSON file
//! instead.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Default odds table, derived offline from the archived game history.
const DEFAULT_ODDS_JSON: &str = include_str!("../../assets/final_round_odds.json");

// ── Ratio states ─────────────────────────────────────────────────────────────

/// Categorical bucket for the ratio between two ranked scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRatioState {
    Tied,
    Locked,
    LockTie,
    Crush,
    TwoThirds,
    ThreeFourths,
    FourFifths,
}

impl ScoreRatioState {
    pub const ALL: [ScoreRatioState; 7] = [
        ScoreRatioState::Tied,
        ScoreRatioState::Locked,
        ScoreRatioState::LockTie,
        ScoreRatioState::Crush,
        ScoreRatioState::TwoThirds,
        ScoreRatioState::ThreeFourths,
        ScoreRatioState::FourFifths,
    ];
}

/// Classify `lower / upper` into its ratio bucket.
///
/// Requires `1 <= lower <= upper`; feed scores through [`clamp_score`] first.
/// The tie check comes before every inequality bin, and each boundary is an
/// exact integer comparison (e.g. ratio exactly 2/3 lands in `TwoThirds`).
pub fn classify_ratio(lower: i64, upper: i64) -> ScoreRatioState {
    debug_assert!(
        (1..=upper).contains(&lower),
        "classify_ratio needs 1 <= lower <= upper, got {lower}/{upper}"
    );
    if lower == upper {
        ScoreRatioState::Tied
    } else if 2 * lower < upper {
        ScoreRatioState::Locked
    } else if 2 * lower == upper {
        ScoreRatioState::LockTie
    } else if 3 * lower < 2 * upper {
        ScoreRatioState::Crush
    } else if 4 * lower < 3 * upper {
        ScoreRatioState::TwoThirds
    } else if 5 * lower < 4 * upper {
        ScoreRatioState::ThreeFourths
    } else {
        ScoreRatioState::FourFifths
    }
}

/// Clamp a non-positive score to 1 so ratios stay defined and a negative
/// score is never ranked above a smaller positive one.
pub fn clamp_score(score: i64) -> i64 {
    score.max(1)
}

// ── Odds table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct OddsEntry {
    /// Ratio state of rank-2 score vs rank-1 score.
    second_vs_first: ScoreRatioState,
    /// Ratio state of rank-3 score vs rank-2 score.
    third_vs_second: ScoreRatioState,
    /// Win probability for the rank-1 / rank-2 / rank-3 contestant.
    probs: [f64; 3],
}

#[derive(Debug, Clone, Deserialize)]
struct OddsFile {
    version: String,
    games_sampled: u32,
    entries: Vec<OddsEntry>,
}

/// Empirical final-clue win odds keyed by the pair of ratio states.
#[derive(Debug, Clone)]
pub struct FinalRoundOdds {
    version: String,
    games_sampled: u32,
    table: HashMap<(ScoreRatioState, ScoreRatioState), [f64; 3]>,
}

impl FinalRoundOdds {
    /// Parse and validate an odds-table asset.
    pub fn from_json(raw: &str) -> Result<FinalRoundOdds, EngineError> {
        let file: OddsFile = serde_json::from_str(raw).map_err(|e| {
            EngineError::Configuration(format!("invalid final-round odds asset: {e}"))
        })?;
        if file.entries.is_empty() {
            return Err(EngineError::Configuration(
                "final-round odds asset has no entries".into(),
            ));
        }
        let mut table = HashMap::with_capacity(file.entries.len());
        for entry in &file.entries {
            let key = (entry.second_vs_first, entry.third_vs_second);
            let sum: f64 = entry.probs.iter().sum();
            if entry.probs.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
                || (sum - 1.0).abs() > 1e-6
            {
                return Err(EngineError::Configuration(format!(
                    "odds entry ({:?}, {:?}) has invalid probabilities {:?}",
                    key.0, key.1, entry.probs
                )));
            }
            if table.insert(key, entry.probs).is_some() {
                return Err(EngineError::Configuration(format!(
                    "odds entry ({:?}, {:?}) appears more than once",
                    key.0, key.1
                )));
            }
        }
        Ok(FinalRoundOdds {
            version: file.version,
            games_sampled: file.games_sampled,
            table,
        })
    }

    pub fn from_path(path: &Path) -> Result<FinalRoundOdds, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!(
                "cannot read odds table {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// The table compiled into the binary.
    pub fn embedded() -> Result<FinalRoundOdds, EngineError> {
        Self::from_json(DEFAULT_ODDS_JSON)
    }

    pub fn lookup(
        &self,
        second_vs_first: ScoreRatioState,
        third_vs_second: ScoreRatioState,
    ) -> Option<[f64; 3]> {
        self.table.get(&(second_vs_first, third_vs_second)).copied()
    }

    /// Number of state pairs covered by the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn games_sampled(&self) -> u32 {
        self.games_sampled
    }
}

// ── Estimation ───────────────────────────────────────────────────────────────

/// Slot indices ordered best-to-worst by clamped score, ties in slot order.
fn rank_descending(clamped: &[i64; 3]) -> [usize; 3] {
    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&i| std::cmp::Reverse(clamped[i]));
    order
}

/// Estimate each contestant's win probability at the final clue.
///
/// Scores are clamped, ranked, classified pairwise, and the resulting state
/// pair keys the empirical table. The looked-up (best, middle, worst) triple
/// is scattered back onto the slots according to the computed ranking. A pair
/// the table does not cover is a [`EngineError::Configuration`]; the engine
/// never substitutes a made-up probability.
pub fn estimate_final_clue(
    scores: &[i64; 3],
    odds: &FinalRoundOdds,
) -> Result<[f64; 3], EngineError> {
    let clamped = scores.map(clamp_score);
    let order = rank_descending(&clamped);
    let second_vs_first = classify_ratio(clamped[order[1]], clamped[order[0]]);
    let third_vs_second = classify_ratio(clamped[order[2]], clamped[order[1]]);
    let probs = odds
        .lookup(second_vs_first, third_vs_second)
        .ok_or_else(|| {
            EngineError::Configuration(format!(
                "final-round odds table ({}) has no entry for ({:?}, {:?})",
                odds.version, second_vs_first, third_vs_second
            ))
        })?;
    let mut out = [0.0; 3];
    for (rank, &slot) in order.iter().enumerate() {
        out[slot] = probs[rank];
    }
    Ok(out)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_odds(entries: &str) -> FinalRoundOdds {
        let raw = format!(
            r#"{{"version":"test","games_sampled":100,"entries":[{entries}]}}"#
        );
        FinalRoundOdds::from_json(&raw).unwrap()
    }

    #[test]
    fn classification_matches_the_bin_table() {
        use ScoreRatioState::*;
        // (lower, upper, expected ratio bin)
        let cases = [
            (5, 5, Tied),       // 1.0
            (2, 5, Locked),     // 0.4
            (1, 2, LockTie),    // 0.5
            (3, 5, Crush),      // 0.6
            (7, 10, TwoThirds), // 0.7
            (39, 50, ThreeFourths), // 0.78
            (17, 20, FourFifths),   // 0.85
        ];
        for (lower, upper, expected) in cases {
            let got = classify_ratio(lower, upper);
            assert_eq!(got, expected, "{lower}/{upper} should be {expected:?}, got {got:?}");
        }
    }

    #[test]
    fn boundaries_land_in_the_stricter_bin() {
        use ScoreRatioState::*;
        assert_eq!(classify_ratio(1, 2), LockTie);
        assert_eq!(classify_ratio(49, 100), Locked);
        assert_eq!(classify_ratio(2, 3), TwoThirds);
        assert_eq!(classify_ratio(3, 4), ThreeFourths);
        assert_eq!(classify_ratio(4, 5), FourFifths);
        assert_eq!(classify_ratio(999, 1000), FourFifths);
    }

    #[test]
    fn clamp_floors_non_positive_scores() {
        assert_eq!(clamp_score(-500), 1);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(1), 1);
        assert_eq!(clamp_score(7200), 7200);
    }

    #[test]
    fn negative_score_is_clamped_before_ranking() {
        // [5000, 3000, -500] ranks on [5000, 3000, 1]: 3000/5000 is Crush,
        // 1/3000 is Locked.
        let odds = make_odds(
            r#"{"second_vs_first":"crush","third_vs_second":"locked","probs":[0.88,0.10,0.02]}"#,
        );
        let out = estimate_final_clue(&[5000, 3000, -500], &odds).unwrap();
        assert_relative_eq!(out[0], 0.88);
        assert_relative_eq!(out[1], 0.10);
        assert_relative_eq!(out[2], 0.02);
    }

    #[test]
    fn probabilities_scatter_back_by_rank() {
        // Ranking: slot 1 first, slot 2 second, slot 0 third.
        let odds = make_odds(
            r#"{"second_vs_first":"locked","third_vs_second":"crush","probs":[0.95,0.04,0.01]}"#,
        );
        let out = estimate_final_clue(&[1000, 9000, 4000], &odds).unwrap();
        assert_relative_eq!(out[1], 0.95);
        assert_relative_eq!(out[2], 0.04);
        assert_relative_eq!(out[0], 0.01);
    }

    #[test]
    fn tied_scores_rank_in_slot_order() {
        let odds = make_odds(
            r#"{"second_vs_first":"tied","third_vs_second":"lock_tie","probs":[0.47,0.46,0.07]}"#,
        );
        let out = estimate_final_clue(&[8000, 8000, 4000], &odds).unwrap();
        assert_relative_eq!(out[0], 0.47);
        assert_relative_eq!(out[1], 0.46);
        assert_relative_eq!(out[2], 0.07);
    }

    #[test]
    fn missing_pair_is_a_configuration_error() {
        let odds = make_odds(
            r#"{"second_vs_first":"tied","third_vs_second":"tied","probs":[0.34,0.33,0.33]}"#,
        );
        let err = estimate_final_clue(&[9000, 3000, 1000], &odds).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)), "got {err:?}");
    }

    #[test]
    fn invalid_probabilities_are_rejected_at_load() {
        let raw = r#"{"version":"t","games_sampled":1,"entries":[
            {"second_vs_first":"tied","third_vs_second":"tied","probs":[0.6,0.3,0.3]}]}"#;
        assert!(FinalRoundOdds::from_json(raw).is_err());
        let raw = r#"{"version":"t","games_sampled":1,"entries":[
            {"second_vs_first":"tied","third_vs_second":"tied","probs":[1.2,-0.1,-0.1]}]}"#;
        assert!(FinalRoundOdds::from_json(raw).is_err());
    }

    #[test]
    fn duplicate_pairs_are_rejected_at_load() {
        let raw = r#"{"version":"t","games_sampled":1,"entries":[
            {"second_vs_first":"tied","third_vs_second":"tied","probs":[0.34,0.33,0.33]},
            {"second_vs_first":"tied","third_vs_second":"tied","probs":[0.4,0.3,0.3]}]}"#;
        assert!(FinalRoundOdds::from_json(raw).is_err());
    }

    #[test]
    fn embedded_table_covers_every_state_pair() {
        let odds = FinalRoundOdds::embedded().unwrap();
        assert_eq!(odds.len(), 49);
        for upper in ScoreRatioState::ALL {
            for lower in ScoreRatioState::ALL {
                let probs = odds
                    .lookup(upper, lower)
                    .unwrap_or_else(|| panic!("missing pair ({upper:?}, {lower:?})"));
                let sum: f64 = probs.iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn embedded_leader_odds_strengthen_as_second_falls_behind() {
        let odds = FinalRoundOdds::embedded().unwrap();
        let p = |s| odds.lookup(s, ScoreRatioState::Locked).unwrap()[0];
        assert!(p(ScoreRatioState::Locked) > p(ScoreRatioState::Crush));
        assert!(p(ScoreRatioState::Crush) > p(ScoreRatioState::TwoThirds));
        assert!(p(ScoreRatioState::TwoThirds) > p(ScoreRatioState::FourFifths));
    }
}
