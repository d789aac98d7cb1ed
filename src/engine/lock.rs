//! Runaway ("locked") game detection.
//!
//! A game is locked when no remaining play can take 1st place away from the
//! current leader. The bound is deliberately worst-case: assume the trailing
//! contestant answers every remaining clue correctly, then doubles their
//! entire total on each remaining hidden-wager clue and once more on the
//! final clue. If even that ceiling stays below the leader's score, the model
//! has nothing left to estimate for the win.

/// Decide whether the leader's 1st place is mathematically out of reach.
///
/// # Arguments
/// * `leader_score` – Highest current score.
/// * `second_score` – Second-highest current score.
/// * `remaining_value` – Total face value still on the board.
/// * `remaining_wagers` – Hidden-wager clues still unrevealed.
///
/// The leader must strictly lead; a tie is never locked, whatever remains on
/// the board.
pub fn is_locked(
    leader_score: i64,
    second_score: i64,
    remaining_value: i64,
    remaining_wagers: u32,
) -> bool {
    if leader_score <= second_score {
        return false;
    }
    // One doubling per remaining wager clue, plus one on the final clue.
    let ceiling = (second_score + remaining_value)
        .saturating_mul(2i64.saturating_pow(1 + remaining_wagers));
    leader_score > ceiling
}

/// One-hot outcome vector for a locked state, in slot order.
///
/// Every contestant tied for the maximum gets 1.0. A multi-way maximum would
/// make the vector sum exceed 1, but it cannot arise from a genuine lock
/// (`is_locked` requires a strict leader); callers that pair the two assert
/// as much.
pub fn locked_outcome(scores: &[i64; 3]) -> [f64; 3] {
    let max = scores[0].max(scores[1]).max(scores[2]);
    let mut out = [0.0; 3];
    for (i, score) in scores.iter().enumerate() {
        if *score == max {
            out[i] = 1.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_leader_is_locked() {
        // Nothing on the board: second place can gain at most 0.
        assert!(is_locked(1000, 0, 0, 0));
    }

    #[test]
    fn narrow_lead_with_empty_board_is_not_locked() {
        // 999 doubles to 1998 on the final clue.
        assert!(!is_locked(1000, 999, 0, 0));
    }

    #[test]
    fn ties_are_never_locked() {
        for s in [-500, 0, 1, 12_000] {
            for v in [0, 400, 10_000] {
                for d in 0..4 {
                    assert!(!is_locked(s, s, v, d), "tie at {s} with v={v} d={d}");
                }
            }
        }
    }

    #[test]
    fn eighteen_thousand_versus_six_thousand_is_locked() {
        assert!(is_locked(18_000, 6_000, 0, 0));
    }

    #[test]
    fn bound_is_strict() {
        // Ceiling is exactly (1000 + 0) * 2 = 2000.
        assert!(!is_locked(2000, 1000, 0, 0));
        assert!(is_locked(2001, 1000, 0, 0));
    }

    #[test]
    fn each_remaining_wager_doubles_the_ceiling() {
        // (2000 + 400) = 2400 → ×2 = 4800, ×4 = 9600, ×8 = 19200.
        assert!(is_locked(10_000, 2000, 400, 0));
        assert!(is_locked(10_000, 2000, 400, 1));
        assert!(!is_locked(10_000, 2000, 400, 2));
    }

    #[test]
    fn negative_second_place_can_be_locked_out() {
        // Ceiling (-800 + 400) * 2 = -800; any positive leader clears it.
        assert!(is_locked(200, -800, 400, 0));
    }

    #[test]
    fn absurd_wager_counts_do_not_overflow() {
        assert!(!is_locked(50_000, 1000, 0, 200));
    }

    #[test]
    fn locked_outcome_is_one_hot_on_the_leader() {
        assert_eq!(locked_outcome(&[18_000, 6_000, 2_400]), [1.0, 0.0, 0.0]);
        assert_eq!(locked_outcome(&[1200, 6400, 900]), [0.0, 1.0, 0.0]);
        assert_eq!(locked_outcome(&[-400, -100, 0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn locked_outcome_marks_every_max_on_a_tie() {
        // Documented edge: unreachable from is_locked, but the construction
        // flags all tied maxima rather than picking one arbitrarily.
        let out = locked_outcome(&[5000, 5000, 100]);
        assert_eq!(out, [1.0, 1.0, 0.0]);
        assert_eq!(out.iter().sum::<f64>(), 2.0);
    }
}
