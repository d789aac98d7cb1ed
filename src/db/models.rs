use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three podium slots, in canonical column order. Every per-contestant
/// array in the crate (scores, probabilities, names) is indexed by
/// [`ContestantSlot::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestantSlot {
    ContestantOne,
    ContestantTwo,
    ReturningChampion,
}

impl ContestantSlot {
    pub const ALL: [ContestantSlot; 3] = [
        ContestantSlot::ContestantOne,
        ContestantSlot::ContestantTwo,
        ContestantSlot::ReturningChampion,
    ];

    pub fn index(self) -> usize {
        match self {
            ContestantSlot::ContestantOne => 0,
            ContestantSlot::ContestantTwo => 1,
            ContestantSlot::ReturningChampion => 2,
        }
    }

    /// Stable code used in the archive's winner column and JSON dumps.
    pub fn code(self) -> &'static str {
        match self {
            ContestantSlot::ContestantOne => "contestant_one",
            ContestantSlot::ContestantTwo => "contestant_two",
            ContestantSlot::ReturningChampion => "returning_champion",
        }
    }

    pub fn from_code(code: &str) -> Option<ContestantSlot> {
        ContestantSlot::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// Round codes as stored in the archive. `Single` and `Double` are the two
/// scored rounds; `Final` is the single closing clue, archived for display
/// but excluded from score replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    Single,
    Double,
    Final,
}

impl Round {
    pub fn from_code(code: &str) -> Option<Round> {
        match code {
            "single" => Some(Round::Single),
            "double" => Some(Round::Double),
            "final" => Some(Round::Final),
            _ => None,
        }
    }
}

/// One archived episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub show_number: u32,
    pub air_date: NaiveDate,
    pub contestant_one: String,
    pub contestant_two: String,
    pub returning_champion: String,
    /// Scores after the final clue, in slot order.
    pub final_scores: [i64; 3],
    /// Slot code of the recorded winner.
    pub winner: String,
}

impl GameRecord {
    pub fn names(&self) -> [&str; 3] {
        [
            &self.contestant_one,
            &self.contestant_two,
            &self.returning_champion,
        ]
    }
}

/// One archived clue, raw archive shape. Responder fields hold
/// comma-separated first names exactly as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClueRecord {
    pub show_number: u32,
    pub round: String,
    pub order_number: u32,
    pub category: String,
    pub clue: String,
    pub correct_response: String,
    /// Printed board value.
    pub face_value: i64,
    /// Amount actually risked on a hidden-wager clue (NULL otherwise).
    pub wager: Option<i64>,
    pub is_wager_clue: bool,
    pub correct_contestants: Option<String>,
    pub incorrect_contestants: Option<String>,
}

/// Fully materialized game handed to the probability engine: the episode
/// record plus its scored-round clues in board order.
#[derive(Debug, Clone)]
pub struct ArchivedGame {
    pub record: GameRecord,
    pub scored_clues: Vec<ClueRecord>,
}

/// Episode record plus every clue of every round, for the board view.
#[derive(Debug, Clone, Serialize)]
pub struct GameDetail {
    pub record: GameRecord,
    pub clues: Vec<ClueRecord>,
}

/// Row for the dashboard's game selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub show_number: u32,
    pub air_date: NaiveDate,
    pub contestants: [String; 3],
    pub winner_name: String,
}

/// Searchable clue columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTarget {
    Clue,
    Category,
    CorrectResponse,
}

impl SearchTarget {
    /// Column name in the clues table. Search SQL is built from this fixed
    /// set, never from request text.
    pub fn column(self) -> &'static str {
        match self {
            SearchTarget::Clue => "clue",
            SearchTarget::Category => "category",
            SearchTarget::CorrectResponse => "correct_response",
        }
    }
}

/// One clue-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClueSearchHit {
    pub show_number: u32,
    pub air_date: NaiveDate,
    pub round: String,
    pub category: String,
    pub clue: String,
    pub correct_response: String,
    pub face_value: i64,
}

/// Aggregate line for a winning contestant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionRow {
    pub name: String,
    pub wins: i64,
    pub total_winnings: i64,
    pub first_win: NaiveDate,
    pub last_win: NaiveDate,
}

// ── Archive dump (JSON import) ───────────────────────────────────────────────

/// One game in a JSON archive dump.
#[derive(Debug, Clone, Deserialize)]
pub struct GameImport {
    pub show_number: u32,
    pub air_date: NaiveDate,
    pub contestant_one: String,
    pub contestant_two: String,
    pub returning_champion: String,
    pub final_scores: [i64; 3],
    pub winner: String,
    pub clues: Vec<ClueImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClueImport {
    pub round: String,
    pub order_number: u32,
    pub category: String,
    pub clue: String,
    pub correct_response: String,
    pub face_value: i64,
    #[serde(default)]
    pub wager: Option<i64>,
    #[serde(default)]
    pub is_wager_clue: bool,
    #[serde(default)]
    pub correct_contestants: Option<String>,
    #[serde(default)]
    pub incorrect_contestants: Option<String>,
}
