//! Clue-by-clue game state replay.
//!
//! The archive stores what happened on every clue of a game; this module turns
//! that list back into the sequence of board states a viewer would have seen.
//! The replay is a fold: each [`GameState`] is a fresh immutable snapshot
//! derived from the previous one, never a mutated accumulator, so the full
//! trace can be handed downstream without copying games out of order.
//!
//! Two amounts matter per clue and they are **not** the same thing:
//! - the **face value** printed on the board, which is what drains the
//!   remaining board value, and
//! - the **stake value** actually applied to the responder's score, which on a
//!   hidden-wager clue is whatever the contestant risked.
//!
//! Responders are recorded in the archive by first name. [`Roster`] is the
//! validated first-name → podium-slot table built once per show; any token it
//! cannot resolve is a hard [`EngineError::DataIntegrity`], never a silent
//! skip, because a miscounted score poisons every state after it.

use serde::{Deserialize, Serialize};

use crate::db::models::{ClueRecord, ContestantSlot, Round};

use super::error::EngineError;

// ── Slot sets ────────────────────────────────────────────────────────────────

/// Small set of podium slots (the correct / incorrect responders of one clue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotSet(u8);

impl SlotSet {
    pub const EMPTY: SlotSet = SlotSet(0);

    pub fn insert(&mut self, slot: ContestantSlot) {
        self.0 |= 1 << slot.index();
    }

    pub fn contains(self, slot: ContestantSlot) -> bool {
        self.0 & (1 << slot.index()) != 0
    }

    pub fn intersects(self, other: SlotSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

// ── Roster ───────────────────────────────────────────────────────────────────

/// Validated lookup from recorded responder names to podium slots.
///
/// Built once per show from the three display names. The archive identifies
/// responders by first name, so the lookup key is the lowercased first word of
/// each display name. Construction rejects empty names and colliding first
/// names up front; a collision would make every responder field of the show
/// ambiguous.
#[derive(Debug, Clone)]
pub struct Roster {
    display_names: [String; 3],
    first_names: [String; 3],
}

impl Roster {
    pub fn new(display_names: [&str; 3]) -> Result<Roster, EngineError> {
        let mut first_names: [String; 3] = Default::default();
        for (i, name) in display_names.iter().enumerate() {
            let first = name.split_whitespace().next().ok_or_else(|| {
                EngineError::DataIntegrity(format!(
                    "{} has an empty display name",
                    ContestantSlot::ALL[i].code()
                ))
            })?;
            first_names[i] = first.to_lowercase();
        }
        for i in 0..3 {
            for j in (i + 1)..3 {
                if first_names[i] == first_names[j] {
                    return Err(EngineError::DataIntegrity(format!(
                        "ambiguous roster: '{}' and '{}' share the first name '{}'",
                        display_names[i], display_names[j], first_names[i]
                    )));
                }
            }
        }
        Ok(Roster {
            display_names: display_names.map(str::to_owned),
            first_names,
        })
    }

    pub fn display_names(&self) -> &[String; 3] {
        &self.display_names
    }

    /// Resolve one responder token to its slot.
    pub fn resolve(&self, token: &str) -> Result<ContestantSlot, EngineError> {
        let key = token
            .split_whitespace()
            .next()
            .ok_or_else(|| EngineError::DataIntegrity("empty responder token".into()))?
            .to_lowercase();
        self.first_names
            .iter()
            .position(|name| *name == key)
            .map(|i| ContestantSlot::ALL[i])
            .ok_or_else(|| {
                EngineError::DataIntegrity(format!(
                    "responder '{}' does not match any contestant of this show",
                    token.trim()
                ))
            })
    }

    /// Parse a raw responder field (comma-separated first names, possibly
    /// empty) into a slot set.
    pub fn parse_set(&self, raw: &str) -> Result<SlotSet, EngineError> {
        let mut set = SlotSet::EMPTY;
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            set.insert(self.resolve(token)?);
        }
        Ok(set)
    }
}

// ── Events ───────────────────────────────────────────────────────────────────

/// One resolved clue, typed and roster-checked, ready for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueEvent {
    pub round: Round,
    pub order_number: u32,
    /// Printed board value; drains the remaining board value.
    pub face_value: i64,
    /// Amount applied to responder scores. Differs from the face value only
    /// on hidden-wager clues.
    pub stake_value: i64,
    pub is_wager_clue: bool,
    pub correct: SlotSet,
    pub incorrect: SlotSet,
}

impl ClueEvent {
    /// Interpret a raw archive row against the show's roster.
    pub fn from_record(rec: &ClueRecord, roster: &Roster) -> Result<ClueEvent, EngineError> {
        let round = Round::from_code(&rec.round).ok_or_else(|| {
            EngineError::DataIntegrity(format!(
                "show {}: unknown round code '{}'",
                rec.show_number, rec.round
            ))
        })?;
        if round == Round::Final {
            return Err(EngineError::DataIntegrity(format!(
                "show {}: final-round clue cannot enter the scored replay",
                rec.show_number
            )));
        }
        if rec.face_value <= 0 {
            return Err(EngineError::DataIntegrity(format!(
                "show {} {} clue {}: non-positive face value {}",
                rec.show_number, rec.round, rec.order_number, rec.face_value
            )));
        }
        if let Some(wager) = rec.wager {
            if !rec.is_wager_clue {
                return Err(EngineError::DataIntegrity(format!(
                    "show {} {} clue {}: wager recorded on a regular clue",
                    rec.show_number, rec.round, rec.order_number
                )));
            }
            if wager < 0 {
                return Err(EngineError::DataIntegrity(format!(
                    "show {} {} clue {}: negative wager {}",
                    rec.show_number, rec.round, rec.order_number, wager
                )));
            }
        }
        let correct = roster.parse_set(rec.correct_contestants.as_deref().unwrap_or(""))?;
        let incorrect = roster.parse_set(rec.incorrect_contestants.as_deref().unwrap_or(""))?;
        if correct.intersects(incorrect) {
            return Err(EngineError::DataIntegrity(format!(
                "show {} {} clue {}: a contestant is recorded as both correct and incorrect",
                rec.show_number, rec.round, rec.order_number
            )));
        }
        Ok(ClueEvent {
            round,
            order_number: rec.order_number,
            face_value: rec.face_value,
            // A wager clue with no recorded amount scores at face value,
            // which is always a legal stake.
            stake_value: rec.wager.unwrap_or(rec.face_value),
            is_wager_clue: rec.is_wager_clue,
            correct,
            incorrect,
        })
    }
}

/// Interpret a whole scored-round clue list against the roster, preserving
/// order.
pub fn parse_events(records: &[ClueRecord], roster: &Roster) -> Result<Vec<ClueEvent>, EngineError> {
    records
        .iter()
        .map(|rec| ClueEvent::from_record(rec, roster))
        .collect()
}

// ── Board rules ──────────────────────────────────────────────────────────────

/// Fixed structure of a game's two scored rounds.
///
/// Defaults match the standard board: 6 categories × (200..1000) in the first
/// round (18 000), doubled values in the second (36 000), and 1 + 2 hidden
/// wager clues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRules {
    pub board_value_total: i64,
    pub wager_clues_total: u32,
}

impl BoardRules {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.board_value_total <= 0 {
            return Err(EngineError::Configuration(format!(
                "board_value_total must be positive, got {}",
                self.board_value_total
            )));
        }
        if !(1..=8).contains(&self.wager_clues_total) {
            return Err(EngineError::Configuration(format!(
                "wager_clues_total must be between 1 and 8, got {}",
                self.wager_clues_total
            )));
        }
        Ok(())
    }
}

impl Default for BoardRules {
    fn default() -> Self {
        BoardRules {
            board_value_total: 54_000,
            wager_clues_total: 3,
        }
    }
}

// ── Game state ───────────────────────────────────────────────────────────────

/// Immutable snapshot of a game after `event_number` clues have resolved.
///
/// `event_number` 0 is the implicit state before any clue: all scores zero,
/// full board value, full wager count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub show_number: u32,
    pub event_number: u32,
    pub wagers_remaining: u32,
    pub board_value_remaining: i64,
    /// Running scores in canonical slot order.
    pub scores: [i64; 3],
}

impl GameState {
    fn initial(show_number: u32, rules: &BoardRules) -> GameState {
        GameState {
            show_number,
            event_number: 0,
            wagers_remaining: rules.wager_clues_total,
            board_value_remaining: rules.board_value_total,
            scores: [0; 3],
        }
    }
}

/// Derive the state after one more clue from the previous state.
fn step(prev: &GameState, event: &ClueEvent) -> Result<GameState, EngineError> {
    if event.face_value > prev.board_value_remaining {
        return Err(EngineError::DataIntegrity(format!(
            "show {} event {}: face value {} exceeds remaining board value {}",
            prev.show_number,
            prev.event_number + 1,
            event.face_value,
            prev.board_value_remaining
        )));
    }
    let wagers_remaining = if event.is_wager_clue {
        prev.wagers_remaining.checked_sub(1).ok_or_else(|| {
            EngineError::DataIntegrity(format!(
                "show {} event {}: more wager clues than the board allows",
                prev.show_number,
                prev.event_number + 1
            ))
        })?
    } else {
        prev.wagers_remaining
    };
    let mut scores = prev.scores;
    for slot in ContestantSlot::ALL {
        if event.correct.contains(slot) {
            scores[slot.index()] += event.stake_value;
        } else if event.incorrect.contains(slot) {
            scores[slot.index()] -= event.stake_value;
        }
    }
    Ok(GameState {
        show_number: prev.show_number,
        event_number: prev.event_number + 1,
        wagers_remaining,
        board_value_remaining: prev.board_value_remaining - event.face_value,
        scores,
    })
}

/// Replay a show's scored-round events into the full state trace.
///
/// The trace always starts with the initial state, so it holds
/// `events.len() + 1` entries. Board value and wager count decrease
/// monotonically along it and can never go negative; events that would break
/// either bound fail with [`EngineError::DataIntegrity`].
pub fn replay(
    show_number: u32,
    events: &[ClueEvent],
    rules: &BoardRules,
) -> Result<Vec<GameState>, EngineError> {
    rules.validate()?;
    let mut state = GameState::initial(show_number, rules);
    let mut trace = Vec::with_capacity(events.len() + 1);
    trace.push(state.clone());
    for event in events {
        state = step(&state, event)?;
        trace.push(state.clone());
    }
    Ok(trace)
}

// ── Tests ────────────────────────────────────────────────────────────────────
