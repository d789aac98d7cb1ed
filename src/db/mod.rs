use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub mod models;
use models::*;

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the archive database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Games ─────────────────────────────────────────────────────────────────

    /// List archived games for the dashboard selector, newest first
    pub fn list_games(&self, limit: i64) -> Result<Vec<GameSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT show_number, air_date, contestant_one, contestant_two,
                    returning_champion, winner
             FROM games ORDER BY show_number DESC LIMIT ?1",
        )?;
        let games = stmt
            .query_map(params![limit], map_game_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }

    /// Load one game with its scored-round clues in board order, ready for
    /// the probability engine. Final-round clues are excluded here; the
    /// engine sees their effect through the recorded final scores.
    pub fn load_game(&self, show_number: u32) -> Result<Option<ArchivedGame>> {
        let conn = self.conn.lock().unwrap();
        let record = match self.query_game_record(&conn, show_number)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let mut stmt = conn.prepare(
            "SELECT show_number, round, order_number, category, clue,
                    correct_response, face_value, wager, is_wager_clue,
                    correct_contestants, incorrect_contestants
             FROM clues
             WHERE show_number = ?1 AND round IN ('single', 'double')
             ORDER BY CASE round WHEN 'single' THEN 0 ELSE 1 END, order_number",
        )?;
        let scored_clues = stmt
            .query_map(params![show_number], map_clue_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(ArchivedGame {
            record,
            scored_clues,
        }))
    }

    /// Load one game with every clue of every round, for the board view
    pub fn game_board(&self, show_number: u32) -> Result<Option<GameDetail>> {
        let conn = self.conn.lock().unwrap();
        let record = match self.query_game_record(&conn, show_number)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let mut stmt = conn.prepare(
            "SELECT show_number, round, order_number, category, clue,
                    correct_response, face_value, wager, is_wager_clue,
                    correct_contestants, incorrect_contestants
             FROM clues WHERE show_number = ?1
             ORDER BY CASE round WHEN 'single' THEN 0 WHEN 'double' THEN 1 ELSE 2 END,
                      order_number",
        )?;
        let clues = stmt
            .query_map(params![show_number], map_clue_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(GameDetail { record, clues }))
    }

    fn query_game_record(
        &self,
        conn: &Connection,
        show_number: u32,
    ) -> Result<Option<GameRecord>> {
        let mut stmt = conn.prepare(
            "SELECT show_number, air_date, contestant_one, contestant_two,
                    returning_champion, contestant_one_final, contestant_two_final,
                    returning_champion_final, winner
             FROM games WHERE show_number = ?1",
        )?;
        let mut rows = stmt.query_map(params![show_number], map_game_record)?;
        Ok(rows.next().transpose()?)
    }

    // ── Clue search ───────────────────────────────────────────────────────────

    /// Search archived clues by text, category or correct response
    pub fn search_clues(
        &self,
        target: SearchTarget,
        term: &str,
        exact: bool,
        limit: i64,
    ) -> Result<Vec<ClueSearchHit>> {
        let pattern = if exact {
            term.to_owned()
        } else {
            format!("%{}%", term)
        };
        let sql = format!(
            "SELECT c.show_number, g.air_date, c.round, c.category, c.clue,
                    c.correct_response, c.face_value
             FROM clues c JOIN games g ON g.show_number = c.show_number
             WHERE c.{} LIKE ?1
             ORDER BY g.air_date DESC, c.show_number DESC LIMIT ?2",
            target.column()
        );
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params![pattern, limit], map_search_hit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }

    // ── Champions ─────────────────────────────────────────────────────────────

    /// Aggregate wins and winnings per winning contestant
    pub fn champions(&self, limit: i64) -> Result<Vec<ChampionRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CASE winner
                        WHEN 'contestant_one' THEN contestant_one
                        WHEN 'contestant_two' THEN contestant_two
                        ELSE returning_champion
                    END AS name,
                    COUNT(*) AS wins,
                    SUM(CASE winner
                        WHEN 'contestant_one' THEN contestant_one_final
                        WHEN 'contestant_two' THEN contestant_two_final
                        ELSE returning_champion_final
                    END) AS total_winnings,
                    MIN(air_date), MAX(air_date)
             FROM games
             GROUP BY name
             ORDER BY wins DESC, total_winnings DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(ChampionRow {
                    name: row.get(0)?,
                    wins: row.get(1)?,
                    total_winnings: row.get(2)?,
                    first_win: row.get(3)?,
                    last_win: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    /// Get aggregate archive stats for the dashboard header
    pub fn stats(&self) -> Result<ArchiveStats> {
        let conn = self.conn.lock().unwrap();
        let games: i64 = conn
            .query_row("SELECT COUNT(*) FROM games", [], |r| r.get(0))
            .unwrap_or(0);
        let clues: i64 = conn
            .query_row("SELECT COUNT(*) FROM clues", [], |r| r.get(0))
            .unwrap_or(0);
        let (first_air_date, last_air_date) = conn
            .query_row(
                "SELECT MIN(air_date), MAX(air_date) FROM games",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap_or((None, None));
        Ok(ArchiveStats {
            games,
            clues,
            first_air_date,
            last_air_date,
        })
    }

    // ── Bulk import ───────────────────────────────────────────────────────────

    /// Load a JSON archive dump (array of games with nested clues) into the
    /// archive, replacing any games already present with the same show number
    pub fn import_archive(&self, path: &str) -> Result<(usize, usize)> {
        let raw = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("cannot read archive dump {path}"))?;
        let games: Vec<GameImport> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed archive dump {path}"))?;
        self.import_games(&games)
    }

    /// Insert a batch of games and their clues inside one transaction
    pub fn import_games(&self, games: &[GameImport]) -> Result<(usize, usize)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut clue_count = 0usize;
        for game in games {
            tx.execute(
                "INSERT INTO games (show_number, air_date, contestant_one,
                                    contestant_two, returning_champion,
                                    contestant_one_final, contestant_two_final,
                                    returning_champion_final, winner)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
                 ON CONFLICT(show_number) DO UPDATE SET
                    air_date=excluded.air_date,
                    contestant_one=excluded.contestant_one,
                    contestant_two=excluded.contestant_two,
                    returning_champion=excluded.returning_champion,
                    contestant_one_final=excluded.contestant_one_final,
                    contestant_two_final=excluded.contestant_two_final,
                    returning_champion_final=excluded.returning_champion_final,
                    winner=excluded.winner",
                params![
                    game.show_number,
                    game.air_date,
                    game.contestant_one,
                    game.contestant_two,
                    game.returning_champion,
                    game.final_scores[0],
                    game.final_scores[1],
                    game.final_scores[2],
                    game.winner,
                ],
            )?;
            tx.execute(
                "DELETE FROM clues WHERE show_number = ?1",
                params![game.show_number],
            )?;
            for clue in &game.clues {
                tx.execute(
                    "INSERT INTO clues (show_number, round, order_number, category,
                                        clue, correct_response, face_value, wager,
                                        is_wager_clue, correct_contestants,
                                        incorrect_contestants)
                     VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
                    params![
                        game.show_number,
                        clue.round,
                        clue.order_number,
                        clue.category,
                        clue.clue,
                        clue.correct_response,
                        clue.face_value,
                        clue.wager,
                        clue.is_wager_clue,
                        clue.correct_contestants,
                        clue.incorrect_contestants,
                    ],
                )?;
                clue_count += 1;
            }
        }
        tx.commit()?;
        Ok((games.len(), clue_count))
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_game_record(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
    Ok(GameRecord {
        show_number: row.get(0)?,
        air_date: row.get(1)?,
        contestant_one: row.get(2)?,
        contestant_two: row.get(3)?,
        returning_champion: row.get(4)?,
        final_scores: [row.get(5)?, row.get(6)?, row.get(7)?],
        winner: row.get(8)?,
    })
}

fn map_game_summary(row: &rusqlite::Row) -> rusqlite::Result<GameSummary> {
    let contestants: [String; 3] = [row.get(2)?, row.get(3)?, row.get(4)?];
    let winner: String = row.get(5)?;
    let winner_name = ContestantSlot::from_code(&winner)
        .map(|slot| contestants[slot.index()].clone())
        .unwrap_or(winner);
    Ok(GameSummary {
        show_number: row.get(0)?,
        air_date: row.get(1)?,
        contestants,
        winner_name,
    })
}

fn map_clue_record(row: &rusqlite::Row) -> rusqlite::Result<ClueRecord> {
    Ok(ClueRecord {
        show_number: row.get(0)?,
        round: row.get(1)?,
        order_number: row.get(2)?,
        category: row.get(3)?,
        clue: row.get(4)?,
        correct_response: row.get(5)?,
        face_value: row.get(6)?,
        wager: row.get(7)?,
        is_wager_clue: row.get(8)?,
        correct_contestants: row.get(9)?,
        incorrect_contestants: row.get(10)?,
    })
}

fn map_search_hit(row: &rusqlite::Row) -> rusqlite::Result<ClueSearchHit> {
    Ok(ClueSearchHit {
        show_number: row.get(0)?,
        air_date: row.get(1)?,
        round: row.get(2)?,
        category: row.get(3)?,
        clue: row.get(4)?,
        correct_response: row.get(5)?,
        face_value: row.get(6)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    show_number              INTEGER PRIMARY KEY,
    air_date                 TEXT    NOT NULL,
    contestant_one           TEXT    NOT NULL,
    contestant_two           TEXT    NOT NULL,
    returning_champion       TEXT    NOT NULL,
    contestant_one_final     INTEGER NOT NULL,
    contestant_two_final     INTEGER NOT NULL,
    returning_champion_final INTEGER NOT NULL,
    winner                   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS clues (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    show_number           INTEGER NOT NULL,
    round                 TEXT    NOT NULL,
    order_number          INTEGER NOT NULL,
    category              TEXT    NOT NULL,
    clue                  TEXT    NOT NULL,
    correct_response      TEXT    NOT NULL,
    face_value            INTEGER NOT NULL,
    wager                 INTEGER,
    is_wager_clue         INTEGER NOT NULL DEFAULT 0,
    correct_contestants   TEXT,
    incorrect_contestants TEXT,
    FOREIGN KEY (show_number) REFERENCES games(show_number),
    UNIQUE (show_number, round, order_number)
);

CREATE INDEX IF NOT EXISTS idx_clues_show ON clues(show_number);
CREATE INDEX IF NOT EXISTS idx_clues_category ON clues(category);
CREATE INDEX IF NOT EXISTS idx_games_air_date ON games(air_date);
"#;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArchiveStats {
    pub games: i64,
    pub clues: i64,
    pub first_air_date: Option<NaiveDate>,
    pub last_air_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_db() -> Database {
        Database::open(":memory:").unwrap()
    }

    fn make_import(show_number: u32, champion: &str, winner: &str) -> GameImport {
        GameImport {
            show_number,
            air_date: format!("2024-03-{:02}", (show_number % 28) + 1).parse().unwrap(),
            contestant_one: "Amy Quinn".into(),
            contestant_two: "Ben OReilly".into(),
            returning_champion: champion.into(),
            final_scores: [12_000, 8000, 20_100],
            winner: winner.into(),
            clues: vec![
                ClueImport {
                    round: "single".into(),
                    order_number: 2,
                    category: "WORLD CAPITALS".into(),
                    clue: "This city on the Baltic hosted the 1952 games".into(),
                    correct_response: "What is Helsinki?".into(),
                    face_value: 400,
                    wager: None,
                    is_wager_clue: false,
                    correct_contestants: Some("Amy".into()),
                    incorrect_contestants: None,
                },
                ClueImport {
                    round: "double".into(),
                    order_number: 1,
                    category: "OPERA".into(),
                    clue: "Puccini left this opera unfinished at his death".into(),
                    correct_response: "What is Turandot?".into(),
                    face_value: 800,
                    wager: Some(2500),
                    is_wager_clue: true,
                    correct_contestants: Some("Cara".into()),
                    incorrect_contestants: None,
                },
                ClueImport {
                    round: "single".into(),
                    order_number: 1,
                    category: "WORLD CAPITALS".into(),
                    clue: "Quito sits nearly on this line".into(),
                    correct_response: "What is the equator?".into(),
                    face_value: 200,
                    wager: None,
                    is_wager_clue: false,
                    correct_contestants: Some("Ben".into()),
                    incorrect_contestants: Some("Amy".into()),
                },
                ClueImport {
                    round: "final".into(),
                    order_number: 1,
                    category: "STATE NICKNAMES".into(),
                    clue: "The Gem State".into(),
                    correct_response: "What is Idaho?".into(),
                    face_value: 0,
                    wager: None,
                    is_wager_clue: false,
                    correct_contestants: Some("Cara".into()),
                    incorrect_contestants: None,
                },
            ],
        }
    }

    #[test]
    fn import_and_stats_round_trip() {
        let db = make_db();
        let (games, clues) = db
            .import_games(&[
                make_import(4512, "Cara Diaz", "returning_champion"),
                make_import(4513, "Cara Diaz", "returning_champion"),
            ])
            .unwrap();
        assert_eq!(games, 2);
        assert_eq!(clues, 8);
        let stats = db.stats().unwrap();
        assert_eq!(stats.games, 2);
        assert_eq!(stats.clues, 8);
        assert!(stats.first_air_date.is_some());
        assert!(stats.first_air_date <= stats.last_air_date);
    }

    #[test]
    fn reimporting_a_show_replaces_it() {
        let db = make_db();
        db.import_games(&[make_import(4512, "Cara Diaz", "returning_champion")])
            .unwrap();
        let mut updated = make_import(4512, "Cara M. Diaz", "contestant_one");
        updated.clues.truncate(2);
        db.import_games(&[updated]).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.games, 1);
        assert_eq!(stats.clues, 2);
        let game = db.load_game(4512).unwrap().unwrap();
        assert_eq!(game.record.returning_champion, "Cara M. Diaz");
        assert_eq!(game.record.winner, "contestant_one");
    }

    #[test]
    fn load_game_orders_scored_clues_and_skips_the_final_round() {
        let db = make_db();
        db.import_games(&[make_import(4512, "Cara Diaz", "returning_champion")])
            .unwrap();
        let game = db.load_game(4512).unwrap().unwrap();
        assert_eq!(game.record.final_scores, [12_000, 8000, 20_100]);
        let order: Vec<(String, u32)> = game
            .scored_clues
            .iter()
            .map(|c| (c.round.clone(), c.order_number))
            .collect();
        assert_eq!(
            order,
            vec![
                ("single".to_string(), 1),
                ("single".to_string(), 2),
                ("double".to_string(), 1),
            ]
        );
        assert_eq!(game.scored_clues[2].wager, Some(2500));
    }

    #[test]
    fn missing_show_loads_as_none() {
        let db = make_db();
        assert!(db.load_game(999).unwrap().is_none());
        assert!(db.game_board(999).unwrap().is_none());
    }

    #[test]
    fn game_board_includes_every_round() {
        let db = make_db();
        db.import_games(&[make_import(4512, "Cara Diaz", "returning_champion")])
            .unwrap();
        let board = db.game_board(4512).unwrap().unwrap();
        assert_eq!(board.clues.len(), 4);
        assert_eq!(board.clues.last().unwrap().round, "final");
    }

    #[test]
    fn list_games_is_newest_first_with_winner_name() {
        let db = make_db();
        db.import_games(&[
            make_import(4512, "Cara Diaz", "returning_champion"),
            make_import(4513, "Cara Diaz", "contestant_one"),
        ])
        .unwrap();
        let games = db.list_games(10).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].show_number, 4513);
        assert_eq!(games[0].winner_name, "Amy Quinn");
        assert_eq!(games[1].winner_name, "Cara Diaz");
    }

    #[test]
    fn clue_search_contains_and_exact() {
        let db = make_db();
        db.import_games(&[make_import(4512, "Cara Diaz", "returning_champion")])
            .unwrap();
        let hits = db
            .search_clues(SearchTarget::Category, "capitals", false, 50)
            .unwrap();
        assert_eq!(hits.len(), 2);
        let hits = db
            .search_clues(SearchTarget::CorrectResponse, "what is turandot?", true, 50)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].face_value, 800);
        let hits = db
            .search_clues(SearchTarget::Clue, "turandot", false, 50)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn champions_aggregate_wins_and_winnings() {
        let db = make_db();
        db.import_games(&[
            make_import(4512, "Cara Diaz", "returning_champion"),
            make_import(4513, "Cara Diaz", "returning_champion"),
            make_import(4514, "Cara Diaz", "contestant_two"),
        ])
        .unwrap();
        let rows = db.champions(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Cara Diaz");
        assert_eq!(rows[0].wins, 2);
        assert_eq!(rows[0].total_winnings, 40_200);
        assert_eq!(rows[1].name, "Ben OReilly");
        assert_eq!(rows[1].total_winnings, 8000);
        assert!(rows[0].first_win <= rows[0].last_win);
    }
}
