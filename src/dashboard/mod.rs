use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::db::models::SearchTarget;
use crate::db::Database;
use crate::engine::{EngineError, ProbabilityEngine};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<ProbabilityEngine>,
    /// Cap applied to clue-search responses.
    pub search_limit: i64,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/games", get(games_handler))
        .route("/api/games/:show", get(game_board_handler))
        .route("/api/games/:show/win-probability", get(win_probability_handler))
        .route("/api/clues/search", get(clue_search_handler))
        .route("/api/champions", get(champions_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serve the dashboard HTML page.
async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// GET /api/stats
async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.db.stats().map(Json).map_err(internal_error)
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

/// GET /api/games?limit=100
async fn games_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(200).clamp(1, 2000);
    state.db.list_games(limit).map(Json).map_err(internal_error)
}

/// GET /api/games/:show (full board pivot for one show)
async fn game_board_handler(
    State(state): State<Arc<AppState>>,
    Path(show): Path<u32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state
        .db
        .game_board(show)
        .map_err(internal_error)?
        .ok_or_else(|| engine_error_response(&EngineError::ShowNotFound(show)))?;
    Ok(Json(board))
}

/// GET /api/games/:show/win-probability (the merged per-clue timeline)
async fn win_probability_handler(
    State(state): State<Arc<AppState>>,
    Path(show): Path<u32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let game = state
        .db
        .load_game(show)
        .map_err(internal_error)?
        .ok_or_else(|| engine_error_response(&EngineError::ShowNotFound(show)))?;
    match state.engine.estimate(&game) {
        Ok(timeline) => {
            debug!(
                "built win-probability timeline for show {} ({} rows)",
                show,
                timeline.rows.len()
            );
            Ok(Json(timeline))
        }
        Err(err) => {
            if matches!(err, EngineError::DataIntegrity(_)) {
                warn!("show {} failed integrity checks: {}", show, err);
            }
            Err(engine_error_response(&err))
        }
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    target: Option<SearchTarget>,
    term: String,
    #[serde(default)]
    exact: bool,
}

/// GET /api/clues/search?target=category&term=opera&exact=false
async fn clue_search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if query.term.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "search term is empty".into()));
    }
    let target = query.target.unwrap_or(SearchTarget::Clue);
    state
        .db
        .search_clues(target, query.term.trim(), query.exact, state.search_limit)
        .map(Json)
        .map_err(internal_error)
}

/// GET /api/champions?limit=25
async fn champions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(25).clamp(1, 500);
    state.db.champions(limit).map(Json).map_err(internal_error)
}

/// Map the engine taxonomy onto HTTP statuses. Everything structural is a
/// 500; a missing show is the caller's 404; a broken model asset is a 503.
fn engine_error_response(err: &EngineError) -> (StatusCode, String) {
    let status = match err {
        EngineError::ShowNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::DataIntegrity(_) | EngineError::Configuration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Game Show Archive Dashboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --amber: #ffb020;
    --pink: #ff4f9a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .stats-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }
  .stat-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; }
  .stat-card .label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; margin-bottom: .4rem; }
  .stat-card .value { font-size: 1.7rem; font-weight: 700; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; justify-content: space-between; align-items: center; gap: 1rem; flex-wrap: wrap; }
  .panel-body { padding: 1rem 1.2rem; }
  select, input[type=text] { background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: .4rem .6rem; font-size: .88rem; }
  button { background: var(--accent); color: #fff; border: none; border-radius: 6px; padding: .45rem .9rem; cursor: pointer; font-size: .85rem; }
  button:hover { opacity: .88; }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .legend { display: flex; gap: 1.2rem; font-size: .82rem; color: var(--muted); flex-wrap: wrap; }
  .legend .swatch { display: inline-block; width: 10px; height: 10px; border-radius: 2px; margin-right: .35rem; }
  .chart-box { padding: 1rem; position: relative; }
  canvas { width: 100% !important; }
  .board { display: grid; gap: 4px; padding: 1rem; }
  .board .cat { font-size: .7rem; text-transform: uppercase; color: var(--muted); text-align: center; padding: .4rem .2rem; background: #151826; border-radius: 4px; }
  .board .cell { text-align: center; padding: .55rem 0; background: #11203f; color: var(--amber); font-weight: 700; border-radius: 4px; cursor: pointer; }
  .board .cell:hover { background: #1b2f56; }
  .board .cell.empty { background: #151826; color: var(--muted); cursor: default; }
  .board .cell.wager { outline: 1px solid var(--pink); }
  .clue-detail { margin: 0 1rem 1rem; padding: .9rem 1.1rem; background: #151826; border: 1px solid var(--border); border-radius: 8px; font-size: .9rem; display: none; }
  .clue-detail .resp { color: var(--green); margin-top: .4rem; }
  .clue-detail .who { color: var(--muted); margin-top: .4rem; font-size: .8rem; }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  .two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  @media (max-width: 900px) { .two-col { grid-template-columns: 1fr; } }
  .hint { color: var(--muted); font-size: .78rem; }
</style>
</head>
<body>
<header>
  <h1>🎓 Game Show Archive</h1>
  <span class="hint" id="archive-range"></span>
  <span style="margin-left:auto;color:var(--muted);font-size:.8rem;" id="last-updated"></span>
</header>

<main>
  <!-- Stats row -->
  <div class="stats-grid">
    <div class="stat-card"><div class="label">Games Archived</div><div class="value" id="s-games">–</div></div>
    <div class="stat-card"><div class="label">Clues Archived</div><div class="value" id="s-clues">–</div></div>
    <div class="stat-card"><div class="label">First Air Date</div><div class="value" id="s-first">–</div></div>
    <div class="stat-card"><div class="label">Latest Air Date</div><div class="value" id="s-last">–</div></div>
  </div>

  <!-- Win probability -->
  <div class="panel">
    <div class="panel-header">
      <span>Win Probability</span>
      <span class="legend" id="prob-legend"></span>
      <select id="game-select"></select>
    </div>
    <div class="chart-box"><canvas id="prob-chart" height="260"></canvas></div>
    <div class="panel-body hint">Dashed pink lines mark hidden-wager clues; the shaded region begins once the game is locked for the leader.</div>
  </div>

  <!-- Running scores -->
  <div class="panel">
    <div class="panel-header"><span>Running Scores</span></div>
    <div class="chart-box"><canvas id="score-chart" height="220"></canvas></div>
  </div>

  <!-- Game board -->
  <div class="panel">
    <div class="panel-header"><span id="board-title">Game Board</span></div>
    <div id="board-container"><div class="empty">Select a game above</div></div>
    <div class="clue-detail" id="clue-detail"></div>
  </div>

  <div class="two-col">
    <!-- Clue search -->
    <div class="panel">
      <div class="panel-header">
        <span>Clue Search</span>
        <span style="display:flex;gap:.5rem;align-items:center;">
          <select id="search-target">
            <option value="clue">Clue</option>
            <option value="category">Category</option>
            <option value="correct_response">Correct Response</option>
          </select>
          <input type="text" id="search-term" placeholder="search term…">
          <label class="hint"><input type="checkbox" id="search-exact"> exact</label>
          <button onclick="runSearch()">Search</button>
        </span>
      </div>
      <table>
        <thead><tr><th>Air Date</th><th>Round</th><th>Value</th><th>Category</th><th>Clue</th><th>Response</th></tr></thead>
        <tbody id="search-tbody"><tr><td colspan="6" class="empty">No search yet</td></tr></tbody>
      </table>
    </div>

    <!-- Champions -->
    <div class="panel">
      <div class="panel-header"><span>Champions</span></div>
      <table>
        <thead><tr><th>Contestant</th><th>Wins</th><th>Winnings</th><th>First Win</th><th>Last Win</th></tr></thead>
        <tbody id="champions-tbody"><tr><td colspan="5" class="empty">Loading…</td></tr></tbody>
      </table>
    </div>
  </div>
</main>

<script>
const COLORS = ['#6c63ff', '#00c896', '#ffb020'];
const money = v => '$' + Number(v).toLocaleString('en-US');
const pct = v => (v * 100).toFixed(1) + '%';

async function loadStats() {
  const r = await fetch('/api/stats');
  if (!r.ok) return;
  const s = await r.json();
  document.getElementById('s-games').textContent = s.games.toLocaleString();
  document.getElementById('s-clues').textContent = s.clues.toLocaleString();
  document.getElementById('s-first').textContent = s.first_air_date || '–';
  document.getElementById('s-last').textContent = s.last_air_date || '–';
  if (s.first_air_date && s.last_air_date) {
    document.getElementById('archive-range').textContent = s.first_air_date + ' → ' + s.last_air_date;
  }
}

async function loadGames() {
  const r = await fetch('/api/games?limit=500');
  if (!r.ok) return;
  const games = await r.json();
  const select = document.getElementById('game-select');
  select.innerHTML = games.map(g =>
    `<option value="${g.show_number}">Show #${g.show_number} — ${g.air_date} (won by ${g.winner_name})</option>`
  ).join('');
  if (games.length) loadGame(games[0].show_number);
}

let currentTimeline = null;

async function loadGame(show) {
  const [probRes, boardRes] = await Promise.all([
    fetch(`/api/games/${show}/win-probability`),
    fetch(`/api/games/${show}`),
  ]);
  if (probRes.ok) {
    currentTimeline = await probRes.json();
    renderLegend(currentTimeline.contestants);
    drawProbabilityChart(currentTimeline);
    drawScoreChart(currentTimeline);
  } else {
    currentTimeline = null;
    const msg = await probRes.text();
    renderLegend([]);
    clearChart('prob-chart', msg);
    clearChart('score-chart', '');
  }
  if (boardRes.ok) renderBoard(await boardRes.json());
  document.getElementById('last-updated').textContent = 'Updated ' + new Date().toLocaleTimeString();
}

function renderLegend(names) {
  document.getElementById('prob-legend').innerHTML = names.map((n, i) =>
    `<span><span class="swatch" style="background:${COLORS[i]}"></span>${n}</span>`
  ).join('');
}

function chartContext(id) {
  const canvas = document.getElementById(id);
  const W = canvas.parentElement.clientWidth - 32;
  const H = canvas.height;
  canvas.width = W;
  return [canvas.getContext('2d'), W, H];
}

function clearChart(id, msg) {
  const [ctx, W, H] = chartContext(id);
  ctx.clearRect(0, 0, W, H);
  if (msg) {
    ctx.fillStyle = '#ff4f6a';
    ctx.font = '13px system-ui';
    ctx.fillText(msg, 12, H / 2);
  }
}

function drawGrid(ctx, W, H) {
  ctx.strokeStyle = '#2a2d3a';
  ctx.lineWidth = 1;
  for (let i = 0; i <= 4; i++) {
    const y = (i / 4) * (H - 20) + 10;
    ctx.beginPath(); ctx.moveTo(0, y); ctx.lineTo(W, y); ctx.stroke();
  }
}

function drawSeries(ctx, values, toX, toY, color) {
  ctx.strokeStyle = color;
  ctx.lineWidth = 2;
  ctx.beginPath();
  values.forEach((v, i) => i === 0 ? ctx.moveTo(toX(i), toY(v)) : ctx.lineTo(toX(i), toY(v)));
  ctx.stroke();
}

function drawProbabilityChart(timeline) {
  const [ctx, W, H] = chartContext('prob-chart');
  const rows = timeline.rows;
  ctx.clearRect(0, 0, W, H);
  if (rows.length < 2) return;
  const toX = i => i / (rows.length - 1) * W;
  const toY = p => (H - 20) * (1 - p) + 10;
  drawGrid(ctx, W, H);

  // Shade from the first locked row onward
  const lockedAt = rows.findIndex(r => r.locked);
  if (lockedAt >= 0) {
    ctx.fillStyle = 'rgba(0, 200, 150, 0.07)';
    ctx.fillRect(toX(lockedAt), 0, W - toX(lockedAt), H);
  }

  // Wager-clue markers
  ctx.strokeStyle = '#ff4f9a';
  ctx.setLineDash([5, 4]);
  rows.forEach((r, i) => {
    if (r.wager_clue) {
      ctx.beginPath(); ctx.moveTo(toX(i), 0); ctx.lineTo(toX(i), H); ctx.stroke();
    }
  });
  ctx.setLineDash([]);

  for (let c = 0; c < 3; c++) {
    drawSeries(ctx, rows.map(r => r.probabilities[c]), toX, toY, COLORS[c]);
  }
}

function drawScoreChart(timeline) {
  const [ctx, W, H] = chartContext('score-chart');
  const rows = timeline.rows;
  ctx.clearRect(0, 0, W, H);
  if (rows.length < 2) return;
  const all = rows.flatMap(r => r.scores);
  const min = Math.min(0, ...all);
  const max = Math.max(1, ...all);
  const toX = i => i / (rows.length - 1) * W;
  const toY = v => (H - 20) * (1 - (v - min) / (max - min)) + 10;
  drawGrid(ctx, W, H);

  // Zero line
  ctx.strokeStyle = '#44485c';
  ctx.beginPath(); ctx.moveTo(0, toY(0)); ctx.lineTo(W, toY(0)); ctx.stroke();

  for (let c = 0; c < 3; c++) {
    drawSeries(ctx, rows.map(r => r.scores[c]), toX, toY, COLORS[c]);
  }
}

const ROUND_LABELS = { single: 'First Round', double: 'Second Round', final: 'Final Clue' };

function renderBoard(detail) {
  const container = document.getElementById('board-container');
  document.getElementById('board-title').textContent =
    `Game Board — Show #${detail.record.show_number} (${detail.record.air_date})`;
  document.getElementById('clue-detail').style.display = 'none';
  let html = '';
  for (const round of ['single', 'double', 'final']) {
    const clues = detail.clues.filter(c => c.round === round);
    if (!clues.length) continue;
    const cats = [...new Set(clues.map(c => c.category))];
    const byCat = {};
    for (const cat of cats) {
      byCat[cat] = clues.filter(c => c.category === cat).sort((a, b) => a.face_value - b.face_value);
    }
    const depth = Math.max(...cats.map(c => byCat[c].length));
    html += `<div class="panel-body hint">${ROUND_LABELS[round] || round}</div>`;
    html += `<div class="board" style="grid-template-columns: repeat(${cats.length}, 1fr);">`;
    html += cats.map(c => `<div class="cat">${escapeHtml(c)}</div>`).join('');
    for (let row = 0; row < depth; row++) {
      for (const cat of cats) {
        const clue = byCat[cat][row];
        if (!clue) { html += '<div class="cell empty">—</div>'; continue; }
        const label = round === 'final' ? '★' : money(clue.face_value);
        html += `<div class="cell${clue.is_wager_clue ? ' wager' : ''}" data-round="${clue.round}" data-order="${clue.order_number}">${label}</div>`;
      }
    }
    html += '</div>';
  }
  container.innerHTML = html || '<div class="empty">No clues archived for this game</div>';
  container.querySelectorAll('.cell[data-round]').forEach(cell => {
    cell.addEventListener('click', () => {
      const clue = detail.clues.find(c =>
        c.round === cell.dataset.round && c.order_number === Number(cell.dataset.order));
      if (clue) showClueDetail(clue);
    });
  });
}

function showClueDetail(clue) {
  const box = document.getElementById('clue-detail');
  const who = [];
  if (clue.correct_contestants) who.push('Correct: ' + clue.correct_contestants);
  if (clue.incorrect_contestants) who.push('Incorrect: ' + clue.incorrect_contestants);
  if (clue.wager != null) who.push('Wagered: ' + money(clue.wager));
  box.innerHTML =
    `<div><strong>${escapeHtml(clue.category)}</strong> — ${money(clue.face_value)}</div>` +
    `<div style="margin-top:.4rem;">${escapeHtml(clue.clue)}</div>` +
    `<div class="resp">${escapeHtml(clue.correct_response)}</div>` +
    (who.length ? `<div class="who">${escapeHtml(who.join(' · '))}</div>` : '');
  box.style.display = 'block';
}

async function runSearch() {
  const target = document.getElementById('search-target').value;
  const term = document.getElementById('search-term').value.trim();
  const exact = document.getElementById('search-exact').checked;
  const tbody = document.getElementById('search-tbody');
  if (!term) { tbody.innerHTML = '<tr><td colspan="6" class="empty">Enter a search term</td></tr>'; return; }
  const r = await fetch(`/api/clues/search?target=${target}&term=${encodeURIComponent(term)}&exact=${exact}`);
  if (!r.ok) { tbody.innerHTML = `<tr><td colspan="6" class="empty">Search failed (${r.status})</td></tr>`; return; }
  const hits = await r.json();
  if (!hits.length) { tbody.innerHTML = '<tr><td colspan="6" class="empty">No matching clues</td></tr>'; return; }
  tbody.innerHTML = hits.map(h => `<tr>
    <td>${h.air_date}</td>
    <td>${h.round}</td>
    <td>${money(h.face_value)}</td>
    <td>${escapeHtml(h.category)}</td>
    <td>${escapeHtml(h.clue)}</td>
    <td>${escapeHtml(h.correct_response)}</td>
  </tr>`).join('');
}

async function loadChampions() {
  const r = await fetch('/api/champions?limit=25');
  if (!r.ok) return;
  const rows = await r.json();
  const tbody = document.getElementById('champions-tbody');
  if (!rows.length) { tbody.innerHTML = '<tr><td colspan="5" class="empty">No games archived yet</td></tr>'; return; }
  tbody.innerHTML = rows.map(c => `<tr>
    <td>${escapeHtml(c.name)}</td>
    <td>${c.wins}</td>
    <td>${money(c.total_winnings)}</td>
    <td>${c.first_win}</td>
    <td>${c.last_win}</td>
  </tr>`).join('');
}

function escapeHtml(s) {
  return String(s).replace(/[&<>"']/g, ch =>
    ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[ch]));
}

document.getElementById('game-select').addEventListener('change', e => loadGame(e.target.value));
document.getElementById('search-term').addEventListener('keydown', e => { if (e.key === 'Enter') runSearch(); });
window.addEventListener('resize', () => {
  if (currentTimeline) { drawProbabilityChart(currentTimeline); drawScoreChart(currentTimeline); }
});

loadStats();
loadGames();
loadChampions();
</script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_the_right_statuses() {
        let cases = [
            (EngineError::ShowNotFound(4512), StatusCode::NOT_FOUND),
            (
                EngineError::ModelUnavailable("asset".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EngineError::DataIntegrity("bad row".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EngineError::Configuration("bad table".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, body) = engine_error_response(&err);
            assert_eq!(status, expected, "for {err:?}");
            assert!(!body.is_empty());
        }
    }
}
