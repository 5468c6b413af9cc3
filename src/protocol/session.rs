//! The engine's control loop.
//!
//! One session owns the request poll and the wall-clock ceiling; each
//! "find" spawns a detached worker that runs the search and posts the
//! result. The two threads coordinate through [`SearchControl`] only, so
//! the worker owns the position and the table exclusively while searching.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::board::attack_tables::AttackTables;
use crate::board::position::Position;
use crate::board::zobrist::ZobristKeys;
use crate::protocol::channel::Channel;
use crate::protocol::encode::{
    self, encode_find, encode_move_list, parse_request, ParsedRequest,
};
use crate::search::control::SearchControl;
use crate::search::engine::{SearchEngine, SearchOutcome, SearchSettings};

pub struct Session {
    channel: Arc<dyn Channel>,
    tables: Arc<AttackTables>,
    keys: Arc<ZobristKeys>,
    control: Arc<SearchControl>,
    settings: SearchSettings,
    /// Destination of the per-search report, if any.
    report_path: Option<PathBuf>,
}

impl Session {
    pub fn new(
        channel: Arc<dyn Channel>,
        tables: Arc<AttackTables>,
        keys: Arc<ZobristKeys>,
        settings: SearchSettings,
        report_path: Option<PathBuf>,
    ) -> Session {
        Session {
            channel,
            tables,
            keys,
            control: Arc::new(SearchControl::new()),
            settings,
            report_path,
        }
    }

    /// Polls requests until a "term" arrives. Acknowledges startup first so
    /// the host knows table construction has finished.
    pub fn run(&self) {
        self.channel.post("ok");
        let mut search_start = Instant::now();

        loop {
            if self.control.is_searching()
                && !self.control.timed_out()
                && search_start.elapsed() >= Duration::from_millis(self.settings.max_search_time_ms)
            {
                self.control.set_timeout();
            }

            let lines = self.channel.read_lines();
            match lines.first().map(String::as_str) {
                Some("find") => {
                    if let Some(request) = parse_request(&lines) {
                        self.spawn_search(request, lines[1].clone());
                        while !self.control.is_searching() {
                            thread::yield_now();
                        }
                        search_start = Instant::now();
                    }
                    self.channel.post("ok");
                }
                Some("get") => {
                    let request = parse_request(&lines);
                    self.channel.post("ok");
                    if let Some(request) = request {
                        let payload = self.legal_moves_payload(&request);
                        self.channel.wait_until_consumed();
                        self.channel.post(&payload);
                    }
                }
                Some("stop") => {
                    if self.control.is_searching() {
                        // The worker acknowledges once it unwinds.
                        self.control.request_stop();
                    } else {
                        self.channel.post("ok");
                    }
                }
                Some("term") => {
                    self.control.request_terminate();
                    self.channel.post("ok");
                    return;
                }
                _ => thread::sleep(Duration::from_millis(1)),
            }
        }
    }

    fn legal_moves_payload(&self, request: &ParsedRequest) -> String {
        let position = Position::from_layout(
            &request.layout,
            request.turn,
            request.white_castling,
            request.black_castling,
            request.en_passant,
            &self.tables,
            &self.keys,
        );
        let mut engine = SearchEngine::new(
            Arc::clone(&self.tables),
            Arc::clone(&self.keys),
            position,
            self.settings,
        );
        encode_move_list(&engine.legal_move_report(), request.mirrored)
    }

    fn spawn_search(&self, request: ParsedRequest, board_line: String) {
        let channel = Arc::clone(&self.channel);
        let tables = Arc::clone(&self.tables);
        let keys = Arc::clone(&self.keys);
        let control = Arc::clone(&self.control);
        let settings = self.settings;
        let report_path = self.report_path.clone();

        thread::spawn(move || {
            control.begin_search();
            let position = Position::from_layout(
                &request.layout,
                request.turn,
                request.white_castling,
                request.black_castling,
                request.en_passant,
                &tables,
                &keys,
            );
            let mut engine = SearchEngine::new(tables, keys, position, settings);
            let started = Instant::now();
            let outcome = engine.find_best_move(&control);
            control.end_search();

            if !control.should_stop() && !control.terminated() {
                if let Some(best) = outcome.best {
                    write_report(&report_path, &board_line, &outcome, started.elapsed());
                    channel.wait_until_consumed();
                    channel.post(&encode_find(&best, request.mirrored));
                }
            }
            if control.should_stop() {
                channel.post("ok");
            }
        });
    }
}

fn write_report(
    path: &Option<PathBuf>,
    board_line: &str,
    outcome: &SearchOutcome,
    elapsed: Duration,
) {
    let path = match path {
        Some(path) => path,
        None => return,
    };
    let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
    let report = format!(
        "{}\n\n{}\nSearch depth: {}\nMax depth positions reached: {}\nAverage search speed: {} nodes/s\nCheckmates found: {}\nTransposition table size: {}\nFinal evaluation: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        encode::render_board(board_line),
        outcome.depth,
        outcome.leaf_positions,
        (outcome.nodes as f32 / seconds) as u64,
        outcome.checkmates,
        outcome.table_entries,
        outcome.score,
    );
    let _ = fs::write(path, report);
}
