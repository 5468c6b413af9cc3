use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use quince_chess::board::attack_tables::AttackTables;
use quince_chess::board::zobrist::ZobristKeys;
use quince_chess::protocol::channel::{Channel, FileChannel};
use quince_chess::protocol::session::Session;
use quince_chess::search::engine::SearchSettings;

fn main() {
    let mut args = env::args().skip(1);
    let channel_path = args
        .next()
        .unwrap_or_else(|| "engine_channel.txt".to_string());
    let report_path = args
        .next()
        .unwrap_or_else(|| "search_report.txt".to_string());

    let tables = match AttackTables::new() {
        Ok(tables) => Arc::new(tables),
        Err(err) => {
            eprintln!("failed to build attack tables: {}", err);
            process::exit(1);
        }
    };
    let keys = Arc::new(ZobristKeys::default());
    let channel: Arc<dyn Channel> = Arc::new(FileChannel::new(&channel_path));

    let session = Session::new(
        channel,
        tables,
        keys,
        SearchSettings::default(),
        Some(PathBuf::from(report_path)),
    );
    session.run();
}
