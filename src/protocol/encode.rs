//! Request parsing and move encoding for the GUI protocol.
//!
//! A request is five lines: command, 64-character board, turn/orientation
//! pair, last-move digits (or a `-` sentinel), and the combined castling
//! integer (white rights * 4 + black rights). When the board arrives from
//! the flipped perspective every square index is mirrored (63 - index) on
//! the way in and moves are mirrored back on the way out.

use crate::board::types::{Color, PieceKind, Square};
use crate::movegen::move_queue::Move;
use crate::search::engine::MoveReport;

/// Piece for one board character; `Err` on anything outside the alphabet.
pub fn piece_from_char(ch: char) -> Result<Option<PieceKind>, String> {
    let piece = match ch {
        '0' => None,
        'P' => Some(PieceKind::WhitePawn),
        'N' => Some(PieceKind::WhiteKnight),
        'B' => Some(PieceKind::WhiteBishop),
        'R' => Some(PieceKind::WhiteRook),
        'Q' => Some(PieceKind::WhiteQueen),
        'K' => Some(PieceKind::WhiteKing),
        'p' => Some(PieceKind::BlackPawn),
        'n' => Some(PieceKind::BlackKnight),
        'b' => Some(PieceKind::BlackBishop),
        'r' => Some(PieceKind::BlackRook),
        'q' => Some(PieceKind::BlackQueen),
        'k' => Some(PieceKind::BlackKing),
        other => return Err(format!("unknown board character '{}'", other)),
    };
    Ok(piece)
}

/// Parses a 64-character board line, top-left square first.
pub fn layout_from_board(board: &str) -> Result<[Option<PieceKind>; 64], String> {
    let mut layout = [None; 64];
    let mut count = 0;
    for (index, ch) in board.chars().enumerate() {
        if index >= 64 {
            return Err(format!("board has more than 64 squares: '{}'", board));
        }
        layout[index] = piece_from_char(ch)?;
        count += 1;
    }
    if count != 64 {
        return Err(format!("board has {} squares instead of 64", count));
    }
    Ok(layout)
}

#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub layout: [Option<PieceKind>; 64],
    pub turn: Color,
    /// The request came from the flipped perspective; mirror outputs back.
    pub mirrored: bool,
    pub en_passant: Option<Square>,
    pub white_castling: u8,
    pub black_castling: u8,
}

/// Parses the payload lines of a request. `None` for anything malformed;
/// bad requests are dropped without a response.
pub fn parse_request(lines: &[String]) -> Option<ParsedRequest> {
    if lines.len() < 5 {
        return None;
    }
    let board = lines[1].trim_end();
    let turn_line: Vec<char> = lines[2].trim_end().chars().collect();
    let last_move = lines[3].trim_end();
    let castling_line = lines[4].trim_end();

    if turn_line.len() < 2 {
        return None;
    }
    let turn = if turn_line[0] == '-' {
        Color::Black
    } else {
        Color::White
    };
    let mirrored = turn_line[1] == '-';

    let parsed = layout_from_board(board).ok()?;
    let layout = if mirrored {
        let mut flipped = [None; 64];
        for (index, piece) in parsed.iter().enumerate() {
            flipped[63 - index] = *piece;
        }
        flipped
    } else {
        parsed
    };

    let combined: u8 = castling_line.parse().ok()?;
    if combined > 15 {
        return None;
    }
    let black_castling = combined % 4;
    let white_castling = combined / 4;

    let en_passant = parse_en_passant(last_move, mirrored, turn, &layout);

    Some(ParsedRequest {
        layout,
        turn,
        mirrored,
        en_passant,
        white_castling,
        black_castling,
    })
}

/// The en-passant target implied by the last move: a two-square push on one
/// file with a pawn now standing on the arrival square.
fn parse_en_passant(
    last_move: &str,
    mirrored: bool,
    turn: Color,
    layout: &[Option<PieceKind>; 64],
) -> Option<Square> {
    if last_move.starts_with('-') {
        return None;
    }
    if last_move.chars().count() < 4 {
        return None;
    }
    let mut digits = [0u8; 4];
    for (slot, ch) in digits.iter_mut().zip(last_move.chars()) {
        let digit = ch.to_digit(10)? as u8;
        if digit > 7 {
            return None;
        }
        *slot = if mirrored { 7 - digit } else { digit };
    }
    let [origin_row, origin_file, dest_row, dest_file] = digits;
    if origin_file != dest_file || (origin_row as i8 - dest_row as i8).abs() != 2 {
        return None;
    }
    let destination = dest_row * 8 + dest_file;
    match layout[destination as usize] {
        Some(kind) if kind.is_pawn() => {}
        _ => return None,
    }
    let origin = (origin_row * 8 + origin_file) as i16;
    // The target sits between push origin and destination, toward the
    // capturing side.
    let target = match turn {
        Color::White => origin + 8,
        Color::Black => origin - 8,
    };
    if !(0..64).contains(&target) {
        return None;
    }
    Some(target as Square)
}

/// Five digits: origin rank and file, destination rank and file, type tag.
pub fn encode_move(mv: &Move, mirrored: bool) -> String {
    let (origin, destination) = if mirrored {
        (63 - mv.origin, 63 - mv.destination)
    } else {
        (mv.origin, mv.destination)
    };
    format!(
        "{}{}{}{}{}",
        origin / 8,
        origin % 8,
        destination / 8,
        destination % 8,
        mv.kind.digit()
    )
}

/// Response payload for a "find" request.
pub fn encode_find(mv: &Move, mirrored: bool) -> String {
    format!("f/{}", encode_move(mv, mirrored))
}

/// Response payload for a "get" request: every legal move back to back,
/// then the four status digits.
pub fn encode_move_list(report: &MoveReport, mirrored: bool) -> String {
    let mut out = String::from("/");
    for mv in &report.moves {
        out.push_str(&encode_move(mv, mirrored));
    }
    out.push('\n');
    for flag in [
        report.in_check,
        report.checkmate,
        report.stalemate,
        report.insufficient_material,
    ] {
        out.push(if flag { '1' } else { '0' });
    }
    out
}

/// Board line spread into an 8x8 grid for the search report.
pub fn render_board(board: &str) -> String {
    let mut out = String::with_capacity(64 * 3 + 8);
    for (index, ch) in board.chars().enumerate() {
        out.push(ch);
        if (index + 1) % 8 == 0 {
            out.push('\n');
        } else {
            out.push_str("  ");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::move_queue::MoveType;

    const START_BOARD: &str =
        "rnbqkbnrpppppppp00000000000000000000000000000000PPPPPPPPRNBQKBNR";

    fn request_lines(board: &str, turn: &str, last_move: &str, castling: &str) -> Vec<String> {
        ["get", board, turn, last_move, castling]
            .iter()
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn board_parsing_round_trips_the_start_position() {
        let layout = layout_from_board(START_BOARD).expect("start board parses");
        assert_eq!(layout[0], Some(PieceKind::BlackRook));
        assert_eq!(layout[4], Some(PieceKind::BlackKing));
        assert_eq!(layout[52], Some(PieceKind::WhitePawn));
        assert_eq!(layout[60], Some(PieceKind::WhiteKing));
        assert_eq!(layout[30], None);
    }

    #[test]
    fn bad_boards_are_rejected() {
        assert!(layout_from_board("k000").is_err());
        assert!(layout_from_board(&"x".repeat(64)).is_err());
        assert!(layout_from_board(&format!("{}0", START_BOARD)).is_err());
    }

    #[test]
    fn parse_request_reads_turn_and_castling() {
        let lines = request_lines(START_BOARD, "++", "-", "15");
        let request = parse_request(&lines).expect("request parses");
        assert_eq!(request.turn, Color::White);
        assert!(!request.mirrored);
        assert_eq!(request.white_castling, 3);
        assert_eq!(request.black_castling, 3);
        assert_eq!(request.en_passant, None);

        let lines = request_lines(START_BOARD, "-+", "-", "6");
        let request = parse_request(&lines).expect("request parses");
        assert_eq!(request.turn, Color::Black);
        assert_eq!(request.white_castling, 1);
        assert_eq!(request.black_castling, 2);
    }

    #[test]
    fn malformed_requests_are_dropped() {
        assert!(parse_request(&request_lines(START_BOARD, "++", "-", "16")).is_none());
        assert!(parse_request(&request_lines(START_BOARD, "", "-", "15")).is_none());
        assert!(parse_request(&request_lines("short", "++", "-", "15")).is_none());
        assert!(parse_request(&["find".to_string()]).is_none());
    }

    #[test]
    fn mirrored_boards_are_flipped_on_the_way_in() {
        // The start position happens to be its own color-swapped mirror, so
        // use a lone king pair instead.
        let board = "K0000000000000000000000000000000000000000000000000000000000000k0";
        let lines = request_lines(board, "+-", "-", "0");
        let request = parse_request(&lines).expect("request parses");
        assert_eq!(request.layout[63], Some(PieceKind::WhiteKing));
        assert_eq!(request.layout[1], Some(PieceKind::BlackKing));
        assert!(request.mirrored);
    }

    #[test]
    fn double_pushes_set_the_en_passant_target() {
        // Black just played d7d5 (1315 in digits); White to move.
        let board = "rnbqkbnrppp0pppp00000000000p00000000P00000000000PPPP0PPPRNBQKBNR";
        let lines = request_lines(board, "++", "1333", "15");
        let request = parse_request(&lines).expect("request parses");
        assert_eq!(request.en_passant, Some(19));

        // A single-square push is not an en-passant opportunity.
        let lines = request_lines(board, "++", "1323", "15");
        let request = parse_request(&lines).expect("request parses");
        assert_eq!(request.en_passant, None);
    }

    #[test]
    fn move_encoding_mirrors_back_when_needed() {
        let mv = Move::new(52, 36, MoveType::Quiet, 0);
        assert_eq!(encode_move(&mv, false), "64440");
        // 52 -> 11, 36 -> 27 when mirrored.
        assert_eq!(encode_move(&mv, true), "13330");
        assert_eq!(encode_find(&mv, false), "f/64440");
    }

    #[test]
    fn move_lists_carry_the_status_digits() {
        let report = MoveReport {
            moves: vec![
                Move::new(52, 36, MoveType::Quiet, 0),
                Move::new(62, 45, MoveType::Quiet, 0),
            ],
            in_check: false,
            checkmate: false,
            stalemate: false,
            insufficient_material: true,
        };
        assert_eq!(encode_move_list(&report, false), "/6444076550\n0001");
    }

    #[test]
    fn board_rendering_breaks_into_ranks() {
        let rendered = render_board(START_BOARD);
        assert_eq!(rendered.lines().count(), 8);
        assert!(rendered.starts_with("r  n  b  q  k  b  n  r\n"));
    }
}
