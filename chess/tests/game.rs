use rookery::{
    Board, CastlingSide, Color, Coord, DrawReason, Game, MoveError, Outcome, PieceKind,
    ScriptedPlayer, WinReason,
};
use std::str::FromStr;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn c(s: &str) -> Coord {
    Coord::from_str(s).unwrap()
}

fn game(placement: &str, side: Color) -> Game {
    Game::new(Board::from_placement(placement, side).unwrap())
}

fn history(g: &Game) -> Vec<String> {
    g.move_history().iter().map(|e| e.to_string()).collect()
}

#[test]
fn test_first_move() {
    init_logging();
    let mut g = Game::new_initial();
    assert_eq!(g.side_to_move(), Color::White);
    assert!(g.apply_move("e4"));
    assert_eq!(g.side_to_move(), Color::Black);
    assert_eq!(g.piece_at(c("e4")), Some((PieceKind::Pawn, Color::White)));
    assert_eq!(g.piece_at(c("e2")), None);
    assert!(!g.is_over());
}

#[test]
fn test_fools_mate() {
    init_logging();
    let mut g = Game::new_initial();
    for mv in ["f3", "e5", "g4", "Qh4#"] {
        assert!(g.apply_move(mv), "{}: {:?}", mv, g.last_error());
    }
    assert_eq!(
        g.outcome(),
        Some(Outcome::Win {
            side: Color::Black,
            reason: WinReason::Checkmate,
        })
    );
    assert_eq!(g.result().as_deref(), Some("0-1 (checkmate)"));
    assert_eq!(history(&g), ["1. f3 e5", "2. g4 Qh4#"]);

    assert!(!g.apply_move("a3"));
    assert_eq!(g.last_error(), Some(&MoveError::GameOver));
}

#[test]
fn test_scholars_mate_with_players() {
    init_logging();
    let mut g = Game::new_initial();
    let mut white = ScriptedPlayer::from_list("e4 Bc4 Qh5 Qxf7");
    let mut black = ScriptedPlayer::from_list("e5 Nc6 Nf6");
    while !g.is_over() {
        let ok = match g.side_to_move() {
            Color::White => g.play_turn(&mut white),
            Color::Black => g.play_turn(&mut black),
        };
        assert!(ok, "{:?}", g.last_error());
    }
    assert_eq!(g.result().as_deref(), Some("1-0 (checkmate)"));
    assert_eq!(
        history(&g),
        ["1. e4 e5", "2. Bc4 Nc6", "3. Qh5 Nf6", "4. Qxf7#"]
    );
}

#[test]
fn test_castling_from_initial() {
    let mut g = Game::new_initial();
    assert!(!g.apply_move("O-O"));
    assert_eq!(g.last_error(), Some(&MoveError::CastleUnavailable));
    assert!(!g.apply_move("O-O-O"));
    assert_eq!(g.side_to_move(), Color::White);
    assert!(!g.board().can_castle(CastlingSide::King));
}

#[test]
fn test_castling_is_recorded() {
    let mut g = Game::new_initial();
    for mv in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O", "Nf6", "d3", "O-O"] {
        assert!(g.apply_move(mv), "{}: {:?}", mv, g.last_error());
    }
    assert_eq!(history(&g)[3], "4. 0-0 Nf6");
    assert_eq!(history(&g)[4], "5. d3 0-0");
    assert_eq!(g.piece_at(c("g1")), Some((PieceKind::King, Color::White)));
    assert_eq!(g.piece_at(c("f8")), Some((PieceKind::Rook, Color::Black)));
}

#[test]
fn test_promotion() {
    let mut g = game("8/4P3/8/8/8/8/8/K6k", Color::White);
    assert!(!g.apply_move("e8"));
    assert_eq!(g.last_error(), Some(&MoveError::InvalidPromotion));
    assert!(g.apply_move("e8=Q"));
    assert_eq!(g.piece_at(c("e8")), Some((PieceKind::Queen, Color::White)));
    assert_eq!(g.piece_at(c("e7")), None);
}

#[test]
fn test_en_passant_window() {
    let mut g = Game::new_initial();
    for mv in ["e4", "a6", "e5", "d5"] {
        assert!(g.apply_move(mv));
    }

    let mut taken = g.clone();
    assert!(taken.apply_move("exd6"));
    assert_eq!(taken.piece_at(c("d5")), None);
    assert_eq!(taken.piece_at(c("d6")), Some((PieceKind::Pawn, Color::White)));
    assert_eq!(history(&taken)[2], "3. exd6");

    assert!(g.apply_move("Nf3"));
    assert!(g.apply_move("h6"));
    assert!(!g.apply_move("exd6"));
    assert_eq!(g.last_error(), Some(&MoveError::InvalidEnPassant));
}

#[test]
fn test_disambiguation() {
    let mut g = game("4k3/8/8/8/8/5N2/8/1N2K3", Color::White);
    assert!(!g.apply_move("Nd2"));
    assert_eq!(
        g.last_error(),
        Some(&MoveError::Ambiguous(c("b1"), c("f3")))
    );
    assert!(g.apply_move("Nfd2"));
    assert_eq!(g.piece_at(c("d2")), Some((PieceKind::Knight, Color::White)));
    assert_eq!(g.piece_at(c("b1")), Some((PieceKind::Knight, Color::White)));
    assert_eq!(history(&g), ["1. Nfd2"]);
}

#[test]
fn test_pinned_piece() {
    let mut g = game("4k3/8/8/8/4r3/8/4N3/4K3", Color::White);
    assert!(!g.apply_move("Nc3"));
    assert_eq!(g.last_error(), Some(&MoveError::IllegalMove));
    assert_eq!(
        g.last_error_message().as_deref(),
        Some("move leaves the king in check")
    );
    assert!(g.apply_move("Kd1"));
}

#[test]
fn test_suffix_mismatch() {
    let mut g = Game::new_initial();
    for mv in ["e4+", "e4#", "e4++", "e4x"] {
        assert!(!g.apply_move(mv), "{}", mv);
    }
    assert_eq!(g.last_error(), Some(&MoveError::InputFormat));
    assert!(!g.apply_move("e4+"));
    assert_eq!(g.last_error(), Some(&MoveError::TrailingCharacters));
    assert_eq!(g.side_to_move(), Color::White);
    assert!(g.move_history().is_empty());
}

#[test]
fn test_stalemate() {
    let mut g = game("k7/8/1Q6/8/8/8/8/K7", Color::White);
    assert!(!g.is_over());
    assert!(g.apply_move("Ka2"));
    assert_eq!(g.outcome(), Some(Outcome::Draw(DrawReason::Stalemate)));
    assert_eq!(g.result().as_deref(), Some("1/2-1/2 (stalemate)"));
}

#[test]
fn test_insufficient_material() {
    let mut g = game("4k3/8/8/8/8/8/4r3/4K3", Color::White);
    assert!(!g.apply_move("Kxe2+"));
    assert!(g.apply_move("Kxe2"));
    assert_eq!(
        g.outcome(),
        Some(Outcome::Draw(DrawReason::InsufficientMaterial))
    );
    assert_eq!(g.result().as_deref(), Some("1/2-1/2 (insufficient material)"));
}

#[test]
fn test_resign() {
    let mut g = Game::new_initial();
    assert!(g.apply_move("d4"));
    g.resign(Color::Black).unwrap();
    assert_eq!(g.result().as_deref(), Some("1-0 (resignation)"));
    assert_eq!(g.resign(Color::White), Err(MoveError::GameOver));
}
