// SPDX-License-Identifier: MIT OR Apache-2.0

//! CBOR roundtrip tests for games and scoring sessions

use goscore_core::cbor::{deserialize_game, deserialize_session, serialize_game, serialize_session};
use goscore_core::{
    BoardSize, Coord, Game, Move, RulesPreset, ScoreSession, ScoringRules, ScoringState,
    StoneGroupState,
};
use serde_cbor::Value;

fn c(vertex: &str) -> Coord {
    vertex.parse().unwrap()
}

fn scored_game() -> (Game, ScoreSession) {
    let mut game = Game::new(BoardSize::new(9).unwrap());
    for vertex in ["C3", "G7", "C4", "G6", "D3", "F7", "E5"] {
        game.apply_move(Move::Place(c(vertex))).unwrap();
    }
    game.apply_move(Move::Pass).unwrap();
    game.apply_move(Move::Pass).unwrap();

    let mut session = ScoreSession::new(ScoringRules::preset(RulesPreset::Japanese));
    session.enable(&mut game).unwrap();
    session
        .toggle_dead_stone_state_of_group(&mut game, c("E5"))
        .unwrap();
    (game, session)
}

#[test]
fn game_roundtrip_keeps_marks_and_partition() {
    let (game, _) = scored_game();

    let bytes = serialize_game(&game);
    assert!(!bytes.is_empty());
    let restored = deserialize_game(&bytes).expect("Failed to deserialize game");

    assert_eq!(restored.board().to_diagram(), game.board().to_diagram());
    assert_eq!(restored.moves(), game.moves());
    assert_eq!(restored.statistics(), game.statistics());
    assert!(restored.is_game_over());
    assert_eq!(
        restored.board().region_at(c("E5")).group_state(),
        StoneGroupState::Dead
    );
    assert_eq!(
        restored.board().region_id_at(c("C3")),
        game.board().region_id_at(c("C4"))
    );

    // Cached liberties are rebuilt on demand
    let group = restored.board().region_id_at(c("C3"));
    assert_eq!(restored.board().liberties(group), 7);
    restored.board().verify_partition().unwrap();
}

#[test]
fn session_roundtrip_recomputes_the_same_score() {
    let (game, session) = scored_game();

    let game_bytes = serialize_game(&game);
    let session_bytes = serialize_session(&session.snapshot());

    let mut game = deserialize_game(&game_bytes).unwrap();
    let snapshot = deserialize_session(&session_bytes).unwrap();
    assert_eq!(snapshot, session.snapshot());

    let mut restored = ScoreSession::restore(snapshot);
    assert_eq!(restored.state(), ScoringState::Idle);
    let score = restored.calculate(&mut game).unwrap().clone();
    assert_eq!(&score, session.score());
}

#[test]
fn empty_and_garbage_input() {
    assert!(deserialize_game(&[]).is_none());
    assert!(deserialize_game(&[0xff, 0x00, 0x13]).is_none());
    assert!(deserialize_session(&[]).is_none());
}

#[test]
fn archive_with_wrong_point_count_is_rejected() {
    let game = Game::new(BoardSize::new(9).unwrap());
    let mut value: Value = serde_cbor::from_slice(&serialize_game(&game)).unwrap();

    let Value::Map(fields) = &mut value else { panic!("game is not a map") };
    let Some(Value::Map(board)) = fields.get_mut(&Value::Text("board".into())) else {
        panic!("game has no board")
    };
    board.insert(Value::Text("size".into()), Value::Integer(7));

    let bytes = serde_cbor::to_vec(&value).unwrap();
    assert!(deserialize_game(&bytes).is_none());
}
