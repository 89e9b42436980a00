// SPDX-License-Identifier: MIT OR Apache-2.0

//! ASCII board and score rendering for the CLI.

use goscore_core::{column_letter, Board, Color, Score, ScoringSystem, StoneGroupState};

/// Render the board with life/death and territory markers.
///
/// The top row is the highest row number, as players see the board.
pub fn render_board(board: &Board) -> String {
    render_with(board, |board, point| {
        let region = board.region(point.region());
        match (point.stone(), region.group_state()) {
            (Some(Color::Black), StoneGroupState::Dead) => "⊗",
            (Some(Color::White), StoneGroupState::Dead) => "⊕",
            (Some(Color::Black), _) => "●",
            (Some(Color::White), _) => "○",
            (None, _) if region.is_territory_inconsistent() => "?",
            (None, _) => match region.territory_color() {
                Some(Color::Black) => "x",
                Some(Color::White) => "o",
                None if point.is_star_point() => "+",
                None => "·",
            },
        }
    })
}

/// Render the territory statistics of every point
pub fn render_influence(board: &Board) -> String {
    render_with(board, |_, point| {
        let value = point.territory_statistics();
        if value > 0.5 {
            "X"
        } else if value > 0.2 {
            "x"
        } else if value < -0.5 {
            "O"
        } else if value < -0.2 {
            "o"
        } else {
            "·"
        }
    })
}

fn render_with<F>(board: &Board, symbol: F) -> String
where
    F: Fn(&Board, &goscore_core::Point) -> &'static str,
{
    let size = board.size();
    let mut output = String::new();

    let labels = |output: &mut String| {
        output.push_str("   ");
        for col in 0..size {
            output.push_str(&format!(" {}", column_letter(col)));
        }
        output.push('\n');
    };

    labels(&mut output);
    for row in (0..size).rev() {
        output.push_str(&format!("{:2} ", row + 1));
        for col in 0..size {
            let coord = goscore_core::Coord::new(col, row);
            let symbol = board.point(coord).map_or(" ", |point| symbol(board, point));
            output.push_str(&format!(" {}", symbol));
        }
        output.push_str(&format!(" {}", row + 1));
        output.push('\n');
    }
    labels(&mut output);

    output
}

/// Render the score breakdown and the result
pub fn render_score(score: &Score) -> String {
    let mut output = String::new();
    let system = match score.scoring_system {
        ScoringSystem::Area => "area",
        ScoringSystem::Territory => "territory",
    };
    output.push_str(&format!("Scoring: {system}, komi {}\n", score.komi));

    match score.scoring_system {
        ScoringSystem::Area => {
            output.push_str(&format!(
                "Black: {} (stones {}, territory {})\n",
                score.total_black, score.alive_black, score.territory_black
            ));
            output.push_str(&format!(
                "White: {} (stones {}, territory {}, komi {}, handicap {})\n",
                score.total_white,
                score.alive_white,
                score.territory_white,
                score.komi,
                score.handicap_compensation
            ));
        }
        ScoringSystem::Territory => {
            output.push_str(&format!(
                "Black: {} (territory {}, prisoners {}, dead white {})\n",
                score.total_black, score.territory_black, score.captured_by_black, score.dead_white
            ));
            output.push_str(&format!(
                "White: {} (territory {}, prisoners {}, dead black {}, komi {})\n",
                score.total_white,
                score.territory_white,
                score.captured_by_white,
                score.dead_black,
                score.komi
            ));
        }
    }

    output.push_str(&format!("Result: {}\n", score.result));
    if score.last_calculation_had_error {
        let message = score
            .last_error_message
            .as_deref()
            .unwrap_or("inconsistent marking");
        output.push_str(&format!("Warning: {message}\n"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use goscore_core::{Game, ScoreSession, ScoringRules};

    #[test]
    fn render_empty_9x9_board() {
        let board = Board::with_size(9).unwrap();
        let output = render_board(&board);

        // Column labels skip I
        assert!(output.contains("A B C D E F G H J"));
        assert!(output.contains(" 1 "));
        assert!(output.contains(" 9 "));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 11); // 2 label rows + 9 board rows
        // Row 9 is printed first
        assert!(lines[1].starts_with(" 9 "));
        // Star points
        assert_eq!(output.matches('+').count(), 5);
    }

    #[test]
    fn render_marks_and_territory() {
        let board = Board::from_diagram(
            "
            ..X.O..
            ..X.O..
            ..X.O..
            .OX.O..
            ..X.O..
            ..X.O..
            ..X.O..
            ",
        )
        .unwrap();
        let mut game = Game::from_position(board, Color::Black);
        let mut session = ScoreSession::new(ScoringRules::default());
        session.enable(&mut game).unwrap();
        session
            .toggle_dead_stone_state_of_group(&mut game, "B4".parse().unwrap())
            .unwrap();

        let output = render_board(game.board());
        assert!(output.contains('⊕'));
        assert!(output.contains('x'));
        assert!(output.contains('o'));
        assert!(output.contains('●'));

        let summary = render_score(session.score());
        assert!(summary.contains("Scoring: area, komi 7.5"));
        assert!(summary.contains("Result: "));
        assert!(!summary.contains("Warning"));
    }

    #[test]
    fn render_influence_map() {
        let mut board = Board::with_size(9).unwrap();
        board.place_stone("E5".parse().unwrap(), Color::Black);
        let mut game = Game::from_position(board, Color::White);
        let mut session = ScoreSession::new(ScoringRules::default());
        session.refresh_territory_statistics(&mut game);

        let output = render_influence(game.board());
        assert!(output.contains('X'));
        assert!(!output.contains('O'));
    }
}
