// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-of-game scoring session.
//!
//! The session is owned by the thread that owns the [`Game`]. It drives
//! the classifier and the calculator and tells observers what it is doing
//! through [`ScoringEvent`]s. The only step that leaves the owner thread is
//! the dead-stone query: [`ScoreSession::begin_dead_stone_query`] hands out
//! a ticket and a request, and the answer comes back through
//! [`ScoreSession::complete_dead_stone_query`]. Answers whose ticket is no
//! longer current are dropped.

use crate::classifier::{self, MarkMode};
use crate::config::ScoringRules;
use crate::engine::{DeadStoneRequest, DeadStoneResponse, QueryTicket};
use crate::game::Game;
use crate::influence;
use crate::region::StoneGroupState;
use crate::scoring::Score;
use crate::Coord;
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringState {
    /// Normal play
    Disabled,
    /// Scoring mode, nothing running
    Idle,
    /// A calculation pass is running, possibly waiting for the engine
    InProgress { asking_engine: bool },
}

/// Lifecycle signals sent to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringEvent {
    ScoringEnabled,
    ScoringDisabled,
    CalculationStarts,
    CalculationEnds,
    DeadStonesQueryStarts,
    DeadStonesQueryEnds,
    TerritoryStatisticsChanged,
}

/// Requests the session refuses
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("scoring mode is not enabled")]
    NotEnabled,
    #[error("scoring mode is already enabled")]
    AlreadyEnabled,
    #[error("a score calculation is in progress")]
    CalculationInProgress,
    #[error("no stone at {0}")]
    NoStoneAt(Coord),
}

/// What happened to an engine answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Marks were updated and the score recalculated
    Applied,
    /// The answer belonged to a query that is no longer current
    Discarded,
}

/// Persistable part of a session. The marks themselves live on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub rules: ScoringRules,
    pub scoring_enabled: bool,
    pub score: Score,
    /// Query epoch at the time of the snapshot
    #[serde(default)]
    pub epoch: u64,
}

/// Scoring session of one game
pub struct ScoreSession {
    rules: ScoringRules,
    state: ScoringState,
    /// Bumped whenever outstanding queries become stale
    epoch: u64,
    /// Epoch of the query the session is waiting for
    pending: Option<u64>,
    score: Score,
    subscribers: Vec<Sender<ScoringEvent>>,
}

impl ScoreSession {
    /// A disabled session for a game played under `rules`
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            state: ScoringState::Disabled,
            epoch: 0,
            pending: None,
            score: Score::new(&rules),
            subscribers: Vec::new(),
        }
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<ScoringEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> ScoringState {
        self.state
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Latest score
    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn is_enabled(&self) -> bool {
        self.state != ScoringState::Disabled
    }

    /// Whether an engine answer is awaited
    pub fn is_query_outstanding(&self) -> bool {
        self.pending.is_some()
    }

    /// Enter scoring mode. Every stone group becomes undecided.
    pub fn enable(&mut self, game: &mut Game) -> Result<(), SessionError> {
        if self.is_enabled() {
            return Err(SessionError::AlreadyEnabled);
        }
        classifier::enter_scoring_mode(game.board_mut());
        self.state = ScoringState::Idle;
        self.score = Score::new(&self.rules);
        self.sync_flags();
        tracing::info!(groups = game.board().stone_groups().len(), "scoring enabled");
        self.emit(ScoringEvent::ScoringEnabled);
        Ok(())
    }

    /// Leave scoring mode, dropping every mark and territory.
    ///
    /// An outstanding engine query is abandoned; its answer will be
    /// discarded when it arrives.
    pub fn disable(&mut self, game: &mut Game) {
        if !self.is_enabled() {
            return;
        }
        self.epoch += 1;
        if let Some(epoch) = self.pending.take() {
            tracing::info!(epoch, "abandoning dead stone query");
        }
        classifier::leave_scoring_mode(game.board_mut());
        self.state = ScoringState::Disabled;
        self.score = Score::new(&self.rules);
        self.sync_flags();
        tracing::info!("scoring disabled");
        self.emit(ScoringEvent::ScoringDisabled);
    }

    /// Classify the current marks and recount
    pub fn calculate(&mut self, game: &mut Game) -> Result<&Score, SessionError> {
        self.require_idle()?;
        self.start_pass(false);
        self.run_pass(game);
        self.finish_pass();
        Ok(&self.score)
    }

    /// Flip the group containing `coord` and recalculate at once
    pub fn toggle_dead_stone_state_of_group(
        &mut self,
        game: &mut Game,
        coord: Coord,
    ) -> Result<StoneGroupState, SessionError> {
        self.require_idle()?;
        if game.board().get(coord).is_none() {
            return Err(SessionError::NoStoneAt(coord));
        }

        let id = game.board().region_id_at(coord);
        let state = classifier::toggle_dead_stone_state_of_group(
            game.board_mut(),
            id,
            self.rules.mark_mode,
        );
        tracing::debug!(%coord, ?state, "group toggled");

        self.start_pass(false);
        self.run_pass(game);
        self.finish_pass();
        Ok(state)
    }

    /// Use another mark mode for later toggles
    pub fn set_mark_mode(&mut self, mode: MarkMode) {
        self.rules.mark_mode = mode;
    }

    /// Start a calculation that waits for the engine's dead stones.
    ///
    /// The board must not change until the answer is passed to
    /// [`ScoreSession::complete_dead_stone_query`].
    pub fn begin_dead_stone_query(
        &mut self,
        game: &Game,
    ) -> Result<(QueryTicket, DeadStoneRequest), SessionError> {
        self.require_idle()?;
        self.epoch += 1;
        self.pending = Some(self.epoch);
        self.start_pass(true);
        self.emit(ScoringEvent::DeadStonesQueryStarts);
        tracing::info!(epoch = self.epoch, "asking engine for dead stones");

        let ticket = QueryTicket { epoch: self.epoch };
        Ok((ticket, DeadStoneRequest::from_board(game.board(), self.rules.komi)))
    }

    /// Merge the engine's answer and finish the calculation.
    ///
    /// Engine failures do not abort the pass: the current marks are scored
    /// and the error is reported through the score's error flag.
    pub fn complete_dead_stone_query(
        &mut self,
        game: &mut Game,
        ticket: QueryTicket,
        result: Result<Vec<Coord>, String>,
    ) -> QueryOutcome {
        if self.pending != Some(ticket.epoch) {
            tracing::warn!(
                epoch = ticket.epoch,
                current = self.epoch,
                "discarding stale dead stone answer"
            );
            return QueryOutcome::Discarded;
        }
        self.pending = None;
        self.state = ScoringState::InProgress {
            asking_engine: false,
        };
        self.sync_flags();
        self.emit(ScoringEvent::DeadStonesQueryEnds);

        let failure = match result {
            Ok(dead) => {
                let groups = classifier::apply_dead_stones(game.board_mut(), &dead);
                tracing::info!(groups, "engine marked groups dead");
                None
            }
            Err(message) => {
                tracing::warn!(%message, "engine could not estimate dead stones");
                Some(message)
            }
        };

        self.run_pass(game);
        if let Some(message) = failure {
            self.score.last_calculation_had_error = true;
            self.score.last_error_message = Some(format!("engine error: {message}"));
        }
        self.finish_pass();
        QueryOutcome::Applied
    }

    /// Convenience for answers read from an [`crate::engine::EngineBridge`]
    pub fn complete_with_response(&mut self, game: &mut Game, response: DeadStoneResponse) -> QueryOutcome {
        self.complete_dead_stone_query(game, response.ticket, response.result)
    }

    /// Recompute the per-point ownership estimate
    pub fn refresh_territory_statistics(&mut self, game: &mut Game) {
        influence::update(game.board_mut());
        self.emit(ScoringEvent::TerritoryStatisticsChanged);
    }

    /// State worth persisting
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            rules: self.rules,
            scoring_enabled: self.is_enabled(),
            score: self.score.clone(),
            epoch: self.epoch,
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// Queries that were outstanding when the snapshot was taken are not
    /// resumed; the restored session is idle and discards their answers.
    pub fn restore(snapshot: SessionSnapshot) -> Self {
        let mut session = Self::new(snapshot.rules);
        session.epoch = snapshot.epoch + 1;
        session.score = snapshot.score;
        session.state = if snapshot.scoring_enabled {
            ScoringState::Idle
        } else {
            ScoringState::Disabled
        };
        session.sync_flags();
        session
    }

    fn require_idle(&self) -> Result<(), SessionError> {
        match self.state {
            ScoringState::Idle => Ok(()),
            ScoringState::Disabled => Err(SessionError::NotEnabled),
            ScoringState::InProgress { .. } => Err(SessionError::CalculationInProgress),
        }
    }

    fn start_pass(&mut self, asking_engine: bool) {
        self.state = ScoringState::InProgress { asking_engine };
        self.sync_flags();
        self.emit(ScoringEvent::CalculationStarts);
    }

    /// Classification completes before the calculator reads anything
    fn run_pass(&mut self, game: &mut Game) {
        classifier::classify(game.board_mut());
        self.score.calculate(game, &self.rules);
    }

    fn finish_pass(&mut self) {
        self.state = ScoringState::Idle;
        self.sync_flags();
        tracing::info!(result = %self.score.result, "score calculated");
        self.emit(ScoringEvent::CalculationEnds);
    }

    fn sync_flags(&mut self) {
        self.score.scoring_enabled = self.is_enabled();
        self.score.calculation_in_progress = matches!(self.state, ScoringState::InProgress { .. });
        self.score.asking_engine_for_dead_stones = matches!(
            self.state,
            ScoringState::InProgress {
                asking_engine: true
            }
        );
    }

    fn emit(&mut self, event: ScoringEvent) {
        // Subscribers that went away are dropped
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::scoring::GameResult;
    use crate::Color;

    fn game(diagram: &str) -> Game {
        Game::from_position(Board::from_diagram(diagram).unwrap(), Color::Black)
    }

    #[test]
    fn enable_calculate_disable() {
        let mut game = Game::new(crate::BoardSize::new(9).unwrap());
        let mut session = ScoreSession::new(ScoringRules::default());
        let events = session.subscribe();

        assert_eq!(session.calculate(&mut game).unwrap_err(), SessionError::NotEnabled);
        session.enable(&mut game).unwrap();
        assert_eq!(session.enable(&mut game), Err(SessionError::AlreadyEnabled));
        let score = session.calculate(&mut game).unwrap();
        assert!(matches!(score.result, GameResult::WhiteHasWon(_)));
        assert!(!score.calculation_in_progress);
        session.disable(&mut game);

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ScoringEvent::ScoringEnabled,
                ScoringEvent::CalculationStarts,
                ScoringEvent::CalculationEnds,
                ScoringEvent::ScoringDisabled,
            ]
        );
        assert!(!session.score().scoring_enabled);
    }

    #[test]
    fn toggle_needs_a_stone() {
        let mut game = game(
            "
            .......
            .......
            ..X....
            .......
            .......
            .......
            .......
            ",
        );
        let mut session = ScoreSession::new(ScoringRules::default());
        session.enable(&mut game).unwrap();
        let empty: Coord = "A1".parse().unwrap();
        assert_eq!(
            session.toggle_dead_stone_state_of_group(&mut game, empty),
            Err(SessionError::NoStoneAt(empty))
        );
        let stone: Coord = "C5".parse().unwrap();
        assert_eq!(
            session.toggle_dead_stone_state_of_group(&mut game, stone),
            Ok(StoneGroupState::Dead)
        );
        assert_eq!(session.score().dead_black, 1);
    }

    #[test]
    fn toggle_is_refused_while_engine_is_asked() {
        let mut game = game(
            "
            .......
            .......
            ..X....
            .......
            .......
            .......
            .......
            ",
        );
        let mut session = ScoreSession::new(ScoringRules::default());
        session.enable(&mut game).unwrap();
        let (ticket, request) = session.begin_dead_stone_query(&game).unwrap();
        assert_eq!(request.stones.len(), 1);
        assert!(session.score().asking_engine_for_dead_stones);
        assert_eq!(
            session.toggle_dead_stone_state_of_group(&mut game, "C5".parse().unwrap()),
            Err(SessionError::CalculationInProgress)
        );

        let outcome = session.complete_dead_stone_query(&mut game, ticket, Ok(vec!["C5".parse().unwrap()]));
        assert_eq!(outcome, QueryOutcome::Applied);
        assert_eq!(session.state(), ScoringState::Idle);
        assert_eq!(session.score().dead_black, 1);
    }

    #[test]
    fn restore_never_resumes_a_query() {
        let mut game = Game::new(crate::BoardSize::new(9).unwrap());
        let mut session = ScoreSession::new(ScoringRules::default());
        session.enable(&mut game).unwrap();
        let (ticket, _) = session.begin_dead_stone_query(&game).unwrap();

        let restored = ScoreSession::restore(session.snapshot());
        assert_eq!(restored.state(), ScoringState::Idle);
        assert!(!restored.is_query_outstanding());
        assert!(!restored.score().asking_engine_for_dead_stones);

        let mut restored = restored;
        assert_eq!(
            restored.complete_dead_stone_query(&mut game, ticket, Ok(Vec::new())),
            QueryOutcome::Discarded
        );
    }
}
