// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background engine bridge for dead-stone estimates.
//!
//! The estimator runs on its own thread. Requests and answers travel over
//! crossbeam channels and every answer carries the ticket of the request it
//! belongs to, so the session can recognise answers that arrive too late.

use crate::board::{Board, BoardSize};
use crate::scoring::HalfPoints;
use crate::{Color, Coord};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Identifies one dead-stone query of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryTicket {
    pub(crate) epoch: u64,
}

impl QueryTicket {
    /// Session epoch the query was started in
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Position sent to the engine: the stones on the board and the komi
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadStoneRequest {
    pub size: BoardSize,
    pub komi: HalfPoints,
    /// Every stone on the board
    pub stones: Vec<(Color, Coord)>,
}

impl DeadStoneRequest {
    /// Capture the stones of `board`
    pub fn from_board(board: &Board, komi: HalfPoints) -> Self {
        let stones = board
            .points()
            .iter()
            .filter_map(|p| p.stone().map(|color| (color, p.coord())))
            .collect();
        Self {
            size: board.board_size(),
            komi,
            stones,
        }
    }
}

/// Something that can tell which stones are dead
pub trait DeadStoneEstimator: Send {
    /// Estimate the dead stones of a position
    fn estimate_dead_stones(&mut self, request: &DeadStoneRequest) -> anyhow::Result<Vec<Coord>>;
}

impl<F> DeadStoneEstimator for F
where
    F: FnMut(&DeadStoneRequest) -> anyhow::Result<Vec<Coord>> + Send,
{
    fn estimate_dead_stones(&mut self, request: &DeadStoneRequest) -> anyhow::Result<Vec<Coord>> {
        self(request)
    }
}

/// Answer of the engine thread. Engine failures are carried as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadStoneResponse {
    pub ticket: QueryTicket,
    pub result: Result<Vec<Coord>, String>,
}

/// Errors of the bridge itself
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine thread has stopped")]
    Disconnected,
    #[error("no answer from engine within {0:?}")]
    Timeout(Duration),
    #[error("failed to start engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Owns the engine thread and both ends of its channels
pub struct EngineBridge {
    requests: Option<Sender<(QueryTicket, DeadStoneRequest)>>,
    responses: Receiver<DeadStoneResponse>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EngineBridge {
    /// Spawn the engine thread
    pub fn spawn<E>(estimator: E) -> Result<Self, EngineError>
    where
        E: DeadStoneEstimator + 'static,
    {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (response_tx, response_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("goscore-engine".into())
            .spawn(move || run_engine(estimator, request_rx, response_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request
    pub fn submit(&self, ticket: QueryTicket, request: DeadStoneRequest) -> Result<(), EngineError> {
        let requests = self.requests.as_ref().ok_or(EngineError::Disconnected)?;
        requests
            .send((ticket, request))
            .map_err(|_| EngineError::Disconnected)
    }

    /// Next answer if one is ready
    pub fn try_recv(&self) -> Option<DeadStoneResponse> {
        self.responses.try_recv().ok()
    }

    /// Wait up to `timeout` for the next answer
    pub fn recv_timeout(&self, timeout: Duration) -> Result<DeadStoneResponse, EngineError> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }

    /// Receiving end, for callers that `select!` over several channels
    pub fn responses(&self) -> &Receiver<DeadStoneResponse> {
        &self.responses
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop once the
        // estimate in progress, if any, returns. A busy thread is detached.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                tracing::debug!("detaching busy engine thread");
                return;
            }
            if handle.join().is_err() {
                tracing::error!("engine thread panicked");
            }
        }
    }
}

fn run_engine<E: DeadStoneEstimator>(
    mut estimator: E,
    requests: Receiver<(QueryTicket, DeadStoneRequest)>,
    responses: Sender<DeadStoneResponse>,
) {
    tracing::debug!("engine thread started");
    for (ticket, request) in requests.iter() {
        tracing::debug!(epoch = ticket.epoch, stones = request.stones.len(), "estimating dead stones");
        let result = estimator
            .estimate_dead_stones(&request)
            .map_err(|e| format!("{e:#}"));
        if let Err(message) = &result {
            tracing::warn!(epoch = ticket.epoch, %message, "engine failed to estimate dead stones");
        }
        if responses.send(DeadStoneResponse { ticket, result }).is_err() {
            break;
        }
    }
    tracing::debug!("engine thread stopped");
}
