// SPDX-License-Identifier: MIT OR Apache-2.0

//! Go Text Protocol (GTP) controller side.
//!
//! Talks GTP version 2 to an external engine to obtain dead-stone
//! estimates. Commands are numbered; every response starts with `=` (success)
//! or `?` (failure), optionally followed by the command id, and ends with an
//! empty line.
//!
//! ## Commands used
//!
//! - `boardsize <size>`
//! - `clear_board`
//! - `komi <value>`
//! - `play <color> <vertex>`
//! - `final_status_list dead`
//! - `quit`

use crate::engine::{DeadStoneEstimator, DeadStoneRequest};
use crate::Coord;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Errors talking to a GTP engine
#[derive(Debug, Error)]
pub enum GtpError {
    #[error("GTP I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("engine closed the connection")]
    Closed,
    #[error("malformed GTP response: {0:?}")]
    Malformed(String),
    #[error("engine rejected `{command}`: {message}")]
    Failure { command: String, message: String },
}

/// Controller end of a GTP connection
pub struct GtpClient<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    next_id: u32,
    /// Engine process, when the client started it
    child: Option<Child>,
}

impl<R: BufRead, W: Write> GtpClient<R, W> {
    /// Speak GTP over an existing pair of streams
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
            child: None,
        }
    }

    /// Send one command and return the text of the success response
    pub fn send(&mut self, command: &str) -> Result<String, GtpError> {
        let id = self.next_id;
        self.next_id += 1;

        tracing::trace!(id, command, "gtp >");
        writeln!(self.writer, "{id} {command}")?;
        self.writer.flush()?;

        let (success, message) = self.read_response()?;
        tracing::trace!(id, success, %message, "gtp <");
        if success {
            Ok(message)
        } else {
            Err(GtpError::Failure {
                command: command.to_string(),
                message,
            })
        }
    }

    /// Read one response: a status line plus continuation lines up to the
    /// terminating empty line.
    fn read_response(&mut self) -> Result<(bool, String), GtpError> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                if lines.is_empty() {
                    return Err(GtpError::Closed);
                }
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                // Blank lines before the status line are noise
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            lines.push(line.to_string());
        }

        let first = &lines[0];
        let success = match first.chars().next() {
            Some('=') => true,
            Some('?') => false,
            _ => return Err(GtpError::Malformed(first.clone())),
        };
        // Drop the status character and the optional command id
        let text = first[1..].trim_start_matches(|c: char| c.is_ascii_digit());
        let mut message = text.trim().to_string();
        for extra in &lines[1..] {
            message.push('\n');
            message.push_str(extra.trim());
        }
        Ok((success, message))
    }
}

impl GtpClient<BufReader<ChildStdout>, ChildStdin> {
    /// Start an engine program and connect to its stdin/stdout
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, GtpError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take().ok_or(GtpError::Closed)?;
        let stdout = child.stdout.take().ok_or(GtpError::Closed)?;
        tracing::info!(program, "started GTP engine");

        let mut client = Self::new(BufReader::new(stdout), stdin);
        client.child = Some(child);
        Ok(client)
    }
}

impl<R: BufRead, W: Write> Drop for GtpClient<R, W> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = self.send("quit") {
                tracing::debug!("engine did not acknowledge quit: {}", e);
            }
            if let Err(e) = child.wait() {
                tracing::warn!("failed to reap engine process: {}", e);
            }
        }
    }
}

/// Parse the vertex list of `final_status_list`
pub fn parse_vertex_list(text: &str) -> Result<Vec<Coord>, GtpError> {
    text.split_whitespace()
        .map(|vertex| {
            vertex
                .parse::<Coord>()
                .map_err(|_| GtpError::Malformed(vertex.to_string()))
        })
        .collect()
}

impl<R, W> DeadStoneEstimator for GtpClient<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn estimate_dead_stones(&mut self, request: &DeadStoneRequest) -> anyhow::Result<Vec<Coord>> {
        self.send(&format!("boardsize {}", request.size.get()))?;
        self.send("clear_board")?;
        self.send(&format!("komi {}", request.komi))?;
        for (color, coord) in &request.stones {
            self.send(&format!("play {} {}", color.gtp_letter(), coord))?;
        }
        let dead = self.send("final_status_list dead")?;
        let dead = parse_vertex_list(&dead)?;
        tracing::debug!(count = dead.len(), "engine listed dead stones");
        Ok(dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSize;
    use crate::scoring::HalfPoints;
    use crate::Color;
    use std::io::Cursor;

    #[test]
    fn success_and_failure_responses() {
        let input = "=1 GNU Go\n\n?2 unknown command\n\n";
        let mut output = Vec::new();
        let mut client = GtpClient::new(Cursor::new(input.as_bytes()), &mut output);

        assert_eq!(client.send("name").unwrap(), "GNU Go");
        match client.send("frobnicate") {
            Err(GtpError::Failure { command, message }) => {
                assert_eq!(command, "frobnicate");
                assert_eq!(message, "unknown command");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(client.send("name"), Err(GtpError::Closed)));
        drop(client);
        assert!(String::from_utf8(output).unwrap().starts_with("1 name\n2 frobnicate\n"));
    }

    #[test]
    fn multi_line_response() {
        let input = "\n= C3 D4\nE5\n\n";
        let mut output = Vec::new();
        let mut client = GtpClient::new(Cursor::new(input.as_bytes()), &mut output);
        let text = client.send("final_status_list dead").unwrap();
        assert_eq!(parse_vertex_list(&text).unwrap().len(), 3);
    }

    #[test]
    fn dead_stone_estimate_sets_up_the_position() {
        let input = "=1\n\n=2\n\n=3\n\n=4\n\n=5\n\n=6 c3\n\n";
        let mut output = Vec::new();
        let mut client = GtpClient::new(Cursor::new(input.as_bytes()), &mut output);
        let request = DeadStoneRequest {
            size: BoardSize::new(9).unwrap(),
            komi: HalfPoints::from_halves(13),
            stones: vec![
                (Color::Black, Coord::new(2, 2)),
                (Color::White, Coord::new(3, 3)),
            ],
        };

        let dead = client.estimate_dead_stones(&request).unwrap();
        assert_eq!(dead, vec![Coord::new(2, 2)]);
        drop(client);

        let sent = String::from_utf8(output).unwrap();
        let commands: Vec<&str> = sent.lines().collect();
        assert_eq!(
            commands,
            vec![
                "1 boardsize 9",
                "2 clear_board",
                "3 komi 6.5",
                "4 play B C3",
                "5 play W D4",
                "6 final_status_list dead",
            ]
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let mut output = Vec::new();
        let mut client = GtpClient::new(Cursor::new("hello\n\n".as_bytes()), &mut output);
        assert!(matches!(client.send("name"), Err(GtpError::Malformed(_))));
        assert!(parse_vertex_list("C3 Z99").is_err());
    }
}
