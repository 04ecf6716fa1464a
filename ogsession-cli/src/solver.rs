//! Interactive challenge solver.

use async_trait::async_trait;
use ogsession_core::{ChallengeSolver, SessionError};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Writes the challenge images to disk and reads the answer from stdin.
pub struct StdinSolver {
    dir: PathBuf,
}

impl StdinSolver {
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }
}

impl Default for StdinSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeSolver for StdinSolver {
    async fn solve(
        &self,
        question: &[u8],
        icons: &[u8],
        cancel: &CancellationToken,
    ) -> Result<i64, SessionError> {
        let question_path = self.dir.join("ogsession-challenge-question.png");
        let icons_path = self.dir.join("ogsession-challenge-icons.png");
        for (path, bytes) in [(&question_path, question), (&icons_path, icons)] {
            tokio::fs::write(path, bytes).await.map_err(|e| {
                SessionError::Config(format!("cannot write {}: {e}", path.display()))
            })?;
        }

        eprintln!("The lobby asks for a challenge.");
        eprintln!("  Question: {}", question_path.display());
        eprintln!("  Icons:    {}", icons_path.display());
        eprint!("Which icon matches (0-3)? ");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.map_err(|e| SessionError::Config(e.to_string()))?,
                () = cancel.cancelled() => return Err(SessionError::Cancelled),
            };
            let Some(line) = line else {
                return Err(SessionError::Cancelled);
            };
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => eprint!("Enter 0, 1, 2 or 3: "),
            }
        }
    }
}

fn parse_answer(input: &str) -> Option<i64> {
    let answer = input.trim().parse::<i64>().ok()?;
    (0..=3).contains(&answer).then_some(answer)
}
