//! Flat text persistence for a game in progress.
//!
//! The format is the classic console one: the 16 board values in row-major
//! order, each followed by a comma, then the score with no trailing comma.
//! `2,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0` is a lone 2-tile in the top-left
//! corner with score 0. Parsing takes the first 16 fields as the board and
//! the last field as the score.

use std::fs;
use std::io;
use std::path::Path;

use crate::engine::{Board, MAX_TILE};

/// Fields in a well-formed save: 16 cells plus the score.
const TOKEN_COUNT: usize = 17;

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("expected 17 comma-separated fields, found {found}")]
    TokenCount { found: usize },
    #[error("field {index} is not an integer: {token:?}")]
    BadInteger { index: usize, token: String },
    #[error("{0} is not a playable tile value")]
    BadTile(u32),
}

/// Render a board and score in the save-file format.
pub fn encode(board: Board, score: u64) -> String {
    let mut out = String::new();
    for value in board.to_values() {
        out.push_str(&value.to_string());
        out.push(',');
    }
    out.push_str(&score.to_string());
    out
}

/// Parse save-file text back into a board and score.
pub fn parse(text: &str) -> Result<(Board, u64), SaveError> {
    let tokens: Vec<&str> = text.trim_end().split(',').collect();
    if tokens.len() < TOKEN_COUNT {
        return Err(SaveError::TokenCount {
            found: tokens.len(),
        });
    }

    let mut values = [0u32; 16];
    for (index, slot) in values.iter_mut().enumerate() {
        let token = tokens[index].trim();
        let value: u32 = token.parse().map_err(|_| SaveError::BadInteger {
            index,
            token: token.to_string(),
        })?;
        if value != 0 && !(value.is_power_of_two() && (2..=MAX_TILE).contains(&value)) {
            return Err(SaveError::BadTile(value));
        }
        *slot = value;
    }

    let last = tokens.len() - 1;
    let token = tokens[last].trim();
    let score: u64 = token.parse().map_err(|_| SaveError::BadInteger {
        index: last,
        token: token.to_string(),
    })?;

    Ok((Board::from_values(values), score))
}

pub fn save_to_path<P: AsRef<Path>>(path: P, board: Board, score: u64) -> Result<(), SaveError> {
    fs::write(path, encode(board, score))?;
    Ok(())
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<(Board, u64), SaveError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}
