//! One interactive game: board + score ownership and per-turn sequencing.
//!
//! Each turn runs slide -> move-availability check -> spawn. The spawn step
//! is taken even when the slide changed nothing, faithful to the classic
//! console game; `SpawnPolicy::IfChanged` is the explicit opt-out.

use log::debug;
use rand::Rng;

use crate::engine::{Board, Move};

/// Whether a turn spawns a tile after a slide that changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnPolicy {
    /// Spawn after every directional input, as the classic console game does.
    #[default]
    Always,
    /// Spawn only when the slide actually moved or merged something.
    IfChanged,
}

/// Result of playing one directional input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    board: Board,
    score: u64,
    spawn_policy: SpawnPolicy,
}

impl Game {
    /// Fresh game: empty board, score 0, two starting tiles.
    pub fn new<R: Rng + ?Sized>(spawn_policy: SpawnPolicy, rng: &mut R) -> Self {
        Self::resume(Board::EMPTY, 0, spawn_policy, rng)
    }

    /// Restore a session from persisted state. A completely empty board
    /// (fresh game, or a save written before the first spawn) is seeded
    /// with two starting tiles; anything else is kept verbatim.
    pub fn resume<R: Rng + ?Sized>(
        board: Board,
        score: u64,
        spawn_policy: SpawnPolicy,
        rng: &mut R,
    ) -> Self {
        let mut game = Game {
            board,
            score,
            spawn_policy,
        };
        if game.board == Board::EMPTY {
            for _ in 0..2 {
                if let Some(seeded) = game.board.try_spawn(rng) {
                    game.board = seeded;
                }
            }
        }
        game
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Play one directional input: slide and merge, then check whether any
    /// move remains, then spawn. Game over is reported before the spawn, so
    /// a finished board is returned exactly as the last slide left it.
    pub fn turn<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> TurnOutcome {
        let (moved, points) = self.board.shift(dir);
        let changed = moved != self.board;
        self.board = moved;
        self.score += points;

        if !self.board.has_any_move() {
            debug!("no moves remain, final score {}", self.score);
            return TurnOutcome::GameOver;
        }

        let wants_spawn = match self.spawn_policy {
            SpawnPolicy::Always => true,
            SpawnPolicy::IfChanged => changed,
        };
        if wants_spawn {
            if let Some(spawned) = self.board.try_spawn(rng) {
                self.board = spawned;
            }
        }
        TurnOutcome::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn a_new_game_starts_with_two_small_tiles_and_zero_score() {
        let mut rng = StdRng::seed_from_u64(11);
        let game = Game::new(SpawnPolicy::Always, &mut rng);
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().count_empty(), 14);
        assert!(game
            .board()
            .to_values()
            .iter()
            .all(|&v| v == 0 || v == 2 || v == 4));
    }

    #[test]
    fn resume_keeps_a_non_empty_board_verbatim() {
        let board =
            Board::from_values([2, 0, 0, 0, 0, 8, 0, 0, 0, 0, 32, 0, 0, 0, 0, 4]);
        let mut rng = StdRng::seed_from_u64(4);
        let game = Game::resume(board, 36, SpawnPolicy::Always, &mut rng);
        assert_eq!(game.board(), board);
        assert_eq!(game.score(), 36);
    }

    #[test]
    fn resume_seeds_an_empty_board_but_keeps_the_score() {
        let mut rng = StdRng::seed_from_u64(4);
        let game = Game::resume(Board::EMPTY, 20, SpawnPolicy::Always, &mut rng);
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.score(), 20);
    }

    #[test]
    fn a_merge_adds_the_new_tile_value_to_the_score() {
        let board =
            Board::from_values([0, 2, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Game::resume(board, 0, SpawnPolicy::Always, &mut rng);
        assert_eq!(game.turn(Move::Left, &mut rng), TurnOutcome::Playing);
        assert_eq!(game.score(), 4);
        assert_eq!(game.board().get(0, 0), 4);
        // the merged tile plus the one spawned for the next turn
        assert_eq!(game.board().count_empty(), 14);
    }

    #[test]
    fn game_over_is_reported_before_any_spawn() {
        // full board, no adjacent equal pair: any slide is a no-op and the
        // availability check fails immediately after it
        let stuck =
            Board::from_values([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = Game::resume(stuck, 100, SpawnPolicy::Always, &mut rng);
        assert_eq!(game.turn(Move::Left, &mut rng), TurnOutcome::GameOver);
        assert_eq!(game.score(), 100);
        assert_eq!(game.board(), stuck);
    }

    #[test]
    fn always_policy_spawns_even_when_nothing_moved() {
        // a lone tile in the top-left corner cannot slide further left
        let board =
            Board::from_values([2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::resume(board, 0, SpawnPolicy::Always, &mut rng);
        assert_eq!(game.turn(Move::Left, &mut rng), TurnOutcome::Playing);
        assert_eq!(game.board().count_empty(), 14);
    }

    #[test]
    fn if_changed_policy_skips_the_spawn_on_a_no_op_move() {
        let board =
            Board::from_values([2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::resume(board, 0, SpawnPolicy::IfChanged, &mut rng);

        assert_eq!(game.turn(Move::Left, &mut rng), TurnOutcome::Playing);
        assert_eq!(game.board().count_empty(), 15, "no-op move, no spawn");

        assert_eq!(game.turn(Move::Right, &mut rng), TurnOutcome::Playing);
        assert_eq!(game.board().count_empty(), 14, "real move, one spawn");
    }
}
