//! cli-2048: the classic 4x4 sliding-tile game for the terminal.
//!
//! This crate provides:
//! - A compact packed `Board` with slide/merge ops and tile spawning (`engine` module)
//! - A `Game` session owning board + score and sequencing each turn (`game` module)
//! - The flat comma-separated save-file format (`save` module)
//!
//! Quick start:
//! ```
//! use cli_2048::engine::Move;
//! use cli_2048::game::{Game, SpawnPolicy, TurnOutcome};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic session with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(SpawnPolicy::Always, &mut rng);
//! assert_eq!(game.board().count_empty(), 14);
//!
//! if game.turn(Move::Left, &mut rng) == TurnOutcome::Playing {
//!     assert!(game.board().count_empty() >= 13);
//! }
//! ```
//!
//! Note: all randomness is injected as `&mut impl rand::Rng`; the interactive
//! binary passes `rand::thread_rng()`, tests pass a seeded `StdRng`.

pub mod engine;
pub mod game;
pub mod save;
