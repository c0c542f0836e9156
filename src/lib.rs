//! twenty48: the board simulation engine behind a 2048 sliding-tile game
//!
//! This crate provides:
//! - A `Game` engine with ergonomic methods (`apply_move`, `can_move`,
//!   `is_game_over`, `snapshot`, ...) over an N x N grid of numbered tiles
//! - The saved-game snapshot codec (`serialization` module), byte-compatible
//!   with the flat record list existing saves use
//!
//! Quick start:
//! ```
//! use twenty48::engine::{Game, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic game with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(&mut rng);
//! assert_eq!(game.count_empty(), 14);
//!
//! let result = game.apply_move(Move::Left, &mut rng);
//! // A changed move spawns exactly one tile; a no-op spawns none.
//! assert_eq!(result.changed, result.spawned.is_some());
//! ```
//!
//! Note: `apply_move_thread` mirrors `apply_move` with the thread-local RNG.
//! Prefer the explicit-RNG methods when you need determinism.
//!
pub mod engine;
pub mod serialization;
