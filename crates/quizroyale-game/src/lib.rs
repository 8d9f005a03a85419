//! Game rules for Quizroyale.
//!
//! Everything here is plain data and pure functions: no tasks, no
//! channels. The client actor owns one [`PlayerState`] and drives it; the
//! lobby only relays opponent-targeted [`Powerup`]s.
//!
//! # Key types
//!
//! - [`QuestionGenerator`]: difficulty level → question text and answer
//! - [`PowerupCatalog`]: power-up ids and their coin costs
//! - [`PlayerState`]: score, coins, multipliers, difficulty and streak
//! - [`GameConfig`]: tunable scoring constants and effect magnitudes

mod config;
mod error;
mod level;
mod player;
mod powerup;
mod question;

pub use config::GameConfig;
pub use error::GameError;
pub use level::{Difficulty, Multiplier};
pub use player::{Affliction, Award, PlayerState, Purchase, Submission};
pub use powerup::{Powerup, PowerupCatalog};
pub use question::{Question, QuestionGenerator};
