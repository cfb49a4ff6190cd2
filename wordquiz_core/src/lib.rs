//! Word Quiz Core - vocabulary quiz engine
//!
//! Provides the word catalog, multiple-choice question generation, the quiz
//! session state machine (standard and heart-based challenge modes), the
//! screen flow, and a best-effort global leaderboard.

mod builtin_words;
pub mod catalog;
pub mod config;
pub mod cues;
pub mod error;
pub mod flow;
pub mod leaderboard;
pub mod questions;
pub mod session;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use catalog::{Catalog, Word};
pub use config::QuizConfig;
pub use cues::{shared_cues, FeedbackCues, SilentCues};
pub use error::{QuizError, Result};
pub use flow::{GameFlow, GameState, ResultPhase, ResultSummary, ResultTier, Screen};
pub use leaderboard::{
    HttpStore, Leaderboard, LeaderboardEntry, LeaderboardError, LeaderboardStore, MemoryStore, PlayerName,
    Standings,
};
pub use questions::{GameMode, Question, QuestionPool, QuizLevel, CHALLENGE_LEVEL_ID};
pub use session::{AnswerOutcome, Phase, QuizSession, Transition, Verdict};

/// Word Quiz Core Python Module
#[cfg(feature = "python")]
#[pymodule]
fn wordquiz_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Question generation
    m.add_function(wrap_pyfunction!(questions::py_generate_question, m)?)?;

    // Register classes
    m.add_class::<catalog::Word>()?;
    m.add_class::<questions::Question>()?;
    m.add_class::<questions::GameMode>()?;
    m.add_class::<leaderboard::LeaderboardEntry>()?;
    m.add_class::<flow::py::PyGameFlow>()?;

    m.add("CHALLENGE_LEVEL_ID", CHALLENGE_LEVEL_ID)?;

    Ok(())
}
