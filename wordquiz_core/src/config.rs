//! Quiz configuration loaded from TOML.
//!
//! Every key is optional; missing keys (or a missing file) fall back to the
//! defaults the game ships with.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{QuizError, Result};

/// Bucket shared by every instance of the game.
pub const DEFAULT_LEADERBOARD_URL: &str = "https://kvdb.io/6n5m5m9zN2wKxS3hH2x9x/KIDS_QUIZ_GLOBAL_V1";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct QuizConfig {
    pub quiz: StandardConfig,
    pub challenge: ChallengeConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandardConfig {
    pub total_questions: usize,
    /// Below this many exact-level words the pool is widened to adjacent levels.
    pub min_pool_size: usize,
    pub feedback_delay: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeConfig {
    pub hearts: u8,
    pub initial_batch: usize,
    /// Buffered questions kept at or beyond the current one.
    pub lookahead: usize,
    pub chance_min_hearts: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardConfig {
    pub url: String,
    pub capacity: usize,
    pub max_name_chars: usize,
    pub timeout: Duration,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    quiz: TomlQuiz,
    #[serde(default)]
    challenge: TomlChallenge,
    #[serde(default)]
    leaderboard: TomlLeaderboard,
}

#[derive(Deserialize, Debug)]
struct TomlQuiz {
    #[serde(default = "default_total_questions")]
    total_questions: usize,
    #[serde(default = "default_min_pool_size")]
    min_pool_size: usize,
    #[serde(default = "default_feedback_delay_ms")]
    feedback_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlChallenge {
    #[serde(default = "default_hearts")]
    hearts: u8,
    #[serde(default = "default_initial_batch")]
    initial_batch: usize,
    #[serde(default = "default_lookahead")]
    lookahead: usize,
    #[serde(default = "default_chance_min_hearts")]
    chance_min_hearts: u8,
}

#[derive(Deserialize, Debug)]
struct TomlLeaderboard {
    #[serde(default = "default_url")]
    url: String,
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default = "default_max_name_chars")]
    max_name_chars: usize,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

// ── Defaults ──

fn default_total_questions() -> usize { 10 }
fn default_min_pool_size() -> usize { 15 }
fn default_feedback_delay_ms() -> u64 { 1200 }
fn default_hearts() -> u8 { 3 }
fn default_initial_batch() -> usize { 5 }
fn default_lookahead() -> usize { 3 }
fn default_chance_min_hearts() -> u8 { 2 }
fn default_url() -> String { DEFAULT_LEADERBOARD_URL.into() }
fn default_capacity() -> usize { 5 }
fn default_max_name_chars() -> usize { 10 }
fn default_timeout_ms() -> u64 { 5000 }

impl Default for TomlQuiz {
    fn default() -> Self {
        TomlQuiz {
            total_questions: default_total_questions(),
            min_pool_size: default_min_pool_size(),
            feedback_delay_ms: default_feedback_delay_ms(),
        }
    }
}

impl Default for TomlChallenge {
    fn default() -> Self {
        TomlChallenge {
            hearts: default_hearts(),
            initial_batch: default_initial_batch(),
            lookahead: default_lookahead(),
            chance_min_hearts: default_chance_min_hearts(),
        }
    }
}

impl Default for TomlLeaderboard {
    fn default() -> Self {
        TomlLeaderboard {
            url: default_url(),
            capacity: default_capacity(),
            max_name_chars: default_max_name_chars(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl From<TomlConfig> for QuizConfig {
    fn from(cfg: TomlConfig) -> Self {
        QuizConfig {
            quiz: StandardConfig {
                total_questions: cfg.quiz.total_questions.max(1),
                min_pool_size: cfg.quiz.min_pool_size,
                feedback_delay: Duration::from_millis(cfg.quiz.feedback_delay_ms),
            },
            challenge: ChallengeConfig {
                hearts: cfg.challenge.hearts.max(1),
                initial_batch: cfg.challenge.initial_batch.max(1),
                lookahead: cfg.challenge.lookahead.max(1),
                chance_min_hearts: cfg.challenge.chance_min_hearts,
            },
            leaderboard: LeaderboardConfig {
                url: cfg.leaderboard.url,
                capacity: cfg.leaderboard.capacity.max(1),
                max_name_chars: cfg.leaderboard.max_name_chars.max(1),
                timeout: Duration::from_millis(cfg.leaderboard.timeout_ms),
            },
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl QuizConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(cfg.into())
    }

    /// Load config from a file. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings a session cannot run with. Values built from TOML are
    /// already clamped; this catches configs assembled in code.
    pub fn validate(&self, challenge: bool) -> Result<()> {
        if challenge {
            if self.challenge.hearts == 0 {
                return Err(QuizError::InvalidConfig("challenge.hearts must be at least 1"));
            }
            if self.challenge.initial_batch == 0 {
                return Err(QuizError::InvalidConfig("challenge.initial_batch must be at least 1"));
            }
            if self.challenge.lookahead == 0 {
                return Err(QuizError::InvalidConfig("challenge.lookahead must be at least 1"));
            }
        } else if self.quiz.total_questions == 0 {
            return Err(QuizError::InvalidConfig("quiz.total_questions must be at least 1"));
        }
        Ok(())
    }
}
