//! MCQ question generation for the vocabulary quiz

use std::collections::HashSet;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{Catalog, Word};
use crate::error::{QuizError, Result};

/// Options shown per question, target included.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Level id the front-end uses for challenge mode.
pub const CHALLENGE_LEVEL_ID: u8 = 99;

/// Translation direction of a quiz.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Show English, choose Korean
    EngToKor,
    /// Show Korean, choose English
    KorToEng,
}

/// Difficulty selection: a fixed level, or the endless challenge over every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizLevel {
    Standard(u8),
    Challenge,
}

impl QuizLevel {
    pub fn from_id(id: u8) -> Self {
        if id == CHALLENGE_LEVEL_ID {
            QuizLevel::Challenge
        } else {
            QuizLevel::Standard(id)
        }
    }

    pub fn id(self) -> u8 {
        match self {
            QuizLevel::Standard(level) => level,
            QuizLevel::Challenge => CHALLENGE_LEVEL_ID,
        }
    }

    pub fn is_challenge(self) -> bool {
        matches!(self, QuizLevel::Challenge)
    }
}

/// One multiple-choice question: the target plus three distractors, shuffled.
#[cfg_attr(feature = "python", pyclass(frozen))]
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub target: Word,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub options: Vec<Word>,
}

impl Question {
    pub fn is_correct(&self, word_id: &str) -> bool {
        self.target.eng == word_id
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|w| w.eng == self.target.eng)
    }

    /// Text shown as the question for the given direction.
    pub fn prompt(&self, mode: GameMode) -> &str {
        match mode {
            GameMode::EngToKor => &self.target.eng,
            GameMode::KorToEng => &self.target.kor,
        }
    }

    /// Text shown on an answer button for the given direction.
    pub fn option_text(mode: GameMode, option: &Word) -> &str {
        match mode {
            GameMode::EngToKor => &option.kor,
            GameMode::KorToEng => &option.eng,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Question {
    #[pyo3(name = "prompt")]
    fn py_prompt(&self, mode: GameMode) -> String {
        self.prompt(mode).to_string()
    }

    #[pyo3(name = "option_texts")]
    fn py_option_texts(&self, mode: GameMode) -> Vec<String> {
        self.options.iter().map(|w| Question::option_text(mode, w).to_string()).collect()
    }

    fn __repr__(&self) -> String {
        format!("Question(target='{}', options={})", self.target.eng, self.options.len())
    }
}

/// Candidate words for one quiz: the target level, widened when it is too small.
#[derive(Debug, Clone)]
pub struct QuestionPool {
    level: QuizLevel,
    words: Vec<Word>,
}

impl QuestionPool {
    /// Select the pool for a level.
    ///
    /// Challenge mode draws from the whole catalog. A standard level with
    /// fewer than `min_pool_size` words is joined by the levels exactly one
    /// step above and below. A pool still too small to yield three
    /// distractors falls back to the whole catalog.
    pub fn for_level(catalog: &Catalog, level: QuizLevel, min_pool_size: usize) -> Result<Self> {
        if catalog.len() < OPTIONS_PER_QUESTION {
            return Err(QuizError::NotEnoughWords {
                available: catalog.len(),
                needed: OPTIONS_PER_QUESTION,
            });
        }

        let words: Vec<Word> = match level {
            QuizLevel::Challenge => catalog.words().to_vec(),
            QuizLevel::Standard(target) => {
                let mut words: Vec<Word> = catalog.at_level(target).cloned().collect();
                if words.is_empty() {
                    return Err(QuizError::UnknownLevel(target));
                }
                if words.len() < min_pool_size {
                    words.extend(
                        catalog
                            .words()
                            .iter()
                            .filter(|w| w.level.abs_diff(target) == 1)
                            .cloned(),
                    );
                    log::debug!("Level {target} widened to {} words", words.len());
                }
                if words.len() < OPTIONS_PER_QUESTION {
                    log::warn!(
                        "Level {target} has only {} words after widening, using the whole catalog",
                        words.len()
                    );
                    words = catalog.words().to_vec();
                }
                words
            }
        };

        Ok(QuestionPool { level, words })
    }

    pub fn level(&self) -> QuizLevel {
        self.level
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Generate one question, avoiding targets in `recently_used`.
    ///
    /// When every word in the pool has been used the set is cleared and the
    /// whole pool becomes eligible again. The chosen target is recorded.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        recently_used: &mut HashSet<String>,
        rng: &mut R,
    ) -> Result<Question> {
        let candidates: Vec<&Word> = self
            .words
            .iter()
            .filter(|w| !recently_used.contains(&w.eng))
            .collect();

        let target = if candidates.is_empty() {
            log::debug!("All {} words used, resetting repetition tracking", self.words.len());
            recently_used.clear();
            self.words.choose(rng)
        } else {
            candidates.choose(rng).copied()
        }
        .ok_or(QuizError::NotEnoughWords { available: 0, needed: OPTIONS_PER_QUESTION })?;

        recently_used.insert(target.eng.clone());
        self.assemble(target, rng)
    }

    /// Generate a fixed-length quiz with distinct targets sampled without
    /// replacement. If the pool holds fewer words than `count`, the remainder
    /// is filled by [`QuestionPool::generate`].
    pub fn generate_batch<R: Rng + ?Sized>(
        &self,
        count: usize,
        recently_used: &mut HashSet<String>,
        rng: &mut R,
    ) -> Result<Vec<Question>> {
        let mut questions = Vec::with_capacity(count);

        let targets: Vec<&Word> = self.words.choose_multiple(rng, count.min(self.words.len())).collect();
        for target in targets {
            recently_used.insert(target.eng.clone());
            questions.push(self.assemble(target, rng)?);
        }

        while questions.len() < count {
            questions.push(self.generate(recently_used, rng)?);
        }

        Ok(questions)
    }

    fn assemble<R: Rng + ?Sized>(&self, target: &Word, rng: &mut R) -> Result<Question> {
        let others: Vec<&Word> = self.words.iter().filter(|w| w.eng != target.eng).collect();

        let mut options: Vec<Word> = others
            .choose_multiple(rng, OPTIONS_PER_QUESTION - 1)
            .map(|w| (*w).clone())
            .collect();

        if options.len() < OPTIONS_PER_QUESTION - 1 {
            return Err(QuizError::NotEnoughWords {
                available: others.len() + 1,
                needed: OPTIONS_PER_QUESTION,
            });
        }

        options.push(target.clone());
        options.shuffle(rng);

        Ok(Question { target: target.clone(), options })
    }
}


// ============= Python Binding =============

/// One standalone question for `level` (99 for challenge), from the built-in
/// catalog or a CSV file.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "generate_question", signature = (level, catalog_csv=None))]
pub fn py_generate_question(level: u8, catalog_csv: Option<&str>) -> PyResult<Question> {
    let catalog = match catalog_csv {
        Some(path) => std::sync::Arc::new(Catalog::from_csv_path(path)?),
        None => Catalog::builtin(),
    };
    let min_pool_size = crate::config::QuizConfig::default().quiz.min_pool_size;
    let pool = QuestionPool::for_level(&catalog, QuizLevel::from_id(level), min_pool_size)?;
    Ok(pool.generate(&mut HashSet::new(), &mut rand::thread_rng())?)
}
