//! Quiz session state machine.
//!
//! A session owns its question buffer, score, hearts and the one-time chance
//! token. Answers are accepted only while the session is `Active`; each
//! accepted answer moves it into a `Feedback` phase with a deadline, and
//! [`QuizSession::tick`] performs the pending transition once the deadline
//! has passed. Dropping the session discards any pending transition.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::{Catalog, Word};
use crate::config::QuizConfig;
use crate::cues::FeedbackCues;
use crate::error::Result;
use crate::questions::{GameMode, Question, QuestionPool, QuizLevel};

/// Points awarded per correct answer.
pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Feedback { verdict: Verdict, due: Instant },
    Terminated,
}

/// Result of an accepted answer, available before the feedback delay ends.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// The option the player picked; `None` for the chance/skip action.
    pub chosen: Option<Word>,
    pub target: Word,
    pub score: u32,
    pub hearts: Option<u8>,
}

/// What [`QuizSession::tick`] did once the feedback delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { index: usize },
    Finished { score: u32 },
}

pub struct QuizSession {
    mode: GameMode,
    pool: QuestionPool,
    config: QuizConfig,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    hearts: Option<u8>,
    chance_used: bool,
    used_words: HashSet<String>,
    selected: Option<Word>,
    phase: Phase,
    rng: StdRng,
    cues: Arc<dyn FeedbackCues>,
}

impl std::fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("level", &self.pool.level())
            .field("current_index", &self.current_index)
            .field("buffered", &self.questions.len())
            .field("score", &self.score)
            .field("hearts", &self.hearts)
            .field("chance_used", &self.chance_used)
            .field("phase", &self.phase)
            .finish()
    }
}

impl QuizSession {
    pub fn new(
        catalog: &Catalog,
        mode: GameMode,
        level: QuizLevel,
        config: &QuizConfig,
        cues: Arc<dyn FeedbackCues>,
    ) -> Result<Self> {
        Self::with_rng(catalog, mode, level, config, cues, StdRng::from_entropy())
    }

    /// Build a session with an explicit random source.
    pub fn with_rng(
        catalog: &Catalog,
        mode: GameMode,
        level: QuizLevel,
        config: &QuizConfig,
        cues: Arc<dyn FeedbackCues>,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate(level.is_challenge())?;
        let pool = QuestionPool::for_level(catalog, level, config.quiz.min_pool_size)?;
        let mut used_words = HashSet::new();

        let (questions, hearts) = if level.is_challenge() {
            let questions = (0..config.challenge.initial_batch)
                .map(|_| pool.generate(&mut used_words, &mut rng))
                .collect::<Result<Vec<_>>>()?;
            (questions, Some(config.challenge.hearts))
        } else {
            let questions = pool.generate_batch(config.quiz.total_questions, &mut used_words, &mut rng)?;
            (questions, None)
        };

        log::info!(
            "Quiz started: mode={mode:?} level={level:?} questions={} pool={}",
            questions.len(),
            pool.words().len()
        );

        let mut session = QuizSession {
            mode,
            pool,
            config: config.clone(),
            questions,
            current_index: 0,
            score: 0,
            hearts,
            chance_used: false,
            used_words,
            selected: None,
            phase: Phase::Active,
            rng,
            cues,
        };
        session.top_up()?;
        Ok(session)
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn level(&self) -> QuizLevel {
        self.pool.level()
    }

    pub fn is_challenge(&self) -> bool {
        self.level().is_challenge()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Remaining lives; `None` outside challenge mode.
    pub fn hearts(&self) -> Option<u8> {
        self.hearts
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    /// Option picked for the current question (the target after a chance).
    pub fn selected(&self) -> Option<&Word> {
        self.selected.as_ref()
    }

    pub fn feedback(&self) -> Option<Verdict> {
        match self.phase {
            Phase::Feedback { verdict, .. } => Some(verdict),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        !matches!(self.phase, Phase::Active)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }

    pub fn chance_used(&self) -> bool {
        self.chance_used
    }

    /// Whether the chance/skip action would be accepted right now.
    pub fn chance_available(&self) -> bool {
        let enough_hearts = self
            .hearts
            .map_or(true, |h| h >= self.config.challenge.chance_min_hearts);
        !self.chance_used && matches!(self.phase, Phase::Active) && enough_hearts
    }

    /// Fraction of the quiz completed, counting the current question.
    /// Always 1.0 in challenge mode.
    pub fn progress(&self) -> f64 {
        if self.is_challenge() {
            1.0
        } else {
            (self.current_index + 1) as f64 / self.questions.len() as f64
        }
    }

    /// Time left before the pending transition fires, if one is pending.
    pub fn time_until_transition(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::Feedback { due, .. } => Some(due.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Answer the current question with the option whose identifier is `word_id`.
    /// Returns `None` if the session is not accepting answers.
    pub fn submit_answer(&mut self, word_id: &str, now: Instant) -> Option<AnswerOutcome> {
        self.answer(Some(word_id), now)
    }

    /// Reveal the answer and count it as correct. Usable once per session,
    /// and in challenge mode only with enough hearts left.
    pub fn use_chance(&mut self, now: Instant) -> Option<AnswerOutcome> {
        if !self.chance_available() {
            log::debug!("Chance rejected: {:?}", self);
            return None;
        }
        self.chance_used = true;
        self.answer(None, now)
    }

    fn answer(&mut self, word_id: Option<&str>, now: Instant) -> Option<AnswerOutcome> {
        if self.phase != Phase::Active {
            return None;
        }

        let question = &self.questions[self.current_index];
        let target = question.target.clone();
        let chosen = word_id.and_then(|id| question.options.iter().find(|w| w.eng == id).cloned());
        let correct = word_id.map_or(true, |id| question.is_correct(id));

        self.selected = Some(chosen.clone().unwrap_or_else(|| target.clone()));

        let verdict = if correct {
            self.score += POINTS_PER_CORRECT;
            self.cues.play_correct();
            Verdict::Correct
        } else {
            self.cues.play_wrong();
            if let Some(hearts) = self.hearts.as_mut() {
                *hearts = hearts.saturating_sub(1);
            }
            Verdict::Wrong
        };

        log::debug!(
            "Question {} answered: {verdict:?} (score={}, hearts={:?})",
            self.current_index + 1,
            self.score,
            self.hearts
        );

        self.phase = Phase::Feedback { verdict, due: now + self.config.quiz.feedback_delay };

        Some(AnswerOutcome { correct, chosen, target, score: self.score, hearts: self.hearts })
    }

    /// Run the pending transition if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Result<Option<Transition>> {
        let Phase::Feedback { verdict, due } = self.phase else {
            return Ok(None);
        };
        if now < due {
            return Ok(None);
        }

        let game_over = match self.hearts {
            Some(hearts) => verdict == Verdict::Wrong && hearts == 0,
            None => self.current_index + 1 >= self.questions.len(),
        };

        if game_over {
            self.phase = Phase::Terminated;
            log::info!("Quiz finished with score {}", self.score);
            return Ok(Some(Transition::Finished { score: self.score }));
        }

        self.current_index += 1;
        self.selected = None;
        self.phase = Phase::Active;
        self.top_up()?;
        Ok(Some(Transition::Advanced { index: self.current_index }))
    }

    /// Keep the challenge buffer `lookahead` questions deep from the current one.
    fn top_up(&mut self) -> Result<()> {
        if !self.is_challenge() {
            return Ok(());
        }
        while self.questions.len() < self.current_index + self.config.challenge.lookahead {
            let question = self.pool.generate(&mut self.used_words, &mut self.rng)?;
            self.questions.push(question);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cues::testing::{Cue, RecordingCues};
    use crate::error::QuizError;

    fn session(level: QuizLevel, seed: u64) -> (QuizSession, Arc<RecordingCues>) {
        let cues = Arc::new(RecordingCues::default());
        let session = QuizSession::with_rng(
            &Catalog::builtin(),
            GameMode::EngToKor,
            level,
            &QuizConfig::default(),
            cues.clone(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        (session, cues)
    }

    fn right(s: &QuizSession) -> String {
        s.current_question().target.eng.clone()
    }

    fn wrong(s: &QuizSession) -> String {
        let q = s.current_question();
        q.options.iter().find(|w| w.eng != q.target.eng).unwrap().eng.clone()
    }

    fn after_delay(now: Instant) -> Instant {
        now + Duration::from_millis(1200)
    }

    #[test]
    fn empty_batch_settings_are_rejected() {
        let cases: [(QuizLevel, fn(&mut QuizConfig)); 3] = [
            (QuizLevel::Standard(2), |c| c.quiz.total_questions = 0),
            (QuizLevel::Challenge, |c| c.challenge.initial_batch = 0),
            (QuizLevel::Challenge, |c| c.challenge.lookahead = 0),
        ];
        for (level, tweak) in cases {
            let mut config = QuizConfig::default();
            tweak(&mut config);
            let err = QuizSession::with_rng(
                &Catalog::builtin(),
                GameMode::EngToKor,
                level,
                &config,
                Arc::new(RecordingCues::default()),
                StdRng::seed_from_u64(3),
            )
            .unwrap_err();
            assert!(matches!(err, QuizError::InvalidConfig(_)), "{level:?}: {err}");
        }
    }

    #[test]
    fn standard_session_has_ten_distinct_targets() {
        let (s, _) = session(QuizLevel::Standard(3), 1);
        assert_eq!(s.questions().len(), 10);
        let targets: HashSet<_> = s.questions().iter().map(|q| q.target.eng.as_str()).collect();
        assert_eq!(targets.len(), 10);
        assert_eq!(s.hearts(), None);
        assert_eq!(s.phase(), Phase::Active);
    }

    #[test]
    fn ten_correct_answers_score_one_hundred() {
        let (mut s, cues) = session(QuizLevel::Standard(3), 2);
        let mut now = Instant::now();
        let mut finished = None;
        for i in 0..10 {
            assert_eq!(s.current_index(), i);
            let answer = right(&s);
            let outcome = s.submit_answer(&answer, now).unwrap();
            assert!(outcome.correct);
            assert_eq!(outcome.score, (i as u32 + 1) * 10);
            now = after_delay(now);
            match s.tick(now).unwrap() {
                Some(Transition::Advanced { index }) => assert_eq!(index, i + 1),
                Some(Transition::Finished { score }) => finished = Some(score),
                None => panic!("transition should be due"),
            }
        }
        assert_eq!(finished, Some(100));
        assert!(s.is_finished());
        assert_eq!(cues.played(), vec![Cue::Correct; 10]);
    }

    #[test]
    fn transition_waits_for_feedback_delay() {
        let (mut s, _) = session(QuizLevel::Standard(1), 3);
        let now = Instant::now();
        let answer = right(&s);
        s.submit_answer(&answer, now).unwrap();
        assert_eq!(s.feedback(), Some(Verdict::Correct));
        assert_eq!(s.time_until_transition(now), Some(Duration::from_millis(1200)));
        assert_eq!(s.tick(now + Duration::from_millis(1199)).unwrap(), None);
        assert_eq!(s.current_index(), 0);
        assert_eq!(
            s.tick(after_delay(now)).unwrap(),
            Some(Transition::Advanced { index: 1 })
        );
        assert_eq!(s.selected(), None);
        assert_eq!(s.feedback(), None);
    }

    #[test]
    fn second_submission_while_processing_is_ignored() {
        let (mut s, cues) = session(QuizLevel::Standard(2), 4);
        let now = Instant::now();
        let answer = right(&s);
        assert!(s.submit_answer(&answer, now).is_some());
        assert!(s.submit_answer(&answer, now).is_none());
        assert!(s.use_chance(now).is_none());
        assert_eq!(s.score(), 10);
        assert!(!s.chance_used());
        assert_eq!(cues.played().len(), 1);
    }

    #[test]
    fn wrong_answer_in_standard_mode_keeps_going() {
        let (mut s, cues) = session(QuizLevel::Standard(4), 5);
        let now = Instant::now();
        let pick = wrong(&s);
        let outcome = s.submit_answer(&pick, now).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.chosen.map(|w| w.eng), Some(pick));
        assert_eq!(outcome.hearts, None);
        assert_eq!(s.score(), 0);
        assert_eq!(cues.played(), vec![Cue::Wrong]);
        assert_eq!(s.tick(after_delay(now)).unwrap(), Some(Transition::Advanced { index: 1 }));
    }

    #[test]
    fn last_standard_question_finishes_even_when_wrong() {
        let (mut s, _) = session(QuizLevel::Standard(5), 6);
        let mut now = Instant::now();
        for _ in 0..9 {
            let answer = right(&s);
            s.submit_answer(&answer, now);
            now = after_delay(now);
            s.tick(now).unwrap();
        }
        let pick = wrong(&s);
        s.submit_answer(&pick, now);
        assert_eq!(
            s.tick(after_delay(now)).unwrap(),
            Some(Transition::Finished { score: 90 })
        );
    }

    #[test]
    fn challenge_ends_after_three_wrong_answers() {
        let (mut s, _) = session(QuizLevel::Challenge, 7);
        assert_eq!(s.hearts(), Some(3));
        let mut now = Instant::now();
        for expected_hearts in [2, 1, 0] {
            let pick = wrong(&s);
            let outcome = s.submit_answer(&pick, now).unwrap();
            assert_eq!(outcome.hearts, Some(expected_hearts));
            now = after_delay(now);
            let transition = s.tick(now).unwrap();
            if expected_hearts == 0 {
                assert_eq!(transition, Some(Transition::Finished { score: 0 }));
            } else {
                assert!(matches!(transition, Some(Transition::Advanced { .. })));
            }
        }
        assert!(s.is_finished());
        assert_eq!(s.hearts(), Some(0));
    }

    #[test]
    fn finished_session_is_immutable() {
        let (mut s, _) = session(QuizLevel::Challenge, 8);
        let mut now = Instant::now();
        while !s.is_finished() {
            let pick = wrong(&s);
            s.submit_answer(&pick, now);
            now = after_delay(now);
            s.tick(now).unwrap();
        }
        let answer = right(&s);
        assert!(s.submit_answer(&answer, now).is_none());
        assert!(s.use_chance(now).is_none());
        assert_eq!(s.tick(after_delay(now)).unwrap(), None);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn chance_with_two_hearts_scores_once() {
        let (mut s, _) = session(QuizLevel::Challenge, 9);
        let mut now = Instant::now();
        let pick = wrong(&s);
        s.submit_answer(&pick, now);
        now = after_delay(now);
        s.tick(now).unwrap();
        assert_eq!(s.hearts(), Some(2));

        let target = s.current_question().target.clone();
        let outcome = s.use_chance(now).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.chosen, None);
        assert_eq!(s.selected(), Some(&target));
        assert_eq!(s.score(), 10);
        assert!(s.chance_used());

        now = after_delay(now);
        s.tick(now).unwrap();
        assert!(s.use_chance(now).is_none());
        assert_eq!(s.score(), 10);
        assert_eq!(s.phase(), Phase::Active);
    }

    #[test]
    fn chance_with_one_heart_is_rejected() {
        let (mut s, _) = session(QuizLevel::Challenge, 10);
        let mut now = Instant::now();
        for _ in 0..2 {
            let pick = wrong(&s);
            s.submit_answer(&pick, now);
            now = after_delay(now);
            s.tick(now).unwrap();
        }
        assert_eq!(s.hearts(), Some(1));
        let index = s.current_index();
        assert!(!s.chance_available());
        assert!(s.use_chance(now).is_none());
        assert!(!s.chance_used());
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.current_index(), index);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn chance_in_standard_mode_ignores_hearts() {
        let (mut s, _) = session(QuizLevel::Standard(2), 11);
        assert!(s.chance_available());
        assert!(s.use_chance(Instant::now()).is_some());
        assert_eq!(s.score(), 10);
    }

    #[test]
    fn challenge_buffer_stays_ahead() {
        let (mut s, _) = session(QuizLevel::Challenge, 12);
        assert_eq!(s.questions().len(), 5);
        let mut now = Instant::now();
        for _ in 0..60 {
            assert!(s.questions().len() >= s.current_index() + 3);
            let answer = right(&s);
            s.submit_answer(&answer, now).unwrap();
            now = after_delay(now);
            assert!(matches!(s.tick(now).unwrap(), Some(Transition::Advanced { .. })));
        }
        assert_eq!(s.score(), 600);
        assert_eq!(s.questions().len(), s.current_index() + 3);
    }

    #[test]
    fn progress_reflects_position() {
        let (s, _) = session(QuizLevel::Standard(1), 13);
        assert!((s.progress() - 0.1).abs() < f64::EPSILON);
        let (c, _) = session(QuizLevel::Challenge, 13);
        assert_eq!(c.progress(), 1.0);
    }
}
