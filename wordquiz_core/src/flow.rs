//! Screen flow: start screen, quiz, result.
//!
//! `GameFlow` is the only owner of the live session and the result phase, so
//! leaving a screen drops everything that belonged to it. Leaderboard reads
//! and writes run on a worker thread; their replies are applied by
//! [`GameFlow::tick`], which never waits on the network.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::Catalog;
use crate::config::QuizConfig;
use crate::cues::FeedbackCues;
use crate::error::{QuizError, Result};
use crate::leaderboard::{qualifies_in, Leaderboard, LeaderboardEntry, Standings};
use crate::questions::{GameMode, QuizLevel};
use crate::session::{AnswerOutcome, QuizSession, Transition, POINTS_PER_CORRECT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Quiz,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub screen: Screen,
    pub mode: GameMode,
    pub level: QuizLevel,
    pub score: u32,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTier {
    Perfect,
    Great,
    Good,
    KeepTrying,
    ChallengeOver,
}

impl ResultTier {
    pub fn message(self) -> &'static str {
        match self {
            ResultTier::Perfect => "Perfect! Amazing!",
            ResultTier::Great => "Great Job! Keep it up!",
            ResultTier::Good => "Good! Try again?",
            ResultTier::KeepTrying => "Cheer up! You can do it!",
            ResultTier::ChallengeOver => "Challenge Over!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    pub score: u32,
    /// Best possible score; `None` for challenge mode.
    pub max_score: Option<u32>,
    pub tier: ResultTier,
}

impl ResultSummary {
    pub fn new(score: u32, level: QuizLevel, total_questions: usize) -> Self {
        if level.is_challenge() {
            return ResultSummary { score, max_score: None, tier: ResultTier::ChallengeOver };
        }

        let max_score = total_questions as u32 * POINTS_PER_CORRECT;
        let percent = if max_score == 0 { 0 } else { score * 100 / max_score };
        let tier = match percent {
            100.. => ResultTier::Perfect,
            80..=99 => ResultTier::Great,
            50..=79 => ResultTier::Good,
            _ => ResultTier::KeepTrying,
        };
        ResultSummary { score, max_score: Some(max_score), tier }
    }
}

/// State of the result screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPhase {
    pub summary: ResultSummary,
    pub standings: Standings,
    /// The player may enter a name for the leaderboard.
    pub name_entry_open: bool,
    pub submitted: bool,
    /// A leaderboard request is in flight; `standings` is not final yet.
    pub loading: bool,
}

/// Reply from the leaderboard worker.
enum BoardReply {
    Loaded(Vec<LeaderboardEntry>),
    Submitted(Standings),
}

pub struct GameFlow {
    state: GameState,
    catalog: Arc<Catalog>,
    config: QuizConfig,
    cues: Arc<dyn FeedbackCues>,
    leaderboard: Option<Arc<Leaderboard>>,
    pending: Option<Receiver<BoardReply>>,
    session: Option<QuizSession>,
    result: Option<ResultPhase>,
    rng: StdRng,
}

impl GameFlow {
    pub fn new(
        catalog: Arc<Catalog>,
        config: QuizConfig,
        cues: Arc<dyn FeedbackCues>,
        leaderboard: Option<Leaderboard>,
    ) -> Self {
        Self::with_rng(catalog, config, cues, leaderboard, StdRng::from_entropy())
    }

    pub fn with_rng(
        catalog: Arc<Catalog>,
        config: QuizConfig,
        cues: Arc<dyn FeedbackCues>,
        leaderboard: Option<Leaderboard>,
        rng: StdRng,
    ) -> Self {
        let state = GameState {
            screen: Screen::Start,
            mode: GameMode::EngToKor,
            level: QuizLevel::Standard(1),
            score: 0,
            total_questions: config.quiz.total_questions,
        };
        GameFlow {
            state,
            catalog,
            config,
            cues,
            leaderboard: leaderboard.map(Arc::new),
            pending: None,
            session: None,
            result: None,
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn result(&self) -> Option<&ResultPhase> {
        self.result.as_ref()
    }

    pub fn start_game(&mut self, mode: GameMode, level: QuizLevel) -> Result<()> {
        if self.state.screen != Screen::Start {
            return Err(QuizError::WrongScreen);
        }
        self.cues.play_tap();

        let rng = StdRng::seed_from_u64(self.rng.gen());
        let session = QuizSession::with_rng(&self.catalog, mode, level, &self.config, self.cues.clone(), rng)?;

        self.session = Some(session);
        self.state = GameState { screen: Screen::Quiz, mode, level, score: 0, ..self.state };
        Ok(())
    }

    pub fn submit_answer(&mut self, word_id: &str, now: Instant) -> Result<Option<AnswerOutcome>> {
        let session = self.session.as_mut().ok_or(QuizError::WrongScreen)?;
        Ok(session.submit_answer(word_id, now))
    }

    pub fn use_chance(&mut self, now: Instant) -> Result<Option<AnswerOutcome>> {
        let session = self.session.as_mut().ok_or(QuizError::WrongScreen)?;
        Ok(session.use_chance(now))
    }

    /// Drive the quiz clock and apply any finished leaderboard request. A
    /// finished session moves the game to the result screen.
    pub fn tick(&mut self, now: Instant) -> Result<Option<Transition>> {
        self.poll_leaderboard();
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let transition = session.tick(now)?;
        if let Some(Transition::Finished { score }) = transition {
            self.finish_quiz(score)?;
        }
        Ok(transition)
    }

    /// Leave the quiz with `final_score` and open the result screen.
    pub fn finish_quiz(&mut self, final_score: u32) -> Result<()> {
        if self.state.screen != Screen::Quiz {
            return Err(QuizError::WrongScreen);
        }
        self.session = None;
        self.state.score = final_score;
        self.state.screen = Screen::Result;

        let summary = ResultSummary::new(final_score, self.state.level, self.state.total_questions);
        let mut phase = ResultPhase {
            summary,
            standings: Standings::default(),
            name_entry_open: false,
            submitted: false,
            loading: false,
        };

        if self.state.level.is_challenge() {
            if let Some(board) = self.leaderboard.clone() {
                phase.loading = true;
                self.request(board, |board| BoardReply::Loaded(board.fetch_top()));
            }
        }

        self.result = Some(phase);
        Ok(())
    }

    /// Abandon the running quiz. Nothing is scored or submitted.
    pub fn exit(&mut self) -> Result<()> {
        if self.state.screen != Screen::Quiz {
            return Err(QuizError::WrongScreen);
        }
        log::info!("Quiz abandoned at score {}", self.session.as_ref().map_or(0, |s| s.score()));
        self.restart();
        Ok(())
    }

    /// Back to the start screen from anywhere, dropping session and result.
    pub fn restart(&mut self) {
        self.cues.play_tap();
        self.session = None;
        self.result = None;
        self.pending = None;
        self.state.screen = Screen::Start;
        self.state.score = 0;
    }

    /// Whether the name field would currently accept `raw_name`.
    pub fn can_submit(&self, raw_name: &str) -> bool {
        let open = self.result.as_ref().is_some_and(|r| r.name_entry_open && !r.submitted);
        open && self.leaderboard.as_ref().is_some_and(|b| b.parse_name(raw_name).is_ok())
    }

    /// Record the result on the leaderboard. Allowed once per result.
    ///
    /// The name is validated here; the write itself runs in the background
    /// and the new standings appear once `tick` picks up the reply.
    pub fn submit_score(&mut self, raw_name: &str) -> Result<()> {
        let board = self.leaderboard.clone().ok_or(QuizError::WrongScreen)?;
        let phase = self.result.as_mut().ok_or(QuizError::WrongScreen)?;
        if !phase.name_entry_open || phase.submitted {
            return Err(QuizError::WrongScreen);
        }

        let name = board.parse_name(raw_name)?;
        let score = phase.summary.score;
        phase.submitted = true;
        phase.name_entry_open = false;
        phase.loading = true;
        self.request(board, move |board| BoardReply::Submitted(board.submit(&name, score)));
        Ok(())
    }

    /// Block until the in-flight leaderboard request, if any, is applied.
    pub fn wait_for_leaderboard(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };
        match rx.recv() {
            Ok(reply) => self.apply(reply),
            Err(_) => self.worker_lost(),
        }
    }

    fn request<F>(&mut self, board: Arc<Leaderboard>, job: F)
    where
        F: FnOnce(&Leaderboard) -> BoardReply + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The flow may have moved on; a closed channel is fine.
            let _ = tx.send(job(&board));
        });
        self.pending = Some(rx);
    }

    fn poll_leaderboard(&mut self) {
        let polled = match &self.pending {
            Some(rx) => rx.try_recv(),
            None => return,
        };
        match polled {
            Ok(reply) => {
                self.pending = None;
                self.apply(reply);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.worker_lost();
            }
        }
    }

    fn apply(&mut self, reply: BoardReply) {
        let capacity = self.leaderboard.as_ref().map_or(0, |b| b.capacity());
        let Some(phase) = self.result.as_mut() else {
            return;
        };
        phase.loading = false;
        match reply {
            BoardReply::Loaded(entries) => {
                let score = phase.summary.score;
                phase.name_entry_open = !phase.submitted && score > 0 && qualifies_in(&entries, score, capacity);
                phase.standings.entries = entries;
            }
            BoardReply::Submitted(standings) => phase.standings = standings,
        }
    }

    fn worker_lost(&mut self) {
        log::error!("Leaderboard worker exited without a reply");
        if let Some(phase) = self.result.as_mut() {
            phase.loading = false;
        }
    }
}


// ============= Python Binding =============

#[cfg(feature = "python")]
pub mod py {
    use super::*;
    use crate::cues::{shared_cues, PyCallbackCues, SilentCues};
    use crate::leaderboard::{LeaderboardEntry, MemoryStore};
    use crate::questions::Question;
    use pyo3::exceptions::PyRuntimeError;
    use pyo3::prelude::*;

    /// Game driver for a Python front-end. Timing uses the process clock;
    /// the host calls `tick()` from its event loop.
    #[pyclass(name = "GameFlow")]
    pub struct PyGameFlow {
        inner: GameFlow,
    }

    #[pymethods]
    impl PyGameFlow {
        /// `on_cue` is registered process-wide on first use; later values are ignored.
        #[new]
        #[pyo3(signature = (config_path=None, catalog_csv=None, on_cue=None, offline=false))]
        fn new(
            config_path: Option<&str>,
            catalog_csv: Option<&str>,
            on_cue: Option<Py<PyAny>>,
            offline: bool,
        ) -> PyResult<Self> {
            let config = match config_path {
                Some(path) => QuizConfig::load(path)?,
                None => QuizConfig::default(),
            };
            let catalog = match catalog_csv {
                Some(path) => Arc::new(Catalog::from_csv_path(path)?),
                None => Catalog::builtin(),
            };
            let cues: Arc<dyn FeedbackCues> = match on_cue {
                Some(callback) => {
                    shared_cues(|| Arc::new(PyCallbackCues::new(callback)) as Arc<dyn FeedbackCues>)
                }
                None => Arc::new(SilentCues),
            };
            let leaderboard = if offline {
                Leaderboard::new(Box::new(MemoryStore::default()), &config.leaderboard)
            } else {
                Leaderboard::http(&config.leaderboard)
                    .map_err(|e| PyRuntimeError::new_err(e.to_string()))?
            };
            Ok(PyGameFlow { inner: GameFlow::new(catalog, config, cues, Some(leaderboard)) })
        }

        #[getter]
        fn screen(&self) -> &'static str {
            match self.inner.state().screen {
                Screen::Start => "start",
                Screen::Quiz => "quiz",
                Screen::Result => "result",
            }
        }

        #[getter]
        fn score(&self) -> u32 {
            self.inner.session().map_or(self.inner.state().score, |s| s.score())
        }

        #[getter]
        fn hearts(&self) -> Option<u8> {
            self.inner.session().and_then(|s| s.hearts())
        }

        #[getter]
        fn question_number(&self) -> Option<usize> {
            self.inner.session().map(|s| s.current_index() + 1)
        }

        #[getter]
        fn current_question(&self) -> Option<Question> {
            self.inner.session().map(|s| s.current_question().clone())
        }

        #[getter]
        fn chance_available(&self) -> bool {
            self.inner.session().is_some_and(|s| s.chance_available())
        }

        fn start_game(&mut self, mode: GameMode, level: u8) -> PyResult<()> {
            Ok(self.inner.start_game(mode, QuizLevel::from_id(level))?)
        }

        /// `True`/`False` for an accepted answer, `None` if it was ignored.
        fn submit_answer(&mut self, word_id: &str) -> PyResult<Option<bool>> {
            Ok(self.inner.submit_answer(word_id, Instant::now())?.map(|o| o.correct))
        }

        fn use_chance(&mut self) -> PyResult<bool> {
            Ok(self.inner.use_chance(Instant::now())?.is_some())
        }

        /// `"advanced"`, `"finished"` or `None`.
        fn tick(&mut self) -> PyResult<Option<&'static str>> {
            Ok(self.inner.tick(Instant::now())?.map(|t| match t {
                Transition::Advanced { .. } => "advanced",
                Transition::Finished { .. } => "finished",
            }))
        }

        fn exit(&mut self) -> PyResult<()> {
            Ok(self.inner.exit()?)
        }

        fn restart(&mut self) {
            self.inner.restart()
        }

        #[getter]
        fn name_entry_open(&self) -> bool {
            self.inner.result().is_some_and(|r| r.name_entry_open && !r.submitted)
        }

        fn can_submit(&self, name: &str) -> bool {
            self.inner.can_submit(name)
        }

        #[getter]
        fn leaderboard(&self) -> Vec<LeaderboardEntry> {
            self.inner.result().map(|r| r.standings.entries.clone()).unwrap_or_default()
        }

        /// Zero-based row of this player's submission, if it made the list.
        #[getter]
        fn own_rank(&self) -> Option<usize> {
            self.inner.result().and_then(|r| r.standings.own_rank())
        }

        #[getter]
        fn result_message(&self) -> Option<&'static str> {
            self.inner.result().map(|r| r.summary.tier.message())
        }

        /// Starts the write; `leaderboard` updates on a later `tick()`.
        fn submit_score(&mut self, name: &str) -> PyResult<()> {
            Ok(self.inner.submit_score(name)?)
        }

        #[getter]
        fn leaderboard_loading(&self) -> bool {
            self.inner.result().is_some_and(|r| r.loading)
        }
    }
}
