//! Feedback cues played on answers and navigation.
//!
//! Playback is fire-and-forget: implementations must not panic or report
//! errors to the caller, and should log failures instead.

use std::sync::{Arc, OnceLock};

/// Sound effects the quiz asks the host to play.
pub trait FeedbackCues: Send + Sync {
    fn play_correct(&self);
    fn play_wrong(&self);
    fn play_tap(&self);
}

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCues;

impl FeedbackCues for SilentCues {
    fn play_correct(&self) {}
    fn play_wrong(&self) {}
    fn play_tap(&self) {}
}

/// Process-wide cue handle, created on first use and never torn down.
///
/// The first caller decides the backend; later calls return the same handle.
pub fn shared_cues(init: impl FnOnce() -> Arc<dyn FeedbackCues>) -> Arc<dyn FeedbackCues> {
    static SHARED: OnceLock<Arc<dyn FeedbackCues>> = OnceLock::new();
    SHARED.get_or_init(init).clone()
}


// ============= Python Binding =============

/// Forwards cues to a Python callable taking the cue name
/// (`"correct"`, `"wrong"` or `"tap"`). Exceptions are logged and dropped.
#[cfg(feature = "python")]
pub struct PyCallbackCues {
    callback: pyo3::Py<pyo3::PyAny>,
}

#[cfg(feature = "python")]
impl PyCallbackCues {
    pub fn new(callback: pyo3::Py<pyo3::PyAny>) -> Self {
        PyCallbackCues { callback }
    }

    fn emit(&self, cue: &str) {
        pyo3::Python::with_gil(|py| {
            if let Err(e) = self.callback.call1(py, (cue,)) {
                log::warn!("Feedback cue '{cue}' failed: {e}");
            }
        });
    }
}

#[cfg(feature = "python")]
impl FeedbackCues for PyCallbackCues {
    fn play_correct(&self) {
        self.emit("correct")
    }
    fn play_wrong(&self) {
        self.emit("wrong")
    }
    fn play_tap(&self) {
        self.emit("tap")
    }
}
