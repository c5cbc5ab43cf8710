//! Audio output context — the device (or browser `AudioContext`) the mix
//! renders into.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    /// Not yet permitted to produce sound (e.g. no user gesture yet).
    Suspended,
    Running,
    Closed,
}

impl std::fmt::Display for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextState::Suspended => write!(f, "suspended"),
            ContextState::Running => write!(f, "running"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

pub trait OutputContext {
    fn state(&self) -> ContextState;

    /// Ask the platform to move to [`ContextState::Running`]. Blocks until
    /// the platform answers; `Err` carries the refusal reason.
    fn resume(&mut self) -> Result<(), String>;

    fn sample_rate(&self) -> u32;
}

/// Software context driven by pulling `render` blocks.
#[derive(Debug, Clone)]
pub struct OfflineContext {
    state: ContextState,
    sample_rate: u32,
    allow_resume: bool,
}

impl OfflineContext {
    /// A context that is already running.
    pub fn new(sample_rate: u32) -> Self {
        OfflineContext {
            state: ContextState::Running,
            sample_rate,
            allow_resume: true,
        }
    }

    /// A context that starts suspended and resumes on request.
    pub fn suspended(sample_rate: u32) -> Self {
        OfflineContext {
            state: ContextState::Suspended,
            ..Self::new(sample_rate)
        }
    }

    /// A suspended context whose resume requests are always refused.
    pub fn blocked(sample_rate: u32) -> Self {
        OfflineContext {
            state: ContextState::Suspended,
            sample_rate,
            allow_resume: false,
        }
    }

    /// Pause a running context, as a platform interruption would.
    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
        }
    }

    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }
}

impl OutputContext for OfflineContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), String> {
        match self.state {
            ContextState::Running => Ok(()),
            ContextState::Closed => Err("context is closed".to_string()),
            ContextState::Suspended if self.allow_resume => {
                self.state = ContextState::Running;
                Ok(())
            }
            ContextState::Suspended => Err("resume refused by the platform".to_string()),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Context whose state is owned by the embedding host.
///
/// In the browser the real `AudioContext.resume()` is a promise that only
/// the page can await, so the host resumes it and reports the outcome with
/// [`HostContext::set_state`] before starting playback.
#[derive(Debug, Clone)]
pub struct HostContext {
    state: ContextState,
    sample_rate: u32,
}

impl HostContext {
    pub fn new(sample_rate: u32) -> Self {
        HostContext {
            state: ContextState::Suspended,
            sample_rate,
        }
    }

    pub fn set_state(&mut self, state: ContextState) {
        self.state = state;
    }

    /// Adopt the host device's rate. Graphs built afterwards render at it;
    /// zero is ignored.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate > 0 {
            self.sample_rate = sample_rate;
        }
    }
}

impl OutputContext for HostContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), String> {
        match self.state {
            ContextState::Running => Ok(()),
            state => Err(format!("audio context is {state}; the host has not resumed it")),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
