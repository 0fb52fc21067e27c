//! A [`Host`] that records what the resolver asks of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use classmap_core::{Host, HostError};

/// Scripted reply for one autoloader.
#[derive(Debug, Clone)]
enum Reply {
    Answer(bool),
    Fail(String),
}

/// Records includes and autoloader calls; autoloader replies are scripted.
///
/// Autoloaders without a scripted reply are reported as unbound.
#[derive(Debug, Default)]
pub struct RecordingHost {
    replies: HashMap<(String, String), Reply>,
    include_error: Option<String>,
    includes: Mutex<Vec<PathBuf>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// `owner.method` returns `accepts` for every symbol.
    pub fn answer(mut self, owner: &str, method: &str, accepts: bool) -> Self {
        self.replies
            .insert((owner.to_string(), method.to_string()), Reply::Answer(accepts));
        self
    }

    /// `owner.method` raises `message`.
    pub fn fail(mut self, owner: &str, method: &str, message: &str) -> Self {
        self.replies.insert(
            (owner.to_string(), method.to_string()),
            Reply::Fail(message.to_string()),
        );
        self
    }

    /// Every include raises `message`.
    pub fn fail_includes(mut self, message: &str) -> Self {
        self.include_error = Some(message.to_string());
        self
    }

    /// Paths passed to `include`, in order.
    pub fn includes(&self) -> Vec<PathBuf> {
        self.includes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(owner, method, symbol)` for each autoloader invocation, in order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Host for RecordingHost {
    fn include(&self, path: &Path) -> Result<(), HostError> {
        self.includes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
        match &self.include_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    fn call_autoloader(
        &self,
        owner: &str,
        method: &str,
        symbol: &str,
    ) -> Option<Result<bool, HostError>> {
        let reply = self
            .replies
            .get(&(owner.to_string(), method.to_string()))?;
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((owner.to_string(), method.to_string(), symbol.to_string()));
        Some(match reply {
            Reply::Answer(accepts) => Ok(*accepts),
            Reply::Fail(message) => Err(message.clone().into()),
        })
    }
}
