//! Availability manager: probe the local inference server, bootstrap it when
//! a starter command is configured, and report which wire protocol is live.

use std::fmt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::Error;

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const POLL_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const STARTUP_GRACE: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Which of the two supported wire protocols the server speaks, inferred
/// from which health probe succeeds. Resolved once and threaded as a value
/// into the backend client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Dedicated `/health` route: OpenAI-compatible chat completions.
    OpenAiCompatible,
    /// Generic root-route success: Ollama chat API.
    Ollama,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::OpenAiCompatible => write!(f, "openai-compatible"),
            BackendKind::Ollama => write!(f, "ollama"),
        }
    }
}

/// Probes the server. A `/health` hit implies an OpenAI-compatible backend,
/// a bare root hit implies Ollama.
fn probe(host: &str, timeout: Duration) -> Option<BackendKind> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .ok()?;
    let ok = |url: String| {
        client
            .get(url)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    };
    if ok(format!("{host}/health")) {
        return Some(BackendKind::OpenAiCompatible);
    }
    if ok(host.to_string()) {
        return Some(BackendKind::Ollama);
    }
    None
}

/// Ensures the backend is reachable, launching the starter command when one
/// is configured. The spawned process is detached; its lifetime is not
/// managed beyond launch.
pub fn ensure_available(
    host: &str,
    starter: Option<&str>,
    startup_timeout: Duration,
) -> Result<BackendKind, Error> {
    if let Some(kind) = probe(host, PROBE_TIMEOUT) {
        debug!("backend reachable at {host} ({kind})");
        return Ok(kind);
    }

    let Some(starter) = starter else {
        return Err(Error::BackendUnavailable);
    };

    info!("Starting local LLM ...");
    Command::new(starter)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| Error::StarterLaunch {
            command: starter.to_string(),
            source,
        })?;
    std::thread::sleep(STARTUP_GRACE);

    let deadline = Instant::now() + startup_timeout;
    while Instant::now() < deadline {
        if let Some(kind) = probe(host, POLL_PROBE_TIMEOUT) {
            info!("LLM is ready ({kind})");
            return Ok(kind);
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    Err(Error::StartupTimeout(startup_timeout))
}
