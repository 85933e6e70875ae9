//! Settings resolution.
//!
//! Every knob is resolved once, before any core logic runs, with a fixed
//! precedence: CLI flag > environment variable > config file > hardcoded
//! default. Core components never read ambient global state; the env lookup
//! is injected so the layering is testable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::mode::Mode;

pub const DEFAULT_HOST: &str = "http://localhost:8280";
pub const DEFAULT_MODEL: &str = "default";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TIMEOUT_SECS: f64 = 120.0;
pub const DEFAULT_RETRIES: u32 = 30;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: f64 = 50.0;
pub const DEFAULT_OUTPUT_DIR: &str = "~/scripts/cmdgen_out";

/// On-disk TOML configuration. All fields are optional; a missing file or a
/// file that fails to parse degrades to defaults with a warning.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub llm: LlmSection,
    pub generation: GenerationSection,
    pub network: NetworkSection,
    pub output: OutputSection,
    pub prompts: PromptsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub host: Option<String>,
    pub starter: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    pub temperature: Option<f64>,
    pub mode: Option<String>,
    pub os: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<f64>,
    pub startup_timeout: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: Option<String>,
}

/// Config-driven prompt templating, one table per prompt family.
///
/// Templates may use `{mode}`, `{os}` and `{python_version}` placeholders;
/// unknown placeholders are left as-is so partial templates are safe.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    pub shell: PromptOverrides,
    pub python: PromptOverrides,
}

/// Per-family prompt hooks: a system template that replaces the built-in
/// system text, and a prefix/suffix wrapped around the user prompt.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub system: Option<String>,
    pub user_prefix: Option<String>,
    pub user_suffix: Option<String>,
}

/// Locates the first existing config file.
///
/// Search order:
/// 1. the explicit path (from `--config` or `CMDGEN_CONFIG`)
/// 2. `~/.config/cmdgen/config.toml`
/// 3. `cmdgen.toml` beside the executable
pub fn find_config(explicit: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        let path = expand_tilde_path(path, home);
        return path.is_file().then_some(path);
    }
    if let Some(home) = home {
        let candidate = home.join(".config").join("cmdgen").join("config.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let candidate = dir.join("cmdgen.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Loads the TOML config, or defaults on any failure.
pub fn load_config(path: Option<&Path>) -> ConfigFile {
    let Some(path) = path else {
        return ConfigFile::default();
    };
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to read config {}: {err}", path.display());
            return ConfigFile::default();
        }
    };
    match toml::from_str(&text) {
        Ok(cfg) => {
            debug!("[config] loaded {}", path.display());
            cfg
        }
        Err(err) => {
            warn!("failed to parse config {}: {err}", path.display());
            ConfigFile::default()
        }
    }
}

/// CLI-level overrides, the highest-precedence source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub starter: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub mode: Option<String>,
    pub os_hint: Option<String>,
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<f64>,
    pub startup_timeout: Option<f64>,
    pub output: Option<PathBuf>,
}

/// Fully resolved settings bundle consumed by the pipeline. Immutable in
/// spirit; the CLI only adjusts `mode` (extension sniff) and `os_hint`
/// (detection fallback) before the first network call.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub starter: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub mode: Mode,
    pub os_hint: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub startup_timeout: Duration,
    pub output_dir: PathBuf,
    pub prompts: PromptsSection,
}

impl Settings {
    /// Layers the three sources in fixed precedence order. `env` is the
    /// environment lookup (injected for tests); `home` expands `~` paths.
    pub fn resolve(
        cli: Overrides,
        cfg: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        home: Option<&Path>,
    ) -> Result<Settings, Error> {
        let host = cli
            .host
            .or_else(|| env("CMDGEN_HOST"))
            .or_else(|| cfg.llm.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let starter = cli
            .starter
            .or_else(|| env("CMDGEN_STARTER"))
            .or_else(|| cfg.llm.starter.clone())
            .map(|s| expand_tilde(&s, home));

        let model = cli
            .model
            .or_else(|| env("CMDGEN_MODEL"))
            .or_else(|| cfg.llm.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = cli
            .temperature
            .or(cfg.generation.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let mode = match cli.mode.or_else(|| cfg.generation.mode.clone()) {
            Some(name) => name.parse()?,
            None => Mode::Bash,
        };

        let os_hint = cli
            .os_hint
            .or_else(|| env("CMDGEN_OS"))
            .or_else(|| cfg.generation.os.clone())
            .unwrap_or_default();

        let timeout = cli.timeout.or(cfg.network.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = cli.retries.or(cfg.network.retries).unwrap_or(DEFAULT_RETRIES);
        let retry_delay = cli
            .retry_delay
            .or(cfg.network.retry_delay)
            .unwrap_or(DEFAULT_RETRY_DELAY_SECS);
        let startup_timeout = cli
            .startup_timeout
            .or(cfg.network.startup_timeout)
            .unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS);

        let output_dir = cli
            .output
            .or_else(|| env("CMDGEN_OUTPUT").map(PathBuf::from))
            .or_else(|| cfg.output.dir.clone().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Settings {
            host,
            starter,
            model,
            temperature,
            mode,
            os_hint,
            timeout: secs(timeout),
            retries,
            retry_delay: secs(retry_delay),
            startup_timeout: secs(startup_timeout),
            output_dir: expand_tilde_path(&output_dir, home),
            prompts: cfg.prompts.clone(),
        })
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

fn expand_tilde(value: &str, home: Option<&Path>) -> String {
    match (value.strip_prefix("~"), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{rest}", home.display())
        }
        _ => value.to_string(),
    }
}

fn expand_tilde_path(path: &Path, home: Option<&Path>) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(expand_tilde(s, home)),
        None => path.to_path_buf(),
    }
}
