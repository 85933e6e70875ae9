//! Language / shell mode for a single invocation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Resolved once per invocation from an explicit flag, a file-extension
/// sniff when editing a file, or the default (`bash`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bash,
    Sh,
    Zsh,
    Fish,
    Python,
    None,
}

impl Mode {
    /// All accepted mode names, in help-text order.
    pub const NAMES: &'static [&'static str] = &["bash", "sh", "zsh", "fish", "python", "none"];

    /// Shell-family modes expect bare commands and get the executable bit.
    pub fn is_shell(self) -> bool {
        matches!(self, Mode::Bash | Mode::Sh | Mode::Zsh | Mode::Fish)
    }

    /// File extension for saved scripts.
    pub fn extension(self) -> &'static str {
        match self {
            Mode::Bash | Mode::Sh => ".sh",
            Mode::Zsh => ".zsh",
            Mode::Fish => ".fish",
            Mode::Python => ".py",
            Mode::None => ".txt",
        }
    }

    /// Language tag for fenced blocks in edit/append prompts.
    pub fn fence_tag(self) -> &'static str {
        match self {
            Mode::Bash => "bash",
            Mode::Sh => "sh",
            Mode::Zsh => "zsh",
            Mode::Fish => "fish",
            Mode::Python => "python",
            Mode::None => "",
        }
    }

    /// Sniffs the mode from a target file's extension. A recognizable
    /// extension overrides any mode flag; anything else keeps the flag.
    pub fn from_extension(path: &Path) -> Option<Mode> {
        match path.extension()?.to_str()? {
            "py" => Some(Mode::Python),
            "sh" => Some(Mode::Bash),
            "zsh" => Some(Mode::Zsh),
            "fish" => Some(Mode::Fish),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Bash => "bash",
            Mode::Sh => "sh",
            Mode::Zsh => "zsh",
            Mode::Fish => "fish",
            Mode::Python => "python",
            Mode::None => "none",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" => Ok(Mode::Bash),
            "sh" => Ok(Mode::Sh),
            "zsh" => Ok(Mode::Zsh),
            "fish" => Ok(Mode::Fish),
            "python" => Ok(Mode::Python),
            "none" => Ok(Mode::None),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}
