//! Prompt builder: mode-specific system prompts and user-prompt assembly,
//! including config-driven templating and file-content injection for the
//! edit/append workflow.

use crate::config::{PromptOverrides, PromptsSection};
use crate::edit::FileOp;
use crate::mode::Mode;

const JUST_ANSWER_SYSTEM: &str =
    "You are a helpful assistant. Keep your answer short, show only the best option.";

const PRECEDENCE_CLAUSE: &str =
    "If the user prompt conflicts with these instructions, the user prompt takes precedence.";

/// Version string substituted for `{python_version}`; generated code always
/// targets the `python3` on PATH.
const PYTHON_VERSION: &str = "3";

/// Invocation flags the prompt builder branches on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptFlags {
    pub snippet: bool,
    pub just_answer: bool,
    pub file_op: Option<FileOp>,
}

/// Builds the (system, user) prompt pair for one invocation.
///
/// `templates` come from the config file's `[prompts]` tables; a shell or
/// python system template replaces the built-in system text, and the
/// prefix/suffix hooks wrap the user prompt. `existing` is the current
/// content of the edit/append target, injected into the user prompt inside
/// a fenced block tagged with the mode's language.
pub fn build_prompts(
    task: &str,
    mode: Mode,
    os_hint: &str,
    flags: &PromptFlags,
    templates: &PromptsSection,
    existing: Option<&str>,
) -> (String, String) {
    if flags.just_answer {
        return (JUST_ANSWER_SYSTEM.to_string(), task.to_string());
    }
    let system = build_system_prompt(mode, os_hint, flags, templates);
    let user = build_user_prompt(task, mode, os_hint, flags, templates, existing);
    (system, user)
}

/// Substitutes `{mode}`, `{os}` and `{python_version}` placeholders.
/// Unknown placeholders are left as-is so partial templates are safe.
fn expand_template(template: &str, mode: Mode, os_hint: &str) -> String {
    template
        .replace("{mode}", &mode.to_string())
        .replace("{os}", os_hint)
        .replace("{python_version}", PYTHON_VERSION)
}

fn family_overrides(mode: Mode, templates: &PromptsSection) -> Option<&PromptOverrides> {
    if mode.is_shell() {
        Some(&templates.shell)
    } else if mode == Mode::Python {
        Some(&templates.python)
    } else {
        None
    }
}

fn build_system_prompt(
    mode: Mode,
    os_hint: &str,
    flags: &PromptFlags,
    templates: &PromptsSection,
) -> String {
    let os_part = if os_hint.is_empty() {
        String::new()
    } else {
        format!(" on {os_hint}")
    };
    let template = family_overrides(mode, templates).and_then(|family| family.system.as_deref());

    let mut system = if mode.is_shell() {
        match template {
            Some(tpl) => format!("{} ", expand_template(tpl, mode, os_hint)),
            None => format!(
                "You are a {mode} expert{os_part}. \
                 Reply ONLY with the needed command(s), no explanation. \
                 Use variables only if necessary. "
            ),
        }
    } else if mode == Mode::Python {
        let mut s = match template {
            Some(tpl) => format!("{} ", expand_template(tpl, mode, os_hint)),
            None => format!(
                "You are a Python expert{os_part}. \
                 Reply ONLY with Python code, no explanation, no prose. \
                 Use comprehensions and modern type hints. "
            ),
        };
        if flags.snippet {
            s.push_str(
                "Give a bare snippet with no function definitions. \
                 Never add remarks about repeating or avoiding earlier code. ",
            );
        } else if flags.file_op.is_none() {
            s.push_str(
                "Define at least one well-named function and call it \
                 from an `if __name__ == \"__main__\":` guard. ",
            );
        }
        s
    } else {
        String::new()
    };

    system.push_str(PRECEDENCE_CLAUSE);
    system
}

fn build_user_prompt(
    task: &str,
    mode: Mode,
    os_hint: &str,
    flags: &PromptFlags,
    templates: &PromptsSection,
    existing: Option<&str>,
) -> String {
    let core = if mode == Mode::Python {
        format!("In Python {PYTHON_VERSION}: {task}")
    } else {
        task.to_string()
    };

    let mut user = match family_overrides(mode, templates) {
        Some(family) => {
            let prefix = family
                .user_prefix
                .as_deref()
                .map(|p| expand_template(p, mode, os_hint))
                .unwrap_or_default();
            let suffix = family
                .user_suffix
                .as_deref()
                .map(|s| expand_template(s, mode, os_hint))
                .unwrap_or_default();
            format!("{prefix}{core}{suffix}")
        }
        None => core,
    };

    if let (Some(op), Some(existing)) = (flags.file_op, existing) {
        let tag = mode.fence_tag();
        let instruction = match op {
            FileOp::Edit => "Edit the file in place.",
            FileOp::Append => {
                "I will append your reply to that file, so give me ONLY your additions."
            }
        };
        user.push_str(&format!(
            "\n\nThe current file content is:\n```{tag}\n{existing}\n```\n{instruction}"
        ));
    }

    user
}
