//! # cmdgen
//!
//! Queries a local LLM for shell commands or code snippets and hands the
//! result back to a thin shell wrapper that owns the interactive readline
//! prompt.
//!
//! Communication contract with the shell wrapper:
//! - stdout is reserved for machine-readable output; human-readable chatter
//!   goes to stderr (always for errors, gated by `--verbose` otherwise).
//! - A one-liner is printed to stdout (and written to `--prompt-file` when
//!   given) for readline injection.
//! - A saved script prints its path to stdout, or writes an execution
//!   command to `--prompt-file`.
//! - Exit codes: 0 = ok / one-liner, 2 = script saved, 1 = error.

mod clipboard;
mod display;
mod osinfo;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cmdgen_core::{
    ChatExchange, Error, FileOp, Mode, Overrides, PromptFlags, ReplyKind, Settings, build_prompts,
    classify, clean, ensure_available, find_config, load_config, query, run_edit_workflow,
    save_script,
};
use tracing::debug;

const EXAMPLES: &str = "examples:
  cmdgen \"list all docker containers sorted by size\"
  cmdgen -m python \"read a CSV and plot column 3\"
  cmdgen -v -t 0.5 \"find duplicate files in /data\"
  cmdgen --edit deploy.sh \"add a dry-run flag\"";

/// Query a local LLM for shell commands or code snippets.
#[derive(Parser, Debug)]
#[command(name = "cmdgen", version, about, after_help = EXAMPLES)]
struct Cli {
    /// Natural-language task description
    #[arg(required = true, num_args = 1..)]
    task: Vec<String>,

    /// Path to TOML config file (env: CMDGEN_CONFIG)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// LLM API base URL (env: CMDGEN_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Command that starts the LLM server when it is not running (env: CMDGEN_STARTER)
    #[arg(long)]
    starter: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Language / shell mode: bash, sh, zsh, fish, python, none
    #[arg(short, long)]
    mode: Option<String>,

    /// OS context string for the system prompt (env: CMDGEN_OS)
    #[arg(long = "os")]
    os_hint: Option<String>,

    /// Override the entire system prompt
    #[arg(long)]
    system_prompt: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Max retries for the LLM call
    #[arg(long)]
    retries: Option<u32>,

    /// Seconds between retries
    #[arg(long)]
    retry_delay: Option<f64>,

    /// Max seconds to wait for LLM startup
    #[arg(long)]
    startup_timeout: Option<f64>,

    /// Output folder for saved scripts (env: CMDGEN_OUTPUT)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// File to write the one-liner into (for shell wrapper integration)
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// Forward full LLM response and debug info to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Just answer the question: print the reply and exit (no prompt
    /// adaptation, no file generated)
    #[arg(short = 'j', long)]
    justanswer: bool,

    /// Print raw LLM output to stdout and exit (skip all processing)
    #[arg(long)]
    raw: bool,

    /// Generate a snippet only: display, copy to clipboard, no file saved
    #[arg(short, long)]
    snippet: bool,

    /// Rework an existing file in place (mutually exclusive with --append)
    #[arg(long, value_name = "FILE")]
    edit: Option<PathBuf>,

    /// Append generated additions to a file (mutually exclusive with --edit)
    #[arg(long, value_name = "FILE")]
    append: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// stdout stays clean for the shell wrapper; all logging goes to stderr.
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    // Conflicting file flags fail before any network activity.
    if cli.edit.is_some() && cli.append.is_some() {
        return Err(Error::ConflictingFileFlags.into());
    }

    let task = cli.task.join(" ");
    let home = std::env::var_os("HOME").map(PathBuf::from);

    let explicit_config = cli
        .config
        .clone()
        .or_else(|| std::env::var("CMDGEN_CONFIG").ok().map(PathBuf::from));
    let config_path = find_config(explicit_config.as_deref(), home.as_deref());
    let cfg = load_config(config_path.as_deref());

    let overrides = Overrides {
        host: cli.host.clone(),
        starter: cli.starter.clone(),
        model: cli.model.clone(),
        temperature: cli.temperature,
        mode: cli.mode.clone(),
        os_hint: cli.os_hint.clone(),
        timeout: cli.timeout,
        retries: cli.retries,
        retry_delay: cli.retry_delay,
        startup_timeout: cli.startup_timeout,
        output: cli.output.clone(),
    };
    let mut settings = Settings::resolve(overrides, &cfg, |key| std::env::var(key).ok(), home.as_deref())?;

    let file_op = cli
        .edit
        .clone()
        .map(|path| (path, FileOp::Edit))
        .or_else(|| cli.append.clone().map(|path| (path, FileOp::Append)));

    // A recognizable target extension overrides the mode flag.
    if let Some((target, _)) = &file_op
        && let Some(mode) = Mode::from_extension(target)
    {
        settings.mode = mode;
    }

    // 1. Ensure the LLM is available.
    let kind = ensure_available(
        &settings.host,
        settings.starter.as_deref(),
        settings.startup_timeout,
    )?;
    debug!("backend kind: {kind}");

    // 2. Build prompts.
    if settings.os_hint.is_empty() {
        settings.os_hint = osinfo::detect_os();
    }
    let flags = PromptFlags {
        snippet: cli.snippet,
        just_answer: cli.justanswer,
        file_op: file_op.as_ref().map(|(_, op)| *op),
    };

    // File-targeted invocations run the edit/append workflow and are done.
    if let Some((target, op)) = file_op {
        let settings = &settings;
        let system_override = cli.system_prompt.as_deref();
        let outcome = run_edit_workflow(
            &target,
            op,
            settings.temperature,
            |temperature, existing| {
                let (mut system, user) = build_prompts(
                    &task,
                    settings.mode,
                    &settings.os_hint,
                    &flags,
                    &settings.prompts,
                    Some(existing),
                );
                if let Some(overridden) = system_override {
                    system = overridden.to_string();
                }
                debug!("[system] {system}");
                debug!("[user]   {user}");
                let exchange = ChatExchange {
                    system_prompt: system,
                    user_prompt: user,
                    temperature,
                    timeout: settings.timeout,
                    retries: settings.retries,
                    retry_delay: settings.retry_delay,
                };
                let raw = query(&settings.host, kind, &settings.model, &exchange)?;
                raw.map(|reply| clean(&reply)).ok_or(Error::NoResponse)
            },
            &mut std::io::stdin().lock(),
            display::show_review_line,
        )?;
        debug!("edit workflow finished: {outcome:?}");
        return Ok(0);
    }

    let (mut system, user) = build_prompts(
        &task,
        settings.mode,
        &settings.os_hint,
        &flags,
        &settings.prompts,
        None,
    );
    if let Some(overridden) = cli.system_prompt {
        system = overridden;
    }
    debug!("[system] {system}");
    debug!("[user]   {user}");

    // 3. Query the LLM.
    let exchange = ChatExchange {
        system_prompt: system,
        user_prompt: user,
        temperature: settings.temperature,
        timeout: settings.timeout,
        retries: settings.retries,
        retry_delay: settings.retry_delay,
    };
    let raw = query(&settings.host, kind, &settings.model, &exchange)?.ok_or(Error::NoResponse)?;

    if cli.raw {
        println!("{raw}");
        return Ok(0);
    }

    // 4. Process the response.
    let cleaned = clean(&raw);

    if cli.justanswer {
        println!("{cleaned}");
        return Ok(0);
    }

    // Snippet mode: display and clipboard, nothing else.
    if cli.snippet {
        display::show_block(&cleaned);
        if clipboard::copy(&cleaned) {
            tracing::info!(">> copied to clipboard");
        } else {
            tracing::info!(">> clipboard not available, use the output above");
            if std::env::consts::OS == "linux" {
                tracing::info!(">> suggest installing xclip: sudo apt install xclip");
            }
        }
        return Ok(0);
    }

    if classify(&cleaned) == ReplyKind::OneLiner {
        if let Some(prompt_file) = &cli.prompt_file {
            fs::write(prompt_file, &cleaned)
                .with_context(|| format!("failed to write {}", prompt_file.display()))?;
        }
        println!("{cleaned}");
        return Ok(0);
    }

    // Multi-line: save as a script.
    let path = save_script(&cleaned, &settings.output_dir, settings.mode, "script")?;
    let path = relativize(&path);
    display::show_file(&path);

    // For the shell wrapper: the "one-liner" to inject is executing the script.
    let exec_cmd = exec_command(settings.mode, &path);
    match &cli.prompt_file {
        Some(prompt_file) => {
            fs::write(prompt_file, exec_cmd)
                .with_context(|| format!("failed to write {}", prompt_file.display()))?;
        }
        None => println!("{}", path.display()),
    }
    Ok(2)
}

/// Command the wrapper should inject to run a saved script.
fn exec_command(mode: Mode, path: &Path) -> String {
    if mode == Mode::Python {
        format!("python3 {}", path.display())
    } else {
        path.display().to_string()
    }
}

/// Trims the saved path against `CMDGEN_DIR` (or the working directory) so
/// the wrapper gets a short, injectable path when possible.
fn relativize(path: &Path) -> PathBuf {
    let base = std::env::var("CMDGEN_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));
    path.strip_prefix(&base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
