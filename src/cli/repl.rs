//! Interactive REPL — the default mode when quill is run with no
//! subcommand. Type `/help` for the directive grammar, Tab to complete
//! commands.

use crate::cli::output;
use crate::config;
use crate::session::controller::META_COMMANDS;
use crate::session::Controller;
use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Config, Editor, Helper};

/// Readline helper completing meta-commands and directive keys.
struct QuillHelper;

const DIRECTIVE_KEYS: &[&str] = &[
    "schema:",
    "tablename:",
    "columns:",
    "condition:",
    "order:",
    "limit:",
    "ask:",
];

impl Completer for QuillHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if input.starts_with('/') {
            let matches: Vec<Pair> = META_COMMANDS
                .iter()
                .map(|(name, desc, _)| (format!("/{name}"), desc))
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<14} {desc}"),
                    replacement: cmd,
                })
                .collect();
            return Ok((0, matches));
        }

        // Complete the directive key at the cursor.
        let start = input
            .rfind([',', ' '])
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &input[start..];
        if word.is_empty() {
            return Ok((pos, Vec::new()));
        }
        let matches: Vec<Pair> = DIRECTIVE_KEYS
            .iter()
            .filter(|k| k.starts_with(word))
            .map(|k| Pair {
                display: k.to_string(),
                replacement: k.to_string(),
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for QuillHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (name, _, _) in META_COMMANDS {
                let cmd = format!("/{name}");
                if cmd.starts_with(line) && cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for QuillHelper {}
impl Validator for QuillHelper {}
impl Helper for QuillHelper {}

/// Run the interactive session loop.
pub async fn run(mut controller: Controller) -> anyhow::Result<()> {
    if !output::is_quiet() {
        eprintln!();
        eprintln!(
            "  quill v{} — SQL assistant with per-table query memory",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("  Type /help for the directive grammar, /exit to quit.");
        eprintln!();
    }

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .build();
    let mut rl: Editor<QuillHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(rl_config)?;
    rl.set_helper(Some(QuillHelper));

    let hist_path = config::repl_history_path();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    loop {
        match rl.readline("quill> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/exit" || line == "/quit" {
                    break;
                }

                match controller.handle_line(line).await {
                    Ok(outcome) => output::render(&outcome),
                    // The error aborts this input only; the loop continues.
                    Err(e) => eprintln!("  Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  (Ctrl+C) Type /exit to quit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    if let Some(parent) = hist_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&hist_path);
    Ok(())
}
