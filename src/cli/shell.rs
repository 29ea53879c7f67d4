use std::io::{self, BufRead};

use chrono::{Local, NaiveDate};
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    hint::Hinter,
    history::DefaultHistory,
    Cmd, Context as ReadlineContext, Editor, Helper, Highlighter, KeyEvent, Validator,
};

use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CliError, CliMode, CliOptions, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::ledger::DateWindow;

const SCRIPT_ENV: &str = "HOUSEHOLD_CALENDAR_SCRIPT";

pub fn run_cli(options: CliOptions) -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode, options)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => {
            let mut lines = io::stdin().lock().lines();
            drive(&mut context, |_| lines.next().transpose().map_err(CliError::from))
        }
    }
}

/// Dispatches lines from `next_line` until it runs dry or a command ends the session.
fn drive<F>(context: &mut ShellContext, mut next_line: F) -> Result<(), CliError>
where
    F: FnMut(&ShellContext) -> Result<Option<String>, CliError>,
{
    while context.running {
        let Some(line) = next_line(context)? else {
            break;
        };
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    output::info(format!("Ledger: {}", context.ledger_label));
    let today = Local::now().date_naive();
    match context.block_on(context.controller().navigate(today)) {
        Ok(outcome) => context.report_refresh(outcome),
        Err(err) => context.report_error(err.into())?,
    }

    let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(ShellHelper::new(context)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    drive(context, |context| {
        if let Some(helper) = editor.helper_mut() {
            helper.track(context);
        }
        loop {
            match editor.readline(&context.prompt()) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(line).ok();
                    return Ok(Some(line.to_string()));
                }
                Err(ReadlineError::Interrupted) => {
                    output::info("Interrupted. Type `exit` to leave.");
                }
                Err(ReadlineError::Eof) => {
                    output::info("Exiting shell.");
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }
    })
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&err.to_string());
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Completes command names and the date argument of `month`, `select` and `day`
/// against the displayed month, and hints at the arguments a command expects.
#[derive(Helper, Highlighter, Validator)]
struct ShellHelper {
    commands: Vec<(&'static str, &'static str)>,
    period: Option<DateWindow>,
    selected: Option<NaiveDate>,
}

impl ShellHelper {
    fn new(context: &ShellContext) -> Self {
        let mut helper = Self::from_definitions(context.registry.iter());
        helper.track(context);
        helper
    }

    fn from_definitions<'a>(definitions: impl Iterator<Item = &'a CommandDefinition>) -> Self {
        let mut commands: Vec<(&'static str, &'static str)> = definitions
            .map(|definition| (definition.name, definition.usage))
            .collect();
        commands.sort_unstable();
        Self {
            commands,
            period: None,
            selected: None,
        }
    }

    fn track(&mut self, context: &ShellContext) {
        self.period = context.controller().displayed_period();
        self.selected = context.controller().selected();
    }

    fn window(&self) -> DateWindow {
        self.period
            .unwrap_or_else(|| DateWindow::month_of(Local::now().date_naive()))
    }

    /// Start of the word under the cursor plus the values that may replace it.
    fn candidates_for(&self, before_cursor: &str) -> (usize, Vec<String>) {
        let start = before_cursor
            .rfind(char::is_whitespace)
            .map_or(0, |idx| idx + 1);
        let mut words = before_cursor[..start].split_whitespace();
        let command = words.next().map(str::to_ascii_lowercase);
        if words.next().is_some() {
            return (start, Vec::new());
        }

        let needle = before_cursor[start..].to_ascii_lowercase();
        let values = match command.as_deref() {
            None | Some("help") => self
                .commands
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
            Some("month") => {
                let window = self.window();
                [window.previous_month(), window, window.next_month()]
                    .iter()
                    .map(DateWindow::to_string)
                    .collect()
            }
            Some("select" | "day") => {
                let window = self.window();
                let selected = self.selected.filter(|date| window.contains(*date));
                selected
                    .into_iter()
                    .chain(window.days().filter(|date| Some(*date) != selected))
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .collect()
            }
            Some(_) => Vec::new(),
        };

        let matches = values
            .into_iter()
            .filter(|value| value.starts_with(&needle))
            .collect();
        (start, matches)
    }

    /// Argument synopsis shown once a known command and a space have been typed.
    fn usage_hint(&self, line: &str) -> Option<String> {
        let command = line.strip_suffix(' ')?.trim_start().to_ascii_lowercase();
        if command.is_empty() || command.contains(char::is_whitespace) {
            return None;
        }
        let (_, usage) = self.commands.iter().find(|(name, _)| *name == command)?;
        usage.split_once(' ').map(|(_, args)| args.to_string())
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, values) = self.candidates_for(&line[..pos]);
        let pairs = values
            .into_iter()
            .map(|value| Pair {
                display: value.clone(),
                replacement: value,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}
