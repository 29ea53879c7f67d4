use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use tokio::runtime::{Builder, Runtime};

use crate::calendar::{CalendarController, DayAction, RefreshOutcome};
use crate::cli::commands::{self, CommandRegistry};
use crate::cli::output;
use crate::config::{CalendarConfig, ConfigError, ConfigManager};
use crate::errors::{CalendarError, LedgerError};
use crate::ledger::{InstrumentBook, InstrumentRegistry};
use crate::storage::{JsonLedgerStore, LedgerStore, MemoryLedgerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// User-facing CLI error wrapper.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not open ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// Startup options taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub ledger: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl CliOptions {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let slot = match arg.as_str() {
                "--ledger" => &mut options.ledger,
                "--config" => &mut options.config,
                other => return Err(CliError::Input(format!("unknown option `{other}`"))),
            };
            let value = args
                .next()
                .ok_or_else(|| CliError::Input(format!("`{arg}` expects a path")))?;
            *slot = Some(PathBuf::from(value));
        }
        Ok(options)
    }
}

type PendingActions = Arc<Mutex<Vec<(NaiveDate, DayAction)>>>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config: CalendarConfig,
    pub ledger_label: String,
    pub running: bool,
    runtime: Runtime,
    controller: CalendarController<Arc<dyn LedgerStore>>,
    pending_actions: PendingActions,
}

impl ShellContext {
    pub fn new(mode: CliMode, options: CliOptions) -> Result<Self, CliError> {
        let config_manager = match &options.config {
            Some(path) => ConfigManager::new(path.clone()),
            None => ConfigManager::default_location(),
        };
        let config = config_manager.load()?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let ledger_path = options.ledger.clone().or_else(|| config.ledger_path.clone());
        let (store, instruments, ledger_label) = match ledger_path {
            Some(path) => {
                let json = Arc::new(JsonLedgerStore::new(path));
                runtime.block_on(json.load())?;
                let label = json.path().display().to_string();
                let store: Arc<dyn LedgerStore> = json.clone();
                let instruments: Arc<dyn InstrumentRegistry> = json;
                (store, instruments, label)
            }
            None => {
                let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
                let instruments: Arc<dyn InstrumentRegistry> = Arc::new(InstrumentBook::new());
                (store, instruments, "in-memory".to_string())
            }
        };

        let controller = CalendarController::new(store, instruments)
            .with_currencies(config.currency_registry())
            .with_anniversaries(config.anniversary_calculator());

        let pending_actions: PendingActions = Arc::default();
        let sink = Arc::clone(&pending_actions);
        controller.on_day_action(move |date, action| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((date, action));
        });

        tracing::info!(ledger = %ledger_label, "calendar shell started");

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            config,
            ledger_label,
            running: true,
            runtime,
            controller,
            pending_actions,
        })
    }

    pub fn controller(&self) -> &CalendarController<Arc<dyn LedgerStore>> {
        &self.controller
    }

    /// Runs a controller pipeline call to completion on the shell's runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn take_day_actions(&self) -> Vec<(NaiveDate, DayAction)> {
        std::mem::take(
            &mut *self
                .pending_actions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn report_refresh(&self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Applied { .. } => output::render_month(&self.controller.view()),
            RefreshOutcome::Superseded => output::info("A newer refresh replaced this one."),
        }
    }

    pub fn prompt(&self) -> String {
        match self.controller.displayed_period() {
            Some(period) => format!("calendar[{period}]> "),
            None => "calendar> ".to_string(),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Calendar(CalendarError::NothingDisplayed) => {
                output::error("No month is displayed yet.");
                output::hint("Try `month 2024-03` to get started.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    pub(crate) fn print_warning(&self, message: &str) {
        output::warning(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_ledger_and_config_paths() {
        let options =
            CliOptions::parse(args(&["--ledger", "book.json", "--config", "cfg.json"])).unwrap();
        assert_eq!(options.ledger, Some(PathBuf::from("book.json")));
        assert_eq!(options.config, Some(PathBuf::from("cfg.json")));
    }

    #[test]
    fn rejects_unknown_or_incomplete_options() {
        assert!(matches!(
            CliOptions::parse(args(&["--verbose"])),
            Err(CliError::Input(_))
        ));
        assert!(matches!(
            CliOptions::parse(args(&["--ledger"])),
            Err(CliError::Input(_))
        ));
    }
}
