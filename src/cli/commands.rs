use std::collections::HashMap;

use chrono::{Datelike, Local, NaiveDate};

use crate::calendar::{lunar, DayAction};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::errors::CalendarError;
use crate::utils::build_info;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "month",
            "Display the month containing a date",
            "month <yyyy-mm|yyyy-mm-dd>",
            cmd_month,
        ),
        CommandDefinition::new("next", "Display the following month", "next", cmd_next),
        CommandDefinition::new("prev", "Display the preceding month", "prev", cmd_prev),
        CommandDefinition::new("select", "Select a day", "select <yyyy-mm-dd>", cmd_select),
        CommandDefinition::new(
            "day",
            "Show events, anniversaries and the lunar date of a day",
            "day [yyyy-mm-dd]",
            cmd_day,
        ),
        CommandDefinition::new(
            "refresh",
            "Reload the displayed month from the ledger",
            "refresh",
            cmd_refresh,
        ),
        CommandDefinition::new("show", "Print the displayed month again", "show", cmd_show),
        CommandDefinition::new(
            "holidays",
            "List anniversaries of the displayed year",
            "holidays",
            cmd_holidays,
        ),
        CommandDefinition::new("version", "Show build information", "version", cmd_version),
        CommandDefinition::new("help", "List commands", "help [command]", cmd_help),
        CommandDefinition::new("exit", "Leave the shell", "exit", cmd_exit),
        CommandDefinition::new("quit", "Leave the shell", "quit", cmd_exit),
    ]
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

/// Accepts `YYYY-MM` (first of the month) or a full `YYYY-MM-DD`.
pub(crate) fn parse_month(input: &str) -> Result<NaiveDate, CommandError> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!(
            "invalid month `{}` (use YYYY-MM or YYYY-MM-DD)",
            input
        ))
    })
}

fn single_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    match args {
        [value] => Ok(*value),
        _ => Err(CommandError::InvalidArguments(format!("usage: {usage}"))),
    }
}

fn cmd_month(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let date = parse_month(single_arg(args, "month <yyyy-mm|yyyy-mm-dd>")?)?;
    let outcome = context.block_on(context.controller().navigate(date))?;
    context.report_refresh(outcome);
    Ok(())
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.block_on(context.controller().navigate_next())?;
    context.report_refresh(outcome);
    Ok(())
}

fn cmd_prev(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.block_on(context.controller().navigate_previous())?;
    context.report_refresh(outcome);
    Ok(())
}

fn cmd_select(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let date = parse_date(single_arg(args, "select <yyyy-mm-dd>")?)?;
    context.controller().select_date(date);
    if let Some(period) = context.controller().displayed_period() {
        if !period.contains(date) {
            output::hint(format!(
                "{} is outside {period}; use `month {}` to display it.",
                date,
                date.format("%Y-%m")
            ));
        }
    }
    output::success(format!("Selected {date}."));
    Ok(())
}

fn cmd_day(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let date = match args {
        [] => context
            .controller()
            .selected()
            .unwrap_or_else(|| Local::now().date_naive()),
        [value] => parse_date(value)?,
        _ => return Err(CommandError::InvalidArguments("usage: day [yyyy-mm-dd]".into())),
    };

    context.controller().choose_day_action(date, DayAction::ShowDay);
    for (date, action) in context.take_day_actions() {
        if action != DayAction::ShowDay {
            continue;
        }
        let displayed = context
            .controller()
            .displayed_period()
            .is_some_and(|period| period.contains(date));
        if !displayed {
            output::hint(format!(
                "{} is not in the displayed month; showing its lunar date only.",
                date
            ));
        }
        let lunar = match lunar::solar_to_lunar(date) {
            Ok(lunar) => Some(lunar.to_string()),
            Err(err) => {
                tracing::debug!(%date, "no lunar date: {err}");
                None
            }
        };
        output::render_day(
            date,
            lunar,
            &context.controller().events_on(date),
            &context.controller().anniversaries_on(date),
        );
    }
    Ok(())
}

fn cmd_refresh(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.block_on(context.controller().notify_mutation())?;
    context.report_refresh(outcome);
    Ok(())
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(format!(
        "Ledger: {} (local currency {})",
        context.ledger_label,
        context.config.local_currency
    ));
    output::render_month(&context.controller().view());
    Ok(())
}

fn cmd_holidays(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let view = context.controller().view();
    let Some(period) = view.period else {
        return Err(CalendarError::NothingDisplayed.into());
    };
    output::render_anniversaries(period.year(), &view.anniversaries);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let build = build_info::current();
    output::info(format!(
        "household_calendar {} ({} {}, {} {}, built {})",
        build.version, build.git_hash, build.git_status, build.target, build.profile, build.timestamp
    ));
    output::info(format!("rustc: {}", build.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let [name] = args {
        let definition = context.registry.get(&name.to_lowercase()).ok_or_else(|| {
            CommandError::InvalidArguments(format!("no help for unknown command `{name}`"))
        })?;
        output::info(format!("{}: {}", definition.usage, definition.description));
        return Ok(());
    }

    output::section("Commands");
    for definition in context.registry.iter() {
        println!("  {:<28} {}", definition.usage, definition.description);
    }
    let today = Local::now().date_naive();
    output::hint(format!(
        "Dates use YYYY-MM-DD, e.g. `month {}-{:02}`.",
        today.year(),
        today.month()
    ));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
