use std::fmt;

use chrono::{Datelike, NaiveDate};
use colored::Colorize;

use crate::calendar::{AnniversaryEntry, CalendarView, EventKind, Phase, SummaryEvent};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => format!("INFO: [i] {text}"),
        MessageKind::Success => format!("SUCCESS: [ok] {text}").bright_green().to_string(),
        MessageKind::Warning => format!("WARNING: [!] {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("ERROR: [x] {text}").bright_red().to_string(),
        MessageKind::Hint => format!("HINT: {text}").dimmed().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

fn event_line(event: &SummaryEvent) -> String {
    let line = format!("  {} {}", event.icon(), event.title());
    match event.kind {
        EventKind::Spending | EventKind::Buy | EventKind::ExchangeBuy => line.red().to_string(),
        EventKind::Income | EventKind::Sell | EventKind::ExchangeSell => line.green().to_string(),
        EventKind::Transfer => line.cyan().to_string(),
        EventKind::Memo => line.italic().to_string(),
    }
}

fn anniversary_line(entry: &AnniversaryEntry) -> String {
    let line = format!("  # {}", entry.name);
    if entry.holiday {
        line.bright_red().bold().to_string()
    } else {
        line.magenta().to_string()
    }
}

fn day_heading(date: NaiveDate, selected: bool) -> String {
    let heading = format!("{} {}", date.format("%Y-%m-%d"), date.weekday());
    if selected {
        format!("> {heading}").bold().to_string()
    } else {
        format!("  {heading}")
    }
}

/// Prints every day of the displayed month that has events or anniversaries.
pub fn render_month(view: &CalendarView) {
    let Some(period) = view.period else {
        info("No month displayed yet. Use `month <yyyy-mm>`.");
        return;
    };

    section(format!("{period}"));
    if view.phase == Phase::Loading {
        hint("A refresh is still in progress.");
    }

    let mut shown = 0;
    for date in period.days() {
        let events: Vec<&SummaryEvent> =
            view.events.iter().filter(|event| event.date == date).collect();
        let anniversaries: Vec<&AnniversaryEntry> = view
            .anniversaries
            .iter()
            .filter(|entry| entry.date == date)
            .collect();
        if events.is_empty() && anniversaries.is_empty() {
            continue;
        }
        shown += 1;
        println!("{}", day_heading(date, view.selected == Some(date)));
        for entry in anniversaries {
            println!("{}", anniversary_line(entry));
        }
        for event in events {
            println!("{}", event_line(event));
        }
    }

    if shown == 0 {
        info("Nothing recorded this month.");
    }
    for err in &view.data_errors {
        warning(err);
    }
}

pub fn render_day(
    date: NaiveDate,
    lunar: Option<String>,
    events: &[SummaryEvent],
    anniversaries: &[AnniversaryEntry],
) {
    section(format!("{} {}", date.format("%Y-%m-%d"), date.weekday()));
    match lunar {
        Some(lunar) => println!("  Lunar: {lunar}"),
        None => println!("  Lunar: unavailable"),
    }
    for entry in anniversaries {
        println!("{}", anniversary_line(entry));
    }
    for event in events {
        println!("{}", event_line(event));
    }
    if events.is_empty() && anniversaries.is_empty() {
        info("Nothing on this day.");
    }
}

pub fn render_anniversaries(year: i32, entries: &[AnniversaryEntry]) {
    section(format!("Anniversaries {year}"));
    let mut sorted: Vec<&AnniversaryEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    for entry in sorted {
        let marker = if entry.holiday { " (holiday)" } else { "" };
        println!("  {} {}{}", entry.date.format("%Y-%m-%d"), entry.name, marker);
    }
}
