// src/commands.rs

use crate::error::CheckerError;
use crate::present;
use crate::query::{Period, QueryEngine};

pub const INTRO: &str = "\n---- Scottish Covid Case Checker ----\nAnalyses Scottish Covid-19 cases and returns specific case numbers\n";

/// The question asked on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// New cases per board since the previous report.
    New,
    Scotland,
    Area(Vec<String>),
    Cases { days: String, target: Vec<String> },
    Total,
    HealthBoards,
}

/// Answer `mode` against `q`, returning the text to print.
pub fn run(mode: &Mode, q: &QueryEngine<'_>) -> Result<String, CheckerError> {
    let mut out = String::new();
    match mode {
        Mode::New => {
            out.push_str("New cases for every health board since the last report\n");
            let deltas = q.period_all(q.parse_days("1")?)?;
            out.push_str(&present::table(q.health_boards(), &deltas));
        }
        Mode::Scotland => {
            out.push_str("Scotland's total cases\n");
            let name = q.health_board_full_name("Scotland")?;
            out.push_str(&present::single(name, q.scotland_total()?));
            out.push('\n');
        }
        Mode::Area(tokens) => {
            let area = q.handle_input(tokens)?;
            out.push_str(&format!("{area}'s total cases\n"));
            out.push_str(&present::single(area, q.health_board_total(area)?));
            out.push('\n');
        }
        Mode::Cases { days, target } => {
            let target = match target.as_slice() {
                [] => return Err(CheckerError::MissingBoard),
                [first, ..] if first == "all" => "all",
                tokens => q.handle_input(tokens)?,
            };
            out.push_str(&format!("Cases over the last {days} days for {target}\n"));
            match q.health_board_period(days, target)? {
                Period::All(values) => out.push_str(&present::table(q.health_boards(), &values)),
                Period::Single(v) => {
                    out.push_str(&present::single(target, v));
                    out.push('\n');
                }
            }
        }
        Mode::Total => {
            out.push_str("Every health board's total case numbers\n");
            out.push_str(&present::table(q.health_boards(), &q.newest_totals()?));
        }
        Mode::HealthBoards => {
            out.push_str("The following health boards can be used as arguments:\n");
            out.push_str(&present::bullet_list(&q.short_names()));
        }
    }
    Ok(out)
}
