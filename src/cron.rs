//! Cron expression helpers: plain-language descriptions and upcoming run times.
//!
//! Expressions use the classic five fields (`minute hour day-of-month month
//! day-of-week`). Iteration is delegated to the `cron` crate, which expects a
//! leading seconds field and its own weekday numbering, so the parsed
//! expression is re-rendered into that dialect before scheduling.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use ::cron::Schedule;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Upper bound on how many upcoming runs the tool lists.
pub const MAX_CRON_RUNS: usize = 20;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronField {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl CronField {
    const ALL: [CronField; 5] = [
        CronField::Minute,
        CronField::Hour,
        CronField::DayOfMonth,
        CronField::Month,
        CronField::DayOfWeek,
    ];

    fn bounds(self) -> (u32, u32) {
        match self {
            Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            // 0 and 7 both mean Sunday.
            Self::DayOfWeek => (0, 7),
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day",
            Self::Month => "month",
            Self::DayOfWeek => "day of the week",
        }
    }

    fn label(self, value: u32) -> String {
        match self {
            Self::Month => MONTH_NAMES
                .get(value.saturating_sub(1) as usize)
                .map_or_else(|| value.to_string(), |name| (*name).to_string()),
            Self::DayOfWeek => DAY_NAMES[(value % 7) as usize].to_string(),
            _ => value.to_string(),
        }
    }

    fn parse_value(self, raw: &str) -> Option<u32> {
        let (min, max) = self.bounds();
        if raw.starts_with(|ch: char| ch.is_ascii_digit()) {
            return parse_number(raw).filter(|value| (min..=max).contains(value));
        }
        let names: &[&str] = match self {
            Self::Month => &MONTH_NAMES,
            Self::DayOfWeek => &DAY_NAMES,
            _ => return None,
        };
        names
            .iter()
            .position(|name| raw.len() == 3 && name[..3].eq_ignore_ascii_case(raw))
            .map(|idx| idx as u32 + min)
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("cron expression must have 5 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} field: '{value}'")]
    InvalidField { field: CronField, value: String },
    #[error("unable to schedule expression: {0}")]
    Schedule(String),
    #[error("expression has no upcoming runs")]
    NoUpcomingRuns,
}

/// One comma-separated entry of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldItem {
    Value(u32),
    Range {
        start: u32,
        end: u32,
        step: Option<u32>,
    },
    /// `start/step`, running to the end of the field's range.
    From { start: u32, step: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpr {
    /// `*`
    Any,
    /// `*/step`
    Every(u32),
    List(Vec<FieldItem>),
}

/// A validated five-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    pub minute: FieldExpr,
    pub hour: FieldExpr,
    pub day_of_month: FieldExpr,
    pub month: FieldExpr,
    pub day_of_week: FieldExpr,
}

/// Plain decimal digits only; `u32::from_str` would also take a leading `+`.
fn parse_number(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_step(raw: &str) -> Option<u32> {
    parse_number(raw).filter(|step| *step >= 1)
}

fn parse_item(field: CronField, raw: &str) -> Option<FieldItem> {
    let (body, step) = match raw.split_once('/') {
        Some((body, step)) => (body, Some(parse_step(step)?)),
        None => (raw, None),
    };
    if let Some((start, end)) = body.split_once('-') {
        let start = field.parse_value(start)?;
        let end = field.parse_value(end)?;
        return (start <= end).then_some(FieldItem::Range { start, end, step });
    }
    let value = field.parse_value(body)?;
    Some(match step {
        Some(step) => FieldItem::From { start: value, step },
        None => FieldItem::Value(value),
    })
}

fn parse_field(field: CronField, raw: &str) -> Result<FieldExpr, CronError> {
    let invalid = || CronError::InvalidField {
        field,
        value: raw.to_string(),
    };
    if raw == "*" {
        return Ok(FieldExpr::Any);
    }
    if let Some(step) = raw.strip_prefix("*/") {
        return parse_step(step).map(FieldExpr::Every).ok_or_else(invalid);
    }
    raw.split(',')
        .map(|item| parse_item(field, item).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()
        .map(FieldExpr::List)
}

/// Parses and validates a five-field expression.
pub fn parse_expression(expr: &str) -> Result<CronExpression, CronError> {
    let raw: Vec<&str> = expr.split_whitespace().collect();
    if raw.len() != CronField::ALL.len() {
        return Err(CronError::FieldCount(raw.len()));
    }
    let parse = |idx: usize| parse_field(CronField::ALL[idx], raw[idx]);
    Ok(CronExpression {
        minute: parse(0)?,
        hour: parse(1)?,
        day_of_month: parse(2)?,
        month: parse(3)?,
        day_of_week: parse(4)?,
    })
}

impl FieldItem {
    fn values(&self, field: CronField) -> Vec<u32> {
        let (_, max) = field.bounds();
        match *self {
            Self::Value(value) => vec![value],
            Self::Range { start, end, step } => {
                (start..=end).step_by(step.unwrap_or(1) as usize).collect()
            }
            Self::From { start, step } => (start..=max).step_by(step as usize).collect(),
        }
    }

    fn describe(&self, field: CronField) -> String {
        match *self {
            Self::Value(value) => field.label(value),
            Self::Range {
                start,
                end,
                step: None,
            } => format!("{} through {}", field.label(start), field.label(end)),
            Self::Range {
                start,
                end,
                step: Some(step),
            } => format!(
                "every {} from {} through {}",
                plural(step, field.unit()),
                field.label(start),
                field.label(end)
            ),
            Self::From { start, step } => format!(
                "every {} starting at {}",
                plural(step, field.unit()),
                field.label(start)
            ),
        }
    }

    fn is_stepped(&self) -> bool {
        matches!(
            self,
            Self::Range { step: Some(_), .. } | Self::From { .. }
        )
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        let (head, tail) = unit.split_once(' ').unwrap_or((unit, ""));
        if tail.is_empty() {
            format!("{count} {head}s")
        } else {
            format!("{count} {head}s {tail}")
        }
    }
}

fn join_items(items: &[FieldItem], field: CronField) -> String {
    items
        .iter()
        .map(|item| item.describe(field))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_field(field: CronField, expr: &FieldExpr) -> Option<String> {
    let items = match expr {
        FieldExpr::Any => return None,
        FieldExpr::Every(step) => return Some(format!("every {}", plural(*step, field.unit()))),
        FieldExpr::List(items) => items,
    };
    if let [item] = items.as_slice() {
        if item.is_stepped() {
            return Some(item.describe(field));
        }
    }
    let single = matches!(items.as_slice(), [FieldItem::Value(_)]);
    let listed = join_items(items, field);
    let clause = match field {
        CronField::Minute if single => format!("at minute {listed}"),
        CronField::Minute => format!("at minutes {listed}"),
        CronField::Hour if single => format!("past hour {listed}"),
        CronField::Hour => format!("past hours {listed}"),
        CronField::DayOfMonth if single => format!("on day {listed} of the month"),
        CronField::DayOfMonth => format!("on days {listed} of the month"),
        CronField::Month => format!("in {listed}"),
        CronField::DayOfWeek => format!("on {listed}"),
    };
    Some(clause)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl CronExpression {
    fn fields(&self) -> [(CronField, &FieldExpr); 5] {
        [
            (CronField::Minute, &self.minute),
            (CronField::Hour, &self.hour),
            (CronField::DayOfMonth, &self.day_of_month),
            (CronField::Month, &self.month),
            (CronField::DayOfWeek, &self.day_of_week),
        ]
    }

    /// A day matches when either day field matches, once both are restricted.
    /// Fields written with a leading `*` do not count as restricted.
    fn schedule_patterns(&self) -> Vec<String> {
        let restricted = |expr: &FieldExpr| matches!(expr, FieldExpr::List(_));
        if !(restricted(&self.day_of_month) && restricted(&self.day_of_week)) {
            return vec![self.schedule_pattern()];
        }
        let by_month_day = CronExpression {
            day_of_week: FieldExpr::Any,
            ..self.clone()
        };
        let by_week_day = CronExpression {
            day_of_month: FieldExpr::Any,
            ..self.clone()
        };
        vec![by_month_day.schedule_pattern(), by_week_day.schedule_pattern()]
    }

    /// Renders the expression in the `cron` crate dialect: a leading seconds
    /// field, explicit value lists, and weekday names instead of numbers.
    fn schedule_pattern(&self) -> String {
        let mut parts = vec!["0".to_string()];
        for (field, expr) in self.fields() {
            let values: Vec<u32> = match expr {
                FieldExpr::Any => {
                    parts.push("*".into());
                    continue;
                }
                FieldExpr::Every(step) => {
                    let (min, max) = field.bounds();
                    let max = if field == CronField::DayOfWeek { 6 } else { max };
                    (min..=max).step_by(*step as usize).collect()
                }
                FieldExpr::List(items) => items.iter().flat_map(|item| item.values(field)).collect(),
            };
            let rendered = if field == CronField::DayOfWeek {
                let mut days: Vec<u32> = values.into_iter().map(|day| day % 7).collect();
                days.sort_unstable();
                days.dedup();
                days.iter()
                    .map(|day| DAY_NAMES[*day as usize][..3].to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            } else {
                let mut values = values;
                values.sort_unstable();
                values.dedup();
                values
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            };
            parts.push(rendered);
        }
        parts.join(" ")
    }
}

/// Describes a cron expression in plain language.
///
/// # Example
/// ```
/// use devtools_core::cron::describe_cron;
/// assert_eq!(describe_cron("0 0 * * *")?, "At midnight every day");
/// assert_eq!(describe_cron("30 9 * * 1-5")?, "At minute 30, past hour 9, on Monday through Friday");
/// # Ok::<(), devtools_core::cron::CronError>(())
/// ```
pub fn describe_cron(expr: &str) -> Result<String, CronError> {
    let parsed = parse_expression(expr)?;
    let normalized = expr.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.as_str() {
        "0 0 * * *" => return Ok("At midnight every day".into()),
        "0 * * * *" => return Ok("At the start of every hour".into()),
        "* * * * *" => return Ok("Every minute".into()),
        _ => {}
    }

    let rest_any = parsed
        .fields()
        .iter()
        .skip(1)
        .all(|(_, expr)| **expr == FieldExpr::Any);
    if let (FieldExpr::Every(step), true) = (&parsed.minute, rest_any) {
        return Ok(capitalize(&format!("every {}", plural(*step, "minute"))));
    }

    let mut clauses = Vec::new();
    if parsed.minute == FieldExpr::Any {
        clauses.push("every minute".to_string());
    }
    clauses.extend(
        parsed
            .fields()
            .iter()
            .filter_map(|(field, expr)| describe_field(*field, expr)),
    );
    Ok(capitalize(&clauses.join(", ")))
}

/// Lists the next `count` run times strictly after `after`, as ISO-8601 strings.
///
/// `count` is clamped to `1..=MAX_CRON_RUNS`.
pub fn next_executions(
    expr: &str,
    count: usize,
    after: DateTime<Utc>,
) -> Result<Vec<String>, CronError> {
    let parsed = parse_expression(expr)?;
    let count = count.clamp(1, MAX_CRON_RUNS);
    let mut instants: Vec<DateTime<Utc>> = Vec::with_capacity(count * 2);
    for pattern in parsed.schedule_patterns() {
        let schedule =
            Schedule::from_str(&pattern).map_err(|err| CronError::Schedule(err.to_string()))?;
        debug!(expr, pattern = %pattern, "scheduling cron pattern");
        instants.extend(schedule.after(&after).take(count));
    }
    instants.sort_unstable();
    instants.dedup();
    instants.truncate(count);
    if instants.is_empty() {
        return Err(CronError::NoUpcomingRuns);
    }
    debug!(expr, runs = instants.len(), "computed cron runs");
    Ok(instants
        .into_iter()
        .map(|run| run.to_rfc3339_opts(SecondsFormat::Millis, true))
        .collect())
}

/// Description plus upcoming runs, as rendered by the cron tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronReport {
    pub description: String,
    pub next_runs: Vec<String>,
}

pub fn cron_report(
    expr: &str,
    count: usize,
    after: DateTime<Utc>,
) -> Result<CronReport, CronError> {
    Ok(CronReport {
        description: describe_cron(expr)?,
        next_runs: next_executions(expr, count, after)?,
    })
}
