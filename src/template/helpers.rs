// ABOUTME: Built-in helper functions for report templates
// ABOUTME: Implements date and number formatting, comparisons, arithmetic, string, sequence and risk helpers

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt::Write;

use super::context::Context;
use super::error::HelperError;
use super::registry::{HelperRegistry, HelperResult};
use super::value::{format_number, Value};

static NULL: Value = Value::Null;

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn number_arg(args: &[Value], index: usize, helper: &str) -> Result<f64, HelperError> {
    let value = arg(args, index);
    value.to_number().ok_or_else(|| {
        HelperError::new(format!(
            "{} expects a number for argument {}, got {}",
            helper,
            index + 1,
            value.type_name()
        ))
    })
}

/// Optional non-negative integer argument, e.g. a decimal count.
fn count_arg(args: &[Value], index: usize, default: usize, helper: &str) -> Result<usize, HelperError> {
    match arg(args, index) {
        Value::Null => Ok(default),
        _ => {
            let n = number_arg(args, index, helper)?;
            if n < 0.0 || n.fract() != 0.0 {
                return Err(HelperError::new(format!(
                    "{} expects a whole number for argument {}",
                    helper,
                    index + 1
                )));
            }
            Ok(n as usize)
        }
    }
}

/// Most decimal places the number helpers will format
const MAX_DECIMALS: usize = 20;

fn decimals_arg(args: &[Value], index: usize, helper: &str) -> Result<usize, HelperError> {
    let decimals = count_arg(args, index, 0, helper)?;
    if decimals > MAX_DECIMALS {
        return Err(HelperError::new(format!(
            "{} supports at most {} decimals, got {}",
            helper, MAX_DECIMALS, decimals
        )));
    }
    Ok(decimals)
}

fn parse_date(value: &Value) -> Result<Option<DateTime<Utc>>, HelperError> {
    match value {
        Value::Null => Ok(None),
        Value::Date(date) => Ok(Some(*date)),
        Value::Number(ms) => Utc
            .timestamp_millis_opt(*ms as i64)
            .single()
            .map(Some)
            .ok_or_else(|| HelperError::new(format!("timestamp {} is out of range", ms))),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                return Ok(Some(parsed.with_timezone(&Utc)));
            }
            for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                    return Ok(Some(naive.and_utc()));
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Some(naive.and_utc()))
                .ok_or_else(|| HelperError::new(format!("cannot parse '{}' as a date", s)))
        }
        other => Err(HelperError::new(format!(
            "formatDate expects a date, got {}",
            other.type_name()
        ))),
    }
}

/// formatDate value [format]
///
/// `format` is `short`, `long` (default), `iso`, `datetime` or a strftime pattern.
/// Missing or empty dates render as an empty string.
pub fn format_date_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let Some(date) = parse_date(arg(args, 0))? else {
        return Ok(Value::String(String::new()));
    };

    let pattern = match arg(args, 1) {
        Value::Null => "%B %-d, %Y",
        Value::String(name) => match name.as_str() {
            "short" => "%m/%d/%Y",
            "long" => "%B %-d, %Y",
            "iso" => "%Y-%m-%d",
            "datetime" => "%Y-%m-%d %H:%M",
            custom => custom,
        },
        other => {
            return Err(HelperError::new(format!(
                "formatDate expects a format string, got {}",
                other.type_name()
            )))
        }
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(HelperError::new(format!("invalid date format '{}'", pattern)));
    }

    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter()))
        .map_err(|_| HelperError::new(format!("cannot format date with '{}'", pattern)))?;
    Ok(Value::String(out))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn format_fixed(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// formatNumber value [decimals]: fixed decimals with thousands separators
pub fn format_number_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let n = number_arg(args, 0, "formatNumber")?;
    let decimals = decimals_arg(args, 1, "formatNumber")?;
    if !n.is_finite() {
        return Ok(Value::String(format_number(n)));
    }
    Ok(Value::String(format_fixed(n, decimals)))
}

/// percent ratio [decimals]: `0.426` renders as `43%`, or `42.6%` with one decimal
pub fn percent_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let ratio = number_arg(args, 0, "percent")?;
    let decimals = decimals_arg(args, 1, "percent")?;
    Ok(Value::String(format!("{}%", format_fixed(ratio * 100.0, decimals))))
}

pub fn round_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let n = number_arg(args, 0, "round")?;
    let decimals = decimals_arg(args, 1, "round")?;
    let factor = 10f64.powi(decimals.min(15) as i32);
    Ok(Value::Number((n * factor).round() / factor))
}

pub fn eq_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(loose_eq(arg(args, 0), arg(args, 1))))
}

pub fn ne_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(!loose_eq(arg(args, 0), arg(args, 1))))
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x)) => {
            s.trim().parse::<f64>().ok() == Some(*x)
        }
        _ => a == b,
    }
}

fn compare(args: &[Value], helper: &str) -> Result<Ordering, HelperError> {
    let (a, b) = (arg(args, 0), arg(args, 1));
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Ok(x.cmp(y));
    }
    let x = number_arg(args, 0, helper)?;
    let y = number_arg(args, 1, helper)?;
    x.partial_cmp(&y)
        .ok_or_else(|| HelperError::new(format!("{} cannot compare NaN", helper)))
}

pub fn gt_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(compare(args, "gt")? == Ordering::Greater))
}

pub fn gte_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(compare(args, "gte")? != Ordering::Less))
}

pub fn lt_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(compare(args, "lt")? == Ordering::Less))
}

pub fn lte_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(compare(args, "lte")? != Ordering::Greater))
}

pub fn and_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(!args.is_empty() && args.iter().all(Value::is_truthy)))
}

pub fn or_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(args.iter().any(Value::is_truthy)))
}

pub fn not_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::Bool(!arg(args, 0).is_truthy()))
}

fn arithmetic(args: &[Value], helper: &str, op: fn(f64, f64) -> f64) -> HelperResult {
    let a = number_arg(args, 0, helper)?;
    let b = number_arg(args, 1, helper)?;
    Ok(Value::Number(op(a, b)))
}

pub fn add_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    arithmetic(args, "add", |a, b| a + b)
}

pub fn subtract_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    arithmetic(args, "subtract", |a, b| a - b)
}

pub fn multiply_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    arithmetic(args, "multiply", |a, b| a * b)
}

pub fn divide_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    if number_arg(args, 1, "divide")? == 0.0 {
        return Err(HelperError::new("divide by zero"));
    }
    arithmetic(args, "divide", |a, b| a / b)
}

pub fn uppercase_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::String(arg(args, 0).to_string().to_uppercase()))
}

pub fn lowercase_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::String(arg(args, 0).to_string().to_lowercase()))
}

pub fn capitalize_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let text = arg(args, 0).to_string();
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

/// truncate text length [suffix]; the suffix defaults to `...`
pub fn truncate_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let text = arg(args, 0).to_string();
    let max = count_arg(args, 1, usize::MAX, "truncate")?;
    if text.chars().count() <= max {
        return Ok(Value::String(text));
    }
    let suffix = match arg(args, 2) {
        Value::Null => "...".to_string(),
        other => other.to_string(),
    };
    let mut truncated: String = text.chars().take(max).collect();
    truncated.push_str(&suffix);
    Ok(Value::String(truncated))
}

pub fn concat_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(Value::String(args.iter().map(Value::to_string).collect()))
}

pub fn replace_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let text = arg(args, 0).to_string();
    let from = arg(args, 1).to_string();
    if from.is_empty() {
        return Err(HelperError::new("replace expects a non-empty search string"));
    }
    Ok(Value::String(text.replace(&from, &arg(args, 2).to_string())))
}

/// join sequence [separator]; the separator defaults to `, `
pub fn join_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let separator = match arg(args, 1) {
        Value::Null => ", ".to_string(),
        other => other.to_string(),
    };
    let joined = match arg(args, 0) {
        Value::Seq(items) => items
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(&separator),
        other => other.to_string(),
    };
    Ok(Value::String(joined))
}

pub fn length_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    match arg(args, 0) {
        Value::Null => Ok(Value::from(0usize)),
        value => value.length().map(Value::from).ok_or_else(|| {
            HelperError::new(format!("length is undefined for {}", value.type_name()))
        }),
    }
}

pub fn first_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(arg(args, 0)
        .as_seq()
        .and_then(|items| items.first())
        .cloned()
        .unwrap_or_default())
}

pub fn last_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    Ok(arg(args, 0)
        .as_seq()
        .and_then(|items| items.last())
        .cloned()
        .unwrap_or_default())
}

pub fn includes_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let needle = arg(args, 1);
    let found = match arg(args, 0) {
        Value::Seq(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::String(haystack) => haystack.contains(&needle.to_string()),
        _ => false,
    };
    Ok(Value::Bool(found))
}

/// default value fallback: the fallback replaces missing, null and empty-string values
pub fn default_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let value = arg(args, 0);
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    Ok(if empty { arg(args, 1).clone() } else { value.clone() })
}

pub fn json_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    serde_json::to_string(&arg(args, 0).to_json())
        .map(Value::String)
        .map_err(|e| HelperError::new(format!("json serialization failed: {}", e)))
}

/// Map a 0-100 risk score onto the assessment risk bands.
pub fn risk_level(score: f64) -> &'static str {
    if score < 25.0 {
        "Low"
    } else if score < 50.0 {
        "Medium"
    } else if score < 75.0 {
        "High"
    } else {
        "Critical"
    }
}

pub fn risk_level_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let score = number_arg(args, 0, "riskLevel")?;
    Ok(Value::from(risk_level(score)))
}

pub fn risk_class_helper(args: &[Value], _: &Context<'_>) -> HelperResult {
    let score = number_arg(args, 0, "riskClass")?;
    Ok(Value::String(format!(
        "risk-{}",
        risk_level(score).to_lowercase()
    )))
}

/// Register all built-in helpers
pub fn register_builtins(registry: &mut HelperRegistry) -> super::error::Result<()> {
    registry.register("formatDate", format_date_helper)?;
    registry.register("formatNumber", format_number_helper)?;
    registry.register("percent", percent_helper)?;
    registry.register("round", round_helper)?;

    registry.register("eq", eq_helper)?;
    registry.register("ne", ne_helper)?;
    registry.register("gt", gt_helper)?;
    registry.register("gte", gte_helper)?;
    registry.register("lt", lt_helper)?;
    registry.register("lte", lte_helper)?;
    registry.register("and", and_helper)?;
    registry.register("or", or_helper)?;
    registry.register("not", not_helper)?;

    registry.register("add", add_helper)?;
    registry.register("subtract", subtract_helper)?;
    registry.register("multiply", multiply_helper)?;
    registry.register("divide", divide_helper)?;

    registry.register("uppercase", uppercase_helper)?;
    registry.register("lowercase", lowercase_helper)?;
    registry.register("capitalize", capitalize_helper)?;
    registry.register("truncate", truncate_helper)?;
    registry.register("concat", concat_helper)?;
    registry.register("replace", replace_helper)?;

    registry.register("join", join_helper)?;
    registry.register("length", length_helper)?;
    registry.register("first", first_helper)?;
    registry.register("last", last_helper)?;
    registry.register("includes", includes_helper)?;

    registry.register("default", default_helper)?;
    registry.register("json", json_helper)?;

    registry.register("riskLevel", risk_level_helper)?;
    registry.register("riskClass", risk_class_helper)?;

    Ok(())
}
