use colored::Colorize;
use rust_decimal::prelude::*;
use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::lookup;

/// Rows of the terminal-value table: label and `DistributionStats` field.
const STATS: [(&str, &str); 8] = [
    ("Mean", "mean"),
    ("Median", "median"),
    ("Std dev", "std_dev"),
    ("MAD", "mad"),
    ("10th percentile", "p10"),
    ("90th percentile", "p90"),
    ("Min", "min"),
    ("Max", "max"),
];

/// Human-readable summary with currency formatting.
///
/// Falls back to the table view for output that is neither a scenario run
/// nor a Monte Carlo projection.
pub fn print_report(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    if result.get("summary").is_some() {
        print_monte_carlo(result);
    } else if result.get("history").is_some() {
        print_scenario(result);
    } else {
        super::table::print_table(value);
        return;
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings.iter().filter_map(Value::as_str) {
            println!("{} {}", "warning:".yellow().bold(), w);
        }
    }
}

fn print_scenario(result: &Value) {
    let name = text(result, "name");
    let status = text(result, "state.status");
    println!("{} {} [{}]", "Scenario:".bold(), name, status);
    println!(
        "Starting value: {}   Years: {}",
        currency(num(result, "start_value")),
        num(result, "num_years")
    );

    if let Some(Value::Array(history)) = result.get("history") {
        let mut builder = Builder::default();
        builder.push_record(["Year", "Start", "Cash flow", "Nominal", "Real", "Return"]);
        for record in history {
            builder.push_record([
                num(record, "year").to_string(),
                currency(num(record, "start_value")),
                currency(num(record, "cash_flow")),
                currency(num(record, "nominal_value")),
                currency(num(record, "real_value")),
                rate(num(record, "blended_return")),
            ]);
        }
        println!("{}", Table::from(builder));
    }

    if status == "failed" {
        println!(
            "{} year {}: {}",
            "Depleted in".red().bold(),
            num(result, "state.year"),
            text(result, "state.reason")
        );
        return;
    }

    if let Some(metrics) = result.get("metrics").filter(|m| !m.is_null()) {
        println!(
            "Ending value: {} nominal, {} inflation-adjusted",
            currency(num(metrics, "end_nominal_value")),
            currency(num(metrics, "end_real_value"))
        );
        println!("Net cash flow: {}", currency(num(metrics, "total_cash_flow")));
        println!(
            "Average return: {} ({} real)",
            rate(num(metrics, "nominal_returns.average")),
            rate(num(metrics, "real_returns.average"))
        );
        println!(
            "Best year: {} ({})   Worst year: {} ({})",
            num(metrics, "nominal_returns.best_year"),
            rate(num(metrics, "nominal_returns.best")),
            num(metrics, "nominal_returns.worst_year"),
            rate(num(metrics, "nominal_returns.worst"))
        );
    }
}

fn print_monte_carlo(result: &Value) {
    let Some(summary) = result.get("summary") else {
        return;
    };
    println!("{} {}", "Monte Carlo:".bold(), text(summary, "scenario"));
    println!(
        "Trials: {} ({} completed, {} failed), {} outliers excluded",
        num(summary, "num_trials"),
        num(summary, "completed_trials"),
        num(summary, "failed_trials"),
        num(summary, "outliers_removed")
    );

    println!("{}", stats_table(summary));

    if let Some(goal) = summary.get("goal").filter(|g| !g.is_null()) {
        let likelihood = num(goal, "likelihood_pct");
        let line = format!(
            "Likelihood of reaching {}: {:.1}%",
            currency(num(goal, "goal")),
            likelihood
        );
        if likelihood >= 50.0 {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.red().bold());
        }
    }
}

fn stats_table(summary: &Value) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Terminal value (inflation-adjusted)", ""]);
    for (label, key) in STATS {
        let path = format!("terminal_values.{key}");
        builder.push_record([label.to_string(), currency(num(summary, &path))]);
    }
    Table::from(builder)
}

fn num(value: &Value, path: &str) -> f64 {
    lookup(value, path).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn text<'a>(value: &'a Value, path: &str) -> &'a str {
    lookup(value, path).and_then(Value::as_str).unwrap_or("")
}

/// Fractional rate as a one-decimal percentage.
fn rate(r: f64) -> String {
    format!("{:.1}%", r * 100.0)
}

/// Format an amount as `$1,234.56`, rounding half away from zero.
pub(crate) fn currency(amount: f64) -> String {
    let Some(d) = Decimal::from_f64(amount) else {
        return amount.to_string();
    };
    let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
