//! offset-by - shift timestamps by calendar-aware durations.
//!
//! Reads timestamps from the command line (or one per line from stdin),
//! offsets them all by one duration and prints the results in input order.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use offset_engine::{
    AmbiguousPolicy, DatetimeColumn, DurationSpec, NonexistentPolicy, OffsetOptions,
    OverflowPolicy, Timestamp,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const NULL: &str = "null";

/// Offset timestamps by a duration such as `1mo2d3h`
#[derive(Parser, Debug)]
#[command(name = "offset-by")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Duration to add, e.g. `1y2mo`, `-3d12h`, `1500us`
    #[arg(allow_hyphen_values = true)]
    duration: String,

    /// Timestamps to offset; read from stdin, one per line, when omitted
    timestamps: Vec<String>,

    /// Tick resolution (ms, us, ns)
    #[arg(long, default_value = "ms")]
    time_unit: String,

    /// IANA time zone; timestamps are naive when omitted
    #[arg(long)]
    time_zone: Option<String>,

    /// What to do with results outside the representable range
    #[arg(long, value_enum, default_value = "fail")]
    overflow: OverflowArg,

    /// How to resolve local times repeated by a DST fall-back
    #[arg(long, value_enum, default_value = "earliest")]
    ambiguous: AmbiguousArg,

    /// How to resolve local times skipped by a DST spring-forward
    #[arg(long, value_enum, default_value = "shift-forward")]
    nonexistent: NonexistentArg,

    /// Print a JSON array of records instead of one value per line
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverflowArg {
    Fail,
    Saturate,
    Null,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Fail => Self::Fail,
            OverflowArg::Saturate => Self::Saturate,
            OverflowArg::Null => Self::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AmbiguousArg {
    Earliest,
    Latest,
}

impl From<AmbiguousArg> for AmbiguousPolicy {
    fn from(arg: AmbiguousArg) -> Self {
        match arg {
            AmbiguousArg::Earliest => Self::Earliest,
            AmbiguousArg::Latest => Self::Latest,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NonexistentArg {
    ShiftForward,
    Raise,
}

impl From<NonexistentArg> for NonexistentPolicy {
    fn from(arg: NonexistentArg) -> Self {
        match arg {
            NonexistentArg::ShiftForward => Self::ShiftForward,
            NonexistentArg::Raise => Self::Raise,
        }
    }
}

#[derive(Debug, Serialize)]
struct OffsetRecord {
    input: Option<String>,
    output: Option<String>,
    ticks: Option<i64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let options = OffsetOptions {
        overflow: cli.overflow.into(),
        ambiguous: cli.ambiguous.into(),
        nonexistent: cli.nonexistent.into(),
    };

    // Reject a bad duration before touching any input.
    let spec: DurationSpec = cli
        .duration
        .parse()
        .with_context(|| format!("Failed to parse duration '{}'", cli.duration))?;

    let inputs = if cli.timestamps.is_empty() {
        read_stdin_lines()?
    } else {
        cli.timestamps
    };
    let inputs: Vec<Option<String>> = inputs.into_iter().map(null_if_blank).collect();

    let template = DatetimeColumn::try_new(Vec::new(), &cli.time_unit, cli.time_zone.as_deref())
        .context("Invalid column metadata")?;
    let values = inputs
        .iter()
        .map(|input| {
            input
                .as_deref()
                .map(|text| {
                    Timestamp::parse(text, template.resolution(), template.time_zone(), &options)
                        .map(|ts| ts.ticks())
                        .with_context(|| format!("Failed to parse timestamp '{text}'"))
                })
                .transpose()
        })
        .collect::<Result<Vec<_>>>()?;
    let column = DatetimeColumn::new(values, template.resolution(), template.time_zone());
    debug!(len = column.len(), duration = %spec, "read input column");

    let shifted = column
        .offset_by_spec(&spec, &options)
        .with_context(|| format!("Failed to offset by '{}'", cli.duration))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        let records: Vec<OffsetRecord> = inputs
            .into_iter()
            .zip(shifted.iter())
            .map(|(input, output)| OffsetRecord {
                input,
                output: output.map(|ts| ts.to_string()),
                ticks: output.map(|ts| ts.ticks()),
            })
            .collect();
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize output")?;
        writeln!(out, "{json}").context("Failed to write output")?;
    } else {
        for output in shifted.iter() {
            let line = output.map_or_else(|| NULL.to_string(), |ts| ts.to_string());
            writeln!(out, "{line}").context("Failed to write output")?;
        }
    }
    Ok(())
}

fn read_stdin_lines() -> Result<Vec<String>> {
    io::stdin()
        .lock()
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .context("Failed to read stdin")
}

fn null_if_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == NULL {
        None
    } else {
        Some(trimmed.to_string())
    }
}
