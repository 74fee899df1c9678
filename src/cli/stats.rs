use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::{error, info};

use crate::daemon::storage::time_storage::{JsonTimeStorage, TimeStorage};

use super::{
    output::{aggregate, render::StatsView, Period},
    Args,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(long, short, default_value_t = Period::Daily, help = "Period to summarize")]
    period: Period,
    #[arg(
        long = "at",
        short,
        help = "Day the period is relative to. Examples are \"yesterday\", \"15/03/2025\", \"last friday\""
    )]
    reference_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Command to process `stats` command. Prints time spent on every website during the selected
/// period, longest first.
pub async fn process_stats_command(
    StatsCommand {
        period,
        reference_date,
        date_style,
    }: StatsCommand,
    dir: PathBuf,
) -> Result<()> {
    let reference = parse_reference(reference_date, date_style)?;
    info!("Showing {period} stats for {reference}");

    let storage = JsonTimeStorage::new(dir)?;

    eprint!("{}", StatsView::Loading);
    let view = match storage.read_all().await {
        Ok(data) => StatsView::from(aggregate(&data, period, reference)),
        Err(e) => {
            error!("Error fetching or processing data {e:?}");
            StatsView::Failed
        }
    };

    match view {
        StatsView::Failed => eprint!("{view}"),
        _ => print!("{view}"),
    }
    Ok(())
}

fn parse_reference(reference_date: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match reference_date.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local).date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate reference date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}
