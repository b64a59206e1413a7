use chrono::{Local, NaiveDate};
use clap::Args;
use pomopet_core::Database;
use serde_json::json;

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of records to show
    #[arg(long, default_value = "20")]
    limit: usize,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Day to report (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub fn history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let records = db.recent_records(args.limit)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let stats = db.stats_for_day(date)?;
    let out = json!({
        "date": date,
        "sessions": stats.sessions,
        "focus_minutes": stats.focus_minutes,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
