use clap::Args;
use pomopet_core::timer::{cycle_total_secs, SessionPlan};
use pomopet_core::Settings;
use serde_json::json;

#[derive(Args)]
pub struct PlanArgs {
    /// Work minutes (defaults to settings)
    #[arg(long)]
    work: Option<u32>,
    /// Short break minutes
    #[arg(long)]
    short: Option<u32>,
    /// Long break minutes
    #[arg(long)]
    long: Option<u32>,
    /// Pomodoros per cycle
    #[arg(long)]
    rounds: Option<u32>,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = Settings::load()?.timer;
    if let Some(work) = args.work {
        timer.work_time = work;
    }
    if let Some(short) = args.short {
        timer.short_break_time = short;
    }
    if let Some(long) = args.long {
        timer.long_break_time = long;
    }
    if let Some(rounds) = args.rounds {
        timer.pomodoros_per_round = rounds;
    }

    let settings = Settings {
        timer,
        ..Settings::default()
    };
    let config = settings.timer_configuration()?;
    let plan = SessionPlan::pomodoro(&config)?;
    let total_secs = cycle_total_secs(&config)?;

    let out = json!({
        "config": config,
        "segments": plan.segments(),
        "total_secs": total_secs,
        "total_minutes": total_secs / 60,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
