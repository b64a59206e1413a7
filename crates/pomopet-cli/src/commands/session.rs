use std::sync::Arc;

use clap::{Args, ValueEnum};
use pomopet_core::audio::{AudioEngine, MemoryDevice, DEFAULT_SAMPLE_RATE};
use pomopet_core::timer::slider_to_minutes;
use pomopet_core::{
    drive, Database, DriverConfig, FocusSession, NoHaptics, SessionRequest, Settings, Task,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    Pomodoro,
    Custom,
    Stopwatch,
}

#[derive(Args)]
pub struct RunArgs {
    /// Session mode
    #[arg(long, value_enum, default_value = "pomodoro")]
    mode: Mode,
    /// Custom mode: slider position (1-96)
    #[arg(long, conflicts_with = "minutes")]
    slider: Option<u32>,
    /// Custom mode: duration in minutes
    #[arg(long)]
    minutes: Option<u32>,
    /// Session seconds per real second
    #[arg(long, default_value = "1")]
    speed: u64,
    /// Task to mark done when the session completes
    #[arg(long)]
    task: Option<String>,
    /// Play this sound instead of the configured one
    #[arg(long)]
    sound: Option<String>,
}

impl RunArgs {
    fn request(&self) -> Result<SessionRequest, Box<dyn std::error::Error>> {
        Ok(match self.mode {
            Mode::Pomodoro => SessionRequest::Pomodoro,
            Mode::Stopwatch => SessionRequest::Stopwatch,
            Mode::Custom => {
                let minutes = match (self.slider, self.minutes) {
                    (Some(position), _) => slider_to_minutes(position)?,
                    (None, Some(minutes)) => minutes,
                    (None, None) => return Err("custom mode needs --slider or --minutes".into()),
                };
                SessionRequest::Custom { minutes }
            }
        })
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.request()?;
    let mut settings = Settings::load()?;
    if let Some(sound) = &args.sound {
        settings.sound.selected_sound_id = sound.clone();
    }
    let task = args.task.clone().map(|id| Task {
        id,
        ..Task::default()
    });
    let config = DriverConfig {
        seconds_per_tick: args.speed.max(1),
        ..DriverConfig::default()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let audio = Arc::new(AudioEngine::new(MemoryDevice::new(DEFAULT_SAMPLE_RATE)));
        let mut session = FocusSession::new(settings, audio, NoHaptics, Database::open()?);

        for event in session.start(request, task).await? {
            println!("{}", serde_json::to_string(&event)?);
        }

        let mut write_error = None;
        drive(&mut session, &config, ctrl_c(), |event| {
            if let Err(e) = serde_json::to_string(event).map(|line| println!("{line}")) {
                write_error.get_or_insert(e);
            }
        })
        .await?;
        session.shutdown();

        if let Some(e) = write_error {
            return Err(e.into());
        }
        if let Some(outcome) = session.outcome() {
            println!("{}", serde_json::to_string(outcome)?);
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
