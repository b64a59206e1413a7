use clap::Subcommand;
use pomopet_core::timer::{minutes_to_slider, nearest_slider_position, slider_to_minutes};
use serde_json::json;

#[derive(Subcommand)]
pub enum SliderAction {
    /// Minutes for a slider position (1-96)
    ToMinutes { position: u32 },
    /// Slider position for a duration in minutes
    FromMinutes {
        minutes: u32,
        /// Snap to the closest position instead of failing
        #[arg(long)]
        nearest: bool,
    },
}

pub fn run(action: SliderAction) -> Result<(), Box<dyn std::error::Error>> {
    let out = match action {
        SliderAction::ToMinutes { position } => {
            let minutes = slider_to_minutes(position)?;
            json!({ "position": position, "minutes": minutes })
        }
        SliderAction::FromMinutes { minutes, nearest } => {
            let position = if nearest {
                nearest_slider_position(minutes)
            } else {
                minutes_to_slider(minutes)?
            };
            json!({
                "minutes": minutes,
                "position": position,
                "position_minutes": slider_to_minutes(position)?,
            })
        }
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
