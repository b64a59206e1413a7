use pomopet_core::audio::SoundCatalog;
use pomopet_core::Settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let mut catalog = SoundCatalog::new();
    for custom in &settings.custom_sounds {
        if !catalog.register_custom(&custom.id, &custom.url) {
            tracing::warn!(sound_id = %custom.id, "custom sound id already taken");
        }
    }
    println!("{}", serde_json::to_string_pretty(&catalog.options())?);
    Ok(())
}
