//! Sound catalog: built-in options plus custom sounds registered at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::device::OutputSource;
use super::noise::GeneratorKind;

/// Sentinel id meaning "no sound".
pub const NONE_SOUND_ID: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Frequency,
    Ambience,
    Custom,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundOption {
    pub id: String,
    pub category: SoundCategory,
    pub generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorKind>,
}

impl SoundOption {
    fn generated(id: &str, category: SoundCategory, kind: GeneratorKind) -> Self {
        Self {
            id: id.to_string(),
            category,
            generated: true,
            source_url: None,
            generator: Some(kind),
        }
    }

    fn streamed(id: &str, category: SoundCategory, url: &str) -> Self {
        Self {
            id: id.to_string(),
            category,
            generated: false,
            source_url: Some(url.to_string()),
            generator: None,
        }
    }

    /// What the output device should play for this option.
    pub fn output_source(&self) -> OutputSource {
        match (&self.generator, &self.source_url) {
            (Some(kind), _) => OutputSource::Generated(*kind),
            (None, Some(url)) => OutputSource::Streamed(url.clone()),
            (None, None) => OutputSource::None,
        }
    }
}

fn builtin_options() -> Vec<SoundOption> {
    vec![
        SoundOption {
            id: NONE_SOUND_ID.to_string(),
            category: SoundCategory::None,
            generated: false,
            source_url: None,
            generator: None,
        },
        SoundOption::generated("pink", SoundCategory::Frequency, GeneratorKind::PinkNoise),
        SoundOption::generated("brown", SoundCategory::Frequency, GeneratorKind::BrownNoise),
        SoundOption::generated("40hz", SoundCategory::Frequency, GeneratorKind::Tone { hz: 40 }),
        SoundOption::generated("rain", SoundCategory::Ambience, GeneratorKind::Rain),
        SoundOption::streamed("forest", SoundCategory::Ambience, "sounds/forest.mp3"),
        SoundOption::streamed("cafe", SoundCategory::Ambience, "sounds/cafe.mp3"),
        SoundOption::streamed("ocean", SoundCategory::Ambience, "sounds/ocean.mp3"),
    ]
}

/// Built-in options plus an append-only `id -> url` registry of custom
/// sounds. Custom entries live as long as the catalog.
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    builtin: Vec<SoundOption>,
    custom: BTreeMap<String, String>,
}

impl SoundCatalog {
    pub fn new() -> Self {
        Self {
            builtin: builtin_options(),
            custom: BTreeMap::new(),
        }
    }

    /// Register a custom sound. Returns false (and keeps the existing entry)
    /// when the id is already taken.
    pub fn register_custom(&mut self, id: &str, url: &str) -> bool {
        if id == NONE_SOUND_ID || self.get(id).is_some() {
            return false;
        }
        self.custom.insert(id.to_string(), url.to_string());
        true
    }

    pub fn get(&self, id: &str) -> Option<SoundOption> {
        if let Some(option) = self.builtin.iter().find(|o| o.id == id) {
            return Some(option.clone());
        }
        self.custom
            .get(id)
            .map(|url| SoundOption::streamed(id, SoundCategory::Custom, url))
    }

    /// Resolve an id to its output source; `None` on a lookup miss.
    pub fn resolve(&self, id: &str) -> Option<OutputSource> {
        self.get(id).map(|o| o.output_source())
    }

    /// Every option, built-ins first, then custom sounds by id.
    pub fn options(&self) -> Vec<SoundOption> {
        let mut all = self.builtin.clone();
        all.extend(
            self.custom
                .iter()
                .map(|(id, url)| SoundOption::streamed(id, SoundCategory::Custom, url)),
        );
        all
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::new()
    }
}
