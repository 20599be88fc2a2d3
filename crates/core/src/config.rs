use saund_transport::{DEFAULT_VOLUME, ProjectType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the playback tick.
    pub tick_interval_ms: u64,
    /// Position advance per tick, in seconds.
    pub tick_step_secs: f64,
    /// Maximum undo depth; the oldest entries are dropped beyond it.
    pub history_limit: usize,
    pub default_volume: f64,
    pub default_bpm: u32,
    /// Jump used by skip forward/backward.
    pub skip_secs: f64,
    #[serde(with = "project_type_name")]
    pub project_type: ProjectType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            tick_step_secs: 0.1,
            history_limit: 1000,
            default_volume: DEFAULT_VOLUME,
            default_bpm: 120,
            skip_secs: 5.0,
            project_type: ProjectType::default(),
        }
    }
}

impl EngineConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("saund").join("config.toml"))
    }

    /// Load the user config, falling back to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "Ignoring malformed config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        if let Ok(contents) = toml::to_string_pretty(self) {
            let _ = fs::write(&path, contents);
        }
    }

    /// Tick period, never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

mod project_type_name {
    use saund_transport::ProjectType;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &ProjectType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProjectType, D::Error> {
        let name = String::deserialize(deserializer)?;
        ProjectType::from_name(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown project type '{name}'")))
    }
}
