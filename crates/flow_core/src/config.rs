use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use transition::{ImmediateScheduler, TokioScheduler, TransitionScheduler, TransitionTimings};

pub const DEFAULT_SETTINGS_PATH: &str = "navigation.toml";
const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    pub timings: TransitionTimings,
    pub event_capacity: usize,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            timings: TransitionTimings::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Loads `navigation.toml` from the working directory when present, then
/// applies `NAV__*` environment overrides. A broken file is logged and
/// ignored.
pub fn load_settings() -> NavigationSettings {
    let path = Path::new(DEFAULT_SETTINGS_PATH);
    let mut settings = if path.exists() {
        match read_settings_file(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "ignoring navigation settings file");
                NavigationSettings::default()
            }
        }
    } else {
        NavigationSettings::default()
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> Result<NavigationSettings, SettingsError> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<NavigationSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn apply_env_overrides(
    settings: &mut NavigationSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let read_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

    if let Some(v) = read_u64("NAV__PRESENT_DELAY_MS") {
        settings.timings.present_delay_ms = v;
    }
    if let Some(v) = read_u64("NAV__DISMISS_DELAY_MS") {
        settings.timings.dismiss_delay_ms = v;
    }
    if let Some(v) = read_u64("NAV__DISMISS_DELAY_ANIMATED_MS") {
        settings.timings.dismiss_delay_animated_ms = v;
    }
    if let Some(v) = lookup("NAV__EVENT_CAPACITY").and_then(|v| v.trim().parse::<usize>().ok()) {
        if v > 0 {
            settings.event_capacity = v;
        }
    }
}

/// Timings and scheduler shared by a coordinator tree. Children inherit the
/// context of the coordinator they are attached to.
#[derive(Clone)]
pub struct NavigationContext {
    pub timings: TransitionTimings,
    pub scheduler: Arc<dyn TransitionScheduler>,
    /// Applied when a router is built; inherited contexts do not resize
    /// existing channels.
    pub event_capacity: usize,
}

impl NavigationContext {
    pub fn new(timings: TransitionTimings, scheduler: Arc<dyn TransitionScheduler>) -> Self {
        Self {
            timings,
            scheduler,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn from_settings(settings: &NavigationSettings) -> Self {
        Self {
            timings: settings.timings,
            scheduler: Arc::new(TokioScheduler),
            event_capacity: settings.event_capacity.max(1),
        }
    }

    pub fn instant() -> Self {
        Self::new(TransitionTimings::instant(), Arc::new(ImmediateScheduler))
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn TransitionScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self::from_settings(&NavigationSettings::default())
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("timings", &self.timings)
            .field("event_capacity", &self.event_capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
