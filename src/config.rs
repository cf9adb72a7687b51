use crate::{
    audio::BackendPreference,
    cfg::{
        gen::parsed_config,
        parse::{Document, Parser},
    },
    sync::DEFAULT_DEBOUNCE,
};
use log::LevelFilter;
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

parsed_config! {
    controls: ControlsSection => "controls" {
        debounce_ms: u64 = "100",
        scroll_step: f64 = "5",
        refresh_interval_ms: u64 = "2000",
    }
    audio: AudioSection => "audio" {
        enable: bool = "true",
        backend: String = "'auto'",
        alsa_card: String = "'default'",
    }
    brightness: BrightnessSection => "brightness" {
        enable: bool = "true",
        device: String = "''",
        sysfs_root: String = "'/sys/class/backlight'",
    }
    log: LogSection => "log" {
        level: String = "'info'",
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Syntax errors, `report` quotes the offending line.
    #[error("{report}")]
    Syntax { report: String, line: Option<usize> },
    #[error("invalid value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Default)]
pub struct Config {
    parsed: ParsedConfig,
    path: Option<PathBuf>,
}

impl Config {
    /// Loads the config file at `path`, a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::trace!("Loading configuration from {}", path.display());
        let parser = match Parser::new(path) {
            Ok(parser) => parser,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                log::info!("{} does not exist, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut this = Self::parse(&parser)?;
        this.path = Some(path.to_path_buf());
        Ok(this)
    }

    /// Parses config text, `name` is used in error reports.
    pub fn from_source(name: &str, source: &str) -> Result<Self, ConfigError> {
        Self::parse(&Parser::from_source(name, source.to_string()))
    }

    fn parse(parser: &Parser) -> Result<Self, ConfigError> {
        let mut parsed = ParsedConfig::default();
        parser
            .parse(&mut parsed)
            .map_err(|error| ConfigError::Syntax {
                report: parser.report(&error),
                line: error.line_number(),
            })?;
        let this = Self { parsed, path: None };
        this.validate()?;
        Ok(this)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let step = self.parsed.controls.scroll_step;
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigError::Invalid {
                key: "controls.scroll_step",
                message: format!("{step} is not a positive number"),
            });
        }
        self.audio_backend()?;
        self.log_level()?;
        Ok(())
    }

    /// The file this was loaded from, `None` for defaults.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn controls(&self) -> &ControlsSection {
        &self.parsed.controls
    }

    pub fn audio(&self) -> &AudioSection {
        &self.parsed.audio
    }

    pub fn brightness(&self) -> &BrightnessSection {
        &self.parsed.brightness
    }

    /// How long sliders wait for input to pause before writing.
    pub fn debounce(&self) -> Duration {
        match self.parsed.controls.debounce_ms {
            0 => DEFAULT_DEBOUNCE,
            ms => Duration::from_millis(ms),
        }
    }

    /// Device polling interval, zero disables polling.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.parsed.controls.refresh_interval_ms)
    }

    pub fn scroll_step(&self) -> f64 {
        self.parsed.controls.scroll_step
    }

    pub fn audio_backend(&self) -> Result<BackendPreference, ConfigError> {
        if !self.parsed.audio.enable {
            return Ok(BackendPreference::None);
        }
        self.parsed
            .audio
            .backend
            .parse()
            .map_err(|message| ConfigError::Invalid {
                key: "audio.backend",
                message,
            })
    }

    /// The configured backlight device name, `None` to pick the first one.
    pub fn brightness_device(&self) -> Option<&str> {
        Some(self.parsed.brightness.device.as_str()).filter(|d| !d.is_empty())
    }

    pub fn sysfs_root(&self) -> &Path {
        Path::new(&self.parsed.brightness.sysfs_root)
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.parsed
            .log
            .level
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "log.level",
                message: format!(
                    "unknown level `{}` (expected off, error, warn, info, debug or trace)",
                    self.parsed.log.level
                ),
            })
    }

    /// Looks up any field as `section.field`, e.g. `controls.debounce_ms`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.parsed.lookup(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.parsed.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert_eq!(config.refresh_interval(), Duration::from_secs(2));
        assert_eq!(config.scroll_step(), 5.0);
        assert_eq!(config.audio_backend().unwrap(), BackendPreference::Auto);
        assert_eq!(config.brightness_device(), None);
        assert_eq!(config.sysfs_root(), Path::new("/sys/class/backlight"));
        assert_eq!(config.log_level().unwrap(), LevelFilter::Info);
        assert!(config.path().is_none());
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_source(
            "config.ini",
            "# shell controls\n\
             [controls]\n\
             debounce_ms = 250 ; slower hardware\n\
             scroll_step = 2.5\n\
             \n\
             [audio]\n\
             backend = 'alsa'\n\
             alsa_card = \"hw:1\"\n\
             [brightness]\n\
             device = 'intel_backlight'\n\
             [log]\n\
             level = 'trace'",
        )
        .unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.scroll_step(), 2.5);
        assert_eq!(config.audio_backend().unwrap(), BackendPreference::Alsa);
        assert_eq!(config.audio().alsa_card, "hw:1");
        assert_eq!(config.brightness_device(), Some("intel_backlight"));
        assert_eq!(config.log_level().unwrap(), LevelFilter::Trace);
    }

    #[test]
    fn key_value_lookup() {
        let config = Config::from_source("config.ini", "[controls]\nscroll_step = 10\n").unwrap();
        assert_eq!(config.get("controls.scroll_step").as_deref(), Some("10"));
        assert_eq!(config.get("controls.debounce_ms").as_deref(), Some("100"));
        assert_eq!(config.get("audio.backend").as_deref(), Some("auto"));
        assert_eq!(config.get("audio.enable").as_deref(), Some("true"));
        assert_eq!(config.get("audio.volume"), None);
        assert_eq!(config.get("nonsense"), None);
        let keys = config.keys();
        assert!(keys.contains(&"brightness.sysfs_root".to_string()));
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn disabled_audio_uses_no_backend() {
        let config = Config::from_source("config.ini", "[audio]\nenable = no\n").unwrap();
        assert_eq!(config.audio_backend().unwrap(), BackendPreference::None);
    }

    #[test]
    fn unknown_field_suggests_similar_name() {
        let error = Config::from_source("config.ini", "[controls]\ndebounce = 5\n")
            .err()
            .unwrap();
        match error {
            ConfigError::Syntax { report, line } => {
                assert_eq!(line, Some(2));
                assert!(report.contains("no field `debounce` in section `controls`"));
                assert!(report.contains("debounce_ms"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn syntax_errors() {
        for source in [
            "debounce_ms = 5\n",
            "[controls\n",
            "[controls]\ndebounce_ms 5\n",
            "[controls]\ndebounce_ms = fast\n",
            "[audio]\nbackend = 'pulse\n",
            "[screen]\n",
        ] {
            assert!(
                matches!(
                    Config::from_source("config.ini", source),
                    Err(ConfigError::Syntax { .. })
                ),
                "{source:?} should not parse"
            );
        }
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            Config::from_source("config.ini", "[audio]\nbackend = 'jack'\n"),
            Err(ConfigError::Invalid { key: "audio.backend", .. })
        ));
        assert!(matches!(
            Config::from_source("config.ini", "[controls]\nscroll_step = 0\n"),
            Err(ConfigError::Invalid { key: "controls.scroll_step", .. })
        ));
        assert!(matches!(
            Config::from_source("config.ini", "[log]\nlevel = 'loud'\n"),
            Err(ConfigError::Invalid { key: "log.level", .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let missing = Config::load(&path).unwrap();
        assert!(missing.path().is_none());
        std::fs::write(&path, "[controls]\nrefresh_interval_ms = 0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
        assert_eq!(config.refresh_interval(), Duration::ZERO);
    }
}
