use std::{path::PathBuf, sync::Mutex};

macro_rules! cached_paths {
    {
        $(
            $(#[doc = $doc:expr])?
            $vis:vis fn $name:ident() -> PathBuf $body:block
        )*
    } => {
        $(
            $(#[doc = $doc])?
            $vis fn $name() -> PathBuf {
                static CACHED: Mutex<Option<PathBuf>> = Mutex::new(None);
                let mut cached = CACHED.lock().unwrap_or_else(|e| e.into_inner());
                cached.get_or_insert_with(|| $body).clone()
            }
        )*
    }
}

cached_paths! {
    /// Returns the path to the current users config directory.
    fn base_config_dir() -> PathBuf {
        match std::env::var_os("XDG_CONFIG_HOME") {
            Some(config_home) if !config_home.is_empty() => PathBuf::from(config_home),
            _ => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(".config"),
                None => std::env::temp_dir(),
            },
        }
    }

    /// Returns the path to our config directory.
    pub fn config_dir() -> PathBuf {
        base_config_dir().join("shell_controls")
    }
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    config_dir().join("log.txt")
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.ini")
}
