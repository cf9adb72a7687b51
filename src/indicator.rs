//! Icon and tooltip selection for the bar indicators.

use crate::audio::StreamInfo;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VolumeLevel {
    Muted,
    High,
    Medium,
    Off,
}

impl VolumeLevel {
    pub fn new(volume: f64, is_muted: bool) -> Self {
        if is_muted {
            Self::Muted
        } else if volume > 74.0 {
            Self::High
        } else if volume > 0.0 {
            Self::Medium
        } else {
            Self::Off
        }
    }

    pub fn icon_name(self, bluetooth: bool) -> &'static str {
        match (self, bluetooth) {
            (Self::High, false) => "audio-volume-high-symbolic",
            (Self::Medium, false) => "audio-volume-medium-symbolic",
            (Self::Off, false) => "audio-volume-low-symbolic",
            (Self::Muted, false) => "audio-volume-muted-symbolic",
            (Self::High, true) => "bluetooth-active-symbolic",
            (Self::Medium, true) => "bluetooth-symbolic",
            (Self::Off, true) => "bluetooth-disconnected-symbolic",
            (Self::Muted, true) => "bluetooth-disabled-symbolic",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MicLevel {
    Muted,
    Active,
}

impl MicLevel {
    pub fn new(volume: f64, is_muted: bool) -> Self {
        if is_muted || volume < 1.0 {
            Self::Muted
        } else {
            Self::Active
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            Self::Muted => "microphone-sensitivity-muted-symbolic",
            Self::Active => "audio-input-microphone-symbolic",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BrightnessLevel {
    High,
    Medium,
    Low,
}

impl BrightnessLevel {
    pub fn new(percent: u8) -> Self {
        if percent >= 75 {
            Self::High
        } else if percent >= 24 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            Self::High => "display-brightness-high-symbolic",
            Self::Medium => "display-brightness-medium-symbolic",
            Self::Low => "display-brightness-low-symbolic",
        }
    }
}

/// Whole percentage of a normalized value, truncated.
pub fn percent_of(normalized: f64) -> u8 {
    (normalized.clamp(0.0, 1.0) * 100.0) as u8
}

/// What an indicator shows: the icon, its tooltip and whether it is styled
/// as muted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Indicator {
    pub icon: &'static str,
    pub tooltip: String,
    pub muted: bool,
}

impl Indicator {
    pub fn speaker(info: Option<&StreamInfo>) -> Self {
        match info {
            None => Self::no_device("audio-volume-muted-symbolic"),
            Some(info) => {
                let level = VolumeLevel::new(info.volume as f64, info.is_muted);
                Self {
                    icon: level.icon_name(info.is_bluetooth()),
                    tooltip: stream_tooltip(info),
                    muted: info.is_muted,
                }
            }
        }
    }

    pub fn microphone(info: Option<&StreamInfo>) -> Self {
        match info {
            None => Self::no_device(MicLevel::Muted.icon_name()),
            Some(info) => Self {
                icon: MicLevel::new(info.volume as f64, info.is_muted).icon_name(),
                tooltip: stream_tooltip(info),
                muted: info.is_muted,
            },
        }
    }

    /// `normalized` is `None` without a backlight.
    pub fn brightness(normalized: Option<f64>) -> Self {
        let percent = normalized.map(percent_of).unwrap_or(0);
        Self {
            icon: BrightnessLevel::new(percent).icon_name(),
            tooltip: format!("{percent}%"),
            muted: false,
        }
    }

    fn no_device(icon: &'static str) -> Self {
        Self {
            icon,
            tooltip: "No audio device".to_string(),
            muted: false,
        }
    }
}

fn stream_tooltip(info: &StreamInfo) -> String {
    if info.is_muted {
        "Muted".to_string()
    } else {
        format!("{}%", info.volume)
    }
}
