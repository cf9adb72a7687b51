use super::{AudioBackend, StreamInfo, StreamKind};
use crate::error::{DeviceError, LogError, LogNone};
use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};

/// Controls the `Master` (playback) and `Capture` simple mixer elements of an
/// ALSA card.
pub struct Alsa {
    mixer: Mixer,
    card: String,
}

fn to_percent(value: i64, (min, max): (i64, i64)) -> u8 {
    if max <= min {
        return 0;
    }
    let range = max - min;
    (((value - min) * 100 + range / 2) / range).clamp(0, 100) as u8
}

fn from_percent(percent: u8, (min, max): (i64, i64)) -> i64 {
    min + (percent.min(100) as i64 * (max - min) + 50) / 100
}

impl Alsa {
    pub fn new(card: &str) -> Option<Self> {
        let mixer = Mixer::new(card, false).log_error()?;
        let this = Self {
            mixer,
            card: card.to_string(),
        };
        this.element(StreamKind::Speaker)
            .log_none("ALSA: Unable to find simple control 'Master',0")?;
        Some(this)
    }

    fn element_name(stream: StreamKind) -> &'static str {
        match stream {
            StreamKind::Speaker => "Master",
            StreamKind::Microphone => "Capture",
        }
    }

    fn element(&self, stream: StreamKind) -> Option<Selem<'_>> {
        self.mixer
            .find_selem(&SelemId::new(Self::element_name(stream), 0))
    }

    fn require_element(&self, stream: StreamKind) -> Result<Selem<'_>, DeviceError> {
        self.element(stream)
            .ok_or_else(|| DeviceError::MissingElement(Self::element_name(stream).to_string()))
    }
}

impl AudioBackend for Alsa {
    fn name(&self) -> &'static str {
        "ALSA"
    }

    fn read(&mut self, stream: StreamKind) -> Option<StreamInfo> {
        self.mixer.handle_events().log_error();
        let elem = self.element(stream)?;
        let channel = SelemChannelId::mono();
        let (volume, switch) = match stream {
            StreamKind::Speaker => (
                to_percent(
                    elem.get_playback_volume(channel).log_error()?,
                    elem.get_playback_volume_range(),
                ),
                elem.get_playback_switch(channel).unwrap_or(1),
            ),
            StreamKind::Microphone => (
                to_percent(
                    elem.get_capture_volume(channel).log_error()?,
                    elem.get_capture_volume_range(),
                ),
                elem.get_capture_switch(channel).unwrap_or(1),
            ),
        };
        Some(StreamInfo {
            volume,
            is_muted: switch == 0,
            device_name: Some(self.card.clone()),
        })
    }

    fn set_volume(&mut self, stream: StreamKind, percent: u8) -> Result<(), DeviceError> {
        let elem = self.require_element(stream)?;
        match stream {
            StreamKind::Speaker => elem
                .set_playback_volume_all(from_percent(percent, elem.get_playback_volume_range()))?,
            StreamKind::Microphone => elem
                .set_capture_volume_all(from_percent(percent, elem.get_capture_volume_range()))?,
        }
        Ok(())
    }

    fn set_muted(&mut self, stream: StreamKind, muted: bool) -> Result<(), DeviceError> {
        let elem = self.require_element(stream)?;
        let switch = if muted { 0 } else { 1 };
        match stream {
            StreamKind::Speaker => elem.set_playback_switch_all(switch)?,
            StreamKind::Microphone => elem.set_capture_switch_all(switch)?,
        }
        Ok(())
    }
}
