use super::{AudioBackend, StreamInfo, StreamKind};
use crate::error::{DeviceError, LogError};
use libpulse_binding::volume::{ChannelVolumes, Volume};
use pulsectl::controllers::{types::DeviceInfo, DeviceControl, SinkController, SourceController};

/// Controls the default sink and source of the PulseAudio server.
///
/// The default devices are looked up on every call so switching the output
/// device (e.g. connecting headphones) is picked up by the next refresh.
pub struct PulseAudio {
    sinks: SinkController,
    sources: SourceController,
}

impl PulseAudio {
    pub fn new() -> Option<Self> {
        let sinks = SinkController::create().log_error()?;
        let sources = SourceController::create().log_error()?;
        Some(Self { sinks, sources })
    }

    fn volume2percent(volume: Volume) -> u8 {
        (volume.0 / (Volume::NORMAL.0 / 100)).min(100) as u8
    }

    fn percent2volume(percent: u8) -> Volume {
        Volume(percent.min(100) as u32 * (Volume::NORMAL.0 / 100))
    }

    fn default_device(&mut self, stream: StreamKind) -> Result<DeviceInfo, DeviceError> {
        let result = match stream {
            StreamKind::Speaker => self.sinks.get_default_device(),
            StreamKind::Microphone => self.sources.get_default_device(),
        };
        result.map_err(|e| DeviceError::Pulse(format!("{e}")))
    }

    fn set_channels(channels: &mut ChannelVolumes, percent: u8) -> &ChannelVolumes {
        channels.set(channels.len(), Self::percent2volume(percent))
    }
}

impl AudioBackend for PulseAudio {
    fn name(&self) -> &'static str {
        "PulseAudio"
    }

    fn read(&mut self, stream: StreamKind) -> Option<StreamInfo> {
        let device = self.default_device(stream).ok()?;
        Some(StreamInfo {
            volume: Self::volume2percent(device.volume.avg()),
            is_muted: device.mute,
            device_name: device.name,
        })
    }

    fn set_volume(&mut self, stream: StreamKind, percent: u8) -> Result<(), DeviceError> {
        let mut device = self.default_device(stream)?;
        let volume = Self::set_channels(&mut device.volume, percent);
        match stream {
            StreamKind::Speaker => self.sinks.set_device_volume_by_index(device.index, volume),
            StreamKind::Microphone => self.sources.set_device_volume_by_index(device.index, volume),
        }
        Ok(())
    }

    fn set_muted(&mut self, stream: StreamKind, muted: bool) -> Result<(), DeviceError> {
        let device = self.default_device(stream)?;
        match stream {
            StreamKind::Speaker => self.sinks.set_device_mute_by_index(device.index, muted),
            StreamKind::Microphone => self.sources.set_device_mute_by_index(device.index, muted),
        }
        Ok(())
    }
}
