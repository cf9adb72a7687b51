//! Speaker and microphone volume.
//!
//! The backends are poll based, [`AudioService`] refreshes both streams
//! periodically and after each of our own writes, every observed difference
//! is announced through the stream's signals.

#[cfg(feature = "my_alsa")]
mod alsa_backend;
#[cfg(feature = "pulse")]
mod pulse_backend;

#[cfg(feature = "my_alsa")]
pub use alsa_backend::Alsa;
#[cfg(feature = "pulse")]
pub use pulse_backend::PulseAudio;

use crate::{
    error::{DeviceError, LogError},
    range::ValueRange,
    scheduler::Scheduler,
    signal::{HandlerId, Signal},
    source::Source,
    timeout::Interval,
};
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
    str::FromStr,
    time::Duration,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StreamKind {
    Speaker,
    Microphone,
}

impl StreamKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Speaker => "speaker",
            Self::Microphone => "microphone",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speaker" | "output" | "sink" => Ok(Self::Speaker),
            "microphone" | "mic" | "input" | "source" => Ok(Self::Microphone),
            _ => Err(format!("unknown stream: {s} (expected `speaker` or `microphone`)")),
        }
    }
}

/// State of the default device of a stream.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct StreamInfo {
    /// Volume in percent, `0..=100`.
    pub volume: u8,
    pub is_muted: bool,
    pub device_name: Option<String>,
}

impl StreamInfo {
    pub fn is_bluetooth(&self) -> bool {
        self.device_name
            .as_deref()
            .map(|name| name.contains("bluez") || name.contains("bluetooth"))
            .unwrap_or(false)
    }
}

pub trait AudioBackend {
    fn name(&self) -> &'static str;

    /// Reads the default device of the given stream, `None` if there is none.
    fn read(&mut self, stream: StreamKind) -> Option<StreamInfo>;

    fn set_volume(&mut self, stream: StreamKind, percent: u8) -> Result<(), DeviceError>;

    fn set_muted(&mut self, stream: StreamKind, muted: bool) -> Result<(), DeviceError>;
}

/// Backend used when no sound system could be reached, all streams are
/// unavailable.
pub struct NoBackend;

impl AudioBackend for NoBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn read(&mut self, _: StreamKind) -> Option<StreamInfo> {
        None
    }

    fn set_volume(&mut self, stream: StreamKind, _: u8) -> Result<(), DeviceError> {
        Err(DeviceError::NoDevice(stream.name()))
    }

    fn set_muted(&mut self, stream: StreamKind, _: bool) -> Result<(), DeviceError> {
        Err(DeviceError::NoDevice(stream.name()))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BackendPreference {
    Auto,
    Pulse,
    Alsa,
    None,
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "pulse" | "pulseaudio" => Ok(Self::Pulse),
            "alsa" => Ok(Self::Alsa),
            "none" => Ok(Self::None),
            _ => Err(format!("unknown audio backend: {s}")),
        }
    }
}

#[cfg(feature = "pulse")]
fn try_pulse() -> Option<Box<dyn AudioBackend>> {
    PulseAudio::new().map(|p| Box::new(p) as Box<dyn AudioBackend>)
}

#[cfg(not(feature = "pulse"))]
fn try_pulse() -> Option<Box<dyn AudioBackend>> {
    log::debug!("built without PulseAudio support");
    None
}

#[cfg(feature = "my_alsa")]
fn try_alsa(card: &str) -> Option<Box<dyn AudioBackend>> {
    Alsa::new(card).map(|a| Box::new(a) as Box<dyn AudioBackend>)
}

#[cfg(not(feature = "my_alsa"))]
fn try_alsa(_card: &str) -> Option<Box<dyn AudioBackend>> {
    log::debug!("built without ALSA support");
    None
}

/// Picks an audio backend, PulseAudio is preferred over ALSA.
pub fn get_audio_backend(preference: BackendPreference, alsa_card: &str) -> Box<dyn AudioBackend> {
    let backend = match preference {
        BackendPreference::Auto => try_pulse().or_else(|| try_alsa(alsa_card)),
        BackendPreference::Pulse => try_pulse(),
        BackendPreference::Alsa => try_alsa(alsa_card),
        BackendPreference::None => None,
    };
    match backend {
        Some(backend) => {
            log::info!("using {} backend", backend.name());
            backend
        }
        None => {
            log::info!("no audio backend available");
            Box::new(NoBackend)
        }
    }
}

type SharedBackend = Rc<RefCell<Box<dyn AudioBackend>>>;

/// One audio stream as a [`Source`] of its volume in percent.
///
/// Volume and mute state are observed separately: `connect_changed` for the
/// volume (and device appearing or disappearing), `connect_mute_changed`
/// for the mute flag.
pub struct AudioStream {
    kind: StreamKind,
    backend: SharedBackend,
    info: RefCell<Option<StreamInfo>>,
    changed: Signal<f64>,
    mute_changed: Signal<bool>,
}

impl AudioStream {
    fn new(kind: StreamKind, backend: SharedBackend) -> Self {
        let info = backend.borrow_mut().read(kind);
        Self {
            kind,
            backend,
            info: RefCell::new(info),
            changed: Signal::new("volume-changed"),
            mute_changed: Signal::new("mute-changed"),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Last known state, `None` if there is no device.
    pub fn info(&self) -> Option<StreamInfo> {
        self.info.borrow().clone()
    }

    pub fn volume(&self) -> Option<u8> {
        self.info.borrow().as_ref().map(|i| i.volume)
    }

    pub fn is_muted(&self) -> bool {
        self.info.borrow().as_ref().map(|i| i.is_muted).unwrap_or(false)
    }

    /// Reads the device again and emits signals for everything that changed.
    pub fn refresh(&self) {
        let new = self.backend.borrow_mut().read(self.kind);
        let old = self.info.replace(new.clone());
        if old == new {
            return;
        }
        log::trace!("{}: {:?} -> {:?}", self.kind, old, new);
        let old_volume = old.as_ref().map(|i| i.volume);
        let new_volume = new.as_ref().map(|i| i.volume);
        if old_volume != new_volume || old.is_some() != new.is_some() {
            self.changed.emit(&(new_volume.unwrap_or(0) as f64));
        }
        let old_mute = old.as_ref().map(|i| i.is_muted);
        let new_mute = new.as_ref().map(|i| i.is_muted);
        if old_mute != new_mute {
            self.mute_changed.emit(&new_mute.unwrap_or(false));
        }
    }

    pub fn set_muted(&self, muted: bool) {
        if self.info.borrow().is_none() {
            return;
        }
        self.backend
            .borrow_mut()
            .set_muted(self.kind, muted)
            .log_error();
        self.refresh();
    }

    pub fn toggle_mute(&self) {
        self.set_muted(!self.is_muted());
    }

    pub fn connect_mute_changed(&self, callback: impl Fn(bool) + 'static) -> HandlerId {
        self.mute_changed.connect(move |m| callback(*m))
    }

    pub fn disconnect_mute_changed(&self, id: HandlerId) {
        self.mute_changed.disconnect(id);
    }
}

impl Source for AudioStream {
    fn value(&self) -> f64 {
        self.volume().unwrap_or(0) as f64
    }

    fn set_value(&self, value: f64) {
        if self.info.borrow().is_none() {
            return;
        }
        let percent = self.quantize(value) as u8;
        self.backend
            .borrow_mut()
            .set_volume(self.kind, percent)
            .log_error();
        self.refresh();
    }

    fn quantize(&self, value: f64) -> f64 {
        ValueRange::PERCENT.clamp(value).round()
    }

    fn connect_changed(&self, callback: Box<dyn Fn(f64)>) -> HandlerId {
        self.changed.connect(move |v| callback(*v))
    }

    fn disconnect(&self, id: HandlerId) {
        self.changed.disconnect(id);
    }

    fn is_available(&self) -> bool {
        self.info.borrow().is_some()
    }

    fn range(&self) -> ValueRange {
        ValueRange::PERCENT
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}

/// Process-wide audio service, created once at startup and shared by all
/// controls.
pub struct AudioService {
    backend_name: &'static str,
    speaker: Rc<AudioStream>,
    microphone: Rc<AudioStream>,
    refresh: Interval,
}

impl AudioService {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        scheduler: Rc<dyn Scheduler>,
        refresh_interval: Duration,
    ) -> Rc<Self> {
        let backend_name = backend.name();
        let backend: SharedBackend = Rc::new(RefCell::new(backend));
        let speaker = Rc::new(AudioStream::new(StreamKind::Speaker, backend.clone()));
        let microphone = Rc::new(AudioStream::new(StreamKind::Microphone, backend));
        let this = Rc::new(Self {
            backend_name,
            speaker,
            microphone,
            refresh: Interval::new(scheduler),
        });
        if !refresh_interval.is_zero() {
            let weak: Weak<Self> = Rc::downgrade(&this);
            this.refresh.start(refresh_interval, move || {
                if let Some(this) = weak.upgrade() {
                    this.refresh();
                }
            });
        }
        this
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    pub fn speaker(&self) -> &Rc<AudioStream> {
        &self.speaker
    }

    pub fn microphone(&self) -> &Rc<AudioStream> {
        &self.microphone
    }

    pub fn stream(&self, kind: StreamKind) -> &Rc<AudioStream> {
        match kind {
            StreamKind::Speaker => &self.speaker,
            StreamKind::Microphone => &self.microphone,
        }
    }

    pub fn refresh(&self) {
        self.speaker.refresh();
        self.microphone.refresh();
    }

    /// Stops the periodic refresh.
    pub fn shutdown(&self) {
        self.refresh.stop();
    }
}
