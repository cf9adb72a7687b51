//! The controls the bar and the control panel are made of.
//!
//! Sliders buffer drags through a debounced [`DebouncedSync`], icons step the
//! value by a fixed amount per scroll notch and write right away. The bar
//! strip holds one compact control per device, the audio ones follow smooth
//! scrolling exactly.

use crate::{
    audio::{AudioService, AudioStream},
    brightness::BrightnessService,
    config::Config,
    scheduler::Scheduler,
    sink::{Scroll, Sink, UserInput},
    source::Source,
    sync::{DebouncedSync, DEFAULT_DEBOUNCE},
};
use std::{fmt, rc::Rc, time::Duration};

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ControlSettings {
    pub debounce: Duration,
    /// Amount one scroll notch changes the value by, in source units.
    pub scroll_step: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            scroll_step: 5.0,
        }
    }
}

impl ControlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            scroll_step: config.scroll_step(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ControlKind {
    Brightness,
    Speaker,
    Microphone,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brightness => "brightness",
            Self::Speaker => "speaker",
            Self::Microphone => "microphone",
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum WidgetKind {
    Slider,
    Icon,
    /// Circular progress indicator in the bar strip.
    Strip,
}

/// How scroll events turn into value changes.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ScrollMapping {
    /// Every notch moves the value by this amount.
    Steps(f64),
    /// Smooth scroll deltas are applied unscaled, horizontal ones included.
    Raw,
}

impl ScrollMapping {
    fn delta(self, scroll: Scroll) -> Option<f64> {
        match self {
            Self::Steps(step) => scroll.to_delta(step),
            Self::Raw => scroll.to_raw_delta(),
        }
    }
}

fn slider(
    source: Rc<dyn Source>,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> DebouncedSync {
    DebouncedSync::debounced(source, sink, scheduler, settings.debounce)
}

pub fn speaker_slider(
    audio: &AudioService,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> DebouncedSync {
    slider(audio.speaker().clone(), sink, scheduler, settings)
}

pub fn microphone_slider(
    audio: &AudioService,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> DebouncedSync {
    slider(audio.microphone().clone(), sink, scheduler, settings)
}

pub fn brightness_slider(
    brightness: &Rc<BrightnessService>,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> DebouncedSync {
    slider(brightness.clone(), sink, scheduler, settings)
}

/// An indicator icon. Scrolling over it changes the value, clicking it
/// toggles mute for audio streams.
pub struct IconControl {
    sync: DebouncedSync,
    mapping: ScrollMapping,
    stream: Option<Rc<AudioStream>>,
}

impl IconControl {
    fn new(
        source: Rc<dyn Source>,
        stream: Option<Rc<AudioStream>>,
        sink: Rc<dyn Sink>,
        scheduler: Rc<dyn Scheduler>,
        mapping: ScrollMapping,
    ) -> Self {
        Self {
            sync: DebouncedSync::immediate(source, sink, scheduler),
            mapping,
            stream,
        }
    }

    /// Applies one scroll event, returns whether the event was handled.
    pub fn scroll(&self, scroll: Scroll) -> bool {
        match self.mapping.delta(scroll) {
            Some(delta) => {
                self.sync.handle_input(UserInput::Delta(delta));
                true
            }
            None => false,
        }
    }

    pub fn click(&self) {
        if let Some(stream) = &self.stream {
            stream.toggle_mute();
        }
    }

    /// The audio stream, `None` for brightness.
    pub fn stream(&self) -> Option<&Rc<AudioStream>> {
        self.stream.as_ref()
    }

    pub fn scroll_mapping(&self) -> ScrollMapping {
        self.mapping
    }

    pub fn sync(&self) -> &DebouncedSync {
        &self.sync
    }
}

pub fn speaker_icon(
    audio: &AudioService,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> IconControl {
    let stream = audio.speaker().clone();
    let mapping = ScrollMapping::Steps(settings.scroll_step);
    IconControl::new(stream.clone(), Some(stream), sink, scheduler, mapping)
}

pub fn microphone_icon(
    audio: &AudioService,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> IconControl {
    let stream = audio.microphone().clone();
    let mapping = ScrollMapping::Steps(settings.scroll_step);
    IconControl::new(stream.clone(), Some(stream), sink, scheduler, mapping)
}

pub fn brightness_icon(
    brightness: &Rc<BrightnessService>,
    sink: Rc<dyn Sink>,
    scheduler: Rc<dyn Scheduler>,
    settings: &ControlSettings,
) -> IconControl {
    let mapping = ScrollMapping::Steps(settings.scroll_step);
    IconControl::new(brightness.clone(), None, sink, scheduler, mapping)
}

pub struct ControlRow {
    pub kind: ControlKind,
    pub slider: DebouncedSync,
    pub icon: IconControl,
}

/// The rows of the control panel: brightness (only with a backlight), then
/// speaker and microphone.
pub struct ControlPanel {
    rows: Vec<ControlRow>,
}

impl ControlPanel {
    /// `make_sink` creates the widget for each control.
    pub fn build(
        audio: &AudioService,
        brightness: &Rc<BrightnessService>,
        scheduler: Rc<dyn Scheduler>,
        settings: &ControlSettings,
        mut make_sink: impl FnMut(ControlKind, WidgetKind) -> Rc<dyn Sink>,
    ) -> Self {
        let mut rows = Vec::with_capacity(3);
        if brightness.is_available() {
            rows.push(ControlRow {
                kind: ControlKind::Brightness,
                slider: brightness_slider(
                    brightness,
                    make_sink(ControlKind::Brightness, WidgetKind::Slider),
                    scheduler.clone(),
                    settings,
                ),
                icon: brightness_icon(
                    brightness,
                    make_sink(ControlKind::Brightness, WidgetKind::Icon),
                    scheduler.clone(),
                    settings,
                ),
            });
        } else {
            log::debug!("no backlight, leaving out the brightness row");
        }
        rows.push(ControlRow {
            kind: ControlKind::Speaker,
            slider: speaker_slider(
                audio,
                make_sink(ControlKind::Speaker, WidgetKind::Slider),
                scheduler.clone(),
                settings,
            ),
            icon: speaker_icon(
                audio,
                make_sink(ControlKind::Speaker, WidgetKind::Icon),
                scheduler.clone(),
                settings,
            ),
        });
        rows.push(ControlRow {
            kind: ControlKind::Microphone,
            slider: microphone_slider(
                audio,
                make_sink(ControlKind::Microphone, WidgetKind::Slider),
                scheduler.clone(),
                settings,
            ),
            icon: microphone_icon(
                audio,
                make_sink(ControlKind::Microphone, WidgetKind::Icon),
                scheduler,
                settings,
            ),
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[ControlRow] {
        &self.rows
    }

    pub fn row(&self, kind: ControlKind) -> Option<&ControlRow> {
        self.rows.iter().find(|row| row.kind == kind)
    }

    /// Commits every pending slider write, used when the panel closes.
    pub fn flush(&self) {
        for row in &self.rows {
            row.slider.flush();
        }
    }
}

/// The compact controls shown in the bar: brightness (only with a backlight),
/// then speaker and microphone. Brightness steps per notch, the audio
/// controls take smooth scroll deltas as they come.
pub struct ControlStrip {
    controls: Vec<(ControlKind, IconControl)>,
}

impl ControlStrip {
    pub fn build(
        audio: &AudioService,
        brightness: &Rc<BrightnessService>,
        scheduler: Rc<dyn Scheduler>,
        settings: &ControlSettings,
        mut make_sink: impl FnMut(ControlKind, WidgetKind) -> Rc<dyn Sink>,
    ) -> Self {
        let mut controls = Vec::with_capacity(3);
        if brightness.is_available() {
            let sink = make_sink(ControlKind::Brightness, WidgetKind::Strip);
            let mapping = ScrollMapping::Steps(settings.scroll_step);
            let control =
                IconControl::new(brightness.clone(), None, sink, scheduler.clone(), mapping);
            controls.push((ControlKind::Brightness, control));
        } else {
            log::debug!("no backlight, leaving brightness out of the strip");
        }
        for (kind, stream) in [
            (ControlKind::Speaker, audio.speaker()),
            (ControlKind::Microphone, audio.microphone()),
        ] {
            let sink = make_sink(kind, WidgetKind::Strip);
            let control = IconControl::new(
                stream.clone(),
                Some(stream.clone()),
                sink,
                scheduler.clone(),
                ScrollMapping::Raw,
            );
            controls.push((kind, control));
        }
        Self { controls }
    }

    pub fn controls(&self) -> &[(ControlKind, IconControl)] {
        &self.controls
    }

    pub fn control(&self, kind: ControlKind) -> Option<&IconControl> {
        self.controls
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, control)| control)
    }
}
