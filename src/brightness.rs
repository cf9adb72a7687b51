//! Screen brightness through the kernel backlight interface.

use crate::{
    error::{DeviceError, LogError},
    range::ValueRange,
    scheduler::Scheduler,
    signal::{HandlerId, Signal},
    source::Source,
    timeout::Interval,
};
use std::{
    cell::{Cell, RefCell},
    fs,
    path::{Path, PathBuf},
    rc::{Rc, Weak},
    time::Duration,
};

/// Reported for current and maximum brightness when there is no backlight.
pub const NO_DEVICE: i64 = -1;

pub trait BrightnessBackend {
    fn name(&self) -> &str;

    /// Returns `(current, max)` in raw device units.
    fn read(&mut self) -> Result<(i64, i64), DeviceError>;

    fn write(&mut self, value: i64) -> Result<(), DeviceError>;
}

/// A device under `/sys/class/backlight`.
pub struct SysfsBacklight {
    dir: PathBuf,
    name: String,
}

impl SysfsBacklight {
    pub const DEFAULT_ROOT: &'static str = "/sys/class/backlight";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { dir, name }
    }

    /// Finds the device called `device` under `root`, or the first one (by
    /// name) if `device` is `None`.
    pub fn detect(root: &Path, device: Option<&str>) -> Option<Self> {
        if let Some(device) = device {
            let dir = root.join(device);
            return if dir.join("max_brightness").is_file() {
                Some(Self::new(dir))
            } else {
                log::info!("no backlight device named '{device}' in {}", root.display());
                None
            };
        }
        let mut candidates: Vec<PathBuf> = fs::read_dir(root)
            .map_err(|e| log::debug!("cannot list {}: {e}", root.display()))
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|dir| dir.join("max_brightness").is_file())
            .collect();
        candidates.sort();
        candidates.into_iter().next().map(Self::new)
    }

    fn read_file(&self, file: &str) -> Result<i64, DeviceError> {
        let path = self.dir.join(file);
        let content = fs::read_to_string(&path).map_err(|source| DeviceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.trim().parse().map_err(|_| DeviceError::Parse {
            path: path.display().to_string(),
            value: content.trim().to_string(),
        })
    }
}

impl BrightnessBackend for SysfsBacklight {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<(i64, i64), DeviceError> {
        Ok((self.read_file("brightness")?, self.read_file("max_brightness")?))
    }

    fn write(&mut self, value: i64) -> Result<(), DeviceError> {
        let path = self.dir.join("brightness");
        fs::write(&path, value.to_string()).map_err(|source| DeviceError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Process-wide brightness service and [`Source`] of the raw brightness.
pub struct BrightnessService {
    backend: RefCell<Option<Box<dyn BrightnessBackend>>>,
    current: Cell<i64>,
    max: Cell<i64>,
    changed: Signal<f64>,
    refresh: Interval,
}

impl BrightnessService {
    pub fn new(
        backend: Option<Box<dyn BrightnessBackend>>,
        scheduler: Rc<dyn Scheduler>,
        refresh_interval: Duration,
    ) -> Rc<Self> {
        if let Some(backend) = &backend {
            log::info!("using backlight device '{}'", backend.name());
        } else {
            log::info!("no backlight device");
        }
        let this = Rc::new(Self {
            backend: RefCell::new(backend),
            current: Cell::new(NO_DEVICE),
            max: Cell::new(NO_DEVICE),
            changed: Signal::new("screen"),
            refresh: Interval::new(scheduler),
        });
        this.read_device();
        if this.backend.borrow().is_some() && !refresh_interval.is_zero() {
            let weak: Weak<Self> = Rc::downgrade(&this);
            this.refresh.start(refresh_interval, move || {
                if let Some(this) = weak.upgrade() {
                    this.refresh();
                }
            });
        }
        this
    }

    /// Current brightness in device units, [`NO_DEVICE`] without a backlight.
    pub fn screen_brightness(&self) -> i64 {
        self.current.get()
    }

    /// Maximum brightness in device units, [`NO_DEVICE`] without a backlight.
    pub fn max_screen(&self) -> i64 {
        self.max.get()
    }

    pub fn percent(&self) -> Option<u8> {
        if self.is_available() {
            Some(self.range().percent(self.current.get() as f64))
        } else {
            None
        }
    }

    /// Updates the cached values, returns whether anything changed.
    fn read_device(&self) -> bool {
        let result = self.backend.borrow_mut().as_mut().map(|b| b.read());
        let (current, max) = match result {
            Some(Ok(values)) => values,
            Some(Err(error)) => {
                log::error!("{error}");
                (NO_DEVICE, NO_DEVICE)
            }
            None => (NO_DEVICE, NO_DEVICE),
        };
        let changed = self.current.replace(current) != current;
        self.max.replace(max) != max || changed
    }

    pub fn refresh(&self) {
        if self.read_device() {
            log::trace!("brightness: {}/{}", self.current.get(), self.max.get());
            self.changed.emit(&(self.current.get() as f64));
        }
    }

    pub fn set_screen_brightness(&self, value: i64) {
        if !self.is_available() {
            return;
        }
        let value = value.clamp(0, self.max.get());
        if let Some(backend) = self.backend.borrow_mut().as_mut() {
            backend.write(value).log_error();
        }
        self.refresh();
    }

    pub fn shutdown(&self) {
        self.refresh.stop();
    }
}

impl Source for BrightnessService {
    fn value(&self) -> f64 {
        self.current.get() as f64
    }

    fn set_value(&self, value: f64) {
        self.set_screen_brightness(self.quantize(value) as i64);
    }

    fn quantize(&self, value: f64) -> f64 {
        value.round()
    }

    fn connect_changed(&self, callback: Box<dyn Fn(f64)>) -> HandlerId {
        self.changed.connect(move |v| callback(*v))
    }

    fn disconnect(&self, id: HandlerId) {
        self.changed.disconnect(id);
    }

    fn is_available(&self) -> bool {
        self.max.get() > 0 && self.current.get() != NO_DEVICE
    }

    fn range(&self) -> ValueRange {
        ValueRange::new(0.0, self.max.get() as f64)
    }

    fn name(&self) -> &str {
        "brightness"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn fake_backlight(root: &Path, name: &str, current: i64, max: i64) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("brightness"), format!("{current}\n")).unwrap();
        fs::write(dir.join("max_brightness"), format!("{max}\n")).unwrap();
        dir
    }

    fn service_for(dir: &Path, scheduler: Rc<ManualScheduler>) -> Rc<BrightnessService> {
        BrightnessService::new(
            Some(Box::new(SysfsBacklight::new(dir))),
            scheduler,
            Duration::from_secs(2),
        )
    }

    #[test]
    fn detect_picks_named_or_first_device() {
        let root = tempfile::tempdir().unwrap();
        fake_backlight(root.path(), "intel_backlight", 10, 100);
        fake_backlight(root.path(), "acpi_video0", 3, 15);
        fs::create_dir(root.path().join("broken")).unwrap();
        assert_eq!(SysfsBacklight::detect(root.path(), None).unwrap().name(), "acpi_video0");
        let named = SysfsBacklight::detect(root.path(), Some("intel_backlight")).unwrap();
        assert_eq!(named.name(), "intel_backlight");
        assert!(SysfsBacklight::detect(root.path(), Some("broken")).is_none());
        assert!(SysfsBacklight::detect(&root.path().join("missing"), None).is_none());
    }

    #[test]
    fn reads_and_writes_sysfs() {
        let root = tempfile::tempdir().unwrap();
        let dir = fake_backlight(root.path(), "intel_backlight", 120, 480);
        let service = service_for(&dir, Rc::new(ManualScheduler::new()));
        assert_eq!(service.screen_brightness(), 120);
        assert_eq!(service.max_screen(), 480);
        assert_eq!(service.percent(), Some(25));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        service.connect_changed(Box::new(move |v| s.borrow_mut().push(v)));
        service.set_value(1000.0);
        assert_eq!(fs::read_to_string(dir.join("brightness")).unwrap(), "480");
        assert_eq!(*seen.borrow(), [480.0]);
    }

    #[test]
    fn no_device_reports_minus_one() {
        let service = BrightnessService::new(None, Rc::new(ManualScheduler::new()), Duration::ZERO);
        assert_eq!(service.screen_brightness(), NO_DEVICE);
        assert_eq!(service.max_screen(), NO_DEVICE);
        assert!(!service.is_available());
        assert!(!service.range().is_usable());
        assert_eq!(service.percent(), None);
        service.set_value(10.0);
        assert_eq!(service.screen_brightness(), NO_DEVICE);
    }

    #[test]
    fn refresh_notices_external_changes_and_removal() {
        let root = tempfile::tempdir().unwrap();
        let dir = fake_backlight(root.path(), "intel_backlight", 50, 100);
        let scheduler = Rc::new(ManualScheduler::new());
        let service = service_for(&dir, scheduler.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        service.connect_changed(Box::new(move |v| s.borrow_mut().push(v)));
        fs::write(dir.join("brightness"), "70\n").unwrap();
        scheduler.advance_ms(2000);
        assert_eq!(*seen.borrow(), [70.0]);
        fs::remove_dir_all(&dir).unwrap();
        scheduler.advance_ms(2000);
        assert_eq!(*seen.borrow(), [70.0, -1.0]);
        assert!(!service.is_available());
    }
}
