use clap::{Parser, Subcommand};
use log::LevelFilter;
use shell_controls::{
    audio::{get_audio_backend, AudioService, AudioStream, StreamKind},
    brightness::{BrightnessBackend, BrightnessService, SysfsBacklight},
    config::{Config, ConfigError},
    controls::ControlSettings,
    error::set_failure_hook,
    indicator::Indicator,
    logging, paths,
    range::{Adjustment, ValueRange},
    scheduler::{ManualScheduler, Scheduler},
    source::Source,
    sync::DebouncedSync,
    testing::{MockSource, RecordingSink},
    AnyResult,
};
use std::{path::PathBuf, process::ExitCode, rc::Rc, time::Duration};

/// Volume and brightness controls for the desktop shell.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Config file to use instead of the default one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Overrides `log.level` from the config file
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Shows the state of every control
    Status,
    /// Sets or changes a stream volume, e.g. `50`, `+5` or `-5`
    Volume {
        stream: StreamKind,
        #[arg(allow_hyphen_values = true)]
        value: Adjustment,
    },
    /// Toggles mute of a stream
    Mute { stream: StreamKind },
    /// Sets or changes the screen brightness in percent
    Brightness {
        #[arg(allow_hyphen_values = true)]
        value: Adjustment,
    },
    /// Prints a config value given as `section.field`, or all of them
    Get { key: Option<String> },
    /// Parses the config file and reports errors
    CheckConfig,
    /// Drives a slider with simulated drag input and reports the device
    /// writes it caused
    Simulate {
        /// Number of drag events
        #[arg(long, default_value_t = 10)]
        events: u32,
        /// Milliseconds between drag events
        #[arg(long, default_value_t = 20)]
        interval_ms: u64,
    },
    /// Follows device changes until interrupted
    #[cfg(feature = "glib")]
    Watch,
}

fn open_audio(
    config: &Config,
    scheduler: Rc<dyn Scheduler>,
    refresh: Duration,
) -> Result<Rc<AudioService>, ConfigError> {
    let backend = get_audio_backend(config.audio_backend()?, &config.audio().alsa_card);
    Ok(AudioService::new(backend, scheduler, refresh))
}

fn open_brightness(
    config: &Config,
    scheduler: Rc<dyn Scheduler>,
    refresh: Duration,
) -> Rc<BrightnessService> {
    let backend = if config.brightness().enable {
        SysfsBacklight::detect(config.sysfs_root(), config.brightness_device())
            .map(|b| Box::new(b) as Box<dyn BrightnessBackend>)
    } else {
        None
    };
    BrightnessService::new(backend, scheduler, refresh)
}

fn print_stream(stream: &AudioStream) {
    let info = stream.info();
    let indicator = match stream.kind() {
        StreamKind::Speaker => Indicator::speaker(info.as_ref()),
        StreamKind::Microphone => Indicator::microphone(info.as_ref()),
    };
    let device = info.and_then(|i| i.device_name).unwrap_or_default();
    println!("{:<11} {:<16} {device}", format!("{}:", stream.kind()), indicator.tooltip);
}

fn print_brightness(brightness: &BrightnessService) {
    if brightness.is_available() {
        let normalized = brightness.range().normalize(brightness.value());
        println!(
            "{:<11} {:<16} {}/{}",
            "brightness:",
            Indicator::brightness(normalized).tooltip,
            brightness.screen_brightness(),
            brightness.max_screen()
        );
    } else {
        println!("{:<11} no backlight", "brightness:");
    }
}

fn status(config: &Config) -> AnyResult<()> {
    let scheduler: Rc<dyn Scheduler> = Rc::new(ManualScheduler::new());
    let audio = open_audio(config, scheduler.clone(), Duration::ZERO)?;
    let brightness = open_brightness(config, scheduler, Duration::ZERO);
    println!("{:<11} {}", "audio:", audio.backend_name());
    print_stream(audio.speaker());
    print_stream(audio.microphone());
    print_brightness(&brightness);
    Ok(())
}

fn adjust(source: &dyn Source, adjustment: Adjustment) -> AnyResult<()> {
    if !source.is_available() {
        return Err(format!("no {} device", source.name()).into());
    }
    let value = adjustment.apply(source.value(), &source.range());
    log::debug!("setting {} to {value}", source.name());
    source.set_value(value);
    Ok(())
}

fn set_volume(config: &Config, kind: StreamKind, adjustment: Adjustment) -> AnyResult<()> {
    let audio = open_audio(config, Rc::new(ManualScheduler::new()), Duration::ZERO)?;
    let stream = audio.stream(kind);
    adjust(&**stream, adjustment)?;
    print_stream(stream);
    Ok(())
}

fn toggle_mute(config: &Config, kind: StreamKind) -> AnyResult<()> {
    let audio = open_audio(config, Rc::new(ManualScheduler::new()), Duration::ZERO)?;
    let stream = audio.stream(kind);
    if !stream.is_available() {
        return Err(format!("no {kind} device").into());
    }
    stream.toggle_mute();
    print_stream(stream);
    Ok(())
}

fn set_brightness(config: &Config, adjustment: Adjustment) -> AnyResult<()> {
    let brightness = open_brightness(config, Rc::new(ManualScheduler::new()), Duration::ZERO);
    if !brightness.is_available() {
        return Err("no backlight device".into());
    }
    // Adjustments are in percent, the device has its own scale.
    let max = brightness.max_screen() as f64;
    let percent = brightness.value() / max * 100.0;
    let target = adjustment.apply(percent, &ValueRange::PERCENT);
    brightness.set_value(target / 100.0 * max);
    print_brightness(&brightness);
    Ok(())
}

fn get(config: &Config, key: Option<&str>) -> AnyResult<()> {
    match key {
        Some(key) => match config.get(key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("no such config key: {key}").into()),
        },
        None => {
            for key in config.keys() {
                println!("{key} = {}", config.get(&key).unwrap_or_default());
            }
        }
    }
    Ok(())
}

fn simulate(settings: &ControlSettings, events: u32, interval: Duration) {
    let scheduler = Rc::new(ManualScheduler::new());
    let source = MockSource::new("simulated volume", 50.0, ValueRange::PERCENT);
    let sink = RecordingSink::new();
    // Behave like a toolkit slider that reports programmatic changes.
    sink.set_echo_input(true);
    let sync = DebouncedSync::debounced(
        source.clone(),
        sink.clone(),
        scheduler.clone(),
        settings.debounce,
    );
    for i in 1..=events {
        sink.drag(50.0 + i as f64 * 5.0);
        scheduler.advance(interval);
    }
    scheduler.advance(settings.debounce);
    println!(
        "{events} drag events {}ms apart, {}ms debounce",
        interval.as_millis(),
        settings.debounce.as_millis()
    );
    println!("device writes: {} {:?}", sync.writes(), source.writes());
    println!("slider shows:  {:?}", sink.last_displayed().map(|(v, _)| v));
}

#[cfg(feature = "glib")]
fn watch(config: &Config) -> AnyResult<()> {
    use glib::{Continue, MainLoop};
    use shell_controls::scheduler::GlibScheduler;

    let scheduler: Rc<dyn Scheduler> = Rc::new(GlibScheduler::new());
    let refresh = config.refresh_interval();
    let audio = open_audio(config, scheduler.clone(), refresh)?;
    let brightness = open_brightness(config, scheduler, refresh);
    for stream in [audio.speaker(), audio.microphone()] {
        print_stream(stream);
        let weak = Rc::downgrade(stream);
        stream.connect_changed(Box::new(move |_| {
            if let Some(stream) = weak.upgrade() {
                print_stream(&stream);
            }
        }));
        let weak = Rc::downgrade(stream);
        stream.connect_mute_changed(move |_| {
            if let Some(stream) = weak.upgrade() {
                print_stream(&stream);
            }
        });
    }
    print_brightness(&brightness);
    let weak = Rc::downgrade(&brightness);
    brightness.connect_changed(Box::new(move |_| {
        if let Some(brightness) = weak.upgrade() {
            print_brightness(&brightness);
        }
    }));

    let main_loop = MainLoop::new(None, false);
    let quit = main_loop.clone();
    glib::unix_signal_add_local(libc::SIGINT, move || {
        log::info!("interrupted");
        quit.quit();
        Continue(false)
    });
    log::info!("watching for changes");
    main_loop.run();
    audio.shutdown();
    brightness.shutdown();
    Ok(())
}

fn run(command: Command, config: &Config) -> AnyResult<()> {
    match command {
        Command::Status => status(config),
        Command::Volume { stream, value } => set_volume(config, stream, value),
        Command::Mute { stream } => toggle_mute(config, stream),
        Command::Brightness { value } => set_brightness(config, value),
        Command::Get { key } => get(config, key.as_deref()),
        Command::CheckConfig => {
            match config.path() {
                Some(path) => println!("{}: ok", path.display()),
                None => println!("no config file, using defaults"),
            }
            Ok(())
        }
        Command::Simulate {
            events,
            interval_ms,
        } => {
            simulate(
                &ControlSettings::from_config(config),
                events,
                Duration::from_millis(interval_ms),
            );
            Ok(())
        }
        #[cfg(feature = "glib")]
        Command::Watch => watch(config),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(paths::config_path);
    let config = Config::load(&config_path);
    let level = args.log_level.unwrap_or_else(|| match &config {
        Ok(config) => config.log_level().unwrap_or_else(|_| logging::default_level()),
        Err(_) => logging::default_level(),
    });
    #[cfg(feature = "glib")]
    let log_file = matches!(args.command, Command::Watch).then(paths::log_path);
    #[cfg(not(feature = "glib"))]
    let log_file: Option<PathBuf> = None;
    if let Err(error) = logging::init(level, log_file.as_deref()) {
        eprintln!("failed to set up logging: {error}");
    }
    set_failure_hook(|failure| {
        eprintln!("{} handler failed: {}", failure.signal, failure.message);
    });

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            log::error!("invalid config file {}", config_path.display());
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };
    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
