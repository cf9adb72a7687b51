use crate::AnyResult;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

const PATTERN: &str = "{l:<5}| {m}\n";

/// Level used when neither the command line nor the config file set one.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    }
}

/// Builds the log4rs config: messages from this crate go to `log_file` (if
/// any) and to stderr, everything else is dropped.
pub fn build_config(level: LevelFilter, log_file: Option<&Path>) -> AnyResult<Config> {
    let mut builder = Config::builder();
    let mut logger = Logger::builder();
    if let Some(path) = log_file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)?;
        builder = builder.appender(Appender::builder().build("log_file", Box::new(file)));
        logger = logger.appender("log_file");
    }
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .target(Target::Stderr)
        .build();
    builder = builder.appender(Appender::builder().build("console", Box::new(console)));
    logger = logger.appender("console");
    let config = builder
        // Enable logging for this crate
        .logger(logger.additive(false).build("shell_controls", level))
        // glib and the sound libraries use the root logger so turn that off
        .build(Root::builder().build(LevelFilter::Off))?;
    Ok(config)
}

/// Installs the global logger.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> AnyResult<()> {
    log4rs::init_config(build_config(level, log_file)?)?;
    Ok(())
}
