use failure::Error;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

// Stdout belongs to the progress output, so logs go to stderr.
pub fn init(level: &str) -> Result<(), Error> {
    let level = level
        .parse::<LevelFilter>()
        .map_err(|_| format_err!("Unknown log level: {}", level))?;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| format_err!("Invalid logging configuration: {}", e))?;

    log4rs::init_config(config).map_err(|e| format_err!("Unable to start logging: {}", e))?;
    Ok(())
}
