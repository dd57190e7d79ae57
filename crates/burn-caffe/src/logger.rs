use log::{LevelFilter, SetLoggerError};
use log4rs::{
    Config,
    append::console::ConsoleAppender,
    config::{Appender, Root, runtime::ConfigErrors},
    encode::pattern::PatternEncoder,
};

/// Why the console logger could not be installed.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    /// Another logger is already installed; callers may ignore this.
    #[error(transparent)]
    AlreadySet(#[from] SetLoggerError),
}

/// Route `log` records to stdout.
pub fn init_log() -> Result<(), LoggerError> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("[{h({l})} - {f}:{L}] {m}{n}")))
        .build();
    let appender = Appender::builder().build("stdout", Box::new(stdout));

    let config = Config::builder()
        .appender(appender)
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    update_panic_hook();

    Ok(())
}

fn update_panic_hook() {
    let hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {info}");
        hook(info);
    }));
}
