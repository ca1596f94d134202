use chrono::Local;
use env_logger::{Builder, Env};
use log::{LevelFilter, SetLoggerError};
use std::io::Write;

/// Map the `--verbose` level of the binaries onto a log filter:
/// 0 errors only, 1 warnings, 2 progress (default), 3 debug, 4 and up trace.
pub fn level_for(verbose: i32) -> LevelFilter {
    match verbose {
        i32::MIN..=0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to stderr with a local timestamp. `RUST_LOG` overrides `verbose`.
pub fn init(verbose: i32) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for(verbose))
        .parse_env(Env::default())
        .format(|buf, record| {
            let time_str = Local::now().format("%x - %I:%M.%S%p");
            writeln!(buf, "{time_str} {:<5} {}", record.level(), record.args())
        });
    builder.try_init()
}
