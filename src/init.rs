use chrono::Local;
use env_logger::Env;
use std::io::Write;

/// Initialize logging. `RUST_LOG` overrides the `info` default.
pub fn log_init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = Env::default().default_filter_or(default_filter);
    env_logger::Builder::from_env(env)
        .format(|fmt, record| {
            writeln!(
                fmt,
                "[{} {}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                &record.args()
            )
        })
        .init();
}
