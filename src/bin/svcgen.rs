use svcgen::cli::run_cli;
use svcgen::logging::{init_logging_with_config, LogConfig};

fn main() {
    let log_config = LogConfig::from_env();
    let guard = match init_logging_with_config(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {e:#}");
            None
        }
    };

    let result = run_cli();
    // flush buffered logs before a possible exit
    drop(guard);

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}
