use log::{debug, trace};
use scp_password::cli::{self, Cli};
use scp_password::config::Config;
use scp_password::run_transfer;
use scp_password::utils::error::ConfigError;

fn main() {
    let cli = match cli::parse(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => usage_error(&e),
    };
    init_logging(&cli);

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => usage_error(&e),
    };
    trace!("config: {:?}", config.transfer);

    match run_transfer(&config) {
        Ok(outcome) => {
            debug!("{:?}: {} bytes", outcome.direction, outcome.bytes);
            println!("{}", config.transfer);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn usage_error(e: &ConfigError) -> ! {
    let message = e.to_string();
    if !message.is_empty() {
        eprintln!("{}", message);
    }
    println!();
    print!("{}", cli::usage());
    std::process::exit(1);
}
