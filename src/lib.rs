// 库文件，导出模块
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod ssh;
pub mod transfer;
pub mod utils;

use anyhow::Result;
use config::Config;
use ssh::SshConnector;
use transfer::{Outcome, Runner};

pub fn run_transfer(config: &Config) -> Result<Outcome> {
    let runner = Runner::new(SshConnector::default()).show_progress(!config.quiet);
    let outcome = runner.run(&config.transfer)?;
    Ok(outcome)
}
