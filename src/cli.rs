// 命令行参数解析
use crate::utils::error::ConfigError;
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsString;

pub const USAGE: &str = "scp-password [[user@]host:]file_from [[user@]host:]file_to";

/// Numeric values are kept as text here; lenient conversion and range checks
/// happen in [`crate::config`].
#[derive(Parser, Debug)]
#[command(name = "scp-password")]
#[command(about = "SCP with password")]
#[command(override_usage = USAGE)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Remote port
    #[arg(short = 'P', long, value_name = "PORT", allow_hyphen_values = true)]
    pub port: Option<String>,

    /// Password
    #[arg(long, env = "SCP_PASSWORD", hide_env_values = true, allow_hyphen_values = true)]
    pub password: Option<String>,

    /// ConnectTimeout=X (where X is in seconds)
    #[arg(short = 'o', long = "option", value_name = "OPTION")]
    pub options: Vec<String>,

    /// Equals to -o ConnectTimeout=X
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub connect_timeout: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not show the progress meter
    #[arg(short, long)]
    pub quiet: bool,

    /// Usage
    #[arg(short = 'h', long, action = ArgAction::SetTrue)]
    pub help: bool,

    /// [[user@]host:]file_from [[user@]host:]file_to
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

/// Parses the raw arguments, the program name first. Syntax errors keep
/// only the argument library's one-line message.
pub fn parse<I, T>(args: I) -> Result<Cli, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| ConfigError::Usage(first_line(&e)))
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    line.trim_start_matches("error:").trim().to_string()
}

/// Full usage banner, printed after any argument error.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn usage_names_the_endpoint_syntax() {
        let text = usage();
        assert!(text.contains(USAGE));
        assert!(text.contains("SCP with password"));
        assert!(text.contains("--connect-timeout"));
    }

    #[test]
    fn unknown_flag_keeps_one_line() {
        let err = parse(["scp-password", "--recursive", "a", "b"]).unwrap_err();
        match err {
            ConfigError::Usage(msg) => {
                assert!(msg.contains("--recursive"), "{}", msg);
                assert!(!msg.contains('\n'));
                assert!(!msg.starts_with("error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn flags_interleave_with_files() {
        let cli = parse([
            "scp-password",
            "a.txt",
            "-P",
            "2222",
            "bob@10.0.0.1:b.txt",
            "-o",
            "ConnectTimeout=5",
        ])
        .unwrap();
        assert_eq!(cli.files, vec!["a.txt", "bob@10.0.0.1:b.txt"]);
        assert_eq!(cli.port.as_deref(), Some("2222"));
        assert_eq!(cli.options, vec!["ConnectTimeout=5"]);
    }
}
