// 配置管理
use crate::cli::{self, Cli};
use crate::endpoint::Endpoint;
use crate::utils::error::ConfigError;
use log::debug;
use std::ffi::OsString;
use std::fmt;

pub const PORT_DEFAULT: u16 = 22;
const CONNECT_TIMEOUT_KEY: &str = "ConnectTimeout=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// One run of the program: the validated transfer plus output switches.
#[derive(Debug, Clone)]
pub struct Config {
    pub transfer: TransferConfig,
    pub verbose: bool,
    pub quiet: bool,
}

/// A validated transfer. Exactly one endpoint is remote, a username and a
/// password are known, and the port is in range.
#[derive(Clone)]
pub struct TransferConfig {
    from: Endpoint,
    to: Endpoint,
    port: u16,
    password: String,
    connect_timeout: u32,
    host: String,
    username: String,
}

// 校验前的中间状态，字段可缺失
struct Draft {
    from: Option<Endpoint>,
    to: Option<Endpoint>,
    port: i64,
    password: Option<String>,
    connect_timeout: i64,
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_cli(&cli::parse(args)?)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.help {
            return Err(ConfigError::Help);
        }

        Ok(Config {
            transfer: Draft::from_cli(cli).validate()?,
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }
}

impl Draft {
    /// Every `-o` carrying `ConnectTimeout=` applies in order (the last wins);
    /// other `-o` values are ignored.
    fn from_cli(cli: &Cli) -> Self {
        let mut draft = Draft {
            from: None,
            to: None,
            port: i64::from(PORT_DEFAULT),
            password: cli.password.clone(),
            connect_timeout: 0,
        };

        if let Some(port) = &cli.port {
            draft.port = lenient_int(port);
        }

        for option in &cli.options {
            match option.split_once(CONNECT_TIMEOUT_KEY) {
                Some((_, seconds)) => draft.connect_timeout = lenient_int(seconds),
                None => debug!("ignoring unsupported option: {}", option),
            }
        }

        // --connect-timeout 优先于 -o ConnectTimeout=
        if let Some(seconds) = &cli.connect_timeout {
            draft.connect_timeout = lenient_int(seconds);
        }

        if let [from, to] = cli.files.as_slice() {
            draft.from = Some(Endpoint::parse(from));
            draft.to = Some(Endpoint::parse(to));
        }

        draft
    }

    /// Rules are checked in a fixed order; the first failure is reported.
    fn validate(self) -> Result<TransferConfig, ConfigError> {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(ConfigError::FileRequired),
        };

        let (remote, local) = match (from.is_remote(), to.is_remote()) {
            (false, false) => return Err(ConfigError::HostRequired),
            (true, true) => return Err(ConfigError::LocalPathRequired),
            (true, false) => (&from, &to),
            (false, true) => (&to, &from),
        };

        let port = u16::try_from(self.port)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(ConfigError::PortRequired)?;

        let username = remote
            .username
            .clone()
            .or_else(|| local.username.clone())
            .ok_or(ConfigError::UserRequired)?;

        let password = self.password.ok_or(ConfigError::PasswordRequired)?;

        if from.path.is_empty() && to.path.is_empty() {
            return Err(ConfigError::PathRequired);
        }

        let host = remote.host.clone().unwrap_or_default();
        let connect_timeout = u32::try_from(self.connect_timeout.max(0)).unwrap_or(u32::MAX);

        Ok(TransferConfig {
            from,
            to,
            port,
            password,
            connect_timeout,
            host,
            username,
        })
    }
}

impl TransferConfig {
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    pub fn to(&self) -> &Endpoint {
        &self.to
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Seconds; zero disables the timeout.
    pub fn connect_timeout(&self) -> u32 {
        self.connect_timeout
    }

    /// The remote endpoint's host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The remote endpoint's username, or the local endpoint's if the remote
    /// one has none.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn direction(&self) -> Direction {
        if self.from.is_remote() {
            Direction::Download
        } else {
            Direction::Upload
        }
    }
}

impl fmt::Display for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferConfig")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("port", &self.port)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// 无法解析的数字按 0 处理
fn lenient_int(s: &str) -> i64 {
    s.parse::<i32>().map(i64::from).unwrap_or(0)
}
