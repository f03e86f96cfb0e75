use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::Parser;
use tokio::time::Duration;

use crate::error::ConfigError;
use crate::poller::PollSchedule;

/// Show the current temperature and humidity of every thermostat on a Nest account.
#[derive(Parser, Debug)]
#[command(name = "nest-poller", version)]
pub struct Cli {
    /// Account username
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,

    /// Refresh rate in ms, e.g. 60000 = 60s
    #[arg(short = 'r', long = "refreshRate")]
    pub refresh_rate: u64,

    /// Number of iterations, 0 = forever
    #[arg(short, long)]
    pub iterations: u64,
}

impl Cli {
    /// Parse the process arguments.
    ///
    /// `--help` and `--version` print and exit; any other problem is a `ConfigError`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::parse_args(std::env::args_os())
    }

    pub fn parse_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => Err(ConfigError::Arguments(e.to_string())),
        }
    }

    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            refresh: Duration::from_millis(self.refresh_rate),
            iterations: self.iterations,
        }
    }
}
