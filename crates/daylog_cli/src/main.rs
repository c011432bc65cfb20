//! Command line access to journal databases.
//!
//! # Responsibility
//! - Verify `daylog_core` linkage (`ping`).
//! - Print stored journal data without a UI (`dates`, `show`).
//!
//! Settings come from flags or `DAYLOG_*` variables; see `--help`.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use daylog_core::service::loader::load_entry;
use daylog_core::{
    init_from_config, ConfigArgs, GatewayError, JournalConfig, LoadPath, LoggingError,
    PersistenceGateway, SqliteGateway,
};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

/// Daily journal storage inspector
#[derive(Parser, Debug)]
#[command(name = "daylog", version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Check that the core library is linked
    Ping,
    /// List stored dates, newest first
    Dates,
    /// Print the entry stored for a date (defaults to today)
    Show {
        /// Date as YYYY-MM-DD
        date: Option<NaiveDate>,
    },
}

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Gateway(GatewayError),
    Render(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging setup failed: {err}"),
            Self::Gateway(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "cannot render entry: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Gateway(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<GatewayError> for CliError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let command = cli.command.unwrap_or(Command::Ping);
    if command == Command::Ping {
        println!("daylog_core ping={}", daylog_core::ping());
        println!("daylog_core version={}", daylog_core::core_version());
        return Ok(());
    }

    let config = JournalConfig::from(cli.config);
    init_from_config(&config)?;
    let gateway = SqliteGateway::open_with_session(&config.db_path).await?;

    match command {
        Command::Ping => Ok(()),
        Command::Dates => {
            for date in gateway.list_dates()? {
                println!("{date} {}", weekday_label(date));
            }
            Ok(())
        }
        Command::Show { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            show(&gateway, date).await
        }
    }
}

async fn show(gateway: &SqliteGateway, date: NaiveDate) -> Result<(), CliError> {
    let record = gateway.load(date, LoadPath::DateSelected).await;
    let entry = load_entry(date, record.as_ref(), LoadPath::DateSelected);
    let rendered = serde_json::json!({
        "date": date,
        "weekday": weekday_label(date),
        "stored": record.is_some(),
        "entry": entry,
    });
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

/// Full English weekday name shown next to a date.
fn weekday_label(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

#[cfg(test)]
mod tests {
    use super::{weekday_label, Cli, Command};
    use chrono::NaiveDate;
    use clap::Parser;

    #[test]
    fn show_accepts_an_iso_date() {
        let cli = Cli::try_parse_from(["daylog", "show", "2024-05-03"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Show {
                date: NaiveDate::from_ymd_opt(2024, 5, 3)
            })
        );
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(Cli::try_parse_from(["daylog", "show", "May 3rd"]).is_err());
    }

    #[test]
    fn config_flags_precede_the_subcommand() {
        let cli = Cli::try_parse_from(["daylog", "--db-path", "/tmp/j.db", "dates"]).unwrap();
        assert_eq!(cli.command, Some(Command::Dates));
        assert_eq!(cli.config.db_path.to_str(), Some("/tmp/j.db"));
    }

    #[test]
    fn weekday_label_names_the_day() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(weekday_label(date), "Friday");
    }
}
