//! Command-line trigger for the reminder engine.
//!
//! # Responsibility
//! - Provide an external trigger for notification generation (cron, ops).
//! - Print the visible feed and dashboard summary for quick inspection.
//!
//! Without a subcommand the binary prints core ping/version. Configuration
//! comes from `--config` (or `FLEETDESK_CONFIG`) and the `FLEETDESK_*`
//! environment overrides.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use fleetdesk_core::db::open_db;
use fleetdesk_core::{
    init_logging, local_today, CoreConfig, NotificationService, SqliteNotificationRepository,
    SqliteVehicleRepository,
};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fleetdesk_cli")]
#[command(version, about = "FleetDesk reminder and notification engine")]
struct Cli {
    /// JSON config file
    #[arg(long, env = "FLEETDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run one notification generation pass
    Generate {
        /// Day to evaluate, YYYY-MM-DD (default: today)
        #[arg(value_parser = parse_day)]
        date: Option<NaiveDate>,
    },

    /// Print visible notifications in feed order
    Feed,

    /// Print dashboard urgency counts
    Summary {
        /// Day to evaluate, YYYY-MM-DD (default: today)
        #[arg(value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Some(command) = cli.command else {
        println!("fleetdesk_core ping={}", fleetdesk_core::ping());
        println!("fleetdesk_core version={}", fleetdesk_core::core_version());
        return Ok(());
    };

    let config = CoreConfig::load(cli.config.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.db_path)?;
    let service = NotificationService::new(
        SqliteVehicleRepository::try_new(&conn)?,
        SqliteNotificationRepository::try_new(&conn)?,
    );

    match command {
        Commands::Generate { date } => {
            let today = date.unwrap_or_else(local_today);
            let report = service.generate(today, Utc::now())?;
            println!(
                "candidates={} inserted={} unchanged={}",
                report.candidates, report.inserted, report.unchanged
            );
        }
        Commands::Feed => {
            for notification in service.visible_feed()? {
                let marker = if notification.is_read { " " } else { "*" };
                println!(
                    "{marker} [{}] {} {}",
                    notification.priority.as_str(),
                    notification.id,
                    notification.message
                );
            }
        }
        Commands::Summary { date } => {
            let summary = service.summary(date.unwrap_or_else(local_today))?;
            println!(
                "expired={} due_within_week={} due_within_month={} valid={} unknown={}",
                summary.expired,
                summary.due_within_week,
                summary.due_within_month,
                summary.valid,
                summary.unknown
            );
        }
    }

    Ok(())
}

fn parse_day(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use chrono::NaiveDate;
    use clap::error::ErrorKind;
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_accepts_optional_date() {
        let cli = Cli::try_parse_from(["fleetdesk_cli", "generate", "2025-06-01"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Generate {
                date: NaiveDate::from_ymd_opt(2025, 6, 1)
            })
        );

        let cli = Cli::try_parse_from(["fleetdesk_cli", "summary"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Summary { date: None }));
    }

    #[test]
    fn config_flag_without_subcommand_parses() {
        let cli = Cli::try_parse_from(["fleetdesk_cli", "--config", "/etc/fleet.json"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/fleet.json")));
    }

    #[test]
    fn malformed_date_and_unknown_command_are_rejected() {
        let err = Cli::try_parse_from(["fleetdesk_cli", "generate", "01.06.2025"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = Cli::try_parse_from(["fleetdesk_cli", "purge"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
