use crate::demo::{run_alerts, run_demo, AlertArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fleet_ops::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-ops-api",
    about = "Serve and inspect the multi-subsidiary fleet dashboard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the alert report a demo user would see
    Alerts(AlertArgs),
    /// Print the dashboard for each demo subsidiary and the consolidated view
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Alerts(args) => run_alerts(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["fleet-ops-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn alerts_accepts_scope_flags() {
        let cli = Cli::try_parse_from([
            "fleet-ops-api",
            "alerts",
            "--user",
            "auditor",
            "--today",
            "2026-08-01",
            "--tenant",
            "highway",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Alerts(args)) => {
                assert_eq!(args.user, "auditor");
                assert_eq!(args.tenant.as_deref(), Some("highway"));
                assert!(!args.all);
                assert!(args.today.is_some());
            }
            other => panic!("expected alerts command, got {other:?}"),
        }
    }

    #[test]
    fn all_and_tenant_conflict() {
        let err = Cli::try_parse_from([
            "fleet-ops-api",
            "alerts",
            "--user",
            "admin",
            "--all",
            "--tenant",
            "metro",
        ])
        .expect_err("flags conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
