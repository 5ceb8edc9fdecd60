use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skland_attendance::cli::{Cli, Command};
use skland_attendance::config::AppConfig;
use skland_attendance::notify::HttpNotifier;
use skland_attendance::notify::selftest::run_self_test;
use skland_attendance::orchestrator::AttendanceOrchestrator;
use skland_attendance::skland::SklandClient;
use skland_attendance::ui::Printer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "skland_attendance=debug"
    } else {
        "skland_attendance=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(n) = cli.max_retries {
        config.max_retries = n;
    }

    let notifier = HttpNotifier::new(config.notifier_options())?;
    let printer = Printer::default();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            config.validate()?;
            let api = SklandClient::new(config.request_timeout())?;
            let jobs = config.account_jobs();
            info!(accounts = jobs.len(), "starting daily check-in");

            let orchestrator = AttendanceOrchestrator::new(&api, &notifier, config.retry_settings());
            let summaries = orchestrator.run_accounts(&jobs).await;
            for (job, summary) in jobs.iter().zip(&summaries) {
                printer.account(job, summary);
            }
        }
        Command::TestNotifications => {
            let channels = config.channels();
            info!(channels = channels.len(), "sending test notifications");
            let summary = run_self_test(&notifier, &channels).await;
            printer.self_test(&summary);
        }
    }

    Ok(())
}
