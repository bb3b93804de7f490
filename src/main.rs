use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod config;
mod football;
mod indicator;
mod logging;
mod matchday;
mod schedule;
mod state;

use config::{Config, Credentials};
use football::{ApiFootball, FixtureFinder, Gateway, GoalCounter};
use indicator::{Indicator, LogIndicator, SysfsGpio};
use matchday::{MatchDay, RunOutcome};
use schedule::Crontab;
use state::FixtureStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    let _log_guard = logging::init(&config.log_dir);

    let credentials = Credentials::load(&config.config_file)?;
    info!("Tracking team {}", credentials.team_id);

    let indicator: Arc<dyn Indicator> = if config.dry_run {
        info!("DRY RUN mode - the light will only be logged");
        Arc::new(LogIndicator)
    } else {
        let gpio = SysfsGpio::open(config.gpio_pin)?;
        info!("Light on GPIO {}", gpio.pin());
        Arc::new(gpio)
    };

    let gateway: Arc<dyn Gateway> = Arc::new(ApiFootball::new(&config.api_url, &credentials.api_key)?);

    let match_day = MatchDay {
        team_id: credentials.team_id.clone(),
        fixtures: FixtureFinder::new(gateway.clone(), config.timezone.clone()),
        goals: Arc::new(GoalCounter::new(gateway)),
        indicator,
        scheduler: Arc::new(Crontab::new(config.job_command()?, config.cron_label.clone())),
        store: FixtureStore::new(&config.state_file),
        settings: config.poll_settings(),
    };

    let now = Local::now();
    match match_day.run(now.with_timezone(now.offset())).await? {
        RunOutcome::Polled(summary) => info!(
            "Match over: {} goal(s), {} flash(es), {} failed check(s)",
            summary.last_count, summary.celebrations, summary.errors
        ),
        RunOutcome::Scheduled(fixture) => info!(
            "{} scheduled for {}",
            fixture.label(),
            fixture.kickoff.format("%H:%M")
        ),
        RunOutcome::NothingToday => info!("Nothing to do today"),
    }

    Ok(())
}
