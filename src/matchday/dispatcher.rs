use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tracing::info;

use super::poller::{MatchPoller, PollSettings, PollSummary};
use crate::football::{FixtureFinder, GoalSource};
use crate::indicator::Indicator;
use crate::schedule::ActivationScheduler;
use crate::state::models::{Fixture, Season};
use crate::state::FixtureStore;

/// What a single invocation ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A stored fixture was polled to the end and the state cleared
    Polled(PollSummary),
    /// Today's fixture was found, stored, and a kickoff job registered
    Scheduled(Fixture),
    NothingToday,
}

/// Top-level flow for one run: poll the stored fixture if there is one,
/// otherwise look for a fixture today and arrange to be woken at kickoff.
pub struct MatchDay {
    pub team_id: String,
    pub fixtures: FixtureFinder,
    pub goals: Arc<dyn GoalSource>,
    pub indicator: Arc<dyn Indicator>,
    pub scheduler: Arc<dyn ActivationScheduler>,
    pub store: FixtureStore,
    pub settings: PollSettings,
}

impl MatchDay {
    pub async fn run(&self, now: DateTime<FixedOffset>) -> Result<RunOutcome> {
        match self.store.load().await? {
            Some(fixture_id) => {
                info!("Stored fixture {} found, polling for goals", fixture_id);
                let summary = MatchPoller::new(self.goals.as_ref(), self.indicator.as_ref(), self.settings)
                    .run(&self.team_id, &fixture_id)
                    .await;

                // Always drop back to discovery, even if the job could not be removed
                let deregistered = self.scheduler.deregister().await;
                self.store.clear().await?;
                deregistered.context("Failed to remove kickoff job")?;
                info!("Cleared stored fixture {}", fixture_id);

                Ok(RunOutcome::Polled(summary))
            }
            None => {
                let season = Season::for_date(now.date_naive());
                let Some(fixture) = self.fixtures.find_today(&self.team_id, season, now).await else {
                    return Ok(RunOutcome::NothingToday);
                };

                self.store.save(&fixture.id).await?;
                info!("Writing fixture to file - id: {}", fixture.id);

                // A stored id without a kickoff job would make the next daily
                // run poll a match that has not started
                if let Err(e) = self.scheduler.schedule(fixture.kickoff.time()).await {
                    self.store.clear().await?;
                    return Err(e.context("Failed to register kickoff job"));
                }

                Ok(RunOutcome::Scheduled(fixture))
            }
        }
    }
}
