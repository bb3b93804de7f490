use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::gateway::Gateway;
use crate::state::models::{Fixture, FixtureId, Season};

/// Result of scanning the team's fixtures for today
#[derive(Debug, Clone, PartialEq)]
pub enum TodayFixture {
    /// First fixture today, kickoff still ahead
    Upcoming(Fixture),
    /// First fixture today has already kicked off; joining mid-match is not supported
    AlreadyStarted(Fixture),
    NoneToday,
}

/// Looks up whether the tracked team plays today.
pub struct FixtureFinder {
    gateway: Arc<dyn Gateway>,
    timezone: String,
}

impl FixtureFinder {
    pub fn new(gateway: Arc<dyn Gateway>, timezone: impl Into<String>) -> Self {
        FixtureFinder {
            gateway,
            timezone: timezone.into(),
        }
    }

    /// Return today's fixture if it has not kicked off yet.
    ///
    /// Provider failures are logged and reported as "no fixture".
    pub async fn find_today(
        &self,
        team_id: &str,
        season: Season,
        now: DateTime<FixedOffset>,
    ) -> Option<Fixture> {
        info!("Checking fixtures for team {} in season {}", team_id, season);
        let path = fixtures_path(team_id, season, &self.timezone);

        let entries = match self.gateway.fetch_response(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error getting fixture data from {}: {}", self.gateway.name(), e);
                return None;
            }
        };
        debug!("{} fixtures returned for season {}", entries.len(), season);

        match pick_today_fixture(&entries, now) {
            TodayFixture::Upcoming(fixture) => {
                info!(
                    "Fixture today! {} at {} id: {}",
                    fixture.label(),
                    fixture.kickoff.time(),
                    fixture.id
                );
                Some(fixture)
            }
            TodayFixture::AlreadyStarted(fixture) => {
                info!(
                    "Fixture already started: {} kicked off at {}",
                    fixture.label(),
                    fixture.kickoff.time()
                );
                None
            }
            TodayFixture::NoneToday => {
                info!("No fixture today");
                None
            }
        }
    }
}

pub fn fixtures_path(team_id: &str, season: Season, timezone: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("team", team_id)
        .append_pair("season", &season.to_string())
        .append_pair("timezone", timezone)
        .finish();
    format!("/fixtures?{}", query)
}

/// Pick the first fixture dated today (in `now`'s offset), in provider order.
pub fn pick_today_fixture(entries: &[serde_json::Value], now: DateTime<FixedOffset>) -> TodayFixture {
    let today = now.date_naive();
    let todays = entries
        .iter()
        .filter_map(|entry| parse_fixture(entry, now.offset()))
        .find(|fixture| fixture.date == today);

    match todays {
        Some(fixture) if fixture.kickoff > now => TodayFixture::Upcoming(fixture),
        Some(fixture) => TodayFixture::AlreadyStarted(fixture),
        None => TodayFixture::NoneToday,
    }
}

fn parse_fixture(entry: &serde_json::Value, offset: &FixedOffset) -> Option<Fixture> {
    let info = &entry["fixture"];
    let id = info["id"]
        .as_u64()
        .map(|v| v.to_string())
        .or_else(|| info["id"].as_str().map(str::to_string));
    let Some(id) = id else {
        debug!("Skipping fixture entry without id: {}", entry);
        return None;
    };

    let kickoff = match info["date"].as_str().map(DateTime::parse_from_rfc3339) {
        Some(Ok(dt)) => dt.with_timezone(offset),
        _ => {
            debug!("Skipping fixture {} without a usable date", id);
            return None;
        }
    };

    let team_name = |side: &str| {
        entry["teams"][side]["name"]
            .as_str()
            .map(str::to_string)
    };

    Some(Fixture {
        id: FixtureId::new(id),
        date: kickoff.date_naive(),
        kickoff,
        home_team: team_name("home"),
        away_team: team_name("away"),
    })
}
