use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::Deserialize;
use std::fmt;

/// Provider-assigned fixture identifier, kept as text because it is only
/// ever echoed back to the provider or written to the state file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureId(String);

impl FixtureId {
    pub fn new(id: impl Into<String>) -> Self {
        FixtureId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Competition season, labelled by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Season(pub i32);

impl Season {
    /// Seasons roll over in June: January–May still belong to the season
    /// that started the previous year.
    pub fn resolve(year: i32, month: u32) -> Self {
        if month < 6 {
            Season(year - 1)
        } else {
            Season(year)
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::resolve(date.year(), date.month())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled match for the tracked team
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: FixtureId,
    /// Kickoff, expressed in the local offset used for comparisons
    pub kickoff: DateTime<FixedOffset>,
    pub date: NaiveDate,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

impl Fixture {
    /// "Home vs Away", or the fixture id when the provider omitted team names.
    pub fn label(&self) -> String {
        match (&self.home_team, &self.away_team) {
            (Some(home), Some(away)) => format!("{} vs {}", home, away),
            _ => format!("fixture {}", self.id),
        }
    }
}

/// One entry of the provider's goal-type event feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GoalEvent {
    /// Event type, "Goal" for everything this feed returns
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// "Normal Goal" | "Own Goal" | "Penalty" | "Missed Penalty"
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub time: Option<EventTime>,
    #[serde(default)]
    pub player: Option<EventPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventTime {
    #[serde(default)]
    pub elapsed: Option<i32>,
    #[serde(default)]
    pub extra: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventPlayer {
    #[serde(default)]
    pub name: Option<String>,
}

pub const MISSED_PENALTY: &str = "Missed Penalty";

impl GoalEvent {
    /// Missed penalties are reported in the goal feed but never count.
    pub fn is_scoring(&self) -> bool {
        self.detail.as_deref() != Some(MISSED_PENALTY)
    }

    pub fn summary(&self) -> String {
        let minute = match &self.time {
            Some(EventTime { elapsed: Some(m), extra: Some(x) }) => format!("{}+{}'", m, x),
            Some(EventTime { elapsed: Some(m), .. }) => format!("{}'", m),
            _ => "?'".to_string(),
        };
        let player = self
            .player
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("unknown");
        let detail = self
            .detail
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("Goal");
        format!("{} {} ({})", minute, player, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_before_june_is_previous_year() {
        assert_eq!(Season::resolve(2021, 5), Season(2020));
        for month in 1..=5 {
            assert_eq!(Season::resolve(2024, month), Season(2023));
        }
    }

    #[test]
    fn test_season_from_june_is_current_year() {
        assert_eq!(Season::resolve(2020, 7), Season(2020));
        for month in 6..=12 {
            assert_eq!(Season::resolve(2024, month), Season(2024));
        }
    }

    #[test]
    fn test_season_for_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(Season::for_date(date), Season(2026));
    }

    #[test]
    fn test_missed_penalty_is_not_scoring() {
        let missed = GoalEvent {
            detail: Some(MISSED_PENALTY.into()),
            ..Default::default()
        };
        let penalty = GoalEvent {
            detail: Some("Penalty".into()),
            ..Default::default()
        };
        assert!(!missed.is_scoring());
        assert!(penalty.is_scoring());
        assert!(GoalEvent::default().is_scoring());
    }

    #[test]
    fn test_goal_event_from_provider_json() {
        let raw = serde_json::json!({
            "time": {"elapsed": 45, "extra": 2},
            "team": {"id": 40, "name": "Liverpool"},
            "player": {"id": 306, "name": "Mohamed Salah"},
            "type": "Goal",
            "detail": "Normal Goal"
        });
        let ev: GoalEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(ev.kind.as_deref(), Some("Goal"));
        assert_eq!(ev.summary(), "45+2' Mohamed Salah (Normal Goal)");
    }
}
