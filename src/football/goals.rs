use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::form_urlencoded;

use super::gateway::{Gateway, GatewayError};
use crate::state::models::{FixtureId, GoalEvent};

/// Anything that can report the tracked team's current goal count.
#[async_trait]
pub trait GoalSource: Send + Sync {
    /// The filtered goal count as the provider reports it right now.
    /// A failed lookup is an error, never zero.
    async fn count_goals(&self, team_id: &str, fixture_id: &FixtureId) -> Result<u32, GatewayError>;
}

/// Counts goals from the provider's goal-type event feed.
pub struct GoalCounter {
    gateway: Arc<dyn Gateway>,
}

impl GoalCounter {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        GoalCounter { gateway }
    }
}

#[async_trait]
impl GoalSource for GoalCounter {
    async fn count_goals(&self, team_id: &str, fixture_id: &FixtureId) -> Result<u32, GatewayError> {
        let path = goal_events_path(team_id, fixture_id);
        let raw = self.gateway.fetch_response(&path).await?;
        let events = decode_goal_events(&path, raw)?;

        let summaries: Vec<String> = events.iter().map(GoalEvent::summary).collect();
        debug!("Checked for goal: {:?}", summaries);

        let scored = events.iter().filter(|ev| ev.is_scoring()).count();
        if scored < events.len() {
            info!(
                "Ignoring {} missed penalt{}",
                events.len() - scored,
                if events.len() - scored == 1 { "y" } else { "ies" }
            );
        }
        Ok(scored as u32)
    }
}

pub fn goal_events_path(team_id: &str, fixture_id: &FixtureId) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("fixture", fixture_id.as_str())
        .append_pair("team", team_id)
        .append_pair("type", "goal")
        .finish();
    format!("/fixtures/events?{}", query)
}

fn decode_goal_events(
    path: &str,
    raw: Vec<serde_json::Value>,
) -> Result<Vec<GoalEvent>, GatewayError> {
    raw.into_iter()
        .map(|value| {
            if !value.is_object() {
                return Err(GatewayError::Malformed {
                    path: path.to_string(),
                    reason: format!("goal event is not an object: {}", value),
                });
            }
            serde_json::from_value(value).map_err(|e| GatewayError::Malformed {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
