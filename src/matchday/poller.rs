use std::time::Duration;
use tracing::{debug, info, warn};

use crate::football::GoalSource;
use crate::indicator::{flash, FlashPattern, Indicator};
use crate::state::models::FixtureId;

/// Cadence and length of an in-match polling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay after every check, failed or not
    pub interval: Duration,
    /// Checks before the match is assumed over (99 × 65 s ≈ 107 min)
    pub max_iterations: u32,
    pub flash: FlashPattern,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: Duration::from_secs(65),
            max_iterations: 99,
            flash: FlashPattern::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Polling,
    /// Last check failed; waiting one interval before trying again
    ErrorBackoff,
    Finished,
}

/// What a fresh goal count means relative to the last one seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Scored { from: u32, to: u32 },
    /// Provider now reports fewer goals (VAR reversal)
    Corrected { from: u32, to: u32 },
    Unchanged(u32),
}

/// Last successfully fetched goal count. Only ever set from a fresh count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalTracker {
    last_count: u32,
}

impl GoalTracker {
    pub fn last_count(&self) -> u32 {
        self.last_count
    }

    pub fn observe(&mut self, count: u32) -> Observation {
        let from = self.last_count;
        self.last_count = count;
        match count.cmp(&from) {
            std::cmp::Ordering::Greater => Observation::Scored { from, to: count },
            std::cmp::Ordering::Less => Observation::Corrected { from, to: count },
            std::cmp::Ordering::Equal => Observation::Unchanged(count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub iterations: u32,
    /// Times the flash pattern was played
    pub celebrations: u32,
    pub errors: u32,
    pub last_count: u32,
    pub phase: PollPhase,
}

/// Polls the goal count for one fixture and flashes the light on every
/// increase. Runs for a fixed number of checks; there is no full-time
/// detection.
pub struct MatchPoller<'a> {
    goals: &'a dyn GoalSource,
    indicator: &'a dyn Indicator,
    settings: PollSettings,
}

impl<'a> MatchPoller<'a> {
    pub fn new(goals: &'a dyn GoalSource, indicator: &'a dyn Indicator, settings: PollSettings) -> Self {
        MatchPoller {
            goals,
            indicator,
            settings,
        }
    }

    pub async fn run(&self, team_id: &str, fixture_id: &FixtureId) -> PollSummary {
        let mut tracker = GoalTracker::default();
        let mut phase = PollPhase::Polling;
        let mut celebrations = 0;
        let mut errors = 0;

        for iteration in 1..=self.settings.max_iterations {
            debug!(
                "Poll {}/{} ({:?})",
                iteration, self.settings.max_iterations, phase
            );
            info!(
                "Checking for goal - team: {} fixture: {}",
                team_id, fixture_id
            );

            phase = match self.goals.count_goals(team_id, fixture_id).await {
                Err(e) => {
                    errors += 1;
                    warn!(
                        "Error getting goal data ({}) - will try again in {:?}",
                        e, self.settings.interval
                    );
                    PollPhase::ErrorBackoff
                }
                Ok(count) => {
                    match tracker.observe(count) {
                        Observation::Scored { from, to } => {
                            info!("TEAM SCORED! {} -> {}", from, to);
                            celebrations += 1;
                            flash(self.indicator, &self.settings.flash).await;
                        }
                        Observation::Corrected { from, to } => {
                            warn!(
                                "Got fewer goals than before ({} -> {}), likely VAR. Resetting goal count to {}",
                                from, to, to
                            );
                        }
                        Observation::Unchanged(_) => info!("No new goal"),
                    }
                    PollPhase::Polling
                }
            };

            tokio::time::sleep(self.settings.interval).await;
        }

        info!(
            "Polling finished after {} checks: {} goal(s), {} celebration(s), {} failed check(s)",
            self.settings.max_iterations,
            tracker.last_count(),
            celebrations,
            errors
        );

        PollSummary {
            iterations: self.settings.max_iterations,
            celebrations,
            errors,
            last_count: tracker.last_count(),
            phase: PollPhase::Finished,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedGoals;
    use super::*;
    use crate::indicator::test_support::RecordingIndicator;

    fn instant(max_iterations: u32) -> PollSettings {
        PollSettings {
            interval: Duration::ZERO,
            max_iterations,
            flash: FlashPattern {
                repetitions: 5,
                on: Duration::ZERO,
                off: Duration::ZERO,
            },
        }
    }

    async fn poll(script: Vec<Option<u32>>, max_iterations: u32) -> (PollSummary, RecordingIndicator) {
        let goals = ScriptedGoals::new(script);
        let light = RecordingIndicator::default();
        let summary = MatchPoller::new(&goals, &light, instant(max_iterations))
            .run("40", &FixtureId::new("592225"))
            .await;
        assert_eq!(goals.calls(), max_iterations);
        (summary, light)
    }

    #[test]
    fn test_tracker_sequence_with_var_reversal() {
        let mut tracker = GoalTracker::default();
        let observed: Vec<Observation> = [0, 1, 1, 2, 1, 3]
            .into_iter()
            .map(|c| tracker.observe(c))
            .collect();
        assert_eq!(
            observed,
            vec![
                Observation::Unchanged(0),
                Observation::Scored { from: 0, to: 1 },
                Observation::Unchanged(1),
                Observation::Scored { from: 1, to: 2 },
                Observation::Corrected { from: 2, to: 1 },
                Observation::Scored { from: 1, to: 3 },
            ]
        );
        assert_eq!(tracker.last_count(), 3);
    }

    #[tokio::test]
    async fn test_fires_once_per_increase() {
        let (summary, light) = poll(vec![Some(0), Some(1), Some(1), Some(2), Some(1), Some(3)], 6).await;
        assert_eq!(summary.celebrations, 3);
        assert_eq!(summary.last_count, 3);
        // Each celebration is one full five-blink pattern
        assert_eq!(light.flashes(), 15);
    }

    #[tokio::test]
    async fn test_multi_goal_jump_fires_once() {
        let (summary, light) = poll(vec![Some(0), Some(3)], 2).await;
        assert_eq!(summary.celebrations, 1);
        assert_eq!(light.flashes(), 5);
    }

    #[tokio::test]
    async fn test_errors_leave_count_untouched() {
        let (summary, light) = poll(vec![Some(1), None, None, Some(1), None, Some(2)], 6).await;
        assert_eq!(summary.errors, 3);
        assert_eq!(summary.celebrations, 2);
        assert_eq!(summary.last_count, 2);
        assert_eq!(light.flashes(), 10);
    }

    #[tokio::test]
    async fn test_error_after_goal_does_not_refire() {
        // An error must not look like a drop to zero followed by a new goal
        let (summary, _) = poll(vec![Some(1), None, Some(1)], 3).await;
        assert_eq!(summary.celebrations, 1);
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn test_only_errors_never_fire() {
        let (summary, light) = poll(vec![None; 10], 10).await;
        assert_eq!(summary.errors, 10);
        assert_eq!(summary.celebrations, 0);
        assert_eq!(summary.last_count, 0);
        assert!(light.transitions().is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_iteration_ceiling() {
        let (summary, _) = poll(vec![Some(0), Some(1)], 99).await;
        assert_eq!(summary.iterations, 99);
        assert_eq!(summary.phase, PollPhase::Finished);
        assert_eq!(summary.celebrations, 1);
    }

    #[test]
    fn test_default_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(65));
        assert_eq!(settings.max_iterations, 99);
    }
}
