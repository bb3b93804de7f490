pub mod crontab;

pub use crontab::Crontab;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveTime;

/// External timer that re-runs the program at kickoff.
#[async_trait]
pub trait ActivationScheduler: Send + Sync {
    /// Register the kickoff job, replacing any earlier one.
    async fn schedule(&self, kickoff: NaiveTime) -> Result<()>;

    /// Remove the kickoff job.
    async fn deregister(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ActivationScheduler;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveTime;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Schedule(NaiveTime),
        Deregister,
    }

    #[derive(Default)]
    pub struct RecordingScheduler {
        calls: Mutex<Vec<Call>>,
        fail_schedule: bool,
        fail_deregister: bool,
    }

    impl RecordingScheduler {
        pub fn failing_deregister() -> Self {
            RecordingScheduler {
                fail_deregister: true,
                ..Default::default()
            }
        }

        pub fn failing_schedule() -> Self {
            RecordingScheduler {
                fail_schedule: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActivationScheduler for RecordingScheduler {
        async fn schedule(&self, kickoff: NaiveTime) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Schedule(kickoff));
            if self.fail_schedule {
                anyhow::bail!("crontab unavailable");
            }
            Ok(())
        }

        async fn deregister(&self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Deregister);
            if self.fail_deregister {
                anyhow::bail!("crontab unavailable");
            }
            Ok(())
        }
    }
}
