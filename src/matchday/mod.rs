pub mod dispatcher;
pub mod poller;

pub use dispatcher::{MatchDay, RunOutcome};
pub use poller::PollSettings;
