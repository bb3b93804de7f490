pub mod api_football;
pub mod fixtures;
pub mod gateway;
pub mod goals;

pub use api_football::ApiFootball;
pub use fixtures::FixtureFinder;
pub use gateway::{Gateway, GatewayError};
pub use goals::{GoalCounter, GoalSource};
