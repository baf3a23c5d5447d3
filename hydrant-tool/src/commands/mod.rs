pub mod fixture;
pub mod usage;

pub use fixture::FixtureCommand;
pub use usage::UsageCommand;
