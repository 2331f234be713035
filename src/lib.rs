pub mod config;
pub mod error;
pub mod github;
pub mod scavenger;

pub use error::ScavengerError;
