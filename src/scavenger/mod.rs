pub mod clock;
pub mod engine;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod resolver;
pub mod templates;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{BotIdentity, Decision, EngineContext, PrTask, StalenessPolicy};
pub use pipeline::Scanner;
pub use pool::TaskPool;
pub use report::{RunReport, RunSummary};
pub use resolver::RepoResolver;
