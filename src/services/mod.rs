pub mod clock;
pub mod compatibility;
pub mod daily_picks;
pub mod engine;
pub mod fingerprint;
pub mod generators;
pub mod ingest;
pub mod journey;
pub mod ports;
pub mod recommendations;
pub mod updater;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineSettings, PersonalizationEngine, DEFAULT_RECOMMENDATION_LIMIT};
pub use ports::{ContentCatalog, EventLog, ProfileStore};
