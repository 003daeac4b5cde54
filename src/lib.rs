pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod logger;
pub mod plugin;
pub mod plugins;
pub mod process;
pub mod session;

pub use config::ExtensionConfig;
pub use env::EnvironmentMap;
pub use errors::{EnvError, HostError, Result};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use plugin::{LifecycleParticipant, ParticipantManager};
pub use plugins::MinikubeExtension;
pub use session::{Properties, PropertyStore, Session};
