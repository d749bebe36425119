pub mod error;
pub mod message;
pub mod paths;
pub mod settings;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use message::{ControlRequest, EnhancedResult, PageDirective, PageRequest};
pub use paths::Paths;
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsPatch, SettingsStore};
pub use transport::{AgentBus, FrameTarget, FrameTransport, LoopbackTransport};
pub use types::{FeatureConfig, FrameId, Meaning, TabId, TranslationRequest, TranslationResult};
