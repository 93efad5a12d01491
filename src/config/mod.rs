pub mod settings;

pub use settings::{ComposerSettings, FetchBackend};
