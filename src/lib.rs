// Paperdoll: layered avatar sprite-sheet composition
// Declarative looks in, animated sheets out

pub mod assets;
pub mod avatar;
pub mod compose;
pub mod config;
pub mod manager;
pub mod utils;

// Re-export commonly used types for convenience
pub use assets::{AssetFetch, FileFetcher, HttpFetcher, LoadFailure, RasterSheet, ResourceCache};
pub use avatar::{AnimationClip, AvatarConfiguration, BodyType};
pub use compose::{
    ComposeError, ComposedTexture, CompositionCache, CompositionDriver, DriverUpdate,
    SheetComposer, TextureHandle,
};
pub use config::{ComposerSettings, FetchBackend};
pub use manager::SpriteManager;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
