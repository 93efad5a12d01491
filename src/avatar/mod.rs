//! Avatar configuration and its mapping onto sheet assets
//!
//! `configuration` declares what an avatar wears, `paths` turns each worn
//! piece into the asset path that stores its artwork, `layers` orders the
//! pieces for compositing and `animations` names the clips a finished sheet
//! plays.

pub mod animations;
pub mod configuration;
pub mod layers;
pub mod paths;

pub use animations::{AnimationClip, AnimationRegistrar};
pub use configuration::{AvatarConfiguration, BodyType};
pub use layers::{build_layers, Layer, LayerName, Tint};
pub use paths::split_style_color;
