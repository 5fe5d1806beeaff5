//! Legacy configuration layers.
//!
//! A config layer is a nested mapping paired with the base path its relative
//! references resolve against. Layers come either from TOML files (with
//! `presets` loaded as earlier layers) or are built in code, where deferred
//! theme functions can be attached with [`ConfigValue::set_path`].

mod error;
mod layer;
mod loading;
mod value;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use layer::{
    CONTENT_KEY, ConfigLayer, ContentGlob, EXTEND_KEY, LayerStack, PRESETS_KEY, THEME_KEY,
};
pub use value::{ConfigValue, Deferred};
