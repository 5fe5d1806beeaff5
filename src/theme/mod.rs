//! Design-token theme resolution.
//!
//! The [`ThemeStore`] holds flat custom-property tokens (`--color-red-500`),
//! the config [`LayerStack`](crate::config::LayerStack) holds legacy nested
//! theme objects, and [`resolve_theme`] merges both into a [`ResolvedTheme`].

mod merge;
mod namespace;
mod path_ops;
mod resolver;
mod store;

#[cfg(test)]
mod tests;

pub use merge::deep_merge;
pub use namespace::{DEFAULT_KEY, namespace_for_segment, split_variable, theme_key_for_namespace};
pub use path_ops::split_path;
pub use resolver::{ResolvedTheme, ThemeAccessor, resolve_theme};
pub use store::ThemeStore;
