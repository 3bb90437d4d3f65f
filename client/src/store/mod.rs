//! Plain state values with pure transitions. The `*Store` wrappers add
//! persistence; the output buffer is owned by whoever runs a pattern.

pub mod output;
pub mod patterns;
pub mod settings;

pub use output::{OutputAction, OutputBuffer};
pub use patterns::{FAVORITES_KEY, PatternAction, PatternState, PatternStore};
pub use settings::{SETTINGS_KEY, SettingsAction, SettingsStore};
