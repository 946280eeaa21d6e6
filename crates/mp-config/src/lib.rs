//! Player settings for macroplay
//!
//! Settings live in a small YAML file:
//!
//! ```yaml
//! command_pause: 0.5
//! search_attempts: 3
//! search_backoff: 1.0
//! full_screen_search: true
//! confirm_element: true
//! elements_dir: elements
//! start_delay: ${MACROPLAY_START_DELAY}
//! ```
//!
//! Every key is optional. Missing keys take their defaults.

mod error;
mod loader;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_settings, load_settings_or_default, load_settings_string};
pub use settings::{seconds, PlayerSettings};
