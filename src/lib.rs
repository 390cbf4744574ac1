pub mod config;
pub mod error;
pub mod keys;
pub mod launch;
pub mod logging;
pub mod logs;
pub mod menu;
pub mod paths;
pub mod preset;
pub mod resolver;
pub mod util;

pub use config::{LauncherConfig, load_config};
pub use error::LauncherError;
pub use preset::{ModSet, Preset};
pub use resolver::{ModFlag, ResolvedModList};
