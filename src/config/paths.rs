//! Platform directory layout, resolved through the `dirs` crate.
//!
//! Settings live in the per-user config directory, recordings kept for
//! debugging in the local data directory:
//!
//! | Platform | Settings | Recordings |
//! |----------|----------|------------|
//! | Linux    | `~/.config/vocatalk/` | `~/.local/share/vocatalk/recordings/` |
//! | macOS    | `~/Library/Application Support/vocatalk/` | same tree |
//! | Windows  | `%APPDATA%\vocatalk\` | `%LOCALAPPDATA%\vocatalk\recordings\` |

use std::path::PathBuf;

/// Resolved locations for everything vocatalk writes to disk.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path of `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory where finished recordings can be kept for debugging.
    pub recordings_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "vocatalk";

    /// Resolve every path for the current platform.
    ///
    /// When the platform reports no standard directory the current working
    /// directory stands in, so the application still runs in stripped-down
    /// environments (containers, CI).
    pub fn new() -> Self {
        let config_dir = Self::rooted(dirs::config_dir());
        let recordings_dir = Self::rooted(dirs::data_local_dir()).join("recordings");
        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            recordings_dir,
        }
    }

    fn rooted(base: Option<PathBuf>) -> PathBuf {
        base.unwrap_or_else(|| PathBuf::from(".")).join(Self::APP_NAME)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
