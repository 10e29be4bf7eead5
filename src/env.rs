use std::env;
use std::path::PathBuf;

pub const VERSION_URL: &str = "https://gapi.game-monmusu-td.net/api/asset_bundle/version";
pub const ASSETS_BASE: &str = "https://assets.game-monmusu-td.net";
pub const CHANNEL: &str = "webgl_r18";
pub const PROVIDER: &str = "dmm";

/// Client revision sent with every version request.
pub const CLIENT_REVISION: &str = "1";

pub const CACHE_FILE: &str = "ablist.json";

/// Local asset tree; listings and the cached manifest live here.
pub fn assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

pub fn cache_path() -> PathBuf {
    assets_dir().join(CACHE_FILE)
}

/// Where the previous manifest is copied before it is overwritten.
pub fn backup_dir() -> PathBuf {
    env::temp_dir()
}
