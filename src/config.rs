use std::path::Path;

use serde::Deserialize;

use crate::storage::backends::BackendConfigs;

/// The default cache-control duration applied to written objects.
///
/// One year, matching the immutability of generated paths: a path is never
/// re-used for different content, so aggressive caching is safe.
pub const DEFAULT_CACHE_CONTROL_SECS: u32 = 31_536_000;

/// The default cap on accepted source uploads (32 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 32 << 20;

#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    /// The set storage backend configuration.
    pub backend: BackendConfigs,

    #[serde(default = "default_cache_control")]
    /// The `max-age` in seconds applied to every written object.
    ///
    /// Defaults to one year.
    pub cache_control_secs: u32,

    #[serde(default = "default_max_upload_size")]
    /// The maximum accepted source upload size in bytes.
    ///
    /// Uploads beyond this are rejected before any decoding happens.
    pub max_upload_size: usize,
}

impl RuntimeConfig {
    /// Loads the runtime config from a YAML or JSON file.
    ///
    /// The format is selected by the file extension, anything that is not
    /// `.json` is treated as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;

        let cfg = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&data)?,
            _ => serde_yaml::from_str(&data)?,
        };

        Ok(cfg)
    }
}

const fn default_cache_control() -> u32 {
    DEFAULT_CACHE_CONTROL_SECS
}

const fn default_max_upload_size() -> usize {
    DEFAULT_MAX_UPLOAD_SIZE
}
