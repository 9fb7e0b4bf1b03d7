use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::gist::GistId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub version: u32,
    pub remote: Option<RemoteConfig>,
}

/// Persistent per-user state. Tag colors and pins are round-tripped opaquely
/// for the settings layer; this core only uses tag strings as index keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u32,

    #[serde(default)]
    pub token: Option<String>,

    /// gist id -> assigned tags; survives restarts and refetches.
    #[serde(default)]
    pub tags: BTreeMap<GistId, BTreeSet<String>>,

    #[serde(default)]
    pub tag_colors: BTreeMap<String, String>,

    #[serde(default)]
    pub pinned_tags: Vec<String>,
}
