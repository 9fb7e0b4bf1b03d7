use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::model::{GistId, RemoteConfig, StoreConfig, StoreState};

const STORE_VERSION: u32 = 1;

/// On-disk persistence: remote config, auth token, and the local-only gist
/// metadata (tags, tag colors, pinned tags) that must survive restarts.
#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// `GISTLING_DIR` overrides the per-user config directory.
    pub fn default_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("GISTLING_DIR") {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|d| d.join("gistling"))
            .ok_or_else(|| anyhow!("no config directory available"))
    }

    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!(
                "no gistling state at {} (run `gistling login`)",
                root.display()
            ));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn init(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).context("create store dir")?;
        let store = Self {
            root: root.to_path_buf(),
        };
        if !store.config_path().exists() {
            store.write_config(&StoreConfig {
                version: STORE_VERSION,
                remote: None,
            })?;
        }
        if !store.state_path().exists() {
            store.write_state(&StoreState {
                version: STORE_VERSION,
                ..Default::default()
            })?;
        }
        Ok(store)
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn read_config(&self) -> Result<StoreConfig> {
        let bytes = fs::read(self.config_path()).context("read config.json")?;
        let cfg: StoreConfig = serde_json::from_slice(&bytes).context("parse config.json")?;
        if cfg.version != STORE_VERSION {
            anyhow::bail!("unsupported config version {}", cfg.version);
        }
        Ok(cfg)
    }

    pub fn write_config(&self, cfg: &StoreConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cfg).context("serialize config")?;
        write_atomic(&self.config_path(), &bytes).context("write config.json")?;
        Ok(())
    }

    pub fn read_state(&self) -> Result<StoreState> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(StoreState {
                version: STORE_VERSION,
                ..Default::default()
            });
        }
        let bytes = fs::read(&path).context("read state.json")?;
        let st: StoreState = serde_json::from_slice(&bytes).context("parse state.json")?;
        if st.version != STORE_VERSION {
            anyhow::bail!("unsupported state version {}", st.version);
        }
        Ok(st)
    }

    pub fn write_state(&self, st: &StoreState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(st).context("serialize state")?;
        write_atomic(&self.state_path(), &bytes).context("write state.json")?;
        Ok(())
    }

    pub fn remote(&self) -> Result<Option<RemoteConfig>> {
        Ok(self.read_config()?.remote)
    }

    pub fn set_remote(&self, remote: RemoteConfig) -> Result<()> {
        let mut cfg = self.read_config()?;
        cfg.remote = Some(remote);
        self.write_config(&cfg)
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.read_state()?.token)
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        let mut st = self.read_state()?;
        st.token = Some(token.to_string());
        self.write_state(&st)
    }

    pub fn clear_token(&self) -> Result<()> {
        let mut st = self.read_state()?;
        st.token = None;
        self.write_state(&st)
    }

    pub fn tags_for(&self, id: &GistId) -> Result<BTreeSet<String>> {
        Ok(self
            .read_state()?
            .tags
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    pub fn set_tags_for(&self, id: &GistId, tags: &BTreeSet<String>) -> Result<()> {
        let mut st = self.read_state()?;
        if tags.is_empty() {
            st.tags.remove(id);
        } else {
            st.tags.insert(id.clone(), tags.clone());
        }
        self.write_state(&st)
    }

    /// Re-key tag assignments when a create confirms its real identity.
    pub fn rename_tag_owner(&self, old: &GistId, new: &GistId) -> Result<()> {
        let mut st = self.read_state()?;
        if let Some(tags) = st.tags.remove(old) {
            st.tags.insert(new.clone(), tags);
            self.write_state(&st)?;
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
