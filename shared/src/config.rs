use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_PRESETS: &str = "data/presets.toml";

pub struct ServiceConfig {
    /// Address the chart service listens on
    pub addr: SocketAddr,
    /// TOML file holding the chart presets
    pub presets_path: PathBuf,
}

impl ServiceConfig {
    pub fn load(manifest_dir: &Path) -> Result<Self> {
        #[cfg(debug_assertions)]
        {
            let env_file = manifest_dir.join(".env");
            if env_file.exists() {
                dotenvy::from_path(&env_file).context("Can't read .env file")?;
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = manifest_dir;

        let addr = env::var("DASHBOARD_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
        Ok(Self {
            addr: addr
                .parse()
                .with_context(|| format!("DASHBOARD_ADDR `{addr}` is not a socket address"))?,
            presets_path: env::var_os("DASHBOARD_PRESETS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRESETS)),
        })
    }
}

/// Load service config using the calling crate's manifest directory.
#[macro_export]
macro_rules! load_service_config {
    () => {
        $crate::config::ServiceConfig::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")))
    };
}
