use anyhow::{Context, Result, bail};
use reimburse_core::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "reimburse.toml";

/// Explicit path, or the default file when it exists.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            p.exists().then_some(p)
        }
    }
}

/// Load and validate the engine config. No file means built-in defaults;
/// an explicitly named file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let Some(p) = config_path(explicit) else {
        return Ok(EngineConfig::default());
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg = parse_config(&s).with_context(|| format!("parse {}", p.display()))?;
    tracing::debug!("loaded config from {}", p.display());
    Ok(cfg)
}

pub fn parse_config(s: &str) -> Result<EngineConfig> {
    let cfg: EngineConfig = toml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn render_config(cfg: &EngineConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config already exists: {} (pass --force to overwrite)",
            path.display()
        );
    }
    let s = render_config(&EngineConfig::default())?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
