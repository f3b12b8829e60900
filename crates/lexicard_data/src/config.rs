use anyhow::{Context, Result};
use lexicard_core::TrainingConfig;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.ron";

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    Ok(crate::app_data_dir()?.join(CONFIG_FILE))
}

/// 读取训练配置，文件不存在时使用默认值
pub fn load_config(path: &Path) -> Result<TrainingConfig> {
    if !path.exists() {
        debug!("⚙️ 未找到配置文件 {:?}，使用默认配置", path);
        return Ok(TrainingConfig::default());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    let config: TrainingConfig =
        ron::from_str(&content).with_context(|| format!("Failed to parse config: {:?}", path))?;
    debug!("⚙️ 已加载配置: {:?}", config);
    Ok(config)
}

/// 保存训练配置
pub fn save_config(path: &Path, config: &TrainingConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {:?}", parent))?;
    }

    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())
        .context("Failed to serialize config")?;
    fs::write(path, content).with_context(|| format!("Failed to write config: {:?}", path))?;
    Ok(())
}
