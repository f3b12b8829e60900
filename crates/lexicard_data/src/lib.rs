use anyhow::Result;
use std::path::PathBuf;

mod catalog;
pub mod config;
mod loader;

pub use catalog::{validate, Catalog, ALL_CATEGORIES, ALL_LEVELS};
pub use loader::CatalogLoader;

/// 应用数据根目录（`<data_local_dir>/Lexicard`）
pub fn app_data_dir() -> Result<PathBuf> {
    #[cfg(any(target_os = "macos", target_os = "linux"))]
    let base = dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("无法获取数据目录"))?;

    #[cfg(target_os = "windows")]
    let base = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("无法获取数据目录"))?;

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    let base = PathBuf::from(".");

    Ok(base.join("Lexicard"))
}
