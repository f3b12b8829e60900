use crate::catalog::Catalog;
use anyhow::{Context, Result};
use lexicard_core::VocabularyEntry;
use log::{debug, warn};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 随二进制发布的内置词库
#[derive(RustEmbed)]
#[folder = "../../catalog"]
#[include = "*.ron"]
struct EmbeddedCatalog;

/// 词库加载器：内置词条 + 用户词库目录中的 `.ron` 文件
pub struct CatalogLoader {
    catalog_dir: PathBuf,
}

impl CatalogLoader {
    /// 使用 `<app_data_dir>/catalog`，不存在时创建，方便用户直接放入词库文件
    pub fn new() -> Result<Self> {
        let catalog_dir = crate::app_data_dir()?.join("catalog");
        fs::create_dir_all(&catalog_dir)
            .with_context(|| format!("Failed to create catalog dir: {:?}", catalog_dir))?;
        debug!("📂 用户词库目录: {:?}", catalog_dir);

        Ok(Self { catalog_dir })
    }

    pub fn with_catalog_dir(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
        }
    }

    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    /// 只加载内置词库
    pub fn builtin() -> Result<Catalog> {
        let mut entries = embedded_entries()?;
        entries.sort_by_key(|e| e.id);
        Catalog::new(entries).context("Invalid built-in catalog")
    }

    /// 合并内置词条和用户词条后校验；同 ID 时用户词条优先，多个用户文件按路径顺序覆盖
    pub fn load(&self) -> Result<Catalog> {
        let mut by_id: HashMap<u32, VocabularyEntry> = embedded_entries()?
            .into_iter()
            .map(|entry| (entry.id, entry))
            .collect();
        debug!("📚 内置词条: {} 个", by_id.len());

        let mut files = Vec::new();
        collect_catalog_files(&self.catalog_dir, &mut files)?;
        files.sort();

        for path in files {
            let parsed = match read_entries(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("⚠️ 跳过无法解析的词库文件 {:?}: {:#}", path, e);
                    continue;
                }
            };
            debug!("📚 {:?}: {} 个词条", path, parsed.len());
            for entry in parsed {
                if by_id.contains_key(&entry.id) {
                    debug!("🔄 词条 {} 被用户词库替换", entry.id);
                }
                by_id.insert(entry.id, entry);
            }
        }

        let mut entries: Vec<_> = by_id.into_values().collect();
        entries.sort_by_key(|e| e.id);
        Catalog::new(entries).context("Invalid catalog")
    }
}

fn embedded_entries() -> Result<Vec<VocabularyEntry>> {
    let mut entries = Vec::new();
    for name in EmbeddedCatalog::iter() {
        let Some(file) = EmbeddedCatalog::get(&name) else {
            continue;
        };
        let text = std::str::from_utf8(&file.data)
            .with_context(|| format!("Embedded catalog {} is not UTF-8", name))?;
        let parsed: Vec<VocabularyEntry> = ron::from_str(text)
            .with_context(|| format!("Failed to parse embedded catalog: {}", name))?;
        entries.extend(parsed);
    }
    Ok(entries)
}

/// 收集目录树下所有 `.ron` 文件；目录不存在时什么也不做
fn collect_catalog_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for item in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))? {
        let path = item?.path();
        if path.is_dir() {
            collect_catalog_files(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            files.push(path);
        }
    }
    Ok(())
}

fn read_entries(path: &Path) -> Result<Vec<VocabularyEntry>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read: {:?}", path))?;
    Ok(ron::from_str(&text)?)
}
