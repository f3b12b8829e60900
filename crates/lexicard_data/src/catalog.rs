use anyhow::{bail, Context, Result};
use lexicard_core::{Level, VocabularyEntry};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// 分类通配符
pub const ALL_CATEGORIES: &str = "All";
/// 等级通配符
pub const ALL_LEVELS: &str = "all";

/// 随机生成词条使用的候选词（不在内置词库中）
const RANDOM_POOL: [(&str, &str, &str, Level); 10] = [
    ("Adventure", "Приключение", "Actions", Level::Intermediate),
    ("Beautiful", "Красивый", "Adjectives", Level::Beginner),
    ("Challenge", "Вызов", "Actions", Level::Intermediate),
    ("Delicious", "Вкусный", "Food & Drink", Level::Beginner),
    ("Excellent", "Отличный", "Adjectives", Level::Intermediate),
    ("Freedom", "Свобода", "Abstract", Level::Intermediate),
    ("Generous", "Щедрый", "Adjectives", Level::Intermediate),
    ("Happiness", "Счастье", "Emotions", Level::Beginner),
    ("Incredible", "Невероятный", "Adjectives", Level::Advanced),
    ("Journey", "Путешествие", "Actions", Level::Intermediate),
];

/// 词库：启动时构建一次，之后只会切换 learned 或追加随机词条
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<VocabularyEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<VocabularyEntry>) -> Result<Self> {
        validate(&entries)?;
        Ok(Self { entries })
    }

    pub fn all(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 构造时已保证非空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// 按分类、等级和搜索词过滤
    ///
    /// - `category` 为 None 或 "All" 时不限分类
    /// - `level` 为 None 时不限等级
    /// - `search` 对单词或译文做不区分大小写的子串匹配
    pub fn filter(
        &self,
        category: Option<&str>,
        level: Option<Level>,
        search: Option<&str>,
    ) -> Vec<&VocabularyEntry> {
        let category = category.filter(|c| *c != ALL_CATEGORIES);
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();

        self.entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .filter(|e| level.map_or(true, |l| e.level == l))
            .filter(|e| e.matches_search(&needle))
            .collect()
    }

    /// "All" 加上按首次出现顺序排列的分类
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut categories = vec![ALL_CATEGORIES];
        for entry in &self.entries {
            if seen.insert(entry.category.as_str()) {
                categories.push(entry.category.as_str());
            }
        }
        categories
    }

    pub fn learned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.learned).count()
    }

    /// 切换已掌握标记，返回新值
    pub fn toggle_learned(&mut self, id: u32) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.learned = !entry.learned;
        debug!("🔖 词条 {} learned = {}", id, entry.learned);
        Some(entry.learned)
    }

    /// 从候选池随机生成一个词条并追加到词库
    ///
    /// 新 ID 为当前最大 ID 加一；最大 ID 已是 `u32::MAX` 时返回错误，词库不变。
    pub fn generate_random_entry<R: Rng>(&mut self, rng: &mut R) -> Result<VocabularyEntry> {
        let max_id = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        let id = max_id
            .checked_add(1)
            .with_context(|| format!("No free entry id after {}", max_id))?;
        let &(word, translation, category, level) =
            RANDOM_POOL.choose(rng).context("Random word pool is empty")?;

        let entry = VocabularyEntry {
            id,
            word: word.to_string(),
            translation: translation.to_string(),
            pronunciation: format!("/{}/", word.to_lowercase()),
            category: category.to_string(),
            level,
            example: format!("This is an example with {}", word),
            example_translation: format!("Это пример с {}", translation),
            difficulty: level.difficulty(),
            learned: false,
        };

        debug!("🎲 生成随机词条: {} (ID: {})", entry.word, entry.id);
        self.entries.push(entry.clone());
        Ok(entry)
    }
}

/// 校验词库：非空、ID 唯一、单词和译文非空、难度与等级一致
pub fn validate(entries: &[VocabularyEntry]) -> Result<()> {
    if entries.is_empty() {
        bail!("Catalog is empty");
    }

    let mut ids = HashSet::new();
    for entry in entries {
        if !ids.insert(entry.id) {
            bail!("Duplicate entry id {}", entry.id);
        }
        if entry.word.trim().is_empty() || entry.translation.trim().is_empty() {
            bail!("Entry {} has an empty word or translation", entry.id);
        }
        if entry.difficulty != entry.level.difficulty() {
            bail!(
                "Entry {} ({}) has difficulty {} but level {}",
                entry.id,
                entry.word,
                entry.difficulty,
                entry.level.as_str()
            );
        }
    }

    Ok(())
}
