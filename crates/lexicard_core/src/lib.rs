use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 每轮默认抽取的题目数量
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// 词汇等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// 等级对应的难度值（1-3），只在创建词条时使用
    pub fn difficulty(&self) -> u8 {
        match self {
            Level::Beginner => 1,
            Level::Intermediate => 2,
            Level::Advanced => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// 解析等级名称；通配符 "all" 和未知名称都返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Level::Beginner),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }
}

/// 词条（单张卡片）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: u32,
    /// 源语言单词
    pub word: String,
    pub translation: String,
    /// 音标
    pub pronunciation: String,
    pub category: String,
    pub level: Level,
    pub example: String,
    pub example_translation: String,
    /// 与 level 同时设定，之后不再重新推导
    pub difficulty: u8,
    #[serde(default)]
    pub learned: bool,
}

impl VocabularyEntry {
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self.word.to_lowercase().contains(needle_lower)
            || self.translation.to_lowercase().contains(needle_lower)
    }

    /// 听力题可展示的音标；为空或直接包含单词拼写时返回 None
    pub fn listening_hint(&self) -> Option<&str> {
        let pronunciation = self.pronunciation.trim();
        let spelled = pronunciation.trim_matches('/').trim().to_lowercase();
        if spelled.is_empty() || spelled.contains(&self.word.to_lowercase()) {
            None
        } else {
            Some(pronunciation)
        }
    }
}

/// 练习类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum ExerciseKind {
    Translation,
    Choice,
    Typing,
    Listening,
}

impl ExerciseKind {
    /// 按位置轮换的类型顺序
    pub const ROTATION: [ExerciseKind; 4] = [
        ExerciseKind::Translation,
        ExerciseKind::Choice,
        ExerciseKind::Typing,
        ExerciseKind::Listening,
    ];

    pub fn for_position(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }

    /// 除 Typing 外都提供选项
    pub fn has_options(&self) -> bool {
        !matches!(self, ExerciseKind::Typing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Translation => "translation",
            ExerciseKind::Choice => "choice",
            ExerciseKind::Typing => "typing",
            ExerciseKind::Listening => "listening",
        }
    }
}

/// 单个练习题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// 从 1 开始的位置编号
    pub id: u32,
    pub kind: ExerciseKind,
    pub prompt: String,
    /// Typing 题为小写单词，其余为译文
    pub correct_answer: String,
    /// Typing 题为空
    pub options: Vec<String>,
    pub entry: VocabularyEntry,
}

impl Exercise {
    /// 判定答案是否正确
    pub fn check(&self, answer: &str) -> bool {
        match self.kind {
            ExerciseKind::Typing => answer.trim().to_lowercase() == self.correct_answer,
            _ => answer == self.correct_answer,
        }
    }
}

/// 一道题的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Submitted,
    TimedOut,
    Skipped,
}

/// 单题结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseOutcome {
    pub exercise_id: u32,
    pub entry_id: u32,
    pub kind: ExerciseKind,
    pub answer: Option<String>,
    pub correct: bool,
    pub resolution: Resolution,
    pub seconds_spent: u32,
}

/// 会话总结
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: usize,
    pub total: usize,
    pub outcomes: Vec<ExerciseOutcome>,
    pub completed_at: i64,
}

impl SessionSummary {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64
        }
    }
}

/// 训练阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    InProgress,
    /// 已判分，等待自动进入下一题
    ShowingResult,
    Finished,
}

/// 训练事件（用于 UI 反馈）
#[derive(Debug, Clone)]
pub enum TrainingEvent {
    ExerciseStarted {
        index: usize,
        kind: ExerciseKind,
    },
    Tick {
        seconds_remaining: u32,
    },
    AnswerEvaluated {
        index: usize,
        correct: bool,
        correct_answer: String,
        timed_out: bool,
    },
    ExerciseSkipped {
        index: usize,
    },
    SessionCompleted {
        summary: SessionSummary,
    },
}

/// UI 渲染快照
#[derive(Debug, Clone)]
pub struct TrainingSnapshot {
    pub phase: Phase,
    pub current_exercise_index: usize,
    pub total_exercises: usize,
    pub current_exercise: Option<Exercise>,
    pub score: usize,
    pub seconds_remaining: u32,
    pub result_visible: bool,
    pub last_answer_correct: Option<bool>,
    /// 当前输入（选中的选项或已键入的文本）
    pub pending_answer: String,
}

/// 训练参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub sample_size: usize,
    pub seconds_per_exercise: u32,
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,
    /// 提交（含超时）后的结果展示时间
    #[serde(with = "duration_serde")]
    pub result_delay: Duration,
    #[serde(with = "duration_serde")]
    pub skip_delay: Duration,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            seconds_per_exercise: 30,
            tick_interval: Duration::from_secs(1),
            result_delay: Duration::from_secs(2),
            skip_delay: Duration::from_secs(1),
        }
    }
}

// Duration 序列化辅助模块
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tuple = (duration.as_secs(), duration.subsec_nanos());
        tuple.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos) = <(u64, u32)>::deserialize(deserializer)?;
        Ok(Duration::new(secs, nanos))
    }
}
