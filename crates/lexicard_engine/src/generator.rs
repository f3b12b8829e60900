use lexicard_core::{Exercise, ExerciseKind, VocabularyEntry};
use lexicard_data::Catalog;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// 每道选择题最多的干扰项数量
pub const MAX_DISTRACTORS: usize = 3;

const LISTENING_PROMPT: &str = "Listen to the word and choose its translation";

/// 生成一轮练习：随机抽取 `min(sample_size, 词库大小)` 个不重复词条，按位置轮换题型
pub fn generate<R: Rng>(
    catalog: &Catalog,
    sample_size: usize,
    rng: &mut R,
) -> Vec<Exercise> {
    let mut sample: Vec<&VocabularyEntry> = catalog.all().iter().collect();
    sample.shuffle(rng);
    sample.truncate(sample_size);

    let exercises: Vec<Exercise> = sample
        .into_iter()
        .enumerate()
        .map(|(index, entry)| build_exercise(catalog, index, entry, rng))
        .collect();

    debug!(
        "🧩 生成练习 {} 道: {:?}",
        exercises.len(),
        exercises.iter().map(|e| e.entry.id).collect::<Vec<_>>()
    );
    exercises
}

fn build_exercise<R: Rng>(
    catalog: &Catalog,
    index: usize,
    entry: &VocabularyEntry,
    rng: &mut R,
) -> Exercise {
    let kind = ExerciseKind::for_position(index);

    let (correct_answer, options) = if kind.has_options() {
        let mut options: Vec<String> = std::iter::once(entry.translation.clone())
            .chain(distractors(catalog, entry, rng).into_iter().map(str::to_string))
            .collect();
        options.shuffle(rng);
        (entry.translation.clone(), options)
    } else {
        (entry.word.to_lowercase(), Vec::new())
    };

    Exercise {
        id: index as u32 + 1,
        kind,
        prompt: prompt_for(kind, entry),
        correct_answer,
        options,
        entry: entry.clone(),
    }
}

/// 从同分类的其他词条中随机选取最多 3 个译文作为干扰项
///
/// 与正确答案相同或彼此重复的译文会被跳过；同分类词条不足时返回更少的干扰项，
/// 不会用其他分类补齐。
pub fn distractors<'a, R: Rng>(
    catalog: &'a Catalog,
    entry: &VocabularyEntry,
    rng: &mut R,
) -> Vec<&'a str> {
    let mut peers: Vec<&VocabularyEntry> = catalog
        .all()
        .iter()
        .filter(|e| e.id != entry.id && e.category == entry.category)
        .collect();
    peers.shuffle(rng);

    let mut chosen: Vec<&str> = Vec::with_capacity(MAX_DISTRACTORS);
    for peer in peers {
        if chosen.len() == MAX_DISTRACTORS {
            break;
        }
        let translation = peer.translation.as_str();
        if translation == entry.translation || chosen.contains(&translation) {
            continue;
        }
        chosen.push(translation);
    }
    chosen
}

pub fn prompt_for(kind: ExerciseKind, entry: &VocabularyEntry) -> String {
    match kind {
        ExerciseKind::Translation | ExerciseKind::Choice => {
            format!("Translate the word: {}", entry.word)
        }
        ExerciseKind::Typing => format!("Type the English word for {}", entry.translation),
        ExerciseKind::Listening => LISTENING_PROMPT.to_string(),
    }
}
