use crate::error::RunnerError;
use crate::generator;
use crate::scheduler::{Scheduler, TaskId};
use lexicard_core::*;
use lexicard_data::Catalog;
use log::{debug, info};
use rand::Rng;
use std::sync::mpsc;
use std::time::Duration;

/// 运行器安排的定时任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// 倒计时，每个 tick 减一秒
    Tick,
    /// 结果展示结束，进入下一题
    Advance,
}

/// 训练运行器：`Idle → InProgress(i) → ShowingResult(i) → … → Finished`
pub struct ExerciseRunner<R: Rng> {
    config: TrainingConfig,
    rng: R,

    // 定时任务
    scheduler: Scheduler<TimerTask>,
    tick_task: Option<TaskId>,
    advance_task: Option<TaskId>,

    // 会话状态
    phase: Phase,
    exercises: Vec<Exercise>,
    current_index: usize,
    score: usize,
    seconds_remaining: u32,
    pending_answer: String,
    last_answer_correct: Option<bool>,
    outcomes: Vec<ExerciseOutcome>,
    summary: Option<SessionSummary>,

    // 事件发布
    event_tx: Option<mpsc::Sender<TrainingEvent>>,
}

impl<R: Rng> ExerciseRunner<R> {
    pub fn new(
        config: TrainingConfig,
        rng: R,
        event_tx: Option<mpsc::Sender<TrainingEvent>>,
    ) -> Self {
        let seconds_remaining = config.seconds_per_exercise;
        Self {
            config,
            rng,
            scheduler: Scheduler::new(),
            tick_task: None,
            advance_task: None,
            phase: Phase::Idle,
            exercises: Vec::new(),
            current_index: 0,
            score: 0,
            seconds_remaining,
            pending_answer: String::new(),
            last_answer_correct: None,
            outcomes: Vec::new(),
            summary: None,
            event_tx,
        }
    }

    /// 开始新一轮训练
    pub fn start_session(&mut self, catalog: &Catalog) {
        self.cancel_timers();
        self.exercises = generator::generate(catalog, self.config.sample_size, &mut self.rng);
        self.score = 0;
        self.outcomes.clear();
        self.summary = None;
        info!("🚀 开始训练: {} 道题", self.exercises.len());

        if self.exercises.is_empty() {
            self.finish();
        } else {
            self.enter_exercise(0);
        }
    }

    /// 重新开始，任何阶段都可调用
    pub fn restart(&mut self, catalog: &Catalog) {
        debug!("🔄 重新开始训练 (当前阶段 {:?})", self.phase);
        self.start_session(catalog);
    }

    /// 选择选项（非 Typing 题）
    pub fn select_option(&mut self, option: &str) -> Result<(), RunnerError> {
        let exercise = self.active_exercise()?;
        if !exercise.kind.has_options() {
            return Err(RunnerError::NoOptions);
        }
        if !exercise.options.iter().any(|o| o == option) {
            return Err(RunnerError::UnknownOption(option.to_string()));
        }
        self.pending_answer = option.to_string();
        Ok(())
    }

    /// 输入答案（Typing 题）
    pub fn type_answer(&mut self, text: &str) -> Result<(), RunnerError> {
        let exercise = self.active_exercise()?;
        if exercise.kind.has_options() {
            return Err(RunnerError::ChoiceOnly);
        }
        self.pending_answer = text.to_string();
        Ok(())
    }

    /// 提交当前答案，返回是否正确
    pub fn submit(&mut self) -> Result<bool, RunnerError> {
        self.active_exercise()?;
        if self.pending_answer.trim().is_empty() {
            return Err(RunnerError::EmptyAnswer);
        }
        Ok(self.resolve(Resolution::Submitted))
    }

    /// 跳过当前题，总是记为错误
    pub fn skip(&mut self) -> Result<(), RunnerError> {
        self.active_exercise()?;
        self.cancel_timers();

        let index = self.current_index;
        self.last_answer_correct = Some(false);
        self.record_outcome(Resolution::Skipped, false);
        self.phase = Phase::ShowingResult;
        debug!("⏭️ 跳过第 {} 题", index + 1);
        self.send_event(TrainingEvent::ExerciseSkipped { index });

        self.advance_task = Some(
            self.scheduler
                .schedule_once(self.config.skip_delay, TimerTask::Advance),
        );
        Ok(())
    }

    /// 推进虚拟时钟，依次执行到期的定时任务
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;

        while let Some((id, task)) = self.scheduler.pop_due(until) {
            match task {
                TimerTask::Tick if self.tick_task == Some(id) => self.on_tick(),
                TimerTask::Advance if self.advance_task == Some(id) => self.on_advance(),
                _ => debug!("忽略过期任务 {:?}", id),
            }
        }

        self.scheduler.advance_to(until);
    }

    /// 销毁会话：取消所有定时任务并回到 Idle
    pub fn dispose(&mut self) {
        self.cancel_timers();
        self.phase = Phase::Idle;
        self.exercises.clear();
        self.current_index = 0;
        self.pending_answer.clear();
        self.last_answer_correct = None;
        debug!("🧹 运行器已销毁");
    }

    /// 获取 UI 渲染用的快照
    pub fn snapshot(&self) -> TrainingSnapshot {
        TrainingSnapshot {
            phase: self.phase,
            current_exercise_index: self.current_index,
            total_exercises: self.exercises.len(),
            current_exercise: match self.phase {
                Phase::Idle => None,
                _ => self.exercises.get(self.current_index).cloned(),
            },
            score: self.score,
            seconds_remaining: self.seconds_remaining,
            result_visible: self.phase == Phase::ShowingResult,
            last_answer_correct: self.last_answer_correct,
            pending_answer: self.pending_answer.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.phase {
            Phase::Idle => None,
            _ => self.exercises.get(self.current_index),
        }
    }

    /// 会话结束后的总结
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    fn active_exercise(&self) -> Result<&Exercise, RunnerError> {
        if self.phase != Phase::InProgress {
            return Err(RunnerError::NotInProgress);
        }
        self.exercises
            .get(self.current_index)
            .ok_or(RunnerError::NotInProgress)
    }

    fn enter_exercise(&mut self, index: usize) {
        self.cancel_timers();
        self.current_index = index;
        self.pending_answer.clear();
        self.last_answer_correct = None;
        self.seconds_remaining = self.config.seconds_per_exercise;
        self.phase = Phase::InProgress;

        self.tick_task = Some(
            self.scheduler
                .schedule_repeating(self.config.tick_interval, TimerTask::Tick),
        );

        let kind = self.exercises[index].kind;
        debug!("📝 第 {} 题 ({})", index + 1, kind.as_str());
        self.send_event(TrainingEvent::ExerciseStarted { index, kind });
    }

    fn on_tick(&mut self) {
        if self.phase != Phase::InProgress {
            return;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.send_event(TrainingEvent::Tick {
            seconds_remaining: self.seconds_remaining,
        });

        if self.seconds_remaining == 0 {
            debug!("⏰ 第 {} 题超时", self.current_index + 1);
            self.resolve(Resolution::TimedOut);
        }
    }

    fn on_advance(&mut self) {
        self.advance_task = None;
        if self.phase != Phase::ShowingResult {
            return;
        }

        let next = self.current_index + 1;
        if next < self.exercises.len() {
            self.enter_exercise(next);
        } else {
            self.finish();
        }
    }

    /// 判分并进入结果展示
    fn resolve(&mut self, resolution: Resolution) -> bool {
        self.cancel_timers();

        let exercise = &self.exercises[self.current_index];
        let correct = exercise.check(&self.pending_answer);
        let correct_answer = exercise.correct_answer.clone();

        if correct {
            self.score += 1;
        }
        self.last_answer_correct = Some(correct);
        self.record_outcome(resolution, correct);
        self.phase = Phase::ShowingResult;

        self.send_event(TrainingEvent::AnswerEvaluated {
            index: self.current_index,
            correct,
            correct_answer,
            timed_out: resolution == Resolution::TimedOut,
        });

        self.advance_task = Some(
            self.scheduler
                .schedule_once(self.config.result_delay, TimerTask::Advance),
        );
        correct
    }

    fn record_outcome(&mut self, resolution: Resolution, correct: bool) {
        let exercise = &self.exercises[self.current_index];
        let answer = if self.pending_answer.is_empty() {
            None
        } else {
            Some(self.pending_answer.clone())
        };

        self.outcomes.push(ExerciseOutcome {
            exercise_id: exercise.id,
            entry_id: exercise.entry.id,
            kind: exercise.kind,
            answer,
            correct,
            resolution,
            seconds_spent: self
                .config
                .seconds_per_exercise
                .saturating_sub(self.seconds_remaining),
        });
    }

    fn finish(&mut self) {
        self.cancel_timers();
        self.phase = Phase::Finished;

        let summary = SessionSummary {
            score: self.score,
            total: self.exercises.len(),
            outcomes: self.outcomes.clone(),
            completed_at: chrono::Utc::now().timestamp(),
        };
        info!("🏁 训练完成: {}/{}", summary.score, summary.total);

        self.summary = Some(summary.clone());
        self.send_event(TrainingEvent::SessionCompleted { summary });
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.tick_task.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.advance_task.take() {
            self.scheduler.cancel(id);
        }
    }

    fn send_event(&self, event: TrainingEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{catalog_of, make_entry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn seeded_runner(event_tx: Option<mpsc::Sender<TrainingEvent>>) -> ExerciseRunner<StdRng> {
        ExerciseRunner::new(
            TrainingConfig::default(),
            StdRng::seed_from_u64(7),
            event_tx,
        )
    }

    /// 每个分类两个词，选择题总有一个干扰项
    fn four_word_catalog() -> Catalog {
        catalog_of(vec![
            make_entry(1, "Hello", "Привет", "Greetings"),
            make_entry(2, "Thank you", "Спасибо", "Greetings"),
            make_entry(3, "Cat", "Кот", "Animals"),
            make_entry(4, "Dog", "Собака", "Animals"),
        ])
    }

    fn started_runner(catalog: &Catalog) -> ExerciseRunner<StdRng> {
        let mut runner = seeded_runner(None);
        runner.start_session(catalog);
        runner
    }

    fn give_correct_answer<R: Rng>(runner: &mut ExerciseRunner<R>) -> String {
        let exercise = runner.current_exercise().unwrap().clone();
        if exercise.kind.has_options() {
            runner.select_option(&exercise.correct_answer).unwrap();
            exercise.correct_answer
        } else {
            runner.type_answer(&exercise.entry.word).unwrap();
            exercise.entry.word
        }
    }

    fn give_wrong_answer<R: Rng>(runner: &mut ExerciseRunner<R>) {
        let exercise = runner.current_exercise().unwrap().clone();
        if exercise.kind.has_options() {
            let wrong = exercise
                .options
                .iter()
                .find(|o| **o != exercise.correct_answer)
                .unwrap()
                .clone();
            runner.select_option(&wrong).unwrap();
        } else {
            runner.type_answer("definitely wrong").unwrap();
        }
    }

    #[test]
    fn test_start_session() {
        let catalog = four_word_catalog();
        let runner = started_runner(&catalog);

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.phase, Phase::InProgress);
        assert_eq!(snapshot.current_exercise_index, 0);
        assert_eq!(snapshot.total_exercises, 4);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.seconds_remaining, 30);
        assert!(!snapshot.result_visible);
        assert_eq!(snapshot.last_answer_correct, None);

        let exercise = snapshot.current_exercise.unwrap();
        assert_eq!(exercise.kind, ExerciseKind::Translation);
        assert!(catalog.get(exercise.entry.id).is_some());
    }

    #[test]
    fn test_idle_runner_rejects_input() {
        let mut runner = seeded_runner(None);
        assert_eq!(runner.phase(), Phase::Idle);
        assert!(runner.snapshot().current_exercise.is_none());
        assert_eq!(runner.submit(), Err(RunnerError::NotInProgress));
        assert_eq!(runner.skip(), Err(RunnerError::NotInProgress));
        assert_eq!(runner.select_option("Привет"), Err(RunnerError::NotInProgress));
    }

    #[test]
    fn test_correct_submit_scores_and_advances_after_delay() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        give_correct_answer(&mut runner);
        assert_eq!(runner.submit(), Ok(true));
        assert_eq!(runner.score(), 1);

        let snapshot = runner.snapshot();
        assert!(snapshot.result_visible);
        assert_eq!(snapshot.last_answer_correct, Some(true));

        runner.advance(secs(1));
        assert_eq!(runner.phase(), Phase::ShowingResult);

        runner.advance(secs(1));
        let snapshot = runner.snapshot();
        assert_eq!(snapshot.phase, Phase::InProgress);
        assert_eq!(snapshot.current_exercise_index, 1);
        assert_eq!(snapshot.pending_answer, "");
        assert!(!snapshot.result_visible);
        assert_eq!(snapshot.last_answer_correct, None);
        assert_eq!(snapshot.seconds_remaining, 30);
    }

    #[test]
    fn test_wrong_submit_does_not_score() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        give_wrong_answer(&mut runner);
        assert_eq!(runner.submit(), Ok(false));
        assert_eq!(runner.score(), 0);
        assert_eq!(runner.snapshot().last_answer_correct, Some(false));
    }

    #[test]
    fn test_typing_is_case_and_whitespace_insensitive() {
        let catalog = four_word_catalog();
        for variant in 0..3 {
            let mut runner = started_runner(&catalog);
            runner.skip().unwrap();
            runner.advance(secs(1));
            runner.skip().unwrap();
            runner.advance(secs(1));

            let exercise = runner.current_exercise().unwrap().clone();
            assert_eq!(exercise.kind, ExerciseKind::Typing);
            let word = exercise.entry.word;
            let answer = match variant {
                0 => word.clone(),
                1 => format!("  {}  ", word.to_lowercase()),
                _ => word.to_uppercase(),
            };
            runner.type_answer(&answer).unwrap();
            assert_eq!(runner.submit(), Ok(true), "answer {:?}", answer);
        }
    }

    #[test]
    fn test_skip_never_scores_even_with_correct_selection() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        give_correct_answer(&mut runner);
        runner.skip().unwrap();
        assert_eq!(runner.score(), 0);
        assert_eq!(runner.snapshot().last_answer_correct, Some(false));
        assert!(runner.snapshot().result_visible);

        // 跳过后 1 秒进入下一题
        runner.advance(secs(1));
        assert_eq!(runner.current_index(), 1);
        assert_eq!(runner.phase(), Phase::InProgress);
    }

    #[test]
    fn test_timeout_without_answer_is_incorrect() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        runner.advance(secs(29));
        assert_eq!(runner.seconds_remaining(), 1);
        assert_eq!(runner.phase(), Phase::InProgress);

        runner.advance(secs(1));
        let snapshot = runner.snapshot();
        assert_eq!(snapshot.seconds_remaining, 0);
        assert_eq!(snapshot.phase, Phase::ShowingResult);
        assert_eq!(snapshot.last_answer_correct, Some(false));
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn test_timeout_auto_submits_present_answer() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        give_correct_answer(&mut runner);
        runner.advance(secs(30));
        assert_eq!(runner.score(), 1);
        assert_eq!(runner.snapshot().last_answer_correct, Some(true));
    }

    #[test]
    fn test_timeout_on_last_exercise_finishes_after_result_delay() {
        let catalog = catalog_of(vec![make_entry(1, "Hello", "Привет", "Greetings")]);
        let (tx, rx) = mpsc::channel();
        let mut runner = seeded_runner(Some(tx));
        runner.start_session(&catalog);

        runner.advance(secs(30));
        assert_eq!(runner.phase(), Phase::ShowingResult);
        assert!(runner.summary().is_none());

        runner.advance(secs(1));
        assert_eq!(runner.phase(), Phase::ShowingResult);

        runner.advance(secs(1));
        assert_eq!(runner.phase(), Phase::Finished);
        assert_eq!(runner.pending_tasks(), 0);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.iter().any(|event| matches!(
            event,
            TrainingEvent::AnswerEvaluated {
                index: 0,
                correct: false,
                timed_out: true,
                ..
            }
        )));
        match events.last() {
            Some(TrainingEvent::SessionCompleted { summary }) => {
                assert_eq!((summary.score, summary.total), (0, 1));
                assert_eq!(summary.outcomes[0].resolution, Resolution::TimedOut);
                assert_eq!(summary.outcomes[0].seconds_spent, 30);
            }
            other => panic!("expected SessionCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_unattended_session_times_out_every_exercise() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        // 每题 30 秒超时 + 2 秒展示
        runner.advance(secs(4 * 32));
        assert_eq!(runner.phase(), Phase::Finished);

        let summary = runner.summary().unwrap();
        assert_eq!((summary.score, summary.total), (0, 4));
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.resolution == Resolution::TimedOut && !o.correct));
    }

    #[test]
    fn test_long_advance_runs_timers_in_order() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        // 30 秒超时 + 2 秒展示，再 30 秒超时 + 2 秒展示，第三题已过 1 秒
        runner.advance(secs(65));
        assert_eq!(runner.current_index(), 2);
        assert_eq!(runner.phase(), Phase::InProgress);
        assert_eq!(runner.seconds_remaining(), 29);
        assert_eq!(runner.pending_tasks(), 1);
    }

    #[test]
    fn test_three_of_four_final_score() {
        let catalog = four_word_catalog();
        let (tx, rx) = mpsc::channel();
        let mut runner = seeded_runner(Some(tx));
        runner.start_session(&catalog);

        for _ in 0..3 {
            give_correct_answer(&mut runner);
            assert_eq!(runner.submit(), Ok(true));
            runner.advance(secs(2));
        }
        give_wrong_answer(&mut runner);
        assert_eq!(runner.submit(), Ok(false));
        runner.advance(secs(2));

        assert_eq!(runner.phase(), Phase::Finished);
        let summary = runner.summary().unwrap();
        assert_eq!((summary.score, summary.total), (3, 4));
        assert_eq!(summary.accuracy(), 0.75);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.resolution == Resolution::Submitted));

        let completed: Vec<_> = rx
            .try_iter()
            .filter_map(|event| match event {
                TrainingEvent::SessionCompleted { summary } => Some(summary),
                _ => None,
            })
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].score, 3);
        assert_eq!(completed[0].total, 4);

        // 结束后不再有定时任务
        assert_eq!(runner.pending_tasks(), 0);
        assert_eq!(runner.submit(), Err(RunnerError::NotInProgress));
    }

    #[test]
    fn test_outcomes_record_resolution_and_time() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        runner.advance(secs(4));
        let first_answer = give_correct_answer(&mut runner);
        runner.submit().unwrap();
        runner.advance(secs(2));

        runner.skip().unwrap();
        runner.advance(secs(1));

        runner.advance(secs(30));
        runner.advance(secs(2));

        give_correct_answer(&mut runner);
        runner.submit().unwrap();
        runner.advance(secs(2));

        let summary = runner.summary().unwrap();
        let resolutions: Vec<_> = summary.outcomes.iter().map(|o| o.resolution).collect();
        assert_eq!(
            resolutions,
            vec![
                Resolution::Submitted,
                Resolution::Skipped,
                Resolution::TimedOut,
                Resolution::Submitted
            ]
        );
        assert_eq!(summary.outcomes[0].seconds_spent, 4);
        assert_eq!(summary.outcomes[0].answer, Some(first_answer));
        assert_eq!(summary.outcomes[2].answer, None);
        assert_eq!(summary.outcomes[2].seconds_spent, 30);
        assert_eq!(summary.score, 2);
    }

    #[test]
    fn test_manual_skip_cancels_countdown() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        runner.advance(Duration::from_millis(10_500));
        runner.skip().unwrap();
        runner.advance(secs(1));
        assert_eq!(runner.current_index(), 1);
        assert_eq!(runner.seconds_remaining(), 30);

        // 原倒计时不会在第二题中继续触发
        runner.advance(secs(29));
        assert_eq!(runner.phase(), Phase::InProgress);
        assert_eq!(runner.seconds_remaining(), 1);
        assert_eq!(runner.pending_tasks(), 1);
    }

    #[test]
    fn test_restart_does_not_double_tick() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        runner.advance(secs(5));
        assert_eq!(runner.seconds_remaining(), 25);

        runner.restart(&catalog);
        assert_eq!(runner.seconds_remaining(), 30);
        runner.advance(secs(1));
        assert_eq!(runner.seconds_remaining(), 29);
        assert_eq!(runner.pending_tasks(), 1);
    }

    #[test]
    fn test_restart_resets_score_and_resamples() {
        let catalog = catalog_of(
            (1..=12)
                .map(|id| make_entry(id, &format!("word{}", id), &format!("слово{}", id), "Misc"))
                .collect(),
        );
        let mut runner = ExerciseRunner::new(
            TrainingConfig::default(),
            StdRng::seed_from_u64(3),
            None,
        );
        runner.start_session(&catalog);

        give_correct_answer(&mut runner);
        runner.submit().unwrap();
        assert_eq!(runner.score(), 1);

        let mut orders = HashSet::new();
        for _ in 0..20 {
            runner.restart(&catalog);
            assert_eq!(runner.score(), 0);
            assert_eq!(runner.phase(), Phase::InProgress);
            assert_eq!(runner.current_index(), 0);
            assert!(runner.summary().is_none());
            orders.insert(
                runner
                    .exercises()
                    .iter()
                    .map(|e| e.entry.id)
                    .collect::<Vec<_>>(),
            );
        }
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_restart_from_finished() {
        let catalog = catalog_of(vec![make_entry(1, "Hello", "Привет", "Greetings")]);
        let mut runner = started_runner(&catalog);
        runner.skip().unwrap();
        runner.advance(secs(1));
        assert_eq!(runner.phase(), Phase::Finished);
        assert_eq!(runner.summary().unwrap().score, 0);

        runner.restart(&catalog);
        assert_eq!(runner.phase(), Phase::InProgress);
        assert_eq!(runner.snapshot().total_exercises, 1);
    }

    #[test]
    fn test_dispose_stops_all_callbacks() {
        let catalog = four_word_catalog();
        let (tx, rx) = mpsc::channel();
        let mut runner = seeded_runner(Some(tx));
        runner.start_session(&catalog);
        give_correct_answer(&mut runner);
        runner.submit().unwrap();

        runner.dispose();
        let _ = rx.try_iter().count();

        runner.advance(secs(100));
        assert_eq!(runner.phase(), Phase::Idle);
        assert_eq!(runner.pending_tasks(), 0);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_input_contract_errors() {
        let catalog = four_word_catalog();
        let mut runner = started_runner(&catalog);

        assert_eq!(runner.submit(), Err(RunnerError::EmptyAnswer));
        assert_eq!(runner.type_answer("hello"), Err(RunnerError::ChoiceOnly));
        assert_eq!(
            runner.select_option("Лошадь"),
            Err(RunnerError::UnknownOption("Лошадь".to_string()))
        );

        runner.skip().unwrap();
        assert_eq!(runner.select_option("Спасибо"), Err(RunnerError::NotInProgress));
        runner.advance(secs(1));
        runner.skip().unwrap();
        runner.advance(secs(1));

        assert_eq!(runner.select_option("Кот"), Err(RunnerError::NoOptions));
        runner.type_answer("   ").unwrap();
        assert_eq!(runner.submit(), Err(RunnerError::EmptyAnswer));
        assert_eq!(runner.phase(), Phase::InProgress);
    }

    #[test]
    fn test_event_stream_for_one_exercise() {
        let catalog = four_word_catalog();
        let (tx, rx) = mpsc::channel();
        let mut runner = seeded_runner(Some(tx));
        runner.start_session(&catalog);
        runner.advance(secs(2));
        give_correct_answer(&mut runner);
        runner.submit().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            events[0],
            TrainingEvent::ExerciseStarted {
                index: 0,
                kind: ExerciseKind::Translation
            }
        ));
        assert!(matches!(events[1], TrainingEvent::Tick { seconds_remaining: 29 }));
        assert!(matches!(events[2], TrainingEvent::Tick { seconds_remaining: 28 }));
        assert!(matches!(
            &events[3],
            TrainingEvent::AnswerEvaluated {
                index: 0,
                correct: true,
                timed_out: false,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_sample_finishes_immediately() {
        let catalog = four_word_catalog();
        let config = TrainingConfig {
            sample_size: 0,
            ..TrainingConfig::default()
        };
        let mut runner = ExerciseRunner::new(config, StdRng::seed_from_u64(7), None);
        runner.start_session(&catalog);

        assert_eq!(runner.phase(), Phase::Finished);
        assert_eq!(runner.summary().unwrap().total, 0);
        assert!(runner.snapshot().current_exercise.is_none());
    }
}
