//! 确定性的虚拟时钟任务队列。
//!
//! 宿主通过 `pop_due` 逐个取出到期任务；时钟停在被取出任务的到期时刻，
//! 因此回调中新安排的任务从该时刻起算。

use std::time::Duration;

/// 重复任务的最小周期
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: TaskId,
    due: Duration,
    period: Option<Duration>,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// 一次性任务，`delay` 之后到期
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskId {
        self.push(self.now + delay, None, task)
    }

    /// 重复任务，首次在一个周期后到期
    pub fn schedule_repeating(&mut self, period: Duration, task: T) -> TaskId {
        let period = period.max(MIN_PERIOD);
        self.push(self.now + period, Some(period), task)
    }

    fn push(&mut self, due: Duration, period: Option<Duration>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due,
            period,
            task,
        });
        id
    }

    /// 取消任务，返回任务是否仍在队列中
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// 取出 `until` 之前最早到期的任务（同一时刻按安排顺序），并把时钟推进到它的到期时刻。
    /// 重复任务在取出时即重新排期。
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, T)> {
        let position = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;

        let due = self.tasks[position].due;
        self.now = self.now.max(due);

        let fired = match self.tasks[position].period {
            Some(period) => {
                let scheduled = &mut self.tasks[position];
                scheduled.due += period;
                (scheduled.id, scheduled.task.clone())
            }
            None => {
                let scheduled = self.tasks.remove(position);
                (scheduled.id, scheduled.task)
            }
        };
        Some(fired)
    }

    /// 时钟只前进不后退
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
impl<T> Scheduler<T> {
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub(crate) fn next_due(&self) -> Option<Duration> {
        self.tasks.iter().map(|t| t.due).min()
    }
}
