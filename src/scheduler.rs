use tokio_util::sync::CancellationToken;
use tracing::debug;

const MAX_CATCH_UP: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    WanderRotation,
    Animation,
    DebugResume,
}

#[derive(Clone, Debug)]
struct ScheduledTask {
    kind: TaskKind,
    due_ms: u64,
    period_ms: Option<u64>,
    seq: u64,
    token: CancellationToken,
}

/// Deferred and repeating actions owned by one game lifecycle. Every task
/// carries the token it was scheduled under and is dropped, not run, once
/// that token is cancelled.
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    generation: CancellationToken,
    next_seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            generation: CancellationToken::new(),
            next_seq: 0,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.generation.clone()
    }

    pub fn schedule_once(&mut self, kind: TaskKind, due_ms: u64) {
        let token = self.generation.clone();
        self.push(kind, due_ms, None, token);
    }

    pub fn schedule_once_with(&mut self, kind: TaskKind, due_ms: u64, token: CancellationToken) {
        self.push(kind, due_ms, None, token);
    }

    pub fn schedule_repeating(&mut self, kind: TaskKind, first_due_ms: u64, period_ms: u64) {
        let token = self.generation.clone();
        self.push(kind, first_due_ms, Some(period_ms.max(1)), token);
    }

    /// Removes every pending task of `kind`.
    pub fn cancel_kind(&mut self, kind: TaskKind) {
        self.tasks.retain(|task| task.kind != kind);
    }

    /// Cancels every task scheduled so far and starts a fresh generation.
    /// Calling it again with nothing scheduled is harmless.
    pub fn cancel_all(&mut self) {
        self.generation.cancel();
        self.generation = CancellationToken::new();
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks
            .iter()
            .any(|task| task.kind == kind && !task.token.is_cancelled())
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Pops every task due at `now_ms`, in due order. Repeating tasks fire once
    /// per elapsed period (bounded) and are re-armed.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TaskKind> {
        let mut fired: Vec<(u64, u64, TaskKind)> = Vec::new();
        let mut kept = Vec::with_capacity(self.tasks.len());

        for mut task in std::mem::take(&mut self.tasks) {
            if task.due_ms > now_ms {
                kept.push(task);
                continue;
            }
            if task.token.is_cancelled() {
                debug!(kind = ?task.kind, due_ms = task.due_ms, "dropping cancelled task");
                continue;
            }
            match task.period_ms {
                None => fired.push((task.due_ms, task.seq, task.kind)),
                Some(period) => {
                    let mut count = 0;
                    while task.due_ms <= now_ms && count < MAX_CATCH_UP {
                        fired.push((task.due_ms, task.seq, task.kind));
                        task.due_ms += period;
                        count += 1;
                    }
                    if task.due_ms <= now_ms {
                        task.due_ms = now_ms + period;
                    }
                    kept.push(task);
                }
            }
        }

        self.tasks = kept;
        fired.sort_by_key(|(due_ms, seq, _)| (*due_ms, *seq));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }

    fn push(
        &mut self,
        kind: TaskKind,
        due_ms: u64,
        period_ms: Option<u64>,
        token: CancellationToken,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ScheduledTask {
            kind,
            due_ms,
            period_ms,
            seq,
            token,
        });
    }
}

/// Fixed-timestep gate driven by a variable-rate clock: a tick is due once
/// strictly more than `interval_ms` has passed since the last applied tick.
#[derive(Clone, Debug)]
pub struct FrameClock {
    interval_ms: f64,
    last_tick_ms: u64,
}

impl FrameClock {
    pub fn new(interval_ms: f64, started_at_ms: u64) -> Self {
        Self {
            interval_ms,
            last_tick_ms: started_at_ms,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_tick_ms) as f64 > self.interval_ms
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_tick_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_task_fires_once_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(TaskKind::DebugResume, 100);
        assert!(scheduler.take_due(99).is_empty());
        assert_eq!(scheduler.take_due(100), vec![TaskKind::DebugResume]);
        assert!(scheduler.take_due(500).is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn repeating_task_catches_up_per_period() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TaskKind::Animation, 100, 100);
        assert_eq!(scheduler.take_due(350).len(), 3);
        assert!(scheduler.take_due(399).is_empty());
        assert_eq!(scheduler.take_due(400), vec![TaskKind::Animation]);
    }

    #[test]
    fn repeating_task_catch_up_is_bounded() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TaskKind::Animation, 1, 1);
        assert_eq!(scheduler.take_due(1_000_000).len(), MAX_CATCH_UP);
        assert!(scheduler.take_due(1_000_000).is_empty());
        assert_eq!(scheduler.take_due(1_000_001).len(), 1);
    }

    #[test]
    fn fired_tasks_come_out_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(TaskKind::DebugResume, 50);
        scheduler.schedule_repeating(TaskKind::WanderRotation, 10, 100);
        assert_eq!(
            scheduler.take_due(60),
            vec![TaskKind::WanderRotation, TaskKind::DebugResume]
        );
    }

    #[test]
    fn cancelled_generation_tasks_are_dropped() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TaskKind::WanderRotation, 100, 100);
        scheduler.schedule_once(TaskKind::DebugResume, 100);
        scheduler.cancel_all();
        scheduler.cancel_all();
        assert!(!scheduler.is_scheduled(TaskKind::WanderRotation));
        assert!(scheduler.take_due(1_000).is_empty());
        assert_eq!(scheduler.pending(), 0);

        scheduler.schedule_once(TaskKind::DebugResume, 1_100);
        assert_eq!(scheduler.take_due(1_100), vec![TaskKind::DebugResume]);
    }

    #[test]
    fn cancelling_a_child_token_drops_only_its_task() {
        let mut scheduler = Scheduler::new();
        let debug_token = scheduler.token().child_token();
        scheduler.schedule_once_with(TaskKind::DebugResume, 10, debug_token.clone());
        scheduler.schedule_once(TaskKind::WanderRotation, 10);
        debug_token.cancel();
        assert_eq!(scheduler.take_due(10), vec![TaskKind::WanderRotation]);
    }

    #[test]
    fn cancel_kind_removes_only_that_kind() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TaskKind::WanderRotation, 10, 10);
        scheduler.schedule_repeating(TaskKind::Animation, 10, 10);
        scheduler.cancel_kind(TaskKind::WanderRotation);
        assert!(!scheduler.is_scheduled(TaskKind::WanderRotation));
        assert!(scheduler.is_scheduled(TaskKind::Animation));
    }

    #[test]
    fn frame_clock_requires_strictly_more_than_interval() {
        let mut clock = FrameClock::new(28.57, 1_000);
        assert!(!clock.is_due(1_000));
        assert!(!clock.is_due(1_028));
        assert!(clock.is_due(1_029));
        clock.mark(1_029);
        assert!(!clock.is_due(1_050));

        let exact = FrameClock::new(50.0, 0);
        assert!(!exact.is_due(50));
        assert!(exact.is_due(51));
    }
}
