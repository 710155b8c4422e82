//! Timer-driven year playback.
//!
//! The timer itself belongs to the host; [`Playback`] only schedules and
//! cancels a repeating task through a [`Scheduler`] and reacts to the
//! ticks the host delivers back. A tick is honoured only if it carries
//! the id of the task currently running, so a tick queued before a stop
//! can never move the year afterwards.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Handle of a scheduled repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// Host-side repeating timer.
pub trait Scheduler {
    /// Start a task that fires every `interval` until cancelled.
    fn schedule_every(&mut self, interval: Duration) -> TaskId;

    /// Cancel a task. Unknown or already cancelled ids are ignored.
    fn cancel(&mut self, id: TaskId);
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn schedule_every(&mut self, interval: Duration) -> TaskId {
        (**self).schedule_every(interval)
    }

    fn cancel(&mut self, id: TaskId) {
        (**self).cancel(id)
    }
}

/// A scheduler that never fires on its own. Callers poll
/// [`ManualScheduler::active`] and deliver the ticks themselves.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    active: BTreeMap<TaskId, Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the tasks still running, oldest first.
    pub fn active(&self) -> Vec<TaskId> {
        self.active.keys().copied().collect()
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn interval_of(&self, id: TaskId) -> Option<Duration> {
        self.active.get(&id).copied()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_every(&mut self, interval: Duration) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.active.insert(id, interval);
        id
    }

    fn cancel(&mut self, id: TaskId) {
        self.active.remove(&id);
    }
}

/// The single driver of the current year while playing.
///
/// # Examples
///
/// ```
/// use aidflow_engine::selection::playback::{ManualScheduler, Playback};
/// use std::time::Duration;
///
/// let mut scheduler = ManualScheduler::new();
/// let mut playback = Playback::new(vec![2000, 2001, 2002], Duration::from_millis(800));
///
/// let task = playback.start(&mut scheduler).unwrap();
/// assert_eq!(playback.tick(task, &mut scheduler), Some(2001));
/// assert_eq!(playback.tick(task, &mut scheduler), Some(2002));
/// // The last year stops playback; later ticks are stale.
/// assert!(!playback.is_playing());
/// assert_eq!(playback.tick(task, &mut scheduler), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    years: Vec<i32>,
    current: usize,
    task: Option<TaskId>,
    interval: Duration,
}

impl Playback {
    /// Playback over `years`, positioned on the first one.
    pub fn new(years: Vec<i32>, interval: Duration) -> Self {
        Self {
            years,
            current: 0,
            task: None,
            interval,
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// The current year, `None` when there are no years at all.
    pub fn current(&self) -> Option<i32> {
        self.years.get(self.current).copied()
    }

    pub fn is_playing(&self) -> bool {
        self.task.is_some()
    }

    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn at_end(&self) -> bool {
        self.current + 1 >= self.years.len()
    }

    /// Start playing. Rewinds to the first year when already on the last.
    /// Returns `None` if already playing or there is nothing to play.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> Option<TaskId> {
        if self.task.is_some() || self.years.len() < 2 {
            return None;
        }
        if self.at_end() {
            self.current = 0;
        }
        let id = scheduler.schedule_every(self.interval);
        debug!("playback started at {:?} as {:?}", self.current(), id);
        self.task = Some(id);
        Some(id)
    }

    /// Stop playing and cancel the outstanding task.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(id) = self.task.take() {
            scheduler.cancel(id);
            debug!("playback stopped at {:?}", self.current());
        }
    }

    /// Start when stopped, stop when playing. Returns whether it is now
    /// playing.
    pub fn toggle(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.is_playing() {
            self.stop(scheduler);
        } else {
            self.start(scheduler);
        }
        self.is_playing()
    }

    /// Advance one year for a tick of task `id`. Stale ticks are dropped.
    /// Reaching the last year stops playback.
    pub fn tick(&mut self, id: TaskId, scheduler: &mut dyn Scheduler) -> Option<i32> {
        if self.task != Some(id) {
            warn!("dropping stale tick from {:?}", id);
            return None;
        }
        if !self.at_end() {
            self.current += 1;
        }
        if self.at_end() {
            self.stop(scheduler);
        }
        self.current()
    }

    /// Manual scrub to `year`. Always cancels playback; years outside the
    /// range are ignored.
    pub fn scrub(&mut self, year: i32, scheduler: &mut dyn Scheduler) -> Option<i32> {
        self.stop(scheduler);
        let index = self.years.iter().position(|&y| y == year)?;
        self.current = index;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback() -> Playback {
        Playback::new(vec![2000, 2001, 2002, 2003], Duration::from_millis(800))
    }

    #[test]
    fn test_start_schedules_task() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        let id = playback.start(&mut scheduler).unwrap();
        assert!(scheduler.is_active(id));
        assert_eq!(scheduler.interval_of(id), Some(Duration::from_millis(800)));
        assert_eq!(playback.start(&mut scheduler), None);
        assert_eq!(scheduler.active().len(), 1);
    }

    #[test]
    fn test_no_tick_after_stop() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        let id = playback.start(&mut scheduler).unwrap();
        assert_eq!(playback.tick(id, &mut scheduler), Some(2001));
        playback.stop(&mut scheduler);
        assert!(!scheduler.is_active(id));
        assert_eq!(playback.tick(id, &mut scheduler), None);
        assert_eq!(playback.current(), Some(2001));
    }

    #[test]
    fn test_scrub_cancels_playback() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        let id = playback.start(&mut scheduler).unwrap();
        assert_eq!(playback.scrub(2003, &mut scheduler), Some(2003));
        assert!(!playback.is_playing());
        assert!(scheduler.active().is_empty());
        assert_eq!(playback.tick(id, &mut scheduler), None);
    }

    #[test]
    fn test_scrub_outside_range_keeps_year() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        assert_eq!(playback.scrub(1990, &mut scheduler), None);
        assert_eq!(playback.current(), Some(2000));
    }

    #[test]
    fn test_start_at_end_rewinds() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        playback.scrub(2003, &mut scheduler);
        playback.start(&mut scheduler).unwrap();
        assert_eq!(playback.current(), Some(2000));
    }

    #[test]
    fn test_restart_ignores_old_task() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = playback();
        let first = playback.start(&mut scheduler).unwrap();
        assert!(!playback.toggle(&mut scheduler));
        assert!(playback.toggle(&mut scheduler));
        let second = playback.task().unwrap();
        assert_ne!(first, second);
        assert_eq!(playback.tick(first, &mut scheduler), None);
        assert_eq!(playback.tick(second, &mut scheduler), Some(2001));
    }

    #[test]
    fn test_single_year_cannot_play() {
        let mut scheduler = ManualScheduler::new();
        let mut playback = Playback::new(vec![2005], Duration::from_millis(800));
        assert_eq!(playback.start(&mut scheduler), None);
        assert!(Playback::new(Vec::new(), Duration::ZERO).current().is_none());
    }
}
