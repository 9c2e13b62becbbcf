use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// An observable value whose transient states reset themselves after a delay.
///
/// Every transition supersedes the timer scheduled by the previous one: the
/// old task is aborted, and if it already woke up its generation no longer
/// matches, so its reset is dropped.
pub struct AutoDismiss<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    sender: watch::Sender<T>,
    schedule: Mutex<Schedule>,
}

#[derive(Default)]
struct Schedule {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Schedule {
    fn supersede(&mut self) -> u64 {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.generation
    }
}

impl<T> Clone for AutoDismiss<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> AutoDismiss<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                sender,
                schedule: Mutex::new(Schedule::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.sender.subscribe()
    }

    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.inner.sender.borrow()
    }

    /// Changes the value without touching the pending timer.
    pub fn modify(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let _schedule = self.inner.lock();
        self.inner.sender.send_if_modified(f)
    }

    /// Applies `f` as a new transition, cancelling the pending timer, but only
    /// when `f` reports that it changed something.
    pub fn transition_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let mut schedule = self.inner.lock();
        let modified = self.inner.sender.send_if_modified(f);
        if modified {
            schedule.supersede();
        }
        modified
    }

    pub fn transition(&self, f: impl FnOnce(&mut T)) {
        self.transition_if(|value| {
            f(value);
            true
        });
    }

    /// Applies `f` as a new transition and schedules `reset` to run after
    /// `after`, unless another transition happens first.
    pub fn transition_for<R>(&self, f: impl FnOnce(&mut T), after: Duration, reset: R)
    where
        R: FnOnce(&mut T) + Send + 'static,
    {
        let mut schedule = self.inner.lock();
        let generation = schedule.supersede();
        self.inner.sender.send_modify(f);

        let inner = Arc::downgrade(&self.inner);
        schedule.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(generation, reset);
            }
        }));
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire(&self, generation: u64, reset: impl FnOnce(&mut T)) {
        let mut schedule = self.lock();
        if schedule.generation != generation {
            return;
        }
        schedule.generation += 1;
        schedule.timer = None;
        self.sender.send_modify(reset);
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let schedule = self
            .schedule
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = schedule.timer.take() {
            timer.abort();
        }
    }
}
