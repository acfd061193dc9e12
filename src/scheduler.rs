//! Interval tasks
//!
//! Replaces bare `setInterval` calls with tasks that hand back a cancellation
//! handle. The [`Scheduler`] runs on virtual time so polling can be stepped
//! deterministically; in the browser the same handles gate real intervals.

use std::cell::Cell;
use std::rc::Rc;

/// Cancels the task it was returned for. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Task {
    interval_ms: u64,
    /// `None` once the next firing would pass the end of virtual time
    next_due_ms: Option<u64>,
    handle: TaskHandle,
    job: Box<dyn FnMut(u64)>,
}

/// Virtual-time interval scheduler
#[derive(Default)]
pub struct Scheduler {
    now_ms: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of live (not cancelled) tasks
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.handle.is_cancelled()).count()
    }

    /// Run `job` every `interval_ms`, first one interval from now.
    ///
    /// The job receives the virtual time it fires at. A zero interval is
    /// treated as 1 ms.
    pub fn every(&mut self, interval_ms: u64, job: impl FnMut(u64) + 'static) -> TaskHandle {
        let interval_ms = interval_ms.max(1);
        let handle = TaskHandle::new();
        self.tasks.push(Task {
            interval_ms,
            next_due_ms: self.now_ms.checked_add(interval_ms),
            handle: handle.clone(),
            job: Box::new(job),
        });
        handle
    }

    /// Move virtual time forward, firing every task that comes due.
    ///
    /// Firings happen in due-time order; tasks due at the same instant fire
    /// in registration order. Returns the number of firings.
    pub fn advance(&mut self, ms: u64) -> usize {
        let target = self.now_ms.saturating_add(ms);
        let mut fired = 0;

        loop {
            self.tasks.retain(|t| !t.handle.is_cancelled());

            // min_by_key keeps the first of equal keys
            let next = self
                .tasks
                .iter()
                .enumerate()
                .filter_map(|(i, t)| {
                    t.next_due_ms
                        .filter(|&due| due <= target)
                        .map(|due| (i, due))
                })
                .min_by_key(|&(_, due)| due);
            let Some((i, due)) = next else {
                break;
            };

            let task = &mut self.tasks[i];
            self.now_ms = due;
            task.next_due_ms = due.checked_add(task.interval_ms);
            (task.job)(self.now_ms);
            fired += 1;
        }

        self.now_ms = target;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_fires_on_interval() {
        let mut scheduler = Scheduler::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let log = hits.clone();
        scheduler.every(1000, move |t| log.borrow_mut().push(t));

        assert_eq!(scheduler.advance(999), 0);
        assert_eq!(scheduler.advance(1), 1);
        assert_eq!(scheduler.advance(2500), 2);
        assert_eq!(*hits.borrow(), vec![1000, 2000, 3000]);
        assert_eq!(scheduler.now_ms(), 3500);
    }

    #[test]
    fn test_cancel_stops_task() {
        let mut scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handle = scheduler.every(100, move |_| c.set(c.get() + 1));

        scheduler.advance(250);
        assert_eq!(count.get(), 2);

        handle.cancel();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance(1000), 0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_from_inside_job() {
        let mut scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let own_handle: Rc<RefCell<Option<TaskHandle>>> = Rc::new(RefCell::new(None));

        let c = count.clone();
        let h = own_handle.clone();
        let handle = scheduler.every(10, move |_| {
            c.set(c.get() + 1);
            if c.get() == 3 {
                if let Some(handle) = h.borrow().as_ref() {
                    handle.cancel();
                }
            }
        });
        own_handle.replace(Some(handle));

        scheduler.advance(1000);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_tasks_interleave_in_time_order() {
        let mut scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        scheduler.every(1000, move |t| o.borrow_mut().push(("slow", t)));
        let o = order.clone();
        scheduler.every(500, move |t| o.borrow_mut().push(("fast", t)));

        scheduler.advance(1000);
        assert_eq!(
            *order.borrow(),
            vec![("fast", 500), ("slow", 1000), ("fast", 1000)]
        );
    }

    #[test]
    fn test_advance_to_end_of_time() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.advance(u64::MAX - 10), 0);

        let hits = Rc::new(RefCell::new(Vec::new()));
        let log = hits.clone();
        scheduler.every(5, move |t| log.borrow_mut().push(t));

        assert_eq!(scheduler.advance(u64::MAX), 2);
        assert_eq!(*hits.borrow(), vec![u64::MAX - 5, u64::MAX]);
        assert_eq!(scheduler.now_ms(), u64::MAX);
        assert_eq!(scheduler.advance(1), 0);

        // Registered with no room left before the end
        scheduler.every(1, |_| panic!("must not fire"));
        assert_eq!(scheduler.advance(u64::MAX), 0);
    }

    #[test]
    fn test_zero_interval_does_not_spin() {
        let mut scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        scheduler.every(0, move |_| c.set(c.get() + 1));
        assert_eq!(scheduler.advance(5), 5);
    }
}
