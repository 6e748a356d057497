/**
 * @file task.rs
 * @date 17/10/2026
 * @brief Cooperative scheduler for callbacks that repeat until stopped
 */
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub type TaskFn = Box<dyn FnMut(&TaskHandle)>;

/// Cancellation side of a started task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    name: Rc<str>,
    stopped: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// No invocation starts once this returns, even when called from the task itself
    pub fn stop(&self) {
        if !self.stopped.replace(true) {
            log::debug!("Task {} #{} stopped", self.name, self.id);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

struct Task {
    handle: TaskHandle,
    callback: TaskFn,
}

/// Single-threaded queue of repeating tasks. Each run takes the task at the
/// front, invokes it once and puts it back at the end unless it was stopped.
/// Clones share the same queue, so a task may start other tasks.
#[derive(Clone, Default)]
pub struct TaskScheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
    next_id: Rc<Cell<u64>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn start<F>(&self, name: &str, callback: F) -> TaskHandle
    where
        F: FnMut(&TaskHandle) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let handle = TaskHandle {
            id,
            name: Rc::from(name),
            stopped: Rc::new(Cell::new(false)),
        };

        log::debug!("Task {name} #{id} started");
        self.queue.borrow_mut().push_back(Task {
            handle: handle.clone(),
            callback: Box::new(callback),
        });

        handle
    }

    /// Invoke the next live task once. Returns `false` when nothing is left to run.
    pub fn run_once(&self) -> bool {
        loop {
            // the queue is released before invoking so the task may start others
            let Some(mut task) = self.queue.borrow_mut().pop_front() else {
                return false;
            };

            if task.handle.is_stopped() {
                continue;
            }

            (task.callback)(&task.handle);

            if !task.handle.is_stopped() {
                self.queue.borrow_mut().push_back(task);
            }

            return true;
        }
    }

    /// Invoke every task queued at the start of the round once, in order
    pub fn run_round(&self) -> usize {
        let pending = self.queue.borrow().len();
        (0..pending).take_while(|_| self.run_once()).count()
    }

    /// Run up to `max` invocations, stopping early once idle
    pub fn run(&self, max: usize) -> usize {
        (0..max).take_while(|_| self.run_once()).count()
    }

    /// Number of tasks that have not been stopped
    pub fn len(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|task| !task.handle.is_stopped())
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.len() == 0
    }

    pub fn stop_all(&self) {
        for task in self.queue.borrow().iter() {
            task.handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_repeat_in_order() {
        let scheduler = TaskScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for name in ["a", "b"] {
            let order = order.clone();
            scheduler.start(name, move |handle| {
                order.borrow_mut().push(handle.name().to_string());
            });
        }

        assert_eq!(scheduler.run(5), 5);
        assert_eq!(*order.borrow(), ["a", "b", "a", "b", "a"]);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_stop_from_outside() {
        let scheduler = TaskScheduler::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let handle = scheduler.start("count", move |_| counter.set(counter.get() + 1));

        scheduler.run(3);
        handle.stop();
        assert!(handle.is_stopped());
        assert_eq!(scheduler.run(3), 0);
        assert_eq!(count.get(), 3);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_stop_from_inside() {
        let scheduler = TaskScheduler::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        scheduler.start("once", move |handle| {
            counter.set(counter.get() + 1);
            handle.stop();
        });

        assert_eq!(scheduler.run(10), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_task_stops_another_before_its_turn() {
        let scheduler = TaskScheduler::new();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        let victim = scheduler.start("victim", move |_| flag.set(true));
        scheduler.start("killer", move |handle| {
            victim.stop();
            handle.stop();
        });

        // killer first
        scheduler.queue.borrow_mut().rotate_right(1);

        scheduler.run(10);
        assert!(!ran.get());
    }

    #[test]
    fn test_task_can_start_tasks() {
        let scheduler = TaskScheduler::new();
        let spawner = scheduler.clone();

        scheduler.start("parent", move |handle| {
            spawner.start("child", |handle| handle.stop());
            handle.stop();
        });

        assert_eq!(scheduler.run_round(), 1);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.run_round(), 1);
        assert!(scheduler.is_idle());
    }
}
