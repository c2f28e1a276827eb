// Fixed thread pool fanning sink writes out in sync mode

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    tasks: VecDeque<Task>,
    stop: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
}

/// Fixed-size worker pool over a mutex-guarded FIFO.
///
/// Used only for sync-mode parallel sinks; the async worker keeps all sink
/// writes on its own thread.
pub(crate) struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                tasks: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let shared = Arc::clone(&shared);
            workers.push(thread::spawn(move || worker_loop(&shared)));
        }

        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a task; silently ignored after shutdown.
    pub fn execute(&self, task: Task) {
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.stop {
                return;
            }
            state.tasks.push_back(task);
        }
        self.shared.available.notify_one();
    }

    /// Stop accepting tasks, finish the queued ones and join the workers.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.stop = true;
        }
        self.shared.available.notify_all();

        let workers = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let task = {
            let state = shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut state = shared
                .available
                .wait_while(state, |s| !s.stop && s.tasks.is_empty())
                .unwrap_or_else(PoisonError::into_inner);
            if state.stop && state.tasks.is_empty() {
                return;
            }
            match state.tasks.pop_front() {
                Some(task) => task,
                None => continue,
            }
        };

        // A panicking task must not take the worker down with it.
        let _ = panic::catch_unwind(AssertUnwindSafe(task));
    }
}
