//! ---------------------------------------------------------------------------
//! Fixed worker pool with a per-frame batch barrier
//!
//! * Workers sleep on a condition variable until the FIFO queue has a job.
//! * `outstanding` counts the jobs of the current batch that have not
//!   finished yet; the orchestrator spins on it after running its own share.
//! * A job that never returns stalls the barrier forever. There is no
//!   timeout and no cancellation.
//!
//! Safety: [`WorkerPool::dispatch`] hands borrowed sections to `'static`
//! worker threads. This is sound only because `dispatch` does not return
//! (or unwind) before `outstanding` reaches zero, i.e. before every job
//! holding a borrow has been consumed and dropped.
//! ---------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use thiserror::Error;

use crate::engine::section::{SectionError, SectionFactory, SectionTask};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("a render job panicked")]
    JobPanicked,

    #[error(transparent)]
    Section(#[from] SectionError),
}

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    stop: AtomicBool,
    outstanding: AtomicUsize,
    panicked: AtomicBool,
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // Jobs run outside the lock, so a poisoned queue still holds
        // consistent data.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `threads` workers; `0` means one per hardware thread.
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            threads
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stop: AtomicBool::new(false),
            outstanding: AtomicUsize::new(0),
            panicked: AtomicBool::new(false),
        });

        let workers = (0..threads)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("render-worker-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn render worker")
            })
            .collect();

        log::info!("worker pool started with {threads} threads");
        Self { shared, workers }
    }

    /// Number of sections a batch is split into.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Arm the barrier for `n` queued jobs.
    pub fn new_batch(&self, n: usize) {
        self.shared.panicked.store(false, Ordering::Relaxed);
        self.shared.outstanding.store(n, Ordering::Release);
    }

    /// Push one job and wake one idle worker.
    pub fn enqueue<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(job));
    }

    /// `true` while some job of the current batch is still running.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.shared.outstanding.load(Ordering::Acquire) > 0
    }

    /// Busy-wait barrier: spin (yielding) until the batch drains.
    pub fn wait(&self) {
        while self.is_busy() {
            thread::yield_now();
        }
    }

    /// Run every section of `factory` and return once all of them finished.
    ///
    /// Sections `0 .. n-1` go to the workers; the calling thread runs the
    /// last one itself before spinning on the barrier.
    pub fn dispatch<T: SectionTask>(&self, factory: &SectionFactory<T>) -> Result<(), PoolError> {
        let n = factory.worker_count();
        // Bind every section up front so a bad factory fails before anything runs.
        let mut sections = (0..n)
            .map(|i| factory.create_section(i))
            .collect::<Result<Vec<_>, _>>()?;
        let own = sections.pop().ok_or(SectionError::NoWorkers)?;

        self.new_batch(sections.len());
        for section in sections {
            let job: Box<dyn FnOnce() + Send + '_> = Box::new(move || section.run());
            // SAFETY: the borrow inside `job` outlives its execution because
            // we wait for `outstanding == 0` below before returning, and the
            // worker drops the job before decrementing the counter.
            let job: Job = unsafe { std::mem::transmute(job) };
            self.push(job);
        }

        let own_result = panic::catch_unwind(AssertUnwindSafe(|| own.run()));
        self.wait();

        if let Err(payload) = own_result {
            panic::resume_unwind(payload);
        }
        if self.shared.panicked.load(Ordering::Relaxed) {
            return Err(PoolError::JobPanicked);
        }
        Ok(())
    }

    fn push(&self, job: Job) {
        self.shared.lock_queue().push_back(job);
        self.shared.available.notify_one();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.lock_queue();
            loop {
                if shared.stop.load(Ordering::Acquire) {
                    return;
                }
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(|e| e.into_inner());
            }
        };

        // `job` is consumed (and its captures dropped) inside catch_unwind.
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("render job panicked in {:?}", thread::current().name());
            shared.panicked.store(true, Ordering::Relaxed);
        }
        shared.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        {
            // Taking the lock orders the flag against workers about to wait.
            let _queue = self.shared.lock_queue();
            self.shared.available.notify_all();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        log::debug!("worker pool shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Range;

    struct Fill<'a> {
        cells: &'a [AtomicUsize],
    }
    impl SectionTask for Fill<'_> {
        fn run(&self, range: Range<usize>) {
            for i in range {
                self.cells[i].fetch_add(i + 1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn dispatch_covers_every_index_once() {
        let pool = WorkerPool::new(4);
        let cells: Vec<AtomicUsize> = (0..103).map(|_| AtomicUsize::new(0)).collect();
        let mut factory = SectionFactory::new(cells.len(), pool.worker_count()).unwrap();
        factory.set_target(Fill { cells: &cells });
        pool.dispatch(&factory).unwrap();

        assert!(!pool.is_busy());
        for (i, c) in cells.iter().enumerate() {
            assert_eq!(c.load(Ordering::Relaxed), i + 1);
        }
    }

    #[test]
    fn dispatch_without_target_fails() {
        let pool = WorkerPool::new(2);
        let factory = SectionFactory::<Fill>::new(10, pool.worker_count()).unwrap();
        assert_eq!(
            pool.dispatch(&factory),
            Err(PoolError::Section(SectionError::NoTarget))
        );
    }

    #[test]
    fn enqueue_and_barrier() {
        let pool = WorkerPool::new(3);
        let hits = Arc::new(AtomicUsize::new(0));
        pool.new_batch(8);
        for _ in 0..8 {
            let hits = Arc::clone(&hits);
            pool.enqueue(move || {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.wait();
        assert_eq!(hits.load(Ordering::Relaxed), 8);
    }

    struct Boom;
    impl SectionTask for Boom {
        fn run(&self, range: Range<usize>) {
            if range.start == 0 {
                panic!("boom");
            }
        }
    }

    #[test]
    fn worker_panic_is_reported() {
        let pool = WorkerPool::new(2);
        let mut factory = SectionFactory::new(10, pool.worker_count()).unwrap();
        factory.set_target(Boom);
        assert_eq!(pool.dispatch(&factory), Err(PoolError::JobPanicked));

        // the pool keeps working afterwards
        let cells: Vec<AtomicUsize> = (0..4).map(|_| AtomicUsize::new(0)).collect();
        let mut factory = SectionFactory::new(cells.len(), pool.worker_count()).unwrap();
        factory.set_target(Fill { cells: &cells });
        pool.dispatch(&factory).unwrap();
    }

    #[test]
    fn zero_threads_means_hardware_concurrency() {
        let pool = WorkerPool::new(0);
        assert!(pool.worker_count() >= 1);
    }
}
