//! Splits a per-frame task domain (columns, rows, sprite columns) into one
//! contiguous index range per worker.
//!
//! The factory is *retargeted* before every dispatch: [`SectionFactory::set_target`]
//! binds the frame data the sections will read, and every [`Section`] it
//! hands out borrows that target.

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("section index {index} out of range (0..{workers})")]
    OutOfRange { index: usize, workers: usize },

    #[error("a section factory needs at least one worker")]
    NoWorkers,

    #[error("section requested before a target was set")]
    NoTarget,
}

/// Work performed over one half-open index range of the task domain.
///
/// Implementors must only write pixels that belong to `range`, so that the
/// sections of one batch never touch the same memory.
pub trait SectionTask: Sync {
    fn run(&self, range: Range<usize>);
}

/// A bound unit of work: an index range plus the target it runs against.
pub struct Section<'f, T> {
    pub range: Range<usize>,
    target: &'f T,
}

impl<T: SectionTask> Section<'_, T> {
    #[inline]
    pub fn run(&self) {
        self.target.run(self.range.clone());
    }
}

#[derive(Debug)]
pub struct SectionFactory<T> {
    task_count: usize,
    worker_count: usize,
    section_size: usize,
    remainder: usize,
    target: Option<T>,
}

impl<T> SectionFactory<T> {
    pub fn new(task_count: usize, worker_count: usize) -> Result<Self, SectionError> {
        if worker_count == 0 {
            return Err(SectionError::NoWorkers);
        }
        Ok(Self {
            task_count,
            worker_count,
            section_size: task_count / worker_count,
            remainder: task_count % worker_count,
            target: None,
        })
    }

    #[inline]
    pub fn task_count(&self) -> usize {
        self.task_count
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Length of section `index`; the last worker absorbs the remainder.
    pub fn get_section(&self, index: usize) -> Result<usize, SectionError> {
        self.check(index)?;
        if index + 1 == self.worker_count {
            Ok(self.section_size + self.remainder)
        } else {
            Ok(self.section_size)
        }
    }

    /// Half-open index range of section `index`.
    pub fn section_range(&self, index: usize) -> Result<Range<usize>, SectionError> {
        let len = self.get_section(index)?;
        let start = index * self.section_size;
        Ok(start..start + len)
    }

    /// Resize the task domain, keeping the worker count.
    pub fn set_task_number(&mut self, task_count: usize) {
        self.task_count = task_count;
        self.section_size = task_count / self.worker_count;
        self.remainder = task_count % self.worker_count;
    }

    /// Bind the frame data subsequent sections run against.
    pub fn set_target(&mut self, target: T) {
        self.target = Some(target);
    }

    /// Drop the current target, returning it.
    pub fn clear_target(&mut self) -> Option<T> {
        self.target.take()
    }

    /// Callable for section `index` bound to the current target.
    pub fn create_section(&self, index: usize) -> Result<Section<'_, T>, SectionError> {
        let range = self.section_range(index)?;
        let target = self.target.as_ref().ok_or(SectionError::NoTarget)?;
        Ok(Section { range, target })
    }

    #[inline]
    fn check(&self, index: usize) -> Result<(), SectionError> {
        if index < self.worker_count {
            Ok(())
        } else {
            Err(SectionError::OutOfRange {
                index,
                workers: self.worker_count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ranges(tasks: usize, workers: usize) -> Vec<Range<usize>> {
        let f = SectionFactory::<()>::new(tasks, workers).unwrap();
        (0..workers).map(|i| f.section_range(i).unwrap()).collect()
    }

    #[test]
    fn sections_partition_the_domain() {
        for tasks in 0..40 {
            for workers in 1..=tasks.max(1) {
                let rs = ranges(tasks, workers);
                let mut next = 0;
                for r in &rs {
                    assert_eq!(r.start, next, "gap/overlap for {tasks}/{workers}");
                    next = r.end;
                }
                assert_eq!(next, tasks);
                let total: usize = rs.iter().map(|r| r.len()).sum();
                assert_eq!(total, tasks);
            }
        }
    }

    #[test]
    fn last_section_absorbs_remainder() {
        let f = SectionFactory::<()>::new(10, 4).unwrap();
        assert_eq!(f.get_section(0), Ok(2));
        assert_eq!(f.get_section(2), Ok(2));
        assert_eq!(f.get_section(3), Ok(4));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let f = SectionFactory::<()>::new(10, 4).unwrap();
        assert_eq!(
            f.get_section(4),
            Err(SectionError::OutOfRange {
                index: 4,
                workers: 4
            })
        );
    }

    #[test]
    fn zero_workers_rejected() {
        assert_eq!(
            SectionFactory::<()>::new(10, 0).unwrap_err(),
            SectionError::NoWorkers
        );
    }

    #[test]
    fn set_task_number_recomputes_split() {
        let mut f = SectionFactory::<()>::new(10, 3).unwrap();
        f.set_task_number(7);
        assert_eq!(f.section_range(0), Ok(0..2));
        assert_eq!(f.section_range(2), Ok(4..7));
    }

    struct Recorder(Mutex<Vec<Range<usize>>>);
    impl SectionTask for Recorder {
        fn run(&self, range: Range<usize>) {
            self.0.lock().unwrap().push(range);
        }
    }

    #[test]
    fn create_section_requires_target() {
        let mut f = SectionFactory::<Recorder>::new(6, 2).unwrap();
        assert!(matches!(f.create_section(0), Err(SectionError::NoTarget)));

        f.set_target(Recorder(Mutex::new(Vec::new())));
        f.create_section(1).unwrap().run();
        let rec = f.clear_target().unwrap();
        assert_eq!(*rec.0.lock().unwrap(), vec![3..6]);
    }
}
