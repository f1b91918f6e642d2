//! Frame-independent machinery: the ray caster and the worker pool the
//! render passes are split across.

mod pool;
mod raycast;
mod section;

pub use pool::{PoolError, WorkerPool};

pub use raycast::{HitKind, RayCaster, RayInfo, Side, cast_ray, column_angle, column_dir};

pub use section::{Section, SectionError, SectionFactory, SectionTask};
