pub mod model;
pub mod service;

pub use model::{group_rows, parse_repeat_count, Group, Row, RowKind, DEFAULT_REPEAT_COUNT};
pub use service::{LessonService, LessonServiceApi, PlannedGroup, RunPlan, RunSummary};
