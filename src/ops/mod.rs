pub mod check;
pub mod normalize;
pub mod project_ops;
pub mod query;
pub mod reorder;
pub mod subtask_ops;
pub mod task_ops;
