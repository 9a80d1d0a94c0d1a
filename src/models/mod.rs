pub mod member;
pub mod note;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
