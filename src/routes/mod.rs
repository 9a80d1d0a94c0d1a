pub mod auth;
pub mod health;
pub mod members;
pub mod notes;
pub mod projects;
pub mod subtasks;
pub mod tasks;
