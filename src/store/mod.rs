//! Typed queries over the relational store.
//!
//! Functions here carry no business rules: "no row" comes back as `None`
//! (or a zero row count), and constraint violations surface as
//! [`sqlx::Error`] for [`crate::errors::AppError`] to classify.

pub mod members;
pub mod notes;
pub mod projects;
pub mod subtasks;
pub mod tasks;
pub mod users;
