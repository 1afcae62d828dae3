pub mod auth;
pub mod client;
pub mod keyring;
pub mod session;

use std::future::Future;

use crate::core::task::{Task, TaskId, TaskTitle};
use crate::error::TaskError;

pub use client::HttpTaskClient;
pub use session::{Session, SessionToken};

/// The four task operations the backend offers. Each is a single round trip
/// with no retry, and none of them touch local state.
pub trait TaskRemote {
    /// Full collection for the current user.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, TaskError>> + Send;

    /// Server assigns the id and starts the task incomplete.
    fn create_task(&self, title: &TaskTitle) -> impl Future<Output = Result<Task, TaskError>> + Send;

    /// Idempotent: sending the same value twice leaves the same state.
    fn set_completed(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> impl Future<Output = Result<Task, TaskError>> + Send;

    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), TaskError>> + Send;
}
