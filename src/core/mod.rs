pub mod projection;
pub mod store;
pub mod task;
