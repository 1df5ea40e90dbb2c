//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod command_job_repo;

pub use command_job_repo::CommandJobRepo;
