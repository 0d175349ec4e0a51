//! Common utilities and shared types for the `AdoptMe` backend.
//!
//! This crate provides foundational components used across all crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers via [`IdGenerator`]
//! - **Storage**: Blob storage backends for listing images
//! - **Pagination**: Page normalization via [`PageParams`] and the [`Paginated`] envelope
//!
//! # Example
//!
//! ```no_run
//! use adoptme_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{}, next id {id}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorDetail, FieldError};
pub use id::{IdGenerator, ensure_valid_id, is_valid_id};
pub use pagination::{PageParams, Paginated};
pub use storage::{LocalStorage, MemoryStorage, StorageBackend, StoredBlob};
