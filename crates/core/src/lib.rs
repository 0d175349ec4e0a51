//! Core business logic for the `AdoptMe` backend.
//!
//! Services take repositories and collaborators at construction and expose
//! one method per operation. Ownership and role checks live in
//! [`services::access`].

pub mod services;

pub use services::*;
