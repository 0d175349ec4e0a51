//! Database entities.

pub mod audit_log;
pub mod inquiry;
pub mod pet_listing;
pub mod report;
pub mod user;

pub use audit_log::Entity as AuditLog;
pub use inquiry::Entity as Inquiry;
pub use pet_listing::Entity as PetListing;
pub use report::Entity as Report;
pub use user::Entity as User;
