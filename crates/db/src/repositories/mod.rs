//! Database repositories.

pub mod audit_log;
pub mod inquiry;
pub mod listing;
pub mod report;
pub mod user;

pub use audit_log::AuditLogRepository;
pub use inquiry::InquiryRepository;
pub use listing::{ListingQuery, ListingRepository, ListingScope, ListingSort, escape_like};
pub use report::ReportRepository;
pub use user::UserRepository;
