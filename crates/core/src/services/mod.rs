//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod account;
pub mod audit;
pub mod favorite;
pub mod inquiry;
pub mod listing;
pub mod mailer;
pub mod moderation;
pub mod otp;
pub mod params;
pub mod password;
pub mod summary;
pub mod token;

pub use access::{Capability, Decision, authorize, check};
pub use account::{
    AccountService, LoginInput, LoginResult, RegisterInput, ResendOtpInput, VerificationOutcome,
    VerifyOtpInput,
};
pub use audit::{AuditFilters, AuditLogView, AuditService};
pub use favorite::{FavoriteService, FavoriteToggle};
pub use inquiry::{
    CreateInquiryInput, InquiryFilters, InquiryService, InquiryView, UpdateInquiryStatusInput,
};
pub use listing::{
    CreateListingInput, ListingFilters, ListingService, ListingView, UpdateListingInput,
};
pub use mailer::{LogMailer, MailMessage, Mailer, MemoryMailer, SmtpMailer, mailer_from_config};
pub use moderation::{
    CreateReportInput, ModerationService, ReportFilters, ReportView, UpdateReportInput,
};
pub use summary::{ActorSummary, ListingSummary, UserSummary};
pub use token::{Claims, SessionTokens};
