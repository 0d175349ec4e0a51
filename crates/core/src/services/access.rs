//! Ownership and role checks for every gated operation.
//!
//! Handlers authenticate first (401); everything past authentication asks
//! [`check`] whether the caller holds the capability and maps a denial to 403.

use adoptme_common::{AppError, AppResult};
use adoptme_db::entities::{inquiry, pet_listing, user};

/// Something a caller may or may not be allowed to do.
#[derive(Debug, Clone, Copy)]
pub enum Capability<'a> {
    /// Update, delete or change the images of a listing.
    EditListing(&'a pet_listing::Model),
    /// Change the status or note of a received inquiry.
    ManageInquiry(&'a inquiry::Model),
    /// Read hidden listing details (owner or admin).
    ViewHiddenListing(&'a pet_listing::Model),
    /// Admin-only operations: reports, listing visibility, audit log, all inquiries.
    Moderate,
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

/// Decide whether `caller` holds `capability`.
#[must_use]
pub fn check(caller: &user::Model, capability: Capability<'_>) -> Decision {
    let allowed = match capability {
        Capability::EditListing(listing) => listing.owner_id == caller.id,
        Capability::ManageInquiry(inquiry) => inquiry.owner_id == caller.id,
        Capability::ViewHiddenListing(listing) => {
            listing.owner_id == caller.id || caller.is_admin()
        }
        Capability::Moderate => caller.is_admin(),
    };

    match (allowed, capability) {
        (true, _) => Decision::Allow,
        (false, Capability::Moderate) => Decision::Deny("Admin access required"),
        (false, _) => Decision::Deny("Not allowed"),
    }
}

/// [`check`] as a result: denial becomes `Forbidden`.
pub fn authorize(caller: &user::Model, capability: Capability<'_>) -> AppResult<()> {
    match check(caller, capability) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(AppError::Forbidden(reason.to_string())),
    }
}

#[cfg(test)]
pub(crate) use adoptme_db::test_utils as fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use adoptme_db::entities::user::UserRole;

    #[test]
    fn test_listing_owner_only() {
        let owner = fixtures::user("owner", UserRole::User);
        let other = fixtures::user("other", UserRole::User);
        let admin = fixtures::user("admin", UserRole::Admin);
        let listing = fixtures::listing("l1", "owner");

        assert_eq!(check(&owner, Capability::EditListing(&listing)), Decision::Allow);
        assert_eq!(
            check(&other, Capability::EditListing(&listing)),
            Decision::Deny("Not allowed")
        );
        // admins moderate visibility, they do not edit content
        assert!(authorize(&admin, Capability::EditListing(&listing)).is_err());
    }

    #[test]
    fn test_hidden_listing_visible_to_owner_and_admin() {
        let owner = fixtures::user("owner", UserRole::User);
        let other = fixtures::user("other", UserRole::User);
        let admin = fixtures::user("admin", UserRole::Admin);
        let listing = fixtures::listing("l1", "owner");

        assert!(authorize(&owner, Capability::ViewHiddenListing(&listing)).is_ok());
        assert!(authorize(&admin, Capability::ViewHiddenListing(&listing)).is_ok());
        assert!(authorize(&other, Capability::ViewHiddenListing(&listing)).is_err());
    }

    #[test]
    fn test_inquiry_owner_only() {
        let inquiry = fixtures::inquiry("i1", "l1", "owner", "sender");
        let owner = fixtures::user("owner", UserRole::User);
        let sender = fixtures::user("sender", UserRole::User);

        assert!(authorize(&owner, Capability::ManageInquiry(&inquiry)).is_ok());
        assert!(matches!(
            authorize(&sender, Capability::ManageInquiry(&inquiry)),
            Err(AppError::Forbidden(msg)) if msg == "Not allowed"
        ));
    }

    #[test]
    fn test_moderate_requires_admin() {
        let user = fixtures::user("u", UserRole::User);
        let admin = fixtures::user("a", UserRole::Admin);

        assert_eq!(
            check(&user, Capability::Moderate),
            Decision::Deny("Admin access required")
        );
        assert_eq!(check(&admin, Capability::Moderate), Decision::Allow);
    }
}
