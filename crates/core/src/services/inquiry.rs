//! Inquiry service: messages from prospective adopters to listing owners.

use adoptme_common::{AppError, AppResult, IdGenerator, PageParams, Paginated, pagination::DEFAULT_LIMIT};
use adoptme_db::{
    entities::{
        inquiry::{self, InquiryStatus},
        user,
    },
    repositories::{InquiryRepository, ListingRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    access::{Capability, authorize},
    params::{non_blank, parse_enum},
    summary::{ListingSummary, UserSummary, load_listings, load_users},
};

/// Input for contacting a listing owner.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInquiryInput {
    #[validate(length(min = 5, max = 1000, message = "Message must be 5-1000 characters"))]
    pub message: String,

    #[serde(default)]
    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: String,
}

/// Owner's status change, with an optional note.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInquiryStatusInput {
    pub status: InquiryStatus,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub owner_note: Option<String>,
}

/// Query-string filters for inquiry lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InquiryFilters {
    pub status: Option<String>,
    /// Admin list only: substring of message or phone.
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl InquiryFilters {
    fn status(&self) -> AppResult<Option<InquiryStatus>> {
        parse_enum("status", self.status.as_deref())
    }

    fn page(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.limit.as_deref(), DEFAULT_LIMIT)
    }
}

/// An inquiry with sender, listing and (for admins) owner summarized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryView {
    pub id: String,
    pub listing: Option<ListingSummary>,
    pub sender: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    pub message: String,
    pub phone: String,
    pub status: InquiryStatus,
    pub owner_note: String,
    pub is_flagged: bool,
    pub flag_reason: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Inquiries between adopters and listing owners.
#[derive(Clone)]
pub struct InquiryService {
    inquiry_repo: InquiryRepository,
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl InquiryService {
    /// Create a new inquiry service.
    #[must_use]
    pub const fn new(
        inquiry_repo: InquiryRepository,
        listing_repo: ListingRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            inquiry_repo,
            listing_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send an inquiry about a visible listing. Owners cannot contact themselves.
    pub async fn create(
        &self,
        sender: &user::Model,
        listing_id: &str,
        mut input: CreateInquiryInput,
    ) -> AppResult<inquiry::Model> {
        input.message = input.message.trim().to_string();
        input.phone = input.phone.trim().to_string();
        input.validate()?;

        let listing = self.listing_repo.get_visible(listing_id).await?;
        if listing.owner_id == sender.id {
            return Err(AppError::BadRequest(
                "You cannot contact your own listing".to_string(),
            ));
        }

        let now = Utc::now();
        let model = inquiry::ActiveModel {
            id: Set(self.id_gen.generate()),
            listing_id: Set(listing.id),
            owner_id: Set(listing.owner_id),
            sender_id: Set(sender.id.clone()),
            message: Set(input.message),
            phone: Set(input.phone),
            status: Set(InquiryStatus::Open),
            owner_note: Set(String::new()),
            is_flagged: Set(false),
            flag_reason: Set(String::new()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inquiry = self.inquiry_repo.create(model).await?;
        tracing::info!(inquiry_id = %inquiry.id, listing_id = %inquiry.listing_id, "Inquiry sent");
        Ok(inquiry)
    }

    /// Inquiries received by `owner`, newest first.
    pub async fn list_received(
        &self,
        owner: &user::Model,
        filters: InquiryFilters,
    ) -> AppResult<Paginated<InquiryView>> {
        let page = filters.page();
        let (items, total) = self
            .inquiry_repo
            .find_for_owner(&owner.id, filters.status()?, page)
            .await?;

        let views = self.views(items, false).await?;
        Ok(Paginated::new(views, total, page))
    }

    /// Change status and, when given, the owner's note.
    pub async fn update_status(
        &self,
        caller: &user::Model,
        inquiry_id: &str,
        input: UpdateInquiryStatusInput,
    ) -> AppResult<inquiry::Model> {
        input.validate()?;

        let inquiry = self.inquiry_repo.get_by_id(inquiry_id).await?;
        authorize(caller, Capability::ManageInquiry(&inquiry))?;

        let mut active: inquiry::ActiveModel = inquiry.into();
        active.status = Set(input.status);
        if let Some(note) = input.owner_note {
            active.owner_note = Set(note.trim().to_string());
        }
        active.updated_at = Set(Utc::now().into());

        self.inquiry_repo.update(active).await
    }

    /// Every inquiry on the platform. Admin only.
    pub async fn list_all(
        &self,
        caller: &user::Model,
        filters: InquiryFilters,
    ) -> AppResult<Paginated<InquiryView>> {
        authorize(caller, Capability::Moderate)?;

        let page = filters.page();
        let (items, total) = self
            .inquiry_repo
            .find_all(filters.status()?, non_blank(filters.q.as_deref()), page)
            .await?;

        let views = self.views(items, true).await?;
        Ok(Paginated::new(views, total, page))
    }

    async fn views(
        &self,
        inquiries: Vec<inquiry::Model>,
        admin: bool,
    ) -> AppResult<Vec<InquiryView>> {
        let mut user_ids: Vec<&str> = inquiries.iter().map(|i| i.sender_id.as_str()).collect();
        if admin {
            user_ids.extend(inquiries.iter().map(|i| i.owner_id.as_str()));
        }
        let listing_ids: Vec<&str> = inquiries.iter().map(|i| i.listing_id.as_str()).collect();
        let users = load_users(&self.user_repo, &user_ids).await?;
        let listings = load_listings(&self.listing_repo, &listing_ids).await?;

        Ok(inquiries
            .into_iter()
            .map(|i| {
                let listing = listings.get(&i.listing_id).map(|l| {
                    let summary = ListingSummary::brief(l);
                    if admin {
                        summary.with_visibility(l.is_hidden)
                    } else {
                        summary
                    }
                });
                InquiryView {
                    listing,
                    sender: users.get(&i.sender_id).map(UserSummary::from),
                    owner: if admin {
                        users.get(&i.owner_id).map(UserSummary::from)
                    } else {
                        None
                    },
                    id: i.id,
                    message: i.message,
                    phone: i.phone,
                    status: i.status,
                    owner_note: i.owner_note,
                    is_flagged: i.is_flagged,
                    flag_reason: i.flag_reason,
                    created_at: i.created_at,
                    updated_at: i.updated_at,
                }
            })
            .collect())
    }
}
