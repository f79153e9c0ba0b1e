//! Query parameters for admin listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinebook_core::types::id::{ShowId, UserId};
use cinebook_core::types::pagination::PageRequest;
use cinebook_entity::booking::{BookingFilter, BookingStatus};

/// Query parameters for `GET /api/admin/bookings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingListParams {
    /// Page number (1-based, default: 1).
    pub page: Option<u64>,
    /// Items per page (default: 20, max: 100).
    pub per_page: Option<u64>,
    /// Status filter.
    pub status: Option<BookingStatus>,
    /// Show filter.
    pub show_id: Option<ShowId>,
    /// Owner filter.
    pub user_id: Option<UserId>,
    /// Created at or after.
    pub from: Option<DateTime<Utc>>,
    /// Created at or before.
    pub to: Option<DateTime<Utc>>,
}

impl BookingListParams {
    /// Split into the store filter and page request.
    pub fn into_parts(self) -> (BookingFilter, PageRequest) {
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.page_size),
        );
        let filter = BookingFilter {
            status: self.status,
            show_id: self.show_id,
            user_id: self.user_id,
            created_from: self.from,
            created_to: self.to,
        };
        (filter, page)
    }
}
