use std::time::Duration;

// Event type tags carried in notification payloads
pub const EXPENSE_CREATED: &str = "expense_created";
pub const EXPENSE_UPDATED: &str = "expense_updated";
pub const EXPENSE_DELETED: &str = "expense_deleted";
pub const SETTLEMENT_CREATED: &str = "settlement_created";
pub const SETTLEMENT_UPDATED: &str = "settlement_updated";
pub const SETTLEMENT_DELETED: &str = "settlement_deleted";

pub const TAG_SHARED: &str = "tag_shared";
pub const TAG_REMOVED: &str = "tag_removed";
pub const DRAFT_STATUS_UPDATE: &str = "draft_status_update";
pub const DRAFTS_READY: &str = "drafts_ready";

// Receipt extraction gives up after this many polls of the OCR operation
pub const OCR_MAX_POLL_ATTEMPTS: u32 = 10;
pub const OCR_POLL_INTERVAL: Duration = Duration::from_secs(1);
