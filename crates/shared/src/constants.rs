pub const APP_NAME: &str = "Alumni Messaging";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const MAX_ATTACHMENTS: usize = 10;
pub const MAX_ATTACHMENT_NAME_LENGTH: usize = 255;
pub const MAX_REACTION_LENGTH: usize = 32;
pub const MIN_SEARCH_QUERY_LENGTH: usize = 2;
pub const MAX_SEARCH_QUERY_LENGTH: usize = 200;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const SEARCH_RESULT_LIMIT: i64 = 50;

// WebSocket
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_IDLE_TIMEOUT_SECS: u64 = 75;
