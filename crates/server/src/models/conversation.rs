use serde::Serialize;

use super::{Message, Pagination, UserSummary};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_key: String,
    pub other_user_id: String,
    /// `None` when the identity collaborator no longer knows the user.
    pub other_user: Option<UserSummary>,
    pub last_message: Message,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
    pub other_user: UserSummary,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedReadResponse {
    pub count: usize,
}
