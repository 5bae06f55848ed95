use futures::TryStreamExt;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fmt;

use crate::error::AppResult;
use crate::models::{ConversationSummary, MessageRow, Pagination};

use super::{store, users};

const KEY_SEPARATOR: char = ':';

/// Canonical identity of a two-party conversation. Both participant ids are
/// ordered lexicographically, so the key is the same no matter which side
/// sent a given message. The lower id is length-prefixed, so ids that
/// contain the separator can't make two pairs collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}{sep}{}{sep}{}", lo.len(), lo, hi, sep = KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn conversation_key(a: &str, b: &str) -> ConversationKey {
    ConversationKey::new(a, b)
}

struct Group {
    latest: MessageRow,
    unread: i64,
}

/// Groups the user's message log by conversation, keeping the newest message
/// and an unread tally per group. Newest conversation first.
///
/// This rescans every message the user participates in on each call. At
/// higher volumes it should be replaced by a per-key summary table updated in
/// the same transaction as each insert.
pub async fn list_conversations(
    db: &SqlitePool,
    user_id: &str,
    page: i64,
    page_size: i64,
) -> AppResult<(Vec<ConversationSummary>, Pagination)> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages
             WHERE sender_id = ? OR recipient_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch(db);

        while let Some(row) = rows.try_next().await? {
            let unread = row.recipient_id == user_id && !row.is_read && !row.is_deleted;
            match index.get(&row.conversation_key) {
                Some(&i) => {
                    if unread {
                        groups[i].unread += 1;
                    }
                }
                None => {
                    index.insert(row.conversation_key.clone(), groups.len());
                    groups.push(Group {
                        latest: row,
                        unread: i64::from(unread),
                    });
                }
            }
        }
    }

    let total = groups.len() as i64;
    let offset = Pagination::offset(page, page_size) as usize;
    let page_groups: Vec<Group> = groups
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();

    let other_ids: Vec<String> = page_groups
        .iter()
        .map(|g| other_participant(&g.latest, user_id).to_string())
        .collect();
    let mut others = users::user_summaries(db, &other_ids).await?;

    let unread: Vec<i64> = page_groups.iter().map(|g| g.unread).collect();
    let latest = store::hydrate(db, page_groups.into_iter().map(|g| g.latest).collect()).await?;

    let conversations = latest
        .into_iter()
        .zip(other_ids)
        .zip(unread)
        .map(|((last_message, other_user_id), unread_count)| ConversationSummary {
            conversation_key: last_message.conversation_key.clone(),
            other_user: others.remove(&other_user_id),
            other_user_id,
            last_message,
            unread_count,
        })
        .collect();

    Ok((conversations, Pagination::new(page, page_size, total)))
}

fn other_participant<'a>(row: &'a MessageRow, user_id: &str) -> &'a str {
    if row.sender_id == user_id {
        &row.recipient_id
    } else {
        &row.sender_id
    }
}
