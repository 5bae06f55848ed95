use crate::constants::*;

/// Checks the content bound shared by every message kind. Lengths are
/// counted in code points, not bytes.
pub fn validate_message_content(content: &str, required: bool) -> Result<(), String> {
    if required && content.trim().is_empty() {
        return Err("Message content is required".into());
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_attachment_count(count: usize) -> Result<(), String> {
    if count > MAX_ATTACHMENTS {
        return Err(format!(
            "A message can carry at most {} attachments",
            MAX_ATTACHMENTS
        ));
    }
    Ok(())
}

pub fn validate_attachment_meta(name: &str, size: i64, mime_type: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Attachment name is required".into());
    }
    if name.chars().count() > MAX_ATTACHMENT_NAME_LENGTH {
        return Err(format!(
            "Attachment name must be at most {} characters",
            MAX_ATTACHMENT_NAME_LENGTH
        ));
    }
    if size < 0 {
        return Err("Attachment size cannot be negative".into());
    }
    // type/subtype
    match mime_type.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => Ok(()),
        _ => Err("Attachment mime type must look like type/subtype".into()),
    }
}

pub fn validate_reaction(emoji: &str) -> Result<(), String> {
    let trimmed = emoji.trim();
    if trimmed.is_empty() {
        return Err("Reaction is required".into());
    }
    if trimmed.chars().count() > MAX_REACTION_LENGTH {
        return Err(format!(
            "Reaction must be at most {} characters",
            MAX_REACTION_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_search_query(query: &str) -> Result<(), String> {
    let len = query.trim().chars().count();
    if len < MIN_SEARCH_QUERY_LENGTH {
        return Err(format!(
            "Search query must be at least {} characters",
            MIN_SEARCH_QUERY_LENGTH
        ));
    }
    if len > MAX_SEARCH_QUERY_LENGTH {
        return Err(format!(
            "Search query must be at most {} characters",
            MAX_SEARCH_QUERY_LENGTH
        ));
    }
    Ok(())
}

/// Clamps a requested page size into `[1, max]`, falling back to `default`.
pub fn clamp_page_size(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}
