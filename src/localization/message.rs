use axum::http::StatusCode;

/// Localized text split into its status prefix and message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Status declared by the text, if any
    pub status: Option<StatusCode>,
    /// Message body without the status prefix
    pub message: String,
}

/// Split `"404: Not Found"` style text into a status and a message.
///
/// The prefix must be exactly three ASCII digits naming a status in
/// `100..=599`, followed by `:`. Text without such a prefix is returned whole
/// with no status.
pub fn parse_text_message(text: &str) -> ParsedMessage {
    if let Some((head, body)) = text.split_once(':') {
        if let Some(status) = parse_status_token(head.trim()) {
            return ParsedMessage {
                status: Some(status),
                message: body.trim().to_string(),
            };
        }
    }

    ParsedMessage {
        status: None,
        message: text.to_string(),
    }
}

fn parse_status_token(token: &str) -> Option<StatusCode> {
    if token.len() != 3 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let code: u16 = token.parse().ok()?;
    if !(100..=599).contains(&code) {
        return None;
    }

    StatusCode::from_u16(code).ok()
}
