//! Recovers a bare JSON payload from a completion that may be wrapped in a
//! markdown code fence.

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Strips a leading ```` ```json ```` or bare ```` ``` ```` fence and its
/// closing counterpart, then trims. Input without a fence is only trimmed.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    let body = if let Some(rest) = trimmed.strip_prefix(JSON_FENCE) {
        strip_closing_fence(rest)
    } else if let Some(rest) = trimmed.strip_prefix(FENCE) {
        strip_closing_fence(rest)
    } else {
        trimmed
    };

    body.trim().to_string()
}

fn strip_closing_fence(body: &str) -> &str {
    let body = body.trim_end();
    body.strip_suffix(FENCE).unwrap_or(body)
}
