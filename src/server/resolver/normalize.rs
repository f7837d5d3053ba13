//! Reusable normalizers and flag/list parsing for resolved values.
use super::Normalized;

const TRUTHY_TOKENS: &[&str] = &["1", "true", "yes", "on"];
const FALSY_TOKENS: &[&str] = &["0", "false", "no", "off", ""];

/// Parse a flag value. Accepts `1/true/yes/on` and `0/false/no/off`
/// (ASCII case-insensitive, surrounding whitespace ignored).
pub fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if TRUTHY_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
    {
        return Some(true);
    }
    if FALSY_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
    {
        return Some(false);
    }
    None
}

/// True only for the truthy token set; anything else reads as off.
pub fn is_truthy(value: &str) -> bool {
    parse_flag(value) == Some(true)
}

/// Split a comma separated list, trimming items and dropping empty ones.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract the token from `Bearer <token>`.
///
/// Other shapes fall through to the next source; an empty token is rejected.
pub fn bearer_token(raw: &str) -> Normalized {
    let trimmed = raw.trim();
    let Some((scheme, token)) = trimmed.split_once(char::is_whitespace) else {
        if trimmed.eq_ignore_ascii_case("bearer") {
            return Normalized::Invalid("empty bearer token".into());
        }
        return Normalized::NotFound;
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Normalized::NotFound;
    }
    let token = token.trim();
    if token.is_empty() {
        return Normalized::Invalid("empty bearer token".into());
    }
    Normalized::Value(token.to_string())
}

/// Trim whitespace; blank values fall through.
pub fn trimmed(raw: &str) -> Normalized {
    let value = raw.trim();
    if value.is_empty() {
        return Normalized::NotFound;
    }
    Normalized::Value(value.to_string())
}

/// Canonicalize a flag to `"1"` or `"0"`.
pub fn flag(raw: &str) -> Normalized {
    match parse_flag(raw) {
        Some(true) => Normalized::Value("1".into()),
        Some(false) => Normalized::Value("0".into()),
        None => Normalized::Invalid("expected a boolean flag".into()),
    }
}
