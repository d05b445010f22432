//! Small shared helpers.

/// True if `text` looks like a broker account id: digits only, and long enough not to collide with menu input.
/// The brokers issue numeric ids of at least six digits.
pub fn is_account_id(text: &str) -> bool {
    let text = text.trim();
    text.len() >= 6 && text.chars().all(|c| c.is_ascii_digit())
}
