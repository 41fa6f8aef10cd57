//! User identity: turning a free-form user name into a storage key.

/// Maximum length of a sanitized user key.
pub const MAX_USER_KEY_LEN: usize = 40;

/// Normalize a user-entered name into a storage key.
///
/// Lowercases, replaces anything outside `[a-z0-9_-]` with `_`, collapses
/// runs of `_`, trims `_` from both ends, then truncates. An empty result
/// means there is no active user.
pub fn sanitize_user_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let mut key = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if mapped == '_' && key.ends_with('_') {
            continue;
        }
        key.push(mapped);
    }

    // Truncation happens after trimming, so a key may still end in '_'
    key.trim_matches('_')
        .chars()
        .take(MAX_USER_KEY_LEN)
        .collect()
}
