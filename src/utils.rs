use chrono::FixedOffset;
use ulid::Ulid;

/// Generates a new task identifier.
///
/// ULIDs start with a millisecond timestamp, so their string form sorts in
/// creation order. Task keys in sled are `{uid}|{ulid}`, which makes a prefix
/// scan over a user's collection come back oldest first.
pub fn time_sortable_uid() -> String {
    Ulid::new().to_string()
}

/// Lower-cases and trims an email so lookups are case insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose shape check: `local@domain.tld`, no whitespace, one `@`.
pub fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Converts a "minutes east of UTC" value into an offset, if it is in range.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}
