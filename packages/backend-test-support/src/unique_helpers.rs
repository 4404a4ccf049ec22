//! Unique test data backed by ULIDs.

use ulid::Ulid;

/// `{prefix}-{ulid}`
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("room");
/// assert_ne!(a, unique_str("room"));
/// assert!(a.starts_with("room-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// A display name short enough for a seat: `{prefix} {last 8 ulid chars}`.
///
/// ```
/// use backend_test_support::unique_helpers::unique_player_name;
///
/// let name = unique_player_name("Ann");
/// assert!(name.starts_with("Ann "));
/// assert_eq!(name.len(), "Ann ".len() + 8);
/// ```
pub fn unique_player_name(prefix: &str) -> String {
    let ulid = Ulid::new().to_string();
    format!("{prefix} {}", &ulid[ulid.len() - 8..])
}
