//! Random identifiers for projects and sections.

use uuid::Uuid;

/// Hex characters kept from a v4 UUID. The first 12 hex digits of a v4 UUID
/// are all random, which gives 48 bits of entropy.
const ID_HEX_LEN: usize = 12;

/// Returns a fresh 12-character lowercase hex identifier.
pub fn random_id() -> String {
    let mut value = Uuid::new_v4().simple().to_string();
    value.truncate(ID_HEX_LEN);
    value
}

/// Returns a random identifier that does not satisfy `taken`.
pub fn unique_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = random_id();
        if !taken(candidate.as_str()) {
            return candidate;
        }
    }
}
