//! Zone name helpers
//!
//! Scenario zones get random names so runs against a shared deployment do
//! not collide. All names handled here are absolute (trailing dot).

use rand::Rng;

const LABEL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random fully qualified zone name under `suffix`
///
/// ```
/// let name = zonecheck_core::names::rand_zone_name("zonecheck", "example.com.");
/// assert!(name.starts_with("zonecheck-"));
/// assert!(name.ends_with(".example.com."));
/// ```
pub fn rand_zone_name(prefix: &str, suffix: &str) -> String {
    let mut rng = rand::thread_rng();
    let label: String = (0..10)
        .map(|_| LABEL_CHARS[rng.gen_range(0..LABEL_CHARS.len())] as char)
        .collect();

    format!("{}-{}.{}", prefix, label, absolute(suffix))
}

/// Append the root label if missing
pub fn absolute(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Whether `child` lies strictly below `parent` in the DNS tree
///
/// Comparison is case-insensitive and works on label boundaries, so
/// `badexample.com.` is not a subdomain of `example.com.`.
pub fn is_subdomain_of(child: &str, parent: &str) -> bool {
    let child = absolute(&child.to_ascii_lowercase());
    let parent = absolute(&parent.to_ascii_lowercase());

    child.len() > parent.len()
        && child.ends_with(&parent)
        && child.as_bytes()[child.len() - parent.len() - 1] == b'.'
}

/// Whether two names refer to the same node
pub fn same_name(a: &str, b: &str) -> bool {
    absolute(&a.to_ascii_lowercase()) == absolute(&b.to_ascii_lowercase())
}
