//! Failure classification for the startup flow.
//!
//! Package managers report lock contention in their own words. Matching is
//! case-insensitive on substrings; settings may add patterns.

use super::state::ErrorKind;

/// Substrings that mark a failure as transient lock contention.
pub const LOCK_PATTERNS: &[&str] = &[
    "has already locked",
    "already locked",
    ".incomplete",
    "could not get lock",
    "dpkg frontend lock",
    "unable to lock database",
    "waiting for cache lock",
    "another installation is already in progress",
    "another instance of",
    "is locked by another process",
];

/// Whether `message` reports that another process holds a lock.
pub fn is_lock_contention(message: &str, extra_patterns: &[String]) -> bool {
    let message = message.to_lowercase();
    LOCK_PATTERNS
        .iter()
        .copied()
        .chain(extra_patterns.iter().map(String::as_str))
        .filter(|pattern| !pattern.trim().is_empty())
        .any(|pattern| message.contains(&pattern.to_lowercase()))
}

/// Classify an install failure message.
pub fn classify_failure(message: &str, extra_patterns: &[String]) -> ErrorKind {
    if is_lock_contention(message, extra_patterns) {
        ErrorKind::TransientLock
    } else {
        ErrorKind::Terminal
    }
}
