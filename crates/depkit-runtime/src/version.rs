//! Version extraction from tool output.

use std::sync::LazyLock;

use regex::Regex;

/// Bare `X.Y.Z`.
static BARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+\.\d+\.\d+)\b").expect("BARE_VERSION must compile")
});

/// Loose `vX.Y` or `vX.Y.Z`.
static LOOSE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").expect("LOOSE_VERSION must compile")
});

/// Extract a version from the output of `<tool> --version`.
///
/// Tries `"<tool> version [is] X.Y.Z"`, then a bare `X.Y.Z`, then a loose
/// `vX.Y[.Z]`.
pub fn parse_version(tool: &str, output: &str) -> Option<String> {
    let named = Regex::new(&format!(
        r"(?i){}\s+version\s+(?:is\s+)?v?(\d+\.\d+\.\d+)",
        regex::escape(tool)
    ))
    .ok();

    named
        .as_ref()
        .and_then(|re| capture(re, output))
        .or_else(|| capture(&BARE_VERSION, output))
        .or_else(|| capture(&LOOSE_VERSION, output))
}

/// Version from stdout, falling back to stderr.
pub fn parse_version_streams(tool: &str, stdout: &str, stderr: &str) -> Option<String> {
    parse_version(tool, stdout).or_else(|| parse_version(tool, stderr))
}

/// Major and minor components of a dotted version. A missing minor is 0.
pub fn major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |minor| minor.parse().ok())?;
    Some((major, minor))
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
