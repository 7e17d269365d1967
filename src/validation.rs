use std::sync::LazyLock;

use regex::Regex;

// scheme, host (domain name or IPv4), port, path, query, fragment
const URL_PATTERN: &str = concat!(
    r"^((?i:https?)://)?",
    r"((([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])*)\.)+[a-zA-Z]{2,}|(([0-9]{1,3}\.){3}[0-9]{1,3}))",
    r"(:[0-9]+)?",
    r"(/[-a-zA-Z0-9%_.~+]*)*",
    r"(\?[;&a-zA-Z0-9%_.~+=-]*)?",
    r"(#[-a-zA-Z0-9_]*)?$",
);

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"));

/// Best-effort check that `candidate` looks like a manifest URL before it is sent to the server.
///
/// The scheme is optional and the host must be a dotted domain name with an alphabetic TLD or
/// an IPv4 quad, so `localhost` style hosts are rejected. The server still validates on its own.
pub fn is_valid_url(candidate: &str) -> bool {
    URL_REGEX.is_match(candidate)
}
