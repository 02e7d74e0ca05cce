//! Target host filtering.
//!
//! Entries match as substrings anywhere in the hostname, not as exact
//! labels or suffixes: `"local"` blocks `localhost` and `mylocal.dev` alike.

use crate::config::HostFilterConfig;

#[derive(Debug, Clone, Default)]
pub struct HostFilter {
    blocked: Vec<String>,
    allowed: Vec<String>,
}

impl HostFilter {
    pub fn new(config: &HostFilterConfig) -> Self {
        Self {
            blocked: config.blocked.clone(),
            allowed: config.allowed.clone(),
        }
    }

    /// Check a target URL against the block and allow lists.
    ///
    /// The block list is consulted first and always wins.
    pub fn is_allowed(&self, target_url: &str) -> bool {
        let host = extract_host(target_url);

        if self.blocked.iter().any(|blocked| host.contains(blocked.as_str())) {
            return false;
        }

        if self.allowed.is_empty() {
            return true;
        }

        self.allowed.iter().any(|allowed| host.contains(allowed.as_str()))
    }
}

/// Hostname of a URL string: text after `://`, cut at the first `/`, then at
/// the first `:`.
pub fn extract_host(target_url: &str) -> &str {
    let rest = match target_url.find("://") {
        Some(idx) => &target_url[idx + 3..],
        None => target_url,
    };
    let rest = rest.split('/').next().unwrap_or(rest);
    rest.split(':').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(blocked: &[&str], allowed: &[&str]) -> HostFilter {
        HostFilter::new(&HostFilterConfig {
            blocked: blocked.iter().map(|s| s.to_string()).collect(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_extract_host() {
        assert_eq!(extract_host("https://example.com/path?q=1"), "example.com");
        assert_eq!(extract_host("http://example.com:8080/x"), "example.com");
        assert_eq!(extract_host("https://example.com"), "example.com");
        assert_eq!(extract_host("example.com/x"), "example.com");
    }

    #[test]
    fn test_empty_lists_allow_everything() {
        let f = filter(&[], &[]);
        assert!(f.is_allowed("https://example.com"));
        assert!(f.is_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_block_is_substring_match() {
        let f = filter(&["local"], &[]);
        assert!(!f.is_allowed("http://localhost:3000/"));
        assert!(!f.is_allowed("https://mylocal.dev"));
        assert!(f.is_allowed("https://example.com"));
    }

    #[test]
    fn test_block_wins_over_allow() {
        let f = filter(&["internal"], &["example.com"]);
        assert!(!f.is_allowed("https://internal.example.com"));
        assert!(f.is_allowed("https://api.example.com"));
    }

    #[test]
    fn test_allow_list_restricts() {
        let f = filter(&[], &["example.com", "github"]);
        assert!(f.is_allowed("https://raw.githubusercontent.com/x"));
        assert!(f.is_allowed("https://example.com.attacker.net"));
        assert!(!f.is_allowed("https://other.org"));
    }

    #[test]
    fn test_path_and_port_are_ignored() {
        let f = filter(&["8080", "secret"], &[]);
        assert!(f.is_allowed("http://example.com:8080/secret"));
    }
}
