//! File selection shared by all providers
//!
//! A path is analyzable when its extension maps to a known [`Language`]
//! and no deny pattern matches it. Vendored, generated and minified paths
//! are denied by default; projects add their own through `[filter]` in
//! `techhealth.toml`.

use crate::models::Language;

/// Paths never worth analyzing: vendored dependencies, build output, minified bundles.
pub const DEFAULT_DENY_PATTERNS: &[&str] = &[
    "**/vendor/**",
    "**/node_modules/**",
    "**/third_party/**",
    "**/bower_components/**",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/.git/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "*.min.js",
    "*.min.css",
    "*.bundle.js",
    "*.pb.go",
    "*_pb2.py",
];

/// Extension allow-list plus path deny-list.
#[derive(Debug, Clone)]
pub struct PathFilter {
    deny: Vec<String>,
    max_file_bytes: u64,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(&[], 1_000_000)
    }
}

impl PathFilter {
    /// Default deny-list extended with `extra` patterns.
    pub fn new(extra: &[String], max_file_bytes: u64) -> Self {
        let mut deny: Vec<String> = DEFAULT_DENY_PATTERNS.iter().map(|p| p.to_string()).collect();
        deny.extend(
            extra
                .iter()
                .map(|p| p.trim().replace('\\', "/").to_ascii_lowercase())
                .filter(|p| !p.is_empty()),
        );
        Self {
            deny,
            max_file_bytes,
        }
    }

    /// Language of `path` if the path should be analyzed.
    pub fn accept(&self, path: &str) -> Option<Language> {
        let normalized = path.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./");
        if self.is_denied(normalized) {
            return None;
        }
        Language::from_path(normalized)
    }

    pub fn is_denied(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        self.deny.iter().any(|pattern| glob_match(pattern, &lower))
    }

    /// Whether a file of `size` bytes is small enough to fetch.
    pub fn accepts_size(&self, size: u64) -> bool {
        size <= self.max_file_bytes
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }
}

/// Glob matching over lowercase `/`-separated paths: `**/X/**` matches a
/// directory anywhere, `prefix/**/suffix` matches the suffix against any
/// trailing run of segments, `*` matches any run of characters, and a plain
/// pattern is a path prefix.
fn glob_match(pattern: &str, path: &str) -> bool {
    if pattern.starts_with("**/") && pattern.ends_with("/**") {
        let middle = pattern.trim_start_matches("**/").trim_end_matches("/**");
        return path.contains(&format!("/{}/", middle)) || path.starts_with(&format!("{}/", middle));
    }

    if let Some((prefix, suffix)) = pattern.split_once("**") {
        let prefix = prefix.trim_end_matches('/');
        let suffix = suffix.trim_start_matches('/');

        let rest = if prefix.is_empty() {
            path
        } else {
            match path.strip_prefix(prefix) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
                _ => return false,
            }
        };
        if suffix.is_empty() {
            return true;
        }
        return segment_tails(rest).any(|tail| wildcard_match(suffix, tail));
    }

    if pattern.contains('*') {
        return wildcard_match(pattern, path);
    }

    path.starts_with(pattern)
}

/// `a/b/c`, `b/c`, `c`
fn segment_tails(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path).chain(path.match_indices('/').map(move |(i, _)| &path[i + 1..]))
}

/// Whole-string match where `*` stands for any (possibly empty) run.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let (p, t) = (pattern.as_bytes(), text.as_bytes());
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == b'*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == b'*')
}
