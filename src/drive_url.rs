use regex::Regex;
use std::sync::OnceLock;

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Order matters: `/file/d/<id>` before the looser `/d/<id>`.
        [r"/file/d/([^/?#]+)", r"[?&]id=([^&#]+)", r"/d/([^/?#]+)"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// File id carried by a drive-style photo URL, or `None` for plain image URLs.
///
/// Accepts `https://drive.google.com/file/d/<id>/view`, `https://drive.google.com/open?id=<id>`,
/// `https://drive.google.com/uc?export=view&id=<id>` and the local store's `local:///file/d/<id>/view`.
pub fn extract_file_id(url: &str) -> Option<String> {
    patterns().iter().find_map(|re| {
        re.captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    })
}

