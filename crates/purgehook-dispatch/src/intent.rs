use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

/// Patterns that request a purge of the whole site.
pub const PURGE_ALL_SENTINELS: &[&str] = &["/$/", "/*"];

/// Structured result of interpreting a raw invalidation pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationIntent {
    pub urls: Vec<String>,
    pub purge_all: bool,
    /// Raw pattern as received
    pub pattern: String,
    pub timestamp: String,
}

/// Interpret a raw pattern against the site's base URL.
///
/// Never fails: any string that is not a purge-all sentinel is read as a
/// comma-separated path list, empty fragments included.
pub fn interpret(pattern: &str, base_url: &str) -> InvalidationIntent {
    let purge_all = PURGE_ALL_SENTINELS.contains(&pattern);

    let urls = if purge_all {
        vec![format!("{base_url}/*")]
    } else {
        pattern
            .split(',')
            .map(|fragment| format!("{base_url}{}", fragment.trim()))
            .collect()
    };

    InvalidationIntent {
        urls,
        purge_all,
        pattern: pattern.to_string(),
        timestamp: iso_timestamp(OffsetDateTime::now_utc()),
    }
}

/// `2024-01-01T00:00:00.000Z` style UTC timestamp.
pub fn iso_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const BASE: &str = "https://blog.example.com";

    #[test]
    fn test_sentinels_purge_everything() {
        for pattern in PURGE_ALL_SENTINELS {
            let intent = interpret(pattern, BASE);
            assert!(intent.purge_all);
            assert_eq!(intent.urls, vec![format!("{BASE}/*")]);
            assert_eq!(intent.pattern, *pattern);
        }
    }

    #[test]
    fn test_fragments_trimmed_and_ordered() {
        let intent = interpret("/a, /b/*,/rss ", BASE);
        assert!(!intent.purge_all);
        assert_eq!(
            intent.urls,
            vec![
                format!("{BASE}/a"),
                format!("{BASE}/b/*"),
                format!("{BASE}/rss"),
            ]
        );
    }

    #[test]
    fn test_duplicates_kept() {
        let intent = interpret("/a,/a", BASE);
        assert_eq!(intent.urls, vec![format!("{BASE}/a"), format!("{BASE}/a")]);
    }

    #[test]
    fn test_sentinel_inside_list_is_a_path() {
        let intent = interpret("/*, /tag/news", BASE);
        assert!(!intent.purge_all);
        assert_eq!(intent.urls.len(), 2);
        assert_eq!(intent.urls[0], format!("{BASE}/*"));
    }

    #[test]
    fn test_empty_and_trailing_fragments_map_to_base() {
        let intent = interpret("", BASE);
        assert_eq!(intent.urls, vec![BASE.to_string()]);

        let intent = interpret("/a,", BASE);
        assert_eq!(intent.urls, vec![format!("{BASE}/a"), BASE.to_string()]);
    }

    #[test]
    fn test_interpret_is_idempotent() {
        let first = interpret("/x, /y", BASE);
        let second = interpret("/x, /y", BASE);
        assert_eq!(first.urls, second.urls);
        assert_eq!(first.purge_all, second.purge_all);
    }

    #[test]
    fn test_timestamp_format() {
        let at = datetime!(2024-01-01 00:00:00.123456 UTC);
        assert_eq!(iso_timestamp(at), "2024-01-01T00:00:00.123Z");

        let shifted = datetime!(2024-01-01 02:30:00 +2);
        assert_eq!(iso_timestamp(shifted), "2024-01-01T00:30:00.000Z");
    }

    #[test]
    fn test_intent_serializes_camel_case() {
        let intent = interpret("/*", BASE);
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["purgeAll"], true);
        assert!(json.get("purge_all").is_none());
    }
}
