use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata block at the top of each post.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PostMeta {
    pub title: String,

    /// Publication date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(default, alias = "description")]
    pub summary: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub image: Option<String>,
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date `{raw}`")))
}

/// Split a `---` fenced YAML block from the document body.
///
/// Both fences must sit on a line of their own. Returns an empty
/// frontmatter string when the document has none.
pub fn split_frontmatter(content: &str) -> (&str, &str) {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some((opening, rest)) = trimmed.split_once('\n') else {
        return ("", content);
    };
    if opening.trim_end() != "---" {
        return ("", content);
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (rest[..offset].trim(), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    ("", content)
}

pub fn parse_meta(yaml: &str) -> Result<PostMeta, serde_yaml_ng::Error> {
    serde_yaml_ng::from_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frontmatter() {
        let (fm, body) = split_frontmatter("---\ntitle: Hi\n---\n\n# Body");
        assert_eq!(fm, "title: Hi");
        assert_eq!(body, "\n# Body");
    }

    #[test]
    fn test_split_frontmatter_none() {
        let (fm, body) = split_frontmatter("# Just markdown");
        assert!(fm.is_empty());
        assert_eq!(body, "# Just markdown");
    }

    #[test]
    fn test_split_frontmatter_unterminated() {
        let raw = "---\ntitle: Hi\n# never closed";
        let (fm, body) = split_frontmatter(raw);
        assert!(fm.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_split_frontmatter_needs_bare_fences() {
        for raw in [
            "----\ntitle: Hi\n---\nBody",
            "--- title\ndate: 2024-01-01\n---\nBody",
            "---\ntitle: Hi\n--- trailing\nBody",
            "---\ntitle: Hi\n-----\nBody",
        ] {
            let (fm, body) = split_frontmatter(raw);
            assert!(fm.is_empty(), "{raw:?}");
            assert_eq!(body, raw);
        }
    }

    #[test]
    fn test_split_frontmatter_crlf_and_dashes_in_yaml() {
        let (fm, body) = split_frontmatter("---\r\ntitle: a---b\r\n---\r\nBody");
        assert_eq!(fm, "title: a---b");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_parse_meta_defaults() {
        let meta = parse_meta("title: Hello\ndate: 2024-03-01").unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(meta.tags.is_empty());
        assert!(!meta.draft);
        assert_eq!(meta.summary, None);
    }

    #[test]
    fn test_parse_meta_full() {
        let yaml = "title: Launch\ndate: '2023-11-20T09:30:00Z'\ndescription: We shipped\ntags: [news, product]\ndraft: true\nimage: /og/launch.png";
        let meta = parse_meta(yaml).unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2023, 11, 20).unwrap());
        assert_eq!(meta.summary.as_deref(), Some("We shipped"));
        assert_eq!(meta.tags, vec!["news", "product"]);
        assert!(meta.draft);
        assert_eq!(meta.image.as_deref(), Some("/og/launch.png"));
    }

    #[test]
    fn test_parse_meta_rejects_bad_date() {
        assert!(parse_meta("title: Hello\ndate: someday").is_err());
        assert!(parse_meta("date: 2024-03-01").is_err());
    }
}
