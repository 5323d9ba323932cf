//! Shard ordering and parsing for batch OCR output.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{OcrError, OcrResult};

/// Order applied to shard names before their text is concatenated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardOrder {
    /// Plain byte-wise name order. Matches page order only when shard
    /// names are zero-padded or there are fewer than ten shards; Vision
    /// output for documents over 100 pages needs [`ShardOrder::Natural`].
    #[default]
    Lexicographic,
    /// Digit runs compared by numeric value, so `output-21-to-40.json`
    /// sorts before `output-101-to-120.json`.
    Natural,
}

impl ShardOrder {
    /// Sort shard names in place.
    pub fn sort(&self, names: &mut [String]) {
        match self {
            ShardOrder::Lexicographic => names.sort(),
            ShardOrder::Natural => names.sort_by(|a, b| natural_cmp(a, b)),
        }
    }
}

/// Compare two names treating runs of ASCII digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_runs = split_digit_runs(a);
    let b_runs = split_digit_runs(b);

    for (x, y) in a_runs.iter().zip(b_runs.iter()) {
        let both_numeric = x.as_bytes()[0].is_ascii_digit() && y.as_bytes()[0].is_ascii_digit();
        let ord = if both_numeric {
            let xt = x.trim_start_matches('0');
            let yt = y.trim_start_matches('0');
            xt.len().cmp(&yt.len()).then_with(|| xt.cmp(yt))
        } else {
            x.cmp(y)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a_runs.len().cmp(&b_runs.len()).then_with(|| a.cmp(b))
}

fn split_digit_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != is_digit) {
            runs.push(&s[start..i]);
            start = i;
        }
        prev_digit = Some(is_digit);
    }
    if start < s.len() {
        runs.push(&s[start..]);
    }

    runs
}

#[derive(Debug, Deserialize)]
struct ShardFile {
    #[serde(default)]
    responses: Vec<PageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

/// Parse one shard and return its page texts joined with newlines.
///
/// Shards follow the batch annotation layout:
/// `{"responses": [{"fullTextAnnotation": {"text": "..."}}, ...]}`.
/// Pages without an annotation contribute nothing.
pub fn parse_shard(name: &str, content: &[u8]) -> OcrResult<String> {
    let shard: ShardFile = serde_json::from_slice(content).map_err(|e| OcrError::InvalidShard {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let pages: Vec<String> = shard
        .responses
        .into_iter()
        .filter_map(|r| r.full_text_annotation)
        .map(|a| a.text)
        .filter(|text| !text.is_empty())
        .collect();

    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lexicographic_recovers_name_order() {
        let mut shards = names(&["shard-10", "shard-0", "shard-1"]);
        ShardOrder::Lexicographic.sort(&mut shards);
        assert_eq!(shards, names(&["shard-0", "shard-1", "shard-10"]));
    }

    #[test]
    fn test_lexicographic_is_not_numeric() {
        let mut shards = names(&["shard-2", "shard-10", "shard-1"]);
        ShardOrder::Lexicographic.sort(&mut shards);
        assert_eq!(shards, names(&["shard-1", "shard-10", "shard-2"]));
    }

    #[test]
    fn test_natural_orders_unpadded_numbers() {
        let mut shards = names(&[
            "out/output-101-to-120.json",
            "out/output-21-to-40.json",
            "out/output-1-to-20.json",
        ]);
        ShardOrder::Natural.sort(&mut shards);
        assert_eq!(
            shards,
            names(&[
                "out/output-1-to-20.json",
                "out/output-21-to-40.json",
                "out/output-101-to-120.json",
            ])
        );
    }

    #[test]
    fn test_natural_agrees_with_lexicographic_on_small_sets() {
        let mut lex = names(&["shard-10", "shard-0", "shard-1"]);
        let mut nat = lex.clone();
        ShardOrder::Lexicographic.sort(&mut lex);
        ShardOrder::Natural.sort(&mut nat);
        assert_eq!(lex, nat);
    }

    #[test]
    fn test_natural_cmp_zero_padding() {
        assert_eq!(natural_cmp("page-007", "page-7"), Ordering::Less);
        assert_eq!(natural_cmp("page-7", "page-10"), Ordering::Less);
        assert_eq!(natural_cmp("a", "a1"), Ordering::Less);
    }

    #[test]
    fn test_parse_shard_pages() {
        let json = br#"{"responses": [
            {"fullTextAnnotation": {"text": "page one"}},
            {"context": {"pageNumber": 2}},
            {"fullTextAnnotation": {"text": "page three"}}
        ]}"#;
        assert_eq!(parse_shard("s", json).unwrap(), "page one\npage three");
    }

    #[test]
    fn test_parse_shard_rejects_garbage() {
        let err = parse_shard("shard-3", b"not json").unwrap_err();
        assert!(matches!(err, OcrError::InvalidShard { ref name, .. } if name == "shard-3"));
    }
}
