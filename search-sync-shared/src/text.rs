//! Plain-text extraction from rich-text block arrays.
//!
//! Rich text arrives as an array of blocks, each with a `_type` and, for
//! text blocks, a list of `children` spans carrying `text`. Search records
//! usually want a single flat string instead, and trimming stop words keeps
//! records small.

use serde_json::Value;

const BLOCK_TYPE: &str = "block";

/// Common English words dropped by `flatten_blocks` when asked to.
///
/// A fixed subset of the usual English stop word lists: words outside it
/// (`however`, `also`, `among`) are kept, so output can differ from tools
/// using a larger list.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Whether the value looks like a rich-text block array.
pub fn is_block_array(value: &Value) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| item.get("_type").and_then(Value::as_str) == Some(BLOCK_TYPE)),
        _ => false,
    }
}

/// Join the text of every span in every text block with single spaces.
///
/// Non-block elements (images, embeds) and spans without non-empty string
/// text are skipped. With `remove_stop_words`, English stop words are
/// dropped from each span (case-insensitive).
pub fn flatten_blocks(blocks: &[Value], remove_stop_words: bool) -> String {
    blocks
        .iter()
        .filter(|block| block.get("_type").and_then(Value::as_str) == Some(BLOCK_TYPE))
        .filter_map(|block| block.get("children").and_then(Value::as_array))
        .flatten()
        .filter_map(|span| span.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map(|text| {
            if remove_stop_words {
                strip_stop_words(text)
            } else {
                text.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_stop_words(text: &str) -> String {
    text.split(' ')
        .filter(|word| !ENGLISH_STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Vec<Value> {
        json!([
            {
                "_type": "block",
                "_key": "a1",
                "style": "normal",
                "children": [
                    { "_type": "span", "text": "This is a paragraph", "marks": [] }
                ]
            },
            {
                "_type": "image",
                "asset": { "_ref": "image-abc" }
            }
        ])
        .as_array()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_extracts_text() {
        assert_eq!(flatten_blocks(&body(), false), "This is a paragraph");
    }

    #[test]
    fn test_removes_stop_words() {
        assert_eq!(flatten_blocks(&body(), true), "paragraph");
    }

    #[test]
    fn test_stop_words_limited_to_subset() {
        let blocks = json!([
            { "_type": "block", "children": [{ "_type": "span", "text": "The cat is however also THERE" }] }
        ]);
        assert_eq!(flatten_blocks(blocks.as_array().unwrap(), true), "cat however also");
        assert!(!ENGLISH_STOP_WORDS.contains(&"however"));
    }

    #[test]
    fn test_joins_spans_and_skips_empty() {
        let blocks = json!([
            { "_type": "block", "children": [
                { "_type": "span", "text": "Hello" },
                { "_type": "span", "text": "" },
                { "_type": "span", "text": 12 }
            ]},
            { "_type": "block", "children": [{ "_type": "span", "text": "world" }] }
        ]);
        assert_eq!(flatten_blocks(blocks.as_array().unwrap(), false), "Hello world");
    }

    #[test]
    fn test_is_block_array() {
        assert!(is_block_array(&Value::Array(body())));
        assert!(!is_block_array(&json!(["a", "b"])));
        assert!(!is_block_array(&json!("text")));
    }
}
