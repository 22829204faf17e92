use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

pub(crate) type Attributes = HashMap<String, String>;

/// Split an attribute list like `BANDWIDTH=1280000,CODECS="avc1.4d401f,mp4a.40.2"`.
///
/// Commas inside quotes do not split, surrounding quotes are removed and pairs
/// without `=` are skipped.
pub(crate) fn parse_attribute_list(input: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for pair in split_outside_quotes(input) {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), value.trim().replace('"', ""));
    }
    attributes
}

fn split_outside_quotes(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

static ATTRIBUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Z0-9-]+)=("([^"]*)"|([^,]*))"#).unwrap());

/// Scan an attribute list with a regular expression, as used for `#EXT-X-MEDIA`.
pub(crate) fn scan_attribute_list(input: &str) -> Attributes {
    ATTRIBUTE_REGEX
        .captures_iter(input)
        .filter_map(|captures| {
            let key = captures.get(1)?.as_str().to_string();
            let value = captures.get(3).or_else(|| captures.get(4))?.as_str();
            Some((key, value.to_string()))
        })
        .collect()
}
