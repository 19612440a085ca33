//! `${name}` placeholder substitution for descriptor attribute values.

use rssync_core::PropertyTable;

use crate::descriptor::Attributes;

/// Substitute properties into every attribute value.
///
/// Each property is applied in table order, replacing every ASCII
/// case-insensitive occurrence of `${name}`. Substitution is single-pass:
/// text introduced by one replacement is only seen by properties applied after
/// it. Unmatched placeholders are left as written.
pub fn substitute(attrs: Attributes, properties: &PropertyTable) -> Attributes {
    if properties.is_empty() {
        return attrs;
    }
    attrs
        .into_iter()
        .map(|(name, value)| (name, substitute_value(value, properties)))
        .collect()
}

/// Substitute properties into a single value.
pub fn substitute_value(mut value: String, properties: &PropertyTable) -> String {
    for (name, replacement) in properties.iter() {
        let token = format!("${{{name}}}");
        value = replace_ignore_ascii_case(&value, &token, replacement);
    }
    value
}

fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    // ASCII lowering keeps byte offsets aligned with the original.
    let folded = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in folded.match_indices(&needle) {
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = start + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}
