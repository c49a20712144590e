use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING_REGEX: Regex = Regex::new(r"(?m)^# (?P<text>[^\r\n]+)").unwrap();
    static ref BOLD_REGEX: Regex = Regex::new(r"\*\*(?P<text>[^\r\n]+?)\*\*").unwrap();
    static ref BULLET_REGEX: Regex = Regex::new(r"(?m)^[ \t]*[-*+] ").unwrap();
}

pub const BULLET: &str = "• ";

/// Converts author markdown into the markdown dialect understood by the channel.
///
/// Rewrites are applied in a fixed order, one line at a time, and never add or
/// remove line breaks:
///
/// 1. `# Heading` becomes `*Heading*`
/// 2. `**bold**` becomes `*bold*`
/// 3. `` `code` `` spans are delivered as written
/// 4. `-`, `*` and `+` list markers become `•`
///
/// Nested markup is not interpreted. Applying the conversion twice may change
/// already converted text.
pub fn to_channel_markup(source: &str) -> String {
    let converted = HEADING_REGEX.replace_all(source, "*$text*");
    let converted = BOLD_REGEX.replace_all(&converted, "*$text*");
    let converted = BULLET_REGEX.replace_all(&converted, BULLET);

    converted.into_owned()
}

/// Length of a text as the channel counts it, in UTF-16 code units.
/// Characters outside the basic multilingual plane, most emoji, count twice.
pub fn channel_length(text: &str) -> usize {
    text.encode_utf16().count()
}
