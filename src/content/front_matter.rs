use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::Mapping;
use spdlog::debug;

const DELIMITER: &str = "---";
const BOM: char = '\u{feff}';

/// Metadata declared in the front matter block of a document.
/// Fields absent from the block are `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub channel: Option<String>,
    pub attachments: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(String),
    List(Vec<String>),
}

/// Splits a document into its front matter and body.
///
/// The block must open on the very first line with `---` and close with
/// another `---` line. Returns `None` when there is no block or when the
/// block can't be read, in which case the whole document is the body.
pub fn split_front_matter(document: &str) -> Option<(FrontMatter, &str)> {
    let document = document.strip_prefix(BOM).unwrap_or(document);
    let mut lines = document.split_inclusive('\n');

    let first = lines.next()?;
    if !is_delimiter(first) {
        return None;
    }

    let mut offset = first.len();
    let mut block = vec![];
    let mut closed = false;
    for line in lines {
        offset += line.len();
        if is_delimiter(line) {
            closed = true;
            break;
        }
        block.push(line.trim_end_matches(['\n', '\r']));
    }

    if !closed {
        debug!("Front matter is not closed, reading the document as content");
        return None;
    }

    let entries = match yaml_entries(&block.join("\n")) {
        Some(entries) => entries,
        None => match parse_entries(&block) {
            Ok(entries) => entries,
            Err(line) => {
                debug!("Invalid front matter line '{}', reading the document as content", line);
                return None;
            }
        },
    };

    Some((to_front_matter(entries), &document[offset..]))
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Reads the block as YAML. Returns `None` when it is not a YAML mapping,
/// e.g. `channel: @name`, which YAML rejects but authors write anyway.
fn yaml_entries(block: &str) -> Option<Vec<(String, Value)>> {
    if block.trim().is_empty() {
        return Some(vec![]);
    }

    let mapping: Mapping = serde_yaml::from_str(block).ok()?;
    let entries = mapping.into_iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?.to_lowercase();
            Some((key, from_yaml(value)))
        })
        .collect();
    Some(entries)
}

fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Sequence(items) => Value::List(items.into_iter().filter_map(yaml_scalar).collect()),
        value => Value::Scalar(yaml_scalar(value).unwrap_or_default()),
    }
}

fn yaml_scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_scalar(tagged.value),
        serde_yaml::Value::Null | serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

/// Reads `key: value` lines and list items under a key.
/// On failure, returns the offending line.
fn parse_entries<'a>(block: &[&'a str]) -> Result<Vec<(String, Value)>, &'a str> {
    lazy_static! {
        static ref KEY_VALUE_REGEX: Regex = Regex::new(
            r"^(?P<key>[A-Za-z_][\w-]*)[ \t]*:(?:[ \t]+(?P<value>.*))?$"
        ).unwrap();
        static ref LIST_ITEM_REGEX: Regex = Regex::new(
            r"^[ \t]*-(?:[ \t]+(?P<item>.*))?$"
        ).unwrap();
    }

    let mut entries: Vec<(String, Value)> = vec![];
    // Set while the last key had no inline value, so list items can follow
    let mut open_list = false;

    for line in block {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(cap) = KEY_VALUE_REGEX.captures(line) {
            let key = cap["key"].to_lowercase();
            let value = cap.name("value").map(|v| v.as_str().trim()).unwrap_or("");
            open_list = value.is_empty();
            entries.push((key, parse_value(value)));
            continue;
        }

        if let Some(cap) = LIST_ITEM_REGEX.captures(line) {
            if !open_list {
                return Err(line);
            }
            let item = cap.name("item").map(|v| unquote(v.as_str().trim())).unwrap_or_default();
            if let Some((_, value)) = entries.last_mut() {
                match value {
                    Value::List(items) => items.push(item),
                    Value::Scalar(_) => *value = Value::List(vec![item]),
                }
            }
            continue;
        }

        return Err(line);
    }

    Ok(entries)
}

fn parse_value(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner.split(',')
            .map(|item| unquote(item.trim()))
            .filter(|item| !item.is_empty())
            .collect();
        return Value::List(items);
    }
    Value::Scalar(unquote(value))
}

fn unquote(value: &str) -> String {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
        || (value.starts_with('\'') && value.ends_with('\'')));

    if quoted {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

fn to_front_matter(entries: Vec<(String, Value)>) -> FrontMatter {
    let mut front_matter = FrontMatter::default();

    for (key, value) in entries {
        match key.as_str() {
            "title" => front_matter.title = to_text(value),
            "channel" => front_matter.channel = to_text(value),
            "tags" => front_matter.tags = Some(to_list(value)),
            "attachments" => front_matter.attachments = Some(to_list(value)),
            _ => {}
        }
    }

    front_matter
}

fn to_text(value: Value) -> Option<String> {
    match value {
        Value::Scalar(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn to_list(value: Value) -> Vec<String> {
    match value {
        Value::List(items) => items,
        Value::Scalar(s) => s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    }
}
