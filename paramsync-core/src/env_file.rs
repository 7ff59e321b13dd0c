//! Parser for the `KEY=VALUE` files that feed a sync run.
//!
//! Rules, applied to each line after trimming surrounding whitespace:
//! blank lines and lines starting with `#` are ignored, lines without `=`
//! are ignored, and everything else is split on the first `=`. Key and
//! value are trimmed; a line with an empty key is ignored.

/// A single key/value pair read from an env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    /// 1-based line the (last) value came from.
    pub line: usize,
}

/// The parsed contents of an env file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    /// Entries in first-seen key order, one per key.
    pub entries: Vec<EnvEntry>,
    /// Keys that appeared more than once. The last occurrence wins.
    pub duplicates: Vec<String>,
}

impl EnvFile {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a single line. Returns `None` for anything that is not a pair.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

pub fn parse(content: &str) -> EnvFile {
    let mut file = EnvFile::default();

    for (idx, raw) in content.lines().enumerate() {
        let Some((key, value)) = parse_line(raw) else {
            continue;
        };

        match file.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.line = idx + 1;
                if !file.duplicates.iter().any(|d| d == key) {
                    file.duplicates.push(key.to_string());
                }
            }
            None => file.entries.push(EnvEntry {
                key: key.to_string(),
                value: value.to_string(),
                line: idx + 1,
            }),
        }
    }

    file
}
