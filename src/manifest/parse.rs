//! Line-level grammar for `install_script.iss`.
//!
//! Only two things are read from the script:
//! - `Key=Value` directives for [`Metadata`] (first occurrence of each recognized key wins),
//! - parameter lines of the `[Files]` section.
//!
//! A `[Files]` line is a list of `Name: value` parameters separated by `;`:
//!
//! ```text
//! line   := param ( ";" param )* [ ";" ]
//! param  := name ":" value
//! value  := '"' ( char | '""' )* '"'      quoted, `""` is an escaped quote
//!         | chars up to the next ';'      bare, trimmed
//! ```
//!
//! A line is a file entry when `Source`, `DestDir` and `DestName` are present as quoted values.
//! `Check` is optional and may be bare or quoted. Anything else (comments, directives the tool
//! does not care about, lines that fail to tokenize) is skipped; the script format varies between
//! `innounp` versions and a partial manifest is more useful than none.

use std::collections::BTreeMap;

use log::{debug, trace};

use super::types::{FileEntry, Metadata, MetadataKey};
use crate::variant::{CheckRules, VariantCategoryMap, VariantToken};

const FILES_SECTION: &str = "Files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamValue<'a> {
    Quoted(String),
    Bare(&'a str),
}

impl ParamValue<'_> {
    fn quoted(&self) -> Option<&str> {
        match self {
            ParamValue::Quoted(s) => Some(s),
            ParamValue::Bare(_) => None,
        }
    }

    fn text(&self) -> &str {
        match self {
            ParamValue::Quoted(s) => s,
            ParamValue::Bare(s) => s,
        }
    }
}

/// Splits a parameter line into `(name, value)` pairs. `None` when the line does not follow the
/// grammar.
pub(crate) fn tokenize_params(line: &str) -> Option<Vec<(&str, ParamValue<'_>)>> {
    let mut params = vec![];
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let (name, after_name) = rest.split_once(':')?;
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let after_name = after_name.trim_start();
        let (value, after_value) = if let Some(quoted) = after_name.strip_prefix('"') {
            let (value, consumed) = read_quoted(quoted)?;
            (ParamValue::Quoted(value), &quoted[consumed..])
        } else {
            let end = after_name.find(';').unwrap_or(after_name.len());
            (ParamValue::Bare(after_name[..end].trim()), &after_name[end..])
        };

        params.push((name, value));

        let after_value = after_value.trim_start();
        rest = match after_value.strip_prefix(';') {
            Some(next) => next.trim_start(),
            None if after_value.is_empty() => after_value,
            // Trailing garbage after a quoted value.
            None => return None,
        };
    }

    if params.is_empty() { None } else { Some(params) }
}

/// Reads a quoted value whose opening quote was already consumed. Returns the unescaped value and
/// the number of bytes consumed, including the closing quote.
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '"' {
            value.push(c);
            continue;
        }
        if let Some((_, '"')) = chars.peek() {
            chars.next();
            value.push('"');
            continue;
        }
        return Some((value, idx + 1));
    }

    // Unterminated string.
    None
}

/// Parses one `[Files]` line into a [`FileEntry`].
pub(crate) fn parse_file_entry(line: &str, line_number: usize) -> Option<FileEntry> {
    let params = tokenize_params(line)?;
    let find = |key: &str| {
        params
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    };

    let source = find("Source")?.quoted()?;
    let dest_dir = find("DestDir")?.quoted()?;
    let dest_name = find("DestName")?.quoted()?;
    let check = find("Check")
        .map(|v| v.text().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    Some(FileEntry {
        source: source.to_owned(),
        dest_dir: dest_dir.to_owned(),
        dest_name: dest_name.to_owned(),
        check,
        line: line_number,
    })
}

pub(crate) fn parse_metadata(text: &str) -> Metadata {
    let mut found = BTreeMap::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(key) = MetadataKey::from_name(key.trim()) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || found.contains_key(&key) {
            continue;
        }
        found.insert(key, value.to_owned());
    }

    Metadata::from_map(found)
}

/// Section name of a `[Name]` header line.
fn section_header(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Lines of the `[Files]` section with their 1-based line numbers. The section ends at the first
/// blank line, the next section header or the end of the text.
pub(crate) fn files_section(text: &str) -> Vec<(usize, &str)> {
    let mut lines = text.lines().enumerate();

    if !lines
        .by_ref()
        .any(|(_, line)| section_header(line).is_some_and(|s| s.eq_ignore_ascii_case(FILES_SECTION)))
    {
        return vec![];
    }

    lines
        .take_while(|(_, line)| !line.trim().is_empty() && section_header(line).is_none())
        .map(|(idx, line)| (idx + 1, line))
        .collect()
}

pub(crate) fn parse_file_entries(text: &str) -> Vec<FileEntry> {
    let mut entries = vec![];
    let mut skipped = 0usize;

    for (line_number, line) in files_section(text) {
        match parse_file_entry(line, line_number) {
            Some(entry) => entries.push(entry),
            None => {
                trace!("skipping [Files] line {line_number}: {line}");
                skipped += 1;
            }
        }
    }

    debug!(
        "parsed {} file entries ({} line(s) skipped)",
        entries.len(),
        skipped
    );
    entries
}

pub(crate) fn infer_variants(entries: &[FileEntry], rules: &CheckRules) -> VariantCategoryMap {
    let mut builder = VariantCategoryMap::builder();
    for entry in entries {
        if let Some(token) = VariantToken::from_source_pattern(&entry.source) {
            let category = rules.category_for(entry.check.as_deref());
            debug!("variant {token} -> {category} (line {})", entry.line);
            builder.record(token, category, entry.line);
        }
    }
    builder.build()
}
