// Header parsing: preamble metadata and channel columns

use crate::core::constants::*;
use crate::core::error::{Result, WindCubeError};
use crate::core::format::{Channel, Schema};
use std::collections::{BTreeMap, HashSet};

/// Result of reading a day file's header. Data rows start at byte
/// `body_offset`, which is 1-based line `body_line` of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHeader {
    pub schema: Schema,
    pub body_offset: usize,
    pub body_line: usize,
}

fn schema_error(line: usize, msg: impl std::fmt::Display) -> WindCubeError {
    WindCubeError::Schema(format!("line {}: {}", line, msg))
}

pub fn parse_header(text: &str, delimiter: char) -> Result<ParsedHeader> {
    let mut offset = 0;
    let mut lines = text.split_inclusive('\n').enumerate().map(|(index, raw)| {
        offset += raw.len();
        (index + 1, offset, raw.trim_end_matches(['\n', '\r']))
    });

    let mut properties = BTreeMap::new();
    let mut first = lines.next();

    // Optional `HeaderSize=N` preamble followed by N key=value lines
    if let Some((line, _, content)) = first {
        if let Some(count) = content.trim().strip_prefix(HEADER_SIZE_KEY) {
            let count: usize = count
                .trim_start()
                .strip_prefix('=')
                .and_then(|n| n.trim().parse().ok())
                .ok_or_else(|| schema_error(line, format!("malformed {} line", HEADER_SIZE_KEY)))?;

            for _ in 0..count {
                let (line, _, content) = lines
                    .next()
                    .ok_or_else(|| schema_error(line, "preamble ends before HeaderSize lines"))?;
                let (key, value) = content
                    .split_once('=')
                    .ok_or_else(|| schema_error(line, format!("expected key=value, got {:?}", content)))?;
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
            first = lines.next();
        }
    }

    let (line, end, content) = std::iter::successors(first, |_| lines.next())
        .find(|(_, _, content)| !content.trim().is_empty())
        .ok_or_else(|| WindCubeError::Schema("column header row is missing".into()))?;

    let mut cells = content.split(delimiter);
    let timestamp = cells.next().unwrap_or_default().trim();
    if !timestamp.to_ascii_lowercase().starts_with(TIMESTAMP_COLUMN) {
        return Err(schema_error(
            line,
            format!("first column must be a timestamp, got {:?}", timestamp),
        ));
    }

    let mut taken = HashSet::new();
    let mut channels = Vec::new();
    for cell in cells {
        let mut channel = parse_column(cell).map_err(|msg| schema_error(line, msg))?;
        channel.id = unique_id(&channel.id, &mut taken);
        channels.push(channel);
    }

    if channels.is_empty() {
        return Err(schema_error(line, "header defines no channels"));
    }

    Ok(ParsedHeader {
        schema: Schema {
            properties,
            channels,
        },
        body_offset: end,
        body_line: line + 1,
    })
}

/// Parse a `name [unit] {group,group}` header cell.
fn parse_column(cell: &str) -> std::result::Result<Channel, String> {
    let mut rest = cell.trim();

    let mut groups = Vec::new();
    if let Some(inner) = rest.strip_suffix('}') {
        let open = inner
            .rfind('{')
            .ok_or_else(|| format!("unbalanced group braces in {:?}", cell))?;
        groups = inner[open + 1..]
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        rest = inner[..open].trim_end();
    }

    let mut unit = String::new();
    if let Some(inner) = rest.strip_suffix(']') {
        let open = inner
            .rfind('[')
            .ok_or_else(|| format!("unbalanced unit brackets in {:?}", cell))?;
        unit = inner[open + 1..].trim().to_string();
        rest = inner[..open].trim_end();
    }

    if rest.contains(['[', ']', '{', '}']) {
        return Err(format!("malformed column {:?}", cell));
    }
    if rest.is_empty() {
        return Err(format!("column {:?} has no name", cell));
    }

    Ok(Channel {
        id: sanitize_id(rest),
        unit,
        groups,
    })
}

/// Map a column name onto `[A-Za-z_][A-Za-z0-9_]*`.
pub fn sanitize_id(name: &str) -> String {
    let mut id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    id
}

fn unique_id(base: &str, taken: &mut HashSet<String>) -> String {
    let mut final_id = base.to_string();

    if taken.contains(&final_id) {
        let mut i = 1;
        loop {
            let candidate = format!("{}_{}", base, i);
            if !taken.contains(&candidate) {
                final_id = candidate;
                break;
            }
            i += 1;
        }
    }

    taken.insert(final_id.clone());
    final_id
}
