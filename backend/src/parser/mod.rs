//! Text decoding and delimiter-tolerant CSV parsing.
//!
//! Registry exports are written in Latin-1, so bytes are decoded with that
//! charset unless configured otherwise. The CSV dialect is deliberately
//! simple: one delimiter for the whole file, chosen from the first line,
//! and no embedded delimiters inside quoted cells.

pub mod keys;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use keys::{fold_text, normalize_key};

/// How raw bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// ISO-8859-1 (as browsers read it). Required for census exports.
    #[default]
    Latin1,
    /// UTF-8, lossy.
    Utf8,
    /// Detect with chardet, falling back to Latin-1.
    Auto,
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Self::Latin1),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown encoding '{}'", other)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latin1 => write!(f, "iso-8859-1"),
            Self::Utf8 => write!(f, "utf-8"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One JSON object per data row, keyed by canonical header key
    pub records: Vec<Value>,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Canonical header keys, in column order
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "utf-8" | "utf8" => TextEncoding::Utf8,
        _ => TextEncoding::Latin1,
    }
}

/// Decode bytes to a string.
///
/// Returns the text and the concrete encoding used (never `Auto`).
pub fn decode_content(bytes: &[u8], encoding: TextEncoding) -> (String, TextEncoding) {
    let encoding = match encoding {
        TextEncoding::Auto => detect_encoding(bytes),
        other => other,
    };

    let text = match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        // The WHATWG "iso-8859-1" label is windows-1252; every byte maps to a char.
        _ => encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    };

    (text, encoding)
}

/// Decode a JSON file.
///
/// JSON is UTF-8, so valid UTF-8 bytes (BOM stripped) are taken as is and
/// `fallback` only applies to legacy files that are not.
pub fn decode_json_content(bytes: &[u8], fallback: TextEncoding) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => decode_content(bytes, fallback),
    }
}

/// Pick the delimiter from the first line only: `;` if present, else `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Trim a cell and strip one matching pair of surrounding double quotes.
fn clean_cell(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Parse CSV text into header-keyed JSON objects.
///
/// Header cells are canonicalized with [`normalize_key`]. Blank lines and
/// rows whose cells are all empty are dropped; missing trailing cells become
/// empty strings and extra cells are ignored. Empty input yields no rows.
///
/// # Example
/// ```ignore
/// use educa_import::parse_csv;
///
/// let result = parse_csv("Nome;Data de Nascimento\nAna;2015-03-05");
///
/// assert_eq!(result.delimiter, ';');
/// assert_eq!(result.records[0]["nome"], "Ana");
/// assert_eq!(result.records[0]["datadenascimento"], "2015-03-05");
/// ```
pub fn parse_csv(content: &str) -> ParseResult {
    let delimiter = detect_delimiter(content);
    let mut lines = content.lines();

    let headers: Vec<String> = lines
        .next()
        .map(|line| line.split(delimiter).map(normalize_key).collect())
        .unwrap_or_default();

    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(delimiter).collect();
        let mut obj = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).map(|s| clean_cell(s)).unwrap_or("");
            obj.insert(header.clone(), Value::String(value.to_string()));
        }

        let has_content = obj
            .values()
            .any(|v| v.as_str().is_some_and(|s| !s.is_empty()));
        if has_content {
            records.push(Value::Object(obj));
        }
    }

    ParseResult {
        records,
        delimiter,
        headers,
    }
}
