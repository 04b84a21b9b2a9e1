//! Delimited-file loading with encoding and delimiter auto-detection.
//!
//! Produces a [`Frame`] of labeled columns. Cells that look numeric are
//! coerced to JSON numbers (answer indicators, ages, identifiers); empty
//! cells become null; everything else stays a string. No survey-specific
//! logic here.

use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::frame::Frame;

/// Result of loading with detection metadata.
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    /// Parsed table.
    pub frame: Frame,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Fallback: UTF-8 with lossy conversion
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Coerce a raw cell into its JSON value.
///
/// Empty cells become null so that missing answers never look like the
/// string `""` downstream. Integer-looking cells become integers (ids,
/// binary answers), decimal-looking cells become floats (ages).
fn coerce_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(i));
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

/// Parse decoded CSV content with an explicit delimiter.
///
/// The delimiter must be a single-byte ASCII character; the reader works
/// on bytes, so a wider char would be truncated.
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Frame> {
    if !delimiter.is_ascii() {
        return Err(CsvError::InvalidDelimiter(delimiter));
    }
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::Parse { line: 1, message: e.to_string() })?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CsvError::Parse {
            line: idx + 2, // header is line 1
            message: e.to_string(),
        })?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = record.get(i).unwrap_or("");
            row.insert(header.clone(), coerce_cell(raw));
        }
        rows.push(row);
    }

    Ok(Frame::new(headers, rows))
}

/// Load a file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let loaded = load_frame("survey.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", loaded.encoding, loaded.delimiter);
/// println!("Rows: {}", loaded.frame.len());
/// ```
pub fn load_frame<P: AsRef<Path>>(path: P) -> CsvResult<LoadedFrame> {
    let bytes = std::fs::read(path.as_ref())?;
    load_bytes(&bytes)
}

/// Load raw bytes with auto-detection of encoding and delimiter.
pub fn load_bytes(bytes: &[u8]) -> CsvResult<LoadedFrame> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let frame = parse_str(&content, delimiter)?;

    Ok(LoadedFrame { frame, encoding, delimiter })
}

/// Load a file with an explicit delimiter, skipping detection.
pub fn load_frame_with_delimiter<P: AsRef<Path>>(path: P, delimiter: char) -> CsvResult<LoadedFrame> {
    let bytes = std::fs::read(path.as_ref())?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);
    let frame = parse_str(&content, delimiter)?;
    Ok(LoadedFrame { frame, encoding, delimiter })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let frame = parse_str("id,native_language\n1,Spanish\n2,French", ',').unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows()[0]["id"], json!(1));
        assert_eq!(frame.rows()[0]["native_language"], json!("Spanish"));
        assert_eq!(frame.rows()[1]["native_language"], json!("French"));
    }

    #[test]
    fn test_numeric_coercion() {
        let frame = parse_str("id,age,q1\n3,24.5,1", ',').unwrap();
        assert_eq!(frame.rows()[0]["id"], json!(3));
        assert_eq!(frame.rows()[0]["age"], json!(24.5));
        assert_eq!(frame.rows()[0]["q1"], json!(1));
    }

    #[test]
    fn test_empty_cell_is_null() {
        let frame = parse_str("a,b,c\n1,,3", ',').unwrap();
        assert_eq!(frame.rows()[0]["b"], Value::Null);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let frame = parse_str("a;b\n1;2", ';').unwrap();
        assert_eq!(frame.rows()[0]["a"], json!(1));
        assert_eq!(frame.rows()[0]["b"], json!(2));
    }

    #[test]
    fn test_quoted_values() {
        let frame = parse_str("name,note\nAlice,\"late, revised\"", ',').unwrap();
        assert_eq!(frame.rows()[0]["note"], json!("late, revised"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let frame = parse_str("a,b\n1,2\n,\n3,4\n", ',').unwrap();
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_str("", ',');
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_load_bytes_auto() {
        let bytes = b"id,native_language\n1,Spanish\n2,German";
        let loaded = load_bytes(bytes).unwrap();
        assert_eq!(loaded.delimiter, ',');
        assert_eq!(loaded.encoding, "utf-8");
        assert_eq!(loaded.frame.len(), 2);
        assert_eq!(
            loaded.frame.headers(),
            &["id".to_string(), "native_language".to_string()]
        );
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let result = parse_str("a→b\n1→2", '→');
        assert!(matches!(result, Err(CsvError::InvalidDelimiter('→'))));
    }

    #[test]
    fn test_load_frame_from_file() {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "id,q1,q2\n1,0,1\n2,1,1\n").unwrap();

        let loaded = load_frame(tmp.path()).unwrap();
        assert_eq!(loaded.frame.len(), 2);
        assert_eq!(loaded.frame.rows()[1]["q1"], json!(1));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_frame("/nonexistent/survey.csv");
        assert!(matches!(result, Err(CsvError::Io(_))));
    }
}
