//! Minimal CSV reading for bulk imports.
//!
//! Handles quoted fields, embedded commas and doubled quotes. Input is
//! header-first; each record is exposed as a field map keyed by header name.

use std::collections::HashMap;

/// A parsed CSV document: headers plus one field map per data row.
#[derive(Debug, Clone)]
pub struct CsvDocument {
    /// Header names, trimmed, in file order.
    pub headers: Vec<String>,
    /// Data rows. Missing trailing fields are filled with empty strings.
    pub rows: Vec<CsvRow>,
}

/// A single data row.
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    fields: HashMap<String, String>,
}

impl CsvRow {
    /// Get a field by header name, trimmed. Missing fields read as "".
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// Whether the named field is present and non-empty.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }
}

/// Parse CSV text into a document.
///
/// Returns an error when the input has no header row. Blank lines are
/// skipped. Rows with more fields than headers keep only the leading
/// fields; shorter rows are padded with empty strings.
pub fn parse(text: &str) -> Result<CsvDocument, String> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err("CSV file is empty".to_string());
    };

    let headers: Vec<String> = split_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err("CSV header row is empty".to_string());
    }

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let values = split_line(line);
        let mut fields = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).map_or("", String::as_str).trim().to_string();
            fields.insert(header.clone(), value);
        }
        rows.push(CsvRow {
            line: idx + 1,
            fields,
        });
    }

    Ok(CsvDocument { headers, rows })
}

/// Split one CSV line into raw fields, honoring double quotes.
///
/// A doubled quote inside a quoted field is an escaped quote.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields() {
        let doc = parse("email,full_name,role\njohn@example.com,John Doe,user").unwrap();
        assert_eq!(doc.headers, vec!["email", "full_name", "role"]);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0].get("email"), "john@example.com");
        assert_eq!(doc.rows[0].get("full_name"), "John Doe");
        assert_eq!(doc.rows[0].get("role"), "user");
    }

    #[test]
    fn test_quoted_fields_with_embedded_commas() {
        let text = concat!(
            "title,description,category,option1,option2,option3,option4,option5\n",
            "\"What's your favorite programming language?\",\"Choose one, not two\",",
            "Technology,JavaScript,Python,Java,C++,Go",
        );
        let doc = parse(text).unwrap();
        let row = &doc.rows[0];
        assert_eq!(row.get("title"), "What's your favorite programming language?");
        assert_eq!(row.get("description"), "Choose one, not two");
        assert_eq!(row.get("category"), "Technology");
        assert_eq!(row.get("option1"), "JavaScript");
        assert_eq!(row.get("option2"), "Python");
        assert_eq!(row.get("option3"), "Java");
        assert_eq!(row.get("option4"), "C++");
        assert_eq!(row.get("option5"), "Go");
    }

    #[test]
    fn test_doubled_quotes_escape() {
        let doc = parse("title\n\"He said \"\"hi\"\"\"").unwrap();
        assert_eq!(doc.rows[0].get("title"), "He said \"hi\"");
    }

    #[test]
    fn test_short_rows_pad_with_empty() {
        let doc = parse("a,b,c\n1,2").unwrap();
        assert_eq!(doc.rows[0].get("c"), "");
        assert!(!doc.rows[0].has("c"));
        assert!(doc.rows[0].has("b"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let doc = parse("a,b\n\n1,2\n\n3,4\n").unwrap();
        assert_eq!(doc.rows.len(), 2);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse("").is_err());
        assert!(parse("\n\n").is_err());
    }

    #[test]
    fn test_line_numbers_track_source() {
        let doc = parse("a,b\n1,2\n\n3,4").unwrap();
        assert_eq!(doc.rows[0].line, 2);
        assert_eq!(doc.rows[1].line, 4);
    }
}
