//! Line splitting and batch assembly

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ReadError;
use crate::record::{Batch, Record};
use crate::schema::FieldSchema;

const BOM: char = '\u{feff}';

/// Split one line on the delimiter
///
/// No quoting or escaping is recognized. Values are kept verbatim, including
/// surrounding whitespace.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(str::to_string).collect()
}

/// Reads delimited text into a batch aligned to a schema
#[derive(Debug, Clone)]
pub struct RecordReader {
    schema: FieldSchema,
    delimiter: char,
}

impl RecordReader {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            delimiter: crate::DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Parse text into a batch
    ///
    /// Lines end in `\n` or `\r\n`. A leading byte order mark is dropped.
    /// Blank and whitespace-only lines are not records, whatever the schema.
    pub fn read_str(&self, input: &str) -> Batch {
        debug!(bytes = input.len(), "RecordReader::read_str: called");
        let input = input.strip_prefix(BOM).unwrap_or(input);
        let records: Vec<Record> = input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .enumerate()
            .map(|(index, (lineno, line))| {
                Record::aligned(index, lineno + 1, split_line(line, self.delimiter), &self.schema)
            })
            .collect();

        Batch::new(self.schema.clone(), records)
    }

    /// Read and parse a UTF-8 file
    pub fn read_path(&self, path: &Path) -> Result<Batch, ReadError> {
        debug!(path = %path.display(), "RecordReader::read_path: called");
        let content = fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let batch = self.read_str(&content);
        info!(
            "Read {} records from {} ({} schema mismatches)",
            batch.len(),
            path.display(),
            batch.mismatched().count()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Profile;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_split_line_keeps_empty_values() {
        assert_eq!(split_line("a,,c,", ','), vec!["a", "", "c", ""]);
        assert_eq!(split_line("", ','), vec![""]);
    }

    #[test]
    fn test_read_str_crlf_and_blank_lines() {
        let reader = RecordReader::new(Profile::Keyword.schema());
        let batch = reader.read_str("alpha\r\n\r\nbeta\n   \ngamma");

        let keywords: Vec<_> = batch.iter().map(|r| r.get("keyword").unwrap()).collect();
        assert_eq!(keywords, vec!["alpha", "beta", "gamma"]);

        let lines: Vec<_> = batch.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }

    #[test]
    fn test_read_str_trailing_newline_is_not_a_record() {
        let reader = RecordReader::new(Profile::Address.schema());
        let batch = reader.read_str("Jacob,Tingen Law,123 Main St,VA,Richmond,23226,US,8045551234,j@x.com\n");

        assert_eq!(batch.len(), 1);
        let record = &batch.records()[0];
        assert_eq!(record.get("name"), Some("Jacob"));
        assert_eq!(record.get("email"), Some("j@x.com"));
        assert!(record.mismatch.is_none());
    }

    #[test]
    fn test_delimiter_in_field_shifts_alignment() {
        let reader = RecordReader::new(Profile::Address.schema());
        let batch = reader.read_str("Jacob,Tingen Law, PLLC,1801 Bayberry Court,Virginia,Richmond,23226,US,8044771720,j@x.com");
        let record = &batch.records()[0];

        assert_eq!(record.get("company"), Some("Tingen Law"));
        assert_eq!(record.get("address"), Some(" PLLC"));
        assert_eq!(record.get("email"), Some("8044771720"));
        assert!(record.mismatch.is_some());
    }

    #[test]
    fn test_custom_delimiter() {
        let schema = FieldSchema::parse(&["a", "b"]).unwrap();
        let reader = RecordReader::new(schema).with_delimiter(';');
        let batch = reader.read_str("1;2");
        assert_eq!(batch.records()[0].get("b"), Some("2"));
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one").unwrap();
        writeln!(file, "two").unwrap();

        let reader = RecordReader::new(Profile::Keyword.schema());
        let batch = reader.read_path(file.path()).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_read_path_strips_byte_order_mark() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{feff}Jacob,Tingen Law,123 Main St,VA,Richmond,23226,US,8045551234,j@x.com\r\n"
        )
        .unwrap();

        let reader = RecordReader::new(Profile::Address.schema());
        let batch = reader.read_path(file.path()).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].get("name"), Some("Jacob"));
        assert_eq!(batch.records()[0].get("email"), Some("j@x.com"));
    }

    #[test]
    fn test_byte_order_mark_only_stripped_at_start() {
        let reader = RecordReader::new(Profile::Keyword.schema());
        let batch = reader.read_str("alpha\n\u{feff}beta");
        assert_eq!(batch.records()[1].get("keyword"), Some("\u{feff}beta"));
    }

    #[test]
    fn test_whitespace_only_line_skipped_under_address_profile() {
        let reader = RecordReader::new(Profile::Address.schema());
        let batch = reader.read_str("Jacob,Tingen Law\n   \n\t\nAnna,Acme");

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records()[1].get("name"), Some("Anna"));
        assert_eq!(batch.records()[1].line, 4);
        assert_eq!(batch.records()[1].index, 1);
    }

    #[test]
    fn test_read_path_missing_file() {
        let reader = RecordReader::new(Profile::Keyword.schema());
        let result = reader.read_path(Path::new("/nonexistent/records.csv"));
        assert!(matches!(result, Err(ReadError::Io { .. })));
    }

    proptest! {
        #[test]
        fn prop_one_record_per_non_blank_line(lines in prop::collection::vec("[a-z,]{0,12}", 0..40)) {
            let reader = RecordReader::new(Profile::Address.schema());
            let batch = reader.read_str(&lines.join("\n"));

            let expected = lines.iter().filter(|l| !l.trim().is_empty()).count();
            prop_assert_eq!(batch.len(), expected);
            for (position, record) in batch.iter().enumerate() {
                prop_assert_eq!(record.index, position);
                prop_assert_eq!(record.fields.len(), 9);
            }
        }

        #[test]
        fn prop_values_survive_in_order(values in prop::collection::vec("[a-z0-9 ]{0,8}", 1..9)) {
            let reader = RecordReader::new(Profile::Address.schema());
            let batch = reader.read_str(&format!("x{}", values.join(",")));
            prop_assume!(batch.len() == 1);

            let record = &batch.records()[0];
            let got: Vec<_> = record.values().take(values.len()).collect();
            prop_assert_eq!(got[0], format!("x{}", values[0]));
            for (g, v) in got.iter().zip(values.iter()).skip(1) {
                prop_assert_eq!(*g, v.as_str());
            }
            prop_assert!(record.values().skip(values.len()).all(str::is_empty));
        }
    }
}
