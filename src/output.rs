use std::borrow::Cow;
use std::io;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Delimited output flavor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Csv,
    Tsv,
}

impl Format {
    #[inline]
    pub fn delimiter(self) -> u8 {
        match self {
            Format::Csv => b',',
            Format::Tsv => b'\t',
        }
    }
}

/// Textual substitutions applied to every field before it is written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Escapes {
    /// Replace `,` with `<comma>`.
    pub comma: bool,
    /// Replace `"` with `<doublequotes>`.
    pub double_quotes: bool,
}

impl Default for Escapes {
    fn default() -> Self {
        Escapes {
            comma: true,
            double_quotes: true,
        }
    }
}

const COMMA_MARKER: &str = "<comma>";
const DOUBLE_QUOTES_MARKER: &str = "<doublequotes>";

/// Apply the configured substitutions to one field.
pub fn escape_field<'a>(field: &'a str, escapes: Escapes) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(field);
    if escapes.comma && out.contains(',') {
        out = Cow::Owned(out.replace(',', COMMA_MARKER));
    }
    if escapes.double_quotes && out.contains('"') {
        out = Cow::Owned(out.replace('"', DOUBLE_QUOTES_MARKER));
    }
    out
}

/// Writes one delimited line per row and flushes it immediately.
pub struct RowWriter<W: io::Write> {
    inner: csv::Writer<W>,
    escapes: Escapes,
}

impl<W: io::Write> RowWriter<W> {
    pub fn new(wtr: W, format: Format, escapes: Escapes) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(false)
            .from_writer(wtr);
        RowWriter { inner, escapes }
    }

    /// Write a row and flush it through to the underlying writer.
    ///
    /// Fields that still contain the delimiter after substitution are quoted
    /// by the CSV writer.
    pub fn write_row<S: AsRef<str>>(&mut self, row: &[S]) -> Result<()> {
        let escapes = self.escapes;
        self.inner.write_record(
            row.iter()
                .map(|field| escape_field(field.as_ref(), escapes).into_owned()),
        )?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: Format, escapes: Escapes, rows: &[&[&str]]) -> String {
        let mut writer = RowWriter::new(Vec::new(), format, escapes);
        for row in rows {
            writer.write_row(*row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn escapes_both_markers() {
        let escaped = escape_field("a,b\"c", Escapes::default());
        assert_eq!(escaped, "a<comma>b<doublequotes>c");
    }

    #[test]
    fn escape_leaves_clean_fields_borrowed() {
        assert!(matches!(
            escape_field("Google LLC", Escapes::default()),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn csv_row_with_escapes() {
        let out = render(
            Format::Csv,
            Escapes::default(),
            &[&["8.8.8.8", "15169", "Google, \"LLC\""]],
        );
        assert_eq!(out, "8.8.8.8,15169,Google<comma> <doublequotes>LLC<doublequotes>\n");
    }

    #[test]
    fn csv_without_escapes_falls_back_to_quoting() {
        let escapes = Escapes {
            comma: false,
            double_quotes: false,
        };
        let out = render(Format::Csv, escapes, &[&["1.1.1.1", "a,b"]]);
        assert_eq!(out, "1.1.1.1,\"a,b\"\n");
    }

    #[test]
    fn tsv_keeps_commas_when_not_escaped() {
        let escapes = Escapes {
            comma: false,
            double_quotes: true,
        };
        let out = render(Format::Tsv, escapes, &[&["1.1.1.1", "a,b", ""]]);
        assert_eq!(out, "1.1.1.1\ta,b\t\n");
    }

    #[test]
    fn one_line_per_row() {
        let out = render(
            Format::Csv,
            Escapes::default(),
            &[&["1.1.1.1", "AU"], &["8.8.8.8", "US"]],
        );
        assert_eq!(out, "1.1.1.1,AU\n8.8.8.8,US\n");
    }

    #[test]
    fn field_count_survives_resplit() {
        for format in [Format::Csv, Format::Tsv] {
            let row = ["2001:db8::1", "Tokyo, Japan", "say \"hi\"", ""];
            let out = render(format, Escapes::default(), &[&row]);
            let line = out.trim_end_matches('\n');
            let fields = line.split(format.delimiter() as char).count();
            assert_eq!(fields, row.len(), "{:?}: {}", format, line);
        }
    }
}
