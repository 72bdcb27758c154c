//! Calibration file parsing and validation.
//!
//! A calibration file is line oriented. Lines starting with `#` are
//! comments, empty lines are skipped, every other line is a record:
//! a tag followed by nine numbers, separated by single spaces.
//!
//! ```text
//! # tag v_eff a_left a_right lambda delta_L delta_R t_left t_right length
//! b1 15.2 0.98 1.02 140.0 0.1 -0.1 0.05 0.05 60.0
//! ```

use crate::core::tags::{in_universe, tag_universe};
use crate::domain::model::{CalibrationField, CalibrationRecord, ElementCounts, ElementTag};
use crate::domain::ports::{CalibrationSource, ValidationMode};
use crate::utils::error::{BedError, Result};
use std::io::BufRead;

const COMMENT: char = '#';
const DELIMITER: char = ' ';

#[derive(Debug, Clone, Copy)]
pub struct CalibrationParser {
    counts: ElementCounts,
    mode: ValidationMode,
}

impl CalibrationParser {
    pub fn new(counts: ElementCounts, mode: ValidationMode) -> Self {
        Self { counts, mode }
    }

    pub fn strict(counts: ElementCounts) -> Self {
        Self::new(counts, ValidationMode::Strict)
    }

    pub fn counts(&self) -> ElementCounts {
        self.counts
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Loads the record for `tag`.
    ///
    /// In strict mode the whole tag universe is validated before the record
    /// is parsed, so an invalid file never yields a record.
    pub fn load<S: CalibrationSource + ?Sized>(
        &self,
        source: &S,
        tag: &ElementTag,
    ) -> Result<CalibrationRecord> {
        let file = source.name();
        let reader = open(source, &file)?;

        let line = match self.mode {
            ValidationMode::Strict => {
                let wanted = in_universe(&self.counts, tag).then_some(tag);
                let captured = self.validate_lines(reader, &file, wanted, false)?;
                captured.map(|(_, line)| line)
            }
            ValidationMode::LookupOnly => find_record(reader, &file, tag)?,
        };

        match line {
            Some(line) => {
                tracing::debug!(%tag, file = %file, "calibration record found");
                parse_record(tag, &line)
            }
            None => Err(BedError::ElementNotFound {
                tag: tag.to_string(),
                file,
            }),
        }
    }

    /// Checks the file's tag sequence against the element universe and the
    /// syntax of every record. Returns the number of validated records.
    /// Always strict.
    pub fn validate<S: CalibrationSource + ?Sized>(&self, source: &S) -> Result<usize> {
        let file = source.name();
        let reader = open(source, &file)?;
        self.validate_lines(reader, &file, None, true)?;
        let validated = self.counts.total_elements();
        tracing::info!(file = %file, records = validated, "calibration file is valid");
        Ok(validated)
    }

    /// Parses every record. Strict mode validates first and returns the
    /// universe in order; lookup-only mode returns each record line in
    /// file order.
    pub fn load_all<S: CalibrationSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<(ElementTag, CalibrationRecord)>> {
        let file = source.name();
        let reader = open(source, &file)?;

        let mut records = Vec::new();
        match self.mode {
            ValidationMode::Strict => {
                let universe = tag_universe(&self.counts);
                let mut lines = record_lines(reader, &file);
                for (position, expected) in universe.iter().enumerate() {
                    let (line_no, line) = next_expected(&mut lines, &file, position, &universe)?;
                    check_tag(&file, position, line_no, expected, &line)?;
                    records.push((*expected, parse_record(expected, &line)?));
                }
            }
            ValidationMode::LookupOnly => {
                for entry in record_lines(reader, &file) {
                    let (line_no, line) = entry?;
                    let token = first_token(&line);
                    let tag: ElementTag = token.parse().map_err(|_| BedError::MalformedRecord {
                        tag: token.to_string(),
                        field: None,
                        reason: format!("line {} does not start with an element tag", line_no),
                    })?;
                    records.push((tag, parse_record(&tag, &line)?));
                }
            }
        }

        tracing::debug!(file = %file, records = records.len(), "parsed calibration records");
        Ok(records)
    }

    /// Single pass over the universe: every position must carry the
    /// expected tag. The line for `wanted` is captured on the way. With
    /// `check_records` every record must also parse.
    fn validate_lines(
        &self,
        reader: Box<dyn BufRead + '_>,
        file: &str,
        wanted: Option<&ElementTag>,
        check_records: bool,
    ) -> Result<Option<(usize, String)>> {
        let universe = tag_universe(&self.counts);
        let mut lines = record_lines(reader, file);
        let mut captured = None;

        for (position, expected) in universe.iter().enumerate() {
            let (line_no, line) = next_expected(&mut lines, file, position, &universe)?;
            check_tag(file, position, line_no, expected, &line)?;
            if check_records {
                parse_record(expected, &line)?;
            }
            if wanted == Some(expected) {
                captured = Some((line_no, line));
            }
        }

        Ok(captured)
    }
}

fn open<'a, S: CalibrationSource + ?Sized>(source: &'a S, file: &str) -> Result<Box<dyn BufRead + 'a>> {
    source.open().map_err(|e| match e {
        BedError::InvalidCalibrationFile { .. } => e,
        other => BedError::InvalidCalibrationFile {
            file: file.to_string(),
            reason: other.to_string(),
        },
    })
}

/// Record lines with their 1-based line numbers; comments and blank lines are dropped.
fn record_lines<'a>(
    reader: Box<dyn BufRead + 'a>,
    file: &'a str,
) -> impl Iterator<Item = Result<(usize, String)>> + 'a {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(index, line)| match line {
            Ok(line) if line.is_empty() || line.starts_with(COMMENT) => None,
            Ok(line) => Some(Ok((index + 1, line))),
            Err(e) => Some(Err(BedError::InvalidCalibrationFile {
                file: file.to_string(),
                reason: format!("read failed at line {}: {}", index + 1, e),
            })),
        })
}

fn next_expected(
    lines: &mut impl Iterator<Item = Result<(usize, String)>>,
    file: &str,
    position: usize,
    universe: &[ElementTag],
) -> Result<(usize, String)> {
    match lines.next() {
        Some(entry) => entry,
        None => Err(BedError::InvalidCalibrationFile {
            file: file.to_string(),
            reason: format!(
                "file ends after {} of {} records; missing '{}'",
                position,
                universe.len(),
                universe[position]
            ),
        }),
    }
}

fn check_tag(file: &str, position: usize, line_no: usize, expected: &ElementTag, line: &str) -> Result<()> {
    let found = first_token(line);
    if found != expected.to_string() {
        return Err(BedError::InvalidCalibrationFile {
            file: file.to_string(),
            reason: format!(
                "record {} (line {}) has tag '{}', expected '{}'",
                position + 1,
                line_no,
                found,
                expected
            ),
        });
    }
    Ok(())
}

fn find_record(reader: Box<dyn BufRead + '_>, file: &str, tag: &ElementTag) -> Result<Option<String>> {
    let wanted = tag.to_string();
    for entry in record_lines(reader, file) {
        let (_, line) = entry?;
        if first_token(&line) == wanted {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

fn first_token(line: &str) -> &str {
    line.split(DELIMITER).next().unwrap_or_default()
}

/// Parses `<tag> v1 .. v9`. Tabs, repeated spaces and wrong field counts are format errors.
pub fn parse_record(tag: &ElementTag, line: &str) -> Result<CalibrationRecord> {
    let malformed = |field: Option<usize>, reason: String| BedError::MalformedRecord {
        tag: tag.to_string(),
        field,
        reason,
    };

    if line.contains('\t') {
        return Err(malformed(None, "tab separator; use single spaces".to_string()));
    }

    let tokens: Vec<&str> = line.split(DELIMITER).collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(malformed(
            None,
            "empty token; fields must be separated by a single space".to_string(),
        ));
    }

    let expected = CalibrationField::ALL.len();
    let found = tokens.len() - 1;
    if found != expected {
        return Err(malformed(
            None,
            format!("expected {} fields, found {}", expected, found),
        ));
    }

    let mut values = [0.0; 9];
    for (position, (field, token)) in CalibrationField::ALL.iter().zip(&tokens[1..]).enumerate() {
        values[position] = token.parse::<f64>().map_err(|e| {
            malformed(
                Some(position + 1),
                format!("field {} ({}) '{}' is not a number: {}", position + 1, field.name(), token, e),
            )
        })?;
    }

    Ok(CalibrationRecord::from_fields(values))
}
