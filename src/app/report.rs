use crate::core::layout::DetectorLayout;
use crate::domain::model::{CalibrationField, CalibrationRecord, ElementTag, Region};
use crate::utils::error::{BedError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// One row of the region table.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutRow {
    pub tag: String,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&Region> for LayoutRow {
    fn from(region: &Region) -> Self {
        Self {
            tag: region.tag().to_string(),
            kind: region.kind.name().to_string(),
            x: region.rect.x,
            y: region.rect.y,
            width: region.rect.width,
            height: region.rect.height,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CalibrationRow<'a> {
    tag: String,
    #[serde(flatten)]
    record: &'a CalibrationRecord,
}

pub fn render_layout(layout: &DetectorLayout, format: OutputFormat) -> Result<String> {
    let rows: Vec<LayoutRow> = layout.regions().map(LayoutRow::from).collect();

    match format {
        OutputFormat::Table => {
            let mut out = format!(
                "{:<5} {:<5} {:>10} {:>10} {:>10} {:>10}\n",
                "tag", "kind", "x", "y", "width", "height"
            );
            for row in &rows {
                out.push_str(&format!(
                    "{:<5} {:<5} {:>10.5} {:>10.5} {:>10.5} {:>10.5}\n",
                    row.tag, row.kind, row.x, row.y, row.width, row.height
                ));
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in &rows {
                writer.serialize(row)?;
            }
            finish_csv(writer)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
    }
}

pub fn render_calibrations(
    records: &[(ElementTag, CalibrationRecord)],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = format!("{:<5}", "tag");
            for field in CalibrationField::ALL {
                out.push_str(&format!(" {:>12}", field.name()));
            }
            out.push('\n');
            for (tag, record) in records {
                out.push_str(&format!("{:<5}", tag.to_string()));
                for value in record.fields() {
                    out.push_str(&format!(" {:>12}", value));
                }
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            let mut header = vec!["tag"];
            header.extend(CalibrationField::ALL.iter().map(|f| f.name()));
            writer.write_record(&header)?;
            for (tag, record) in records {
                let mut row = vec![tag.to_string()];
                row.extend(record.fields().iter().map(|v| v.to_string()));
                writer.write_record(&row)?;
            }
            finish_csv(writer)
        }
        OutputFormat::Json => {
            let rows: Vec<CalibrationRow> = records
                .iter()
                .map(|(tag, record)| CalibrationRow {
                    tag: tag.to_string(),
                    record,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| BedError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| BedError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
