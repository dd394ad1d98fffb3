//! Export record parser
//!
//! Streams through the export XML and lifts the attributes of every `Record`
//! element matching one metric's type discriminator. Attribute values are kept
//! as raw strings; validation happens downstream in the normalizer so one bad
//! record never aborts a run.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;
use crate::types::{MetricKind, RawRecord};

/// Handle to an export file, validated to exist at open time
#[derive(Debug)]
pub struct ExportReader {
    path: PathBuf,
}

impl ExportReader {
    /// Open an export file. A missing path is a fatal precondition failure,
    /// reported before any parsing begins.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ExtractError::MissingExport(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collect all records of one category. Each call re-reads the source.
    pub fn records(&self, kind: MetricKind) -> Result<Vec<RawRecord>, ExtractError> {
        let mut reader = Reader::from_file(&self.path)?;
        scan_records(&mut reader, kind.discriminator())
    }
}

/// Scan an XML stream for `Record` elements whose `type` attribute equals
/// `discriminator`.
///
/// Both self-closing records and records with children (metadata entries) are
/// matched; children are skipped.
pub fn scan_records<R: BufRead>(
    reader: &mut Reader<R>,
    discriminator: &str,
) -> Result<Vec<RawRecord>, ExtractError> {
    let mut buf = Vec::new();
    let mut records = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Record" => {
                if let Some(record) = lift_record(&e, discriminator)? {
                    records.push(record);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Lift one `Record` element's attributes into a `RawRecord`, or `None` when
/// its type does not match the requested discriminator.
fn lift_record(element: &BytesStart, discriminator: &str) -> Result<Option<RawRecord>, ExtractError> {
    let mut record_type = None;
    let mut value = None;
    let mut unit = None;
    let mut start_date = None;
    let mut end_date = None;
    let mut source_name = None;

    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let text = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"type" => record_type = Some(text),
            b"value" => value = Some(text),
            b"unit" => unit = Some(text),
            b"startDate" => start_date = Some(text),
            b"endDate" => end_date = Some(text),
            b"sourceName" => source_name = Some(text),
            _ => {}
        }
    }

    if record_type.as_deref() != Some(discriminator) {
        return Ok(None);
    }

    Ok(Some(RawRecord {
        value,
        unit,
        start_date: start_date.unwrap_or_default(),
        end_date: end_date.unwrap_or_default(),
        source_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_str(xml: &str, kind: MetricKind) -> Vec<RawRecord> {
        let mut reader = Reader::from_str(xml);
        scan_records(&mut reader, kind.discriminator()).unwrap()
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_GB">
  <ExportDate value="2025-01-02 10:00:00 +0000"/>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Phone"
          unit="count" startDate="2024-01-01 09:00:00 +0000"
          endDate="2024-01-01 09:10:00 +0000" value="3000"/>
  <Record type="HKQuantityTypeIdentifierRestingHeartRate" sourceName="Watch"
          unit="count/min" startDate="2024-01-01 08:00:00 +0000"
          endDate="2024-01-01 08:00:00 +0000" value="55"/>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Watch"
          unit="count" startDate="2024-01-01 18:00:00 +0000"
          endDate="2024-01-01 18:05:00 +0000" value="4500">
    <MetadataEntry key="HKMetadataKeySyncVersion" value="1"/>
  </Record>
</HealthData>"#;

    #[test]
    fn filters_by_discriminator() {
        let records = scan_str(SAMPLE, MetricKind::StepCount);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value.as_deref(), Some("3000"));
        assert_eq!(records[0].source_name.as_deref(), Some("Phone"));
        assert_eq!(records[1].value.as_deref(), Some("4500"));

        let hr = scan_str(SAMPLE, MetricKind::RestingHeartRate);
        assert_eq!(hr.len(), 1);
        assert_eq!(hr[0].value.as_deref(), Some("55"));
    }

    #[test]
    fn matches_records_with_children() {
        // The second step record carries a MetadataEntry child and is a
        // Start event rather than Empty; it must still be lifted.
        let records = scan_str(SAMPLE, MetricKind::StepCount);
        assert_eq!(records[1].start_date, "2024-01-01 18:00:00 +0000");
    }

    #[test]
    fn no_matches_yields_empty() {
        let records = scan_str(SAMPLE, MetricKind::SleepAnalysis);
        assert!(records.is_empty());
    }

    #[test]
    fn missing_attributes_are_tolerated() {
        let xml = r#"<HealthData>
          <Record type="HKQuantityTypeIdentifierStepCount"
                  startDate="2024-01-01 09:00:00 +0000"
                  endDate="2024-01-01 09:10:00 +0000"/>
        </HealthData>"#;
        let records = scan_str(xml, MetricKind::StepCount);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, None);
        assert_eq!(records[0].unit, None);
        assert_eq!(records[0].source_name, None);
    }

    #[test]
    fn open_missing_export_fails() {
        let err = ExportReader::open("/nonexistent/export.xml").unwrap_err();
        assert!(matches!(err, ExtractError::MissingExport(_)));
    }
}
