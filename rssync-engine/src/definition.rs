//! Definition payloads referenced by `DATASET` and `REPORT` elements.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{definition_io_err, SyncError};

/// Element inside a shared dataset definition naming its data source.
const DATA_SOURCE_REFERENCE: &[u8] = b"DataSourceReference";

/// Resolve a definition path from the descriptor against the descriptor's directory.
pub fn definition_path(base_dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Read a definition file in full.
pub fn read_definition(path: &Path) -> Result<Vec<u8>, SyncError> {
    std::fs::read(path).map_err(|e| definition_io_err(path, e))
}

/// Replace the text of every `<DataSourceReference>` element (empty or not) in a shared
/// dataset definition with `reference`. Everything else is copied verbatim.
pub fn rewrite_data_source_reference(
    definition: &[u8],
    reference: &str,
    path: &Path,
) -> Result<Vec<u8>, SyncError> {
    let invalid = |message: String| SyncError::Definition {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_reader(definition);
    let mut writer = Writer::new(Vec::with_capacity(definition.len()));
    let mut buf = Vec::new();
    let mut inside_reference = false;

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| invalid(e.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == DATA_SOURCE_REFERENCE => {
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| invalid(e.to_string()))?;
                writer
                    .write_event(Event::Text(BytesText::new(reference)))
                    .map_err(|e| invalid(e.to_string()))?;
                inside_reference = true;
            }
            // `<DataSourceReference/>` is expanded so it can carry the reference.
            Event::Empty(e) if e.local_name().as_ref() == DATA_SOURCE_REFERENCE => {
                let end = e.to_end().into_owned();
                for event in [
                    Event::Start(e),
                    Event::Text(BytesText::new(reference)),
                    Event::End(end),
                ] {
                    writer
                        .write_event(event)
                        .map_err(|e| invalid(e.to_string()))?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == DATA_SOURCE_REFERENCE => {
                inside_reference = false;
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| invalid(e.to_string()))?;
            }
            // Original reference text is dropped.
            Event::Text(_) | Event::CData(_) if inside_reference => {}
            other => writer
                .write_event(other)
                .map_err(|e| invalid(e.to_string()))?,
        }
    }

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SharedDataSet xmlns="http://schemas.microsoft.com/sqlserver/reporting/2010/01/shareddatasetdefinition">
  <DataSet Name="">
    <Query>
      <DataSourceReference>Sales</DataSourceReference>
      <CommandText>SELECT 1 &lt; 2</CommandText>
    </Query>
  </DataSet>
</SharedDataSet>"#;

    #[test]
    fn rewrites_reference_and_keeps_the_rest() {
        let out = rewrite_data_source_reference(RSD.as_bytes(), "/Finance/Shared/Sales", Path::new("q.rsd"))
            .expect("rewrite");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("<DataSourceReference>/Finance/Shared/Sales</DataSourceReference>"));
        assert!(!text.contains(">Sales<"));
        assert!(text.contains("<CommandText>SELECT 1 &lt; 2</CommandText>"));
        assert!(text.starts_with("<?xml"));
    }

    #[test]
    fn self_closing_reference_is_filled_in() {
        let xml = "<SharedDataSet><DataSet><Query><DataSourceReference/></Query></DataSet></SharedDataSet>";
        let out = rewrite_data_source_reference(xml.as_bytes(), "/Finance/Main", Path::new("q.rsd"))
            .expect("rewrite");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "<SharedDataSet><DataSet><Query><DataSourceReference>/Finance/Main</DataSourceReference></Query></DataSet></SharedDataSet>"
        );
    }

    #[test]
    fn definition_without_reference_is_unchanged() {
        let xml = "<SharedDataSet><DataSet/></SharedDataSet>";
        let out = rewrite_data_source_reference(xml.as_bytes(), "/x", Path::new("q.rsd")).expect("rewrite");
        assert_eq!(String::from_utf8(out).unwrap(), xml);
    }

    #[test]
    fn malformed_definition_is_reported_with_path() {
        let err = rewrite_data_source_reference(b"<a></b>", "/x", Path::new("broken.rsd")).unwrap_err();
        assert!(matches!(err, SyncError::Definition { .. }));
        assert!(err.to_string().contains("broken.rsd"));
    }

    #[test]
    fn relative_definition_paths_follow_descriptor() {
        let base = Path::new("/deploy/layout");
        assert_eq!(
            definition_path(base, "reports/sales.rdl"),
            PathBuf::from("/deploy/layout/reports/sales.rdl")
        );
        assert_eq!(definition_path(base, "/abs/x.rdl"), PathBuf::from("/abs/x.rdl"));
    }

    #[test]
    fn unreadable_definition_is_definition_io() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let missing = dir.path().join("missing.rdl");
        let err = read_definition(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.rdl"), "got: {err}");
        match err {
            SyncError::DefinitionIo { path, .. } => assert_eq!(path, missing),
            other => panic!("expected DefinitionIo, got {other}"),
        }
    }
}
