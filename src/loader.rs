use crate::data::{Dataset, Metadata, Record};
use crate::error::LoadError;
use serde_json::Value;
use std::path::PathBuf;

/// Raw response from a data source
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

impl Fetched {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Somewhere the dataset document can be retrieved from
pub trait DataSource {
    /// Human-readable location, used in error messages
    fn location(&self) -> String;

    fn fetch(&self) -> Result<Fetched, LoadError>;
}

/// Reads the document from a fixed path on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Fetched, LoadError> {
        let body = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Transport {
            location: self.location(),
            source,
        })?;
        Ok(Fetched::ok(body))
    }
}

/// Fetch and validate a dataset document
pub fn load_dataset(source: &dyn DataSource) -> Result<Dataset, LoadError> {
    let fetched = source.fetch()?;
    if !fetched.is_success() {
        return Err(LoadError::Status {
            location: source.location(),
            status: fetched.status,
        });
    }

    let dataset = parse_document(&fetched.body)?;
    tracing::info!(
        location = %source.location(),
        records = dataset.len(),
        fields = dataset.fields.len(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Parse the `{ metadata, data }` document produced by the spreadsheet export
pub fn parse_document(body: &str) -> Result<Dataset, LoadError> {
    let root: Value = serde_json::from_str(body)?;

    let metadata = root
        .get("metadata")
        .and_then(Value::as_object)
        .map(Metadata::from_json_object)
        .ok_or(LoadError::MissingMetadata)?;

    let array = root
        .get("data")
        .ok_or(LoadError::MissingData)?
        .as_array()
        .ok_or(LoadError::DataNotArray)?;

    let mut records = Vec::with_capacity(array.len());
    for (index, item) in array.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or(LoadError::InvalidRecord { index })?;
        records.push(Record::from_json_object(obj));
    }

    check_metadata(&metadata, records.len());

    let fields = if metadata.fields.is_empty() {
        Dataset::fields_from_records(&records)
    } else {
        metadata.fields
    };

    Ok(Dataset::new(fields, records))
}

/// Counts the export did not write are not checked
fn check_metadata(metadata: &Metadata, record_count: usize) {
    if let Some(expected) = metadata.total_records.filter(|&n| n != record_count) {
        tracing::warn!(
            expected,
            actual = record_count,
            "Record count does not match metadata"
        );
    }
    if let Some(expected) = metadata.field_count.filter(|&n| n != metadata.fields.len()) {
        tracing::warn!(
            expected,
            actual = metadata.fields.len(),
            "Field count does not match metadata"
        );
    }
}

/// The currently published dataset and the last load error.
///
/// A failed reload keeps the previous dataset in place.
#[derive(Debug, Default)]
pub struct DataStore {
    dataset: Dataset,
    error: Option<String>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reload(&mut self, source: &dyn DataSource) -> bool {
        match load_dataset(source) {
            Ok(dataset) => {
                self.dataset = dataset;
                self.error = None;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to load dataset");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn fields(&self) -> &[String] {
        &self.dataset.fields
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct StubSource(Fetched);

    impl DataSource for StubSource {
        fn location(&self) -> String {
            "stub".to_string()
        }

        fn fetch(&self) -> Result<Fetched, LoadError> {
            Ok(self.0.clone())
        }
    }

    fn doc() -> &'static str {
        r#"{
            "metadata": {"total_records": 2, "fields": ["type", "hours"], "field_count": 2},
            "data": [{"type": "UI", "hours": 2}, {"type": "API", "hours": null}]
        }"#
    }

    #[test]
    fn test_parse_document() {
        let dataset = parse_document(doc()).unwrap();
        assert_eq!(dataset.fields, vec!["type", "hours"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].number("hours"), Some(2.0));
    }

    #[test]
    fn test_missing_blocks() {
        assert!(matches!(
            parse_document(r#"{"data": []}"#),
            Err(LoadError::MissingMetadata)
        ));
        assert!(matches!(
            parse_document(r#"{"metadata": {}}"#),
            Err(LoadError::MissingData)
        ));
        assert!(matches!(
            parse_document(r#"{"metadata": {}, "data": {}}"#),
            Err(LoadError::DataNotArray)
        ));
        assert!(matches!(
            parse_document(r#"{"metadata": {}, "data": [1]}"#),
            Err(LoadError::InvalidRecord { index: 0 })
        ));
        assert!(matches!(parse_document("not json"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_fields_fall_back_to_record_keys() {
        let dataset =
            parse_document(r#"{"metadata": {}, "data": [{"b": 1, "a": 2}]}"#).unwrap();
        assert_eq!(dataset.fields, vec!["a", "b"]);
    }

    #[test]
    fn test_numeric_field_names_accepted() {
        let dataset = parse_document(
            r#"{"metadata": {"total_records": null, "fields": ["type", 2023]},
                "data": [{"type": "A", "2023": 4}]}"#,
        )
        .unwrap();
        assert_eq!(dataset.fields, vec!["type", "2023"]);
        assert_eq!(dataset.records[0].number("2023"), Some(4.0));
    }

    #[test]
    fn test_status_error() {
        let source = StubSource(Fetched {
            status: 404,
            body: String::new(),
        });
        let err = load_dataset(&source).unwrap_err();
        assert!(matches!(err, LoadError::Status { status: 404, .. }));
    }

    #[test]
    fn test_failed_reload_keeps_prior_data() {
        let mut store = DataStore::new();
        assert!(store.reload(&StubSource(Fetched::ok(doc()))));
        assert_eq!(store.dataset().len(), 2);
        assert!(store.error().is_none());

        assert!(!store.reload(&StubSource(Fetched::ok(r#"{"data": []}"#))));
        assert_eq!(store.dataset().len(), 2);
        assert_eq!(store.error(), Some("data file has no 'metadata' object"));
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc().as_bytes()).unwrap();

        let dataset = load_dataset(&FileSource::new(file.path())).unwrap();
        assert_eq!(dataset.len(), 2);

        let missing = FileSource::new("/nonexistent/defects.json");
        assert!(matches!(
            load_dataset(&missing),
            Err(LoadError::Transport { .. })
        ));
    }
}
