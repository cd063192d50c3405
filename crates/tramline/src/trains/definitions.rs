use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::persist::{write_json_atomic, PersistError};
use engine::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TrainType;

/// One persisted train. `train_name` is the texture identifier, not the unique object name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrainRecord {
    pub(crate) name: String,
    pub(crate) train_name: String,
    #[serde(default)]
    pub(crate) train_type: TrainType,
    #[serde(default)]
    pub(crate) path: Vec<Vec2>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TrainDocument {
    #[serde(default)]
    pub(crate) trains: Vec<TrainRecord>,
}

impl TrainDocument {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.trains.iter().any(|record| record.name == name)
    }
}

#[derive(Debug, Error)]
pub(crate) enum DefinitionsError {
    #[error("failed to read train definitions {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse train definitions {path}{location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Write(#[from] PersistError),
}

/// `Ok(None)` when the file does not exist yet.
pub(crate) fn read_document(path: &Path) -> Result<Option<TrainDocument>, DefinitionsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DefinitionsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_document(path, &raw).map(Some)
}

/// A top-level JSON `null` reads as an empty document.
pub(crate) fn parse_document(path: &Path, raw: &str) -> Result<TrainDocument, DefinitionsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let document = match serde_path_to_error::deserialize::<_, Option<TrainDocument>>(
        &mut deserializer,
    ) {
        Ok(document) => document,
        Err(error) => {
            let json_path = error.path().to_string();
            let location = if json_path.is_empty() || json_path == "." {
                String::new()
            } else {
                format!(" at {json_path}")
            };
            return Err(DefinitionsError::Parse {
                path: path.to_path_buf(),
                location,
                source: error.into_inner(),
            });
        }
    };
    deserializer
        .end()
        .map_err(|source| DefinitionsError::Parse {
            path: path.to_path_buf(),
            location: String::new(),
            source,
        })?;
    Ok(document.unwrap_or_default())
}

pub(crate) fn write_document(path: &Path, document: &TrainDocument) -> Result<(), DefinitionsError> {
    write_json_atomic(path, document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_record(name: &str) -> TrainRecord {
        TrainRecord {
            name: name.to_string(),
            train_name: "greytrain".to_string(),
            train_type: TrainType::Freight,
            path: vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)],
        }
    }

    #[test]
    fn parses_camel_case_records() {
        let raw = json!({
            "trains": [{
                "name": "line-1",
                "trainName": "redtrain",
                "trainType": "commuter",
                "path": [[0.0, 0.0], [10.0, 20.0]]
            }]
        })
        .to_string();

        let document = parse_document(Path::new("traindata.json"), &raw).expect("parse");

        assert_eq!(document.trains.len(), 1);
        let record = &document.trains[0];
        assert_eq!(record.train_name, "redtrain");
        assert_eq!(record.train_type, TrainType::Commuter);
        assert_eq!(record.path[1], Vec2::new(10.0, 20.0));
    }

    #[test]
    fn null_and_empty_object_are_empty_documents() {
        let path = Path::new("traindata.json");
        assert_eq!(
            parse_document(path, "null").expect("null"),
            TrainDocument::default()
        );
        assert_eq!(
            parse_document(path, "{}").expect("object"),
            TrainDocument::default()
        );
    }

    #[test]
    fn missing_train_type_reads_as_undefined() {
        let raw = r#"{"trains":[{"name":"a","trainName":"b","path":[]}]}"#;
        let document = parse_document(Path::new("x.json"), raw).expect("parse");
        assert_eq!(document.trains[0].train_type, TrainType::Undefined);
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{"trains":[{"name":"a","trainName":"b","path":[[1.0]]}]}"#;

        let error = parse_document(Path::new("traindata.json"), raw).expect_err("should fail");

        let message = error.to_string();
        assert!(message.contains("traindata.json"), "{message}");
        assert!(message.contains("trains[0].path[0]"), "{message}");
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let result = parse_document(Path::new("x.json"), "{} {}");
        assert!(matches!(result, Err(DefinitionsError::Parse { .. })));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().expect("temp dir");
        let result = read_document(&dir.path().join("absent.json")).expect("read");
        assert!(result.is_none());
    }

    #[test]
    fn written_document_reads_back_identically() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("gamedata").join("traindata.json");
        let document = TrainDocument {
            trains: vec![sample_record("a"), sample_record("b")],
        };

        write_document(&path, &document).expect("write");
        let back = read_document(&path).expect("read").expect("present");

        assert_eq!(back, document);
        assert!(!path.with_file_name("traindata.json.tmp").exists());
    }
}
