use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode json for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes `<file>.tmp` next to `path`, then renames it over `path`. A crash mid-write leaves
/// the previous file intact.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), PersistError> {
    write_bytes_atomic(path, text.as_bytes()).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PersistError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_text_atomic(path, &text)
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    if let Err(error) = write_synced(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    // Rename replaces the target in one step, so readers see either the old or the new file.
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("data");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories_and_writes() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("data.json");

        write_text_atomic(&path, "{}").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
    }

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        fs::write(&path, "old").expect("seed");

        write_text_atomic(&path, "new").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn json_is_pretty_printed() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("values.json");

        write_json_atomic(&path, &vec![1, 2]).expect("write");

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains('\n'));
        let decoded: Vec<i32> = serde_json::from_str(&text).expect("parse");
        assert_eq!(decoded, vec![1, 2]);
    }

    #[test]
    fn target_stays_readable_while_being_replaced() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("traindata.json");
        fs::write(&path, "seed").expect("seed");

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let done = Arc::clone(&done);
            let path = path.clone();
            thread::spawn(move || {
                let mut missing = 0usize;
                while !done.load(Ordering::Relaxed) {
                    if let Err(error) = fs::read_to_string(&path) {
                        if error.kind() == io::ErrorKind::NotFound {
                            missing += 1;
                        }
                    }
                }
                missing
            })
        };

        for round in 0..2_000 {
            write_text_atomic(&path, &format!("round {round}")).expect("write");
        }
        done.store(true, Ordering::Relaxed);

        let missing = reader.join().expect("reader thread");
        assert_eq!(missing, 0, "target was missing {missing} times");
        assert_eq!(fs::read_to_string(&path).expect("read"), "round 1999");
    }
}
