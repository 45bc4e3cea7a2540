//! JSON file helpers shared by every store component.

use crate::core::{BenchError, IoOp, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// How store files are replaced on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Write a sibling temporary file, then rename it over the target
    #[default]
    Atomic,
    /// Overwrite the target in place
    Direct,
}

/// Reads and decodes a JSON file.
///
/// A missing file, or one holding the literal `null`, yields `T::default()`.
/// Any other decode failure is an error: corrupt history is never dropped.
pub fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet, using empty value", path.display());
            return Ok(T::default());
        },
        Err(e) => return Err(BenchError::io(IoOp::Read, path, e)),
    };

    let value: Option<T> =
        serde_json::from_slice(&bytes).map_err(|e| BenchError::decode(path, e))?;
    Ok(value.unwrap_or_default())
}

/// Encodes `value` as indented JSON and writes it to `path`.
pub fn write_json<T>(path: &Path, value: &T, mode: WriteMode) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value)?;

    match mode {
        WriteMode::Direct => {
            fs::write(path, &bytes).map_err(|e| BenchError::io(IoOp::Write, path, e))?;
        },
        WriteMode::Atomic => {
            let tmp = temp_path(path);
            if let Err(e) = fs::write(&tmp, &bytes) {
                let _ = fs::remove_file(&tmp);
                return Err(BenchError::io(IoOp::Write, tmp, e));
            }
            if let Err(e) = fs::rename(&tmp, path) {
                let _ = fs::remove_file(&tmp);
                return Err(BenchError::io(IoOp::Rename, path, e));
            }
        },
    }

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Creates `dir` and all of its parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| BenchError::io(IoOp::CreateDir, dir, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}
