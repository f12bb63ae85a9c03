//! Where an import reads its workbook from

use crate::error::{SheetError, SheetResult};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Workbook input: a file on disk or bytes received from a client upload
#[derive(Debug, Clone)]
pub enum ImportSource {
    Path(PathBuf),
    Upload { file_name: String, bytes: Vec<u8> },
}

impl ImportSource {
    pub fn upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImportSource::Upload {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Name used for the extension check and in messages
    pub fn name(&self) -> String {
        match self {
            ImportSource::Path(path) => path.display().to_string(),
            ImportSource::Upload { file_name, .. } => file_name.clone(),
        }
    }

    /// File extension without the dot, as written
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            ImportSource::Path(path) => path.as_path(),
            ImportSource::Upload { file_name, .. } => Path::new(file_name),
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_string())
    }

    pub fn is_unset(&self) -> bool {
        match self {
            ImportSource::Path(path) => path.as_os_str().is_empty(),
            ImportSource::Upload { file_name, .. } => file_name.is_empty(),
        }
    }

    /// Uploads always exist; paths must point at a regular file
    pub fn exists(&self) -> bool {
        match self {
            ImportSource::Path(path) => path.is_file(),
            ImportSource::Upload { .. } => true,
        }
    }

    /// Open a readable, seekable stream over the workbook bytes
    pub fn open(&self) -> SheetResult<SourceReader> {
        match self {
            ImportSource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    SheetError::Load(format!("cannot open {}: {}", path.display(), e))
                })?;
                Ok(SourceReader::File(BufReader::new(file)))
            }
            ImportSource::Upload { bytes, .. } => {
                Ok(SourceReader::Memory(Cursor::new(bytes.clone())))
            }
        }
    }
}

impl From<PathBuf> for ImportSource {
    fn from(path: PathBuf) -> Self {
        ImportSource::Path(path)
    }
}

impl From<&Path> for ImportSource {
    fn from(path: &Path) -> Self {
        ImportSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ImportSource {
    fn from(path: &str) -> Self {
        ImportSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ImportSource {
    fn from(path: String) -> Self {
        ImportSource::Path(PathBuf::from(path))
    }
}

/// Byte stream handed to the workbook reader
pub enum SourceReader {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceReader::File(r) => r.read(buf),
            SourceReader::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceReader::File(r) => r.seek(pos),
            SourceReader::Memory(r) => r.seek(pos),
        }
    }
}
