use crate::builder::ChapterFile;
use crate::chapters::ChapterUnit;
use crate::error::EngineError;
use crate::models::Document;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid chapter directory: {0}")]
    InvalidChapterDir(String),
    #[error("Invalid chapter file name: {0:?}")]
    InvalidFileName(String),
    #[error("Invalid backup file {path}: {source}")]
    InvalidBackup {
        path: PathBuf,
        source: EngineError,
    },
}

/// Read and parse a backup document
pub fn load_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(IoError::Io)?;
    Document::from_bytes(&bytes).map_err(|source| IoError::InvalidBackup {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a backup document as pretty-printed JSON
pub fn save_document(path: &Path, document: &Document) -> Result<(), IoError> {
    let json = document
        .to_json_pretty()
        .map_err(|source| IoError::InvalidBackup {
            path: path.to_path_buf(),
            source,
        })?;
    write_file(path, &json)
}

/// Write content to a file, creating parent directories as needed
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

/// Read every `.txt` file directly inside `dir`
///
/// Files come back in directory order; the builder sorts them by name.
pub fn read_chapter_files(dir: &Path) -> Result<Vec<ChapterFile>, IoError> {
    validate_chapter_dir(dir)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(IoError::Io)? {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_file()
            && let Some(ext) = path.extension()
            && ext.eq_ignore_ascii_case("txt")
        {
            let text = fs::read_to_string(&path).map_err(IoError::Io)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(ChapterFile { name, text });
        }
    }

    log::debug!("read {} chapter file(s) from {}", files.len(), dir.display());
    Ok(files)
}

/// Write each unit to `dir/<unit name>`, returning the written paths
///
/// Unit names must be plain file names. Nothing is written if any name
/// would land outside `dir`.
pub fn write_chapter_units(dir: &Path, units: &[ChapterUnit]) -> Result<Vec<PathBuf>, IoError> {
    if let Some(unit) = units.iter().find(|unit| !is_plain_file_name(&unit.name)) {
        return Err(IoError::InvalidFileName(unit.name.clone()));
    }
    fs::create_dir_all(dir).map_err(IoError::Io)?;

    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(&unit.name);
        fs::write(&path, &unit.content).map_err(IoError::Io)?;
        written.push(path);
    }
    Ok(written)
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}

pub fn validate_chapter_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidChapterDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
