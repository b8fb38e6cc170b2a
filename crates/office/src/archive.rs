//! In-memory access to OOXML zip packages.

use concierge_core::{AppError, AppResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// One member of a zip package.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub data: Vec<u8>,
}

/// Every entry of a package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    pub fn open(path: &Path) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::Document(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            AppError::Document(format!("{} is not a zip package: {}", path.display(), e))
        })?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| AppError::Document(format!("Failed to read zip entry: {}", e)))?;

            let mut data = Vec::new();
            if !entry.is_dir() {
                entry.read_to_end(&mut data).map_err(|e| {
                    AppError::Document(format!("Failed to read {}: {}", entry.name(), e))
                })?;
            }

            entries.push(Entry {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
                data,
            });
        }

        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Read a member as UTF-8 text.
    pub fn read_text(&self, name: &str) -> AppResult<Option<String>> {
        match self.entries.iter().find(|e| e.name == name) {
            Some(entry) => String::from_utf8(entry.data.clone())
                .map(Some)
                .map_err(|e| AppError::Document(format!("{} is not UTF-8: {}", name, e))),
            None => Ok(None),
        }
    }

    /// Replace (or add) a file member.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                is_dir: false,
                data,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path).map_err(|e| {
            AppError::Document(format!("Failed to create {}: {}", path.display(), e))
        })?;
        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            if entry.is_dir {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(|e| AppError::Document(format!("Failed to write directory: {}", e)))?;
                continue;
            }

            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| AppError::Document(format!("Failed to start {}: {}", entry.name, e)))?;
            writer.write_all(&entry.data)?;
        }

        writer
            .finish()
            .map_err(|e| AppError::Document(format!("Failed to finalize archive: {}", e)))?;

        Ok(())
    }
}
