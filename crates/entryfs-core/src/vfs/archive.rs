//! Zip packing and unpacking through entries.
//!
//! Both directions go through the entry contracts only, so the folder and
//! the archive file may live on any backend. Archive entry names are
//! relative to the packed folder; every subfolder gets a `name/` directory
//! entry so empty folders survive a round trip.

use std::io::{Cursor, Read, Write};
use std::path::Component;

use log::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::file::FileEntry;
use super::folder::FolderEntry;
use super::metadata::Metadata;
use super::path::VfsPath;
use crate::config::Compression;
use crate::error::{Error, Result};

fn method(compression: Compression) -> CompressionMethod {
    match compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    }
}

struct Packer<'a> {
    root: &'a FolderEntry,
    archive: String,
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl Packer<'_> {
    fn zip_error(&self, source: zip::result::ZipError) -> Error {
        Error::Archive {
            path: self.archive.clone(),
            source,
        }
    }

    /// Archive name of `path` relative to the packed folder.
    fn relative<'p>(&self, path: &'p VfsPath) -> Result<&'p str> {
        path.strip_root(self.root.path()).ok_or_else(|| Error::Path {
            path: path.to_string(),
            reason: "lies outside the folder being archived",
        })
    }

    fn add_folder(&mut self, folder: &FolderEntry) -> Result<()> {
        for mut file in folder.files()? {
            let name = self.relative(file.path())?.to_string();
            self.writer
                .start_file(name, self.options)
                .map_err(|e| self.zip_error(e))?;
            let data = file.read(false)?;
            self.writer
                .write_all(data)
                .map_err(Error::io_with("zip", &self.archive))?;
            self.entries += 1;
        }

        for sub in folder.folders()? {
            let name = self.relative(sub.path())?.to_string();
            self.writer
                .add_directory(name, self.options)
                .map_err(|e| self.zip_error(e))?;
            self.entries += 1;
            self.add_folder(&sub)?;
        }
        Ok(())
    }
}

/// Pack the contents of `folder` into `target`, replacing its content.
///
/// Returns the number of archive entries written.
pub fn folder_to_zip(
    folder: &FolderEntry,
    target: &mut FileEntry,
    compression: Compression,
) -> Result<usize> {
    let mut packer = Packer {
        root: folder,
        archive: target.path().to_string(),
        writer: ZipWriter::new(Cursor::new(Vec::new())),
        options: SimpleFileOptions::default().compression_method(method(compression)),
        entries: 0,
    };
    packer.add_folder(folder)?;

    let Packer {
        writer,
        entries,
        archive,
        ..
    } = packer;
    let bytes = writer
        .finish()
        .map_err(|source| Error::Archive {
            path: archive.clone(),
            source,
        })?
        .into_inner();
    target.write(&bytes)?;
    info!(
        "wrote archive {} from {} ({} entries, {} bytes)",
        archive,
        folder.path(),
        entries,
        bytes.len()
    );
    Ok(entries)
}

/// Walk `segments` below `root`, creating missing folders.
fn ensure_folder(root: &FolderEntry, segments: &[String]) -> Result<FolderEntry> {
    let mut current = root.get_clone();
    for segment in segments {
        let mut next = current.folder(segment)?;
        if !next.exists()? {
            next.create()?;
        }
        current = next;
    }
    Ok(current)
}

/// Unpack `archive` into `destination`, which must exist.
///
/// Existing files are overwritten. Entries whose names would land outside
/// `destination` are rejected with [`Error::Path`]. Returns the number of
/// files written.
pub fn extract_zip(archive: &mut FileEntry, destination: &FolderEntry) -> Result<usize> {
    let archive_path = archive.path().to_string();
    let zip_error = |source| Error::Archive {
        path: archive_path.clone(),
        source,
    };

    let bytes = archive.read(false)?.to_vec();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;
    let mut files = 0;

    for index in 0..zip.len() {
        let mut item = zip.by_index(index).map_err(zip_error)?;
        let raw_name = item.name().to_string();
        let enclosed = item
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| Error::Path {
                path: raw_name.clone(),
                reason: "escapes the extraction folder",
            })?;

        let mut segments = Vec::new();
        for component in enclosed.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(Error::Path {
                        path: raw_name,
                        reason: "escapes the extraction folder",
                    });
                }
            }
        }

        if item.is_dir() {
            ensure_folder(destination, &segments)?;
            continue;
        }
        let Some((name, parents)) = segments.split_last() else {
            continue;
        };

        let mut data = Vec::new();
        item.read_to_end(&mut data)
            .map_err(Error::io_with("unzip", &raw_name))?;
        let mut file = ensure_folder(destination, parents)?.file(name)?;
        file.write(&data)?;
        files += 1;
    }

    info!(
        "extracted {} file(s) from {} into {}",
        files,
        archive_path,
        destination.path()
    );
    Ok(files)
}
