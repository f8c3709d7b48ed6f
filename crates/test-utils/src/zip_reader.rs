use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use zip::{CompressionMethod, ZipArchive};

/// Contents of a zip archive: entry name -> bytes. Directory entries map to
/// an empty vector and keep their trailing `/`.
pub type ZipContents = BTreeMap<String, Vec<u8>>;

pub fn read_zip_file(path: &Path) -> Result<ZipContents> {
    let file = File::open(path).with_context(|| format!("opening archive {:?}", path))?;
    read_zip(file)
}

pub fn read_zip<R: Read + Seek>(reader: R) -> Result<ZipContents> {
    let mut archive = ZipArchive::new(reader)?;
    let mut contents = BTreeMap::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut bytes = Vec::new();
        if !entry.is_dir() {
            entry.read_to_end(&mut bytes)?;
        }
        contents.insert(entry.name().to_string(), bytes);
    }

    Ok(contents)
}

/// Compression method of every file (non-directory) entry.
pub fn file_compression_methods<R: Read + Seek>(reader: R) -> Result<Vec<CompressionMethod>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut methods = Vec::new();

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.is_dir() {
            methods.push(entry.compression());
        }
    }

    Ok(methods)
}

/// Top-level names of an archive: the first path component of every entry.
pub fn top_level_names(contents: &ZipContents) -> Vec<String> {
    let names: BTreeSet<String> = contents
        .keys()
        .filter_map(|k| k.split('/').next())
        .map(str::to_string)
        .collect();
    names.into_iter().collect()
}
