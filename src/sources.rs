//! Loading Java compilation units from files, directories and
//! `-sources.jar` archives.

use anyhow::{Context, Result, bail};
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::scan::{is_java_source, is_sources_jar, scan_java_sources};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    File(PathBuf),
    JarEntry { jar: PathBuf, entry: String },
}

impl SourceOrigin {
    pub fn display_name(&self) -> String {
        match self {
            SourceOrigin::File(p) => p.to_string_lossy().to_string(),
            SourceOrigin::JarEntry { jar, entry } => format!("{}!/{entry}", jar.display()),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            SourceOrigin::File(p) => Some(p),
            SourceOrigin::JarEntry { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub origin: SourceOrigin,
    pub content: String,
    pub content_hash: String,
}

impl SourceUnit {
    pub fn new(origin: SourceOrigin, content: String) -> Self {
        let content = content.replace("\r\n", "\n");
        let content_hash = hash_content(&content);
        Self {
            origin,
            content,
            content_hash,
        }
    }
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Resolves `path` to the compilation units it names.
pub fn load_sources(path: &Path) -> Result<Vec<SourceUnit>> {
    if path.is_dir() {
        return scan_java_sources(path)?
            .into_iter()
            .map(|p| read_source_file(&p))
            .collect();
    }
    if is_sources_jar(path) {
        return read_sources_jar(path);
    }
    if is_java_source(path) {
        return Ok(vec![read_source_file(path)?]);
    }
    if !path.exists() {
        bail!("No such file or directory: {}", path.display());
    }
    bail!(
        "Unsupported input (expected .java, directory or sources jar): {}",
        path.display()
    )
}

pub fn read_source_file(path: &Path) -> Result<SourceUnit> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source: {}", path.display()))?;
    Ok(SourceUnit::new(SourceOrigin::File(path.to_path_buf()), content))
}

pub fn read_sources_jar(jar_path: &Path) -> Result<Vec<SourceUnit>> {
    let file = File::open(jar_path)
        .with_context(|| format!("Failed to open jar: {}", jar_path.display()))?;
    // SAFETY: The file is opened read-only and remains valid for the lifetime of the mmap.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", jar_path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip structure: {}", jar_path.display()))?;

    let mut units = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if entry.is_dir() || !is_java_source(Path::new(&name)) {
            continue;
        }
        let mut content = String::new();
        if let Err(err) = entry.read_to_string(&mut content) {
            tracing::warn!(entry = %name, error = %err, "skipping unreadable jar entry");
            continue;
        }
        units.push(SourceUnit::new(
            SourceOrigin::JarEntry {
                jar: jar_path.to_path_buf(),
                entry: name,
            },
            content,
        ));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};
    use zip::write::FileOptions;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "bean_synth_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, content) in entries {
            zip.start_file(*name, options)?;
            zip.write_all(content)?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn read_sources_jar_returns_java_entries_only() -> Result<()> {
        let jar = temp_path("models-sources.jar");
        write_jar(
            &jar,
            &[
                ("models/Item.java", b"package models;\npublic class Item { public int qty; }\n"),
                ("models/package-info.java", b"package models;\n"),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
            ],
        )?;

        let units = load_sources(&jar)?;
        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].origin,
            SourceOrigin::JarEntry {
                jar: jar.clone(),
                entry: "models/Item.java".to_string(),
            }
        );
        assert!(units[0].origin.file_path().is_none());
        assert!(units[0].content.contains("public int qty"));
        std::fs::remove_file(jar)?;
        Ok(())
    }

    #[test]
    fn source_unit_normalizes_line_endings_before_hashing() {
        let a = SourceUnit::new(SourceOrigin::File("A.java".into()), "class A {}\r\n".into());
        let b = SourceUnit::new(SourceOrigin::File("A.java".into()), "class A {}\n".into());
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn load_sources_rejects_unsupported_input() {
        let path = temp_path("notes.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(load_sources(&path).is_err());
        assert!(load_sources(&temp_path("missing.java")).is_err());
        let _ = std::fs::remove_file(path);
    }
}
