use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

pub fn is_java_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "java")
        && !path
            .file_name()
            .is_some_and(|n| n == "package-info.java" || n == "module-info.java")
}

pub fn is_sources_jar(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "jar")
}

/// Collects `.java` files under `base_path`, honouring `.gitignore`.
pub fn scan_java_sources(base_path: &Path) -> Result<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if entry.file_type().is_some_and(|t| t.is_file()) && is_java_source(path) {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.iter().collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn scan_finds_java_sources_sorted() {
        let base = temp_dir("bean-synth-scan");
        let pkg = base.join("app/models");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("User.java"), "class User {}").unwrap();
        fs::write(pkg.join("Item.java"), "class Item {}").unwrap();
        fs::write(pkg.join("package-info.java"), "package app.models;").unwrap();
        fs::write(pkg.join("notes.txt"), "x").unwrap();

        let files = scan_java_sources(&base).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Item.java", "User.java"]);

        let _ = fs::remove_dir_all(base);
    }
}
