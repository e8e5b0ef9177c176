use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::emit::EmitOptions;

pub const DB_ENV_VAR: &str = "BEAN_SYNTH_DB";

pub fn resolve_db_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.db.clone() {
        return Ok(p);
    }

    if let Some(p) = env::var_os(DB_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(p));
    }

    Ok(bean_synth_home()?.join("db.lmdb"))
}

pub fn emit_options(cli: &Cli) -> EmitOptions {
    EmitOptions {
        indent_width: cli.indent,
    }
}

pub fn clear_db(db_path: &Path) -> Result<()> {
    remove_file_if_exists(db_path, "db")?;
    remove_file_if_exists(&lmdb_lock_path(db_path), "db lock")?;
    Ok(())
}

fn bean_synth_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("bean-synth"))
}

fn lmdb_lock_path(db_path: &Path) -> PathBuf {
    let mut os = db_path.as_os_str().to_os_string();
    os.push("-lock");
    PathBuf::from(os)
}

fn remove_file_if_exists(path: &Path, kind: &str) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {kind} file: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn db_flag_takes_precedence() {
        let cli = Cli::parse_from(["bean-synth", "--db", "/tmp/x.lmdb", "stats"]);
        assert_eq!(resolve_db_path(&cli).unwrap(), PathBuf::from("/tmp/x.lmdb"));
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lmdb_lock_path(Path::new("/tmp/db.lmdb")),
            PathBuf::from("/tmp/db.lmdb-lock")
        );
    }

    #[test]
    fn emit_options_follow_indent_flag() {
        let cli = Cli::parse_from(["bean-synth", "--indent", "2", "stats"]);
        assert_eq!(emit_options(&cli).indent_width, 2);
    }
}
