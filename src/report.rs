//! Per-file synthesis reports, with cache lookups and parallel rewriting.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::PersistentCache;
use crate::emit::{EmitOptions, apply};
use crate::sources::SourceUnit;
use crate::synth::ClassPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedReport {
    classes: Vec<ClassPlan>,
    rewritten: String,
    changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: String,
    pub content_hash: String,
    pub cache_hit: bool,
    pub synthesized: usize,
    pub changed: bool,
    pub classes: Vec<ClassPlan>,
    #[serde(skip)]
    pub rewritten: String,
}

impl FileReport {
    fn from_cached(unit: &SourceUnit, cached: CachedReport, cache_hit: bool) -> Self {
        Self {
            source: unit.origin.display_name(),
            content_hash: unit.content_hash.clone(),
            cache_hit,
            synthesized: cached.classes.iter().map(ClassPlan::synthesized_count).sum(),
            changed: cached.changed,
            classes: cached.classes,
            rewritten: cached.rewritten,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub files: usize,
    pub classes: usize,
    pub synthesized: usize,
    pub cache_hits: usize,
    pub duration_ms: u64,
    pub reports: Vec<FileReport>,
}

/// Plans and rewrites every unit, serving unchanged content from `cache`.
///
/// Misses are processed in parallel; their results are written back in a
/// single transaction once all of them are done.
pub fn process_units(
    units: &[SourceUnit],
    cache: Option<&PersistentCache>,
    options: EmitOptions,
) -> Result<Vec<FileReport>> {
    let fingerprint = options.fingerprint();

    let mut cached = Vec::with_capacity(units.len());
    for unit in units {
        let hit = match cache {
            Some(cache) => lookup(cache, unit, &fingerprint)?,
            None => None,
        };
        cached.push(hit);
    }

    let resolved: Vec<(CachedReport, bool)> = units
        .par_iter()
        .zip(cached.into_par_iter())
        .map(|(unit, hit)| {
            if let Some(hit) = hit {
                return (hit, true);
            }
            let rewrite = apply(&unit.content, options);
            tracing::debug!(
                source = %unit.origin.display_name(),
                classes = rewrite.plans.len(),
                changed = rewrite.changed,
                "synthesized"
            );
            let fresh = CachedReport {
                classes: rewrite.plans,
                rewritten: rewrite.source,
                changed: rewrite.changed,
            };
            (fresh, false)
        })
        .collect();

    let mut pending = Vec::new();
    let mut reports = Vec::with_capacity(units.len());
    for (unit, (report, cache_hit)) in units.iter().zip(resolved) {
        if !cache_hit && cache.is_some() {
            let key = PersistentCache::key(&unit.content_hash, &fingerprint);
            pending.push((key, serde_json::to_string(&report)?));
        }
        reports.push(FileReport::from_cached(unit, report, cache_hit));
    }

    if let Some(cache) = cache {
        let written = cache.put_reports(&pending)?;
        tracing::debug!(written, "cached reports");
    }

    Ok(reports)
}

fn lookup(
    cache: &PersistentCache,
    unit: &SourceUnit,
    fingerprint: &str,
) -> Result<Option<CachedReport>> {
    let key = PersistentCache::key(&unit.content_hash, fingerprint);
    let Some(raw) = cache.get_report(&key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<CachedReport>(&raw) {
        Ok(report) => Ok(Some(report)),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "discarding unreadable cached report");
            Ok(None)
        }
    }
}

pub fn summarize(reports: Vec<FileReport>, duration_ms: u64) -> PlanSummary {
    PlanSummary {
        files: reports.len(),
        classes: reports.iter().map(|r| r.classes.len()).sum(),
        synthesized: reports.iter().map(|r| r.synthesized).sum(),
        cache_hits: reports.iter().filter(|r| r.cache_hit).count(),
        duration_ms,
        reports,
    }
}

pub fn write_in_place(reports: &[FileReport], units: &[SourceUnit]) -> Result<usize> {
    let mut written = 0usize;
    for (report, unit) in reports.iter().zip(units) {
        if !report.changed {
            continue;
        }
        let path = unit
            .origin
            .file_path()
            .with_context(|| format!("Cannot rewrite archive entry in place: {}", report.source))?;
        std::fs::write(path, &report.rewritten)
            .with_context(|| format!("Failed to write source: {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}
