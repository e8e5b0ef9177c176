use anyhow::{Context, Result, bail};
use bean_synth::cache::PersistentCache;
use bean_synth::cli::{Cli, Commands, OutputFormat};
use bean_synth::config::{clear_db, emit_options, resolve_db_path};
use bean_synth::model::AccessorOrigin;
use bean_synth::report::{PlanSummary, process_units, summarize, write_in_place};
use bean_synth::scan::is_sources_jar;
use bean_synth::sources::load_sources;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let cli = parse_cli();

    match cli.command.clone() {
        Commands::Clear => {
            let db_path = resolve_db_path(&cli)?;
            clear_db(&db_path)?;
        }
        Commands::Stats => {
            let db_path = resolve_db_path(&cli)?;
            let cache = PersistentCache::open(db_path)?;
            let stats = cache.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Plan { path, format } => {
            let cache = open_cache(&cli)?;
            let summary = plan(&cli, cache.as_ref(), &path)?;
            write_plan_output(&summary, format)?;
        }
        Commands::Apply {
            path,
            write,
            output,
        } => {
            let cache = open_cache(&cli)?;
            apply_sources(&cli, cache.as_ref(), &path, write, output.as_deref())?;
        }
    }

    Ok(())
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_plan(args))
}

/// `bean-synth Foo.java` is shorthand for `bean-synth plan Foo.java`.
fn rewrite_args_for_implicit_plan(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["plan", "apply", "stats", "clear", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--db" || a == "--indent" {
            idx += 2;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "plan".to_string());
        }
    }

    args
}

fn open_cache(cli: &Cli) -> Result<Option<PersistentCache>> {
    if cli.no_cache {
        return Ok(None);
    }
    let db_path = resolve_db_path(cli)?;
    Ok(Some(PersistentCache::open(db_path)?))
}

fn plan(cli: &Cli, cache: Option<&PersistentCache>, path: &Path) -> Result<PlanSummary> {
    let start = Instant::now();
    let units = load_sources(path)?;
    tracing::info!(path = %path.display(), units = units.len(), "loaded sources");
    let reports = process_units(&units, cache, emit_options(cli))?;
    Ok(summarize(reports, start.elapsed().as_millis() as u64))
}

fn write_plan_output(summary: &PlanSummary, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary)?,
        OutputFormat::Text => render_text(summary),
    };
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn render_text(summary: &PlanSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("files: {}\n", summary.files));
    out.push_str(&format!("classes: {}\n", summary.classes));
    out.push_str(&format!("synthesized: {}\n", summary.synthesized));
    out.push_str(&format!("cache_hits: {}\n", summary.cache_hits));
    for report in &summary.reports {
        out.push_str(&format!("{}\n", report.source));
        for class in &report.classes {
            out.push_str(&format!("  {}\n", class.class_name));
            for pair in &class.accessors {
                out.push_str(&format!(
                    "    {}: {} [{}], {} [{}]\n",
                    pair.property(),
                    pair.getter_name,
                    origin_label(pair.getter),
                    pair.setter_name,
                    origin_label(pair.setter),
                ));
            }
        }
    }
    out
}

fn origin_label(origin: AccessorOrigin) -> &'static str {
    match origin {
        AccessorOrigin::Synthesized => "synthesized",
        AccessorOrigin::UserDefined => "user-defined",
    }
}

#[derive(Debug, Serialize)]
struct ApplyResult {
    files: usize,
    rewritten: usize,
    synthesized: usize,
    duration_ms: u64,
}

fn apply_sources(
    cli: &Cli,
    cache: Option<&PersistentCache>,
    path: &Path,
    write: bool,
    output: Option<&Path>,
) -> Result<()> {
    if write && is_sources_jar(path) {
        bail!("--write cannot rewrite a jar: {}", path.display());
    }

    let start = Instant::now();
    let units = load_sources(path)?;
    let reports = process_units(&units, cache, emit_options(cli))?;

    if write {
        let rewritten = write_in_place(&reports, &units)?;
        let result = ApplyResult {
            files: reports.len(),
            rewritten,
            synthesized: reports.iter().map(|r| r.synthesized).sum(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let [report] = reports.as_slice() else {
        bail!(
            "{} contains {} sources; use --write to rewrite them in place",
            path.display(),
            reports.len()
        );
    };

    if let Some(out_path) = output {
        if let Some(parent) = out_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(out_path, &report.rewritten)
            .with_context(|| format!("Failed to write output: {}", out_path.display()))?;
    } else {
        print!("{}", report.rewritten);
        if !report.rewritten.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
