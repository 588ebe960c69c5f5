use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use blogvcs_diff::{EditScript, OpKind};
use blogvcs_server::{BlogServer, ServerConfig};
use blogvcs_service::{Saved, ServiceConfig, VersionControl};
use blogvcs_store::JournalVersionStore;
use blogvcs_types::{Document, DocumentId, Version, VersionId};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let store = cli.store_path();
    match cli.command {
        Command::Save(args) => cmd_save(&open_service(&store)?, args, format),
        Command::Log(args) => cmd_log(&open_service(&store)?, args, format),
        Command::Show(args) => cmd_show(&open_service(&store)?, args, format),
        Command::Diff(args) => cmd_diff(&store, args, format),
        Command::Revert(args) => cmd_revert(&open_service(&store)?, args, format),
        Command::Docs(_) => cmd_docs(&open_service(&store)?, format),
        Command::Serve(args) => cmd_serve(cli.store, args),
    }
}

fn open_service(path: &Path) -> anyhow::Result<VersionControl> {
    open_service_with(path, ServiceConfig::default())
}

fn open_service_with(path: &Path, config: ServiceConfig) -> anyhow::Result<VersionControl> {
    let store = JournalVersionStore::open(path)
        .with_context(|| format!("cannot open journal {}", path.display()))?;
    Ok(VersionControl::with_config(Arc::new(store), config))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_content(args: &SaveArgs) -> anyhow::Result<String> {
    match (&args.content, &args.file) {
        (Some(content), _) => Ok(content.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        (None, None) => bail!("either --file or --content is required"),
    }
}

fn cmd_save(vc: &VersionControl, args: SaveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = read_content(&args)?;
    let saved = match &args.doc {
        None => vc.save_version(None, &args.title, &content)?,
        Some(raw) => {
            let id = resolve_document(vc, raw)?;
            match args.expect_revision {
                Some(rev) => vc.save_version_if(&id, &args.title, &content, rev)?,
                None => vc.save_version(Some(&id), &args.title, &content)?,
            }
        }
    };
    print_saved(&saved, "Saved", format)
}

fn cmd_revert(vc: &VersionControl, args: RevertArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = resolve_document(vc, &args.doc)?;
    let version = resolve_version(vc, &args.version)?;
    let saved = vc.revert(&doc, &version)?;
    print_saved(&saved, "Reverted", format)
}

fn print_saved(saved: &Saved, verb: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "blog": saved.document,
            "version": saved.version,
        })),
        OutputFormat::Text => {
            println!(
                "{} {} {} (revision {})",
                "✓".green().bold(),
                verb,
                saved.document.title.bold(),
                saved.document.revision
            );
            println!("  Post:    {}", saved.document.id.to_string().cyan());
            println!("  Version: {}", saved.version.id.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_log(vc: &VersionControl, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = vc.get_document(&resolve_document(vc, &args.doc)?)?;
    let mut versions = vc.list_versions(&doc.id)?;
    if let Some(limit) = args.limit {
        versions.truncate(limit);
    }

    if format == OutputFormat::Json {
        return print_json(&json!({ "blog": doc, "versions": versions }));
    }
    println!("{} {}", doc.title.bold(), format!("({} versions)", doc.revision).dimmed());
    for v in &versions {
        let marker = if v.seq == doc.revision {
            format!(" ({})", "current".green())
        } else {
            String::new()
        };
        if args.oneline {
            println!(
                "{} {} {}{}",
                format!("#{}", v.seq).yellow(),
                v.id.short_id().dimmed(),
                preview(&v.content, 60),
                marker
            );
        } else {
            println!("{}  {}{}", format!("#{}", v.seq).yellow().bold(), v.id.to_string().dimmed(), marker);
            println!("  Date: {}", v.created_at.to_rfc3339());
            println!("  Size: {} bytes", v.size());
            println!("  {}", preview(&v.content, 72));
        }
    }
    Ok(())
}

fn cmd_show(vc: &VersionControl, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let version = vc.get_version(&resolve_version(vc, &args.version)?)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "version": version })),
        OutputFormat::Text => {
            println!(
                "Version {} -- Post: {}, Seq: {}, Date: {}",
                version.id.to_string().yellow().bold(),
                version.document_id.to_string().cyan(),
                version.seq,
                version.created_at.to_rfc3339()
            );
            println!();
            println!("{}", version.content);
            Ok(())
        }
    }
}

fn cmd_diff(store: &Path, args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = ServiceConfig::default();
    if let Some(granularity) = args.granularity {
        config.diff.granularity = granularity.into();
    }
    let vc = open_service_with(store, config)?;
    let a = resolve_version(&vc, &args.a)?;
    let b = resolve_version(&vc, &args.b)?;
    let comparison = vc.compare_detailed(&a, &b)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "diffHtml": comparison.markup,
            "stats": comparison.stats,
            "script": comparison.script,
        })),
        OutputFormat::Text if args.html => {
            println!("{}", comparison.markup);
            Ok(())
        }
        OutputFormat::Text => {
            println!("{}", colorize_script(&comparison.script));
            let stats = comparison.stats;
            println!(
                "{} inserted, {} deleted, distance {}",
                format!("+{}", stats.inserted_chars).green(),
                format!("-{}", stats.deleted_chars).red(),
                stats.edit_distance
            );
            Ok(())
        }
    }
}

fn cmd_docs(vc: &VersionControl, format: OutputFormat) -> anyhow::Result<()> {
    let docs = vc.list_documents()?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "posts": docs }));
    }
    if docs.is_empty() {
        println!("No posts.");
    }
    for doc in &docs {
        println!(
            "{} {} {}",
            doc.id.short_id().cyan(),
            doc.title.bold(),
            format!("r{} {}", doc.revision, doc.updated_at.to_rfc3339()).dimmed()
        );
    }
    Ok(())
}

fn cmd_serve(store: Option<std::path::PathBuf>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(store) = store {
        config.store_path = store;
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    println!(
        "blogvcs server on {} (journal: {})",
        config.bind_addr.to_string().bold(),
        config.store_path.display()
    );
    let server = BlogServer::open(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Render a script for the terminal: deletions red and struck through,
/// insertions green and underlined.
fn colorize_script(script: &EditScript) -> String {
    script
        .iter()
        .map(|op| match op.kind {
            OpKind::Equal => op.text.normal().to_string(),
            OpKind::Insert => op.text.green().underline().to_string(),
            OpKind::Delete => op.text.red().strikethrough().to_string(),
        })
        .collect()
}

fn preview(content: &str, width: usize) -> String {
    let flat: String = content
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= width {
        return flat;
    }
    let cut: String = flat.chars().take(width.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Resolve a full document id or a unique prefix of one.
fn resolve_document(vc: &VersionControl, raw: &str) -> anyhow::Result<DocumentId> {
    if let Ok(id) = raw.parse() {
        return Ok(id);
    }
    let docs = vc.list_documents()?;
    unique_match(raw, "post", docs.iter().map(|d: &Document| d.id))
}

/// Resolve a full version id or a unique prefix of one.
fn resolve_version(vc: &VersionControl, raw: &str) -> anyhow::Result<VersionId> {
    if let Ok(id) = raw.parse() {
        return Ok(id);
    }
    let mut all: Vec<Version> = Vec::new();
    for doc in vc.list_documents()? {
        all.extend(vc.list_versions(&doc.id)?);
    }
    unique_match(raw, "version", all.iter().map(|v| v.id))
}

fn unique_match<T: ToString>(
    prefix: &str,
    kind: &str,
    candidates: impl Iterator<Item = T>,
) -> anyhow::Result<T> {
    let prefix = prefix.trim().to_ascii_lowercase();
    if prefix.len() < 4 {
        bail!("{kind} id {prefix:?} is too short; give at least 4 characters");
    }
    let mut found: Vec<T> = candidates
        .filter(|c| c.to_string().starts_with(&prefix))
        .collect();
    match found.len() {
        0 => bail!("no {kind} matches {prefix:?}"),
        1 => Ok(found.remove(0)),
        n => bail!("{kind} id {prefix:?} is ambiguous ({n} matches)"),
    }
}
