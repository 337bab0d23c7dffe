use anyhow::{Context, Result, bail};
use novelist_config::{Config, ExportConfig};
use novelist_engine::chapters::{ExportMode, ExportOptions, chapter_texts, extract_chapter_units};
use novelist_engine::xhtml::{
    sanitize_file_stem, text_to_xhtml as render_xhtml, xhtml_to_text as extract_text,
};
use novelist_engine::{
    BuildOptions, Document, FindSession, SceneParseWarning, SearchQuery, builder, io,
};
use std::path::{Path, PathBuf};

pub fn build_options(
    config: &Config,
    code: Option<String>,
    no_toc: bool,
    no_indent: bool,
) -> BuildOptions {
    BuildOptions {
        code,
        show_table_of_contents: config.create.show_table_of_contents && !no_toc,
        apply_automatic_indentation: config.create.apply_automatic_indentation && !no_indent,
    }
}

/// Flags win over configured values. Giving a group size implies grouping.
pub fn export_options(
    export: &ExportConfig,
    pattern: Option<String>,
    start: Option<u32>,
    offset: Option<usize>,
    group_size: Option<usize>,
    grouped: bool,
) -> ExportOptions {
    let mode = if grouped || group_size.is_some() {
        ExportMode::Grouped {
            group_size: group_size.unwrap_or(export.group_size).max(1),
        }
    } else {
        ExportMode::Single
    };
    let pattern = pattern
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| export.pattern.clone());

    ExportOptions {
        prefix: pattern,
        start_number: start.unwrap_or(export.start_number),
        offset: offset.unwrap_or(export.offset),
        mode,
    }
}

/// `output`, or `<title>.json` in the configured output directory.
fn backup_path(config: &Config, title: &str, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| {
        let file_name = format!("{}.json", sanitize_file_stem(title));
        match &config.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    })
}

fn report(warnings: &[SceneParseWarning]) {
    for warning in warnings {
        log::warn!("{warning}");
    }
}

fn save(path: &Path, document: &Document) -> Result<()> {
    io::save_document(path, document)
        .with_context(|| format!("Failed to save backup to {}", path.display()))?;
    log::info!(
        "Wrote {:?} ({} chapters) to {}",
        document.title,
        document.scenes().len(),
        path.display()
    );
    Ok(())
}

pub fn create(
    config: &Config,
    title: &str,
    description: &str,
    chapters: usize,
    prefix: &str,
    options: &BuildOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let document = builder::build(title, description, chapters, prefix, options)?;
    save(&backup_path(config, title, output), &document)
}

pub fn from_chapters(
    config: &Config,
    dir: &Path,
    title: &str,
    description: &str,
    options: &BuildOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let files = io::read_chapter_files(dir)?;
    let document = builder::build_from_chapters(title, description, files, options)?;
    save(&backup_path(config, title, output), &document)
}

pub fn extend(backup: &Path, chapters: usize, prefix: &str, output: Option<PathBuf>) -> Result<()> {
    let mut document = io::load_document(backup)?;
    builder::extend(&mut document, chapters, prefix)?;
    save(output.as_deref().unwrap_or(backup), &document)
}

pub fn merge(
    config: &Config,
    backups: &[PathBuf],
    title: &str,
    description: &str,
    prefix: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut documents = Vec::with_capacity(backups.len());
    for path in backups {
        match io::load_document(path) {
            Ok(document) => documents.push(document),
            Err(e) => log::warn!("Skipping {} in merge: {e}", path.display()),
        }
    }
    if documents.is_empty() {
        bail!("None of the given backups could be read");
    }

    let merged = builder::merge(&documents, title, description, prefix)?;
    save(&backup_path(config, title, output), &merged)
}

pub fn find(backup: &Path, pattern: &str, regex: bool, backward: bool) -> Result<()> {
    let document = io::load_document(backup)?;
    let query = SearchQuery::new(pattern, regex);
    let mut session = FindSession::new();

    let mut count = 0;
    loop {
        let outcome = if backward {
            session.find_previous(&document, &query)?
        } else {
            session.find_next(&document, &query)?
        };
        report(&outcome.warnings);
        let Some(found) = outcome.found else {
            break;
        };
        count += 1;
        println!(
            "{}:{}:{}: {}",
            found.chapter_title, found.block_index, found.start, found.line_text
        );
    }

    log::info!("{count} match(es) for {pattern:?}");
    Ok(())
}

pub fn replace(
    backup: &Path,
    pattern: &str,
    replacement: &str,
    regex: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut document = io::load_document(backup)?;
    let query = SearchQuery::new(pattern, regex);

    let outcome = FindSession::new().replace_all(&mut document, &query, replacement)?;
    report(&outcome.warnings);
    log::info!("Replaced {} occurrence(s)", outcome.replacements);

    save(output.as_deref().unwrap_or(backup), &document)
}

pub fn split(backup: &Path, output: &Path, options: &ExportOptions) -> Result<()> {
    let document = io::load_document(backup)?;
    let (texts, warnings) = chapter_texts(&document);
    report(&warnings);

    let units = extract_chapter_units(&texts, options)?;
    let written = io::write_chapter_units(output, &units)?;
    log::info!(
        "Wrote {} file(s) covering {} chapter(s), skipped {}",
        written.len(),
        texts.len().saturating_sub(options.offset),
        options.offset
    );
    Ok(())
}

pub fn xhtml_to_text(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let html = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let text = extract_text(&html);
    if text.is_empty() {
        log::warn!("No text content extracted from {}", input.display());
    }
    write_or_print(&text, output)
}

pub fn text_to_xhtml(input: &Path, title: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let title = title.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    write_or_print(&render_xhtml(&text, &title), output)
}

pub fn init_config(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    config
        .save_to_path(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    log::info!("Wrote config to {}", path.display());
    Ok(())
}

fn write_or_print(content: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            io::write_file(&path, content)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
