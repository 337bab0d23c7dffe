use anyhow::Result;
use clap::{Parser, Subcommand};
use novelist_config::Config;
use std::path::PathBuf;
use std::process;

mod commands;

#[derive(Parser)]
#[command(name = "novelist", about = "Manuscript backup and chapter tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new backup with empty chapters
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        chapters: usize,
        /// Chapter title prefix (defaults to the configured prefix)
        #[arg(short, long)]
        prefix: Option<String>,
        /// Document code; random when omitted
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        no_toc: bool,
        #[arg(long)]
        no_indent: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a backup from a folder of .txt chapter files
    FromChapters {
        dir: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        no_toc: bool,
        #[arg(long)]
        no_indent: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append empty chapters to an existing backup
    Extend {
        backup: PathBuf,
        #[arg(short, long)]
        chapters: usize,
        #[arg(short, long)]
        prefix: Option<String>,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge several backups into one, renumbering all chapters
    Merge {
        #[arg(required = true)]
        backups: Vec<PathBuf>,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        prefix: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every occurrence of a pattern
    Find {
        backup: PathBuf,
        pattern: String,
        #[arg(short, long)]
        regex: bool,
        /// Walk from the end of the document towards the start
        #[arg(short, long)]
        backward: bool,
    },
    /// Replace every occurrence of a pattern
    Replace {
        backup: PathBuf,
        pattern: String,
        replacement: String,
        #[arg(short, long)]
        regex: bool,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export chapters as .txt files, one per chapter or grouped
    Split {
        backup: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// File name prefix for exported chapters
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        start: Option<u32>,
        /// Chapters to skip from the front
        #[arg(long)]
        offset: Option<usize>,
        /// Bundle chapters into files of this many chapters
        #[arg(short, long)]
        group_size: Option<usize>,
        #[arg(long)]
        grouped: bool,
    },
    /// Extract prose from an XHTML chapter
    XhtmlToText {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a text chapter as XHTML
    TextToXhtml {
        input: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Defaults to ~/.config/novelist-tools/config.toml
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            log::warn!("Ignoring config file: {e}");
            Config::default()
        }
    };

    match cli.command {
        Commands::Create {
            title,
            description,
            chapters,
            prefix,
            code,
            no_toc,
            no_indent,
            output,
        } => {
            let options = commands::build_options(&config, code, no_toc, no_indent);
            let prefix = prefix.unwrap_or_else(|| config.chapter_prefix.clone());
            commands::create(&config, &title, &description, chapters, &prefix, &options, output)
        }
        Commands::FromChapters {
            dir,
            title,
            description,
            code,
            no_toc,
            no_indent,
            output,
        } => {
            let options = commands::build_options(&config, code, no_toc, no_indent);
            commands::from_chapters(&config, &dir, &title, &description, &options, output)
        }
        Commands::Extend {
            backup,
            chapters,
            prefix,
            output,
        } => {
            let prefix = prefix.unwrap_or_else(|| config.chapter_prefix.clone());
            commands::extend(&backup, chapters, &prefix, output)
        }
        Commands::Merge {
            backups,
            title,
            description,
            prefix,
            output,
        } => {
            let prefix = prefix.unwrap_or_else(|| config.chapter_prefix.clone());
            commands::merge(&config, &backups, &title, &description, &prefix, output)
        }
        Commands::Find {
            backup,
            pattern,
            regex,
            backward,
        } => commands::find(&backup, &pattern, regex, backward),
        Commands::Replace {
            backup,
            pattern,
            replacement,
            regex,
            output,
        } => commands::replace(&backup, &pattern, &replacement, regex, output),
        Commands::Split {
            backup,
            output,
            pattern,
            start,
            offset,
            group_size,
            grouped,
        } => {
            let options = commands::export_options(
                &config.export,
                pattern,
                start,
                offset,
                group_size,
                grouped,
            );
            commands::split(&backup, &output, &options)
        }
        Commands::XhtmlToText { input, output } => commands::xhtml_to_text(&input, output),
        Commands::TextToXhtml {
            input,
            title,
            output,
        } => commands::text_to_xhtml(&input, title, output),
        Commands::InitConfig { output, force } => {
            let path = output.unwrap_or_else(Config::config_path);
            commands::init_config(&config, &path, force)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_grouped_split() {
        let cli = Cli::try_parse_from([
            "novelist",
            "split",
            "book.json",
            "-o",
            "out",
            "--grouped",
            "-g",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Split {
                grouped,
                group_size,
                ..
            } => {
                assert!(grouped);
                assert_eq!(group_size, Some(3));
            }
            _ => panic!("expected split"),
        }
    }
}
