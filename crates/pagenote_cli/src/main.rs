//! Command-line inspector for PageNote documents.
//!
//! # Responsibility
//! - Verify `pagenote_core` linkage with no arguments.
//! - Inspect or normalize one note document on disk.

use clap::{Parser, Subcommand};
use pagenote_core::{
    DocumentConfig, DocumentService, FileDocumentStore, NoteView, OpenedDocument, OwnerLinkMode,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "PageNote document inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the page layout of a document.
    Inspect {
        /// Path to the note JSON file.
        file: PathBuf,
    },
    /// Load a document, repair truncated chains, and write it back.
    Normalize {
        /// Path to the note JSON file; created when missing.
        file: PathBuf,
        /// How extension owners are resolved on save: `position` or `rank`.
        #[arg(long, value_parser = parse_owner_link, default_value = "position")]
        owner_link: OwnerLinkMode,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    match cli.command {
        None => Ok(format!(
            "pagenote_core ping={}\npagenote_core version={}\n",
            pagenote_core::ping(),
            pagenote_core::core_version()
        )),
        Some(Command::Inspect { file }) => {
            let opened = open_service(&file, DocumentConfig::default())?
                .open()
                .map_err(|err| format!("inspect failed: {err}"))?;
            render_layout(&opened).map_err(|err| format!("inspect failed: {err}"))
        }
        Some(Command::Normalize { file, owner_link }) => {
            let config = DocumentConfig {
                owner_link_mode: owner_link,
                ..DocumentConfig::default()
            };
            let service = open_service(&file, config)?;
            let opened = service
                .open()
                .map_err(|err| format!("normalize failed: {err}"))?;
            let report = service
                .save(&opened.view)
                .map_err(|err| format!("normalize failed: {err}"))?;
            let mut output = format!(
                "saved pages={} bytes={} issues_repaired={}\n",
                report.pages_written,
                report.bytes_written,
                opened.issues.len()
            );
            for warning in &report.warnings {
                output.push_str(&format!("warning: {warning}\n"));
            }
            Ok(output)
        }
    }
}

fn open_service(
    path: &Path,
    config: DocumentConfig,
) -> Result<DocumentService<FileDocumentStore>, String> {
    DocumentService::new(FileDocumentStore::new(path), config).map_err(|err| err.to_string())
}

fn parse_owner_link(value: &str) -> Result<OwnerLinkMode, String> {
    OwnerLinkMode::parse(value)
        .ok_or_else(|| format!("unknown owner link mode `{value}`; expected position|rank"))
}

fn render_layout(opened: &OpenedDocument) -> Result<String, std::fmt::Error> {
    let view: &NoteView = &opened.view;
    let mut output = String::new();
    writeln!(
        output,
        "pages={} next_page={} synthesized={}",
        view.main.len(),
        view.next_page,
        opened.synthesized
    )?;
    for (position, page) in view.main.iter().enumerate() {
        write!(output, "{position}: page {} tag {}", page.unique, page.tag)?;
        let extension = view.extension_pages(position);
        if !extension.is_empty() {
            let ids = extension
                .iter()
                .map(|node| node.unique.to_string())
                .collect::<Vec<_>>();
            write!(output, " ext [{}]", ids.join(", "))?;
        }
        output.push('\n');
    }
    for issue in &opened.issues {
        writeln!(output, "issue: {issue}")?;
    }
    Ok(output)
}
