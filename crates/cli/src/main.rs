// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use hearlearn_config::{ConfigManager, LogLevel};
use hearlearn_library::LibraryManager;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

fn book_id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("BOOK_ID")
        .help("Book id as assigned by the extraction service")
}

fn page_arg() -> Arg {
    Arg::new("page")
        .required(true)
        .value_name("PAGE")
        .value_parser(clap::value_parser!(u32))
        .help("Page number, starting at 1")
}

fn no_wait_arg() -> Arg {
    Arg::new("no-wait")
        .long("no-wait")
        .help("Queue the book without waiting for its pages")
        .action(ArgAction::SetTrue)
}

fn build_cli() -> Command {
    Command::new("hearlearn")
        .version(env!("CARGO_PKG_VERSION"))
        .author("HearLearn Team")
        .about("Library and reading-state manager for PDF listening")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("URL")
                .help("Extraction service base URL, overriding the configuration")
                .global(true),
        )
        .subcommand(
            Command::new("import")
                .about("Upload PDFs for extraction and add them to the library")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_name("FILE")
                        .help("PDF files to import"),
                )
                .arg(no_wait_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List all books in the library")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_name("STATUS")
                        .help("Show only books with this status")
                        .value_parser(["processing", "ready", "failed"]),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show detailed information about a book")
                .arg(book_id_arg()),
        )
        .subcommand(Command::new("process").about("Fetch pages for every book still processing"))
        .subcommand(
            Command::new("retry")
                .about("Retry a book whose processing failed")
                .arg(book_id_arg())
                .arg(no_wait_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a book and its cached PDF")
                .arg(book_id_arg())
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Skip confirmation prompt")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("session")
                .about("Record a finished listening session")
                .arg(book_id_arg())
                .arg(page_arg())
                .arg(
                    Arg::new("seconds")
                        .required(true)
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seconds listened during the session"),
                ),
        )
        .subcommand(
            Command::new("bookmark")
                .about("Bookmark a page or remove a bookmark")
                .arg(book_id_arg())
                .arg(page_arg())
                .arg(
                    Arg::new("remove")
                        .short('r')
                        .long("remove")
                        .help("Remove the bookmark")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("annotate")
                .about("Attach a note to a page; an empty note deletes it")
                .arg(book_id_arg())
                .arg(page_arg())
                .arg(Arg::new("text").value_name("TEXT").help("Note text")),
        )
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(
            Command::new("export")
                .about("Export the library as JSON")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file path")
                        .default_value("library_export.json"),
                ),
        )
        .subcommand(
            Command::new("clear")
                .about("Delete every book and cached PDF")
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Skip confirmation prompt")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Show the effective configuration"))
}

fn init_logging(level: LogLevel) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string()),
    )
    .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::report_failure(err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let matches = build_cli().get_matches();

    let paths = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to resolve configuration directory")?;

    let mut config = paths.load_with_env_overrides();
    if let Some(url) = matches.get_one::<String>("server") {
        config.remote.base_url = url.clone();
    }
    init_logging(config.app.log_level);
    log::debug!("Using configuration from {}", paths.config_path().display());

    if let Some(("config", _)) = matches.subcommand() {
        return commands::show_config(&paths, &config);
    }

    let manager = LibraryManager::new(&config, &paths).context("Failed to open library")?;

    match matches.subcommand() {
        Some(("import", sub_matches)) => commands::import_books(&manager, sub_matches).await,
        Some(("list", sub_matches)) => commands::list_books(&manager, sub_matches).await,
        Some(("info", sub_matches)) => commands::show_book_info(&manager, sub_matches).await,
        Some(("process", _)) => commands::process_pending(&manager).await,
        Some(("retry", sub_matches)) => commands::retry_book(&manager, sub_matches).await,
        Some(("remove", sub_matches)) => commands::remove_book(&manager, sub_matches).await,
        Some(("session", sub_matches)) => commands::record_session(&manager, sub_matches).await,
        Some(("bookmark", sub_matches)) => commands::set_bookmark(&manager, sub_matches).await,
        Some(("annotate", sub_matches)) => commands::annotate(&manager, sub_matches).await,
        Some(("stats", _)) => commands::show_stats(&manager).await,
        Some(("export", sub_matches)) => commands::export_library(&manager, sub_matches).await,
        Some(("clear", sub_matches)) => commands::clear_library(&manager, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parses_session() {
        let matches = build_cli()
            .try_get_matches_from(["hearlearn", "session", "abc", "3", "120"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "session");
        assert_eq!(sub.get_one::<u32>("page"), Some(&3));
        assert_eq!(sub.get_one::<u64>("seconds"), Some(&120));
    }

    #[test]
    fn test_rejects_unknown_status_filter() {
        let result = build_cli().try_get_matches_from(["hearlearn", "list", "--status", "queued"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_server_flag() {
        let matches = build_cli()
            .try_get_matches_from(["hearlearn", "stats", "--server", "http://localhost:8000"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("server").map(String::as_str),
            Some("http://localhost:8000")
        );
    }
}
