// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::{style, Term};
use hearlearn_config::{Config, ConfigError, ConfigManager};
use hearlearn_core::{AppError, Book, BookId, BookStatus, ListeningTime};
use hearlearn_library::{IngestionReport, IngestionResult, LibraryError, LibraryManager};
use hearlearn_network::NetworkError;
use std::path::PathBuf;

/// Upload and register PDFs, then fetch their pages
pub async fn import_books(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .ok_or_else(|| anyhow!("At least one file is required"))?
        .map(PathBuf::from)
        .collect();

    for path in &files {
        let book = manager
            .import_book(path)
            .await
            .with_context(|| format!("Could not start processing {}", path.display()))?;

        println!("{} Imported {}", style("✓").green().bold(), style(&book.name).bold());
        println!("  ID: {}", book.id);
        println!("  Pages: {}", book.total_pages);
    }

    if matches.get_flag("no-wait") {
        println!("Run 'hearlearn process' to fetch the pages later.");
        return Ok(());
    }

    process_pending(manager).await
}

/// List all books in the library
pub async fn list_books(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let filter = matches
        .get_one::<String>("status")
        .map(|s| BookStatus::from(s.clone()));

    let books: Vec<Book> = manager
        .list_books()
        .await
        .into_iter()
        .filter(|book| filter.as_ref().map_or(true, |status| &book.status == status))
        .collect();

    if books.is_empty() {
        println!("No books in library. Use 'import' to add a PDF.");
        return Ok(());
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }

    Ok(())
}

/// Show detailed information about a book
pub async fn show_book_info(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    println!("Name: {}", style(&book.name).bold());
    println!("Status: {}", status_label(&book.status));
    println!("Pages: {}", book.total_pages);
    if let Some(uri) = &book.local_uri {
        println!("Local copy: {}", uri.display());
    }
    println!(
        "Position: page {} of {}",
        book.last_position + 1,
        book.total_pages.max(1)
    );
    println!("Listening time: {}", format_duration(book.listening_time));
    println!("Completed: {}", if book.completed { "yes" } else { "no" });

    if !book.bookmarks.is_empty() {
        let pages: Vec<String> = book.bookmarks.iter().map(|p| (p + 1).to_string()).collect();
        println!("Bookmarks: {}", pages.join(", "));
    }

    if !book.annotations.is_empty() {
        println!("Annotations:");
        for (page, note) in &book.annotations {
            println!("  p{}: {}", page + 1, truncate(note, 70));
        }
    }

    if let Some(first) = book.pages.first() {
        println!("\n{}", style("First page").bold());
        println!("  {}", truncate(first.text.trim(), 200));
        if first.ocr {
            println!("  {}", style("(extracted by OCR)").dim());
        }
    }

    Ok(())
}

/// Fetch pages for every processing book
pub async fn process_pending(manager: &LibraryManager) -> Result<()> {
    println!("Fetching pages...");
    let reports = manager.process_pending().await;

    if reports.is_empty() {
        if manager.is_processing() {
            println!("Another ingestion run is already active.");
        } else {
            println!("Nothing to process.");
        }
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }
    Ok(())
}

/// Reset a failed book and fetch it again
pub async fn retry_book(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;

    if !book.is_failed() {
        bail!(
            "'{}' is {}, only failed books can be retried",
            book.name,
            book.status
        );
    }

    if !manager.retry_book(&book.id).await {
        bail!("Could not reset '{}' for another attempt", book.name);
    }
    println!("{} '{}' queued again", style("✓").green().bold(), book.name);

    if matches.get_flag("no-wait") {
        return Ok(());
    }
    process_pending(manager).await
}

/// Remove a book from the library
pub async fn remove_book(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;

    if !matches.get_flag("force")
        && !confirm(&format!("Remove '{}' from your library?", book.name))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    manager
        .remove_book(&book.id)
        .await
        .context("Failed to remove cached document")?;

    println!("{} Removed '{}'", style("✓").green().bold(), book.name);
    Ok(())
}

/// Record a finished listening session
pub async fn record_session(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;
    let page = page_index(matches)?;
    let seconds = *matches
        .get_one::<u64>("seconds")
        .ok_or_else(|| anyhow!("Seconds are required"))?;

    manager.record_session(&book.id, page, seconds).await;

    let updated = reload(manager, &book.id).await?;
    println!(
        "{} Now at page {} with {} listened",
        style("✓").green().bold(),
        updated.last_position + 1,
        format_duration(updated.listening_time)
    );
    if updated.completed && !book.completed {
        println!("  {}", style("Book completed!").yellow().bold());
    }
    Ok(())
}

/// Add or remove a bookmark
pub async fn set_bookmark(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;
    let page = page_index(matches)?;
    let present = !matches.get_flag("remove");

    manager.set_bookmark(&book.id, page, present).await;

    let updated = reload(manager, &book.id).await?;
    if updated.is_bookmarked(page) != present {
        bail!("Bookmark change was not saved");
    }

    let action = if present { "Bookmarked" } else { "Removed bookmark on" };
    println!("{} {} page {}", style("✓").green().bold(), action, page + 1);
    Ok(())
}

/// Set or delete a page note
pub async fn annotate(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let book = find_book(manager, matches).await?;
    let page = page_index(matches)?;
    let text = matches
        .get_one::<String>("text")
        .map(String::as_str)
        .unwrap_or("");

    manager.set_annotation(&book.id, page, text).await;

    let updated = reload(manager, &book.id).await?;
    match updated.annotation(page) {
        Some(note) => println!("{} Note on page {}: {}", style("✓").green().bold(), page + 1, note),
        None => println!("{} No note on page {}", style("✓").green().bold(), page + 1),
    }
    Ok(())
}

/// Show library statistics
pub async fn show_stats(manager: &LibraryManager) -> Result<()> {
    let stats = manager.get_stats().await;

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Total books: {}", style(stats.total_books).bold());
    println!("  Ready: {}", stats.ready_count);
    println!("  Processing: {}", stats.processing_count);
    println!("  Failed: {}", stats.failed_count);
    println!(
        "Completed: {} ({:.1}%)",
        stats.completed_count,
        stats.completed_percentage()
    );
    println!("Total pages: {}", stats.total_pages);
    println!("Bookmarks: {}", stats.total_bookmarks);
    println!("Annotations: {}", stats.total_annotations);
    println!(
        "Listening time: {} (avg {} per book)",
        format_duration(stats.total_listening_time),
        format_duration(stats.average_listening_time())
    );

    Ok(())
}

/// Export the library as JSON
pub async fn export_library(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let output = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("library_export.json");

    let books = manager.list_books().await;
    let json = serde_json::to_string_pretty(&books).context("Failed to serialize to JSON")?;
    std::fs::write(output, json).context("Failed to write export file")?;

    println!(
        "{} Exported {} books to {}",
        style("✓").green().bold(),
        books.len(),
        output
    );
    Ok(())
}

/// Remove every book and cached document
pub async fn clear_library(manager: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    if !matches.get_flag("force") && !confirm("Delete every book in your library?")? {
        println!("Cancelled.");
        return Ok(());
    }

    manager.clear().await;
    println!("{} Library cleared", style("✓").green().bold());
    Ok(())
}

/// Print where configuration lives and what is in effect
///
/// A config file that exists but does not parse is reported as an error.
pub fn show_config(paths: &ConfigManager, config: &Config) -> Result<()> {
    paths.load().context("Configuration file is not usable")?;

    println!("\n{}", style("Configuration").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Config file: {}", paths.config_path().display());
    println!("Data directory: {}", paths.data_dir(config).display());
    println!("Documents: {}", paths.documents_dir(config).display());
    println!("Storage key: {}", config.library.storage_key);
    println!("Server: {}", config.remote.base_url);
    println!("Page timeout: {}s", config.remote.page_timeout_secs);
    println!("Log level: {}", config.app.log_level);
    Ok(())
}

async fn find_book(manager: &LibraryManager, matches: &ArgMatches) -> Result<Book> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Book ID is required"))?;

    manager
        .get_book(&BookId::new(id.as_str()))
        .await
        .ok_or_else(|| anyhow!("No book with id '{}'", id))
}

async fn reload(manager: &LibraryManager, id: &BookId) -> Result<Book> {
    manager
        .get_book(id)
        .await
        .ok_or_else(|| anyhow!("Book '{}' disappeared from the library", id))
}

/// Converts the user's 1-based page number into a page index
fn page_index(matches: &ArgMatches) -> Result<u32> {
    let page = *matches
        .get_one::<u32>("page")
        .ok_or_else(|| anyhow!("Page is required"))?;
    to_page_index(page)
}

fn to_page_index(page: u32) -> Result<u32> {
    page.checked_sub(1)
        .ok_or_else(|| anyhow!("Page numbers start at 1"))
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} [y/N] ", prompt))?;
    let answer = term.read_line().context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Prints a failed command, with advice when the failure is a known one
pub fn report_failure(err: anyhow::Error) {
    let details = format!("{:#}", err);
    match classify(err) {
        Ok(app_error) => {
            if app_error.is_critical() {
                log::error!("{} ({})", details, app_error.severity());
            } else {
                log::debug!("{} ({})", details, app_error.severity());
            }
            eprintln!("{} {}", style("Error:").red().bold(), app_error.user_message());
            eprintln!("  {}", style(&details).dim());
            eprintln!("  {} {}", style("→").cyan(), app_error.recovery_action());
        }
        Err(other) => eprintln!("{} {:#}", style("Error:").red().bold(), other),
    }
}

/// Recovers the typed error behind a command failure
fn classify(err: anyhow::Error) -> std::result::Result<AppError, anyhow::Error> {
    let err = match err.downcast::<LibraryError>() {
        Ok(e) => return Ok(e.into()),
        Err(err) => err,
    };
    let err = match err.downcast::<NetworkError>() {
        Ok(e) => return Ok(e.into()),
        Err(err) => err,
    };
    err.downcast::<ConfigError>()
        .map(|e| LibraryError::from(e).into())
}

fn print_report(report: &IngestionReport) {
    match &report.result {
        IngestionResult::Ready { pages } => println!(
            "{} '{}' ready: {} pages in {:.1}s",
            style("✓").green().bold(),
            report.name,
            pages,
            report.elapsed.as_secs_f64()
        ),
        IngestionResult::Failed { page, reason } => println!(
            "{} '{}' failed at page {}: {}",
            style("✗").red().bold(),
            report.name,
            page,
            reason
        ),
    }
    if !report.persisted {
        println!("  {}", style("Result could not be saved; run 'process' again").yellow());
    }
}

fn print_book_summary(book: &Book) {
    println!("\n{}", style(&book.name).bold());
    println!(
        "  ID: {} | Status: {} | Pages: {}",
        truncate(book.id.as_str(), 12),
        status_label(&book.status),
        book.total_pages
    );
    if book.is_ready() {
        print!(
            "  Page {}/{} | Listened {}",
            book.last_position + 1,
            book.total_pages.max(1),
            format_duration(book.listening_time)
        );
        if book.completed {
            print!("  {}", style("✔ Completed").green());
        }
        if !book.bookmarks.is_empty() {
            print!("  {}", style(format!("★ {}", book.bookmarks.len())).yellow());
        }
        println!();
    }
}

fn status_label(status: &BookStatus) -> String {
    match status {
        BookStatus::Ready => style("ready").green().to_string(),
        BookStatus::Processing => style("processing").yellow().to_string(),
        BookStatus::Failed => style("failed").red().to_string(),
        BookStatus::Other(other) => style(other.as_str()).dim().to_string(),
    }
}

fn format_duration(time: ListeningTime) -> String {
    let seconds = time.as_seconds();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &s[..byte_index]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearlearn_core::{BookPatch, PageContent};
    use hearlearn_library::{DocumentCache, MemoryStore};
    use hearlearn_network::{NetworkError, NetworkResult, ProcessingService, Registration};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct OfflineService;

    #[async_trait]
    impl ProcessingService for OfflineService {
        async fn start_processing(&self, _document: &Path) -> NetworkResult<Registration> {
            Err(NetworkError::InvalidResponse("offline".to_string()))
        }

        async fn fetch_page(&self, _id: &BookId, page: u32) -> NetworkResult<PageContent> {
            Ok(PageContent::from_text(format!("page {}", page)))
        }
    }

    async fn manager_with_book(temp: &TempDir) -> LibraryManager {
        let manager = LibraryManager::with_backend(
            Arc::new(MemoryStore::new()),
            Arc::new(OfflineService),
            DocumentCache::new(temp.path()),
        );
        manager
            .store()
            .upsert(
                BookPatch::new(BookId::new("abc"))
                    .with_name("paper.pdf")
                    .with_total_pages(3),
            )
            .await;
        manager
    }

    fn sub_matches(args: &[&str]) -> ArgMatches {
        let matches = crate::build_cli()
            .try_get_matches_from(std::iter::once("hearlearn").chain(args.iter().copied()))
            .unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(ListeningTime::from_seconds(3661)), "1h 1m");
        assert_eq!(format_duration(ListeningTime::from_seconds(120)), "2m");
        assert_eq!(format_duration(ListeningTime::from_seconds(42)), "42s");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly", 7), "exactly");
        assert_eq!(truncate("ação rápida", 4), "ação...");
    }

    #[test]
    fn test_page_numbers_start_at_one() {
        assert_eq!(to_page_index(1).unwrap(), 0);
        assert_eq!(to_page_index(3).unwrap(), 2);
        assert!(to_page_index(0).is_err());
    }

    #[tokio::test]
    async fn test_bookmark_command() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        set_bookmark(&manager, &sub_matches(&["bookmark", "abc", "2"]))
            .await
            .unwrap();
        let book = manager.get_book(&BookId::new("abc")).await.unwrap();
        assert!(book.is_bookmarked(1));

        set_bookmark(&manager, &sub_matches(&["bookmark", "abc", "2", "--remove"]))
            .await
            .unwrap();
        let book = manager.get_book(&BookId::new("abc")).await.unwrap();
        assert!(book.bookmarks.is_empty());
    }

    #[tokio::test]
    async fn test_session_command_marks_completion() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        record_session(&manager, &sub_matches(&["session", "abc", "3", "30"]))
            .await
            .unwrap();

        let book = manager.get_book(&BookId::new("abc")).await.unwrap();
        assert_eq!(book.last_position, 2);
        assert!(book.completed);
    }

    #[tokio::test]
    async fn test_annotate_without_text_deletes_note() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        annotate(&manager, &sub_matches(&["annotate", "abc", "1", "intro"]))
            .await
            .unwrap();
        assert_eq!(
            manager.get_book(&BookId::new("abc")).await.unwrap().annotation(0),
            Some("intro")
        );

        annotate(&manager, &sub_matches(&["annotate", "abc", "1"]))
            .await
            .unwrap();
        assert!(manager
            .get_book(&BookId::new("abc"))
            .await
            .unwrap()
            .annotations
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_book_is_an_error() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        let result = show_book_info(&manager, &sub_matches(&["info", "missing"])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_retry_rejects_ready_book() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        let result = retry_book(&manager, &sub_matches(&["retry", "abc", "--no-wait"])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_retry_refetches_failed_book() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;
        manager
            .store()
            .upsert(BookPatch::new(BookId::new("abc")).with_status(BookStatus::Failed))
            .await;

        retry_book(&manager, &sub_matches(&["retry", "abc"]))
            .await
            .unwrap();

        let book = manager.get_book(&BookId::new("abc")).await.unwrap();
        assert!(book.is_ready());
        assert_eq!(book.pages.len(), 3);
    }

    #[tokio::test]
    async fn test_forced_remove() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;

        remove_book(&manager, &sub_matches(&["remove", "abc", "--force"]))
            .await
            .unwrap();
        assert!(manager.list_books().await.is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_json_array() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;
        let output = temp.path().join("export.json");
        let output_arg = output.to_string_lossy().into_owned();

        export_library(&manager, &sub_matches(&["export", "-o", &output_arg]))
            .await
            .unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(exported[0]["id_arquivo"], "abc");
    }

    #[tokio::test]
    async fn test_failed_import_is_classified() {
        let temp = TempDir::new().unwrap();
        let manager = manager_with_book(&temp).await;
        let pdf = temp.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        let pdf_arg = pdf.display().to_string();

        let err = import_books(&manager, &sub_matches(&["import", &pdf_arg]))
            .await
            .unwrap_err();
        let app_error = classify(err).unwrap();

        assert!(matches!(app_error, AppError::InvalidServiceResponse { .. }));
        assert!(!app_error.is_retryable());
    }

    #[test]
    fn test_corrupted_config_is_classified_as_fatal() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigManager::with_directory(temp.path().to_path_buf()).unwrap();
        std::fs::write(paths.config_path(), "not = [valid").unwrap();

        let err = show_config(&paths, &Config::default()).unwrap_err();
        let app_error = classify(err).unwrap();

        assert!(matches!(app_error, AppError::ConfigurationCorrupted { .. }));
        assert!(app_error.is_critical());
    }

    #[test]
    fn test_plain_failures_stay_unclassified() {
        assert!(classify(anyhow!("Page numbers start at 1")).is_err());
    }
}
