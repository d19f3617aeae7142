use std::fs;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use inquire::{InquireError, Select};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::browser::SystemBrowser;
use crate::cli::terminal::{InquirePresenter, SpinnerProgress};
use crate::cli::Cli;
use crate::config::{Config, LoggingConfig};
use crate::doc::{DocCategory, TocEntry};
use crate::error::{Error, Result};
use crate::retrieval::{RetrievalCoordinator, RetrievalOutcome, RetrievalScope};
use crate::ui::{LinkOpener, PrintLink, ProgressReporter, Selection};

fn link_opener(print: bool) -> Box<dyn LinkOpener> {
    if print {
        Box::new(PrintLink)
    } else {
        Box::new(SystemBrowser::new())
    }
}

fn report_failures(outcomes: &[RetrievalOutcome]) {
    for outcome in outcomes.iter().filter(|o| o.failed) {
        eprintln!(
            "⚠️  {} documentation could not be retrieved (run with --verbose for details)",
            outcome.category.display_name()
        );
    }
}

/// Fetch a scope, show its titles and open the chosen page
pub async fn browse(config: Config, scope: RetrievalScope, print: bool) -> Result<()> {
    info!("Browsing {:?}", scope);

    let coordinator = RetrievalCoordinator::from_config(config)?;
    let opener = link_opener(print);

    let opened = coordinator
        .browse(scope, &InquirePresenter::default(), &SpinnerProgress::new(), opener.as_ref())
        .await?;

    if let (Some(url), false) = (opened, print) {
        println!("🌐 Opened {}", url);
    }
    Ok(())
}

/// Long-lived browsing loop sharing one in-memory index
pub async fn session(config: Config, print: bool) -> Result<()> {
    let coordinator = RetrievalCoordinator::from_config(config)?;
    let opener = link_opener(print);
    let presenter = InquirePresenter::default();
    let progress = SpinnerProgress::new();

    if !coordinator.categories_in_scope(RetrievalScope::Prewarm).is_empty() {
        progress.begin("Pre-loading documentation index...");
        let outcomes = coordinator.prewarm().await;
        progress.end();
        report_failures(&outcomes);
    }

    let choices = vec![
        "Apex",
        "Visualforce",
        "Service Console",
        "All documentation",
        "Quit",
    ];

    loop {
        let choice = match Select::new("Browse", choices.clone()).raw_prompt() {
            Ok(choice) => choice.index,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => break,
            Err(e) => return Err(Error::Prompt(e.to_string())),
        };

        let scope = match choice {
            0 => RetrievalScope::Category(DocCategory::Apex),
            1 => RetrievalScope::Category(DocCategory::Visualforce),
            2 => RetrievalScope::Category(DocCategory::ServiceConsole),
            3 => RetrievalScope::All,
            _ => break,
        };

        match coordinator
            .browse(scope, &presenter, &progress, opener.as_ref())
            .await
        {
            Ok(Some(url)) if !print => println!("🌐 Opened {}", url),
            Ok(_) => {}
            Err(e) => {
                error!("Browse failed: {}", e);
                println!("❌ {}", e);
            }
        }
    }

    debug!("Session ended with {} cached entries", coordinator.cache().len());
    Ok(())
}

/// Print the titles of a scope, one per line with the index `open` expects
pub async fn list(config: Config, scope: RetrievalScope, json: bool) -> Result<()> {
    let coordinator = RetrievalCoordinator::from_config(config)?;

    let progress = SpinnerProgress::new();
    progress.begin("Retrieving documentation index...");
    let outcomes = coordinator.retrieve(scope).await;
    progress.end();
    report_failures(&outcomes);

    let filter = scope.filter();
    if json {
        let entries: Vec<TocEntry> = match filter {
            Some(category) => coordinator.cache().entries_by_category(category),
            None => coordinator.cache().snapshot().entries().to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (index, title) in coordinator.cache().titles(filter).iter().enumerate() {
        println!("{}\t{}", index, title);
    }
    Ok(())
}

/// Resolve an index printed by `list` and open it
pub async fn open(config: Config, scope: RetrievalScope, index: i64, print: bool) -> Result<()> {
    let selection = Selection::from_index(index);
    if selection == Selection::Cancelled {
        debug!("Selection cancelled");
        return Ok(());
    }

    let coordinator = RetrievalCoordinator::from_config(config)?;
    let outcomes = coordinator.retrieve(scope).await;
    report_failures(&outcomes);

    let opener = link_opener(print);
    match coordinator.on_selection(scope.filter(), selection, opener.as_ref())? {
        Some(url) => {
            if !print {
                println!("🌐 Opened {}", url);
            }
            Ok(())
        }
        None => Err(Error::NotFound(format!(
            "No documentation page at index {}",
            index
        ))),
    }
}

/// Write the default configuration file
pub fn init(config: &Config, config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if path.exists() && !force {
        warn!("Configuration file already exists: {}", path.display());
        println!("⚠️  Configuration already exists: {}", path.display());
        println!("   Use --force to overwrite it");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&path, create_default_config(config))?;
    info!("Created configuration: {}", path.display());

    println!("✅ Configuration written to {}", path.display());
    println!();
    println!("Next steps:");
    println!("   sfref apex              browse the Apex reference");
    println!("   sfref session           keep the index loaded between lookups");
    Ok(())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let cmd_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, cmd_name, &mut std::io::stdout());
}

/// Initialize logging from the verbosity flags and the logging section.
///
/// Flags win over `RUST_LOG`, which wins over the configured level. The
/// returned guard must be kept alive while logging to a file.
pub fn init_logging(
    debug: bool,
    verbose: bool,
    logging: &LoggingConfig,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&logging.level).map_err(|e| {
                Error::Config(format!("Invalid log level '{}': {}", logging.level, e))
            })?,
        }
    };

    let (writer, guard) = if logging.log_to_file {
        let path = PathBuf::from(&logging.log_file);
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Config(format!("Invalid log file: {}", logging.log_file)))?;
        fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None)
    };

    let result = if logging.json_format {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_file(debug)
            .with_line_number(debug)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(false)
            .with_file(debug)
            .with_line_number(debug)
            .try_init()
    };
    // Only fails when a global subscriber is already installed.
    if let Err(e) = result {
        debug!("Keeping existing subscriber: {}", e);
        return Ok(None);
    }

    debug!("Logging initialized");
    Ok(guard)
}

fn create_default_config(config: &Config) -> String {
    let mut categories = String::new();
    for category in DocCategory::ALL {
        let cfg = config.category(category);
        let doc_type = config.doc_type(category);
        categories.push_str(&format!(
            r#"
[categories.{key}]
# Include {name} in `sfref all`
enabled = {enabled}
exclude_from_all_documentation_command = {exclude}
# Pre-load {name} at session start (defaults to settings.refresh_cache_on_load)
# refresh_cache_on_load = true
# toc_source_url = "{toc}"
# doc_base_url = "{base}"
"#,
            key = category.config_key(),
            name = category.display_name(),
            enabled = cfg.enabled,
            exclude = cfg.exclude_from_all_documentation_command,
            toc = doc_type.toc_source_url,
            base = doc_type.doc_base_url,
        ));
    }

    format!(
        r#"# sfref configuration
# Generated on {generated}

[settings]
# Pre-load every enabled category when `sfref session` starts
refresh_cache_on_load = {refresh}

# Seconds allowed for one documentation index download
timeout = {timeout}

user_agent = "{user_agent}"

[logging]
# trace, debug, info, warn or error
level = "{level}"
json_format = {json}
log_to_file = {to_file}
log_file = "{log_file}"
{categories}"#,
        generated = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        refresh = config.settings.refresh_cache_on_load,
        timeout = config.settings.timeout,
        user_agent = config.settings.user_agent,
        level = config.logging.level,
        json = config.logging.json_format,
        to_file = config.logging.log_to_file,
        log_file = config.logging.log_file,
        categories = categories,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_template_parses() {
        let rendered = create_default_config(&Config::default());
        let parsed: Config = toml::from_str(&rendered).unwrap();

        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.settings.timeout, 30);
        assert_eq!(parsed.categories_for_all(), DocCategory::ALL.to_vec());
    }

    #[test]
    fn test_init_writes_and_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sfref").join("config.toml");

        init(&Config::default(), Some(path.clone()), false).unwrap();
        assert!(Config::load(&path).is_ok());

        fs::write(&path, "# customised\n").unwrap();
        init(&Config::default(), Some(path.clone()), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# customised\n");

        init(&Config::default(), Some(path.clone()), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[categories.apex]"));
    }

    #[tokio::test]
    async fn test_open_negative_index_does_nothing() {
        // Returns before building a client or touching the network.
        assert!(open(Config::default(), RetrievalScope::All, -1, true).await.is_ok());
    }
}
