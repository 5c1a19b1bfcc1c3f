//! Terminal client for the LiveTodo store.
//!
//! # Responsibility
//! - Map subcommands onto store handlers and the reactive view.
//! - Keep output stable: plain lines by default, JSON with `--json`.

use clap::{Parser, Subcommand};
use livetodo_core::{
    init_logging_from_config, CoreConfig, StorageLocation, Todo, TodoId, TodoStore, TodoView,
};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "livetodo")]
#[command(about = "Reactive to-do list backed by a local store", version)]
struct Cli {
    /// Database file; overrides LIVETODO_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level; overrides LIVETODO_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory; overrides LIVETODO_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every todo, newest first.
    List,
    /// Create a todo.
    Add { title: Vec<String> },
    /// Flip completion of a todo.
    Toggle { id: TodoId },
    /// Delete a todo (no error when it does not exist).
    Remove { id: TodoId },
    /// Delete every todo.
    Clear,
    /// Print the list again whenever it changes.
    Watch {
        /// Stop after this many seconds; runs until interrupted when omitted.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Health check.
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("livetodo: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(&cli);
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    if let Commands::Ping = cli.command {
        println!("livetodo_core ping={}", livetodo_core::ping());
        println!("livetodo_core version={}", livetodo_core::core_version());
        return Ok(());
    }

    let store = TodoStore::open_location(&config.storage).map_err(|err| err.to_string())?;
    info!(
        "event=cli_command module=cli status=start location={:?}",
        store.location()
    );

    match cli.command {
        Commands::List => print_list(&store.list().map_err(|e| e.to_string())?, cli.json),
        Commands::Add { title } => {
            let mut view = TodoView::new(&store);
            view.mount().map_err(|err| err.to_string())?;
            view.set_input(title.join(" "));
            match view.submit().map_err(|err| err.to_string())? {
                Some(id) if cli.json => println!("{}", json!({ "id": id })),
                Some(id) => println!("{id}"),
                None => return Err("title must not be empty".to_string()),
            }
        }
        Commands::Toggle { id } => {
            let completed = store.toggle_complete(id).map_err(|err| err.to_string())?;
            if cli.json {
                println!("{}", json!({ "id": id, "completed": completed }));
            }
        }
        Commands::Remove { id } => {
            store.remove(id).map_err(|err| err.to_string())?;
        }
        Commands::Clear => {
            let result = store.clear_all().map_err(|err| err.to_string())?;
            if cli.json {
                println!("{}", json!(result));
            } else {
                println!("deleted={}", result.deleted);
            }
        }
        Commands::Watch { timeout_secs } => watch(&store, timeout_secs, cli.json)?,
        Commands::Ping => {}
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> CoreConfig {
    let mut config = CoreConfig::from_env();
    if let Some(db) = &cli.db {
        config.storage = StorageLocation::File(db.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config
}

// Writes from other processes sharing the file are picked up by polling the
// store between waits.
fn watch(store: &TodoStore, timeout_secs: Option<u64>, json: bool) -> Result<(), String> {
    const POLL: Duration = Duration::from_millis(500);

    let mut view = TodoView::new(store);
    view.mount().map_err(|err| err.to_string())?;
    print_view(&view, json);

    let deadline = timeout_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    loop {
        let wait = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(());
                }
                remaining.min(POLL)
            }
            None => POLL,
        };
        store
            .poll_external_changes()
            .map_err(|err| err.to_string())?;
        if view.wait_for_change(wait).map_err(|err| err.to_string())? {
            print_view(&view, json);
        }
    }
}

fn print_view(view: &TodoView<'_>, json: bool) {
    if let Some(items) = view.items() {
        if json {
            print_list(items, true);
        } else {
            for line in view.render() {
                println!("{line}");
            }
            println!("--");
        }
    }
}

fn print_list(items: &[Todo], json: bool) {
    if json {
        println!("{}", json!(items));
        return;
    }
    for todo in items {
        let mark = if todo.completed { 'x' } else { ' ' };
        println!("{} [{mark}] {}", todo.id, todo.title);
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli, Commands};
    use clap::Parser;
    use livetodo_core::StorageLocation;
    use std::path::PathBuf;

    #[test]
    fn add_collects_words_into_title() {
        let cli = Cli::parse_from(["livetodo", "add", "Buy", "milk"]);
        match cli.command {
            Commands::Add { title } => assert_eq!(title.join(" "), "Buy milk"),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn db_flag_overrides_storage() {
        let cli = Cli::parse_from(["livetodo", "--db", "/tmp/cli.db", "list"]);
        let config = resolve_config(&cli);
        assert_eq!(
            config.storage,
            StorageLocation::File(PathBuf::from("/tmp/cli.db"))
        );
    }

    #[test]
    fn toggle_requires_uuid() {
        assert!(Cli::try_parse_from(["livetodo", "toggle", "not-a-uuid"]).is_err());
        let id = uuid::Uuid::new_v4().to_string();
        assert!(Cli::try_parse_from(["livetodo", "toggle", id.as_str()]).is_ok());
    }
}
