//! Todo terminal front end
//!
//! Interactive list wired to the backend in-process. Items are addressed by
//! their position in the last printed list.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use rolling_logger::{LevelFilter, LoggerConfig};
use todo_server_lib::config::ServerConfig;
use todo_server_lib::domain::OwnerId;
use todo_server_lib::session::Session;
use todo_server_lib::AppState;
use todo_ui::commands::InProcess;
use todo_ui::models::{Item, ItemStatus};
use todo_ui::{MutationCoordinator, MutationHandle, Outcome};

const ENV_LOG_LEVEL: &str = "TODO_LOG";

const HELP: &str = "\
commands:
  add [title]        add an item (no title: add what `find` is showing)
  done N | undo N    mark item N done / pending
  toggle N           flip item N
  rename N title     retitle item N
  rm N               delete item N
  find [text]        filter the list (empty clears)
  ls                 print the list
  quit";

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Todo list with optimistic updates")]
struct Cli {
    /// SQLite database file (overrides TODO_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory for rotated log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Identity to act as
    #[arg(long)]
    owner: Option<String>,

    /// Allow signed-out use (one shared anonymous list)
    #[arg(long)]
    no_auth: bool,
}

type Coordinator = MutationCoordinator<InProcess>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = std::env::var(ENV_LOG_LEVEL)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    if let Err(e) = rolling_logger::init_with(LoggerConfig::new(cli.log_dir.clone(), "todo").with_level(level)) {
        eprintln!("{}", rolling_logger::stamp(&format!("Failed to initialize logger: {}", e)));
    }

    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if cli.no_auth {
        config.require_auth = false;
    }

    let session = match cli.owner {
        Some(owner) => Session::for_owner(OwnerId::new(owner)),
        None => {
            if config.require_auth {
                println!("Not signed in: pass --owner NAME, or --no-auth for the shared list.");
            }
            Session::anonymous()
        }
    };

    let state = match AppState::open(config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            eprintln!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let coordinator = MutationCoordinator::new(InProcess::new(state, session));
    if let Err(e) = coordinator.load().await {
        println!("Could not load the list: {}", e);
        coordinator.take_notices();
    }

    print_list(&coordinator);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("stdin: {}", e);
                break;
            }
        };
        if !handle_line(&coordinator, line.trim()) {
            break;
        }
    }

    log::info!("todo exiting");
    ExitCode::SUCCESS
}

/// Run one command line. `false` ends the session.
fn handle_line(coordinator: &Coordinator, line: &str) -> bool {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let submitted = match cmd {
        "" => return true,
        "quit" | "exit" | "q" => return false,
        "help" => {
            println!("{}", HELP);
            return true;
        }
        "ls" => {
            print_list(coordinator);
            return true;
        }
        "find" => {
            coordinator.set_input(rest);
            print_list(coordinator);
            return true;
        }
        "add" if rest.is_empty() => coordinator.submit_input(),
        "add" => coordinator.add(rest),
        "done" | "undo" | "toggle" | "rm" | "rename" => {
            let (index, title) = rest.split_once(' ').unwrap_or((rest, ""));
            let Some(item) = nth_visible(coordinator, index) else {
                println!("No item '{}'. Use the number shown by `ls`.", index);
                return true;
            };
            match cmd {
                "done" => coordinator.set_status(item.id, ItemStatus::Done),
                "undo" => coordinator.set_status(item.id, ItemStatus::Pending),
                "toggle" => coordinator.toggle(item.id),
                "rm" => coordinator.delete(item.id),
                _ => coordinator.rename(item.id, title),
            }
        }
        other => {
            println!("Unknown command '{}' (try `help`)", other);
            return true;
        }
    };

    match submitted {
        Ok(handle) => {
            print_list(coordinator);
            tokio::spawn(report(coordinator.clone(), handle));
        }
        Err(rejected) => println!("{}", rejected),
    }
    true
}

/// Wait for the server's answer, then show what changed.
async fn report(coordinator: Coordinator, handle: MutationHandle) {
    let outcome = handle.settled().await;
    for notice in coordinator.take_notices() {
        println!("{}", notice);
    }
    if let Outcome::Reverted(_) = outcome {
        print_list(&coordinator);
    }
}

fn nth_visible(coordinator: &Coordinator, index: &str) -> Option<Item> {
    let n = index.parse::<usize>().ok()?.checked_sub(1)?;
    coordinator.visible().into_iter().nth(n)
}

fn print_list(coordinator: &Coordinator) {
    let snapshot = coordinator.snapshot();
    let shown = snapshot.visible();
    if !snapshot.input.is_empty() {
        println!("-- matching '{}' ({} of {}) --", snapshot.input, shown.len(), snapshot.items.len());
    }
    if shown.is_empty() {
        println!("  (nothing here)");
    }
    for (n, item) in shown.iter().enumerate() {
        let mark = if item.is_done() { "x" } else { " " };
        let saving = if item.id.temp().is_some() { "  (saving)" } else { "" };
        match item.expired_at {
            Some(due) if !item.is_done() => println!(
                "{:>3}. [{}] {}  (expires {}){}",
                n + 1,
                mark,
                item.title,
                due.format("%Y-%m-%d %H:%M"),
                saving
            ),
            _ => println!("{:>3}. [{}] {}{}", n + 1, mark, item.title, saving),
        }
    }
    if snapshot.in_flight > 0 {
        println!("  ({} change(s) being saved)", snapshot.in_flight);
    }
}
