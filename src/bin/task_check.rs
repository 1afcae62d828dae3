use cosmic::cosmic_config::{Config, CosmicConfigEntry};
use tick::config::TickConfig;
use tick::core::projection::{FilterMode, TaskCounts, ViewState};
use tick::core::store::TaskStore;
use tick::core::task::TaskId;
use tick::error::TaskError;
use tick::remote::{HttpTaskClient, Session};

const USAGE: &str = "usage: task_check [--filter all|completed|incomplete] [--search TEXT] \
[add TITLE | toggle ID | remove ID]";

enum Command {
    List,
    Add(String),
    Toggle(TaskId),
    Remove(TaskId),
}

struct Args {
    view: ViewState,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut view = ViewState::default();
    let mut command = Command::List;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--filter" => {
                let value = iter.next().ok_or("--filter needs a value")?;
                view.filter = value.parse::<FilterMode>()?;
            }
            "--search" => {
                view.search = iter.next().ok_or("--search needs a value")?.clone();
            }
            "add" => {
                let title: Vec<&str> = iter.by_ref().map(|s| s.as_str()).collect();
                command = Command::Add(title.join(" "));
            }
            "toggle" => {
                let id = iter.next().ok_or("toggle needs an id")?;
                command = Command::Toggle(TaskId::new(id.as_str()));
            }
            "remove" | "rm" => {
                let id = iter.next().ok_or("remove needs an id")?;
                command = Command::Remove(TaskId::new(id.as_str()));
            }
            other => return Err(format!("unexpected argument '{}'", other)),
        }
    }

    Ok(Args { view, command })
}

#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .and_then(|j| {
            j.with_syslog_identifier("tick-task-check".to_string())
                .install()
                .map_err(std::io::Error::other)
        })
        .unwrap_or_else(|e| eprintln!("Journal logging unavailable: {}", e));
    log::set_max_level(log::LevelFilter::Info);

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Load config
    let config = match Config::new(tick::config::APP_ID, tick::config::CONFIG_VERSION) {
        Ok(cfg) => TickConfig::get_entry(&cfg).unwrap_or_else(|(_, cfg)| cfg),
        Err(e) => {
            println!("Config unavailable ({:?}), using defaults", e);
            TickConfig::default()
        }
    };
    let server = config.server_key();

    println!("=== Tasks on {} ===\n", server);

    // TICK_TOKEN wins over the keyring so a backend can be checked without logging in
    let session = match std::env::var("TICK_TOKEN") {
        Ok(token) => Session::from_optional(Some(token)),
        Err(_) => match tick::remote::keyring::load_session(&server).await {
            Ok(stored) => stored.session,
            Err(e) => {
                println!("  Keyring error: {}", e);
                return;
            }
        },
    };
    if !session.is_authenticated() {
        println!("  No session token found. Log in with the app or set TICK_TOKEN.");
        return;
    }

    let client = match HttpTaskClient::with_timeout(&server, session, config.request_timeout()) {
        Ok(c) => c,
        Err(e) => {
            println!("  Client error: {}", e);
            return;
        }
    };

    let mut store = TaskStore::new();
    if let Err(e) = store.refresh(&client).await {
        report(&e);
        return;
    }

    let result = match &args.command {
        Command::List => Ok(()),
        Command::Add(title) => store.add(&client, title).await,
        Command::Toggle(id) => store.toggle(&client, id).await,
        Command::Remove(id) => store.remove(&client, id).await,
    };
    if let Err(e) = result {
        report(&e);
    }

    let counts = TaskCounts::of(store.tasks());
    println!(
        "  {} tasks: {} completed, {} incomplete",
        counts.total, counts.completed, counts.incomplete
    );
    if !args.view.search.is_empty() || args.view.filter != FilterMode::All {
        println!("  Showing {} matching \"{}\"", args.view.filter, args.view.search);
    }
    println!();

    let shown = store.view(&args.view);
    if shown.is_empty() {
        println!("  No tasks found.");
    }
    for task in shown {
        let mark = if task.completed { "x" } else { " " };
        println!("  [{}] {}  ({})", mark, task.title, task.id);
    }

    println!("\n=== Done ===");
}

fn report(e: &TaskError) {
    println!("  Error: {}", e);
    if e.requires_login() {
        println!("  The stored session was rejected; log in again.");
    } else if e.suggests_refresh() {
        println!("  The list above may be stale; run again to refresh.");
    }
}
