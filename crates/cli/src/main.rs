mod metrics;
mod render;
mod shell;

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetchmate_core::{
    load_config, load_config_from_env, validate_config, DogApi, HttpDogApi, KeyValueStorage,
    SearchOutcome, Session, SessionError, SessionNotice, SessionState, SqliteStorage,
    ToggleOutcome,
};

use shell::{Command, HELP};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Whether the shell keeps reading input after a command.
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so they don't interleave with shell output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine config path
    let config_path = std::env::var("FETCHMATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("fetchmate.toml"));

    // Load configuration, falling back to defaults + environment
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        load_config_from_env().context("Failed to load config from environment")?
    };
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, base_url = %config.api.base_url, "Starting fetchmate");
    info!("Storage path: {:?}", config.storage.path);

    let api: Arc<dyn DogApi> =
        Arc::new(HttpDogApi::new(&config.api).context("Failed to create HTTP client")?);
    let storage: Arc<dyn KeyValueStorage> = Arc::new(
        SqliteStorage::new(&config.storage.path).context("Failed to open local storage")?,
    );

    let session = Session::new(api, storage, config.storage.favorites_key.clone());

    let logged_in = match &config.user {
        Some(user) => {
            session
                .login(&user.name, &user.email)
                .await
                .context("Login failed")?;
            println!("Welcome, {}!", user.name);
            true
        }
        None => {
            warn!("No [user] section configured, requests will be unauthenticated");
            false
        }
    };

    let notices = tokio::spawn(print_notices(session.subscribe()));

    match session.start().await {
        Ok(SearchOutcome::Applied(_)) => show_results(&session).await,
        Ok(_) => {}
        Err(e) => {
            if let Some(line) = render::error(&e) {
                println!("{}", line);
            }
        }
    }
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(session.state().await);
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let command = match shell::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let name = command.name();
        match dispatch(&session, command).await {
            Ok(Flow::Continue) => {
                metrics::COMMANDS_TOTAL.with_label_values(&[name, "ok"]).inc();
            }
            Ok(Flow::Quit) => break,
            Err(e) => {
                metrics::COMMANDS_TOTAL
                    .with_label_values(&[name, "error"])
                    .inc();
                // Search and match failures arrive as notices.
                if let Some(line) = render::error(&e) {
                    println!("{}", line);
                }
            }
        }
    }

    if logged_in {
        if let Err(e) = session.logout().await {
            warn!("Logout failed: {}", e);
        }
    }
    drop(session);
    let _ = notices.await;

    println!("Bye!");
    Ok(())
}

fn prompt(state: SessionState) {
    let label = match state {
        SessionState::ViewingFavorites => "favorites",
        SessionState::MatchShown => "match",
        _ => "dogs",
    };
    print!("{}> ", label);
    let _ = std::io::stdout().flush();
}

async fn print_notices(mut notices: broadcast::Receiver<SessionNotice>) {
    loop {
        match notices.recv().await {
            Ok(notice) => {
                metrics::NOTICES_TOTAL
                    .with_label_values(&[render::notice_kind(&notice)])
                    .inc();
                if let Some(line) = render::notice(&notice) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Dropped notices");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn favorite_ids(session: &Session) -> HashSet<String> {
    session
        .favorites()
        .await
        .into_iter()
        .map(|dog| dog.id)
        .collect()
}

async fn show_results(session: &Session) {
    let snapshot = session.snapshot().await;
    let page = session.display_page().await;
    let favorites = favorite_ids(session).await;
    print!(
        "{}",
        render::results(&snapshot, page, |id| favorites.contains(id))
    );
}

async fn after_search(session: &Session, outcome: SearchOutcome) {
    match outcome {
        SearchOutcome::Applied(_) => show_results(session).await,
        SearchOutcome::Skipped => println!("Nothing there."),
        // A newer search will print its own results.
        SearchOutcome::Superseded { .. } => {}
    }
}

async fn dispatch(session: &Session, command: Command) -> Result<Flow, SessionError> {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(Flow::Quit),
        Command::Metrics => print!("{}", metrics::encode_metrics()),

        // Filters
        Command::Breeds => {
            let available = session.available_breeds().await;
            if available.is_empty() {
                println!("No more breeds to add.");
            } else {
                println!("{}", available.join(", "));
            }
        }
        Command::Breed(breed) => {
            let known = session.breeds().await;
            if !known.is_empty() && !known.contains(&breed) {
                println!("Unknown breed: {}", breed);
            } else if session.toggle_breed(&breed).await {
                println!("Filtering by {} (run `apply`)", breed);
            } else {
                println!("No longer filtering by {} (run `apply`)", breed);
            }
        }
        Command::Sort(direction) => {
            session.set_sort_direction(direction).await;
            println!("Sorting by breed {} (run `apply`)", direction.as_str());
        }
        Command::Apply => after_search(session, session.apply_filters().await?).await,
        Command::Reset => after_search(session, session.reset_filters().await?).await,

        // Paging
        Command::Show => show_results(session).await,
        Command::Next => after_search(session, session.next_page().await?).await,
        Command::Prev => after_search(session, session.prev_page().await?).await,
        Command::Page(page) => after_search(session, session.go_to_page(page).await?).await,

        // Favorites
        Command::Fav(row) => {
            let snapshot = session.snapshot().await;
            match snapshot.records.get(row.saturating_sub(1)) {
                Some(dog) => match session.toggle_favorite(dog).await {
                    ToggleOutcome::Added => println!("Added {} to favorites", dog.name),
                    ToggleOutcome::Removed => println!("Removed {} from favorites", dog.name),
                },
                None => println!("No row {} on this page", row),
            }
        }
        Command::Favorites => {
            if session.state().await != SessionState::ViewingFavorites {
                session.open_favorites().await?;
            }
            print!("{}", render::favorites(&session.favorites().await));
        }
        Command::Unfav(row) => {
            let favorites = session.favorites().await;
            match favorites.get(row.saturating_sub(1)) {
                Some(dog) => {
                    session.toggle_favorite(dog).await;
                    println!("Removed {} from favorites", dog.name);
                }
                None => println!("No favorite at row {}", row),
            }
        }

        // Matching
        Command::Match => {
            if session.state().await == SessionState::Browsing {
                session.open_favorites().await?;
            }
            match session.generate_match().await? {
                Some(dog) => print!("{}", render::matched(&dog)),
                None => println!("Add some favorites first."),
            }
        }
        Command::Close => {
            session.close().await?;
            show_results(session).await;
        }
        Command::StartOver => {
            session.start_over().await?;
            println!("Favorites cleared. Happy browsing!");
            show_results(session).await;
        }
    }
    Ok(Flow::Continue)
}
