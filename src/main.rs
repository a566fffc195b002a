use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use almostme::api::{self, AppState, SecurityConfig};
use almostme::chat::ChatService;
use almostme::config::{ChatSettings, ModelSettings};
use almostme::knowledge::Knowledge;
use almostme::llm::OpenAiCompatClient;
use almostme::router::{Decision, IntentRouter};
use almostme::session::{MemorySessionStore, SessionStore, SqliteSessionStore};

#[derive(Parser)]
#[command(name = "almostme")]
#[command(about = "Personal assistant chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct KnowledgeArgs {
    /// Directory with system_prompt.txt, domains.json and manuales.json
    #[arg(long, env = "ALMOSTME_KNOWLEDGE_DIR", default_value = "knowledge")]
    knowledge_dir: PathBuf,
}

#[derive(Parser, Clone)]
struct ServeArgs {
    /// Port for the HTTP server
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "ALMOSTME_HOST", default_value = "127.0.0.1")]
    host: String,

    /// SQLite file for sessions (in-memory sessions when omitted)
    #[arg(long, env = "ALMOSTME_SESSION_DB")]
    session_db: Option<PathBuf>,

    /// Keep sessions in the default data directory
    #[arg(long, conflicts_with = "session_db")]
    persist_sessions: bool,

    #[command(flatten)]
    knowledge: KnowledgeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat server
    Serve(ServeArgs),
    /// Show which rule handles a message, without calling the model
    Route {
        message: String,

        #[command(flatten)]
        knowledge: KnowledgeArgs,
    },
    /// Print the system block the model would receive
    Context {
        message: Option<String>,

        #[command(flatten)]
        knowledge: KnowledgeArgs,
    },
}

/// Initialize tracing with output to stderr (for inspection commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "almostme=debug,tower_http=info".into()),
    );

    if use_stderr {
        // Keep stdout clean for the printed report
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_sessions(args: &ServeArgs, ttl: chrono::Duration) -> anyhow::Result<Arc<dyn SessionStore>> {
    let path = match (&args.session_db, args.persist_sessions) {
        (Some(path), _) => path.clone(),
        (None, true) => SqliteSessionStore::default_path()?,
        (None, false) => {
            tracing::info!("Using in-memory sessions");
            return Ok(Arc::new(MemorySessionStore::new(ttl)));
        }
    };

    let store = SqliteSessionStore::open(path.clone(), ttl)?;
    store.migrate()?;
    tracing::info!("Using session database {}", path.display());
    Ok(Arc::new(store))
}

/// Purge expired sessions and idle rate-limit entries once a minute.
fn spawn_housekeeping(sessions: Arc<dyn SessionStore>, limiter: Option<api::RateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            match sessions.purge_expired() {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} expired sessions", n),
                Err(e) => tracing::warn!("Session purge failed: {:#}", e),
            }
            if let Some(ref limiter) = limiter {
                limiter.cleanup();
            }
        }
    });
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let knowledge = Arc::new(Knowledge::load(&args.knowledge.knowledge_dir)?);
    let chat_settings = ChatSettings::from_env()?;
    let model_settings = ModelSettings::from_env()?;

    let model_configured = model_settings.is_configured();
    if !model_configured {
        tracing::warn!(
            "No model API key set (ALMOSTME_API_KEY, OPENROUTER_API_KEY or GITHUB_TOKEN); \
             model-bound messages will get the error reply"
        );
    }
    tracing::info!(
        "Model {} at {}",
        model_settings.model,
        model_settings.base_url
    );

    let model = Arc::new(OpenAiCompatClient::new(model_settings)?);
    let sessions = open_sessions(&args, chat_settings.session_ttl)?;
    let security = SecurityConfig::from_env();

    spawn_housekeeping(Arc::clone(&sessions), security.rate_limiter.clone());

    let chat = ChatService::new(
        knowledge,
        Arc::new(IntentRouter::default()),
        model,
        chat_settings,
    );
    let app = api::create_router_with_config(
        AppState::new(chat, sessions, model_configured),
        security,
    );

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("AlmostMe listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn print_route(message: &str, knowledge: &KnowledgeArgs) -> anyhow::Result<()> {
    let knowledge = Knowledge::load(&knowledge.knowledge_dir)?;
    let router = IntentRouter::default();
    let routed = router.route(message, knowledge.catalog(), false);

    println!("normalized: {}", routed.normalized);
    println!("rule:       {}", routed.rule.unwrap_or("(fallback)"));
    println!("decision:   {}", routed.decision.name());
    if let Decision::ShowManual(manual) = routed.decision {
        println!("manual:     {} ({})", manual.title, manual.url);
    }
    Ok(())
}

fn print_context(message: Option<&str>, knowledge: &KnowledgeArgs) -> anyhow::Result<()> {
    let knowledge = Knowledge::load(&knowledge.knowledge_dir)?;
    let settings = ChatSettings::from_env()?;
    println!("{}", knowledge.system_block(&settings.context_policy, message));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(
        cli.command,
        Some(Commands::Route { .. }) | Some(Commands::Context { .. })
    );
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve(args)) => serve(args).await?,
        Some(Commands::Route { message, knowledge }) => print_route(&message, &knowledge)?,
        Some(Commands::Context { message, knowledge }) => {
            print_context(message.as_deref(), &knowledge)?
        }
        None => {
            // Default: serve with flags taken from the environment
            let args = ServeArgs::try_parse_from(["serve"])?;
            serve(args).await?;
        }
    }

    Ok(())
}
