use std::sync::Arc;

use retention_agent::api::{self, AppState};
use retention_agent::config::{AppConfig, RunMode};
use retention_agent::conversation::{AgentDeps, ConversationController};
use retention_agent::customers::load_customers;
use retention_agent::documents::{DocumentStore, TfIdfIndex};
use retention_agent::llm::{LlmConfig, create_provider};
use retention_agent::notify::{EmailConfig, SupervisorNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;
    let llm_config = LlmConfig::from_env()?;
    let llm = create_provider(&llm_config)?;

    eprintln!("Retention Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", llm_config.model, llm_config.backend);
    eprintln!("   Agent: {} / {}", config.agent.agent_name, config.agent.team_name);

    let mut deps = AgentDeps::new(llm, config.agent.clone());

    // ── Policy document ─────────────────────────────────────────────────
    if let Some(source) = &config.policy_document {
        let store = DocumentStore::new(&config.chunks_path, config.chunk_policy);
        let index = TfIdfIndex::index(store.load_or_build(source).await?);
        eprintln!(
            "   Policy document: {} ({} chunks)",
            source.display(),
            index.len()
        );
        deps = deps.with_retriever(Arc::new(index));
    } else {
        eprintln!("   Policy document: none (Answer Query turns use the model alone)");
    }

    // ── Supervisor e-mail ───────────────────────────────────────────────
    let email = EmailConfig::from_env();
    match &email {
        Some(email) => eprintln!("   Supervisor e-mail: {}", email.supervisor_address),
        None => eprintln!("   Supervisor e-mail: disabled"),
    }
    let notifier = Arc::new(SupervisorNotifier::new(
        Arc::clone(&deps.llm),
        Arc::clone(&deps.templates),
        Arc::clone(&deps.config),
        email,
    ));

    match config.mode {
        RunMode::Http => {
            let app = api::routes(AppState::new(deps, notifier));
            let listener =
                tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port)).await?;
            eprintln!("   API: http://0.0.0.0:{}/api/sessions\n", config.http_port);
            tracing::info!(port = config.http_port, "HTTP server started");
            axum::serve(listener, app).await?;
        }
        RunMode::Cli => {
            let Some(csv_path) = &config.customers_csv else {
                eprintln!("Error: RETENTION_CUSTOMERS_CSV must be set in cli mode");
                std::process::exit(1);
            };
            let customers = load_customers(csv_path).await?;
            eprintln!("   Customers: {} from {}", customers.len(), csv_path.display());
            eprintln!("   Commands: /next, /summary, /quit\n");

            let mut controller = ConversationController::new(deps);
            controller.load_customers(customers)?;
            retention_agent::cli::run(&mut controller, &notifier).await?;
        }
    }

    Ok(())
}
