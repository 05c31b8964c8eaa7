//! API Gateway for the trading platform admin backend

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use bot_service::BotService;
use copytrader_service::CopytraderService;
use ledger_service::LedgerService;
use platform_service::PlatformService;
use view_cache::ViewCache;

use api_gateway::api::{
    auth::{admin_login, login, logout},
    bots::{
        bot_status, create_bot, create_contract_bot, delete_bot, get_bot, list_bots,
        list_contract_bots, start_bot, stop_bot,
    },
    copytraders::{
        create_copytrader, delete_copytrader, get_copytrader, get_settings, list_copytraders,
        set_credentials, update_copytrader, upsert_settings,
    },
    funds::get_funds,
    notifications::{list_notifications, mark_read},
    platform::{
        get_market_session, get_platform_state, market_clock, set_market_session,
        set_platform_state,
    },
    transfers::{
        create_deposit, create_withdrawal, list_deposits, list_withdrawals, recent_transfers,
    },
};
use api_gateway::auth::SessionStore;
use api_gateway::config::AppConfig;
use api_gateway::mailer::Mailer;
use api_gateway::ws::handler::ws_handler;
use api_gateway::AppState;

use api_gateway::api;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth routes
        api::auth::login,
        api::auth::admin_login,
        api::auth::logout,
        // Bot routes
        api::bots::create_bot,
        api::bots::list_bots,
        api::bots::create_contract_bot,
        api::bots::list_contract_bots,
        api::bots::get_bot,
        api::bots::delete_bot,
        api::bots::start_bot,
        api::bots::stop_bot,
        api::bots::bot_status,
        // Copytrader routes
        api::copytraders::create_copytrader,
        api::copytraders::list_copytraders,
        api::copytraders::get_copytrader,
        api::copytraders::update_copytrader,
        api::copytraders::delete_copytrader,
        api::copytraders::upsert_settings,
        api::copytraders::get_settings,
        api::copytraders::set_credentials,
        // Transfer routes
        api::transfers::create_deposit,
        api::transfers::create_withdrawal,
        api::transfers::list_deposits,
        api::transfers::list_withdrawals,
        api::transfers::recent_transfers,
        // Funds
        api::funds::get_funds,
        // Notifications
        api::notifications::list_notifications,
        api::notifications::mark_read,
        // Platform
        api::platform::get_platform_state,
        api::platform::set_platform_state,
        api::platform::market_clock,
        api::platform::get_market_session,
        api::platform::set_market_session,
    ),
    components(
        schemas(
            // Auth API
            api::auth::LoginRequest,
            api::auth::AdminLoginRequest,
            api::auth::SessionResponse,

            // Bot API
            api::bots::CreateBotRequest,
            api::bots::LifecycleResponse,
            common::model::bot::Bot,
            common::model::bot::BotKind,
            common::model::bot::BotStatus,
            common::model::bot::BotTrade,
            common::model::bot::BotMetrics,
            common::model::bot::BotSnapshot,

            // Copytrader API
            api::copytraders::CreateCopytraderRequest,
            api::copytraders::UpdateCopytraderRequest,
            api::copytraders::SettingsRequest,
            api::copytraders::SetCredentialsRequest,
            common::model::copytrader::Copytrader,
            common::model::copytrader::CopytraderSettings,
            common::model::copytrader::NotifyChannel,

            // Transfer API
            api::transfers::CreateTransferRequest,
            common::model::transfer::Transfer,
            common::model::transfer::TransferDirection,
            common::model::transfer::TransferStatus,
            common::model::funds::SystemFunds,

            // Notifications and platform
            common::model::notification::Notification,
            common::model::notification::NotificationKind,
            common::model::platform::PlatformState,
            common::model::platform::MarketSession,
            common::model::session::Role,
            platform_service::MarketCountdown,
            api::platform::SetPlatformStateRequest,
            api::platform::SetMarketSessionRequest,

            // Response models
            api::response::ApiResponse<common::model::bot::Bot>,
            api::response::ApiResponse<common::model::copytrader::Copytrader>,
            api::response::ApiResponse<common::model::transfer::Transfer>,
            api::response::ApiListResponse<common::model::bot::Bot>,
            api::response::ApiListResponse<common::model::copytrader::Copytrader>,
            api::response::ApiListResponse<common::model::transfer::Transfer>,
            api::response::ApiListResponse<common::model::notification::Notification>,
            api::response::ResponseMetadata
        )
    ),
    tags(
        (name = "auth", description = "Session issuance and revocation"),
        (name = "bots", description = "Trading and contract bot management"),
        (name = "copytraders", description = "Copytrader profiles and settings"),
        (name = "transfers", description = "Deposits and withdrawals"),
        (name = "funds", description = "System fund balances"),
        (name = "notifications", description = "User notifications"),
        (name = "platform", description = "Platform state and market clock")
    ),
    info(
        title = "Tradedesk Admin API",
        version = "1.0.0",
        description = "API for the trading platform admin backend: bot lifecycle, copytraders, transfers, balances, notifications, and the market clock"
    )
)]
struct ApiDoc;

/// Admin backend API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    // Initialize services; Postgres-backed when DATABASE_URL is set,
    // in-memory otherwise
    let config = AppConfig::new();

    let (bot_service, copytrader_service, ledger_service, platform_service) =
        match config.database_url.clone() {
            Some(url) => {
                let pool = common::db::init_db_pool()
                    .await
                    .expect("Failed to connect to database");
                common::db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                info!("Database migrations applied");

                (
                    Arc::new(
                        BotService::with_repository(bot_service::RepositoryType::Postgres(
                            Some(url.clone()),
                        ))
                        .await
                        .expect("Failed to initialize bot service"),
                    ),
                    Arc::new(
                        CopytraderService::with_repository(
                            copytrader_service::RepositoryType::Postgres(Some(url.clone())),
                        )
                        .await
                        .expect("Failed to initialize copytrader service"),
                    ),
                    Arc::new(
                        LedgerService::with_repository(ledger_service::RepositoryType::Postgres(
                            Some(url.clone()),
                        ))
                        .await
                        .expect("Failed to initialize ledger service"),
                    ),
                    Arc::new(
                        PlatformService::with_repository(
                            platform_service::RepositoryType::Postgres(Some(url)),
                        )
                        .await
                        .expect("Failed to initialize platform service"),
                    ),
                )
            }
            None => {
                info!("No DATABASE_URL set, using in-memory repositories");
                (
                    Arc::new(BotService::new()),
                    Arc::new(CopytraderService::new()),
                    Arc::new(LedgerService::new()),
                    Arc::new(PlatformService::new()),
                )
            }
        };

    let state = Arc::new(AppState {
        bot_service,
        copytrader_service,
        ledger_service,
        platform_service,
        cache: Arc::new(ViewCache::new()),
        sessions: SessionStore::new(config.session_ttl_hours),
        mailer: Mailer::from_config(&config),
        config,
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up API routes
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/login", post(login))
        .route("/auth/admin", post(admin_login))
        .route("/auth/logout", post(logout))
        // Bot routes
        .route("/bots", post(create_bot).get(list_bots))
        .route("/bots/:id", get(get_bot).delete(delete_bot))
        .route("/bots/:id/start", post(start_bot))
        .route("/bots/:id/stop", post(stop_bot))
        .route("/bots/:id/status", get(bot_status))
        .route(
            "/contract-bots",
            post(create_contract_bot).get(list_contract_bots),
        )
        .route("/contract-bots/:id", delete(delete_bot))
        .route("/contract-bots/:id/start", post(start_bot))
        .route("/contract-bots/:id/stop", post(stop_bot))
        // Copytrader routes
        .route(
            "/copytraders",
            post(create_copytrader).get(list_copytraders),
        )
        .route(
            "/copytraders/:id",
            get(get_copytrader)
                .put(update_copytrader)
                .delete(delete_copytrader),
        )
        .route(
            "/copytraders/:id/settings",
            put(upsert_settings).get(get_settings),
        )
        .route("/copytraders/:id/credentials", post(set_credentials))
        // Transfer routes
        .route("/deposits", post(create_deposit).get(list_deposits))
        .route(
            "/withdrawals",
            post(create_withdrawal).get(list_withdrawals),
        )
        .route("/transfers/recent", get(recent_transfers))
        // Funds, notifications, platform
        .route("/funds", get(get_funds))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_read))
        .route(
            "/platform/state",
            get(get_platform_state).put(set_platform_state),
        )
        .route("/market/clock", get(market_clock))
        .route(
            "/market/session",
            get(get_market_session).put(set_market_session),
        );

    // Set up websocket route
    let ws_routes = Router::new().route("/ws", get(ws_handler));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let app = Router::new()
        .nest("/api/v1", api_routes)
        .merge(ws_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state);

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
