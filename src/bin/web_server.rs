use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use course_server::{
    api::{AppState, api_router},
    store,
    utils::init_log,
};
use time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to database file
    #[arg(short, long, default_value = "database/course.db")]
    database: PathBuf,
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    #[arg(short, long, default_value = "8080")]
    port: u16,
    /// Log directory; logs go to stdout when unset
    #[arg(short, long)]
    log: Option<PathBuf>,
}

#[derive(OpenApi)]
#[openapi(paths(
    course_server::api::user::create_user,
    course_server::api::user::login,
    course_server::api::user::logout,
    course_server::api::user::user_info,
    course_server::api::course::create_course,
    course_server::api::course::list_courses,
    course_server::api::course::get_course,
    course_server::api::course::complete_chapter,
    course_server::api::course::get_progress,
))]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let _guard = init_log(args.log.clone());

    let database = store::connect(&args.database).await?;

    let session_store = SqliteStore::new(database.clone());
    session_store.migrate().await?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(5)));

    // open CORS; the preflight OPTIONS no-op is handled by the layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api_router().with_state(AppState { database }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!("listening on http://{}:{}", args.host, args.port);
    tracing::info!(
        "Swagger UI available at http://{}:{}/swagger-ui",
        args.host,
        args.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
