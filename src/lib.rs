pub mod auth;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod notify;
pub mod openapi;
pub mod poller;
pub mod reminders;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get, routing::post, routing::put};
use handlers::{
    classes_for_day, create_class, delete_class, get_class, get_ical, get_unit_notes,
    healthz_live, healthz_ready, list_timetable, list_units, next_class, put_class_notes,
    put_unit_notes, root, unit_classes, update_class,
};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ical::TimetableExporter;
use crate::notify::{NotificationSink, TracingSink};
use crate::openapi::ApiDoc;
use crate::poller::ChannelSnapshotProvider;
use crate::reminders::ReminderScheduler;
use crate::settings::Settings;
use crate::store::TimetableStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<TimetableStore>,
    pub scheduler: Arc<ReminderScheduler>,
    pub exporter: Arc<TimetableExporter>,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let store = Arc::new(TimetableStore::new());
    let sink: Arc<dyn NotificationSink> = Arc::new(TracingSink);
    let scheduler = ReminderScheduler::new(Arc::clone(&store), Arc::clone(&sink));
    scheduler.reschedule_all();

    // Background context: polls over a channel instead of touching the
    // store, with the foreground answering snapshot requests.
    let requests = poller::spawn_snapshot_responder(Arc::clone(&store));
    let provider =
        ChannelSnapshotProvider::new(requests, Duration::from_millis(settings.snapshot_timeout_ms));
    tokio::spawn(poller::run_background_poller(
        provider,
        Arc::clone(&sink),
        Duration::from_secs(settings.poll_interval_minutes * 60),
    ));

    let state = AppState {
        settings: settings.clone(),
        store,
        scheduler,
        exporter: Arc::new(TimetableExporter::new()),
    };

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Unit Timetable API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/timetable", get(list_timetable))
        .route("/timetable/classes", post(create_class))
        .route(
            "/timetable/classes/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/timetable/classes/{id}/notes", put(put_class_notes))
        .route("/timetable/next", get(next_class))
        .route("/timetable/day/{day}", get(classes_for_day))
        .route("/timetable.ical", get(get_ical))
        .route("/units", get(list_units))
        .route("/units/{unit}/classes", get(unit_classes))
        .route(
            "/units/{unit}/notes",
            get(get_unit_notes).put(put_unit_notes),
        )
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
