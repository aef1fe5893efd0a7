#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::capabilities::{Capabilities, DOWNLOAD_EXCEL_ID, EXCEL_UPLOAD_ID, THEME_TOGGLE_ID};
use crate::chart::{JsonSink, render_chart};
use crate::codec::{self, SpreadsheetDocument};
use crate::config::Config;
use crate::data::DashboardData;
use crate::error::DashboardError;
use crate::filter::{FilterQuery, Record};
use crate::graph::PngSink;
use crate::import::{ImportError, Importer};
use crate::login;
use crate::pages::{self, PageContext};
use crate::panel::{PanelController, PanelEvent, PanelState};
use crate::view_state::{Theme, ViewState};

// Constants
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Width assumed for the first render, before the page reports its own.
const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;
const PAGE_SCRIPT: &str = include_str!("./static/dashboard.js");

pub struct AppState {
    config: Config,
    caps: Capabilities,
    data: Mutex<DashboardData>,
    /// One importer per page upload control, keyed by the page's source id
    importers: Mutex<HashMap<String, Importer>>,
    next_page: AtomicU64,
    panel: PanelController,
}

impl AppState {
    /// Resolves the page capabilities once, from a render of the dashboard.
    pub fn new(config: Config, data: DashboardData) -> Self {
        let caps = pages::dashboard_capabilities(&data).unwrap_or_else(|e| {
            log::error!("dashboard page could not be rendered: {}", e);
            Capabilities::default()
        });
        Self::with_capabilities(config, data, caps)
    }

    pub fn with_capabilities(config: Config, data: DashboardData, caps: Capabilities) -> Self {
        let panel = PanelController::new(config.breakpoint, &caps);
        AppState {
            config,
            caps,
            data: Mutex::new(data),
            importers: Mutex::new(HashMap::new()),
            next_page: AtomicU64::new(1),
            panel,
        }
    }

    /// A poisoned lock only means another request panicked mid-update; the
    /// dashboard data itself is still usable.
    fn data(&self) -> MutexGuard<'_, DashboardData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn importers(&self) -> MutexGuard<'_, HashMap<String, Importer>> {
        self.importers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn page_id(&self) -> String {
        format!("page-{}", self.next_page.fetch_add(1, Ordering::Relaxed))
    }

    /// Decodes an upload. A newer upload from the same source supersedes the
    /// one in flight; uploads from different sources run independently.
    async fn import(
        &self,
        source: Option<String>,
        file: Option<Vec<u8>>,
    ) -> Result<SpreadsheetDocument, ImportError> {
        let Some(source) = source else {
            return Importer::new().start(file)?.finish().await;
        };

        let started = self.importers().entry(source.clone()).or_default().start(file);
        let handle = match started {
            Ok(handle) => handle,
            Err(e) => {
                self.release(&source, 0);
                return Err(e);
            }
        };

        let generation = handle.generation();
        let result = handle.finish().await;
        self.release(&source, generation);
        result
    }

    /// Drops the importer of `source` once nothing newer than `generation`
    /// was started on it.
    fn release(&self, source: &str, generation: u64) {
        let mut importers = self.importers();
        if importers.get(source).is_some_and(|i| i.latest() == generation) {
            importers.remove(source);
        }
    }

    fn apply_import(&self, doc: &SpreadsheetDocument) -> Vec<Record> {
        let mut data = self.data();
        data.replace_records(&doc.rows);
        log::info!(
            "imported {} records from sheet '{}'",
            data.records.len(),
            doc.sheet_name()
        );
        data.records.clone()
    }

    fn render_dashboard(
        &self,
        view: ViewState,
        width: u32,
        user: Option<&str>,
        notice: Option<&str>,
    ) -> Result<String, handlebars::RenderError> {
        let panel = self.panel.at_load(width);
        let view = view.with_panel(&panel);
        let page_id = self.page_id();
        let context = PageContext {
            page_id: &page_id,
            user,
            notice,
        };
        pages::render_dashboard(&self.data(), &view, &panel, &context)
    }
}

/// An element the route depends on is not on the page: nothing to serve.
fn missing(e: DashboardError) -> Response {
    log::debug!("{}, request skipped", e);
    StatusCode::NOT_FOUND.into_response()
}

#[derive(Deserialize, Default)]
struct DashboardQuery {
    #[serde(default)]
    name: String,
    #[serde(default)]
    number: String,
    theme: Option<String>,
    user: Option<String>,
    width: Option<u32>,
}

#[derive(Deserialize)]
struct PanelRequest {
    state: Option<PanelState>,
    event: PanelEvent,
    #[serde(default)]
    view: ViewState,
}

#[derive(Serialize)]
struct PanelResponse {
    #[serde(flatten)]
    state: PanelState,
    view: ViewState,
}

#[derive(Deserialize)]
struct ThemeRequest {
    checked: bool,
    #[serde(default)]
    state: ViewState,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn error(status: StatusCode, message: String) -> Response {
        (
            status,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(message),
            }),
        )
            .into_response()
    }
}

/// Fields of an upload form.
#[derive(Default)]
struct Upload {
    file: Option<Vec<u8>>,
    source: Option<String>,
    theme: Option<String>,
    filter: FilterQuery,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ImportError> {
        let mut upload = Upload::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("excel") => upload.file = Some(field.bytes().await?.to_vec()),
                Some("source") => upload.source = Some(field.text().await?),
                Some("theme") => upload.theme = Some(field.text().await?),
                Some("name") => upload.filter.name = field.text().await?,
                Some("number") => upload.filter.number = field.text().await?,
                _ => {}
            }
        }
        Ok(upload)
    }

    fn view(&self) -> ViewState {
        let mut view = ViewState::default().with_filters(&self.filter);
        if let Some(theme) = self.theme.as_deref().and_then(Theme::from_name) {
            view.theme = theme;
        }
        view
    }
}

fn import_status(e: &ImportError) -> StatusCode {
    match e {
        ImportError::Upload(_) => StatusCode::BAD_REQUEST,
        ImportError::Cancelled => StatusCode::CONFLICT,
        ImportError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ImportError::EmptyFileSelection | ImportError::Codec(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/dashboard.js", get(serve_page_script))
        .route("/login", get(login::serve_login_page).post(login::handle_login))
        .route("/import", post(import_from_form))
        .route("/api/records", get(get_records))
        .route("/api/import", post(import_spreadsheet))
        .route("/api/export", get(export_spreadsheet))
        .route("/api/chart/:canvas", get(get_chart_config))
        .route("/charts/:file", get(get_chart_png))
        .route("/api/panel", post(update_panel))
        .route("/api/theme", post(update_theme))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config, data: DashboardData) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr;
    let app_state = Arc::new(AppState::new(config, data));
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let mut view = ViewState::default().with_filters(&FilterQuery::new(params.name, params.number));
    if let Some(theme) = params.theme.as_deref().and_then(Theme::from_name) {
        view.theme = theme;
    }

    let width = params.width.unwrap_or(DEFAULT_VIEWPORT_WIDTH);
    match state.render_dashboard(view, width, params.user.as_deref(), None) {
        Ok(html) => Html(html).into_response(),
        Err(e) => pages::render_failure(e),
    }
}

async fn serve_page_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], PAGE_SCRIPT)
}

async fn get_records(
    Query(query): Query<FilterQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Err(e) = state.caps.require_filter() {
        return missing(e);
    }

    let data = state.data();
    let visible = query.apply(&data.records);

    Json(serde_json::json!({
        "records": data.records,
        "visible_count": visible.iter().filter(|v| **v).count(),
        "visible": visible,
    }))
    .into_response()
}

async fn import_spreadsheet(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    if let Err(e) = state.caps.require(EXCEL_UPLOAD_ID) {
        return missing(e);
    }

    let result = match Upload::read(multipart).await {
        Ok(upload) => state.import(upload.source, upload.file).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(doc) => {
            let records = state.apply_import(&doc);
            Json(serde_json::json!({
                "status": "ok",
                "sheet": doc.sheet_name(),
                "records": records,
            }))
            .into_response()
        }
        Err(e) => {
            let status = import_status(&e);
            match DashboardError::from(e).notification() {
                Some(message) => {
                    log::warn!("import failed: {}", message);
                    StatusResponse::error(status, message)
                }
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
    }
}

/// Upload posted by the page's own form: answers with the dashboard again,
/// carrying the outcome as a notice.
async fn import_from_form(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    if let Err(e) = state.caps.require(EXCEL_UPLOAD_ID) {
        return missing(e);
    }

    let (view, result) = match Upload::read(multipart).await {
        Ok(upload) => {
            let view = upload.view();
            (view, state.import(upload.source, upload.file).await)
        }
        Err(e) => (ViewState::default(), Err(e)),
    };

    let (status, notice) = match result {
        Ok(doc) => {
            let records = state.apply_import(&doc);
            let notice = format!(
                "Imported {} records from sheet '{}'",
                records.len(),
                doc.sheet_name()
            );
            (StatusCode::OK, Some(notice))
        }
        Err(e) => {
            let status = import_status(&e);
            match DashboardError::from(e).notification() {
                Some(message) => {
                    log::warn!("import failed: {}", message);
                    (status, Some(message))
                }
                None => (StatusCode::OK, None),
            }
        }
    };

    match state.render_dashboard(view, DEFAULT_VIEWPORT_WIDTH, None, notice.as_deref()) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => pages::render_failure(e),
    }
}

async fn export_spreadsheet(State(state): State<Arc<AppState>>) -> Response {
    if let Err(e) = state.caps.require(DOWNLOAD_EXCEL_ID) {
        return missing(e);
    }
    let grid = state.data().export_grid();

    match codec::encode(&grid, &state.config.sheet_name) {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", state.config.export_name);
            (
                [
                    (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            log::error!("export failed: {}", e);
            StatusResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn get_chart_config(
    Path(canvas): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Err(e) = state.caps.require_canvas(&canvas) {
        return missing(e);
    }
    let data = state.data();
    let Some(series) = data.chart(&canvas) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match render_chart(Some(&mut JsonSink), series).and_then(|handle| handle.output) {
        Some(config) => Json(config).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn get_chart_png(Path(file): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(canvas) = file.strip_suffix(".png") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Err(e) = state.caps.require_canvas(canvas) {
        return missing(e);
    }
    let Some(series) = state.data().chart(canvas).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut sink = PngSink::default();
    match render_chart(Some(&mut sink), &series).and_then(|handle| handle.output) {
        Some(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn update_panel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PanelRequest>,
) -> Response {
    let next = match (request.state, request.event) {
        (Some(current), event) => state.panel.handle(current, event),
        (None, PanelEvent::Evaluate { width }) => state.panel.at_load(width),
        (None, _) => {
            return StatusResponse::error(
                StatusCode::BAD_REQUEST,
                "panel state is required after page load".to_string(),
            );
        }
    };
    Json(PanelResponse {
        view: request.view.with_panel(&next),
        state: next,
    })
    .into_response()
}

async fn update_theme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThemeRequest>,
) -> Response {
    if let Err(e) = state.caps.require(THEME_TOGGLE_ID) {
        return missing(e);
    }
    let view = request.state.with_theme_toggle(request.checked);
    let classes: Vec<&str> = view
        .theme
        .body_classes()
        .iter()
        .filter(|(_, on)| *on)
        .map(|(class, _)| *class)
        .collect();

    Json(serde_json::json!({
        "state": view,
        "body_classes": classes,
    }))
    .into_response()
}
