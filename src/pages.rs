#![cfg(feature = "web")]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use handlebars::{Handlebars, RenderError};
use lazy_static::lazy_static;
use serde::Serialize;

use crate::capabilities::Capabilities;
use crate::chart::ChartConfig;
use crate::data::DashboardData;
use crate::filter::FilterQuery;
use crate::panel::PanelState;
use crate::view_state::{Theme, ViewState};

const LOGIN_TEMPLATE: &str = include_str!("./templates/login.hbs");
const DASHBOARD_TEMPLATE: &str = include_str!("./templates/dashboard.hbs");

lazy_static! {
    static ref TEMPLATES: Handlebars<'static> = {
        let mut registry = Handlebars::new();
        for (name, source) in [("login", LOGIN_TEMPLATE), ("dashboard", DASHBOARD_TEMPLATE)] {
            if let Err(e) = registry.register_template_string(name, source) {
                log::error!("template '{}' failed to compile: {}", name, e);
            }
        }
        registry
    };
}

#[derive(Serialize)]
struct LoginPage<'a> {
    alert: Option<&'a str>,
    username: &'a str,
}

#[derive(Serialize)]
struct RowView<'a> {
    name: &'a str,
    number: &'a str,
    visible: bool,
}

#[derive(Serialize)]
struct ChartView {
    canvas: String,
    label: String,
    config: String,
}

#[derive(Serialize)]
struct DashboardPage<'a> {
    theme: Theme,
    theme_class: &'static str,
    dark: bool,
    page_id: &'a str,
    user: Option<&'a str>,
    notice: Option<&'a str>,
    panel: PanelState,
    panel_open: bool,
    // Handed to the page script so it can post events back
    panel_json: String,
    view_json: String,
    filter: FilterQuery,
    filtered: bool,
    rows: Vec<RowView<'a>>,
    visible_count: usize,
    total: usize,
    charts: Vec<ChartView>,
}

/// Per-request details of a dashboard render.
#[derive(Debug, Default)]
pub struct PageContext<'a> {
    /// Identifies the upload control of this page instance
    pub page_id: &'a str,
    pub user: Option<&'a str>,
    pub notice: Option<&'a str>,
}

/// Render the login form, optionally with an alert and a prefilled username.
pub fn render_login(alert: Option<&str>, username: &str) -> Result<String, RenderError> {
    TEMPLATES.render("login", &LoginPage { alert, username })
}

/// Render the dashboard for the given view state and sidebar state.
///
/// Rows that fail the current filters are still emitted but hidden, the same
/// way a table filter hides rows in place.
pub fn render_dashboard(
    data: &DashboardData,
    view: &ViewState,
    panel: &PanelState,
    context: &PageContext,
) -> Result<String, RenderError> {
    let query = view.filter_query();
    let visibility = query.apply(&data.records);

    let rows: Vec<RowView> = data
        .records
        .iter()
        .zip(&visibility)
        .map(|(record, &visible)| RowView {
            name: record.name(),
            number: record.number(),
            visible,
        })
        .collect();

    let charts = data
        .charts
        .iter()
        .map(|(canvas, series)| ChartView {
            canvas: canvas.clone(),
            label: series.dataset_label.clone(),
            config: serde_json::to_string(&ChartConfig::from(series)).unwrap_or_default(),
        })
        .collect();

    let page = DashboardPage {
        theme: view.theme,
        theme_class: view.theme.body_class(),
        dark: view.theme == Theme::Dark,
        page_id: context.page_id,
        user: context.user,
        notice: context.notice,
        panel: *panel,
        panel_open: view.panel_open,
        panel_json: serde_json::to_string(panel).unwrap_or_default(),
        view_json: serde_json::to_string(view).unwrap_or_default(),
        filtered: !query.is_empty(),
        filter: query,
        visible_count: visibility.iter().filter(|v| **v).count(),
        total: rows.len(),
        rows,
        charts,
    };

    TEMPLATES.render("dashboard", &page)
}

/// What the dashboard page offers for `data`, read back from the element ids
/// of one render.
pub fn dashboard_capabilities(data: &DashboardData) -> Result<Capabilities, RenderError> {
    let html = render_dashboard(
        data,
        &ViewState::default(),
        &PanelState::default(),
        &PageContext::default(),
    )?;
    Ok(Capabilities::from_html(&html))
}

/// Response used when a template cannot be rendered.
pub fn render_failure(e: RenderError) -> Response {
    log::error!("page rendering failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Page could not be rendered").into_response()
}
