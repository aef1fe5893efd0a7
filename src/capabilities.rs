use serde::{Deserialize, Serialize};

use crate::chart::style_for_canvas;
use crate::error::DashboardError;

// Element ids the dashboard scripts look for.
pub const SIDEBAR_ID: &str = "sidebar";
pub const HAMBURGER_ID: &str = "hamburger-btn";
pub const CLOSE_SIDEBAR_ID: &str = "close-sidebar-btn";
pub const OVERLAY_ID: &str = "sidebar-overlay";
pub const THEME_TOGGLE_ID: &str = "theme-toggle";
pub const NAME_SEARCH_ID: &str = "nameSearchInput";
pub const NUMBER_SEARCH_ID: &str = "numberSearchInput";
pub const RECORDS_TABLE_ID: &str = "recordsTable";
pub const EXCEL_UPLOAD_ID: &str = "excelUploadInput";
pub const DOWNLOAD_EXCEL_ID: &str = "downloadExcelBtn";
pub const LOGIN_FORM_ID: &str = "login-form";

/// Which dashboard features a page can offer, resolved once from the
/// elements present when it loads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub sidebar: bool,
    pub hamburger: bool,
    pub close_button: bool,
    pub overlay: bool,
    pub theme_toggle: bool,
    pub name_search: bool,
    pub number_search: bool,
    pub records_table: bool,
    pub excel_upload: bool,
    pub excel_download: bool,
    pub login_form: bool,
    /// Canvas ids that have a known chart style
    pub chart_canvases: Vec<String>,
}

impl Capabilities {
    pub fn resolve<'a, I>(element_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut caps = Capabilities::default();
        for id in element_ids {
            match id {
                SIDEBAR_ID => caps.sidebar = true,
                HAMBURGER_ID => caps.hamburger = true,
                CLOSE_SIDEBAR_ID => caps.close_button = true,
                OVERLAY_ID => caps.overlay = true,
                THEME_TOGGLE_ID => caps.theme_toggle = true,
                NAME_SEARCH_ID => caps.name_search = true,
                NUMBER_SEARCH_ID => caps.number_search = true,
                RECORDS_TABLE_ID => caps.records_table = true,
                EXCEL_UPLOAD_ID => caps.excel_upload = true,
                DOWNLOAD_EXCEL_ID => caps.excel_download = true,
                LOGIN_FORM_ID => caps.login_form = true,
                other if style_for_canvas(other).is_some() => {
                    caps.chart_canvases.push(other.to_string())
                }
                other => log::debug!("ignoring unknown element '{}'", other),
            }
        }
        caps.log_missing();
        caps
    }

    /// Resolves against the elements of a rendered page.
    pub fn from_html(html: &str) -> Self {
        Self::resolve(element_ids(html))
    }

    /// A page with every control present.
    pub fn all() -> Self {
        Capabilities {
            sidebar: true,
            hamburger: true,
            close_button: true,
            overlay: true,
            theme_toggle: true,
            name_search: true,
            number_search: true,
            records_table: true,
            excel_upload: true,
            excel_download: true,
            login_form: true,
            chart_canvases: ["earningsChart", "weeklyChart", "monthlyChart"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Filtering needs the table and at least one search box.
    pub fn can_filter(&self) -> bool {
        self.records_table && (self.name_search || self.number_search)
    }

    pub fn has_canvas(&self, canvas: &str) -> bool {
        self.chart_canvases.iter().any(|c| c == canvas)
    }

    pub fn has_element(&self, id: &str) -> bool {
        match id {
            SIDEBAR_ID => self.sidebar,
            HAMBURGER_ID => self.hamburger,
            CLOSE_SIDEBAR_ID => self.close_button,
            OVERLAY_ID => self.overlay,
            THEME_TOGGLE_ID => self.theme_toggle,
            NAME_SEARCH_ID => self.name_search,
            NUMBER_SEARCH_ID => self.number_search,
            RECORDS_TABLE_ID => self.records_table,
            EXCEL_UPLOAD_ID => self.excel_upload,
            DOWNLOAD_EXCEL_ID => self.excel_download,
            LOGIN_FORM_ID => self.login_form,
            other => self.has_canvas(other),
        }
    }

    /// `Err(MissingElement)` when the page has no element `id`.
    pub fn require(&self, id: &str) -> Result<(), DashboardError> {
        if self.has_element(id) {
            Ok(())
        } else {
            Err(DashboardError::MissingElement(id.to_string()))
        }
    }

    pub fn require_filter(&self) -> Result<(), DashboardError> {
        self.require(RECORDS_TABLE_ID)?;
        if self.can_filter() {
            Ok(())
        } else {
            Err(DashboardError::MissingElement(NAME_SEARCH_ID.to_string()))
        }
    }

    /// Like [`Capabilities::require`], but only chart canvases count.
    pub fn require_canvas(&self, canvas: &str) -> Result<(), DashboardError> {
        if self.has_canvas(canvas) {
            Ok(())
        } else {
            Err(DashboardError::MissingElement(canvas.to_string()))
        }
    }

    fn log_missing(&self) {
        let checks = [
            (self.sidebar, SIDEBAR_ID),
            (self.hamburger, HAMBURGER_ID),
            (self.theme_toggle, THEME_TOGGLE_ID),
            (self.records_table, RECORDS_TABLE_ID),
            (self.excel_upload, EXCEL_UPLOAD_ID),
            (self.excel_download, DOWNLOAD_EXCEL_ID),
        ];
        for (present, id) in checks {
            if !present {
                log::debug!("element '{}' not on page, feature disabled", id);
            }
        }
    }
}

/// Values of the `id` attributes in an HTML document, in document order.
pub fn element_ids(html: &str) -> Vec<&str> {
    const ATTR: &str = " id=\"";

    let mut ids = Vec::new();
    let mut rest = html;
    while let Some(at) = rest.find(ATTR) {
        let value = &rest[at + ATTR.len()..];
        let Some(end) = value.find('"') else { break };
        ids.push(&value[..end]);
        rest = &value[end..];
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_present_elements() {
        let caps = Capabilities::resolve([
            "sidebar",
            "hamburger-btn",
            "recordsTable",
            "nameSearchInput",
            "weeklyChart",
            "footer",
        ]);
        assert!(caps.sidebar);
        assert!(caps.hamburger);
        assert!(!caps.overlay);
        assert!(caps.can_filter());
        assert!(caps.has_canvas("weeklyChart"));
        assert!(!caps.has_canvas("monthlyChart"));
    }

    #[test]
    fn table_without_search_boxes_cannot_filter() {
        let caps = Capabilities::resolve(["recordsTable"]);
        assert!(!caps.can_filter());
        assert!(!Capabilities::default().can_filter());
        assert!(matches!(
            caps.require_filter(),
            Err(DashboardError::MissingElement(id)) if id == NAME_SEARCH_ID
        ));
    }

    #[test]
    fn ids_are_read_from_markup() {
        let html = r#"<body class="x"><aside id="sidebar" data-id="nope">
            <button id="hamburger-btn"></button><canvas id="monthlyChart"></canvas>"#;
        assert_eq!(element_ids(html), vec!["sidebar", "hamburger-btn", "monthlyChart"]);

        let caps = Capabilities::from_html(html);
        assert!(caps.sidebar && caps.hamburger);
        assert!(caps.require_canvas("monthlyChart").is_ok());
        assert!(caps.require_canvas("sidebar").is_err());
        assert!(matches!(
            caps.require(EXCEL_UPLOAD_ID),
            Err(DashboardError::MissingElement(id)) if id == EXCEL_UPLOAD_ID
        ));
    }
}
