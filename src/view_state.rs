use serde::{Deserialize, Serialize};

use crate::filter::FilterQuery;
use crate::panel::PanelState;

/// Page colour scheme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    /// Theme selected by the toggle switch: checked means dark.
    pub fn from_toggle(checked: bool) -> Self {
        if checked { Theme::Dark } else { Theme::Light }
    }

    /// Parses `dark` / `light`, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Body classes as `(class, enabled)` pairs, mirroring a class-list toggle.
    pub fn body_classes(self) -> [(&'static str, bool); 2] {
        [
            ("dark-mode", self == Theme::Dark),
            ("light-mode", self == Theme::Light),
        ]
    }

    /// The class that ends up on the body.
    pub fn body_class(self) -> &'static str {
        match self {
            Theme::Dark => "dark-mode",
            Theme::Light => "light-mode",
        }
    }
}

/// UI flags for one page lifetime.
///
/// Handlers take the current state and return the updated one; nothing here
/// outlives the page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub panel_open: bool,
    pub theme: Theme,
    pub name_filter: String,
    pub number_filter: String,
}

impl ViewState {
    pub fn with_theme_toggle(self, checked: bool) -> Self {
        ViewState {
            theme: Theme::from_toggle(checked),
            ..self
        }
    }

    pub fn with_filters(self, query: &FilterQuery) -> Self {
        ViewState {
            name_filter: query.name.clone(),
            number_filter: query.number.clone(),
            ..self
        }
    }

    /// Takes the panel flag from the sidebar controller's latest state.
    pub fn with_panel(self, panel: &PanelState) -> Self {
        ViewState {
            panel_open: panel.is_open(),
            ..self
        }
    }

    /// The filters last applied to this page.
    pub fn filter_query(&self) -> FilterQuery {
        FilterQuery {
            name: self.name_filter.clone(),
            number: self.number_filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::panel::{MOBILE_BREAKPOINT, PanelController, PanelEvent};

    #[test]
    fn defaults_to_light_theme() {
        let panel = PanelController::new(MOBILE_BREAKPOINT, &Capabilities::all());
        let state = ViewState::default().with_panel(&panel.at_load(1024));
        assert_eq!(state.theme, Theme::Light);
        assert!(state.panel_open);
        assert!(!ViewState::default().with_panel(&panel.at_load(768)).panel_open);
    }

    #[test]
    fn panel_flag_follows_the_sidebar() {
        let panel = PanelController::new(MOBILE_BREAKPOINT, &Capabilities::all());
        let hidden = panel.at_load(500);
        let state = ViewState::default().with_panel(&hidden).with_theme_toggle(true);
        assert!(!state.panel_open);

        let state = state.with_panel(&panel.handle(hidden, PanelEvent::Open));
        assert!(state.panel_open);
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn toggle_switches_body_classes() {
        let state = ViewState::default().with_theme_toggle(true);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(
            state.theme.body_classes(),
            [("dark-mode", true), ("light-mode", false)]
        );

        let state = state.with_theme_toggle(false);
        assert_eq!(state.theme.body_class(), "light-mode");
    }

    #[test]
    fn filters_are_remembered() {
        let query = FilterQuery {
            name: "jo".to_string(),
            number: "55".to_string(),
        };
        let state = ViewState::default().with_filters(&query);
        assert_eq!(state.filter_query(), query);
    }

    #[test]
    fn theme_names_parse() {
        assert_eq!(Theme::from_name("DARK"), Some(Theme::Dark));
        assert_eq!(Theme::from_name("light"), Some(Theme::Light));
        assert_eq!(Theme::from_name("sepia"), None);
    }
}
