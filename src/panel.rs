use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;

/// Viewport widths at or below this are laid out for mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Desktop,
    Mobile,
}

impl LayoutMode {
    pub fn for_width(width: u32, breakpoint: u32) -> Self {
        if width <= breakpoint {
            LayoutMode::Mobile
        } else {
            LayoutMode::Desktop
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Everything the page shows about the sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    pub layout: LayoutMode,
    pub panel: Visibility,
    pub hamburger_visible: bool,
    pub close_visible: bool,
    pub overlay_active: bool,
    pub scroll_locked: bool,
}

/// The sidebar as the markup renders it before any evaluation: open, with
/// no mobile controls showing.
impl Default for PanelState {
    fn default() -> Self {
        PanelState {
            layout: LayoutMode::Desktop,
            panel: Visibility::Visible,
            hamburger_visible: false,
            close_visible: false,
            overlay_active: false,
            scroll_locked: false,
        }
    }
}

impl PanelState {
    pub fn is_open(&self) -> bool {
        self.panel == Visibility::Visible
    }
}

/// Inputs to the sidebar controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// Page load or window resize
    Evaluate { width: u32 },
    /// Hamburger button
    Open,
    /// Close button
    Close,
    OverlayClick,
    NavLinkClick,
}

/// Show/hide logic for the navigation sidebar.
///
/// The controller re-evaluates on every resize without debouncing and has no
/// terminal state. When the page lacks a sidebar or a hamburger button every
/// event leaves the state alone.
#[derive(Clone, Copy, Debug)]
pub struct PanelController {
    breakpoint: u32,
    enabled: bool,
    has_overlay: bool,
    has_close: bool,
}

impl PanelController {
    pub fn new(breakpoint: u32, caps: &Capabilities) -> Self {
        PanelController {
            breakpoint,
            enabled: caps.sidebar && caps.hamburger,
            has_overlay: caps.overlay,
            has_close: caps.close_button,
        }
    }

    /// Runs the width check straight away so the first paint is already right.
    pub fn at_load(&self, width: u32) -> PanelState {
        let blank = PanelState {
            layout: LayoutMode::for_width(width, self.breakpoint),
            ..PanelState::default()
        };
        if !self.enabled {
            log::debug!("sidebar controls missing, panel left as rendered");
            return blank;
        }
        self.evaluate(width)
    }

    fn evaluate(&self, width: u32) -> PanelState {
        match LayoutMode::for_width(width, self.breakpoint) {
            LayoutMode::Mobile => PanelState {
                layout: LayoutMode::Mobile,
                panel: Visibility::Hidden,
                hamburger_visible: true,
                close_visible: self.has_close,
                overlay_active: false,
                scroll_locked: false,
            },
            LayoutMode::Desktop => PanelState {
                layout: LayoutMode::Desktop,
                panel: Visibility::Visible,
                hamburger_visible: false,
                close_visible: false,
                overlay_active: false,
                scroll_locked: false,
            },
        }
    }

    fn open(state: PanelState, has_overlay: bool) -> PanelState {
        PanelState {
            panel: Visibility::Visible,
            overlay_active: has_overlay,
            scroll_locked: true,
            ..state
        }
    }

    fn close(state: PanelState) -> PanelState {
        PanelState {
            panel: Visibility::Hidden,
            overlay_active: false,
            scroll_locked: false,
            ..state
        }
    }

    pub fn handle(&self, state: PanelState, event: PanelEvent) -> PanelState {
        if !self.enabled {
            return state;
        }

        match (event, state.layout) {
            (PanelEvent::Evaluate { width }, _) => self.evaluate(width),
            (_, LayoutMode::Desktop) => state,
            (PanelEvent::Open, LayoutMode::Mobile) => Self::open(state, self.has_overlay),
            (PanelEvent::Close, LayoutMode::Mobile) if self.has_close => Self::close(state),
            (PanelEvent::OverlayClick, LayoutMode::Mobile) if self.has_overlay => {
                Self::close(state)
            }
            (PanelEvent::NavLinkClick, LayoutMode::Mobile) => Self::close(state),
            _ => state,
        }
    }
}
