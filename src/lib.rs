/*!
# Admin Dashboard

Page controllers for a web administration dashboard, with a small server
that hosts the pages.

## Overview

Every dashboard page is a handful of independent controls wired up when the
page loads: a collapsible sidebar, a light/dark theme switch, a searchable
records table, spreadsheet upload and download, and a few charts. This crate
holds the logic behind those controls as plain, testable Rust and serves the
pages with axum.

## Architecture

### Controllers
- **View State** - panel flag, theme and last applied filters, passed in and
  returned by each handler
- **Filter Engine** - case-insensitive name/number substring search over records
- **Tabular Codec** - xlsx bytes to rows and back (calamine, rust_xlsxwriter)
- **Chart Projection** - chart series to a charting-library configuration,
  handed to any render sink
- **Panel Controller** - sidebar show/hide state machine over viewport width
- **Capabilities** - which of the above a page can offer, resolved once

### Server Layer (`web` feature)
- **Import** - single-shot decode tasks where a newer upload from the same
  page cancels the older one
- **Graph** - PNG rendering of chart configurations with plotters
- **Pages** - handlebars templates for the dashboard and login form
- **App** - routing and handlers

## Modules

- **view_state**: ViewState and Theme
- **filter**: Record, FilterQuery and `filter_records`
- **codec**: spreadsheet decode/encode
- **chart**: ChartSeries, ChartConfig, RenderSink and `render_chart`
- **panel**: sidebar state machine
- **capabilities**: page element detection
- **login**: login form validation and handlers
- **data**: dashboard content and demo data
- **config**: environment configuration
- **error**: umbrella error type

## REST API Endpoints

- `/` - Dashboard page (`?name=`, `?number=`, `?theme=`, `?width=`)
- `/dashboard.js` - Page script forwarding sidebar and theme events
- `/login` - Login form
- `/import` - Upload from the page form; answers with the page and a notice
- `/api/records` - Records with per-row visibility
- `/api/import` - Upload an xlsx file (multipart fields `excel`, optional `source`)
- `/api/export` - Download the records as `export.xlsx`
- `/api/chart/{canvas}` - Chart configuration as JSON
- `/charts/{canvas}.png` - Chart as an image
- `/api/panel` - Next sidebar state for an event
- `/api/theme` - Theme switch
*/

pub mod capabilities;
pub mod chart;
pub mod codec;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod login;
pub mod panel;
pub mod view_state;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod import;
#[cfg(feature = "web")]
pub mod pages;

/// Re-export the everyday types so pages can `use dashboard::*`
pub use capabilities::Capabilities;
pub use chart::{ChartConfig, ChartKind, ChartSeries, RenderSink, render_chart};
pub use codec::{Cell, CodecError, SpreadsheetDocument, decode, encode};
pub use error::DashboardError;
pub use filter::{FilterQuery, Record, filter_records};
pub use login::{ValidationError, validate_login};
pub use panel::{LayoutMode, PanelController, PanelEvent, PanelState, Visibility};
pub use view_state::{Theme, ViewState};
