use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::chart::{self, ChartSeries};
use crate::codec::{self, Cell, Grid};
use crate::filter::Record;

/// Header written above exported records.
pub const RECORD_HEADER: [&str; 2] = ["Name", "Number"];

/// What a dashboard page is filled with: the records table and the series
/// behind each chart canvas.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardData {
    pub records: Vec<Record>,
    pub charts: Vec<(String, ChartSeries)>,
}

impl DashboardData {
    /// Series drawn on `canvas`, if the page was given data for it.
    pub fn chart(&self, canvas: &str) -> Option<&ChartSeries> {
        self.charts
            .iter()
            .find(|(name, _)| name == canvas)
            .map(|(_, series)| series)
    }

    /// Adds a chart when its injected data is present; skips it otherwise.
    pub fn inject_chart(&mut self, canvas: &str, labels: Option<Vec<String>>, values: Option<Vec<f64>>) {
        let Some(style) = chart::style_for_canvas(canvas) else {
            log::warn!("no chart style for canvas '{}'", canvas);
            return;
        };
        match ChartSeries::from_injected(labels, values, style) {
            Some(series) => {
                self.charts.retain(|(name, _)| name != canvas);
                self.charts.push((canvas.to_string(), series));
            }
            None => log::debug!("no data injected for '{}', chart skipped", canvas),
        }
    }

    /// The grid offered by the download button.
    pub fn export_grid(&self) -> Grid {
        if self.records.is_empty() {
            return codec::sample_grid();
        }
        codec::grid_from_records(&RECORD_HEADER, &self.records)
    }

    /// Replaces the records with the rows of an imported sheet.
    pub fn replace_records(&mut self, rows: &[Vec<Cell>]) {
        self.records = rows
            .iter()
            .skip(1)
            .map(|row| Record::new(row.iter().map(Cell::display)))
            .collect();
    }

    /// Demo content: a few staff records and a week/month of figures ending
    /// on `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let mut data = DashboardData {
            records: vec![
                Record::new(["John Doe", "0712345678"]),
                Record::new(["Jane Smith", "0723456789"]),
                Record::new(["Amina Odhiambo", "0734567890"]),
                Record::new(["Peter Kamau", "0745678901"]),
            ],
            charts: Vec::new(),
        };

        let days: Vec<NaiveDate> = (0..7).rev().map(|d| today - Duration::days(d)).collect();
        let day_labels: Vec<String> = days.iter().map(|d| d.format("%a").to_string()).collect();
        let date_labels: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();

        data.inject_chart(
            "earningsChart",
            Some(date_labels),
            Some(vec![1200.0, 950.0, 1430.0, 1100.0, 1680.0, 1520.0, 1750.0]),
        );
        data.inject_chart(
            "weeklyChart",
            Some(day_labels),
            Some(vec![12.0, 19.0, 3.0, 5.0, 2.0, 3.0, 9.0]),
        );
        data.inject_chart(
            "monthlyChart",
            Some((1..=4).map(|w| format!("Week {}", w)).collect()),
            Some(vec![65.0, 59.0, 80.0, 81.0]),
        );
        data
    }
}
