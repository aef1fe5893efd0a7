use serde::{Deserialize, Serialize};

/// Chart types a dashboard page can draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Bars filled with the series colour
    Bar,
    /// Unfilled line stroked with the series colour
    Line,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTitles {
    pub x: String,
    pub y: String,
}

/// Parallel labels and values plus how to draw them.
///
/// Built once per page from injected data and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub kind: ChartKind,
    pub axis_titles: AxisTitles,
    /// Legend text for the single dataset
    pub dataset_label: String,
    /// CSS colour used for bars or the line
    pub color: String,
}

impl ChartSeries {
    /// Builds a series from optionally injected page data.
    ///
    /// Returns `None` when either array was not provided, in which case the
    /// page simply has no chart.
    pub fn from_injected(
        labels: Option<Vec<String>>,
        values: Option<Vec<f64>>,
        style: ChartStyle,
    ) -> Option<Self> {
        let labels = labels?;
        let values = values?;
        if labels.len() != values.len() {
            log::warn!(
                "chart '{}' has {} labels but {} values",
                style.dataset_label,
                labels.len(),
                values.len()
            );
        }
        Some(ChartSeries {
            labels,
            values,
            kind: style.kind,
            axis_titles: AxisTitles {
                x: style.x_title.to_string(),
                y: style.y_title.to_string(),
            },
            dataset_label: style.dataset_label.to_string(),
            color: style.color.to_string(),
        })
    }
}

/// Fixed presentation of one of the dashboard charts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartStyle {
    pub kind: ChartKind,
    pub dataset_label: &'static str,
    pub color: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
}

pub const EARNINGS_CHART: ChartStyle = ChartStyle {
    kind: ChartKind::Bar,
    dataset_label: "Platform Earnings",
    color: "#007AFF",
    x_title: "Date",
    y_title: "Earnings",
};

pub const EARNINGS_TREND_CHART: ChartStyle = ChartStyle {
    kind: ChartKind::Line,
    dataset_label: "Earnings Over Time",
    color: "#007AFF",
    x_title: "Date",
    y_title: "Earnings",
};

pub const WEEKLY_CHART: ChartStyle = ChartStyle {
    kind: ChartKind::Line,
    dataset_label: "Weekly Data",
    color: "#007AFF",
    x_title: "Day",
    y_title: "Value",
};

pub const MONTHLY_CHART: ChartStyle = ChartStyle {
    kind: ChartKind::Bar,
    dataset_label: "Monthly Data",
    color: "#4caf50",
    x_title: "Week",
    y_title: "Value",
};

/// Looks up a chart style by the canvas id it is drawn on.
pub fn style_for_canvas(canvas: &str) -> Option<ChartStyle> {
    match canvas {
        "earningsChart" => Some(EARNINGS_CHART),
        "earningsTrendChart" => Some(EARNINGS_TREND_CHART),
        "weeklyChart" => Some(WEEKLY_CHART),
        "monthlyChart" => Some(MONTHLY_CHART),
        _ => None,
    }
}

// Configuration object in the shape browser charting libraries expect.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub scales: Scales,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub title: ScaleTitle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleTitle {
    pub display: bool,
    pub text: String,
}

impl Scale {
    fn titled(text: &str) -> Self {
        Scale {
            title: ScaleTitle {
                display: true,
                text: text.to_string(),
            },
        }
    }
}

impl From<&ChartSeries> for ChartConfig {
    fn from(series: &ChartSeries) -> Self {
        let dataset = match series.kind {
            ChartKind::Bar => Dataset {
                label: series.dataset_label.clone(),
                data: series.values.clone(),
                background_color: Some(series.color.clone()),
                border_color: None,
                fill: None,
                tension: None,
            },
            ChartKind::Line => Dataset {
                label: series.dataset_label.clone(),
                data: series.values.clone(),
                background_color: None,
                border_color: Some(series.color.clone()),
                fill: Some(false),
                tension: Some(0.1),
            },
        };

        ChartConfig {
            kind: series.kind,
            data: ChartData {
                labels: series.labels.clone(),
                datasets: vec![dataset],
            },
            options: ChartOptions {
                scales: Scales {
                    x: Scale::titled(&series.axis_titles.x),
                    y: Scale::titled(&series.axis_titles.y),
                },
            },
        }
    }
}

/// Something that can draw a chart configuration.
pub trait RenderSink {
    type Output;
    type Error: std::fmt::Display;

    fn draw(&mut self, config: &ChartConfig) -> Result<Self::Output, Self::Error>;
}

/// Result of handing a chart to a sink.
#[derive(Debug)]
pub struct RenderHandle<T> {
    pub kind: ChartKind,
    pub points: usize,
    /// Whatever the sink produced, or `None` if it reported a failure
    pub output: Option<T>,
}

/// Projects `series` onto `sink`.
///
/// Without a sink (no canvas on the page) nothing is drawn and `None` is
/// returned. Sink failures are logged and not retried.
pub fn render_chart<S: RenderSink>(
    sink: Option<&mut S>,
    series: &ChartSeries,
) -> Option<RenderHandle<S::Output>> {
    let sink = sink?;
    let config = ChartConfig::from(series);

    let output = match sink.draw(&config) {
        Ok(out) => Some(out),
        Err(e) => {
            log::warn!("rendering '{}' failed: {}", series.dataset_label, e);
            None
        }
    };

    Some(RenderHandle {
        kind: series.kind,
        points: series.values.len(),
        output,
    })
}

/// Sink that serializes the configuration for a browser-side chart library.
#[derive(Debug, Default)]
pub struct JsonSink;

impl RenderSink for JsonSink {
    type Output = serde_json::Value;
    type Error = serde_json::Error;

    fn draw(&mut self, config: &ChartConfig) -> Result<Self::Output, Self::Error> {
        serde_json::to_value(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        fail: bool,
    }

    impl RenderSink for CountingSink {
        type Output = usize;
        type Error = String;

        fn draw(&mut self, config: &ChartConfig) -> Result<usize, String> {
            self.calls += 1;
            if self.fail {
                Err("surface lost".to_string())
            } else {
                Ok(config.data.labels.len())
            }
        }
    }

    fn weekly() -> ChartSeries {
        ChartSeries::from_injected(
            Some(vec!["Mon".into(), "Tue".into()]),
            Some(vec![3.0, 4.5]),
            WEEKLY_CHART,
        )
        .unwrap()
    }

    #[test]
    fn missing_injected_data_means_no_series() {
        assert!(ChartSeries::from_injected(None, Some(vec![1.0]), EARNINGS_CHART).is_none());
        assert!(ChartSeries::from_injected(Some(vec![]), None, EARNINGS_CHART).is_none());
    }

    #[test]
    fn absent_sink_is_a_no_op() {
        let handle = render_chart::<CountingSink>(None, &weekly());
        assert!(handle.is_none());
    }

    #[test]
    fn sink_is_called_once() {
        let mut sink = CountingSink::default();
        let handle = render_chart(Some(&mut sink), &weekly()).unwrap();
        assert_eq!(sink.calls, 1);
        assert_eq!(handle.output, Some(2));
        assert_eq!(handle.points, 2);
    }

    #[test]
    fn sink_failure_is_not_retried() {
        let mut sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let handle = render_chart(Some(&mut sink), &weekly()).unwrap();
        assert_eq!(sink.calls, 1);
        assert!(handle.output.is_none());
    }

    #[test]
    fn line_config_matches_library_shape() {
        let value = render_chart(Some(&mut JsonSink), &weekly())
            .and_then(|h| h.output)
            .unwrap();
        assert_eq!(
            value,
            json!({
                "type": "line",
                "data": {
                    "labels": ["Mon", "Tue"],
                    "datasets": [{
                        "label": "Weekly Data",
                        "data": [3.0, 4.5],
                        "borderColor": "#007AFF",
                        "fill": false,
                        "tension": 0.1
                    }]
                },
                "options": {
                    "scales": {
                        "x": {"title": {"display": true, "text": "Day"}},
                        "y": {"title": {"display": true, "text": "Value"}}
                    }
                }
            })
        );
    }

    #[test]
    fn bar_config_uses_background_colour() {
        let series = ChartSeries::from_injected(
            Some(vec!["W1".into()]),
            Some(vec![10.0]),
            MONTHLY_CHART,
        )
        .unwrap();
        let config = ChartConfig::from(&series);
        let dataset = &config.data.datasets[0];
        assert_eq!(config.kind, ChartKind::Bar);
        assert_eq!(dataset.background_color.as_deref(), Some("#4caf50"));
        assert!(dataset.border_color.is_none());
        assert_eq!(config.options.scales.x.title.text, "Week");
    }

    #[test]
    fn canvas_ids_resolve_to_styles() {
        assert_eq!(style_for_canvas("earningsChart"), Some(EARNINGS_CHART));
        assert_eq!(style_for_canvas("monthlyChart"), Some(MONTHLY_CHART));
        assert_eq!(style_for_canvas("pieChart"), None);
    }
}
