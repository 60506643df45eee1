//! HTML dashboard adapter implementing [`ReportPort`].
//!
//! Renders one self-contained page with Askama: the input summary (or an
//! input form when served over HTTP), warnings, the normalized line chart,
//! the correlation heatmap and the strongest/weakest pair lines.

pub mod chart_svg;

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::dashboard::DashboardOutcome;
use crate::domain::error::IndexboardError;
use crate::domain::registry::IndexRegistry;
use crate::ports::report_port::ReportPort;

pub const PAGE_TITLE: &str = "Global Market Indices Dashboard";
pub const NO_VALID_DATA_MESSAGE: &str = "No valid data to display.";

pub struct IndexOption {
    pub name: String,
    pub checked: bool,
}

pub struct LegendEntry {
    pub name: String,
    pub color: &'static str,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub selected: Vec<String>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub line_svg: String,
    pub heatmap_svg: String,
    pub legend: Vec<LegendEntry>,
    pub strongest: Option<String>,
    pub weakest: Option<String>,
    pub options: Vec<IndexOption>,
}

impl DashboardPage {
    pub fn from_outcome(outcome: &DashboardOutcome) -> Self {
        let selection = outcome.selection();
        let mut page = Self {
            title: PAGE_TITLE.to_string(),
            start_date: selection.start_date.format("%Y-%m-%d").to_string(),
            end_date: selection.end_date.format("%Y-%m-%d").to_string(),
            selected: selection.display_names.clone(),
            warnings: outcome.warnings().to_vec(),
            error: None,
            line_svg: String::new(),
            heatmap_svg: String::new(),
            legend: Vec::new(),
            strongest: None,
            weakest: None,
            options: Vec::new(),
        };

        match outcome.view() {
            Some(view) => {
                page.line_svg = chart_svg::line_chart_svg(&view.normalized);
                page.heatmap_svg = chart_svg::heatmap_svg(&view.correlation.matrix);
                page.legend = view
                    .normalized
                    .names()
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| LegendEntry {
                        name: name.to_string(),
                        color: chart_svg::series_color(i),
                    })
                    .collect();
                page.strongest = view.strongest_line();
                page.weakest = view.weakest_line();
            }
            None => page.error = Some(NO_VALID_DATA_MESSAGE.to_string()),
        }
        page
    }

    /// Adds the index/date input form, pre-checking the current selection.
    pub fn with_form(mut self, registry: &IndexRegistry) -> Self {
        self.options = registry
            .all_display_names()
            .into_iter()
            .map(|name| IndexOption {
                checked: self.selected.iter().any(|s| s == name),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn to_html(&self) -> Result<String, IndexboardError> {
        self.render().map_err(|e| IndexboardError::Render {
            reason: e.to_string(),
        })
    }
}

pub fn render_html(outcome: &DashboardOutcome) -> Result<String, IndexboardError> {
    DashboardPage::from_outcome(outcome).to_html()
}

pub struct HtmlDashboardAdapter;

impl HtmlDashboardAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlDashboardAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlDashboardAdapter {
    fn write(&self, outcome: &DashboardOutcome, output_path: &str) -> Result<(), IndexboardError> {
        let html = render_html(outcome)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, html)?;
        Ok(())
    }
}
