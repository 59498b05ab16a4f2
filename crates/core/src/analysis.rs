//! Comparison-analysis requests and the metric records returned by the
//! `/analysis/*` endpoints.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Ranking key used when the caller does not choose one.
pub const DEFAULT_RANK_BY: &str = "EFFICIENCY_SCORE";

/// Parameters for one AI-versus-manual comparison run.
///
/// Filter sets are `None` when the user selected nothing; they are
/// omitted from the wire format entirely rather than sent as empty
/// arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub analysis_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<DbId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_types: Option<Vec<String>>,
}

impl AnalysisRequest {
    /// Start a request for the inclusive range `start..=end`.
    pub fn new(
        analysis_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, CoreError> {
        if end_date < start_date {
            return Err(CoreError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            analysis_name: analysis_name.into(),
            start_date,
            end_date,
            assignee_ids: None,
            departments: None,
            priorities: None,
            ticket_types: None,
        })
    }

    /// Name used when the user leaves the analysis name blank.
    pub fn default_name(today: NaiveDate) -> String {
        format!("efficiency_comparison_{today}")
    }

    pub fn with_assignees(mut self, ids: Vec<DbId>) -> Self {
        self.assignee_ids = non_empty(ids);
        self
    }

    pub fn with_departments(mut self, departments: Vec<String>) -> Self {
        self.departments = clean_labels(departments);
        self
    }

    pub fn with_priorities(mut self, priorities: Vec<String>) -> Self {
        self.priorities = clean_labels(priorities);
        self
    }

    pub fn with_ticket_types(mut self, ticket_types: Vec<String>) -> Self {
        self.ticket_types = clean_labels(ticket_types);
        self
    }
}

/// Inclusive date range ending today, `days` long.
pub fn trailing_range(today: NaiveDate, days: u32) -> Result<(NaiveDate, NaiveDate), CoreError> {
    Duration::try_days(i64::from(days))
        .and_then(|window| today.checked_sub_signed(window))
        .map(|start| (start, today))
        .ok_or(CoreError::WindowOutOfRange { end: today, days })
}

/// Times arrive from the backend in minutes; they are shown in hours.
pub fn minutes_to_hours(minutes: f64) -> f64 {
    minutes / 60.0
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Trim free-text filter values and drop blanks before the emptiness check,
/// so a form field left as `""` never reaches the wire.
fn clean_labels(values: Vec<String>) -> Option<Vec<String>> {
    non_empty(
        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}

/// Aggregate metrics for one assignment method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisMetrics {
    pub avg_processing_time: f64,
    pub avg_response_time: f64,
    pub completion_rate: f64,
    pub total_tickets: i64,
    pub customer_satisfaction: f64,
}

/// Percentage deltas of AI assignment relative to manual assignment.
///
/// The backend sends these keys in snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Improvements {
    pub processing_time: f64,
    pub response_time: f64,
    pub completion_rate: f64,
    pub customer_satisfaction: f64,
}

/// The four metrics compared between assignment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    ProcessingTime,
    ResponseTime,
    CompletionRate,
    CustomerSatisfaction,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::ProcessingTime,
        Metric::ResponseTime,
        Metric::CompletionRate,
        Metric::CustomerSatisfaction,
    ];

    /// Time metrics improve when they go down.
    pub fn is_time_metric(self) -> bool {
        matches!(self, Metric::ProcessingTime | Metric::ResponseTime)
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::ProcessingTime => "Processing time",
            Metric::ResponseTime => "Response time",
            Metric::CompletionRate => "Completion rate",
            Metric::CustomerSatisfaction => "Customer satisfaction",
        }
    }

    /// Display unit of [`format`](Self::format).
    pub fn unit(self) -> &'static str {
        match self {
            Metric::ProcessingTime | Metric::ResponseTime => "h",
            Metric::CompletionRate => "%",
            Metric::CustomerSatisfaction => "",
        }
    }

    /// Render a raw wire value. Time metrics are converted from minutes.
    pub fn format(self, value: f64) -> String {
        match self {
            Metric::ProcessingTime | Metric::ResponseTime => {
                format!("{:.1}{}", minutes_to_hours(value), self.unit())
            }
            Metric::CompletionRate => format!("{value:.1}{}", self.unit()),
            Metric::CustomerSatisfaction => format!("{value:.2}"),
        }
    }
}

impl Improvements {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ProcessingTime => self.processing_time,
            Metric::ResponseTime => self.response_time,
            Metric::CompletionRate => self.completion_rate,
            Metric::CustomerSatisfaction => self.customer_satisfaction,
        }
    }

    /// Whether the delta for `metric` favours AI assignment.
    ///
    /// Negative deltas are favourable for time metrics, positive deltas
    /// for rate metrics. A zero delta is never favourable.
    pub fn is_favorable(&self, metric: Metric) -> bool {
        let delta = self.get(metric);
        if metric.is_time_metric() {
            delta < 0.0
        } else {
            delta > 0.0
        }
    }
}

impl AnalysisMetrics {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ProcessingTime => self.avg_processing_time,
            Metric::ResponseTime => self.avg_response_time,
            Metric::CompletionRate => self.completion_rate,
            Metric::CustomerSatisfaction => self.customer_satisfaction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSizes {
    pub ai: i64,
    pub manual: i64,
}

/// Outcome of a comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonResult {
    pub analysis_name: String,
    pub analysis_date: String,
    pub date_range_start: String,
    pub date_range_end: String,
    pub ai_metrics: AnalysisMetrics,
    pub manual_metrics: AnalysisMetrics,
    pub improvements: Improvements,
    /// p-value reported by the backend.
    pub statistical_significance: f64,
    pub confidence_level: f64,
    pub sample_sizes: SampleSizes,
}

/// Per-assignee metrics row used by the dashboard, workload, ranking and
/// bottleneck views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    pub assignee_name: String,
    pub department: String,
    pub total_tickets: i64,
    pub ai_tickets: i64,
    pub manual_tickets: i64,
    pub ai_avg_time: Option<f64>,
    pub manual_avg_time: Option<f64>,
    pub avg_logged_time: Option<f64>,
    pub completion_rate: Option<f64>,
    pub efficiency_score: Option<f64>,
    pub workload_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
}

impl DashboardMetrics {
    /// Share of this assignee's tickets routed by AI, in percent.
    pub fn ai_share_percent(&self) -> f64 {
        if self.total_tickets > 0 {
            self.ai_tickets as f64 / self.total_tickets as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Headline figures over a set of dashboard rows.
///
/// Averages only count rows that report a non-zero value, so assignees
/// without AI (or manual) tickets do not drag the mean towards zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_tickets: i64,
    pub ai_tickets: i64,
    /// Minutes.
    pub avg_ai_time: Option<f64>,
    /// Minutes.
    pub avg_manual_time: Option<f64>,
    pub avg_completion_rate: Option<f64>,
}

/// How AI processing time compares with manual processing time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedVerdict {
    /// AI is faster by this many percent of the manual time.
    AiFaster(f64),
    AiNotFaster,
}

impl SpeedVerdict {
    pub fn message(self) -> String {
        match self {
            SpeedVerdict::AiFaster(pct) => format!(
                "AI assignment is effective: average processing time is {pct:.0}% faster than manual assignment"
            ),
            SpeedVerdict::AiNotFaster => {
                "AI assignment needs tuning: average processing time is not better than \
                 manual assignment; review the routing algorithm"
                    .to_string()
            }
        }
    }
}

impl DashboardSummary {
    pub fn from_rows(rows: &[DashboardMetrics]) -> Self {
        Self {
            total_tickets: rows.iter().map(|m| m.total_tickets).sum(),
            ai_tickets: rows.iter().map(|m| m.ai_tickets).sum(),
            avg_ai_time: mean_reported(rows.iter().map(|m| m.ai_avg_time)),
            avg_manual_time: mean_reported(rows.iter().map(|m| m.manual_avg_time)),
            avg_completion_rate: mean_reported(rows.iter().map(|m| m.completion_rate)),
        }
    }

    pub fn ai_share_percent(&self) -> f64 {
        if self.total_tickets > 0 {
            self.ai_tickets as f64 / self.total_tickets as f64 * 100.0
        } else {
            0.0
        }
    }

    /// `None` unless both averages are available.
    pub fn speed_verdict(&self) -> Option<SpeedVerdict> {
        let ai = self.avg_ai_time?;
        let manual = self.avg_manual_time?;
        if ai < manual {
            Some(SpeedVerdict::AiFaster((manual - ai) / manual * 100.0))
        } else {
            Some(SpeedVerdict::AiNotFaster)
        }
    }
}

fn mean_reported(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let reported: Vec<f64> = values.flatten().filter(|v| *v != 0.0).collect();
    if reported.is_empty() {
        None
    } else {
        Some(reported.iter().sum::<f64>() / reported.len() as f64)
    }
}

/// One period of the efficiency trend series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EfficiencyTrend {
    pub period_start: String,
    pub period_end: String,
    pub ai_avg_processing_time: f64,
    pub manual_avg_processing_time: f64,
    pub ai_completion_rate: f64,
    pub manual_completion_rate: f64,
}

/// Bucket size for the trend endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendGrouping {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl TrendGrouping {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendGrouping::Daily => "DAILY",
            TrendGrouping::Weekly => "WEEKLY",
            TrendGrouping::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for TrendGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendGrouping {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(TrendGrouping::Daily),
            "WEEKLY" => Ok(TrendGrouping::Weekly),
            "MONTHLY" => Ok(TrendGrouping::Monthly),
            _ => Err(CoreError::Parse {
                kind: "trend grouping",
                value: s.to_string(),
            }),
        }
    }
}

/// Report formats offered by `/analysis/export-report`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Excel => "EXCEL",
        }
    }

    /// File extension for a downloaded report.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PDF" => Ok(ExportFormat::Pdf),
            "EXCEL" | "XLSX" => Ok(ExportFormat::Excel),
            _ => Err(CoreError::Parse {
                kind: "export format",
                value: s.to_string(),
            }),
        }
    }
}
