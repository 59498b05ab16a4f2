use std::path::PathBuf;

use anyhow::Context as _;
use triage_core::analysis::{
    minutes_to_hours, ComparisonResult, DashboardMetrics, DashboardSummary, EfficiencyTrend,
    ExportFormat, Metric, TrendGrouping,
};
use triage_core::types::DbId;

use super::{write_output, Context};
use crate::app::{CompareArgs, DateRangeArgs};
use crate::table::{opt_hours, opt_num, Table};

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn dashboard(ctx: &Context, days: u32) -> anyhow::Result<()> {
    let rows = ctx
        .client
        .dashboard_metrics(days)
        .await
        .context("Failed to load dashboard metrics")?;

    println!("Last {days} days");
    print_metrics(&rows);
    print_summary(&DashboardSummary::from_rows(&rows));
    Ok(())
}

pub async fn workload(ctx: &Context, days: u32) -> anyhow::Result<()> {
    let rows = ctx
        .client
        .workload_distribution(days)
        .await
        .context("Failed to load workload distribution")?;

    let mut table = Table::new([
        "Assignee",
        "Department",
        "Tickets",
        "Workload h",
        "Overtime h",
        "Avg logged h",
    ]);
    for m in &rows {
        table.row(vec![
            m.assignee_name.clone(),
            m.department.clone(),
            m.total_tickets.to_string(),
            opt_num(m.workload_hours, 1),
            opt_num(m.overtime_hours, 1),
            opt_num(m.avg_logged_time, 1),
        ]);
    }
    print_or_empty(&table);
    Ok(())
}

pub async fn ranking(ctx: &Context, rank_by: &str, limit: u32, days: u32) -> anyhow::Result<()> {
    let rows = ctx
        .client
        .performance_ranking(rank_by, limit, days)
        .await
        .context("Failed to load performance ranking")?;

    let mut table = Table::new([
        "#",
        "Assignee",
        "Department",
        "Efficiency",
        "Completion %",
        "Tickets",
    ]);
    for (rank, m) in rows.iter().enumerate() {
        table.row(vec![
            (rank + 1).to_string(),
            m.assignee_name.clone(),
            m.department.clone(),
            opt_num(m.efficiency_score, 1),
            opt_num(m.completion_rate, 1),
            m.total_tickets.to_string(),
        ]);
    }
    println!("Ranked by {rank_by}, last {days} days");
    print_or_empty(&table);
    Ok(())
}

pub async fn bottlenecks(ctx: &Context, days: u32) -> anyhow::Result<()> {
    let rows = ctx
        .client
        .bottleneck_analysis(days)
        .await
        .context("Failed to load bottleneck analysis")?;

    let mut table = Table::new([
        "Assignee",
        "Department",
        "Tickets",
        "Avg logged h",
        "Overtime h",
        "Completion %",
    ]);
    for m in &rows {
        table.row(vec![
            m.assignee_name.clone(),
            m.department.clone(),
            m.total_tickets.to_string(),
            opt_num(m.avg_logged_time, 1),
            opt_num(m.overtime_hours, 1),
            opt_num(m.completion_rate, 1),
        ]);
    }
    print_or_empty(&table);
    Ok(())
}

pub async fn trend(
    ctx: &Context,
    range: &DateRangeArgs,
    group_by: TrendGrouping,
) -> anyhow::Result<()> {
    let (start, end) = range.resolve(today())?;
    let series = ctx
        .client
        .efficiency_trend(start, end, group_by)
        .await
        .context("Failed to load efficiency trend")?;

    println!("{start} to {end}, grouped {group_by}");
    print_trend(&series);
    Ok(())
}

pub async fn assignee_metrics(
    ctx: &Context,
    assignee_id: DbId,
    range: &DateRangeArgs,
) -> anyhow::Result<()> {
    let (start, end) = range.resolve(today())?;
    let rows = ctx
        .client
        .assignee_metrics(assignee_id, start, end)
        .await
        .with_context(|| format!("Failed to load metrics for assignee {assignee_id}"))?;

    println!("Assignee {assignee_id}, {start} to {end}");
    print_metrics(&rows);
    Ok(())
}

pub async fn ai_analysis(ctx: &Context, range: &DateRangeArgs) -> anyhow::Result<()> {
    let (start, end) = range.resolve(today())?;
    let result = ctx
        .client
        .ai_assignment_analysis(start, end)
        .await
        .context("Failed to load AI assignment analysis")?;

    print_comparison(&result);
    Ok(())
}

pub async fn compare(ctx: &Context, args: &CompareArgs) -> anyhow::Result<()> {
    let request = args.to_request(today())?;
    tracing::info!(
        analysis = %request.analysis_name,
        start = %request.start_date,
        end = %request.end_date,
        "Running comparison",
    );

    let result = ctx
        .client
        .compare(&request)
        .await
        .context("Comparison failed")?;

    print_comparison(&result);
    Ok(())
}

pub async fn export(
    ctx: &Context,
    args: &CompareArgs,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let request = args.to_request(today())?;
    let bytes = ctx
        .client
        .export_report(&request, format)
        .await
        .context("Report export failed")?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", request.analysis_name, format.extension()))
    });
    write_output(&path, &bytes).await
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_or_empty(table: &Table) {
    if table.is_empty() {
        println!("No data for this period.");
    } else {
        table.print();
    }
}

fn print_metrics(rows: &[DashboardMetrics]) {
    let mut table = Table::new([
        "Assignee",
        "Department",
        "Total",
        "AI",
        "Manual",
        "AI %",
        "AI avg h",
        "Manual avg h",
        "Completion %",
        "Efficiency",
    ]);
    for m in rows {
        table.row(vec![
            m.assignee_name.clone(),
            m.department.clone(),
            m.total_tickets.to_string(),
            m.ai_tickets.to_string(),
            m.manual_tickets.to_string(),
            format!("{:.1}", m.ai_share_percent()),
            opt_hours(m.ai_avg_time),
            opt_hours(m.manual_avg_time),
            opt_num(m.completion_rate, 1),
            opt_num(m.efficiency_score, 1),
        ]);
    }
    print_or_empty(&table);
}

fn summary_lines(summary: &DashboardSummary) -> Vec<String> {
    if summary.total_tickets == 0 {
        return Vec::new();
    }

    let mut lines = vec![format!(
        "{} tickets, {} assigned by AI ({:.1}%)",
        summary.total_tickets,
        summary.ai_tickets,
        summary.ai_share_percent()
    )];
    lines.push(format!(
        "Avg processing: AI {}h, manual {}h",
        opt_hours(summary.avg_ai_time),
        opt_hours(summary.avg_manual_time)
    ));
    lines.push(format!(
        "Avg completion rate: {}%",
        opt_num(summary.avg_completion_rate, 1)
    ));
    if let Some(verdict) = summary.speed_verdict() {
        lines.push(format!("  ! {}", verdict.message()));
    }
    lines
}

fn print_summary(summary: &DashboardSummary) {
    for line in summary_lines(summary) {
        println!("{line}");
    }
}

fn print_trend(series: &[EfficiencyTrend]) {
    let mut table = Table::new([
        "Period",
        "AI proc h",
        "Manual proc h",
        "AI completion %",
        "Manual completion %",
    ]);
    for point in series {
        table.row(vec![
            format!("{} to {}", point.period_start, point.period_end),
            format!("{:.1}", minutes_to_hours(point.ai_avg_processing_time)),
            format!("{:.1}", minutes_to_hours(point.manual_avg_processing_time)),
            format!("{:.1}", point.ai_completion_rate),
            format!("{:.1}", point.manual_completion_rate),
        ]);
    }
    print_or_empty(&table);
}

/// Marker shown next to an improvement delta.
fn delta_cell(result: &ComparisonResult, metric: Metric) -> String {
    let delta = result.improvements.get(metric);
    if delta == 0.0 {
        return "0.0% (no change)".to_string();
    }
    let verdict = if result.improvements.is_favorable(metric) {
        "better"
    } else {
        "worse"
    };
    format!("{delta:+.1}% ({verdict})")
}

fn metric_rows(result: &ComparisonResult) -> Vec<Vec<String>> {
    Metric::ALL
        .into_iter()
        .map(|metric| {
            vec![
                metric.label().to_string(),
                metric.format(result.ai_metrics.get(metric)),
                metric.format(result.manual_metrics.get(metric)),
                delta_cell(result, metric),
            ]
        })
        .collect()
}

fn print_comparison(result: &ComparisonResult) {
    if !result.analysis_name.is_empty() {
        println!("Analysis: {}", result.analysis_name);
    }
    if !result.date_range_start.is_empty() {
        println!(
            "Period:   {} to {}",
            result.date_range_start, result.date_range_end
        );
    }

    let mut table = Table::new(["Metric", "AI", "Manual", "Change"]);
    for row in metric_rows(result) {
        table.row(row);
    }
    table.row(vec![
        "Tickets".to_string(),
        result.ai_metrics.total_tickets.to_string(),
        result.manual_metrics.total_tickets.to_string(),
        String::new(),
    ]);
    table.print();

    println!(
        "Sample sizes: {} AI, {} manual",
        result.sample_sizes.ai, result.sample_sizes.manual
    );
    if result.is_significant() {
        println!(
            "Statistically significant (p = {:.4}, confidence {:.1}%)",
            result.statistical_significance, result.confidence_level
        );
    } else {
        println!(
            "Not statistically significant (p = {:.4})",
            result.statistical_significance
        );
    }

    for advisory in result.advisories() {
        println!("  ! {}", advisory.message());
    }
    println!("Recommendations:");
    for recommendation in result.recommendations() {
        println!("  - {}", recommendation.message());
    }
}

#[cfg(test)]
mod tests {
    use triage_core::analysis::Improvements;

    use super::*;

    #[test]
    fn comparison_table_shows_hours_for_minute_values() {
        let result: ComparisonResult = serde_json::from_value(serde_json::json!({
            "aiMetrics": { "avgProcessingTime": 120, "avgResponseTime": 30, "completionRate": 88.0 },
            "manualMetrics": { "avgProcessingTime": 180, "avgResponseTime": 60, "completionRate": 80.0 },
        }))
        .unwrap();

        let rows = metric_rows(&result);
        assert_eq!(rows[0][0], "Processing time");
        assert_eq!(rows[0][1], "2.0h");
        assert_eq!(rows[0][2], "3.0h");
        assert_eq!(rows[1][1], "0.5h");
        assert_eq!(rows[1][2], "1.0h");
        assert_eq!(rows[2][1], "88.0%");
    }

    #[test]
    fn dashboard_summary_reports_averages_and_speedup() {
        let rows = vec![
            DashboardMetrics {
                total_tickets: 40,
                ai_tickets: 30,
                ai_avg_time: Some(90.0),
                manual_avg_time: Some(180.0),
                completion_rate: Some(92.0),
                ..Default::default()
            },
            DashboardMetrics {
                total_tickets: 10,
                ai_tickets: 0,
                ai_avg_time: None,
                manual_avg_time: None,
                completion_rate: None,
                ..Default::default()
            },
        ];

        let lines = summary_lines(&DashboardSummary::from_rows(&rows));
        assert_eq!(lines[0], "50 tickets, 30 assigned by AI (60.0%)");
        assert_eq!(lines[1], "Avg processing: AI 1.5h, manual 3.0h");
        assert_eq!(lines[2], "Avg completion rate: 92.0%");
        assert!(lines[3].contains("50% faster"));
    }

    #[test]
    fn empty_dashboard_has_no_summary() {
        assert!(summary_lines(&DashboardSummary::from_rows(&[])).is_empty());
    }

    #[test]
    fn delta_cells_mark_direction_per_metric() {
        let result = ComparisonResult {
            improvements: Improvements {
                processing_time: -12.5,
                response_time: 4.0,
                completion_rate: 7.3,
                customer_satisfaction: 0.0,
            },
            ..Default::default()
        };

        assert_eq!(delta_cell(&result, Metric::ProcessingTime), "-12.5% (better)");
        assert_eq!(delta_cell(&result, Metric::ResponseTime), "+4.0% (worse)");
        assert_eq!(delta_cell(&result, Metric::CompletionRate), "+7.3% (better)");
        assert_eq!(
            delta_cell(&result, Metric::CustomerSatisfaction),
            "0.0% (no change)"
        );
    }
}
