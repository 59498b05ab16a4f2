use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use triage_core::analysis::{
    trailing_range, AnalysisRequest, ExportFormat, TrendGrouping, DEFAULT_RANK_BY,
};
use triage_core::assignee::SkillLevel;
use triage_core::error::CoreError;
use triage_core::import::{ImportType, TemplateFormat};
use triage_core::types::DbId;

#[derive(Debug, Parser)]
#[command(name = "triage", version)]
#[command(about = "Compare AI and manual ticket assignment, and manage imports")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the API base URL (TRIAGE_API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a bearer token for later commands
    Login {
        #[arg(long)]
        token: String,
    },

    /// Forget the stored token
    Logout,

    /// Per-assignee ticket metrics for the dashboard
    Dashboard {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Workload hours and overtime per assignee
    Workload {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Assignee performance ranking
    Ranking {
        /// Ranking key, e.g. EFFICIENCY_SCORE or COMPLETION_RATE
        #[arg(long, default_value = DEFAULT_RANK_BY)]
        rank_by: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Assignees with the heaviest or slowest queues
    Bottlenecks {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// AI versus manual processing-time trend
    Trend {
        #[command(flatten)]
        range: DateRangeArgs,
        /// DAILY, WEEKLY or MONTHLY
        #[arg(long, default_value = "WEEKLY")]
        group_by: TrendGrouping,
    },

    /// Metrics for a single assignee
    AssigneeMetrics {
        id: DbId,
        #[command(flatten)]
        range: DateRangeArgs,
    },

    /// Backend's own AI assignment analysis for a period
    AiAnalysis {
        #[command(flatten)]
        range: DateRangeArgs,
    },

    /// Run an AI versus manual comparison
    Compare(CompareArgs),

    /// Export a comparison report as PDF or Excel
    Export {
        #[command(flatten)]
        compare: CompareArgs,
        /// PDF or EXCEL
        #[arg(long, default_value = "PDF")]
        format: ExportFormat,
        /// Output file (defaults to <analysis name>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate and upload a data file, then follow its progress
    Import {
        file: PathBuf,
        /// JIRA_TICKETS or ASSIGNEES
        #[arg(long, default_value = "JIRA_TICKETS")]
        import_type: ImportType,
        /// Accept validation warnings without asking
        #[arg(short, long)]
        yes: bool,
        /// Return once the upload is accepted instead of following progress
        #[arg(long)]
        no_wait: bool,
    },

    /// List import jobs
    Logs {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Show one import job
    Status { id: DbId },

    /// Retry a failed import job
    Retry {
        id: DbId,
        /// Follow progress of the retried job
        #[arg(long)]
        wait: bool,
    },

    /// Delete an import job
    Delete {
        id: DbId,
        /// Also delete the records the job imported
        #[arg(long)]
        delete_data: bool,
    },

    /// Download an import template
    Template {
        /// JIRA_TICKETS or ASSIGNEES
        #[arg(long = "type", default_value = "JIRA_TICKETS")]
        template_type: ImportType,
        /// CSV, EXCEL or JSON
        #[arg(long, default_value = "CSV")]
        format: TemplateFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import statistics
    Stats {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Manage assignees
    Assignees {
        #[command(subcommand)]
        command: AssigneeCommand,
    },

    /// List filter values known to the backend
    Filters {
        #[command(subcommand)]
        command: FilterCommand,
    },

    /// Backend health
    Health,

    /// Backend build and host information
    Info,

    /// Print live dashboard updates until interrupted
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum AssigneeCommand {
    List,

    Create {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
        #[arg(long, default_value = "INTERMEDIATE")]
        skill_level: SkillLevel,
        /// Repeat for several specializations
        #[arg(long)]
        specialization: Vec<String>,
        /// Create the assignee as inactive
        #[arg(long)]
        inactive: bool,
    },

    Update {
        id: DbId,
        #[arg(long)]
        employee_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        skill_level: Option<SkillLevel>,
        /// Replaces the whole list; repeat for several values
        #[arg(long)]
        specialization: Option<Vec<String>>,
        #[arg(long)]
        active: Option<bool>,
    },

    Delete { id: DbId },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum FilterCommand {
    Departments,
    Priorities,
    TicketTypes,
}

/// `--start/--end`, falling back to the trailing `--days` window.
#[derive(Debug, Clone, Args)]
pub struct DateRangeArgs {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Window length used for whichever bound is missing
    #[arg(long, default_value_t = 30)]
    pub days: u32,
}

impl DateRangeArgs {
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), CoreError> {
        let end = self.end.unwrap_or(today);
        let start = match self.start {
            Some(start) => start,
            None => trailing_range(end, self.days)?.0,
        };
        Ok((start, end))
    }
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub range: DateRangeArgs,
    /// Analysis name (defaults to efficiency_comparison_<today>)
    #[arg(long)]
    pub name: Option<String>,
    /// Restrict to these assignee ids; repeatable
    #[arg(long = "assignee")]
    pub assignees: Vec<DbId>,
    #[arg(long = "department")]
    pub departments: Vec<String>,
    #[arg(long = "priority")]
    pub priorities: Vec<String>,
    #[arg(long = "ticket-type")]
    pub ticket_types: Vec<String>,
}

impl CompareArgs {
    pub fn to_request(&self, today: NaiveDate) -> anyhow::Result<AnalysisRequest> {
        let (start, end) = self.range.resolve(today)?;
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => AnalysisRequest::default_name(today),
        };

        Ok(AnalysisRequest::new(name, start, end)?
            .with_assignees(self.assignees.clone())
            .with_departments(self.departments.clone())
            .with_priorities(self.priorities.clone())
            .with_ticket_types(self.ticket_types.clone()))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compare_builds_request_with_filters() {
        let cli = Cli::try_parse_from([
            "triage",
            "compare",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--department",
            "Ops",
            "--department",
            " ",
            "--assignee",
            "7",
        ])
        .unwrap();

        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        let request = args.to_request(date(2024, 2, 15)).unwrap();

        assert_eq!(request.analysis_name, "efficiency_comparison_2024-02-15");
        assert_eq!(request.start_date, date(2024, 1, 1));
        assert_eq!(request.end_date, date(2024, 1, 31));
        assert_eq!(request.departments, Some(vec!["Ops".to_string()]));
        assert_eq!(request.assignee_ids, Some(vec![7]));
        assert_eq!(request.priorities, None);
    }

    #[test]
    fn reversed_range_is_refused() {
        let cli = Cli::try_parse_from([
            "triage", "compare", "--start", "2024-03-01", "--end", "2024-01-01",
        ])
        .unwrap();
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert!(args.to_request(date(2024, 3, 2)).is_err());
    }

    #[test]
    fn missing_bounds_fall_back_to_trailing_window() {
        let range = DateRangeArgs {
            start: None,
            end: None,
            days: 7,
        };
        assert_eq!(
            range.resolve(date(2024, 5, 10)).unwrap(),
            (date(2024, 5, 3), date(2024, 5, 10))
        );
    }

    #[test]
    fn huge_day_window_is_an_error_not_a_crash() {
        let cli = Cli::try_parse_from(["triage", "trend", "--days", "200000000"]).unwrap();
        let Command::Trend { range, .. } = cli.command else {
            panic!("expected trend");
        };
        assert!(range.resolve(date(2024, 1, 31)).is_err());

        let cli = Cli::try_parse_from(["triage", "compare", "--days", "4000000000"]).unwrap();
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        let err = args.to_request(date(2024, 1, 31)).unwrap_err();
        assert!(err.to_string().contains("4000000000-day window"));
    }

    #[test]
    fn enum_arguments_parse_case_insensitively() {
        let cli = Cli::try_parse_from([
            "triage", "template", "--type", "assignees", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Template {
                template_type,
                format,
                output,
            } => {
                assert_eq!(template_type, ImportType::Assignees);
                assert_eq!(format, TemplateFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn import_flags_parse() {
        let cli = Cli::try_parse_from(["triage", "import", "tickets.csv", "--yes"]).unwrap();
        match cli.command {
            Command::Import {
                file,
                import_type,
                yes,
                no_wait,
            } => {
                assert_eq!(file, PathBuf::from("tickets.csv"));
                assert_eq!(import_type, ImportType::JiraTickets);
                assert!(yes);
                assert!(!no_wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
