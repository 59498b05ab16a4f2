use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _};
use triage_client::UploadFile;
use triage_core::import::{
    ImportLog, ImportProgress, ImportStage, ImportStatus, ImportType, TemplateFormat,
};
use triage_core::page::Page;
use triage_core::types::DbId;
use triage_importer::{
    AutoConfirm, ImportBackend, PollEvent, PollHandle, PollOutcome, ProgressPoller, UploadOutcome,
    UploadWorkflow, WarningConfirmation,
};

use super::{write_output, Context};
use crate::session::PromptConfirmer;
use crate::table::{opt_text, Table};

pub async fn import(
    ctx: &Context,
    path: &Path,
    import_type: ImportType,
    yes: bool,
    no_wait: bool,
) -> anyhow::Result<()> {
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;

    let confirmer: &dyn WarningConfirmation = if yes { &AutoConfirm } else { &PromptConfirmer };
    let workflow = UploadWorkflow::new(ctx.client.clone(), ctx.poller);

    match workflow.submit(&file, import_type, confirmer).await? {
        UploadOutcome::Rejected(validation) => {
            println!("Validation failed:");
            for error in &validation.errors {
                println!("  x {error}");
            }
            for warning in &validation.warnings {
                println!("  ! {warning}");
            }
            bail!(
                "{} was not uploaded ({} validation error(s))",
                file.file_name,
                validation.errors.len()
            );
        }
        UploadOutcome::Declined(_) => {
            println!("Upload cancelled.");
            Ok(())
        }
        UploadOutcome::Accepted { log, poll } => {
            println!("Import #{} accepted ({})", log.id, log.status);
            match poll {
                Some(handle) if !no_wait => follow(handle).await,
                Some(_) => {
                    println!("Check progress with `triage status {}`.", log.id);
                    Ok(())
                }
                None => Ok(()),
            }
        }
    }
}

pub async fn logs(ctx: &Context, page: u32, size: u32) -> anyhow::Result<()> {
    let logs = ctx
        .client
        .import_logs(page, size)
        .await
        .context("Failed to load import logs")?;
    print_logs(&logs);
    Ok(())
}

pub async fn status(ctx: &Context, import_id: DbId) -> anyhow::Result<()> {
    let log = ctx
        .client
        .import_status(import_id)
        .await
        .with_context(|| format!("Failed to load import #{import_id}"))?;

    println!("Import #{} {}", log.id, log.file_name);
    println!("  Type:      {}", log.import_type);
    println!("  Status:    {}", log.status);
    println!(
        "  Records:   {} processed, {} imported, {} failed",
        log.records_processed, log.records_success, log.records_failed
    );
    println!("  Started:   {}", opt_text(log.started_at.as_deref()));
    println!("  Completed: {}", opt_text(log.completed_at.as_deref()));
    if let Some(error) = &log.error_message {
        println!("  Error:     {error}");
    }

    if log.status == ImportStatus::InProgress {
        match ctx.client.import_progress(import_id).await {
            Ok(progress) => println!("{}", progress_line(&progress)),
            Err(e) => tracing::warn!(import_id, error = %e, "Failed to fetch import progress"),
        }
    }
    if log.status.is_retryable() {
        println!("Retry with `triage retry {}`.", log.id);
    }
    Ok(())
}

pub async fn retry(ctx: &Context, import_id: DbId, wait: bool) -> anyhow::Result<()> {
    let log = ctx
        .client
        .retry_import(import_id)
        .await
        .with_context(|| format!("Failed to retry import #{import_id}"))?;
    println!("Import #{} restarted ({})", log.id, log.status);

    if wait && matches!(log.status, ImportStatus::Pending | ImportStatus::InProgress) {
        let backend: Arc<dyn ImportBackend> = Arc::new(ctx.client.clone());
        follow(ProgressPoller::start(backend, log.id, ctx.poller)).await?;
    }
    Ok(())
}

pub async fn delete(ctx: &Context, import_id: DbId, delete_data: bool) -> anyhow::Result<()> {
    ctx.client
        .delete_import(import_id, delete_data)
        .await
        .with_context(|| format!("Failed to delete import #{import_id}"))?;

    if delete_data {
        println!("Deleted import #{import_id} and its imported records.");
    } else {
        println!("Deleted import #{import_id}.");
    }
    Ok(())
}

pub async fn template(
    ctx: &Context,
    template_type: ImportType,
    format: TemplateFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let bytes = ctx
        .client
        .download_template(template_type, format)
        .await
        .context("Template download failed")?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}_template.{}",
            template_type.as_str().to_ascii_lowercase(),
            format.extension()
        ))
    });
    write_output(&path, &bytes).await
}

pub async fn stats(ctx: &Context, days: u32) -> anyhow::Result<()> {
    let stats = ctx
        .client
        .import_statistics(days)
        .await
        .context("Failed to load import statistics")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Stream poll events to the terminal until the session ends. Ctrl-C
/// stops watching; the job itself keeps running on the server.
async fn follow(mut handle: PollHandle) -> anyhow::Result<()> {
    let import_id = handle.import_id();
    let cancel = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            PollEvent::Progress(progress) => println!("{}", progress_line(&progress)),
            // Already logged by the poller; the next tick retries.
            PollEvent::FetchFailed(_) => {}
            PollEvent::Terminal(ImportStage::Failed) => println!("Import #{import_id} failed."),
            PollEvent::Terminal(_) => println!("Import #{import_id} completed."),
            PollEvent::ProgressClosed => println!(),
            PollEvent::LogsRefreshed(page) => print_logs(&page),
            PollEvent::LogsRefreshFailed(e) => eprintln!("Could not refresh import logs: {e}"),
        }
    }
    interrupt.abort();

    match handle.finished().await {
        PollOutcome::Completed => Ok(()),
        PollOutcome::Failed => bail!(
            "Import #{import_id} failed; see `triage status {import_id}` and retry with `triage retry {import_id}`"
        ),
        PollOutcome::Cancelled => {
            println!("Stopped watching import #{import_id}; it continues on the server.");
            Ok(())
        }
    }
}

/// Four-step stage strip, e.g. `[x] Parsing file > [>] Validating data > ...`.
fn stage_strip(current: ImportStage) -> String {
    let current_index = current.step_index();
    let steps: Vec<String> = ImportStage::STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let mark = match current_index {
                Some(_) if current == ImportStage::Completed => "x",
                Some(c) if i < c => "x",
                Some(c) if i == c => ">",
                _ => " ",
            };
            format!("[{mark}] {}", step.label())
        })
        .collect();

    let strip = steps.join(" > ");
    if current == ImportStage::Failed {
        format!("{strip}  [!] Failed")
    } else {
        strip
    }
}

fn progress_line(progress: &ImportProgress) -> String {
    let mut line = format!(
        "{:>5.1}%  {}  ({}/{} records)",
        progress.current_progress,
        stage_strip(progress.current_stage),
        progress.processed_records,
        progress.total_records
    );
    if let Some(eta) = &progress.estimated_completion {
        line.push_str(&format!("  eta {eta}"));
    }
    line
}

fn print_logs(page: &Page<ImportLog>) {
    if page.is_empty() {
        println!("No imports yet.");
        return;
    }

    let mut table = Table::new([
        "ID",
        "File",
        "Type",
        "Status",
        "Processed",
        "Imported",
        "Failed",
        "Started",
        "Error",
    ]);
    for log in &page.content {
        table.row(vec![
            log.id.to_string(),
            log.file_name.clone(),
            log.import_type.clone(),
            log.status.to_string(),
            log.records_processed.to_string(),
            log.records_success.to_string(),
            log.records_failed.to_string(),
            opt_text(log.started_at.as_deref()),
            opt_text(log.error_message.as_deref()),
        ]);
    }
    table.print();
    println!(
        "Page {} of {} ({} imports)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_marks_done_current_and_pending_steps() {
        assert_eq!(
            stage_strip(ImportStage::Validating),
            "[x] Parsing file > [>] Validating data > [ ] Importing records > [ ] Completed"
        );
        assert_eq!(
            stage_strip(ImportStage::Completed),
            "[x] Parsing file > [x] Validating data > [x] Importing records > [x] Completed"
        );
    }

    #[test]
    fn failed_stage_is_flagged() {
        assert!(stage_strip(ImportStage::Failed).ends_with("[!] Failed"));
        assert!(!stage_strip(ImportStage::Unknown).contains('x'));
    }

    #[test]
    fn progress_line_includes_counts() {
        let progress = ImportProgress {
            current_progress: 60.0,
            total_records: 200,
            processed_records: 120,
            current_stage: ImportStage::Importing,
            estimated_completion: None,
        };
        let line = progress_line(&progress);
        assert!(line.starts_with(" 60.0%"));
        assert!(line.ends_with("(120/200 records)"));
    }
}
