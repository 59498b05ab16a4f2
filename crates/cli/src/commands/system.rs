use anyhow::Context as _;
use triage_client::realtime::subscribe_updates;

use super::Context;
use crate::app::FilterCommand;
use crate::table::Table;

pub async fn health(ctx: &Context) -> anyhow::Result<()> {
    let health = ctx
        .client
        .system_health()
        .await
        .context("Health check failed")?;

    println!("Backend: {}", health.status);
    if !health.components.is_empty() {
        let mut table = Table::new(["Component", "Status"]);
        for (name, component) in &health.components {
            table.row(vec![name.clone(), component.status.clone()]);
        }
        table.print();
    }
    if !health.is_up() {
        anyhow::bail!("Backend reports status {}", health.status);
    }
    Ok(())
}

pub async fn info(ctx: &Context) -> anyhow::Result<()> {
    let info = ctx
        .client
        .system_info()
        .await
        .context("Failed to load system info")?;

    const MIB: u64 = 1024 * 1024;
    println!("{} {}", info.app.name, info.app.version);
    if !info.app.build_time.is_empty() {
        println!("  Built:      {}", info.app.build_time);
    }
    println!("  Runtime:    {} {}", info.java.runtime, info.java.version);
    println!("  Processors: {}", info.system.processors);
    println!(
        "  Memory:     {} MiB free of {} MiB (max {} MiB)",
        info.system.memory.free / MIB,
        info.system.memory.total / MIB,
        info.system.memory.max / MIB
    );
    Ok(())
}

pub async fn filters(ctx: &Context, command: FilterCommand) -> anyhow::Result<()> {
    let values = match command {
        FilterCommand::Departments => ctx.client.departments().await,
        FilterCommand::Priorities => ctx.client.priorities().await,
        FilterCommand::TicketTypes => ctx.client.ticket_types().await,
    }
    .context("Failed to load filter values")?;

    for value in values {
        println!("{value}");
    }
    Ok(())
}

/// Print push updates until Ctrl-C or until the server closes the channel.
pub async fn watch(ctx: &Context) -> anyhow::Result<()> {
    let subscription = subscribe_updates(&ctx.config.ws_url, |update| {
        println!("{} {update}", chrono::Local::now().format("%H:%M:%S"));
    })
    .await?;
    println!("Watching {} (Ctrl-C to stop)", ctx.config.ws_url);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = subscription.closed() => {
            println!("Update channel closed.");
        }
    }
    Ok(())
}
