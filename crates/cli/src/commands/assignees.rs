use anyhow::{bail, Context as _};
use triage_core::assignee::{AssigneeInfo, AssigneeUpdate, NewAssignee};

use super::Context;
use crate::app::AssigneeCommand;
use crate::table::Table;

pub async fn run(ctx: &Context, command: AssigneeCommand) -> anyhow::Result<()> {
    match command {
        AssigneeCommand::List => {
            let assignees = ctx
                .client
                .assignees()
                .await
                .context("Failed to load assignees")?;
            print_assignees(&assignees);
        }
        AssigneeCommand::Create {
            employee_id,
            name,
            email,
            department,
            skill_level,
            specialization,
            inactive,
        } => {
            let new = NewAssignee {
                employee_id,
                name,
                email,
                department,
                skill_level,
                specialization,
                is_active: !inactive,
            };
            let created = ctx
                .client
                .create_assignee(&new)
                .await
                .context("Failed to create assignee")?;
            println!("Created assignee #{} ({})", created.id, created.name);
        }
        AssigneeCommand::Update {
            id,
            employee_id,
            name,
            email,
            department,
            skill_level,
            specialization,
            active,
        } => {
            let update = AssigneeUpdate {
                employee_id,
                name,
                email,
                department,
                skill_level,
                specialization,
                is_active: active,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let updated = ctx
                .client
                .update_assignee(id, &update)
                .await
                .with_context(|| format!("Failed to update assignee #{id}"))?;
            println!("Updated assignee #{} ({})", updated.id, updated.name);
        }
        AssigneeCommand::Delete { id } => {
            ctx.client
                .delete_assignee(id)
                .await
                .with_context(|| format!("Failed to delete assignee #{id}"))?;
            println!("Deleted assignee #{id}.");
        }
    }
    Ok(())
}

fn print_assignees(assignees: &[AssigneeInfo]) {
    if assignees.is_empty() {
        println!("No assignees.");
        return;
    }

    let mut table = Table::new([
        "ID",
        "Employee",
        "Name",
        "Email",
        "Department",
        "Skill",
        "Specialization",
        "Active",
    ]);
    for a in assignees {
        table.row(vec![
            a.id.to_string(),
            a.employee_id.clone(),
            a.name.clone(),
            a.email.clone(),
            a.department.clone(),
            a.skill_level.to_string(),
            a.specialization.join(", "),
            if a.is_active { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.print();
}
