//! Reminder commands for CLI.

use clap::Subcommand;
use serde_json::json;
use tracker_core::reminder::next_reminder_at;
use tracker_core::{plan_reminder, Clock, SystemClock};

use super::Context;

#[derive(Subcommand)]
pub enum RemindAction {
    /// Show what a reminder firing now would say, and when the next one is due
    Check,
    /// Show when the next daily reminder fires
    Next,
}

pub fn run(action: RemindAction, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(user)?;
    let now = SystemClock.now();
    let tz = ctx.engine.time_zone();

    match action {
        RemindAction::Check => {
            let summary = ctx.engine.reconcile_all(&ctx.db, &ctx.user_id, now)?;
            let plan = plan_reminder(&ctx.config.reminders, &summary.habits, now, tz)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        RemindAction::Next => {
            let reminders = &ctx.config.reminders;
            let next_at = next_reminder_at(now, reminders.hour, reminders.minute, tz)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "enabled": reminders.enabled,
                    "next_at": next_at.with_timezone(&tz).to_rfc3339(),
                }))?
            );
        }
    }
    Ok(())
}
