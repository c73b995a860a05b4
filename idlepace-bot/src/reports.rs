use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use idlepace_core::{Achievement, PacingRow};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table
    Console,
    /// Machine-readable JSON
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderEntry<'a> {
    position: usize,
    id: &'a str,
    name: &'a str,
    rarity_percent: f64,
}

pub fn write_pacing_table(
    out: &mut dyn Write,
    rows: &[PacingRow],
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
        ReportFormat::Console => {
            writeln!(out, "{}", "⏱  Achievement Pacing".bright_cyan().bold())?;
            writeln!(out, "{}", "=====================".cyan())?;
            writeln!(
                out,
                "{:>8}  {:>14}  {:>16}",
                "Unlocked", "Hours to next", "Cumulative hours"
            )?;
            for row in rows {
                writeln!(
                    out,
                    "{:>8}  {:>14.2}  {:>16.2}",
                    row.unlocked, row.hours_to_next, row.cumulative_hours
                )?;
            }
            if let Some(last) = rows.last() {
                let days = last.cumulative_hours / 24.0;
                writeln!(
                    out,
                    "Total playtime: {} ({days:.1} days)",
                    format!("{:.2} h", last.cumulative_hours).green()
                )?;
            }
        }
    }
    Ok(())
}

pub fn write_unlock_order(
    out: &mut dyn Write,
    order: &[&Achievement],
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let entries: Vec<OrderEntry<'_>> = order
                .iter()
                .enumerate()
                .map(|(index, achievement)| OrderEntry {
                    position: index + 1,
                    id: achievement.id.as_str(),
                    name: &achievement.name,
                    rarity_percent: achievement.rarity_percent,
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
        ReportFormat::Console => {
            writeln!(out, "{}", "🏆 Simulated Unlock Order".bright_cyan().bold())?;
            writeln!(out, "{}", "=========================".cyan())?;
            for (index, achievement) in order.iter().enumerate() {
                writeln!(out, "{:>4}. {achievement}", index + 1)?;
            }
            writeln!(out, "Achievements: {}", order.len().to_string().green())?;
        }
    }
    Ok(())
}
