// Read-only commands: listings, machine status, log downloads and the
// temperature grapher. Each takes the API and (where it asks the operator
// anything) a `Prompter`, prints to stdout and writes any files into
// `out_dir`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::FleetApi;
use crate::graph::{self, TEMPERATURE_MARKER};
use crate::model::{LogEntry, MachineFilter};
use crate::present;
use crate::ui::{spinner, Prompter};

/// How many applications `--list-latest-apps` prints.
pub const LATEST_APP_COUNT: usize = 10;
/// How many logs `--list-logs` offers.
pub const LOG_LIST_COUNT: usize = 10;
/// How many logs the grapher searches for temperature files.
pub const TEMPERATURE_LOG_COUNT: usize = 50;

pub fn list_all_machines(api: &(impl FleetApi + ?Sized), filter: &MachineFilter) -> Result<()> {
    println!("\nRetrieving all machines...\n");
    let machines = filter.apply(api.machines()?);
    for machine in &machines {
        println!("{}", present::machine_info(machine));
    }
    Ok(())
}

pub fn list_latest_apps(api: &(impl FleetApi + ?Sized), target: Option<&str>) -> Result<()> {
    println!("\nRetrieving list of most recently deployed applications...\n");
    let apps = api.list_applications(target, None)?;
    let start = apps.len().saturating_sub(LATEST_APP_COUNT);
    for app in &apps[start..] {
        println!("{}\n", present::app_info(app));
    }
    Ok(())
}

pub fn machine_status(api: &(impl FleetApi + ?Sized), machine_id: u64) -> Result<()> {
    println!("\nRetrieving firmware status for Machine ID {machine_id}...\n");
    let boards = api.boards(machine_id)?;
    let name = boards
        .iter()
        .find_map(|b| b.machine_name().map(str::to_string))
        .unwrap_or_else(|| format!("Machine {machine_id}"));
    println!("{}", present::board_status_table(&name, &boards));
    Ok(())
}

/// Offer the most recent logs and download every one the operator picks.
/// Returns the paths written.
pub fn list_logs<P: Prompter + ?Sized>(
    api: &(impl FleetApi + ?Sized),
    prompter: &mut P,
    machine_id: u64,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    println!("\nRetrieving most recent logs from Machine ID {machine_id}...\n");
    let logs = api.logs(machine_id, LOG_LIST_COUNT)?;
    if logs.is_empty() {
        println!("No logs found for Machine ID {machine_id}\n");
        return Ok(Vec::new());
    }
    let items: Vec<String> = logs.iter().map(|l| format!("{} File: {}", l.added(), l.file_name)).collect();
    let Some(picked) = prompter.multi_select("~ ~ select log(s) you want to download ~ ~", &items)? else {
        return Ok(Vec::new());
    };

    let mut saved = Vec::new();
    for log in picked.iter().filter_map(|&i| logs.get(i)) {
        let path = save_log(api, log, out_dir, |raw| raw.to_string())?;
        println!("*** Log saved to {} ***\n", log.file_name);
        saved.push(path);
    }
    Ok(saved)
}

/// Pick a temperature log, download and repair it, then chart it. Returns
/// the chart path, or `None` when there was nothing to graph or the
/// operator backed out.
pub fn graph_temps<P: Prompter + ?Sized>(
    api: &(impl FleetApi + ?Sized),
    prompter: &mut P,
    machine_id: u64,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    println!("\nGraphing recent temperatures for Machine ID {machine_id}...");
    let logs: Vec<LogEntry> = api
        .logs(machine_id, TEMPERATURE_LOG_COUNT)?
        .into_iter()
        .filter(|l| l.file_name.contains(TEMPERATURE_MARKER))
        .collect();
    if logs.is_empty() {
        println!("No temperature logs found for Machine ID {machine_id}\n");
        return Ok(None);
    }

    let items: Vec<String> = logs.iter().map(|l| format!("Date: {} File: {}", l.added(), l.file_name)).collect();
    let title = "~ ~ select temperature file you want to graph and download ~ ~";
    let Some(log) = prompter.select(title, &items)?.and_then(|i| logs.get(i)) else {
        return Ok(None);
    };

    let csv_path = save_log(api, log, out_dir, graph::repair_year_separators)?;
    println!("\n*** Full temp log saved to {} ***\n", log.file_name);
    println!("Graphing temperature data...\n");

    let data = std::fs::read_to_string(&csv_path).map_err(graph::GraphError::from)?;
    let samples = graph::parse_temperature_csv(&data)?;
    let chart_path = out_dir.join(format!("{}.svg", log.file_name));
    let title = format!("Refrigerator Performance, Machine ID: {machine_id}, Date: {}", log.added());
    graph::render_chart(&samples, &title, &chart_path)?;
    info!(path = %chart_path.display(), samples = samples.len(), "chart written");
    println!("*** Chart saved to {} ***\n", chart_path.display());
    Ok(Some(chart_path))
}

fn save_log(
    api: &(impl FleetApi + ?Sized),
    log: &LogEntry,
    out_dir: &Path,
    transform: impl Fn(&str) -> String,
) -> Result<PathBuf> {
    let progress = spinner(&format!("Downloading {}...", log.file_name));
    let raw = api.download(&log.file_url);
    progress.finish_and_clear();
    let path = out_dir.join(&log.file_name);
    std::fs::write(&path, transform(&raw?))
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(path)
}
