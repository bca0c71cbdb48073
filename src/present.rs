// Presentation helpers: turn machines, applications and boards into the
// text shown in menus, on the console and in report files. Pure functions
// only; callers decide where the text goes.

use crate::model::{Application, Board, BoardTarget, Machine, Selections, AppChoice};

/// Shown in place of notes for production releases.
pub const PROD_MARKER: &str = "!!!! PROD RELEASE - no notes !!!!";

/// Menu entry that quits the program.
pub const QUIT_MACHINES_ENTRY: &str = "*** QUIT (quit application and return to terminal)";
pub const NONE_APP_ENTRY: &str = "*--- NONE ---* (do not update firmware for this target)";
pub const QUIT_APP_ENTRY: &str = "**** QUIT **** (quit and return to terminal)";

const COLUMN_GAP: usize = 4;

/// Notes as displayed: anything of three or more characters is shown as-is,
/// shorter notes (including empty) read as a production release.
pub fn notes_label(notes: Option<&str>) -> Option<&str> {
    notes.filter(|n| n.len() > 2)
}

pub fn notes_or_prod(notes: Option<&str>) -> &str {
    notes_label(notes).unwrap_or(PROD_MARKER)
}

pub fn machine_info(machine: &Machine) -> String {
    format!(
        "{}\n   ID: {}\n   Serial Number: {}\n",
        machine.name,
        machine.id,
        machine.serial()
    )
}

pub fn app_info(app: &Application) -> String {
    format!(
        "Target: {} || Version: {} || Notes: {}\n   URL: {}\n",
        app.target.name(),
        app.version_label(),
        app.notes(),
        app.url()
    )
}

/// Aligned machine rows for the machine selection menu, followed by the
/// quit entry.
pub fn machine_menu_entries(machines: &[Machine]) -> Vec<String> {
    let name_width = machines.iter().map(|m| m.name.len()).max().unwrap_or(0);
    let id_width = machines.iter().map(|m| m.id.to_string().len()).max().unwrap_or(0);
    let mut entries: Vec<String> = machines
        .iter()
        .map(|m| {
            format!(
                "{:<name_width$}  -   ID: {:<id_width$}   Serial #: {}",
                m.name,
                m.id,
                m.serial()
            )
        })
        .collect();
    entries.push(QUIT_MACHINES_ENTRY.to_string());
    entries
}

/// Candidate rows for one target's application menu, followed by the NONE
/// and QUIT entries.
pub fn app_menu_entries(target: BoardTarget, apps: &[Application]) -> Vec<String> {
    let width = apps.iter().map(|a| a.version_label().len()).max().unwrap_or(0);
    let mut entries: Vec<String> = apps
        .iter()
        .map(|a| {
            let notes = match notes_label(a.notes.as_deref()) {
                Some(n) => format!("-{n}"),
                None => format!(" {PROD_MARKER}"),
            };
            format!("{}  -  {:<width$}{}", target.name(), a.version_label(), notes)
        })
        .collect();
    entries.push(NONE_APP_ENTRY.to_string());
    entries.push(QUIT_APP_ENTRY.to_string());
    entries
}

/// What the operator picked for one target, as printed before its gate.
pub fn choice_summary(target: BoardTarget, choice: &AppChoice) -> String {
    match choice {
        AppChoice::Clear => format!("  **  No application selected for {target}\n"),
        AppChoice::Install(app) => app_info(app),
    }
}

pub fn machine_list(machines: &[Machine]) -> String {
    machines.iter().map(|m| format!("* {}\n", m.name)).collect()
}

/// Table of the applications that will be installed. `None` when every
/// target is cleared.
pub fn selection_table(selections: &Selections, with_urls: bool) -> Option<String> {
    let mut headers = vec!["Target", "Version", "Notes"];
    if with_urls {
        headers.push("URL");
    }
    let rows: Vec<Vec<String>> = selections
        .values()
        .filter_map(|choice| match choice {
            AppChoice::Install(app) => Some(app),
            AppChoice::Clear => None,
        })
        .map(|app| {
            let mut row = vec![
                app.target.name().to_string(),
                app.version_label(),
                notes_or_prod(app.notes.as_deref()).to_string(),
            ];
            if with_urls {
                row.push(app.url().to_string());
            }
            row
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(render_table(&headers, &rows))
}

/// Firmware state of every board in a machine.
pub fn board_status_table(machine_name: &str, boards: &[Board]) -> String {
    let headers = ["Target", "PCB Version", "Status", "Current FW", "Queued FW", "Previous FW"];
    let rows: Vec<Vec<String>> = boards
        .iter()
        .map(|b| {
            let mut target = b.target.name().to_string();
            if b.target_kind() == Some(BoardTarget::Pump) {
                if let Some(protocol) = b.protocol_id() {
                    target = format!("{target} {}", crate::model::display_value(protocol));
                }
            }
            vec![
                target,
                b.pcb_label(),
                b.status().to_string(),
                firmware_label(b.application.as_ref()),
                firmware_label(b.scheduled.as_ref()),
                firmware_label(b.previous.as_ref()),
            ]
        })
        .collect();

    let stars = "*  ".repeat(22);
    format!(
        "{stars}\nApplication status for: {machine_name}\n{stars}\n\n{}\n",
        render_table(&headers, &rows)
    )
}

fn firmware_label(app: Option<&Application>) -> String {
    match app {
        Some(app) => format!("{} {}", app.version_label(), app.notes()),
        None => "N/A".to_string(),
    }
}

/// Left-aligned columns, each padded to its widest cell plus a gap, with a
/// dashed rule under the header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let mut out = padded_row(headers.iter().copied(), &widths);
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().map(|w| w + COLUMN_GAP).sum()));
    out.push('\n');
    for row in rows {
        out.push_str(&padded_row(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn padded_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let joined: String = cells
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = w + COLUMN_GAP))
        .collect();
    joined.trim_end().to_string()
}
