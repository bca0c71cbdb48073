// Interactive firmware update workflow.
//
// The steps run strictly in order and the operator can quit at any prompt:
//
// 1. filter the fleet and pick machines (confirmed);
// 2. pick an application, or NONE, for each update target (each confirmed),
//    or in clear mode mark every target as cleared;
// 3. review the full summary (confirmed);
// 4. write the report header, then PUT every eligible board and log each
//    HTTP status;
// 5. append each machine's refreshed status table and, if any write
//    failed, a single failure banner. A status table that cannot be
//    fetched is noted in the report and does not suppress the banner.
//
// Writes are never retried or rolled back. A failed PUT marks the run as
// failed and the remaining boards are still attempted.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::api::FleetApi;
use crate::model::{AppChoice, Application, BoardTarget, Machine, MachineFilter, NotesFilter, Selections, UPDATE_TARGETS};
use crate::present;
use crate::report::{self, Report, FAILURE_BANNER, REVERT_FILE_NAME};
use crate::ui::{confirm_phrase, spinner, Confirmation, Prompter, CONFIRM_PHRASE};

/// Candidates offered per target, taken from the end of the API list.
pub const RECENT_APP_COUNT: usize = 13;

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub machine_filter: MachineFilter,
    pub notes_filter: Option<NotesFilter>,
    /// Clear queued firmware instead of choosing new applications.
    pub clear: bool,
    /// Where the report file is written.
    pub report_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The operator quit before anything was written.
    Quit,
    Completed { report: PathBuf, failed: bool },
}

/// Print to the console and append the same text to the report.
fn log_both(report: &Report, text: &str) -> Result<()> {
    println!("{text}");
    report.append(text)?;
    report.append("\n")
}

pub fn run<A, P>(api: &A, prompter: &mut P, options: &UpdateOptions) -> Result<UpdateOutcome>
where
    A: FleetApi + ?Sized,
    P: Prompter + ?Sized,
{
    println!("\nStarting firmware update interface...\n");

    let Some(machines) = select_machines(api, prompter, &options.machine_filter)? else {
        return Ok(UpdateOutcome::Quit);
    };

    let selections = if options.clear {
        println!("\nClearing queued firmware updates for all selected machines...\n");
        clear_all()
    } else {
        match select_applications(api, prompter, options.notes_filter.as_ref())? {
            Some(selections) => selections,
            None => return Ok(UpdateOutcome::Quit),
        }
    };

    if confirm_summary(prompter, &machines, &selections)? == Confirmation::Quit {
        return Ok(UpdateOutcome::Quit);
    }
    prompter.clear_screen()?;

    println!("\nGenerating report...\n");
    let report = generate_report(&options.report_dir, &machines, &selections, options.clear)?;

    let failed = apply_updates(api, &machines, &selections, &report)?;
    println!("\nDone queuing updates for all boards for selected machines :)\n");
    info!(report = %report.path().display(), failed, "firmware update finished");
    Ok(UpdateOutcome::Completed { report: report.path().to_path_buf(), failed })
}

fn select_machines<A, P>(api: &A, prompter: &mut P, filter: &MachineFilter) -> Result<Option<Vec<Machine>>>
where
    A: FleetApi + ?Sized,
    P: Prompter + ?Sized,
{
    println!("Retrieving list of machines with {filter}...\n");
    let progress = spinner("Retrieving machines...");
    let machines = api.machines();
    progress.finish_and_clear();
    let machines = filter.apply(machines?);
    if machines.is_empty() {
        println!("No machines match {filter}, quitting...\n");
        return Ok(None);
    }

    let entries = present::machine_menu_entries(&machines);
    let quit_index = entries.len() - 1;
    let title = "~ select machine(s) to update ~ ~";
    let Some(picked) = prompter.multi_select(title, &entries)? else {
        println!("No option selected, quitting...\n");
        return Ok(None);
    };
    if picked.contains(&quit_index) {
        return Ok(None);
    }
    let selected: Vec<Machine> = picked.iter().filter_map(|&i| machines.get(i).cloned()).collect();
    if selected.is_empty() {
        println!("No option selected, quitting...\n");
        return Ok(None);
    }

    println!("Selected machines:\n\n{}", present::machine_list(&selected));
    prompter.alert("!!!!!! REVIEW LIST CAREFULLY !!!!!!!")?;
    if confirm_phrase(prompter, CONFIRM_PHRASE)? == Confirmation::Quit {
        return Ok(None);
    }
    println!("\nMachines confirmed, continuing to firmware application selections...\n");
    Ok(Some(selected))
}

/// Clear mode: every update target gets an explicit clear.
fn clear_all() -> Selections {
    UPDATE_TARGETS.into_iter().map(|t| (t, AppChoice::Clear)).collect()
}

fn select_applications<A, P>(api: &A, prompter: &mut P, notes: Option<&NotesFilter>) -> Result<Option<Selections>>
where
    A: FleetApi + ?Sized,
    P: Prompter + ?Sized,
{
    match notes {
        Some(n) => println!("Retrieving lists of recent applications, organized per target, filtered by notes '{n}'...\n"),
        None => println!("Retrieving lists of recent applications, organized per target...\n"),
    }

    let mut selections = Selections::new();
    for target in UPDATE_TARGETS {
        let progress = spinner(&format!("Retrieving {target} applications..."));
        let apps = api.list_applications(Some(target.name()), notes);
        progress.finish_and_clear();
        let mut apps = apps?;
        let recent = apps.split_off(apps.len().saturating_sub(RECENT_APP_COUNT));

        let Some(choice) = select_application(prompter, target, recent)? else {
            return Ok(None);
        };
        selections.insert(target, choice);
    }
    Ok(Some(selections))
}

fn select_application<P: Prompter + ?Sized>(
    prompter: &mut P,
    target: BoardTarget,
    mut apps: Vec<Application>,
) -> Result<Option<AppChoice>> {
    let entries = present::app_menu_entries(target, &apps);
    let none_index = apps.len();
    let title = format!("~ select {} firmware version to queue ~ ~", target.name().to_uppercase());

    let choice = match prompter.select(&title, &entries)? {
        None => return Ok(None),
        Some(i) if i == none_index => AppChoice::Clear,
        Some(i) if i < none_index => AppChoice::Install(apps.swap_remove(i)),
        Some(_) => return Ok(None),
    };

    println!("Selected application for {target}:\n\n{}", present::choice_summary(target, &choice));
    prompter.alert("!!!!!! REVIEW APPLICATION CAREFULLY !!!!!!!")?;
    if confirm_phrase(prompter, CONFIRM_PHRASE)? == Confirmation::Quit {
        return Ok(None);
    }
    println!("\nApplication confirmed, continuing...\n");
    Ok(Some(choice))
}

fn confirm_summary<P: Prompter + ?Sized>(
    prompter: &mut P,
    machines: &[Machine],
    selections: &Selections,
) -> Result<Confirmation> {
    prompter.clear_screen()?;
    prompter.alert("*** SUMMARY OF ALL SELECTION OPTIONS ***")?;
    println!("Machines:\n\n{}", present::machine_list(machines));
    println!("\nFirmware Applications:\n");
    match present::selection_table(selections, false) {
        Some(table) => println!("{table}"),
        None => println!("No applications selected: queued firmware will be cleared on every target.\n"),
    }
    let cleared: Vec<&str> = selections
        .iter()
        .filter(|(_, c)| **c == AppChoice::Clear)
        .map(|(t, _)| t.name())
        .collect();
    if !cleared.is_empty() {
        println!("Queued firmware cleared for: {}\n", cleared.join(", "));
    }
    prompter.alert("!!!!!! REVIEW SELECTED OPTIONS CAREFULLY !!!!!!!")?;
    confirm_phrase(prompter, CONFIRM_PHRASE)
}

fn generate_report(dir: &Path, machines: &[Machine], selections: &Selections, clear: bool) -> Result<Report> {
    let now = report::pacific_now();
    let (file_name, title) = if clear {
        (REVERT_FILE_NAME.to_string(), "Firmware Queue Clear Report")
    } else {
        (report::report_file_name(&now), "Firmware Update Report")
    };
    let report = Report::create(dir, &file_name, &report::report_header(title, &now))?;

    report.append(&report::section("List of Machines"))?;
    report.append(&present::machine_list(machines))?;
    report.append(&format!("\n\n{}", report::section("List of Firmware Apps")))?;
    match present::selection_table(selections, true) {
        Some(table) => report.append(&table)?,
        None => report.append("No firmware applications selected; queued firmware cleared on all targets.\n")?,
    }
    report.append("\n\n***  Results   ***  ***  ***  ***  ***  ***  ***  ***  ***  ***  ***\n\n")?;
    Ok(report)
}

/// PUT every eligible board of every machine. Returns whether any write
/// failed.
fn apply_updates<A: FleetApi + ?Sized>(
    api: &A,
    machines: &[Machine],
    selections: &Selections,
    report: &Report,
) -> Result<bool> {
    println!("Queuing firmware application updates to all targets on all selected machines...\n");
    let mut failed = false;

    for machine in machines {
        log_both(report, &format!("** Updating boards on {}", machine.name))?;
        for mut board in api.boards(machine.id)? {
            let Some(target) = board.target_kind().filter(|t| t.is_firmware_managed()) else {
                continue;
            };
            let Some(choice) = selections.get(&target) else {
                continue;
            };
            log_both(report, &format!("     Deploying application to target: {target}"))?;
            board.schedule(choice);

            match api.update_board(&board) {
                Ok(res) => {
                    if !res.is_success() {
                        failed = true;
                    }
                    println!("     HTTP response: {}\n", res.status);
                    report.append(&format!("        HTTP response: {}\n", res.status))?;
                    report.append(&format!("        HTTP text:     {}\n\n", res.body))?;
                }
                Err(err) => {
                    failed = true;
                    warn!(board_id = board.id, error = %err, "board update not sent");
                    println!("     HTTP request failed: {err:#}\n");
                    report.append(&format!("        HTTP request failed: {err:#}\n\n"))?;
                }
            }
        }
    }

    for machine in machines {
        report.append(&format!(
            "\nRetrieving firmware status for Machine ID {}...\n\n",
            machine.id
        ))?;
        match api.boards(machine.id) {
            Ok(boards) => report.append(&present::board_status_table(&machine.name, &boards))?,
            Err(err) => {
                warn!(machine_id = machine.id, error = %err, "status refresh failed");
                log_both(report, &format!("     Could not retrieve firmware status: {err:#}\n"))?;
            }
        }
    }

    if failed {
        println!("{FAILURE_BANNER}\n");
        report.append(&format!("{FAILURE_BANNER}\n"))?;
    }
    Ok(failed)
}
