// Entrypoint for the CLI application.
// - Keeps `main` small: load credentials, build the API client, then run
//   each requested action in a fixed order.
// - Errors are printed once here and turned into exit code 1; quitting from
//   a prompt is a normal exit.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use sidework_utils::api::ApiClient;
use sidework_utils::cli::Cli;
use sidework_utils::commands;
use sidework_utils::config::{ClientConfig, Credentials};
use sidework_utils::graph::GraphError;
use sidework_utils::logging;
use sidework_utils::ui::TerminalPrompter;
use sidework_utils::workflow::{self, UpdateOptions, UpdateOutcome};

fn run(cli: &Cli) -> anyhow::Result<()> {
    let credentials = Credentials::load(&cli.key, &cli.token)?;
    let api = ApiClient::new(&ClientConfig::from_env(credentials))?;
    let mut prompter = TerminalPrompter::new();
    let out_dir = Path::new(".");

    if cli.list_all_machines {
        commands::list_all_machines(&api, &cli.machine_filter())?;
    }
    if cli.list_latest_apps {
        commands::list_latest_apps(&api, cli.target.map(|t| t.name()))?;
    }
    if let Some(id) = cli.list_logs {
        commands::list_logs(&api, &mut prompter, id, out_dir)?;
    }
    if let Some(id) = cli.machine_status {
        commands::machine_status(&api, id)?;
    }
    if let Some(id) = cli.graph_temps {
        commands::graph_temps(&api, &mut prompter, id, out_dir)?;
    }
    if cli.update_fw {
        let options = UpdateOptions {
            machine_filter: cli.machine_filter(),
            notes_filter: cli.notes_filter(),
            clear: cli.clear,
            report_dir: out_dir.to_path_buf(),
        };
        match workflow::run(&api, &mut prompter, &options)? {
            UpdateOutcome::Quit => println!("Quitting, nothing was changed.\n"),
            UpdateOutcome::Completed { report, .. } => println!("Report written to {}\n", report.display()),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<GraphError>() {
                Some(graph_err) if graph_err.is_parse_failure() => eprintln!("Error: Failed to parse the CSV file."),
                Some(graph_err) => eprintln!("An unexpected error occurred: {graph_err}"),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
