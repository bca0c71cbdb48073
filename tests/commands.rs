mod common;

use common::{board, FakeApi, ScriptedPrompter, Step};
use sidework_utils::commands;
use sidework_utils::graph::GraphError;
use sidework_utils::model::LogEntry;

fn log(name: &str, url: &str) -> LogEntry {
    LogEntry {
        machine_id: Some(7),
        file_name: name.to_string(),
        added: Some("2023-11-05T10:00:00Z".to_string()),
        file_url: url.to_string(),
    }
}

const GLUED_CSV: &str = "\
Timestamp,In 1 Temp,In 2 Temp,Out Temp,Year
2023-11-05 01:00:00,38.0,36.0,70.0,2024
2023-11-05 02:00:00,38.2,36.1,70.1,2024
2023-11-05 03:14:012024,38.4,36.2,70.3
";

fn logger_api() -> FakeApi {
    let mut api = FakeApi {
        logs: vec![
            log("7_EVENTS_1.log", "https://logs.test/events"),
            log("7_TEMPERATURE_1.csv", "https://logs.test/temp"),
            log("7_TEMPERATURE_bad.csv", "https://logs.test/bad"),
        ],
        ..FakeApi::default()
    };
    api.files.insert("https://logs.test/events".into(), "boot ok\n".into());
    api.files.insert("https://logs.test/temp".into(), GLUED_CSV.into());
    api.files.insert(
        "https://logs.test/bad".into(),
        "Timestamp,In 1 Temp,In 2 Temp,Out Temp\n2023-11-05 01:00:00,38.0\n".into(),
    );
    api
}

#[test]
fn graph_repairs_log_and_writes_chart() {
    let dir = tempfile::tempdir().unwrap();
    let api = logger_api();
    let mut prompter = ScriptedPrompter::new([Step::Pick(0)]);

    let chart = commands::graph_temps(&api, &mut prompter, 7, dir.path()).unwrap().unwrap();
    assert!(chart.ends_with("7_TEMPERATURE_1.csv.svg"));
    assert!(chart.exists());

    // Only temperature logs are offered.
    let (_, items) = &prompter.menus[0];
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.contains("TEMPERATURE")));

    let saved = std::fs::read_to_string(dir.path().join("7_TEMPERATURE_1.csv")).unwrap();
    assert!(saved.contains("2023-11-05 03:14:01,2024,38.4"));
    assert!(saved.contains("70.0,2024\n"));
}

#[test]
fn malformed_temperature_log_is_a_parse_failure() {
    let dir = tempfile::tempdir().unwrap();
    let api = logger_api();
    let mut prompter = ScriptedPrompter::new([Step::Pick(1)]);

    let err = commands::graph_temps(&api, &mut prompter, 7, dir.path()).unwrap_err();
    let graph_err = err.downcast_ref::<GraphError>().unwrap();
    assert!(graph_err.is_parse_failure());
}

#[test]
fn dismissing_the_temperature_menu_graphs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let api = logger_api();
    let mut prompter = ScriptedPrompter::new([Step::Dismiss]);

    assert_eq!(commands::graph_temps(&api, &mut prompter, 7, dir.path()).unwrap(), None);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn no_temperature_logs_means_no_menu() {
    let dir = tempfile::tempdir().unwrap();
    let mut api = logger_api();
    api.logs.retain(|l| !l.file_name.contains("TEMPERATURE"));
    let mut prompter = ScriptedPrompter::new(Vec::<Step>::new());

    assert_eq!(commands::graph_temps(&api, &mut prompter, 7, dir.path()).unwrap(), None);
    assert!(prompter.menus.is_empty());
}

#[test]
fn picked_logs_are_downloaded_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let api = logger_api();
    let mut prompter = ScriptedPrompter::new([Step::PickMany(vec![0, 1])]);

    let saved = commands::list_logs(&api, &mut prompter, 7, dir.path()).unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(std::fs::read_to_string(&saved[0]).unwrap(), "boot ok\n");
    // Plain downloads are not repaired.
    assert_eq!(std::fs::read_to_string(&saved[1]).unwrap(), GLUED_CSV);
}

#[test]
fn failed_download_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut api = logger_api();
    api.files.clear();
    let mut prompter = ScriptedPrompter::new([Step::PickMany(vec![0])]);

    assert!(commands::list_logs(&api, &mut prompter, 7, dir.path()).is_err());
}

#[test]
fn read_only_commands_succeed_against_fake_fleet() {
    let mut api = FakeApi::default();
    api.machines = vec![common::machine(1, "Soho Bar", "BackBar")];
    api.applications = (1..=12).map(|i| common::app(i, "Pump", "")).collect();
    api.boards.insert(1, vec![board(10, "Soho Bar", Some("Main")), board(11, "Soho Bar", Some("Pump"))]);

    commands::list_all_machines(&api, &Default::default()).unwrap();
    commands::list_latest_apps(&api, Some("pump")).unwrap();
    commands::list_latest_apps(&api, Some("QR Reader")).unwrap();
    commands::machine_status(&api, 1).unwrap();
    commands::machine_status(&api, 99).unwrap();
    assert!(api.puts.borrow().is_empty());
}
