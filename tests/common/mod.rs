#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use sidework_utils::api::{FleetApi, PutResponse};
use sidework_utils::model::{Application, Board, LogEntry, Machine};
use sidework_utils::ui::Prompter;

/// In-memory fleet. Records every PUT and serves canned data.
#[derive(Default)]
pub struct FakeApi {
    pub machines: Vec<Machine>,
    pub applications: Vec<Application>,
    pub boards: HashMap<u64, Vec<Board>>,
    pub logs: Vec<LogEntry>,
    pub files: HashMap<String, String>,
    /// Board ids whose PUT answers with this status instead of 200.
    pub put_status: HashMap<u64, u16>,
    pub puts: RefCell<Vec<Value>>,
    /// When set, board listings fail once this many have been served.
    pub board_fetch_limit: Option<usize>,
    pub board_fetches: Cell<usize>,
}

impl FakeApi {
    pub fn put_ids(&self) -> Vec<u64> {
        self.puts.borrow().iter().map(|p| p["id"].as_u64().unwrap()).collect()
    }
}

impl FleetApi for FakeApi {
    fn machines(&self) -> Result<Vec<Machine>> {
        Ok(self.machines.clone())
    }

    fn applications(&self) -> Result<Vec<Application>> {
        Ok(self.applications.clone())
    }

    fn boards(&self, machine_id: u64) -> Result<Vec<Board>> {
        let served = self.board_fetches.get();
        if self.board_fetch_limit.is_some_and(|limit| served >= limit) {
            anyhow::bail!("GET board failed: 503 Service Unavailable - ");
        }
        self.board_fetches.set(served + 1);
        Ok(self.boards.get(&machine_id).cloned().unwrap_or_default())
    }

    fn logs(&self, _machine_id: u64, count: usize) -> Result<Vec<LogEntry>> {
        Ok(self.logs.iter().take(count).cloned().collect())
    }

    fn update_board(&self, board: &Board) -> Result<PutResponse> {
        self.puts.borrow_mut().push(serde_json::to_value(board)?);
        let status = self.put_status.get(&board.id).copied().unwrap_or(200);
        Ok(PutResponse { status, body: format!("{{\"status\":{status}}}") })
    }

    fn download(&self, url: &str) -> Result<String> {
        self.files.get(url).cloned().ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }
}

/// One scripted operator action.
#[derive(Debug, Clone)]
pub enum Step {
    Pick(usize),
    PickMany(Vec<usize>),
    Dismiss,
    Type(&'static str),
}

/// Operator double that replays a fixed script and fails when the script
/// and the prompts disagree.
pub struct ScriptedPrompter {
    pub steps: VecDeque<Step>,
    pub menus: Vec<(String, Vec<String>)>,
}

impl ScriptedPrompter {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        ScriptedPrompter { steps: steps.into_iter().collect(), menus: Vec::new() }
    }

    fn next(&mut self) -> Result<Step> {
        self.steps.pop_front().ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, title: &str, items: &[String]) -> Result<Option<usize>> {
        self.menus.push((title.to_string(), items.to_vec()));
        match self.next()? {
            Step::Pick(i) => Ok(Some(i)),
            Step::Dismiss => Ok(None),
            other => anyhow::bail!("expected a single pick for '{title}', script has {other:?}"),
        }
    }

    fn multi_select(&mut self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        self.menus.push((title.to_string(), items.to_vec()));
        match self.next()? {
            Step::PickMany(v) => Ok(Some(v)),
            Step::Dismiss => Ok(None),
            other => anyhow::bail!("expected a multi pick for '{title}', script has {other:?}"),
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.next()? {
            Step::Type(s) => Ok(s.to_string()),
            other => anyhow::bail!("expected typed input for '{prompt}', script has {other:?}"),
        }
    }
}

pub fn machine(id: u64, name: &str, org: &str) -> Machine {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "serialNumber": format!("SN-{id}"),
        "location": { "organization": { "name": org } },
    }))
    .unwrap()
}

pub fn app(id: u64, target: &str, notes: &str) -> Application {
    serde_json::from_value(json!({
        "id": id,
        "type": { "id": 1, "name": target },
        "fwMajor": 3, "fwMinor": 1, "fwPatch": id,
        "notes": notes,
        "filePath": format!("https://files.test/{id}.bin"),
    }))
    .unwrap()
}

pub fn board(id: u64, machine_name: &str, target: Option<&str>) -> Board {
    serde_json::from_value(json!({
        "id": id,
        "type": { "name": target },
        "pcbMajor": 1, "pcbMinor": 0, "pcbPatch": 2,
        "status": "Pending",
        "application": { "id": 900, "type": { "name": target }, "fwMajor": 1, "fwMinor": 0, "fwPatch": 0, "notes": "" },
        "previous": { "id": 899, "type": { "name": target }, "fwMajor": 0, "fwMinor": 9, "fwPatch": 0, "notes": "" },
        "scheduled": { "id": 901, "type": { "name": target }, "fwMajor": 1, "fwMinor": 1, "fwPatch": 0, "notes": "rc" },
        "machine": { "name": machine_name },
        "machineId": 1,
    }))
    .unwrap()
}

/// Every board type a machine can carry, ids starting at `first_id`.
pub fn full_machine_boards(first_id: u64, machine_name: &str) -> Vec<Board> {
    let types = [
        Some("Main"),
        Some("Solenoid"),
        Some("Pump"),
        Some("Nozzle"),
        Some("Cooling"),
        Some("QR Reader"),
        Some("Conveyor"),
        Some("Ice Dispenser"),
        None,
    ];
    types
        .iter()
        .enumerate()
        .map(|(i, t)| board(first_id + i as u64, machine_name, *t))
        .collect()
}
