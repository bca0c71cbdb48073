// Data model: the records returned by the vendor API plus the small amount
// of domain logic that lives on them (target classification, application
// filtering and scheduling a firmware update onto a board).
//
// Board and application records keep every field the API sent in `extra`,
// so a board fetched, modified and PUT back loses nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Board status written when an application is queued.
pub const STATUS_PENDING: &str = "Pending";
/// Board status written when a queued application is cleared.
pub const STATUS_INSTALLED: &str = "Installed";

/// Class of controller board within a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoardTarget {
    Main,
    Solenoid,
    Pump,
    Nozzle,
    IceDispenser,
    Cooling,
    Conveyor,
    QrReader,
}

/// Targets the update workflow walks through, in menu order.
pub const UPDATE_TARGETS: [BoardTarget; 6] = [
    BoardTarget::Main,
    BoardTarget::Solenoid,
    BoardTarget::Pump,
    BoardTarget::Nozzle,
    BoardTarget::Cooling,
    BoardTarget::QrReader,
];

const ALL_TARGETS: [BoardTarget; 8] = [
    BoardTarget::Main,
    BoardTarget::Solenoid,
    BoardTarget::Pump,
    BoardTarget::Nozzle,
    BoardTarget::IceDispenser,
    BoardTarget::Cooling,
    BoardTarget::Conveyor,
    BoardTarget::QrReader,
];

impl BoardTarget {
    /// Name used by the API in `type.name`.
    pub fn name(self) -> &'static str {
        match self {
            BoardTarget::Main => "Main",
            BoardTarget::Solenoid => "Solenoid",
            BoardTarget::Pump => "Pump",
            BoardTarget::Nozzle => "Nozzle",
            BoardTarget::IceDispenser => "Ice Dispenser",
            BoardTarget::Cooling => "Cooling",
            BoardTarget::Conveyor => "Conveyor",
            BoardTarget::QrReader => "QR Reader",
        }
    }

    /// Exact lookup by API name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_TARGETS.into_iter().find(|t| t.name() == name)
    }

    /// Conveyor and ice dispenser boards are not managed through firmware
    /// applications and must never be touched by the update workflow.
    pub fn is_firmware_managed(self) -> bool {
        !matches!(self, BoardTarget::Conveyor | BoardTarget::IceDispenser)
    }
}

impl fmt::Display for BoardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardTarget {
    type Err = String;

    /// Accepts API names case-insensitively as well as snake_case aliases
    /// such as `qr_reader` or `ice_dispenser`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', " ");
        ALL_TARGETS
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown target '{s}'"))
    }
}

/// The `type` object attached to applications and boards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetType {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn target(&self) -> Option<BoardTarget> {
        self.name.as_deref().and_then(BoardTarget::from_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub organization: Option<Organization>,
}

/// A dispensing machine as listed by `GET /machine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: u64,
    pub name: String,
    /// Kept as a raw value because the API has returned both strings and
    /// numbers here.
    #[serde(default)]
    pub serial_number: Value,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Machine {
    pub fn organization_name(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|l| l.organization.as_ref())
            .map(|o| o.name.as_str())
    }

    pub fn serial(&self) -> String {
        display_value(&self.serial_number)
    }
}

/// A firmware build as listed by `GET /application`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub target: TargetType,
    pub fw_major: u32,
    pub fw_minor: u32,
    pub fw_patch: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    pub fn version_label(&self) -> String {
        format!("{}.{}.{}", self.fw_major, self.fw_minor, self.fw_patch)
    }

    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn url(&self) -> &str {
        self.file_path.as_deref().unwrap_or("")
    }
}

/// A controller board as listed by `GET /board?machineId=ID`.
///
/// Only the fields the tool reads or writes are typed; everything else,
/// including `protocolId`, the PCB version and `machine`, stays in `extra` exactly as the API
/// sent it so a PUT returns the record unchanged apart from `scheduled` and
/// `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub target: TargetType,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub previous: Option<Application>,
    #[serde(default)]
    pub scheduled: Option<Application>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Board {
    /// Target of this board, `None` when untyped or unknown to this tool.
    pub fn target_kind(&self) -> Option<BoardTarget> {
        self.target.target()
    }

    /// Whether the update workflow may modify this board at all.
    pub fn is_firmware_managed(&self) -> bool {
        self.target_kind().is_some_and(BoardTarget::is_firmware_managed)
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }

    /// Pump protocol id, when the API sent a non-null one.
    pub fn protocol_id(&self) -> Option<&Value> {
        self.extra.get("protocolId").filter(|v| !v.is_null())
    }

    /// Name of the machine this board belongs to, if embedded.
    pub fn machine_name(&self) -> Option<&str> {
        self.extra.get("machine")?.get("name")?.as_str()
    }

    pub fn pcb_label(&self) -> String {
        let part = |key: &str| {
            self.extra
                .get(key)
                .and_then(Value::as_u64)
                .map_or_else(|| "?".to_string(), |v| v.to_string())
        };
        format!("{}.{}.{}", part("pcbMajor"), part("pcbMinor"), part("pcbPatch"))
    }

    /// Apply an operator choice to this board's queued firmware.
    ///
    /// `Clear` drops any queued application and marks the board installed;
    /// `Install` queues the application (with its `version` blanked, which
    /// the API expects) and marks the board pending.
    pub fn schedule(&mut self, choice: &AppChoice) {
        match choice {
            AppChoice::Clear => {
                self.scheduled = None;
                self.status = Some(STATUS_INSTALLED.to_string());
            }
            AppChoice::Install(app) => {
                let mut app = app.clone();
                app.version = Some(String::new());
                self.scheduled = Some(app);
                self.status = Some(STATUS_PENDING.to_string());
            }
        }
    }
}

/// One uploaded log file as listed by `GET /log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub machine_id: Option<u64>,
    pub file_name: String,
    #[serde(rename = "addDT", default)]
    pub added: Option<String>,
    pub file_url: String,
}

impl LogEntry {
    /// Upload timestamp as sent by the API, empty when missing or null.
    pub fn added(&self) -> &str {
        self.added.as_deref().unwrap_or("")
    }
}

/// Envelope of the `/log` endpoint.
#[derive(Debug, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub data: Vec<LogEntry>,
}

/// Operator's firmware decision for one target.
#[derive(Debug, Clone, PartialEq)]
pub enum AppChoice {
    /// Remove whatever is queued for the target.
    Clear,
    Install(Application),
}

/// Per-target choices collected by the workflow.
pub type Selections = BTreeMap<BoardTarget, AppChoice>;

/// Filter applied to application notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesFilter {
    /// Only production releases (empty notes).
    Production,
    Exact(String),
}

impl NotesFilter {
    pub const PRODUCTION_SENTINEL: &'static str = "PROD";

    pub fn parse(raw: &str) -> Self {
        if raw == Self::PRODUCTION_SENTINEL {
            NotesFilter::Production
        } else {
            NotesFilter::Exact(raw.to_string())
        }
    }

    pub fn matches(&self, notes: Option<&str>) -> bool {
        match self {
            NotesFilter::Production => notes == Some(""),
            NotesFilter::Exact(wanted) => notes == Some(wanted.as_str()),
        }
    }
}

impl fmt::Display for NotesFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotesFilter::Production => f.write_str(Self::PRODUCTION_SENTINEL),
            NotesFilter::Exact(s) => f.write_str(s),
        }
    }
}

/// Keep applications whose type name equals `target` (ignoring case) and
/// whose notes satisfy `notes`. Order is preserved.
pub fn filter_applications(
    apps: Vec<Application>,
    target: Option<&str>,
    notes: Option<&NotesFilter>,
) -> Vec<Application> {
    apps.into_iter()
        .filter(|app| target.map_or(true, |t| app.target.name().eq_ignore_ascii_case(t)))
        .filter(|app| notes.map_or(true, |n| n.matches(app.notes.as_deref())))
        .collect()
}

/// Which machines a listing or the update workflow should consider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MachineFilter {
    #[default]
    All,
    Organization(String),
    NameContains(String),
}

impl MachineFilter {
    pub fn matches(&self, machine: &Machine) -> bool {
        match self {
            MachineFilter::All => true,
            MachineFilter::Organization(org) => machine.organization_name() == Some(org.as_str()),
            MachineFilter::NameContains(part) => machine.name.contains(part.as_str()),
        }
    }

    pub fn apply(&self, machines: Vec<Machine>) -> Vec<Machine> {
        machines.into_iter().filter(|m| self.matches(m)).collect()
    }
}

impl fmt::Display for MachineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineFilter::All => f.write_str("no filter"),
            MachineFilter::Organization(s) | MachineFilter::NameContains(s) => write!(f, "filter '{s}'"),
        }
    }
}

/// Render a JSON scalar the way an operator expects to read it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}
