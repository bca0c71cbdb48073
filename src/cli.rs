// Command-line surface. Every action flag runs independently; several can be
// combined in one invocation.

use clap::Parser;
use std::path::PathBuf;

use crate::model::{BoardTarget, MachineFilter, NotesFilter};

pub const GREGORYS_ORG: &str = "Gregorys Coffee";
pub const BACKBAR_ORG: &str = "BackBar";

#[derive(Debug, Parser)]
#[command(
    name = "sidework-utils",
    version,
    about = "Interactive tools for working with Sidework machines",
    after_help = "~ with great power comes great responsibility ~"
)]
pub struct Cli {
    /// File holding the API key
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    pub key: PathBuf,

    /// File holding the auth token
    #[arg(short = 't', long = "token", value_name = "TOKEN")]
    pub token: PathBuf,

    /// Print the most recently deployed firmware applications
    #[arg(long)]
    pub list_latest_apps: bool,

    /// With --list-latest-apps, only list apps for this target (qr_reader, pump, ...)
    #[arg(long, value_name = "TARGET")]
    pub target: Option<BoardTarget>,

    /// View previous, current and queued applications for a machine
    #[arg(long, value_name = "ID")]
    pub machine_status: Option<u64>,

    /// Print all machines with ID and serial number
    #[arg(long)]
    pub list_all_machines: bool,

    /// Only consider Gregorys Coffee machines
    #[arg(long, conflicts_with_all = ["backbar", "name_filter"])]
    pub gregorys: bool,

    /// Only consider BackBar machines
    #[arg(long, conflicts_with = "name_filter")]
    pub backbar: bool,

    /// Only consider machines whose name contains FILTER
    #[arg(long, value_name = "FILTER")]
    pub name_filter: Option<String>,

    /// Pick and download recent logs of a machine
    #[arg(long, value_name = "ID")]
    pub list_logs: Option<u64>,

    /// Graph recent temperature data of a machine
    #[arg(long, value_name = "ID")]
    pub graph_temps: Option<u64>,

    /// Select machine(s) for updating and firmware per target
    #[arg(long)]
    pub update_fw: bool,

    /// Filter firmware apps by notes (PROD for production releases)
    #[arg(long, value_name = "NOTES")]
    pub notes_filter: Option<String>,

    /// With --update-fw, clear queued firmware on the selected machines
    #[arg(long)]
    pub clear: bool,
}

impl Cli {
    pub fn machine_filter(&self) -> MachineFilter {
        if self.gregorys {
            MachineFilter::Organization(GREGORYS_ORG.to_string())
        } else if self.backbar {
            MachineFilter::Organization(BACKBAR_ORG.to_string())
        } else if let Some(part) = &self.name_filter {
            MachineFilter::NameContains(part.clone())
        } else {
            MachineFilter::All
        }
    }

    pub fn notes_filter(&self) -> Option<NotesFilter> {
        self.notes_filter.as_deref().map(NotesFilter::parse)
    }
}
