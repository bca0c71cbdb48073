// Report files written by the firmware update workflow.
//
// Every `append` opens, writes and closes the file, so a report is complete
// up to the last line even if the process dies mid-run.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::{America::Los_Angeles, Tz};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File written instead of a timestamped report when clearing queues.
pub const REVERT_FILE_NAME: &str = "revert.txt";

pub const FAILURE_BANNER: &str = "!!! !!! one or more operations failed, check report !!! !!!";

const DIVIDER: &str = "***  ***  ***  ***  ***  ***  ***  ***  ***  ***  ***  ***  ***  ***";

/// Current time in the fleet's home time zone.
pub fn pacific_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Los_Angeles)
}

pub fn report_file_name<T: TimeZone>(now: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    format!("FW-UPDATE-REPORT_{}.txt", now.format("%Y-%m-%d_%H-%M-%S_%Z%z"))
}

pub fn report_header<T: TimeZone>(title: &str, now: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    format!(
        "***  {title}   ***  ***  ***  ***  ***  ***  ***  ***\n***\n***  Date: {}\n{DIVIDER}\n",
        now.format("%Y-%m-%d %H:%M:%S %Z %z")
    )
}

pub fn section(title: &str) -> String {
    format!("\n-- {title} -- -- -- -- -- -- -- \n\n")
}

/// Append-only text report.
#[derive(Debug, Clone)]
pub struct Report {
    path: PathBuf,
}

impl Report {
    /// Create (or truncate) `dir/file_name` and write `header` to it.
    pub fn create(dir: &Path, file_name: &str, header: &str) -> Result<Self> {
        let path = dir.join(file_name);
        std::fs::write(&path, header)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        Ok(Report { path })
    }

    pub fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open report {}", self.path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write report {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
