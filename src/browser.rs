//! Opening created objects in a web browser.

use colored::*;
use std::thread;
use std::time::Duration;
use subprocess::{Exec, NullFile};
use thiserror::Error;

/// Grace period so that GitHub has the new object ready when the browser asks for it
pub const OPEN_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum BrowserErr {
    #[error("Cannot execute '{cmd}'")]
    Exec {
        cmd: String,
        #[source]
        e: subprocess::PopenError,
    },
    #[error("'{cmd}' failed with {status}")]
    Status { cmd: String, status: String },
}

pub trait Browser {
    fn open(&self, url: &str) -> Result<(), BrowserErr>;
}

/// Hands URLs to the platform's default URL handler or to a user-supplied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct System {
    cmd: String,
    args: Vec<String>,
}

impl System {
    pub fn new() -> Self {
        let (cmd, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(windows) {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Uses `cmd` instead of the platform default. The URL is passed as last argument.
    pub fn with_command(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: Vec::new(),
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser for System {
    fn open(&self, url: &str) -> Result<(), BrowserErr> {
        debug!("Opening {} with {}", url, self.cmd);
        let status = Exec::cmd(&self.cmd)
            .args(self.args.as_slice())
            .arg(url)
            .stdout(NullFile)
            .stderr(NullFile)
            .join()
            .map_err(|e| BrowserErr::Exec {
                cmd: self.cmd.clone(),
                e,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(BrowserErr::Status {
                cmd: self.cmd.clone(),
                status: format!("{:?}", status),
            })
        }
    }
}

/// Waits [`OPEN_DELAY`], then opens `url`. Failures are logged but never returned.
pub fn open_delayed(browser: &dyn Browser, url: &str) {
    thread::sleep(OPEN_DELAY);
    if let Err(e) = browser.open(url) {
        warn!("Cannot open {} in browser: {}", url.yellow(), e);
    }
}
