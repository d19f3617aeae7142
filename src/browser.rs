use std::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::ui::LinkOpener;

/// Opens links with the desktop's default handler.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    /// Launcher to use instead of auto-detection; `$BROWSER` when unset.
    pub command: Option<String>,
}

impl SystemBrowser {
    pub fn new() -> Self {
        Self {
            command: std::env::var("BROWSER").ok().filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    /// Builds the launcher invocation for `url` without running it.
    pub fn command_for(&self, url: &str) -> Result<Command> {
        if let Some(configured) = &self.command {
            let mut parts = configured.split_whitespace();
            let program = parts
                .next()
                .ok_or_else(|| Error::Browser("empty browser command".to_string()))?;
            let mut cmd = Command::new(program);
            cmd.args(parts).arg(url);
            return Ok(cmd);
        }

        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            return Ok(cmd);
        }

        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(url);
            return Ok(cmd);
        }

        let launchers = ["xdg-open", "wslview", "sensible-browser", "gio"];
        for launcher in launchers {
            if self.is_command_available(launcher) {
                debug!("Detected link launcher: {}", launcher);
                let mut cmd = Command::new(launcher);
                if launcher == "gio" {
                    cmd.arg("open");
                }
                cmd.arg(url);
                return Ok(cmd);
            }
        }

        Err(Error::Browser(format!(
            "No link launcher found. Install xdg-open or set $BROWSER to open {}",
            url
        )))
    }

    /// Check if a command is available in PATH
    pub fn is_command_available(&self, command: &str) -> bool {
        Command::new("which")
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let cmd = self.command_for(url)?;

        // A configured browser may stay in the foreground for as long as it
        // runs; the platform launchers hand off and exit straight away.
        if self.command.is_some() {
            spawn_reaped(cmd, url)
        } else {
            wait_for_launcher(cmd, url)
        }
    }
}

/// Runs a launcher to completion and reports a non-zero exit as a failure.
fn wait_for_launcher(mut cmd: Command, url: &str) -> Result<()> {
    debug!("Running launcher: {:?}", cmd);

    let status = cmd.status().map_err(|e| {
        error!("Failed to open {}: {}", url, e);
        Error::Browser(format!("{}: {}", url, e))
    })?;

    if status.success() {
        info!("Opened {}", url);
        Ok(())
    } else {
        error!("Launcher for {} exited with {}", url, status);
        Err(Error::Browser(format!("{}: launcher exited with {}", url, status)))
    }
}

/// Starts a long-running browser and reaps it on a background thread.
fn spawn_reaped(mut cmd: Command, url: &str) -> Result<()> {
    debug!("Spawning process: {:?}", cmd);

    let mut child = cmd.spawn().map_err(|e| {
        error!("Failed to open {}: {}", url, e);
        Error::Browser(format!("{}: {}", url, e))
    })?;
    info!("Opened {}", url);

    let url = url.to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if status.success() => debug!("Browser for {} exited successfully", url),
        Ok(status) => warn!("Browser for {} exited with {}", url, status),
        Err(e) => error!("Error waiting for browser opening {}: {}", url, e),
    });

    Ok(())
}
