//! Open rendered charts in the platform image viewer
//!
//! - Linux/BSD: `xdg-open`
//! - macOS: `open`
//! - Windows: `cmd /C start`
//!
//! A custom command (config `viewer` or `MEMPLOT_VIEWER`) replaces the
//! platform default. The image path is appended as the last argument.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;

/// Resolved viewer command
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerCommand {
    /// Path to the viewer executable
    pub executable: PathBuf,
    /// Arguments placed before the image path
    pub args: Vec<String>,
}

impl ViewerCommand {
    /// Resolve `custom`, or the platform default when `None`.
    ///
    /// Returns `None` if the executable can't be found in PATH.
    pub fn resolve(custom: Option<&str>) -> Option<Self> {
        let (program, args) = match custom {
            Some(custom) => {
                let mut words = custom.split_whitespace().map(str::to_string);
                let program = words.next()?;
                (program, words.collect())
            }
            None => platform_default(),
        };

        match which::which(&program) {
            Ok(executable) => Some(Self { executable, args }),
            Err(e) => {
                log::debug!("Viewer {program} not found: {e}");
                None
            }
        }
    }

    /// Create a Command that opens `image`
    pub fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args).arg(image);
        cmd
    }
}

fn platform_default() -> (String, Vec<String>) {
    #[cfg(target_os = "macos")]
    {
        ("open".to_string(), Vec::new())
    }

    #[cfg(windows)]
    {
        // The empty string is the window title `start` expects before a quoted path
        (
            "cmd".to_string(),
            vec!["/C".to_string(), "start".to_string(), String::new()],
        )
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    {
        ("xdg-open".to_string(), Vec::new())
    }
}

/// File name of the chart shown when no `--out` is given.
pub const SCRATCH_FILE: &str = "memplot-chart.png";

/// Where a chart goes when it is only displayed, not saved.
///
/// Every display-only run reuses this file, so at most one stale chart is
/// left in the temp directory.
pub fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_FILE)
}

/// Open `image` without waiting for the viewer to exit.
///
/// Returns `false` when no viewer is available.
pub fn show(image: &Path, custom: Option<&str>) -> anyhow::Result<bool> {
    let Some(viewer) = ViewerCommand::resolve(custom) else {
        return Ok(false);
    };

    log::info!("Opening {} with {}", image.display(), viewer.executable.display());
    viewer
        .command(image)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch {}", viewer.executable.display()))?;
    Ok(true)
}
