use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Two planner returns plus a trailing partial one, with interleaved noise.
pub const SAMPLE_LOG: &str = "\
[planner] timestep 0
TrajLNS:heuristics_mem_GB = 1.5
TrajLNS:trajs_mem_GB = 0.25
TrajLNS:total_mem_GB = 1.75
[planner] timestep 1
TrajLNS:heuristics_mem_GB = 1.5
TrajLNS:trajs_mem_GB = 0.5
TrajLNS:total_mem_GB = 2.0
[planner] timestep 2
TrajLNS:heuristics_mem_GB = 2.125
";

/// Isolated directory holding a log file
pub struct TestLog {
    temp_dir: TempDir,
    path: PathBuf,
}

impl TestLog {
    pub fn new(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("log.txt");
        std::fs::write(&path, contents).expect("Failed to write log file");
        Self { temp_dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Install a viewer script that copies the image it is given to the
    /// returned path. Point `MEMPLOT_VIEWER` at the script to use it.
    #[cfg(unix)]
    pub fn stub_viewer(&self) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let script = self.dir().join("viewer.sh");
        let shown = self.dir().join("shown");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\ncp \"$1\" \"{0}.part\" && mv \"{0}.part\" \"{0}\"\n",
                shown.display()
            ),
        )
        .expect("Failed to write viewer script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make viewer script executable");
        (script, shown)
    }

    /// `plot-mem-usage --log <this log>`, isolated from the user's config
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("plot-mem-usage");
        cmd.arg("--log")
            .arg(&self.path)
            .env("MEMPLOT_CONFIG_PATH", self.dir().join("no-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(unix)]
/// Wait for a detached process to produce `path`.
pub fn wait_for_file(path: &Path) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !path.exists() {
        assert!(
            Instant::now() < deadline,
            "{} was never written",
            path.display()
        );
        std::thread::sleep(Duration::from_millis(50));
    }
    std::fs::read(path).expect("Failed to read file")
}
