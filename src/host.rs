//! UI host process management.
//!
//! Spawns the application with a remote-debugging port, forwards its output
//! to the log, and terminates it during cleanup.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::itinerary::HostSpec;

/// Pause after killing stale instances before spawning a new one
const STALE_KILL_PAUSE: Duration = Duration::from_secs(1);

/// How long the host gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Everything needed to start a host
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Remote-debugging port appended as `--remote-debugging-port=<port>`
    pub port: u16,
    /// Delay after spawning before the host is assumed reachable
    pub warmup: Duration,
    /// `pkill -f` pattern run before spawning
    pub kill_pattern: Option<String>,
}

impl HostConfig {
    pub fn new(program: impl Into<String>) -> Self {
        let config = crate::config::get();
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            port: config.host.debug_port,
            warmup: Duration::from_millis(config.host.warmup_ms),
            kill_pattern: None,
        }
    }

    /// Build from an itinerary's host description
    pub fn from_spec(spec: &HostSpec) -> Self {
        let mut config = Self::new(spec.program.clone());
        config.args = spec.args.clone();
        config.cwd = spec.cwd.as_ref().map(PathBuf::from);
        config.kill_pattern = spec.kill_pattern.clone();
        config
    }

    /// Build from a command line such as `npx electron dist/main/main.js`
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        let mut config = Self::new(program.clone());
        config.args = args.to_vec();
        Some(config)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// The debug endpoint the host will listen on
    pub fn debug_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Error types for host process management
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to terminate host: {0}")]
    Terminate(String),
}

/// A running host. Killed on drop if `terminate` was never called.
#[derive(Debug)]
pub struct HostProcess {
    child: Option<Child>,
    pid: Option<u32>,
}

impl HostProcess {
    /// Kill stale instances, spawn the host and wait out the warm-up delay
    pub async fn spawn(config: &HostConfig) -> HostResult<Self> {
        if let Some(pattern) = &config.kill_pattern {
            kill_stale(pattern).await;
        }

        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .arg(format!("--remote-debugging-port={}", config.port))
            .env("ELECTRON_ENABLE_LOGGING", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| HostError::Spawn {
            program: config.program.clone(),
            source: e,
        })?;
        let pid = child.id();
        info!(
            "Started {} (pid {:?}) with remote debugging on port {}",
            config.program, pid, config.port
        );

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, "stderr");
        }

        if !config.warmup.is_zero() {
            info!("Waiting {}ms for the host to initialize", config.warmup.as_millis());
            sleep(config.warmup).await;
        }

        Ok(Self {
            child: Some(child),
            pid,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process has not exited yet
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop the host: SIGTERM, a grace period, then kill. Safe to call twice.
    pub async fn terminate(&mut self) -> HostResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("host already exited: {}", status);
            return Ok(());
        }

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!("SIGTERM to {} failed: {}", pid, e);
            }
            match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
                Ok(Ok(status)) => {
                    info!("Host exited: {}", status);
                    return Ok(());
                }
                Ok(Err(e)) => return Err(HostError::Terminate(e.to_string())),
                Err(_) => warn!("host ignored SIGTERM, killing it"),
            }
        }

        child
            .kill()
            .await
            .map_err(|e| HostError::Terminate(e.to_string()))?;
        info!("Host killed");
        Ok(())
    }
}

async fn kill_stale(pattern: &str) {
    debug!("killing stale hosts matching '{}'", pattern);
    let status = Command::new("pkill")
        .arg("-f")
        .arg(pattern)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(s) if s.success() => {
            info!("Killed stale instances matching '{}'", pattern);
            sleep(STALE_KILL_PAUSE).await;
        }
        // nothing matched, or pkill is unavailable
        Ok(_) | Err(_) => {}
    }
}

fn forward_lines<R>(stream: R, name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "shotlist::host", "[{}] {}", name, line);
        }
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sleeper() -> HostConfig {
        // `sh -c` ignores the extra port flag, which lands in $1
        HostConfig::from_command(&["sh".into(), "-c".into(), "sleep 30".into(), "sh".into()])
            .unwrap()
            .port(9333)
            .warmup(Duration::ZERO)
    }

    #[test]
    fn test_from_command() {
        let cmd: Vec<String> = ["npx", "electron", "dist/main/main.js"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = HostConfig::from_command(&cmd).unwrap();
        assert_eq!(config.program, "npx");
        assert_eq!(config.args, vec!["electron", "dist/main/main.js"]);
        assert!(HostConfig::from_command(&[]).is_none());
        assert_eq!(config.port(9229).debug_url(), "http://127.0.0.1:9229");
    }

    #[tokio::test]
    async fn test_spawn_and_terminate() {
        let mut host = HostProcess::spawn(&sleeper()).await.unwrap();
        assert!(host.pid().is_some());
        assert!(host.is_running());

        host.terminate().await.unwrap();
        assert!(!host.is_running());
        // second call is a no-op
        host.terminate().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let config = HostConfig::new("/nonexistent/shotlist-host").warmup(Duration::ZERO);
        let err = HostProcess::spawn(&config).await.unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
    }
}
