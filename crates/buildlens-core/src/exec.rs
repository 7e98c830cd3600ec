//! Process execution behind a node capability.
//!
//! Resolution and command building never know where a command runs; they
//! hand a [`CommandSpec`] to an [`Executor`] and the final dispatch crosses
//! the node boundary. [`LocalExecutor`] runs on the issuing host. Remote
//! dispatch (a labeled CI agent) implements the same trait.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use crate::command::version_args;
use crate::error::{Error, Result};

/// Deadline for the `--version` availability probe. Deliberately short; an
/// unresponsive binary counts as unavailable.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One command to run: program, argv, environment, working directory, and a
/// hard deadline.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub work_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
            work_dir: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured result of a finished process. A non-zero exit is data, not an
/// error; the caller decides whether it is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams joined, stdout first. List discovery parses this because
    /// some CLI builds print their tables to stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end_matches('\n'), self.stderr)
        }
    }
}

/// Capability to run commands on some node.
///
/// Terminal states per invocation: success or non-zero exit (both as
/// [`ExecOutput`]), timeout, or launch failure (typed errors). No retries
/// happen here; retry policy belongs to callers.
pub trait Executor {
    /// Node label for log lines ("controller", agent name, ...).
    fn node_name(&self) -> &str;

    /// Home directory of the executing node. `~/` in configured paths
    /// expands against this, not the issuing process's home.
    fn home_dir(&self) -> Option<PathBuf>;

    fn run(&self, spec: CommandSpec) -> impl Future<Output = Result<ExecOutput>> + Send;
}

/// Expand a leading `~` against an execution node's home directory. Paths
/// without the prefix, or a missing home, pass through unchanged.
pub fn expand_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };
    if path == "~" {
        return home.to_string_lossy().into_owned();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest).to_string_lossy().into_owned(),
        None => path.to_string(),
    }
}

/// Runs commands on the issuing host.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for LocalExecutor {
    fn node_name(&self) -> &str {
        "controller"
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs_next::home_dir()
    }

    async fn run(&self, spec: CommandSpec) -> Result<ExecOutput> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Backstop: dropping the wait future must not leak the child.
            .kill_on_drop(true);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.work_dir {
            cmd.current_dir(dir);
        }
        // Own process group so the timeout kill reaches grandchildren too.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| Error::Launch {
            program: spec.program.clone(),
            source: e,
        })?;
        // Armed from spawn: the group is killed on timeout, on a wait error,
        // and when the caller drops this future (pipeline abort). Only a
        // normal exit disarms it.
        let mut group = GroupKill::new(child.id());

        log::debug!(
            "running '{}' with {} args on {} (timeout {}s)",
            spec.program,
            spec.args.len(),
            self.node_name(),
            spec.timeout.as_secs()
        );

        match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(Ok(out)) => {
                group.disarm();
                Ok(ExecOutput {
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                    exit_code: out.status.code().unwrap_or(-1),
                })
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::Timeout {
                program: spec.program.clone(),
                limit: spec.timeout,
            }),
        }
    }
}

/// Kills the process group when dropped, unless disarmed. Covers every way
/// out of [`LocalExecutor::run`] after spawn, including the run future being
/// dropped mid-wait, so grandchildren of the CLI cannot outlive the caller.
struct GroupKill {
    pid: Option<u32>,
}

impl GroupKill {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        kill_process_group(self.pid.take());
    }
}

/// SIGKILL the whole process group on unix. Elsewhere the kill-on-drop
/// handle reaps the direct child only.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        log::debug!("killpg({pid}) failed: {e}");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Availability probe: `<cli> --version` with a short deadline. Any launch
/// failure or non-zero exit means "unavailable" rather than an error.
pub async fn probe_cli<E: Executor>(executor: &E, cli_path: &str) -> bool {
    let program = expand_home(cli_path, executor.home_dir().as_deref());
    let spec = CommandSpec::new(program, version_args()).timeout(PROBE_TIMEOUT);
    match executor.run(spec).await {
        Ok(out) => out.success(),
        Err(e) => {
            log::info!("CLI not available at '{cli_path}': {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn expand_home_variants() {
        let home = PathBuf::from("/home/ci");
        assert_eq!(
            expand_home("~/.local/bin/codex", Some(&home)),
            "/home/ci/.local/bin/codex"
        );
        assert_eq!(expand_home("~", Some(&home)), "/home/ci");
        assert_eq!(expand_home("/abs/path", Some(&home)), "/abs/path");
        assert_eq!(expand_home("rel/path", Some(&home)), "rel/path");
        // "~user" is not expanded.
        assert_eq!(expand_home("~other/bin", Some(&home)), "~other/bin");
        assert_eq!(expand_home("~/x", None), "~/x");
    }

    #[test]
    fn combined_joins_streams_stdout_first() {
        let out = ExecOutput {
            stdout: "models\n".into(),
            stderr: "warning\n".into(),
            exit_code: 0,
        };
        assert_eq!(out.combined(), "models\nwarning\n");

        let only_err = ExecOutput {
            stdout: String::new(),
            stderr: "oops".into(),
            exit_code: 1,
        };
        assert_eq!(only_err.combined(), "oops");
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;

        fn sh(script: &str) -> CommandSpec {
            CommandSpec::new("/bin/sh", vec!["-c".into(), script.into()])
        }

        #[tokio::test]
        async fn captures_stdout_and_exit_zero() {
            let out = LocalExecutor::new().run(sh("echo hello")).await.unwrap();
            assert_eq!(out.exit_code, 0);
            assert!(out.success());
            assert_eq!(out.stdout, "hello\n");
            assert_eq!(out.stderr, "");
        }

        #[tokio::test]
        async fn nonzero_exit_is_data_with_stderr() {
            let out = LocalExecutor::new()
                .run(sh("echo broken >&2; exit 3"))
                .await
                .unwrap();
            assert_eq!(out.exit_code, 3);
            assert!(!out.success());
            assert_eq!(out.stderr, "broken\n");
        }

        #[tokio::test]
        async fn environment_and_workdir_are_applied() {
            let dir = tempfile::tempdir().unwrap();
            let spec = sh("echo $BL_PROBE; pwd")
                .env(vec![("BL_PROBE".into(), "42".into())])
                .work_dir(dir.path());
            let out = LocalExecutor::new().run(spec).await.unwrap();
            assert!(out.stdout.starts_with("42\n"));
            assert!(out.stdout.contains(&*dir.path().to_string_lossy()));
        }

        #[tokio::test]
        async fn timeout_kills_the_process() {
            let started = Instant::now();
            let spec = sh("sleep 10").timeout(Duration::from_millis(300));
            let err = LocalExecutor::new().run(spec).await.unwrap_err();
            assert!(matches!(err, Error::Timeout { .. }));
            assert!(
                started.elapsed() < Duration::from_secs(5),
                "timeout must not wait for the sleep"
            );
        }

        #[tokio::test]
        async fn dropping_the_run_future_kills_the_process_group() {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("grandchild.pid");
            let spec = sh(&format!(
                "sleep 30 & echo $! > {}; wait",
                pid_file.display()
            ));

            let task = tokio::spawn(async move { LocalExecutor::new().run(spec).await });

            let deadline = Instant::now() + Duration::from_secs(5);
            let mut pid = None;
            while pid.is_none() && Instant::now() < deadline {
                pid = std::fs::read_to_string(&pid_file)
                    .ok()
                    .and_then(|s| s.trim().parse::<i32>().ok());
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let pid = pid.expect("grandchild pid was not recorded");

            // Pipeline abort: drop the run future while the shell is waiting.
            task.abort();
            let _ = task.await;
            tokio::time::sleep(Duration::from_millis(200)).await;

            // Gone means unsignalable or a zombie awaiting reaping.
            let alive = kill(Pid::from_raw(pid), None).is_ok()
                && std::fs::read_to_string(format!("/proc/{pid}/stat"))
                    .map(|stat| !stat.contains(") Z"))
                    .unwrap_or(false);
            assert!(!alive, "grandchild sleep (pid {pid}) survived caller cancellation");
        }

        #[tokio::test]
        async fn missing_binary_is_a_launch_failure() {
            let spec = CommandSpec::new("/nonexistent/bin/codex", vec!["--version".into()]);
            let err = LocalExecutor::new().run(spec).await.unwrap_err();
            assert!(matches!(err, Error::Launch { .. }));
        }

        #[tokio::test]
        async fn probe_maps_failures_to_unavailable() {
            assert!(!probe_cli(&LocalExecutor::new(), "/nonexistent/bin/codex").await);
            assert!(!probe_cli(&LocalExecutor::new(), "/bin/false").await);
        }

        #[tokio::test]
        async fn probe_succeeds_for_exit_zero() {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().unwrap();
            let cli = dir.path().join("fake-codex");
            std::fs::write(&cli, "#!/bin/sh\necho fake-codex 1.0\n").unwrap();
            std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();

            assert!(probe_cli(&LocalExecutor::new(), &cli.to_string_lossy()).await);
        }
    }
}
