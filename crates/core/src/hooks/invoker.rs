//! Hook process execution

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::error::HookError;
use super::event::HookInput;
use super::output::{Decision, ParsedStdout, parse_stdout};
use super::registry::HookDescriptor;
use crate::config::HookRuntimeConfig;
use crate::env::{HOOKWARDEN_HOOK_EVENT, HOOKWARDEN_PROJECT_DIR, HOOKWARDEN_TOOL_NAME};

/// Outcome of running one hook once
#[derive(Debug, Clone, PartialEq)]
pub struct HookInvocationResult {
    pub hook_name: String,
    /// None when the process never ran to completion (spawn failure, timeout)
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub decision: Decision,
    pub system_message: Option<String>,
    pub error: Option<HookError>,
}

impl HookInvocationResult {
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// A failed invocation is a deny whose reason names the failure
    fn failed(
        descriptor: &HookDescriptor,
        exit_code: Option<i32>,
        duration: Duration,
        error: HookError,
    ) -> Self {
        warn!("Hook '{}' failed: {}", descriptor.name, error);
        Self {
            hook_name: descriptor.name.clone(),
            exit_code,
            duration,
            decision: Decision::Deny(Some(format!(
                "Hook '{}' failed: {}",
                descriptor.name, error
            ))),
            system_message: None,
            error: Some(error),
        }
    }
}

/// Runs hook commands as isolated child processes
#[derive(Debug, Clone)]
pub struct HookInvoker {
    env_passthrough: Vec<String>,
    project_dir: Option<PathBuf>,
}

impl Default for HookInvoker {
    fn default() -> Self {
        Self::from_config(&HookRuntimeConfig::default())
    }
}

impl HookInvoker {
    pub fn new(env_passthrough: Vec<String>, project_dir: Option<PathBuf>) -> Self {
        Self {
            env_passthrough,
            project_dir,
        }
    }

    pub fn from_config(runtime: &HookRuntimeConfig) -> Self {
        Self::new(
            runtime.env_passthrough.clone(),
            runtime.project_dir.as_ref().map(PathBuf::from),
        )
    }

    pub fn project_dir(&self) -> Option<&PathBuf> {
        self.project_dir.as_ref()
    }

    /// Run one hook: write `input` as JSON to its stdin, wait at most the
    /// descriptor's timeout, and read its decision from stdout.
    ///
    /// Never retries and never returns an error: failures are folded into
    /// the result as a deny.
    pub async fn invoke(&self, descriptor: &HookDescriptor, input: &HookInput) -> HookInvocationResult {
        let started = Instant::now();

        let payload = match serde_json::to_vec(input) {
            Ok(payload) => payload,
            Err(e) => {
                return HookInvocationResult::failed(
                    descriptor,
                    None,
                    started.elapsed(),
                    HookError::Io(format!("failed to serialize hook input: {}", e)),
                );
            }
        };

        let mut child = match self.command(descriptor, input).spawn() {
            Ok(child) => child,
            Err(e) => {
                return HookInvocationResult::failed(
                    descriptor,
                    None,
                    started.elapsed(),
                    HookError::Spawn(e.to_string()),
                );
            }
        };

        let pid = child.id();
        let mut writer = tokio::spawn(write_stdin(child.stdin.take(), payload));
        let mut stdout = tokio::spawn(read_stream(child.stdout.take()));
        let mut stderr = tokio::spawn(read_stream(child.stderr.take()));

        // The timeout bounds the hook's own exit, not the lifetime of its pipes
        let status = match timeout(descriptor.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                terminate(&mut child, pid).await;
                abort_all(&writer, &stdout, &stderr);
                return HookInvocationResult::failed(
                    descriptor,
                    None,
                    started.elapsed(),
                    HookError::Io(e.to_string()),
                );
            }
            Err(_) => {
                terminate(&mut child, pid).await;
                abort_all(&writer, &stdout, &stderr);
                return HookInvocationResult::failed(
                    descriptor,
                    None,
                    started.elapsed(),
                    HookError::Timeout {
                        timeout_ms: descriptor.timeout_ms(),
                    },
                );
            }
        };

        let drained = {
            let drain = drain(&mut writer, &mut stdout, &mut stderr);
            tokio::pin!(drain);
            tokio::select! {
                drained = &mut drain => drained,
                _ = sleep(DRAIN_GRACE) => {
                    // Background processes left behind still hold the pipes open
                    debug!(
                        "Hook '{}' exited but its output is still open; killing its process group",
                        descriptor.name
                    );
                    kill_group(pid);
                    timeout(DRAIN_GRACE, &mut drain).await.unwrap_or_else(|_| {
                        Err(std::io::Error::other("hook output stayed open after exit"))
                    })
                }
            }
        };
        if drained.is_err() {
            abort_all(&writer, &stdout, &stderr);
        }

        match drained {
            Ok((out, err)) => interpret(descriptor, input, status, &out, &err, started.elapsed()),
            Err(e) => HookInvocationResult::failed(
                descriptor,
                status.code(),
                started.elapsed(),
                HookError::Io(e.to_string()),
            ),
        }
    }

    fn command(&self, descriptor: &HookDescriptor, input: &HookInput) -> Command {
        let mut cmd = shell_command(&descriptor.command);

        cmd.env_clear();
        for name in &self.env_passthrough {
            if let Some(value) = std::env::var_os(name) {
                cmd.env(name, value);
            }
        }
        cmd.envs(&descriptor.env)
            .env(HOOKWARDEN_HOOK_EVENT, input.hook_event_name.event_name())
            .env(HOOKWARDEN_TOOL_NAME, &input.tool_name);
        if let Some(ref dir) = self.project_dir {
            cmd.current_dir(dir).env(HOOKWARDEN_PROJECT_DIR, dir);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a timeout can take down grandchildren too
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Grace period for draining output after the hook itself has exited
const DRAIN_GRACE: Duration = Duration::from_millis(200);

async fn write_stdin(stdin: Option<ChildStdin>, payload: Vec<u8>) -> std::io::Result<()> {
    if let Some(mut stdin) = stdin {
        match stdin.write_all(&payload).await {
            // The hook exited or closed stdin without reading it all
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
            other => other?,
        }
        // stdin is dropped (closed) here
    }
    Ok(())
}

type OutputReader = JoinHandle<std::io::Result<Vec<u8>>>;

/// Wait for the stdin writer and both output readers
async fn drain(
    writer: &mut JoinHandle<std::io::Result<()>>,
    stdout: &mut OutputReader,
    stderr: &mut OutputReader,
) -> std::io::Result<(Vec<u8>, Vec<u8>)> {
    let (written, out, err) = tokio::join!(writer, stdout, stderr);
    joined(written)?;
    Ok((joined(out)?, joined(err)?))
}

fn joined<T>(result: Result<std::io::Result<T>, JoinError>) -> std::io::Result<T> {
    result.map_err(std::io::Error::other).and_then(|inner| inner)
}

fn abort_all<A, B, C>(writer: &JoinHandle<A>, stdout: &JoinHandle<B>, stderr: &JoinHandle<C>) {
    writer.abort();
    stdout.abort();
    stderr.abort();
}

/// SIGKILL the hook's process group (the hook and everything it started)
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!("Failed to kill hook process group {}: {}", pid, e),
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kill the hook's process group and reap the child
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.kill().await {
        debug!("Failed to kill hook process: {}", e);
    }
}

fn interpret(
    descriptor: &HookDescriptor,
    input: &HookInput,
    status: ExitStatus,
    stdout: &[u8],
    stderr: &[u8],
    duration: Duration,
) -> HookInvocationResult {
    let code = status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        debug!(hook = %descriptor.name, stderr = %stderr.trim(), "hook stderr");
    }

    match parse_stdout(&stdout, input.hook_event_name) {
        ParsedStdout::Parsed(output) => {
            debug!(
                "Hook '{}' exited with {} and decided {}",
                descriptor.name,
                code,
                output.decision.label()
            );
            HookInvocationResult {
                hook_name: descriptor.name.clone(),
                exit_code: Some(code),
                duration,
                decision: output.decision,
                system_message: output.system_message,
                error: None,
            }
        }
        ParsedStdout::Malformed(reason) => HookInvocationResult::failed(
            descriptor,
            Some(code),
            duration,
            HookError::MalformedOutput(reason),
        ),
        ParsedStdout::Empty | ParsedStdout::Unparsable if status.success() => {
            HookInvocationResult {
                hook_name: descriptor.name.clone(),
                exit_code: Some(code),
                duration,
                decision: Decision::Allow(None),
                system_message: None,
                error: None,
            }
        }
        ParsedStdout::Empty | ParsedStdout::Unparsable => HookInvocationResult::failed(
            descriptor,
            Some(code),
            duration,
            HookError::NonZeroExit { code },
        ),
    }
}
