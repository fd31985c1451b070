//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `StdCommandRunner` is the production implementation: blocking
//! `std::process` execution with a deadline and a guaranteed kill.

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::application::ports::CommandRunner;

/// Default timeout for short helper commands (gpg, gpgconf).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60);

/// Production `CommandRunner`.
///
/// Output pipes are drained on background threads so a chatty child cannot
/// block on a full pipe while we wait for it.
#[derive(Debug, Clone, Copy)]
pub struct StdCommandRunner {
    timeout: Duration,
}

impl StdCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for StdCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for StdCommandRunner {
    fn run(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
        self.run_with_timeout(program, args, env, self.timeout)
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Output> {
        spawn_and_wait(program, args, env, timeout, None)
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
        input: &[u8],
    ) -> Result<Output> {
        spawn_and_wait(program, args, env, timeout, Some(input))
    }
}

fn spawn_and_wait(
    program: &str,
    args: &[&str],
    env: &[(&str, &str)],
    timeout: Duration,
    input: Option<&[u8]>,
) -> Result<Output> {
    debug!(program, ?args, stdin_bytes = input.map(<[u8]>::len), "spawning");
    let mut child = std::process::Command::new(program)
        .args(args)
        .envs(env.iter().copied())
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let feeder = input.and_then(|bytes| feed(child.stdin.take(), bytes.to_vec()));
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_with_deadline(&mut child, program, timeout)?;
    if let Some(feeder) = feeder {
        let _ = feeder.join();
    }
    Ok(Output {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

/// Write `input` on a thread; the pipe closes when it is done.
fn feed(stdin: Option<ChildStdin>, input: Vec<u8>) -> Option<JoinHandle<()>> {
    stdin.map(|mut stdin| {
        thread::spawn(move || {
            // A child that exits without reading closes the pipe early.
            let _ = stdin.write_all(&input);
        })
    })
}

fn wait_with_deadline(
    child: &mut Child,
    program: &str,
    timeout: Duration,
) -> Result<ExitStatus> {
    let status = child
        .wait_timeout(timeout)
        .with_context(|| format!("waiting for {program}"))?;
    if let Some(status) = status {
        return Ok(status);
    }
    if let Err(e) = child.kill() {
        warn!(program, error = %e, "could not kill timed out process");
    }
    // Reap so the pipes close and the drain threads finish.
    let _ = child.wait();
    anyhow::bail!("{program} timed out after {}s", timeout.as_secs());
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
