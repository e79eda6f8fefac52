use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Flags controlling a single child process run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Do not fail when the child exits non-zero.
    pub ignore_return_code: bool,
    /// Do not echo the child's stdout while capturing it.
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
}

/// Runs external programs and captures their standard output.
pub trait ProcessRunner {
    /// Runs `program` to completion.
    ///
    /// # Errors
    /// Fails when the program cannot be spawned, or when it exits non-zero and
    /// `options.ignore_return_code` is not set.
    fn exec(&self, program: &Path, args: &[&str], options: ExecOptions) -> io::Result<ExecOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn exec(&self, program: &Path, args: &[&str], options: ExecOptions) -> io::Result<ExecOutput> {
        debug!("[command]{} {}", program.display(), args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let captured = match child.stdout.take() {
            Some(pipe) => capture_lines(pipe, options.silent),
            None => Ok(String::new()),
        };
        // Reap the child even when reading its output failed.
        let status = child.wait()?;
        let stdout = captured?;
        let code = status.code().unwrap_or(-1);
        if !status.success() && !options.ignore_return_code {
            return Err(io::Error::other(format!(
                "The process '{}' failed with exit code {}",
                program.display(),
                code
            )));
        }
        Ok(ExecOutput { code, stdout })
    }
}

/// Reads `pipe` to the end, decoding each line lossily.
fn capture_lines(pipe: impl Read, silent: bool) -> io::Result<String> {
    let mut reader = BufReader::new(pipe);
    let mut stdout = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf);
        if !silent {
            println!("{line}");
        }
        stdout.push_str(&line);
        stdout.push('\n');
    }
    Ok(stdout)
}
