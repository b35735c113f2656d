use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use std::io::{self, BufRead, BufReader};
use std::process::{Command, Stdio};
use std::thread;

fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn spawn_error(program: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::CommandFailed(format!("{program}: command not found"))
    } else {
        Error::Io(err)
    }
}

/// Execute a command; output is echoed in verbose mode and stderr is kept
/// for the error message when the command fails
pub fn execute(ctx: &Context, program: &str, args: &[&str]) -> Result<()> {
    let line = command_line(program, args);
    if ctx.verbose {
        println!("Executing: {line}");
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    // Drain stderr on its own thread so a chatty installer cannot block on a full pipe
    let verbose = ctx.verbose;
    let stderr_reader = child.stderr.take().map(|stderr| {
        thread::spawn(move || {
            let mut collected = Vec::new();
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                if verbose {
                    eprintln!("{line}");
                }
                collected.push(line);
            }
            collected
        })
    });

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
            if ctx.verbose {
                println!("{line}");
            }
        }
    }

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    let status = child.wait()?;

    if !status.success() {
        let mut message = format!(
            "{} failed with exit code: {}",
            line,
            status.code().unwrap_or(-1)
        );
        if let Some(last) = stderr.iter().rev().find(|l| !l.trim().is_empty()) {
            message.push_str(&format!(" ({})", last.trim()));
        }
        return Err(Error::CommandFailed(message));
    }

    Ok(())
}

/// Execute a command and capture its standard output
pub fn execute_with_output(ctx: &Context, program: &str, args: &[&str]) -> Result<String> {
    let line = command_line(program, args);
    if ctx.verbose {
        println!("Executing: {line}");
    }

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CommandFailed(format!(
            "{} failed: {}",
            line,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
