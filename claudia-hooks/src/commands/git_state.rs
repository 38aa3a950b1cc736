use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Deadline for any single git invocation.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// `git log --oneline -5` in `cwd`, trimmed.
pub fn recent_commits(cwd: &Path) -> Option<String> {
    git_cmd(cwd, &["log", "--oneline", "-5"])
}

/// `git status --short` in `cwd`, trimmed.
pub fn short_status(cwd: &Path) -> Option<String> {
    git_cmd(cwd, &["status", "--short"])
}

/// Run git with a deadline. Non-zero exit, empty output, a missing binary
/// or an expired deadline all yield `None`.
pub fn git_cmd(cwd: &Path, args: &[&str]) -> Option<String> {
    git_cmd_with_timeout(cwd, args, GIT_TIMEOUT)
}

fn git_cmd_with_timeout(cwd: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drain stdout on a thread so a chatty child cannot block on a full pipe.
    let mut stdout = child.stdout.take()?;
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(_) => return None,
        }
    };

    let out = reader.join().ok()?;
    if !status.success() {
        return None;
    }
    String::from_utf8(out)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
