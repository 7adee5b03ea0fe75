//! Subprocess execution with line-buffered output streaming
//!
//! Wraps a child process so its combined stdout/stderr arrives as an
//! iterator of lines while the process runs, never buffered until
//! completion. The caller drains the lines, then `finish()` joins the
//! reader threads and returns the exit status as a single unit.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// Errors from subprocess handling.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Which stream a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// One line of child output.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub source: StreamSource,
    pub text: String,
}

/// A running child whose output is consumed line-by-line.
#[derive(Debug)]
pub struct StreamedChild {
    child: Child,
    receiver: Receiver<OutputLine>,
    readers: Vec<JoinHandle<()>>,
}

/// Spawn `command` with both output streams piped and line-streamed.
pub fn spawn_streamed(mut command: Command) -> Result<StreamedChild, ProcessError> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command.spawn().map_err(ProcessError::Spawn)?;

    let (sender, receiver) = mpsc::channel();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(reader_thread(stdout, StreamSource::Stdout, sender.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(reader_thread(stderr, StreamSource::Stderr, sender.clone()));
    }
    // The iterator ends when every sender is gone.
    drop(sender);

    Ok(StreamedChild {
        child,
        receiver,
        readers,
    })
}

fn reader_thread<R: Read + Send + 'static>(
    stream: R,
    source: StreamSource,
    sender: Sender<OutputLine>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    if sender.send(OutputLine { source, text }).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

impl Iterator for StreamedChild {
    type Item = OutputLine;

    /// Blocks until the next output line, or `None` once both streams close.
    fn next(&mut self) -> Option<OutputLine> {
        self.receiver.recv().ok()
    }
}

impl StreamedChild {
    /// Join the reader threads and collect the exit status.
    pub fn finish(mut self) -> Result<ExitStatus, ProcessError> {
        for handle in self.readers.drain(..) {
            let _ = handle.join();
        }
        self.child.wait().map_err(ProcessError::Wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_both_outputs_line_buffered() {
        let mut command = Command::new("/bin/sh");
        command.args(["-c", "echo out-line; echo err-line 1>&2; echo out-again"]);

        let mut child = spawn_streamed(command).unwrap();
        let lines: Vec<OutputLine> = child.by_ref().collect();
        let status = child.finish().unwrap();

        assert!(status.success());
        let stdout: Vec<&str> = lines
            .iter()
            .filter(|l| l.source == StreamSource::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        let stderr: Vec<&str> = lines
            .iter()
            .filter(|l| l.source == StreamSource::Stderr)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["out-line", "out-again"]);
        assert_eq!(stderr, vec!["err-line"]);
    }

    #[test]
    fn test_exit_status_surfaces_after_stream() {
        let mut command = Command::new("/bin/sh");
        command.args(["-c", "echo done; exit 7"]);

        let mut child = spawn_streamed(command).unwrap();
        let lines: Vec<OutputLine> = child.by_ref().collect();
        let status = child.finish().unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(status.code(), Some(7));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let command = Command::new("/nonexistent/binary-for-sure");
        assert!(matches!(
            spawn_streamed(command),
            Err(ProcessError::Spawn(_))
        ));
    }
}
