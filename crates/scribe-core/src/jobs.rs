//! Background jobs.
//!
//! A job runs an external program on its own thread. When it finishes, its
//! output, arguments and completion callback are handed to the event router,
//! which invokes the callback under the mutation lock.
//!
//! A panic on a job thread still produces a result. Its callback resumes the
//! panic, so it unwinds on the router thread instead of being lost.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::session::Session;

/// Callback invoked with the job's output and arguments.
pub type JobCallback = Box<dyn FnOnce(&mut Session, String, Vec<String>) + Send>;

/// Who started a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOrigin {
    Editor,
    Plugin(String),
}

/// A finished job waiting for dispatch.
pub struct JobResult {
    pub output: String,
    pub args: Vec<String>,
    pub origin: JobOrigin,
    pub callback: JobCallback,
}

impl fmt::Debug for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobResult")
            .field("output", &self.output)
            .field("args", &self.args)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl JobResult {
    pub fn new(output: impl Into<String>, args: Vec<String>, origin: JobOrigin, callback: JobCallback) -> Self {
        Self {
            output: output.into(),
            args,
            origin,
            callback,
        }
    }

    /// Runs the completion callback.
    pub fn complete(self, session: &mut Session) {
        (self.callback)(session, self.output, self.args);
    }
}

/// Creates the job result channel.
pub fn channel(capacity: usize) -> (JobSender, mpsc::Receiver<JobResult>) {
    let (tx, rx) = mpsc::channel(capacity);
    (JobSender { tx }, rx)
}

/// Handle for starting jobs and posting their results.
#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::Sender<JobResult>,
}

impl fmt::Debug for JobSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSender").finish_non_exhaustive()
    }
}

impl JobSender {
    /// Runs `program` with `args` on a background thread.
    pub fn spawn(
        &self,
        origin: JobOrigin,
        program: impl Into<PathBuf>,
        args: Vec<String>,
        callback: JobCallback,
    ) -> io::Result<()> {
        let program = program.into();
        self.spawn_with(origin, args, callback, move |args| {
            debug!(program = %program.display(), args = ?args, "job started");
            run(&program, args)
        })
    }

    fn spawn_with<W>(
        &self,
        origin: JobOrigin,
        args: Vec<String>,
        callback: JobCallback,
        work: W,
    ) -> io::Result<()>
    where
        W: FnOnce(&[String]) -> String + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name("job".to_string())
            .spawn(move || {
                let result = match panic::catch_unwind(AssertUnwindSafe(|| work(&args))) {
                    Ok(output) => JobResult::new(output, args, origin, callback),
                    Err(payload) => {
                        warn!(origin = ?origin, "job thread panicked");
                        let resume: JobCallback =
                            Box::new(move |_: &mut Session, _: String, _: Vec<String>| {
                                panic::resume_unwind(payload)
                            });
                        JobResult::new(String::new(), args, origin, resume)
                    }
                };
                if tx.blocking_send(result).is_err() {
                    debug!("job finished after the router stopped");
                }
            })?;
        Ok(())
    }

    /// Posts an already-completed result without blocking.
    pub fn post(&self, result: JobResult) {
        if let Err(e) = self.tx.try_send(result) {
            warn!(error = %e, "dropping job result");
        }
    }
}

fn run(program: &Path, args: &[String]) -> String {
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
    {
        Ok(out) => {
            let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            text
        }
        Err(e) => format!("{}: {}", program.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infobar::Message;
    use crate::session::test_support;
    use tempfile::tempdir;

    #[test]
    fn test_job_output_reaches_callback() {
        let dir = tempdir().unwrap();
        let (mut session, _rx) = test_support::session(dir.path());
        let (jobs, mut rx) = channel(1);
        let callback: JobCallback =
            Box::new(|session: &mut Session, output: String, args: Vec<String>| {
                session.infobar.message(format!("{} {}", args.join(" "), output));
            });

        jobs.spawn_with(JobOrigin::Editor, vec!["fmt".to_string()], callback, |args| {
            format!("{} ok", args.len())
        })
        .unwrap();
        rx.blocking_recv().unwrap().complete(&mut session);

        assert_eq!(
            session.infobar.current_message(),
            Some(&Message::Info("fmt 1 ok".to_string()))
        );
    }

    #[test]
    fn test_job_thread_panic_resumes_on_completion() {
        let dir = tempdir().unwrap();
        let (mut session, _rx) = test_support::session(dir.path());
        let (jobs, mut rx) = channel(1);
        let callback: JobCallback = Box::new(|_: &mut Session, _: String, _: Vec<String>| {});

        jobs.spawn_with(JobOrigin::Editor, Vec::new(), callback, |_| panic!("job exploded"))
            .unwrap();
        let result = rx.blocking_recv().unwrap();
        assert_eq!(result.origin, JobOrigin::Editor);

        let payload = panic::catch_unwind(AssertUnwindSafe(|| result.complete(&mut session)))
            .unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"job exploded"));
    }
}
