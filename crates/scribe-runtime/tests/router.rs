mod common;

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossterm::event::{Event as TermEvent, KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use common::{setup, RecordingFrontend};
use scribe_core::buffer::{BufferKind, Loc};
use scribe_core::tabs::TabList;
use scribe_core::{ExtensionFault, JobOrigin, JobResult, Session};
use scribe_runtime::{
    Event, EventError, MutationLock, Ready, Router, RuntimeConfig, ShutdownReason, Sources,
};

fn key(c: char) -> Event {
    Event::Input(TermEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
}

fn ctrl(c: char) -> Event {
    Event::Input(TermEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)))
}

#[tokio::test]
async fn test_redraw_burst_costs_one_render() {
    let dir = tempdir().unwrap();
    let (session, senders, receivers) = setup(dir.path());
    let frontend = RecordingFrontend::default();
    let mut router = Router::new(
        MutationLock::new(session),
        frontend.clone(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    for _ in 0..5 {
        assert!(senders.redraw.request());
    }

    assert!(router.step().await.unwrap().is_none());
    assert_eq!(frontend.renders(), 1);

    senders.terminate.try_send(()).unwrap();
    let shutdown = router.step().await.unwrap();

    assert_eq!(shutdown.map(|s| s.reason), Some(ShutdownReason::Terminate));
    assert_eq!(frontend.renders(), 2);
}

#[tokio::test]
async fn test_input_goes_to_prompt_when_open() {
    let dir = tempdir().unwrap();
    let (mut session, senders, receivers) = setup(dir.path());
    let id = session.buffers.from_text("", BufferKind::Default, None);
    session.tabs = TabList::from_buffers(&[id], "tab");
    let lock = MutationLock::new(session);
    let mut router = Router::new(
        lock.clone(),
        RecordingFrontend::default(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    router.dispatch(Ready::Input(key('a')));
    router.dispatch(Ready::Input(ctrl('e')));
    router.dispatch(Ready::Input(key('b')));

    lock.with(|s| {
        assert_eq!(s.buffers.get(id).unwrap().text(), "a");
        assert_eq!(s.infobar.prompt().unwrap().input(), "b");
    });
    drop(senders);
}

#[tokio::test]
async fn test_quit_request_shuts_down_and_finalizes_all() {
    let dir = tempdir().unwrap();
    let (mut session, _senders, receivers) = setup(dir.path());
    let id = session.buffers.from_text("", BufferKind::Default, None);
    session.tabs = TabList::from_buffers(&[id], "tab");
    let lock = MutationLock::new(session);
    let frontend = RecordingFrontend::default();
    let mut router = Router::new(
        lock.clone(),
        frontend.clone(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    assert!(router.dispatch(Ready::Input(key('x'))).is_none());
    assert!(router.dispatch(Ready::Input(ctrl('q'))).is_none());
    let shutdown = router.dispatch(Ready::Input(key('n'))).unwrap();

    assert_eq!(shutdown.reason, ShutdownReason::Quit);
    assert_eq!(shutdown.exit_code, 0);
    assert_eq!(shutdown.finalized, 1);
    assert_eq!(frontend.teardowns(), 1);
    assert!(lock.with(|s| s.buffers.get(id).unwrap().is_finalized()));
}

#[tokio::test]
async fn test_end_of_input_shuts_down_other_errors_ignored() {
    let dir = tempdir().unwrap();
    let (session, _senders, receivers) = setup(dir.path());
    let frontend = RecordingFrontend::default();
    let mut router = Router::new(
        MutationLock::new(session),
        frontend.clone(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    let ignored = router.dispatch(Ready::Input(Event::Error(EventError::new("bad escape", false))));
    assert!(ignored.is_none());
    assert_eq!(frontend.teardowns(), 0);

    let shutdown = router
        .dispatch(Ready::Input(Event::Error(EventError::new("tty gone", true))))
        .unwrap();
    assert_eq!(shutdown.reason, ShutdownReason::EndOfInput);
    assert_eq!(frontend.teardowns(), 1);
}

#[tokio::test]
async fn test_job_callback_runs_under_lock() {
    let dir = tempdir().unwrap();
    let (session, senders, receivers) = setup(dir.path());
    let lock = MutationLock::new(session);
    let mut router = Router::new(
        lock.clone(),
        RecordingFrontend::default(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    senders.jobs.post(JobResult::new(
        "done",
        vec!["a".to_string()],
        JobOrigin::Editor,
        Box::new(|s: &mut Session, output: String, args: Vec<String>| {
            s.infobar.message(format!("{} {}", output, args.join(",")));
        }),
    ));

    assert!(router.step().await.unwrap().is_none());

    let message = lock.with(|s| format!("{:?}", s.infobar.current_message()));
    assert!(message.contains("done a"));
}

#[tokio::test]
async fn test_plugin_job_panic_becomes_extension_fault() {
    let dir = tempdir().unwrap();
    let (session, _senders, receivers) = setup(dir.path());
    let mut router = Router::new(
        MutationLock::new(session),
        RecordingFrontend::default(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );
    let job = JobResult::new(
        "",
        Vec::new(),
        JobOrigin::Plugin("linter".to_string()),
        Box::new(|_: &mut Session, _: String, _: Vec<String>| panic!("lint crashed")),
    );

    let payload = panic::catch_unwind(AssertUnwindSafe(|| router.dispatch(Ready::Job(job))))
        .unwrap_err();

    let fault = payload.downcast_ref::<ExtensionFault>().unwrap();
    assert_eq!(fault.plugin, "linter");
    assert_eq!(fault.message, "lint crashed");
}

#[tokio::test(start_paused = true)]
async fn test_autosave_saves_every_buffer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let (mut session, _senders, receivers) = setup(dir.path());
    let id = session
        .buffers
        .open(&path, BufferKind::Default, Some(Loc::new(0, 0)))
        .unwrap();
    session.buffers.get_mut(id).unwrap().insert_text("draft");
    let lock = MutationLock::new(session);
    let mut router = Router::new(
        lock.clone(),
        RecordingFrontend::default(),
        Sources::new(receivers, Some(Duration::from_secs(8))),
        RuntimeConfig::default(),
    );

    assert!(router.step().await.unwrap().is_none());

    assert_eq!(fs::read_to_string(&path).unwrap(), "draft\n");
    assert!(!lock.with(|s| s.buffers.get(id).unwrap().modified()));
}

#[tokio::test]
async fn test_close_notification_changes_nothing() {
    let dir = tempdir().unwrap();
    let (session, senders, receivers) = setup(dir.path());
    let frontend = RecordingFrontend::default();
    let mut router = Router::new(
        MutationLock::new(session),
        frontend.clone(),
        Sources::new(receivers, None),
        RuntimeConfig::default(),
    );

    assert!(senders.close_terms.notify());
    assert!(router.step().await.unwrap().is_none());
    assert_eq!(frontend.teardowns(), 0);
}
