//! Tests for the host-side send/acknowledge exchange

mod common;

use common::*;
use std::thread;
use std::time::{Duration, Instant};
use triton_lib::config::LinkConfig;
use triton_lib::responder::Responder;
use triton_lib::session::{CancelToken, Session, SessionState};

fn config() -> LinkConfig {
    LinkConfig::new("mock").with_ack_timeout(Duration::from_secs(5))
}

#[test]
fn test_exchange_acknowledged() {
    let port = ScriptedPort::replying(&["Year: 2025\r\n", "Checksum valid: true\r\n"]);
    let mut session = Session::new(config());

    let ack = session
        .exchange(port, &reference_params(), Variant::A, &CancelToken::new())
        .expect("exchange failed");

    assert_eq!(ack.frame, REFERENCE_FRAME);
    assert_eq!(ack.lines, vec!["Year: 2025".to_string(), "Checksum valid: true".to_string()]);
    assert_eq!(session.state(), SessionState::Acknowledged);
}

#[test]
fn test_writes_exact_hex_text() {
    let mut session = Session::new(config());
    session.open(ScriptedPort::default()).unwrap();
    let sent = session.send(&reference_params(), Variant::A).unwrap();
    assert_eq!(sent, REFERENCE_FRAME);
    assert_eq!(session.state(), SessionState::FrameSent);
}

#[test]
fn test_delimited_config_wraps_frame() {
    let mut session = Session::new(config().with_delimiting(Delimiting::Delimited));
    session.open(ScriptedPort::default()).unwrap();
    let sent = session.send(&reference_params(), Variant::A).unwrap();
    assert_eq!(sent, format!("${};", REFERENCE_FRAME));
}

#[test]
fn test_ack_split_across_reads() {
    let port = ScriptedPort::new([
        ReadEvent::Data(b"Checksum va".to_vec()),
        ReadEvent::TimedOut,
        ReadEvent::Data(b"lid: true\n".to_vec()),
    ]);
    let mut session = Session::new(config());
    let ack = session
        .exchange(port, &reference_params(), Variant::A, &CancelToken::new())
        .unwrap();
    assert_eq!(ack.lines, vec!["Checksum valid: true".to_string()]);
}

#[test]
fn test_rejection_does_not_end_exchange() {
    let port = ScriptedPort::replying(&[
        "Checksum valid: false (Checksum mismatch)\n",
        "Checksum valid: true\n",
    ]);
    let mut session = Session::new(config());
    let ack = session
        .exchange(port, &reference_params(), Variant::A, &CancelToken::new())
        .unwrap();
    assert_eq!(ack.lines.len(), 2);
}

#[test]
fn test_timeout_without_ack() {
    let port = ScriptedPort::replying(&["Checksum does not match\n"]);
    let mut session = Session::new(config().with_ack_timeout(Duration::from_millis(50)));

    let started = Instant::now();
    let result = session.exchange(port, &reference_params(), Variant::A, &CancelToken::new());

    assert!(matches!(result, Err(LinkError::Timeout(t)) if t == Duration::from_millis(50)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_cancel_before_ack() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut session = Session::new(config());
    let result = session.exchange(ScriptedPort::default(), &reference_params(), Variant::A, &cancel);
    assert!(matches!(result, Err(LinkError::Cancelled)));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_cancel_from_another_thread() {
    init_tracing();
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        remote.cancel();
    });

    let mut session = Session::new(config());
    let result = session.exchange(ScriptedPort::default(), &reference_params(), Variant::A, &cancel);
    canceller.join().unwrap();

    assert!(matches!(result, Err(LinkError::Cancelled)));
}

#[test]
fn test_eof_before_ack() {
    let port = ScriptedPort::new([ReadEvent::Data(b"booting\n".to_vec()), ReadEvent::Eof]);
    let mut session = Session::new(config());
    let result = session.exchange(port, &reference_params(), Variant::A, &CancelToken::new());
    assert!(matches!(result, Err(LinkError::Closed)));
}

#[test]
fn test_operations_out_of_order() {
    let mut session: Session<ScriptedPort> = Session::new(config());
    assert!(matches!(
        session.send(&reference_params(), Variant::A),
        Err(LinkError::State { operation: "send", state: SessionState::Idle })
    ));
    assert!(matches!(
        session.await_ack(&CancelToken::new()),
        Err(LinkError::State { operation: "await_ack", .. })
    ));

    session.open(ScriptedPort::default()).unwrap();
    assert!(matches!(
        session.open(ScriptedPort::default()),
        Err(LinkError::State { operation: "open", state: SessionState::PortOpen })
    ));
}

#[test]
fn test_encoding_error_keeps_port_open() {
    let mut session = Session::new(config());
    session.open(ScriptedPort::default()).unwrap();
    let result = session.send(&reference_params(), Variant::B);
    assert!(matches!(result, Err(LinkError::Frame(FrameError::Encoding { .. }))));
    assert_eq!(session.state(), SessionState::PortOpen);
}

#[test]
fn test_against_simulated_device() {
    init_tracing();
    for (params, variant) in [
        (reference_params(), Variant::A),
        (reference_params().with_dive(3, 120), Variant::B),
    ] {
        let device = SimulatedDevice::new(Responder::default());
        let mut session = Session::new(config());
        let ack = session
            .exchange(device, &params, variant, &CancelToken::new())
            .expect("simulated device did not acknowledge");
        assert_eq!(ack.lines.last().map(String::as_str), Some("Checksum valid: true"));
    }
}

#[test]
fn test_session_reusable_after_ack() {
    let mut session = Session::new(config());
    for _ in 0..2 {
        let port = ScriptedPort::replying(&["Checksum valid: true\n"]);
        session
            .exchange(port, &reference_params(), Variant::A, &CancelToken::new())
            .unwrap();
    }
    assert_eq!(session.state(), SessionState::Acknowledged);
}

#[test]
fn test_sync_clock_then_send() {
    let mut port = ScriptedPort::replying(&["RTC set\r\n", "Checksum valid: true\n"]);
    let timestamp = Timestamp::new(2025, 1, 7, 19, 9, 54);
    {
        let mut session = Session::new(config());
        session.open(&mut port).unwrap();
        let reply = session.sync_clock(&timestamp, &CancelToken::new()).unwrap();
        assert_eq!(reply, "RTC set");
        assert_eq!(session.state(), SessionState::PortOpen);

        session.send(&reference_params(), Variant::A).unwrap();
        session.await_ack(&CancelToken::new()).unwrap();
    }
    let written = String::from_utf8(port.written.clone()).unwrap();
    assert_eq!(written, format!("2025-01-07 19:09:54\n{}", REFERENCE_FRAME));
}

#[test]
fn test_sync_clock_without_reply_times_out() {
    let mut session = Session::new(config().with_ack_timeout(Duration::from_millis(30)));
    session.open(ScriptedPort::default()).unwrap();
    let result = session.sync_clock(&Timestamp::new(2025, 1, 7, 19, 9, 54), &CancelToken::new());
    assert!(matches!(result, Err(LinkError::Timeout(_))));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_sync_clock_needs_open_port() {
    let mut session: Session<ScriptedPort> = Session::new(config());
    let result = session.sync_clock(&Timestamp::new(2025, 1, 7, 19, 9, 54), &CancelToken::new());
    assert!(matches!(
        result,
        Err(LinkError::State { operation: "sync_clock", state: SessionState::Idle })
    ));
}
