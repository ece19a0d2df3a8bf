//! Channel session lifecycle and exchanges

mod common;

use common::{params, MockDevice, MockOpener, Op, Reply};
use gcodelink_communication::{Acknowledgment, ChannelSession, ConnectionParams};
use gcodelink_core::{
    event_bus, thread_safe_vec, AppEvent, ConnectionError, ConnectionEvent, ControllerError,
    EventCategory, EventFilter,
};
use std::sync::{mpsc, Arc};
use std::time::Duration;

#[test]
fn test_open_and_transact() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(device.opener());

    session.open(params()).expect("open");
    assert!(session.is_open());
    assert_eq!(session.endpoint().as_deref(), Some("/dev/ttyMOCK0"));
    assert_eq!(session.params().map(|p| p.baud_rate), Some(115_200));

    let ack = session.transact("M105").expect("exchange");
    assert_eq!(ack, Acknowledgment::Response("ok".to_string()));
    assert_eq!(device.written(), vec!["M105"]);
}

#[test]
fn test_close_is_idempotent() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(device.opener());

    session.close();
    session.open(params()).expect("open");
    session.close();
    session.close();

    assert!(!session.is_open());
    assert_eq!(session.endpoint(), None);
    assert_eq!(device.drops(), 1);
}

#[test]
fn test_reopen_closes_previous_link() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(device.opener());

    session.open(params()).expect("open");
    session.open(params().with_baud_rate(9600)).expect("reopen");

    assert_eq!(device.opens(), 2);
    assert_eq!(device.drops(), 1);
    assert_eq!(session.params().map(|p| p.baud_rate), Some(9600));
}

#[test]
fn test_open_failure_leaves_session_closed() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(MockOpener::failing(
        &device,
        ConnectionError::PortNotFound {
            port: "/dev/ttyMOCK0".to_string(),
        },
    ));

    let err = session.open(params()).expect_err("absent port");
    assert!(matches!(err, ConnectionError::PortNotFound { .. }));
    assert!(!session.is_open());
}

#[test]
fn test_invalid_parameters_never_reach_the_opener() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(device.opener());

    let err = session
        .open(params().with_baud_rate(0))
        .expect_err("bad baud");
    assert_eq!(err, ConnectionError::UnsupportedBaudRate { baud: 0 });
    assert_eq!(device.opens(), 0);
}

#[test]
fn test_transact_on_closed_session() {
    let device = MockDevice::new();
    let session = ChannelSession::with_opener(device.opener());
    assert_eq!(session.transact("G28"), Err(ControllerError::NotConnected));
    assert!(device.written().is_empty());
}

#[test]
fn test_silent_device_gives_no_response() {
    let device = MockDevice::new();
    device.configure(|d| d.reply = Reply::Silent);
    let session = ChannelSession::with_opener(device.opener());
    session.open(params()).expect("open");

    assert_eq!(session.transact("G4 P0"), Ok(Acknowledgment::NoResponse));
    assert!(session.is_open());
}

#[test]
fn test_response_split_across_reads() {
    let device = MockDevice::new();
    device.configure(|d| {
        d.reply = Reply::Echo;
        d.one_byte_reads = true;
    });
    let session = ChannelSession::with_opener(device.opener());
    session.open(params()).expect("open");

    let ack = session.transact("G1 X10").expect("exchange");
    assert_eq!(ack.text(), Some("ok G1 X10"));
}

#[test]
fn test_read_failure_closes_session() {
    let device = MockDevice::new();
    device.configure(|d| d.fail_read = true);
    let session = ChannelSession::with_opener(device.opener());
    session.open(params()).expect("open");

    let err = session.transact("M105").expect_err("read fails");
    assert!(matches!(err, ControllerError::ConnectionLost { .. }));
    assert!(!session.is_open());
    assert_eq!(device.drops(), 1);
}

#[test]
fn test_write_failure_is_transmit_error() {
    let device = MockDevice::new();
    device.configure(|d| d.fail_write_at = Some(0));
    let session = ChannelSession::with_opener(device.opener());
    session.open(params()).expect("open");

    match session.transact("M105") {
        Err(ControllerError::Transmit { command, .. }) => assert_eq!(command, "M105"),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(!session.is_open());
}

#[test]
fn test_concurrent_exchanges_do_not_interleave() {
    let device = MockDevice::new();
    device.configure(|d| d.reply = Reply::Echo);
    let session = Arc::new(ChannelSession::with_opener(device.opener()));
    session.open(params()).expect("open");

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let command = format!("M117 w{} n{}", worker, i);
                    let ack = session.transact(&command).expect("exchange");
                    assert_eq!(ack.text(), Some(format!("ok {}", command).as_str()));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let log = device.log();
    assert_eq!(log.len(), 200);
    for pair in log.chunks(2) {
        match pair {
            [Op::Write(sent), Op::Read(reply)] => assert_eq!(reply, &format!("ok {}", sent)),
            other => panic!("interleaved exchange: {:?}", other),
        }
    }
}

#[test]
fn test_event_handlers_may_query_the_session() {
    const PORT: &str = "/dev/ttyREENTRANT";

    let device = MockDevice::new();
    device.configure(|d| d.fail_read = true);
    let session = Arc::new(ChannelSession::with_opener(device.opener()));
    let seen = thread_safe_vec();

    let observed = Arc::clone(&session);
    let log = seen.clone();
    let id = event_bus().subscribe(EventFilter::only(EventCategory::Connection), move |event| {
        if let AppEvent::Connection(
            ConnectionEvent::Connected { port, .. } | ConnectionEvent::Disconnected { port, .. },
        ) = event
        {
            if port == PORT {
                log.lock().push(observed.is_open());
            }
        }
    });

    let (done_tx, done_rx) = mpsc::channel();
    let worker = Arc::clone(&session);
    std::thread::spawn(move || {
        let opened = worker.open(ConnectionParams::new(PORT).with_timeout_ms(50));
        let exchanged = worker.transact("M105");
        done_tx.send((opened, exchanged)).ok();
    });

    let outcome = done_rx.recv_timeout(Duration::from_secs(3));
    event_bus().unsubscribe(id);
    let (opened, exchanged) = outcome.expect("session blocked inside an event handler");

    assert_eq!(opened, Ok(()));
    assert!(matches!(exchanged, Err(ControllerError::ConnectionLost { .. })));
    assert_eq!(*seen.lock(), vec![true, false]);
}
