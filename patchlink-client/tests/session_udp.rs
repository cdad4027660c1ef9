//! Session integration tests against a scripted fake peer

mod common;

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use common::{MockEngine, MockHistory, MockShots};
use patchlink_client::{AutoDeploy, RemoteContext, RemoteSession, TransportMode};
use patchlink_protocol::{codec, PatchSnapshot, WireMessage, DESCRIPTION_FILE};

const SETTLE: Duration = Duration::from_millis(50);

/// A scripted remote endpoint on loopback
struct FakePeer {
    socket: UdpSocket,
    addr: SocketAddr,
}

impl FakePeer {
    fn spawn() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = socket.local_addr().unwrap();
        Self { socket, addr }
    }

    fn url(&self) -> String {
        format!("udp://127.0.0.1:{}", self.addr.port())
    }

    fn recv(&self) -> Option<(WireMessage, SocketAddr)> {
        let mut buf = [0u8; 65_507];
        let (len, src) = self.socket.recv_from(&mut buf).ok()?;
        codec::decode_datagram(&buf[..len]).map(|m| (m, src))
    }

    fn send(&self, msg: &WireMessage, to: SocketAddr) {
        self.socket.send_to(&codec::encode_datagram(msg), to).unwrap();
    }

    /// Answer one hello with the canonical reply pair
    fn answer_hello(&self, features: &str) -> SocketAddr {
        let (msg, src) = self.recv().expect("expected hello");
        assert_eq!(msg, WireMessage::Hello);
        self.send(
            &WireMessage::Resp {
                kind: "features".into(),
                payload: features.into(),
            },
            src,
        );
        self.send(
            &WireMessage::Resp {
                kind: "hello".into(),
                payload: "ok".into(),
            },
            src,
        );
        src
    }
}

#[test]
fn test_polled_handshake() {
    let peer = FakePeer::spawn();

    let mut ctx = RemoteContext::new();
    let session = ctx.connect(&peer.url(), TransportMode::Polled).unwrap();
    assert!(!session.connected());

    peer.answer_hello(":screenshot:");
    std::thread::sleep(SETTLE);
    session.poll();

    assert!(session.connected());
    assert!(session.peer_supports_screenshot());
    assert!(session.is_first_contact());
}

#[test]
fn test_polled_handshake_without_screenshot() {
    let peer = FakePeer::spawn();

    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    peer.answer_hello("");
    std::thread::sleep(SETTLE);
    session.poll();

    assert!(session.connected());
    assert!(!session.peer_supports_screenshot());
}

#[test]
fn test_background_handshake_and_disconnect() {
    let peer = FakePeer::spawn();

    let mut ctx = RemoteContext::new();
    ctx.connect(&peer.url(), TransportMode::Background).unwrap();
    peer.answer_hello(":screenshot:");

    // The background thread applies the replies on its own.
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if ctx.session().unwrap().connected() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(ctx.session().unwrap().connected());
    assert!(ctx.session().unwrap().peer_supports_screenshot());

    // Must join the receive thread before returning.
    ctx.disconnect();
    assert!(ctx.session().is_none());
}

#[test]
fn test_malformed_replies_are_ignored() {
    let peer = FakePeer::spawn();

    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    let (_, src) = peer.recv().expect("expected hello");

    // Garbage, a wrong-signature /resp, and a message clients never accept.
    peer.socket.send_to(b"\xde\xad\xbe\xef", src).unwrap();
    let mut wrong_sig = Vec::new();
    wrong_sig.extend_from_slice(b"/resp\0\0\0");
    wrong_sig.extend_from_slice(b",s\0\0");
    wrong_sig.extend_from_slice(b"ok\0\0");
    peer.socket.send_to(&wrong_sig, src).unwrap();
    peer.send(
        &WireMessage::Param {
            module_id: 1,
            param_id: 2,
            value: 3.0,
        },
        src,
    );

    std::thread::sleep(SETTLE);
    session.poll();

    assert!(!session.connected());
    assert!(!session.peer_supports_screenshot());
}

#[test]
fn test_deploy_sends_archive_snapshot() {
    let peer = FakePeer::spawn();
    let description = r#"{"modules":[{"id":1,"params":[0.25,0.75]}]}"#;
    let mut engine = MockEngine::with_description(description);

    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    peer.answer_hello("");
    std::thread::sleep(SETTLE);
    session.poll();
    assert!(session.connected());

    session.deploy(&mut engine).unwrap();
    assert!(!session.is_first_contact());
    assert_eq!(engine.prepare_calls, 1);

    let (msg, _) = peer.recv().expect("expected load");
    let WireMessage::Load { blob } = msg else {
        panic!("expected /load, got {:?}", msg);
    };

    // The networked transport carries the archive form; unpacking it must
    // reproduce the description the engine saved.
    let snapshot = PatchSnapshot::from_bytes(blob);
    assert!(snapshot.is_archive());
    let unpacked = tempfile::tempdir().unwrap();
    snapshot.unpack_into(unpacked.path()).unwrap();
    assert_eq!(
        std::fs::read_to_string(unpacked.path().join(DESCRIPTION_FILE)).unwrap(),
        description
    );
}

#[test]
fn test_param_and_host_param_pushes() {
    let peer = FakePeer::spawn();
    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    let _ = peer.recv(); // hello

    session.send_param_change(42, 3, 0.5).unwrap();
    session.send_host_param(1, 0.9).unwrap();

    let (msg, _) = peer.recv().unwrap();
    assert_eq!(
        msg,
        WireMessage::Param {
            module_id: 42,
            param_id: 3,
            value: 0.5
        }
    );
    let (msg, _) = peer.recv().unwrap();
    assert_eq!(
        msg,
        WireMessage::HostParam {
            param_id: 1,
            value: 0.9
        }
    );
}

#[test]
fn test_autodeploy_process_deploys_and_screenshots() {
    let peer = FakePeer::spawn();
    let mut engine = MockEngine::with_description(r#"{"modules":[]}"#);
    let mut history = MockHistory {
        index: 10,
        action: Some("add module".into()),
    };
    let mut shots = MockShots { captures: 0 };

    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    session.set_auto_deploy(true);
    peer.answer_hello(":screenshot:");
    std::thread::sleep(SETTLE);

    let mut detector = AutoDeploy::new();

    // Frame 1 primes on the pre-existing history; nothing deploys.
    detector.process(&mut session, &mut engine, &history, &mut shots, 0.0);
    assert!(session.connected());

    // An edit, then frames until the debounce window elapses.
    history.index = 11;
    detector.process(&mut session, &mut engine, &history, &mut shots, 0.5);
    detector.process(&mut session, &mut engine, &history, &mut shots, 0.9);
    detector.process(&mut session, &mut engine, &history, &mut shots, 1.6);

    let (msg, _) = peer.recv().expect("expected load");
    assert!(matches!(msg, WireMessage::Load { .. }));
    let (msg, _) = peer.recv().expect("expected screenshot");
    assert_eq!(
        msg,
        WireMessage::Screenshot {
            image: b"\x89PNG-test".to_vec()
        }
    );
    assert_eq!(shots.captures, 1);

    // Quiet frames afterwards deploy nothing further.
    detector.process(&mut session, &mut engine, &history, &mut shots, 3.0);
    peer.socket
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(peer.recv().is_none());
}

#[test]
fn test_autodeploy_disabled_session_stays_quiet() {
    let peer = FakePeer::spawn();
    let mut engine = MockEngine::with_description("{}");
    let mut history = MockHistory {
        index: 0,
        action: Some("add module".into()),
    };
    let mut shots = MockShots { captures: 0 };

    let mut session = RemoteSession::connect(&peer.url(), TransportMode::Polled).unwrap();
    peer.answer_hello("");
    std::thread::sleep(SETTLE);

    let mut detector = AutoDeploy::new();
    detector.process(&mut session, &mut engine, &history, &mut shots, 0.0);
    history.index = 1;
    detector.process(&mut session, &mut engine, &history, &mut shots, 0.5);
    detector.process(&mut session, &mut engine, &history, &mut shots, 2.0);

    peer.socket
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(peer.recv().is_none());
    assert_eq!(shots.captures, 0);
}
