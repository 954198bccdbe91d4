//! Eviction scenarios, driven with synthetic timestamps so nothing has to
//! sleep through real timeouts. Packets are injected directly into the
//! engine; replies still travel over real loopback sockets.

use srtla_mux::{MuxConfig, MuxEngine};
use srtla_protocol::{GroupId, SRTLA_ID_LEN, SRT_MIN_LEN};
use std::net::UdpSocket;
use std::time::Duration;

fn test_engine() -> (MuxEngine, UdpSocket) {
    let srt_server = UdpSocket::bind("127.0.0.1:0").unwrap();
    srt_server
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    let cfg = MuxConfig::new(srt_server.local_addr().unwrap());
    let engine = MuxEngine::bind(0, cfg).unwrap();
    (engine, srt_server)
}

fn peer() -> UdpSocket {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    sock
}

fn register_at(engine: &mut MuxEngine, peer: &UdpSocket, now: u64) -> GroupId {
    let src = peer.local_addr().unwrap();

    let mut reg1 = vec![0x92, 0x00];
    reg1.extend_from_slice(&[0x33; SRTLA_ID_LEN]);
    engine.handle_srtla_packet(&reg1, src, now);

    let mut buf = [0u8; 64];
    let n = peer.recv(&mut buf).unwrap();
    let id = GroupId::from_bytes(&buf[2..n]).unwrap();

    attach_at(engine, peer, &id, now);
    id
}

fn attach_at(engine: &mut MuxEngine, peer: &UdpSocket, id: &GroupId, now: u64) {
    let src = peer.local_addr().unwrap();
    let mut reg2 = vec![0x92, 0x01];
    reg2.extend_from_slice(id.as_bytes());
    engine.handle_srtla_packet(&reg2, src, now);

    let mut buf = [0u8; 64];
    let n = peer.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], &[0x92, 0x02]);
}

fn send_data_at(engine: &mut MuxEngine, peer: &UdpSocket, sn: u32, now: u64) {
    let mut buf = vec![0u8; SRT_MIN_LEN];
    buf[0..4].copy_from_slice(&sn.to_be_bytes());
    engine.handle_srtla_packet(&buf, peer.local_addr().unwrap(), now);
}

#[test]
fn test_idle_connection_removed_active_one_kept() {
    let (mut engine, _srt) = test_engine();
    let peer_a = peer();
    let peer_b = peer();

    let id = register_at(&mut engine, &peer_a, 1000);
    attach_at(&mut engine, &peer_b, &id, 1000);

    // A last heard from at 1001, B at 1006.
    send_data_at(&mut engine, &peer_a, 1, 1001);
    send_data_at(&mut engine, &peer_b, 2, 1006);

    // CONN_TIMEOUT (10) has passed for A only.
    let stats = engine.cleanup(1012).unwrap();
    assert_eq!(stats.removed_conns, 1);
    assert_eq!(stats.removed_groups, 0);

    let group = engine.registry().iter().next().unwrap();
    assert_eq!(group.conns().len(), 1);
    assert_eq!(group.conns()[0].addr(), peer_b.local_addr().unwrap());
}

#[test]
fn test_empty_old_group_removed_with_upstream() {
    let (mut engine, _srt) = test_engine();
    let peer_a = peer();

    register_at(&mut engine, &peer_a, 1000);
    send_data_at(&mut engine, &peer_a, 1, 1001);
    assert!(engine.registry().iter().next().unwrap().has_upstream());

    // Both the connection idle time and the group age are past their
    // timeouts; one sweep takes the connection and then the group.
    let stats = engine.cleanup(1020).unwrap();
    assert_eq!(stats.removed_conns, 1);
    assert_eq!(stats.removed_groups, 1);
    assert_eq!(engine.registry().len(), 0);
}

#[test]
fn test_young_empty_group_survives_to_allow_reattach() {
    // A group timeout well past the connection timeout opens a window in
    // which the group is empty but must stay alive.
    let srt_server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let mut cfg = MuxConfig::new(srt_server.local_addr().unwrap());
    cfg.group_timeout = 100;
    let mut engine = MuxEngine::bind(0, cfg).unwrap();

    let peer_a = peer();
    let id = register_at(&mut engine, &peer_a, 2000);

    let stats = engine.cleanup(2011).unwrap();
    assert_eq!(stats.removed_conns, 1);
    assert_eq!(stats.removed_groups, 0);
    assert_eq!(engine.registry().len(), 1);

    // The slow client reattaches to the surviving empty group.
    attach_at(&mut engine, &peer_a, &id, 2012);
    let group = engine.registry().iter().next().unwrap();
    assert_eq!(group.conns().len(), 1);
}

#[test]
fn test_sweep_rate_limiting() {
    let (mut engine, _srt) = test_engine();
    let peer_a = peer();
    register_at(&mut engine, &peer_a, 1000);

    assert!(engine.cleanup(1001).is_some());
    // Within CLEANUP_PERIOD of the last run.
    assert!(engine.cleanup(1002).is_none());
    assert!(engine.cleanup(1003).is_none());
    assert!(engine.cleanup(1004).is_some());
}
