//! Node lifecycle tests against real loopback sockets:
//! create → connect → disconnect → destroy, observed both from the node and
//! from the remote side of each connection.

use std::time::Duration;

use peerlink_network::{LogLevel, NetworkError, Node, NodeConfig, SeedNode};
use peerlink_nullables::{NullPeer, RecordingLogger};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const WAIT: Duration = Duration::from_secs(5);

/// Hold an ephemeral loopback port. Callers drop the listener only right
/// before the port number is used, so parallel tests cannot be handed it.
fn reserve_port() -> (std::net::TcpListener, u16) {
    let holder = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve bind");
    let port = holder.local_addr().expect("reserved addr").port();
    (holder, port)
}

async fn create_on_reserved(config: impl FnOnce(u16) -> NodeConfig) -> Node {
    let (holder, port) = reserve_port();
    let config = config(port);
    drop(holder);
    Node::create(&config).await.expect("create node")
}

async fn node_with(max_peers: usize) -> (Node, RecordingLogger) {
    let recorder = RecordingLogger::new();
    let logger = recorder.logger();
    let node = create_on_reserved(|port| {
        NodeConfig::new("127.0.0.1", port)
            .with_max_peers(max_peers)
            .with_logger(logger)
    })
    .await;
    (node, recorder)
}

async fn peers(n: usize) -> Vec<NullPeer> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(NullPeer::spawn().await.expect("spawn peer"));
    }
    out
}

// ---------------------------------------------------------------------------
// Construction / destruction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_destroy_releases_listening_socket() {
    let recorder = RecordingLogger::new();
    let logger = recorder.logger();
    let node =
        create_on_reserved(|port| NodeConfig::new("127.0.0.1", port).with_logger(logger)).await;
    let port = node.local_addr().expect("listening").port();
    assert_eq!(node.port(), port);
    assert!(recorder.contains(LogLevel::Info, "Node created successfully"));
    node.destroy();

    std::net::TcpListener::bind(("127.0.0.1", port)).expect("port is free again");
}

#[tokio::test]
async fn destroy_logs_nothing_above_debug() {
    let (mut node, log) = node_with(5).await;
    let remote = NullPeer::spawn().await.expect("spawn peer");
    node.connect_to_peer(&remote.ip(), remote.port()).await.expect("connect");
    log.reset();

    node.destroy();

    for level in [LogLevel::Info, LogLevel::Warn, LogLevel::Error, LogLevel::Fatal] {
        assert_eq!(log.count(level), 0, "destroy logged at {level}");
    }
    assert!(log.contains(LogLevel::Debug, "destroyed"));
    assert!(remote.wait_closed(1, WAIT).await);
}

#[tokio::test]
async fn empty_address_fails_and_binds_nothing() {
    let (holder, port) = reserve_port();
    drop(holder);
    let err = Node::create(&NodeConfig::new("", port)).await.unwrap_err();
    assert!(matches!(err, NetworkError::InvalidConfig(_)));

    std::net::TcpListener::bind(("127.0.0.1", port)).expect("nothing left bound");
}

#[tokio::test]
async fn failed_bind_leaves_nothing_behind() {
    let holder = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = holder.local_addr().unwrap().port();
    let recorder = RecordingLogger::new();

    let err = Node::create(&NodeConfig::new("127.0.0.1", port).with_logger(recorder.logger()))
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Socket { op: "bind", .. }));
    assert_eq!(recorder.count(LogLevel::Error), 1);
    assert!(!recorder.contains(LogLevel::Info, "created"));

    drop(holder);
    std::net::TcpListener::bind(("127.0.0.1", port)).expect("port is free again");
}

#[tokio::test]
async fn destroy_closes_every_peer_connection() {
    let (mut node, _log) = node_with(5).await;
    let remotes = peers(3).await;
    for remote in &remotes {
        node.connect_to_peer(&remote.ip(), remote.port()).await.expect("connect");
    }
    assert_eq!(node.peer_count(), 3);
    for remote in &remotes {
        assert!(remote.wait_accepted(1, WAIT).await);
    }

    node.destroy();

    for remote in &remotes {
        assert!(remote.wait_closed(1, WAIT).await, "peer {} saw no close", remote.addr());
    }
}

#[tokio::test]
async fn dropping_a_node_releases_like_destroy() {
    let remote = NullPeer::spawn().await.expect("spawn peer");
    let port;
    {
        let mut node = create_on_reserved(|port| NodeConfig::new("127.0.0.1", port)).await;
        port = node.port();
        node.connect_to_peer(&remote.ip(), remote.port()).await.expect("connect");
    }
    assert!(remote.wait_closed(1, WAIT).await);
    std::net::TcpListener::bind(("127.0.0.1", port)).expect("port is free again");
}

#[tokio::test]
async fn seeds_are_stored_but_never_dialed() {
    let remote = NullPeer::spawn().await.expect("spawn peer");
    let seed = SeedNode::new(remote.ip(), remote.port());
    let node = create_on_reserved(|port| {
        NodeConfig::new("127.0.0.1", port).with_seeds(vec![seed])
    })
    .await;
    assert_eq!(node.seeds(), &[SeedNode::new(remote.ip(), remote.port())]);
    assert!(!remote.wait_accepted(1, Duration::from_millis(200)).await);
    assert_eq!(node.peer_count(), 0);
}

// ---------------------------------------------------------------------------
// connect_to_peer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_never_exceeds_max_peers() {
    let (mut node, log) = node_with(2).await;
    let remotes = peers(3).await;

    node.connect_to_peer(&remotes[0].ip(), remotes[0].port()).await.unwrap();
    node.connect_to_peer(&remotes[1].ip(), remotes[1].port()).await.unwrap();

    let err = node
        .connect_to_peer(&remotes[2].ip(), remotes[2].port())
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::PeerLimitReached { max: 2 }));
    assert_eq!(node.peer_count(), 2);
    assert!(log.contains(LogLevel::Warn, "Maximum peer limit reached"));
    assert_eq!(log.count(LogLevel::Error), 0);
    assert!(!remotes[2].wait_accepted(1, Duration::from_millis(200)).await);
}

#[tokio::test]
async fn refused_connect_changes_nothing() {
    let (mut node, log) = node_with(5).await;
    let remote = NullPeer::spawn().await.expect("spawn peer");
    node.connect_to_peer(&remote.ip(), remote.port()).await.unwrap();

    let (holder, dead_port) = reserve_port();
    drop(holder);
    let err = node.connect_to_peer("127.0.0.1", dead_port).await.unwrap_err();
    assert!(matches!(err, NetworkError::Socket { op: "connect", .. }));
    assert_eq!(node.peer_count(), 1);
    assert_eq!(log.count(LogLevel::Error), 1);
    assert!(log.contains(LogLevel::Error, "Connection failed"));
}

#[tokio::test]
async fn unparseable_peer_address_changes_nothing() {
    let (mut node, log) = node_with(5).await;

    for bad in ["", "localhost", "256.0.0.1", "::1"] {
        let err = node.connect_to_peer(bad, 9000).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidAddress(_)), "{bad:?}: {err}");
    }
    assert_eq!(node.peer_count(), 0);
    assert_eq!(log.count(LogLevel::Error), 4);
}

#[tokio::test]
async fn unreachable_connect_is_bounded_and_changes_nothing() {
    let recorder = RecordingLogger::new();
    let logger = recorder.logger();
    let mut node = create_on_reserved(|port| {
        let mut config = NodeConfig::new("127.0.0.1", port).with_logger(logger);
        config.connect_timeout_ms = 100;
        config
    })
    .await;

    // TEST-NET-1 is never routed; depending on the host this either times
    // out or fails immediately.
    let result = tokio::time::timeout(WAIT, node.connect_to_peer("192.0.2.1", 9)).await;
    let err = result.expect("connect attempt is bounded").unwrap_err();
    assert!(
        matches!(
            err,
            NetworkError::ConnectTimeout { timeout_ms: 100, .. }
                | NetworkError::Socket { op: "connect", .. }
        ),
        "unexpected error: {err}"
    );
    assert_eq!(node.peer_count(), 0);
}

// ---------------------------------------------------------------------------
// disconnect_from_peer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnecting_unknown_peer_is_silent() {
    let (mut node, log) = node_with(5).await;
    let remote = NullPeer::spawn().await.expect("spawn peer");
    node.connect_to_peer(&remote.ip(), remote.port()).await.unwrap();
    log.reset();

    node.disconnect_from_peer("127.0.0.1", remote.port().wrapping_add(1));
    node.disconnect_from_peer("10.9.9.9", remote.port());
    node.disconnect_from_peer("", 0);

    assert_eq!(node.peer_count(), 1);
    assert!(log.records().is_empty());
}

#[tokio::test]
async fn disconnect_removes_exactly_one_peer() {
    let (mut node, log) = node_with(5).await;
    let remotes = peers(2).await;
    for remote in &remotes {
        node.connect_to_peer(&remote.ip(), remote.port()).await.unwrap();
    }

    node.disconnect_from_peer(&remotes[0].ip(), remotes[0].port());
    assert_eq!(node.peer_count(), 1);
    assert_eq!(node.peer_addrs(), vec![remotes[1].addr()]);
    assert!(remotes[0].wait_closed(1, WAIT).await);
    assert_eq!(remotes[1].closed(), 0);
    assert!(log.contains(LogLevel::Info, "Peer disconnected"));

    node.disconnect_from_peer(&remotes[1].ip(), remotes[1].port());
    assert_eq!(node.peer_count(), 0);
    assert!(remotes[1].wait_closed(1, WAIT).await);
}

// ---------------------------------------------------------------------------
// End-to-end scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_slot_node_scenario() {
    let (mut node, log) = node_with(1).await;
    let [peer_a, peer_b]: [NullPeer; 2] = peers(2).await.try_into().ok().expect("two peers");

    node.connect_to_peer(&peer_a.ip(), peer_a.port()).await.expect("A fits");
    assert_eq!(node.peer_count(), 1);

    let err = node.connect_to_peer(&peer_b.ip(), peer_b.port()).await.unwrap_err();
    assert!(matches!(err, NetworkError::PeerLimitReached { max: 1 }));
    assert_eq!(node.peer_count(), 1);

    node.disconnect_from_peer(&peer_a.ip(), peer_a.port());
    assert_eq!(node.peer_count(), 0);

    node.connect_to_peer(&peer_b.ip(), peer_b.port()).await.expect("B fits now");
    assert_eq!(node.peer_addrs(), vec![peer_b.addr()]);
    assert_eq!(log.count(LogLevel::Warn), 1);
    assert_eq!(log.count(LogLevel::Error), 0);

    node.destroy();
    assert!(peer_b.wait_closed(1, WAIT).await);
}
