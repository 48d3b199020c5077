//! Nullable remote peer — a loopback listener that accepts and watches.

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A remote peer on `127.0.0.1` that accepts every connection and counts
/// how many of them the other side has closed.
///
/// Incoming bytes are discarded; a read of zero bytes or a reset counts as
/// a close event.
pub struct NullPeer {
    addr: SocketAddrV4,
    accepted: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    changed: Arc<Notify>,
    task: JoinHandle<()>,
}

impl NullPeer {
    /// Bind an ephemeral loopback port and start accepting.
    pub async fn spawn() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = match listener.local_addr()? {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(addr) => {
                return Err(std::io::Error::other(format!("unexpected IPv6 bind {addr}")))
            }
        };

        let accepted = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let changed = Arc::new(Notify::new());

        let task = tokio::spawn({
            let accepted = Arc::clone(&accepted);
            let closed = Arc::clone(&closed);
            let changed = Arc::clone(&changed);
            async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    changed.notify_waiters();
                    let closed = Arc::clone(&closed);
                    let changed = Arc::clone(&changed);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        loop {
                            match stream.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => continue,
                            }
                        }
                        closed.fetch_add(1, Ordering::SeqCst);
                        changed.notify_waiters();
                    });
                }
            }
        });

        Ok(Self {
            addr,
            accepted,
            closed,
            changed,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Textual IPv4 address, as passed to `connect_to_peer`.
    pub fn ip(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` connections have been closed by the other
    /// side. Returns `false` if `timeout` elapses first.
    pub async fn wait_closed(&self, n: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, || self.closed() >= n).await
    }

    /// Wait until at least `n` connections have been accepted.
    pub async fn wait_accepted(&self, n: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, || self.accepted() >= n).await
    }

    async fn wait_until(&self, timeout: Duration, done: impl Fn() -> bool) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.changed.notified();
                if done() {
                    return;
                }
                // Short poll as a fallback for a notification racing the check.
                let _ = tokio::time::timeout(Duration::from_millis(20), notified).await;
            }
        })
        .await
        .is_ok()
    }
}

impl Drop for NullPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn counts_accept_and_close() {
        let peer = NullPeer::spawn().await.expect("spawn");
        let stream = TcpStream::connect(SocketAddr::V4(peer.addr()))
            .await
            .expect("connect");
        assert!(peer.wait_accepted(1, Duration::from_secs(2)).await);
        assert_eq!(peer.closed(), 0);

        drop(stream);
        assert!(peer.wait_closed(1, Duration::from_secs(2)).await);
    }
}
