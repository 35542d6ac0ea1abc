//! Scripted in-memory transport.

use std::{
    collections::VecDeque,
    future::pending,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use feedclient::{
    error::TransportError,
    transport::{Connection, FeedConnection, Transport},
};
use tokio::{
    select,
    sync::{Mutex as AsyncMutex, mpsc},
    time::{Instant, sleep},
};
use tokio_util::sync::CancellationToken;

type Frame = Result<Bytes, TransportError>;

enum Outcome {
    Fail(TransportError),
    Connect(Connection),
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Outcome>,
    dials: Vec<(String, Instant)>,
}

/// Transport returning pre-scripted dial outcomes.
///
/// Outcomes are consumed in the order they were queued. Once the script is
/// exhausted every further dial hangs until the caller abandons it.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Create a transport with an empty script.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `n` dial failures.
    pub fn fail_next(&self, n: usize) -> &Self {
        for _ in 0..n {
            self.fail_with(TransportError::Io("scripted dial failure".into()));
        }
        self
    }

    /// Queue one dial failure with a specific error.
    pub fn fail_with(&self, err: TransportError) -> &Self {
        self.script().outcomes.push_back(Outcome::Fail(err));
        self
    }

    /// Queue a successful dial and return the handle driving its connection.
    #[must_use]
    pub fn connect_next(&self) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(ConnState::default());
        let conn = ScriptedConnection {
            rx: AsyncMutex::new(rx),
            state: Arc::clone(&state),
        };
        self.script()
            .outcomes
            .push_back(Outcome::Connect(Arc::new(conn)));
        ConnectionHandle { tx, state }
    }

    /// Number of dials attempted so far, including hanging ones.
    #[must_use]
    pub fn dial_count(&self) -> usize { self.script().dials.len() }

    /// Instants at which each dial began.
    #[must_use]
    pub fn dial_times(&self) -> Vec<Instant> {
        self.script().dials.iter().map(|(_, at)| *at).collect()
    }

    /// URLs passed to each dial.
    #[must_use]
    pub fn dialled_urls(&self) -> Vec<String> {
        self.script().dials.iter().map(|(url, _)| url.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dial(&self, url: &str, _timeout: Duration) -> Result<Connection, TransportError> {
        let next = {
            let mut script = self.script();
            script.dials.push((url.to_owned(), Instant::now()));
            script.outcomes.pop_front()
        };
        match next {
            Some(Outcome::Connect(conn)) => Ok(conn),
            Some(Outcome::Fail(err)) => Err(err),
            None => pending().await,
        }
    }
}

#[derive(Default)]
struct ConnState {
    closed: CancellationToken,
    close_calls: AtomicUsize,
}

struct ScriptedConnection {
    rx: AsyncMutex<mpsc::UnboundedReceiver<Frame>>,
    state: Arc<ConnState>,
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn read_frame(&self, idle_timeout: Duration) -> Result<Bytes, TransportError> {
        let closed = &self.state.closed;
        let mut rx = select! {
            biased;

            () = closed.cancelled() => return Err(TransportError::Closed),
            rx = self.rx.lock() => rx,
        };
        let deadline = async {
            if idle_timeout.is_zero() {
                pending::<()>().await;
            }
            sleep(idle_timeout).await;
        };
        select! {
            biased;

            () = closed.cancelled() => Err(TransportError::Closed),
            frame = rx.recv() => frame.unwrap_or(Err(TransportError::Closed)),
            () = deadline => Err(TransportError::IdleTimeout(idle_timeout)),
        }
    }

    fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.cancel();
    }
}

/// Test-side handle to a scripted connection.
///
/// Dropping the handle ends the stream: pending and later reads fail with
/// [`TransportError::Closed`].
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Frame>,
    state: Arc<ConnState>,
}

impl ConnectionHandle {
    /// Deliver a raw frame to the client.
    pub fn send(&self, frame: Bytes) {
        // The client may already have dropped the connection.
        let _ = self.tx.send(Ok(frame));
    }

    /// Deliver an empty keep-alive frame.
    pub fn ping(&self) { self.send(Bytes::new()); }

    /// Make the next read fail with `err`.
    pub fn fail(&self, err: TransportError) { let _ = self.tx.send(Err(err)); }

    /// Number of times the client called `close`.
    #[must_use]
    pub fn close_count(&self) -> usize { self.state.close_calls.load(Ordering::SeqCst) }

    /// Whether the client has closed the connection.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.state.closed.is_cancelled() }

    /// Wait until the client closes the connection.
    pub async fn wait_closed(&self) { self.state.closed.cancelled().await; }
}
