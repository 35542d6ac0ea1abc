//! Lock-guarded connection handle and shutdown flag.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{metrics, transport::Connection};

#[derive(Default)]
struct SlotState {
    conn: Option<Connection>,
    shutting_down: bool,
}

/// Holds at most one live connection together with the shutdown flag.
///
/// Both fields sit behind one mutex. The lock is only held to read or swap
/// the fields, never across a network call. Every connection leaving the slot
/// is closed exactly once by the operation that removed it.
#[derive(Default)]
pub(crate) struct ConnectionSlot {
    state: Mutex<SlotState>,
}

impl ConnectionSlot {
    // The guarded fields are always written together, so a poisoned lock
    // still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current connection, if any.
    pub(crate) fn connection(&self) -> Option<Connection> { self.lock().conn.clone() }

    /// Whether shutdown has begun.
    pub(crate) fn is_shutting_down(&self) -> bool { self.lock().shutting_down }

    /// Install a freshly dialled connection.
    ///
    /// Returns `false` and closes `conn` if shutdown has already begun, so a
    /// dial that raced with shutdown never leaks its socket. A previously
    /// installed connection is replaced and closed.
    pub(crate) fn install(&self, conn: Connection) -> bool {
        let previous = {
            let mut state = self.lock();
            if state.shutting_down {
                drop(state);
                conn.close();
                return false;
            }
            state.conn.replace(conn)
        };
        metrics::inc_connections();
        if let Some(previous) = previous {
            close_connection(&previous);
        }
        true
    }

    /// Remove and close `conn` if it is still the installed connection.
    ///
    /// A connection already replaced or taken by shutdown is left alone.
    pub(crate) fn discard(&self, conn: &Connection) {
        let removed = {
            let mut state = self.lock();
            match &state.conn {
                Some(current) if Arc::ptr_eq(current, conn) => state.conn.take(),
                _ => None,
            }
        };
        if let Some(removed) = removed {
            close_connection(&removed);
        }
    }

    /// Set the shutdown flag and close the held connection, if any.
    ///
    /// The flag never resets. Calling this again finds no connection and does
    /// nothing further.
    pub(crate) fn shut_down(&self) {
        let conn = {
            let mut state = self.lock();
            state.shutting_down = true;
            state.conn.take()
        };
        if let Some(conn) = conn {
            close_connection(&conn);
        }
    }
}

fn close_connection(conn: &Connection) {
    conn.close();
    metrics::dec_connections();
}
