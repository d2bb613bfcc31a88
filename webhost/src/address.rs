//! Listen address resolution.
//!
//! The listen address is derived from the configured `(host, port)` pair:
//!
//! | host        | port  | result                  |
//! |-------------|-------|-------------------------|
//! | empty       | > 0   | `127.0.0.1:<port>`      |
//! | empty       | <= 0  | none, no listener       |
//! | non-empty   | <= 0  | `<host>` verbatim       |
//! | non-empty   | > 0   | `<host>:<port>`         |

/// Host used when only a port is configured.
pub const LOOPBACK: &str = "127.0.0.1";

/// Resolves the address a listener should bind to.
///
/// Returns `None` when neither host nor port is usable, in which case no
/// listener is started.
#[must_use]
pub fn resolve_address(host: &str, port: i64) -> Option<String> {
    match (host.is_empty(), port > 0) {
        (true, true) => Some(format!("{LOOPBACK}:{port}")),
        (true, false) => None,
        (false, false) => Some(host.to_owned()),
        (false, true) => Some(format!("{host}:{port}")),
    }
}
