use std::fmt;

use tracing::info;

use crate::request::Request;

/// Access-log middleware: one `info` event per request.
pub fn trace(req: &Request) {
    info!(
        method = %req.method(),
        remote = %Peer(req),
        url = req.url(),
        "request"
    );
}

struct Peer<'a>(&'a Request);

impl fmt::Display for Peer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.remote_addr() {
            Some(addr) => write!(f, "{addr}"),
            None => f.write_str("-"),
        }
    }
}
