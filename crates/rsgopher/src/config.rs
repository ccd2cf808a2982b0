//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::item::DEFAULT_PORT;

/// Default directory served when none is given.
pub const DEFAULT_ROOT: &str = "/var/gopher";

/// Default name of the per-directory manifest.
pub const DEFAULT_MAP_FILENAME: &str = "gophermap";

/// Default limit on the request line, in bytes.
pub const DEFAULT_MAX_SELECTOR_LEN: usize = 1024;

/// Immutable server configuration.
///
/// Built once at startup and shared read-only by every connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Host name written into generated menu lines.
    pub host: String,
    /// Port written into generated menu lines, and the port listened on.
    pub port: u16,
    /// Directory tree being served.
    pub root: PathBuf,
    /// Name of the manifest looked up in each served directory.
    pub map_filename: String,
    /// Local address to bind.
    pub listen: IpAddr,
    /// Request lines longer than this are truncated.
    pub max_selector_len: usize,
    /// How long a client may take to send its selector. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Socket address the server binds.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "localhost".to_owned(),
            port: DEFAULT_PORT,
            root: PathBuf::from(DEFAULT_ROOT),
            map_filename: DEFAULT_MAP_FILENAME.to_owned(),
            listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_selector_len: DEFAULT_MAX_SELECTOR_LEN,
            request_timeout: None,
        }
    }
}
