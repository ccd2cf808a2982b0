#![forbid(unsafe_code)]
//! Asynchronous Gopher server library for Rust.
//!
//! This crate provides a tokio-based implementation of the Gopher protocol
//! (RFC 1436): turning an untrusted selector into a file under a served root,
//! rendering directories as menus (generated, or read from a gophermap), and
//! framing file contents on the wire.
//!
//! # Overview
//!
//! A client connects, sends one selector line, and reads until the server
//! closes the connection. The response is one of:
//!
//! - a **menu**: CRLF-terminated lines `<type><display>\t<selector>\t<host>\t<port>`
//!   closed by a line holding a single `.` (an empty menu is a bare CRLF);
//! - a **text file**: every line re-terminated with CRLF;
//! - any **other file**: the raw bytes;
//! - an **error**: a single type `3` line, without terminator.
//!
//! # Getting Started
//!
//! ```no_run
//! use rsgopher::{Config, GopherFs, srv::srv_async};
//!
//! #[tokio::main]
//! async fn main() -> rsgopher::Result<()> {
//!     let config = Config {
//!         host: "gopher.example.org".to_owned(),
//!         root: "/srv/gopher".into(),
//!         ..Config::default()
//!     };
//!     let addr = config.listen_addr();
//!     srv_async(GopherFs::new(config)?, addr).await
//! }
//! ```
//!
//! To serve something other than a directory tree, implement
//! [`srv::Handler`] and pass it to [`srv::srv_async`].
//!
//! # Path safety
//!
//! Selectors are joined onto the root and canonicalized, and the canonical
//! path must still lie under the canonical root. `..` sequences and symlinks
//! that lead outside the root are answered with the not-found line, exactly
//! like missing or unreadable paths.
//!
//! # Gophermaps
//!
//! A directory containing a readable file named [`Config::map_filename`]
//! (`gophermap` by default) is rendered from that file instead of from its
//! contents. See [`gophermap`] for the format.
pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod gophermap;
pub mod item;
pub mod menu;
pub mod selector;
pub mod serialize;
pub mod srv;
#[macro_use]
pub mod utils;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::error::errno;
pub use crate::fs::GopherFs;
pub use crate::item::*;
pub use crate::menu::Menu;
pub use crate::utils::Result;
