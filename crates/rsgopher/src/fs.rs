//! A [`Handler`] publishing a directory tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use nix::unistd::{AccessFlags, access};
use tokio::fs;

use crate::{
    config::Config,
    io_err,
    item::{ItemType, MenuEntry},
    menu, res, selector,
    srv::{Handler, Response},
    utils::Result,
};

/// What a selector points at, after the containment and access checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Directory(PathBuf),
    File(PathBuf),
    /// Outside the root, missing, unreadable, or not a file or directory.
    Missing,
}

/// Serves the files and directories under `Config::root`.
#[derive(Clone, Debug)]
pub struct GopherFs {
    config: Arc<Config>,
}

impl GopherFs {
    /// Canonicalize the configured root and check it is a directory.
    pub fn new(mut config: Config) -> Result<GopherFs> {
        let root = std::fs::canonicalize(&config.root)?;
        if !std::fs::metadata(&root)?.is_dir() {
            return res!(io_err!(InvalidInput, "root must be a directory"));
        }
        config.root = root;

        Ok(GopherFs {
            config: Arc::new(config),
        })
    }

    /// The canonical root.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Resolve a selector and decide whether it can be served.
    pub async fn target(&self, selector: &str) -> Target {
        let path = match selector::resolve_contained(self.root(), selector).await {
            Some(path) => path,
            None => return Target::Missing,
        };

        let attr = match fs::metadata(&path).await {
            Ok(attr) => attr,
            Err(e) => {
                debug!("{:?}: {}", path, e);
                return Target::Missing;
            }
        };

        if let Err(e) = access(&path, AccessFlags::R_OK) {
            debug!("{:?}: {}", path, e.desc());
            return Target::Missing;
        }

        if attr.is_dir() {
            Target::Directory(path)
        } else if attr.is_file() {
            Target::File(path)
        } else {
            Target::Missing
        }
    }

    fn not_found(&self, selector: &str) -> Response {
        warn!("Requested selector not found: {:?}", selector);
        Response::Error(MenuEntry::not_found(selector, &self.config))
    }
}

#[async_trait]
impl Handler for GopherFs {
    fn config(&self) -> &Config {
        &self.config
    }

    async fn handle(&self, selector: &str) -> Result<Response> {
        match self.target(selector).await {
            Target::Directory(dir) => Ok(Response::Menu(
                menu::build(self.root(), &dir, &self.config).await,
            )),
            Target::File(path) => {
                let file = match fs::File::open(&path).await {
                    Ok(file) => file,
                    Err(e) => {
                        debug!("{:?}: {}", path, e);
                        return Ok(self.not_found(selector));
                    }
                };

                // Classified by the requested name, as in the listing.
                let requested = Path::new(selector::relative(selector));
                if ItemType::from_extension(requested).is_text() {
                    Ok(Response::Text(file))
                } else {
                    Ok(Response::Binary(file))
                }
            }
            Target::Missing => Ok(self.not_found(selector)),
        }
    }
}
