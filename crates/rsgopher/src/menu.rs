//! Gopher menus and the generated directory listing.

use std::path::Path;

use log::{debug, warn};
use nix::unistd::{AccessFlags, access};
use tokio::fs;
use tokio_stream::{StreamExt, wrappers::ReadDirStream};

use crate::{
    config::Config,
    gophermap,
    item::{ItemType, MenuEntry},
    selector,
    utils::Result,
};

/// An ordered list of menu lines. Order is presentation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new() -> Menu {
        Menu::default()
    }

    pub fn push(&mut self, entry: MenuEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MenuEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<MenuEntry>> for Menu {
    fn from(entries: Vec<MenuEntry>) -> Menu {
        Menu { entries }
    }
}

impl<'a> IntoIterator for &'a Menu {
    type Item = &'a MenuEntry;
    type IntoIter = std::slice::Iter<'a, MenuEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build the menu for `dir`, a canonical directory inside `root`.
///
/// A readable gophermap wins; otherwise the directory contents are listed.
pub async fn build(root: &Path, dir: &Path, config: &Config) -> Menu {
    let map_path = dir.join(&config.map_filename);

    if is_readable_file(&map_path).await {
        match gophermap::parse(&map_path, config).await {
            Ok(menu) => return menu,
            Err(e) => warn!("Unable to read {:?}, listing directory instead: {}", map_path, e),
        }
    }

    list(root, dir, config).await.unwrap_or_else(|e| {
        warn!("Unable to list {:?}: {}", dir, e);
        Menu::new()
    })
}

async fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(attr) => attr.is_file() && access(path, AccessFlags::R_OK).is_ok(),
        Err(_) => false,
    }
}

/// Generate a menu from the entries of `dir`, sorted by name.
///
/// Unreadable entries, entries that are neither files nor directories, and
/// symlinks leading out of `root` are left out. Subdirectories are listed,
/// not descended into.
pub async fn list(root: &Path, dir: &Path, config: &Config) -> Result<Menu> {
    let mut entries = ReadDirStream::new(fs::read_dir(dir).await?);
    let mut listed = Vec::new();

    while let Some(entry) = entries.next().await {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(['\t', '\r', '\n']) {
            debug!("skipping {:?}: name would break the menu line", path);
            continue;
        }

        let target = match fs::canonicalize(&path).await {
            Ok(target) if selector::is_contained(root, &target) => target,
            _ => {
                debug!("skipping {:?}: outside the root or dangling", path);
                continue;
            }
        };

        let attr = match fs::metadata(&target).await {
            Ok(attr) if attr.is_file() || attr.is_dir() => attr,
            _ => continue,
        };

        if access(&target, AccessFlags::R_OK).is_err() {
            debug!("skipping {:?}: not readable", path);
            continue;
        }

        let selector = match selector::to_selector(root, &dir.join(&name)) {
            Some(selector) => selector,
            None => continue,
        };

        let item_type = ItemType::classify(&path, &attr.file_type());
        listed.push(MenuEntry::new(item_type, name, selector, config));
    }

    listed.sort_by(|a, b| a.display.cmp(&b.display));
    Ok(Menu::from(listed))
}
