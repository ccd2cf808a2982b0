//! Gophermap parsing.
//!
//! A gophermap is an optional per-directory file that replaces the generated
//! listing with explicit, ordered entries:
//!
//! ```text
//! # comment, never rendered
//! Plain text without a TAB becomes an info line
//! 0About this server	/about.txt	gopher.example.org	70
//! 1Documents	/docs
//! ```
//!
//! Parsing is tolerant: a directive that cannot be understood is dropped with a
//! warning and the following lines are still parsed.

use std::fmt;
use std::path::Path;

use log::warn;
use tokio::{
    fs,
    io::{AsyncBufReadExt, BufReader},
};

use crate::{
    config::Config,
    item::{FIELD_SEPARATOR, ItemType, MenuEntry},
    menu::Menu,
    utils::Result,
};

/// Why a gophermap line was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidLine {
    /// The directive starts with a TAB, so there is no type character.
    MissingType,
    /// The first character is not a known item type.
    UnknownType(char),
    /// The port field is not a number between 0 and 65535.
    BadPort(String),
}

impl fmt::Display for InvalidLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InvalidLine::MissingType => write!(f, "missing item type"),
            InvalidLine::UnknownType(c) => write!(f, "unknown item type {:?}", c),
            InvalidLine::BadPort(ref port) => write!(f, "invalid port {:?}", port),
        }
    }
}

impl std::error::Error for InvalidLine {}

/// Strip the line ending and trailing blanks, keeping TABs so that empty
/// trailing fields survive.
fn trim_line(line: &str) -> &str {
    line.trim_end_matches(|c: char| c.is_whitespace() && c != FIELD_SEPARATOR)
}

/// Parse a single gophermap line.
///
/// Returns `Ok(None)` for comments. Lines without a TAB become info lines.
/// Directive lines are `<type><display>\t<selector>\t<host>\t<port>`; missing
/// or empty host and port fields fall back to `config`, a missing selector is
/// empty, and fields past the fourth are ignored.
pub fn parse_line(
    line: &str,
    config: &Config,
) -> std::result::Result<Option<MenuEntry>, InvalidLine> {
    let line = trim_line(line);

    if line.starts_with('#') {
        return Ok(None);
    }

    if !line.contains(FIELD_SEPARATOR) {
        return Ok(Some(MenuEntry::info(line, config)));
    }

    let mut fields = line.split(FIELD_SEPARATOR);
    let type_and_name = fields.next().unwrap_or_default();
    let selector = fields.next().unwrap_or_default();
    let host = fields.next().filter(|h| !h.is_empty());
    let port = fields.next().filter(|p| !p.is_empty());

    let mut chars = type_and_name.chars();
    let code = chars.next().ok_or(InvalidLine::MissingType)?;
    let item_type = ItemType::from_wire_code(code).ok_or(InvalidLine::UnknownType(code))?;

    let port = match port {
        Some(p) => p
            .trim()
            .parse::<u16>()
            .map_err(|_| InvalidLine::BadPort(p.to_owned()))?,
        None => config.port,
    };

    Ok(Some(MenuEntry {
        item_type,
        display: chars.as_str().to_owned(),
        selector: selector.to_owned(),
        host: host.map_or_else(|| config.host.clone(), str::to_owned),
        port,
    }))
}

/// Parse gophermap text, keeping file order and dropping invalid lines.
pub fn parse_str(text: &str, config: &Config) -> Menu {
    let mut menu = Menu::new();
    for (lineno, line) in text.lines().enumerate() {
        push_line(&mut menu, lineno + 1, line, config);
    }
    menu
}

/// Read and parse the gophermap at `path`.
///
/// Fails only if the file cannot be opened or read; malformed lines are
/// logged and skipped.
pub async fn parse(path: &Path, config: &Config) -> Result<Menu> {
    let file = fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut menu = Menu::new();
    let mut lineno = 0;

    while let Some(line) = lines.next_line().await? {
        lineno += 1;
        push_line(&mut menu, lineno, &line, config);
    }

    Ok(menu)
}

fn push_line(menu: &mut Menu, lineno: usize, line: &str, config: &Config) {
    match parse_line(line, config) {
        Ok(Some(entry)) => menu.push(entry),
        Ok(None) => {}
        Err(e) => warn!("Invalid line {} in gophermap: {}: {:?}", lineno, e, line),
    }
}
