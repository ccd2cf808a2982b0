//! Gopher protocol data types and constants.
//!
//! # Protocol
//! RFC 1436, plus the widely deployed unofficial item types (`i`, `h`, `d`,
//! `s`, `;`, `c`).

use std::fs::FileType;
use std::path::Path;

use enum_primitive::*;

use crate::config::Config;
use crate::utils::sanitize_field;

/// Well-known Gopher port
pub const DEFAULT_PORT: u16 = 70;

/// Line terminator mandated by the protocol
pub const CRLF: &str = "\r\n";

/// Last line of every non-empty menu
pub const TERMINATOR: &str = ".\r\n";

/// Separator between the fields of a menu line
pub const FIELD_SEPARATOR: char = '\t';

// Discriminants are the ASCII wire codes.
enum_from_primitive! {
    #[doc = "Item type, the first character of every menu line"]
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum ItemType {
        Text            = 0x30, // '0'
        Directory       = 0x31, // '1'
        NameServer      = 0x32, // '2'
        Error           = 0x33, // '3'
        BinHex          = 0x34, // '4'
        Archive         = 0x35, // '5'
        Search          = 0x37, // '7'
        Binary          = 0x39, // '9'
        Mirror          = 0x2b, // '+'
        Gif             = 0x67, // 'g'
        Image           = 0x49, // 'I'

        // unofficial
        Document        = 0x64, // 'd'
        Html            = 0x68, // 'h'
        Info            = 0x69, // 'i'
        Sound           = 0x73, // 's'
        Video           = 0x3b, // ';'
        Calendar        = 0x63, // 'c'
    }
}

impl ItemType {
    /// Every item type, in wire-code table order.
    pub const ALL: [ItemType; 17] = [
        ItemType::Text,
        ItemType::Directory,
        ItemType::NameServer,
        ItemType::Error,
        ItemType::BinHex,
        ItemType::Archive,
        ItemType::Search,
        ItemType::Binary,
        ItemType::Mirror,
        ItemType::Gif,
        ItemType::Image,
        ItemType::Document,
        ItemType::Html,
        ItemType::Info,
        ItemType::Sound,
        ItemType::Video,
        ItemType::Calendar,
    ];

    /// The single character written at the start of a menu line.
    pub fn wire_code(self) -> char {
        self as u8 as char
    }

    /// Parse a wire code. Unknown codes are rejected.
    pub fn from_wire_code(c: char) -> Option<ItemType> {
        if c.is_ascii() {
            ItemType::from_u8(c as u8)
        } else {
            None
        }
    }

    /// Classify a regular file by the extension of its name.
    ///
    /// Lookup is case-insensitive. Names without an extension, and extensions
    /// missing from the table, are `Binary`.
    pub fn from_extension(name: &Path) -> ItemType {
        let ext = match name.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return ItemType::Binary,
        };

        match ext.as_str() {
            "txt" | "md" | "pl" | "py" | "sh" | "tcl" | "c" | "cpp" | "h" | "log" | "conf"
            | "php" | "php3" | "rs" | "toml" | "csv" | "ini" | "cfg" | "rb" | "js" | "java"
            | "go" => ItemType::Text,
            "hqx" => ItemType::BinHex,
            "zip" | "gz" | "z" | "tgz" | "bz2" | "rar" => ItemType::Archive,
            "ics" | "ical" => ItemType::Calendar,
            "gif" => ItemType::Gif,
            "jpg" | "jpeg" | "png" | "bmp" => ItemType::Image,
            "mp3" | "wav" | "flac" | "ogg" => ItemType::Sound,
            "avi" | "mp4" | "mpg" | "mov" | "qt" => ItemType::Video,
            "pdf" | "ps" | "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" => ItemType::Document,
            "html" | "htm" => ItemType::Html,
            _ => ItemType::Binary,
        }
    }

    /// Classify a filesystem entry. Directories are always `Directory`.
    pub fn classify(path: &Path, typ: &FileType) -> ItemType {
        if typ.is_dir() {
            ItemType::Directory
        } else {
            ItemType::from_extension(path)
        }
    }

    /// Whether the content is served with CRLF line framing.
    pub fn is_text(self) -> bool {
        self == ItemType::Text
    }
}

/// One line of a Gopher menu.
///
/// For informational lines `selector` is empty and `display` carries the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub item_type: ItemType,
    pub display: String,
    pub selector: String,
    pub host: String,
    pub port: u16,
}

impl MenuEntry {
    pub fn new(
        item_type: ItemType,
        display: impl Into<String>,
        selector: impl Into<String>,
        config: &Config,
    ) -> MenuEntry {
        MenuEntry {
            item_type,
            display: display.into(),
            selector: selector.into(),
            host: config.host.clone(),
            port: config.port,
        }
    }

    /// An `i` line pointing at this server.
    pub fn info(text: impl Into<String>, config: &Config) -> MenuEntry {
        MenuEntry::new(ItemType::Info, text, "", config)
    }

    /// The `3` line sent for a selector that cannot be served.
    pub fn not_found(selector: &str, config: &Config) -> MenuEntry {
        let display = format!("'{}' doesn't exist!", sanitize_field(selector));
        MenuEntry::new(ItemType::Error, display, "", config)
    }
}
