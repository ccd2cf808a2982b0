//! Serialize menus into their wire representation.
//!
//! A menu is a sequence of CRLF-terminated lines of four TAB-separated fields,
//! `<type><display>\t<selector>\t<host>\t<port>`, closed by a line holding a
//! single `.`. An empty menu is sent as a bare CRLF.

use std::io::{Result, Write};

use crate::item::{CRLF, FIELD_SEPARATOR, MenuEntry, TERMINATOR};
use crate::menu::Menu;

/// Trait representing a type which can be serialized onto the wire
pub trait Encodable {
    /// Encode self to w and returns the number of bytes encoded
    fn encode<W: Write>(&self, w: &mut W) -> Result<usize>;
}

impl Encodable for MenuEntry {
    /// Encodes the line without its terminator.
    fn encode<W: Write>(&self, w: &mut W) -> Result<usize> {
        let line = format!(
            "{code}{display}{sep}{selector}{sep}{host}{sep}{port}",
            code = self.item_type.wire_code(),
            display = self.display,
            selector = self.selector,
            host = self.host,
            port = self.port,
            sep = FIELD_SEPARATOR,
        );
        w.write_all(line.as_bytes())?;
        Ok(line.len())
    }
}

impl Encodable for Menu {
    fn encode<W: Write>(&self, w: &mut W) -> Result<usize> {
        if self.is_empty() {
            w.write_all(CRLF.as_bytes())?;
            return Ok(CRLF.len());
        }

        let mut bytes = 0;
        for entry in self {
            bytes += entry.encode(w)?;
            w.write_all(CRLF.as_bytes())?;
            bytes += CRLF.len();
        }
        w.write_all(TERMINATOR.as_bytes())?;
        Ok(bytes + TERMINATOR.len())
    }
}

/// Serialize a complete menu response.
pub fn write_menu<W: Write>(w: &mut W, menu: &Menu) -> Result<usize> {
    menu.encode(w)
}

/// Serialize the single error line sent for an unservable selector.
///
/// Unlike a menu, it carries no `.` terminator.
pub fn write_error<W: Write>(w: &mut W, entry: &MenuEntry) -> Result<usize> {
    let bytes = entry.encode(w)?;
    w.write_all(CRLF.as_bytes())?;
    Ok(bytes + CRLF.len())
}

/// Helper returning the wire bytes of a menu
pub fn menu_bytes(menu: &Menu) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_menu(&mut buf, menu);
    buf
}
