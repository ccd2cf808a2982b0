//! Framing of the request line and of text-file responses.

use std::io;

use bytes::{BufMut, BytesMut};
use log::warn;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::DEFAULT_MAX_SELECTOR_LEN;
use crate::item::CRLF;

fn trim_end(line: &mut BytesMut) {
    while line.last().is_some_and(u8::is_ascii_whitespace) {
        line.truncate(line.len() - 1);
    }
}

/// Decodes the request line a client sends after connecting.
///
/// At most `max_len` bytes are taken. A longer line is cut at the limit rather
/// than rejected. Trailing whitespace and the line ending are removed and
/// invalid UTF-8 is replaced.
#[derive(Clone, Debug)]
pub struct SelectorCodec {
    max_len: usize,
}

impl SelectorCodec {
    pub fn new(max_len: usize) -> SelectorCodec {
        SelectorCodec {
            max_len: max_len.max(1),
        }
    }

    fn finish(mut line: BytesMut) -> String {
        trim_end(&mut line);
        String::from_utf8_lossy(&line).into_owned()
    }
}

impl Default for SelectorCodec {
    fn default() -> Self {
        SelectorCodec::new(DEFAULT_MAX_SELECTOR_LEN)
    }
}

impl Decoder for SelectorCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        let limit = buf.len().min(self.max_len);
        if let Some(pos) = buf[..limit].iter().position(|b| *b == b'\n') {
            let line = buf.split_to(pos + 1);
            return Ok(Some(Self::finish(line)));
        }

        if buf.len() >= self.max_len {
            warn!("Request line longer than {} bytes, truncating", self.max_len);
            let line = buf.split_to(self.max_len);
            return Ok(Some(Self::finish(line)));
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let line = buf.split_to(buf.len());
        Ok(Some(Self::finish(line)))
    }
}

/// Default cap on the bytes of a text line held in memory at once.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// A piece of a text file as framed by [`LineCodec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextFrame {
    /// Leading part of a line longer than the codec's limit, sent as is.
    Partial(BytesMut),
    /// The end of a line, sent followed by CRLF.
    Line(BytesMut),
}

impl TextFrame {
    /// Bytes this frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        match *self {
            TextFrame::Partial(ref bytes) => bytes.len(),
            TextFrame::Line(ref bytes) => bytes.len() + CRLF.len(),
        }
    }
}

/// Line framing for text files.
///
/// Decoding splits on `\n` and strips trailing whitespace (including any `\r`),
/// also yielding a final line that lacks a newline. Encoding appends CRLF.
/// Content is handled as bytes, so files need not be valid UTF-8.
///
/// A line longer than `max_len` is passed on in [`TextFrame::Partial`] pieces,
/// so no more than `max_len` bytes of it are buffered.
#[derive(Clone, Copy, Debug)]
pub struct LineCodec {
    max_len: usize,
    next_index: usize,
    /// A `Partial` frame went out and its line has not been closed yet.
    in_line: bool,
}

impl LineCodec {
    pub fn new(max_len: usize) -> LineCodec {
        LineCodec {
            max_len: max_len.max(1),
            next_index: 0,
            in_line: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        LineCodec::new(DEFAULT_MAX_LINE_LEN)
    }
}

impl Decoder for LineCodec {
    type Item = TextFrame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<TextFrame>> {
        let limit = buf.len().min(self.max_len);
        let start = self.next_index.min(limit);

        if let Some(offset) = buf[start..limit].iter().position(|b| *b == b'\n') {
            self.next_index = 0;
            self.in_line = false;
            let mut line = buf.split_to(start + offset + 1);
            trim_end(&mut line);
            return Ok(Some(TextFrame::Line(line)));
        }

        if buf.len() < self.max_len {
            self.next_index = limit;
            return Ok(None);
        }

        // Trailing blanks stay buffered until we know whether the line ends.
        self.next_index = 0;
        self.in_line = true;
        let keep = buf[..self.max_len]
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(self.max_len, |pos| pos + 1);
        Ok(Some(TextFrame::Partial(buf.split_to(keep))))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<TextFrame>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if buf.is_empty() {
            if !self.in_line {
                return Ok(None);
            }
            self.in_line = false;
            return Ok(Some(TextFrame::Line(BytesMut::new())));
        }
        self.in_line = false;
        let mut line = buf.split_to(buf.len());
        trim_end(&mut line);
        Ok(Some(TextFrame::Line(line)))
    }
}

impl Encoder<TextFrame> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: TextFrame, dst: &mut BytesMut) -> io::Result<()> {
        dst.reserve(frame.wire_len());
        match frame {
            TextFrame::Partial(bytes) => dst.put(bytes),
            TextFrame::Line(bytes) => {
                dst.put(bytes);
                dst.put(CRLF.as_bytes());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    fn decode_all<D: Decoder>(mut codec: D, input: &[u8]) -> Vec<D::Item>
    where
        D::Error: std::fmt::Debug,
    {
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(item) = codec.decode(&mut buf).unwrap() {
            out.push(item);
        }
        while let Some(item) = codec.decode_eof(&mut buf).unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn selector_line_is_trimmed() {
        let got = decode_all(SelectorCodec::default(), b"/docs/notes.txt \r\n");
        assert_eq!(got, ["/docs/notes.txt"]);
    }

    #[test]
    fn empty_request_is_root() {
        assert_eq!(decode_all(SelectorCodec::default(), b"\r\n"), [""]);
    }

    #[test]
    fn selector_without_newline_is_taken_at_eof() {
        assert_eq!(decode_all(SelectorCodec::default(), b"/docs"), ["/docs"]);
        assert!(decode_all(SelectorCodec::default(), b"").is_empty());
    }

    #[test]
    fn oversized_selector_is_truncated() {
        let mut codec = SelectorCodec::new(8);
        let mut buf = BytesMut::from(&b"/abcdefghijkl\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("/abcdefg"));
    }

    #[test]
    fn partial_selector_waits_for_more() {
        let mut codec = SelectorCodec::default();
        let mut buf = BytesMut::from(&b"/do"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"cs\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("/docs"));
    }

    fn lines(frames: &[TextFrame]) -> Vec<&[u8]> {
        frames
            .iter()
            .map(|frame| match frame {
                TextFrame::Line(line) => &line[..],
                TextFrame::Partial(_) => panic!("unexpected partial frame {:?}", frame),
            })
            .collect()
    }

    #[test]
    fn text_lines_are_split_and_trimmed() {
        let got = decode_all(LineCodec::default(), b"one  \r\ntwo\n\nlast\t");
        let expected: [&[u8]; 4] = [b"one", b"two", b"", b"last"];
        assert_eq!(lines(&got), expected);
    }

    #[test]
    fn long_line_is_passed_on_in_bounded_pieces() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::from(&b"abcdefghij"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Partial(BytesMut::from(&b"abcd"[..])))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Partial(BytesMut::from(&b"efgh"[..])))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.len() < 4);

        buf.extend_from_slice(b"\nok\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Line(BytesMut::from(&b"ij"[..])))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Line(BytesMut::from(&b"ok"[..])))
        );
    }

    #[test]
    fn trailing_blanks_of_a_long_line_are_still_trimmed() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::from(&b"abc  \r\n"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Partial(BytesMut::from(&b"abc"[..])))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TextFrame::Line(BytesMut::new()))
        );
    }

    #[test]
    fn frame_wire_len() {
        assert_eq!(TextFrame::Partial(BytesMut::from(&b"abc"[..])).wire_len(), 3);
        assert_eq!(TextFrame::Line(BytesMut::from(&b"abc"[..])).wire_len(), 5);
    }

    async fn reframe(codec: LineCodec, input: &'static [u8]) -> Vec<u8> {
        let (client, mut server) = tokio::io::duplex(1024);

        let writer = tokio::spawn(async move {
            server.write_all(input).await.unwrap();
            server.shutdown().await.unwrap();
        });

        let mut out = Vec::new();
        let mut frames = FramedRead::new(client, codec);
        let mut sink = FramedWrite::new(&mut out, codec);
        while let Some(frame) = frames.next().await {
            sink.send(frame.unwrap()).await.unwrap();
        }
        writer.await.unwrap();
        drop(sink);
        out
    }

    #[tokio::test]
    async fn text_file_framing_round_trip() {
        let out = reframe(LineCodec::default(), b"alpha\nbeta\r\ngamma").await;
        assert_eq!(out, b"alpha\r\nbeta\r\ngamma\r\n");
    }

    #[tokio::test]
    async fn long_lines_keep_their_content() {
        let out = reframe(LineCodec::new(3), b"abcdefgh  \nij\nklmnop").await;
        assert_eq!(out, b"abcdefgh\r\nij\r\nklmnop\r\n");
    }
}
