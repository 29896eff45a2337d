//! Message framing for the speaker's listen stream
//!
//! Speakers push a stream of HTTP-looking messages:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 123\r\n
//! \r\n
//! <?xml version="1.0" encoding="UTF-8"?><UIC>...</UIC>
//! ```
//!
//! Reads deliver arbitrary slices of that stream, so [`frame`] recovers
//! complete messages from a buffer and reports what is left over. Segments
//! that do not fit the grammar are dropped silently; noise on the stream
//! must never end the connection.

use std::cmp::Ordering;

use bytes::BytesMut;

const STATUS_MARKER: &[u8] = b"HTTP/1.1 ";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// One result of a framing pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage<'a> {
    /// `Some(200)` for a complete message, `None` when more bytes are needed
    pub status: Option<u16>,
    pub body: String,
    /// Bytes of the input not consumed up to and including this message
    pub remainder: &'a [u8],
}

impl FramedMessage<'_> {
    pub fn is_complete(&self) -> bool {
        self.status.is_some()
    }
}

/// Frame a buffer into complete messages
///
/// The sequence ends with either a complete message whose remainder is
/// empty, a waiting message (`status == None`) holding the unconsumed
/// bytes, or a complete message followed by excess bytes that need another
/// pass. The remainder of the last item is what the caller keeps.
pub fn frame(buffer: &[u8]) -> Frames<'_> {
    Frames {
        data: buffer,
        done: false,
    }
}

/// Lazy iterator returned by [`frame`]
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    data: &'a [u8],
    done: bool,
}

impl<'a> Frames<'a> {
    fn wait(&mut self, data: &'a [u8]) -> Option<FramedMessage<'a>> {
        self.done = true;
        Some(FramedMessage {
            status: None,
            body: String::new(),
            remainder: data,
        })
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = FramedMessage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let data = self.data;
            let Some(line) = find_status_line(data, 0) else {
                return self.wait(data);
            };
            let next = find_status_line(data, line.end).map(|next| next.start);
            let segment_end = next.unwrap_or(data.len());

            if line.status != 200 {
                tracing::debug!("Dropping message with status {}", line.status);
                self.data = &data[line.end..];
                continue;
            }

            let segment = &data[line.end..segment_end];
            let Some(separator) = find(segment, HEADER_END, 0) else {
                match next {
                    Some(next) => {
                        tracing::debug!("Dropping message without header terminator");
                        self.data = &data[next..];
                        continue;
                    }
                    None => return self.wait(data),
                }
            };

            let Some(length) = content_length(&segment[..separator]) else {
                tracing::debug!("Dropping message without Content-Length");
                self.data = &data[segment_end..];
                continue;
            };

            let body_start = line.end + separator + HEADER_END.len();
            let available = segment_end - body_start;

            match available.cmp(&length) {
                Ordering::Equal => {
                    self.data = &data[segment_end..];
                    if self.data.is_empty() {
                        self.done = true;
                    }
                    return Some(FramedMessage {
                        status: Some(200),
                        body: decode_body(&data[body_start..segment_end]),
                        remainder: self.data,
                    });
                }
                Ordering::Less => match next {
                    Some(next) => {
                        tracing::debug!(
                            "Dropping truncated message ({} of {} bytes)",
                            available,
                            length
                        );
                        self.data = &data[next..];
                    }
                    None => return self.wait(data),
                },
                Ordering::Greater => {
                    // Excess is the start of the next status line; leave it for the next pass.
                    let body_end = body_start + length;
                    self.done = true;
                    return Some(FramedMessage {
                        status: Some(200),
                        body: decode_body(&data[body_start..body_end]),
                        remainder: &data[body_end..],
                    });
                }
            }
        }
    }
}

/// Accumulates reads from the listen stream and yields message bodies
///
/// Owned by the read loop. Anything the framer cannot consume yet is kept
/// for the next read, up to `max_size` bytes.
#[derive(Debug)]
pub struct ByteBuffer {
    buf: BytesMut,
    max_size: usize,
}

impl ByteBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_size,
        }
    }

    /// Append a read and return the bodies of all messages now complete
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut bodies = Vec::new();
        loop {
            let mut progressed = false;
            let mut consumed = 0;
            for message in frame(&self.buf) {
                consumed = self.buf.len() - message.remainder.len();
                if message.is_complete() {
                    progressed = true;
                    bodies.push(message.body);
                }
            }
            let _ = self.buf.split_to(consumed);

            if !progressed || self.buf.is_empty() {
                break;
            }
        }

        if self.buf.len() > self.max_size {
            tracing::warn!(
                "Discarding {} unframed bytes from receive buffer",
                self.buf.len()
            );
            self.buf.clear();
        }

        bodies
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct StatusLine {
    start: usize,
    status: u16,
    /// First byte after the reason phrase
    end: usize,
}

/// Next complete `HTTP/1.1 NNN [reason]` at or after `from`
fn find_status_line(data: &[u8], from: usize) -> Option<StatusLine> {
    let mut search = from;
    while let Some(start) = find(data, STATUS_MARKER, search) {
        let code_start = start + STATUS_MARKER.len();
        let code = data.get(code_start..code_start + 3)?;
        if code.iter().all(u8::is_ascii_digit) {
            let status = code
                .iter()
                .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));

            let mut end = code_start + 3;
            if data.get(end) == Some(&b' ') {
                end += 1;
            }
            while data
                .get(end)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
            {
                end += 1;
            }
            return Some(StatusLine { start, status, end });
        }
        search = start + 1;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn content_length(headers: &[u8]) -> Option<usize> {
    let headers = String::from_utf8_lossy(headers);
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn decode_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
