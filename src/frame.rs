//! Frame codec for FunXMPP streams.
//!
//! Every stanza travels as one frame: a 3-byte big-endian body length followed
//! by the encoded node tree. The functions here never perform I/O. The
//! transport appends whatever it reads to a [`FrameBuffer`] (or its own buffer
//! passed to [`read_frame`]) and asks for the next complete frame.

use thiserror::Error;

use crate::binary::{encode, DecodeError, Decoder, EncodeError, Node};
use crate::config::CodecConfig;

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 3;

/// Frame errors. All of them leave the stream desynchronized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("frame body of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
}

/// Outcome of looking for a frame at the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFrame {
    /// Not enough bytes yet; nothing was consumed.
    Incomplete { needed: usize },
    /// A complete frame occupying the first `consumed` bytes of the buffer.
    Frame { node: Node, consumed: usize },
}

fn body_len(header: &[u8]) -> usize {
    u32::from_be_bytes([0, header[0], header[1], header[2]]) as usize
}

/// Read the frame at the start of `buf` with default limits.
pub fn read_frame(buf: &[u8]) -> Result<ReadFrame, FrameError> {
    read_frame_with(buf, &CodecConfig::default())
}

/// Read the frame at the start of `buf`.
pub fn read_frame_with(buf: &[u8], config: &CodecConfig) -> Result<ReadFrame, FrameError> {
    let Some(header) = buf.get(..FRAME_HEADER_LEN) else {
        return Ok(ReadFrame::Incomplete {
            needed: FRAME_HEADER_LEN - buf.len(),
        });
    };

    let len = body_len(header);
    let max = config.frame_limit();
    if len > max {
        return Err(FrameError::FrameTooLarge { len, max });
    }

    let total = FRAME_HEADER_LEN + len;
    if buf.len() < total {
        return Ok(ReadFrame::Incomplete {
            needed: total - buf.len(),
        });
    }

    let body = &buf[FRAME_HEADER_LEN..total];
    let node = Decoder::with_max_depth(body, config.max_depth)
        .decode_all()
        .inspect_err(|e| {
            log::debug!("failed to decode {}-byte frame: {}", len, e);
        })?;

    log::trace!("read frame ({} bytes): {}", len, node);
    Ok(ReadFrame::Frame {
        node,
        consumed: total,
    })
}

/// Encode `node` as a complete frame with default limits.
pub fn write_frame(node: &Node) -> Result<Vec<u8>, FrameError> {
    write_frame_with(node, &CodecConfig::default())
}

/// Encode `node` as a complete frame.
pub fn write_frame_with(node: &Node, config: &CodecConfig) -> Result<Vec<u8>, FrameError> {
    let body = encode(node)?;
    let max = config.frame_limit();
    if body.len() > max {
        return Err(FrameError::FrameTooLarge {
            len: body.len(),
            max,
        });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    let len = body.len() as u32;
    frame.extend_from_slice(&len.to_be_bytes()[1..]); // 3 bytes
    frame.extend_from_slice(&body);

    log::trace!("write frame {}", hex::encode(&frame));
    Ok(frame)
}

/// Accumulates transport reads until whole frames are available.
///
/// Consumed frames only advance a read offset; the bytes are released in one
/// move on the next [`feed`](Self::feed) or at the end of
/// [`drain_frames`](Self::drain_frames).
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    start: usize,
    config: CodecConfig,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buffer: Vec::new(),
            start: 0,
            config,
        }
    }

    /// Append bytes received from the transport.
    pub fn feed(&mut self, data: &[u8]) {
        self.compact();
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete frame, or `None` until more bytes arrive.
    ///
    /// On error the buffer is left as it was; the connection should be
    /// dropped.
    pub fn next_frame(&mut self) -> Result<Option<Node>, FrameError> {
        match read_frame_with(self.pending(), &self.config)? {
            ReadFrame::Incomplete { .. } => Ok(None),
            ReadFrame::Frame { node, consumed } => {
                self.start += consumed;
                Ok(Some(node))
            }
        }
    }

    /// Take every complete frame currently buffered.
    pub fn drain_frames(&mut self) -> Result<Vec<Node>, FrameError> {
        let mut nodes = Vec::new();
        while let Some(node) = self.next_frame()? {
            nodes.push(node);
        }
        self.compact();
        Ok(nodes)
    }

    /// Bytes buffered but not yet returned as frames.
    pub fn buffered_len(&self) -> usize {
        self.pending().len()
    }

    /// Bytes still missing before the next frame is complete.
    pub fn needed(&self) -> usize {
        let pending = self.pending();
        let Some(header) = pending.get(..FRAME_HEADER_LEN) else {
            return FRAME_HEADER_LEN - pending.len();
        };
        (FRAME_HEADER_LEN + body_len(header)).saturating_sub(pending.len())
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.start = 0;
    }

    fn pending(&self) -> &[u8] {
        &self.buffer[self.start..]
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
    }
}
