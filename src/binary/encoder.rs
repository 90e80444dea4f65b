//! Binary encoder for FunXMPP stanzas.
//!
//! Encodes Node structures into the binary tree format. Each string picks the
//! smallest of its possible encodings: dictionary token, packed digits,
//! identifier pair, or length-prefixed literal.

use thiserror::Error;

use super::marker::*;
use super::node::{Node, NodeContent};
use super::token::lookup;
use crate::types::JID;

/// Error type for encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("list of {0} items does not fit a 2-byte count")]
    ListTooLong(usize),
    #[error("{0} bytes do not fit a 4-byte length")]
    DataTooLong(usize),
}

/// Binary encoder for stanza nodes
pub struct Encoder {
    data: Vec<u8>,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Encode a node and return the binary data
    pub fn encode(node: &Node) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = Self::new();
        encoder.write_node(node)?;
        Ok(encoder.data)
    }

    /// Take the bytes written so far.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Write a byte
    fn write_byte(&mut self, b: u8) {
        self.data.push(b);
    }

    /// Write multiple bytes
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a node as `[tag, (key, value)*, content?]`.
    pub fn write_node(&mut self, node: &Node) -> Result<(), EncodeError> {
        let has_content = !node.content.is_empty();
        let size = 1 + 2 * node.attrs.len() + usize::from(has_content);

        self.write_list_start(size)?;
        self.write_string(&node.tag)?;
        for (key, value) in &node.attrs {
            self.write_string(key)?;
            self.write_string(value)?;
        }

        match &node.content {
            NodeContent::Children(children) if !children.is_empty() => {
                self.write_list_start(children.len())?;
                for child in children {
                    self.write_node(child)?;
                }
            }
            NodeContent::Bytes(bytes) => self.write_binary(bytes)?,
            _ => {}
        }
        Ok(())
    }

    /// Write a list header using the smallest marker that fits.
    fn write_list_start(&mut self, len: usize) -> Result<(), EncodeError> {
        if len == 0 {
            self.write_byte(LIST_EMPTY);
        } else if len <= LIST_SHORT_MAX {
            self.write_byte(LIST_SHORT_FIRST + (len - 1) as u8);
        } else if let Ok(n) = u8::try_from(len) {
            self.write_byte(LIST_8);
            self.write_byte(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.write_byte(LIST_16);
            self.write_bytes(&n.to_be_bytes());
        } else {
            return Err(EncodeError::ListTooLong(len));
        }
        Ok(())
    }

    /// Write a string (possibly as token)
    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        if s.is_empty() {
            self.write_byte(LIST_EMPTY);
            return Ok(());
        }

        if let Some(code) = lookup(s) {
            self.write_bytes(&code.to_bytes());
            return Ok(());
        }

        if is_packable(s) {
            self.write_packed_digits(s);
            return Ok(());
        }

        if let Some((user, server)) = JID::split_pair(s) {
            self.write_byte(JID_PAIR);
            self.write_string(user)?;
            return self.write_string(server);
        }

        self.write_binary(s.as_bytes())
    }

    /// Write length-prefixed bytes with the smallest length field that fits.
    fn write_binary(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let len = bytes.len();
        if let Ok(n) = u8::try_from(len) {
            self.write_byte(BINARY_8);
            self.write_byte(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.write_byte(BINARY_16);
            self.write_bytes(&n.to_be_bytes());
        } else if let Ok(n) = u32::try_from(len) {
            self.write_byte(BINARY_32);
            self.write_bytes(&n.to_be_bytes());
        } else {
            return Err(EncodeError::DataTooLong(len));
        }
        self.write_bytes(bytes);
        Ok(())
    }

    /// Two digits per byte, high nibble first; an odd count pads the last
    /// low nibble.
    fn write_packed_digits(&mut self, digits: &str) {
        let digits = digits.as_bytes();
        let mut header = digits.len().div_ceil(2) as u8;
        if digits.len() % 2 == 1 {
            header |= NIBBLE_ODD_FLAG;
        }

        self.write_byte(NIBBLE_8);
        self.write_byte(header);
        for pair in digits.chunks(2) {
            let high = pair[0] - b'0';
            let low = pair.get(1).map_or(NIBBLE_PAD, |d| d - b'0');
            self.write_byte((high << 4) | low);
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_packable(s: &str) -> bool {
    (NIBBLE_MIN_DIGITS..=NIBBLE_MAX_BYTES * 2).contains(&s.len())
        && s.bytes().all(|b| b.is_ascii_digit())
}

/// Encode a node to binary format
pub fn encode(node: &Node) -> Result<Vec<u8>, EncodeError> {
    Encoder::encode(node)
}
