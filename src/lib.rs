//! Funxmpp-rust: binary stanza codec for the FunXMPP protocol.
//!
//! FunXMPP is the XMPP derivative spoken by early WhatsApp clients. Stanzas are
//! sent as compact binary trees instead of XML text, using a token dictionary
//! for common names and special encodings for digit strings and JIDs.
//!
//! ## Modules
//!
//! - `binary` - Node model, token dictionary, encoder and decoder
//! - `frame` - Length-prefixed frames and the incremental frame buffer
//! - `types` - JID type used by the identifier-pair encoding
//! - `config` - Codec limits

pub mod binary;
pub mod frame;
pub mod types;

mod config;

pub use binary::{decode, encode, DecodeError, EncodeError, Node, NodeContent};
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, MAX_FRAME_LEN};
pub use frame::{read_frame, write_frame, FrameBuffer, FrameError, ReadFrame};
pub use types::JID;
