//! Protocol value types shared by the codec.
//!
//! Currently this is the `user@server` identifier carried by the
//! identifier-pair encoding.

mod jid;

pub use jid::*;
