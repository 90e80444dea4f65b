//! Token dictionary for FunXMPP binary stanzas.
//!
//! Common tag names, attribute names and attribute values are sent as a single
//! token byte instead of the full string. Codes `0x05..=0xEC` index the primary
//! table directly. The escape code [`DICTIONARY_ESCAPE`] switches the next byte
//! over to a secondary table, and the same escape inside a secondary table
//! moves one table further along the chain.

use std::collections::HashMap;

/// Code that selects the next dictionary table in the escape chain.
pub const DICTIONARY_ESCAPE: u8 = 0xFE;

/// Number of secondary tables reachable through escapes.
pub const MAX_ESCAPE_DEPTH: usize = 2;

/// Primary tokens. Slots 0-4 are reserved and carry no string.
pub static PRIMARY_TOKENS: [&str; 237] = [
    "", "", "", "", "",
    "account", "ack", "action", "active", "add", "after", "ib", "all", "allow", "apple",
    "audio", "auth", "author", "available", "bad-protocol", "bad-request", "before",
    "Bell.caf", "body", "Boing.caf", "cancel", "category", "challenge", "chat", "clean",
    "code", "composing", "config", "conflict", "contacts", "count", "create", "creation",
    "default", "delay", "delete", "delivered", "deny", "digest", "DIGEST-MD5-1",
    "DIGEST-MD5-2", "dirty", "elapsed", "broadcast", "enable", "encoding", "duplicate",
    "error", "event", "expiration", "expired", "fail", "failure", "false", "favorites",
    "feature", "features", "field", "first", "free", "from", "g.us", "get", "Glass.caf",
    "google", "group", "groups", "g_notify", "g_sound", "Harp.caf",
    "http://etherx.jabber.org/streams", "http://jabber.org/protocol/chatstates", "id",
    "image", "img", "inactive", "index", "internal-server-error", "invalid-mechanism", "ip",
    "iq", "item", "item-not-found", "user-not-found", "jabber:iq:last", "jabber:iq:privacy",
    "jabber:x:delay", "jabber:x:event", "jid", "jid-malformed", "kind", "last", "latitude",
    "lc", "leave", "leave-all", "lg", "list", "location", "longitude", "max", "max_groups",
    "max_participants", "max_subject", "mechanism", "media", "message", "message_acks",
    "method", "microsoft", "missing", "modify", "mute", "name", "nokia", "none",
    "not-acceptable", "not-allowed", "not-authorized", "notification", "notify", "off",
    "offline", "order", "owner", "owning", "paid", "participant", "participants",
    "participating", "password", "paused", "picture", "pin", "ping", "platform",
    "pop_mean_time", "pop_plus_minus", "port", "presence", "preview", "probe", "proceed",
    "prop", "props", "p_o", "p_t", "query", "raw", "reason", "receipt", "receipt_acks",
    "received", "registration", "relay", "remote-server-timeout", "remove",
    "Replaced by new connection", "request", "required", "resource", "resource-constraint",
    "response", "result", "retry", "rim", "s.whatsapp.net", "s.us", "seconds", "server",
    "server-error", "service-unavailable", "set", "show", "sid", "silent", "sound", "stamp",
    "unsubscribe", "stat", "status", "stream:error", "stream:features", "subject",
    "subscribe", "success", "sync", "system-shutdown", "s_o", "s_t", "t", "text", "timeout",
    "TimePassing.caf", "timestamp", "to", "Tri-tone.caf", "true", "type", "unavailable",
    "uri", "url", "urn:ietf:params:xml:ns:xmpp-sasl", "urn:ietf:params:xml:ns:xmpp-stanzas",
    "urn:ietf:params:xml:ns:xmpp-streams", "urn:xmpp:delay", "urn:xmpp:ping",
    "urn:xmpp:receipts", "urn:xmpp:whatsapp", "urn:xmpp:whatsapp:account",
    "urn:xmpp:whatsapp:dirty", "urn:xmpp:whatsapp:mms", "urn:xmpp:whatsapp:push", "user",
    "username", "value", "vcard", "version", "video", "w", "w:g", "w:p", "w:p:r",
    "w:profile:picture", "wait", "x", "xml-not-well-formed", "xmlns", "xmlns:stream",
    "Xylophone.caf", "1", "WAUTH-1",
];

/// Secondary tables, in escape-chain order.
pub static SECONDARY_TOKENS: [&[&str]; MAX_ESCAPE_DEPTH] = [
    &[
        "adpcm", "audio/aac", "audio/aiff", "audio/amr", "audio/basic", "audio/mp4",
        "audio/mpeg", "audio/ogg", "audio/qcelp", "audio/wav", "audio/webm", "audio/x-caf",
        "audio/x-ms-wma", "image/gif", "image/jpeg", "image/png", "video/3gpp", "video/avi",
        "video/mp4", "video/mpeg", "video/quicktime", "video/x-flv", "video/x-ms-asf", "302",
        "400", "401", "402", "403", "404", "405", "406", "407", "409", "410", "500", "501",
        "503", "504", "abitrate", "acodec", "app_uptime", "asampfmt", "asampfreq", "clear",
        "conn_no_nna", "cost", "currency", "duration", "extend", "file", "fps", "gcm", "gone",
        "google_play", "hash", "height", "invalid", "live", "log", "mimetype", "mode",
        "napi_version", "normalize", "orighash", "origin", "passive", "played",
        "policy-violation", "price", "pricing", "redeem", "resume", "signature", "size",
        "source", "vbitrate", "vcodec", "width", "checkmarks", "image_max_edge",
        "image_max_kbytes", "image_quality", "ka", "ka_grow", "ka_shrink", "newmedia",
        "library", "caption", "forward", "filehash", "max_list_recipients",
    ],
    &[
        "c0", "c1", "c2", "c3", "clock_skew", "cts", "k0", "k1", "login_rtt", "m_id",
        "nna_msg_rtt", "nna_no_off_count", "nna_offline_ratio", "nna_push_rtt",
        "no_nna_con_count", "off_msg_rtt", "on_msg_rtt", "stat_name", "sts", "suspect_conn",
        "lists", "self", "qr", "web", "w:b", "recipient", "w:stats", "forbidden", "aurora.m4r",
        "bamboo.m4r", "chord.m4r", "circles.m4r", "complete.m4r", "hello.m4r", "input.m4r",
        "keys.m4r", "note.m4r", "popcorn.m4r", "pulse.m4r", "synth.m4r", "en-AU", "en-GB",
        "en-US", "es-ES", "pt-BR", "de-DE", "fr-FR", "it-IT",
    ],
];

/// Result of resolving one code against a dictionary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// The code names a string.
    Str(&'static str),
    /// The code is an escape; the next byte indexes the given table depth.
    Escape(usize),
}

/// Dictionary encoding of a string: the escape depth and the final code.
///
/// Depth 0 is a single primary byte; depth `n` is `n` escape bytes followed by
/// the code into secondary table `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCode {
    pub depth: usize,
    pub code: u8,
}

impl TokenCode {
    /// Wire bytes for this code.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut bytes = vec![DICTIONARY_ESCAPE; self.depth];
        bytes.push(self.code);
        bytes
    }
}

fn table(depth: usize) -> Option<&'static [&'static str]> {
    match depth {
        0 => Some(&PRIMARY_TOKENS[..]),
        n => SECONDARY_TOKENS.get(n - 1).copied(),
    }
}

/// Resolve `code` against the table at escape depth `depth` (0 = primary).
///
/// Returns `None` when the slot carries no string.
pub fn resolve(depth: usize, code: u8) -> Option<Token> {
    if code == DICTIONARY_ESCAPE && depth < MAX_ESCAPE_DEPTH {
        return Some(Token::Escape(depth + 1));
    }
    match table(depth)?.get(code as usize) {
        Some(s) if !s.is_empty() => Some(Token::Str(*s)),
        _ => None,
    }
}

lazy_static::lazy_static! {
    static ref TOKEN_INDEX: HashMap<&'static str, TokenCode> = {
        let mut map = HashMap::new();
        for depth in 0..=MAX_ESCAPE_DEPTH {
            let Some(entries) = table(depth) else { continue };
            for (i, token) in entries.iter().enumerate() {
                if token.is_empty() {
                    continue;
                }
                // Earlier tables win so the shortest code is used.
                map.entry(*token).or_insert(TokenCode { depth, code: i as u8 });
            }
        }
        map
    };
}

/// Reverse lookup. `None` means the string must be sent as a literal.
pub fn lookup(s: &str) -> Option<TokenCode> {
    TOKEN_INDEX.get(s).copied()
}
