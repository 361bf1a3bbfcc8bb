//! A safe codec for DNS wire messages.
//!
//! This library encodes and decodes the binary packet layout of
//! [RFC 1035](https://tools.ietf.org/html/rfc1035), carries the UPDATE
//! opcode and return codes of [RFC 2136](https://tools.ietf.org/html/rfc2136),
//! and understands the cache-flush / unicast-response class bit used by
//! mDNS and DNS-SD ([RFC 6762](https://tools.ietf.org/html/rfc6762),
//! [RFC 6763](https://tools.ietf.org/html/rfc6763)).
//!
//! [`Message`] is the plain-value form of one message. [`Message::decode`]
//! and [`Message::encode`] convert between it and the UDP datagram bytes;
//! [`Message::decode_tcp`] and [`Message::encode_tcp`] add the 2-byte
//! length prefix used over stream transports. Names are compressed on
//! encode with RFC 1035 section 4.1.4 back-references, and expanded on
//! decode with the pointer checks needed to survive hostile input:
//! decoding never panics and always terminates, surfacing one of the
//! [`Error`] variants for malformed packets.
//!
//! # Example
//!
//! ```rust
//! use dns_wire::{Message, MessageType, Question, ResourceRecord, TYPE_PTR};
//!
//! // A service-discovery query...
//! let mut query = Message::new(MessageType::Query);
//! query.questions.push(Question::new("_airplay._tcp.local.", TYPE_PTR));
//! let bytes = query.encode();
//! assert_eq!(Message::decode(&bytes).expect("valid packet"), query);
//!
//! // ...and a response to it.
//! let mut response = Message::new(MessageType::Response);
//! response.authoritative_answer = true;
//! response.answers.push(ResourceRecord::ptr(
//!     "_airplay._tcp.local.",
//!     4500,
//!     "living-room._airplay._tcp.local.",
//! ));
//! let bytes = response.encode();
//! assert_eq!(Message::decode(&bytes).expect("valid packet"), response);
//! ```
//!
//! The codec performs no I/O and keeps no state between calls: callers
//! that put these messages on a socket correlate responses to requests by
//! the 16-bit [`Message::id`] and enforce their own timeouts.

#![forbid(unsafe_code)]
#![allow(clippy::single_component_path_imports)]

// log for logging (optional).
#[cfg(feature = "logging")]
use log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! debug {
        ($($arg:expr),*) => {{
            let _ = ($($arg),*); // avoid warnings about unused variables.
        }};
    }
    macro_rules! error {
        ($($arg:expr),*) => {{
            let _ = ($($arg),*); // avoid warnings about unused variables.
        }};
    }
}

mod error;
mod message;
mod packet;
mod record;
mod txt;

pub use error::{Error, Result};
pub use message::{
    Message, MessageType, OPCODE_IQUERY, OPCODE_NOTIFY, OPCODE_QUERY, OPCODE_STATUS, OPCODE_UPDATE,
    RCODE_FORMERR, RCODE_NOERROR, RCODE_NOTAUTH, RCODE_NOTIMP, RCODE_NOTZONE, RCODE_NXDOMAIN,
    RCODE_NXRRSET, RCODE_REFUSED, RCODE_SERVFAIL, RCODE_YXDOMAIN, RCODE_YXRRSET,
};
pub use packet::{deserialize_name, OutPacket};
pub use record::{
    Question, RecordData, ResourceRecord, Soa, CLASS_IN, CLASS_MASK, CLASS_UNIQUE, TYPE_A,
    TYPE_AAAA, TYPE_ANY, TYPE_CNAME, TYPE_HINFO, TYPE_PTR, TYPE_SOA, TYPE_SRV, TYPE_TXT,
};
pub use txt::{IntoTxtProperties, TxtProperties, TxtProperty};
