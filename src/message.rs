//! Whole-message encode and decode.
//!
//! [`Message`] is the plain-value representation of one DNS message. It is
//! produced by [`Message::decode`] and consumed by [`Message::encode`];
//! the `_tcp` variants add the 2-byte length prefix used over stream
//! transports.

#[cfg(feature = "logging")]
use crate::log::debug;
use crate::packet::{u16_from_be_slice, MsgReader, OutPacket};
use crate::record::{Question, ResourceRecord};
use crate::{Error, Result};

// Definitions for the DNS message header "flags" field
//
// The "flags" field is 16-bit long, in this format:
// (RFC 1035 section 4.1.1)
//
//   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//
const FLAGS_QR_RESPONSE: u16 = 0x8000;
const FLAGS_AA: u16 = 0x0400; // Authoritative answer
const FLAGS_TC: u16 = 0x0200; // Truncation
const FLAGS_RD: u16 = 0x0100; // Recursion desired
const FLAGS_RA: u16 = 0x0080; // Recursion available
const OPCODE_SHIFT: u16 = 11;
const FIELD_MASK: u16 = 0x000F; // OPCODE and RCODE are both 4-bit

/// Standard operation codes (RFC 1035, RFC 1996, RFC 2136). Other values
/// are carried through as plain integers.
pub const OPCODE_QUERY: u8 = 0;
pub const OPCODE_IQUERY: u8 = 1;
pub const OPCODE_STATUS: u8 = 2;
pub const OPCODE_NOTIFY: u8 = 4;
pub const OPCODE_UPDATE: u8 = 5;

/// Return codes (RFC 1035, RFC 2136). Other values are carried through
/// as plain integers.
pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_NOTIMP: u8 = 4;
pub const RCODE_REFUSED: u8 = 5;
pub const RCODE_YXDOMAIN: u8 = 6;
pub const RCODE_YXRRSET: u8 = 7;
pub const RCODE_NXRRSET: u8 = 8;
pub const RCODE_NOTAUTH: u8 = 9;
pub const RCODE_NOTZONE: u8 = 10;

/// Whether a message is a query or a response (the QR header bit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Query,
    Response,
}

/// One DNS message: the header fields and the four record sections.
///
/// The section counts in the encoded header always equal the lengths of
/// the corresponding vectors. The encoder never truncates; whoever splits
/// an oversized answer across messages sets [`truncation`][Self::truncation]
/// themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Opaque correlator chosen by the originator; responders copy it back.
    pub id: u16,
    pub ty: MessageType,
    /// 4-bit operation code; see the `OPCODE_*` constants.
    pub opcode: u8,
    pub authoritative_answer: bool,
    pub truncation: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// 4-bit return code; see the `RCODE_*` constants.
    pub return_code: u8,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// An empty message with all flags clear and id 0.
    pub fn new(ty: MessageType) -> Self {
        Self {
            id: 0,
            ty,
            opcode: OPCODE_QUERY,
            authoritative_answer: false,
            truncation: false,
            recursion_desired: false,
            recursion_available: false,
            return_code: RCODE_NOERROR,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    pub fn is_query(&self) -> bool {
        self.ty == MessageType::Query
    }

    pub fn is_response(&self) -> bool {
        self.ty == MessageType::Response
    }

    /// Decodes one message from its UDP datagram form.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::InvalidMessageSize(data.len()));
        }

        let mut reader = MsgReader::new(data);
        let id = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let num_questions = reader.read_u16()?;
        let num_answers = reader.read_u16()?;
        let num_authorities = reader.read_u16()?;
        let num_additionals = reader.read_u16()?;

        debug!(
            "decode: id {:#06x}, {} questions {} answers {} authorities {} additionals",
            id, num_questions, num_answers, num_authorities, num_additionals
        );

        let mut msg = Self {
            id,
            ty: if (flags & FLAGS_QR_RESPONSE) != 0 {
                MessageType::Response
            } else {
                MessageType::Query
            },
            opcode: ((flags >> OPCODE_SHIFT) & FIELD_MASK) as u8,
            authoritative_answer: (flags & FLAGS_AA) != 0,
            truncation: (flags & FLAGS_TC) != 0,
            recursion_desired: (flags & FLAGS_RD) != 0,
            recursion_available: (flags & FLAGS_RA) != 0,
            return_code: (flags & FIELD_MASK) as u8,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        };

        // The counts come off the wire, so the vectors grow push by push
        // instead of trusting them for an allocation.
        for _ in 0..num_questions {
            msg.questions.push(Question::read(&mut reader)?);
        }
        for _ in 0..num_answers {
            msg.answers.push(ResourceRecord::read(&mut reader)?);
        }
        for _ in 0..num_authorities {
            msg.authorities.push(ResourceRecord::read(&mut reader)?);
        }
        for _ in 0..num_additionals {
            msg.additionals.push(ResourceRecord::read(&mut reader)?);
        }

        Ok(msg)
    }

    /// Encodes to the UDP datagram form.
    pub fn encode(&self) -> Vec<u8> {
        let mut packet = OutPacket::new();

        for question in self.questions.iter() {
            question.write(&mut packet);
        }
        for answer in self.answers.iter() {
            answer.write(&mut packet);
        }
        for authority in self.authorities.iter() {
            authority.write(&mut packet);
        }
        for additional in self.additionals.iter() {
            additional.write(&mut packet);
        }

        // The header goes in front of the sections, last field first.
        packet.insert_short(0, self.additionals.len() as u16);
        packet.insert_short(0, self.authorities.len() as u16);
        packet.insert_short(0, self.answers.len() as u16);
        packet.insert_short(0, self.questions.len() as u16);
        packet.insert_short(0, self.flags());
        packet.insert_short(0, self.id);

        packet.into_bytes()
    }

    /// Decodes one message from its TCP form: a 2-byte big-endian length
    /// prefix followed by that many datagram bytes.
    pub fn decode_tcp(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::InvalidMessageSize(data.len()));
        }
        let length = u16_from_be_slice(&data[..2]) as usize;
        match data.get(2..2 + length) {
            Some(datagram) => Self::decode(datagram),
            None => Err(Error::InvalidMessageSize(data.len())),
        }
    }

    /// Encodes to the TCP form. The datagram form must fit the 16-bit
    /// length prefix; longer messages are a caller error.
    pub fn encode_tcp(&self) -> Vec<u8> {
        let datagram = self.encode();
        assert!(datagram.len() <= u16::MAX as usize);

        let mut framed = Vec::with_capacity(2 + datagram.len());
        framed.extend_from_slice(&(datagram.len() as u16).to_be_bytes());
        framed.extend_from_slice(&datagram);
        framed
    }

    /// Packs the header flags word. The 3 reserved Z bits are zeroed.
    fn flags(&self) -> u16 {
        let mut flags = match self.ty {
            MessageType::Query => 0,
            MessageType::Response => FLAGS_QR_RESPONSE,
        };
        flags |= (u16::from(self.opcode) & FIELD_MASK) << OPCODE_SHIFT;
        if self.authoritative_answer {
            flags |= FLAGS_AA;
        }
        if self.truncation {
            flags |= FLAGS_TC;
        }
        if self.recursion_desired {
            flags |= FLAGS_RD;
        }
        if self.recursion_available {
            flags |= FLAGS_RA;
        }
        flags |= u16::from(self.return_code) & FIELD_MASK;
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageType, OPCODE_UPDATE, RCODE_NXDOMAIN};
    use crate::{Error, Question, TYPE_PTR};

    #[test]
    fn test_empty_nxdomain_response() {
        let mut msg = Message::new(MessageType::Response);
        msg.id = 0x11B1;
        msg.return_code = RCODE_NXDOMAIN;

        let bytes = msg.encode();
        assert_eq!(
            bytes,
            [0x11, 0xB1, 0x80, 0x03, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_empty_response_with_all_flags() {
        let mut msg = Message::new(MessageType::Response);
        msg.id = 0x494D;
        msg.authoritative_answer = true;
        msg.truncation = true;
        msg.recursion_desired = true;
        msg.recursion_available = true;

        let bytes = msg.encode();
        assert_eq!(
            bytes,
            [0x49, 0x4D, 0x87, 0x80, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_unknown_opcode_and_rcode_roundtrip() {
        let mut msg = Message::new(MessageType::Response);
        msg.opcode = 9; // unassigned
        msg.return_code = 13; // unassigned
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.opcode, 9);
        assert_eq!(decoded.return_code, 13);
    }

    #[test]
    fn test_update_opcode_roundtrip() {
        let mut msg = Message::new(MessageType::Query);
        msg.opcode = OPCODE_UPDATE;
        msg.questions.push(Question::new("example.org.", TYPE_PTR));
        assert_eq!(Message::decode(&msg.encode()).unwrap().opcode, OPCODE_UPDATE);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        assert_eq!(
            Message::decode(&[0; 11]),
            Err(Error::InvalidMessageSize(11))
        );
    }

    #[test]
    fn test_tcp_framing() {
        let mut msg = Message::new(MessageType::Query);
        msg.id = 0x0102;
        msg.questions.push(Question::new("host.local.", TYPE_PTR));

        let framed = msg.encode_tcp();
        let datagram = msg.encode();
        assert_eq!(framed.len(), datagram.len() + 2);
        assert_eq!(&framed[..2], (datagram.len() as u16).to_be_bytes());
        assert_eq!(Message::decode_tcp(&framed).unwrap(), msg);

        // Trailing bytes beyond the declared length are ignored.
        let mut padded = framed.clone();
        padded.extend([0xAA, 0xBB]);
        assert_eq!(Message::decode_tcp(&padded).unwrap(), msg);

        assert_eq!(
            Message::decode_tcp(&framed[..1]),
            Err(Error::InvalidMessageSize(1))
        );
    }

    #[test]
    fn test_z_bits_are_ignored_on_read() {
        let mut msg = Message::new(MessageType::Response);
        msg.id = 7;
        let mut bytes = msg.encode();
        bytes[3] |= 0b0111_0000; // set the reserved Z bits
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }
}
