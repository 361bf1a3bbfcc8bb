//! Byte-level packet primitives.
//!
//! [`MsgReader`] is a bounds-checked cursor over an incoming message;
//! [`OutPacket`] is the growable buffer an outgoing message is built into,
//! with RFC 1035 section 4.1.4 name compression.

use crate::{Error, Result};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str;

/// Name pointers tag their first byte with both high bits set. Lengths
/// with exactly one of these bits set (0x40, 0x80) are reserved.
const POINTER_TAG: u8 = 0xC0;
const POINTER_MASK: u16 = 0xC000;

/// The largest wire offset a 14-bit name pointer can refer to.
const POINTER_LIMIT: usize = 0x3FFF;

/// A read cursor over one whole message.
///
/// All multi-byte reads are big-endian, and every read is bounds-checked
/// so that untrusted packets cannot run the cursor past the buffer.
pub(crate) struct MsgReader<'a> {
    data: &'a [u8],
    pub(crate) offset: usize,
}

impl<'a> MsgReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        match self.data.get(self.offset) {
            Some(&byte) => {
                self.offset += 1;
                Ok(byte)
            }
            None => Err(Error::InvalidIntegerSize(self.offset)),
        }
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let end = self.offset + 2;
        if end > self.data.len() {
            return Err(Error::InvalidIntegerSize(self.offset));
        }
        let num = u16_from_be_slice(&self.data[self.offset..end]);
        self.offset = end;
        Ok(num)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let end = self.offset + 4;
        if end > self.data.len() {
            return Err(Error::InvalidIntegerSize(self.offset));
        }
        let num = u32_from_be_slice(&self.data[self.offset..end]);
        self.offset = end;
        Ok(num)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|num| num as i32)
    }

    /// Reads `length` RDATA bytes. A declared length that runs past the
    /// buffer means the record lied about its size.
    pub(crate) fn read_vec(&mut self, length: usize) -> Result<Vec<u8>> {
        let end = self.offset + length;
        match self.data.get(self.offset..end) {
            Some(slice) => {
                self.offset = end;
                Ok(slice.to_vec())
            }
            None => Err(Error::InvalidDataSize(self.data.len())),
        }
    }

    pub(crate) fn read_ipv4(&mut self) -> Result<Ipv4Addr> {
        let end = self.offset + 4;
        let bytes: [u8; 4] = self
            .data
            .get(self.offset..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| Error::InvalidIPAddress(self.data.len() - self.offset))?;
        self.offset = end;
        Ok(Ipv4Addr::from(bytes))
    }

    pub(crate) fn read_ipv6(&mut self) -> Result<Ipv6Addr> {
        let end = self.offset + 16;
        let bytes: [u8; 16] = self
            .data
            .get(self.offset..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| Error::InvalidIPAddress(self.data.len() - self.offset))?;
        self.offset = end;
        Ok(Ipv6Addr::from(bytes))
    }

    /// Reads one DNS character-string: a length byte followed by that
    /// many bytes of UTF-8 text.
    pub(crate) fn read_char_string(&mut self) -> Result<String> {
        let length = self.read_u8()?;
        let bytes = self.read_vec(length as usize)?;
        let text = str::from_utf8(&bytes).map_err(Error::UnicodeDecodingError)?;
        Ok(text.to_string())
    }

    /// Reads a domain name at the current cursor.
    ///
    /// See RFC 1035 section 3.1 for the label encoding and section 4.1.4
    /// for message compression. A pointer must aim strictly backward, and
    /// a chain of pointers must keep moving backward; together with the
    /// bounds checks this caps the walk at one pass over the buffer.
    pub(crate) fn read_name(&mut self) -> Result<String> {
        let data = self.data;
        let mut offset = self.offset;
        let mut name = String::new();
        let mut at_end = false;
        let mut last_jump: Option<usize> = None;

        loop {
            let length = match data.get(offset) {
                Some(&byte) => byte,
                None => return Err(Error::InvalidLabelOffset(offset)),
            };

            // A domain name is terminated by a length byte of zero.
            if length == 0 {
                if !at_end {
                    self.offset = offset + 1;
                }
                break;
            }

            match length & POINTER_TAG {
                0x00 => {
                    let start = offset + 1;
                    let end = start + length as usize;
                    let label = match data.get(start..end) {
                        Some(bytes) => {
                            str::from_utf8(bytes).map_err(Error::UnicodeDecodingError)?
                        }
                        None => return Err(Error::InvalidLabelSize(length)),
                    };
                    name += label;
                    name.push('.');
                    offset = end;
                }
                POINTER_TAG => {
                    if offset + 2 > data.len() {
                        return Err(Error::InvalidLabelSize(length));
                    }
                    let pointer =
                        (u16_from_be_slice(&data[offset..offset + 2]) & !POINTER_MASK) as usize;
                    if pointer >= last_jump.unwrap_or(offset) {
                        return Err(Error::InvalidLabelOffset(pointer));
                    }
                    last_jump = Some(pointer);

                    // The outer cursor moves past the 2 pointer bytes
                    // only, not past the pointed-to region.
                    if !at_end {
                        self.offset = offset + 2;
                        at_end = true;
                    }
                    offset = pointer;
                }
                _ => return Err(Error::InvalidLabelSize(length)),
            }
        }

        Ok(name)
    }
}

/// Reads one domain name out of `data` starting at `*offset`, advancing
/// `offset` past the bytes consumed in place (for a compressed name that
/// is the 2-byte pointer, not the pointed-to region).
///
/// `data` must be the whole message: compression pointers count their
/// offsets from the start of the message. This is exposed so responders
/// can pull a name out of a packet without decoding the full message.
pub fn deserialize_name(data: &[u8], offset: &mut usize) -> Result<String> {
    let mut reader = MsgReader {
        data,
        offset: *offset,
    };
    let name = reader.read_name()?;
    *offset = reader.offset;
    Ok(name)
}

/// An outgoing message buffer.
///
/// Bytes are kept as a list of chunks so length fields can be inserted in
/// front of data that is already written; `size` tracks the running byte
/// total and doubles as the wire offset memoized for name compression.
/// `size` starts at 12 because the message header is inserted in front of
/// the sections once they are complete.
pub struct OutPacket {
    data: Vec<Vec<u8>>,
    size: usize,
    names: HashMap<String, u16>, // k: name, v: wire offset
}

impl OutPacket {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            size: 12,
            names: HashMap::new(),
        }
    }

    /// The byte size of the packet written so far, header included.
    pub fn size(&self) -> usize {
        self.size
    }

    // Write name to packet
    //
    // [RFC1035]
    // 4.1.4. Message compression
    //
    // In order to reduce the size of messages, the domain system utilizes a
    // compression scheme which eliminates the repetition of domain names in
    // a message. In this scheme, an entire domain name or a list of labels
    // at the end of a domain name is replaced with a pointer to a prior
    // occurrence of the same name.
    // The pointer takes the form of a two octet sequence:
    //     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    //     | 1  1|                OFFSET                   |
    //     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // The OFFSET field specifies an offset from the start of the message
    // (i.e., the first octet of the ID field in the domain header).
    pub fn write_name(&mut self, name: &str) {
        // A prior occurrence of this exact name compresses to a pointer.
        if let Some(&offset) = self.names.get(name) {
            self.write_short(POINTER_MASK | offset);
            return;
        }

        // Remember where this name starts so later names can point to it.
        // Pointers are 14-bit, so anything past that limit is written in
        // full but cannot be referred back to.
        if self.size <= POINTER_LIMIT {
            self.names.insert(name.to_string(), self.size as u16);
        }

        let mut labels = name.split('.').filter(|label| !label.is_empty());
        let first = match labels.next() {
            Some(label) => label,
            None => {
                // The root name is a lone zero byte.
                self.write_byte(0);
                return;
            }
        };
        self.write_utf8(first);

        // The remaining labels form a suffix that may itself be
        // memoized or compressed.
        let rest = labels.collect::<Vec<_>>().join(".");
        if rest.is_empty() {
            self.write_byte(0);
        } else {
            self.write_name(&rest);
        }
    }

    /// Writes an RDATA body through `write_body`, then inserts its
    /// RDLENGTH in front. The length cannot be known up front: name
    /// compression inside the body changes it. `size` is bumped over the
    /// not-yet-inserted length field so offsets memoized inside the body
    /// land on their final positions.
    pub(crate) fn write_rdata(&mut self, write_body: impl FnOnce(&mut Self)) {
        let index = self.data.len();
        self.size += 2;
        write_body(self);
        self.size -= 2;

        let length: usize = self.data[index..].iter().map(|chunk| chunk.len()).sum();
        self.insert_short(index, length as u16);
    }

    pub(crate) fn insert_short(&mut self, index: usize, value: u16) {
        self.data.insert(index, value.to_be_bytes().to_vec());
        self.size += 2;
    }

    /// Writes one label: a length byte followed by the label bytes.
    fn write_utf8(&mut self, utf: &str) {
        assert!(utf.len() < 64);
        self.write_byte(utf.len() as u8);
        self.write_bytes(utf.as_bytes());
    }

    /// Writes one DNS character-string (length byte plus text).
    pub(crate) fn write_char_string(&mut self, text: &str) {
        assert!(text.len() <= 255);
        self.write_byte(text.len() as u8);
        self.write_bytes(text.as_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.push(bytes.to_vec());
        self.size += bytes.len();
    }

    pub fn write_u32(&mut self, int: u32) {
        self.data.push(int.to_be_bytes().to_vec());
        self.size += 4;
    }

    pub fn write_i32(&mut self, int: i32) {
        self.data.push(int.to_be_bytes().to_vec());
        self.size += 4;
    }

    pub fn write_short(&mut self, short: u16) {
        self.data.push(short.to_be_bytes().to_vec());
        self.size += 2;
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.data.push(vec![byte]);
        self.size += 1;
    }

    /// Concatenates the chunks into the final wire bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data.concat()
    }
}

impl Default for OutPacket {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn u16_from_be_slice(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn u32_from_be_slice(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::{deserialize_name, MsgReader, OutPacket};
    use crate::Error;

    // Encodes names the way they sit inside a message: 12 header bytes
    // in front, matching OutPacket's offset accounting.
    fn packet_with_names(names: &[&str]) -> Vec<u8> {
        let mut packet = OutPacket::new();
        for name in names {
            packet.write_name(name);
        }
        let mut bytes = vec![0u8; 12];
        bytes.extend(packet.into_bytes());
        bytes
    }

    #[test]
    fn name_roundtrip() {
        let bytes = packet_with_names(&["_airplay._tcp.local."]);
        let mut offset = 12;
        let name = deserialize_name(&bytes, &mut offset).unwrap();
        assert_eq!(name, "_airplay._tcp.local.");
        assert_eq!(offset, bytes.len());
    }

    #[test]
    fn repeated_name_compresses_to_a_pointer() {
        let bytes = packet_with_names(&["example.local.", "example.local."]);
        // First copy: 1+7 + 1+5 + 1 = 15 bytes, second copy: 2 bytes.
        assert_eq!(bytes.len(), 12 + 15 + 2);
        assert_eq!(&bytes[27..], &[0xC0, 12]);

        let mut offset = 27;
        let name = deserialize_name(&bytes, &mut offset).unwrap();
        assert_eq!(name, "example.local.");
        assert_eq!(offset, 29);
    }

    #[test]
    fn shared_suffix_compresses() {
        let bytes = packet_with_names(&["a.example.local.", "b.example.local."]);
        // Second name: 1+1 for "b" plus a 2-byte pointer to "example.local".
        assert_eq!(bytes.len(), 12 + 17 + 4);

        let mut offset = 12 + 17;
        let name = deserialize_name(&bytes, &mut offset).unwrap();
        assert_eq!(name, "b.example.local.");
    }

    #[test]
    fn root_name_is_a_lone_zero_byte() {
        let bytes = packet_with_names(&[""]);
        assert_eq!(&bytes[12..], &[0]);

        let mut offset = 12;
        assert_eq!(deserialize_name(&bytes, &mut offset).unwrap(), "");
        assert_eq!(offset, 13);
    }

    #[test]
    fn reserved_length_bits_are_rejected() {
        let mut bytes = packet_with_names(&["test-name.local."]);
        // 0b1000_0000 has exactly one of the two pointer bits set.
        bytes[12] |= 0b1000_0000;
        let mut offset = 12;
        let err = deserialize_name(&bytes, &mut offset).unwrap_err();
        assert!(matches!(err, Error::InvalidLabelSize(_)));
    }

    #[test]
    fn forward_pointer_is_rejected() {
        let mut bytes = vec![0u8; 12];
        bytes.extend([0xC0, 32]); // points past itself
        let mut offset = 12;
        assert_eq!(
            deserialize_name(&bytes, &mut offset),
            Err(Error::InvalidLabelOffset(32))
        );
    }

    #[test]
    fn self_pointer_is_rejected() {
        let mut bytes = vec![0u8; 12];
        bytes.extend([0xC0, 12]);
        let mut offset = 12;
        assert_eq!(
            deserialize_name(&bytes, &mut offset),
            Err(Error::InvalidLabelOffset(12))
        );
    }

    #[test]
    fn pointer_chain_must_keep_moving_backward() {
        // Offset 12: label "abc", offset 16: pointer back to 12. Walking
        // from 12 would loop 12 -> 16 -> 12 forever if chains were
        // allowed to revisit their own starting point.
        let mut bytes = vec![0u8; 12];
        bytes.extend([3, b'a', b'b', b'c', 0xC0, 12]);
        let mut offset = 16;
        assert_eq!(
            deserialize_name(&bytes, &mut offset),
            Err(Error::InvalidLabelOffset(12))
        );
    }

    #[test]
    fn truncated_label_is_rejected() {
        let mut bytes = vec![0u8; 12];
        bytes.extend([7, b'a', b'b']); // claims 7 bytes, has 2
        let mut offset = 12;
        assert_eq!(
            deserialize_name(&bytes, &mut offset),
            Err(Error::InvalidLabelSize(7))
        );
    }

    #[test]
    fn label_bytes_must_be_utf8() {
        let mut bytes = vec![0u8; 12];
        bytes.extend([2, 0xFF, 0xFE, 0]);
        let mut offset = 12;
        assert!(matches!(
            deserialize_name(&bytes, &mut offset),
            Err(Error::UnicodeDecodingError(_))
        ));
    }

    #[test]
    fn integer_reads_are_bounds_checked() {
        let mut reader = MsgReader::new(&[0x12]);
        assert_eq!(reader.read_u16(), Err(Error::InvalidIntegerSize(0)));

        let mut reader = MsgReader::new(&[0x12, 0x34, 0x56]);
        assert_eq!(reader.read_u16(), Ok(0x1234));
        assert_eq!(reader.read_u32(), Err(Error::InvalidIntegerSize(2)));
    }
}
