//! Questions and typed resource records.
//!
//! Every record is one [`ResourceRecord`]: the common fields shared by all
//! RR types plus a [`RecordData`] body holding the type-specific RDATA.
//! Types this library does not interpret keep their RDATA verbatim in
//! [`RecordData::Other`] and re-emit it unchanged.

#[cfg(feature = "logging")]
use crate::log::debug;
use crate::packet::{MsgReader, OutPacket};
use crate::txt::{IntoTxtProperties, TxtProperties};
use crate::{Error, Result};
use std::net::{Ipv4Addr, Ipv6Addr};

pub const TYPE_A: u16 = 1; // IPv4 address
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_SOA: u16 = 6;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_HINFO: u16 = 13;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28; // IPv6 address
pub const TYPE_SRV: u16 = 33;
pub const TYPE_ANY: u16 = 255;

pub const CLASS_IN: u16 = 1;
/// The low 15 bits of the class field carry the class value.
pub const CLASS_MASK: u16 = 0x7FFF;
/// The high bit of the class field: mDNS "cache flush" on records,
/// "unicast response requested" on questions.
pub const CLASS_UNIQUE: u16 = 0x8000;

/// A DNS question entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub ty: u16,
    /// mDNS "unicast response requested" bit.
    pub unique: bool,
    pub class: u16,
}

impl Question {
    /// A question for `name` with class IN.
    pub fn new(name: &str, ty: u16) -> Self {
        Self {
            name: name.to_string(),
            ty,
            unique: false,
            class: CLASS_IN,
        }
    }

    pub(crate) fn read(reader: &mut MsgReader<'_>) -> Result<Self> {
        let name = reader.read_name()?;
        let ty = reader.read_u16()?;
        let class = reader.read_u16()?;
        Ok(Self {
            name,
            ty,
            unique: (class & CLASS_UNIQUE) != 0,
            class: class & CLASS_MASK,
        })
    }

    pub(crate) fn write(&self, packet: &mut OutPacket) {
        packet.write_name(&self.name);
        packet.write_short(self.ty);
        if self.unique {
            packet.write_short(self.class | CLASS_UNIQUE);
        } else {
            packet.write_short(self.class);
        }
    }
}

/// SOA RDATA fields (RFC 1035 section 3.3.13).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Soa {
    /// The primary name server for the zone.
    pub mname: String,
    /// The mailbox of the person responsible for the zone.
    pub rname: String,
    pub serial: u32,
    pub refresh: i32,
    pub retry: i32,
    pub expire: i32,
    pub minimum: u32,
}

/// RDATA bodies, one variant per interpreted record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordData {
    /// An IPv4 host address.
    A(Ipv4Addr),
    /// An IPv6 host address.
    Aaaa(Ipv6Addr),
    /// The canonical name of an alias.
    Cname(String),
    /// Start of a zone of authority.
    Soa(Soa),
    /// A domain name pointer, e.g. a DNS-SD service instance.
    Ptr(String),
    /// Host information: CPU and OS character-strings.
    Hinfo { cpu: String, os: String },
    /// Key/value properties and free-form strings.
    Txt(TxtProperties),
    /// Service location.
    Srv {
        /// Lower number means higher priority. Should be 0 in common cases.
        priority: u16,
        /// Should be 0 in common cases.
        weight: u16,
        port: u16,
        /// The host providing the service.
        host: String,
    },
    /// RDATA of a type this library does not interpret, kept verbatim.
    Other { ty: u16, data: Vec<u8> },
}

impl RecordData {
    /// The wire RR type of this body.
    pub fn ty(&self) -> u16 {
        match self {
            RecordData::A(_) => TYPE_A,
            RecordData::Aaaa(_) => TYPE_AAAA,
            RecordData::Cname(_) => TYPE_CNAME,
            RecordData::Soa(_) => TYPE_SOA,
            RecordData::Ptr(_) => TYPE_PTR,
            RecordData::Hinfo { .. } => TYPE_HINFO,
            RecordData::Txt(_) => TYPE_TXT,
            RecordData::Srv { .. } => TYPE_SRV,
            RecordData::Other { ty, .. } => *ty,
        }
    }
}

/// A DNS resource record: the fields every RR shares, plus the typed body.
/// RFC: <https://www.rfc-editor.org/rfc/rfc1035#section-3.2.1>
///      <https://www.rfc-editor.org/rfc/rfc1035#section-4.1.3>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    /// mDNS cache-flush bit.
    pub unique: bool,
    pub class: u16,
    /// Time to live, in seconds.
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    /// A record with class IN and the cache-flush bit clear.
    pub fn new(name: &str, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.to_string(),
            unique: false,
            class: CLASS_IN,
            ttl,
            data,
        }
    }

    pub fn with_class(mut self, class: u16) -> Self {
        self.class = class & CLASS_MASK;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// The wire RR type of this record.
    pub fn ty(&self) -> u16 {
        self.data.ty()
    }

    pub fn a(name: &str, ttl: u32, address: Ipv4Addr) -> Self {
        Self::new(name, ttl, RecordData::A(address))
    }

    pub fn aaaa(name: &str, ttl: u32, address: Ipv6Addr) -> Self {
        Self::new(name, ttl, RecordData::Aaaa(address))
    }

    pub fn cname(name: &str, ttl: u32, alias: &str) -> Self {
        Self::new(name, ttl, RecordData::Cname(alias.to_string()))
    }

    pub fn soa(name: &str, ttl: u32, soa: Soa) -> Self {
        Self::new(name, ttl, RecordData::Soa(soa))
    }

    pub fn ptr(name: &str, ttl: u32, alias: &str) -> Self {
        Self::new(name, ttl, RecordData::Ptr(alias.to_string()))
    }

    pub fn hinfo(name: &str, ttl: u32, cpu: &str, os: &str) -> Self {
        Self::new(
            name,
            ttl,
            RecordData::Hinfo {
                cpu: cpu.to_string(),
                os: os.to_string(),
            },
        )
    }

    pub fn txt(name: &str, ttl: u32, properties: impl IntoTxtProperties) -> Self {
        Self::new(name, ttl, RecordData::Txt(properties.into_txt_properties()))
    }

    pub fn srv(name: &str, ttl: u32, priority: u16, weight: u16, port: u16, host: &str) -> Self {
        Self::new(
            name,
            ttl,
            RecordData::Srv {
                priority,
                weight,
                port,
                host: host.to_string(),
            },
        )
    }

    pub fn opaque(name: &str, ttl: u32, ty: u16, data: Vec<u8>) -> Self {
        Self::new(name, ttl, RecordData::Other { ty, data })
    }

    // RFC 1035: https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.1
    //
    // All RRs have the same top level format shown below:
    //         1  1  1  1  1  1
    // 0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // |                                               |
    // /                      NAME                     /
    // |                                               |
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // |                      TYPE                     |
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // |                     CLASS                     |
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // |                      TTL                      |
    // |                                               |
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    // |                   RDLENGTH                    |
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
    // /                     RDATA                     /
    // /                                               /
    // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    pub(crate) fn read(reader: &mut MsgReader<'_>) -> Result<Self> {
        let name = reader.read_name()?;
        let ty = reader.read_u16()?;
        let class = reader.read_u16()?;
        let ttl = reader.read_u32()?;
        let length = reader.read_u16()? as usize;
        let next_offset = reader.offset + length;

        // Decode RDATA based on the record type.
        let data = match ty {
            TYPE_A => {
                if length != 4 {
                    return Err(Error::InvalidIPAddress(length));
                }
                RecordData::A(reader.read_ipv4()?)
            }
            TYPE_AAAA => {
                if length != 16 {
                    return Err(Error::InvalidIPAddress(length));
                }
                RecordData::Aaaa(reader.read_ipv6()?)
            }
            TYPE_CNAME => RecordData::Cname(reader.read_name()?),
            TYPE_PTR => RecordData::Ptr(reader.read_name()?),
            TYPE_SOA => RecordData::Soa(Soa {
                mname: reader.read_name()?,
                rname: reader.read_name()?,
                serial: reader.read_u32()?,
                refresh: reader.read_i32()?,
                retry: reader.read_i32()?,
                expire: reader.read_i32()?,
                minimum: reader.read_u32()?,
            }),
            TYPE_HINFO => RecordData::Hinfo {
                cpu: reader.read_char_string()?,
                os: reader.read_char_string()?,
            },
            TYPE_TXT => RecordData::Txt(TxtProperties::from_bytes(&reader.read_vec(length)?)),
            TYPE_SRV => RecordData::Srv {
                priority: reader.read_u16()?,
                weight: reader.read_u16()?,
                port: reader.read_u16()?,
                host: reader.read_name()?,
            },
            _ => {
                debug!("record type {} kept as opaque RDATA", ty);
                RecordData::Other {
                    ty,
                    data: reader.read_vec(length)?,
                }
            }
        };

        // Each record must land exactly on the next record boundary.
        if reader.offset != next_offset {
            return Err(Error::InvalidDataSize(reader.offset));
        }

        Ok(Self {
            name,
            unique: (class & CLASS_UNIQUE) != 0,
            class: class & CLASS_MASK,
            ttl,
            data,
        })
    }

    pub(crate) fn write(&self, packet: &mut OutPacket) {
        packet.write_name(&self.name);
        packet.write_short(self.ty());
        if self.unique {
            packet.write_short(self.class | CLASS_UNIQUE);
        } else {
            packet.write_short(self.class);
        }
        packet.write_u32(self.ttl);

        packet.write_rdata(|packet| match &self.data {
            RecordData::A(address) => packet.write_bytes(address.octets().as_ref()),
            RecordData::Aaaa(address) => packet.write_bytes(address.octets().as_ref()),
            RecordData::Cname(alias) | RecordData::Ptr(alias) => packet.write_name(alias),
            RecordData::Soa(soa) => {
                packet.write_name(&soa.mname);
                packet.write_name(&soa.rname);
                packet.write_u32(soa.serial);
                packet.write_i32(soa.refresh);
                packet.write_i32(soa.retry);
                packet.write_i32(soa.expire);
                packet.write_u32(soa.minimum);
            }
            RecordData::Hinfo { cpu, os } => {
                packet.write_char_string(cpu);
                packet.write_char_string(os);
            }
            RecordData::Txt(properties) => packet.write_bytes(&properties.to_bytes()),
            RecordData::Srv {
                priority,
                weight,
                port,
                host,
            } => {
                packet.write_short(*priority);
                packet.write_short(*weight);
                packet.write_short(*port);
                packet.write_name(host);
            }
            RecordData::Other { data, .. } => packet.write_bytes(data),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordData, ResourceRecord, CLASS_IN, TYPE_AAAA, TYPE_SRV, TYPE_TXT};

    #[test]
    fn test_type_codes() {
        let srv = ResourceRecord::srv("x._airplay._tcp.local.", 120, 0, 0, 7000, "x.local.");
        assert_eq!(srv.ty(), TYPE_SRV);

        let aaaa = ResourceRecord::aaaa("x.local.", 120, "fe80::1".parse().unwrap());
        assert_eq!(aaaa.ty(), TYPE_AAAA);

        let txt = ResourceRecord::txt("x.local.", 4500, &[("a", "b")][..]);
        assert_eq!(txt.ty(), TYPE_TXT);

        let opaque = ResourceRecord::opaque("x.local.", 60, 0x1234, vec![1, 2]);
        assert_eq!(opaque.ty(), 0x1234);
    }

    #[test]
    fn test_constructor_defaults() {
        let record = ResourceRecord::a("host.local.", 120, "10.0.1.2".parse().unwrap());
        assert_eq!(record.class, CLASS_IN);
        assert!(!record.unique);

        let record = record.with_unique(true);
        assert!(record.unique);
        assert!(matches!(record.data, RecordData::A(_)));
    }
}
