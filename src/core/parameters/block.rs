//! Parameter block format for Flash storage
//!
//! Each block holds a header, one record per persisted registry slot and a
//! CRC32 over both. Records carry the raw backing value in canonical units.

use bitflags::bitflags;
use gantry_core::NvValue;

/// Parameter block magic number (ASCII "GNTR")
pub const BLOCK_MAGIC: u32 = u32::from_le_bytes(*b"GNTR");

/// Parameter block format version
pub const BLOCK_VERSION: u16 = 1;

/// Maximum number of records per block
pub const MAX_RECORDS: usize = 640;

/// Parameter block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct BlockHeader {
    /// Magic number ("GNTR")
    pub magic: u32,
    pub version: u16,
    /// Incremented on each write, wrapping
    pub sequence: u16,
    /// Number of records following the header
    pub count: u16,
    pub reserved: u16,
    /// Bits of the firmware build that wrote the block
    pub build: u32,
}

impl BlockHeader {
    /// Size of header in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();

    pub fn new(sequence: u16, count: u16, build: f32) -> Self {
        Self {
            magic: BLOCK_MAGIC,
            version: BLOCK_VERSION,
            sequence,
            count,
            reserved: 0,
            build: build.to_bits(),
        }
    }

    /// Serialize header to bytes (little-endian)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_le_bytes());
        buf[8..10].copy_from_slice(&self.count.to_le_bytes());
        buf[10..12].copy_from_slice(&self.reserved.to_le_bytes());
        buf[12..16].copy_from_slice(&self.build.to_le_bytes());
        buf
    }

    /// Deserialize header from bytes (little-endian)
    ///
    /// Returns None when the buffer is short or the magic does not match.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        let header = Self {
            magic: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            version: u16::from_le_bytes([buf[4], buf[5]]),
            sequence: u16::from_le_bytes([buf[6], buf[7]]),
            count: u16::from_le_bytes([buf[8], buf[9]]),
            reserved: u16::from_le_bytes([buf[10], buf[11]]),
            build: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        };
        (header.magic == BLOCK_MAGIC).then_some(header)
    }

    pub fn is_valid(&self) -> bool {
        self.magic == BLOCK_MAGIC
            && self.version == BLOCK_VERSION
            && self.count as usize <= MAX_RECORDS
    }

    /// True when the block was written by firmware build `build`
    pub fn matches_build(&self, build: f32) -> bool {
        self.build == build.to_bits()
    }
}

bitflags! {
    /// Record value type
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordFlags: u16 {
        /// f32 bits
        const FLOAT = 0b0001;
        /// Non-negative integer
        const UNSIGNED = 0b0010;
        /// Negative integer, i32 bits
        const SIGNED = 0b0100;
        /// Opaque 32-bit word
        const DATA = 0b1000;
    }
}

/// One persisted registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Record {
    /// Registry index the value was read from
    pub slot: u16,
    pub flags: RecordFlags,
    /// FNV-1a hash of the slot's token
    pub name_hash: u32,
    pub bits: u32,
}

impl Record {
    /// Size of record in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Record for `value` stored at `slot` under `token`
    ///
    /// Strings and parents have no persisted form.
    pub fn from_value(slot: u16, token: &str, value: &NvValue) -> Option<Self> {
        let (flags, bits) = match *value {
            NvValue::Float(v) => (RecordFlags::FLOAT, v.to_bits()),
            NvValue::Int(v) if v < 0 => (RecordFlags::SIGNED, i32::try_from(v).ok()? as u32),
            NvValue::Int(v) => (RecordFlags::UNSIGNED, u32::try_from(v).ok()?),
            NvValue::Data(v) => (RecordFlags::DATA, v),
            NvValue::Str(_) | NvValue::Null | NvValue::Parent => return None,
        };
        Some(Self {
            slot,
            flags,
            name_hash: hash_token(token),
            bits,
        })
    }

    /// Stored value in transport form
    pub fn value(&self) -> Option<NvValue> {
        if self.flags == RecordFlags::FLOAT {
            Some(NvValue::Float(f32::from_bits(self.bits)))
        } else if self.flags == RecordFlags::UNSIGNED {
            Some(NvValue::Int(self.bits as i64))
        } else if self.flags == RecordFlags::SIGNED {
            Some(NvValue::Int(self.bits as i32 as i64))
        } else if self.flags == RecordFlags::DATA {
            Some(NvValue::Data(self.bits))
        } else {
            None
        }
    }

    /// True when the record was written for `token`
    pub fn is_for(&self, token: &str) -> bool {
        self.name_hash == hash_token(token)
    }

    /// Serialize record to bytes (little-endian)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.slot.to_le_bytes());
        buf[2..4].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[4..8].copy_from_slice(&self.name_hash.to_le_bytes());
        buf[8..12].copy_from_slice(&self.bits.to_le_bytes());
        buf
    }

    /// Deserialize record from bytes (little-endian)
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            slot: u16::from_le_bytes([buf[0], buf[1]]),
            flags: RecordFlags::from_bits_truncate(u16::from_le_bytes([buf[2], buf[3]])),
            name_hash: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            bits: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

/// Calculate FNV-1a hash of a token
pub fn hash_token(name: &str) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 2166136261;
    const FNV_PRIME: u32 = 16777619;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in name.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_serialization() {
        let header = BlockHeader::new(42, 10, 101.04);
        let decoded = BlockHeader::from_bytes(&header.to_bytes()).unwrap();

        assert_eq!(header, decoded);
        assert!(decoded.is_valid());
        assert!(decoded.matches_build(101.04));
        assert!(!decoded.matches_build(101.05));
        assert_eq!(&header.to_bytes()[0..4], b"GNTR");
    }

    #[test]
    fn test_header_validation() {
        let mut header = BlockHeader::new(0, 0, 1.0);
        assert!(header.is_valid());

        header.version = BLOCK_VERSION + 1;
        assert!(!header.is_valid());

        header.version = BLOCK_VERSION;
        header.count = (MAX_RECORDS + 1) as u16;
        assert!(!header.is_valid());

        // erased flash has no magic
        assert!(BlockHeader::from_bytes(&[0xFF; BlockHeader::SIZE]).is_none());
    }

    #[test]
    fn test_record_value_kinds() {
        let cases = [
            NvValue::Float(-12.5),
            NvValue::Int(0),
            NvValue::Int(4_000_000_000),
            NvValue::Int(-1),
            NvValue::Data(0xDEAD_BEEF),
        ];
        for value in cases {
            let record = Record::from_value(7, "xvm", &value).unwrap();
            let decoded = Record::from_bytes(&record.to_bytes()).unwrap();
            assert_eq!(decoded.value(), Some(value));
            assert_eq!(decoded.slot, 7);
            assert!(decoded.is_for("xvm"));
            assert!(!decoded.is_for("yvm"));
        }
    }

    #[test]
    fn test_record_rejects_unstorable_values() {
        assert!(Record::from_value(0, "fbs", &NvValue::Null).is_none());
        assert!(Record::from_value(0, "x", &NvValue::Parent).is_none());
        assert!(Record::from_value(0, "big", &NvValue::Int(i64::MAX)).is_none());
    }

    #[test]
    fn test_hash_token() {
        assert_eq!(hash_token("xvm"), hash_token("xvm"));
        assert_ne!(hash_token("xvm"), hash_token("xjm"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(hash_token(""), 2166136261);
    }
}
