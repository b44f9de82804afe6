//! Flash parameter storage implementation
//!
//! This module provides Flash-backed block persistence with redundant
//! block rotation for wear leveling.

use heapless::Vec;

use super::block::{BlockHeader, Record, MAX_RECORDS};
use super::crc::{calculate_crc32, crc32_digest};
use crate::platform::{FlashError, FlashInterface, Result};

/// Size of one parameter block (two 4 KB sectors)
pub const PARAM_BLOCK_SIZE: u32 = 0x2000;

/// Flash block addresses for parameter storage
///
/// Uses 4 blocks (32 KB total) with round-robin rotation for 4x wear leveling.
pub const PARAM_BLOCK_ADDRESSES: [u32; 4] = [
    0x040000, // Block 0: 256 KB offset
    0x042000, // Block 1: 264 KB offset
    0x044000, // Block 2: 272 KB offset
    0x046000, // Block 3: 280 KB offset
];

/// Size of CRC32 field (4 bytes)
const CRC_SIZE: usize = 4;

/// Number of Flash blocks for parameter storage
pub const NUM_BLOCKS: usize = PARAM_BLOCK_ADDRESSES.len();

/// Largest serialized block without its CRC
const IMAGE_SIZE: usize = BlockHeader::SIZE + MAX_RECORDS * Record::SIZE;

const _: () = assert!(IMAGE_SIZE + CRC_SIZE <= PARAM_BLOCK_SIZE as usize);

/// Records read back from one block
pub type Records = Vec<Record, MAX_RECORDS>;

/// Storage statistics for wear leveling monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of block writes
    pub total_saves: u32,
    /// Block most recently written, 0-3
    pub active_block: Option<u8>,
    /// Erase count per block
    pub erase_counts: [u32; NUM_BLOCKS],
}

/// Block-level access to the parameter region
///
/// Manages parameter persistence to Flash with:
/// - Redundant block rotation (4 blocks)
/// - CRC32 validation
/// - Sequence number tracking (newest block selection)
pub struct BlockStorage<F: FlashInterface> {
    flash: F,
    stats: StorageStats,
}

impl<F: FlashInterface> BlockStorage<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            stats: StorageStats {
                total_saves: 0,
                active_block: None,
                erase_counts: [0; NUM_BLOCKS],
            },
        }
    }

    /// Erase block `block_id` and write `records` into it
    ///
    /// # Errors
    ///
    /// - `InvalidAddress` if the block ID is out of range
    /// - `WriteFailed` if there are more than [`MAX_RECORDS`] records
    /// - any Flash erase/write failure
    pub fn write_block(
        &mut self,
        block_id: u8,
        records: &[Record],
        sequence: u16,
        build: f32,
    ) -> Result<()> {
        let address = block_address(block_id)?;
        if records.len() > MAX_RECORDS {
            return Err(FlashError::WriteFailed.into());
        }

        self.flash.erase(address, PARAM_BLOCK_SIZE)?;

        let header = BlockHeader::new(sequence, records.len() as u16, build);
        let mut image = Vec::<u8, IMAGE_SIZE>::new();
        image
            .extend_from_slice(&header.to_bytes())
            .map_err(|_| FlashError::WriteFailed)?;
        for record in records {
            image
                .extend_from_slice(&record.to_bytes())
                .map_err(|_| FlashError::WriteFailed)?;
        }
        let crc = calculate_crc32(&image);

        self.flash.write(address, &image)?;
        self.flash
            .write(address + image.len() as u32, &crc.to_le_bytes())?;

        self.stats.total_saves += 1;
        self.stats.active_block = Some(block_id);
        self.stats.erase_counts[block_id as usize] += 1;

        Ok(())
    }

    /// Read block `block_id`
    ///
    /// Returns the header, the records and whether the CRC matched.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for an out-of-range block, `ReadFailed` when the
    /// block holds no valid header.
    pub fn read_block(&mut self, block_id: u8) -> Result<(BlockHeader, Records, bool)> {
        let address = block_address(block_id)?;

        let mut header_buf = [0u8; BlockHeader::SIZE];
        self.flash.read(address, &mut header_buf)?;
        let header = BlockHeader::from_bytes(&header_buf).ok_or(FlashError::ReadFailed)?;
        if !header.is_valid() {
            return Err(FlashError::ReadFailed.into());
        }

        let mut digest = crc32_digest();
        digest.update(&header_buf);

        let mut records = Records::new();
        let mut offset = address + BlockHeader::SIZE as u32;
        let mut record_buf = [0u8; Record::SIZE];
        for _ in 0..header.count {
            self.flash.read(offset, &mut record_buf)?;
            digest.update(&record_buf);
            let record = Record::from_bytes(&record_buf).ok_or(FlashError::ReadFailed)?;
            records.push(record).map_err(|_| FlashError::ReadFailed)?;
            offset += Record::SIZE as u32;
        }

        let mut crc_buf = [0u8; CRC_SIZE];
        self.flash.read(offset, &mut crc_buf)?;
        let valid = digest.finalize() == u32::from_le_bytes(crc_buf);

        Ok((header, records, valid))
    }

    /// Find the newest valid block
    ///
    /// Scans all blocks and returns the one with the newest sequence number
    /// and a valid CRC, skipping corrupted blocks. Sequence comparison
    /// tolerates wrap-around.
    pub fn find_active_block(&mut self) -> Option<(u8, BlockHeader)> {
        let mut newest: Option<(u8, BlockHeader)> = None;
        for block_id in 0..NUM_BLOCKS as u8 {
            let Ok((header, _, true)) = self.read_block(block_id) else {
                continue;
            };
            let replace = match newest {
                Some((_, best)) => is_newer(header.sequence, best.sequence),
                None => true,
            };
            if replace {
                newest = Some((block_id, header));
            }
        }
        newest
    }

    /// Next block in round-robin order
    pub fn choose_next_block(&self, current_block: u8) -> u8 {
        (current_block + 1) % NUM_BLOCKS as u8
    }

    /// Increment sequence number, wrapping to 0 at u16::MAX
    pub fn increment_sequence(&self, current: u16) -> u16 {
        current.wrapping_add(1)
    }

    pub fn get_stats(&self) -> StorageStats {
        self.stats
    }

    /// Flash interface reference (for testing)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }
}

fn block_address(block_id: u8) -> Result<u32> {
    PARAM_BLOCK_ADDRESSES
        .get(block_id as usize)
        .copied()
        .ok_or_else(|| FlashError::InvalidAddress.into())
}

/// True when sequence `a` was written after `b`
fn is_newer(a: u16, b: u16) -> bool {
    a != b && a.wrapping_sub(b) < 0x8000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;
    use gantry_core::NvValue;

    fn records(values: &[(u16, f32)]) -> Records {
        values
            .iter()
            .map(|&(slot, v)| Record::from_value(slot, "xvm", &NvValue::Float(v)).unwrap())
            .collect()
    }

    #[test]
    fn test_write_and_read_block() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let written = records(&[(3, 16000.0), (4, 1.5)]);

        storage.write_block(0, &written, 1, 101.04).unwrap();

        let (header, read, valid) = storage.read_block(0).unwrap();
        assert!(valid);
        assert_eq!(header.sequence, 1);
        assert_eq!(header.count, 2);
        assert!(header.matches_build(101.04));
        assert_eq!(read, written);
    }

    #[test]
    fn test_full_block_fits() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let written: Records = (0..MAX_RECORDS as u16)
            .map(|slot| Record::from_value(slot, "x", &NvValue::Int(slot as i64)).unwrap())
            .collect();

        storage.write_block(3, &written, 9, 1.0).unwrap();

        let (_, read, valid) = storage.read_block(3).unwrap();
        assert!(valid);
        assert_eq!(read.len(), MAX_RECORDS);
    }

    #[test]
    fn test_crc_validation() {
        let mut storage = BlockStorage::new(MockFlash::new());
        storage.write_block(0, &records(&[(0, 1.0)]), 1, 1.0).unwrap();

        storage
            .flash_mut()
            .inject_corruption(PARAM_BLOCK_ADDRESSES[0] + BlockHeader::SIZE as u32 + 8, 4);

        let (_, _, valid) = storage.read_block(0).unwrap();
        assert!(!valid);
    }

    #[test]
    fn test_erased_block_unreadable() {
        let mut storage = BlockStorage::new(MockFlash::new());
        assert!(storage.read_block(2).is_err());
    }

    #[test]
    fn test_invalid_block_id() {
        let mut storage = BlockStorage::new(MockFlash::new());
        assert!(storage.write_block(4, &[], 0, 1.0).is_err());
        assert!(storage.read_block(4).is_err());
    }

    #[test]
    fn test_find_active_block() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let data = records(&[(0, 1.0)]);

        assert!(storage.find_active_block().is_none());

        storage.write_block(0, &data, 1, 1.0).unwrap();
        storage.write_block(1, &data, 3, 1.0).unwrap();
        storage.write_block(2, &data, 2, 1.0).unwrap();

        let (block, header) = storage.find_active_block().unwrap();
        assert_eq!(block, 1);
        assert_eq!(header.sequence, 3);
    }

    #[test]
    fn test_find_active_block_across_wrap() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let data = records(&[(0, 1.0)]);

        storage.write_block(0, &data, u16::MAX - 1, 1.0).unwrap();
        storage.write_block(1, &data, u16::MAX, 1.0).unwrap();
        storage.write_block(2, &data, 0, 1.0).unwrap();

        assert_eq!(storage.find_active_block().map(|(b, _)| b), Some(2));
    }

    #[test]
    fn test_corruption_recovery() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let data = records(&[(0, 1.0)]);

        storage.write_block(0, &data, 1, 1.0).unwrap();
        storage.write_block(1, &data, 3, 1.0).unwrap();
        storage.write_block(2, &data, 2, 1.0).unwrap();

        // corrupt the newest block
        storage
            .flash_mut()
            .inject_corruption(PARAM_BLOCK_ADDRESSES[1] + BlockHeader::SIZE as u32, 4);

        assert_eq!(storage.find_active_block().map(|(b, _)| b), Some(2));
    }

    #[test]
    fn test_all_blocks_corrupted() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let data = records(&[(0, 1.0)]);

        for block in 0..NUM_BLOCKS as u8 {
            storage.write_block(block, &data, block as u16 + 1, 1.0).unwrap();
        }
        for &addr in &PARAM_BLOCK_ADDRESSES {
            storage
                .flash_mut()
                .inject_corruption(addr + BlockHeader::SIZE as u32, 4);
        }

        assert!(storage.find_active_block().is_none());
    }

    #[test]
    fn test_block_rotation_and_sequence() {
        let storage = BlockStorage::new(MockFlash::new());

        assert_eq!(storage.choose_next_block(0), 1);
        assert_eq!(storage.choose_next_block(3), 0);
        assert_eq!(storage.increment_sequence(100), 101);
        assert_eq!(storage.increment_sequence(u16::MAX), 0);
    }

    #[test]
    fn test_statistics_tracking() {
        let mut storage = BlockStorage::new(MockFlash::new());
        let data = records(&[(0, 1.0)]);

        assert_eq!(storage.get_stats().total_saves, 0);
        assert_eq!(storage.get_stats().active_block, None);

        storage.write_block(0, &data, 1, 1.0).unwrap();
        storage.write_block(1, &data, 2, 1.0).unwrap();
        storage.write_block(0, &data, 3, 1.0).unwrap();

        let stats = storage.get_stats();
        assert_eq!(stats.total_saves, 3);
        assert_eq!(stats.active_block, Some(0));
        assert_eq!(stats.erase_counts, [2, 1, 0, 0]);
        // each block spans two sectors
        assert_eq!(storage.flash_mut().get_erase_count(PARAM_BLOCK_ADDRESSES[0] + 0x1000), 2);
    }
}
