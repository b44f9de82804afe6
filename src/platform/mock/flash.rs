//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

extern crate std;

use std::vec;
use std::vec::Vec;

use crate::platform::{error::FlashError, traits::FlashInterface, Result};

/// Flash sector size (4 KB)
const SECTOR_SIZE: u32 = 4096;

/// Flash capacity (512 KB)
const FLASH_CAPACITY: u32 = 512 * 1024;

/// Protected firmware region (first 256 KB)
const FIRMWARE_SIZE: u32 = 0x40000;

/// Mock Flash implementation
///
/// Simulates NOR Flash in memory: erase sets bytes to 0xFF, writes only
/// clear bits, the firmware region is write-protected. Tests can inject
/// corruption and cut a write short to model power loss.
#[derive(Debug, Clone)]
pub struct MockFlash {
    storage: Vec<u8>,
    erase_counts: Vec<u32>,
    power_loss: bool,
}

impl MockFlash {
    /// Create a fully erased mock Flash
    pub fn new() -> Self {
        Self {
            storage: vec![0xFF; FLASH_CAPACITY as usize],
            erase_counts: vec![0; (FLASH_CAPACITY / SECTOR_SIZE) as usize],
            power_loss: false,
        }
    }

    /// Copy of `len` bytes at `address`
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        self.storage[address as usize..address as usize + len].to_vec()
    }

    /// Overwrite `len` bytes at `address` with a fixed pattern
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        for byte in &mut self.storage[address as usize..address as usize + len] {
            *byte ^= 0xAA;
        }
    }

    /// Times the sector containing `address` has been erased
    pub fn get_erase_count(&self, address: u32) -> u32 {
        self.erase_counts[(address / SECTOR_SIZE) as usize]
    }

    /// Erases across all sectors
    pub fn get_total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Make the next write stop halfway
    pub fn simulate_power_loss(&mut self) {
        self.power_loss = true;
    }

    fn is_writable(&self, address: u32, len: usize) -> bool {
        address >= FIRMWARE_SIZE && address as usize + len <= FLASH_CAPACITY as usize
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if address as usize + buf.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }
        let start = address as usize;
        buf.copy_from_slice(&self.storage[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.is_writable(address, data.len()) {
            return Err(FlashError::InvalidAddress.into());
        }

        let len = if self.power_loss {
            self.power_loss = false;
            data.len() / 2
        } else {
            data.len()
        };

        let start = address as usize;
        for (cell, byte) in self.storage[start..start + len].iter_mut().zip(data) {
            *cell &= *byte;
        }
        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.is_writable(address, size as usize)
            || !address.is_multiple_of(SECTOR_SIZE)
            || !size.is_multiple_of(SECTOR_SIZE)
        {
            return Err(FlashError::InvalidAddress.into());
        }

        let start = address as usize;
        self.storage[start..start + size as usize].fill(0xFF);

        let first = (address / SECTOR_SIZE) as usize;
        for count in &mut self.erase_counts[first..first + (size / SECTOR_SIZE) as usize] {
            *count += 1;
        }
        Ok(())
    }

    fn block_size(&self) -> u32 {
        SECTOR_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_flash_read_write() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();

        flash.write(0x040000, b"GNTR").unwrap();

        let mut buf = [0u8; 4];
        flash.read(0x040000, &mut buf).unwrap();
        assert_eq!(&buf, b"GNTR");
    }

    #[test]
    fn test_mock_flash_erase() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 8192).unwrap();
        flash.write(0x041000, &[0x55; 256]).unwrap();

        flash.erase(0x040000, 8192).unwrap();

        assert!(flash.get_contents(0x041000, 256).iter().all(|&b| b == 0xFF));
        assert_eq!(flash.get_erase_count(0x040000), 2);
        assert_eq!(flash.get_erase_count(0x041000), 2);
        assert_eq!(flash.get_total_erase_count(), 4);
    }

    #[test]
    fn test_mock_flash_invalid_address() {
        let mut flash = MockFlash::new();

        // firmware region is protected
        assert!(flash.write(0x000000, &[0x00; 4]).is_err());

        let mut buf = [0u8; 4];
        assert!(flash.read(FLASH_CAPACITY, &mut buf).is_err());
    }

    #[test]
    fn test_mock_flash_unaligned_erase() {
        let mut flash = MockFlash::new();
        assert!(flash.erase(0x040100, 4096).is_err());
        assert!(flash.erase(0x040000, 1024).is_err());
    }

    #[test]
    fn test_mock_flash_power_loss() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();

        flash.simulate_power_loss();
        flash.write(0x040000, &[0x55; 256]).unwrap();

        let contents = flash.get_contents(0x040000, 256);
        assert_eq!(&contents[..128], &[0x55; 128]);
        assert_eq!(&contents[128..], &[0xFF; 128]);
    }

    #[test]
    fn test_mock_flash_write_only_clears_bits() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();

        flash.write(0x040000, &[0x0F]).unwrap();
        flash.write(0x040000, &[0xFF]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(0x040000, &mut buf).unwrap();
        assert_eq!(buf[0], 0x0F);
    }
}
