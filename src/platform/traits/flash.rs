//! Flash interface trait
//!
//! This module defines the Flash storage interface that platform implementations must provide.
//! Flash holds the persisted parameter blocks.

use crate::platform::Result;

/// Flash interface trait
///
/// Platform implementations must provide this interface for Flash read/write/erase operations.
///
/// # Flash Characteristics
///
/// - Flash is organized in sectors (typically 4 KB)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1→0 (must erase first to reset to 1)
/// - Flash operations are blocking
///
/// # Memory Layout
///
/// ```text
/// [Firmware]           0x000000 - 0x040000 (256 KB) - DO NOT WRITE
/// [Parameter Block 0]  0x040000 - 0x042000 (8 KB)
/// [Parameter Block 1]  0x042000 - 0x044000 (8 KB)
/// [Parameter Block 2]  0x044000 - 0x046000 (8 KB)
/// [Parameter Block 3]  0x046000 - 0x048000 (8 KB)
/// ```
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the range is out of bounds,
    /// `FlashError::ReadFailed` if the read operation fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `address`
    ///
    /// The caller must erase the target region first; writing can only
    /// change bits from 1 to 0.
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the address is in the firmware region,
    /// `FlashError::WriteFailed` if the write operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address`, setting them to 0xFF
    ///
    /// Address and size must be multiples of [`block_size`](Self::block_size).
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` for protected or misaligned regions,
    /// `FlashError::EraseFailed` if the erase operation fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Minimum erasable unit in bytes
    fn block_size(&self) -> u32;

    /// Total Flash capacity in bytes
    fn capacity(&self) -> u32;
}
