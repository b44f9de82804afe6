//! Registry persistence
//!
//! [`NvStore`] keeps an image of every persisted registry slot and writes it
//! to the next Flash block on [`flush`](NvStore::flush). Values are stored
//! raw in canonical units, one record per slot, tagged with the slot's token
//! hash so a table reshaped by different capabilities never loads a value
//! into the wrong parameter.

use core::fmt;

use gantry_core::machine::system::FIRMWARE_BUILD;
use gantry_core::nv::{Index, MessageQueue};
use gantry_core::{Machine, Registry, Status};
use heapless::Vec;

use super::block::{Record, MAX_RECORDS};
use super::storage::{BlockStorage, Records, StorageStats};
use crate::platform::{FlashInterface, PlatformError};
use crate::{log_debug, log_info, log_warn};

/// Persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// Flash access failed
    Platform(PlatformError),
    /// More persisted slots than a block holds
    ImageFull,
    /// Restoring factory defaults failed
    Defaults(Status),
}

impl From<PlatformError> for PersistError {
    fn from(e: PlatformError) -> Self {
        PersistError::Platform(e)
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Platform(e) => write!(f, "{}", e),
            PersistError::ImageFull => write!(f, "too many persisted parameters"),
            PersistError::Defaults(status) => write!(f, "defaults failed: {}", status),
        }
    }
}

pub type Result<T> = core::result::Result<T, PersistError>;

/// Why [`NvStore::init`] fell back to factory defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultsReason {
    /// No valid block was found
    NoValidBlock,
    /// The newest block was written by a different firmware build
    BuildMismatch,
}

/// Outcome of [`NvStore::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Values were restored from Flash
    Loaded {
        /// Records applied to the machine
        applied: u16,
        /// Records dropped because the slot no longer matches
        skipped: u16,
    },
    /// Factory defaults were applied and written out
    Defaults(DefaultsReason),
}

/// Persisted image of the registry
pub struct NvStore<F: FlashInterface> {
    storage: BlockStorage<F>,
    image: Records,
    active: Option<u8>,
    sequence: u16,
    build: f32,
    dirty: bool,
}

impl<F: FlashInterface> NvStore<F> {
    pub fn new(flash: F) -> Self {
        Self {
            storage: BlockStorage::new(flash),
            image: Records::new(),
            active: None,
            sequence: 0,
            build: FIRMWARE_BUILD,
            dirty: false,
        }
    }

    /// Override the firmware build stamped into and expected from blocks
    pub fn with_build(mut self, build: f32) -> Self {
        self.build = build;
        self
    }

    /// Load persisted values into `machine`
    ///
    /// Factory defaults are applied first and persisted records laid over
    /// them. When no valid block exists, or the newest one was written by
    /// another firmware build, the defaults are written out instead.
    pub fn init(&mut self, registry: &Registry, machine: &mut Machine) -> Result<LoadOutcome> {
        let Some((block, header)) = self.storage.find_active_block() else {
            log_info!("No valid parameter block, applying defaults");
            return self.reset(registry, machine, DefaultsReason::NoValidBlock);
        };
        self.active = Some(block);
        self.sequence = header.sequence;

        if !header.matches_build(self.build) {
            log_warn!(
                "Parameter block build {} differs from firmware {}, applying defaults",
                f32::from_bits(header.build),
                self.build
            );
            return self.reset(registry, machine, DefaultsReason::BuildMismatch);
        }

        // entries missing from the block keep their factory values
        let status = registry.set_defaults(machine);
        if status.is_error() {
            return Err(PersistError::Defaults(status));
        }
        let (_, records, _) = self.storage.read_block(block)?;
        let mut messages = MessageQueue::new();
        let mut applied = 0u16;
        let mut skipped = 0u16;
        for record in records.iter() {
            if restore(registry, machine, record, &mut messages) {
                applied += 1;
            } else {
                skipped += 1;
            }
        }
        log_info!(
            "Loaded {} parameters from block {} (sequence {})",
            applied,
            block,
            header.sequence
        );

        self.snapshot(registry, machine)?;
        // rewrite when the table has changed shape since the block was written
        self.dirty = skipped > 0 || applied as usize != self.image.len();
        if self.dirty {
            log_warn!("Dropped {} stale parameter records", skipped);
            self.flush()?;
        }
        Ok(LoadOutcome::Loaded { applied, skipped })
    }

    /// Stage the current value of the entry at `index`
    ///
    /// Returns false for entries that are not persisted.
    pub fn persist(
        &mut self,
        registry: &Registry,
        machine: &mut Machine,
        index: Index,
    ) -> Result<bool> {
        let Some(record) = record_for(registry, machine, index) else {
            return Ok(false);
        };
        match self.image.binary_search_by_key(&record.slot, |r| r.slot) {
            Ok(pos) => {
                if self.image[pos] != record {
                    self.image[pos] = record;
                    self.dirty = true;
                }
            }
            Err(pos) => {
                self.image
                    .insert(pos, record)
                    .map_err(|_| PersistError::ImageFull)?;
                self.dirty = true;
            }
        }
        Ok(true)
    }

    /// Stage every persisted entry
    pub fn persist_all(&mut self, registry: &Registry, machine: &mut Machine) -> Result<()> {
        let before = self.image.clone();
        self.snapshot(registry, machine)?;
        if self.image != before {
            self.dirty = true;
        }
        Ok(())
    }

    /// Write the staged image to the next block
    ///
    /// Returns false when nothing changed since the last write.
    pub fn flush(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let block = match self.active {
            Some(current) => self.storage.choose_next_block(current),
            None => 0,
        };
        let sequence = self.storage.increment_sequence(self.sequence);
        self.storage
            .write_block(block, &self.image, sequence, self.build)?;
        log_debug!(
            "Wrote {} parameters to block {} (sequence {})",
            self.image.len(),
            block,
            sequence
        );
        self.active = Some(block);
        self.sequence = sequence;
        self.dirty = false;
        Ok(true)
    }

    /// True when staged values have not been written yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of slots in the staged image
    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn stats(&self) -> StorageStats {
        self.storage.get_stats()
    }

    /// Flash interface reference (for testing)
    pub fn flash_mut(&mut self) -> &mut F {
        self.storage.flash_mut()
    }

    fn reset(
        &mut self,
        registry: &Registry,
        machine: &mut Machine,
        reason: DefaultsReason,
    ) -> Result<LoadOutcome> {
        let status = registry.set_defaults(machine);
        if status.is_error() {
            return Err(PersistError::Defaults(status));
        }
        self.snapshot(registry, machine)?;
        self.dirty = true;
        self.flush()?;
        Ok(LoadOutcome::Defaults(reason))
    }

    /// Rebuild the image from every persisted entry
    fn snapshot(&mut self, registry: &Registry, machine: &mut Machine) -> Result<()> {
        let mut image: Vec<Record, MAX_RECORDS> = Vec::new();
        for (index, _) in registry.descriptors() {
            if let Some(record) = record_for(registry, machine, index) {
                image.push(record).map_err(|_| PersistError::ImageFull)?;
            }
        }
        self.image = image;
        Ok(())
    }
}

/// Record holding the raw value of a persisted entry
fn record_for(registry: &Registry, machine: &mut Machine, index: Index) -> Option<Record> {
    let desc = registry.descriptor(index)?;
    if !desc.is_persistent() {
        return None;
    }
    let value = machine.read(desc.target)?;
    Record::from_value(index, &desc.token, &value)
}

/// Apply one record, returning false when it no longer fits the table
fn restore(
    registry: &Registry,
    machine: &mut Machine,
    record: &Record,
    messages: &mut MessageQueue,
) -> bool {
    let Some(desc) = registry.descriptor(record.slot) else {
        return false;
    };
    if !desc.is_persistent() || !record.is_for(&desc.token) {
        return false;
    }
    let Some(value) = record.value() else {
        return false;
    };
    let mut nv = registry.object(record.slot);
    nv.value = value;
    let status = registry.set_canonical(&mut nv, machine, messages);
    if status.is_error() {
        log_warn!("Persisted {} rejected: {}", desc.token.as_str(), status.code());
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameters::storage::PARAM_BLOCK_ADDRESSES;
    use crate::platform::mock::MockFlash;
    use gantry_core::Capabilities;

    fn registry() -> Registry {
        Registry::new(Capabilities::default()).unwrap()
    }

    fn index(reg: &Registry, token: &str) -> Index {
        reg.index_of("", token).unwrap()
    }

    #[test]
    fn test_blank_flash_applies_defaults() {
        let reg = registry();
        let mut m = Machine::default();
        m.axes[0].velocity_max = 1.0;
        let mut store = NvStore::new(MockFlash::new());

        let outcome = store.init(&reg, &mut m).unwrap();

        assert_eq!(outcome, LoadOutcome::Defaults(DefaultsReason::NoValidBlock));
        assert_eq!(m.axes[0].velocity_max, 16_000.0);
        assert!(!store.is_dirty());
        assert_eq!(store.stats().total_saves, 1);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_persisted_values_survive_restart() {
        let reg = registry();
        let mut flash = MockFlash::new();
        {
            let mut m = Machine::default();
            let mut store = NvStore::new(flash.clone());
            store.init(&reg, &mut m).unwrap();

            m.axes[0].velocity_max = 12_345.0;
            m.motors[1].microsteps = 32;
            assert!(store.persist(&reg, &mut m, index(&reg, "xvm")).unwrap());
            assert!(store.persist(&reg, &mut m, index(&reg, "2mi")).unwrap());
            assert!(store.flush().unwrap());
            flash = store.flash_mut().clone();
        }

        let mut m = Machine::default();
        let mut store = NvStore::new(flash);
        let outcome = store.init(&reg, &mut m).unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded { skipped: 0, .. }));
        assert_eq!(m.axes[0].velocity_max, 12_345.0);
        assert_eq!(m.motors[1].microsteps, 32);
    }

    #[test]
    fn test_unpersisted_entries_ignored() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&reg, &mut m).unwrap();

        // read-outs and actions have no persisted form
        assert!(!store.persist(&reg, &mut m, index(&reg, "posx")).unwrap());
        assert!(!store.persist(&reg, &mut m, index(&reg, "me")).unwrap());
        assert!(!store.is_dirty());
        assert!(!store.flush().unwrap());
    }

    #[test]
    fn test_unchanged_value_not_dirty() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&reg, &mut m).unwrap();

        assert!(store.persist(&reg, &mut m, index(&reg, "xvm")).unwrap());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_corrupted_newest_block_falls_back() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&reg, &mut m).unwrap();

        m.axes[0].velocity_max = 9_000.0;
        store.persist(&reg, &mut m, index(&reg, "xvm")).unwrap();
        store.flush().unwrap();

        // the second write went to block 1; damage it
        let mut flash = store.flash_mut().clone();
        flash.inject_corruption(PARAM_BLOCK_ADDRESSES[1] + 64, 4);

        let mut m = Machine::default();
        let mut store = NvStore::new(flash);
        assert!(matches!(store.init(&reg, &mut m).unwrap(), LoadOutcome::Loaded { .. }));
        assert_eq!(m.axes[0].velocity_max, 16_000.0);
    }

    #[test]
    fn test_power_loss_keeps_previous_block() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&reg, &mut m).unwrap();

        m.axes[0].velocity_max = 9_000.0;
        store.persist(&reg, &mut m, index(&reg, "xvm")).unwrap();
        store.flash_mut().simulate_power_loss();
        store.flush().unwrap();

        let flash = store.flash_mut().clone();
        let mut m = Machine::default();
        let mut store = NvStore::new(flash);
        assert!(matches!(store.init(&reg, &mut m).unwrap(), LoadOutcome::Loaded { .. }));
        assert_eq!(m.axes[0].velocity_max, 16_000.0);
    }

    #[test]
    fn test_build_mismatch_resets_defaults() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new()).with_build(100.0);
        store.init(&reg, &mut m).unwrap();
        m.axes[0].velocity_max = 9_000.0;
        store.persist(&reg, &mut m, index(&reg, "xvm")).unwrap();
        store.flush().unwrap();

        let flash = store.flash_mut().clone();
        let mut m = Machine::default();
        m.axes[0].velocity_max = 1.0;
        let mut store = NvStore::new(flash);
        let outcome = store.init(&reg, &mut m).unwrap();

        assert_eq!(outcome, LoadOutcome::Defaults(DefaultsReason::BuildMismatch));
        assert_eq!(m.axes[0].velocity_max, 16_000.0);

        // the fresh block is accepted on the next start
        let flash = store.flash_mut().clone();
        let mut store = NvStore::new(flash);
        assert!(matches!(
            store.init(&reg, &mut Machine::default()).unwrap(),
            LoadOutcome::Loaded { skipped: 0, .. }
        ));
    }

    #[test]
    fn test_reshaped_table_skips_stale_records() {
        let small = Registry::new(Capabilities::default().with_motors(2)).unwrap();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&small, &mut m).unwrap();
        m.axes[0].velocity_max = 9_000.0;
        store.persist(&small, &mut m, small.index_of("", "xvm").unwrap()).unwrap();
        store.flush().unwrap();

        let large = Registry::new(Capabilities::default().with_motors(6)).unwrap();
        let flash = store.flash_mut().clone();
        let mut m = Machine::default();
        let mut store = NvStore::new(flash);
        let outcome = store.init(&large, &mut m).unwrap();

        let LoadOutcome::Loaded { skipped, .. } = outcome else {
            panic!("expected a load, got {:?}", outcome);
        };
        assert!(skipped > 0);
        // the block was rewritten for the new table
        assert!(!store.is_dirty());
        assert_eq!(store.stats().total_saves, 1);
    }

    #[test]
    fn test_persist_all_stages_changes() {
        let reg = registry();
        let mut m = Machine::default();
        let mut store = NvStore::new(MockFlash::new());
        store.init(&reg, &mut m).unwrap();

        store.persist_all(&reg, &mut m).unwrap();
        assert!(!store.is_dirty());

        m.axes[1].jerk_max = 50.0;
        store.persist_all(&reg, &mut m).unwrap();
        assert!(store.is_dirty());
        assert!(store.flush().unwrap());
    }
}
