use std::sync::Arc;

use strata_types::constants::{
    GAS_DELETE, GAS_HAS, GAS_READ_FLAT, GAS_READ_PER_BYTE, GAS_WRITE_FLAT, GAS_WRITE_PER_BYTE,
};
use strata_types::primitives::Timestamp;

use crate::cache::CacheStore;
use crate::error::LedgerError;
use crate::gas::GasMeter;
use crate::traits::{KvPairs, KvStore};

/// Execution context handed to every native module call.
///
/// Carries the block header fields the modules need, the store the call
/// reads and writes through, and the gas meter every store access charges.
#[derive(Clone)]
pub struct Context {
    store: Arc<dyn KvStore>,
    gas_meter: GasMeter,
    block_height: u64,
    block_time: Timestamp,
}

impl Context {
    pub fn new(store: Arc<dyn KvStore>, block_height: u64, block_time: Timestamp) -> Self {
        Self {
            store,
            gas_meter: GasMeter::unbounded(),
            block_height,
            block_time,
        }
    }

    /// Replace the gas meter, e.g. with one capped to a VM call's budget.
    pub fn with_gas_meter(mut self, gas_meter: GasMeter) -> Self {
        self.gas_meter = gas_meter;
        self
    }

    pub fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    pub fn set_gas_meter(&mut self, gas_meter: GasMeter) {
        self.gas_meter = gas_meter;
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn block_time(&self) -> Timestamp {
        self.block_time
    }

    /// Branch this context. Writes made through the returned context stay in
    /// the returned [`CacheStore`] until it is written; the gas meter starts
    /// from this context's consumption.
    pub fn cache_context(&self) -> (Context, Arc<CacheStore>) {
        let cache = Arc::new(CacheStore::new(self.store.clone()));
        let ctx = Context {
            store: cache.clone(),
            gas_meter: self.gas_meter.clone(),
            block_height: self.block_height,
            block_time: self.block_time,
        };
        (ctx, cache)
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        self.gas_meter.charge(GAS_READ_FLAT, "ReadFlat")?;
        let value = self.store.get(key)?;
        if let Some(ref v) = value {
            let per_byte = GAS_READ_PER_BYTE.saturating_mul((key.len() + v.len()) as u64);
            self.gas_meter.charge(per_byte, "ReadPerByte")?;
        }
        Ok(value)
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        self.gas_meter.charge(GAS_WRITE_FLAT, "WriteFlat")?;
        let per_byte = GAS_WRITE_PER_BYTE.saturating_mul((key.len() + value.len()) as u64);
        self.gas_meter.charge(per_byte, "WritePerByte")?;
        self.store.put(key, value)?;
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<(), LedgerError> {
        self.gas_meter.charge(GAS_DELETE, "Delete")?;
        self.store.delete(key)?;
        Ok(())
    }

    pub fn has(&mut self, key: &[u8]) -> Result<bool, LedgerError> {
        self.gas_meter.charge(GAS_HAS, "Has")?;
        Ok(self.store.exists(key)?)
    }

    /// Scan a prefix. Charged like one read per returned entry.
    pub fn prefix_scan(&mut self, prefix: &[u8]) -> Result<KvPairs, LedgerError> {
        self.gas_meter.charge(GAS_READ_FLAT, "IterFlat")?;
        let pairs = self.store.prefix_scan(prefix)?;
        for (k, v) in &pairs {
            let per_byte = GAS_READ_PER_BYTE.saturating_mul((k.len() + v.len()) as u64);
            self.gas_meter.charge(per_byte, "IterNextPerByte")?;
        }
        Ok(pairs)
    }

    /// Read and borsh-decode a value.
    pub fn get_borsh<T: borsh::BorshDeserialize>(
        &mut self,
        key: &[u8],
    ) -> Result<Option<T>, LedgerError> {
        match self.get(key)? {
            Some(bytes) => {
                let value = T::try_from_slice(&bytes).map_err(|e| {
                    crate::error::StorageError::DeserializationError {
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Borsh-encode and write a value.
    pub fn set_borsh<T: borsh::BorshSerialize>(
        &mut self,
        key: &[u8],
        value: &T,
    ) -> Result<(), LedgerError> {
        let bytes =
            borsh::to_vec(value).map_err(|e| crate::error::StorageError::SerializationError {
                reason: e.to_string(),
            })?;
        self.set(key, &bytes)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("block_height", &self.block_height)
            .field("block_time", &self.block_time)
            .field("gas_meter", &self.gas_meter)
            .finish()
    }
}
