use crate::error::LedgerError;

/// Tracks native gas consumption for one call.
///
/// The meter is always bounded. Running past the limit is reported as
/// [`LedgerError::OutOfGas`], never as a panic, and the charge that would
/// overflow is still recorded so the error message is informative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    /// Maximum gas allowed.
    pub limit: u64,
    /// Gas consumed so far.
    pub used: u64,
}

impl GasMeter {
    /// Create a new gas meter with the given limit.
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// A meter that can never run out, for genesis and queries outside a call.
    pub fn unbounded() -> Self {
        Self::new(u64::MAX)
    }

    /// Charge the given amount of gas. Returns an error if the limit is exceeded.
    pub fn charge(&mut self, amount: u64, descriptor: &str) -> Result<(), LedgerError> {
        let new_used = self.used.saturating_add(amount);
        self.used = new_used;
        if new_used > self.limit {
            return Err(LedgerError::OutOfGas {
                descriptor: descriptor.to_string(),
                used: new_used,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Return the remaining gas.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Return gas consumed so far.
    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}
