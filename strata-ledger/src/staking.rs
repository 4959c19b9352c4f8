use borsh::{BorshDeserialize, BorshSerialize};
use strata_types::constants::DEFAULT_BOND_DENOM;
use strata_types::primitives::validate_denom;

use crate::context::Context;
use crate::error::LedgerError;

const PARAMS_KEY: &[u8] = b"staking/params";

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct StakingParams {
    pub bond_denom: String,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
        }
    }
}

/// Read access to staking parameters.
pub trait StakingKeeper: Send + Sync {
    fn bond_denom(&self, ctx: &mut Context) -> Result<String, LedgerError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Staking;

impl Staking {
    pub fn new() -> Self {
        Self
    }

    pub fn params(&self, ctx: &mut Context) -> Result<StakingParams, LedgerError> {
        Ok(ctx.get_borsh(PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&self, ctx: &mut Context, params: &StakingParams) -> Result<(), LedgerError> {
        validate_denom(&params.bond_denom)?;
        ctx.set_borsh(PARAMS_KEY, params)
    }
}

impl StakingKeeper for Staking {
    fn bond_denom(&self, ctx: &mut Context) -> Result<String, LedgerError> {
        Ok(self.params(ctx)?.bond_denom)
    }
}
