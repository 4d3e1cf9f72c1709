//! [`Env`] bundles the configuration, block and transaction environment and validates them.
use crate::{BlockEnv, CfgEnv, InvalidHeader, InvalidTransaction, TxEnv};
use core::cmp::{min, Ordering};
use primitives::{
    eip4844::{MAX_BLOB_NUMBER_PER_BLOCK, VERSIONED_HASH_VERSION_KZG},
    hardfork::SpecId,
    KECCAK_EMPTY, U256,
};
use state::AccountInfo;
use std::boxed::Box;

/// EVM environment configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Env {
    /// Configuration of the EVM itself.
    pub cfg: CfgEnv,
    /// Configuration of the block the transaction is in.
    pub block: BlockEnv,
    /// Configuration of the transaction that is being executed.
    pub tx: TxEnv,
}

impl Env {
    /// Creates an environment from its three parts.
    pub fn new(cfg: CfgEnv, block: BlockEnv, tx: TxEnv) -> Self {
        Self { cfg, block, tx }
    }

    /// Active hardfork.
    #[inline]
    pub fn spec_id(&self) -> SpecId {
        self.cfg.spec
    }

    /// Calculates the effective gas price of the transaction.
    #[inline]
    pub fn effective_gas_price(&self) -> U256 {
        match self.tx.gas_priority_fee {
            None => self.tx.gas_price,
            Some(priority_fee) => min(
                self.tx.gas_price,
                U256::from(self.block.basefee).saturating_add(priority_fee),
            ),
        }
    }

    /// Calculates the [EIP-4844] `data_fee` of the transaction.
    ///
    /// Returns `None` if `Cancun` is not enabled.
    ///
    /// [EIP-4844]: https://eips.ethereum.org/EIPS/eip-4844
    #[inline]
    pub fn calc_data_fee(&self) -> Option<U256> {
        self.block.blob_gasprice().map(|blob_gas_price| {
            U256::from(blob_gas_price).saturating_mul(U256::from(self.tx.get_total_blob_gas()))
        })
    }

    /// Calculates the maximum [EIP-4844] `data_fee` of the transaction.
    ///
    /// This is used for ensuring that the user has at least enough funds to pay the
    /// `max_fee_per_blob_gas * total_blob_gas`, on top of regular gas costs.
    ///
    /// See EIP-4844:
    /// <https://github.com/ethereum/EIPs/blob/master/EIPS/eip-4844.md#execution-layer-validation>
    pub fn calc_max_data_fee(&self) -> Option<U256> {
        self.tx.max_fee_per_blob_gas.map(|max_fee_per_blob_gas| {
            max_fee_per_blob_gas.saturating_mul(U256::from(self.tx.get_total_blob_gas()))
        })
    }

    /// Validate ENV data of the block.
    ///
    /// It can be skip if you are sure that PREVRANDAO is set.
    #[inline]
    pub fn validate_block_env(&self) -> Result<(), InvalidHeader> {
        let spec = self.spec_id();
        // `prevrandao` is required for the merge
        if spec.is_enabled_in(SpecId::MERGE) && self.block.prevrandao.is_none() {
            return Err(InvalidHeader::PrevrandaoNotSet);
        }
        // `excess_blob_gas` is required for Cancun
        if spec.is_enabled_in(SpecId::CANCUN) && self.block.blob_excess_gas_and_price.is_none() {
            return Err(InvalidHeader::ExcessBlobGasNotSet);
        }
        Ok(())
    }

    /// Validate transaction data that is set inside ENV and return error if something is wrong.
    pub fn validate_tx(&self) -> Result<(), InvalidTransaction> {
        let spec = self.spec_id();

        // BASEFEE tx check
        if spec.is_enabled_in(SpecId::LONDON) {
            if let Some(priority_fee) = self.tx.gas_priority_fee {
                if priority_fee > self.tx.gas_price {
                    // or gas_max_fee for eip1559
                    return Err(InvalidTransaction::PriorityFeeGreaterThanMaxFee);
                }
            }

            // check minimal cost against basefee
            if !self.cfg.disable_base_fee
                && self.effective_gas_price() < U256::from(self.block.basefee)
            {
                return Err(InvalidTransaction::GasPriceLessThanBasefee);
            }
        }

        // Check if gas_limit is more than block_gas_limit
        if !self.cfg.disable_block_gas_limit && self.tx.gas_limit > self.block.gas_limit {
            return Err(InvalidTransaction::CallerGasLimitMoreThanBlock);
        }

        // EIP-3860: Limit and meter initcode
        if spec.is_enabled_in(SpecId::SHANGHAI)
            && self.tx.is_create()
            && self.tx.data.len() > self.cfg.max_initcode_size()
        {
            return Err(InvalidTransaction::CreateInitCodeSizeLimit);
        }

        // Check if the transaction's chain id is correct
        if let Some(tx_chain_id) = self.tx.chain_id {
            if tx_chain_id != self.cfg.chain_id {
                return Err(InvalidTransaction::InvalidChainId);
            }
        }

        // Check that access list is empty for transactions before BERLIN
        if !spec.is_enabled_in(SpecId::BERLIN) && !self.tx.access_list.is_empty() {
            return Err(InvalidTransaction::AccessListNotSupported);
        }

        if spec.is_enabled_in(SpecId::CANCUN) {
            self.validate_blob_tx()
        } else {
            if self.tx.max_fee_per_blob_gas.is_some() {
                return Err(InvalidTransaction::MaxFeePerBlobGasNotSupported);
            }
            if !self.tx.blob_hashes.is_empty() {
                return Err(InvalidTransaction::BlobVersionedHashesNotSupported);
            }
            Ok(())
        }
    }

    /// EIP-4844 checks, run from Cancun on.
    fn validate_blob_tx(&self) -> Result<(), InvalidTransaction> {
        let Some(max) = self.tx.max_fee_per_blob_gas else {
            if !self.tx.blob_hashes.is_empty() {
                return Err(InvalidTransaction::BlobVersionedHashesNotSupported);
            }
            return Ok(());
        };

        // ensure that the user was willing to at least pay the current blob gasprice
        let price = self.block.blob_gasprice().unwrap_or_default();
        if U256::from(price) > max {
            return Err(InvalidTransaction::BlobGasPriceGreaterThanMax);
        }

        // there must be at least one blob
        if self.tx.blob_hashes.is_empty() {
            return Err(InvalidTransaction::EmptyBlobs);
        }

        // The field `to` deviates slightly from the semantics with the exception
        // that it MUST NOT be nil and therefore must always represent
        // a 20-byte address. This means that blob transactions cannot
        // have the form of a create transaction.
        if self.tx.is_create() {
            return Err(InvalidTransaction::BlobCreateTransaction);
        }

        // all versioned blob hashes must start with VERSIONED_HASH_VERSION_KZG
        for blob in self.tx.blob_hashes.iter() {
            if blob[0] != VERSIONED_HASH_VERSION_KZG {
                return Err(InvalidTransaction::BlobVersionNotSupported);
            }
        }

        // ensure the total blob gas spent is at most equal to the limit
        // assert blob_gas_used <= MAX_BLOB_GAS_PER_BLOCK
        let max_blobs = MAX_BLOB_NUMBER_PER_BLOCK as usize;
        if self.tx.blob_hashes.len() > max_blobs {
            return Err(InvalidTransaction::TooManyBlobs {
                max: max_blobs,
                have: self.tx.blob_hashes.len(),
            });
        }
        Ok(())
    }

    /// Validate transaction against the caller's account.
    ///
    /// Returns the maximum amount the transaction can take from the caller.
    pub fn validate_tx_against_state(
        &self,
        account: &AccountInfo,
    ) -> Result<U256, InvalidTransaction> {
        // EIP-3607: Reject transactions from senders with deployed code
        // This EIP is introduced after london but there was no collision in past
        // so we can leave it enabled always
        if account.code_hash != KECCAK_EMPTY {
            return Err(InvalidTransaction::RejectCallerWithCode);
        }

        // Check that the transaction's nonce is correct
        if let Some(tx) = self.tx.nonce {
            let state = account.nonce;
            match tx.cmp(&state) {
                Ordering::Greater => {
                    return Err(InvalidTransaction::NonceTooHigh { tx, state });
                }
                Ordering::Less => {
                    return Err(InvalidTransaction::NonceTooLow { tx, state });
                }
                _ => {}
            }
        }

        let mut balance_check = U256::from(self.tx.gas_limit)
            .checked_mul(self.tx.gas_price)
            .and_then(|gas_cost| gas_cost.checked_add(self.tx.value))
            .ok_or(InvalidTransaction::OverflowPaymentInTransaction)?;

        if let Some(data_fee) = self.calc_max_data_fee() {
            balance_check = balance_check
                .checked_add(data_fee)
                .ok_or(InvalidTransaction::OverflowPaymentInTransaction)?;
        }

        // Check if account has enough balance for gas_limit*gas_price and value transfer.
        // Transfer will be done inside the call frame.
        if !self.cfg.disable_balance_check && balance_check > account.balance {
            return Err(InvalidTransaction::LackOfFundForMaxFee {
                fee: Box::new(balance_check),
                balance: Box::new(account.balance),
            });
        }

        Ok(balance_check)
    }
}
