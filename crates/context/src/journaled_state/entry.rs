//! Journal entries are used to track changes to the state and are used to revert it.
//!
//! They are created when there is change to the state from loading (making it warm), changes to
//! the balance, or removal of the storage slot.
use primitives::{Address, KECCAK_EMPTY, U256};
use state::{Account, Bytecode, EvmState, TransientStorage};
use std::boxed::Box;

/// Journal entries that are used to track changes to the state and are used to revert it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JournalEntry {
    /// Used to mark account that is warm inside EVM in regard to EIP-2929 AccessList.
    /// Action: We will mark the account warm.
    /// Revert: we will mark the account cold.
    AccountWarmed {
        /// Address of warmed account.
        address: Address,
    },
    /// Mark account to be destroyed and journal balance to be reverted
    /// Action: Mark account and transfer the balance
    /// Revert: Unmark the account and transfer balance back
    AccountDestroyed {
        /// Address of account to be destroyed.
        address: Address,
        /// Address of account that received the balance.
        target: Address,
        /// If account had already been destroyed before this journal entry.
        was_destroyed: bool,
        /// Balance of account got transferred to target.
        had_balance: U256,
    },
    /// Loading account does not mean that account will need to be added to MerkleTree (touched).
    /// Only when account is called (to execute contract or transfer balance) only then account is made touched.
    /// Action: Mark account touched
    /// Revert: Unmark account touched
    AccountTouched {
        /// Address of account that is touched.
        address: Address,
    },
    /// Balance changed
    /// Action: Balance changed
    /// Revert: Revert to previous balance
    BalanceChange {
        /// Address of account that had its balance changed.
        address: Address,
        /// Balance before the change.
        old_balance: U256,
    },
    /// Transfer balance between two accounts
    /// Action: Transfer balance
    /// Revert: Transfer balance back
    BalanceTransfer {
        /// Address of account that sent the balance.
        from: Address,
        /// Address of account that received the balance.
        to: Address,
        /// Balance that is transferred.
        balance: U256,
    },
    /// Nonce changed
    /// Action: Nonce incremented or overwritten
    /// Revert: Restore previous nonce
    NonceChange {
        /// Address of account that had its nonce changed.
        address: Address,
        /// Nonce before the change.
        previous_nonce: u64,
    },
    /// Create account:
    /// Actions: Mark account as created
    /// Revert: Unmark account as created and reset nonce to zero.
    AccountCreated {
        /// Address of account that is created.
        address: Address,
    },
    /// Entry used to track storage changes
    /// Action: Storage change
    /// Revert: Revert to previous value
    StorageChanged {
        /// Address of account that had its storage changed.
        address: Address,
        /// Key of storage slot that is changed.
        key: U256,
        /// Previous value of storage slot.
        had_value: U256,
    },
    /// Entry used to track storage warming introduced by EIP-2929.
    /// Action: Storage warmed
    /// Revert: Revert to cold state
    StorageWarmed {
        /// Address of account that had its storage warmed. By SLOAD or SSTORE opcode.
        address: Address,
        /// Key of storage slot that is warmed.
        key: U256,
    },
    /// It is used to track an EIP-1153 transient storage change.
    /// Action: Transient storage changed.
    /// Revert: Revert to previous value.
    TransientStorageChange {
        /// Address of account that had its transient storage changed.
        address: Address,
        /// Key of transient storage slot that is changed.
        key: U256,
        /// Previous value of transient storage slot.
        had_value: U256,
    },
    /// Code changed
    /// Action: Account code changed
    /// Revert: Revert to previous bytecode.
    CodeChange {
        /// Address of account that had its code changed.
        address: Address,
        /// Code before the change.
        had_code: Option<Bytecode>,
    },
    /// Self-destructed account wiped at the end of its transaction.
    /// Action: Account reset to an empty, created account
    /// Revert: Restore the account as it was
    AccountCleared {
        /// Address of the wiped account.
        address: Address,
        /// Account before it was wiped.
        had_account: Box<Account>,
    },
}

impl JournalEntry {
    /// Accounts this entry changed; transfers name two.
    pub fn addresses(&self) -> (Address, Option<Address>) {
        match *self {
            Self::AccountDestroyed {
                address, target, ..
            } => (address, Some(target)),
            Self::BalanceTransfer { from, to, .. } => (from, Some(to)),
            Self::AccountWarmed { address }
            | Self::AccountTouched { address }
            | Self::BalanceChange { address, .. }
            | Self::NonceChange { address, .. }
            | Self::AccountCreated { address }
            | Self::StorageChanged { address, .. }
            | Self::StorageWarmed { address, .. }
            | Self::TransientStorageChange { address, .. }
            | Self::CodeChange { address, .. }
            | Self::AccountCleared { address, .. } => (address, None),
        }
    }

    /// Undoes the change this entry recorded.
    ///
    /// Entries must be reverted newest first. Accounts missing from `state` are skipped.
    pub fn revert(self, state: &mut EvmState, transient_storage: &mut TransientStorage) {
        match self {
            JournalEntry::AccountWarmed { address } => {
                if let Some(account) = state.get_mut(&address) {
                    account.mark_cold();
                }
            }
            JournalEntry::AccountTouched { address } => {
                if let Some(account) = state.get_mut(&address) {
                    account.unmark_touch();
                }
            }
            JournalEntry::AccountDestroyed {
                address,
                target,
                was_destroyed,
                had_balance,
            } => {
                if let Some(account) = state.get_mut(&address) {
                    // set previous state of selfdestructed flag, as there could be multiple
                    // selfdestructs in one transaction.
                    if was_destroyed {
                        account.mark_selfdestruct();
                    } else {
                        account.unmark_selfdestruct();
                    }
                    account.info.balance = account.info.balance.saturating_add(had_balance);
                }

                if address != target {
                    if let Some(target) = state.get_mut(&target) {
                        target.info.balance = target.info.balance.saturating_sub(had_balance);
                    }
                }
            }
            JournalEntry::BalanceChange {
                address,
                old_balance,
            } => {
                if let Some(account) = state.get_mut(&address) {
                    account.info.balance = old_balance;
                }
            }
            JournalEntry::BalanceTransfer { from, to, balance } => {
                // we don't need to check overflow and underflow when adding and subtracting the balance.
                if let Some(from) = state.get_mut(&from) {
                    from.info.balance = from.info.balance.saturating_add(balance);
                }
                if let Some(to) = state.get_mut(&to) {
                    to.info.balance = to.info.balance.saturating_sub(balance);
                }
            }
            JournalEntry::NonceChange {
                address,
                previous_nonce,
            } => {
                if let Some(account) = state.get_mut(&address) {
                    account.info.nonce = previous_nonce;
                }
            }
            JournalEntry::AccountCreated { address } => {
                if let Some(account) = state.get_mut(&address) {
                    account.unmark_created();
                    account.info.nonce = 0;
                }
            }
            JournalEntry::StorageChanged {
                address,
                key,
                had_value,
            } => {
                if let Some(slot) = state
                    .get_mut(&address)
                    .and_then(|account| account.storage.get_mut(&key))
                {
                    slot.present_value = had_value;
                }
            }
            JournalEntry::StorageWarmed { address, key } => {
                if let Some(slot) = state
                    .get_mut(&address)
                    .and_then(|account| account.storage.get_mut(&key))
                {
                    slot.mark_cold();
                }
            }
            JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            } => {
                let tkey = (address, key);
                if had_value.is_zero() {
                    // if previous value is zero, remove it
                    transient_storage.remove(&tkey);
                } else {
                    // if not zero, reinsert old value to transient storage.
                    transient_storage.insert(tkey, had_value);
                }
            }
            JournalEntry::CodeChange { address, had_code } => {
                if let Some(account) = state.get_mut(&address) {
                    account.info.code_hash = had_code
                        .as_ref()
                        .map(Bytecode::hash_slow)
                        .unwrap_or(KECCAK_EMPTY);
                    account.info.code = had_code;
                }
            }
            JournalEntry::AccountCleared {
                address,
                had_account,
            } => {
                state.insert(address, *had_account);
            }
        }
    }
}
