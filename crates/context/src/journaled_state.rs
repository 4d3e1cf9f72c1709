//! Checkpointed state overlay the EVM executes against.
//!
//! Every mutation goes through [`JournaledState`], which records a [`JournalEntry`] so that a
//! [`JournalCheckpoint`] can later be committed (entries merge into the parent checkpoint) or
//! reverted (entries are undone newest first).
mod entry;

pub use entry::JournalEntry;

use bytecode::Bytecode;
use core::{fmt, mem};
use database_interface::Database;
use interpreter::{SelfDestructResult, StateLoad};
use primitives::{
    hardfork::{SpecId, SpecId::*},
    hash_map::Entry,
    Address, HashSet, Log, B256, KECCAK_EMPTY, U256,
};
use state::{Account, AccountInfo, AccountStatus, EvmState, EvmStorageSlot, TransientStorage};
use std::{boxed::Box, vec::Vec};
use tracing::{trace, warn};

/// A journal of state changes internal to the EVM.
///
/// On each additional call, the depth of the journaled state is increased (`depth`) and a new
/// journal frame is opened. The state is kept across transactions until
/// [`finalize`](Self::finalize) hands it to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JournaledState {
    /// The current state.
    pub state: EvmState,
    /// Transient storage that is discarded after every transaction.
    ///
    /// See [EIP-1153](https://eips.ethereum.org/EIPS/eip-1153).
    pub transient_storage: TransientStorage,
    /// Emitted logs.
    pub logs: Vec<Log>,
    /// The journal of state changes, one for each open checkpoint.
    pub journal: Vec<JournalEntry>,
    /// The spec ID for the EVM.
    ///
    /// Before EIP-161 empty and not-existing accounts were defined differently.
    pub spec: SpecId,
    /// Addresses that are warm at the start of every transaction: precompiles, the caller, the
    /// transaction target and the coinbase.
    pub warm_preloaded_addresses: HashSet<Address>,
    frames: Vec<CheckpointFrame>,
    next_id: u64,
}

/// Position of the journal and logs when a checkpoint was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct CheckpointFrame {
    id: u64,
    log_i: usize,
    journal_i: usize,
}

/// Handle to an open checkpoint.
///
/// Ids grow monotonically, so a handle can never be confused with one issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JournalCheckpoint {
    id: u64,
}

impl JournalCheckpoint {
    /// Unique id of the checkpoint.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Misuse of a [`JournalCheckpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JournalError {
    /// The checkpoint was already committed or reverted, or an outer checkpoint was.
    StaleCheckpoint(u64),
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleCheckpoint(id) => write!(f, "checkpoint {id} is not open"),
        }
    }
}

impl core::error::Error for JournalError {}

/// Transfer and creation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferError {
    /// Caller does not have enough funds
    OutOfFunds,
    /// Overflow in target account.
    OverflowPayment,
    /// Create collision.
    CreateCollision,
}

impl Default for JournaledState {
    fn default() -> Self {
        Self::new(SpecId::default(), HashSet::default())
    }
}

impl JournaledState {
    /// Creates new JournaledState.
    ///
    /// `warm_preloaded_addresses` is used to determine if address is considered warm loaded.
    /// In ordinary cases this is precompile or beneficiary.
    pub fn new(spec: SpecId, warm_preloaded_addresses: HashSet<Address>) -> Self {
        Self {
            state: EvmState::default(),
            transient_storage: TransientStorage::default(),
            logs: Vec::new(),
            journal: Vec::new(),
            spec,
            warm_preloaded_addresses,
            frames: Vec::new(),
            next_id: 0,
        }
    }

    /// Returns the loaded account, if any.
    #[inline]
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.state.get(&address)
    }

    /// Number of open checkpoints.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if any checkpoint is still open.
    #[inline]
    pub fn has_open_checkpoints(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Prepares the overlay for a new transaction.
    ///
    /// Every account and slot turns cold, storage original values are snapshotted and the
    /// created-in-this-transaction flag is dropped. None of this is journaled.
    pub fn begin_tx(&mut self, spec: SpecId, warm_preloaded_addresses: HashSet<Address>) {
        self.spec = spec;
        self.warm_preloaded_addresses = warm_preloaded_addresses;
        for account in self.state.values_mut() {
            account.mark_cold();
            account.status -= AccountStatus::CreatedLocal;
            for slot in account.storage.values_mut() {
                slot.mark_cold();
                slot.original_value = slot.present_value;
            }
        }
    }

    /// Closes a transaction: clears transient storage and wipes self-destructed accounts.
    ///
    /// A wiped account becomes an empty created account, so later reads of its storage are zero.
    pub fn end_tx(&mut self) {
        self.transient_storage.clear();
        let destroyed: Vec<Address> = self
            .state
            .iter()
            .filter(|(_, account)| account.is_selfdestructed())
            .map(|(address, _)| *address)
            .collect();
        for address in destroyed {
            let Some(account) = self.state.get_mut(&address) else {
                continue;
            };
            self.journal.push(JournalEntry::AccountCleared {
                address,
                had_account: Box::new(account.clone()),
            });
            account.info = AccountInfo::default();
            account.storage.clear();
            account.unmark_selfdestruct();
            account.mark_created();
            account.mark_touch();
            trace!(%address, "self-destructed account wiped");
        }
    }

    /// Takes the state and logs out of the journal once no checkpoint is open.
    ///
    /// Returns `None` while a checkpoint is open, as its entries would still reference the state.
    pub fn finalize(&mut self) -> Option<(EvmState, Vec<Log>)> {
        if self.has_open_checkpoints() {
            return None;
        }
        let state = mem::take(&mut self.state);
        let logs = mem::take(&mut self.logs);
        self.journal.clear();
        self.transient_storage.clear();
        Some((state, logs))
    }

    /// Accounts changed since `checkpoint`, as they are now.
    pub fn changes_since(&self, checkpoint: JournalCheckpoint) -> Result<EvmState, JournalError> {
        let frame = self.frames[self.frame_position(checkpoint)?];
        let mut changes = EvmState::default();
        for entry in &self.journal[frame.journal_i..] {
            let (address, other) = entry.addresses();
            for address in core::iter::once(address).chain(other) {
                if let Some(account) = self.state.get(&address) {
                    changes.entry(address).or_insert_with(|| account.clone());
                }
            }
        }
        Ok(changes)
    }

    /// Logs emitted since `checkpoint`.
    pub fn logs_since(&self, checkpoint: JournalCheckpoint) -> Result<&[Log], JournalError> {
        let frame = self.frames[self.frame_position(checkpoint)?];
        Ok(&self.logs[frame.log_i..])
    }

    /// Opens a new checkpoint.
    pub fn checkpoint(&mut self) -> JournalCheckpoint {
        let id = self.next_id;
        self.next_id += 1;
        self.frames.push(CheckpointFrame {
            id,
            log_i: self.logs.len(),
            journal_i: self.journal.len(),
        });
        JournalCheckpoint { id }
    }

    /// Commits `checkpoint` and every checkpoint opened after it.
    ///
    /// Their entries stay in the journal and now belong to the enclosing checkpoint.
    pub fn checkpoint_commit(&mut self, checkpoint: JournalCheckpoint) -> Result<(), JournalError> {
        let pos = self.frame_position(checkpoint)?;
        self.frames.truncate(pos);
        if self.frames.is_empty() {
            // nothing left that could revert these entries
            self.journal.clear();
        }
        trace!(id = checkpoint.id, depth = self.frames.len(), "checkpoint committed");
        Ok(())
    }

    /// Reverts every change made since `checkpoint` and closes it together with every
    /// checkpoint opened after it.
    pub fn checkpoint_revert(&mut self, checkpoint: JournalCheckpoint) -> Result<(), JournalError> {
        let pos = self.frame_position(checkpoint)?;
        let frame = self.frames[pos];
        let state = &mut self.state;
        let transient_storage = &mut self.transient_storage;
        self.journal
            .drain(frame.journal_i..)
            .rev()
            .for_each(|entry| entry.revert(state, transient_storage));
        self.logs.truncate(frame.log_i);
        self.frames.truncate(pos);
        trace!(id = checkpoint.id, depth = self.frames.len(), "checkpoint reverted");
        Ok(())
    }

    fn frame_position(&self, checkpoint: JournalCheckpoint) -> Result<usize, JournalError> {
        self.frames
            .iter()
            .rposition(|frame| frame.id == checkpoint.id)
            .ok_or_else(|| {
                warn!(id = checkpoint.id, "stale checkpoint");
                JournalError::StaleCheckpoint(checkpoint.id)
            })
    }

    /// Mark account as touched as only touched accounts will be added to state.
    /// This is especially important for state clear where touched empty accounts needs to
    /// be removed from state.
    #[inline]
    pub fn touch(&mut self, address: Address) {
        if let Some(account) = self.state.get_mut(&address) {
            Self::touch_account(&mut self.journal, address, account);
        }
    }

    #[inline]
    fn touch_account(journal: &mut Vec<JournalEntry>, address: Address, account: &mut Account) {
        if !account.is_touched() {
            journal.push(JournalEntry::AccountTouched { address });
            account.mark_touch();
        }
    }

    /// Returns the account from the overlay, fetching it from `db` without warming it.
    fn account_or_load<'a, DB: Database>(
        state: &'a mut EvmState,
        address: Address,
        db: &mut DB,
    ) -> Result<&'a mut Account, DB::Error> {
        Ok(match state.entry(address) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(vac) => vac.insert(
                db.basic(address)?
                    .map(Account::from)
                    .unwrap_or_else(Account::new_not_existing),
            ),
        })
    }

    /// Loads account into memory. Returns whether it was cold.
    pub fn load_account<DB: Database>(
        &mut self,
        address: Address,
        db: &mut DB,
    ) -> Result<StateLoad<&mut Account>, DB::Error> {
        let is_preloaded = self.warm_preloaded_addresses.contains(&address);
        let (account, was_cold) = match self.state.entry(address) {
            Entry::Occupied(entry) => {
                let account = entry.into_mut();
                let was_cold = account.mark_warm();
                (account, was_cold)
            }
            Entry::Vacant(vac) => {
                let account = db
                    .basic(address)?
                    .map(Account::from)
                    .unwrap_or_else(Account::new_not_existing);
                (vac.insert(account), true)
            }
        };
        if was_cold {
            // journal loading of cold account.
            self.journal.push(JournalEntry::AccountWarmed { address });
        }
        Ok(StateLoad::new(account, was_cold && !is_preloaded))
    }

    /// Loads account and its code.
    pub fn load_code<DB: Database>(
        &mut self,
        address: Address,
        db: &mut DB,
    ) -> Result<StateLoad<&mut Account>, DB::Error> {
        let load = self.load_account(address, db)?;
        let info = &mut load.data.info;
        if info.code.is_none() {
            let code = if info.code_hash == KECCAK_EMPTY {
                Bytecode::default()
            } else {
                db.code_by_hash(info.code_hash)?
            };
            info.code = Some(code);
        }
        Ok(load)
    }

    /// Warms the access list entries and preloads their slots without journaling.
    pub fn warm_access_list<DB: Database>(
        &mut self,
        entries: impl IntoIterator<Item = (Address, Vec<B256>)>,
        db: &mut DB,
    ) -> Result<(), DB::Error> {
        for (address, keys) in entries {
            let account = Self::account_or_load(&mut self.state, address, db)?;
            account.mark_warm();
            let is_created = account.is_created();
            for key in keys {
                let key = U256::from_be_bytes(key.0);
                match account.storage.entry(key) {
                    Entry::Occupied(entry) => {
                        entry.into_mut().mark_warm();
                    }
                    Entry::Vacant(vac) => {
                        let value = if is_created {
                            U256::ZERO
                        } else {
                            db.storage(address, key)?
                        };
                        vac.insert(EvmStorageSlot::new(value));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the slot, loading it if needed, and whether it was cold.
    fn slot_mut<'a, DB: Database>(
        state: &'a mut EvmState,
        address: Address,
        key: U256,
        db: &mut DB,
    ) -> Result<(&'a mut EvmStorageSlot, bool), DB::Error> {
        let account = Self::account_or_load(state, address, db)?;
        // only if account is created in this tx we can assume that storage is empty.
        let is_newly_created = account.is_created();
        Ok(match account.storage.entry(key) {
            Entry::Occupied(occ) => {
                let slot = occ.into_mut();
                let is_cold = slot.mark_warm();
                (slot, is_cold)
            }
            Entry::Vacant(vac) => {
                // if storage was cleared, we don't need to ping db.
                let value = if is_newly_created {
                    U256::ZERO
                } else {
                    db.storage(address, key)?
                };
                (vac.insert(EvmStorageSlot::new(value)), true)
            }
        })
    }

    /// Loads a storage slot.
    pub fn sload<DB: Database>(
        &mut self,
        address: Address,
        key: U256,
        db: &mut DB,
    ) -> Result<StateLoad<U256>, DB::Error> {
        let (slot, is_cold) = Self::slot_mut(&mut self.state, address, key, db)?;
        let value = slot.present_value;
        if is_cold {
            self.journal
                .push(JournalEntry::StorageWarmed { address, key });
        }
        Ok(StateLoad::new(value, is_cold))
    }

    /// Stores a storage slot and returns `(original, present, new)` values.
    pub fn sstore<DB: Database>(
        &mut self,
        address: Address,
        key: U256,
        new: U256,
        db: &mut DB,
    ) -> Result<StateLoad<interpreter::SStoreResult>, DB::Error> {
        let (slot, is_cold) = Self::slot_mut(&mut self.state, address, key, db)?;
        let present = slot.present_value;
        let original = slot.original_value;
        if is_cold {
            self.journal
                .push(JournalEntry::StorageWarmed { address, key });
        }
        // new value is same as present, we don't need to do anything
        if present != new {
            slot.present_value = new;
            self.journal.push(JournalEntry::StorageChanged {
                address,
                key,
                had_value: present,
            });
        }
        Ok(StateLoad::new(
            interpreter::SStoreResult {
                original_value: original,
                present_value: present,
                new_value: new,
            },
            is_cold,
        ))
    }

    /// Read transient storage tied to the account.
    ///
    /// EIP-1153: Transient storage opcodes
    pub fn tload(&mut self, address: Address, key: U256) -> U256 {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    /// Store transient storage tied to the account.
    ///
    /// If values is different add entry to the journal
    /// so that old state can be reverted if that action is needed.
    ///
    /// EIP-1153: Transient storage opcodes
    pub fn tstore(&mut self, address: Address, key: U256, new: U256) {
        let had_value = if new.is_zero() {
            // if new values is zero, remove entry from transient storage.
            // if previous values was some insert it inside journal.
            // If it is none nothing should be inserted.
            self.transient_storage.remove(&(address, key))
        } else {
            // insert values
            let previous_value = self
                .transient_storage
                .insert((address, key), new)
                .unwrap_or_default();

            // check if previous value is same
            (previous_value != new).then_some(previous_value)
        };

        if let Some(had_value) = had_value {
            // insert in journal only if value was changed.
            self.journal.push(JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            });
        }
    }

    /// Pushes log into the journal.
    #[inline]
    pub fn log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Increments the nonce of a loaded account.
    ///
    /// Returns `None` if the account is not loaded or the nonce would overflow.
    pub fn inc_nonce(&mut self, address: Address) -> Option<u64> {
        let account = self.state.get_mut(&address)?;
        // Check if nonce is going to overflow.
        let previous_nonce = account.info.nonce;
        let nonce = previous_nonce.checked_add(1)?;
        Self::touch_account(&mut self.journal, address, account);
        self.journal.push(JournalEntry::NonceChange {
            address,
            previous_nonce,
        });
        account.info.nonce = nonce;
        Some(nonce)
    }

    /// Overwrites the nonce of an account.
    pub fn set_nonce<DB: Database>(
        &mut self,
        address: Address,
        nonce: u64,
        db: &mut DB,
    ) -> Result<(), DB::Error> {
        let account = Self::account_or_load(&mut self.state, address, db)?;
        Self::touch_account(&mut self.journal, address, account);
        self.journal.push(JournalEntry::NonceChange {
            address,
            previous_nonce: account.info.nonce,
        });
        account.info.nonce = nonce;
        Ok(())
    }

    /// Overwrites the balance of an account.
    pub fn set_balance<DB: Database>(
        &mut self,
        address: Address,
        balance: U256,
        db: &mut DB,
    ) -> Result<(), DB::Error> {
        let account = Self::account_or_load(&mut self.state, address, db)?;
        Self::touch_account(&mut self.journal, address, account);
        self.journal.push(JournalEntry::BalanceChange {
            address,
            old_balance: account.info.balance,
        });
        account.info.balance = balance;
        Ok(())
    }

    /// Sets the code of an account, loading its previous code so a revert can restore it.
    pub fn set_code<DB: Database>(
        &mut self,
        address: Address,
        code: Bytecode,
        db: &mut DB,
    ) -> Result<(), DB::Error> {
        let account = Self::account_or_load(&mut self.state, address, db)?;
        if account.info.code.is_none() && account.info.code_hash != KECCAK_EMPTY {
            account.info.code = Some(db.code_by_hash(account.info.code_hash)?);
        }
        Self::touch_account(&mut self.journal, address, account);
        let had_code = account.info.code.take();
        self.journal
            .push(JournalEntry::CodeChange { address, had_code });
        account.info.set_code(code);
        Ok(())
    }

    /// Transfers balance from two accounts. Returns error if sender balance is not enough.
    pub fn transfer<DB: Database>(
        &mut self,
        from: Address,
        to: Address,
        balance: U256,
        db: &mut DB,
    ) -> Result<Option<TransferError>, DB::Error> {
        if balance.is_zero() {
            let to_account = Self::account_or_load(&mut self.state, to, db)?;
            Self::touch_account(&mut self.journal, to, to_account);
            return Ok(None);
        }

        // Load `to` first. Once `from` is debited every account is in memory and no load can fail.
        Self::account_or_load(&mut self.state, to, db)?;

        // sub balance from
        let from_account = Self::account_or_load(&mut self.state, from, db)?;
        let Some(from_balance) = from_account.info.balance.checked_sub(balance) else {
            return Ok(Some(TransferError::OutOfFunds));
        };
        from_account.info.balance = from_balance;
        Self::touch_account(&mut self.journal, from, from_account);

        // add balance to
        let to_account = Self::account_or_load(&mut self.state, to, db)?;
        let Some(to_balance) = to_account.info.balance.checked_add(balance) else {
            // give the funds back, nothing was journaled for them yet.
            if let Some(from_account) = self.state.get_mut(&from) {
                from_account.info.balance += balance;
            }
            return Ok(Some(TransferError::OverflowPayment));
        };
        to_account.info.balance = to_balance;
        Self::touch_account(&mut self.journal, to, to_account);

        self.journal
            .push(JournalEntry::BalanceTransfer { from, to, balance });
        Ok(None)
    }

    /// Creates account or returns false if collision is detected.
    ///
    /// There are few steps done:
    /// 1. Make created account warm loaded (AccessList) and this should
    ///    be done before subroutine checkpoint is created.
    /// 2. Check if there is collision of newly created account with existing one.
    /// 3. Mark created account as created.
    /// 4. Add fund to created account
    /// 5. Increment nonce of created account if SpuriousDragon is active
    /// 6. Decrease balance of caller account.
    ///
    /// Both accounts are expected to be loaded; a missing one is treated as empty.
    pub fn create_account_checkpoint(
        &mut self,
        caller: Address,
        address: Address,
        balance: U256,
    ) -> Result<JournalCheckpoint, TransferError> {
        // Enter subroutine
        let checkpoint = self.checkpoint();

        // Fetch balance of caller.
        let caller_balance = self
            .state
            .get(&caller)
            .map(|account| account.info.balance)
            .unwrap_or_default();
        // Check if caller has enough balance to send to the created contract.
        if caller_balance < balance {
            let _ = self.checkpoint_revert(checkpoint);
            return Err(TransferError::OutOfFunds);
        }

        let spec = self.spec;
        let account = self
            .state
            .entry(address)
            .or_insert_with(Account::new_not_existing);

        // New account can be created if:
        // Bytecode is not empty.
        // Nonce is not zero
        if account.info.code_hash != KECCAK_EMPTY || account.info.nonce != 0 {
            let _ = self.checkpoint_revert(checkpoint);
            return Err(TransferError::CreateCollision);
        }

        // set account status to created.
        account.mark_created();

        // this entry will revert set nonce.
        self.journal.push(JournalEntry::AccountCreated { address });
        account.info.code = None;

        // Set all storages to default value. They need to be present to act as accessed slots in access list.
        // it shouldn't be possible for them to have different values then zero as code is not existing for this account,
        // but because tests can change that assumption we are doing it.
        for slot in account.storage.values_mut() {
            slot.original_value = U256::ZERO;
            slot.present_value = U256::ZERO;
        }

        // touch account. This is important as for pre SpuriousDragon account could be
        // saved even empty.
        Self::touch_account(&mut self.journal, address, account);

        // Add balance to created account, as we already have target here.
        let Some(new_balance) = account.info.balance.checked_add(balance) else {
            let _ = self.checkpoint_revert(checkpoint);
            return Err(TransferError::OverflowPayment);
        };
        account.info.balance = new_balance;

        // EIP-161: State trie clearing (invariant-preserving alternative)
        if spec.is_enabled_in(SPURIOUS_DRAGON) {
            // nonce is going to be reset to zero in AccountCreated journal entry.
            account.info.nonce = 1;
        }

        // Sub balance from caller
        if let Some(caller_account) = self.state.get_mut(&caller) {
            caller_account.info.balance -= balance;
            Self::touch_account(&mut self.journal, caller, caller_account);
        }

        // add journal entry of transferred balance
        self.journal.push(JournalEntry::BalanceTransfer {
            from: caller,
            to: address,
            balance,
        });

        Ok(checkpoint)
    }

    /// Performs selfdestruct action.
    /// Transfers balance from address to target. Check if target exist/is_cold
    ///
    /// From Cancun the account is only destroyed when it was created in the same transaction
    /// (EIP-6780); otherwise only the balance moves.
    pub fn selfdestruct<DB: Database>(
        &mut self,
        address: Address,
        target: Address,
        db: &mut DB,
    ) -> Result<StateLoad<SelfDestructResult>, DB::Error> {
        let spec = self.spec;
        let load = self.load_account(target, db)?;
        let is_cold = load.is_cold;
        let target_exists = if spec.is_enabled_in(SPURIOUS_DRAGON) {
            !load.data.is_empty()
        } else {
            !load.data.is_loaded_as_not_existing() || load.data.is_touched()
        };

        let account = Self::account_or_load(&mut self.state, address, db)?;
        let balance = account.info.balance;
        let previously_destroyed = account.is_selfdestructed();
        let destroy = !spec.is_enabled_in(CANCUN) || account.is_created_locally();

        let entry = if destroy {
            account.mark_selfdestruct();
            account.info.balance = U256::ZERO;
            Some(JournalEntry::AccountDestroyed {
                address,
                target,
                was_destroyed: previously_destroyed,
                had_balance: balance,
            })
        } else if address != target {
            account.info.balance = U256::ZERO;
            Some(JournalEntry::BalanceTransfer {
                from: address,
                to: target,
                balance,
            })
        } else {
            // EIP-6780: sending to itself keeps the balance.
            None
        };

        // NOTE: In case that target and destroyed addresses are same, balance will be lost.
        if address != target {
            if let Some(target_account) = self.state.get_mut(&target) {
                Self::touch_account(&mut self.journal, target, target_account);
                target_account.info.balance = target_account.info.balance.saturating_add(balance);
            }
        }
        if let Some(entry) = entry {
            self.journal.push(entry);
        }

        Ok(StateLoad::new(
            SelfDestructResult {
                had_value: !balance.is_zero(),
                target_exists,
                previously_destroyed,
            },
            is_cold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::InMemoryDB;
    use primitives::{address, Bytes, LogData};

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    fn db_with_alice(balance: u64) -> InMemoryDB {
        let mut db = InMemoryDB::default();
        db.insert_account_info(ALICE, AccountInfo::from_balance(U256::from(balance)));
        db
    }

    #[test]
    fn checkpoint_round_trip() {
        let mut db = db_with_alice(100);
        let mut journal = JournaledState::default();
        journal.load_account(ALICE, &mut db).unwrap();
        let before = journal.state.clone();

        let cp = journal.checkpoint();
        assert_eq!(journal.transfer(ALICE, BOB, U256::from(40), &mut db), Ok(None));
        journal.sstore(BOB, U256::from(1), U256::from(7), &mut db).unwrap();
        journal.tstore(BOB, U256::from(1), U256::from(3));
        journal.log(Log {
            address: BOB,
            data: LogData::new_unchecked(vec![], Bytes::new()),
        });
        journal.inc_nonce(ALICE).unwrap();

        journal.checkpoint_revert(cp).unwrap();

        assert_eq!(journal.state[&ALICE].info, before[&ALICE].info);
        assert_eq!(journal.state[&BOB].info.balance, U256::ZERO);
        assert_eq!(journal.state[&BOB].storage[&U256::from(1)].present_value, U256::ZERO);
        assert_eq!(journal.tload(BOB, U256::from(1)), U256::ZERO);
        assert!(journal.logs.is_empty());
        assert!(!journal.has_open_checkpoints());
    }

    #[test]
    fn nested_commit_merges_into_parent() {
        let mut db = db_with_alice(100);
        let mut journal = JournaledState::default();

        let outer = journal.checkpoint();
        let inner = journal.checkpoint();
        assert_eq!(journal.depth(), 2);
        journal.set_balance(BOB, U256::from(5), &mut db).unwrap();
        journal.checkpoint_commit(inner).unwrap();
        assert_eq!(journal.state[&BOB].info.balance, U256::from(5));

        journal.checkpoint_revert(outer).unwrap();
        assert_eq!(journal.state[&BOB].info.balance, U256::ZERO);
    }

    #[test]
    fn stale_checkpoints_are_rejected() {
        let mut journal = JournaledState::default();
        let outer = journal.checkpoint();
        let inner = journal.checkpoint();

        journal.checkpoint_revert(outer).unwrap();
        assert_eq!(
            journal.checkpoint_commit(inner),
            Err(JournalError::StaleCheckpoint(inner.id()))
        );
        assert_eq!(
            journal.checkpoint_revert(outer),
            Err(JournalError::StaleCheckpoint(outer.id()))
        );

        let next = journal.checkpoint();
        assert!(next.id() > inner.id());
    }

    #[test]
    fn transfer_out_of_funds() {
        let mut db = db_with_alice(10);
        let mut journal = JournaledState::default();
        assert_eq!(
            journal.transfer(ALICE, BOB, U256::from(11), &mut db),
            Ok(Some(TransferError::OutOfFunds))
        );
        assert_eq!(journal.state[&ALICE].info.balance, U256::from(10));
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("unreachable account")
        }
    }

    impl core::error::Error for Unreachable {}
    impl database_interface::DBErrorMarker for Unreachable {}

    /// Store that fails every lookup of one address.
    struct FailingOn(Address, InMemoryDB);

    impl Database for FailingOn {
        type Error = Unreachable;

        fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
            if address == self.0 {
                return Err(Unreachable);
            }
            Ok(self.1.basic(address).unwrap())
        }

        fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
            Ok(self.1.code_by_hash(code_hash).unwrap())
        }

        fn storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
            Ok(self.1.storage(address, index).unwrap())
        }

        fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
            Ok(self.1.block_hash(number).unwrap())
        }
    }

    #[test]
    fn failed_transfer_load_moves_no_balance() {
        let mut db = FailingOn(BOB, db_with_alice(100));
        let mut journal = JournaledState::default();
        journal.load_account(ALICE, &mut db).unwrap();

        let cp = journal.checkpoint();
        assert_eq!(
            journal.transfer(ALICE, BOB, U256::from(40), &mut db),
            Err(Unreachable)
        );
        assert_eq!(journal.state[&ALICE].info.balance, U256::from(100));

        journal.checkpoint_revert(cp).unwrap();
        assert_eq!(journal.state[&ALICE].info.balance, U256::from(100));
    }

    #[test]
    fn storage_warms_once_per_tx() {
        let mut db = db_with_alice(0);
        db.insert_account_storage(ALICE, U256::from(1), U256::from(9))
            .unwrap();
        let mut journal = JournaledState::default();
        journal.load_account(ALICE, &mut db).unwrap();

        let first = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert_eq!(first, StateLoad::new(U256::from(9), true));
        let second = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert!(!second.is_cold);

        let store = journal
            .sstore(ALICE, U256::from(1), U256::from(2), &mut db)
            .unwrap();
        assert_eq!(store.data.original_value, U256::from(9));
        assert_eq!(store.data.present_value, U256::from(9));

        journal.begin_tx(SpecId::CANCUN, HashSet::default());
        let again = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert_eq!(again, StateLoad::new(U256::from(2), true));
        let store = journal
            .sstore(ALICE, U256::from(1), U256::from(3), &mut db)
            .unwrap();
        assert_eq!(store.data.original_value, U256::from(2));
    }

    #[test]
    fn preloaded_addresses_are_warm() {
        let mut db = InMemoryDB::default();
        let mut warm = HashSet::default();
        warm.insert(BOB);
        let mut journal = JournaledState::new(SpecId::CANCUN, warm);
        assert!(!journal.load_account(BOB, &mut db).unwrap().is_cold);
        assert!(journal.load_account(ALICE, &mut db).unwrap().is_cold);
        assert!(!journal.load_account(ALICE, &mut db).unwrap().is_cold);
    }

    #[test]
    fn selfdestruct_only_destroys_created_accounts() {
        let mut db = db_with_alice(50);
        let mut journal = JournaledState::default();
        journal.load_account(ALICE, &mut db).unwrap();

        let res = journal.selfdestruct(ALICE, BOB, &mut db).unwrap();
        assert!(res.data.had_value);
        assert!(!res.data.target_exists);
        assert!(!journal.state[&ALICE].is_selfdestructed());
        assert_eq!(journal.state[&BOB].info.balance, U256::from(50));

        journal.inc_nonce(ALICE).unwrap();
        let err = journal
            .create_account_checkpoint(BOB, ALICE, U256::ZERO)
            .unwrap_err();
        assert_eq!(err, TransferError::CreateCollision);

        let created = address!("0000000000000000000000000000000000c0ffee");
        journal.load_account(created, &mut db).unwrap();
        journal
            .create_account_checkpoint(BOB, created, U256::from(5))
            .unwrap();
        journal.selfdestruct(created, BOB, &mut db).unwrap();
        assert!(journal.state[&created].is_selfdestructed());

        journal.end_tx();
        assert!(!journal.state[&created].is_selfdestructed());
        assert!(journal.state[&created].is_empty());
    }

    #[test]
    fn finalize_waits_for_open_checkpoints() {
        let mut db = db_with_alice(1);
        let mut journal = JournaledState::default();
        let cp = journal.checkpoint();
        journal.load_account(ALICE, &mut db).unwrap();
        assert!(journal.finalize().is_none());

        journal.checkpoint_commit(cp).unwrap();
        let (state, logs) = journal.finalize().unwrap();
        assert!(state.contains_key(&ALICE));
        assert!(logs.is_empty());
        assert!(journal.state.is_empty());
    }

    #[test]
    fn set_code_reverts_to_previous_code() {
        let mut db = InMemoryDB::default();
        let mut journal = JournaledState::default();
        let code = Bytecode::new_raw(Bytes::from_static(&[0x60, 0x00]));

        let cp = journal.checkpoint();
        journal.set_code(ALICE, code.clone(), &mut db).unwrap();
        assert_eq!(journal.state[&ALICE].info.code_hash, code.hash_slow());
        journal.checkpoint_revert(cp).unwrap();
        assert_eq!(journal.state[&ALICE].info.code_hash, KECCAK_EMPTY);
    }

    #[test]
    fn changes_since_lists_touched_accounts() {
        let mut db = db_with_alice(10);
        let mut journal = JournaledState::default();
        let cp = journal.checkpoint();
        journal.transfer(ALICE, BOB, U256::from(1), &mut db).unwrap();
        let changes = journal.changes_since(cp).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[&BOB].info.balance, U256::from(1));
    }
}
