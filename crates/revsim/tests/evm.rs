use revsim::{
    context::{BlockEnv, CfgEnv, JournalError, TxEnv},
    inspector::inspectors::TracerEip3155,
    primitives::{address, bytes, hardfork::SpecId, Address, Bytes, U256},
    state::AccountInfo,
    CallError, Evm, EvmOpts,
};
use rstest::rstest;
use std::{
    io::Write,
    sync::{Arc, Mutex},
};

const DEPLOYER: Address = address!("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
const TARGET: Address = address!("0x0000000000000000000000000000000000001000");

/// Increments slot 0 and returns the new value.
const COUNTER_RUNTIME: Bytes = bytes!("6000546001018060005560005260206000f3");
/// Copies [`COUNTER_RUNTIME`] into memory and returns it.
const COUNTER_INIT: Bytes =
    bytes!("6012600c60003960126000f36000546001018060005560005260206000f3");

fn word(value: u64) -> Bytes {
    Bytes::from(U256::from(value).to_be_bytes::<32>())
}

fn deploy_counter(evm: &mut Evm) -> Address {
    evm.deploy(DEPLOYER, COUNTER_INIT, U256::ZERO).unwrap()
}

#[test]
fn deploy_address_follows_deployer_nonce() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);

    assert_eq!(
        counter,
        address!("0x3e4ea2156166390f880071d94458efb098473311")
    );
    assert_eq!(evm.get_nonce(DEPLOYER).unwrap(), 1);
    assert_eq!(evm.get_code(counter).unwrap(), COUNTER_RUNTIME);
    assert!(evm.result().unwrap().is_success());
}

#[test]
fn message_call_keeps_nothing() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);

    for _ in 0..2 {
        let out = evm
            .message_call(ALICE, counter, Bytes::new(), U256::ZERO, None)
            .unwrap();
        assert_eq!(out, word(1));
    }
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::ZERO);
    assert_eq!(evm.get_nonce(ALICE).unwrap(), 0);
}

#[test]
fn committing_calls_accumulate() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);

    assert_eq!(
        evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
            .unwrap(),
        word(1)
    );
    assert_eq!(
        evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
            .unwrap(),
        word(2)
    );
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::from(2));
    assert_eq!(evm.get_nonce(ALICE).unwrap(), 2);

    // the diff shows the next value, the store keeps the current one
    let (out, diff) = evm
        .call_raw(ALICE, counter, Bytes::new(), U256::ZERO)
        .unwrap();
    assert_eq!(out, word(3));
    assert_eq!(
        diff[&counter].storage[&U256::ZERO].present_value(),
        U256::from(3)
    );
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::from(2));
}

#[test]
fn snapshot_revert_restores_state() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);

    let snapshot = evm.snapshot();
    evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
        .unwrap();
    evm.set_balance(BOB, U256::from(5)).unwrap();
    evm.set_storage(counter, U256::from(7), U256::from(9))
        .unwrap();
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::from(1));
    assert_eq!(evm.get_balance(BOB).unwrap(), U256::from(5));

    evm.revert(snapshot).unwrap();
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::ZERO);
    assert_eq!(evm.storage(counter, U256::from(7)).unwrap(), U256::ZERO);
    assert_eq!(evm.get_balance(BOB).unwrap(), U256::ZERO);
    assert_eq!(evm.get_nonce(ALICE).unwrap(), 0);

    let err = evm.revert(snapshot).unwrap_err();
    assert!(matches!(
        err,
        CallError::Journal(JournalError::StaleCheckpoint(id)) if id == snapshot.id()
    ));
}

#[test]
fn snapshot_commit_keeps_state() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);

    let outer = evm.snapshot();
    evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
        .unwrap();
    let inner = evm.snapshot();
    evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
        .unwrap();
    evm.revert(inner).unwrap();
    evm.commit(outer).unwrap();

    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::from(1));
    assert_eq!(
        evm.db().cache.accounts[&counter].storage[&U256::ZERO],
        U256::from(1)
    );
    assert!(matches!(
        evm.commit(inner),
        Err(CallError::Journal(JournalError::StaleCheckpoint(_)))
    ));
}

#[test]
fn reverting_an_outer_snapshot_closes_inner_ones() {
    let mut evm = Evm::default();
    let outer = evm.snapshot();
    evm.set_balance(ALICE, U256::from(1)).unwrap();
    let inner = evm.snapshot();
    evm.set_balance(ALICE, U256::from(2)).unwrap();

    evm.revert(outer).unwrap();
    assert_eq!(evm.get_balance(ALICE).unwrap(), U256::ZERO);
    assert!(evm.revert(inner).is_err());
}

#[rstest]
#[case::without_strict(false)]
#[case::with_strict(true)]
fn lack_of_funds_is_always_an_error(#[case] strict: bool) {
    let mut evm = Evm::new(EvmOpts::default().strict(strict)).unwrap();
    evm.set_tx_env(TxEnv {
        gas_price: U256::from(1),
        ..Default::default()
    });

    let err = evm
        .message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None)
        .unwrap_err();
    assert!(err.to_string().starts_with("Transaction(LackOfFundForMaxFee"));
    assert!(evm.result().is_none());
}

#[test]
fn strict_mode_surfaces_reverts() {
    let mut evm = Evm::new(EvmOpts::default().strict(true)).unwrap();
    // PUSH1 0 PUSH1 0 REVERT
    evm.set_code(TARGET, bytes!("60006000fd")).unwrap();

    let err = evm
        .message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CallError::Reverted { ref output, gas_used: 21006 } if output.is_empty()
    ));
    assert!(evm.result().unwrap().is_revert());
}

#[test]
fn strict_mode_surfaces_halts() {
    let mut evm = Evm::new(EvmOpts::default().strict(true)).unwrap();
    evm.set_code(TARGET, bytes!("fe")).unwrap();

    let err = evm
        .message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, Some(100_000))
        .unwrap_err();
    assert!(matches!(
        err,
        CallError::Halted {
            gas_used: 100_000,
            ..
        }
    ));
}

#[test]
fn failures_are_plain_results_without_strict() {
    let mut evm = Evm::default();
    evm.set_code(TARGET, bytes!("60006000fd")).unwrap();

    let out = evm
        .message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None)
        .unwrap();
    assert!(out.is_empty());
    assert!(evm.result().unwrap().is_revert());
}

#[test]
fn failed_deploy_is_an_error() {
    let mut evm = Evm::default();
    // PUSH1 0 PUSH1 0 REVERT as init code
    let err = evm
        .deploy(DEPLOYER, bytes!("60006000fd"), U256::ZERO)
        .unwrap_err();
    assert!(matches!(err, CallError::Reverted { .. }));
}

#[test]
fn value_transfers_conserve_balance() {
    let mut evm = Evm::default();
    evm.set_balance(ALICE, U256::from(1_000)).unwrap();

    evm.call_raw_committing(ALICE, BOB, U256::from(300), Bytes::new())
        .unwrap();

    let alice = evm.get_balance(ALICE).unwrap();
    let bob = evm.get_balance(BOB).unwrap();
    assert_eq!(alice, U256::from(700));
    assert_eq!(bob, U256::from(300));
    assert_eq!(alice + bob, U256::from(1_000));
}

#[test]
fn logs_are_kept_in_the_result() {
    let mut evm = Evm::default();
    // PUSH1 0 PUSH1 0 LOG0 STOP
    evm.set_code(TARGET, bytes!("60006000a000")).unwrap();

    evm.message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None)
        .unwrap();
    let logs = evm.result().unwrap().logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].address, TARGET);
}

#[test]
fn environment_round_trips() {
    let mut evm = Evm::default();
    let block = BlockEnv {
        number: 42,
        timestamp: 1_700_000_000,
        coinbase: BOB,
        ..Default::default()
    };
    let tx = TxEnv {
        caller: ALICE,
        data: bytes!("c0ffee"),
        ..Default::default()
    };
    let cfg = CfgEnv::new_with_spec(SpecId::SHANGHAI).with_chain_id(10);

    evm.set_block_env(block.clone());
    evm.set_tx_env(tx.clone());
    evm.set_cfg_env(cfg.clone());
    evm.message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None)
        .unwrap();

    assert_eq!(evm.env().block, block);
    assert_eq!(evm.env().tx, tx);
    assert_eq!(evm.env().cfg, cfg);
}

#[test]
fn transact_runs_the_tx_environment() {
    let mut evm = Evm::default();
    let counter = deploy_counter(&mut evm);
    evm.set_tx_env(TxEnv {
        caller: ALICE,
        transact_to: counter.into(),
        ..Default::default()
    });

    let result = evm.transact(true).unwrap();
    assert_eq!(result.output(), Some(&word(1)));
    let result = evm.transact(false).unwrap();
    assert_eq!(result.output(), Some(&word(2)));
    assert_eq!(evm.storage(counter, U256::ZERO).unwrap(), U256::from(1));
}

#[test]
fn account_info_inside_a_snapshot() {
    let mut evm = Evm::default();
    let info = AccountInfo::from_balance(U256::from(7)).with_nonce(3);
    evm.insert_account_info(ALICE, info.clone()).unwrap();
    assert_eq!(evm.basic(ALICE).unwrap(), info);

    let snapshot = evm.snapshot();
    let replaced = AccountInfo::from_balance(U256::from(1)).with_nonce(9);
    evm.insert_account_info(ALICE, replaced.clone()).unwrap();
    assert_eq!(evm.basic(ALICE).unwrap(), replaced);

    evm.revert(snapshot).unwrap();
    assert_eq!(evm.basic(ALICE).unwrap(), info);
}

#[test]
fn unknown_accounts_read_as_empty() {
    let mut evm = Evm::default();
    assert_eq!(evm.basic(BOB).unwrap(), AccountInfo::default());
    assert!(evm.get_code(BOB).unwrap().is_empty());
    assert_eq!(evm.storage(BOB, U256::from(1)).unwrap(), U256::ZERO);
}

#[test]
fn tracing_does_not_change_results() {
    let mut plain = Evm::default();
    let mut traced = Evm::new(EvmOpts::default().with_tracing(true)).unwrap();

    let mut results = Vec::new();
    for evm in [&mut plain, &mut traced] {
        let counter = deploy_counter(evm);
        evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
            .unwrap();
        results.push((
            counter,
            evm.result().cloned(),
            evm.storage(counter, U256::ZERO).unwrap(),
        ));
    }
    assert_eq!(results[0], results[1]);
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn lines(&self) -> Vec<serde_json::Value> {
        let data = self.0.lock().unwrap();
        std::str::from_utf8(&data)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[test]
fn trace_summary_reports_charged_gas() {
    let buffer = SharedBuffer::default();
    let mut evm = Evm::default();
    evm.set_inspector(TracerEip3155::new(Box::new(buffer.clone())));
    evm.set_balance(ALICE, U256::from(10)).unwrap();

    // no code runs for a plain transfer, the summary is the only line
    evm.call_raw_committing(ALICE, BOB, U256::from(1), Bytes::new())
        .unwrap();
    assert_eq!(evm.result().unwrap().gas_used(), 21_000);
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["gasUsed"], "0x5208");
    assert_eq!(lines[0]["pass"], true);

    let counter = deploy_counter(&mut evm);
    evm.call_raw_committing(ALICE, counter, U256::ZERO, Bytes::new())
        .unwrap();
    let summary = buffer.lines().pop().unwrap();
    let gas_used = evm.result().unwrap().gas_used();
    assert_eq!(summary["gasUsed"], format!("{gas_used:#x}"));
    assert_eq!(summary["output"], word(1).to_string());
}

#[test]
fn fork_block_requires_fork_url() {
    let opts = EvmOpts {
        fork_block: Some("latest".into()),
        ..Default::default()
    };
    assert!(matches!(Evm::new(opts), Err(CallError::InvalidOption(_))));
}
