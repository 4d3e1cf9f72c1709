//! Checks that run before any state is touched.
use context::{EVMError, Env, InvalidTransaction};
use interpreter::gas;

/// Validates the block and transaction environment.
pub fn validate_env<DB>(env: &Env) -> Result<(), EVMError<DB>> {
    // Important: validate block before tx.
    env.validate_block_env()?;
    env.validate_tx()?;
    Ok(())
}

/// Calculates the intrinsic gas of the transaction and checks it fits into the gas limit.
///
/// Returns the intrinsic gas.
pub fn validate_initial_tx_gas<DB>(env: &Env) -> Result<u64, EVMError<DB>> {
    let (accounts, storages) = env.tx.access_list.counts();
    let initial_gas = gas::validate_initial_tx_gas(
        env.spec_id(),
        &env.tx.data,
        env.tx.is_create(),
        accounts,
        storages,
    );

    // Additional check to see if limit is big enough to cover initial gas.
    if initial_gas > env.tx.gas_limit {
        return Err(InvalidTransaction::CallGasCostMoreThanGasLimit {
            initial_gas,
            gas_limit: env.tx.gas_limit,
        }
        .into());
    }
    Ok(initial_gas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::{bytes, hardfork::SpecId, Bytes, TxKind};
    use rstest::rstest;

    #[rstest]
    #[case::empty(SpecId::CANCUN, Bytes::new(), 21_000)]
    #[case::istanbul_calldata(SpecId::CANCUN, bytes!("00ff"), 21_000 + 4 + 16)]
    #[case::frontier_calldata(SpecId::FRONTIER, bytes!("00ff"), 21_000 + 4 + 68)]
    fn intrinsic_gas_of_call(#[case] spec: SpecId, #[case] data: Bytes, #[case] expected: u64) {
        let mut env = Env::default();
        env.cfg.spec = spec;
        env.tx.gas_limit = 100_000;
        env.tx.data = data;
        assert_eq!(validate_initial_tx_gas::<()>(&env), Ok(expected));
    }

    #[test]
    fn gas_limit_below_intrinsic_gas() {
        let mut env = Env::default();
        env.tx.transact_to = TxKind::Create;
        env.tx.gas_limit = 21_000;
        assert_eq!(
            validate_initial_tx_gas::<()>(&env),
            Err(EVMError::Transaction(
                InvalidTransaction::CallGasCostMoreThanGasLimit {
                    initial_gas: 53_000,
                    gas_limit: 21_000
                }
            ))
        );
    }
}
