use super::{decode_hex, Errors};
use clap::Parser;
use revsim::{
    context::CfgEnv,
    primitives::{address, hardfork::SpecId, Address, U256},
    Evm, EvmOpts,
};
use std::{borrow::Cow, fs, path::PathBuf, time::Instant};

/// Account the bytecode is installed at.
pub const RUN_TARGET: Address = address!("0xffffffffffffffffffffffffffffffffffffffff");
/// Account the call is made from.
pub const RUN_CALLER: Address = address!("0x1000000000000000000000000000000000000000");

/// Runs arbitrary EVM bytecode.
///
/// Bytecode can be provided from cli or from file with `--path` option.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Hex-encoded EVM bytecode to be executed
    #[arg(required_unless_present = "path")]
    bytecode: Option<String>,
    /// Path to a file containing the hex-encoded EVM bytecode to be executed
    ///
    /// Overrides the positional `bytecode` argument.
    #[arg(long)]
    path: Option<PathBuf>,
    /// Hex-encoded input/calldata bytes
    #[arg(long, default_value = "")]
    input: String,
    /// Gas limit
    #[arg(long, default_value = "1000000000")]
    gas_limit: u64,
    /// Hardfork to execute with
    #[arg(long, default_value = "Cancun")]
    spec: SpecId,
    /// Run the bytecode as init code and deploy its output
    #[arg(long)]
    create: bool,
    /// Whether to print the state changes
    #[arg(long)]
    state: bool,
    /// Stream an EIP-3155 trace to stdout
    #[arg(long)]
    trace: bool,
}

impl Cmd {
    /// Runs the command.
    pub fn run(&self) -> Result<(), Errors> {
        let bytecode_str: Cow<'_, str> = if let Some(path) = &self.path {
            if !path.exists() {
                return Err(Errors::PathNotExists);
            }
            fs::read_to_string(path)?.into()
        } else if let Some(bytecode) = &self.bytecode {
            bytecode.as_str().into()
        } else {
            return Err(Errors::InvalidBytecode);
        };
        let bytecode = decode_hex(&bytecode_str).ok_or(Errors::InvalidBytecode)?;
        let input = decode_hex(&self.input).ok_or(Errors::InvalidInput)?;

        let mut evm = Evm::new(
            EvmOpts::default()
                .with_gas_limit(self.gas_limit)
                .with_tracing(self.trace),
        )?;
        evm.set_cfg_env(CfgEnv::new_with_spec(self.spec));

        let time = Instant::now();
        if self.create {
            let address = evm.deploy(RUN_CALLER, bytecode.into(), U256::ZERO)?;
            println!("Deployed at: {address}");
        } else {
            evm.set_code(RUN_TARGET, bytecode.into())?;
            if self.state {
                let (output, state) =
                    evm.call_raw(RUN_CALLER, RUN_TARGET, input.into(), U256::ZERO)?;
                println!("Output: {output}");
                println!("State: {state:#?}");
            } else {
                evm.message_call(RUN_CALLER, RUN_TARGET, input.into(), U256::ZERO, None)?;
            }
        }
        let time = time.elapsed();

        println!("Result: {:#?}", evm.result());
        println!("Elapsed: {time:?}");
        Ok(())
    }
}
