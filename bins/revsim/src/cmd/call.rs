use super::{decode_hex, Errors};
use clap::Parser;
use revsim::{
    primitives::{Address, U256},
    Evm, EvmOpts,
};

/// Calls a contract on a forked chain. Nothing is committed.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// JSON-RPC endpoint to fork from
    #[arg(long)]
    fork_url: String,
    /// Block to fork at: a tag, a number or a hash
    #[arg(long, default_value = "latest")]
    block: String,
    /// Called contract
    #[arg(long)]
    to: Address,
    /// Caller
    #[arg(long, default_value_t = Address::ZERO)]
    from: Address,
    /// Hex-encoded calldata
    #[arg(long, default_value = "")]
    data: String,
    /// Stream an EIP-3155 trace to stdout
    #[arg(long)]
    trace: bool,
}

impl Cmd {
    /// Runs the command.
    pub fn run(&self) -> Result<(), Errors> {
        let data = decode_hex(&self.data).ok_or(Errors::InvalidInput)?;
        let mut evm = Evm::new(
            EvmOpts::fork(&self.fork_url)
                .with_fork_block(&self.block)
                .with_tracing(self.trace),
        )?;
        tracing::info!(block = evm.env().block.number, "forked");

        let output = evm.message_call(self.from, self.to, data.into(), U256::ZERO, None)?;
        println!("Output: {output}");
        if let Some(result) = evm.result() {
            println!("Gas used: {}", result.gas_used());
        }
        Ok(())
    }
}
