use clap::Parser;
use revsim::primitives::eip4844::{calc_blob_gasprice, calc_excess_blob_gas};

/// Computes the EIP-4844 blob gas price.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Excess blob gas of the block
    excess_blob_gas: u64,
    /// Blob gas used by the block; also prints the excess blob gas of the next block
    #[arg(long)]
    blob_gas_used: Option<u64>,
}

impl Cmd {
    /// Runs the command.
    pub fn run(&self) {
        println!("{}", calc_blob_gasprice(self.excess_blob_gas));
        if let Some(used) = self.blob_gas_used {
            let next = calc_excess_blob_gas(self.excess_blob_gas, used);
            println!("next excess blob gas: {next}");
            println!("next blob gas price: {}", calc_blob_gasprice(next));
        }
    }
}
