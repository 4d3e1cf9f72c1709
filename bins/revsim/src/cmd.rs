pub mod blob_fee;
pub mod call;
pub mod run;

use clap::Parser;
use revsim::CallError;
use std::io::Error as IoError;

#[derive(Parser, Debug)]
#[command(infer_subcommands = true, version, about)]
#[allow(clippy::large_enum_variant)]
pub enum MainCmd {
    /// Run EVM bytecode against an in-memory state
    Run(run::Cmd),
    /// Compute the blob gas price for an excess blob gas value
    BlobFee(blob_fee::Cmd),
    /// Call a contract on a forked chain without committing
    Call(call::Cmd),
}

#[derive(Debug, thiserror::Error)]
pub enum Errors {
    #[error("The specified path does not exist")]
    PathNotExists,
    #[error("Invalid bytecode")]
    InvalidBytecode,
    #[error("Invalid input")]
    InvalidInput,
    #[error(transparent)]
    Call(#[from] CallError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl MainCmd {
    pub fn run(&self) -> Result<(), Errors> {
        match self {
            Self::Run(cmd) => cmd.run(),
            Self::BlobFee(cmd) => {
                cmd.run();
                Ok(())
            }
            Self::Call(cmd) => cmd.run(),
        }
    }
}

/// Decodes hex with or without a `0x` prefix, ignoring surrounding whitespace.
pub(crate) fn decode_hex(input: &str) -> Option<Vec<u8>> {
    revsim::primitives::hex::decode(input.trim().trim_start_matches("0x")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Some(vec![]))]
    #[case("0x6001", Some(vec![0x60, 0x01]))]
    #[case(" 6001\n", Some(vec![0x60, 0x01]))]
    #[case("0xzz", None)]
    fn hex_arguments(#[case] input: &str, #[case] expected: Option<Vec<u8>>) {
        assert_eq!(decode_hex(input), expected);
    }

    #[test]
    fn subcommands_parse() {
        let cmd = MainCmd::try_parse_from(["revsim", "blob-fee", "16777216"]).unwrap();
        assert!(matches!(cmd, MainCmd::BlobFee(_)));

        let cmd = MainCmd::try_parse_from([
            "revsim",
            "run",
            "6001",
            "--trace",
            "--spec",
            "Shanghai",
        ])
        .unwrap();
        assert!(matches!(cmd, MainCmd::Run(_)));

        assert!(MainCmd::try_parse_from(["revsim", "run", "--spec", "Osaka", "00"]).is_err());
    }
}
