use context::Env;

/// Construction options of an [`Evm`](crate::Evm).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvmOpts {
    /// Initial environment. With a fork and no environment, the block environment and chain id
    /// are read from the pinned block.
    pub env: Option<Env>,
    /// JSON-RPC endpoint to fork state from.
    pub fork_url: Option<String>,
    /// Block to fork at: `latest`, another tag, a number or a block hash. Defaults to `latest`.
    pub fork_block: Option<String>,
    /// Gas limit of facade calls that do not pass their own.
    pub gas_limit: u64,
    /// Stream an EIP-3155 trace of every transaction to stdout.
    pub tracing: bool,
    /// Turn reverts and halts into errors.
    pub strict: bool,
}

impl Default for EvmOpts {
    fn default() -> Self {
        Self {
            env: None,
            fork_url: None,
            fork_block: None,
            gas_limit: u64::MAX,
            tracing: false,
            strict: false,
        }
    }
}

impl EvmOpts {
    /// Forks state from `url` at its latest block.
    pub fn fork(url: impl Into<String>) -> Self {
        Self {
            fork_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the fork block.
    pub fn with_fork_block(mut self, block: impl Into<String>) -> Self {
        self.fork_block = Some(block.into());
        self
    }

    /// Sets the initial environment.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    /// Sets the default gas limit of facade calls.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Enables EIP-3155 tracing to stdout.
    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    /// Enables strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
