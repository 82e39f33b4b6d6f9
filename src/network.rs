use crate::deployment::DeploymentEnv;

pub const ROOTSTOCK_TESTNET_CHAIN_ID: u64 = 31;
pub const LOCAL_CHAIN_ID: u64 = 31337;
pub const DEFAULT_TESTNET_RPC_URL: &str = "https://public-node.testnet.rsk.co";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:8545";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkTarget {
    Testnet { url: String },
    Local { url: String },
}

impl NetworkTarget {
    pub fn testnet(url: Option<String>) -> Self {
        NetworkTarget::Testnet {
            url: url.unwrap_or_else(|| DEFAULT_TESTNET_RPC_URL.to_string()),
        }
    }

    pub fn local(url: Option<String>) -> Self {
        NetworkTarget::Local {
            url: url.unwrap_or_else(|| DEFAULT_LOCAL_RPC_URL.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            NetworkTarget::Testnet { url } | NetworkTarget::Local { url } => url,
        }
    }

    pub fn expected_chain_id(&self) -> u64 {
        match self {
            NetworkTarget::Testnet { .. } => ROOTSTOCK_TESTNET_CHAIN_ID,
            NetworkTarget::Local { .. } => LOCAL_CHAIN_ID,
        }
    }

    pub fn deployment_env(&self) -> DeploymentEnv {
        match self {
            NetworkTarget::Testnet { .. } => DeploymentEnv::Test,
            NetworkTarget::Local { .. } => DeploymentEnv::Local,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NetworkInfo {
    pub name: &'static str,
    pub token_symbol: &'static str,
    pub is_testnet: bool,
}

/// Chain the connection layer reports. Stays pending until the first
/// successful chain id query; nothing network-dependent is defaulted before
/// that.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NetworkContext {
    chain_id: Option<u64>,
}

impl NetworkContext {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn resolved(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
        }
    }

    pub fn info(&self) -> NetworkInfo {
        match self.chain_id {
            None => NetworkInfo {
                name: "Connecting...",
                token_symbol: "...",
                is_testnet: false,
            },
            Some(ROOTSTOCK_TESTNET_CHAIN_ID) => NetworkInfo {
                name: "RSK Testnet",
                token_symbol: "tRBTC",
                is_testnet: true,
            },
            Some(LOCAL_CHAIN_ID) => NetworkInfo {
                name: "Local Devnet",
                token_symbol: "ETH",
                is_testnet: false,
            },
            Some(_) => NetworkInfo {
                name: "Unknown Network",
                token_symbol: "RBTC",
                is_testnet: false,
            },
        }
    }

    /// `true` once resolved to a chain other than the one the target expects.
    pub fn mismatches(&self, target: &NetworkTarget) -> bool {
        self.chain_id
            .is_some_and(|id| id != target.expected_chain_id())
    }
}
