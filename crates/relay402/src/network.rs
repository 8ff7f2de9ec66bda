//! Network registry: the single source of truth for supported networks.
//!
//! Every routing decision in the facilitator classifies a network id through
//! [`Network::from_id`]. Nothing else in the codebase pattern-matches id
//! strings; adding a chain means adding one variant and its table entries
//! here.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Settlement family a network belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFamily {
    Evm,
    Svm,
}

impl fmt::Display for NetworkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFamily::Evm => f.write_str("EVM"),
            NetworkFamily::Svm => f.write_str("SVM"),
        }
    }
}

/// A network id that is not in the registry.
#[derive(Debug, Clone, Error)]
#[error("Unsupported network: {0}")]
pub struct UnknownNetwork(pub String);

/// A supported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Base,
    BaseSepolia,
    Sepolia,
    Avalanche,
    AvalancheFuji,
    Solana,
    SolanaDevnet,
}

impl Network {
    /// All supported networks, in table order.
    pub const ALL: [Network; 7] = [
        Network::Base,
        Network::BaseSepolia,
        Network::Sepolia,
        Network::Avalanche,
        Network::AvalancheFuji,
        Network::Solana,
        Network::SolanaDevnet,
    ];

    /// Classify a network id. Ids are exact, case-sensitive matches;
    /// anything not in the table is unsupported.
    pub fn from_id(id: &str) -> Option<Network> {
        match id {
            "base" => Some(Network::Base),
            "base-sepolia" => Some(Network::BaseSepolia),
            "sepolia" => Some(Network::Sepolia),
            "avalanche" => Some(Network::Avalanche),
            "avalanche-fuji" => Some(Network::AvalancheFuji),
            "solana" => Some(Network::Solana),
            "solana-devnet" => Some(Network::SolanaDevnet),
            _ => None,
        }
    }

    /// The wire-format network id.
    pub fn id(self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::BaseSepolia => "base-sepolia",
            Network::Sepolia => "sepolia",
            Network::Avalanche => "avalanche",
            Network::AvalancheFuji => "avalanche-fuji",
            Network::Solana => "solana",
            Network::SolanaDevnet => "solana-devnet",
        }
    }

    pub fn family(self) -> NetworkFamily {
        match self {
            Network::Base
            | Network::BaseSepolia
            | Network::Sepolia
            | Network::Avalanche
            | Network::AvalancheFuji => NetworkFamily::Evm,
            Network::Solana | Network::SolanaDevnet => NetworkFamily::Svm,
        }
    }

    /// EIP-155 chain id. `None` for non-EVM networks.
    pub fn chain_id(self) -> Option<u64> {
        match self {
            Network::Base => Some(8453),
            Network::BaseSepolia => Some(84532),
            Network::Sepolia => Some(11_155_111),
            Network::Avalanche => Some(43114),
            Network::AvalancheFuji => Some(43113),
            Network::Solana | Network::SolanaDevnet => None,
        }
    }

    /// Public RPC endpoint used when no per-network override is configured.
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Base => "https://mainnet.base.org",
            Network::BaseSepolia => "https://sepolia.base.org",
            Network::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
            Network::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
            Network::AvalancheFuji => "https://api.avax-test.network/ext/bc/C/rpc",
            Network::Solana => "https://api.mainnet-beta.solana.com",
            Network::SolanaDevnet => "https://api.devnet.solana.com",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::from_id(s).ok_or_else(|| UnknownNetwork(s.to_string()))
    }
}
