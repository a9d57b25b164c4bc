//! Chain classification.
//!
//! Chain detection is purely syntactic on the address string; it never calls
//! a provider to decide EVM vs SVM.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract chain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Evm,
    Svm,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Evm => write!(f, "evm"),
            Chain::Svm => write!(f, "svm"),
        }
    }
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Evm => "evm",
            Chain::Svm => "svm",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "evm" => Some(Chain::Evm),
            "svm" => Some(Chain::Svm),
            _ => None,
        }
    }
}

/// Concrete network within a chain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecificChain {
    Eth,
    Base,
    Polygon,
    Arbitrum,
    Optimism,
    Bsc,
    Avalanche,
    Linea,
    Zksync,
    Scroll,
    Mantle,
    Svm,
}

/// Candidate EVM specific-chains tried, in order, when the caller does not
/// supply a hint. Declared order matters: it is the fallback iteration order
/// for both provider fan-out and chain inference.
pub const EVM_SPECIFIC_CHAIN_CANDIDATES: &[SpecificChain] = &[
    SpecificChain::Eth,
    SpecificChain::Base,
    SpecificChain::Polygon,
    SpecificChain::Arbitrum,
    SpecificChain::Optimism,
    SpecificChain::Bsc,
    SpecificChain::Avalanche,
    SpecificChain::Linea,
    SpecificChain::Zksync,
    SpecificChain::Scroll,
    SpecificChain::Mantle,
];

impl SpecificChain {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecificChain::Eth => "eth",
            SpecificChain::Base => "base",
            SpecificChain::Polygon => "polygon",
            SpecificChain::Arbitrum => "arbitrum",
            SpecificChain::Optimism => "optimism",
            SpecificChain::Bsc => "bsc",
            SpecificChain::Avalanche => "avalanche",
            SpecificChain::Linea => "linea",
            SpecificChain::Zksync => "zksync",
            SpecificChain::Scroll => "scroll",
            SpecificChain::Mantle => "mantle",
            SpecificChain::Svm => "svm",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eth" | "ethereum" => Some(SpecificChain::Eth),
            "base" => Some(SpecificChain::Base),
            "polygon" => Some(SpecificChain::Polygon),
            "arbitrum" => Some(SpecificChain::Arbitrum),
            "optimism" => Some(SpecificChain::Optimism),
            "bsc" => Some(SpecificChain::Bsc),
            "avalanche" => Some(SpecificChain::Avalanche),
            "linea" => Some(SpecificChain::Linea),
            "zksync" => Some(SpecificChain::Zksync),
            "scroll" => Some(SpecificChain::Scroll),
            "mantle" => Some(SpecificChain::Mantle),
            "svm" | "solana" => Some(SpecificChain::Svm),
            _ => None,
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            SpecificChain::Svm => Chain::Svm,
            _ => Chain::Evm,
        }
    }
}

impl fmt::Display for SpecificChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a token address as EVM or SVM purely from its textual shape.
///
/// A `0x`-prefixed 40-hex-digit string is EVM. A base58 string in the
/// expected Solana pubkey length range (32-44 chars) is SVM.
pub fn determine_chain(address: &str) -> Option<Chain> {
    if is_evm_address(address) {
        return Some(Chain::Evm);
    }
    if is_svm_address(address) {
        return Some(Chain::Svm);
    }
    None
}

pub fn is_evm_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub fn is_svm_address(address: &str) -> bool {
    let len = address.chars().count();
    if !(32..=44).contains(&len) {
        return false;
    }
    address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_evm_address() {
        let addr = "0x1234567890123456789012345678901234567890";
        assert_eq!(determine_chain(addr), Some(Chain::Evm));
        assert!(is_evm_address(addr));
    }

    #[test]
    fn detects_svm_address() {
        let addr = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        assert_eq!(determine_chain(addr), Some(Chain::Svm));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(determine_chain("0xshort"), None);
        assert_eq!(determine_chain(""), None);
        assert_eq!(determine_chain("0x12"), None);
    }

    #[test]
    fn specific_chain_round_trips() {
        for sc in EVM_SPECIFIC_CHAIN_CANDIDATES {
            assert_eq!(SpecificChain::from_str_opt(sc.as_str()), Some(*sc));
            assert_eq!(sc.chain(), Chain::Evm);
        }
        assert_eq!(SpecificChain::Svm.chain(), Chain::Svm);
    }
}
