//! Futures instrument naming and the point-value (contract multiplier) table.
//!
//! A futures symbol is `<product><contract>`: one or two ASCII letters naming
//! the product family followed by a three- or four-digit delivery code, e.g.
//! `rb1710`, `SR709`, `IF1709`. Symbols that do not match are rejected rather
//! than mined for the first alphabetic run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol '{0}' has no product prefix")]
    NoProductPrefix(String),

    #[error("symbol '{symbol}' has product prefix '{product}' longer than 2 letters")]
    ProductTooLong { symbol: String, product: String },

    #[error("symbol '{symbol}' has malformed contract code '{contract}' (expected 3 or 4 digits)")]
    BadContractCode { symbol: String, contract: String },

    #[error("product '{product}' of symbol '{symbol}' has no point value")]
    UnknownProduct { symbol: String, product: String },
}

/// A parsed futures symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuturesSymbol<'a> {
    pub product: &'a str,
    pub contract: &'a str,
}

impl<'a> FuturesSymbol<'a> {
    /// Parse a symbol against the `<1-2 letters><3-4 digits>` grammar.
    pub fn parse(symbol: &'a str) -> Result<Self, SymbolError> {
        let split = symbol
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(symbol.len());
        let (product, contract) = symbol.split_at(split);

        if product.is_empty() {
            return Err(SymbolError::NoProductPrefix(symbol.to_string()));
        }
        if product.len() > 2 {
            return Err(SymbolError::ProductTooLong {
                symbol: symbol.to_string(),
                product: product.to_string(),
            });
        }
        let digits_ok = contract.chars().all(|c| c.is_ascii_digit());
        if !digits_ok || !(3..=4).contains(&contract.len()) {
            return Err(SymbolError::BadContractCode {
                symbol: symbol.to_string(),
                contract: contract.to_string(),
            });
        }

        Ok(Self { product, contract })
    }
}

/// Static mapping from product code to contract multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointValueTable {
    values: BTreeMap<String, u64>,
}

impl PointValueTable {
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Multipliers for the listed products of the Chinese futures exchanges
    /// (SHFE, INE, DCE, CZCE, CFFEX). Codes keep the exchange's letter case.
    pub fn china_futures() -> Self {
        const TABLE: &[(&str, u64)] = &[
            // SHFE / INE
            ("cu", 5),
            ("al", 5),
            ("zn", 5),
            ("pb", 5),
            ("ni", 1),
            ("sn", 1),
            ("au", 1000),
            ("ag", 15),
            ("rb", 10),
            ("wr", 10),
            ("hc", 10),
            ("fu", 10),
            ("bu", 10),
            ("ru", 10),
            ("sc", 1000),
            // DCE
            ("a", 10),
            ("b", 10),
            ("m", 10),
            ("y", 10),
            ("p", 10),
            ("c", 10),
            ("cs", 10),
            ("jd", 10),
            ("fb", 500),
            ("bb", 500),
            ("l", 5),
            ("v", 5),
            ("pp", 5),
            ("j", 100),
            ("jm", 60),
            ("i", 100),
            // CZCE
            ("WH", 20),
            ("PM", 50),
            ("CF", 5),
            ("SR", 10),
            ("OI", 10),
            ("RI", 20),
            ("RS", 10),
            ("RM", 10),
            ("JR", 20),
            ("LR", 20),
            ("CY", 5),
            ("AP", 10),
            ("TA", 5),
            ("MA", 10),
            ("FG", 20),
            ("SF", 5),
            ("SM", 5),
            ("ZC", 100),
            // CFFEX
            ("IF", 300),
            ("IH", 300),
            ("IC", 200),
            ("TF", 10000),
            ("T", 10000),
        ];
        Self {
            values: TABLE.iter().map(|(p, v)| (p.to_string(), *v)).collect(),
        }
    }

    /// Insert or override a product multiplier. Returns the previous value.
    pub fn insert(&mut self, product: impl Into<String>, multiplier: u64) -> Option<u64> {
        self.values.insert(product.into(), multiplier)
    }

    pub fn get(&self, product: &str) -> Option<u64> {
        self.values.get(product).copied()
    }

    /// Validate `symbol` against the naming grammar and look up its multiplier.
    pub fn multiplier_for(&self, symbol: &str) -> Result<u64, SymbolError> {
        let parsed = FuturesSymbol::parse(symbol)?;
        self.get(parsed.product)
            .ok_or_else(|| SymbolError::UnknownProduct {
                symbol: symbol.to_string(),
                product: parsed.product.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Products and multipliers in product order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(p, v)| (p.as_str(), *v))
    }
}

impl Default for PointValueTable {
    fn default() -> Self {
        Self::china_futures()
    }
}
