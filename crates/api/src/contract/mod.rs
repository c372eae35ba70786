// Path: crates/api/src/contract/mod.rs

//! The parsed form of a smart contract and the parser boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tela_types::error::ValidationError;

/// One function of a parsed contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// The function name.
    pub name: String,
    /// Statement lines keyed by their line number. Each line is its token list.
    pub lines: BTreeMap<u64, Vec<String>>,
}

impl Function {
    /// Returns the lines in ascending line-number order.
    pub fn ordered_lines(&self) -> impl Iterator<Item = &[String]> {
        self.lines.values().map(Vec::as_slice)
    }
}

/// A parsed contract: its functions keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// The contract's functions.
    pub functions: BTreeMap<String, Function>,
}

impl Contract {
    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Returns the sorted function names.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Turns contract source text into a [`Contract`].
pub trait ContractParser: Send + Sync {
    /// Parses `source`, failing on any structural error.
    fn parse(&self, source: &str) -> Result<Contract, ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_lines_follow_line_numbers() {
        let mut f = Function {
            name: "init".into(),
            ..Default::default()
        };
        f.lines.insert(20, vec!["RETURN".into(), "0".into()]);
        f.lines.insert(10, vec!["STORE".into()]);
        let lines: Vec<_> = f.ordered_lines().map(|l| l[0].clone()).collect();
        assert_eq!(lines, vec!["STORE", "RETURN"]);
    }
}
