//! Compiled grammar units.
//!
//! A compiled unit is a JSON document holding one or more languages. The
//! `abi_version` field is decoded and checked on its own before the rest of
//! the document, so a unit written for another engine version fails closed
//! even if its table layout changed.

use std::hash::Hasher;
use std::path::Path;

use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use super::error::GrammarError;
use super::symbol::{SymbolId, SymbolInfo};
use super::table::{LexModeTable, ProductionInfo, StateTable};

/// Table layout version understood by this engine.
pub const ABI_VERSION: u32 = 1;

/// How a token is recognized by the internal lexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TokenPattern {
    /// Exact text, e.g. a keyword or punctuation.
    Literal(String),
    /// A regular expression matched at the current position.
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRule {
    pub symbol: SymbolId,
    pub pattern: TokenPattern,
}

/// All tables of a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTables {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub tokens: Vec<TokenRule>,
    #[serde(default)]
    pub extras: Vec<SymbolId>,
    #[serde(default)]
    pub externals: Vec<SymbolId>,
    #[serde(default)]
    pub external_scanner: Option<String>,
    pub productions: Vec<ProductionInfo>,
    pub states: Vec<StateTable>,
    pub lex_modes: Vec<LexModeTable>,
}

/// Length and hash of a unit's serialized bytes.
pub(crate) type ContentHash = (usize, u64);

pub(crate) fn content_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    (bytes.len(), hasher.finish())
}

/// Cached content hash. Not part of the unit's value.
#[derive(Debug, Clone, Default)]
struct Fingerprint(OnceCell<ContentHash>);

impl PartialEq for Fingerprint {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Fingerprint {}

/// A compiled unit: one or more languages under one ABI version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    abi_version: u32,
    languages: Vec<LanguageTables>,
    #[serde(skip)]
    fingerprint: Fingerprint,
}

#[derive(Deserialize)]
struct UnitHeader {
    abi_version: u32,
}

impl CompiledUnit {
    pub fn new(languages: Vec<LanguageTables>) -> Self {
        Self {
            abi_version: ABI_VERSION,
            languages,
            fingerprint: Fingerprint::default(),
        }
    }

    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    pub fn set_abi_version(&mut self, abi_version: u32) {
        self.abi_version = abi_version;
        self.fingerprint = Fingerprint::default();
    }

    pub fn languages(&self) -> &[LanguageTables] {
        &self.languages
    }

    /// Mutable access to the tables; the unit's identity is recomputed on
    /// its next load.
    pub fn languages_mut(&mut self) -> &mut Vec<LanguageTables> {
        self.fingerprint = Fingerprint::default();
        &mut self.languages
    }

    /// Decode a unit, checking the ABI version first.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GrammarError> {
        let header: UnitHeader = serde_json::from_slice(bytes)?;
        if header.abi_version != ABI_VERSION {
            return Err(GrammarError::AbiMismatch {
                found: header.abi_version,
                expected: ABI_VERSION,
            });
        }
        let unit: Self = serde_json::from_slice(bytes)?;
        let _ = unit.fingerprint.0.set(content_hash(bytes));
        Ok(unit)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, GrammarError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), GrammarError> {
        std::fs::write(path, self.to_vec()?)?;
        Ok(())
    }

    /// Identity of the unit's content: the hash of the bytes it was decoded
    /// from, or of its serialization. Computed once per unit.
    pub(crate) fn content_hash(&self) -> Result<ContentHash, GrammarError> {
        self.fingerprint
            .0
            .get_or_try_init(|| self.to_vec().map(|bytes| content_hash(&bytes)))
            .copied()
    }

    pub fn language(&self, name: &str) -> Option<&LanguageTables> {
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn language_names(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.name.as_str())
    }
}
