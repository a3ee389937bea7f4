//! Grammar registry: loading, scanner resolution and caching.
//!
//! Loaded grammars are cached by (unit identity, language name). File units
//! are identified by their canonical path, in-memory units by a hash of
//! their bytes. Loading the same language twice yields the same `Arc`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::lexer::{ExternalScanner, IndentScanner, ScannerFactory};

use super::error::GrammarError;
use super::language::Grammar;
use super::unit::{CompiledUnit, ContentHash, content_hash};

/// Where a compiled unit comes from.
#[derive(Debug, Clone, Copy)]
pub enum UnitSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for UnitSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for UnitSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a str> for UnitSource<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(Path::new(path))
    }
}

impl<'a> From<&'a [u8]> for UnitSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UnitIdentity {
    Path(PathBuf),
    Content(ContentHash),
}

/// Scanner factories plus a cache of loaded grammars.
pub struct Registry {
    scanners: Mutex<FxHashMap<SmolStr, ScannerFactory>>,
    cache: Mutex<FxHashMap<(UnitIdentity, SmolStr), Arc<Grammar>>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with the built-in scanners and an empty cache.
    pub fn new() -> Self {
        let registry = Self {
            scanners: Mutex::new(FxHashMap::default()),
            cache: Mutex::new(FxHashMap::default()),
        };
        registry.register_scanner("indent", || {
            Box::new(IndentScanner::new()) as Box<dyn ExternalScanner>
        });
        registry
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Make `name` resolvable by units that declare that external scanner.
    /// Grammars already cached keep the factory they were loaded with.
    pub fn register_scanner<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ExternalScanner> + Send + Sync + 'static,
    {
        self.scanners.lock().insert(SmolStr::new(name), Arc::new(factory));
    }

    /// Load `language` from a compiled unit, reusing a cached grammar.
    pub fn load<'a>(
        &self,
        source: impl Into<UnitSource<'a>>,
        language: &str,
    ) -> Result<Arc<Grammar>, GrammarError> {
        match source.into() {
            UnitSource::Path(path) => {
                let identity = UnitIdentity::Path(std::fs::canonicalize(path)?);
                self.load_cached(identity, language, || CompiledUnit::from_path(path))
            }
            UnitSource::Bytes(bytes) => self.load_cached(UnitIdentity::Content(content_hash(bytes)), language, || {
                CompiledUnit::from_slice(bytes)
            }),
        }
    }

    /// Load `language` from an already decoded unit.
    pub fn load_unit(&self, unit: &CompiledUnit, language: &str) -> Result<Arc<Grammar>, GrammarError> {
        let identity = UnitIdentity::Content(unit.content_hash()?);
        self.load_cached(identity, language, || Ok(unit.clone()))
    }

    /// Number of cached grammars.
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    fn load_cached(
        &self,
        identity: UnitIdentity,
        language: &str,
        read: impl FnOnce() -> Result<CompiledUnit, GrammarError>,
    ) -> Result<Arc<Grammar>, GrammarError> {
        let key = (identity, SmolStr::new(language));
        // Held across the read so concurrent loads of one key build once.
        let mut cache = self.cache.lock();
        if let Some(grammar) = cache.get(&key) {
            return Ok(grammar.clone());
        }

        let unit = read()?;
        let tables = unit.language(language).ok_or_else(|| GrammarError::NotFound {
            language: language.to_string(),
            available: unit.language_names().map(str::to_string).collect(),
        })?;
        let grammar = Arc::new(Grammar::from_tables(tables, |name| {
            self.scanners.lock().get(name).cloned()
        })?);

        tracing::info!(
            language,
            symbols = grammar.symbol_count(),
            states = grammar.state_count(),
            "loaded grammar"
        );
        cache.insert(key, grammar.clone());
        Ok(grammar)
    }
}

/// Load `language` through the process-wide registry.
pub fn load<'a>(source: impl Into<UnitSource<'a>>, language: &str) -> Result<Arc<Grammar>, GrammarError> {
    Registry::global().load(source, language)
}
