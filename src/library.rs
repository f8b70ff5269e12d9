//! Dynamic libraries as a source of function addresses.

use std::ffi::c_void;
use std::fmt;
use std::path::Path;

use libffi::low::CodePtr;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::function::ForeignFunction;
use crate::types::Type;

/// A loaded shared library with a cache of resolved symbols.
pub struct Library {
    path: String,
    native: libloading::Library,
    symbols: FxHashMap<String, CodePtr>,
}

impl Library {
    /// Load the library at `path`.
    ///
    /// Loading runs the library's initializers; only open libraries you trust.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let native = unsafe { libloading::Library::new(path) }.map_err(|e| Error::Library {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %shown, "library loaded");
        Ok(Library {
            path: shown,
            native,
            symbols: FxHashMap::default(),
        })
    }

    /// The running program and everything it already links against.
    #[cfg(unix)]
    pub fn this() -> Self {
        Library {
            path: "<self>".to_string(),
            native: libloading::os::unix::Library::this().into(),
            symbols: FxHashMap::default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve `name` to a code address. Results are cached.
    pub fn symbol(&mut self, name: &str) -> Result<CodePtr> {
        if let Some(&code) = self.symbols.get(name) {
            return Ok(code);
        }
        let not_found = || Error::SymbolNotFound {
            library: self.path.clone(),
            symbol: name.to_string(),
        };
        let addr = unsafe { self.native.get::<*mut c_void>(name.as_bytes()) }
            .map(|sym| *sym)
            .map_err(|e| {
                tracing::debug!(library = %self.path, symbol = name, error = %e, "symbol lookup failed");
                not_found()
            })?;
        if addr.is_null() {
            return Err(not_found());
        }
        let code = CodePtr(addr);
        self.symbols.insert(name.to_string(), code);
        Ok(code)
    }

    /// Resolve `name` and pair it with a prepared interface.
    ///
    /// # Safety
    /// The symbol must be a function with exactly this C signature, and the
    /// returned function must not be called after this library is dropped.
    pub unsafe fn function(&mut self, name: &str, ret: Type, args: &[Type]) -> Result<ForeignFunction> {
        let code = self.symbol(name)?;
        ForeignFunction::prepare(code, ret, args)
    }

    pub fn cached_symbols(&self) -> usize {
        self.symbols.len()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("path", &self.path)
            .field("symbols", &self.symbols.len())
            .finish()
    }
}
