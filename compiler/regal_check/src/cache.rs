//! Units serialized by the front end.
//!
//! A serialized unit carries its own name table: entry `i` is the string
//! behind `Name(i)`. Loading rebuilds an interner that hands out exactly
//! those names again.

use serde::{Deserialize, Serialize};

use regal_ir::{InternError, Module, Name, StringInterner};

#[derive(Serialize)]
struct UnitRef<'a> {
    names: Vec<&'static str>,
    module: &'a Module,
}

#[derive(Deserialize)]
struct Unit {
    names: Vec<String>,
    module: Module,
}

/// Errors from [`encode_unit`] and [`load_unit`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed unit: {0}")]
    Codec(#[from] bincode::Error),
    #[error("name table entry {index} (`{text}`) is a duplicate")]
    DuplicateName { index: usize, text: String },
    #[error("name table does not fit the interner: {0}")]
    Intern(InternError),
}

/// A decoded unit and the interner its names refer to.
pub struct LoadedUnit {
    pub module: Module,
    pub interner: StringInterner,
}

/// Serialize `module` together with every name in `interner`.
pub fn encode_unit(module: &Module, interner: &StringInterner) -> Result<Vec<u8>, LoadError> {
    let count = u32::try_from(interner.len()).map_err(|_| {
        LoadError::Intern(InternError::Overflow {
            count: interner.len(),
        })
    })?;
    let names = (0..count)
        .map(|raw| interner.lookup(Name::from_raw(raw)))
        .collect();
    let bytes = bincode::serialize(&UnitRef { names, module })?;
    tracing::debug!(bytes = bytes.len(), "unit encoded");
    Ok(bytes)
}

/// Decode a unit produced by [`encode_unit`].
pub fn load_unit(bytes: &[u8]) -> Result<LoadedUnit, LoadError> {
    let unit: Unit = bincode::deserialize(bytes)?;
    let interner = StringInterner::new();
    for (index, text) in unit.names.iter().enumerate() {
        let name = interner.try_intern(text).map_err(LoadError::Intern)?;
        if name.raw() as usize != index {
            return Err(LoadError::DuplicateName {
                index,
                text: text.clone(),
            });
        }
    }
    tracing::debug!(
        names = unit.names.len(),
        functions = unit.module.functions.len(),
        "unit loaded"
    );
    Ok(LoadedUnit {
        module: unit.module,
        interner,
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
