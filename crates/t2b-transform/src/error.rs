//! Load path and injection errors

use std::path::PathBuf;
use t2b_classfile::{ClassFileError, VerifyError};
use thiserror::Error;

/// Errors raised while finding or defining units
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a class file or manifest
    #[error("Failed to read {path}: {source}")]
    IoError {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Class file bytes could not be decoded
    #[error("Malformed class file: {0}")]
    ClassFile(#[from] ClassFileError),

    /// Class file decoded but failed structural checks
    #[error("Class file failed verification: {0}")]
    Verify(#[from] VerifyError),

    /// No unit with this name on the load path
    #[error("Class not found: {0}")]
    NotFound(String),

    /// File at the expected location declares a different class
    #[error("Expected class {expected} but {path} declares {found}")]
    NameMismatch {
        /// Internal name that was looked up
        expected: String,
        /// Internal name declared by the file
        found: String,
        /// File that was read
        path: PathBuf,
    },
}

/// Errors raised while injecting into or committing a unit
#[derive(Debug, Error)]
pub enum InjectError {
    /// Target member is not declared on the working unit
    #[error("Method {member} not found in class {unit}")]
    MemberNotFound {
        /// Qualified name of the working unit
        unit: String,
        /// Method name and descriptor
        member: String,
    },

    /// Unit must be thawed before editing
    #[error("Class {0} is frozen")]
    Frozen(String),

    /// Constant pool or attribute edit failed
    #[error("Class file edit failed: {0}")]
    ClassFile(#[from] ClassFileError),

    /// Looking up an already-renamed unit failed
    #[error("Failed to look up altered class {name}: {source}")]
    Lookup {
        /// Internal name of the renamed unit
        name: String,
        /// Why it could not be loaded
        #[source]
        source: LoadError,
    },

    /// Writing the mutated class file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Defining the mutated class file failed
    #[error("Failed to load altered class: {0}")]
    Define(#[from] LoadError),
}
