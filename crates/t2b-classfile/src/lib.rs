//! JVM Class File Codec
//!
//! This crate reads and writes JVM class files with enough structure to
//! rewrite them: a deduplicating constant pool, decoded annotation
//! attributes, descriptor parsing and class renaming. Every other attribute
//! (including method bodies) is carried through verbatim.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod annotation;
pub mod classfile;
pub mod constants;
pub mod descriptor;
pub mod encoder;
pub mod mutf8;
pub mod rename;
pub mod verify;

pub use annotation::{Annotation, AnnotationsAttribute, ElementValue, ElementValuePair, Visibility};
pub use classfile::{access, Attribute, AttributeBody, ClassFile, ClassFileError, MemberInfo};
pub use constants::{Constant, ConstantPool};
pub use descriptor::{DescriptorError, FieldType, MethodDescriptor};
pub use encoder::{ClassReader, ClassWriter, DecodeError};
pub use rename::{package_of, simple_name, suffixed_name};
pub use verify::{verify_class, VerifyError};
