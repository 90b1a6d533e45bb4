//! Constant pool
//!
//! The pool is 1-based; index 0 and the second slot of every `Long`/`Double`
//! hold [`Constant::Unusable`]. Entries are only ever appended, so indices
//! handed out earlier stay valid for the lifetime of the class file.

use crate::classfile::ClassFileError;
use crate::encoder::{ClassReader, ClassWriter, DecodeError};
use crate::mutf8;
use std::collections::HashMap;

/// Constant pool tags (JVMS §4.4)
pub mod tags {
    #![allow(missing_docs)]
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// Highest slot count a pool can have (`constant_pool_count` is a u16)
pub const MAX_POOL_SIZE: usize = u16::MAX as usize;

/// Longest encoded `CONSTANT_Utf8` payload
pub const MAX_UTF8_LEN: usize = u16::MAX as usize;

/// A constant pool entry
///
/// Floating point values are kept as their raw bits so that entries can be
/// hashed and compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Slot 0 and the upper half of a `Long`/`Double`
    Unusable,
}

impl Constant {
    /// Number of pool slots the entry occupies
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    /// Tag byte of the entry, `None` for [`Constant::Unusable`]
    pub fn tag(&self) -> Option<u8> {
        let tag = match self {
            Constant::Utf8(_) => tags::UTF8,
            Constant::Integer(_) => tags::INTEGER,
            Constant::Float(_) => tags::FLOAT,
            Constant::Long(_) => tags::LONG,
            Constant::Double(_) => tags::DOUBLE,
            Constant::Class { .. } => tags::CLASS,
            Constant::String { .. } => tags::STRING,
            Constant::Fieldref { .. } => tags::FIELDREF,
            Constant::Methodref { .. } => tags::METHODREF,
            Constant::InterfaceMethodref { .. } => tags::INTERFACE_METHODREF,
            Constant::NameAndType { .. } => tags::NAME_AND_TYPE,
            Constant::MethodHandle { .. } => tags::METHOD_HANDLE,
            Constant::MethodType { .. } => tags::METHOD_TYPE,
            Constant::Dynamic { .. } => tags::DYNAMIC,
            Constant::InvokeDynamic { .. } => tags::INVOKE_DYNAMIC,
            Constant::Module { .. } => tags::MODULE,
            Constant::Package { .. } => tags::PACKAGE,
            Constant::Unusable => return None,
        };
        Some(tag)
    }

    fn encode(&self, writer: &mut ClassWriter) {
        let Some(tag) = self.tag() else {
            return;
        };
        writer.emit_u8(tag);
        match self {
            Constant::Utf8(value) => {
                let bytes = mutf8::encode(value);
                writer.emit_u16(bytes.len() as u16);
                writer.emit_bytes(&bytes);
            }
            Constant::Integer(value) => writer.emit_u32(*value as u32),
            Constant::Float(bits) => writer.emit_u32(*bits),
            Constant::Long(value) => writer.emit_u64(*value as u64),
            Constant::Double(bits) => writer.emit_u64(*bits),
            Constant::Class { name_index }
            | Constant::Module { name_index }
            | Constant::Package { name_index } => writer.emit_u16(*name_index),
            Constant::String { string_index } => writer.emit_u16(*string_index),
            Constant::MethodType { descriptor_index } => writer.emit_u16(*descriptor_index),
            Constant::Fieldref { class_index, name_and_type_index }
            | Constant::Methodref { class_index, name_and_type_index }
            | Constant::InterfaceMethodref { class_index, name_and_type_index } => {
                writer.emit_u16(*class_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::NameAndType { name_index, descriptor_index } => {
                writer.emit_u16(*name_index);
                writer.emit_u16(*descriptor_index);
            }
            Constant::MethodHandle { reference_kind, reference_index } => {
                writer.emit_u8(*reference_kind);
                writer.emit_u16(*reference_index);
            }
            Constant::Dynamic { bootstrap_method_attr_index, name_and_type_index }
            | Constant::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                writer.emit_u16(*bootstrap_method_attr_index);
                writer.emit_u16(*name_and_type_index);
            }
            Constant::Unusable => {}
        }
    }

    fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.position();
        let tag = reader.read_u8()?;
        let constant = match tag {
            tags::UTF8 => {
                let len = reader.read_u16()? as usize;
                let start = reader.position();
                let bytes = reader.read_slice(len)?;
                Constant::Utf8(mutf8::decode(bytes, start)?)
            }
            tags::INTEGER => Constant::Integer(reader.read_u32()? as i32),
            tags::FLOAT => Constant::Float(reader.read_u32()?),
            tags::LONG => Constant::Long(reader.read_u64()? as i64),
            tags::DOUBLE => Constant::Double(reader.read_u64()?),
            tags::CLASS => Constant::Class {
                name_index: reader.read_u16()?,
            },
            tags::STRING => Constant::String {
                string_index: reader.read_u16()?,
            },
            tags::FIELDREF => Constant::Fieldref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tags::METHODREF => Constant::Methodref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tags::INTERFACE_METHODREF => Constant::InterfaceMethodref {
                class_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tags::NAME_AND_TYPE => Constant::NameAndType {
                name_index: reader.read_u16()?,
                descriptor_index: reader.read_u16()?,
            },
            tags::METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: reader.read_u8()?,
                reference_index: reader.read_u16()?,
            },
            tags::METHOD_TYPE => Constant::MethodType {
                descriptor_index: reader.read_u16()?,
            },
            tags::DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tags::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u16()?,
                name_and_type_index: reader.read_u16()?,
            },
            tags::MODULE => Constant::Module {
                name_index: reader.read_u16()?,
            },
            tags::PACKAGE => Constant::Package {
                name_index: reader.read_u16()?,
            },
            other => return Err(DecodeError::InvalidConstantTag(other, offset)),
        };
        Ok(constant)
    }
}

/// Deduplicating constant pool
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    lookup: HashMap<Constant, u16>,
}

impl ConstantPool {
    /// Create an empty pool (slot 0 reserved)
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
            lookup: HashMap::new(),
        }
    }

    /// Slot count, i.e. the `constant_pool_count` written to the class file
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the pool holds no usable entries
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Get the entry at `index`; unusable slots yield `None`
    pub fn get(&self, index: u16) -> Option<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => None,
            Some(constant) => Some(constant),
        }
    }

    /// Iterate over usable entries with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }

    /// Add an entry, returning the index of an identical existing entry if any
    pub fn add(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        if let Some(&index) = self.lookup.get(&constant) {
            return Ok(index);
        }
        check_utf8_len(&constant)?;
        let width = constant.width();
        if self.entries.len() + width > MAX_POOL_SIZE {
            return Err(ClassFileError::PoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.lookup.insert(constant.clone(), index);
        self.entries.push(constant);
        if width == 2 {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }

    /// Replace the entry at `index` in place
    ///
    /// Used when a structure must be repointed without disturbing other
    /// indices (e.g. a `Class` entry after a rename).
    pub fn set(&mut self, index: u16, constant: Constant) -> Result<(), ClassFileError> {
        let slot = self
            .entries
            .get_mut(index as usize)
            .filter(|c| !matches!(c, Constant::Unusable))
            .ok_or(ClassFileError::BadConstantIndex(index))?;
        if slot.width() != constant.width() {
            return Err(ClassFileError::BadConstantIndex(index));
        }
        check_utf8_len(&constant)?;
        let previous = std::mem::replace(slot, constant.clone());
        if self.lookup.get(&previous) == Some(&index) {
            self.lookup.remove(&previous);
        }
        self.lookup.entry(constant).or_insert(index);
        Ok(())
    }

    /// Add (or find) a `CONSTANT_Utf8`
    pub fn add_utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        self.add(Constant::Utf8(value.to_string()))
    }

    /// Add (or find) a `CONSTANT_Class` for an internal name
    pub fn add_class(&mut self, internal_name: &str) -> Result<u16, ClassFileError> {
        let name_index = self.add_utf8(internal_name)?;
        self.add(Constant::Class { name_index })
    }

    /// Add (or find) a `CONSTANT_String`
    pub fn add_string(&mut self, value: &str) -> Result<u16, ClassFileError> {
        let string_index = self.add_utf8(value)?;
        self.add(Constant::String { string_index })
    }

    /// Add (or find) a `CONSTANT_Integer`
    pub fn add_integer(&mut self, value: i32) -> Result<u16, ClassFileError> {
        self.add(Constant::Integer(value))
    }

    /// Add (or find) a `CONSTANT_NameAndType`
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Index of an existing `CONSTANT_Utf8` with this value
    pub fn find_utf8(&self, value: &str) -> Option<u16> {
        self.lookup.get(&Constant::Utf8(value.to_string())).copied()
    }

    /// String value of a `CONSTANT_Utf8`
    pub fn utf8(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Some(value),
            _ => None,
        }
    }

    /// Internal name referenced by a `CONSTANT_Class`
    pub fn class_name(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => None,
        }
    }

    /// Encode the pool (count followed by entries)
    pub fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.entries.len() as u16);
        for constant in &self.entries {
            constant.encode(writer);
        }
    }

    /// Decode a pool (count followed by entries)
    pub fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u16()? as usize;
        let mut pool = Self::new();
        pool.entries.reserve(count);

        while pool.entries.len() < count {
            let index = pool.entries.len() as u16;
            let constant = Constant::decode(reader)?;
            let width = constant.width();
            pool.lookup.entry(constant.clone()).or_insert(index);
            pool.entries.push(constant);
            if width == 2 {
                pool.entries.push(Constant::Unusable);
            }
        }

        Ok(pool)
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

fn check_utf8_len(constant: &Constant) -> Result<(), ClassFileError> {
    if let Constant::Utf8(value) = constant {
        let len = mutf8::encoded_len(value);
        if len > MAX_UTF8_LEN {
            return Err(ClassFileError::StringTooLong(len));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pool_reserves_slot_zero() {
        let pool = ConstantPool::new();
        assert_eq!(pool.len(), 1);
        assert!(pool.is_empty());
        assert!(pool.get(0).is_none());
    }

    #[test]
    fn test_oversized_utf8_is_rejected() {
        let mut pool = ConstantPool::new();
        let long = "x".repeat(MAX_UTF8_LEN + 1);
        assert!(matches!(pool.add_utf8(&long), Err(ClassFileError::StringTooLong(65536))));
        assert!(matches!(pool.add_string(&long), Err(ClassFileError::StringTooLong(_))));
        assert_eq!(pool.len(), 1);

        // NUL takes two bytes in modified UTF-8
        let nuls = "\0".repeat(MAX_UTF8_LEN / 2 + 1);
        assert!(pool.add_utf8(&nuls).is_err());
        let index = pool.add_utf8(&"x".repeat(MAX_UTF8_LEN)).unwrap();
        assert!(matches!(
            pool.set(index, Constant::Utf8(long)),
            Err(ClassFileError::StringTooLong(_))
        ));
    }

    #[test]
    fn test_identical_literals_are_deduplicated() {
        let mut pool = ConstantPool::new();
        let first = pool.add_utf8("key").unwrap();
        let second = pool.add_utf8("key").unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_class_shares_name_utf8() {
        let mut pool = ConstantPool::new();
        let name = pool.add_utf8("com/acme/Foo").unwrap();
        let class = pool.add_class("com/acme/Foo").unwrap();
        assert_eq!(pool.get(class), Some(&Constant::Class { name_index: name }));
        assert_eq!(pool.class_name(class), Some("com/acme/Foo"));
    }

    #[test]
    fn test_long_takes_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.add(Constant::Long(7)).unwrap();
        let next = pool.add_integer(1).unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn test_set_updates_lookup() {
        let mut pool = ConstantPool::new();
        let index = pool.add_utf8("old").unwrap();
        pool.set(index, Constant::Utf8("new".to_string())).unwrap();
        assert_eq!(pool.find_utf8("old"), None);
        assert_eq!(pool.find_utf8("new"), Some(index));
    }

    #[test]
    fn test_set_rejects_unusable_slot() {
        let mut pool = ConstantPool::new();
        assert!(matches!(
            pool.set(0, Constant::Integer(1)),
            Err(ClassFileError::BadConstantIndex(0))
        ));
    }

    #[test]
    fn test_encode_decode_preserves_indices() {
        let mut pool = ConstantPool::new();
        pool.add_class("com/acme/Foo").unwrap();
        pool.add(Constant::Double(2.5f64.to_bits())).unwrap();
        let string = pool.add_string("hello").unwrap();

        let mut writer = ClassWriter::new();
        pool.encode(&mut writer);
        let bytes = writer.into_bytes();
        let decoded = ConstantPool::decode(&mut ClassReader::new(&bytes)).unwrap();

        assert_eq!(decoded.len(), pool.len());
        assert_eq!(decoded.get(string), pool.get(string));
        assert_eq!(decoded.class_name(2), Some("com/acme/Foo"));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let bytes = [0x00, 0x02, 0x63];
        assert!(matches!(
            ConstantPool::decode(&mut ClassReader::new(&bytes)),
            Err(DecodeError::InvalidConstantTag(0x63, 2))
        ));
    }
}
