//! Class file format (JVMS §4.1)

use crate::annotation::{AnnotationsAttribute, Visibility};
use crate::constants::ConstantPool;
use crate::descriptor::DescriptorError;
use crate::encoder::{ClassReader, ClassWriter, DecodeError};
use thiserror::Error;

/// Magic number of every class file
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Oldest supported major version (JDK 1.1)
pub const MIN_MAJOR_VERSION: u16 = 45;

/// Newest supported major version (JDK 26)
pub const MAX_MAJOR_VERSION: u16 = 70;

/// Major version used for freshly created class files (JDK 8)
pub const DEFAULT_MAJOR_VERSION: u16 = 52;

/// Class file decoding and editing errors
#[derive(Debug, Error)]
pub enum ClassFileError {
    /// Decode error
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected 0xCAFEBABE, got {0:#010x}")]
    InvalidMagic(u32),

    /// Unsupported version
    #[error("Unsupported class file version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version
        major: u16,
        /// Minor version
        minor: u16,
    },

    /// Constant pool is full
    #[error("Constant pool overflow: more than 65535 slots")]
    PoolOverflow,

    /// String does not fit the u16 length prefix of `CONSTANT_Utf8_info`
    #[error("String constant too long: {0} bytes (max 65535)")]
    StringTooLong(usize),

    /// Index does not refer to a usable pool entry of the expected kind
    #[error("Bad constant pool index {0}")]
    BadConstantIndex(u16),

    /// Bytes left over after the last attribute
    #[error("{0} trailing bytes after class file")]
    TrailingBytes(usize),

    /// Malformed descriptor
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// Access flags (JVMS tables 4.1-B, 4.5-A, 4.6-A)
pub mod access {
    #![allow(missing_docs)]
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const BRIDGE: u16 = 0x0040;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;

    /// Check the public bit
    pub fn is_public(flags: u16) -> bool {
        flags & PUBLIC != 0
    }

    /// Check the static bit
    pub fn is_static(flags: u16) -> bool {
        flags & STATIC != 0
    }

    /// Raise to public; private/protected are cleared so at most one
    /// visibility bit remains set
    pub fn make_public(flags: u16) -> u16 {
        (flags & !(PRIVATE | PROTECTED)) | PUBLIC
    }
}

/// An attribute attached to a class, field or method
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Utf8 index of the attribute name
    pub name_index: u16,
    /// Attribute body
    pub body: AttributeBody,
}

/// Attribute body
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBody {
    /// Decoded annotations
    Annotations(AnnotationsAttribute),
    /// Any other attribute, kept verbatim
    Raw(Vec<u8>),
}

impl Attribute {
    fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.name_index);
        match &self.body {
            AttributeBody::Raw(bytes) => {
                writer.emit_u32(bytes.len() as u32);
                writer.emit_bytes(bytes);
            }
            AttributeBody::Annotations(annotations) => {
                let length_offset = writer.reserve_u32();
                let start = writer.offset();
                annotations.encode_body(writer);
                let length = writer.offset() - start;
                writer.patch_u32(length_offset, length as u32);
            }
        }
    }

    fn decode(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let name_index = reader.read_u16()?;
        let length = reader.read_u32()? as usize;
        let body_bytes = reader.read_slice(length)?;

        let visibility = pool.utf8(name_index).and_then(Visibility::from_attribute_name);
        let body = match visibility {
            Some(visibility) => {
                let mut body_reader = ClassReader::new(body_bytes);
                let annotations = AnnotationsAttribute::decode_body(&mut body_reader, visibility)?;
                if body_reader.has_more() {
                    return Err(DecodeError::AttributeLength {
                        name: visibility.attribute_name().to_string(),
                        declared: length,
                        consumed: body_reader.position(),
                    });
                }
                AttributeBody::Annotations(annotations)
            }
            None => AttributeBody::Raw(body_bytes.to_vec()),
        };

        Ok(Self { name_index, body })
    }
}

fn encode_attributes(attributes: &[Attribute], writer: &mut ClassWriter) {
    writer.emit_u16(attributes.len() as u16);
    for attribute in attributes {
        attribute.encode(writer);
    }
}

fn decode_attributes(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Attribute>, DecodeError> {
    let count = reader.read_u16()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        attributes.push(Attribute::decode(reader, pool)?);
    }
    Ok(attributes)
}

/// Find the annotations attribute of the given tier in an attribute list
pub fn find_annotations(attributes: &[Attribute], visibility: Visibility) -> Option<&AnnotationsAttribute> {
    attributes.iter().find_map(|attribute| match &attribute.body {
        AttributeBody::Annotations(a) if a.visibility == visibility => Some(a),
        _ => None,
    })
}

/// Find the annotations attribute of the given tier, creating and attaching
/// an empty one when absent
pub fn annotations_mut_or_insert<'a>(
    attributes: &'a mut Vec<Attribute>,
    visibility: Visibility,
    pool: &mut ConstantPool,
) -> Result<&'a mut AnnotationsAttribute, ClassFileError> {
    let position = attributes.iter().position(|attribute| {
        matches!(&attribute.body, AttributeBody::Annotations(a) if a.visibility == visibility)
    });

    let position = match position {
        Some(position) => position,
        None => {
            let name_index = pool.add_utf8(visibility.attribute_name())?;
            attributes.push(Attribute {
                name_index,
                body: AttributeBody::Annotations(AnnotationsAttribute::new(visibility)),
            });
            attributes.len() - 1
        }
    };

    match &mut attributes[position].body {
        AttributeBody::Annotations(annotations) => Ok(annotations),
        AttributeBody::Raw(_) => unreachable!("position always refers to an annotations attribute"),
    }
}

/// A field or method
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    /// Access flags
    pub access_flags: u16,
    /// Utf8 index of the simple name
    pub name_index: u16,
    /// Utf8 index of the descriptor
    pub descriptor_index: u16,
    /// Attributes
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    /// Simple name
    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        pool.utf8(self.name_index)
    }

    /// Descriptor
    pub fn descriptor<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        pool.utf8(self.descriptor_index)
    }

    /// Annotations attribute of the given tier
    pub fn annotations(&self, visibility: Visibility) -> Option<&AnnotationsAttribute> {
        find_annotations(&self.attributes, visibility)
    }

    fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.access_flags);
        writer.emit_u16(self.name_index);
        writer.emit_u16(self.descriptor_index);
        encode_attributes(&self.attributes, writer);
    }

    fn decode(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        Ok(Self {
            access_flags: reader.read_u16()?,
            name_index: reader.read_u16()?,
            descriptor_index: reader.read_u16()?,
            attributes: decode_attributes(reader, pool)?,
        })
    }
}

/// A decoded class file
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// Constant pool
    pub constant_pool: ConstantPool,
    /// Class access flags
    pub access_flags: u16,
    /// Class index of this class
    pub this_class: u16,
    /// Class index of the superclass (0 for `java/lang/Object`)
    pub super_class: u16,
    /// Class indices of implemented interfaces
    pub interfaces: Vec<u16>,
    /// Fields
    pub fields: Vec<MemberInfo>,
    /// Methods
    pub methods: Vec<MemberInfo>,
    /// Class attributes
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Create an empty public class extending `super_name`
    pub fn new(internal_name: &str, super_name: &str) -> Result<Self, ClassFileError> {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.add_class(internal_name)?;
        let super_class = constant_pool.add_class(super_name)?;
        Ok(Self {
            minor_version: 0,
            major_version: DEFAULT_MAJOR_VERSION,
            constant_pool,
            access_flags: access::PUBLIC | access::SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    /// Internal name of this class
    pub fn this_name(&self) -> Option<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, `None` for `java/lang/Object`
    pub fn super_name(&self) -> Option<&str> {
        if self.super_class == 0 {
            return None;
        }
        self.constant_pool.class_name(self.super_class)
    }

    /// Append a method and return its position
    pub fn add_method(&mut self, access_flags: u16, name: &str, descriptor: &str) -> Result<usize, ClassFileError> {
        let member = self.new_member(access_flags, name, descriptor)?;
        self.methods.push(member);
        Ok(self.methods.len() - 1)
    }

    /// Append a field and return its position
    pub fn add_field(&mut self, access_flags: u16, name: &str, descriptor: &str) -> Result<usize, ClassFileError> {
        let member = self.new_member(access_flags, name, descriptor)?;
        self.fields.push(member);
        Ok(self.fields.len() - 1)
    }

    fn new_member(&mut self, access_flags: u16, name: &str, descriptor: &str) -> Result<MemberInfo, ClassFileError> {
        Ok(MemberInfo {
            access_flags,
            name_index: self.constant_pool.add_utf8(name)?,
            descriptor_index: self.constant_pool.add_utf8(descriptor)?,
            attributes: Vec::new(),
        })
    }

    /// First declared method with the given simple name
    pub fn method_position(&self, name: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.name(&self.constant_pool) == Some(name))
    }

    /// Class-level annotations attribute of the given tier
    pub fn annotations(&self, visibility: Visibility) -> Option<&AnnotationsAttribute> {
        find_annotations(&self.attributes, visibility)
    }

    /// Encode to class file bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ClassWriter::with_capacity(1024);

        writer.emit_u32(MAGIC);
        writer.emit_u16(self.minor_version);
        writer.emit_u16(self.major_version);
        self.constant_pool.encode(&mut writer);
        writer.emit_u16(self.access_flags);
        writer.emit_u16(self.this_class);
        writer.emit_u16(self.super_class);

        writer.emit_u16(self.interfaces.len() as u16);
        for &interface in &self.interfaces {
            writer.emit_u16(interface);
        }

        writer.emit_u16(self.fields.len() as u16);
        for field in &self.fields {
            field.encode(&mut writer);
        }

        writer.emit_u16(self.methods.len() as u16);
        for method in &self.methods {
            method.encode(&mut writer);
        }

        encode_attributes(&self.attributes, &mut writer);

        writer.into_bytes()
    }

    /// Decode class file bytes
    pub fn decode(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = ClassReader::new(data);

        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::InvalidMagic(magic));
        }

        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(ClassFileError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_pool = ConstantPool::decode(&mut reader)?;
        let access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let super_class = reader.read_u16()?;

        let interface_count = reader.read_u16()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(reader.read_u16()?);
        }

        let field_count = reader.read_u16()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(MemberInfo::decode(&mut reader, &constant_pool)?);
        }

        let method_count = reader.read_u16()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(MemberInfo::decode(&mut reader, &constant_pool)?);
        }

        let attributes = decode_attributes(&mut reader, &constant_pool)?;

        if reader.has_more() {
            return Err(ClassFileError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;

    fn sample_class() -> ClassFile {
        let mut class = ClassFile::new("com/acme/CalculatorTest", "java/lang/Object").unwrap();
        class.add_field(access::PRIVATE, "calculator", "Lcom/acme/Calculator;").unwrap();
        class.add_method(access::PUBLIC, "<init>", "()V").unwrap();
        class.add_method(access::PUBLIC, "testAdd", "()V").unwrap();
        class
    }

    #[test]
    fn test_new_class() {
        let class = sample_class();
        assert_eq!(class.this_name(), Some("com/acme/CalculatorTest"));
        assert_eq!(class.super_name(), Some("java/lang/Object"));
        assert_eq!(class.method_position("testAdd"), Some(1));
        assert_eq!(class.method_position("missing"), None);
    }

    #[test]
    fn test_encode_decode() {
        let class = sample_class();
        let bytes = class.encode();
        assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);

        let decoded = ClassFile::decode(&bytes).unwrap();
        assert_eq!(decoded, class);
    }

    #[test]
    fn test_raw_attributes_are_preserved() {
        let mut class = sample_class();
        let name_index = class.constant_pool.add_utf8("SourceFile").unwrap();
        let source = class.constant_pool.add_utf8("CalculatorTest.java").unwrap();
        class.attributes.push(Attribute {
            name_index,
            body: AttributeBody::Raw(source.to_be_bytes().to_vec()),
        });

        let decoded = ClassFile::decode(&class.encode()).unwrap();
        assert_eq!(decoded.attributes, class.attributes);
    }

    #[test]
    fn test_annotations_attribute_is_created_once() {
        let mut class = sample_class();
        let type_index = class.constant_pool.add_utf8("Lcom/acme/Marker;").unwrap();

        for _ in 0..2 {
            let annotations = annotations_mut_or_insert(
                &mut class.attributes,
                Visibility::Visible,
                &mut class.constant_pool,
            )
            .unwrap();
            annotations.add(Annotation {
                type_index,
                elements: Vec::new(),
            });
        }

        assert_eq!(class.attributes.len(), 1);
        let decoded = ClassFile::decode(&class.encode()).unwrap();
        let annotations = decoded.annotations(Visibility::Visible).unwrap();
        assert_eq!(annotations.annotations.len(), 2);
        assert!(decoded.annotations(Visibility::Invisible).is_none());
    }

    #[test]
    fn test_make_public_clears_other_visibility() {
        let flags = access::make_public(access::PRIVATE | access::STATIC);
        assert_eq!(flags, access::PUBLIC | access::STATIC);
        assert!(access::is_public(flags));
        assert!(access::is_static(flags));
    }

    #[test]
    fn test_invalid_magic() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 52];
        assert!(matches!(
            ClassFile::decode(&bytes),
            Err(ClassFileError::InvalidMagic(0xDEADBEEF))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 99];
        assert!(matches!(
            ClassFile::decode(&bytes),
            Err(ClassFileError::UnsupportedVersion { major: 99, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = sample_class().encode();
        bytes.push(0);
        assert!(matches!(
            ClassFile::decode(&bytes),
            Err(ClassFileError::TrailingBytes(1))
        ));
    }
}
