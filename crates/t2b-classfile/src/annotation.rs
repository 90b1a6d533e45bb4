//! Annotation attributes (JVMS §4.7.16)
//!
//! Only `RuntimeVisibleAnnotations` and `RuntimeInvisibleAnnotations` are
//! decoded into structured form; parameter and type annotations stay raw.

use crate::constants::ConstantPool;
use crate::encoder::{ClassReader, ClassWriter, DecodeError};

/// Attribute name of visible annotations
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
/// Attribute name of invisible annotations
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// Retention tier of an annotations attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Retained and visible to reflection at runtime
    Visible,
    /// Retained in the class file only
    Invisible,
}

impl Visibility {
    /// Attribute name used for this tier
    pub fn attribute_name(self) -> &'static str {
        match self {
            Visibility::Visible => RUNTIME_VISIBLE_ANNOTATIONS,
            Visibility::Invisible => RUNTIME_INVISIBLE_ANNOTATIONS,
        }
    }

    /// Tier for an attribute name, if it is an annotations attribute
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        match name {
            RUNTIME_VISIBLE_ANNOTATIONS => Some(Visibility::Visible),
            RUNTIME_INVISIBLE_ANNOTATIONS => Some(Visibility::Invisible),
            _ => None,
        }
    }
}

/// A single annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Utf8 index of the annotation type descriptor (`Lpkg/Name;`)
    pub type_index: u16,
    /// Element-value pairs in declaration order
    pub elements: Vec<ElementValuePair>,
}

/// A named annotation element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementValuePair {
    /// Utf8 index of the element name
    pub name_index: u16,
    /// Element value
    pub value: ElementValue,
}

/// Annotation element value
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// Primitive or string constant; `tag` is one of `BCDFIJSZs`
    Const {
        /// Element tag byte
        tag: u8,
        /// Pool index of the constant
        const_value_index: u16,
    },
    /// Enum constant
    Enum {
        /// Utf8 index of the enum type descriptor
        type_name_index: u16,
        /// Utf8 index of the constant name
        const_name_index: u16,
    },
    /// Class literal (return descriptor)
    Class {
        /// Utf8 index of the return descriptor
        class_info_index: u16,
    },
    /// Nested annotation
    Annotation(Annotation),
    /// Array of values
    Array(Vec<ElementValue>),
}

impl Annotation {
    /// Type descriptor of the annotation, e.g. `Lorg/junit/Test;`
    pub fn type_descriptor<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        pool.utf8(self.type_index)
    }

    /// Look up an element by name
    pub fn element(&self, name: &str, pool: &ConstantPool) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|pair| pool.utf8(pair.name_index) == Some(name))
            .map(|pair| &pair.value)
    }

    /// Names of all elements present on this annotation
    pub fn element_names<'p>(&self, pool: &'p ConstantPool) -> Vec<&'p str> {
        self.elements
            .iter()
            .filter_map(|pair| pool.utf8(pair.name_index))
            .collect()
    }

    fn encode(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.type_index);
        writer.emit_u16(self.elements.len() as u16);
        for pair in &self.elements {
            writer.emit_u16(pair.name_index);
            pair.value.encode(writer);
        }
    }

    fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let type_index = reader.read_u16()?;
        let count = reader.read_u16()? as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let name_index = reader.read_u16()?;
            let value = ElementValue::decode(reader)?;
            elements.push(ElementValuePair { name_index, value });
        }
        Ok(Self {
            type_index,
            elements,
        })
    }
}

impl ElementValue {
    /// String value of a `s` constant
    pub fn as_str<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        match self {
            ElementValue::Const {
                tag: b's',
                const_value_index,
            } => pool.utf8(*const_value_index),
            _ => None,
        }
    }

    /// Integer value of an `I`/`Z`/`S`/`B`/`C` constant
    pub fn as_int(&self, pool: &ConstantPool) -> Option<i32> {
        match self {
            ElementValue::Const {
                tag: b'I' | b'Z' | b'S' | b'B' | b'C',
                const_value_index,
            } => match pool.get(*const_value_index) {
                Some(crate::constants::Constant::Integer(value)) => Some(*value),
                _ => None,
            },
            _ => None,
        }
    }

    fn encode(&self, writer: &mut ClassWriter) {
        match self {
            ElementValue::Const {
                tag,
                const_value_index,
            } => {
                writer.emit_u8(*tag);
                writer.emit_u16(*const_value_index);
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                writer.emit_u8(b'e');
                writer.emit_u16(*type_name_index);
                writer.emit_u16(*const_name_index);
            }
            ElementValue::Class { class_info_index } => {
                writer.emit_u8(b'c');
                writer.emit_u16(*class_info_index);
            }
            ElementValue::Annotation(annotation) => {
                writer.emit_u8(b'@');
                annotation.encode(writer);
            }
            ElementValue::Array(values) => {
                writer.emit_u8(b'[');
                writer.emit_u16(values.len() as u16);
                for value in values {
                    value.encode(writer);
                }
            }
        }
    }

    fn decode(reader: &mut ClassReader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.position();
        let tag = reader.read_u8()?;
        let value = match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
                tag,
                const_value_index: reader.read_u16()?,
            },
            b'e' => ElementValue::Enum {
                type_name_index: reader.read_u16()?,
                const_name_index: reader.read_u16()?,
            },
            b'c' => ElementValue::Class {
                class_info_index: reader.read_u16()?,
            },
            b'@' => ElementValue::Annotation(Annotation::decode(reader)?),
            b'[' => {
                let count = reader.read_u16()? as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(ElementValue::decode(reader)?);
                }
                ElementValue::Array(values)
            }
            other => return Err(DecodeError::InvalidElementTag(other as char, offset)),
        };
        Ok(value)
    }
}

/// Body of a `Runtime(In)VisibleAnnotations` attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationsAttribute {
    /// Retention tier
    pub visibility: Visibility,
    /// Annotations in order
    pub annotations: Vec<Annotation>,
}

impl AnnotationsAttribute {
    /// Create an empty attribute
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            annotations: Vec::new(),
        }
    }

    /// Append an annotation
    pub fn add(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Find the first annotation with the given type descriptor
    pub fn find(&self, descriptor: &str, pool: &ConstantPool) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.type_descriptor(pool) == Some(descriptor))
    }

    /// Encode the attribute body (without name index and length)
    pub fn encode_body(&self, writer: &mut ClassWriter) {
        writer.emit_u16(self.annotations.len() as u16);
        for annotation in &self.annotations {
            annotation.encode(writer);
        }
    }

    /// Decode the attribute body (without name index and length)
    pub fn decode_body(
        reader: &mut ClassReader<'_>,
        visibility: Visibility,
    ) -> Result<Self, DecodeError> {
        let count = reader.read_u16()? as usize;
        let mut annotations = Vec::with_capacity(count);
        for _ in 0..count {
            annotations.push(Annotation::decode(reader)?);
        }
        Ok(Self {
            visibility,
            annotations,
        })
    }
}
