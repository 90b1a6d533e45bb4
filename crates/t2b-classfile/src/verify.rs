//! Structural verification of class files
//!
//! Checks that every index the rewriter relies on points at a pool entry of
//! the right kind. Bytecode inside `Code` attributes is not inspected.

use crate::annotation::{Annotation, ElementValue};
use crate::classfile::{Attribute, AttributeBody, ClassFile, MemberInfo};
use crate::constants::{Constant, ConstantPool};
use crate::descriptor::{parse_field_descriptor, MethodDescriptor};

/// Class file verification errors
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Index is zero, out of range, or the second slot of a long/double
    #[error("Invalid constant pool reference {index} in {context}")]
    InvalidConstantRef {
        /// Offending index
        index: u16,
        /// Structure holding the reference
        context: String,
    },

    /// Index points at an entry of the wrong kind
    #[error("Constant pool entry {index} in {context} is not a {expected}")]
    WrongConstantKind {
        /// Offending index
        index: u16,
        /// Expected entry kind
        expected: &'static str,
        /// Structure holding the reference
        context: String,
    },

    /// Member descriptor does not parse
    #[error("Malformed descriptor {descriptor:?} for {member}")]
    BadDescriptor {
        /// Member name
        member: String,
        /// Descriptor text
        descriptor: String,
    },

    /// Two members share name and descriptor
    #[error("Duplicate member {name}{descriptor}")]
    DuplicateMember {
        /// Member name
        name: String,
        /// Member descriptor
        descriptor: String,
    },
}

/// Verify the structure of a class file
pub fn verify_class(class: &ClassFile) -> Result<(), VerifyError> {
    let pool = &class.constant_pool;

    expect_class(pool, class.this_class, "this_class")?;
    if class.super_class != 0 {
        expect_class(pool, class.super_class, "super_class")?;
    }
    for &interface in &class.interfaces {
        expect_class(pool, interface, "interfaces")?;
    }

    verify_members(pool, &class.fields, false)?;
    verify_members(pool, &class.methods, true)?;
    verify_attributes(pool, &class.attributes, "class attributes")?;

    Ok(())
}

fn verify_members(pool: &ConstantPool, members: &[MemberInfo], methods: bool) -> Result<(), VerifyError> {
    let mut seen = std::collections::HashSet::new();
    for member in members {
        let name = expect_utf8(pool, member.name_index, "member name")?;
        let descriptor = expect_utf8(pool, member.descriptor_index, name)?;

        let parsed = if methods {
            MethodDescriptor::parse(descriptor).map(|_| ())
        } else {
            parse_field_descriptor(descriptor).map(|_| ())
        };
        if parsed.is_err() {
            return Err(VerifyError::BadDescriptor {
                member: name.to_string(),
                descriptor: descriptor.to_string(),
            });
        }

        if !seen.insert((name, descriptor)) {
            return Err(VerifyError::DuplicateMember {
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            });
        }

        verify_attributes(pool, &member.attributes, name)?;
    }
    Ok(())
}

fn verify_attributes(pool: &ConstantPool, attributes: &[Attribute], context: &str) -> Result<(), VerifyError> {
    for attribute in attributes {
        expect_utf8(pool, attribute.name_index, context)?;
        if let AttributeBody::Annotations(annotations) = &attribute.body {
            for annotation in &annotations.annotations {
                verify_annotation(pool, annotation, context)?;
            }
        }
    }
    Ok(())
}

fn verify_annotation(pool: &ConstantPool, annotation: &Annotation, context: &str) -> Result<(), VerifyError> {
    expect_utf8(pool, annotation.type_index, context)?;
    for pair in &annotation.elements {
        expect_utf8(pool, pair.name_index, context)?;
        verify_element(pool, &pair.value, context)?;
    }
    Ok(())
}

fn verify_element(pool: &ConstantPool, value: &ElementValue, context: &str) -> Result<(), VerifyError> {
    match value {
        ElementValue::Const {
            tag,
            const_value_index,
        } => {
            let index = *const_value_index;
            let constant = lookup(pool, index, context)?;
            let ok = match tag {
                b's' => matches!(constant, Constant::Utf8(_)),
                b'J' => matches!(constant, Constant::Long(_)),
                b'D' => matches!(constant, Constant::Double(_)),
                b'F' => matches!(constant, Constant::Float(_)),
                _ => matches!(constant, Constant::Integer(_)),
            };
            if !ok {
                return Err(VerifyError::WrongConstantKind {
                    index,
                    expected: "constant matching its element tag",
                    context: context.to_string(),
                });
            }
        }
        ElementValue::Enum {
            type_name_index,
            const_name_index,
        } => {
            expect_utf8(pool, *type_name_index, context)?;
            expect_utf8(pool, *const_name_index, context)?;
        }
        ElementValue::Class { class_info_index } => {
            expect_utf8(pool, *class_info_index, context)?;
        }
        ElementValue::Annotation(annotation) => verify_annotation(pool, annotation, context)?,
        ElementValue::Array(values) => {
            for value in values {
                verify_element(pool, value, context)?;
            }
        }
    }
    Ok(())
}

fn lookup<'p>(pool: &'p ConstantPool, index: u16, context: &str) -> Result<&'p Constant, VerifyError> {
    pool.get(index).ok_or_else(|| VerifyError::InvalidConstantRef {
        index,
        context: context.to_string(),
    })
}

fn expect_utf8<'p>(pool: &'p ConstantPool, index: u16, context: &str) -> Result<&'p str, VerifyError> {
    match lookup(pool, index, context)? {
        Constant::Utf8(value) => Ok(value),
        _ => Err(VerifyError::WrongConstantKind {
            index,
            expected: "Utf8",
            context: context.to_string(),
        }),
    }
}

fn expect_class(pool: &ConstantPool, index: u16, context: &str) -> Result<(), VerifyError> {
    match lookup(pool, index, context)? {
        Constant::Class { name_index } => expect_utf8(pool, *name_index, context).map(|_| ()),
        _ => Err(VerifyError::WrongConstantKind {
            index,
            expected: "Class",
            context: context.to_string(),
        }),
    }
}
