//! Annotation construction
//!
//! Builders describe an annotation in terms of names and strings; `build`
//! registers every literal in the target constant pool and returns the
//! encoded [`Annotation`].

use crate::names;
use std::collections::BTreeMap;
use t2b_classfile::{Annotation, ClassFileError, ConstantPool, ElementValue, ElementValuePair};

/// Produces an annotation against a specific constant pool
pub trait BuildAnnotation {
    /// Type descriptor of the annotation, e.g. `Lorg/openjdk/jmh/annotations/Benchmark;`
    fn type_descriptor(&self) -> &str;

    /// Register literals in `pool` and build the annotation
    fn build(&self, pool: &mut ConstantPool) -> Result<Annotation, ClassFileError>;
}

fn string_value(pool: &mut ConstantPool, value: &str) -> Result<ElementValue, ClassFileError> {
    Ok(ElementValue::Const {
        tag: b's',
        const_value_index: pool.add_utf8(value)?,
    })
}

fn pair(pool: &mut ConstantPool, name: &str, value: ElementValue) -> Result<ElementValuePair, ClassFileError> {
    Ok(ElementValuePair {
        name_index: pool.add_utf8(name)?,
        value,
    })
}

/// Annotation whose members are all strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringAnnotation {
    descriptor: String,
    members: Vec<(String, String)>,
}

impl StringAnnotation {
    /// Annotation with no members
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            members: Vec::new(),
        }
    }

    /// Append a string member
    pub fn member(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Members in declaration order
    pub fn members(&self) -> &[(String, String)] {
        &self.members
    }
}

impl BuildAnnotation for StringAnnotation {
    fn type_descriptor(&self) -> &str {
        &self.descriptor
    }

    fn build(&self, pool: &mut ConstantPool) -> Result<Annotation, ClassFileError> {
        let type_index = pool.add_utf8(&self.descriptor)?;
        let elements = self
            .members
            .iter()
            .map(|(name, value)| {
                let value = string_value(pool, value)?;
                pair(pool, name, value)
            })
            .collect::<Result<_, _>>()?;
        Ok(Annotation { type_index, elements })
    }
}

/// A single enum-valued member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Element name
    pub name: String,
    /// Enum type descriptor
    pub enum_type: String,
    /// Constant name
    pub constant: String,
}

/// Annotation whose members are enum constants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumAnnotation {
    descriptor: String,
    members: Vec<EnumMember>,
}

impl EnumAnnotation {
    /// Annotation with no members
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            members: Vec::new(),
        }
    }

    /// Append an enum member
    pub fn member(
        mut self,
        name: impl Into<String>,
        enum_type: impl Into<String>,
        constant: impl Into<String>,
    ) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            enum_type: enum_type.into(),
            constant: constant.into(),
        });
        self
    }

    /// `@State(Scope.Benchmark)`
    pub fn state() -> Self {
        Self::new(names::STATE).member(names::VALUE, names::SCOPE, names::SCOPE_BENCHMARK)
    }

    /// `@Setup(Level.Trial)`
    pub fn setup() -> Self {
        Self::new(names::SETUP).member(names::VALUE, names::LEVEL, names::LEVEL_TRIAL)
    }

    /// `@TearDown(Level.Trial)`
    pub fn tear_down() -> Self {
        Self::new(names::TEAR_DOWN).member(names::VALUE, names::LEVEL, names::LEVEL_TRIAL)
    }
}

impl BuildAnnotation for EnumAnnotation {
    fn type_descriptor(&self) -> &str {
        &self.descriptor
    }

    fn build(&self, pool: &mut ConstantPool) -> Result<Annotation, ClassFileError> {
        let type_index = pool.add_utf8(&self.descriptor)?;
        let elements = self
            .members
            .iter()
            .map(|member| {
                let value = ElementValue::Enum {
                    type_name_index: pool.add_utf8(&member.enum_type)?,
                    const_name_index: pool.add_utf8(&member.constant)?,
                };
                pair(pool, &member.name, value)
            })
            .collect::<Result<_, _>>()?;
        Ok(Annotation { type_index, elements })
    }
}

/// Annotation whose `value` is an array of nested string annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAnnotation {
    descriptor: String,
    items: Vec<StringAnnotation>,
}

impl ArrayAnnotation {
    /// Annotation holding `items` under `value`
    pub fn new(descriptor: impl Into<String>, items: Vec<StringAnnotation>) -> Self {
        Self {
            descriptor: descriptor.into(),
            items,
        }
    }

    /// `@CyBenchMetadataList({@BenchmarkMetaData(key = k, value = v), ...})`
    /// with one entry per map pair, in key order
    pub fn metadata_list(entries: &BTreeMap<String, String>) -> Self {
        let items = entries
            .iter()
            .map(|(key, value)| {
                StringAnnotation::new(names::BENCHMARK_METADATA)
                    .member(names::KEY, key.as_str())
                    .member(names::VALUE, value.as_str())
            })
            .collect();
        Self::new(names::METADATA_LIST, items)
    }

    /// Nested annotations
    pub fn items(&self) -> &[StringAnnotation] {
        &self.items
    }
}

impl BuildAnnotation for ArrayAnnotation {
    fn type_descriptor(&self) -> &str {
        &self.descriptor
    }

    fn build(&self, pool: &mut ConstantPool) -> Result<Annotation, ClassFileError> {
        let type_index = pool.add_utf8(&self.descriptor)?;
        let values = self
            .items
            .iter()
            .map(|item| item.build(pool).map(ElementValue::Annotation))
            .collect::<Result<_, _>>()?;
        let value = pair(pool, names::VALUE, ElementValue::Array(values))?;
        Ok(Annotation {
            type_index,
            elements: vec![value],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_annotation() {
        let mut pool = ConstantPool::new();
        let annotation = StringAnnotation::new(names::BENCHMARK_TAG)
            .member(names::TAG, "abc")
            .build(&mut pool)
            .unwrap();

        assert_eq!(annotation.type_descriptor(&pool), Some(names::BENCHMARK_TAG));
        assert_eq!(annotation.element(names::TAG, &pool).unwrap().as_str(&pool), Some("abc"));
    }

    #[test]
    fn test_enum_annotation() {
        let mut pool = ConstantPool::new();
        let annotation = EnumAnnotation::setup().build(&mut pool).unwrap();
        match annotation.element(names::VALUE, &pool) {
            Some(ElementValue::Enum {
                type_name_index,
                const_name_index,
            }) => {
                assert_eq!(pool.utf8(*type_name_index), Some(names::LEVEL));
                assert_eq!(pool.utf8(*const_name_index), Some(names::LEVEL_TRIAL));
            }
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_metadata_list() {
        let mut pool = ConstantPool::new();
        let entries = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let annotation = ArrayAnnotation::metadata_list(&entries).build(&mut pool).unwrap();
        assert_eq!(annotation.type_descriptor(&pool), Some(names::METADATA_LIST));

        let Some(ElementValue::Array(items)) = annotation.element(names::VALUE, &pool) else {
            panic!("value is not an array");
        };
        let keys: Vec<_> = items
            .iter()
            .map(|item| match item {
                ElementValue::Annotation(nested) => nested.element(names::KEY, &pool).unwrap().as_str(&pool).unwrap(),
                other => panic!("unexpected item {:?}", other),
            })
            .collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_literals_are_deduplicated() {
        let mut pool = ConstantPool::new();
        let entries = BTreeMap::from([("value".to_string(), "value".to_string())]);
        ArrayAnnotation::metadata_list(&entries).build(&mut pool).unwrap();
        let before = pool.len();
        ArrayAnnotation::metadata_list(&entries).build(&mut pool).unwrap();
        assert_eq!(pool.len(), before);
    }
}
