//! Class renaming
//!
//! A rename repoints every structure that names the class: `Class` entries
//! (including array classes), `NameAndType` and `MethodType` descriptors, and
//! field/method descriptors. New Utf8 entries are appended rather than
//! rewriting existing ones in place, since a Utf8 entry may also back a string
//! literal.

use crate::classfile::{ClassFile, ClassFileError};
use crate::constants::Constant;
use crate::descriptor::rename_in_descriptor;

enum PoolEdit {
    Class { index: u16, name: String },
    NameAndType { index: u16, name_index: u16, descriptor: String },
    MethodType { index: u16, descriptor: String },
}

impl ClassFile {
    /// Rename this class to `new_name` (internal form)
    pub fn rename_class(&mut self, new_name: &str) -> Result<(), ClassFileError> {
        let old_name = self
            .this_name()
            .ok_or(ClassFileError::BadConstantIndex(self.this_class))?
            .to_string();
        if old_name == new_name {
            return Ok(());
        }

        let pool = &self.constant_pool;
        let rename_descriptor = |index: u16| {
            pool.utf8(index)
                .and_then(|descriptor| rename_in_descriptor(descriptor, &old_name, new_name))
        };

        let mut edits = Vec::new();
        for (index, constant) in pool.iter() {
            match constant {
                Constant::Class { name_index } => {
                    let renamed = match pool.utf8(*name_index) {
                        Some(name) if name == old_name => Some(new_name.to_string()),
                        Some(name) if name.starts_with('[') => rename_in_descriptor(name, &old_name, new_name),
                        _ => None,
                    };
                    if let Some(name) = renamed {
                        edits.push(PoolEdit::Class { index, name });
                    }
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    if let Some(descriptor) = rename_descriptor(*descriptor_index) {
                        edits.push(PoolEdit::NameAndType {
                            index,
                            name_index: *name_index,
                            descriptor,
                        });
                    }
                }
                Constant::MethodType { descriptor_index } => {
                    if let Some(descriptor) = rename_descriptor(*descriptor_index) {
                        edits.push(PoolEdit::MethodType { index, descriptor });
                    }
                }
                _ => {}
            }
        }

        let member_edits: Vec<(bool, usize, String)> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (true, i, f.descriptor_index))
            .chain(
                self.methods
                    .iter()
                    .enumerate()
                    .map(|(i, m)| (false, i, m.descriptor_index)),
            )
            .filter_map(|(is_field, i, index)| rename_descriptor(index).map(|d| (is_field, i, d)))
            .collect();

        for edit in edits {
            match edit {
                PoolEdit::Class { index, name } => {
                    let name_index = self.constant_pool.add_utf8(&name)?;
                    self.constant_pool.set(index, Constant::Class { name_index })?;
                }
                PoolEdit::NameAndType {
                    index,
                    name_index,
                    descriptor,
                } => {
                    let descriptor_index = self.constant_pool.add_utf8(&descriptor)?;
                    self.constant_pool.set(
                        index,
                        Constant::NameAndType {
                            name_index,
                            descriptor_index,
                        },
                    )?;
                }
                PoolEdit::MethodType { index, descriptor } => {
                    let descriptor_index = self.constant_pool.add_utf8(&descriptor)?;
                    self.constant_pool
                        .set(index, Constant::MethodType { descriptor_index })?;
                }
            }
        }

        for (is_field, position, descriptor) in member_edits {
            let descriptor_index = self.constant_pool.add_utf8(&descriptor)?;
            let member = if is_field {
                &mut self.fields[position]
            } else {
                &mut self.methods[position]
            };
            member.descriptor_index = descriptor_index;
        }

        Ok(())
    }
}

/// Simple name of a class from its internal or qualified name
///
/// `com/acme/Outer$Inner` → `Outer$Inner`.
pub fn simple_name(name: &str) -> &str {
    name.rsplit(['/', '.']).next().unwrap_or(name)
}

/// Package part of an internal name, empty for the default package
pub fn package_of(internal_name: &str) -> &str {
    internal_name
        .rfind('/')
        .map(|i| &internal_name[..i])
        .unwrap_or("")
}

/// Append `suffix` to the outermost segment of a (possibly nested) class name
///
/// `com/acme/Outer$Inner` + `X` → `com/acme/OuterX$Inner`.
pub fn suffixed_name(name: &str, suffix: &str) -> String {
    let package_len = name.rfind(['/', '.']).map(|i| i + 1).unwrap_or(0);
    let (package, simple) = name.split_at(package_len);
    match simple.split_once('$') {
        Some((outer, nested)) => format!("{package}{outer}{suffix}${nested}"),
        None => format!("{package}{simple}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::access;

    #[test]
    fn test_suffixed_name() {
        assert_eq!(suffixed_name("com/acme/Foo", "Bench"), "com/acme/FooBench");
        assert_eq!(suffixed_name("com/acme/Foo$Bar$Baz", "Bench"), "com/acme/FooBench$Bar$Baz");
        assert_eq!(suffixed_name("com.acme.Foo$Bar", "Bench"), "com.acme.FooBench$Bar");
        assert_eq!(suffixed_name("Foo", "Bench"), "FooBench");
    }

    #[test]
    fn test_simple_and_package_names() {
        assert_eq!(simple_name("com/acme/Outer$Inner"), "Outer$Inner");
        assert_eq!(simple_name("Foo"), "Foo");
        assert_eq!(package_of("com/acme/Foo"), "com/acme");
        assert_eq!(package_of("Foo"), "");
    }

    #[test]
    fn test_rename_repoints_class_and_descriptors() {
        let mut class = ClassFile::new("com/acme/Foo", "java/lang/Object").unwrap();
        class.add_method(access::PUBLIC, "self", "()Lcom/acme/Foo;").unwrap();
        class.add_field(access::PRIVATE, "all", "[Lcom/acme/Foo;").unwrap();
        class.constant_pool.add_class("[Lcom/acme/Foo;").unwrap();
        let nat = class
            .constant_pool
            .add_name_and_type("copy", "(Lcom/acme/Foo;)V")
            .unwrap();
        let literal = class.constant_pool.add_string("com/acme/Foo").unwrap();

        class.rename_class("com/acme/FooBench").unwrap();

        let pool = &class.constant_pool;
        assert_eq!(class.this_name(), Some("com/acme/FooBench"));
        assert_eq!(class.methods[0].descriptor(pool), Some("()Lcom/acme/FooBench;"));
        assert_eq!(class.fields[0].descriptor(pool), Some("[Lcom/acme/FooBench;"));
        assert!(pool
            .iter()
            .any(|(_, c)| matches!(c, Constant::Class { name_index } if pool.utf8(*name_index) == Some("[Lcom/acme/FooBench;"))));
        match pool.get(nat) {
            Some(Constant::NameAndType { descriptor_index, .. }) => {
                assert_eq!(pool.utf8(*descriptor_index), Some("(Lcom/acme/FooBench;)V"));
            }
            other => panic!("unexpected constant {:?}", other),
        }
        match pool.get(literal) {
            Some(Constant::String { string_index }) => {
                assert_eq!(pool.utf8(*string_index), Some("com/acme/Foo"));
            }
            other => panic!("unexpected constant {:?}", other),
        }
    }

    #[test]
    fn test_rename_leaves_superclass_alone() {
        let mut class = ClassFile::new("com/acme/Foo", "com/acme/Base").unwrap();
        class.rename_class("com/acme/FooX").unwrap();
        assert_eq!(class.super_name(), Some("com/acme/Base"));
    }
}
