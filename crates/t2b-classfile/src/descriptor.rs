//! Field and method descriptors (JVMS §4.3)

use thiserror::Error;

/// Descriptor parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// Descriptor ended in the middle of a type
    #[error("Truncated descriptor: {0}")]
    Truncated(String),

    /// Unexpected character
    #[error("Unexpected '{found}' at position {position} in descriptor {descriptor}")]
    Unexpected {
        /// Whole descriptor
        descriptor: String,
        /// Character offset
        position: usize,
        /// Character found there
        found: char,
    },
}

/// A field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Primitive type by descriptor character (`B C D F I J S Z`)
    Base(char),
    /// Class or interface by internal name
    Object(String),
    /// Array of a component type
    Array(Box<FieldType>),
}

impl FieldType {
    /// Render as a Java source type name (`java.lang.String[]`)
    pub fn java_name(&self) -> String {
        match self {
            FieldType::Base(c) => match c {
                'B' => "byte",
                'C' => "char",
                'D' => "double",
                'F' => "float",
                'I' => "int",
                'J' => "long",
                'S' => "short",
                'Z' => "boolean",
                _ => "?",
            }
            .to_string(),
            FieldType::Object(name) => internal_to_qualified(name),
            FieldType::Array(component) => format!("{}[]", component.java_name()),
        }
    }

    /// Render back to descriptor form
    pub fn descriptor(&self) -> String {
        match self {
            FieldType::Base(c) => c.to_string(),
            FieldType::Object(name) => format!("L{};", name),
            FieldType::Array(component) => format!("[{}", component.descriptor()),
        }
    }
}

/// A parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter types in order
    pub parameters: Vec<FieldType>,
    /// Return type, `None` for `void`
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    /// Parse a method descriptor such as `(ILjava/lang/String;)V`
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let chars: Vec<char> = descriptor.chars().collect();
        let mut pos = 0;
        expect(descriptor, &chars, &mut pos, '(')?;

        let mut parameters = Vec::new();
        loop {
            match chars.get(pos) {
                Some(')') => {
                    pos += 1;
                    break;
                }
                Some(_) => parameters.push(parse_field_type(descriptor, &chars, &mut pos)?),
                None => return Err(DescriptorError::Truncated(descriptor.to_string())),
            }
        }

        let return_type = match chars.get(pos) {
            Some('V') => {
                pos += 1;
                None
            }
            Some(_) => Some(parse_field_type(descriptor, &chars, &mut pos)?),
            None => return Err(DescriptorError::Truncated(descriptor.to_string())),
        };

        if let Some(&found) = chars.get(pos) {
            return Err(DescriptorError::Unexpected {
                descriptor: descriptor.to_string(),
                position: pos,
                found,
            });
        }

        Ok(Self {
            parameters,
            return_type,
        })
    }

    /// Java name of the return type (`void` when absent)
    pub fn return_java_name(&self) -> String {
        self.return_type
            .as_ref()
            .map(FieldType::java_name)
            .unwrap_or_else(|| "void".to_string())
    }

    /// Java names of the parameter types
    pub fn parameter_java_names(&self) -> Vec<String> {
        self.parameters.iter().map(FieldType::java_name).collect()
    }
}

/// Parse a single field descriptor such as `[I`
pub fn parse_field_descriptor(descriptor: &str) -> Result<FieldType, DescriptorError> {
    let chars: Vec<char> = descriptor.chars().collect();
    let mut pos = 0;
    let ty = parse_field_type(descriptor, &chars, &mut pos)?;
    if let Some(&found) = chars.get(pos) {
        return Err(DescriptorError::Unexpected {
            descriptor: descriptor.to_string(),
            position: pos,
            found,
        });
    }
    Ok(ty)
}

fn expect(descriptor: &str, chars: &[char], pos: &mut usize, want: char) -> Result<(), DescriptorError> {
    match chars.get(*pos) {
        Some(&c) if c == want => {
            *pos += 1;
            Ok(())
        }
        Some(&found) => Err(DescriptorError::Unexpected {
            descriptor: descriptor.to_string(),
            position: *pos,
            found,
        }),
        None => Err(DescriptorError::Truncated(descriptor.to_string())),
    }
}

fn parse_field_type(
    descriptor: &str,
    chars: &[char],
    pos: &mut usize,
) -> Result<FieldType, DescriptorError> {
    let c = *chars
        .get(*pos)
        .ok_or_else(|| DescriptorError::Truncated(descriptor.to_string()))?;
    *pos += 1;
    match c {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => Ok(FieldType::Base(c)),
        '[' => Ok(FieldType::Array(Box::new(parse_field_type(descriptor, chars, pos)?))),
        'L' => {
            let start = *pos;
            while chars.get(*pos).is_some_and(|&c| c != ';') {
                *pos += 1;
            }
            if *pos >= chars.len() || *pos == start {
                return Err(DescriptorError::Truncated(descriptor.to_string()));
            }
            let name: String = chars[start..*pos].iter().collect();
            *pos += 1;
            Ok(FieldType::Object(name))
        }
        found => Err(DescriptorError::Unexpected {
            descriptor: descriptor.to_string(),
            position: *pos - 1,
            found,
        }),
    }
}

/// Replace every `L<old>;` reference in a descriptor with `L<new>;`
///
/// Returns `None` when the descriptor does not mention `old`.
pub fn rename_in_descriptor(descriptor: &str, old: &str, new: &str) -> Option<String> {
    let mut out = String::with_capacity(descriptor.len());
    let mut changed = false;
    let mut rest = descriptor;

    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find(';') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        out.push('L');
        if name == old {
            out.push_str(new);
            changed = true;
        } else {
            out.push_str(name);
        }
        out.push(';');
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    changed.then_some(out)
}

/// `com/acme/Foo$Bar` → `com.acme.Foo$Bar`
pub fn internal_to_qualified(internal: &str) -> String {
    internal.replace('/', ".")
}

/// `com.acme.Foo$Bar` → `com/acme/Foo$Bar`
pub fn qualified_to_internal(qualified: &str) -> String {
    qualified.replace('.', "/")
}
