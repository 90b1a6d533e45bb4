//! Integration tests for class file decoding, editing and re-encoding

use t2b_classfile::{
    access, annotation::ElementValue, classfile::annotations_mut_or_insert, verify_class, Annotation,
    Attribute, AttributeBody, ClassFile, ElementValuePair, Visibility,
};

/// Hand-assembled `public class Calc { public int add(int, int); }` with a
/// `SourceFile` attribute and a raw `Code` attribute.
fn hand_assembled_class() -> Vec<u8> {
    let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
    let utf8 = |bytes: &mut Vec<u8>, s: &str| {
        bytes.push(1);
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
    };

    // constant_pool_count = 10 (entries 1..=9)
    bytes.extend_from_slice(&[0x00, 0x0A]);
    utf8(&mut bytes, "Calc"); // 1
    bytes.extend_from_slice(&[7, 0x00, 0x01]); // 2 Class Calc
    utf8(&mut bytes, "java/lang/Object"); // 3
    bytes.extend_from_slice(&[7, 0x00, 0x03]); // 4 Class Object
    utf8(&mut bytes, "add"); // 5
    utf8(&mut bytes, "(II)I"); // 6
    utf8(&mut bytes, "Code"); // 7
    utf8(&mut bytes, "SourceFile"); // 8
    utf8(&mut bytes, "Calc.java"); // 9

    bytes.extend_from_slice(&[0x00, 0x21]); // public super
    bytes.extend_from_slice(&[0x00, 0x02, 0x00, 0x04]); // this, super
    bytes.extend_from_slice(&[0x00, 0x00]); // interfaces
    bytes.extend_from_slice(&[0x00, 0x00]); // fields

    bytes.extend_from_slice(&[0x00, 0x01]); // methods
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x05, 0x00, 0x06, 0x00, 0x01]);
    let code = [
        0x00, 0x02, 0x00, 0x03, // max_stack, max_locals
        0x00, 0x00, 0x00, 0x04, // code_length
        0x1B, 0x1C, 0x60, 0xAC, // iload_1 iload_2 iadd ireturn
        0x00, 0x00, 0x00, 0x00, // exception table, attributes
    ];
    bytes.extend_from_slice(&[0x00, 0x07]);
    bytes.extend_from_slice(&(code.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&code);

    bytes.extend_from_slice(&[0x00, 0x01]); // class attributes
    bytes.extend_from_slice(&[0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x00, 0x09]);
    bytes
}

#[test]
fn test_decode_hand_assembled_class() {
    let class = ClassFile::decode(&hand_assembled_class()).expect("Failed to decode");

    assert_eq!(class.major_version, 52);
    assert_eq!(class.this_name(), Some("Calc"));
    assert_eq!(class.super_name(), Some("java/lang/Object"));
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name(&class.constant_pool), Some("add"));
    assert!(verify_class(&class).is_ok());
}

#[test]
fn test_untouched_class_reencodes_identically() {
    let bytes = hand_assembled_class();
    let class = ClassFile::decode(&bytes).unwrap();
    assert_eq!(class.encode(), bytes);
}

#[test]
fn test_annotate_rename_and_reload() {
    let mut class = ClassFile::decode(&hand_assembled_class()).unwrap();

    let pool = &mut class.constant_pool;
    let type_index = pool.add_utf8("Lorg/openjdk/jmh/annotations/Benchmark;").unwrap();
    let tag_type = pool.add_utf8("Lcom/acme/Tag;").unwrap();
    let tag_name = pool.add_utf8("tag").unwrap();
    let tag_value = pool.add_utf8("abc").unwrap();

    let method = &mut class.methods[0];
    method.access_flags = access::make_public(method.access_flags);
    let annotations =
        annotations_mut_or_insert(&mut method.attributes, Visibility::Visible, &mut class.constant_pool)
            .unwrap();
    annotations.add(Annotation {
        type_index,
        elements: Vec::new(),
    });
    annotations.add(Annotation {
        type_index: tag_type,
        elements: vec![ElementValuePair {
            name_index: tag_name,
            value: ElementValue::Const {
                tag: b's',
                const_value_index: tag_value,
            },
        }],
    });

    class.rename_class("CalcBench").unwrap();
    assert!(verify_class(&class).is_ok());

    let reloaded = ClassFile::decode(&class.encode()).unwrap();
    assert_eq!(reloaded.this_name(), Some("CalcBench"));

    let method = &reloaded.methods[0];
    // Code attribute comes first and is untouched
    assert!(matches!(
        &method.attributes[0],
        Attribute { body: AttributeBody::Raw(code), .. } if code.len() == 16
    ));
    let annotations = method.annotations(Visibility::Visible).unwrap();
    assert!(annotations
        .find("Lorg/openjdk/jmh/annotations/Benchmark;", &reloaded.constant_pool)
        .is_some());
    let tag = annotations.find("Lcom/acme/Tag;", &reloaded.constant_pool).unwrap();
    assert_eq!(
        tag.element("tag", &reloaded.constant_pool)
            .and_then(|v| v.as_str(&reloaded.constant_pool)),
        Some("abc")
    );
}

#[test]
fn test_truncated_input_fails() {
    let bytes = hand_assembled_class();
    for cut in [3, 10, 40, bytes.len() - 1] {
        assert!(ClassFile::decode(&bytes[..cut]).is_err(), "cut at {}", cut);
    }
}
