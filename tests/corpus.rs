use std::rc::Rc;

use assert_matches::assert_matches;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use jserial::{parse, ClassDescriptorData, FieldMap, Primitive, Registry, Result, Value};

fn decode(b64: &str, registry: &Registry) -> Result<Vec<Value>> {
    let bytes = STANDARD.decode(b64).expect("fixture is valid base64");
    parse(&bytes, registry)
}

fn as_string(value: &Value) -> &str {
    match value {
        Value::String(s) => s,
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn decodes_a_run_of_top_level_strings() {
    let registry = Registry::new();
    let values = decode("rO0ABXQABUJlZ2ludAAIc29tZXRleHR0AANFbmQ=", &registry).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(as_string(&values[0]), "Begin");
    assert_eq!(as_string(&values[1]), "sometext");
    assert_eq!(as_string(&values[2]), "End");
}

#[test]
fn decodes_an_object_with_every_primitive_field_type() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2luc3IAClByaW1pdGl2ZXMAABI0VniavAIACEkAAWlTAAFzSgABbEIAAmJ5RAABZEYAAWZaAAJib0MAAWN4cP///4X+OP////////zr60AorhR64UeuQpkAAAESNHQAA0VuZA==";
    let values = decode(b64, &registry).unwrap();
    assert_eq!(values.len(), 3);

    let object = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let object = object.borrow();
    assert_eq!(object.class.borrow().name, "Primitives");
    assert_eq!(object.class.borrow().serial_version_uid, "0000123456789abc");

    assert_eq!(object.fields.get("i"), Some(&Value::Primitive(Primitive::Int(-123))));
    assert_eq!(object.fields.get("s"), Some(&Value::Primitive(Primitive::Short(-456))));
    assert_eq!(object.fields.get("l"), Some(&Value::Primitive(Primitive::Long(-789))));
    assert_eq!(object.fields.get("by"), Some(&Value::Primitive(Primitive::Byte(-21))));
    assert_eq!(object.fields.get("d"), Some(&Value::Primitive(Primitive::Double(12.34))));
    assert_eq!(object.fields.get("f"), Some(&Value::Primitive(Primitive::Float(76.5))));
    assert_eq!(object.fields.get("bo"), Some(&Value::Primitive(Primitive::Boolean(true))));
    assert_eq!(object.fields.get("c"), Some(&Value::Primitive(Primitive::Char(0x1234))));
}

#[test]
fn a_reference_resolves_to_the_same_object_identity() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2luc3IABUVtcHR5AAAAAAAAAAACAAB4cHEAfgACdAADRW5k";
    let values = decode(b64, &registry).unwrap();
    assert_eq!(values.len(), 4);

    let original = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let reference = match &values[2] {
        Value::Object(obj) => obj,
        other => panic!("expected the back reference to resolve to an object, got {other:?}"),
    };
    assert!(Rc::ptr_eq(original, reference), "back reference must share identity with the original object");
    assert_eq!(as_string(&values[3]), "End");
}

#[test]
fn a_subclass_field_shadows_its_superclasss_same_named_field() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2luc3IAB0Rlcml2ZWQAAAAAAAAAAgIAAUkAA2Zvb3hyAARCYXNlAAAAAAAAAAECAAFJAANmb294cAAAAHsAAAFZdAADRW5k";
    let values = decode(b64, &registry).unwrap();

    let object = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let object = object.borrow();

    // the flattened view takes the most-derived class's value
    assert_eq!(object.fields.get("foo"), Some(&Value::Primitive(Primitive::Int(345))));

    // but each ancestor's own contribution is still recoverable
    assert_eq!(object.extends_get("Base"), Some(&Value::Fields(
        [("foo".to_string(), Value::Primitive(Primitive::Int(123)))].into_iter().collect()
    )));
    assert_eq!(object.extends_get("Derived"), Some(&Value::Fields(
        [("foo".to_string(), Value::Primitive(Primitive::Int(345)))].into_iter().collect()
    )));
}

#[test]
fn a_registered_parser_consumes_custom_class_data_before_the_annotation_block() {
    let mut registry = Registry::new();
    registry
        .register_parser(
            "CustomFormatted",
            "00000000cafeb0ba",
            Box::new(|decoder, _class| {
                let foo = decoder.read_i32()?;
                let bar = decoder.read_short_utf()?;
                Ok([
                    ("foo".to_string(), Value::Primitive(Primitive::Int(foo))),
                    ("bar".to_string(), Value::String(bar.into())),
                ]
                .into_iter()
                .collect())
            }),
        )
        .unwrap();

    let b64 = "rO0ABXQABUJlZ2luc3IAD0N1c3RvbUZvcm1hdHRlZAAAAADK/rC6AwAAeHAAADA5AA1IZWxsbywgV29ybGQhdwMBAgN0AAhhbmQgbW9yZXh0AANFbmQ=";
    let values = decode(b64, &registry).unwrap();

    let object = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let object = object.borrow();
    assert_eq!(object.fields.get("foo"), Some(&Value::Primitive(Primitive::Int(12345))));
    assert_eq!(object.fields.get("bar"), Some(&Value::String("Hello, World!".into())));

    let annotations = match object.fields.get("@") {
        Some(Value::List(items)) => items,
        other => panic!("expected the annotation block under \"@\", got {other:?}"),
    };
    assert_eq!(annotations.len(), 2);
    assert_matches!(&annotations[0], Value::BlockData(b) if b.bytes == [0x01, 0x02, 0x03]);
    assert_eq!(as_string(&annotations[1]), "and more");
}

#[test]
fn a_post_processor_can_replace_a_classs_decoded_shape_entirely() {
    let mut registry = Registry::new();
    registry
        .register_post_processor(
            "CustomFormatted",
            "00000000cafeb0ba",
            Box::new(|_class, fields, _annotations| {
                Ok(Value::List(vec![fields.get("foo").cloned().unwrap_or(Value::Null)]))
            }),
        )
        .unwrap();
    registry
        .register_parser(
            "CustomFormatted",
            "00000000cafeb0ba",
            Box::new(|decoder, _class| {
                let foo = decoder.read_i32()?;
                let _bar = decoder.read_short_utf()?;
                Ok(FieldMap::from_iter([("foo".to_string(), Value::Primitive(Primitive::Int(foo)))]))
            }),
        )
        .unwrap();

    let b64 = "rO0ABXQABUJlZ2luc3IAD0N1c3RvbUZvcm1hdHRlZAAAAADK/rC6AwAAeHAAADA5AA1IZWxsbywgV29ybGQhdwMBAgN0AAhhbmQgbW9yZXh0AANFbmQ=";
    let values = decode(b64, &registry).unwrap();

    let object = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let object = object.borrow();
    match object.extends_get("CustomFormatted") {
        Some(Value::List(items)) => assert_eq!(items, &[Value::Primitive(Primitive::Int(12345))]),
        other => panic!("expected the post-processor's List shape, got {other:?}"),
    }
    // the post-processed value isn't field-shaped, so nothing from it flattens onto the object
    assert!(object.fields.get("foo").is_none());
}

#[test]
fn an_enum_constant_decodes_to_its_class_and_name_and_matches_a_string_by_name() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2lufnIABFN1aXQAAAAAAAAAAxAAAHhyAA5qYXZhLmxhbmcuRW51bQAAAAAAAAAAAAAAeHB0AAZTUEFERVNxAH4AA3QAA0VuZA==";
    let values = decode(b64, &registry).unwrap();
    assert_eq!(values.len(), 4);

    let first = match &values[1] {
        Value::Enum(e) => e,
        other => panic!("expected an enum constant, got {other:?}"),
    };
    assert_eq!(first.borrow().name, "SPADES");
    assert_eq!(first.borrow().class.borrow().name, "Suit");

    let reference = &values[2];
    assert!(Rc::ptr_eq(
        match reference {
            Value::Enum(e) => e,
            other => panic!("expected the back reference to resolve to the enum constant, got {other:?}"),
        },
        first
    ));

    // loose equality: an enum constant compares equal to a string of the same name
    assert_eq!(&values[1], &Value::String(Rc::from("SPADES")));
}

#[test]
fn decodes_a_primitive_int_array() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2ludXIAAltJAAAAAAAAAAQCAAB4cAAAAAMAAAAMAAAAIgAAADh0AANFbmQ=";
    let values = decode(b64, &registry).unwrap();

    let array = match &values[1] {
        Value::Array(arr) => arr,
        other => panic!("expected an array, got {other:?}"),
    };
    let array = array.borrow();
    assert_eq!(array.class.borrow().name, "[I");
    assert_eq!(
        array.elements,
        vec![
            Value::Primitive(Primitive::Int(12)),
            Value::Primitive(Primitive::Int(34)),
            Value::Primitive(Primitive::Int(56)),
        ]
    );
}

#[test]
fn decodes_a_long_utf_string() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2lufAAAAAAAAAAoeHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHh4eHQAA0VuZA==";
    let values = decode(b64, &registry).unwrap();
    assert_eq!(as_string(&values[1]), "x".repeat(40));
}

#[test]
fn rejects_a_stream_with_the_wrong_magic() {
    let registry = Registry::new();
    let err = decode("3q0ABXQAAXg=", &registry).unwrap_err();
    assert_matches!(err, jserial::Error::MagicMismatch { found } if found == 0xDEAD);
}

#[test]
fn rejects_a_stream_with_an_unsupported_version() {
    let registry = Registry::new();
    let err = decode("rO0ABnQAAXg=", &registry).unwrap_err();
    assert_matches!(err, jserial::Error::VersionMismatch { found } if found == 6);
}

#[test]
fn rejects_a_truncated_string_payload() {
    let registry = Registry::new();
    let err = decode("rO0ABXQABWFi", &registry).unwrap_err();
    assert_matches!(err, jserial::Error::PrematureEnd { .. });
}

#[test]
fn ancestor_chain_runs_from_root_to_declared_class() {
    let registry = Registry::new();
    let b64 = "rO0ABXQABUJlZ2luc3IAB0Rlcml2ZWQAAAAAAAAAAgIAAUkAA2Zvb3hyAARCYXNlAAAAAAAAAAECAAFJAANmb294cAAAAHsAAAFZdAADRW5k";
    let values = decode(b64, &registry).unwrap();
    let object = match &values[1] {
        Value::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    };
    let chain = ClassDescriptorData::ancestor_chain(&object.borrow().class);
    let names: Vec<_> = chain.iter().map(|c| c.borrow().name.clone()).collect();
    assert_eq!(names, vec!["Base", "Derived"]);
}
