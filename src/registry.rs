use std::collections::HashMap;

use crate::class_desc::ClassDescriptorData;
use crate::decoder::Decoder;
use crate::result::{Error, Result};
use crate::value::{FieldMap, Value};

// reads a custom-write class's data directly off the stream, in place of
// default field decoding, under serialization mode 0x03
pub type ClassDataParser = Box<dyn Fn(&mut Decoder, &ClassDescriptorData) -> Result<FieldMap>>;

// reshapes a class's parsed data plus its trailing annotation block into a
// final value; used to synthesize native views of container classes
pub type PostProcessor = Box<dyn Fn(&ClassDescriptorData, FieldMap, &[Value]) -> Result<Value>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClassKey {
    class_name: String,
    serial_version_uid: String,
}

impl ClassKey {
    fn new(class_name: &str, serial_version_uid: &str) -> Result<Self> {
        if serial_version_uid.len() != 16 || !serial_version_uid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidUidFormat(serial_version_uid.to_string()));
        }
        Ok(Self {
            class_name: class_name.to_string(),
            serial_version_uid: serial_version_uid.to_string(),
        })
    }
}

// keyed by (className, serialVersionUID). Registration is expected to
// happen before any parse begins; a Registry built once and shared (e.g.
// behind an Rc or Arc) across many Decoder::new calls serves as a frozen
// snapshot for concurrent parsing.
#[derive(Default)]
pub struct Registry {
    parsers: HashMap<ClassKey, ClassDataParser>,
    post_processors: HashMap<ClassKey, PostProcessor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_parser(
        &mut self,
        class_name: &str,
        serial_version_uid: &str,
        parser: ClassDataParser,
    ) -> Result<()> {
        let key = ClassKey::new(class_name, serial_version_uid)?;
        self.parsers.insert(key, parser);
        Ok(())
    }

    pub fn register_post_processor(
        &mut self,
        class_name: &str,
        serial_version_uid: &str,
        post_processor: PostProcessor,
    ) -> Result<()> {
        let key = ClassKey::new(class_name, serial_version_uid)?;
        self.post_processors.insert(key, post_processor);
        Ok(())
    }

    // back-compat alias for register_post_processor
    pub fn register(
        &mut self,
        class_name: &str,
        serial_version_uid: &str,
        post_processor: PostProcessor,
    ) -> Result<()> {
        self.register_post_processor(class_name, serial_version_uid, post_processor)
    }

    pub(crate) fn parser_for(&self, class_name: &str, serial_version_uid: &str) -> Option<&ClassDataParser> {
        let key = ClassKey::new(class_name, serial_version_uid).ok()?;
        self.parsers.get(&key)
    }

    pub(crate) fn post_processor_for(
        &self,
        class_name: &str,
        serial_version_uid: &str,
    ) -> Option<&PostProcessor> {
        let key = ClassKey::new(class_name, serial_version_uid).ok()?;
        self.post_processors.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_rejects_malformed_uid() {
        let mut registry = Registry::new();
        let err = registry
            .register_post_processor("Foo", "not-16-hex-digits", Box::new(|_, _, annotations| {
                Ok(Value::List(annotations.to_vec()))
            }))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUidFormat(_)));
    }

    #[test]
    fn register_is_an_alias_for_register_post_processor() {
        let mut registry = Registry::new();
        registry
            .register("Foo", "0000000000000000", Box::new(|_, _, _| Ok(Value::Null)))
            .unwrap();
        assert!(registry.post_processor_for("Foo", "0000000000000000").is_some());
    }
}
