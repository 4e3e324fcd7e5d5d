use std::cell::RefCell;
use std::rc::Rc;

use modular_bitfield::prelude::*;

use crate::result::{Error, Result};
use crate::value::{ClassDescRef, Value};

// low nibble selects how the class's data is laid out in the stream
#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy)]
pub struct ClassDescFlags {
    pub write_method: bool, // SC_WRITE_METHOD (0x01): the class defines writeObject
    pub serializable: bool, // SC_SERIALIZABLE (0x02)
    pub externalizable: bool, // SC_EXTERNALIZABLE (0x04)
    pub block_data: bool, // SC_BLOCK_DATA (0x08): externalizable data uses block-data framing
    pub is_enum: bool, // SC_ENUM (0x10)
    #[skip]
    unused: B3,
}

// mode selected by flags & 0x0F; any other nibble pattern is fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationMode {
    DefaultFields,
    CustomWithAnnotations,
    ExternalizableBlockData,
}

impl ClassDescFlags {
    pub fn mode(self, class_name: &str) -> Result<SerializationMode> {
        match self.into_bytes()[0] & 0x0F {
            0x02 => Ok(SerializationMode::DefaultFields),
            0x03 => Ok(SerializationMode::CustomWithAnnotations),
            0x04 => Err(Error::Unsupported("can't parse version 1 external content")),
            0x0C => Ok(SerializationMode::ExternalizableBlockData),
            flags => Err(Error::UnknownFlags {
                flags,
                class_name: class_name.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    // B C D F I J S Z for primitives, L for object, [ for array
    pub type_code: char,
    pub name: String,
    // present only when type_code is L or [
    pub class_name: Option<Rc<str>>,
}

impl FieldDescriptor {
    pub fn is_reference_type(&self) -> bool {
        matches!(self.type_code, 'L' | '[')
    }
}

#[derive(Debug)]
pub struct ClassDescriptorData {
    pub name: String,
    pub serial_version_uid: String,
    pub flags: ClassDescFlags,
    pub is_enum: bool,
    pub fields: Vec<FieldDescriptor>,
    // trailing objects from the class descriptor's own annotation block;
    // distinct from the per-object annotation block under
    // SerializationMode::CustomWithAnnotations, which lives on the object
    pub annotations: Vec<Value>,
    pub superclass: Option<ClassDescRef>,
}

impl ClassDescriptorData {
    // root ancestor to this class, inclusive
    pub fn ancestor_chain(self_ref: &ClassDescRef) -> Vec<ClassDescRef> {
        let mut chain = Vec::new();
        let mut current = Some(Rc::clone(self_ref));
        while let Some(class) = current {
            let next = class.borrow().superclass.clone();
            chain.push(class);
            current = next;
        }
        chain.reverse();
        chain
    }
}

pub(crate) fn new_ref(data: ClassDescriptorData) -> ClassDescRef {
    Rc::new(RefCell::new(data))
}
