use std::cell::RefCell;
use std::rc::Rc;

use crate::class_desc::{self, ClassDescFlags, ClassDescriptorData, FieldDescriptor, SerializationMode};
use crate::cursor::ByteCursor;
use crate::handle::{Handle, HandleTable};
use crate::registry::Registry;
use crate::result::{Error, Result};
use crate::tag::{self, Tag, CLASS_DESC_CONTEXT};
use crate::value::{self, ArrayData, BlockData, EnumData, FieldMap, ObjectData, Primitive, Value};

const STREAM_MAGIC: u16 = 0xACED;
const STREAM_VERSION: u16 = 5;

// a field's element class name and an enum constant's name both go
// through this: a string, or a back reference to one
const STRING_CONTEXT: &[Tag] = &[Tag::String, Tag::LongString, Tag::Reference];

pub struct Decoder<'a, 'r> {
    cursor: ByteCursor<'a>,
    handles: HandleTable,
    registry: &'r Registry,
}

impl<'a, 'r> Decoder<'a, 'r> {
    pub fn new(bytes: &'a [u8], registry: &'r Registry) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
            handles: HandleTable::new(),
            registry,
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.position()
    }

    // raw stream access for custom class-data parsers that need to consume
    // primitive or block-data content a registered class writes directly

    pub fn read_primitive(&mut self, type_code: char) -> Result<Primitive> {
        let offset = self.offset();
        Ok(match type_code {
            'B' => Primitive::Byte(self.cursor.read_i8()?),
            'C' => Primitive::Char(self.cursor.read_u16()?),
            'D' => Primitive::Double(self.cursor.read_f64()?),
            'F' => Primitive::Float(self.cursor.read_f32()?),
            'I' => Primitive::Int(self.cursor.read_i32()?),
            'J' => Primitive::Long(self.cursor.read_i64()?),
            'S' => Primitive::Short(self.cursor.read_i16()?),
            'Z' => Primitive::Boolean(self.cursor.read_bool()?),
            code => return Err(Error::UnknownTypeCode { code, offset }),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.cursor.read_i32()?)
    }

    pub fn read_short_utf(&mut self) -> Result<String> {
        self.cursor.read_short_utf()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.cursor.read_bytes(len)
    }

    pub fn parse(bytes: &'a [u8], registry: &'r Registry) -> Result<Vec<Value>> {
        let mut decoder = Self::new(bytes, registry);
        let magic = decoder.cursor.read_u16()?;
        if magic != STREAM_MAGIC {
            return Err(Error::MagicMismatch { found: magic });
        }
        let version = decoder.cursor.read_u16()?;
        if version != STREAM_VERSION {
            return Err(Error::VersionMismatch { found: version });
        }
        let mut out = Vec::new();
        while !decoder.cursor.is_at_end() {
            out.push(decoder.content(None)?);
        }
        Ok(out)
    }

    pub fn content(&mut self, allowed: Option<&[Tag]>) -> Result<Value> {
        let offset = self.offset();
        let byte = self.cursor.read_u8()?;
        let tag = Tag::from_byte(byte, offset)?;
        tag::check_allowed(tag, allowed, offset)?;
        tracing::trace!(?tag, offset, "reading content item");
        match tag {
            Tag::Null => Ok(Value::Null),
            Tag::Reference => self.read_reference(),
            Tag::ClassDesc => Ok(Value::ClassDesc(self.read_class_desc()?)),
            Tag::Object => self.read_object(),
            Tag::String => self.read_string(false),
            Tag::LongString => self.read_string(true),
            Tag::Array => self.read_array(),
            Tag::Class => self.read_class(),
            Tag::BlockData => self.read_block_data(false),
            Tag::BlockDataLong => self.read_block_data(true),
            Tag::Enum => self.read_enum(),
            Tag::EndBlockData => Ok(Value::EndBlock),
            Tag::ProxyClassDesc => Err(Error::Unsupported("dynamic proxy class descriptors are not implemented")),
            Tag::Reset => Err(Error::Unsupported("stream reset is not implemented")),
            Tag::Exception => Err(Error::Unsupported("in-band stream exceptions are not implemented")),
        }
    }

    fn read_reference(&mut self) -> Result<Value> {
        let raw = self.cursor.read_u32()?;
        let value = self.handles.get(Handle(raw))?;
        Ok(value.clone())
    }

    fn read_string(&mut self, long: bool) -> Result<Value> {
        let text = if long { self.cursor.read_long_utf()? } else { self.cursor.read_short_utf()? };
        let rc: Rc<str> = Rc::from(text);
        let handle = self.handles.push(Value::String(Rc::clone(&rc)));
        tracing::debug!(handle = handle.0, len = rc.len(), "assigned handle to string");
        Ok(Value::String(rc))
    }

    fn read_block_data(&mut self, long: bool) -> Result<Value> {
        let offset = self.offset();
        let len = if long { self.cursor.read_i32()? as usize } else { self.cursor.read_u8()? as usize };
        let bytes = self.cursor.read_bytes(len)?.to_vec();
        Ok(Value::BlockData(BlockData { offset, bytes }))
    }

    // the classDesc grammar position: ClassDesc | ProxyClassDesc | Null |
    // Reference. Null reads as None.
    fn read_class_desc_context(&mut self) -> Result<Option<value::ClassDescRef>> {
        match self.content(Some(CLASS_DESC_CONTEXT))? {
            Value::Null => Ok(None),
            Value::ClassDesc(class) => Ok(Some(class)),
            other => Err(Error::ExpectedClassDescriptor {
                found: value_kind(&other),
            }),
        }
    }

    // the handle is assigned to a partially-built descriptor before its
    // fields, annotations, or superclass are read, so a class descriptor
    // whose own annotation block points back at itself still resolves
    fn read_class_desc(&mut self) -> Result<value::ClassDescRef> {
        let name = self.cursor.read_short_utf()?;
        let serial_version_uid = self.cursor.read_uid_hex()?;
        let class_ref = class_desc::new_ref(ClassDescriptorData {
            name: name.clone(),
            serial_version_uid,
            flags: ClassDescFlags::new(),
            is_enum: false,
            fields: Vec::new(),
            annotations: Vec::new(),
            superclass: None,
        });
        let handle = self.handles.push(Value::ClassDesc(Rc::clone(&class_ref)));
        tracing::debug!(handle = handle.0, class = %name, "assigned handle to class descriptor");

        let flags = ClassDescFlags::from_bytes([self.cursor.read_u8()?]);
        let field_count = self.cursor.read_u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(self.read_field_descriptor()?);
        }
        let mut annotations = Vec::new();
        loop {
            let item = self.content(None)?;
            if item.is_end_block() {
                break;
            }
            annotations.push(item);
        }
        let superclass = self.read_class_desc_context()?;

        {
            let mut data = class_ref.borrow_mut();
            data.flags = flags;
            data.is_enum = flags.is_enum();
            data.fields = fields;
            data.annotations = annotations;
            data.superclass = superclass;
        }
        Ok(class_ref)
    }

    fn read_field_descriptor(&mut self) -> Result<FieldDescriptor> {
        let offset = self.offset();
        let code = self.cursor.read_u8()? as char;
        let name = self.cursor.read_short_utf()?;
        let class_name = match code {
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => None,
            'L' | '[' => Some(match self.content(Some(STRING_CONTEXT))? {
                Value::String(s) => s,
                other => {
                    return Err(Error::ExpectedClassDescriptor {
                        found: value_kind(&other),
                    })
                }
            }),
            _ => return Err(Error::UnknownTypeCode { code, offset }),
        };
        Ok(FieldDescriptor { type_code: code, name, class_name })
    }

    fn read_class(&mut self) -> Result<Value> {
        let class = self.read_class_desc_context()?.ok_or(Error::ExpectedClassDescriptor { found: "Null" })?;
        self.handles.push(Value::ClassDesc(Rc::clone(&class)));
        Ok(Value::ClassDesc(class))
    }

    fn read_array(&mut self) -> Result<Value> {
        let class = self.read_class_desc_context()?.ok_or(Error::ExpectedClassDescriptor { found: "Null" })?;
        let element_code = {
            let name = class.borrow().name.clone();
            name.as_bytes().get(1).copied().map(char::from).unwrap_or('L')
        };
        let array_ref = Rc::new(RefCell::new(ArrayData { class: Rc::clone(&class), elements: Vec::new() }));
        self.handles.push(Value::Array(Rc::clone(&array_ref)));

        let len = self.cursor.read_i32()?;
        let mut elements = Vec::with_capacity(len.max(0) as usize);
        for _ in 0..len {
            let element = if "BCDFIJSZ".contains(element_code) {
                Value::Primitive(self.read_primitive(element_code)?)
            } else {
                self.content(None)?
            };
            elements.push(element);
        }
        array_ref.borrow_mut().elements = elements;
        Ok(Value::Array(array_ref))
    }

    fn read_enum(&mut self) -> Result<Value> {
        let class = self.read_class_desc_context()?.ok_or(Error::ExpectedClassDescriptor { found: "Null" })?;
        let handle = self.handles.reserve();
        let name = match self.content(Some(STRING_CONTEXT))? {
            Value::String(s) => s.to_string(),
            other => {
                return Err(Error::ExpectedClassDescriptor {
                    found: value_kind(&other),
                })
            }
        };
        let enum_ref = Rc::new(RefCell::new(EnumData { class, name }));
        self.handles.fill(handle, Value::Enum(Rc::clone(&enum_ref)));
        Ok(Value::Enum(enum_ref))
    }

    fn read_object(&mut self) -> Result<Value> {
        let class = self.read_class_desc_context()?.ok_or(Error::ExpectedClassDescriptor { found: "Null" })?;
        let object_ref = Rc::new(RefCell::new(ObjectData {
            class: Rc::clone(&class),
            extends: Vec::new(),
            fields: FieldMap::new(),
        }));
        let handle = self.handles.push(Value::Object(Rc::clone(&object_ref)));
        let class_name = class.borrow().name.clone();
        tracing::debug!(handle = handle.0, class = %class_name, "assigned handle to object");

        for ancestor in ClassDescriptorData::ancestor_chain(&class) {
            let (name, serial_version_uid, flags, fields) = {
                let data = ancestor.borrow();
                (data.name.clone(), data.serial_version_uid.clone(), data.flags, data.fields.clone())
            };
            let mode = flags.mode(&name)?;
            let per_class_value = self.read_class_data(&ancestor, &name, &serial_version_uid, mode, &fields)?;

            let mut object = object_ref.borrow_mut();
            if let Value::Fields(fm) = &per_class_value {
                for (key, value) in fm.iter() {
                    object.fields.insert(key.to_string(), value.clone());
                }
            }
            object.extends.push((name, per_class_value));
        }
        Ok(Value::Object(object_ref))
    }

    fn read_class_data(
        &mut self,
        class: &value::ClassDescRef,
        name: &str,
        serial_version_uid: &str,
        mode: SerializationMode,
        fields: &[FieldDescriptor],
    ) -> Result<Value> {
        match mode {
            SerializationMode::DefaultFields => Ok(Value::Fields(self.read_default_fields(fields)?)),
            SerializationMode::ExternalizableBlockData => {
                let annotations = self.read_annotation_block()?;
                let mut fm = FieldMap::new();
                fm.insert("@".to_string(), Value::List(annotations));
                Ok(Value::Fields(fm))
            }
            SerializationMode::CustomWithAnnotations => {
                // `self.registry` is a bare reference: copying it out borrows
                // the registry for `'r`, not `self`, so the parser closure
                // below is free to take `&mut self`.
                let registry = self.registry;
                let mut field_map = match registry.parser_for(name, serial_version_uid) {
                    Some(parser) => {
                        let class_data = class.borrow();
                        parser(self, &class_data)?
                    }
                    None => {
                        tracing::debug!(class = name, uid = serial_version_uid, "no registered parser, falling back to default fields");
                        self.read_default_fields(fields)?
                    }
                };
                let annotations = self.read_annotation_block()?;
                field_map.insert("@".to_string(), Value::List(annotations.clone()));

                match registry.post_processor_for(name, serial_version_uid) {
                    Some(post_processor) => {
                        let class_data = class.borrow();
                        post_processor(&class_data, field_map, &annotations)
                    }
                    None => Ok(Value::Fields(field_map)),
                }
            }
        }
    }

    fn read_default_fields(&mut self, fields: &[FieldDescriptor]) -> Result<FieldMap> {
        let mut map = FieldMap::new();
        for field in fields {
            let value = if field.is_reference_type() {
                self.content(None)?
            } else {
                Value::Primitive(self.read_primitive(field.type_code)?)
            };
            map.insert(field.name.clone(), value);
        }
        Ok(map)
    }

    fn read_annotation_block(&mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            let item = self.content(None)?;
            if item.is_end_block() {
                break;
            }
            items.push(item);
        }
        Ok(items)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Primitive(_) => "Primitive",
        Value::String(_) => "String",
        Value::BlockData(_) => "BlockData",
        Value::ClassDesc(_) => "ClassDesc",
        Value::Object(_) => "Object",
        Value::Array(_) => "Array",
        Value::Enum(_) => "Enum",
        Value::Fields(_) => "Fields",
        Value::List(_) => "List",
        Value::Pairs(_) => "Pairs",
        Value::EndBlock => "EndBlock",
    }
}
