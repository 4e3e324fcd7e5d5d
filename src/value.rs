use std::cell::RefCell;
use std::rc::Rc;

use crate::class_desc::ClassDescriptorData;

pub type ClassDescRef = Rc<RefCell<ClassDescriptorData>>;
pub type ObjectRef = Rc<RefCell<ObjectData>>;
pub type ArrayRef = Rc<RefCell<ArrayData>>;
pub type EnumRef = Rc<RefCell<EnumData>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Byte(i8),
    // a UTF-16 code unit, not char: a lone Java char may be half a surrogate pair
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
}

// opaque byte run from a BlockData/BlockDataLong tag; offset lets a caller
// inspecting the decoded graph tell where in the stream it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(String, Value)>);

impl FieldMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    // overwrites an existing entry in place rather than appending, so a
    // deeper class's field shadows a shallower ancestor's same-named field
    // without disturbing the flattened view's order
    pub fn insert(&mut self, name: String, value: Value) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[derive(Debug)]
pub struct ObjectData {
    pub class: ClassDescRef,
    // per-ancestor contribution, root class first, declared class last
    pub extends: Vec<(String, Value)>,
    // flattened name -> value view; a deeper class overwrites a same-named
    // field from a shallower ancestor
    pub fields: FieldMap,
}

impl ObjectData {
    pub fn extends_get(&self, class_name: &str) -> Option<&Value> {
        self.extends.iter().find(|(k, _)| k == class_name).map(|(_, v)| v)
    }
}

#[derive(Debug)]
pub struct ArrayData {
    pub class: ClassDescRef,
    pub elements: Vec<Value>,
}

#[derive(Debug)]
pub struct EnumData {
    pub class: ClassDescRef,
    pub name: String,
}

// TC_ENDBLOCKDATA never appears as a top-level, field, or array-element
// value; it only ever terminates an annotation block's collection loop
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Primitive(Primitive),
    String(Rc<str>),
    BlockData(BlockData),
    ClassDesc(ClassDescRef),
    Object(ObjectRef),
    Array(ArrayRef),
    Enum(EnumRef),
    Fields(FieldMap),
    // post-processor output for list-like containers (ArrayList, ArrayDeque, HashSet)
    List(Vec<Value>),
    // post-processor output for map-like containers (HashMap, Hashtable, EnumMap)
    Pairs(Vec<(Value, Value)>),
    EndBlock,
}

impl Value {
    pub fn is_end_block(&self) -> bool {
        matches!(self, Value::EndBlock)
    }
}

// an Enum value equals a String (or another Enum) with the same name;
// every other pair of variants compares structurally
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        fn enum_name(e: &EnumRef) -> String {
            e.borrow().name.clone()
        }
        match (self, other) {
            (Value::Enum(a), Value::Enum(b)) => enum_name(a) == enum_name(b),
            (Value::Enum(a), Value::String(b)) | (Value::String(b), Value::Enum(a)) => {
                enum_name(a) == **b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) | (Value::EndBlock, Value::EndBlock) => true,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::BlockData(a), Value::BlockData(b)) => a == b,
            (Value::Fields(a), Value::Fields(b)) => a == b,
            _ => false,
        }
    }
}
