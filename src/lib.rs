mod class_desc;
mod cursor;
mod decoder;
mod handle;
mod registry;
mod result;
mod tag;
mod utils;
mod value;

pub use class_desc::{ClassDescFlags, ClassDescriptorData, FieldDescriptor, SerializationMode};
pub use decoder::Decoder;
pub use handle::{Handle, BASE_HANDLE};
pub use registry::{ClassDataParser, PostProcessor, Registry};
pub use result::{Error, Result};
pub use tag::Tag;
pub use value::{
    ArrayData, ArrayRef, BlockData, ClassDescRef, EnumData, EnumRef, FieldMap, ObjectData, ObjectRef, Primitive,
    Value,
};

pub fn parse(bytes: &[u8], registry: &Registry) -> Result<Vec<Value>> {
    Decoder::parse(bytes, registry)
}
