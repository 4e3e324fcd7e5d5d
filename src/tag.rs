use crate::result::{Error, Result};

// every tag byte is TAG_BASE + offset for offset in 0..=14
pub const TAG_BASE: u8 = 0x70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Null,
    Reference,
    ClassDesc,
    Object,
    String,
    Array,
    Class,
    BlockData,
    EndBlockData,
    Reset,
    BlockDataLong,
    Exception,
    LongString,
    ProxyClassDesc,
    Enum,
}

impl Tag {
    pub const ALL: [Tag; 15] = [
        Tag::Null,
        Tag::Reference,
        Tag::ClassDesc,
        Tag::Object,
        Tag::String,
        Tag::Array,
        Tag::Class,
        Tag::BlockData,
        Tag::EndBlockData,
        Tag::Reset,
        Tag::BlockDataLong,
        Tag::Exception,
        Tag::LongString,
        Tag::ProxyClassDesc,
        Tag::Enum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "Null",
            Tag::Reference => "Reference",
            Tag::ClassDesc => "ClassDesc",
            Tag::Object => "Object",
            Tag::String => "String",
            Tag::Array => "Array",
            Tag::Class => "Class",
            Tag::BlockData => "BlockData",
            Tag::EndBlockData => "EndBlockData",
            Tag::Reset => "Reset",
            Tag::BlockDataLong => "BlockDataLong",
            Tag::Exception => "Exception",
            Tag::LongString => "LongString",
            Tag::ProxyClassDesc => "ProxyClassDesc",
            Tag::Enum => "Enum",
        }
    }

    pub fn from_byte(byte: u8, offset: usize) -> Result<Self> {
        let index = byte
            .checked_sub(TAG_BASE)
            .filter(|&i| (i as usize) < Self::ALL.len())
            .ok_or(Error::UnknownTag { tag: byte, offset })?;
        Ok(Self::ALL[index as usize])
    }
}

// classDesc position: only these four tags are legal there
pub const CLASS_DESC_CONTEXT: &[Tag] = &[Tag::ClassDesc, Tag::ProxyClassDesc, Tag::Null, Tag::Reference];

pub fn check_allowed(tag: Tag, allowed: Option<&[Tag]>, offset: usize) -> Result<()> {
    match allowed {
        Some(list) if !list.contains(&tag) => Err(Error::TagNotAllowed {
            tag: tag.name(),
            offset,
        }),
        _ => Ok(()),
    }
}
