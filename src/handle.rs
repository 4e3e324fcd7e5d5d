use crate::result::{Error, Result};
use crate::value::Value;

// first referenceable handle in any stream (baseWireHandle in the JDK's own source)
pub const BASE_HANDLE: u32 = 0x007E_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u32);

// dense, append-only table from handle to decoded value, in stream order.
// enum constants reserve their slot before their name is read so a back
// reference seen during that read still resolves; every other kind
// allocates and fills its slot in one step via push.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<Option<Value>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn index_of(handle: Handle) -> usize {
        (handle.0 - BASE_HANDLE) as usize
    }

    fn handle_of(index: usize) -> Handle {
        Handle(BASE_HANDLE + index as u32)
    }

    pub fn reserve(&mut self) -> Handle {
        let handle = Self::handle_of(self.slots.len());
        self.slots.push(None);
        handle
    }

    pub fn fill(&mut self, handle: Handle, value: Value) {
        let idx = Self::index_of(handle);
        debug_assert!(self.slots[idx].is_none(), "handle filled twice");
        self.slots[idx] = Some(value);
    }

    pub fn push(&mut self, value: Value) -> Handle {
        let handle = Self::handle_of(self.slots.len());
        self.slots.push(Some(value));
        handle
    }

    pub fn get(&self, handle: Handle) -> Result<&Value> {
        let idx = Self::index_of(handle);
        match self.slots.get(idx) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::HandleNotReady { handle: handle.0 }),
            None => Err(Error::UnknownHandle { handle: handle.0 }),
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut Value> {
        let idx = Self::index_of(handle);
        match self.slots.get_mut(idx) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::HandleNotReady { handle: handle.0 }),
            None => Err(Error::UnknownHandle { handle: handle.0 }),
        }
    }
}
