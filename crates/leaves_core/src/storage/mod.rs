use crate::error::AppError;
use std::cell::RefCell;
use std::collections::HashMap;

pub mod json_store;

pub use json_store::JsonFileStore;

/// Durable key-value slot. Values are whole documents: every write replaces
/// the previous value for that key.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, AppError>;

    fn write(&self, key: &str, value: &str) -> Result<(), AppError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).write(key, value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
