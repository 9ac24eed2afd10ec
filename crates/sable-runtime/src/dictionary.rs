//! Dictionary backing store
//!
//! Keys use strict equality: primitives by value, references by identity.
//! A weak-keyed dictionary only accepts instances as keys and never keeps
//! them alive; entries whose key has been dropped are invisible and are
//! swept on the next insertion.

use crate::error::{RtResult, RuntimeError};
use crate::object::WeakObjectRef;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DictKey {
    Undefined,
    Null,
    Boolean(bool),
    Number(u64),
    String(Rc<str>),
    Identity(usize),
}

impl DictKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => DictKey::Undefined,
            Value::Null => DictKey::Null,
            Value::Boolean(b) => DictKey::Boolean(*b),
            Value::String(s) => DictKey::String(s.clone()),
            Value::Object(obj) => DictKey::Identity(obj.id()),
            Value::Class(c) => DictKey::Identity(Rc::as_ptr(c) as *const () as usize),
            Value::Interface(i) => DictKey::Identity(Rc::as_ptr(i) as *const () as usize),
            Value::Function(f) => DictKey::Identity(Rc::as_ptr(f) as *const () as usize),
            numeric => {
                let n = numeric.as_f64().unwrap_or(f64::NAN);
                // 0 and -0 are the same key
                let n = if n == 0.0 { 0.0 } else { n };
                DictKey::Number(n.to_bits())
            }
        }
    }
}

/// Identity-keyed map
#[derive(Debug, Default)]
pub struct Dictionary {
    weak_keys: bool,
    /// Strong entries keep their key value alive, so identities stay valid
    strong: FxHashMap<DictKey, (Value, Value)>,
    weak: FxHashMap<usize, (WeakObjectRef, Value)>,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new(weak_keys: bool) -> Self {
        Self {
            weak_keys,
            ..Self::default()
        }
    }

    /// Whether keys are held weakly
    pub fn weak_keys(&self) -> bool {
        self.weak_keys
    }

    /// Value stored under `key`
    pub fn get(&self, key: &Value) -> RtResult<Option<Value>> {
        if self.weak_keys {
            let id = weak_key_id(key)?;
            return Ok(self
                .weak
                .get(&id)
                .filter(|(k, _)| !k.is_dead())
                .map(|(_, v)| v.clone()));
        }
        Ok(self.strong.get(&DictKey::of(key)).map(|(_, v)| v.clone()))
    }

    /// Store `value` under `key`
    pub fn set(&mut self, key: &Value, value: Value) -> RtResult<()> {
        if self.weak_keys {
            let id = weak_key_id(key)?;
            let handle = match key {
                Value::Object(obj) => obj.downgrade(),
                _ => return Err(RuntimeError::InvalidWeakKey),
            };
            self.sweep();
            self.weak.insert(id, (handle, value));
            return Ok(());
        }
        self.strong.insert(DictKey::of(key), (key.clone(), value));
        Ok(())
    }

    /// Whether an entry exists for `key`
    pub fn has(&self, key: &Value) -> RtResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove the entry for `key`; true if one existed
    pub fn delete(&mut self, key: &Value) -> RtResult<bool> {
        if self.weak_keys {
            let id = weak_key_id(key)?;
            return Ok(self
                .weak
                .remove(&id)
                .is_some_and(|(k, _)| !k.is_dead()));
        }
        Ok(self.strong.remove(&DictKey::of(key)).is_some())
    }

    /// Live keys, in no particular order
    pub fn keys(&self) -> Vec<Value> {
        if self.weak_keys {
            return self
                .weak
                .values()
                .filter_map(|(k, _)| k.upgrade().map(Value::Object))
                .collect();
        }
        self.strong.values().map(|(k, _)| k.clone()).collect()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        if self.weak_keys {
            self.weak.values().filter(|(k, _)| !k.is_dead()).count()
        } else {
            self.strong.len()
        }
    }

    /// Whether there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose key is gone
    pub fn sweep(&mut self) {
        self.weak.retain(|_, (k, _)| !k.is_dead());
    }
}

fn weak_key_id(key: &Value) -> RtResult<usize> {
    match key {
        Value::Object(obj) => Ok(obj.id()),
        _ => Err(RuntimeError::InvalidWeakKey),
    }
}
