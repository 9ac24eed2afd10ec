//! Name tables
//!
//! A [`Names`] table maps `(namespace, local name)` to a value (a trait, or
//! a global definition). Exact lookups never fail. Unqualified and
//! namespace-set lookups must resolve to at most one entry: every `public`
//! namespace in the table is searched together, since several packages
//! contribute to the public view at once, and two hits are an
//! [`RuntimeError::AmbiguousReference`].

use crate::error::{RtResult, RuntimeError};
use crate::ns::{Ns, QName};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Namespace qualifier of a property reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Qualifier {
    /// No qualifier: every public namespace is open
    #[default]
    Unqualified,
    /// Exactly one namespace
    Ns(Ns),
    /// An ordered set of open namespaces
    NsSet(Vec<Ns>),
}

impl Qualifier {
    /// Whether the reference can reach public (and therefore dynamic)
    /// properties
    pub fn admits_public(&self) -> bool {
        match self {
            Qualifier::Unqualified => true,
            Qualifier::Ns(ns) => ns.is_public(),
            Qualifier::NsSet(set) => set.iter().any(Ns::is_public),
        }
    }
}

impl From<Ns> for Qualifier {
    fn from(ns: Ns) -> Self {
        Qualifier::Ns(ns)
    }
}

impl From<Vec<Ns>> for Qualifier {
    fn from(set: Vec<Ns>) -> Self {
        Qualifier::NsSet(set)
    }
}

/// Mapping from `(namespace, local name)` to `T`
#[derive(Debug, Clone)]
pub struct Names<T> {
    dict: FxHashMap<Ns, FxHashMap<Rc<str>, T>>,
}

impl<T> Default for Names<T> {
    fn default() -> Self {
        Self {
            dict: FxHashMap::default(),
        }
    }
}

impl<T> Names<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry
    pub fn set(&mut self, ns: &Ns, name: impl Into<Rc<str>>, value: T) {
        self.dict
            .entry(ns.clone())
            .or_default()
            .insert(name.into(), value);
    }

    /// Exact lookup
    pub fn get_ns_name(&self, ns: &Ns, name: &str) -> Option<&T> {
        self.dict.get(ns).and_then(|names| names.get(name))
    }

    /// Lookup across every public namespace in the table
    pub fn get_public_name(&self, name: &str) -> RtResult<Option<&T>> {
        let mut found = Hit::default();
        self.scan_public(name, &mut found)?;
        Ok(found.value)
    }

    /// Lookup across an ordered namespace set
    pub fn get_nsset_name(&self, nsset: &[Ns], name: &str) -> RtResult<Option<&T>> {
        let mut found = Hit::default();
        let mut public_scanned = false;
        for ns in nsset {
            if ns.is_public() {
                if !public_scanned {
                    public_scanned = true;
                    self.scan_public(name, &mut found)?;
                }
            } else if let Some(value) = self.get_ns_name(ns, name) {
                found.record(ns, value, name)?;
            }
        }
        Ok(found.value)
    }

    /// Lookup under any qualifier
    pub fn get(&self, qualifier: &Qualifier, name: &str) -> RtResult<Option<&T>> {
        match qualifier {
            Qualifier::Unqualified => self.get_public_name(name),
            Qualifier::Ns(ns) => Ok(self.get_ns_name(ns, name)),
            Qualifier::NsSet(set) => self.get_nsset_name(set, name),
        }
    }

    /// Exact existence test
    pub fn has_ns_name(&self, ns: &Ns, name: &str) -> bool {
        self.get_ns_name(ns, name).is_some()
    }

    /// Existence test across every public namespace
    pub fn has_public_name(&self, name: &str) -> RtResult<bool> {
        Ok(self.get_public_name(name)?.is_some())
    }

    /// Existence test across a namespace set
    pub fn has_nsset_name(&self, nsset: &[Ns], name: &str) -> RtResult<bool> {
        Ok(self.get_nsset_name(nsset, name)?.is_some())
    }

    /// Existence test under any qualifier
    pub fn has(&self, qualifier: &Qualifier, name: &str) -> RtResult<bool> {
        Ok(self.get(qualifier, name)?.is_some())
    }

    /// Every entry with its qualified name, in no particular order
    pub fn entries(&self) -> Vec<(QName, &T)> {
        self.dict
            .iter()
            .flat_map(|(ns, names)| {
                names
                    .iter()
                    .map(move |(name, value)| (QName::new(ns.clone(), name.clone()), value))
            })
            .collect()
    }

    /// Values in no particular order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.dict.values().flat_map(|names| names.values())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.dict.values().map(|names| names.len()).sum()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn scan_public<'a>(&'a self, name: &str, found: &mut Hit<'a, T>) -> RtResult<()> {
        for (ns, names) in &self.dict {
            if !ns.is_public() {
                continue;
            }
            if let Some(value) = names.get(name) {
                found.record(ns, value, name)?;
            }
        }
        Ok(())
    }
}

struct Hit<'a, T> {
    ns: Option<Ns>,
    value: Option<&'a T>,
}

impl<T> Default for Hit<'_, T> {
    fn default() -> Self {
        Self {
            ns: None,
            value: None,
        }
    }
}

impl<'a, T> Hit<'a, T> {
    /// Each `(ns, name)` holds one entry, so a second namespace means a
    /// second entry.
    fn record(&mut self, ns: &Ns, value: &'a T, name: &str) -> RtResult<()> {
        match &self.ns {
            Some(previous) if previous != ns => Err(RuntimeError::ambiguous(name)),
            Some(_) => Ok(()),
            None => {
                self.ns = Some(ns.clone());
                self.value = Some(value);
                Ok(())
            }
        }
    }
}
