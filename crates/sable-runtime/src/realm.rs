//! Realm: the package registry and the global name table
//!
//! Every top-level class, interface and namespace alias is registered here.
//! The first class defined becomes the root class; every later class
//! without an explicit base extends it.

use crate::class::{Class, ClassOptions, ClassRef, Interface, InterfaceOptions, InterfaceRef};
use crate::error::RtResult;
use crate::names::{Names, Qualifier};
use crate::ns::{Ns, PackageRegistry, QName};
use crate::object::{Instance, ObjectRef};
use crate::traits::Member;
use crate::value::Value;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;

/// A top-level definition
#[derive(Debug, Clone)]
pub enum Definition {
    /// Class
    Class(ClassRef),
    /// Interface
    Interface(InterfaceRef),
    /// Namespace alias
    Namespace(Ns),
}

impl Definition {
    /// Class, if this definition is one
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Definition::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Interface, if this definition is one
    pub fn as_interface(&self) -> Option<&InterfaceRef> {
        match self {
            Definition::Interface(iface) => Some(iface),
            _ => None,
        }
    }

    /// Class and interface definitions as values; namespace aliases have
    /// no value without reflection
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Definition::Class(class) => Some(Value::Class(class.clone())),
            Definition::Interface(iface) => Some(Value::Interface(iface.clone())),
            Definition::Namespace(_) => None,
        }
    }
}

/// Packages plus global definitions
#[derive(Debug, Default)]
pub struct Realm {
    packages: PackageRegistry,
    globals: RefCell<Names<Definition>>,
    root: OnceCell<ClassRef>,
}

impl Realm {
    /// Create an empty realm
    pub fn new() -> Self {
        Self::default()
    }

    /// Package registry
    pub fn packages(&self) -> &PackageRegistry {
        &self.packages
    }

    /// `public` namespace of a package (memoized)
    pub fn package_ns(&self, package: &str) -> Ns {
        self.packages.public_ns(package)
    }

    /// `internal` namespace of a package (memoized)
    pub fn package_internal_ns(&self, package: &str) -> Ns {
        self.packages.internal_ns(package)
    }

    /// Root class, once defined
    pub fn root(&self) -> Option<&ClassRef> {
        self.root.get()
    }

    /// Define and register a class
    pub fn define_class(&self, qname: QName, mut options: ClassOptions, members: Vec<Member>) -> ClassRef {
        let root = self.root.get().cloned();
        if options.base.is_none() {
            options.base = root.clone();
        }
        if let Some(base) = &options.base {
            debug_assert!(!base.is_final(), "{} extends final class {}", qname, base.name());
        }

        let class = Class::build(qname.clone(), options, members);
        let prototype = match &root {
            Some(root) => Instance::template(root),
            None => {
                let _ = self.root.set(class.clone());
                Instance::template(&class)
            }
        };
        class.set_prototype(ObjectRef::new(prototype));

        self.globals
            .borrow_mut()
            .set(&qname.ns, qname.name.clone(), Definition::Class(class.clone()));
        tracing::debug!(
            class = class.name(),
            base = class.base().map(|b| b.name()),
            slots = class.slots().len(),
            "defined class"
        );
        class
    }

    /// Define and register an interface
    pub fn define_interface(
        &self,
        qname: QName,
        options: InterfaceOptions,
        members: Vec<Member>,
    ) -> InterfaceRef {
        let iface = Interface::build(qname.clone(), options, members);
        self.globals
            .borrow_mut()
            .set(&qname.ns, qname.name.clone(), Definition::Interface(iface.clone()));
        tracing::debug!(interface = iface.name(), "defined interface");
        iface
    }

    /// Register a top-level namespace alias
    pub fn define_namespace_alias(&self, qname: QName, ns: Ns) {
        tracing::debug!(alias = %qname, ns = %ns, "defined namespace alias");
        self.globals
            .borrow_mut()
            .set(&qname.ns, qname.name.clone(), Definition::Namespace(ns));
    }

    /// Resolve a global name under the ambiguity rule
    pub fn lookup(&self, qualifier: &Qualifier, name: &str) -> RtResult<Option<Definition>> {
        Ok(self.globals.borrow().get(qualifier, name)?.cloned())
    }

    /// Whether a global name resolves
    pub fn has_name(&self, qualifier: &Qualifier, name: &str) -> RtResult<bool> {
        self.globals.borrow().has(qualifier, name)
    }

    /// Class registered as `package.local`, if any
    pub fn class_named(&self, package: &str, local: &str) -> Option<ClassRef> {
        let ns = self.package_ns(package);
        self.globals
            .borrow()
            .get_ns_name(&ns, local)
            .and_then(Definition::as_class)
            .cloned()
    }

    /// Number of global definitions
    pub fn definition_count(&self) -> usize {
        self.globals.borrow().len()
    }
}
