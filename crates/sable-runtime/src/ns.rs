//! Namespaces, qualified names and packages
//!
//! Namespaces are compared by identity: two namespaces built from the same
//! URI are still different qualifiers. The only shared namespaces are the
//! `public`/`internal` pair each package owns, handed out by
//! [`PackageRegistry`].

use crate::class::Class;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// URI rendered for every system namespace
pub const SYSTEM_NS_URI: &str = "namespace://sable.dev/system";

/// Kind of a system namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemNsKind {
    /// Package-internal visibility
    Internal,
    /// Public visibility
    Public,
    /// Class-private visibility
    Private,
    /// Visible to subclasses
    Protected,
    /// Visible to subclasses through the static side
    StaticProtected,
}

/// Owner of a system namespace (never keeps the owner alive)
#[derive(Debug, Clone)]
pub enum NsParent {
    /// Namespace belongs to a package
    Package(Weak<Package>),
    /// Namespace belongs to a class (private/protected)
    Class(Weak<Class>),
}

enum NsData {
    System {
        kind: SystemNsKind,
        parent: RefCell<Option<NsParent>>,
    },
    User {
        uri: Rc<str>,
    },
    Explicit {
        uri: Rc<str>,
    },
}

/// Namespace handle with identity semantics
#[derive(Clone)]
pub struct Ns(Rc<NsData>);

impl Ns {
    /// Create a system namespace with no owner
    pub fn system(kind: SystemNsKind) -> Self {
        Ns(Rc::new(NsData::System {
            kind,
            parent: RefCell::new(None),
        }))
    }

    /// Create a system namespace owned by `parent`
    pub fn system_with_parent(kind: SystemNsKind, parent: NsParent) -> Self {
        Ns(Rc::new(NsData::System {
            kind,
            parent: RefCell::new(Some(parent)),
        }))
    }

    /// Create a user-defined namespace
    pub fn user(uri: impl Into<Rc<str>>) -> Self {
        Ns(Rc::new(NsData::User { uri: uri.into() }))
    }

    /// Create an explicit namespace
    pub fn explicit(uri: impl Into<Rc<str>>) -> Self {
        Ns(Rc::new(NsData::Explicit { uri: uri.into() }))
    }

    /// System kind, or `None` for user and explicit namespaces
    pub fn system_kind(&self) -> Option<SystemNsKind> {
        match &*self.0 {
            NsData::System { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this is a system `public` namespace
    pub fn is_public(&self) -> bool {
        self.system_kind() == Some(SystemNsKind::Public)
    }

    /// Whether this is a user-defined namespace
    pub fn is_user(&self) -> bool {
        matches!(&*self.0, NsData::User { .. })
    }

    /// Whether this is an explicit namespace
    pub fn is_explicit(&self) -> bool {
        matches!(&*self.0, NsData::Explicit { .. })
    }

    /// URI of a user or explicit namespace
    pub fn uri(&self) -> Option<&str> {
        match &*self.0 {
            NsData::User { uri } | NsData::Explicit { uri } => Some(uri),
            NsData::System { .. } => None,
        }
    }

    /// Attach an owner to a system namespace. No effect on other kinds.
    pub fn set_parent(&self, parent: NsParent) {
        if let NsData::System { parent: slot, .. } = &*self.0 {
            *slot.borrow_mut() = Some(parent);
        }
    }

    /// Owning package, if the namespace belongs to a live package
    pub fn package(&self) -> Option<Rc<Package>> {
        match &*self.0 {
            NsData::System { parent, .. } => match &*parent.borrow() {
                Some(NsParent::Package(p)) => p.upgrade(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Owning class, if the namespace belongs to a live class
    pub fn class(&self) -> Option<Rc<Class>> {
        match &*self.0 {
            NsData::System { parent, .. } => match &*parent.borrow() {
                Some(NsParent::Class(c)) => c.upgrade(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Stable identity of this namespace for the lifetime of the handle
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Ns {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Ns {}

impl Hash for Ns {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Ns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            NsData::User { uri } | NsData::Explicit { uri } => f.write_str(uri),
            NsData::System { .. } => f.write_str(SYSTEM_NS_URI),
        }
    }
}

impl fmt::Debug for Ns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            NsData::System { kind, .. } => {
                let owner = self
                    .package()
                    .map(|p| p.name.clone())
                    .or_else(|| self.class().map(|c| c.name().to_string()));
                f.debug_struct("SystemNs")
                    .field("kind", kind)
                    .field("owner", &owner)
                    .finish()
            }
            NsData::User { uri } => f.debug_tuple("UserNs").field(uri).finish(),
            NsData::Explicit { uri } => f.debug_tuple("ExplicitNs").field(uri).finish(),
        }
    }
}

/// `(namespace, local name)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Qualifying namespace
    pub ns: Ns,
    /// Local name
    pub name: Rc<str>,
}

impl QName {
    /// Create a qualified name
    pub fn new(ns: Ns, name: impl Into<Rc<str>>) -> Self {
        Self {
            ns,
            name: name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns.uri() {
            Some(uri) => write!(f, "{}:{}", uri, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A package and its two canonical namespaces
pub struct Package {
    /// Dotted package name (empty for the top-level package)
    pub name: String,
    public_ns: Ns,
    internal_ns: Ns,
}

impl Package {
    fn new(name: &str) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Package>| Package {
            name: name.to_string(),
            public_ns: Ns::system_with_parent(
                SystemNsKind::Public,
                NsParent::Package(weak.clone()),
            ),
            internal_ns: Ns::system_with_parent(
                SystemNsKind::Internal,
                NsParent::Package(weak.clone()),
            ),
        })
    }

    /// The package's `public` namespace
    pub fn public_ns(&self) -> &Ns {
        &self.public_ns
    }

    /// The package's `internal` namespace
    pub fn internal_ns(&self) -> &Ns {
        &self.internal_ns
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package").field("name", &self.name).finish()
    }
}

/// Registry of packages keyed by name. Packages are created on first
/// reference and live as long as the registry.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: RefCell<FxHashMap<String, Rc<Package>>>,
}

impl PackageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve or create a package
    pub fn package(&self, name: &str) -> Rc<Package> {
        if let Some(package) = self.packages.borrow().get(name) {
            return package.clone();
        }
        let package = Package::new(name);
        tracing::debug!(package = name, "created package");
        self.packages
            .borrow_mut()
            .insert(name.to_string(), package.clone());
        package
    }

    /// `public` namespace of a package
    pub fn public_ns(&self, name: &str) -> Ns {
        self.package(name).public_ns.clone()
    }

    /// `internal` namespace of a package
    pub fn internal_ns(&self, name: &str) -> Ns {
        self.package(name).internal_ns.clone()
    }

    /// Number of packages created so far
    pub fn len(&self) -> usize {
        self.packages.borrow().len()
    }

    /// Whether no package has been referenced yet
    pub fn is_empty(&self) -> bool {
        self.packages.borrow().is_empty()
    }
}
