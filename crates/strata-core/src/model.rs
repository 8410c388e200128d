//! Core data structures for structural facts

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Stable, content-addressed identifier for a module, class, method or body.
///
/// Derived from a hash of the identifying string, so two independent parses of
/// the same entity always agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity(pub u64);

impl Identity {
    /// The anchor every module hangs off.
    pub const ROOT: Identity = Identity(0);

    /// Hash an arbitrary identifying string.
    pub fn of(key: &str) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Identity(u64::from_be_bytes(prefix))
    }

    pub fn module(path: &str) -> Self {
        Self::of(path)
    }

    /// Classes are scoped by module so equal names in different files stay apart.
    /// Moving a class to another file therefore gives it, and its methods, new
    /// identities: the move shows up as a removal plus an addition.
    pub fn class(module: &str, class: &str) -> Self {
        Self::of(&format!("{module}#{class}"))
    }

    /// `qualified_name` is `Class::signature`, scoped by module like [`Identity::class`].
    pub fn method(module: &str, qualified_name: &str) -> Self {
        Self::of(&format!("{module}#{qualified_name}"))
    }

    /// Bodies are keyed by their text alone, so identical bodies share one identity.
    pub fn body(text: &str) -> Self {
        Self::of(text)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        u64::from_str_radix(&text, 16)
            .map(Identity)
            .map_err(serde::de::Error::custom)
    }
}

/// The four relation kinds of the structural graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    /// Root → Module
    Module,
    /// Module → Class
    Class,
    /// Class → Method
    Method,
    /// Method → MethodBody
    MethodBody,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::Module => "Module",
            RelationKind::Class => "Class",
            RelationKind::Method => "Method",
            RelationKind::MethodBody => "MethodBody",
        };
        f.write_str(name)
    }
}

/// A directed, labelled relation between two identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Identity,
    pub relation: RelationKind,
    pub object: Identity,
}

impl Triple {
    pub fn new(subject: Identity, relation: RelationKind, object: Identity) -> Self {
        Triple { subject, relation, object }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -{}-> {})", self.subject, self.relation, self.object)
    }
}

/// A method definition found inside a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub bare_name: String,
    /// Modifiers such as `static`, `get`, `set`, `async`, in written order.
    pub attributes: Vec<String>,
    /// Raw parameter list text, without the parentheses.
    pub parameters: String,
    /// Verbatim body text including its braces.
    pub body_text: String,
    pub body_hash: Identity,
}

impl MethodEntry {
    pub fn new(attributes: Vec<String>, bare_name: String, parameters: String, body_text: String) -> Self {
        let body_hash = Identity::body(&body_text);
        MethodEntry {
            bare_name,
            attributes,
            parameters,
            body_text,
            body_hash,
        }
    }

    /// Attributes and bare name joined with commas, e.g. `static,bar`.
    pub fn signature(&self) -> String {
        let mut parts: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
        parts.push(&self.bare_name);
        parts.join(",")
    }
}

/// A class declaration and the methods keyed by signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub name: String,
    pub superclass: Option<String>,
    pub methods: BTreeMap<String, MethodEntry>,
}

impl ClassEntry {
    pub fn new(name: impl Into<String>, superclass: Option<String>) -> Self {
        ClassEntry {
            name: name.into(),
            superclass,
            methods: BTreeMap::new(),
        }
    }

    /// Insert a method under its signature. A later definition replaces an earlier one.
    pub fn add_method(&mut self, method: MethodEntry) {
        self.methods.insert(method.signature(), method);
    }

    /// `ClassName::signature`
    pub fn qualified_name(&self, method: &MethodEntry) -> String {
        format!("{}::{}", self.name, method.signature())
    }
}

/// Structural facts of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleEntry {
    /// File path relative to the repository root.
    pub path: String,
    /// Resolved import specifiers, in source order.
    pub imports: Vec<String>,
    pub classes: BTreeMap<String, ClassEntry>,
}

impl ModuleEntry {
    pub fn new(path: impl Into<String>) -> Self {
        ModuleEntry {
            path: path.into(),
            imports: Vec::new(),
            classes: BTreeMap::new(),
        }
    }

    pub fn add_class(&mut self, class: ClassEntry) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn method_count(&self) -> usize {
        self.classes.values().map(|c| c.methods.len()).sum()
    }
}
