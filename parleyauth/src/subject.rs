// Subjects: shared, append-only containers of principals and credentials.
//
// Entries are tagged with an owner token (the mechanism name) at insertion
// time so that release can remove exactly what one mechanism added, leaving
// entries placed by other actors untouched.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use zeroize::Zeroizing;

/// A named identity asserted for a party in the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named secret attached to a party in the exchange.
///
/// The secret bytes are wiped from memory when the credential is dropped and
/// are never printed by the `Debug` impl.
#[derive(Clone)]
pub struct Credential {
    pub name: String,
    secret: Zeroizing<Vec<u8>>,
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.secret() == other.secret()
    }
}

impl Eq for Credential {}

impl Credential {
    pub fn new(name: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            secret: Zeroizing::new(secret),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

struct Entry<T> {
    owner: String,
    item: T,
}

#[derive(Default)]
struct SubjectInner {
    principals: Vec<Entry<Principal>>,
    credentials: Vec<Entry<Credential>>,
}

/// The source or recipient of a message in an authentication exchange.
///
/// A `Subject` is a cheap-clone handle: clones share one internally
/// synchronized store, so mechanisms working on different exchanges may
/// append to the same subject concurrently. The contract is additive-only —
/// the sole removal path is [`Subject::remove_owned`], scoped to one owner
/// tag.
#[derive(Clone, Default)]
pub struct Subject {
    inner: Arc<Mutex<SubjectInner>>,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a principal tagged with `owner`.
    pub fn add_principal(&self, owner: &str, principal: Principal) {
        let mut inner = self.inner.lock();
        inner.principals.push(Entry {
            owner: owner.to_string(),
            item: principal,
        });
    }

    /// Append a credential tagged with `owner`.
    pub fn add_credential(&self, owner: &str, credential: Credential) {
        let mut inner = self.inner.lock();
        inner.credentials.push(Entry {
            owner: owner.to_string(),
            item: credential,
        });
    }

    /// Snapshot of all principals, in insertion order.
    pub fn principals(&self) -> Vec<Principal> {
        self.inner.lock().principals.iter().map(|e| e.item.clone()).collect()
    }

    /// Snapshot of all credentials, in insertion order.
    pub fn credentials(&self) -> Vec<Credential> {
        self.inner.lock().credentials.iter().map(|e| e.item.clone()).collect()
    }

    /// Number of entries (principals + credentials) tagged with `owner`.
    pub fn owned_count(&self, owner: &str) -> usize {
        let inner = self.inner.lock();
        inner.principals.iter().filter(|e| e.owner == owner).count()
            + inner.credentials.iter().filter(|e| e.owner == owner).count()
    }

    /// Remove every entry tagged with `owner`, returning how many were
    /// removed. Entries tagged by other owners are never touched; calling
    /// this twice removes nothing the second time.
    pub fn remove_owned(&self, owner: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.principals.len() + inner.credentials.len();
        inner.principals.retain(|e| e.owner != owner);
        inner.credentials.retain(|e| e.owner != owner);
        before - (inner.principals.len() + inner.credentials.len())
    }

    pub fn principal_count(&self) -> usize {
        self.inner.lock().principals.len()
    }

    pub fn credential_count(&self) -> usize {
        self.inner.lock().credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.principals.is_empty() && inner.credentials.is_empty()
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Subject")
            .field("principals", &inner.principals.len())
            .field("credentials", &inner.credentials.len())
            .finish()
    }
}
