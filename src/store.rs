//! In-memory collaborators backing the engine's callers: a user directory
//! that turns a login into a [`Principal`], and resource stores the caller
//! queries before invoking the engine.
//!
//! These are injected, not reached into statically; their mutable
//! collections sit behind `RwLock`s confined to this module. The engine
//! itself never touches them.

use std::sync::RwLock;

use crate::claims::{claim_types, Claim, Identity, Principal};
use crate::resource::Resource;

/// Authentication scheme recorded on identities minted by the directory.
pub const DIRECTORY_SCHEME: &str = "directory";

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub company: String,
    pub role: Option<String>,
}

/// Username-keyed user directory. Lookup is case-insensitive, matching the
/// usual login form behavior.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<Vec<User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory seeded with the demo users.
    pub fn with_sample_users() -> Self {
        let directory = Self::new();
        directory.add_user(User {
            username: "barry".into(),
            company: "Paddy Productions".into(),
            role: Some("Administrator".into()),
        });
        directory.add_user(User {
            username: "davidfowl".into(),
            company: "Tone Deaf Records".into(),
            role: None,
        });
        directory.add_user(User {
            username: "dedward".into(),
            company: "Tone Deaf Records".into(),
            role: Some("Administrator".into()),
        });
        directory
    }

    pub fn add_user(&self, user: User) {
        self.users
            .write()
            .expect("user directory lock poisoned")
            .push(user);
    }

    pub fn validate_login(&self, username: &str) -> bool {
        self.users
            .read()
            .expect("user directory lock poisoned")
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
    }

    /// Build an authenticated principal for a known user, with name,
    /// company, and role claims. Unknown usernames yield `None`.
    pub fn principal_for(&self, username: &str) -> Option<Principal> {
        let users = self.users.read().expect("user directory lock poisoned");
        let user = users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))?;

        let mut identity = Identity::authenticated(DIRECTORY_SCHEME)
            .with_claim(Claim::new(claim_types::NAME, &user.username))
            .with_claim(Claim::new(claim_types::COMPANY, &user.company));
        if let Some(role) = &user.role {
            identity.add_claim(Claim::new(claim_types::ROLE, role));
        }
        Some(Principal::new(identity))
    }
}

/// A document with a single author, the classic resource for ownership
/// checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: u32,
    pub author: String,
}

impl Resource for Document {
    fn resource_kind(&self) -> &'static str {
        "document"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<Vec<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_documents() -> Self {
        let store = Self::new();
        store.add(Document {
            id: 1,
            author: "barry".into(),
        });
        store.add(Document {
            id: 2,
            author: "someoneelse".into(),
        });
        store
    }

    pub fn add(&self, document: Document) {
        self.documents
            .write()
            .expect("document store lock poisoned")
            .push(document);
    }

    pub fn get(&self, id: u32) -> Option<Document> {
        self.documents
            .read()
            .expect("document store lock poisoned")
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<Document> {
        self.documents
            .read()
            .expect("document store lock poisoned")
            .clone()
    }
}

/// An album published by a company; ownership checks run against the
/// principal's company claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub publisher: String,
}

impl Resource for Album {
    fn resource_kind(&self) -> &'static str {
        "album"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct AlbumStore {
    albums: RwLock<Vec<Album>>,
}

impl AlbumStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_albums() -> Self {
        let store = Self::new();
        store.add(Album {
            id: 1,
            title: "Wish You Were A Crocodile".into(),
            artist: "The Paddys".into(),
            publisher: "Paddy Productions".into(),
        });
        store.add(Album {
            id: 2,
            title: "Scaling Up".into(),
            artist: "The Fowlers".into(),
            publisher: "Tone Deaf Records".into(),
        });
        store
    }

    pub fn add(&self, album: Album) {
        self.albums
            .write()
            .expect("album store lock poisoned")
            .push(album);
    }

    pub fn get(&self, id: u32) -> Option<Album> {
        self.albums
            .read()
            .expect("album store lock poisoned")
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<Album> {
        self.albums
            .read()
            .expect("album store lock poisoned")
            .clone()
    }
}
