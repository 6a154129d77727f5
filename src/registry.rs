//! Persistent registry of stable identifiers.
//!
//! Every post and tag is addressed through a namespaced key (`POST:<file>`,
//! `TAG:<label>`). The first time a key is seen it is given the next integer,
//! and from then on the key maps to that integer for as long as the backing
//! file survives.
//!
//! # Lifecycle
//!
//! ```text
//! Registry::load()  ──►  assure() × N  ──►  save()
//!   (file or empty)      (append-only)      (consumes the registry,
//!                                            atomic overwrite)
//! ```
//!
//! # Backing store
//!
//! ```xml
//! <lock>
//!     <key id="1" value="POST:hello.txt"/>
//!     <key id="2" value="TAG:rust"/>
//! </lock>
//! ```

use crate::doc::{self, Element};
use std::{
    fmt,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;

const LOCK_ELEM: &str = "lock";
const KEY_ELEM: &str = "key";
const ID_ATTR: &str = "id";
const VALUE_ATTR: &str = "value";

/// Key namespace for posts, followed by the source file name.
pub const POST_NAMESPACE: &str = "POST:";
/// Key namespace for tags, followed by the exact label.
pub const TAG_NAMESPACE: &str = "TAG:";

pub fn post_key(name: &str) -> String {
    format!("{POST_NAMESPACE}{name}")
}

pub fn tag_key(label: &str) -> String {
    format!("{TAG_NAMESPACE}{label}")
}

// ============================================================================
// Identifier
// ============================================================================

/// A stable identifier.
///
/// Displays as its address: `0x` followed by four lowercase hex digits. The
/// 16-bit width is the whole address space, so the rendering can never
/// overflow its four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u16);

impl Id {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// Link target of the resource: `/0x002a/`.
    pub fn href(self) -> String {
        format!("/{self}/")
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("malformed identifier store `{path}`: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("invalid id `{id}` in identifier store `{path}`")]
    InvalidId { path: PathBuf, id: String },

    #[error("address space exhausted, no identifier left for `{0}`")]
    Exhausted(String),
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Id,
    pub key: String,
}

/// File-backed, append-only mapping from stable keys to identifiers.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    entries: Vec<Entry>,
    /// Number of entries that came from the backing file.
    loaded: usize,
}

impl Registry {
    /// Load the registry from `path`. A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::empty(path));
            }
            Err(err) => return Err(RegistryError::Io(path.to_path_buf(), err)),
        };

        let entries = parse_entries(path, &content)?;
        Ok(Self {
            path: path.to_path_buf(),
            loaded: entries.len(),
            entries,
        })
    }

    /// An empty registry that will be saved to `path`.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: Vec::new(),
            loaded: 0,
        }
    }

    /// Return the identifier of `key`, minting the next one if the key is new.
    ///
    /// Lookup is exact string equality. Known keys never move or change.
    pub fn assure(&mut self, key: &str) -> Result<Id, RegistryError> {
        if let Some(entry) = self.entries.iter().find(|entry| entry.key == key) {
            return Ok(entry.id);
        }

        let next = u16::try_from(self.entries.len() + 1)
            .map_err(|_| RegistryError::Exhausted(key.to_owned()))?;
        let id = Id::new(next);
        self.entries.push(Entry {
            id,
            key: key.to_owned(),
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of keys assured for the first time since loading.
    pub fn minted(&self) -> usize {
        self.entries.len() - self.loaded
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist every entry, replacing the backing file atomically.
    ///
    /// Consumes the registry: nothing may be assured after the final save.
    pub fn save(self) -> Result<(), RegistryError> {
        let io_err = |err| RegistryError::Io(self.path.clone(), err);

        let xml = doc::to_xml_string(&self.to_element()).map_err(|err| {
            io_err(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(xml.as_bytes()).map_err(io_err)?;
        if let Some(permissions) = lock_permissions(&self.path) {
            file.as_file().set_permissions(permissions).map_err(io_err)?;
        }
        file.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn to_element(&self) -> Element {
        let mut lock = Element::new(LOCK_ELEM);
        for entry in &self.entries {
            lock.push(
                Element::new(KEY_ELEM)
                    .with_attr(ID_ATTR, entry.id.get().to_string())
                    .with_attr(VALUE_ATTR, entry.key.as_str()),
            );
        }
        lock
    }
}

fn parse_entries(path: &Path, content: &str) -> Result<Vec<Entry>, RegistryError> {
    let malformed = |reason: String| RegistryError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let root = doc::parse_document(content).map_err(|err| malformed(err.to_string()))?;
    if root.name != LOCK_ELEM {
        return Err(malformed(format!(
            "expected `<{LOCK_ELEM}>` root element, found `<{}>`",
            root.name
        )));
    }

    root.children_named(KEY_ELEM)
        .map(|key| {
            let id = key.attr(ID_ATTR).unwrap_or_default();
            let id = id.trim().parse::<u16>().map_err(|_| RegistryError::InvalidId {
                path: path.to_path_buf(),
                id: id.to_owned(),
            })?;
            Ok(Entry {
                id: Id::new(id),
                key: key.attr(VALUE_ATTR).unwrap_or_default().to_owned(),
            })
        })
        .collect()
}

/// Permissions for the rewritten lock file: those of the file being replaced,
/// or world-readable for a new one.
fn lock_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}
