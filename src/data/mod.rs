/// Shared winnow helpers for the fixed-layout records of every stream
pub mod parser_utils;
/// Loaders that read companion files straight from disk
pub mod wrappers;

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use crate::error::ErrorKind;

/// One member of the model file family.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    /// The container header.
    Mdl,
    /// Render-mesh topology.
    Vtx,
    /// Render-mesh vertex pool.
    Vvd,
    /// Per-vertex colors. Located but never decoded.
    Vvc,
    /// Collision solids.
    Phy,
}

impl FileKind {
    /// Companions in the order the container lists their byte ranges.
    pub const COMPANIONS: [FileKind; 4] = [FileKind::Vtx, FileKind::Vvd, FileKind::Vvc, FileKind::Phy];

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Mdl => "mdl",
            FileKind::Vtx => "vtx",
            FileKind::Vvd => "vvd",
            FileKind::Vvc => "vvc",
            FileKind::Phy => "phy",
        }
    }

    /// Whether reconstruction is impossible without this companion.
    pub fn is_mandatory(self) -> bool {
        matches!(self, FileKind::Vtx | FileKind::Vvd)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// The file name without directories or extension, e.g. `pilot_heavy` for
/// `models/humans/pilot_heavy.mdl`.
pub fn base_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .to_owned()
}

/// The sibling file name a companion is expected under: `{base_name}.{ext}`.
pub fn companion_name(base_name: &str, kind: FileKind) -> String {
    format!("{base_name}.{}", kind.extension())
}

/// Raw bytes of one stream, borrowed from the caller or owned by a loader.
#[derive(Debug, Clone)]
pub enum ByteSource<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
    Mapped(Arc<memmap2::Mmap>),
}

impl Deref for ByteSource<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ByteSource::Borrowed(data) => *data,
            ByteSource::Owned(data) => data.as_slice(),
            ByteSource::Mapped(map) => &map[..],
        }
    }
}

impl<'a> From<&'a [u8]> for ByteSource<'a> {
    fn from(data: &'a [u8]) -> Self {
        ByteSource::Borrowed(data)
    }
}

impl From<Vec<u8>> for ByteSource<'_> {
    fn from(data: Vec<u8>) -> Self {
        ByteSource::Owned(data)
    }
}

impl<'a> From<Cow<'a, [u8]>> for ByteSource<'a> {
    fn from(data: Cow<'a, [u8]>) -> Self {
        match data {
            Cow::Borrowed(data) => ByteSource::Borrowed(data),
            Cow::Owned(data) => ByteSource::Owned(data),
        }
    }
}

/// Resolves companion files that are not embedded in the container.
///
/// `name` is a bare file name following the `{base_name}.{ext}` convention.
/// A companion that does not exist is `Ok(None)`, not an error.
pub trait CompanionLoader {
    fn get(&self, name: &str) -> Result<Option<ByteSource<'static>>, ErrorKind>;
}

pub struct CompanionsWithCallback<F> {
    callback: F,
}

impl<F> CompanionsWithCallback<F>
where
    F: Fn(&str) -> Result<Option<ByteSource<'static>>, ErrorKind>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> CompanionLoader for CompanionsWithCallback<F>
where
    F: Fn(&str) -> Result<Option<ByteSource<'static>>, ErrorKind>,
{
    fn get(&self, name: &str) -> Result<Option<ByteSource<'static>>, ErrorKind> {
        (self.callback)(name)
    }
}

/// Looks companions up next to the container inside a virtual file system.
/// `self` is the directory holding the `.mdl`.
#[cfg(feature = "vfs")]
impl CompanionLoader for vfs::VfsPath {
    fn get(&self, name: &str) -> Result<Option<ByteSource<'static>>, ErrorKind> {
        use std::io::Read;

        let loader_error = |e: vfs::VfsError| ErrorKind::Loader {
            path: format!("{}/{name}", self.as_str()),
            detail: e.to_string(),
        };

        let path = self.join(name).map_err(loader_error)?;
        if !path.exists().map_err(loader_error)? {
            return Ok(None);
        }

        let mut buf = Vec::new();
        path.open_file()
            .map_err(loader_error)?
            .read_to_end(&mut buf)
            .map_err(|e| ErrorKind::io(path.as_str(), e))?;
        Ok(Some(ByteSource::Owned(buf)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn companion_names_follow_base_name() {
        let base = base_name("models/humans/pilot_heavy.mdl");
        assert_eq!(base, "pilot_heavy");
        assert_eq!(companion_name(&base, FileKind::Vtx), "pilot_heavy.vtx");
        assert_eq!(companion_name(&base, FileKind::Phy), "pilot_heavy.phy");
    }

    #[test]
    fn only_topology_and_vertices_are_mandatory() {
        let mandatory: Vec<_> = FileKind::COMPANIONS
            .into_iter()
            .filter(|kind| kind.is_mandatory())
            .collect();
        assert_eq!(mandatory, [FileKind::Vtx, FileKind::Vvd]);
    }

    #[test]
    fn callback_loader_reports_missing_files_as_none() {
        let loader = CompanionsWithCallback::new(|name: &str| {
            Ok((name == "crate.vvd").then(|| ByteSource::Owned(vec![1, 2, 3])))
        });
        assert_eq!(loader.get("crate.vvd").unwrap().as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(loader.get("crate.vtx").unwrap().is_none());
    }

    #[cfg(feature = "vfs")]
    #[test]
    fn vfs_loader_reads_siblings() {
        use std::io::Write;

        let root: vfs::VfsPath = vfs::MemoryFS::new().into();
        root.join("crate.vtx")
            .unwrap()
            .create_file()
            .unwrap()
            .write_all(&[7, 7])
            .unwrap();

        assert_eq!(root.get("crate.vtx").unwrap().as_deref(), Some(&[7u8, 7][..]));
        assert!(root.get("crate.phy").unwrap().is_none());
    }
}
