//! Memory-mapped companion source.
//!
//! Lazily maps the `.mdl` and its sibling files from one directory and caches
//! the mappings, so a container and its companions can be decoded without
//! copying them into memory first.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::data::{ByteSource, CompanionLoader};
use crate::error::ErrorKind;

/// A companion source backed by memory-mapped files in one directory.
#[derive(Debug)]
pub struct MmapCompanionSource {
    dir: PathBuf,
    maps: RwLock<HashMap<String, Arc<Mmap>>>,
}

impl MmapCompanionSource {
    /// Create a new source pointing at the directory that holds the model.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            maps: Default::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map `name` if it exists. Returns `None` for a missing file.
    fn get_mmap(&self, name: &str) -> Result<Option<Arc<Mmap>>, ErrorKind> {
        {
            let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = maps.get(name) {
                return Ok(Some(Arc::clone(map)));
            }
        }

        let path = self.dir.join(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ErrorKind::io(path.display().to_string(), e)),
        };
        let map = unsafe { MmapOptions::new().map(&file) }
            .map_err(|e| ErrorKind::io(path.display().to_string(), e))?;
        debug!("mapped {} ({} bytes)", path.display(), map.len());

        let map = Arc::new(map);
        self.maps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&map));
        Ok(Some(map))
    }
}

impl CompanionLoader for MmapCompanionSource {
    fn get(&self, name: &str) -> Result<Option<ByteSource<'static>>, ErrorKind> {
        Ok(self.get_mmap(name)?.map(ByteSource::Mapped))
    }
}
