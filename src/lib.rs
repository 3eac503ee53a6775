//! Decoding of Respawn studio models (`.mdl` version 53) and their `.vtx`,
//! `.vvd` and `.phy` companions into per-detail-level triangle meshes.
//!
//! ```no_run
//! use mdlunpack::models::mdl::Mdl;
//!
//! let mut mdl = Mdl::open("models/props/crate.mdl")?;
//! for (name, model) in mdl.models()? {
//!     println!("{name}: {} meshes", model.meshes.len());
//! }
//! # Ok::<(), rootcause::Report<mdlunpack::error::ErrorKind>>(())
//! ```

/// Utilities for locating and reading the model family's byte streams
pub mod data;
/// Error definitions
pub mod error;
/// Model formats (container, topology, vertex pool, collision) and reconstruction
pub mod models;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;

#[cfg(test)]
mod testing;

#[cfg(feature = "vfs")]
pub use vfs;

pub use data::{ByteSource, CompanionLoader, CompanionsWithCallback, FileKind};
pub use error::{ErrorKind, MdlResult};
pub use models::geometry::{Material, Mesh, Model, ModelSet, Polygon, Vertex};
pub use models::mdl::{Mdl, ParseOptions, ParseState};

/// Decode `container` and build every detail level, fetching companions the
/// container does not embed from `companions`.
pub fn parse(
    filename: &str,
    container: &[u8],
    companions: &impl CompanionLoader,
) -> MdlResult<ModelSet> {
    let mut mdl = Mdl::new(filename, container);
    mdl.load_companions(companions)?;
    Ok(mdl.models()?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MdlFixture, StripGroupFixture, VtxFixture, VvdFixture};

    #[test]
    fn parse_with_sibling_companions() {
        let container = MdlFixture::new(9, &["mat_a", "mat_b"]).build();
        let loader = CompanionsWithCallback::new(|name: &str| {
            Ok(match name {
                "crate.vtx" => Some(ByteSource::Owned(
                    VtxFixture::new(
                        9,
                        vec![vec![
                            Some(StripGroupFixture::triangle([0, 1, 2])),
                            Some(StripGroupFixture::triangle([2, 1, 0])),
                        ]],
                    )
                    .build(),
                )),
                "crate.vvd" => Some(ByteSource::Owned(VvdFixture::new(9, &[6]).build())),
                _ => None,
            })
        });

        let models = parse("crate.mdl", &container, &loader).unwrap();
        let model = models.get("crate.lod0").unwrap();
        assert_eq!(model.polygon_count(), 2);
        assert_eq!(model.meshes[1].material.path, "mat_b");
        assert_eq!(model.meshes[1].polygons[0].indices, [5, 4, 3]);
    }

    #[test]
    fn parse_without_companions_fails() {
        let container = MdlFixture::new(9, &["mat_a"]).build();
        let loader = CompanionsWithCallback::new(|_: &str| Ok(None));
        assert!(parse("crate.mdl", &container, &loader).is_err());
    }
}
