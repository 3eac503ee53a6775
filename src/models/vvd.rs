//! Parser for `.vvd` vertex pools.
//!
//! A vertex pool is one flat array of skinned vertices. Detail level 0 uses
//! the whole array; coarser levels use a prefix of it, so the per-level counts
//! must never grow as the level index increases.

use tracing::debug;
use winnow::Parser;
use winnow::binary::{le_f32, le_i32, le_u8, le_u32};

use crate::data::FileKind;
use crate::data::parser_utils::{
    WResult, parse_array, parse_at, parse_bytes, parse_vec2, parse_vec3,
};
use crate::error::ErrorKind;

/// "IDSV" as little-endian u32.
pub const VVD_MAGIC: u32 = u32::from_le_bytes(*b"IDSV");
pub const VVD_VERSION: u32 = 4;
pub const MAX_LODS: usize = 8;
pub const MAX_BONES_PER_VERTEX: usize = 3;

const HEADER_SIZE: usize = 0x40;
const FIXUP_SIZE: usize = 0x0C;
const VERTEX_SIZE: usize = 0x30;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VvdHeader {
    pub magic: u32,
    pub version: u32,
    /// Must match the container checksum.
    pub checksum: u32,
    pub num_lods: u32,
    /// Vertex count of each detail level; only the first `num_lods` are meaningful.
    pub level_vertex_counts: [u32; MAX_LODS],
    pub num_fixups: u32,
    pub fixup_offset: u32,
    pub vertex_offset: u32,
    pub tangent_offset: u32,
}

/// Remaps a run of vertices for levels that cull part of the pool.
///
/// Decoded for completeness; reconstruction does not apply fixups.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixup {
    pub lod: i32,
    pub source_vertex_id: u32,
    pub num_vertices: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneWeights {
    pub weights: [f32; MAX_BONES_PER_VERTEX],
    pub bones: [u8; MAX_BONES_PER_VERTEX],
    pub num_bones: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolVertex {
    pub bone_weights: BoneWeights,
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexPool {
    pub header: VvdHeader,
    pub fixups: Vec<Fixup>,
    /// Sized to the level 0 vertex count.
    pub vertices: Vec<PoolVertex>,
}

impl VertexPool {
    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }

    pub fn num_levels(&self) -> usize {
        self.header.num_lods as usize
    }

    /// The prefix of the pool used by detail level `level`.
    pub fn level(&self, level: usize) -> Option<&[PoolVertex]> {
        if level >= self.num_levels() {
            return None;
        }
        let count = self.header.level_vertex_counts[level] as usize;
        self.vertices.get(..count)
    }
}

fn parse_vvd_header(input: &mut &[u8]) -> WResult<VvdHeader> {
    let magic = le_u32.parse_next(input)?;
    let version = le_u32.parse_next(input)?;
    let checksum = le_u32.parse_next(input)?;
    let num_lods = le_u32.parse_next(input)?;
    let mut level_vertex_counts = [0u32; MAX_LODS];
    for count in &mut level_vertex_counts {
        *count = le_u32.parse_next(input)?;
    }
    let num_fixups = le_u32.parse_next(input)?;
    let fixup_offset = le_u32.parse_next(input)?;
    let vertex_offset = le_u32.parse_next(input)?;
    let tangent_offset = le_u32.parse_next(input)?;
    Ok(VvdHeader {
        magic,
        version,
        checksum,
        num_lods,
        level_vertex_counts,
        num_fixups,
        fixup_offset,
        vertex_offset,
        tangent_offset,
    })
}

fn parse_fixup(input: &mut &[u8]) -> WResult<Fixup> {
    let lod = le_i32.parse_next(input)?;
    let source_vertex_id = le_u32.parse_next(input)?;
    let num_vertices = le_u32.parse_next(input)?;
    Ok(Fixup {
        lod,
        source_vertex_id,
        num_vertices,
    })
}

fn parse_pool_vertex(input: &mut &[u8]) -> WResult<PoolVertex> {
    let mut weights = [0f32; MAX_BONES_PER_VERTEX];
    for weight in &mut weights {
        *weight = le_f32.parse_next(input)?;
    }
    let bones = parse_bytes::<MAX_BONES_PER_VERTEX>(input)?;
    let num_bones = le_u8.parse_next(input)?;
    let position = parse_vec3(input)?;
    let normal = parse_vec3(input)?;
    let uv = parse_vec2(input)?;
    Ok(PoolVertex {
        bone_weights: BoneWeights {
            weights,
            bones,
            num_bones,
        },
        position,
        normal,
        uv,
    })
}

/// Coarser levels must not use more vertices than finer ones, across all
/// eight count slots.
fn check_levels(header: &VvdHeader) -> Result<(), ErrorKind> {
    let num_lods = header.num_lods as usize;
    if num_lods == 0 || num_lods > MAX_LODS {
        return Err(ErrorKind::InvalidLevelCount {
            file: FileKind::Vvd,
            num_lods: header.num_lods,
            max: MAX_LODS,
        });
    }

    for (level, pair) in header.level_vertex_counts.windows(2).enumerate() {
        if pair[1] > pair[0] {
            return Err(ErrorKind::InconsistentLevelOfDetail {
                file: FileKind::Vvd,
                level,
                count: pair[0],
                coarser_count: pair[1],
            });
        }
    }
    Ok(())
}

/// Parse a `.vvd` stream.
///
/// The level counts are validated before any vertex is read.
pub fn parse_vvd(data: &[u8]) -> Result<VertexPool, ErrorKind> {
    let header = parse_at(data, FileKind::Vvd, 0, HEADER_SIZE, parse_vvd_header)?;

    if header.magic != VVD_MAGIC {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Vvd,
            field: "magic",
            expected: VVD_MAGIC,
            actual: header.magic,
        });
    }
    if header.version != VVD_VERSION {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Vvd,
            field: "version",
            expected: VVD_VERSION,
            actual: header.version,
        });
    }
    check_levels(&header)?;

    let fixups = if header.num_fixups > 0 {
        parse_array(
            data,
            FileKind::Vvd,
            header.fixup_offset as usize,
            header.num_fixups as usize,
            FIXUP_SIZE,
            parse_fixup,
        )?
    } else {
        Vec::new()
    };

    let vertices = parse_array(
        data,
        FileKind::Vvd,
        header.vertex_offset as usize,
        header.level_vertex_counts[0] as usize,
        VERTEX_SIZE,
        parse_pool_vertex,
    )?;

    debug!(
        "vvd: {} levels, {} vertices, {} fixups",
        header.num_lods,
        vertices.len(),
        fixups.len()
    );

    Ok(VertexPool {
        header,
        fixups,
        vertices,
    })
}
