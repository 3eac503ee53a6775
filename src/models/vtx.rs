//! Parser for `.vtx` render-mesh topology.
//!
//! The file is a pointer-free tree: body parts → models → detail levels →
//! meshes → strip groups → strips. Each record stores a child count and an
//! offset relative to its own start. Children of sibling records are not
//! contiguous, so the tree is decoded breadth-first, one depth at a time, and
//! every node is filed in a [`Topology`] registry under a synthetic
//! [`NodeKey`] made of its index path from the root.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use tracing::{debug, trace, warn};
use winnow::Parser;
use winnow::binary::{le_f32, le_i16, le_i32, le_u8, le_u16, le_u32};

use crate::data::FileKind;
use crate::data::parser_utils::{
    WResult, parse_array, parse_at, parse_bytes, parse_records, resolve_relptr,
};
use crate::error::ErrorKind;

pub const VTX_VERSION: u32 = 7;

const HEADER_SIZE: usize = 36;
const BODY_PART_SIZE: usize = 8;
const MODEL_SIZE: usize = 8;
const LOD_SIZE: usize = 12;
const MESH_SIZE: usize = 9;
const STRIP_GROUP_SIZE: usize = 25;
const STRIP_SIZE: usize = 27;
const VERTEX_SIZE: usize = 9;

/// Index path of a node in the topology tree, `N` levels deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey<const N: usize>(pub [usize; N]);

pub type RootKey = NodeKey<0>;
/// `(body_part)`
pub type BodyPartKey = NodeKey<1>;
/// `(body_part, model)`
pub type ModelKey = NodeKey<2>;
/// `(body_part, model, lod)`
pub type LodKey = NodeKey<3>;
/// `(body_part, model, lod, mesh)`
pub type MeshKey = NodeKey<4>;
/// `(body_part, model, lod, mesh, strip_group)`
pub type StripGroupKey = NodeKey<5>;
/// `(body_part, model, lod, mesh, strip_group, strip)`
pub type StripKey = NodeKey<6>;

impl<const N: usize> NodeKey<N> {
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }
}

#[cfg(feature = "serde")]
impl<const N: usize> serde::Serialize for NodeKey<N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.0)
    }
}

impl<const N: usize> fmt::Display for NodeKey<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Keys that have a next depth.
pub trait ChildKey: Copy {
    type Child: Copy + Ord;

    fn child(self, index: usize) -> Self::Child;
}

macro_rules! impl_child_key {
    ($($n:literal => [$($i:literal),*]),* $(,)?) => {
        $(
            impl ChildKey for NodeKey<$n> {
                type Child = NodeKey<{ $n + 1 }>;

                fn child(self, index: usize) -> Self::Child {
                    NodeKey([$(self.0[$i],)* index])
                }
            }
        )*
    };
}

impl_child_key! {
    0 => [],
    1 => [0],
    2 => [0, 1],
    3 => [0, 1, 2],
    4 => [0, 1, 2, 3],
    5 => [0, 1, 2, 3, 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VtxHeader {
    pub version: u32,
    pub vertex_cache_size: u32,
    pub max_bones_per_strip: u16,
    pub max_bones_per_triangle: u16,
    pub max_bones_per_vertex: u32,
    /// Must match the container checksum.
    pub checksum: u32,
    pub num_lods: u32,
    pub material_replacement_list_offset: i32,
    pub num_body_parts: u32,
    /// Relative to the start of the header, i.e. absolute.
    pub body_part_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BodyPart {
    pub num_models: u32,
    pub model_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelHeader {
    pub num_lods: u32,
    pub lod_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LodHeader {
    pub num_meshes: u32,
    pub mesh_offset: i32,
    /// Screen-size threshold at which this level takes over.
    pub switch_point: f32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct MeshFlags: u8 {
        const IS_TEETH = 0x01;
        const IS_EYES = 0x02;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct StripGroupFlags: u8 {
        const FLEXED = 0x01;
        const HARDWARE_SKINNED = 0x02;
        const DELTA_FLEXED = 0x04;
        const SUPPRESS_HARDWARE_MORPH = 0x08;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct StripFlags: u8 {
        const IS_TRILIST = 0x01;
        const IS_TRISTRIP = 0x02;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshHeader {
    pub num_strip_groups: u32,
    pub strip_group_offset: i32,
    pub flags: MeshFlags,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StripGroup {
    pub num_vertices: u32,
    pub vertex_offset: i32,
    pub num_indices: u32,
    pub index_offset: i32,
    pub num_strips: u32,
    pub strip_offset: i32,
    pub flags: StripGroupFlags,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Strip {
    /// Range into the owning strip group's index pool.
    pub num_indices: u32,
    pub index_offset: u32,
    /// Range into the owning strip group's vertex pool.
    pub num_vertices: u32,
    pub vertex_offset: u32,
    pub num_bones: i16,
    pub flags: StripFlags,
    pub num_bone_state_changes: u32,
    pub bone_state_change_offset: i32,
}

/// Entry of a strip group's local vertex pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TopologyVertex {
    pub bone_weight_index: [u8; 3],
    pub num_bones: u8,
    /// Mesh-relative index into the vertex pool of the detail level.
    pub vvd_index: u16,
    pub bone_id: [u8; 3],
}

/// Every node of a `.vtx` tree, addressable by its key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Topology {
    pub header: VtxHeader,
    pub body_parts: BTreeMap<BodyPartKey, BodyPart>,
    pub models: BTreeMap<ModelKey, ModelHeader>,
    pub lods: BTreeMap<LodKey, LodHeader>,
    pub meshes: BTreeMap<MeshKey, MeshHeader>,
    pub strip_groups: BTreeMap<StripGroupKey, StripGroup>,
    pub strips: BTreeMap<StripKey, Strip>,
    /// Local vertex pool of each strip group.
    pub vertices: BTreeMap<StripGroupKey, Vec<TopologyVertex>>,
    /// Local index pool of each strip group, wound as a triangle list.
    pub indices: BTreeMap<StripGroupKey, Vec<u16>>,
}

impl Topology {
    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }
}

/// A record that owns an array of next-depth records.
trait Parent {
    /// `(count, offset relative to the record start)`
    fn children(&self) -> (u32, i32);
}

impl Parent for VtxHeader {
    fn children(&self) -> (u32, i32) {
        (self.num_body_parts, self.body_part_offset)
    }
}

impl Parent for BodyPart {
    fn children(&self) -> (u32, i32) {
        (self.num_models, self.model_offset)
    }
}

impl Parent for ModelHeader {
    fn children(&self) -> (u32, i32) {
        (self.num_lods, self.lod_offset)
    }
}

impl Parent for LodHeader {
    fn children(&self) -> (u32, i32) {
        (self.num_meshes, self.mesh_offset)
    }
}

impl Parent for MeshHeader {
    fn children(&self) -> (u32, i32) {
        (self.num_strip_groups, self.strip_group_offset)
    }
}

impl Parent for StripGroup {
    fn children(&self) -> (u32, i32) {
        (self.num_strips, self.strip_offset)
    }
}

/// A decoded record, its key, and the stream position it was read from.
struct Placed<K, R> {
    key: K,
    offset: usize,
    record: R,
}

fn parse_vtx_header(input: &mut &[u8]) -> WResult<VtxHeader> {
    let version = le_u32.parse_next(input)?;
    let vertex_cache_size = le_u32.parse_next(input)?;
    let max_bones_per_strip = le_u16.parse_next(input)?;
    let max_bones_per_triangle = le_u16.parse_next(input)?;
    let max_bones_per_vertex = le_u32.parse_next(input)?;
    let checksum = le_u32.parse_next(input)?;
    let num_lods = le_u32.parse_next(input)?;
    let material_replacement_list_offset = le_i32.parse_next(input)?;
    let num_body_parts = le_u32.parse_next(input)?;
    let body_part_offset = le_i32.parse_next(input)?;
    Ok(VtxHeader {
        version,
        vertex_cache_size,
        max_bones_per_strip,
        max_bones_per_triangle,
        max_bones_per_vertex,
        checksum,
        num_lods,
        material_replacement_list_offset,
        num_body_parts,
        body_part_offset,
    })
}

fn parse_body_part(input: &mut &[u8]) -> WResult<BodyPart> {
    let num_models = le_u32.parse_next(input)?;
    let model_offset = le_i32.parse_next(input)?;
    Ok(BodyPart {
        num_models,
        model_offset,
    })
}

fn parse_model(input: &mut &[u8]) -> WResult<ModelHeader> {
    let num_lods = le_u32.parse_next(input)?;
    let lod_offset = le_i32.parse_next(input)?;
    Ok(ModelHeader {
        num_lods,
        lod_offset,
    })
}

fn parse_lod(input: &mut &[u8]) -> WResult<LodHeader> {
    let num_meshes = le_u32.parse_next(input)?;
    let mesh_offset = le_i32.parse_next(input)?;
    let switch_point = le_f32.parse_next(input)?;
    Ok(LodHeader {
        num_meshes,
        mesh_offset,
        switch_point,
    })
}

fn parse_mesh(input: &mut &[u8]) -> WResult<MeshHeader> {
    let num_strip_groups = le_u32.parse_next(input)?;
    let strip_group_offset = le_i32.parse_next(input)?;
    let flags = MeshFlags::from_bits_retain(le_u8.parse_next(input)?);
    Ok(MeshHeader {
        num_strip_groups,
        strip_group_offset,
        flags,
    })
}

fn parse_strip_group(input: &mut &[u8]) -> WResult<StripGroup> {
    let num_vertices = le_u32.parse_next(input)?;
    let vertex_offset = le_i32.parse_next(input)?;
    let num_indices = le_u32.parse_next(input)?;
    let index_offset = le_i32.parse_next(input)?;
    let num_strips = le_u32.parse_next(input)?;
    let strip_offset = le_i32.parse_next(input)?;
    let flags = StripGroupFlags::from_bits_retain(le_u8.parse_next(input)?);
    Ok(StripGroup {
        num_vertices,
        vertex_offset,
        num_indices,
        index_offset,
        num_strips,
        strip_offset,
        flags,
    })
}

fn parse_strip(input: &mut &[u8]) -> WResult<Strip> {
    let num_indices = le_u32.parse_next(input)?;
    let index_offset = le_u32.parse_next(input)?;
    let num_vertices = le_u32.parse_next(input)?;
    let vertex_offset = le_u32.parse_next(input)?;
    let num_bones = le_i16.parse_next(input)?;
    let flags = StripFlags::from_bits_retain(le_u8.parse_next(input)?);
    let num_bone_state_changes = le_u32.parse_next(input)?;
    let bone_state_change_offset = le_i32.parse_next(input)?;
    Ok(Strip {
        num_indices,
        index_offset,
        num_vertices,
        vertex_offset,
        num_bones,
        flags,
        num_bone_state_changes,
        bone_state_change_offset,
    })
}

fn parse_topology_vertex(input: &mut &[u8]) -> WResult<TopologyVertex> {
    let bone_weight_index = parse_bytes::<3>(input)?;
    let num_bones = le_u8.parse_next(input)?;
    let vvd_index = le_u16.parse_next(input)?;
    let bone_id = parse_bytes::<3>(input)?;
    Ok(TopologyVertex {
        bone_weight_index,
        num_bones,
        vvd_index,
        bone_id,
    })
}

/// Resolve an array owned by the record at `parent_offset`, reporting
/// failures against the owning node.
fn child_offset(
    data: &[u8],
    key: &[usize],
    parent_offset: usize,
    relative: i32,
    count: usize,
    size: usize,
) -> Result<usize, ErrorKind> {
    let offset = resolve_relptr(parent_offset, i64::from(relative));
    match offset {
        Some(offset) if offset.saturating_add(count.saturating_mul(size)) <= data.len() => {
            Ok(offset)
        }
        _ => Err(ErrorKind::MalformedTopology {
            key: key.to_vec(),
            reason: format!(
                "{count} children of {size} bytes at 0x{parent_offset:X}{relative:+} lie outside the {} byte stream",
                data.len()
            ),
        }),
    }
}

/// Read the children of every record at one depth.
///
/// Siblings are read in sequence from `parent + offset`; each child keeps its
/// own start position as the base for the next depth. Child arrays at one
/// depth must not overlap, so every node is backed by its own bytes.
fn read_level<const N: usize, P, C>(
    data: &[u8],
    parents: &[Placed<NodeKey<N>, P>],
    size: usize,
    parser: fn(&mut &[u8]) -> WResult<C>,
) -> Result<Vec<Placed<<NodeKey<N> as ChildKey>::Child, C>>, ErrorKind>
where
    NodeKey<N>: ChildKey,
    P: Parent,
{
    let mut children = Vec::new();
    // start -> end of every child array claimed at this depth
    let mut claimed: BTreeMap<usize, usize> = BTreeMap::new();
    for parent in parents {
        let (count, relative) = parent.record.children();
        let count = count as usize;
        if count == 0 {
            continue;
        }
        let offset = child_offset(
            data,
            &parent.key.0,
            parent.offset,
            relative,
            count,
            size,
        )?;
        let end = offset + count * size;
        if let Some((&start, &claimed_end)) = claimed.range(..end).next_back()
            && claimed_end > offset
        {
            return Err(ErrorKind::MalformedTopology {
                key: parent.key.to_vec(),
                reason: format!(
                    "children at 0x{offset:X}..0x{end:X} overlap an array already read at 0x{start:X}..0x{claimed_end:X}"
                ),
            });
        }
        claimed.insert(offset, end);

        let records = parse_records(data, FileKind::Vtx, offset, count, size, parser)?;
        children.extend(
            records
                .into_iter()
                .enumerate()
                .map(|(index, (offset, record))| Placed {
                    key: parent.key.child(index),
                    offset,
                    record,
                }),
        );
    }
    Ok(children)
}

fn into_registry<K: Ord, R>(placed: &[Placed<K, R>]) -> BTreeMap<K, R>
where
    K: Copy,
    R: Copy,
{
    placed.iter().map(|node| (node.key, node.record)).collect()
}

/// Parse a `.vtx` stream into its keyed registry.
pub fn parse_vtx(data: &[u8]) -> Result<Topology, ErrorKind> {
    let header = parse_at(data, FileKind::Vtx, 0, HEADER_SIZE, parse_vtx_header)?;
    if header.version != VTX_VERSION {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Vtx,
            field: "version",
            expected: VTX_VERSION,
            actual: header.version,
        });
    }

    let root = [Placed {
        key: NodeKey([]),
        offset: 0,
        record: header,
    }];

    let body_parts = read_level(data, &root, BODY_PART_SIZE, parse_body_part)?;
    trace!("vtx: {} body parts", body_parts.len());
    if body_parts.len() > 1 {
        warn!(
            "vtx has {} body parts; only body part 0 is reconstructed",
            body_parts.len()
        );
    }

    let models = read_level(data, &body_parts, MODEL_SIZE, parse_model)?;
    trace!("vtx: {} models", models.len());
    if models.iter().any(|model| model.key.0[1] > 0) {
        warn!("vtx has more than one model per body part; only model 0 is reconstructed");
    }

    let lods = read_level(data, &models, LOD_SIZE, parse_lod)?;
    trace!("vtx: {} detail levels", lods.len());
    let meshes = read_level(data, &lods, MESH_SIZE, parse_mesh)?;
    trace!("vtx: {} meshes", meshes.len());
    let strip_groups = read_level(data, &meshes, STRIP_GROUP_SIZE, parse_strip_group)?;
    trace!("vtx: {} strip groups", strip_groups.len());
    let strips = read_level(data, &strip_groups, STRIP_SIZE, parse_strip)?;
    trace!("vtx: {} strips", strips.len());

    let mut vertices = BTreeMap::new();
    let mut indices = BTreeMap::new();
    for group in &strip_groups {
        let record = &group.record;
        let count = record.num_vertices as usize;
        let offset = child_offset(
            data,
            &group.key.0,
            group.offset,
            record.vertex_offset,
            count,
            VERTEX_SIZE,
        )?;
        let pool = parse_array(
            data,
            FileKind::Vtx,
            offset,
            count,
            VERTEX_SIZE,
            parse_topology_vertex,
        )?;
        vertices.insert(group.key, pool);

        let count = record.num_indices as usize;
        let offset = child_offset(
            data,
            &group.key.0,
            group.offset,
            record.index_offset,
            count,
            2,
        )?;
        let pool = parse_array(data, FileKind::Vtx, offset, count, 2, le_u16)?;
        indices.insert(group.key, pool);
    }

    debug!(
        "vtx: {} levels, {} meshes, {} strip groups",
        header.num_lods,
        meshes.len(),
        strip_groups.len()
    );

    Ok(Topology {
        header,
        body_parts: into_registry(&body_parts),
        models: into_registry(&models),
        lods: into_registry(&lods),
        meshes: into_registry(&meshes),
        strip_groups: into_registry(&strip_groups),
        strips: into_registry(&strips),
        vertices,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{StripGroupFixture, VtxFixture};

    fn two_level_fixture() -> VtxFixture {
        VtxFixture::new(
            0xBEEF,
            vec![
                vec![
                    Some(StripGroupFixture::triangle([0, 1, 2])),
                    Some(StripGroupFixture {
                        vvd_indices: vec![0, 1, 2, 3],
                        indices: vec![0, 1, 2, 2, 1, 3],
                        strip_vertex_counts: vec![4],
                    }),
                ],
                vec![None, Some(StripGroupFixture::triangle([2, 1, 0]))],
            ],
        )
    }

    #[test]
    fn keys_extend_their_parent() {
        let group: StripGroupKey = NodeKey([0, 0, 1]).child(3).child(0);
        assert_eq!(group, NodeKey([0, 0, 1, 3, 0]));
        assert_eq!(group.child(2).to_vec(), vec![0, 0, 1, 3, 0, 2]);
        assert_eq!(group.to_string(), "[0, 0, 1, 3, 0]");
    }

    #[test]
    fn decodes_every_depth_into_the_registry() {
        let topology = parse_vtx(&two_level_fixture().build()).unwrap();

        assert_eq!(topology.checksum(), 0xBEEF);
        assert_eq!(topology.body_parts.len(), 1);
        assert_eq!(topology.models.len(), 1);
        assert_eq!(topology.lods.len(), 2);
        assert_eq!(topology.meshes.len(), 4);
        assert_eq!(topology.strip_groups.len(), 3);
        assert_eq!(topology.strips.len(), 3);

        assert_eq!(topology.lods[&NodeKey([0, 0, 1])].switch_point, 12.0);
        assert_eq!(topology.meshes[&NodeKey([0, 0, 1, 0])].num_strip_groups, 0);
        assert!(!topology.strip_groups.contains_key(&NodeKey([0, 0, 1, 0, 0])));

        let key = NodeKey([0, 0, 0, 1, 0]);
        assert_eq!(topology.indices[&key], vec![0, 1, 2, 2, 1, 3]);
        let vvd: Vec<u16> = topology.vertices[&key].iter().map(|v| v.vvd_index).collect();
        assert_eq!(vvd, vec![0, 1, 2, 3]);

        let strip = topology.strips[&NodeKey([0, 0, 0, 1, 0, 0])];
        assert_eq!(strip.num_vertices, 4);
        assert_eq!(strip.num_indices, 6);
        assert_eq!(strip.flags, StripFlags::IS_TRILIST);
        assert_eq!(strip.num_bones, 3);

        let reversed: Vec<u16> = topology.vertices[&NodeKey([0, 0, 1, 1, 0])]
            .iter()
            .map(|v| v.vvd_index)
            .collect();
        assert_eq!(reversed, vec![2, 1, 0]);
    }

    #[test]
    fn extra_body_parts_are_decoded() {
        let mut fixture = two_level_fixture();
        fixture.extra_body_parts = 2;
        let topology = parse_vtx(&fixture.build()).unwrap();
        assert_eq!(topology.body_parts.len(), 3);
        assert_eq!(topology.body_parts[&NodeKey([2])].num_models, 0);
        assert_eq!(topology.strip_groups.len(), 3);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut fixture = two_level_fixture();
        fixture.version = 6;
        assert!(matches!(
            parse_vtx(&fixture.build()),
            Err(ErrorKind::FormatMismatch {
                file: FileKind::Vtx,
                field: "version",
                expected: 7,
                actual: 6,
            })
        ));
    }

    #[test]
    fn children_outside_the_stream_name_their_parent() {
        let mut data = two_level_fixture().build();
        // first mesh of level 0 points its strip groups far past the end
        let mesh_at = 36 + 8 + 8 + 2 * 12;
        data[mesh_at + 4..mesh_at + 8].copy_from_slice(&0x7FFF_0000i32.to_le_bytes());

        match parse_vtx(&data) {
            Err(ErrorKind::MalformedTopology { key, .. }) => assert_eq!(key, vec![0, 0, 0, 0]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn siblings_sharing_a_child_array_are_rejected() {
        let mut fixture = two_level_fixture();
        fixture.extra_body_parts = 1;
        let mut data = fixture.build();
        // body part 1 (at 44) claims the single model at 52 owned by body part 0
        data[44..48].copy_from_slice(&1u32.to_le_bytes());
        data[48..52].copy_from_slice(&8i32.to_le_bytes());

        match parse_vtx(&data) {
            Err(ErrorKind::MalformedTopology { key, reason }) => {
                assert_eq!(key, vec![1]);
                assert!(reason.contains("overlap"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlapping_child_arrays_are_rejected() {
        let mut data = two_level_fixture().build();
        // mesh 1 of level 0 points its strip group one byte into mesh 0's
        let first_mesh = 36 + 8 + 8 + 2 * 12;
        let second_mesh = first_mesh + 9;
        let first_group = first_mesh
            + i32::from_le_bytes(data[first_mesh + 4..first_mesh + 8].try_into().unwrap()) as usize;
        let relative = (first_group + 1) as i32 - second_mesh as i32;
        data[second_mesh + 4..second_mesh + 8].copy_from_slice(&relative.to_le_bytes());

        match parse_vtx(&data) {
            Err(ErrorKind::MalformedTopology { key, .. }) => assert_eq!(key, vec![0, 0, 0, 1]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truncated_header_is_out_of_bounds() {
        assert!(matches!(
            parse_vtx(&[7, 0, 0, 0]),
            Err(ErrorKind::OutOfBounds {
                file: FileKind::Vtx,
                ..
            })
        ));
    }
}
