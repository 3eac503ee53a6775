//! The `.mdl` studio-model container and the companion streams it links to.
//!
//! A container carries the model name, a texture table and byte ranges for
//! its companions. A companion with a `(0, 0)` range lives in a sibling file
//! named `{base_name}.{ext}` that the caller attaches with
//! [`Mdl::with_companion`] or [`Mdl::load_companions`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use bon::Builder;
use rootcause::Report;
use tracing::{debug, warn};
use variantly::Variantly;
use winnow::Parser;
use winnow::binary::{le_f32, le_i32, le_u8, le_u32};

use crate::data::parser_utils::{
    WResult, fixed_str, parse_at, parse_bytes, parse_records, parse_vec3, read_cstr,
    resolve_relptr, skip, slice_at,
};
use crate::data::wrappers::mmap::MmapCompanionSource;
use crate::data::{ByteSource, CompanionLoader, FileKind, base_name, companion_name};
use crate::error::{ErrorKind, MdlResult};
use crate::models::geometry::{Material, ModelSet};
use crate::models::phy::{Collision, parse_phy};
use crate::models::reconstruct::reconstruct;
use crate::models::vtx::{Topology, parse_vtx};
use crate::models::vvd::{VertexPool, parse_vvd};

/// "IDST" as little-endian u32.
pub const MDL_MAGIC: u32 = u32::from_le_bytes(*b"IDST");
pub const MDL_VERSION: u32 = 53;

const HEADER_SIZE: usize = 476;
const TEXTURE_SIZE: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Where a companion's bytes sit inside the container. `(0, 0)` means the
/// companion is not embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompanionRange {
    pub offset: u32,
    pub length: u32,
}

impl CompanionRange {
    pub fn is_embedded(&self) -> bool {
        (self.offset, self.length) != (0, 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MdlHeader {
    pub magic: u32,
    pub version: u32,
    /// Shared with every companion built alongside this container.
    pub checksum: u32,
    pub name_copy_offset: u32,
    /// Internal name, decoded from a 64-byte NUL-padded field.
    pub name: String,
    /// Declared size of the whole container in bytes.
    pub filesize: u32,
    pub eye_position: [f32; 3],
    pub illumination_position: [f32; 3],
    pub hull: BoundingBox,
    pub view: BoundingBox,
    pub flags: u32,
    pub num_bones: u32,
    pub bone_index: u32,
    pub num_bone_controllers: u32,
    pub bone_controller_index: u32,
    pub num_hitbox_sets: u32,
    pub hitbox_set_index: u32,
    pub num_local_anims: u32,
    pub local_anim_index: u32,
    pub num_local_seqs: u32,
    pub local_seq_index: u32,
    pub activity_list_version: u32,
    pub events_indexed: u32,
    pub num_textures: u32,
    pub texture_index: u32,
    pub num_texture_dirs: u32,
    pub texture_dir_index: u32,
    pub num_skin_refs: u32,
    pub num_skin_families: u32,
    pub skin_index: u32,
    pub num_body_parts: u32,
    pub body_part_index: u32,
    pub num_local_attachments: u32,
    pub local_attachment_index: u32,
    pub num_local_nodes: u32,
    pub local_node_index: u32,
    pub local_node_name_index: u32,
    pub num_ik_chains: u32,
    pub ik_chain_index: u32,
    pub num_local_pose_parameters: u32,
    pub local_pose_param_index: u32,
    pub surfaceprop_index: u32,
    pub keyvalue_index: u32,
    pub keyvalue_size: u32,
    pub num_local_ik_autoplay_locks: u32,
    pub local_ik_autoplay_lock_index: u32,
    pub mass: f32,
    pub contents: u32,
    pub num_include_models: u32,
    pub include_model_index: u32,
    pub anim_block_name_index: u32,
    pub num_anim_blocks: u32,
    pub anim_block_index: u32,
    pub bone_table_by_name_index: u32,
    pub const_directional_light_dot: u8,
    pub root_lod: u8,
    pub num_allowed_root_lods: u8,
    pub fade_distance: f32,
    pub vert_anim_fixed_point_scale: f32,
    pub surfaceprop_lookup: u32,
    pub studiohdr2_index: u32,
    pub source_filename_offset: u32,
    pub vtx: CompanionRange,
    pub vvd: CompanionRange,
    pub vvc: CompanionRange,
    pub phy: CompanionRange,
    /// Repeats `vtx.offset`.
    pub vtx_offset2: u32,
}

impl MdlHeader {
    /// The embedded range for `kind`; the container itself has none.
    pub fn companion(&self, kind: FileKind) -> CompanionRange {
        match kind {
            FileKind::Mdl => CompanionRange::default(),
            FileKind::Vtx => self.vtx,
            FileKind::Vvd => self.vvd,
            FileKind::Vvc => self.vvc,
            FileKind::Phy => self.phy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Texture {
    /// Stream offset of the texture record.
    pub offset: usize,
    /// Offset of the name, relative to the record.
    pub relative_offset: i32,
    pub flags: u32,
    pub used: u32,
    /// Name as stored, separators untouched.
    pub name: String,
}

/// How a companion was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompanionSource {
    Embedded(CompanionRange),
    External,
    Absent,
}

#[derive(Debug, Clone, Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Decode the `.phy` framing when a collision companion is present.
    #[builder(default = true)]
    pub decode_collision: bool,
    /// Rewrite `\` in texture names to `/` when building materials.
    #[builder(default = true)]
    pub normalize_material_paths: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Everything decoded from a container and its companions.
#[derive(Debug)]
pub struct ParsedMdl {
    pub header: MdlHeader,
    pub textures: Vec<Texture>,
    pub surface_prop: Option<String>,
    pub key_values: Option<String>,
    pub companions: BTreeMap<FileKind, CompanionSource>,
    pub topology: Topology,
    pub vertex_pool: VertexPool,
    pub collision: Option<Collision>,
    pub models: ModelSet,
}

#[derive(Debug, Variantly)]
pub enum ParseState {
    Unparsed,
    Parsed(Box<ParsedMdl>),
    /// Parsing stopped; every later call reports this error again.
    Failed(ErrorKind),
}

fn parse_range_pair(input: &mut &[u8]) -> WResult<(u32, u32)> {
    let count = le_u32.parse_next(input)?;
    let index = le_u32.parse_next(input)?;
    Ok((count, index))
}

fn parse_mdl_header(input: &mut &[u8]) -> WResult<MdlHeader> {
    let magic = le_u32.parse_next(input)?;
    let version = le_u32.parse_next(input)?;
    let checksum = le_u32.parse_next(input)?;
    let name_copy_offset = le_u32.parse_next(input)?;
    let name = fixed_str(&parse_bytes::<64>(input)?);
    let filesize = le_u32.parse_next(input)?;

    let eye_position = parse_vec3(input)?;
    let illumination_position = parse_vec3(input)?;
    let hull = BoundingBox {
        min: parse_vec3(input)?,
        max: parse_vec3(input)?,
    };
    let view = BoundingBox {
        min: parse_vec3(input)?,
        max: parse_vec3(input)?,
    };

    let flags = le_u32.parse_next(input)?;
    let (num_bones, bone_index) = parse_range_pair(input)?;
    let (num_bone_controllers, bone_controller_index) = parse_range_pair(input)?;
    let (num_hitbox_sets, hitbox_set_index) = parse_range_pair(input)?;
    let (num_local_anims, local_anim_index) = parse_range_pair(input)?;
    let (num_local_seqs, local_seq_index) = parse_range_pair(input)?;
    let activity_list_version = le_u32.parse_next(input)?;
    let events_indexed = le_u32.parse_next(input)?;
    let (num_textures, texture_index) = parse_range_pair(input)?;
    let (num_texture_dirs, texture_dir_index) = parse_range_pair(input)?;
    let num_skin_refs = le_u32.parse_next(input)?;
    let (num_skin_families, skin_index) = parse_range_pair(input)?;
    let (num_body_parts, body_part_index) = parse_range_pair(input)?;
    let (num_local_attachments, local_attachment_index) = parse_range_pair(input)?;
    let (num_local_nodes, local_node_index) = parse_range_pair(input)?;
    let local_node_name_index = le_u32.parse_next(input)?;
    // deprecated flex descriptors, controllers and rules
    skip(input, 6 * 4)?;
    let (num_ik_chains, ik_chain_index) = parse_range_pair(input)?;
    // deprecated mouths
    skip(input, 2 * 4)?;
    let (num_local_pose_parameters, local_pose_param_index) = parse_range_pair(input)?;
    let surfaceprop_index = le_u32.parse_next(input)?;
    let (keyvalue_index, keyvalue_size) = parse_range_pair(input)?;
    let (num_local_ik_autoplay_locks, local_ik_autoplay_lock_index) = parse_range_pair(input)?;

    let mass = le_f32.parse_next(input)?;
    let contents = le_u32.parse_next(input)?;
    let (num_include_models, include_model_index) = parse_range_pair(input)?;
    // runtime virtual model pointer
    skip(input, 4)?;
    let anim_block_name_index = le_u32.parse_next(input)?;
    let (num_anim_blocks, anim_block_index) = parse_range_pair(input)?;
    // runtime anim block model pointer
    skip(input, 4)?;
    let bone_table_by_name_index = le_u32.parse_next(input)?;
    // runtime vertex and index base pointers
    skip(input, 2 * 4)?;

    let const_directional_light_dot = le_u8.parse_next(input)?;
    let root_lod = le_u8.parse_next(input)?;
    let num_allowed_root_lods = le_u8.parse_next(input)?;
    skip(input, 1)?;
    let fade_distance = le_f32.parse_next(input)?;
    // deprecated flex controller ui
    skip(input, 2 * 4)?;
    let vert_anim_fixed_point_scale = le_f32.parse_next(input)?;

    let surfaceprop_lookup = le_u32.parse_next(input)?;
    let studiohdr2_index = le_u32.parse_next(input)?;
    let source_filename_offset = le_u32.parse_next(input)?;
    skip(input, 4 * 4)?;
    let mut offsets = [0u32; 4];
    for offset in &mut offsets {
        *offset = le_u32.parse_next(input)?;
    }
    let mut lengths = [0u32; 4];
    for length in &mut lengths {
        *length = le_u32.parse_next(input)?;
    }
    let [vtx, vvd, vvc, phy] = [0, 1, 2, 3].map(|i| CompanionRange {
        offset: offsets[i],
        length: lengths[i],
    });
    skip(input, 3 * 4)?;
    let vtx_offset2 = le_u32.parse_next(input)?;

    Ok(MdlHeader {
        magic,
        version,
        checksum,
        name_copy_offset,
        name,
        filesize,
        eye_position,
        illumination_position,
        hull,
        view,
        flags,
        num_bones,
        bone_index,
        num_bone_controllers,
        bone_controller_index,
        num_hitbox_sets,
        hitbox_set_index,
        num_local_anims,
        local_anim_index,
        num_local_seqs,
        local_seq_index,
        activity_list_version,
        events_indexed,
        num_textures,
        texture_index,
        num_texture_dirs,
        texture_dir_index,
        num_skin_refs,
        num_skin_families,
        skin_index,
        num_body_parts,
        body_part_index,
        num_local_attachments,
        local_attachment_index,
        num_local_nodes,
        local_node_index,
        local_node_name_index,
        num_ik_chains,
        ik_chain_index,
        num_local_pose_parameters,
        local_pose_param_index,
        surfaceprop_index,
        keyvalue_index,
        keyvalue_size,
        num_local_ik_autoplay_locks,
        local_ik_autoplay_lock_index,
        mass,
        contents,
        num_include_models,
        include_model_index,
        anim_block_name_index,
        num_anim_blocks,
        anim_block_index,
        bone_table_by_name_index,
        const_directional_light_dot,
        root_lod,
        num_allowed_root_lods,
        fade_distance,
        vert_anim_fixed_point_scale,
        surfaceprop_lookup,
        studiohdr2_index,
        source_filename_offset,
        vtx,
        vvd,
        vvc,
        phy,
        vtx_offset2,
    })
}

/// Decode and validate the fixed container header.
pub fn parse_header(data: &[u8]) -> Result<MdlHeader, ErrorKind> {
    let header = parse_at(data, FileKind::Mdl, 0, HEADER_SIZE, parse_mdl_header)?;
    if header.magic != MDL_MAGIC {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Mdl,
            field: "magic",
            expected: MDL_MAGIC,
            actual: header.magic,
        });
    }
    if header.version != MDL_VERSION {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Mdl,
            field: "version",
            expected: MDL_VERSION,
            actual: header.version,
        });
    }
    Ok(header)
}

fn parse_texture_record(input: &mut &[u8]) -> WResult<(i32, u32, u32)> {
    let relative_offset = le_i32.parse_next(input)?;
    let flags = le_u32.parse_next(input)?;
    let used = le_u32.parse_next(input)?;
    skip(input, 8 * 4)?;
    Ok((relative_offset, flags, used))
}

/// Read the texture table: every record first, then each record's name.
pub fn parse_textures(data: &[u8], header: &MdlHeader) -> Result<Vec<Texture>, ErrorKind> {
    let records = parse_records(
        data,
        FileKind::Mdl,
        header.texture_index as usize,
        header.num_textures as usize,
        TEXTURE_SIZE,
        parse_texture_record,
    )?;

    records
        .into_iter()
        .map(|(offset, (relative_offset, flags, used))| {
            let name_at = resolve_relptr(offset, i64::from(relative_offset)).ok_or_else(|| {
                ErrorKind::Decode {
                    file: FileKind::Mdl,
                    offset,
                    detail: format!("texture name offset {relative_offset} points before the stream"),
                }
            })?;
            Ok(Texture {
                offset,
                relative_offset,
                flags,
                used,
                name: read_cstr(data, FileKind::Mdl, name_at)?,
            })
        })
        .collect()
}

/// A studio-model container plus whatever external companions were attached.
pub struct Mdl<'a> {
    filename: String,
    base_name: String,
    data: ByteSource<'a>,
    external: BTreeMap<FileKind, ByteSource<'a>>,
    options: ParseOptions,
    state: ParseState,
}

impl Mdl<'static> {
    /// Map `path` and every sibling companion the container does not embed.
    pub fn open(path: impl AsRef<Path>) -> MdlResult<Mdl<'static>> {
        let path = path.as_ref();
        let filename = path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
            Report::new(ErrorKind::Loader {
                path: path.display().to_string(),
                detail: "path does not name a file".to_string(),
            })
        })?;
        let source = MmapCompanionSource::new(path.parent().unwrap_or_else(|| Path::new(".")));
        let data = source.get(filename).map_err(Report::new)?.ok_or_else(|| {
            Report::new(ErrorKind::io(
                path.display().to_string(),
                std::io::ErrorKind::NotFound.into(),
            ))
        })?;

        let mut mdl = Mdl::new(filename, data);
        mdl.load_companions(&source)?;
        Ok(mdl)
    }
}

impl<'a> Mdl<'a> {
    pub fn new(filename: impl Into<String>, data: impl Into<ByteSource<'a>>) -> Self {
        let filename = filename.into();
        Self {
            base_name: base_name(&filename),
            filename,
            data: data.into(),
            external: BTreeMap::new(),
            options: ParseOptions::default(),
            state: ParseState::Unparsed,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach an externally resolved companion stream.
    pub fn with_companion(mut self, kind: FileKind, data: impl Into<ByteSource<'a>>) -> Self {
        self.external.insert(kind, data.into());
        self
    }

    /// Ask `loader` for `{base_name}.{ext}` for every companion the container
    /// does not embed and that has not been attached yet.
    pub fn load_companions(&mut self, loader: &impl CompanionLoader) -> MdlResult<()> {
        let header = parse_header(&self.data).map_err(Report::new)?;
        for kind in FileKind::COMPANIONS {
            if header.companion(kind).is_embedded() || self.external.contains_key(&kind) {
                continue;
            }
            let name = companion_name(&self.base_name, kind);
            if let Some(data) = loader.get(&name).map_err(Report::new)? {
                debug!("{}: loaded {name} ({} bytes)", self.filename, data.len());
                self.external.insert(kind, data);
            }
        }
        Ok(())
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Bytes of one companion, embedded or attached.
    pub fn resolve_companion(&self, kind: FileKind) -> MdlResult<Option<&[u8]>> {
        let header = parse_header(&self.data).map_err(Report::new)?;
        let (_, data) = self.companion(&header, kind).map_err(Report::new)?;
        Ok(data)
    }

    fn companion(
        &self,
        header: &MdlHeader,
        kind: FileKind,
    ) -> Result<(CompanionSource, Option<&[u8]>), ErrorKind> {
        let range = header.companion(kind);
        if range.is_embedded() {
            if self.external.contains_key(&kind) {
                debug!("{}: embedded {kind} takes precedence over the attached one", self.filename);
            }
            let data = slice_at(&self.data, FileKind::Mdl, range.offset as usize, range.length as usize)?;
            return Ok((CompanionSource::Embedded(range), Some(data)));
        }
        match self.external.get(&kind) {
            Some(data) => Ok((CompanionSource::External, Some(&data[..]))),
            None if kind.is_mandatory() => Err(ErrorKind::MissingCompanion {
                file: kind,
                expected_name: companion_name(&self.base_name, kind),
            }),
            None => Ok((CompanionSource::Absent, None)),
        }
    }

    fn decode(&self) -> Result<ParsedMdl, ErrorKind> {
        let data: &[u8] = &self.data;
        let header = parse_header(data)?;
        if header.filesize as usize != data.len() {
            return Err(ErrorKind::SizeMismatch {
                file: FileKind::Mdl,
                declared: header.filesize as usize,
                actual: data.len(),
            });
        }
        debug!(
            "{}: \"{}\" checksum 0x{:08X}, {} textures",
            self.filename, header.name, header.checksum, header.num_textures
        );

        let textures = parse_textures(data, &header)?;
        let surface_prop = match header.surfaceprop_index {
            0 => None,
            offset => Some(read_cstr(data, FileKind::Mdl, offset as usize)?),
        };
        let key_values = match header.keyvalue_size {
            0 => None,
            size => Some(fixed_str(slice_at(
                data,
                FileKind::Mdl,
                header.keyvalue_index as usize,
                size as usize,
            )?)),
        };

        if header.vtx.is_embedded() && header.vtx_offset2 != header.vtx.offset {
            warn!(
                "{}: duplicate vtx offset 0x{:X} disagrees with 0x{:X}",
                self.filename, header.vtx_offset2, header.vtx.offset
            );
        }

        let mut companions = BTreeMap::new();
        let mut streams = BTreeMap::new();
        for kind in FileKind::COMPANIONS {
            let (source, stream) = self.companion(&header, kind)?;
            debug!("{}: {kind} {source:?}", self.filename);
            companions.insert(kind, source);
            if let Some(stream) = stream {
                streams.insert(kind, stream);
            }
        }

        let check = |file: FileKind, companion: u32| {
            if companion == header.checksum {
                Ok(())
            } else {
                Err(ErrorKind::ChecksumMismatch {
                    file,
                    container: header.checksum,
                    companion,
                })
            }
        };

        // both present, or `companion` would have failed
        let topology = parse_vtx(streams.get(&FileKind::Vtx).copied().unwrap_or_default())?;
        check(FileKind::Vtx, topology.checksum())?;
        let vertex_pool = parse_vvd(streams.get(&FileKind::Vvd).copied().unwrap_or_default())?;
        check(FileKind::Vvd, vertex_pool.checksum())?;

        let collision = match streams.get(&FileKind::Phy) {
            Some(stream) if self.options.decode_collision => {
                let collision = parse_phy(stream)?;
                check(FileKind::Phy, collision.checksum())?;
                Some(collision)
            }
            _ => None,
        };

        let materials: Vec<Material> = textures
            .iter()
            .map(|texture| {
                if self.options.normalize_material_paths {
                    Material::normalized(&texture.name)
                } else {
                    Material::new(texture.name.clone())
                }
            })
            .collect();
        let models = reconstruct(&self.base_name, &materials, &topology, &vertex_pool)?;

        Ok(ParsedMdl {
            header,
            textures,
            surface_prop,
            key_values,
            companions,
            topology,
            vertex_pool,
            collision,
            models,
        })
    }

    /// Decode the container, its companions and every detail level.
    ///
    /// Runs once; later calls return the cached result or the same error.
    pub fn parse(&mut self) -> MdlResult<&ParsedMdl> {
        if self.state.is_unparsed() {
            self.state = match self.decode() {
                Ok(parsed) => ParseState::Parsed(Box::new(parsed)),
                Err(kind) => {
                    debug!("{}: {kind}", self.filename);
                    ParseState::Failed(kind)
                }
            };
        }
        match &self.state {
            ParseState::Parsed(parsed) => Ok(&**parsed),
            ParseState::Failed(kind) => Err(Report::new(kind.clone())),
            ParseState::Unparsed => unreachable!("parse state resolved above"),
        }
    }

    /// The reconstructed detail levels, parsing first if needed.
    pub fn models(&mut self) -> MdlResult<&ModelSet> {
        self.parse().map(|parsed| &parsed.models)
    }

    fn parsed(&self) -> Option<&ParsedMdl> {
        match &self.state {
            ParseState::Parsed(parsed) => Some(&**parsed),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<&MdlHeader> {
        self.parsed().map(|parsed| &parsed.header)
    }

    pub fn textures(&self) -> Option<&[Texture]> {
        self.parsed().map(|parsed| parsed.textures.as_slice())
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.parsed().map(|parsed| &parsed.topology)
    }

    pub fn vertex_pool(&self) -> Option<&VertexPool> {
        self.parsed().map(|parsed| &parsed.vertex_pool)
    }

    pub fn collision(&self) -> Option<&Collision> {
        self.parsed().and_then(|parsed| parsed.collision.as_ref())
    }
}

impl fmt::Display for Mdl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parsed() {
            Some(parsed) => write!(f, "\"{}\" {} models", parsed.header.name, parsed.models.len()),
            None => write!(f, "\"{}\" 0 models", self.filename),
        }
    }
}
