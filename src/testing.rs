//! Synthetic byte streams for the model family parsers.
//!
//! Each fixture lays its records out the way the real tools do (children
//! after parents, offsets relative to the owning record) and patches the
//! offsets once the child positions are known.

use crate::data::FileKind;

#[derive(Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    /// Reserve a 32-bit slot to patch later.
    pub fn placeholder(&mut self) -> usize {
        let at = self.pos();
        self.u32(0);
        at
    }

    pub fn patch(&mut self, at: usize, v: u32) {
        self.buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// Patch `at` with the offset of `target` relative to `base`.
    pub fn patch_rel(&mut self, at: usize, base: usize, target: usize) {
        let rel = (target as i64 - base as i64) as i32;
        self.buf[at..at + 4].copy_from_slice(&rel.to_le_bytes());
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Attributes of pool vertex `k`, so tests can predict reconstructed output.
pub(crate) fn pool_vertex(k: usize) -> ([f32; 3], [f32; 3], [f32; 2]) {
    let k = k as f32;
    ([k, k + 0.5, -k], [0.0, 0.0, 1.0], [k / 10.0, 0.5])
}

pub(crate) struct VvdFixture {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: u32,
    pub level_counts: Vec<u32>,
    pub num_lods: Option<u32>,
    pub fixups: Vec<(i32, u32, u32)>,
}

impl VvdFixture {
    pub fn new(checksum: u32, level_counts: &[u32]) -> Self {
        Self {
            magic: *b"IDSV",
            version: 4,
            checksum,
            level_counts: level_counts.to_vec(),
            num_lods: None,
            fixups: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let num_vertices = self.level_counts.first().copied().unwrap_or(0) as usize;
        let fixup_offset = 64;
        let vertex_offset = fixup_offset + self.fixups.len() * 12;

        let mut w = Writer::default();
        w.bytes(&self.magic);
        w.u32(self.version);
        w.u32(self.checksum);
        w.u32(self.num_lods.unwrap_or(self.level_counts.len() as u32));
        for level in 0..8 {
            w.u32(self.level_counts.get(level).copied().unwrap_or(0));
        }
        w.u32(self.fixups.len() as u32);
        w.u32(if self.fixups.is_empty() { 0 } else { fixup_offset as u32 });
        w.u32(vertex_offset as u32);
        w.u32(0);
        assert_eq!(w.pos(), 64);

        for &(lod, source_vertex_id, count) in &self.fixups {
            w.i32(lod);
            w.u32(source_vertex_id);
            w.u32(count);
        }
        for k in 0..num_vertices {
            let (position, normal, uv) = pool_vertex(k);
            w.f32(1.0);
            w.f32(0.0);
            w.f32(0.0);
            w.bytes(&[k as u8, 0, 0]);
            w.u8(1);
            position.iter().chain(&normal).chain(&uv).for_each(|&v| w.f32(v));
        }
        w.finish()
    }
}

/// One strip group: its local vertex pool (as `vvd_index` values), its
/// local index pool, and the vertex count of each strip.
#[derive(Clone)]
pub(crate) struct StripGroupFixture {
    pub vvd_indices: Vec<u16>,
    pub indices: Vec<u16>,
    pub strip_vertex_counts: Vec<u32>,
}

impl StripGroupFixture {
    /// A single triangle over `vvd_indices`, drawn by one strip.
    pub fn triangle(vvd_indices: [u16; 3]) -> Self {
        Self {
            vvd_indices: vvd_indices.to_vec(),
            indices: vec![0, 1, 2],
            strip_vertex_counts: vec![3],
        }
    }
}

pub(crate) struct VtxFixture {
    pub version: u32,
    pub checksum: u32,
    /// Body parts after the first; these carry no models.
    pub extra_body_parts: u32,
    /// `lods[i][j]` is mesh `j` at level `i`; `None` is a mesh with no strip groups.
    pub lods: Vec<Vec<Option<StripGroupFixture>>>,
}

impl VtxFixture {
    pub fn new(checksum: u32, lods: Vec<Vec<Option<StripGroupFixture>>>) -> Self {
        Self {
            version: 7,
            checksum,
            extra_body_parts: 0,
            lods,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u32(self.version);
        w.u32(24);
        w.u16(53);
        w.u16(9);
        w.u32(3);
        w.u32(self.checksum);
        w.u32(self.lods.len() as u32);
        w.u32(0);
        w.u32(1 + self.extra_body_parts);
        let body_part_ptr = w.placeholder();
        assert_eq!(w.pos(), 36);

        let body_part = w.pos();
        w.patch_rel(body_part_ptr, 0, body_part);
        w.u32(1);
        let model_ptr = w.placeholder();
        for _ in 0..self.extra_body_parts {
            w.u32(0);
            w.u32(0);
        }

        let model = w.pos();
        w.patch_rel(model_ptr, body_part, model);
        w.u32(self.lods.len() as u32);
        let lod_ptr = w.placeholder();

        let lods_start = w.pos();
        w.patch_rel(lod_ptr, model, lods_start);
        let mut lod_slots = Vec::new();
        for (i, meshes) in self.lods.iter().enumerate() {
            let at = w.pos();
            w.u32(meshes.len() as u32);
            let ptr = w.placeholder();
            w.f32(i as f32 * 12.0);
            lod_slots.push((at, ptr, meshes));
        }

        let mut mesh_slots = Vec::new();
        for (lod, ptr, meshes) in lod_slots {
            let start = w.pos();
            w.patch_rel(ptr, lod, start);
            for mesh in meshes {
                let at = w.pos();
                w.u32(u32::from(mesh.is_some()));
                let ptr = w.placeholder();
                w.u8(0);
                mesh_slots.push((at, ptr, mesh));
            }
        }

        let mut group_slots = Vec::new();
        for (mesh, ptr, group) in mesh_slots {
            let start = w.pos();
            w.patch_rel(ptr, mesh, start);
            if let Some(group) = group {
                let at = w.pos();
                w.u32(group.vvd_indices.len() as u32);
                let vertex_ptr = w.placeholder();
                w.u32(group.indices.len() as u32);
                let index_ptr = w.placeholder();
                w.u32(group.strip_vertex_counts.len() as u32);
                let strip_ptr = w.placeholder();
                w.u8(0);
                group_slots.push((at, vertex_ptr, index_ptr, strip_ptr, group));
            }
        }

        for (group_at, vertex_ptr, index_ptr, strip_ptr, group) in group_slots {
            let strips = w.pos();
            w.patch_rel(strip_ptr, group_at, strips);
            for &count in &group.strip_vertex_counts {
                w.u32(group.indices.len() as u32);
                w.u32(0);
                w.u32(count);
                w.u32(0);
                w.i16(3);
                w.u8(0x01);
                w.u32(0);
                w.u32(0);
            }

            let vertices = w.pos();
            w.patch_rel(vertex_ptr, group_at, vertices);
            for &vvd_index in &group.vvd_indices {
                w.bytes(&[0, 0, 0]);
                w.u8(1);
                w.u16(vvd_index);
                w.bytes(&[0, 0, 0]);
            }

            let indices = w.pos();
            w.patch_rel(index_ptr, group_at, indices);
            for &index in &group.indices {
                w.u16(index);
            }
        }
        w.finish()
    }
}

pub(crate) struct PhyFixture {
    pub header_size: u32,
    pub checksum: u32,
    pub solids: usize,
    pub surface_magic: [u8; 4],
    pub legacy_magic: [u8; 4],
}

impl PhyFixture {
    pub fn new(checksum: u32, solids: usize) -> Self {
        Self {
            header_size: 16,
            checksum,
            solids,
            surface_magic: *b"VPHY",
            legacy_magic: *b"IVPS",
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u32(self.header_size);
        w.u32(0);
        w.u32(self.solids as u32);
        w.u32(self.checksum);
        for i in 0..self.solids {
            // surface header; `size` counts the bytes after itself
            w.u32(32 + 52 - 4);
            w.bytes(&self.surface_magic);
            w.u16(0x100);
            w.u16(0);
            w.u32(0);
            [1.0, 2.0, 3.0].iter().for_each(|&v| w.f32(v));
            w.u32(0);
            // legacy header
            w.u32(0);
            [0.0, 0.0, i as f32].iter().for_each(|&v| w.f32(v));
            [1.0, 1.0, 1.0].iter().for_each(|&v| w.f32(v));
            w.f32(4.0);
            w.u32(5 | (64 << 8));
            w.u32(0);
            w.u32(0);
            w.bytes(&self.legacy_magic);
            w.u32(0);
        }
        w.finish()
    }
}

pub(crate) const MDL_HEADER_SIZE: usize = 476;

pub(crate) struct MdlFixture {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: u32,
    pub name: String,
    pub textures: Vec<String>,
    pub surface_prop: Option<String>,
    pub vtx: Option<Vec<u8>>,
    pub vvd: Option<Vec<u8>>,
    pub phy: Option<Vec<u8>>,
    pub size_delta: i64,
}

impl MdlFixture {
    pub fn new(checksum: u32, textures: &[&str]) -> Self {
        Self {
            magic: *b"IDST",
            version: 53,
            checksum,
            name: "props/crate.mdl".to_string(),
            textures: textures.iter().map(|t| t.to_string()).collect(),
            surface_prop: None,
            vtx: None,
            vvd: None,
            phy: None,
            size_delta: 0,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.zeros(MDL_HEADER_SIZE);
        w.buf[0..4].copy_from_slice(&self.magic);
        w.patch(4, self.version);
        w.patch(8, self.checksum);
        let name = self.name.as_bytes();
        w.buf[16..16 + name.len()].copy_from_slice(name);
        // hull box
        w.buf[108..112].copy_from_slice(&(-1.0f32).to_le_bytes());
        w.buf[120..124].copy_from_slice(&1.0f32.to_le_bytes());
        w.patch(208, self.textures.len() as u32);
        w.patch(212, MDL_HEADER_SIZE as u32);

        let mut records = Vec::new();
        for _ in &self.textures {
            let at = w.pos();
            w.u32(0);
            w.u32(0);
            w.u32(1);
            w.zeros(32);
            records.push(at);
        }
        for (texture, at) in self.textures.iter().zip(records) {
            let text = w.pos();
            w.patch_rel(at, at, text);
            w.bytes(texture.as_bytes());
            w.u8(0);
        }
        if let Some(prop) = &self.surface_prop {
            let text = w.pos();
            w.patch(312, text as u32);
            w.bytes(prop.as_bytes());
            w.u8(0);
        }

        let companions = [
            (FileKind::Vtx, &self.vtx, 428, 444),
            (FileKind::Vvd, &self.vvd, 432, 448),
            (FileKind::Phy, &self.phy, 440, 456),
        ];
        for (kind, data, offset_at, length_at) in companions {
            if let Some(data) = data {
                let at = w.pos();
                w.patch(offset_at, at as u32);
                w.patch(length_at, data.len() as u32);
                if kind == FileKind::Vtx {
                    w.patch(472, at as u32);
                }
                w.bytes(data);
            }
        }

        let size = (w.pos() as i64 + self.size_delta) as u32;
        w.patch(80, size);
        w.finish()
    }
}
