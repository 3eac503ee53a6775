//! Rebuilds per-level triangle meshes from a decoded topology and vertex pool.
//!
//! Each detail level becomes one [`Model`]. Mesh `j` of a level is drawn with
//! material `j`, through the first strip group of body part 0 / model 0. The
//! strip group's index pool is a plain triangle list over its local vertex
//! pool, whose `vvd_index` values are relative to the mesh's first vertex in
//! the level's vertex list.

use itertools::Itertools;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::models::geometry::{Material, Mesh, Model, ModelSet, Polygon, Vertex};
use crate::models::vtx::{ChildKey, NodeKey, StripGroupKey, Topology, TopologyVertex};
use crate::models::vvd::{PoolVertex, VertexPool};

/// Name of the model holding detail level `level`.
pub fn level_name(base_name: &str, level: usize) -> String {
    format!("{base_name}.lod{level}")
}

fn to_vertex(vertex: &PoolVertex) -> Vertex {
    Vertex {
        position: vertex.position,
        normal: vertex.normal,
        uv: vertex.uv,
    }
}

/// Context needed to turn one local index into a level vertex.
struct Resolver<'a> {
    key: StripGroupKey,
    local: &'a [TopologyVertex],
    vertices: &'a [Vertex],
    base: usize,
}

impl Resolver<'_> {
    fn malformed(&self, reason: String) -> ErrorKind {
        ErrorKind::MalformedTopology {
            key: self.key.to_vec(),
            reason,
        }
    }

    fn resolve(&self, index: u16) -> Result<usize, ErrorKind> {
        let local = self.local.get(usize::from(index)).ok_or_else(|| {
            self.malformed(format!(
                "index {index} outside the {} entry local vertex pool",
                self.local.len()
            ))
        })?;
        let global = usize::from(local.vvd_index) + self.base;
        if global >= self.vertices.len() {
            return Err(self.malformed(format!(
                "vertex {global} ({} + {}) outside the {} vertex level",
                local.vvd_index,
                self.base,
                self.vertices.len()
            )));
        }
        Ok(global)
    }

    fn polygon(&self, (a, b, c): (&u16, &u16, &u16)) -> Result<Polygon, ErrorKind> {
        let indices = [self.resolve(*a)?, self.resolve(*b)?, self.resolve(*c)?];
        Ok(Polygon {
            indices,
            vertices: indices.map(|i| self.vertices[i]),
        })
    }
}

fn reconstruct_level(
    level: usize,
    vertices: Vec<Vertex>,
    materials: &[Material],
    topology: &Topology,
) -> Result<Model, ErrorKind> {
    let mut meshes = Vec::new();
    let mut base = 0usize;

    for (mesh, material) in materials.iter().enumerate() {
        let key: StripGroupKey = NodeKey([0, 0, level, mesh, 0]);
        if !topology.strip_groups.contains_key(&key) {
            continue;
        }

        let local = topology.vertices.get(&key).map_or(&[][..], Vec::as_slice);
        let indices = topology.indices.get(&key).map_or(&[][..], Vec::as_slice);
        if indices.len() % 3 != 0 {
            return Err(ErrorKind::MalformedTopology {
                key: key.to_vec(),
                reason: format!("{} indices do not form whole triangles", indices.len()),
            });
        }

        let resolver = Resolver {
            key,
            local,
            vertices: &vertices,
            base,
        };
        let polygons = indices
            .iter()
            .tuples()
            .map(|triangle| resolver.polygon(triangle))
            .collect::<Result<Vec<_>, _>>()?;
        meshes.push(Mesh {
            material: material.clone(),
            polygons,
        });

        match topology.strips.get(&key.child(0)) {
            Some(strip) => base += strip.num_vertices as usize,
            None => warn!("strip group {key} has no strips; next mesh starts at vertex {base}"),
        }
    }

    Ok(Model { vertices, meshes })
}

/// Build one model per detail level of `pool`.
///
/// `materials` are in texture-table order; mesh `j` of every level uses
/// material `j`, and meshes beyond the material list are not drawn.
pub fn reconstruct(
    base_name: &str,
    materials: &[Material],
    topology: &Topology,
    pool: &VertexPool,
) -> Result<ModelSet, ErrorKind> {
    let mut models = ModelSet::new();
    for level in 0..pool.num_levels() {
        let vertices: Vec<Vertex> = pool
            .level(level)
            .unwrap_or(&pool.vertices)
            .iter()
            .map(to_vertex)
            .collect();
        let model = reconstruct_level(level, vertices, materials, topology)?;
        debug!(
            "{}: {} vertices, {} meshes, {} polygons",
            level_name(base_name, level),
            model.vertices.len(),
            model.meshes.len(),
            model.polygon_count()
        );
        models.insert(level_name(base_name, level), model);
    }
    Ok(models)
}
