//! Renderable output of mesh reconstruction.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// A reconstructed vertex; skinning data is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// One triangle: indices into the owning [`Model::vertices`] and the
/// vertices they resolve to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub indices: [usize; 3],
    pub vertices: [Vertex; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Texture path, `/`-separated.
    pub path: String,
}

impl Material {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Material with backslash separators rewritten to `/`.
    pub fn normalized(path: &str) -> Self {
        Self::new(path.replace('\\', "/"))
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mesh {
    pub material: Material,
    pub polygons: Vec<Polygon>,
}

/// All meshes of one detail level over a shared vertex list.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model {
    pub vertices: Vec<Vertex>,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn polygon_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.polygons.len()).sum()
    }
}

/// Named models, ordered by name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelSet {
    models: BTreeMap<String, Model>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, model: Model) -> Option<Model> {
        self.models.insert(name.into(), model)
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Model> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelSet {
    type Item = (&'a String, &'a Model);
    type IntoIter = btree_map::Iter<'a, String, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

impl IntoIterator for ModelSet {
    type Item = (String, Model);
    type IntoIter = btree_map::IntoIter<String, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.into_iter()
    }
}
