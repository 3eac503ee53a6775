/// Reconstructed, renderable geometry
pub mod geometry;
/// `.mdl` container header, texture table and companion resolution
pub mod mdl;
/// `.phy` collision solid framing
pub mod phy;
/// Per-level mesh reconstruction from topology and vertex pool
pub mod reconstruct;
/// `.vtx` render-mesh topology
pub mod vtx;
/// `.vvd` render-mesh vertex pool
pub mod vvd;
