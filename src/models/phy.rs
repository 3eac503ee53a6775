//! Framing of `.phy` collision solids.
//!
//! Only the per-solid headers are decoded; the compact-surface payload that
//! follows them is left untouched.

use std::fmt;

use tracing::{debug, warn};
use winnow::Parser;
use winnow::binary::{le_f32, le_u16, le_u32};

use crate::data::FileKind;
use crate::data::parser_utils::{WResult, parse_at, parse_bytes, parse_vec3};
use crate::error::ErrorKind;
use crate::recognized::Recognized;

pub const PHY_HEADER_SIZE: u32 = 16;
pub const SURFACE_MAGIC: [u8; 4] = *b"VPHY";
pub const LEGACY_MAGIC: [u8; 4] = *b"IVPS";

const HEADER_SIZE: usize = 16;
const SURFACE_HEADER_SIZE: usize = 32;
const LEGACY_HEADER_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhyHeader {
    /// Always 16.
    pub size: u32,
    pub unknown: u32,
    pub num_solids: u32,
    /// Must match the container checksum.
    pub checksum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelType {
    IvpCompactSurface,
    Mopp,
    Ball,
    Virtual,
}

impl ModelType {
    fn from_raw(raw: u16) -> Recognized<ModelType, u16> {
        match raw {
            0 => ModelType::IvpCompactSurface.into(),
            1 => ModelType::Mopp.into(),
            2 => ModelType::Ball.into(),
            3 => ModelType::Virtual.into(),
            other => Recognized::Unknown(other),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelType::IvpCompactSurface => "ivp compact surface",
            ModelType::Mopp => "mopp",
            ModelType::Ball => "ball",
            ModelType::Virtual => "virtual",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceHeader {
    /// Byte length of the solid, not counting this field.
    pub size: u32,
    pub magic: [u8; 4],
    pub version: u16,
    pub model_type: Recognized<ModelType, u16>,
    pub surface_size: u32,
    pub drag_axis_areas: [f32; 3],
    pub axis_map_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyHeader {
    pub size: u32,
    pub center_of_mass: [f32; 3],
    pub rotation_inertia: [f32; 3],
    pub upper_limit_radius: f32,
    /// Low 8 bits.
    pub max_deviation: u8,
    /// High 24 bits.
    pub byte_size: u32,
    pub offset_ledgetree_root: u32,
    pub unknown_1: u32,
    /// `IVPS`, or zeroed by some exporters.
    pub magic: [u8; 4],
    pub unknown_2: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solid {
    /// Stream offset of the solid's surface header.
    pub offset: usize,
    pub surface: SurfaceHeader,
    pub legacy: LegacyHeader,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collision {
    pub header: PhyHeader,
    pub solids: Vec<Solid>,
}

impl Collision {
    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }
}

fn parse_phy_header(input: &mut &[u8]) -> WResult<PhyHeader> {
    let size = le_u32.parse_next(input)?;
    let unknown = le_u32.parse_next(input)?;
    let num_solids = le_u32.parse_next(input)?;
    let checksum = le_u32.parse_next(input)?;
    Ok(PhyHeader {
        size,
        unknown,
        num_solids,
        checksum,
    })
}

fn parse_surface_header(input: &mut &[u8]) -> WResult<SurfaceHeader> {
    let size = le_u32.parse_next(input)?;
    let magic = parse_bytes::<4>(input)?;
    let version = le_u16.parse_next(input)?;
    let model_type = ModelType::from_raw(le_u16.parse_next(input)?);
    let surface_size = le_u32.parse_next(input)?;
    let drag_axis_areas = parse_vec3(input)?;
    let axis_map_size = le_u32.parse_next(input)?;
    Ok(SurfaceHeader {
        size,
        magic,
        version,
        model_type,
        surface_size,
        drag_axis_areas,
        axis_map_size,
    })
}

fn parse_legacy_header(input: &mut &[u8]) -> WResult<LegacyHeader> {
    let size = le_u32.parse_next(input)?;
    let center_of_mass = parse_vec3(input)?;
    let rotation_inertia = parse_vec3(input)?;
    let upper_limit_radius = le_f32.parse_next(input)?;
    let bitfield = le_u32.parse_next(input)?;
    let offset_ledgetree_root = le_u32.parse_next(input)?;
    let unknown_1 = le_u32.parse_next(input)?;
    let magic = parse_bytes::<4>(input)?;
    let unknown_2 = le_u32.parse_next(input)?;
    Ok(LegacyHeader {
        size,
        center_of_mass,
        rotation_inertia,
        upper_limit_radius,
        max_deviation: (bitfield & 0xFF) as u8,
        byte_size: bitfield >> 8,
        offset_ledgetree_root,
        unknown_1,
        magic,
        unknown_2,
    })
}

fn magic_mismatch(field: &'static str, expected: [u8; 4], actual: [u8; 4]) -> ErrorKind {
    ErrorKind::FormatMismatch {
        file: FileKind::Phy,
        field,
        expected: u32::from_le_bytes(expected),
        actual: u32::from_le_bytes(actual),
    }
}

/// Parse the header and solid framing of a `.phy` stream.
pub fn parse_phy(data: &[u8]) -> Result<Collision, ErrorKind> {
    let header = parse_at(data, FileKind::Phy, 0, HEADER_SIZE, parse_phy_header)?;
    if header.size != PHY_HEADER_SIZE {
        return Err(ErrorKind::FormatMismatch {
            file: FileKind::Phy,
            field: "header size",
            expected: PHY_HEADER_SIZE,
            actual: header.size,
        });
    }

    let mut solids = Vec::with_capacity(header.num_solids.min(64) as usize);
    let mut offset = HEADER_SIZE;
    for _ in 0..header.num_solids {
        let surface = parse_at(data, FileKind::Phy, offset, SURFACE_HEADER_SIZE, parse_surface_header)?;
        if surface.magic != SURFACE_MAGIC {
            return Err(magic_mismatch("surface magic", SURFACE_MAGIC, surface.magic));
        }
        let legacy = parse_at(
            data,
            FileKind::Phy,
            offset + SURFACE_HEADER_SIZE,
            LEGACY_HEADER_SIZE,
            parse_legacy_header,
        )?;
        if legacy.magic != LEGACY_MAGIC && legacy.magic != [0; 4] {
            return Err(magic_mismatch("legacy surface magic", LEGACY_MAGIC, legacy.magic));
        }
        if surface.model_type.is_unknown() {
            warn!("phy solid at 0x{offset:X} has model type {}", surface.model_type);
        }
        solids.push(Solid {
            offset,
            surface,
            legacy,
        });
        offset = offset.saturating_add(4).saturating_add(surface.size as usize);
    }

    debug!("phy: {} solids", solids.len());

    Ok(Collision { header, solids })
}
