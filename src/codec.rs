//! Tile record codec
//!
//! A cell is one 32-bit word:
//! - bits 16-31: height (signed 16-bit)
//! - bits 8-15: tile type id
//! - bits 0-7: data byte, interpreted by tile type
//!
//! Heights are never clamped. Very large magnitudes are stored as given even
//! though game servers are known to misbehave on them.

use bytemuck::{Pod, Zeroable};

use crate::tiles::{FlowerType, FoliageAge, GrassKind, GrowthStage, GrowthTreeStage, TileType};

/// Packed terrain record.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Cell(pub u32);

impl Cell {
    pub const fn new(height: i16, tile: TileType, data: u8) -> Self {
        encode(height, tile.id(), data)
    }

    pub const fn height(self) -> i16 {
        decode_height(self)
    }

    pub const fn type_id(self) -> u8 {
        decode_type(self)
    }

    pub const fn data(self) -> u8 {
        decode_data(self)
    }

    /// Decoded tile type, `None` if the stored id is unassigned.
    pub fn tile(self) -> Option<TileType> {
        TileType::from_id(self.type_id())
    }

    pub const fn with_height(self, height: i16) -> Self {
        encode(height, self.type_id(), self.data())
    }

    pub const fn with_data(self, data: u8) -> Self {
        encode(self.height(), self.type_id(), data)
    }
}

pub const fn encode(height: i16, type_id: u8, data: u8) -> Cell {
    Cell(((height as u16 as u32) << 16) | ((type_id as u32) << 8) | data as u32)
}

pub const fn decode_height(cell: Cell) -> i16 {
    (cell.0 >> 16) as u16 as i16
}

pub const fn decode_type(cell: Cell) -> u8 {
    (cell.0 >> 8) as u8
}

pub const fn decode_data(cell: Cell) -> u8 {
    cell.0 as u8
}

// Foliage byte: bits 0-1 grass stage, bit 2 center, bit 3 fruit, bits 4-7 age.
const FOLIAGE_CENTER_BIT: u8 = 1 << 2;
const FOLIAGE_FRUIT_BIT: u8 = 1 << 3;
const FOLIAGE_AGE_SHIFT: u8 = 4;

pub const fn encode_foliage_data(
    age: FoliageAge,
    center: bool,
    fruit: bool,
    grass_stage: GrowthTreeStage,
) -> u8 {
    let mut data = (age.code() << FOLIAGE_AGE_SHIFT) | grass_stage.code();
    if center {
        data |= FOLIAGE_CENTER_BIT;
    }
    if fruit {
        data |= FOLIAGE_FRUIT_BIT;
    }
    data
}

pub const fn decode_foliage_age(data: u8) -> FoliageAge {
    FoliageAge::from_code(data >> FOLIAGE_AGE_SHIFT)
}

pub const fn decode_foliage_center(data: u8) -> bool {
    data & FOLIAGE_CENTER_BIT != 0
}

pub const fn decode_foliage_fruit(data: u8) -> bool {
    data & FOLIAGE_FRUIT_BIT != 0
}

pub const fn decode_foliage_grass_stage(data: u8) -> GrowthTreeStage {
    GrowthTreeStage::from_code(data)
}

/// Unpacked tree/bush data byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoliageData {
    pub age: FoliageAge,
    pub center: bool,
    pub fruit: bool,
    pub grass_stage: GrowthTreeStage,
}

impl FoliageData {
    pub const fn decode(data: u8) -> Self {
        Self {
            age: decode_foliage_age(data),
            center: decode_foliage_center(data),
            fruit: decode_foliage_fruit(data),
            grass_stage: decode_foliage_grass_stage(data),
        }
    }

    pub const fn encode(self) -> u8 {
        encode_foliage_data(self.age, self.center, self.fruit, self.grass_stage)
    }
}

// Grass byte: bits 0-3 flower, bits 4-5 grass kind, bits 6-7 growth stage.
const GRASS_KIND_SHIFT: u8 = 4;
const GRASS_STAGE_SHIFT: u8 = 6;

pub const fn encode_grass_data(stage: GrowthStage, kind: GrassKind, flower: FlowerType) -> u8 {
    (stage.code() << GRASS_STAGE_SHIFT) | (kind.code() << GRASS_KIND_SHIFT) | flower.code()
}

pub const fn decode_grass_stage(data: u8) -> GrowthStage {
    GrowthStage::from_code(data >> GRASS_STAGE_SHIFT)
}

pub const fn decode_grass_kind(data: u8) -> Option<GrassKind> {
    GrassKind::from_code((data >> GRASS_KIND_SHIFT) & 0x03)
}

pub const fn decode_flower(data: u8) -> Option<FlowerType> {
    FlowerType::from_code(data & 0x0F)
}

/// Unpacked grass/kelp/reed data byte. Unassigned kind or flower codes decode to `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrassData {
    pub stage: GrowthStage,
    pub kind: Option<GrassKind>,
    pub flower: Option<FlowerType>,
}

impl GrassData {
    pub const fn decode(data: u8) -> Self {
        Self {
            stage: decode_grass_stage(data),
            kind: decode_grass_kind(data),
            flower: decode_flower(data),
        }
    }
}
