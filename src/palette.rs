//! Tile colours for map dumps.

use image::Rgb;

use crate::codec::{decode_flower, Cell};
use crate::tiles::{FlowerType, TileType, TreeKind};

/// Colour provider used by the dump renderer.
pub trait Palette {
    fn surface_color(&self, tile: TileType) -> Rgb<u8>;

    fn cave_color(&self, tile: TileType) -> Rgb<u8>;

    /// Colour for surface cells whose type id is not assigned.
    fn surface_unknown(&self) -> Rgb<u8>;

    /// Colour for cave cells whose type id is not assigned.
    fn cave_unknown(&self) -> Rgb<u8>;

    fn flower_color(&self, flower: FlowerType) -> Rgb<u8>;

    /// Flower colour read from the data byte of a grass cell.
    fn flower_color_for_cell(&self, cell: Cell) -> Rgb<u8> {
        match decode_flower(cell.data()) {
            Some(flower) => self.flower_color(flower),
            None => self.flower_color(FlowerType::None),
        }
    }

    fn tree_color(&self, kind: TreeKind) -> Rgb<u8>;
}

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const DARK_RED: Rgb<u8> = Rgb([178, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const DARK_GREEN: Rgb<u8> = Rgb([0, 178, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
const DARK_YELLOW: Rgb<u8> = Rgb([178, 178, 0]);
const ORANGE: Rgb<u8> = Rgb([255, 200, 0]);
const DARK_ORANGE: Rgb<u8> = Rgb([178, 140, 0]);
const PINK: Rgb<u8> = Rgb([255, 175, 175]);
const DUSKY_PINK: Rgb<u8> = Rgb([124, 85, 85]);
const DARK_GRAY: Rgb<u8> = Rgb([64, 64, 64]);
const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const LIGHT_GRAY: Rgb<u8> = Rgb([192, 192, 192]);
const PURPLE: Rgb<u8> = Rgb([108, 46, 153]);
const YELLOW_GREEN: Rgb<u8> = Rgb([200, 230, 0]);
const OLIVE: Rgb<u8> = Rgb([80, 80, 0]);
const ZINC: Rgb<u8> = Rgb([235, 235, 235]);

const GRASS: Rgb<u8> = Rgb([54, 101, 3]);
const DIRT: Rgb<u8> = Rgb([75, 63, 47]);
const MYCELIUM: Rgb<u8> = Rgb([71, 38, 58]);
const ENCHANTED_GRASS: Rgb<u8> = Rgb([44, 132, 77]);

/// Indexed by `TreeKind::index()`.
static TREE_COLORS: [Rgb<u8>; TreeKind::COUNT] = [
    WHITE,        // birch
    YELLOW,       // pine
    BLACK,        // oak
    CYAN,         // cedar
    DARK_GRAY,    // willow
    PURPLE,       // maple
    YELLOW_GREEN, // apple
    YELLOW,       // lemon
    OLIVE,        // olive
    RED,          // cherry
    LIGHT_GRAY,   // chestnut
    ORANGE,       // walnut
    DARK_GREEN,   // fir
    PINK,         // linden
    YELLOW,       // orange
];

/// Indexed by `FlowerType::code()`.
static FLOWER_COLORS: [Rgb<u8>; 8] = [
    GRASS,
    YELLOW,
    ORANGE,
    PURPLE,
    WHITE,
    BLUE,
    YELLOW_GREEN,
    PINK,
];

/// Forest floor colours, indexed by `Substrate::index()`.
static FOREST_COLORS: [Rgb<u8>; 3] = [Rgb([38, 84, 10]), Rgb([62, 32, 50]), Rgb([30, 110, 70])];
static THICKET_COLORS: [Rgb<u8>; 3] = [Rgb([70, 98, 30]), Rgb([84, 50, 70]), Rgb([58, 138, 90])];

/// Built-in colour tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPalette;

impl Palette for DefaultPalette {
    fn surface_color(&self, tile: TileType) -> Rgb<u8> {
        match tile {
            TileType::Hole => BLACK,
            TileType::Sand => Rgb([160, 142, 109]),
            TileType::Grass => GRASS,
            TileType::Rock => Rgb([114, 117, 118]),
            TileType::Dirt => DIRT,
            TileType::Clay => Rgb([113, 124, 118]),
            TileType::Field => Rgb([105, 80, 50]),
            TileType::PackedDirt => Rgb([84, 70, 52]),
            TileType::Cobblestone => Rgb([105, 105, 105]),
            TileType::Mycelium => MYCELIUM,
            TileType::StoneSlabs => Rgb([150, 150, 150]),
            TileType::Lava => Rgb([215, 51, 30]),
            TileType::Kelp => Rgb([30, 80, 60]),
            TileType::Reed => Rgb([90, 110, 40]),
            TileType::EnchantedGrass => ENCHANTED_GRASS,
            TileType::Steppe => Rgb([115, 115, 62]),
            TileType::Tundra => Rgb([118, 135, 109]),
            TileType::Moss => Rgb([106, 142, 56]),
            TileType::Tar => Rgb([18, 18, 18]),
            TileType::Peat => Rgb([54, 40, 29]),
            TileType::Snow => Rgb([238, 245, 247]),
            TileType::Marsh => Rgb([43, 101, 72]),
            TileType::Tree(_, substrate) => FOREST_COLORS[substrate.index()],
            TileType::Bush(_, substrate) => THICKET_COLORS[substrate.index()],
            // Cave types never show up on a well-formed surface layer.
            _ => self.surface_unknown(),
        }
    }

    fn cave_color(&self, tile: TileType) -> Rgb<u8> {
        match tile {
            TileType::CaveWall | TileType::CaveWallReinforced => DARK_GRAY,
            TileType::CaveFloor | TileType::CaveFloorReinforced | TileType::CaveExit => PINK,
            TileType::CaveWallOreIron => DARK_RED,
            TileType::CaveWallLava => RED,
            TileType::CaveWallOreCopper => GREEN,
            TileType::CaveWallOreTin => GRAY,
            TileType::CaveWallOreGold => DARK_YELLOW,
            TileType::CaveWallOreAdamantine => CYAN,
            TileType::CaveWallOreGlimmersteel => YELLOW,
            TileType::CaveWallOreSilver => LIGHT_GRAY,
            TileType::CaveWallOreLead => DUSKY_PINK,
            TileType::CaveWallOreZinc => ZINC,
            TileType::CaveWallSlate => BLACK,
            TileType::CaveWallMarble => WHITE,
            TileType::CaveWallRocksalt => CYAN,
            TileType::CaveWallSandstone => DARK_ORANGE,
            _ => self.cave_unknown(),
        }
    }

    fn surface_unknown(&self) -> Rgb<u8> {
        DIRT
    }

    fn cave_unknown(&self) -> Rgb<u8> {
        PINK
    }

    fn flower_color(&self, flower: FlowerType) -> Rgb<u8> {
        FLOWER_COLORS[flower.code() as usize]
    }

    fn tree_color(&self, kind: TreeKind) -> Rgb<u8> {
        TREE_COLORS[kind.index()]
    }
}
