//! Tile type catalogue
//!
//! Every cell stores an 8-bit type id. This module maps those ids onto the closed
//! `TileType` enumeration, splits the types into the surface and cave domains, and
//! holds the feature enumerations packed into the data byte (foliage age, grass
//! stages, flowers).
//!
//! Trees and bushes exist in three substrate variants. The variant is part of the
//! stored type, so placing an oak on mycelium stores a different id than placing
//! it on dirt.

use std::fmt;

/// Ground a tree or bush grows on, derived from the surface type it replaces.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Substrate {
    Plain = 0,
    Mycelium = 1,
    Enchanted = 2,
}

impl Substrate {
    pub const ALL: [Substrate; 3] = [Substrate::Plain, Substrate::Mycelium, Substrate::Enchanted];

    /// Substrate implied by the current surface type. Unknown ids count as plain ground.
    pub fn of(surface: Option<TileType>) -> Self {
        match surface {
            Some(TileType::Mycelium) => Substrate::Mycelium,
            Some(TileType::EnchantedGrass) => Substrate::Enchanted,
            _ => Substrate::Plain,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeKind {
    Birch = 0,
    Pine = 1,
    Oak = 2,
    Cedar = 3,
    Willow = 4,
    Maple = 5,
    Apple = 6,
    Lemon = 7,
    Olive = 8,
    Cherry = 9,
    Chestnut = 10,
    Walnut = 11,
    Fir = 12,
    Linden = 13,
    Orange = 14,
}

impl TreeKind {
    pub const COUNT: usize = 15;

    pub const ALL: [TreeKind; Self::COUNT] = [
        TreeKind::Birch,
        TreeKind::Pine,
        TreeKind::Oak,
        TreeKind::Cedar,
        TreeKind::Willow,
        TreeKind::Maple,
        TreeKind::Apple,
        TreeKind::Lemon,
        TreeKind::Olive,
        TreeKind::Cherry,
        TreeKind::Chestnut,
        TreeKind::Walnut,
        TreeKind::Fir,
        TreeKind::Linden,
        TreeKind::Orange,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The stored tile type for this tree on the given substrate.
    pub const fn on(self, substrate: Substrate) -> TileType {
        TileType::Tree(self, substrate)
    }

    pub const fn as_normal_tree(self) -> TileType {
        self.on(Substrate::Plain)
    }

    pub const fn as_mycelium_tree(self) -> TileType {
        self.on(Substrate::Mycelium)
    }

    pub const fn as_enchanted_tree(self) -> TileType {
        self.on(Substrate::Enchanted)
    }

    pub fn name(self) -> &'static str {
        match self {
            TreeKind::Birch => "birch",
            TreeKind::Pine => "pine",
            TreeKind::Oak => "oak",
            TreeKind::Cedar => "cedar",
            TreeKind::Willow => "willow",
            TreeKind::Maple => "maple",
            TreeKind::Apple => "apple",
            TreeKind::Lemon => "lemon",
            TreeKind::Olive => "olive",
            TreeKind::Cherry => "cherry",
            TreeKind::Chestnut => "chestnut",
            TreeKind::Walnut => "walnut",
            TreeKind::Fir => "fir",
            TreeKind::Linden => "linden",
            TreeKind::Orange => "orange",
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BushKind {
    Lavender = 0,
    Rose = 1,
    Thorn = 2,
    Grape = 3,
    Camellia = 4,
    Oleander = 5,
    Hazelnut = 6,
    Raspberry = 7,
    Blueberry = 8,
    Lingonberry = 9,
}

impl BushKind {
    pub const COUNT: usize = 10;

    pub const ALL: [BushKind; Self::COUNT] = [
        BushKind::Lavender,
        BushKind::Rose,
        BushKind::Thorn,
        BushKind::Grape,
        BushKind::Camellia,
        BushKind::Oleander,
        BushKind::Hazelnut,
        BushKind::Raspberry,
        BushKind::Blueberry,
        BushKind::Lingonberry,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The stored tile type for this bush on the given substrate.
    pub const fn on(self, substrate: Substrate) -> TileType {
        TileType::Bush(self, substrate)
    }

    pub const fn as_normal_bush(self) -> TileType {
        self.on(Substrate::Plain)
    }

    pub const fn as_mycelium_bush(self) -> TileType {
        self.on(Substrate::Mycelium)
    }

    pub const fn as_enchanted_bush(self) -> TileType {
        self.on(Substrate::Enchanted)
    }

    pub fn name(self) -> &'static str {
        match self {
            BushKind::Lavender => "lavender",
            BushKind::Rose => "rose",
            BushKind::Thorn => "thorn",
            BushKind::Grape => "grape",
            BushKind::Camellia => "camellia",
            BushKind::Oleander => "oleander",
            BushKind::Hazelnut => "hazelnut",
            BushKind::Raspberry => "raspberry",
            BushKind::Blueberry => "blueberry",
            BushKind::Lingonberry => "lingonberry",
        }
    }
}

/// Closed set of tile types. Ids are stable: they are what the layer files store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileType {
    // Surface terrain
    Hole,
    Sand,
    Grass,
    Rock,
    Dirt,
    Clay,
    Field,
    PackedDirt,
    Cobblestone,
    Mycelium,
    StoneSlabs,
    Lava,
    Kelp,
    Reed,
    EnchantedGrass,
    Steppe,
    Tundra,
    Moss,
    Tar,
    Peat,
    Snow,
    Marsh,

    // Surface foliage
    Tree(TreeKind, Substrate),
    Bush(BushKind, Substrate),

    // Cave, open
    CaveFloor,
    CaveExit,
    CaveFloorReinforced,

    // Cave, solid walls
    CaveWall,
    CaveWallReinforced,
    CaveWallLava,
    CaveWallOreIron,
    CaveWallOreCopper,
    CaveWallOreTin,
    CaveWallOreGold,
    CaveWallOreAdamantine,
    CaveWallOreGlimmersteel,
    CaveWallOreSilver,
    CaveWallOreLead,
    CaveWallOreZinc,
    CaveWallSlate,
    CaveWallMarble,
    CaveWallRocksalt,
    CaveWallSandstone,
}

const TREE_BASE_ID: u8 = 100;
const BUSH_BASE_ID: u8 = 150;
/// Id stride between substrate variants of the same foliage kind.
const VARIANT_STRIDE: u8 = 16;

/// Every non-foliage type, surface first then cave.
const SIMPLE_TYPES: [TileType; 41] = [
    TileType::Hole,
    TileType::Sand,
    TileType::Grass,
    TileType::Rock,
    TileType::Dirt,
    TileType::Clay,
    TileType::Field,
    TileType::PackedDirt,
    TileType::Cobblestone,
    TileType::Mycelium,
    TileType::StoneSlabs,
    TileType::Lava,
    TileType::Kelp,
    TileType::Reed,
    TileType::EnchantedGrass,
    TileType::Steppe,
    TileType::Tundra,
    TileType::Moss,
    TileType::Tar,
    TileType::Peat,
    TileType::Snow,
    TileType::Marsh,
    TileType::CaveFloor,
    TileType::CaveExit,
    TileType::CaveFloorReinforced,
    TileType::CaveWall,
    TileType::CaveWallReinforced,
    TileType::CaveWallLava,
    TileType::CaveWallOreIron,
    TileType::CaveWallOreCopper,
    TileType::CaveWallOreTin,
    TileType::CaveWallOreGold,
    TileType::CaveWallOreAdamantine,
    TileType::CaveWallOreGlimmersteel,
    TileType::CaveWallOreSilver,
    TileType::CaveWallOreLead,
    TileType::CaveWallOreZinc,
    TileType::CaveWallSlate,
    TileType::CaveWallMarble,
    TileType::CaveWallRocksalt,
    TileType::CaveWallSandstone,
];

/// Reverse lookup from stored id, built at compile time.
static TILES_BY_ID: [Option<TileType>; 256] = build_id_table();

const fn build_id_table() -> [Option<TileType>; 256] {
    let mut table = [None; 256];

    let mut i = 0;
    while i < SIMPLE_TYPES.len() {
        let tile = SIMPLE_TYPES[i];
        table[tile.id() as usize] = Some(tile);
        i += 1;
    }

    let mut s = 0;
    while s < Substrate::ALL.len() {
        let substrate = Substrate::ALL[s];
        let mut k = 0;
        while k < TreeKind::COUNT {
            let tile = TileType::Tree(TreeKind::ALL[k], substrate);
            table[tile.id() as usize] = Some(tile);
            k += 1;
        }
        k = 0;
        while k < BushKind::COUNT {
            let tile = TileType::Bush(BushKind::ALL[k], substrate);
            table[tile.id() as usize] = Some(tile);
            k += 1;
        }
        s += 1;
    }

    table
}

impl TileType {
    /// Stored 8-bit id.
    pub const fn id(self) -> u8 {
        match self {
            TileType::Hole => 0,
            TileType::Sand => 1,
            TileType::Grass => 2,
            TileType::Rock => 4,
            TileType::Dirt => 5,
            TileType::Clay => 6,
            TileType::Field => 7,
            TileType::PackedDirt => 8,
            TileType::Cobblestone => 9,
            TileType::Mycelium => 10,
            TileType::StoneSlabs => 11,
            TileType::Lava => 12,
            TileType::Kelp => 13,
            TileType::Reed => 14,
            TileType::EnchantedGrass => 15,
            TileType::Steppe => 16,
            TileType::Tundra => 17,
            TileType::Moss => 18,
            TileType::Tar => 19,
            TileType::Peat => 20,
            TileType::Snow => 21,
            TileType::Marsh => 22,
            TileType::Tree(kind, substrate) => {
                TREE_BASE_ID + substrate as u8 * VARIANT_STRIDE + kind as u8
            }
            TileType::Bush(kind, substrate) => {
                BUSH_BASE_ID + substrate as u8 * VARIANT_STRIDE + kind as u8
            }
            TileType::CaveWall => 200,
            TileType::CaveFloor => 201,
            TileType::CaveExit => 202,
            TileType::CaveWallReinforced => 203,
            TileType::CaveFloorReinforced => 204,
            TileType::CaveWallLava => 205,
            TileType::CaveWallOreIron => 206,
            TileType::CaveWallOreCopper => 207,
            TileType::CaveWallOreTin => 208,
            TileType::CaveWallOreGold => 209,
            TileType::CaveWallOreAdamantine => 210,
            TileType::CaveWallOreGlimmersteel => 211,
            TileType::CaveWallOreSilver => 212,
            TileType::CaveWallOreLead => 213,
            TileType::CaveWallOreZinc => 214,
            TileType::CaveWallSlate => 215,
            TileType::CaveWallMarble => 216,
            TileType::CaveWallRocksalt => 217,
            TileType::CaveWallSandstone => 218,
        }
    }

    /// Type for a stored id, or `None` if the id is unassigned.
    pub fn from_id(id: u8) -> Option<TileType> {
        TILES_BY_ID[id as usize]
    }

    /// All assigned tile types in id order.
    pub fn all() -> impl Iterator<Item = TileType> {
        TILES_BY_ID.iter().filter_map(|tile| *tile)
    }

    pub const fn is_cave(self) -> bool {
        matches!(
            self,
            TileType::CaveFloor
                | TileType::CaveExit
                | TileType::CaveFloorReinforced
                | TileType::CaveWall
                | TileType::CaveWallReinforced
                | TileType::CaveWallLava
                | TileType::CaveWallOreIron
                | TileType::CaveWallOreCopper
                | TileType::CaveWallOreTin
                | TileType::CaveWallOreGold
                | TileType::CaveWallOreAdamantine
                | TileType::CaveWallOreGlimmersteel
                | TileType::CaveWallOreSilver
                | TileType::CaveWallOreLead
                | TileType::CaveWallOreZinc
                | TileType::CaveWallSlate
                | TileType::CaveWallMarble
                | TileType::CaveWallRocksalt
                | TileType::CaveWallSandstone
        )
    }

    pub const fn is_surface(self) -> bool {
        !self.is_cave()
    }

    pub const fn is_tree(self) -> bool {
        matches!(self, TileType::Tree(..))
    }

    pub const fn is_bush(self) -> bool {
        matches!(self, TileType::Bush(..))
    }

    /// Cave types that fill the whole tile. Open floors and exits are not walls.
    pub const fn is_solid_cave_wall(self) -> bool {
        self.is_cave()
            && !matches!(
                self,
                TileType::CaveFloor | TileType::CaveExit | TileType::CaveFloorReinforced
            )
    }

    /// Substrate of a tree or bush type.
    pub const fn substrate(self) -> Option<Substrate> {
        match self {
            TileType::Tree(_, substrate) | TileType::Bush(_, substrate) => Some(substrate),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TileType::Hole => "hole",
            TileType::Sand => "sand",
            TileType::Grass => "grass",
            TileType::Rock => "rock",
            TileType::Dirt => "dirt",
            TileType::Clay => "clay",
            TileType::Field => "field",
            TileType::PackedDirt => "packed dirt",
            TileType::Cobblestone => "cobblestone",
            TileType::Mycelium => "mycelium",
            TileType::StoneSlabs => "stone slabs",
            TileType::Lava => "lava",
            TileType::Kelp => "kelp",
            TileType::Reed => "reed",
            TileType::EnchantedGrass => "enchanted grass",
            TileType::Steppe => "steppe",
            TileType::Tundra => "tundra",
            TileType::Moss => "moss",
            TileType::Tar => "tar",
            TileType::Peat => "peat",
            TileType::Snow => "snow",
            TileType::Marsh => "marsh",
            TileType::Tree(kind, _) => kind.name(),
            TileType::Bush(kind, _) => kind.name(),
            TileType::CaveFloor => "cave floor",
            TileType::CaveExit => "cave exit",
            TileType::CaveFloorReinforced => "reinforced cave floor",
            TileType::CaveWall => "cave wall",
            TileType::CaveWallReinforced => "reinforced cave wall",
            TileType::CaveWallLava => "lava wall",
            TileType::CaveWallOreIron => "iron ore",
            TileType::CaveWallOreCopper => "copper ore",
            TileType::CaveWallOreTin => "tin ore",
            TileType::CaveWallOreGold => "gold ore",
            TileType::CaveWallOreAdamantine => "adamantine ore",
            TileType::CaveWallOreGlimmersteel => "glimmersteel ore",
            TileType::CaveWallOreSilver => "silver ore",
            TileType::CaveWallOreLead => "lead ore",
            TileType::CaveWallOreZinc => "zinc ore",
            TileType::CaveWallSlate => "slate wall",
            TileType::CaveWallMarble => "marble wall",
            TileType::CaveWallRocksalt => "rocksalt wall",
            TileType::CaveWallSandstone => "sandstone wall",
        }
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileType::Tree(_, substrate) => write!(f, "{} tree{}", self.name(), variant_suffix(*substrate)),
            TileType::Bush(_, substrate) => write!(f, "{} bush{}", self.name(), variant_suffix(*substrate)),
            _ => f.write_str(self.name()),
        }
    }
}

fn variant_suffix(substrate: Substrate) -> &'static str {
    match substrate {
        Substrate::Plain => "",
        Substrate::Mycelium => " (mycelium)",
        Substrate::Enchanted => " (enchanted)",
    }
}

/// Age of a tree or bush, four bits of the foliage data byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FoliageAge {
    YoungOne = 0,
    YoungTwo = 1,
    YoungThree = 2,
    YoungFour = 3,
    MatureOne = 4,
    MatureTwo = 5,
    MatureThree = 6,
    MatureSprouting = 7,
    OldOne = 8,
    OldOneSprouting = 9,
    OldTwo = 10,
    OldTwoSprouting = 11,
    VeryOld = 12,
    VeryOldSprouting = 13,
    Overaged = 14,
    Shrivelled = 15,
}

impl FoliageAge {
    pub const ALL: [FoliageAge; 16] = [
        FoliageAge::YoungOne,
        FoliageAge::YoungTwo,
        FoliageAge::YoungThree,
        FoliageAge::YoungFour,
        FoliageAge::MatureOne,
        FoliageAge::MatureTwo,
        FoliageAge::MatureThree,
        FoliageAge::MatureSprouting,
        FoliageAge::OldOne,
        FoliageAge::OldOneSprouting,
        FoliageAge::OldTwo,
        FoliageAge::OldTwoSprouting,
        FoliageAge::VeryOld,
        FoliageAge::VeryOldSprouting,
        FoliageAge::Overaged,
        FoliageAge::Shrivelled,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Every four-bit value is a valid age; higher bits are ignored.
    pub const fn from_code(code: u8) -> Self {
        Self::ALL[(code & 0x0F) as usize]
    }
}

/// Grass growth on a tree or bush tile, two bits of the foliage data byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthTreeStage {
    Short = 0,
    Medium = 1,
    Tall = 2,
    Wild = 3,
}

impl GrowthTreeStage {
    pub const ALL: [GrowthTreeStage; 4] = [
        GrowthTreeStage::Short,
        GrowthTreeStage::Medium,
        GrowthTreeStage::Tall,
        GrowthTreeStage::Wild,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Self {
        Self::ALL[(code & 0x03) as usize]
    }
}

/// Growth of grass, kelp or reed, two bits of the grass data byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthStage {
    Short = 0,
    Medium = 1,
    Tall = 2,
    Wild = 3,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Short,
        GrowthStage::Medium,
        GrowthStage::Tall,
        GrowthStage::Wild,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Self {
        Self::ALL[(code & 0x03) as usize]
    }
}

/// What grows on a grass-like tile. Mycelium grows plain grass.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrassKind {
    Grass = 0,
    Reed = 1,
    Kelp = 2,
}

impl GrassKind {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GrassKind::Grass),
            1 => Some(GrassKind::Reed),
            2 => Some(GrassKind::Kelp),
            _ => None,
        }
    }

    /// Grass kind growing on a surface type, `None` for anything that is not grass-like.
    pub const fn for_tile(tile: TileType) -> Option<Self> {
        match tile {
            TileType::Grass | TileType::Mycelium => Some(GrassKind::Grass),
            TileType::Kelp => Some(GrassKind::Kelp),
            TileType::Reed => Some(GrassKind::Reed),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowerType {
    None = 0,
    Flower1 = 1,
    Flower2 = 2,
    Flower3 = 3,
    Flower4 = 4,
    Flower5 = 5,
    Flower6 = 6,
    Flower7 = 7,
}

impl FlowerType {
    pub const ALL: [FlowerType; 8] = [
        FlowerType::None,
        FlowerType::Flower1,
        FlowerType::Flower2,
        FlowerType::Flower3,
        FlowerType::Flower4,
        FlowerType::Flower5,
        FlowerType::Flower6,
        FlowerType::Flower7,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < Self::ALL.len() {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }
}
