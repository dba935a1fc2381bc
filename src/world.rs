//! Layered world model
//!
//! A world is five co-registered grids sharing one side length: surface, rock,
//! flags, cave and resources. This module owns the validated tile-mutation API
//! and the sanitizer that normalizes terrain before every save.
//!
//! Cross-layer invariants are only enforced by `save_changes`, never by the
//! individual setters:
//! - the surface is never below the rock layer,
//! - tiles whose 2x2 corner block has no dirt at all are bare rock.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::codec::{encode_foliage_data, encode_grass_data, Cell};
use crate::error::WorldError;
use crate::grid::TerrainGrid;
use crate::store::{GridStore, MeshFile};
use crate::tiles::{
    BushKind, FlowerType, FoliageAge, GrassKind, GrowthStage, GrowthTreeStage, Substrate, TileType,
    TreeKind,
};

/// Smallest side exponent accepted when creating a world.
pub const MIN_WORLD_POWER: u32 = 10;
/// Largest side exponent accepted when creating a world.
pub const MAX_WORLD_POWER: u32 = 15;

/// Distance from the map edge inside which the default layout is sea floor.
const RIM_WIDTH: usize = 5;
const CORE_ROCK_HEIGHT: i16 = 95;
const CORE_SURFACE_HEIGHT: i16 = 100;
const RIM_ROCK_HEIGHT: i16 = -200;
const RIM_SURFACE_HEIGHT: i16 = -100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Surface,
    Rock,
    Flags,
    Cave,
    Resources,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Surface,
        Layer::Rock,
        Layer::Flags,
        Layer::Cave,
        Layer::Resources,
    ];

    /// Conventional file name of this layer inside a world directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Layer::Surface => "top_layer.map",
            Layer::Rock => "rock_layer.map",
            Layer::Flags => "flags.map",
            Layer::Cave => "map_cave.map",
            Layer::Resources => "resources.map",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Surface => "surface",
            Layer::Rock => "rock",
            Layer::Flags => "flags",
            Layer::Cave => "cave",
            Layer::Resources => "resources",
        };
        f.write_str(name)
    }
}

/// What the sanitizer changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Surface tiles raised to the rock height below them.
    pub raised: usize,
    /// Surface tiles re-typed to rock because their whole block is exposed.
    pub exposed: usize,
}

pub struct WorldModel<S> {
    surface: TerrainGrid<S>,
    rock: TerrainGrid<S>,
    flags: TerrainGrid<S>,
    cave: TerrainGrid<S>,
    resources: TerrainGrid<S>,
}

impl<S: GridStore> WorldModel<S> {
    /// Open the five layers from existing stores.
    pub fn open_with(mut store_for: impl FnMut(Layer) -> S) -> Result<Self, WorldError> {
        let mut open = |layer: Layer| {
            TerrainGrid::open(store_for(layer)).map_err(|source| WorldError::Layer { layer, source })
        };
        let world = Self {
            surface: open(Layer::Surface)?,
            rock: open(Layer::Rock)?,
            flags: open(Layer::Flags)?,
            cave: open(Layer::Cave)?,
            resources: open(Layer::Resources)?,
        };
        world.check_sides()?;
        Ok(world)
    }

    /// Create five zero-filled layers of side `2^power_of_two` and seed the default layout.
    pub fn create_with(
        power_of_two: u32,
        mut store_for: impl FnMut(Layer) -> S,
    ) -> Result<Self, WorldError> {
        let mut create = |layer: Layer| {
            TerrainGrid::create(store_for(layer), power_of_two)
                .map_err(|source| WorldError::Layer { layer, source })
        };
        let mut world = Self {
            surface: create(Layer::Surface)?,
            rock: create(Layer::Rock)?,
            flags: create(Layer::Flags)?,
            cave: create(Layer::Cave)?,
            resources: create(Layer::Resources)?,
        };
        world.seed_default_layout();
        Ok(world)
    }

    /// Sanitize the terrain, then persist all five layers.
    ///
    /// Every layer save is attempted even if an earlier one fails; the first
    /// failure is returned. The in-memory model stays valid either way, so the
    /// call can simply be retried.
    pub fn save_changes(&mut self) -> Result<SanitizeReport, WorldError> {
        let report = self.sanitize();

        let mut first_error = None;
        for (layer, grid) in self.grids_mut() {
            if let Err(e) = grid.save() {
                error!("Failed to save {} layer: {}", layer, e);
                first_error.get_or_insert(WorldError::layer_io(layer, e));
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(
                    "Saved world of side {} ({} tiles raised, {} tiles exposed)",
                    self.side(),
                    report.raised,
                    report.exposed
                );
                Ok(report)
            }
        }
    }

    /// Release all five layers. Every layer is closed even if an earlier one fails.
    pub fn close(mut self) -> Result<(), WorldError> {
        let mut first_error = None;
        for (layer, grid) in self.grids_mut() {
            if let Err(e) = grid.close() {
                error!("Failed to close {} layer: {}", layer, e);
                first_error.get_or_insert(WorldError::layer_io(layer, e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<S> WorldModel<S> {
    fn check_sides(&self) -> Result<(), WorldError> {
        let expected = self.surface.side();
        for layer in Layer::ALL {
            let actual = self.layer(layer).side();
            if actual != expected {
                return Err(WorldError::LayerSizeMismatch {
                    layer,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn grids_mut(&mut self) -> [(Layer, &mut TerrainGrid<S>); 5] {
        [
            (Layer::Surface, &mut self.surface),
            (Layer::Rock, &mut self.rock),
            (Layer::Flags, &mut self.flags),
            (Layer::Cave, &mut self.cave),
            (Layer::Resources, &mut self.resources),
        ]
    }

    /// Read access to any layer.
    pub fn layer(&self, layer: Layer) -> &TerrainGrid<S> {
        match layer {
            Layer::Surface => &self.surface,
            Layer::Rock => &self.rock,
            Layer::Flags => &self.flags,
            Layer::Cave => &self.cave,
            Layer::Resources => &self.resources,
        }
    }

    /// Map width and height; all layers share it.
    pub fn side(&self) -> usize {
        self.surface.side()
    }

    /// Outdoor rim, cave core: sea floor within the rim, low dirt hills inside,
    /// solid cave wall everywhere underground.
    pub fn seed_default_layout(&mut self) {
        let side = self.side();
        let half = side / 2;

        self.cave.fill(Cell::new(0, TileType::CaveWall, 0));
        for y in 0..side {
            for x in 0..side {
                let dist_to_edge = (half - x.abs_diff(half)).min(half - y.abs_diff(half));
                let (rock, surface) = if dist_to_edge > RIM_WIDTH {
                    (CORE_ROCK_HEIGHT, CORE_SURFACE_HEIGHT)
                } else {
                    (RIM_ROCK_HEIGHT, RIM_SURFACE_HEIGHT)
                };
                self.rock.put(x, y, Cell::new(rock, TileType::Rock, 0));
                self.surface.put(x, y, Cell::new(surface, TileType::Dirt, 0));
            }
        }
        debug!("Seeded default layout on a {}x{} world", side, side);
    }

    pub fn surface_tile(&self, x: usize, y: usize) -> Result<Option<TileType>, WorldError> {
        Ok(self.surface.get(x, y)?.tile())
    }

    pub fn surface_height(&self, x: usize, y: usize) -> Result<i16, WorldError> {
        Ok(self.surface.get(x, y)?.height())
    }

    /// Raw data byte of the surface tile (foliage or grass data).
    pub fn surface_data(&self, x: usize, y: usize) -> Result<u8, WorldError> {
        Ok(self.surface.get(x, y)?.data())
    }

    pub fn rock_height(&self, x: usize, y: usize) -> Result<i16, WorldError> {
        Ok(self.rock.get(x, y)?.height())
    }

    pub fn cave_tile(&self, x: usize, y: usize) -> Result<Option<TileType>, WorldError> {
        Ok(self.cave.get(x, y)?.tile())
    }

    /// Thickness of soil above the rock, zero where rock sticks out.
    pub fn dirt_layer_height(&self, x: usize, y: usize) -> Result<i32, WorldError> {
        let surface = self.surface.get(x, y)?.height();
        let rock = self.rock.get(x, y)?.height();
        Ok(dirt_height(surface, rock))
    }

    /// Change the surface height, keeping type and data.
    pub fn set_surface_height(&mut self, x: usize, y: usize, height: i16) -> Result<(), WorldError> {
        let cell = self.surface.get(x, y)?;
        self.surface.set(x, y, cell.with_height(height))?;
        Ok(())
    }

    /// Set a plain surface type at the current height.
    ///
    /// The data byte is reset, so any grass or foliage data stored on the tile is lost.
    pub fn set_surface_tile(&mut self, x: usize, y: usize, tile: TileType) -> Result<(), WorldError> {
        let height = self.surface_height(x, y)?;
        self.set_surface_tile_with_height(x, y, tile, height)
    }

    /// Set a plain surface type and height. Trees, bushes and cave types are rejected;
    /// use [`set_tree`](Self::set_tree), [`set_bush`](Self::set_bush) and
    /// [`set_cave_tile`](Self::set_cave_tile) for those.
    pub fn set_surface_tile_with_height(
        &mut self,
        x: usize,
        y: usize,
        tile: TileType,
        height: i16,
    ) -> Result<(), WorldError> {
        if tile.is_cave() {
            return Err(WorldError::invalid(format!("{} is not a surface type", tile)));
        }
        if tile.is_tree() || tile.is_bush() {
            return Err(WorldError::invalid(format!(
                "{} is a tree or bush, use the foliage setters instead",
                tile
            )));
        }
        self.surface.set(x, y, Cell::new(height, tile, 0))?;
        Ok(())
    }

    /// Plant a tree. The stored variant follows the ground it is planted on.
    pub fn set_tree(
        &mut self,
        x: usize,
        y: usize,
        kind: TreeKind,
        age: FoliageAge,
        grass_stage: GrowthTreeStage,
    ) -> Result<(), WorldError> {
        let substrate = Substrate::of(self.surface_tile(x, y)?);
        self.set_foliage(x, y, kind.on(substrate), age, grass_stage)
    }

    /// Plant a bush. The stored variant follows the ground it is planted on.
    pub fn set_bush(
        &mut self,
        x: usize,
        y: usize,
        kind: BushKind,
        age: FoliageAge,
        grass_stage: GrowthTreeStage,
    ) -> Result<(), WorldError> {
        let substrate = Substrate::of(self.surface_tile(x, y)?);
        self.set_foliage(x, y, kind.on(substrate), age, grass_stage)
    }

    fn set_foliage(
        &mut self,
        x: usize,
        y: usize,
        foliage: TileType,
        age: FoliageAge,
        grass_stage: GrowthTreeStage,
    ) -> Result<(), WorldError> {
        let height = self.surface_height(x, y)?;
        let data = encode_foliage_data(age, false, false, grass_stage);
        self.surface.set(x, y, Cell::new(height, foliage, data))?;
        Ok(())
    }

    /// Set growth and flower on a grass, mycelium, kelp or reed tile.
    ///
    /// Any other tile is left untouched, as is any tile other than plain grass
    /// when a flower is requested. Returns whether the tile was changed.
    pub fn set_grass(
        &mut self,
        x: usize,
        y: usize,
        stage: GrowthStage,
        flower: Option<FlowerType>,
    ) -> Result<bool, WorldError> {
        let flower = flower.unwrap_or(FlowerType::None);
        let cell = self.surface.get(x, y)?;
        let Some(tile) = cell.tile() else {
            return Ok(false);
        };
        let Some(kind) = GrassKind::for_tile(tile) else {
            return Ok(false);
        };
        if tile != TileType::Grass && flower != FlowerType::None {
            return Ok(false);
        }

        self.surface.set(x, y, cell.with_data(encode_grass_data(stage, kind, flower)))?;
        Ok(true)
    }

    /// Set the rock layer height. The rock layer always stores plain rock.
    pub fn set_rock_height(&mut self, x: usize, y: usize, height: i16) -> Result<(), WorldError> {
        self.rock.set(x, y, Cell::new(height, TileType::Rock, 0))?;
        Ok(())
    }

    /// Set a cave tile. Only solid cave walls are accepted.
    pub fn set_cave_tile(&mut self, x: usize, y: usize, tile: TileType) -> Result<(), WorldError> {
        if !tile.is_cave() {
            return Err(WorldError::invalid(format!("{} is not a cave type", tile)));
        }
        if !tile.is_solid_cave_wall() {
            return Err(WorldError::invalid(format!("{} is not a solid cave wall", tile)));
        }
        self.cave.set(x, y, Cell::new(0, tile, 0))?;
        Ok(())
    }

    /// Normalize the terrain without persisting it.
    ///
    /// Pass one lifts the surface onto the rock wherever rock pokes through.
    /// Pass two turns every tile whose 2x2 corner block has zero dirt at all four
    /// corners into bare rock, keeping its height.
    pub fn sanitize(&mut self) -> SanitizeReport {
        let side = self.side();
        let mut report = SanitizeReport::default();

        for y in 0..side {
            for x in 0..side {
                let surface = self.surface.at(x, y);
                let rock = self.rock.at(x, y).height();
                if rock > surface.height() {
                    self.surface.put(x, y, surface.with_height(rock));
                    report.raised += 1;
                }
            }
        }

        // Re-typing never changes heights, so later corners still see the original dirt.
        for y in 0..side.saturating_sub(1) {
            for x in 0..side.saturating_sub(1) {
                if self.is_bare(x, y)
                    && self.is_bare(x + 1, y)
                    && self.is_bare(x, y + 1)
                    && self.is_bare(x + 1, y + 1)
                {
                    let height = self.surface.at(x, y).height();
                    self.surface.put(x, y, Cell::new(height, TileType::Rock, 0));
                    report.exposed += 1;
                }
            }
        }

        debug!(
            "Sanitized terrain: {} tiles raised to rock, {} exposed tiles re-typed",
            report.raised, report.exposed
        );
        report
    }

    fn is_bare(&self, x: usize, y: usize) -> bool {
        dirt_height(self.surface.at(x, y).height(), self.rock.at(x, y).height()) == 0
    }
}

fn dirt_height(surface: i16, rock: i16) -> i32 {
    (i32::from(surface) - i32::from(rock)).max(0)
}

/// A world stored as five layer files in one directory.
pub struct World {
    root: PathBuf,
    map: WorldModel<MeshFile>,
}

impl World {
    /// Open an existing world. The directory is created if missing, but the layer
    /// files must already exist.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, WorldError> {
        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let map = WorldModel::open_with(|layer| MeshFile::new(root.join(layer.file_name())))?;
        info!("Opened world {} ({}x{})", root.display(), map.side(), map.side());
        Ok(Self { root, map })
    }

    /// Create a new world of side `2^power_of_two`, replacing any layer files in
    /// the directory, and seed the default layout. Nothing is saved until
    /// [`WorldModel::save_changes`] is called.
    pub fn create(dir: impl AsRef<Path>, power_of_two: u32) -> Result<Self, WorldError> {
        if !(MIN_WORLD_POWER..=MAX_WORLD_POWER).contains(&power_of_two) {
            return Err(WorldError::invalid(format!(
                "map with size 2^{} cannot be created, the exponent must be between {} and {}",
                power_of_two, MIN_WORLD_POWER, MAX_WORLD_POWER
            )));
        }

        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let map = WorldModel::create_with(power_of_two, |layer| {
            MeshFile::new(root.join(layer.file_name()))
        })?;
        info!("Created world {} ({}x{})", root.display(), map.side(), map.side());
        Ok(Self { root, map })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn map(&self) -> &WorldModel<MeshFile> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut WorldModel<MeshFile> {
        &mut self.map
    }

    /// Release all layer files. The world cannot be used afterwards.
    pub fn close(self) -> Result<(), WorldError> {
        let root = self.root;
        self.map.close()?;
        info!("Closed world {}", root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FoliageData, GrassData};
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    /// 16x16 world with the default layout.
    fn small_world() -> WorldModel<MemoryStore> {
        WorldModel::create_with(4, |_| MemoryStore::new()).expect("create")
    }

    fn snapshot(world: &WorldModel<MemoryStore>) -> Vec<Vec<Cell>> {
        Layer::ALL
            .iter()
            .map(|layer| world.layer(*layer).cells().to_vec())
            .collect()
    }

    #[test]
    fn test_default_layout() {
        let world = small_world();
        assert_eq!(world.side(), 16);

        // Center of the map is well inside the rim.
        assert_eq!(world.surface_height(8, 8).unwrap(), 100);
        assert_eq!(world.rock_height(8, 8).unwrap(), 95);
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Dirt));

        // Edges are sea floor.
        assert_eq!(world.surface_height(0, 8).unwrap(), -100);
        assert_eq!(world.rock_height(0, 8).unwrap(), -200);
        assert_eq!(world.surface_height(15, 15).unwrap(), -100);
        assert_eq!(world.surface_height(8, 5).unwrap(), -100);
        assert_eq!(world.surface_height(8, 6).unwrap(), 100);
        assert_eq!(world.surface_height(10, 10).unwrap(), 100);
        assert_eq!(world.surface_height(11, 10).unwrap(), -100);

        assert!(world
            .layer(Layer::Cave)
            .iter()
            .all(|(_, _, c)| c.tile() == Some(TileType::CaveWall)));
        assert_eq!(world.dirt_layer_height(8, 8).unwrap(), 5);
    }

    #[test]
    fn test_set_surface_tile_keeps_height_and_clears_data() {
        let mut world = small_world();
        world.set_surface_tile(8, 8, TileType::Grass).unwrap();
        world.set_grass(8, 8, GrowthStage::Tall, Some(FlowerType::Flower3)).unwrap();
        assert_ne!(world.surface_data(8, 8).unwrap(), 0);

        world.set_surface_tile(8, 8, TileType::Sand).unwrap();
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Sand));
        assert_eq!(world.surface_height(8, 8).unwrap(), 100);
        assert_eq!(world.surface_data(8, 8).unwrap(), 0);

        world.set_surface_tile_with_height(8, 8, TileType::Clay, -7).unwrap();
        assert_eq!(world.surface_height(8, 8).unwrap(), -7);
    }

    #[test]
    fn test_set_surface_tile_rejects_other_domains() {
        let mut world = small_world();
        let before = snapshot(&world);

        for tile in [
            TileType::CaveWall,
            TileType::CaveFloor,
            TreeKind::Oak.as_normal_tree(),
            BushKind::Rose.as_mycelium_bush(),
        ] {
            assert!(matches!(
                world.set_surface_tile(4, 4, tile),
                Err(WorldError::InvalidArgument(_))
            ));
        }
        assert_eq!(snapshot(&world), before);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut world = small_world();
        assert!(matches!(world.surface_height(16, 0), Err(WorldError::Grid(_))));
        assert!(matches!(world.set_rock_height(0, 16, 1), Err(WorldError::Grid(_))));
        assert!(matches!(
            world.set_tree(99, 99, TreeKind::Oak, FoliageAge::OldOne, GrowthTreeStage::Short),
            Err(WorldError::Grid(_))
        ));
    }

    #[test]
    fn test_set_surface_height_keeps_type_and_data() {
        let mut world = small_world();
        world.set_tree(8, 8, TreeKind::Pine, FoliageAge::MatureTwo, GrowthTreeStage::Medium).unwrap();
        let data = world.surface_data(8, 8).unwrap();

        world.set_surface_height(8, 8, i16::MAX).unwrap();
        assert_eq!(world.surface_height(8, 8).unwrap(), i16::MAX);
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TreeKind::Pine.as_normal_tree()));
        assert_eq!(world.surface_data(8, 8).unwrap(), data);
    }

    #[test]
    fn test_set_tree_substrates() {
        let mut world = small_world();

        world.set_surface_tile(6, 6, TileType::Mycelium).unwrap();
        world.set_tree(6, 6, TreeKind::Oak, FoliageAge::YoungTwo, GrowthTreeStage::Tall).unwrap();
        assert_eq!(world.surface_tile(6, 6).unwrap(), Some(TreeKind::Oak.as_mycelium_tree()));

        world.set_surface_tile(7, 6, TileType::EnchantedGrass).unwrap();
        world.set_tree(7, 6, TreeKind::Oak, FoliageAge::YoungTwo, GrowthTreeStage::Tall).unwrap();
        assert_eq!(world.surface_tile(7, 6).unwrap(), Some(TreeKind::Oak.as_enchanted_tree()));

        world.set_surface_tile(8, 6, TileType::Grass).unwrap();
        world.set_tree(8, 6, TreeKind::Oak, FoliageAge::YoungTwo, GrowthTreeStage::Tall).unwrap();
        assert_eq!(world.surface_tile(8, 6).unwrap(), Some(TreeKind::Oak.as_normal_tree()));
        assert_eq!(world.surface_height(8, 6).unwrap(), 100);

        let foliage = FoliageData::decode(world.surface_data(8, 6).unwrap());
        assert_eq!(foliage.age, FoliageAge::YoungTwo);
        assert_eq!(foliage.grass_stage, GrowthTreeStage::Tall);
        assert!(!foliage.center);
        assert!(!foliage.fruit);
    }

    #[test]
    fn test_set_bush_substrates() {
        let mut world = small_world();

        world.set_surface_tile(6, 6, TileType::Mycelium).unwrap();
        world.set_bush(6, 6, BushKind::Camellia, FoliageAge::OldOne, GrowthTreeStage::Short).unwrap();
        assert_eq!(world.surface_tile(6, 6).unwrap(), Some(BushKind::Camellia.as_mycelium_bush()));

        world.set_surface_tile(7, 6, TileType::EnchantedGrass).unwrap();
        world.set_bush(7, 6, BushKind::Camellia, FoliageAge::OldOne, GrowthTreeStage::Short).unwrap();
        assert_eq!(world.surface_tile(7, 6).unwrap(), Some(BushKind::Camellia.as_enchanted_bush()));

        world.set_bush(8, 6, BushKind::Camellia, FoliageAge::OldOne, GrowthTreeStage::Short).unwrap();
        assert_eq!(world.surface_tile(8, 6).unwrap(), Some(BushKind::Camellia.as_normal_bush()));
    }

    #[test]
    fn test_set_grass() {
        let mut world = small_world();

        world.set_surface_tile(8, 8, TileType::Grass).unwrap();
        assert!(world.set_grass(8, 8, GrowthStage::Wild, Some(FlowerType::Flower1)).unwrap());
        let grass = GrassData::decode(world.surface_data(8, 8).unwrap());
        assert_eq!(grass.stage, GrowthStage::Wild);
        assert_eq!(grass.kind, Some(GrassKind::Grass));
        assert_eq!(grass.flower, Some(FlowerType::Flower1));
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Grass));
        assert_eq!(world.surface_height(8, 8).unwrap(), 100);

        world.set_surface_tile(9, 8, TileType::Kelp).unwrap();
        assert!(world.set_grass(9, 8, GrowthStage::Medium, None).unwrap());
        let kelp = GrassData::decode(world.surface_data(9, 8).unwrap());
        assert_eq!(kelp.kind, Some(GrassKind::Kelp));
        assert_eq!(kelp.flower, Some(FlowerType::None));

        world.set_surface_tile(10, 8, TileType::Mycelium).unwrap();
        assert!(world.set_grass(10, 8, GrowthStage::Short, None).unwrap());
        assert_eq!(
            GrassData::decode(world.surface_data(10, 8).unwrap()).kind,
            Some(GrassKind::Grass)
        );
    }

    #[test]
    fn test_set_grass_no_ops() {
        let mut world = small_world();
        world.set_surface_tile(8, 8, TileType::Rock).unwrap();
        world.set_surface_tile(9, 8, TileType::Mycelium).unwrap();
        world.set_surface_tile(10, 8, TileType::Reed).unwrap();
        world.set_cave_tile(8, 8, TileType::CaveWallOreTin).unwrap();
        let before = snapshot(&world);

        assert!(!world.set_grass(8, 8, GrowthStage::Tall, None).unwrap());
        assert!(!world.set_grass(9, 8, GrowthStage::Tall, Some(FlowerType::Flower1)).unwrap());
        assert!(!world.set_grass(10, 8, GrowthStage::Tall, Some(FlowerType::Flower7)).unwrap());
        assert_eq!(snapshot(&world), before);

        // Unknown type ids are left alone as well.
        world.surface.set(11, 8, crate::codec::encode(100, 3, 0)).unwrap();
        assert!(!world.set_grass(11, 8, GrowthStage::Tall, None).unwrap());
    }

    #[test]
    fn test_set_rock_height() {
        let mut world = small_world();
        world.set_rock_height(3, 3, 42).unwrap();
        let cell = world.layer(Layer::Rock).get(3, 3).unwrap();
        assert_eq!(cell.height(), 42);
        assert_eq!(cell.tile(), Some(TileType::Rock));
        assert_eq!(cell.data(), 0);
    }

    #[test]
    fn test_set_cave_tile() {
        let mut world = small_world();
        world.set_cave_tile(5, 5, TileType::CaveWallMarble).unwrap();
        assert_eq!(world.cave_tile(5, 5).unwrap(), Some(TileType::CaveWallMarble));
        assert_eq!(world.layer(Layer::Cave).get(5, 5).unwrap().height(), 0);

        let before = snapshot(&world);
        for tile in [TileType::CaveFloor, TileType::CaveExit, TileType::Grass] {
            assert!(matches!(
                world.set_cave_tile(5, 5, tile),
                Err(WorldError::InvalidArgument(_))
            ));
        }
        assert_eq!(snapshot(&world), before);
    }

    #[test]
    fn test_dirt_layer_height_never_negative() {
        let mut world = small_world();
        world.set_rock_height(8, 8, 300).unwrap();
        assert_eq!(world.dirt_layer_height(8, 8).unwrap(), 0);

        world.set_surface_height(8, 8, i16::MAX).unwrap();
        world.set_rock_height(8, 8, i16::MIN).unwrap();
        assert_eq!(world.dirt_layer_height(8, 8).unwrap(), 65535);
    }

    #[test]
    fn test_sanitize_raises_surface_to_rock() {
        let mut world = small_world();
        world.set_surface_height(8, 8, 20).unwrap();
        world.set_rock_height(8, 8, 50).unwrap();

        let report = world.save_changes().unwrap();
        assert_eq!(world.surface_height(8, 8).unwrap(), 50);
        assert_eq!(report.raised, 1);
    }

    #[test]
    fn test_sanitize_exposed_block_becomes_rock() {
        let mut world = small_world();
        world.set_surface_tile(8, 8, TileType::Grass).unwrap();
        for (x, y) in [(8, 8), (9, 8), (8, 9), (9, 9)] {
            world.set_rock_height(x, y, 100).unwrap();
        }

        let report = world.save_changes().unwrap();
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Rock));
        assert_eq!(world.surface_height(8, 8).unwrap(), 100);
        assert_eq!(world.surface_data(8, 8).unwrap(), 0);
        assert_eq!(report.exposed, 1);
        assert_eq!(report.raised, 0);

        // Only the block's origin corner is re-typed.
        assert_eq!(world.surface_tile(9, 9).unwrap(), Some(TileType::Dirt));
    }

    #[test]
    fn test_sanitize_partial_block_untouched() {
        let mut world = small_world();
        for (x, y) in [(8, 8), (9, 8), (8, 9)] {
            world.set_rock_height(x, y, 100).unwrap();
        }
        let report = world.sanitize();
        assert_eq!(report.exposed, 0);
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Dirt));
    }

    #[test]
    fn test_sanitize_raise_feeds_exposure() {
        let mut world = small_world();
        for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
            world.set_rock_height(x, y, 500).unwrap();
        }
        let report = world.sanitize();
        assert_eq!(report.raised, 4);
        assert_eq!(report.exposed, 1);
        assert_eq!(world.surface_tile(4, 4).unwrap(), Some(TileType::Rock));
        assert_eq!(world.surface_height(4, 4).unwrap(), 500);
    }

    #[test]
    fn test_save_changes_persists_all_layers() {
        let mut world = small_world();
        world.save_changes().unwrap();
        for layer in Layer::ALL {
            let grid = world.layer(layer);
            assert_eq!(grid.store().save_count(), 1, "{layer}");
            assert_eq!(grid.store().saved().unwrap().cells, grid.cells());
        }
    }

    #[test]
    fn test_save_failure_is_recoverable() {
        let mut world = small_world();
        world.rock.store_mut().fail_saves(true);

        let err = world.save_changes().unwrap_err();
        assert!(matches!(err, WorldError::Layer { layer: Layer::Rock, .. }));
        // Other layers were still written.
        assert_eq!(world.layer(Layer::Cave).store().save_count(), 1);

        world.set_surface_tile(8, 8, TileType::Tundra).unwrap();
        world.rock.store_mut().fail_saves(false);
        world.save_changes().unwrap();
        assert_eq!(world.layer(Layer::Rock).store().save_count(), 1);
        assert_eq!(world.surface_tile(8, 8).unwrap(), Some(TileType::Tundra));
    }

    #[test]
    fn test_open_with_mismatched_layers() {
        let data = |power| crate::store::GridData::zeroed(power);
        let result = WorldModel::open_with(|layer| {
            MemoryStore::with_data(if layer == Layer::Cave { data(3) } else { data(2) })
        });
        assert!(matches!(
            result,
            Err(WorldError::LayerSizeMismatch { layer: Layer::Cave, expected: 4, actual: 8 })
        ));
    }

    #[test]
    fn test_close_releases_every_layer() {
        let world = small_world();
        let flags: Vec<_> = Layer::ALL.iter().map(|l| world.layer(*l).store().closed_flag()).collect();
        assert!(flags.iter().all(|closed| !closed.get()));

        world.close().unwrap();
        assert!(flags.iter().all(|closed| closed.get()));
    }

    #[test]
    fn test_close_continues_past_failure() {
        let mut world = small_world();
        world.rock.store_mut().fail_closes(true);
        world.resources.store_mut().fail_closes(true);
        let flags: Vec<_> = Layer::ALL.iter().map(|l| world.layer(*l).store().closed_flag()).collect();

        let err = world.close().unwrap_err();
        assert!(matches!(err, WorldError::Layer { layer: Layer::Rock, .. }));
        for (layer, closed) in Layer::ALL.iter().zip(&flags) {
            assert!(closed.get(), "{layer} layer left open");
        }
    }

    #[test]
    fn test_sanitize_adjacent_exposed_blocks() {
        let mut world = small_world();
        // A 3x2 bare patch holds two overlapping 2x2 blocks.
        for (x, y) in [(7, 7), (8, 7), (9, 7), (7, 8), (8, 8), (9, 8)] {
            world.set_rock_height(x, y, 100).unwrap();
        }

        let report = world.sanitize();
        assert_eq!(report.exposed, 2);
        assert_eq!(world.surface_tile(7, 7).unwrap(), Some(TileType::Rock));
        assert_eq!(world.surface_tile(8, 7).unwrap(), Some(TileType::Rock));
        assert_eq!(world.surface_tile(9, 7).unwrap(), Some(TileType::Dirt));
        assert_eq!(world.surface_tile(7, 8).unwrap(), Some(TileType::Dirt));
    }

    #[test]
    fn test_world_create_rejects_sizes() {
        let dir = tempdir().unwrap();
        for power in [0, 9, 16] {
            assert!(matches!(
                World::create(dir.path(), power),
                Err(WorldError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_world_create_save_open() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("world");

        let mut world = World::create(&root, 10).unwrap();
        assert_eq!(world.root(), root.as_path());
        world.map_mut().set_surface_tile(512, 512, TileType::Grass).unwrap();
        world.map_mut().set_rock_height(100, 100, 400).unwrap();
        world.map_mut().save_changes().unwrap();
        world.close().unwrap();

        for layer in Layer::ALL {
            assert!(root.join(layer.file_name()).exists());
        }

        let world = World::open(&root).unwrap();
        assert_eq!(world.map().side(), 1024);
        assert_eq!(world.map().surface_tile(512, 512).unwrap(), Some(TileType::Grass));
        assert_eq!(world.map().surface_height(100, 100).unwrap(), 400);
        assert_eq!(world.map().cave_tile(0, 0).unwrap(), Some(TileType::CaveWall));
        world.close().unwrap();
    }

    #[test]
    fn test_world_open_missing_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            World::open(dir.path().join("empty")),
            Err(WorldError::Layer { layer: Layer::Surface, .. })
        ));
    }
}
