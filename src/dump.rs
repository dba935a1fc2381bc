//! Map dump rendering
//!
//! Turns the surface or cave layer into an RGB image. All renderers are
//! read-only over the world. Worlds larger than the configured maximum side are
//! rendered through a square window at a random offset.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::codec::Cell;
use crate::config::{DumpConfig, DumpMode, MAX_DUMP_SIDE};
use crate::palette::Palette;
use crate::world::{Layer, WorldModel};

/// Heights are normalized by this before shading.
const HEIGHT_SCALE: f32 = i16::MAX as f32 / 3.3;
/// Vertical exaggeration of the relief view.
const MAP_HEIGHT: i32 = 1000;
/// Blend target for tiles below sea level.
const WATER_TINT: [f32; 3] = [0.4, 0.5, 1.0];

/// Square region of the grid that ends up in the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingWindow {
    pub x: usize,
    pub y: usize,
    pub size: usize,
}

impl SamplingWindow {
    /// Whole grid if it fits, otherwise a `max_side` window with a uniformly drawn
    /// offset per axis. The RNG is only consulted when the grid is too large.
    pub fn choose<R: Rng + ?Sized>(side: usize, max_side: usize, rng: &mut R) -> Self {
        let size = side.min(max_side.max(1));
        if size == side {
            return Self { x: 0, y: 0, size };
        }
        let slack = side - size;
        let x = rng.gen_range(0..=slack);
        let y = rng.gen_range(0..=slack);
        Self { x, y, size }
    }
}

/// Whether a contour line runs between a location of height `h0` and its
/// neighbour of height `h1`: the heights differ and a multiple of `interval`
/// lies in `h0..=h1`. The test is directional, so a descending edge never
/// reports a line. An interval of zero disables contours.
pub fn check_contour_line(h0: i16, h1: i16, interval: u16) -> bool {
    if interval == 0 || h0 >= h1 {
        return false;
    }
    let (h0, h1, interval) = (i32::from(h0), i32::from(h1), i32::from(interval));
    h1.div_euclid(interval) * interval >= h0
}

fn water_blend(color: Rgb<u8>) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for ((o, c), tint) in out.iter_mut().zip(color.0).zip(WATER_TINT) {
        *o = (f32::from(c) * 0.2 + tint * 0.4 * 256.0) as u8;
    }
    Rgb(out)
}

pub struct DumpRenderer<'p, P: ?Sized> {
    palette: &'p P,
    rng: ChaCha8Rng,
    max_side: usize,
}

impl<'p, P: Palette + ?Sized> DumpRenderer<'p, P> {
    pub fn new(palette: &'p P) -> Self {
        Self {
            palette,
            rng: ChaCha8Rng::from_entropy(),
            max_side: MAX_DUMP_SIDE,
        }
    }

    /// Use a fixed seed for the sampling window.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_max_side(mut self, max_side: usize) -> Self {
        self.max_side = max_side.max(1);
        self
    }

    pub fn from_config(palette: &'p P, config: &DumpConfig) -> Self {
        let renderer = Self::new(palette).with_max_side(config.max_side);
        match config.seed {
            Some(seed) => renderer.with_seed(seed),
            None => renderer,
        }
    }

    /// Render in the mode selected by `config`.
    pub fn render<S>(&mut self, world: &WorldModel<S>, config: &DumpConfig) -> RgbImage {
        match config.mode {
            DumpMode::Relief => self.render_relief(world),
            DumpMode::Flat => self.render_terrain(world, config.show_water),
            DumpMode::Topographic => {
                self.render_topographic(world, config.show_water, config.contour_interval)
            }
            DumpMode::Cave => self.render_cave(world),
        }
    }

    fn window(&mut self, side: usize) -> SamplingWindow {
        let window = SamplingWindow::choose(side, self.max_side, &mut self.rng);
        debug!(
            "Rendering {}x{} window at ({}, {}) of a {}x{} grid",
            window.size, window.size, window.x, window.y, side, side
        );
        window
    }

    fn surface_color(&self, cell: Cell) -> Rgb<u8> {
        match cell.tile() {
            Some(tile) => self.palette.surface_color(tile),
            None => self.palette.surface_unknown(),
        }
    }

    /// Classic pseudo-3d view: hill-shaded colours, with each column drawn from
    /// the far edge forward and lifted by terrain height.
    pub fn render_relief<S>(&mut self, world: &WorldModel<S>) -> RgbImage {
        let surface = world.layer(Layer::Surface);
        let side = surface.side();
        let window = self.window(side);
        let size = window.size;
        let mut img: RgbImage = ImageBuffer::new(size as u32, size as u32);

        // Slope contrast grows with the size of the whole world, not the window.
        let slope_scale = 1500.0 / 256.0 * side as f32 / 128.0;

        for x in 0..size {
            let mut alt = size as i64 - 1;
            for y in (0..size).rev() {
                let cell = surface.at(window.x + x, window.y + y);
                let node = f32::from(cell.height()) / HEIGHT_SCALE;
                let node2 = if x == size - 1 || y == size - 1 {
                    node
                } else {
                    f32::from(surface.at(window.x + x + 1, window.y + y + 1).height()) / HEIGHT_SCALE
                };

                let light = 0.4 * ((node2 - node) * slope_scale + node / 2.0 + 1.0);
                let color = self.surface_color(cell);
                let mut rgb = color.0.map(|c| (light * (f32::from(c) / 255.0) * 2.0).clamp(0.0, 1.0));
                if node < 0.0 {
                    for (c, tint) in rgb.iter_mut().zip(WATER_TINT) {
                        *c = *c * 0.2 + tint * 0.4;
                    }
                }
                let pixel = Rgb(rgb.map(|c| (c * 255.0) as u8));

                let lift = (i32::from(cell.height()) * MAP_HEIGHT / 4) as f32 / HEIGHT_SCALE;
                let target = y as i64 - lift as i64;
                while alt > target && alt >= 0 {
                    img.put_pixel(x as u32, alt as u32, pixel);
                    alt -= 1;
                }
            }
        }

        img
    }

    /// Flat terrain colours, optionally tinting everything below sea level.
    pub fn render_terrain<S>(&mut self, world: &WorldModel<S>, show_water: bool) -> RgbImage {
        let surface = world.layer(Layer::Surface);
        let window = self.window(surface.side());
        let size = window.size;
        let mut img: RgbImage = ImageBuffer::new(size as u32, size as u32);

        for y in 0..size {
            for x in 0..size {
                let cell = surface.at(window.x + x, window.y + y);
                let color = self.surface_color(cell);
                let pixel = if show_water && cell.height() < 0 {
                    water_blend(color)
                } else {
                    color
                };
                img.put_pixel(x as u32, y as u32, pixel);
            }
        }

        img
    }

    /// Flat terrain with black contour lines every `interval` height units.
    pub fn render_topographic<S>(
        &mut self,
        world: &WorldModel<S>,
        show_water: bool,
        interval: u16,
    ) -> RgbImage {
        let surface = world.layer(Layer::Surface);
        let window = self.window(surface.side());
        let size = window.size;
        let mut img: RgbImage = ImageBuffer::new(size as u32, size as u32);

        let height = |x: usize, y: usize| surface.at(window.x + x, window.y + y).height();

        for y in 0..size {
            for x in 0..size {
                let h = height(x, y);
                // Window edges compare against the centre itself.
                let neighbours = [
                    if x == 0 { h } else { height(x - 1, y) },
                    if y == 0 { h } else { height(x, y - 1) },
                    if x == size - 1 { h } else { height(x + 1, y) },
                    if y == size - 1 { h } else { height(x, y + 1) },
                ];
                let contour = neighbours
                    .iter()
                    .any(|&near| check_contour_line(h, near, interval));

                let pixel = if contour {
                    Rgb([0, 0, 0])
                } else {
                    let color = self.surface_color(surface.at(window.x + x, window.y + y));
                    if show_water && h < 0 {
                        water_blend(color)
                    } else {
                        color
                    }
                };
                img.put_pixel(x as u32, y as u32, pixel);
            }
        }

        img
    }

    /// Cave layer through the palette's cave table.
    pub fn render_cave<S>(&mut self, world: &WorldModel<S>) -> RgbImage {
        let cave = world.layer(Layer::Cave);
        let window = self.window(cave.side());
        let size = window.size;
        let mut img: RgbImage = ImageBuffer::new(size as u32, size as u32);

        for y in 0..size {
            for x in 0..size {
                let pixel = match cave.at(window.x + x, window.y + y).tile() {
                    Some(tile) => self.palette.cave_color(tile),
                    None => self.palette.cave_unknown(),
                };
                img.put_pixel(x as u32, y as u32, pixel);
            }
        }

        img
    }
}

/// Render a dump as configured and write it to `path`. The format follows the extension.
pub fn export_dump<S, P: Palette + ?Sized>(
    world: &WorldModel<S>,
    palette: &P,
    config: &DumpConfig,
    path: impl AsRef<Path>,
) -> Result<(), image::ImageError> {
    let img = DumpRenderer::from_config(palette, config).render(world, config);
    img.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::DefaultPalette;
    use crate::store::MemoryStore;
    use crate::tiles::TileType;

    fn uniform_world(power: u32, tile: TileType, height: i16) -> WorldModel<MemoryStore> {
        let mut world = WorldModel::create_with(power, |_| MemoryStore::new()).unwrap();
        let side = world.side();
        for y in 0..side {
            for x in 0..side {
                world.set_surface_tile_with_height(x, y, tile, height).unwrap();
            }
        }
        world
    }

    #[test]
    fn test_check_contour_line() {
        assert!(check_contour_line(8, 12, 5));
        assert!(!check_contour_line(8, 9, 5));
        assert!(!check_contour_line(5, 5, 5));
        assert!(check_contour_line(9, 10, 5));
        assert!(check_contour_line(10, 11, 5));
        // Directional: the descending edge has no line.
        assert!(!check_contour_line(12, 8, 5));
        assert!(check_contour_line(-7, -3, 5));
        assert!(!check_contour_line(-4, -1, 5));
        assert!(check_contour_line(i16::MIN, i16::MAX, u16::MAX));
        assert!(!check_contour_line(0, 100, 0));
    }

    #[test]
    fn test_sampling_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            SamplingWindow::choose(1024, MAX_DUMP_SIDE, &mut rng),
            SamplingWindow { x: 0, y: 0, size: 1024 }
        );

        for _ in 0..100 {
            let window = SamplingWindow::choose(16, 4, &mut rng);
            assert_eq!(window.size, 4);
            assert!(window.x <= 12 && window.y <= 12);
        }
    }

    #[test]
    fn test_flat_water_blend() {
        let palette = DefaultPalette;
        let world = WorldModel::create_with(4, |_| MemoryStore::new()).unwrap();
        let dirt = palette.surface_color(TileType::Dirt);

        let wet = DumpRenderer::new(&palette).render_terrain(&world, true);
        assert_eq!(wet.dimensions(), (16, 16));
        // Rim is below sea level, the centre is dry.
        assert_eq!(*wet.get_pixel(0, 0), water_blend(dirt));
        assert_eq!(*wet.get_pixel(8, 8), dirt);
        let Rgb([r, g, b]) = water_blend(dirt);
        assert_eq!((r, g, b), (55, 63, 111));

        let dry = DumpRenderer::new(&palette).render_terrain(&world, false);
        assert_eq!(*dry.get_pixel(0, 0), dirt);
    }

    #[test]
    fn test_small_world_renders_identically() {
        let palette = DefaultPalette;
        let world = WorldModel::create_with(5, |_| MemoryStore::new()).unwrap();
        for mode in [DumpMode::Relief, DumpMode::Flat, DumpMode::Topographic, DumpMode::Cave] {
            let config = DumpConfig { mode, ..DumpConfig::default() };
            let first = DumpRenderer::from_config(&palette, &config).render(&world, &config);
            let second = DumpRenderer::from_config(&palette, &config).render(&world, &config);
            assert_eq!(first.dimensions(), (32, 32));
            assert_eq!(first, second, "{mode:?}");
        }
    }

    #[test]
    fn test_window_offset_applied() {
        let palette = DefaultPalette;
        let tiles = [TileType::Sand, TileType::Grass, TileType::Clay, TileType::Moss, TileType::Snow];
        let mut world = WorldModel::create_with(4, |_| MemoryStore::new()).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                world
                    .set_surface_tile_with_height(x, y, tiles[(x * 3 + y) % tiles.len()], 10)
                    .unwrap();
            }
        }

        let window = SamplingWindow::choose(16, 4, &mut ChaCha8Rng::seed_from_u64(99));
        let img = DumpRenderer::new(&palette)
            .with_seed(99)
            .with_max_side(4)
            .render_terrain(&world, true);
        assert_eq!(img.dimensions(), (4, 4));
        for y in 0..4 {
            for x in 0..4 {
                let tile = world.surface_tile(window.x + x, window.y + y).unwrap().unwrap();
                assert_eq!(*img.get_pixel(x as u32, y as u32), palette.surface_color(tile));
            }
        }
    }

    #[test]
    fn test_topographic_contours() {
        let palette = DefaultPalette;
        let world = WorldModel::create_with(4, |_| MemoryStore::new()).unwrap();
        let img = DumpRenderer::new(&palette).render_topographic(&world, true, 10);
        let dirt = palette.surface_color(TileType::Dirt);

        // Sea floor next to the raised centre gets the line, over water.
        assert_eq!(*img.get_pixel(5, 8), Rgb([0, 0, 0]));
        // The raised side of the edge does not.
        assert_eq!(*img.get_pixel(6, 8), dirt);
        assert_eq!(*img.get_pixel(2, 2), water_blend(dirt));

        let plain = DumpRenderer::new(&palette).render_topographic(&world, true, 0);
        assert_eq!(*plain.get_pixel(5, 8), water_blend(dirt));
    }

    #[test]
    fn test_relief_flat_land() {
        let palette = DefaultPalette;
        let world = uniform_world(3, TileType::Grass, 0);
        let img = DumpRenderer::new(&palette).render_relief(&world);

        // The paint front never reaches the top row of a flat map.
        for x in 0..8 {
            assert_eq!(*img.get_pixel(x, 0), Rgb([0, 0, 0]));
        }
        let lit = *img.get_pixel(3, 4);
        assert_ne!(lit, Rgb([0, 0, 0]));
        assert!(lit.0[1] > lit.0[0] && lit.0[1] > lit.0[2]);
    }

    #[test]
    fn test_relief_water() {
        let palette = DefaultPalette;
        let world = uniform_world(3, TileType::Grass, -1);
        let img = DumpRenderer::new(&palette).render_relief(&world);
        let Rgb([r, g, b]) = *img.get_pixel(3, 4);
        assert!(b > r && b > g);
    }

    #[test]
    fn test_relief_extrusion_and_shading() {
        let palette = DefaultPalette;
        let mut world = uniform_world(3, TileType::Grass, 0);
        world.set_surface_height(3, 4, 3000).unwrap();
        world.set_surface_height(7, 2, 3000).unwrap();
        let img = DumpRenderer::new(&palette).render_relief(&world);

        let flat = Rgb([43, 80, 2]);
        // Lifted 75 rows, so the tile paints every row from 5 up to the top.
        for y in 0..=5 {
            assert_eq!(*img.get_pixel(3, y), Rgb([44, 84, 2]), "row {y}");
        }
        assert_eq!(*img.get_pixel(3, 6), flat);
        assert_eq!(*img.get_pixel(3, 7), flat);

        // (2, 3) faces the raised tile diagonally below it and is drawn one row down.
        assert_eq!(*img.get_pixel(2, 4), Rgb([47, 89, 2]));
        assert_eq!(*img.get_pixel(2, 5), flat);

        // The last column has no diagonal neighbour and shades against itself.
        for y in 0..=3 {
            assert_eq!(*img.get_pixel(7, y), Rgb([49, 93, 2]), "row {y}");
        }
        assert_eq!(*img.get_pixel(7, 4), flat);
    }

    #[test]
    fn test_cave_render() {
        let palette = DefaultPalette;
        let mut world = WorldModel::create_with(3, |_| MemoryStore::new()).unwrap();
        world.set_cave_tile(2, 3, TileType::CaveWallOreGold).unwrap();
        let img = DumpRenderer::new(&palette).render_cave(&world);
        assert_eq!(*img.get_pixel(2, 3), palette.cave_color(TileType::CaveWallOreGold));
        assert_eq!(*img.get_pixel(0, 0), palette.cave_color(TileType::CaveWall));
    }

    #[test]
    fn test_export_dump_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.png");
        let world = WorldModel::create_with(3, |_| MemoryStore::new()).unwrap();
        let config = DumpConfig { mode: DumpMode::Flat, ..DumpConfig::default() };
        export_dump(&world, &DefaultPalette, &config, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 8));
    }
}
