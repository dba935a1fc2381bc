//! Grid persistence
//!
//! A `GridStore` owns the backing resource of one layer. `MeshFile` keeps a layer
//! in a file on disk, `MemoryStore` keeps it in memory.
//!
//! Layer file layout (all integers big-endian):
//! - 4 bytes magic `TMSH`
//! - 1 byte format version
//! - 1 byte power of two of the side length
//! - 2 reserved zero bytes
//! - side * side cells, row-major, 4 bytes each

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::codec::Cell;

pub const MESH_MAGIC: [u8; 4] = *b"TMSH";
pub const MESH_VERSION: u8 = 1;
pub const MESH_HEADER_LEN: usize = 8;

/// Largest supported side length exponent.
pub const MAX_POWER_OF_TWO: u32 = 15;

/// Side length and cells of one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridData {
    pub side: usize,
    pub cells: Vec<Cell>,
}

impl GridData {
    /// Zero-filled grid of side `2^power_of_two`.
    pub fn zeroed(power_of_two: u32) -> Self {
        let side = 1usize << power_of_two;
        Self {
            side,
            cells: vec![Cell::default(); side * side],
        }
    }
}

/// Backing resource of one layer.
pub trait GridStore {
    /// Load an existing layer.
    fn load(&mut self) -> io::Result<GridData>;

    /// Reset the layer to a zero-filled grid of side `2^power_of_two`, discarding
    /// anything stored before.
    fn create(&mut self, power_of_two: u32) -> io::Result<GridData>;

    fn save(&mut self, side: usize, cells: &[Cell]) -> io::Result<()>;

    /// Release the resource. Saving after close fails.
    fn close(&mut self) -> io::Result<()>;
}

fn check_power(power_of_two: u32) -> io::Result<()> {
    if power_of_two == 0 || power_of_two > MAX_POWER_OF_TWO {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported grid size 2^{}", power_of_two),
        ));
    }
    Ok(())
}

fn check_payload(side: usize, cells: &[Cell]) -> io::Result<u32> {
    if !side.is_power_of_two() || cells.len() != side * side {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} cells do not form a grid of side {}", cells.len(), side),
        ));
    }
    let power_of_two = side.trailing_zeros();
    check_power(power_of_two)?;
    Ok(power_of_two)
}

/// A layer stored in a single file.
///
/// Loading opens the file read-only, so worlds that are only inspected or
/// rendered need no write permission. The first save reopens it for writing.
#[derive(Debug)]
pub struct MeshFile {
    path: PathBuf,
    file: Option<File>,
    writable: bool,
}

impl MeshFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            writable: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn invalid_data(&self, message: impl std::fmt::Display) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", self.path.display(), message),
        )
    }
}

impl GridStore for MeshFile {
    fn load(&mut self) -> io::Result<GridData> {
        let mut file = File::open(&self.path)?;

        let mut header = [0u8; MESH_HEADER_LEN];
        file.read_exact(&mut header)
            .map_err(|e| self.invalid_data(format!("truncated header ({})", e)))?;
        if header[0..4] != MESH_MAGIC {
            return Err(self.invalid_data("not a layer file"));
        }
        if header[4] > MESH_VERSION {
            return Err(self.invalid_data(format!(
                "format version {} is newer than supported version {}",
                header[4], MESH_VERSION
            )));
        }
        let power_of_two = u32::from(header[5]);
        check_power(power_of_two).map_err(|e| self.invalid_data(e))?;

        let mut data = GridData::zeroed(power_of_two);
        file.read_exact(bytemuck::cast_slice_mut(&mut data.cells))
            .map_err(|e| self.invalid_data(format!("truncated cell data ({})", e)))?;
        for cell in &mut data.cells {
            cell.0 = u32::from_be(cell.0);
        }

        self.file = Some(file);
        self.writable = false;
        Ok(data)
    }

    fn create(&mut self, power_of_two: u32) -> io::Result<GridData> {
        check_power(power_of_two)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.writable = true;

        let data = GridData::zeroed(power_of_two);
        self.save(data.side, &data.cells)?;
        Ok(data)
    }

    fn save(&mut self, side: usize, cells: &[Cell]) -> io::Result<()> {
        let power_of_two = check_payload(side, cells)?;
        let file = match self.file.as_mut() {
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    format!("{} is closed", self.path.display()),
                ))
            }
            Some(file) if self.writable => file,
            Some(file) => {
                *file = OpenOptions::new().read(true).write(true).open(&self.path)?;
                self.writable = true;
                file
            }
        };

        let header = [
            MESH_MAGIC[0],
            MESH_MAGIC[1],
            MESH_MAGIC[2],
            MESH_MAGIC[3],
            MESH_VERSION,
            power_of_two as u8,
            0,
            0,
        ];
        let big_endian: Vec<u32> = cells.iter().map(|cell| cell.0.to_be()).collect();

        file.seek(SeekFrom::Start(0))?;
        {
            let mut writer = BufWriter::new(&mut *file);
            writer.write_all(&header)?;
            writer.write_all(bytemuck::cast_slice(&big_endian))?;
            writer.flush()?;
        }
        file.set_len((MESH_HEADER_LEN + cells.len() * 4) as u64)?;
        file.sync_data()
    }

    fn close(&mut self) -> io::Result<()> {
        let writable = std::mem::take(&mut self.writable);
        match self.file.take() {
            Some(file) if writable => file.sync_all(),
            _ => Ok(()),
        }
    }
}

/// In-memory layer. `saved` plays the role of the file contents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<GridData>,
    save_count: usize,
    fail_saves: bool,
    fail_closes: bool,
    closed: Rc<std::cell::Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a layer, as if a file existed.
    pub fn with_data(data: GridData) -> Self {
        Self {
            saved: Some(data),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Make subsequent closes report an I/O error. The store is still released.
    pub fn fail_closes(&mut self, fail: bool) {
        self.fail_closes = fail;
    }

    /// Handle that keeps reporting whether the store is closed after the store
    /// itself has been moved or dropped.
    pub fn closed_flag(&self) -> Rc<std::cell::Cell<bool>> {
        Rc::clone(&self.closed)
    }

    pub fn saved(&self) -> Option<&GridData> {
        self.saved.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl GridStore for MemoryStore {
    fn load(&mut self) -> io::Result<GridData> {
        self.closed.set(false);
        self.saved
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no layer stored"))
    }

    fn create(&mut self, power_of_two: u32) -> io::Result<GridData> {
        check_power(power_of_two)?;
        let data = GridData::zeroed(power_of_two);
        self.saved = Some(data.clone());
        self.closed.set(false);
        Ok(data)
    }

    fn save(&mut self, side: usize, cells: &[Cell]) -> io::Result<()> {
        check_payload(side, cells)?;
        if self.closed.get() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "store is closed"));
        }
        if self.fail_saves {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }
        self.saved = Some(GridData {
            side,
            cells: cells.to_vec(),
        });
        self.save_count += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.set(true);
        if self.fail_closes {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated close failure"));
        }
        Ok(())
    }
}
