use crate::{
    io::{read_nbt, write_nbt, Flavor, NbtIoError},
    raw, NbtTag,
};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::{
    collections::BTreeSet,
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    ops::Range,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
    vec,
};

/// Number of bytes in a region file sector.
const SECTOR_SIZE: usize = 4096;

/// Number of addressable chunk slots in a region file.
const SLOT_COUNT: usize = 1024;

const GZIP_SCHEME: u8 = 1;
const ZLIB_SCHEME: u8 = 2;

/// Information concerning a single chunk, stored in the header sectors of the region file.
///
/// The first header sector packs the offset and length into a single location word per slot;
/// the second holds the update timestamps.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct ChunkMetadata {
    /// Offset, in sectors, from the start of the file.
    offset: u32,
    /// Number of sectors occupied by the chunk. Zero marks an empty slot.
    length: u32,
    /// Seconds since the epoch of the last update.
    timestamp: u32,
}

impl ChunkMetadata {
    fn unpack(location: i32, timestamp: i32) -> Self {
        let location = location as u32;
        ChunkMetadata {
            offset: location >> 8,
            length: location & 0xFF,
            timestamp: timestamp as u32,
        }
    }

    fn location(&self) -> i32 {
        ((self.offset << 8) | self.length) as i32
    }

    fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn sectors(&self) -> Range<usize> {
        self.offset as usize .. self.offset as usize + self.length as usize
    }
}

/// A random-access container of up to 1024 NBT values, stored in the Region (Anvil) file
/// format.
///
/// The file is structured in 4 KiB sectors: two header sectors holding per-slot location words
/// and timestamps, followed by the compressed payloads. Saving reuses freed sectors whenever a
/// low enough contiguous run is available and appends to the file otherwise, so payloads are
/// never relocated.
///
/// A region opened by path owns the underlying file for its entire lifetime, and removes the
/// file on drop once every slot has been wiped. Regions wrapping a plain byte stream are never
/// removed.
///
/// # Examples
///
/// ```no_run
/// # use mica_nbt::{region::Region, NbtCompound, NbtTag};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut region = Region::open("r.0.0.mca")?;
///
/// let mut chunk = NbtCompound::new();
/// chunk.insert("xPos", 0)?;
/// region.save(0, &NbtTag::Compound(chunk))?;
///
/// assert!(region.load(0)?.is_some());
/// assert_eq!(region.indexes().collect::<Vec<usize>>(), vec![0]);
/// # Ok(())
/// # }
/// ```
pub struct Region<S: Read + Write + Seek = File> {
    flow: S,
    path: Option<PathBuf>,
    sector_count: usize,
    free_sectors: BTreeSet<usize>,
    slots: Vec<ChunkMetadata>,
}

impl Region<File> {
    /// Opens the region file at the given path for reading and writing, creating an empty one
    /// if no file exists there.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegionError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Region::with_flow(file, Some(path.to_owned()))
    }
}

impl<S: Read + Write + Seek> Region<S> {
    /// Wraps an existing byte stream holding region data, or initializes an empty region into
    /// the stream if it holds no complete sector. Streams are not removed on drop.
    pub fn from_stream(stream: S) -> Result<Self, RegionError> {
        Region::with_flow(stream, None)
    }

    fn with_flow(mut flow: S, path: Option<PathBuf>) -> Result<Self, RegionError> {
        let len = flow.seek(SeekFrom::End(0))? as usize;
        let sector_count = len / SECTOR_SIZE;

        // Fresh files start out as two zeroed header sectors
        if sector_count == 0 {
            flow.seek(SeekFrom::Start(0))?;
            flow.write_all(&[0u8; SECTOR_SIZE])?;
            flow.write_all(&[0u8; SECTOR_SIZE])?;

            return Ok(Region {
                flow,
                path,
                sector_count: 2,
                free_sectors: BTreeSet::new(),
                slots: vec![ChunkMetadata::default(); SLOT_COUNT],
            });
        }

        if sector_count < 2 {
            return Err(RegionError::HeaderTruncated);
        }

        flow.seek(SeekFrom::Start(0))?;
        let mut locations = Vec::with_capacity(SLOT_COUNT);
        for _ in 0 .. SLOT_COUNT {
            locations.push(raw::read_i32(&mut flow)?);
        }
        let mut timestamps = Vec::with_capacity(SLOT_COUNT);
        for _ in 0 .. SLOT_COUNT {
            timestamps.push(raw::read_i32(&mut flow)?);
        }

        let mut free_sectors: BTreeSet<usize> = (2 .. sector_count).collect();
        let mut slots = Vec::with_capacity(SLOT_COUNT);
        for (index, (&location, &timestamp)) in
            locations.iter().zip(timestamps.iter()).enumerate()
        {
            let meta = ChunkMetadata::unpack(location, timestamp);
            for sector in meta.sectors() {
                // The header sectors are never free, and no two chunks may share a sector
                if !free_sectors.remove(&sector) {
                    return Err(RegionError::CorruptLocation(index));
                }
            }
            slots.push(meta);
        }

        Ok(Region {
            flow,
            path,
            sector_count,
            free_sectors,
            slots,
        })
    }

    /// Loads the value stored at the given index, or `None` if the slot is empty.
    pub fn load(&mut self, index: usize) -> Result<Option<NbtTag>, RegionError> {
        if index >= SLOT_COUNT {
            return Err(RegionError::IndexOutOfRange(index));
        }

        let meta = self.slots[index];
        if meta.is_empty() {
            return Ok(None);
        }

        self.flow
            .seek(SeekFrom::Start(meta.offset as u64 * SECTOR_SIZE as u64))?;
        let payload_len = raw::read_i32(&mut self.flow)?;
        if payload_len < 1 {
            return Err(RegionError::CorruptChunk(index));
        }

        let scheme = raw::read_u8(&mut self.flow)?;
        let mut compressed = vec![0u8; payload_len as usize - 1];
        self.flow.read_exact(&mut compressed)?;

        let mut bytes = Vec::new();
        match scheme {
            GZIP_SCHEME => GzDecoder::new(&compressed[..]).read_to_end(&mut bytes),
            ZLIB_SCHEME => ZlibDecoder::new(&compressed[..]).read_to_end(&mut bytes),
            scheme => return Err(RegionError::UnknownCompression(scheme)),
        }
        .map_err(RegionError::Compression)?;

        let (value, _root_name) = read_nbt(&mut bytes.as_slice(), Flavor::Uncompressed)?;
        Ok(Some(value))
    }

    /// Stores the given value at the given index, replacing whatever the slot held before.
    ///
    /// The value is encoded as an anonymous named tag and zlib-compressed. The lowest run of
    /// contiguous free sectors large enough for the payload is reused when one exists,
    /// otherwise the file grows by the needed amount. The slot's header words are only updated
    /// after the payload has been written.
    pub fn save(&mut self, index: usize, value: &NbtTag) -> Result<(), RegionError> {
        if index >= SLOT_COUNT {
            return Err(RegionError::IndexOutOfRange(index));
        }

        let mut compressed = Vec::new();
        write_nbt(&mut compressed, None, value, Flavor::ZlibCompressed)?;

        let total = compressed.len() + 5;
        let needed = (total + SECTOR_SIZE - 1) / SECTOR_SIZE;
        if needed > 0xFF {
            return Err(RegionError::ChunkTooLarge(needed));
        }

        // Sectors of the previous payload become eligible for reuse immediately
        for sector in self.slots[index].sectors() {
            self.free_sectors.insert(sector);
        }

        let mut first = None;
        for &start in self.free_sectors.iter() {
            if (start .. start + needed).all(|sector| self.free_sectors.contains(&sector)) {
                first = Some(start);
                break;
            }
        }

        let (offset, appended) = match first {
            Some(start) => {
                for sector in start .. start + needed {
                    self.free_sectors.remove(&sector);
                }
                (start, false)
            }
            None => {
                let start = self.sector_count;
                self.sector_count += needed;
                (start, true)
            }
        };

        // Payload first; the header is only updated once the data is in place
        self.flow
            .seek(SeekFrom::Start((offset * SECTOR_SIZE) as u64))?;
        raw::write_i32(&mut self.flow, (total - 4) as i32)?;
        raw::write_u8(&mut self.flow, ZLIB_SCHEME)?;
        self.flow.write_all(&compressed)?;
        if appended {
            let padding = (SECTOR_SIZE - total % SECTOR_SIZE) % SECTOR_SIZE;
            self.flow.write_all(&vec![0u8; padding])?;
        }

        let meta = ChunkMetadata {
            offset: offset as u32,
            length: needed as u32,
            timestamp: timestamp_now(),
        };
        self.write_slot_header(index, meta)?;
        self.slots[index] = meta;
        Ok(())
    }

    /// Removes the value stored at the given index, freeing its sectors for reuse. Wiping an
    /// empty slot is a no-op.
    pub fn wipe(&mut self, index: usize) -> Result<(), RegionError> {
        if index >= SLOT_COUNT {
            return Err(RegionError::IndexOutOfRange(index));
        }

        if self.slots[index].is_empty() {
            return Ok(());
        }

        for sector in self.slots[index].sectors() {
            self.free_sectors.insert(sector);
        }

        // Zeroing the length is all it takes to mark the slot empty on disk
        let mut meta = self.slots[index];
        meta.length = 0;
        meta.timestamp = timestamp_now();
        self.write_slot_header(index, meta)?;
        self.slots[index] = meta;
        Ok(())
    }

    fn write_slot_header(&mut self, index: usize, meta: ChunkMetadata) -> Result<(), RegionError> {
        self.flow.seek(SeekFrom::Start((4 * index) as u64))?;
        raw::write_i32(&mut self.flow, meta.location())?;
        self.flow
            .seek(SeekFrom::Start((SECTOR_SIZE + 4 * index) as u64))?;
        raw::write_i32(&mut self.flow, meta.timestamp as i32)?;
        Ok(())
    }

    /// Iterates in ascending order over the indexes of the populated slots.
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, meta)| !meta.is_empty())
            .map(|(index, _)| index)
    }

    /// Iterates over the populated slots in ascending index order, loading each one.
    pub fn chunks(&mut self) -> Chunks<'_, S> {
        let indexes: Vec<usize> = self.indexes().collect();
        Chunks {
            region: self,
            indexes: indexes.into_iter(),
        }
    }

    /// Returns the number of populated slots.
    pub fn len(&self) -> usize {
        self.indexes().count()
    }

    /// Returns true if no slot is populated, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(ChunkMetadata::is_empty)
    }

    /// The path of the file backing this region, or `None` for a region wrapping a plain byte
    /// stream.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<S: Read + Write + Seek> Debug for Region<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("path", &self.path)
            .field("sector_count", &self.sector_count)
            .field("chunks", &self.len())
            .finish_non_exhaustive()
    }
}

impl<S: Read + Write + Seek> Drop for Region<S> {
    fn drop(&mut self) {
        // The unlink is deferred to teardown so wiped slots can be refilled mid-session
        if let Some(path) = &self.path {
            if self.slots.iter().all(ChunkMetadata::is_empty) {
                log::info!("Removing emptied region file {}", path.display());
                let _ = fs::remove_file(path);
            }
        }
    }
}

/// An iterator over the populated slots of a region, yielding each index paired with its
/// loaded value. Returned by [`Region::chunks`](crate::region::Region::chunks).
pub struct Chunks<'a, S: Read + Write + Seek = File> {
    region: &'a mut Region<S>,
    indexes: vec::IntoIter<usize>,
}

impl<S: Read + Write + Seek> Iterator for Chunks<'_, S> {
    type Item = Result<(usize, NbtTag), RegionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let index = self.indexes.next()?;
            match self.region.load(index) {
                Ok(Some(value)) => return Some(Ok((index, value))),
                Ok(None) => continue,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

impl<S: Read + Write + Seek> Debug for Chunks<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunks")
            .field("remaining", &self.indexes.len())
            .finish_non_exhaustive()
    }
}

fn timestamp_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}

/// Describes an error which occurred while operating on a region file.
#[derive(Debug)]
pub enum RegionError {
    /// A native I/O error.
    StdIo(io::Error),
    /// An error encoding or decoding a chunk's NBT payload.
    Nbt(NbtIoError),
    /// A chunk's compressed payload could not be decompressed.
    Compression(io::Error),
    /// A chunk index outside of `[0, 1024)`.
    IndexOutOfRange(usize),
    /// A payload would occupy more sectors than a location word can describe.
    ChunkTooLarge(usize),
    /// A stored payload declared an unknown compression scheme.
    UnknownCompression(u8),
    /// The file is too short to hold the two header sectors.
    HeaderTruncated,
    /// A location word describes a sector range which is out of bounds or overlaps another
    /// chunk.
    CorruptLocation(usize),
    /// A stored payload's length prefix is nonsensical.
    CorruptChunk(usize),
}

impl From<io::Error> for RegionError {
    fn from(error: io::Error) -> Self {
        RegionError::StdIo(error)
    }
}

impl From<NbtIoError> for RegionError {
    fn from(error: NbtIoError) -> Self {
        RegionError::Nbt(error)
    }
}

impl Display for RegionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::StdIo(error) => write!(f, "{}", error),
            RegionError::Nbt(error) => write!(f, "{}", error),
            RegionError::Compression(error) => write!(f, "Failed to decompress chunk: {}", error),
            &RegionError::IndexOutOfRange(index) =>
                write!(f, "Chunk index {} out of range", index),
            &RegionError::ChunkTooLarge(needed) => write!(
                f,
                "Chunk payload would occupy {} sectors, but at most 255 can be addressed",
                needed
            ),
            &RegionError::UnknownCompression(scheme) =>
                write!(f, "Unknown chunk compression scheme {}", scheme),
            RegionError::HeaderTruncated =>
                write!(f, "Region file is too short to hold its header sectors"),
            &RegionError::CorruptLocation(index) =>
                write!(f, "Location word of chunk {} describes an invalid sector range", index),
            &RegionError::CorruptChunk(index) =>
                write!(f, "Stored payload of chunk {} has an invalid length prefix", index),
        }
    }
}

impl Error for RegionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegionError::StdIo(error) => Some(error),
            RegionError::Nbt(error) => Some(error),
            RegionError::Compression(error) => Some(error),
            _ => None,
        }
    }
}
