use crate::{raw, NbtCompound, NbtEntry, NbtList, NbtTag, TagKind};
use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
    Compression,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    fs::File,
    io::{self, ErrorKind, Read, Write},
    path::Path,
};

/// Describes the flavors of NBT data: uncompressed, Zlib compressed and Gz compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Uncompressed NBT data.
    Uncompressed,
    /// Zlib compressed NBT data. When writing, the default compression level will be used.
    ZlibCompressed,
    /// Zlib compressed NBT data with the given compression level.
    ZlibCompressedWith(Compression),
    /// Gz compressed NBT data. When writing, the default compression level will be used.
    GzCompressed,
    /// Gz compressed NBT data with the given compression level.
    GzCompressedWith(Compression),
}

/// Reads the given flavor of NBT data from the given reader, returning the resulting named tag
/// as a value and name pair.
///
/// The stream must hold exactly one named tag. No assumption is made about the root's name or
/// kind, though a whole NBT file conventionally holds an anonymous compound. Byte array and int
/// array payloads decode into lists of kind [`Byte`] and [`Int`] respectively; nothing else is
/// remembered about the source representation.
///
/// [`Byte`]: crate::TagKind::Byte
/// [`Int`]: crate::TagKind::Int
pub fn read_nbt<R: Read>(reader: &mut R, flavor: Flavor) -> Result<(NbtTag, String), NbtIoError> {
    match flavor {
        Flavor::Uncompressed => read_nbt_uncompressed(reader),
        Flavor::ZlibCompressed | Flavor::ZlibCompressedWith(_) =>
            read_nbt_uncompressed(&mut ZlibDecoder::new(reader)),
        Flavor::GzCompressed | Flavor::GzCompressedWith(_) =>
            read_nbt_uncompressed(&mut GzDecoder::new(reader)),
    }
}

/// Reads a gzip-compressed NBT file from the given path, returning the root value and name.
pub fn read_nbt_file<P: AsRef<Path>>(path: P) -> Result<(NbtTag, String), NbtIoError> {
    let mut file = File::open(path)?;
    read_nbt(&mut file, Flavor::GzCompressed)
}

fn read_nbt_uncompressed<R: Read>(reader: &mut R) -> Result<(NbtTag, String), NbtIoError> {
    let root_id = raw::read_u8(reader)?;
    if root_id == 0x0 {
        return Err(NbtIoError::MissingRootTag);
    }

    let root_name = raw::read_string(reader)?;
    let root = read_payload(reader, root_id)?;
    Ok((root, root_name))
}

fn read_payload<R: Read>(reader: &mut R, id: u8) -> Result<NbtTag, NbtIoError> {
    match id {
        0x1 => Ok(NbtTag::Byte(raw::read_i8(reader)?)),
        0x2 => Ok(NbtTag::Short(raw::read_i16(reader)?)),
        0x3 => Ok(NbtTag::Int(raw::read_i32(reader)?)),
        0x4 => Ok(NbtTag::Long(raw::read_i64(reader)?)),
        0x5 => Ok(NbtTag::Float(raw::read_f32(reader)?)),
        0x6 => Ok(NbtTag::Double(raw::read_f64(reader)?)),
        0x7 => {
            let array = raw::read_byte_array(reader)?;
            Ok(NbtTag::List(NbtList {
                kind: Some(TagKind::Byte),
                tags: array.into_iter().map(NbtTag::Byte).collect(),
            }))
        }
        0x8 => Ok(NbtTag::String(raw::read_string(reader)?)),
        0x9 => {
            let inner_id = raw::read_u8(reader)?;
            let len = raw::read_i32(reader)?;
            if len < 0 {
                return Err(NbtIoError::NegativeLength(len));
            }

            // An inner tag of End is only valid for an empty list, which decodes with no
            // element kind
            if inner_id == 0x0 {
                if len > 0 {
                    return Err(NbtIoError::InvalidTagId(inner_id));
                }
                return Ok(NbtTag::List(NbtList::new()));
            }

            let kind = match TagKind::from_id(inner_id) {
                Some(kind) => kind.normalized(),
                None => return Err(NbtIoError::InvalidTagId(inner_id)),
            };

            let mut tags = Vec::with_capacity(len as usize);
            for _ in 0 .. len {
                tags.push(read_payload(reader, inner_id)?);
            }

            Ok(NbtTag::List(NbtList {
                kind: Some(kind),
                tags,
            }))
        }
        0xA => {
            let mut compound = NbtCompound::new();
            let mut tag_id = raw::read_u8(reader)?;

            // Read until TAG_End; a repeated key keeps its original position but takes the
            // value written last
            while tag_id != 0x0 {
                let name = raw::read_string(reader)?;
                let kind = match TagKind::from_id(tag_id) {
                    Some(kind) => kind.normalized(),
                    None => return Err(NbtIoError::InvalidTagId(tag_id)),
                };
                let tag = read_payload(reader, tag_id)?;
                compound.entries.insert(name, NbtEntry { kind, tag });
                tag_id = raw::read_u8(reader)?;
            }

            Ok(NbtTag::Compound(compound))
        }
        0xB => {
            let array = raw::read_int_array(reader)?;
            Ok(NbtTag::List(NbtList {
                kind: Some(TagKind::Int),
                tags: array.into_iter().map(NbtTag::Int).collect(),
            }))
        }
        _ => Err(NbtIoError::InvalidTagId(id)),
    }
}

/// Writes the given flavor of NBT data to the given writer. If no root name is provided, an
/// empty string is used.
///
/// Lists of kind [`Byte`] and [`Int`] are written in the byte array and int array wire forms
/// wherever those forms are expressible, so any well-formed stream re-encodes to the exact
/// bytes it was decoded from.
///
/// [`Byte`]: crate::TagKind::Byte
/// [`Int`]: crate::TagKind::Int
pub fn write_nbt<W: Write>(
    writer: &mut W,
    root_name: Option<&str>,
    root: &NbtTag,
    flavor: Flavor,
) -> Result<(), NbtIoError> {
    let (mode, compression) = match flavor {
        Flavor::Uncompressed => {
            return write_nbt_uncompressed(writer, root_name, root);
        }
        Flavor::ZlibCompressed => (2, Compression::default()),
        Flavor::ZlibCompressedWith(compression) => (2, compression),
        Flavor::GzCompressed => (1, Compression::default()),
        Flavor::GzCompressedWith(compression) => (1, compression),
    };

    if mode == 1 {
        let mut encoder = GzEncoder::new(writer, compression);
        write_nbt_uncompressed(&mut encoder, root_name, root)?;
        encoder.finish()?;
    } else {
        let mut encoder = ZlibEncoder::new(writer, compression);
        write_nbt_uncompressed(&mut encoder, root_name, root)?;
        encoder.finish()?;
    }

    Ok(())
}

/// Writes the given root tag to a gzip-compressed NBT file at the given path, truncating any
/// file already there.
pub fn write_nbt_file<P: AsRef<Path>>(
    path: P,
    root_name: Option<&str>,
    root: &NbtTag,
) -> Result<(), NbtIoError> {
    let mut file = File::create(path)?;
    write_nbt(&mut file, root_name, root, Flavor::GzCompressed)
}

/// Writes the given tag with the given name to the provided writer, writing only the raw NBT
/// data without any compression.
fn write_nbt_uncompressed<W: Write>(
    writer: &mut W,
    root_name: Option<&str>,
    root: &NbtTag,
) -> Result<(), NbtIoError> {
    let root_id = wire_id_for(root);
    raw::write_u8(writer, root_id)?;
    raw::write_string(writer, root_name.unwrap_or(""))?;
    write_payload(writer, root, root_id)
}

// The wire ID a tag is announced with: lists of bytes and ints take the array forms
fn wire_id_for(tag: &NbtTag) -> u8 {
    match tag {
        NbtTag::List(list) => match list.kind() {
            Some(TagKind::Byte) => 0x7,
            Some(TagKind::Int) => 0xB,
            _ => 0x9,
        },
        tag => tag.kind().id(),
    }
}

// The inner wire ID announced by a generic list payload
fn inner_wire_id(list: &NbtList) -> u8 {
    match list.kind() {
        None => 0x0,
        Some(TagKind::List) => {
            // A list of lists still promotes to a list of arrays when every non-empty inner
            // list holds bytes (or ints). When all inner lists are empty, byte arrays win.
            let mut byte_only = true;
            let mut int_only = true;

            for tag in list.iter() {
                if let NbtTag::List(inner) = tag {
                    match inner.kind() {
                        None => {}
                        Some(TagKind::Byte) => int_only = false,
                        Some(TagKind::Int) => byte_only = false,
                        Some(_) => {
                            byte_only = false;
                            int_only = false;
                        }
                    }
                }

                if !byte_only && !int_only {
                    break;
                }
            }

            if byte_only {
                0x7
            } else if int_only {
                0xB
            } else {
                0x9
            }
        }
        Some(kind) => kind.id(),
    }
}

fn element_matches(inner_id: u8, tag: &NbtTag) -> bool {
    match tag {
        NbtTag::List(_) => matches!(inner_id, 0x7 | 0x9 | 0xB),
        tag => tag.kind().id() == inner_id,
    }
}

fn write_payload<W: Write>(writer: &mut W, tag: &NbtTag, id: u8) -> Result<(), NbtIoError> {
    match tag {
        &NbtTag::Byte(value) => raw::write_i8(writer, value),
        &NbtTag::Short(value) => raw::write_i16(writer, value),
        &NbtTag::Int(value) => raw::write_i32(writer, value),
        &NbtTag::Long(value) => raw::write_i64(writer, value),
        &NbtTag::Float(value) => raw::write_f32(writer, value),
        &NbtTag::Double(value) => raw::write_f64(writer, value),
        NbtTag::String(value) => raw::write_string(writer, value),
        NbtTag::List(list) => match id {
            0x7 => {
                let mut array = Vec::with_capacity(list.len());
                for tag in list.iter() {
                    match tag {
                        &NbtTag::Byte(value) => array.push(value),
                        _ => return Err(NbtIoError::NonHomogenousList),
                    }
                }

                raw::write_byte_array(writer, &array)
            }
            0xB => {
                let mut array = Vec::with_capacity(list.len());
                for tag in list.iter() {
                    match tag {
                        &NbtTag::Int(value) => array.push(value),
                        _ => return Err(NbtIoError::NonHomogenousList),
                    }
                }

                raw::write_int_array(writer, &array)
            }
            _ => {
                let inner_id = inner_wire_id(list);
                raw::write_u8(writer, inner_id)?;
                raw::write_i32(writer, list.len() as i32)?;

                for tag in list.iter() {
                    if !element_matches(inner_id, tag) {
                        return Err(NbtIoError::NonHomogenousList);
                    }

                    write_payload(writer, tag, inner_id)?;
                }

                Ok(())
            }
        },
        NbtTag::Compound(compound) => {
            for (name, entry) in compound.iter() {
                let id = wire_id_for(entry.tag());
                raw::write_u8(writer, id)?;
                raw::write_string(writer, name)?;
                write_payload(writer, entry.tag(), id)?;
            }

            // TAG_End
            raw::write_u8(writer, 0x0)
        }
    }
}

/// Describes an error which occurred during the reading or writing of NBT data.
#[derive(Debug)]
pub enum NbtIoError {
    /// A native I/O error.
    StdIo(io::Error),
    /// The stream ended in the middle of a field.
    UnexpectedEof,
    /// No root tag was found. A named tag must not start with TAG_End.
    MissingRootTag,
    /// A sequential data structure was found to be non-homogenous. All sequential structures
    /// in NBT data are homogenous.
    NonHomogenousList,
    /// An invalid tag ID was encountered.
    InvalidTagId(u8),
    /// A list or array was prefixed with a negative length.
    NegativeLength(i32),
    /// A string's bytes were not a valid encoding.
    InvalidString,
}

impl From<io::Error> for NbtIoError {
    fn from(error: io::Error) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            NbtIoError::UnexpectedEof
        } else {
            NbtIoError::StdIo(error)
        }
    }
}

impl Display for NbtIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NbtIoError::StdIo(error) => write!(f, "{}", error),
            NbtIoError::UnexpectedEof => write!(f, "Stream ended in the middle of a field"),
            NbtIoError::MissingRootTag =>
                write!(f, "NBT tree does not start with a valid root tag."),
            NbtIoError::NonHomogenousList =>
                write!(f, "Encountered non-homogenous list or sequential type"),
            &NbtIoError::InvalidTagId(id) => write!(
                f,
                "Encountered invalid tag ID 0x{:X} during deserialization",
                id
            ),
            &NbtIoError::NegativeLength(len) =>
                write!(f, "Encountered negative length {} for a sequential type", len),
            NbtIoError::InvalidString => write!(f, "Invalid string encoding."),
        }
    }
}

impl Error for NbtIoError {}
