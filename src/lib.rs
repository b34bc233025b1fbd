#![deny(rust_2018_idioms)]
#![warn(missing_debug_implementations, missing_docs)]

/*!
Provides support for encoding and decoding Minecraft's NBT format, and for reading and writing
the Region (Anvil) world save files which store NBT payloads in 4 KiB sectors. This crate
supports both zlib and gz compression, and also provides a stable stringified rendering of NBT
data for diagnostics.

# Basic Usage

The basic unit of NBT data is the [`NbtTag`]. Larger data structures are represented through a
tree of compounds (insertion-ordered maps) and lists (vecs) of NBT tags.

## Creating NBT Data

Every compound entry and every list carries a declared [`TagKind`] which its value satisfies.
Values inserted without a declared kind infer the widest kind that accepts them, so plain
integers become longs and plain floats become doubles; narrower kinds are declared with
`set_kind` either before or after the value is assigned.

```
# use mica_nbt::*;
let mut compound = NbtCompound::new();
compound.insert("foo", 123).unwrap();
compound.insert("bar", -3.6f32).unwrap();

assert_eq!(compound.get_kind("foo"), Some(TagKind::Long));
assert!(matches!(compound.get::<i64>("foo"), Ok(123)));

compound.set_kind("foo", TagKind::Int).unwrap();
assert!(matches!(compound.get::<i32>("foo"), Ok(123)));

assert!(compound.insert("bar", "text").is_err()); // Kind mismatch
```

## Reading and Writing NBT

```
# use mica_nbt::*;
use mica_nbt::io::{self, Flavor};
use std::io::Cursor;

let mut compound = NbtCompound::new();
compound.insert("foo", 123).unwrap();
compound.insert("bar", -3.6f32).unwrap();
let tag = NbtTag::Compound(compound);

let mut binary: Vec<u8> = Vec::new();
io::write_nbt(&mut binary, Some("root-tag"), &tag, Flavor::Uncompressed).unwrap();

let (read_tag, root_name) = io::read_nbt(&mut Cursor::new(binary), Flavor::Uncompressed).unwrap();
assert_eq!(root_name, "root-tag"); // The root tag's name is generally unused
assert_eq!(read_tag, tag);
```

Whole NBT files are conventionally gz compressed; [`read_nbt_file`](crate::io::read_nbt_file)
and [`write_nbt_file`](crate::io::write_nbt_file) handle the compression when working with
paths. Reading and writing back a well-formed file reproduces it octet for octet, including
the order of compound entries and the byte array and int array wire forms.

# Region Files

A [`Region`](crate::region::Region) is a random-access container of up to 1024 NBT values,
individually compressed and allocated in 4 KiB sectors:

```no_run
# use mica_nbt::{region::Region, NbtCompound, NbtTag};
# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut region = Region::open("r.0.0.mca")?;

let mut chunk = NbtCompound::new();
chunk.insert("xPos", 0)?;
region.save(0, &NbtTag::Compound(chunk))?;

for entry in region.chunks() {
    let (index, value) = entry?;
    println!("{}: {}", index, value);
}
# Ok(())
# }
```

# Querying Tags

Generics are used to make the tag querying process as seamless as possible, however this
allows for two types of errors to occur: missing tags (invalid key or index), and tag type
mismatches. Thus, methods that would normally return an [`Option`](Option) in `std` collection
equivalents return a [`Result`](Result) in this crate.

An error converting NBT tags directly into unwrapped values via [`TryFrom`](std::convert::TryFrom)
and [`TryInto`](std::convert::TryInto) is represented by an [`NbtStructureError`](crate::NbtStructureError).
An error querying an [`NbtCompound`] or [`NbtList`] is represented by an [`NbtReprError`](crate::NbtReprError),
which is short for "NBT representation error."

```
# use mica_nbt::*;
use std::convert::TryFrom;

let tag1: NbtTag = vec![1i8, 2, 3].into();
let tag2: NbtTag = "abcde".into();

assert_eq!(Vec::<i8>::try_from(&tag1).unwrap(), vec![1i8, 2, 3]);
assert!(i16::try_from(&tag2).is_err()); // Type mismatch
```

# Stringified Rendering

Any tag can be rendered as an SNBT string via [`to_snbt`](crate::NbtTag::to_snbt) or the
[`Display`](std::fmt::Display) implementations. The rendering is a deterministic function of
the value alone, including compound entry order, which makes it usable for byte-equality
comparisons in tests:

```
# use mica_nbt::*;
let tag: NbtTag = vec![10i8, 15, 20].into();
assert_eq!(tag.to_snbt(), "[B;10,15,20]");
```

[`NbtCompound`]: crate::NbtCompound
[`NbtList`]: crate::NbtList
[`NbtTag`]: crate::NbtTag
[`TagKind`]: crate::TagKind
*/

/// Provides efficient serializer and deserializer implementations for arbitrary NBT tag trees,
/// along with the compression wrappers used by NBT files on disk.
pub mod io;
mod raw;
/// Provides support for reading and writing Region (Anvil) files: sector-allocated containers
/// of up to 1024 independently addressable NBT payloads.
pub mod region;
mod repr;
mod tag;

pub use repr::*;
pub use tag::*;
