mod assets;
use assets::*;
use flate2::read::GzDecoder;
use mica_nbt::{
    io::{self, Flavor, NbtIoError},
    NbtCompound, NbtList, NbtTag, TagKind,
};
use std::io::{Cursor, Read};

fn round_trip(tag: &NbtTag, flavor: Flavor) -> NbtTag {
    let mut bytes = Vec::new();
    io::write_nbt(&mut bytes, None, tag, flavor).unwrap();
    io::read_nbt(&mut Cursor::new(bytes), flavor).unwrap().0
}

#[test]
fn big_test() {
    let (root, root_name) =
        io::read_nbt(&mut Cursor::new(BIG_TEST), Flavor::GzCompressed).unwrap();

    assert_eq!(root_name, "Level");
    let compound = match root {
        NbtTag::Compound(compound) => compound,
        tag => panic!("expected a compound root, got {}", tag),
    };
    assert_eq!(&compound, &*BIG_TEST_VALIDATE);
}

#[test]
fn big_test_byte_exact_round_trip() {
    let mut plain = Vec::new();
    GzDecoder::new(BIG_TEST).read_to_end(&mut plain).unwrap();

    let (root, root_name) =
        io::read_nbt(&mut Cursor::new(&plain), Flavor::Uncompressed).unwrap();

    let mut produced = Vec::new();
    io::write_nbt(&mut produced, Some(&root_name), &root, Flavor::Uncompressed).unwrap();

    assert_eq!(produced, plain);
}

#[test]
fn writing_nbt() {
    let mut list = NbtList::new();
    for element in ["a", "b", "c"] {
        list.push(element).unwrap();
    }

    let mut compound_list = NbtList::new();
    compound_list.set_kind(TagKind::Compound).unwrap();
    compound_list.push(NbtCompound::new()).unwrap();
    compound_list.push(NbtCompound::new()).unwrap();

    let mut inner = NbtCompound::new();
    put(&mut inner, "test", TagKind::Byte, 12i8);

    let mut compound = NbtCompound::new();
    put(&mut compound, "byte", TagKind::Byte, 12i8);
    put(&mut compound, "short", TagKind::Short, 32i16);
    put(&mut compound, "int", TagKind::Int, 512i32);
    put(&mut compound, "long", TagKind::Long, 1024i64);
    put(&mut compound, "float", TagKind::Float, 12.99f32);
    put(&mut compound, "double", TagKind::Double, 1212.0101f64);
    put(&mut compound, "string", TagKind::String, "test");
    put(&mut compound, "list", TagKind::List, list);
    put(&mut compound, "compound_list", TagKind::List, compound_list);
    put(&mut compound, "byte_array", TagKind::List, vec![1i8, 2, 3, 4]);
    put(&mut compound, "int_array", TagKind::List, vec![1i32, 3, 5, 7]);
    put(&mut compound, "compound", TagKind::Compound, inner);

    let tag = NbtTag::Compound(compound);
    assert_eq!(round_trip(&tag, Flavor::Uncompressed), tag);
}

#[test]
fn compressed_flavors() {
    let mut compound = NbtCompound::new();
    put(&mut compound, "level", TagKind::String, "overworld");
    put(&mut compound, "seed", TagKind::Long, -415789433297i64);
    let tag = NbtTag::Compound(compound);

    assert_eq!(round_trip(&tag, Flavor::GzCompressed), tag);
    assert_eq!(round_trip(&tag, Flavor::ZlibCompressed), tag);
}

#[test]
fn scalar_boundaries() {
    let mut compound = NbtCompound::new();
    put(&mut compound, "byte_min", TagKind::Byte, i8::MIN);
    put(&mut compound, "byte_max", TagKind::Byte, i8::MAX);
    put(&mut compound, "short_min", TagKind::Short, i16::MIN);
    put(&mut compound, "short_max", TagKind::Short, i16::MAX);
    put(&mut compound, "int_min", TagKind::Int, i32::MIN);
    put(&mut compound, "int_max", TagKind::Int, i32::MAX);
    put(&mut compound, "long_min", TagKind::Long, i64::MIN);
    put(&mut compound, "long_max", TagKind::Long, i64::MAX);
    put(&mut compound, "float", TagKind::Float, 3.5f32);
    put(&mut compound, "double", TagKind::Double, 3.7f64);
    put(&mut compound, "empty_string", TagKind::String, "");
    put(&mut compound, "unicode", TagKind::String, "ma bo\u{EE}te dans ton \u{153}il");

    let tag = NbtTag::Compound(compound);
    assert_eq!(round_trip(&tag, Flavor::Uncompressed), tag);
}

#[test]
fn empty_list_wire_form() {
    let mut compound = NbtCompound::new();
    put(&mut compound, "empty", TagKind::List, NbtList::new());

    let mut bytes = Vec::new();
    io::write_nbt(
        &mut bytes,
        None,
        &NbtTag::Compound(compound),
        Flavor::Uncompressed,
    )
    .unwrap();

    // A kind-unset empty list is announced with an inner tag of End and a count of zero
    let expected = [
        0x0A, 0x00, 0x00, // root compound with an empty name
        0x09, 0x00, 0x05, b'e', b'm', b'p', b't', b'y', // named list tag
        0x00, // inner tag: End
        0x00, 0x00, 0x00, 0x00, // count 0
        0x00, // end of the root compound
    ];
    assert_eq!(bytes, expected);

    let (root, _) = io::read_nbt(&mut Cursor::new(bytes), Flavor::Uncompressed).unwrap();
    let compound = match root {
        NbtTag::Compound(compound) => compound,
        tag => panic!("expected a compound root, got {}", tag),
    };
    assert_eq!(compound.get::<&NbtList>("empty").unwrap().kind(), None);
}

#[test]
fn array_promotion_wire_form() {
    let mut compound = NbtCompound::new();
    put(&mut compound, "bytes", TagKind::List, vec![1i8, 2, 3]);
    put(&mut compound, "ints", TagKind::List, vec![4i32, 5]);

    let mut bytes = Vec::new();
    io::write_nbt(
        &mut bytes,
        None,
        &NbtTag::Compound(compound),
        Flavor::Uncompressed,
    )
    .unwrap();

    let expected = [
        0x0A, 0x00, 0x00, // root compound with an empty name
        0x07, 0x00, 0x05, b'b', b'y', b't', b'e', b's', // byte array form
        0x00, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03,
        0x0B, 0x00, 0x04, b'i', b'n', b't', b's', // int array form
        0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x05,
        0x00, // end of the root compound
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn deuce_serializes_as_byte_arrays() {
    let mut lists = NbtList::new();
    lists.set_kind(TagKind::List).unwrap();
    lists.push(NbtList::new()).unwrap();
    lists.push(NbtList::new()).unwrap();

    let mut compound = NbtCompound::new();
    put(&mut compound, "deuce", TagKind::List, lists);

    let mut bytes = Vec::new();
    io::write_nbt(
        &mut bytes,
        None,
        &NbtTag::Compound(compound),
        Flavor::Uncompressed,
    )
    .unwrap();

    // All inner lists are empty, so the inner tag collapses to the byte array form
    let expected = [
        0x0A, 0x00, 0x00, // root compound with an empty name
        0x09, 0x00, 0x05, b'd', b'e', b'u', b'c', b'e', // named list tag
        0x07, // inner tag: byte array
        0x00, 0x00, 0x00, 0x02, // two elements
        0x00, 0x00, 0x00, 0x00, // first empty array
        0x00, 0x00, 0x00, 0x00, // second empty array
        0x00, // end of the root compound
    ];
    assert_eq!(bytes, expected);

    // The decoded inner lists come back as (empty) byte lists, and the form is stable
    let (root, _) = io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed).unwrap();
    let compound = match &root {
        NbtTag::Compound(compound) => compound,
        tag => panic!("expected a compound root, got {}", tag),
    };
    let lists = compound.get::<&NbtList>("deuce").unwrap();
    assert_eq!(lists.kind(), Some(TagKind::List));
    for inner in lists.iter_map::<&NbtList>() {
        assert_eq!(inner.unwrap().kind(), Some(TagKind::Byte));
    }

    let mut rewritten = Vec::new();
    io::write_nbt(&mut rewritten, None, &root, Flavor::Uncompressed).unwrap();
    assert_eq!(rewritten, bytes);
}

#[test]
fn list_of_int_lists_promotes() {
    let mut lists = NbtList::new();
    lists.set_kind(TagKind::List).unwrap();
    lists.push(NbtTag::from(vec![7i32, 8])).unwrap();
    lists.push(NbtList::new()).unwrap();

    let mut compound = NbtCompound::new();
    put(&mut compound, "ints", TagKind::List, lists);

    let tag = NbtTag::Compound(compound);
    let mut bytes = Vec::new();
    io::write_nbt(&mut bytes, None, &tag, Flavor::Uncompressed).unwrap();

    // The named tag, its name, then the inner tag announced by the list payload
    assert_eq!(bytes[10], 0x0B);
}

#[test]
fn mixed_list_of_lists_stays_generic() {
    let mut strings = NbtList::new();
    strings.push("a").unwrap();

    let mut lists = NbtList::new();
    lists.set_kind(TagKind::List).unwrap();
    lists.push(NbtTag::from(vec![1i8])).unwrap();
    lists.push(strings).unwrap();

    let mut compound = NbtCompound::new();
    put(&mut compound, "mixed", TagKind::List, lists);

    let tag = NbtTag::Compound(compound);
    let mut bytes = Vec::new();
    io::write_nbt(&mut bytes, None, &tag, Flavor::Uncompressed).unwrap();

    assert_eq!(bytes[11], 0x09);
    assert_eq!(round_trip(&tag, Flavor::Uncompressed), tag);
}

#[test]
fn file_round_trip() {
    let path = std::env::temp_dir().join(format!(
        "mica_nbt_io_{}_file_round_trip.nbt",
        std::process::id()
    ));

    let mut compound = NbtCompound::new();
    put(&mut compound, "name", TagKind::String, "file test");
    put(&mut compound, "values", TagKind::List, vec![1i32, 2, 3]);
    let tag = NbtTag::Compound(compound);

    io::write_nbt_file(&path, Some("root"), &tag).unwrap();
    let (read_tag, root_name) = io::read_nbt_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(root_name, "root");
    assert_eq!(read_tag, tag);
}

#[test]
fn duplicate_keys_take_the_last_value() {
    let bytes = [
        0x0A, 0x00, 0x00, // root compound with an empty name
        0x01, 0x00, 0x01, b'a', 0x01, // "a": 1b
        0x01, 0x00, 0x01, b'a', 0x02, // "a" again: 2b
        0x00,
    ];

    let (root, _) = io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed).unwrap();
    let compound = match root {
        NbtTag::Compound(compound) => compound,
        tag => panic!("expected a compound root, got {}", tag),
    };

    assert_eq!(compound.len(), 1);
    assert!(matches!(compound.get::<i8>("a"), Ok(2)));
}

#[test]
fn root_must_not_be_end() {
    let bytes = [0x00u8];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::MissingRootTag) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn unknown_tag_id() {
    let bytes = [0x0Du8, 0x00, 0x00];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::InvalidTagId(0x0D)) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn truncated_stream() {
    let bytes = [0x03u8, 0x00, 0x00, 0x01];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::UnexpectedEof) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn negative_list_count() {
    let bytes = [0x09u8, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::NegativeLength(-1)) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn negative_array_length() {
    let bytes = [0x07u8, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::NegativeLength(-1)) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn invalid_string_bytes() {
    let bytes = [0x08u8, 0x00, 0x00, 0x00, 0x02, 0xFF, 0xFF];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::InvalidString) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn nonempty_list_of_end_rejected() {
    let bytes = [0x09u8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01];
    match io::read_nbt(&mut Cursor::new(&bytes[..]), Flavor::Uncompressed) {
        Err(NbtIoError::InvalidTagId(0x00)) => {}
        result => panic!("unexpected result: {:?}", result),
    }
}
