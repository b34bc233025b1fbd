#![allow(dead_code)]

use mica_nbt::{NbtCompound, NbtList, NbtTag, TagKind};
use once_cell::sync::Lazy;

pub const BIG_TEST: &[u8] = include_bytes!("bigtest.nbt");

pub static BIG_TEST_VALIDATE: Lazy<NbtCompound> = Lazy::new(|| {
    let mut bytes: Vec<i8> = Vec::new();
    for n in 0i64 .. 1000 {
        bytes.push(((n * n * 255 + n * 7) % 100) as i8);
    }

    let mut egg = NbtCompound::new();
    put(&mut egg, "name", TagKind::String, "Eggbert");
    put(&mut egg, "value", TagKind::Float, 0.5f32);

    let mut ham = NbtCompound::new();
    put(&mut ham, "name", TagKind::String, "Hampus");
    put(&mut ham, "value", TagKind::Float, 0.75f32);

    let mut nested = NbtCompound::new();
    put(&mut nested, "egg", TagKind::Compound, egg);
    put(&mut nested, "ham", TagKind::Compound, ham);

    let mut long_list = NbtList::new();
    long_list.set_kind(TagKind::Long).unwrap();
    for value in [11i64, 12, 13, 14, 15] {
        long_list.push(value).unwrap();
    }

    let mut compound_list = NbtList::new();
    compound_list.set_kind(TagKind::Compound).unwrap();
    for name in ["Compound tag #0", "Compound tag #1"] {
        let mut element = NbtCompound::new();
        put(&mut element, "created-on", TagKind::Long, 1264099775885i64);
        put(&mut element, "name", TagKind::String, name);
        compound_list.push(element).unwrap();
    }

    let mut compound = NbtCompound::new();
    put(&mut compound, "nested compound test", TagKind::Compound, nested);
    put(&mut compound, "intTest", TagKind::Int, 2147483647i32);
    put(&mut compound, "byteTest", TagKind::Byte, 127i8);
    put(
        &mut compound,
        "stringTest",
        TagKind::String,
        "HELLO WORLD THIS IS A TEST STRING \u{C5}\u{C4}\u{D6}!",
    );
    put(&mut compound, "listTest (long)", TagKind::List, long_list);
    put(&mut compound, "doubleTest", TagKind::Double, 0.49312871321823148f64);
    put(&mut compound, "floatTest", TagKind::Float, 0.49823147058486938f32);
    put(&mut compound, "longTest", TagKind::Long, 9223372036854775807i64);
    put(&mut compound, "listTest (compound)", TagKind::List, compound_list);
    put(
        &mut compound,
        "byteArrayTest (the first 1000 values of (n*n*255+n*7)%100, starting with n=0 (0, 62, 34, 16, 8, ...))",
        TagKind::List,
        bytes,
    );
    put(&mut compound, "shortTest", TagKind::Short, 32767i16);

    compound
});

/// Declares the kind of an entry and assigns its value in one step.
pub fn put<T: Into<NbtTag>>(compound: &mut NbtCompound, name: &str, kind: TagKind, value: T) {
    compound.set_kind(name, kind).unwrap();
    compound.insert(name, value).unwrap();
}
