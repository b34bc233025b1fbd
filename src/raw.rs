use crate::io::NbtIoError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::{
    io::{Read, Write},
    mem::ManuallyDrop,
    slice,
};

#[inline]
pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8, NbtIoError> {
    Ok(reader.read_u8()?)
}

#[inline]
pub fn read_i8<R: Read>(reader: &mut R) -> Result<i8, NbtIoError> {
    Ok(reader.read_i8()?)
}

#[inline]
pub fn read_i16<R: Read>(reader: &mut R) -> Result<i16, NbtIoError> {
    Ok(reader.read_i16::<BigEndian>()?)
}

#[inline]
pub fn read_u16<R: Read>(reader: &mut R) -> Result<u16, NbtIoError> {
    Ok(reader.read_u16::<BigEndian>()?)
}

#[inline]
pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32, NbtIoError> {
    Ok(reader.read_i32::<BigEndian>()?)
}

#[inline]
pub fn read_i64<R: Read>(reader: &mut R) -> Result<i64, NbtIoError> {
    Ok(reader.read_i64::<BigEndian>()?)
}

#[inline]
pub fn read_f32<R: Read>(reader: &mut R) -> Result<f32, NbtIoError> {
    Ok(reader.read_f32::<BigEndian>()?)
}

#[inline]
pub fn read_f64<R: Read>(reader: &mut R) -> Result<f64, NbtIoError> {
    Ok(reader.read_f64::<BigEndian>()?)
}

pub fn read_string<R: Read>(reader: &mut R) -> Result<String, NbtIoError> {
    let len = read_u16(reader)? as usize;
    let mut bytes = vec![0; len];
    reader.read_exact(&mut bytes)?;

    let java_decoded = match cesu8::from_java_cesu8(&bytes) {
        Ok(string) => string,
        Err(_) => return Err(NbtIoError::InvalidString),
    };

    Ok(java_decoded.into_owned())
}

pub fn read_byte_array<R: Read>(reader: &mut R) -> Result<Vec<i8>, NbtIoError> {
    let len = read_i32(reader)?;
    if len < 0 {
        return Err(NbtIoError::NegativeLength(len));
    }

    let mut array = vec![0u8; len as usize];
    reader.read_exact(&mut array)?;

    Ok(cast_byte_buf_to_signed(array))
}

pub fn read_int_array<R: Read>(reader: &mut R) -> Result<Vec<i32>, NbtIoError> {
    let len = read_i32(reader)?;
    if len < 0 {
        return Err(NbtIoError::NegativeLength(len));
    }

    let mut array = Vec::with_capacity(len as usize);
    for _ in 0 .. len {
        array.push(read_i32(reader)?);
    }

    Ok(array)
}

#[inline]
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<(), NbtIoError> {
    Ok(writer.write_u8(value)?)
}

#[inline]
pub fn write_i8<W: Write>(writer: &mut W, value: i8) -> Result<(), NbtIoError> {
    Ok(writer.write_i8(value)?)
}

#[inline]
pub fn write_i16<W: Write>(writer: &mut W, value: i16) -> Result<(), NbtIoError> {
    Ok(writer.write_i16::<BigEndian>(value)?)
}

#[inline]
pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<(), NbtIoError> {
    Ok(writer.write_u16::<BigEndian>(value)?)
}

#[inline]
pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<(), NbtIoError> {
    Ok(writer.write_i32::<BigEndian>(value)?)
}

#[inline]
pub fn write_i64<W: Write>(writer: &mut W, value: i64) -> Result<(), NbtIoError> {
    Ok(writer.write_i64::<BigEndian>(value)?)
}

#[inline]
pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<(), NbtIoError> {
    Ok(writer.write_f32::<BigEndian>(value)?)
}

#[inline]
pub fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<(), NbtIoError> {
    Ok(writer.write_f64::<BigEndian>(value)?)
}

pub fn write_string<W: Write>(writer: &mut W, string: &str) -> Result<(), NbtIoError> {
    let mod_utf8 = cesu8::to_java_cesu8(string);
    write_u16(writer, mod_utf8.len() as u16)?;
    Ok(writer.write_all(&mod_utf8)?)
}

pub fn write_byte_array<W: Write>(writer: &mut W, values: &[i8]) -> Result<(), NbtIoError> {
    write_i32(writer, values.len() as i32)?;
    Ok(writer.write_all(cast_bytes_to_unsigned(values))?)
}

pub fn write_int_array<W: Write>(writer: &mut W, values: &[i32]) -> Result<(), NbtIoError> {
    write_i32(writer, values.len() as i32)?;

    for &int in values {
        write_i32(writer, int)?;
    }

    Ok(())
}

#[inline]
pub fn cast_byte_buf_to_signed(buf: Vec<u8>) -> Vec<i8> {
    let mut me = ManuallyDrop::new(buf);
    // Pointer cast is valid because i8 and u8 have the same layout
    let ptr = me.as_mut_ptr() as *mut i8;
    let length = me.len();
    let capacity = me.capacity();

    // Safety
    // * `ptr` was allocated by a Vec
    // * i8 has the same size and alignment as u8
    // * `length` and `capacity` came from a valid Vec
    unsafe { Vec::from_raw_parts(ptr, length, capacity) }
}

#[inline]
pub fn cast_bytes_to_unsigned(bytes: &[i8]) -> &[u8] {
    let data = bytes.as_ptr() as *const u8;
    let len = bytes.len();

    // Safety
    // * `data` is valid for len * 1 bytes
    //     * The entire memory range of `data` is contained in a single
    //       allocated object since it came from a valid slice
    //     * `data` is non-null and aligned correctly for i8 (and thus u8)
    // * `data` points to exactly `len` consecutive bytes
    // * The constructed reference adopts the lifetime of the provided reference
    // * `len` <= isize::MAX because `len` came from a valid slice
    unsafe { slice::from_raw_parts(data, len) }
}
