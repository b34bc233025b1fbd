use crate::{NbtReprError, NbtStructureError};
use indexmap::IndexMap;
use std::{
    convert::TryFrom,
    fmt::{self, Debug, Display, Formatter},
    mem,
    ops::Index,
};

/// The type discriminant of an NBT tag, covering every ID which can appear on the wire.
///
/// The array kinds ([`ByteArray`] and [`IntArray`]) are a wire-level storage optimization of
/// lists of bytes and ints, and [`End`] only ever appears as a compound terminator, so none of
/// the three can be declared for a value in a compound or list. The remaining nine kinds form
/// the value model.
///
/// [`ByteArray`]: crate::TagKind::ByteArray
/// [`End`]: crate::TagKind::End
/// [`IntArray`]: crate::TagKind::IntArray
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TagKind {
    /// The compound terminator, also used as the element kind of an empty, kind-unset list.
    End,
    /// A signed, one-byte integer.
    Byte,
    /// A signed, two-byte integer.
    Short,
    /// A signed, four-byte integer.
    Int,
    /// A signed, eight-byte integer.
    Long,
    /// A 32-bit floating point value.
    Float,
    /// A 64-bit floating point value.
    Double,
    /// An array of one-byte integers. Wire-level only; decodes into a list of bytes.
    ByteArray,
    /// A UTF-8 string.
    String,
    /// A homogenously typed list of tags.
    List,
    /// A mapping from string keys to typed values.
    Compound,
    /// An array of four-byte integers. Wire-level only; decodes into a list of ints.
    IntArray,
}

impl TagKind {
    /// Returns the kind corresponding to the given wire ID, or `None` if the ID is not valid.
    pub fn from_id(id: u8) -> Option<TagKind> {
        match id {
            0x0 => Some(TagKind::End),
            0x1 => Some(TagKind::Byte),
            0x2 => Some(TagKind::Short),
            0x3 => Some(TagKind::Int),
            0x4 => Some(TagKind::Long),
            0x5 => Some(TagKind::Float),
            0x6 => Some(TagKind::Double),
            0x7 => Some(TagKind::ByteArray),
            0x8 => Some(TagKind::String),
            0x9 => Some(TagKind::List),
            0xA => Some(TagKind::Compound),
            0xB => Some(TagKind::IntArray),
            _ => None,
        }
    }

    /// Returns the single-byte wire ID of this kind.
    pub fn id(self) -> u8 {
        match self {
            TagKind::End => 0x0,
            TagKind::Byte => 0x1,
            TagKind::Short => 0x2,
            TagKind::Int => 0x3,
            TagKind::Long => 0x4,
            TagKind::Float => 0x5,
            TagKind::Double => 0x6,
            TagKind::ByteArray => 0x7,
            TagKind::String => 0x8,
            TagKind::List => 0x9,
            TagKind::Compound => 0xA,
            TagKind::IntArray => 0xB,
        }
    }

    /// Returns the name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            TagKind::End => "End",
            TagKind::Byte => "Byte",
            TagKind::Short => "Short",
            TagKind::Int => "Int",
            TagKind::Long => "Long",
            TagKind::Float => "Float",
            TagKind::Double => "Double",
            TagKind::ByteArray => "ByteArray",
            TagKind::String => "String",
            TagKind::List => "List",
            TagKind::Compound => "Compound",
            TagKind::IntArray => "IntArray",
        }
    }

    /// Returns whether the given tag satisfies this kind's acceptance predicate.
    ///
    /// The integer kinds accept any integer-variant tag whose value fits within the kind's bit
    /// width, and [`Float`] and [`Double`] accept either float variant. The remaining kinds
    /// match by shape.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mica_nbt::*;
    /// assert!(TagKind::Byte.accepts(&NbtTag::Long(100)));
    /// assert!(!TagKind::Byte.accepts(&NbtTag::Long(300)));
    /// assert!(TagKind::Double.accepts(&NbtTag::Float(0.5)));
    /// assert!(!TagKind::String.accepts(&NbtTag::Int(0)));
    /// ```
    ///
    /// [`Double`]: crate::TagKind::Double
    /// [`Float`]: crate::TagKind::Float
    pub fn accepts(self, tag: &NbtTag) -> bool {
        match self {
            TagKind::Byte => matches!(tag.to_i64(), Some(value) if i8::try_from(value).is_ok()),
            TagKind::Short => matches!(tag.to_i64(), Some(value) if i16::try_from(value).is_ok()),
            TagKind::Int => matches!(tag.to_i64(), Some(value) if i32::try_from(value).is_ok()),
            TagKind::Long => tag.to_i64().is_some(),
            TagKind::Float | TagKind::Double => tag.to_f64().is_some(),
            TagKind::String => matches!(tag, NbtTag::String(_)),
            TagKind::List => matches!(tag, NbtTag::List(_)),
            TagKind::Compound => matches!(tag, NbtTag::Compound(_)),
            TagKind::End | TagKind::ByteArray | TagKind::IntArray => false,
        }
    }

    /// The model kind a wire kind decodes into: the array kinds collapse into lists.
    pub(crate) fn normalized(self) -> TagKind {
        match self {
            TagKind::ByteArray | TagKind::IntArray => TagKind::List,
            kind => kind,
        }
    }

    /// The default value for a declared kind: zero for numerics, empty for strings and
    /// containers. `None` for the kinds which cannot be declared.
    pub(crate) fn default_tag(self) -> Option<NbtTag> {
        Some(match self {
            TagKind::Byte => NbtTag::Byte(0),
            TagKind::Short => NbtTag::Short(0),
            TagKind::Int => NbtTag::Int(0),
            TagKind::Long => NbtTag::Long(0),
            TagKind::Float => NbtTag::Float(0.0),
            TagKind::Double => NbtTag::Double(0.0),
            TagKind::String => NbtTag::String(String::new()),
            TagKind::List => NbtTag::List(NbtList::new()),
            TagKind::Compound => NbtTag::Compound(NbtCompound::new()),
            TagKind::End | TagKind::ByteArray | TagKind::IntArray => return None,
        })
    }

    /// Re-widths an accepted scalar to this kind's variant. Must only be called with a tag for
    /// which [`accepts`](crate::TagKind::accepts) returned true; other tags pass through
    /// unchanged.
    pub(crate) fn coerce(self, tag: NbtTag) -> NbtTag {
        match self {
            TagKind::Byte => match tag.to_i64() {
                Some(value) => NbtTag::Byte(value as i8),
                None => tag,
            },
            TagKind::Short => match tag.to_i64() {
                Some(value) => NbtTag::Short(value as i16),
                None => tag,
            },
            TagKind::Int => match tag.to_i64() {
                Some(value) => NbtTag::Int(value as i32),
                None => tag,
            },
            TagKind::Long => match tag.to_i64() {
                Some(value) => NbtTag::Long(value),
                None => tag,
            },
            TagKind::Float => match tag.to_f64() {
                Some(value) => NbtTag::Float(value as f32),
                None => tag,
            },
            TagKind::Double => match tag.to_f64() {
                Some(value) => NbtTag::Double(value),
                None => tag,
            },
            _ => tag,
        }
    }
}

/// The generic NBT tag type, containing all tag variants of the value model which wrap around a
/// corresponding rust type.
///
/// Note that there are no array variants: the wire-level byte array and int array forms decode
/// into lists of kind [`Byte`] and [`Int`], and such lists are promoted back to the array forms
/// when written. See the [`io`] module for details.
///
/// [`Byte`]: crate::TagKind::Byte
/// [`Int`]: crate::TagKind::Int
/// [`io`]: crate::io
#[derive(Clone, PartialEq)]
pub enum NbtTag {
    /// A signed, one-byte integer.
    Byte(i8),
    /// A signed, two-byte integer.
    Short(i16),
    /// A signed, four-byte integer.
    Int(i32),
    /// A signed, eight-byte integer.
    Long(i64),
    /// A 32-bit floating point value.
    Float(f32),
    /// A 64-bit floating point value.
    Double(f64),
    /// A UTF-8 string.
    String(String),
    /// An NBT tag list.
    List(NbtList),
    /// An NBT tag compound.
    Compound(NbtCompound),
}

impl NbtTag {
    /// Returns the kind matching this tag's variant exactly.
    pub fn kind(&self) -> TagKind {
        match self {
            NbtTag::Byte(_) => TagKind::Byte,
            NbtTag::Short(_) => TagKind::Short,
            NbtTag::Int(_) => TagKind::Int,
            NbtTag::Long(_) => TagKind::Long,
            NbtTag::Float(_) => TagKind::Float,
            NbtTag::Double(_) => TagKind::Double,
            NbtTag::String(_) => TagKind::String,
            NbtTag::List(_) => TagKind::List,
            NbtTag::Compound(_) => TagKind::Compound,
        }
    }

    /// Returns the widest kind which accepts this tag by default: [`Long`] for integers,
    /// [`Double`] for floats, and the tag's own kind for strings and containers. This is the
    /// kind inferred when a value is inserted with no kind declared.
    ///
    /// [`Double`]: crate::TagKind::Double
    /// [`Long`]: crate::TagKind::Long
    pub fn default_kind(&self) -> TagKind {
        match self {
            NbtTag::Byte(_) | NbtTag::Short(_) | NbtTag::Int(_) | NbtTag::Long(_) =>
                TagKind::Long,
            NbtTag::Float(_) | NbtTag::Double(_) => TagKind::Double,
            NbtTag::String(_) => TagKind::String,
            NbtTag::List(_) => TagKind::List,
            NbtTag::Compound(_) => TagKind::Compound,
        }
    }

    pub(crate) fn tag_name(&self) -> &'static str {
        self.kind().name()
    }

    pub(crate) fn to_i64(&self) -> Option<i64> {
        match *self {
            NbtTag::Byte(value) => Some(value as i64),
            NbtTag::Short(value) => Some(value as i64),
            NbtTag::Int(value) => Some(value as i64),
            NbtTag::Long(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn to_f64(&self) -> Option<f64> {
        match *self {
            NbtTag::Float(value) => Some(value as f64),
            NbtTag::Double(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the single character denoting this tag's type, or an empty string if this tag
    /// type has no type specifier.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mica_nbt::NbtTag;
    /// assert_eq!(NbtTag::Long(10).type_specifier(), "L");
    /// assert_eq!(NbtTag::String(String::new()).type_specifier(), "");
    ///
    /// // Note that while integers do not require a type specifier, this method will still return "I"
    /// assert_eq!(NbtTag::Int(-10).type_specifier(), "I");
    /// ```
    pub fn type_specifier(&self) -> &str {
        match self {
            NbtTag::Byte(_) => "B",
            NbtTag::Short(_) => "S",
            NbtTag::Int(_) => "I",
            NbtTag::Long(_) => "L",
            NbtTag::Float(_) => "F",
            NbtTag::Double(_) => "D",
            _ => "",
        }
    }

    /// Converts this NBT tag into a valid, parsable SNBT string with no extraneous spacing.
    ///
    /// The output is a deterministic function of the value alone, including compound entry
    /// order, so it is suitable for diagnostics and comparison in tests.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mica_nbt::NbtTag;
    /// assert_eq!(NbtTag::Byte(5).to_snbt(), "5B");
    /// assert_eq!(NbtTag::String("\"Quoted text\"".to_owned()).to_snbt(), "'\"Quoted text\"'");
    /// ```
    pub fn to_snbt(&self) -> String {
        match self {
            NbtTag::Byte(value) => format!("{}{}", value, self.type_specifier()),
            NbtTag::Short(value) => format!("{}{}", value, self.type_specifier()),
            NbtTag::Int(value) => format!("{}", value),
            NbtTag::Long(value) => format!("{}{}", value, self.type_specifier()),
            NbtTag::Float(value) => format!("{}{}", value, self.type_specifier()),
            NbtTag::Double(value) => format!("{}{}", value, self.type_specifier()),
            NbtTag::String(value) => Self::string_to_snbt(value),
            NbtTag::List(value) => value.to_snbt(),
            NbtTag::Compound(value) => value.to_snbt(),
        }
    }

    /// Returns whether or not the given string needs to be quoted due to non-alphanumeric or
    /// otherwise non-standard characters.
    pub fn should_quote(string: &str) -> bool {
        for ch in string.chars() {
            if ch == ':'
                || ch == ','
                || ch == '"'
                || ch == '\''
                || ch == '{'
                || ch == '}'
                || ch == '['
                || ch == ']'
            {
                return true;
            }
        }

        false
    }

    /// Wraps the given string in quotes and escapes any quotes contained in the original string.
    pub fn string_to_snbt(string: &str) -> String {
        // Determine the best option for the surrounding quotes to minimize escape sequences
        let surrounding: char;
        if string.contains('"') {
            surrounding = '\'';
        } else {
            surrounding = '"';
        }

        let mut snbt_string = String::with_capacity(2 + string.len());
        snbt_string.push(surrounding);

        // Construct the string accounting for escape sequences
        for ch in string.chars() {
            if ch == surrounding || ch == '\\' {
                snbt_string.push('\\');
            }
            snbt_string.push(ch);
        }

        snbt_string.push(surrounding);
        snbt_string
    }
}

impl Display for NbtTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_snbt(), f)
    }
}

impl Debug for NbtTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_snbt(), f)
    }
}

// Implement the from trait for all the tag's internal types
macro_rules! tag_from {
    ($($type:ty, $tag:ident);*) => {
        $(
            impl From<$type> for NbtTag {
                fn from(value: $type) -> NbtTag {
                    NbtTag::$tag(value)
                }
            }
        )*
    };
}

tag_from!(
    i8, Byte;
    i16, Short;
    i32, Int;
    i64, Long;
    f32, Float;
    f64, Double;
    String, String;
    NbtList, List;
    NbtCompound, Compound
);

impl From<&str> for NbtTag {
    fn from(value: &str) -> NbtTag {
        NbtTag::String(value.to_owned())
    }
}

impl From<&String> for NbtTag {
    fn from(value: &String) -> NbtTag {
        NbtTag::String(value.clone())
    }
}

impl From<bool> for NbtTag {
    fn from(value: bool) -> NbtTag {
        NbtTag::Byte(if value { 1 } else { 0 })
    }
}

impl From<u8> for NbtTag {
    fn from(value: u8) -> Self {
        NbtTag::Byte(value as i8)
    }
}

impl From<Vec<i8>> for NbtTag {
    fn from(value: Vec<i8>) -> Self {
        NbtTag::List(NbtList {
            kind: Some(TagKind::Byte),
            tags: value.into_iter().map(NbtTag::Byte).collect(),
        })
    }
}

impl From<Vec<i32>> for NbtTag {
    fn from(value: Vec<i32>) -> Self {
        NbtTag::List(NbtList {
            kind: Some(TagKind::Int),
            tags: value.into_iter().map(NbtTag::Int).collect(),
        })
    }
}

impl From<Vec<i64>> for NbtTag {
    fn from(value: Vec<i64>) -> Self {
        NbtTag::List(NbtList {
            kind: Some(TagKind::Long),
            tags: value.into_iter().map(NbtTag::Long).collect(),
        })
    }
}

macro_rules! prim_from_tag {
    ($($type:ty, $tag:ident);*) => {
        $(
            impl TryFrom<&NbtTag> for $type {
                type Error = NbtStructureError;

                fn try_from(tag: &NbtTag) -> Result<Self, Self::Error> {
                    if let NbtTag::$tag(value) = tag {
                        Ok(*value)
                    } else {
                        Err(NbtStructureError::kind_mismatch(stringify!($tag), tag.tag_name()))
                    }
                }
            }
        )*
    };
}

prim_from_tag!(
    i8, Byte;
    i16, Short;
    i32, Int;
    i64, Long;
    f32, Float;
    f64, Double
);

impl TryFrom<&NbtTag> for bool {
    type Error = NbtStructureError;

    fn try_from(tag: &NbtTag) -> Result<Self, Self::Error> {
        match tag {
            &NbtTag::Byte(value) => Ok(value != 0),
            &NbtTag::Short(value) => Ok(value != 0),
            &NbtTag::Int(value) => Ok(value != 0),
            &NbtTag::Long(value) => Ok(value != 0),
            _ => Err(NbtStructureError::kind_mismatch(
                "Byte, Short, Int, or Long",
                tag.tag_name(),
            )),
        }
    }
}

impl TryFrom<&NbtTag> for u8 {
    type Error = NbtStructureError;

    fn try_from(tag: &NbtTag) -> Result<Self, Self::Error> {
        match tag {
            &NbtTag::Byte(value) => Ok(value as u8),
            _ => Err(NbtStructureError::kind_mismatch("Byte", tag.tag_name())),
        }
    }
}

macro_rules! ref_from_tag {
    ($($type:ty, $tag:ident);*) => {
        $(
            impl<'a> TryFrom<&'a NbtTag> for &'a $type {
                type Error = NbtStructureError;

                fn try_from(tag: &'a NbtTag) -> Result<Self, Self::Error> {
                    if let NbtTag::$tag(value) = tag {
                        Ok(value)
                    } else {
                        Err(NbtStructureError::kind_mismatch(stringify!($tag), tag.tag_name()))
                    }
                }
            }

            impl<'a> TryFrom<&'a mut NbtTag> for &'a mut $type {
                type Error = NbtStructureError;

                fn try_from(tag: &'a mut NbtTag) -> Result<Self, Self::Error> {
                    if let NbtTag::$tag(value) = tag {
                        Ok(value)
                    } else {
                        Err(NbtStructureError::kind_mismatch(stringify!($tag), tag.tag_name()))
                    }
                }
            }
        )*
    };
}

ref_from_tag!(
    i8, Byte;
    i16, Short;
    i32, Int;
    i64, Long;
    f32, Float;
    f64, Double;
    String, String;
    str, String;
    NbtList, List;
    NbtCompound, Compound
);

macro_rules! from_tag {
    ($($type:ty, $tag:ident);*) => {
        $(
            impl TryFrom<NbtTag> for $type {
                type Error = NbtStructureError;

                fn try_from(tag: NbtTag) -> Result<Self, Self::Error> {
                    if let NbtTag::$tag(value) = tag {
                        Ok(value)
                    } else {
                        Err(NbtStructureError::kind_mismatch(stringify!($tag), tag.tag_name()))
                    }
                }
            }
        )*
    };
}

from_tag!(
    i8, Byte;
    i16, Short;
    i32, Int;
    i64, Long;
    f32, Float;
    f64, Double;
    String, String;
    NbtList, List;
    NbtCompound, Compound
);

macro_rules! vec_from_tag {
    ($($type:ty, $tag:ident, $kind:ident);*) => {
        $(
            impl TryFrom<&NbtTag> for Vec<$type> {
                type Error = NbtStructureError;

                fn try_from(tag: &NbtTag) -> Result<Self, Self::Error> {
                    match tag {
                        NbtTag::List(list) if list.kind() == Some(TagKind::$kind) => Ok(list
                            .tags
                            .iter()
                            .filter_map(|tag| match tag {
                                NbtTag::$tag(value) => Some(*value),
                                _ => None,
                            })
                            .collect()),
                        _ => Err(NbtStructureError::kind_mismatch(
                            concat!("List of ", stringify!($tag)),
                            tag.tag_name(),
                        )),
                    }
                }
            }
        )*
    };
}

vec_from_tag!(
    i8, Byte, Byte;
    i32, Int, Int;
    i64, Long, Long
);

/// The NBT tag list type: a homogenously typed, ordered sequence of tags.
///
/// Every list carries an element kind which all of its elements satisfy. A freshly created list
/// has no kind ([`kind`] returns `None`) until one is declared with [`set_kind`] or inferred by
/// the first [`push`]. Inference uses the widest kind accepting the pushed value, so pushing any
/// integer into a kind-unset list produces a list of [`Long`]s; declare a narrower kind with
/// [`set_kind`] to override this.
///
/// ```
/// # use mica_nbt::*;
/// let mut list = NbtList::new();
/// assert_eq!(list.kind(), None);
///
/// list.push(1i32).unwrap();
/// assert_eq!(list.kind(), Some(TagKind::Long));
/// assert!(list.push("text").is_err());
/// ```
///
/// [`Long`]: crate::TagKind::Long
/// [`kind`]: crate::NbtList::kind
/// [`push`]: crate::NbtList::push
/// [`set_kind`]: crate::NbtList::set_kind
#[derive(Clone, PartialEq)]
pub struct NbtList {
    pub(crate) kind: Option<TagKind>,
    pub(crate) tags: Vec<NbtTag>,
}

impl NbtList {
    /// Returns a new NBT tag list with an empty internal vec and no element kind.
    pub const fn new() -> Self {
        NbtList {
            kind: None,
            tags: Vec::new(),
        }
    }

    /// Returns a new NBT tag list with the given initial capacity and no element kind.
    pub fn with_capacity(capacity: usize) -> Self {
        NbtList {
            kind: None,
            tags: Vec::with_capacity(capacity),
        }
    }

    /// Returns the element kind of this list, or `None` if no kind has been declared or
    /// inferred yet. A kind of `None` implies the list is empty.
    #[inline]
    pub fn kind(&self) -> Option<TagKind> {
        self.kind
    }

    /// Declares the element kind of this list.
    ///
    /// Succeeds when the list is empty, or when every element already satisfies the given
    /// kind's acceptance predicate, in which case the elements are re-widthed to the new kind.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let mut list = NbtList::new();
    /// list.push(5i64).unwrap();
    /// list.push(7i64).unwrap();
    ///
    /// list.set_kind(TagKind::Short).unwrap();
    /// assert!(matches!(list.get::<i16>(0), Ok(5)));
    ///
    /// list.push(1000i64).unwrap();
    /// assert!(list.set_kind(TagKind::Byte).is_err()); // 1000 does not fit in a byte
    /// ```
    pub fn set_kind(&mut self, kind: TagKind) -> Result<(), NbtStructureError> {
        if kind.default_tag().is_none() {
            return Err(NbtStructureError::invalid_kind(kind));
        }

        for tag in &self.tags {
            if !kind.accepts(tag) {
                return Err(NbtStructureError::kind_mismatch(kind.name(), tag.tag_name()));
            }
        }

        self.tags = mem::take(&mut self.tags)
            .into_iter()
            .map(|tag| kind.coerce(tag))
            .collect();
        self.kind = Some(kind);
        Ok(())
    }

    /// Pushes the given value to the back of the list after wrapping it in an `NbtTag`.
    ///
    /// If the list has no element kind yet, the value's default kind is inferred; otherwise the
    /// value must satisfy the list's kind.
    pub fn push<T: Into<NbtTag>>(&mut self, value: T) -> Result<(), NbtStructureError> {
        let tag = value.into();
        let kind = match self.kind {
            Some(kind) => kind,
            None => tag.default_kind(),
        };

        if !kind.accepts(&tag) {
            return Err(NbtStructureError::kind_mismatch(kind.name(), tag.tag_name()));
        }

        self.kind = Some(kind);
        self.tags.push(kind.coerce(tag));
        Ok(())
    }

    /// Returns the length of this list.
    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if this tag list has a length of zero, false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the value of the tag at the given index, or an error if the index is out of
    /// bounds or the tag type does not match the type specified. This method should be used for
    /// obtaining primitives and shared references to lists and compounds.
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let list: NbtList = vec![1i64, 2, 3].try_into().unwrap();
    ///
    /// assert!(matches!(list.get::<i64>(0), Ok(1)));
    /// assert!(list.get::<f64>(0).is_err()); // Type mismatch
    /// assert!(list.get::<i64>(10).is_err()); // Invalid index
    /// ```
    pub fn get<'a, T>(&'a self, index: usize) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a NbtTag>,
        T::Error: Into<anyhow::Error>,
    {
        T::try_from(
            self.tags
                .get(index)
                .ok_or_else(|| NbtStructureError::invalid_index(index, self.tags.len()))?,
        )
        .map_err(NbtReprError::from_any)
    }

    /// Returns a mutable reference to the tag at the given index, or an error if the index is
    /// out of bounds or the tag type does not match the type specified. Only kind-preserving
    /// mutable views are available, so the element kind discipline cannot be broken through
    /// this method.
    pub fn get_mut<'a, T>(&'a mut self, index: usize) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a mut NbtTag>,
        T::Error: Into<anyhow::Error>,
    {
        let len = self.tags.len();
        T::try_from(
            self.tags
                .get_mut(index)
                .ok_or_else(|| NbtStructureError::invalid_index(index, len))?,
        )
        .map_err(NbtReprError::from_any)
    }

    /// Iterates over the tags in this list.
    pub fn iter(&self) -> impl Iterator<Item = &NbtTag> + '_ {
        self.tags.iter()
    }

    /// Iterates over this tag list, converting each tag reference into the specified type.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let mut list = NbtList::new();
    /// list.set_kind(TagKind::Int).unwrap();
    /// list.push(0i32).unwrap();
    /// list.push(1i32).unwrap();
    ///
    /// let mut iter = list.iter_map::<i32>();
    /// assert!(matches!(iter.next(), Some(Ok(0i32))));
    /// assert!(matches!(iter.next(), Some(Ok(1i32))));
    /// assert!(iter.next().is_none());
    /// ```
    pub fn iter_map<'a, T: TryFrom<&'a NbtTag>>(
        &'a self,
    ) -> impl Iterator<Item = Result<T, <T as TryFrom<&'a NbtTag>>::Error>> + 'a {
        self.tags.iter().map(|tag| T::try_from(tag))
    }

    /// Iterates over mutable references to the tags in this list, converting each tag reference
    /// into the specified type. See [`iter_map`](crate::NbtList::iter_map) for usage details.
    pub fn iter_mut_map<'a, T: TryFrom<&'a mut NbtTag>>(
        &'a mut self,
    ) -> impl Iterator<Item = Result<T, <T as TryFrom<&'a mut NbtTag>>::Error>> + 'a {
        self.tags.iter_mut().map(|tag| T::try_from(tag))
    }

    /// Converts this tag list to a valid SNBT string. Lists of kind [`Byte`] and [`Int`] render
    /// in the array forms `[B;...]` and `[I;...]`, mirroring their wire representation.
    ///
    /// [`Byte`]: crate::TagKind::Byte
    /// [`Int`]: crate::TagKind::Int
    pub fn to_snbt(&self) -> String {
        let specifier = match self.kind {
            Some(TagKind::Byte) => Some("B;"),
            Some(TagKind::Int) => Some("I;"),
            _ => None,
        };

        match specifier {
            Some(specifier) => format!(
                "[{}{}]",
                specifier,
                self.tags
                    .iter()
                    .filter_map(|tag| tag.to_i64())
                    .map(|value| value.to_string())
                    .collect::<Vec<String>>()
                    .join(",")
            ),
            None => format!(
                "[{}]",
                self.tags
                    .iter()
                    .map(|tag| tag.to_snbt())
                    .collect::<Vec<String>>()
                    .join(",")
            ),
        }
    }
}

impl TryFrom<Vec<NbtTag>> for NbtList {
    type Error = NbtStructureError;

    fn try_from(tags: Vec<NbtTag>) -> Result<Self, Self::Error> {
        let mut list = NbtList::with_capacity(tags.len());
        for tag in tags {
            list.push(tag)?;
        }
        Ok(list)
    }
}

impl TryFrom<Vec<i64>> for NbtList {
    type Error = NbtStructureError;

    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        Ok(NbtList {
            kind: Some(TagKind::Long),
            tags: values.into_iter().map(NbtTag::Long).collect(),
        })
    }
}

impl AsRef<[NbtTag]> for NbtList {
    fn as_ref(&self) -> &[NbtTag] {
        &self.tags
    }
}

impl Display for NbtList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_snbt(), f)
    }
}

impl Debug for NbtList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_snbt(), f)
    }
}

impl Index<usize> for NbtList {
    type Output = NbtTag;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tags[index]
    }
}

/// A single compound entry: the entry's declared kind paired with its current value.
///
/// The declared kind may be narrower than the value's own default kind (a [`Byte`]-declared
/// entry holding the integer 5), and governs both mutation through
/// [`insert`](crate::NbtCompound::insert) and the wire tag the entry is written with.
///
/// [`Byte`]: crate::TagKind::Byte
#[derive(Clone, PartialEq, Debug)]
pub struct NbtEntry {
    pub(crate) kind: TagKind,
    pub(crate) tag: NbtTag,
}

impl NbtEntry {
    /// The declared kind of this entry.
    #[inline]
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// The value of this entry.
    #[inline]
    pub fn tag(&self) -> &NbtTag {
        &self.tag
    }
}

/// The NBT tag compound type: an insertion-ordered mapping from string keys to kind-declared
/// tag values.
///
/// Every entry carries a declared kind alongside its value. Inserting under an existing key
/// requires the new value to satisfy the declared kind; inserting under a fresh key infers the
/// value's default kind (the widest kind accepting it, so plain integers become [`Long`]s).
/// Narrower kinds are declared with [`set_kind`], either before or after the value is assigned:
///
/// ```
/// # use mica_nbt::*;
/// let mut compound = NbtCompound::new();
/// compound.insert("a", 15).unwrap();
/// assert_eq!(compound.get_kind("a"), Some(TagKind::Long));
///
/// compound.set_kind("a", TagKind::Byte).unwrap();
/// assert!(matches!(compound.get::<i8>("a"), Ok(15)));
///
/// compound.insert("a", 300).unwrap_err(); // 300 does not fit the declared kind
/// ```
///
/// Entry insertion order is preserved, and preserved across encoding and decoding.
///
/// [`Long`]: crate::TagKind::Long
/// [`set_kind`]: crate::NbtCompound::set_kind
#[derive(Clone)]
pub struct NbtCompound {
    pub(crate) entries: IndexMap<String, NbtEntry>,
}

impl NbtCompound {
    /// Returns a new NBT tag compound with no entries.
    pub fn new() -> Self {
        NbtCompound {
            entries: IndexMap::new(),
        }
    }

    /// Returns a new NBT tag compound with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        NbtCompound {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries in this compound.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the length of this compound is zero, false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether or not this compound has an entry with the given name.
    #[inline]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the declared kind of the entry with the given name, or `None` if no such entry
    /// exists.
    pub fn get_kind(&self, name: &str) -> Option<TagKind> {
        self.entries.get(name).map(|entry| entry.kind)
    }

    /// Declares the kind of the entry with the given name.
    ///
    /// If no such entry exists, one is created holding the kind's default value (zero for
    /// numerics, empty for strings and containers). If the entry exists, its current value must
    /// satisfy the new kind's acceptance predicate, and is re-widthed to it.
    ///
    /// Only the nine value-model kinds may be declared; [`End`] and the array kinds are
    /// rejected.
    ///
    /// [`End`]: crate::TagKind::End
    pub fn set_kind(&mut self, name: &str, kind: TagKind) -> Result<(), NbtStructureError> {
        let default = match kind.default_tag() {
            Some(default) => default,
            None => return Err(NbtStructureError::invalid_kind(kind)),
        };

        match self.entries.get_mut(name) {
            Some(entry) => {
                if !kind.accepts(&entry.tag) {
                    return Err(NbtStructureError::kind_mismatch(
                        kind.name(),
                        entry.tag.tag_name(),
                    ));
                }

                let tag = mem::replace(&mut entry.tag, NbtTag::Byte(0));
                entry.tag = kind.coerce(tag);
                entry.kind = kind;
            }
            None => {
                self.entries
                    .insert(name.to_owned(), NbtEntry { kind, tag: default });
            }
        }

        Ok(())
    }

    /// Adds the given value to this compound with the given name after wrapping that value in
    /// an `NbtTag`.
    ///
    /// If an entry with the name already exists, the value must satisfy its declared kind,
    /// otherwise the entry keeps its position and receives the new value. For a fresh name the
    /// declared kind is the value's default kind.
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let mut compound = NbtCompound::new();
    /// compound.insert("test", 1.0f64).unwrap();
    ///
    /// assert!((compound.get::<f64>("test").unwrap() - 1.0f64).abs() < 1e-5);
    /// assert!(compound.insert("test", "text").is_err()); // Kind mismatch
    /// ```
    pub fn insert<K: Into<String>, T: Into<NbtTag>>(
        &mut self,
        name: K,
        value: T,
    ) -> Result<(), NbtStructureError> {
        let name = name.into();
        let tag = value.into();
        let kind = match self.entries.get(&name) {
            Some(entry) => entry.kind,
            None => tag.default_kind(),
        };

        if !kind.accepts(&tag) {
            return Err(NbtStructureError::kind_mismatch(kind.name(), tag.tag_name()));
        }

        self.entries.insert(
            name,
            NbtEntry {
                kind,
                tag: kind.coerce(tag),
            },
        );
        Ok(())
    }

    /// Removes and returns the value of the entry with the given name, preserving the order of
    /// the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<NbtTag> {
        self.entries.shift_remove(name).map(|entry| entry.tag)
    }

    /// Returns the value of the entry with the given name, or an error if no entry exists with
    /// the given name or specified type. This method should be used to obtain primitives as
    /// well as shared references to lists and compounds.
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let mut compound = NbtCompound::new();
    /// compound.insert("test", 1.0f64).unwrap();
    ///
    /// assert!((compound.get::<f64>("test").unwrap() - 1.0f64).abs() < 1e-5);
    /// assert!(compound.get::<i64>("test").is_err()); // Type mismatch
    /// assert!(compound.get::<f64>("foo").is_err()); // Missing tag
    /// ```
    pub fn get<'a, T>(&'a self, name: &str) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a NbtTag>,
        T::Error: Into<anyhow::Error>,
    {
        T::try_from(
            self.entries
                .get(name)
                .map(|entry| &entry.tag)
                .ok_or_else(|| NbtStructureError::missing_tag(name))?,
        )
        .map_err(NbtReprError::from_any)
    }

    /// Returns the value of the entry with the given name, or an error if no entry exists with
    /// the given name or specified type. This method should be used to obtain kind-preserving
    /// mutable views of primitives, lists and compounds.
    ///
    /// ```
    /// # use mica_nbt::*;
    /// let mut compound = NbtCompound::new();
    /// compound.insert("test", 1.0f64).unwrap();
    ///
    /// *compound.get_mut::<&mut f64>("test").unwrap() *= 2.0;
    ///
    /// assert!((compound.get::<f64>("test").unwrap() - 2.0f64).abs() < 1e-5);
    /// ```
    pub fn get_mut<'a, T>(&'a mut self, name: &str) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a mut NbtTag>,
        T::Error: Into<anyhow::Error>,
    {
        T::try_from(
            self.entries
                .get_mut(name)
                .map(|entry| &mut entry.tag)
                .ok_or_else(|| NbtStructureError::missing_tag(name))?,
        )
        .map_err(NbtReprError::from_any)
    }

    /// Iterates over the names of the entries in this compound in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over the entries in this compound in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtEntry)> + '_ {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Iterates over this tag compound, converting each tag reference into the specified type.
    /// Each key is paired with the result of the attempted conversion into the specified type.
    /// The iterator will not terminate even if some conversions fail.
    pub fn iter_map<'a, T: TryFrom<&'a NbtTag>>(
        &'a self,
    ) -> impl Iterator<Item = (&'a str, Result<T, <T as TryFrom<&'a NbtTag>>::Error>)> + 'a {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), T::try_from(&entry.tag)))
    }

    /// Iterates over this tag compound, converting each mutable tag reference into the
    /// specified type. See [`iter_map`](crate::NbtCompound::iter_map) for details.
    pub fn iter_mut_map<'a, T: TryFrom<&'a mut NbtTag>>(
        &'a mut self,
    ) -> impl Iterator<Item = (&'a str, Result<T, <T as TryFrom<&'a mut NbtTag>>::Error>)> + 'a
    {
        self.entries
            .iter_mut()
            .map(|(name, entry)| (name.as_str(), T::try_from(&mut entry.tag)))
    }

    /// Converts this tag compound into a valid SNBT string, rendering entries in insertion
    /// order.
    pub fn to_snbt(&self) -> String {
        let mut snbt_compound = String::with_capacity(2);
        snbt_compound.push('{');
        snbt_compound.push_str(
            &self
                .entries
                .iter()
                .map(|(name, entry)| {
                    if NbtTag::should_quote(name) {
                        format!("{}:{}", NbtTag::string_to_snbt(name), entry.tag.to_snbt())
                    } else {
                        format!("{}:{}", name, entry.tag.to_snbt())
                    }
                })
                .collect::<Vec<String>>()
                .join(","),
        );
        snbt_compound.push('}');
        snbt_compound
    }
}

impl PartialEq for NbtCompound {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((name, entry), (other_name, other_entry))| {
                    name == other_name && entry == other_entry
                })
    }
}

impl Display for NbtCompound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_snbt(), f)
    }
}

impl Debug for NbtCompound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_snbt(), f)
    }
}
