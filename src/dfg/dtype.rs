//! Result types of vertices.
//!
//! The graph only represents flat bit vectors and unpacked arrays of them.
//! Producers describe their types with [`SourceType`], which is normalized by
//! [`DType::from_source`]; anything that cannot be normalized is refused with
//! [`Error::UnsupportedType`] and must stay outside of the graph.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::{Error, Result};

/// The type of a value as the producer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    /// A packed bit vector.
    Bits {
        /// Number of bits.
        width: u32,
    },
    /// A reference to a named type, e.g. a typedef.
    Ref(Box<SourceType>),
    /// A packed array of packed elements.
    PackedArray {
        /// Element type.
        elem: Box<SourceType>,
        /// Number of elements.
        len: u32,
    },
    /// A struct. Only packed structs are flat bit vectors.
    Struct {
        /// Whether the struct is packed.
        packed: bool,
        /// Member types.
        fields: Vec<SourceType>,
    },
    /// An unpacked array.
    UnpackedArray {
        /// Element type.
        elem: Box<SourceType>,
        /// Number of elements.
        len: u32,
    },
    /// A floating point value.
    Real,
    /// A string value.
    String,
}

impl SourceType {
    /// Create a packed bit vector type.
    pub fn bits(width: u32) -> Self { SourceType::Bits { width } }

    /// Create an unpacked array type.
    pub fn unpacked_array(elem: SourceType, len: u32) -> Self {
        SourceType::UnpackedArray {
            elem: Box::new(elem),
            len,
        }
    }

    fn skip_refs(&self) -> &SourceType {
        let mut ty = self;
        while let SourceType::Ref(inner) = ty {
            ty = inner;
        }
        ty
    }

    /// The width of a packed type.
    fn packed_width(&self) -> Result<u32> {
        match self.skip_refs() {
            SourceType::Bits { width: 0 } => Err(unsupported("zero width bit vector")),
            SourceType::Bits { width } => Ok(*width),
            SourceType::PackedArray { len: 0, .. } => Err(unsupported("empty packed array")),
            SourceType::PackedArray { elem, len } => elem
                .packed_width()?
                .checked_mul(*len)
                .ok_or_else(|| unsupported("packed array is too wide")),
            SourceType::Struct { packed: false, .. } => Err(unsupported("unpacked struct")),
            SourceType::Struct { fields, .. } if fields.is_empty() => {
                Err(unsupported("empty packed struct"))
            }
            SourceType::Struct { fields, .. } => fields.iter().try_fold(0u32, |width, field| {
                width
                    .checked_add(field.packed_width()?)
                    .ok_or_else(|| unsupported("packed struct is too wide"))
            }),
            SourceType::UnpackedArray { .. } => Err(unsupported("nested unpacked array")),
            SourceType::Real => Err(unsupported("real")),
            SourceType::String => Err(unsupported("string")),
            SourceType::Ref(_) => unreachable!(),
        }
    }
}

fn unsupported(what: &str) -> Error { Error::UnsupportedType(what.into()) }

/// The result type of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// A packed bit vector.
    Packed {
        /// Number of bits.
        width: u32,
    },
    /// An unpacked array of packed elements.
    Array {
        /// Number of bits of each element.
        elem_width: u32,
        /// Number of elements.
        len: u32,
    },
}

impl DType {
    /// Create a packed type of the given width.
    pub fn packed(width: u32) -> Self { DType::Packed { width } }

    /// Normalize a producer type.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] if the type cannot be represented: reals,
    /// strings, unpacked structs, unpacked arrays of unpacked types, and
    /// zero-sized types.
    pub fn from_source(ty: &SourceType) -> Result<Self> {
        match ty.skip_refs() {
            SourceType::UnpackedArray { len: 0, .. } => Err(unsupported("empty unpacked array")),
            SourceType::UnpackedArray { elem, len } => Ok(DType::Array {
                elem_width: elem.packed_width()?,
                len: *len,
            }),
            ty => ty.packed_width().map(DType::packed),
        }
    }

    /// Check that the type has at least one bit and, for arrays, at least
    /// one element.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] for zero-sized types.
    pub fn check(self) -> Result<Self> {
        match self {
            DType::Packed { width: 0 } => Err(unsupported("zero width bit vector")),
            DType::Array { elem_width: 0, .. } => Err(unsupported("zero width array element")),
            DType::Array { len: 0, .. } => Err(unsupported("empty unpacked array")),
            _ => Ok(self),
        }
    }

    /// Check if this is a packed type.
    pub fn is_packed(&self) -> bool { matches!(self, DType::Packed { .. }) }

    /// Check if this is an unpacked array type.
    pub fn is_array(&self) -> bool { matches!(self, DType::Array { .. }) }

    /// The width of a packed type.
    ///
    /// # Panics
    ///
    /// Panics if the type is an array.
    pub fn width(&self) -> u32 {
        match self {
            DType::Packed { width } => *width,
            DType::Array { .. } => panic!("width of unpacked array type {}", self),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Packed { width } => write!(f, "[{}:0]", width - 1),
            DType::Array { elem_width, len } => {
                write!(f, "[{}:0] [0:{}]", elem_width - 1, len - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_types() {
        assert_eq!(DType::from_source(&SourceType::bits(8)).unwrap(), DType::packed(8));

        let word = SourceType::Ref(Box::new(SourceType::bits(16)));
        let packed = SourceType::PackedArray {
            elem: Box::new(word.clone()),
            len: 4,
        };
        assert_eq!(DType::from_source(&packed).unwrap(), DType::packed(64));

        let record = SourceType::Struct {
            packed: true,
            fields: vec![SourceType::bits(1), word, SourceType::bits(3)],
        };
        assert_eq!(DType::from_source(&record).unwrap(), DType::packed(20));
    }

    #[test]
    fn test_array_types() {
        let ty = SourceType::unpacked_array(SourceType::bits(8), 16);
        let dtype = DType::from_source(&ty).unwrap();
        assert_eq!(
            dtype,
            DType::Array {
                elem_width: 8,
                len: 16
            }
        );
        assert!(dtype.is_array());
        assert_eq!(format!("{}", dtype), "[7:0] [0:15]");
        assert_eq!(format!("{}", DType::packed(1)), "[0:0]");
    }

    #[test]
    fn test_unsupported_types() {
        let unsupported = [
            SourceType::Real,
            SourceType::String,
            SourceType::bits(0),
            SourceType::Struct {
                packed: false,
                fields: vec![SourceType::bits(1)],
            },
            SourceType::unpacked_array(SourceType::unpacked_array(SourceType::bits(1), 2), 2),
            SourceType::unpacked_array(SourceType::bits(8), 0),
            SourceType::PackedArray {
                elem: Box::new(SourceType::bits(u32::MAX)),
                len: 2,
            },
        ];
        for ty in &unsupported {
            assert!(
                matches!(DType::from_source(ty), Err(Error::UnsupportedType(_))),
                "{:?}",
                ty
            );
        }
    }

    #[test]
    fn test_check() {
        assert_eq!(DType::packed(3).check().unwrap(), DType::packed(3));
        let empty = [
            DType::packed(0),
            DType::Array {
                elem_width: 0,
                len: 4,
            },
            DType::Array {
                elem_width: 8,
                len: 0,
            },
        ];
        for dtype in empty {
            assert!(matches!(dtype.check(), Err(Error::UnsupportedType(_))), "{:?}", dtype);
        }
    }

    #[test]
    #[should_panic(expected = "width of unpacked array")]
    fn test_width_of_array() {
        DType::Array {
            elem_width: 8,
            len: 2,
        }
        .width();
    }
}
