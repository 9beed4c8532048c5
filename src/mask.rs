use core::{fmt, ops::BitOr};
use derive_more::Display;
use thiserror::Error;

/// Dimensionality of the simulated domain.
///
/// A domain of dimension `D` has `2 * D` face neighbors.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Neighbors along `x` only.
    #[display("1D")]
    One = 1,
    /// Neighbors along `x` and `y`.
    #[display("2D")]
    Two = 2,
    /// Neighbors along `x`, `y` and `z`.
    #[display("3D")]
    Three = 3,
}

impl Dim {
    /// Number of neighbor directions (bit positions) in this domain.
    #[must_use]
    pub const fn directions(self) -> u8 {
        2 * self as u8
    }

    const fn full_bits(self) -> u8 {
        (1 << self.directions()) - 1
    }
}

/// A neighbor direction. The discriminant is the direction's bit position in
/// an [`ExchangeMask`] and is a stable contract.
///
/// Directions come in antipodal pairs sharing one axis: `Left`/`Right` (x),
/// `Top`/`Bottom` (y), `Front`/`Back` (z).
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Direction {
    /// Negative x.
    #[display("LEFT")]
    Left = 0,
    /// Positive x.
    #[display("RIGHT")]
    Right = 1,
    /// Positive y.
    #[display("TOP")]
    Top = 2,
    /// Negative y.
    #[display("BOTTOM")]
    Bottom = 3,
    /// Negative z.
    #[display("FRONT")]
    Front = 4,
    /// Positive z.
    #[display("BACK")]
    Back = 5,
}

impl Direction {
    /// All directions in bit order.
    pub const ALL: [Self; 6] = [
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::Front,
        Self::Back,
    ];

    /// Bit position of this direction inside a mask.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Direction with the given bit position, if any.
    #[must_use]
    pub const fn from_bit(bit: u8) -> Option<Self> {
        if (bit as usize) < Self::ALL.len() {
            Some(Self::ALL[bit as usize])
        } else {
            None
        }
    }

    /// The antipodal direction: what the neighbor calls the same link.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self.bit() ^ 1) as usize]
    }

    /// Zero-based axis this direction lies on.
    #[must_use]
    pub const fn axis(self) -> u8 {
        self.bit() / 2
    }

    /// Smallest domain dimensionality in which this direction exists.
    #[must_use]
    pub const fn min_dim(self) -> Dim {
        match self.axis() {
            0 => Dim::One,
            1 => Dim::Two,
            _ => Dim::Three,
        }
    }
}

/// Error returned when a mask would name directions the domain doesn't have.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaskError {
    /// The raw bit pattern sets positions at or above `2 * D`.
    #[error("bit pattern {bits:#b} sets positions beyond the {} directions of a {dim} domain", .dim.directions())]
    BitsOutOfRange {
        /// The rejected pattern.
        bits: u32,
        /// Domain dimensionality the mask was built for.
        dim: Dim,
    },
    /// A named direction lies on an axis the domain doesn't have.
    #[error("direction {direction} does not exist in a {dim} domain")]
    DirectionOutOfRange {
        /// The rejected direction.
        direction: Direction,
        /// Domain dimensionality the mask was built for.
        dim: Dim,
    },
}

/// Subset of neighbor directions selected for one communication step.
///
/// Every asserted bit is a distinct face neighbor, so a mask can't name the
/// same neighbor offset twice. A mask driving a single exchange step must
/// also not select both directions of one axis (see
/// [`ExchangeMask::has_opposite_pair`]); receive masks may.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeMask {
    bits: u8,
    dim: Dim,
}

impl ExchangeMask {
    /// Mask selecting no direction.
    #[must_use]
    pub const fn empty(dim: Dim) -> Self {
        Self { bits: 0, dim }
    }

    /// Mask selecting every direction of the domain.
    #[must_use]
    pub const fn all(dim: Dim) -> Self {
        Self {
            bits: dim.full_bits(),
            dim,
        }
    }

    /// Build a mask from a raw bit pattern.
    ///
    /// # Errors
    /// If any bit at position `2 * D` or above is set.
    pub fn from_bits(bits: u32, dim: Dim) -> Result<Self, MaskError> {
        match u8::try_from(bits) {
            Ok(narrow) if narrow & !dim.full_bits() == 0 => Ok(Self { bits: narrow, dim }),
            _ => Err(MaskError::BitsOutOfRange { bits, dim }),
        }
    }

    /// Build a mask from named directions.
    ///
    /// # Errors
    /// If a direction lies on an axis the domain doesn't have.
    pub fn from_directions(
        dim: Dim,
        directions: impl IntoIterator<Item = Direction>,
    ) -> Result<Self, MaskError> {
        let mut mask = Self::empty(dim);
        for direction in directions {
            if direction.min_dim() as u8 > dim as u8 {
                return Err(MaskError::DirectionOutOfRange { direction, dim });
            }
            mask.bits |= 1 << direction.bit();
        }
        Ok(mask)
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Domain dimensionality.
    #[must_use]
    pub const fn dim(self) -> Dim {
        self.dim
    }

    /// Whether `direction` is selected.
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.bits & (1 << direction.bit()) != 0
    }

    /// Whether no direction is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of selected directions.
    #[must_use]
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Union of both direction sets.
    ///
    /// # Panics
    /// If the masks were built for different dimensionalities.
    #[must_use]
    pub fn union_with(self, other: Self) -> Self {
        assert_eq!(
            self.dim, other.dim,
            "ExchangeMask::union_with: masks of different dimensionality"
        );
        Self {
            bits: self.bits | other.bits,
            dim: self.dim,
        }
    }

    /// Map every selected direction to its antipode, turning a sender's
    /// "send left" into the receiver's "receive right".
    #[must_use]
    pub const fn opposite(self) -> Self {
        const EVEN: u8 = 0b01_0101;
        const ODD: u8 = 0b10_1010;
        Self {
            bits: ((self.bits & EVEN) << 1) | ((self.bits & ODD) >> 1),
            dim: self.dim,
        }
    }

    /// Whether both directions of some axis are selected, e.g. `Left` and
    /// `Right`.
    #[must_use]
    pub const fn has_opposite_pair(self) -> bool {
        self.bits & self.opposite().bits != 0
    }

    /// Selected directions in bit order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

impl BitOr for ExchangeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union_with(rhs)
    }
}

impl fmt::Display for ExchangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, direction) in self.iter().enumerate() {
            if idx != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{direction}")?;
        }
        f.write_str("]")
    }
}
