//! Capability flags and provider kinds.
//!
//! - [`Flags`] - READABLE / WRITABLE / CONSTANT bitset
//! - [`Kind`] - Physical class of the backing store

use std::fmt;
use std::ops::BitOr;

use crate::error::ProviderError;

/// Capability flags declaring which operations are legal on a provider.
///
/// CONSTANT and WRITABLE are mutually exclusive. `|` builds a raw union;
/// every place that accepts flags from a caller runs [`Flags::validate`].
///
/// # Example
///
/// ```
/// use byteprovider::Flags;
///
/// let flags = Flags::new(Flags::READABLE.bits() | Flags::WRITABLE.bits())?;
/// assert!(flags.has(Flags::WRITABLE));
/// assert!(!flags.read_only().has(Flags::WRITABLE));
///
/// assert!(Flags::WRITABLE.combine(Flags::CONSTANT).is_err());
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    /// No capabilities.
    pub const EMPTY: Flags = Flags(0);
    /// Bytes can be read.
    pub const READABLE: Flags = Flags(0b001);
    /// Bytes can be written.
    pub const WRITABLE: Flags = Flags(0b010);
    /// Bytes are immutable.
    pub const CONSTANT: Flags = Flags(0b100);

    const ALL: u8 = 0b111;

    /// Creates flags from raw bits.
    ///
    /// Returns an error for unknown bits or CONSTANT combined with WRITABLE.
    pub fn new(bits: u8) -> Result<Self, ProviderError> {
        if bits & !Self::ALL != 0 {
            return Err(ProviderError::InvalidConfig {
                message: "unknown capability bits",
            });
        }
        Flags(bits).validate()
    }

    /// Rebuilds flags from bits that were produced by a validated `Flags`.
    pub(crate) const fn from_bits_retain(bits: u8) -> Flags {
        Flags(bits & Self::ALL)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `flag` is set.
    pub const fn has(self, flag: Flags) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Returns true if no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bitwise union, rejecting CONSTANT together with WRITABLE.
    pub fn combine(self, other: Flags) -> Result<Flags, ProviderError> {
        Flags(self.0 | other.0).validate()
    }

    /// Returns these flags with `flag` cleared.
    pub const fn without(self, flag: Flags) -> Flags {
        Flags(self.0 & !flag.0)
    }

    /// Returns these flags with WRITABLE suppressed.
    pub const fn read_only(self) -> Flags {
        self.without(Flags::WRITABLE)
    }

    /// Returns true if the flags allow in-place mutation.
    pub const fn is_mutable(self) -> bool {
        self.has(Flags::WRITABLE) && !self.has(Flags::CONSTANT)
    }

    /// Checks the CONSTANT / WRITABLE exclusion.
    pub fn validate(self) -> Result<Flags, ProviderError> {
        if self.has(Flags::CONSTANT) && self.has(Flags::WRITABLE) {
            return Err(ProviderError::Capability {
                operation: "declaring CONSTANT with WRITABLE",
                flags: self,
            });
        }
        Ok(self)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        let names = [
            (Flags::READABLE, "READABLE"),
            (Flags::WRITABLE, "WRITABLE"),
            (Flags::CONSTANT, "CONSTANT"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.has(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Physical class of a provider's backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Forward-only source of unknown length.
    Stream,
    /// Resident process memory.
    Memory,
    /// Memory-mapped file.
    File,
    /// Device memory.
    Device,
}

impl Kind {
    /// Returns true for [`Kind::Stream`].
    pub const fn is_stream(self) -> bool {
        matches!(self, Kind::Stream)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Stream => "stream",
            Kind::Memory => "memory",
            Kind::File => "file",
            Kind::Device => "device",
        };
        f.write_str(name)
    }
}
