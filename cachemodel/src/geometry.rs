use crate::error::{CacheError, Result};

pub const DEFAULT_ADDRESS_WIDTH: u32 = 32;
pub const DEFAULT_LINE_SIZE: u64 = 64;
pub const DEFAULT_CAPACITY_KIB: u64 = 4;
pub const DEFAULT_HIT_LATENCY: u64 = 1;
pub const DEFAULT_MISS_LATENCY: u64 = 10;

/// Splits addresses into a set index and a tag
///
/// The decoder is pure arithmetic: the offset within the line is dropped, the next `index_bits`
/// select the set, and everything above that is the tag. Tags are kept at full native width, the
/// tag width is only used to report the storage overhead of the tag memory
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_bits: u32,
    address_width: u32,
}

impl AddressDecoder {
    pub fn new(line_size: u64, num_sets: u64, address_width: u32) -> Self {
        Self {
            offset_bits: line_size.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
            address_width,
        }
    }

    /// Converts an address into a set index and a tag
    ///
    /// # Arguments
    ///
    /// * `address`: The address of the access, must fit in the configured address width
    ///
    /// returns: Result<(usize, u64), CacheError>
    ///
    /// # Examples
    ///
    /// ```
    /// use cachemodel::geometry::AddressDecoder;
    /// // 64 byte lines, 64 sets
    /// let decoder = AddressDecoder::new(64, 64, 32);
    /// assert_eq!(decoder.decode(0x1040).unwrap(), (1, 1));
    /// ```
    pub fn decode(&self, address: u64) -> Result<(usize, u64)> {
        if self.address_width < u64::BITS && address >> self.address_width != 0 {
            return Err(CacheError::AddressOutOfRange {
                address,
                width: self.address_width,
            });
        }
        let index = (address >> self.offset_bits) & ((1 << self.index_bits) - 1);
        let tag = address
            .checked_shr(self.index_bits + self.offset_bits)
            .unwrap_or(0);
        Ok((index as usize, tag))
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the stored tags, for reporting only
    pub fn tag_bits(&self) -> u32 {
        self.address_width - self.index_bits - self.offset_bits
    }
}

/// The immutable configuration of a single cache
///
/// Only valid geometries can be constructed: the number of sets is a positive power of two, the
/// capacity is an exact multiple of a set, and the tag width is not negative
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Geometry {
    address_width: u32,
    line_size: u64,
    capacity: u64,
    n_way: u64,
    num_sets: u64,
    hit_latency: u64,
    miss_latency: u64,
    decoder: AddressDecoder,
}

impl Geometry {
    /// Validates and creates a new geometry
    ///
    /// # Arguments
    ///
    /// * `address_width`: Maximum address width in bits, between 1 and 64
    /// * `line_size`: The cache line size in bytes, a power of two
    /// * `capacity`: The total capacity in bytes
    /// * `n_way`: The associativity, 1 for direct mapped caches
    /// * `hit_latency`, `miss_latency`: Abstract cycle costs, only used for the AMAT
    ///
    /// returns: Result<Geometry, CacheError>
    pub fn new(
        address_width: u32,
        line_size: u64,
        capacity: u64,
        n_way: u64,
        hit_latency: u64,
        miss_latency: u64,
    ) -> Result<Self> {
        if address_width == 0 || address_width > u64::BITS {
            return Err(CacheError::InvalidGeometry(format!(
                "address width must be between 1 and 64 bits, got {address_width}"
            )));
        }
        if !line_size.is_power_of_two() {
            return Err(CacheError::InvalidGeometry(format!(
                "line size must be a power of two, got {line_size}"
            )));
        }
        if n_way == 0 {
            return Err(CacheError::InvalidGeometry("associativity must be at least 1".into()));
        }
        let set_bytes = n_way
            .checked_mul(line_size)
            .ok_or_else(|| CacheError::InvalidGeometry("set size overflows".into()))?;
        if capacity % set_bytes != 0 {
            return Err(CacheError::InvalidGeometry(format!(
                "capacity of {capacity} bytes is not a multiple of the {set_bytes} byte set size"
            )));
        }
        let num_sets = capacity / set_bytes;
        if !num_sets.is_power_of_two() {
            return Err(CacheError::InvalidGeometry(format!(
                "number of sets must be a positive power of two, got {num_sets}"
            )));
        }
        let decoder = AddressDecoder::new(line_size, num_sets, address_width);
        if decoder.offset_bits() + decoder.index_bits() > address_width {
            return Err(CacheError::InvalidGeometry(format!(
                "{} offset and {} index bits don't fit in a {address_width} bit address",
                decoder.offset_bits(),
                decoder.index_bits()
            )));
        }
        Ok(Self {
            address_width,
            line_size,
            capacity,
            n_way,
            num_sets,
            hit_latency,
            miss_latency,
            decoder,
        })
    }

    pub fn decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    pub fn address_width(&self) -> u32 {
        self.address_width
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn capacity_kib(&self) -> f64 {
        self.capacity as f64 / 1024.0
    }

    pub fn n_way(&self) -> u64 {
        self.n_way
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }

    /// Number of cache lines across all sets
    pub fn num_lines(&self) -> u64 {
        self.num_sets * self.n_way
    }

    pub fn hit_latency(&self) -> u64 {
        self.hit_latency
    }

    pub fn miss_latency(&self) -> u64 {
        self.miss_latency
    }

    /// Size of the tag memory in KiB, one tag per line
    pub fn tag_storage_kib(&self) -> f64 {
        (self.decoder.tag_bits() as u64 * self.num_lines()) as f64 / 8.0 / 1024.0
    }
}

impl Default for Geometry {
    fn default() -> Self {
        let num_sets = DEFAULT_CAPACITY_KIB * 1024 / DEFAULT_LINE_SIZE;
        Self {
            address_width: DEFAULT_ADDRESS_WIDTH,
            line_size: DEFAULT_LINE_SIZE,
            capacity: DEFAULT_CAPACITY_KIB * 1024,
            n_way: 1,
            num_sets,
            hit_latency: DEFAULT_HIT_LATENCY,
            miss_latency: DEFAULT_MISS_LATENCY,
            decoder: AddressDecoder::new(DEFAULT_LINE_SIZE, num_sets, DEFAULT_ADDRESS_WIDTH),
        }
    }
}
