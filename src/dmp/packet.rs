//! DMP FIFO packet fields
//!
//! A MotionApps 6.12 packet is 28 bytes. The quaternion occupies the first 16
//! bytes as four 32-bit big-endian words (w, x, y, z); the top 16 bits of each
//! word carry the value in Q14 fixed point, which is all this module reads.

/// Offsets of the quaternion components (w, x, y, z) within a packet
pub const QUATERNION_OFFSETS: [usize; 4] = [0, 4, 8, 12];

/// Shortest packet that still holds all four quaternion components
pub const QUATERNION_MIN_PACKET_SIZE: usize = QUATERNION_OFFSETS[3] + 2;

/// Q14 scale of the quaternion components (1.0 == 16384)
pub const QUATERNION_SCALE: f32 = 16384.0;

/// Read a signed big-endian 16-bit value at `offset`
pub fn read_i16(packet: &[u8], offset: usize) -> Option<i16> {
    let bytes = packet.get(offset..offset + 2)?;
    Some(i16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Raw quaternion components as read from the packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuaternionRaw {
    /// W component (scalar part)
    pub w: i16,
    /// X component (i)
    pub x: i16,
    /// Y component (j)
    pub y: i16,
    /// Z component (k)
    pub z: i16,
}

impl QuaternionRaw {
    /// Extract the quaternion from a DMP packet
    ///
    /// Returns `None` if the packet is too short to hold all four components.
    pub fn from_packet(packet: &[u8]) -> Option<Self> {
        let [w, x, y, z] = QUATERNION_OFFSETS;
        Some(Self {
            w: read_i16(packet, w)?,
            x: read_i16(packet, x)?,
            y: read_i16(packet, y)?,
            z: read_i16(packet, z)?,
        })
    }

    /// Scale to floating point
    pub fn to_quaternion(self) -> Quaternion {
        Quaternion {
            w: f32::from(self.w) / QUATERNION_SCALE,
            x: f32::from(self.x) / QUATERNION_SCALE,
            y: f32::from(self.y) / QUATERNION_SCALE,
            z: f32::from(self.z) / QUATERNION_SCALE,
        }
    }
}

/// Quaternion data from DMP
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quaternion {
    /// W component (scalar part)
    pub w: f32,
    /// X component (i)
    pub x: f32,
    /// Y component (j)
    pub y: f32,
    /// Z component (k)
    pub z: f32,
}

impl Quaternion {
    /// Create a new quaternion
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Calculate quaternion magnitude (norm)
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

impl From<QuaternionRaw> for Quaternion {
    fn from(raw: QuaternionRaw) -> Self {
        raw.to_quaternion()
    }
}
