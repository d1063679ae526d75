use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Instruction-set features a kernel can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Popcnt,
    Sse2,
    Ssse3,
    Sse41,
    Avx2,
    Neon,
    /// Portable lane arithmetic through the `wide` crate.
    Wide,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Popcnt,
        Feature::Sse2,
        Feature::Ssse3,
        Feature::Sse41,
        Feature::Avx2,
        Feature::Neon,
        Feature::Wide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Popcnt => "popcnt",
            Feature::Sse2 => "sse2",
            Feature::Ssse3 => "ssse3",
            Feature::Sse41 => "sse41",
            Feature::Avx2 => "avx2",
            Feature::Neon => "neon",
            Feature::Wide => "wide",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name().eq_ignore_ascii_case(name))
    }
}

/// Set of features usable on this machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const POPCNT: Self = Self::of(Feature::Popcnt);
    pub const SSE2: Self = Self::of(Feature::Sse2);
    pub const SSSE3: Self = Self::of(Feature::Ssse3);
    pub const SSE41: Self = Self::of(Feature::Sse41);
    pub const AVX2: Self = Self::of(Feature::Avx2);
    pub const NEON: Self = Self::of(Feature::Neon);
    pub const WIDE: Self = Self::of(Feature::Wide);

    pub const fn of(feature: Feature) -> Self {
        Self(1 << feature as u32)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn has(self, feature: Feature) -> bool {
        self.contains(Self::of(feature))
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0 |= Self::of(feature).0;
    }

    pub fn remove(&mut self, feature: Feature) {
        self.0 &= !Self::of(feature).0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |&feature| self.has(feature))
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Capabilities {
    type Output = Capabilities;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Feature> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |caps, feature| caps | Self::of(feature))
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.iter().map(Feature::name).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Queries the CPU for the features the kernels know about.
///
/// `WIDE` is always reported: the `wide` crate falls back to plain integer
/// code where the target has no vector unit.
pub fn detect() -> Capabilities {
    let mut caps = Capabilities::WIDE;

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("popcnt") {
            caps.insert(Feature::Popcnt);
        }
        if is_x86_feature_detected!("sse2") {
            caps.insert(Feature::Sse2);
        }
        if is_x86_feature_detected!("ssse3") {
            caps.insert(Feature::Ssse3);
        }
        if is_x86_feature_detected!("sse4.1") {
            caps.insert(Feature::Sse41);
        }
        if is_x86_feature_detected!("avx2") {
            caps.insert(Feature::Avx2);
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            caps.insert(Feature::Neon);
        }
    }

    caps
}
