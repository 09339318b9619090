// SPDX-License-Identifier: GPL-3.0-only

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

/// Instruction-set extensions a processor advertises.
#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionSet {
    IntelMmx = 1 << 0,
    IntelSse = 1 << 1,
    IntelSse2 = 1 << 2,
    IntelSse3 = 1 << 3,
    IntelSsse3 = 1 << 4,
    IntelSse41 = 1 << 5,
    IntelSse42 = 1 << 6,
    Amd3DNow = 1 << 7,
    AltiVec = 1 << 8,
    IntelAvx = 1 << 9,
    IntelAvx2 = 1 << 10,
    ArmNeon = 1 << 11,
}

pub type InstructionSets = BitFlags<InstructionSet>;

impl InstructionSet {
    pub fn name(self) -> &'static str {
        match self {
            Self::IntelMmx => "IntelMmx",
            Self::IntelSse => "IntelSse",
            Self::IntelSse2 => "IntelSse2",
            Self::IntelSse3 => "IntelSse3",
            Self::IntelSsse3 => "IntelSsse3",
            Self::IntelSse41 => "IntelSse41",
            Self::IntelSse42 => "IntelSse42",
            Self::Amd3DNow => "Amd3DNow",
            Self::AltiVec => "AltiVec",
            Self::IntelAvx => "IntelAvx",
            Self::IntelAvx2 => "IntelAvx2",
            Self::ArmNeon => "ArmNeon",
        }
    }

    /// Map a CPU feature flag (sysctl or `/proc/cpuinfo` spelling) to an
    /// instruction set, case-insensitively.
    pub fn from_feature(feature: &str) -> Option<Self> {
        let feature = feature.to_ascii_lowercase();
        let set = match feature.as_str() {
            "mmx" => Self::IntelMmx,
            "sse" => Self::IntelSse,
            "sse2" => Self::IntelSse2,
            "sse3" | "pni" => Self::IntelSse3,
            "ssse3" | "supplementalsse3" => Self::IntelSsse3,
            "sse4.1" | "sse4_1" => Self::IntelSse41,
            "sse4.2" | "sse4_2" => Self::IntelSse42,
            "3dnow" => Self::Amd3DNow,
            "altivec" => Self::AltiVec,
            "avx" | "avx1.0" => Self::IntelAvx,
            "avx2" => Self::IntelAvx2,
            "neon" | "asimd" => Self::ArmNeon,
            _ => return None,
        };
        Some(set)
    }
}

pub fn instruction_sets_from_features<'a>(
    features: impl IntoIterator<Item = &'a str>,
) -> InstructionSets {
    features
        .into_iter()
        .filter_map(InstructionSet::from_feature)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_spellings_map_to_sets() {
        let sets = instruction_sets_from_features(["fpu", "MMX", "pni", "sse4_2", "AVX1.0", "asimd"]);
        assert!(sets.contains(InstructionSet::IntelMmx));
        assert!(sets.contains(InstructionSet::IntelSse3));
        assert!(sets.contains(InstructionSet::IntelSse42));
        assert!(sets.contains(InstructionSet::IntelAvx));
        assert!(sets.contains(InstructionSet::ArmNeon));
        assert!(!sets.contains(InstructionSet::IntelSse));
    }
}
