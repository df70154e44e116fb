//! # MARS particle types
//!
//! MARS tags every particle of a beam record with a small integer code (1 to 11).
//! G4Beamline identifies species with the PDG Monte Carlo numbering. The mapping
//! between both is closed: [`MarsParticle`] enumerates the eleven known MARS codes
//! and any other code is rejected with [`BeamError::UnknownParticleCode`].
//!
//! | MARS | particle     | PDG    |
//! |------|--------------|--------|
//! | 1    | proton       | 2212   |
//! | 2    | antineutron  | -2112  |
//! | 3    | pi+          | 211    |
//! | 4    | pi-          | -211   |
//! | 5    | K+           | 321    |
//! | 6    | K-           | -321   |
//! | 7    | mu+          | -13    |
//! | 8    | mu-          | 13     |
//! | 9    | photon       | 22     |
//! | 10   | electron     | 11     |
//! | 11   | positron     | -11    |
//!
//! Code 2 carries a negative PDG id (-2112): older converters wrote +2112 here.
use crate::{beam_errors::BeamError, constants::PdgId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarsParticle {
    Proton = 1,
    AntiNeutron = 2,
    PiPlus = 3,
    PiMinus = 4,
    KPlus = 5,
    KMinus = 6,
    AntiMuon = 7,
    Muon = 8,
    Photon = 9,
    Electron = 10,
    Positron = 11,
}

impl MarsParticle {
    pub fn from_code(code: i32) -> Result<Self, BeamError> {
        match code {
            1 => Ok(MarsParticle::Proton),
            2 => Ok(MarsParticle::AntiNeutron),
            3 => Ok(MarsParticle::PiPlus),
            4 => Ok(MarsParticle::PiMinus),
            5 => Ok(MarsParticle::KPlus),
            6 => Ok(MarsParticle::KMinus),
            7 => Ok(MarsParticle::AntiMuon),
            8 => Ok(MarsParticle::Muon),
            9 => Ok(MarsParticle::Photon),
            10 => Ok(MarsParticle::Electron),
            11 => Ok(MarsParticle::Positron),
            _ => Err(BeamError::UnknownParticleCode(code)),
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn pdg_id(&self) -> PdgId {
        match self {
            MarsParticle::Proton => 2212,
            MarsParticle::AntiNeutron => -2112,
            MarsParticle::PiPlus => 211,
            MarsParticle::PiMinus => -211,
            MarsParticle::KPlus => 321,
            MarsParticle::KMinus => -321,
            MarsParticle::AntiMuon => -13,
            MarsParticle::Muon => 13,
            MarsParticle::Photon => 22,
            MarsParticle::Electron => 11,
            MarsParticle::Positron => -11,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarsParticle::Proton => "proton",
            MarsParticle::AntiNeutron => "anti-neutron",
            MarsParticle::PiPlus => "pi+",
            MarsParticle::PiMinus => "pi-",
            MarsParticle::KPlus => "kaon+",
            MarsParticle::KMinus => "kaon-",
            MarsParticle::AntiMuon => "mu+",
            MarsParticle::Muon => "mu-",
            MarsParticle::Photon => "gamma",
            MarsParticle::Electron => "e-",
            MarsParticle::Positron => "e+",
        }
    }
}

impl From<MarsParticle> for i32 {
    fn from(particle: MarsParticle) -> Self {
        particle.code()
    }
}

impl TryFrom<i32> for MarsParticle {
    type Error = BeamError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        MarsParticle::from_code(code)
    }
}

impl std::fmt::Display for MarsParticle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test_mars_particle {
    use super::*;

    const TABLE: [(i32, MarsParticle, PdgId); 11] = [
        (1, MarsParticle::Proton, 2212),
        (2, MarsParticle::AntiNeutron, -2112),
        (3, MarsParticle::PiPlus, 211),
        (4, MarsParticle::PiMinus, -211),
        (5, MarsParticle::KPlus, 321),
        (6, MarsParticle::KMinus, -321),
        (7, MarsParticle::AntiMuon, -13),
        (8, MarsParticle::Muon, 13),
        (9, MarsParticle::Photon, 22),
        (10, MarsParticle::Electron, 11),
        (11, MarsParticle::Positron, -11),
    ];

    #[test]
    fn test_from_code() {
        for (code, particle, _) in TABLE {
            assert_eq!(MarsParticle::from_code(code).unwrap(), particle);
            assert_eq!(MarsParticle::try_from(code).unwrap(), particle);
        }
    }

    #[test]
    fn test_pdg_id() {
        for (_, particle, pdg) in TABLE {
            assert_eq!(particle.pdg_id(), pdg);
        }
    }

    #[test]
    fn test_code_round_trip() {
        for (code, particle, _) in TABLE {
            assert_eq!(i32::from(particle), code);
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(
            MarsParticle::from_code(99),
            Err(BeamError::UnknownParticleCode(99))
        );
        assert_eq!(
            MarsParticle::from_code(0),
            Err(BeamError::UnknownParticleCode(0))
        );
        assert!(MarsParticle::try_from(12).is_err());
        assert!(MarsParticle::try_from(-1).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MarsParticle::Proton.to_string(), "proton");
        assert_eq!(MarsParticle::AntiMuon.to_string(), "mu+");
        assert_eq!(MarsParticle::Photon.to_string(), "gamma");
        assert_eq!(MarsParticle::AntiNeutron.to_string(), "anti-neutron");
    }
}
