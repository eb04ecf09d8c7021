use serde::Deserialize;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum MassRole {
    LightFragment,
    HeavyRecoil,
    EjectedFragment,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    #[error("Invalid {role} mass: {mass} (must be finite and positive)")]
    InvalidMass { role: MassRole, mass: f64 },
    #[error("Negative energy-mass product {0} under square root")]
    NegativeRadicand(f64),
}

/// The detected light decay product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightFragment {
    pub mass: f64,
    pub kinetic_energy: f64,
    pub theta: f64,
}

/// Masses of the decay, in MeV/c^2.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DecayMasses {
    pub light: f64,
    pub heavy: f64,
    pub ejected: f64,
}

impl DecayMasses {
    pub fn validate(&self) -> Result<(), KinematicsError> {
        check_mass(MassRole::LightFragment, self.light)?;
        check_mass(MassRole::HeavyRecoil, self.heavy)?;
        check_mass(MassRole::EjectedFragment, self.ejected)?;
        Ok(())
    }
}

fn check_mass(role: MassRole, mass: f64) -> Result<f64, KinematicsError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(mass)
    } else {
        Err(KinematicsError::InvalidMass { role, mass })
    }
}

/// Two-body breakup estimate of the decay Q-value.
///
/// ```text
/// Q = T_l (1 + m_l/m_h) - E_f (1 - m_e/m_h) - (2/m_h) sqrt(T_l m_l E_f m_e) cos(theta_l)
/// ```
pub fn estimate_q_value(
    light: &LightFragment,
    heavy_mass: f64,
    ejected_mass: f64,
    fragment_energy: f64,
) -> Result<f64, KinematicsError> {
    let light_mass = check_mass(MassRole::LightFragment, light.mass)?;
    let heavy_mass = check_mass(MassRole::HeavyRecoil, heavy_mass)?;
    let ejected_mass = check_mass(MassRole::EjectedFragment, ejected_mass)?;

    let radicand = light.kinetic_energy * light_mass * fragment_energy * ejected_mass;
    if radicand < 0.0 {
        return Err(KinematicsError::NegativeRadicand(radicand));
    }

    let a = light.kinetic_energy * (1.0 + light_mass / heavy_mass);
    let b = fragment_energy * (1.0 - ejected_mass / heavy_mass);
    let c = 2.0 / heavy_mass;
    let d = radicand.sqrt();
    Ok(a - b - c * d * light.theta.cos())
}
