//! Operator-supplied reaction settings, published to the analysis as variables.
use crate::parameters::Variable;
use serde::Deserialize;
use thiserror::Error;

#[rustfmt::skip]
const ELEMENT_SYMBOLS: [&str; 119] = [
    "n", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactionError {
    #[error("Invalid residual nucleus: Z = {z}, A = {a}")]
    InvalidResidual { z: i32, a: i32 },
    #[error("Invalid nucleus: Z = {z}, A = {a}")]
    InvalidNucleus { z: i32, a: i32 },
    #[error("Invalid kinetic energy for {0}: must be finite")]
    InvalidEnergy(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Nucleus {
    pub z: i32,
    pub a: i32,
}

impl Nucleus {
    pub const fn new(z: i32, a: i32) -> Self {
        Self { z, a }
    }

    fn is_physical(&self) -> bool {
        self.z >= 0 && self.a > 0 && self.z <= self.a
    }

    /// Isotope symbol such as `12C`.
    pub fn symbol(&self) -> Result<String, ReactionError> {
        let invalid = ReactionError::InvalidNucleus {
            z: self.z,
            a: self.a,
        };
        if !self.is_physical() {
            return Err(invalid);
        }
        usize::try_from(self.z)
            .ok()
            .and_then(|z| ELEMENT_SYMBOLS.get(z))
            .map(|element| format!("{}{element}", self.a))
            .ok_or(invalid)
    }
}

/// A binary reaction `target(projectile, ejectile)residual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Reaction {
    pub target: Nucleus,
    pub projectile: Nucleus,
    pub ejectile: Nucleus,
}

impl Reaction {
    pub fn residual(&self) -> Result<Nucleus, ReactionError> {
        let residual = Nucleus::new(
            self.target.z + self.projectile.z - self.ejectile.z,
            self.target.a + self.projectile.a - self.ejectile.a,
        );
        if residual.is_physical() {
            Ok(residual)
        } else {
            Err(ReactionError::InvalidResidual {
                z: residual.z,
                a: residual.a,
            })
        }
    }

    pub fn equation(&self) -> Result<String, ReactionError> {
        Ok(format!(
            "{}({},{}){}",
            self.target.symbol()?,
            self.projectile.symbol()?,
            self.ejectile.symbol()?,
            self.residual()?.symbol()?
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReactionSettings {
    pub beam_tke: f64,
    pub frag_tke: f64,
    pub reaction: Option<Reaction>,
}

/// Owns the operator variables. Settings are only published once they validate.
#[derive(Debug)]
pub struct ReactionInput {
    beam_tke: Variable,
    frag_tke: Variable,
    equation: Option<String>,
}

impl Default for ReactionInput {
    fn default() -> Self {
        Self {
            beam_tke: Variable::new("beam_tke", 0.0),
            frag_tke: Variable::new("frag_tke", 0.0),
            equation: None,
        }
    }
}

impl ReactionInput {
    pub fn beam_tke(&self) -> &Variable {
        &self.beam_tke
    }

    pub fn frag_tke(&self) -> &Variable {
        &self.frag_tke
    }

    pub fn equation(&self) -> Option<&str> {
        self.equation.as_deref()
    }

    pub fn apply(&mut self, settings: &ReactionSettings) -> Result<(), ReactionError> {
        if !settings.beam_tke.is_finite() {
            return Err(ReactionError::InvalidEnergy("beam"));
        }
        if !settings.frag_tke.is_finite() {
            return Err(ReactionError::InvalidEnergy("fragment"));
        }
        let equation = settings
            .reaction
            .as_ref()
            .map(Reaction::equation)
            .transpose()?;

        self.beam_tke.set_value(settings.beam_tke);
        self.frag_tke.set_value(settings.frag_tke);
        self.equation = equation;
        tracing::info!(
            "Reaction settings: beam {} MeV, fragment {} MeV, reaction {}",
            settings.beam_tke,
            settings.frag_tke,
            self.equation.as_deref().unwrap_or("unset")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C12_A_A_C12: Reaction = Reaction {
        target: Nucleus::new(6, 12),
        projectile: Nucleus::new(2, 4),
        ejectile: Nucleus::new(2, 4),
    };

    #[test]
    fn residual_conserves_charge_and_mass() {
        let reaction = Reaction {
            ejectile: Nucleus::new(1, 1),
            ..C12_A_A_C12
        };
        assert_eq!(reaction.residual(), Ok(Nucleus::new(7, 15)));
    }

    #[test]
    fn equation_uses_isotope_symbols() {
        assert_eq!(C12_A_A_C12.equation().unwrap(), "12C(4He,4He)12C");
    }

    #[test]
    fn unphysical_residual_is_rejected() {
        let reaction = Reaction {
            ejectile: Nucleus::new(9, 20),
            ..C12_A_A_C12
        };
        assert_eq!(
            reaction.residual(),
            Err(ReactionError::InvalidResidual { z: -1, a: -4 })
        );
    }

    #[test]
    fn unknown_element_is_rejected() {
        assert!(Nucleus::new(150, 400).symbol().is_err());
        assert_eq!(Nucleus::new(0, 1).symbol().unwrap(), "1n");
    }

    #[test]
    fn apply_publishes_variables() {
        let mut input = ReactionInput::default();
        let frag_tke = input.frag_tke().clone();
        input
            .apply(&ReactionSettings {
                beam_tke: 40.0,
                frag_tke: 6.5,
                reaction: Some(C12_A_A_C12),
            })
            .unwrap();
        assert_eq!(frag_tke.value(), 6.5);
        assert_eq!(input.beam_tke().value(), 40.0);
        assert_eq!(input.equation(), Some("12C(4He,4He)12C"));
    }

    #[test]
    fn invalid_settings_leave_variables_unchanged() {
        let mut input = ReactionInput::default();
        let result = input.apply(&ReactionSettings {
            beam_tke: 40.0,
            frag_tke: 6.5,
            reaction: Some(Reaction {
                ejectile: Nucleus::new(20, 40),
                ..C12_A_A_C12
            }),
        });
        assert!(result.is_err());
        assert_eq!(input.beam_tke().value(), 0.0);
        assert_eq!(input.frag_tke().value(), 0.0);
        assert_eq!(input.equation(), None);
    }
}
