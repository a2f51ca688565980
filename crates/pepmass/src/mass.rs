use std::fmt::Write;

use fnv::FnvHashMap;
use serde::Serialize;

use crate::Error;

pub const H: f64 = 1.00782503207;
pub const O: f64 = 15.99491461956;
pub const OH: f64 = O + H;
pub const H2O: f64 = H + OH;

/// Unmodified N-terminal group, contributes one hydrogen
pub const NTERM: &str = "H-";
/// Unmodified C-terminal group, contributes one hydroxyl
pub const CTERM: &str = "-OH";

pub const STANDARD_AA: [u8; 20] = [
    b'A', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'K', b'L', b'M', b'N', b'P', b'Q', b'R', b'S',
    b'T', b'V', b'W', b'Y',
];

/// Selenocysteine and pyrrolysine are only used when explicitly requested
pub const EXTENDED_AA: [u8; 2] = [b'U', b'O'];

/// Monoisotopic residue mass (peptide-bonded, i.e. minus one water)
pub const fn monoisotopic(aa: u8) -> Option<f64> {
    let mass = match aa {
        b'G' => 57.02146372057,
        b'A' => 71.03711378471,
        b'S' => 87.03202840427,
        b'P' => 97.05276384885,
        b'V' => 99.06841391299,
        b'T' => 101.04767846841,
        b'C' => 103.00918478471,
        b'L' => 113.08406397713,
        b'I' => 113.08406397713,
        b'N' => 114.04292744114,
        b'D' => 115.02694302383,
        b'Q' => 128.05857750527,
        b'K' => 128.09496301399,
        b'E' => 129.04259308797,
        b'M' => 131.04048491299,
        b'H' => 137.05891185845,
        b'F' => 147.06841391298,
        b'U' => 150.95363508471,
        b'R' => 156.10111102359,
        b'Y' => 163.06332853255,
        b'W' => 186.07931294986,
        b'O' => 237.14772686284,
        _ => return None,
    };
    Some(mass)
}

/// A single entry of a peptide composition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
    /// N-terminal cap, written with a trailing dash (`H-`)
    Nterm(String),
    Residue(char),
    /// C-terminal cap, written with a leading dash (`-OH`)
    Cterm(String),
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::Nterm(s) | Group::Cterm(s) => f.write_str(s),
            Group::Residue(c) => f.write_char(*c),
        }
    }
}

/// Parsed peptide: residues in order, with both termini listed explicitly
/// so that their masses are looked up like any other symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Composition {
    pub groups: Vec<Group>,
}

impl Composition {
    /// Parse a peptide with unmodified termini
    pub fn new(peptide: &str) -> Self {
        Self::with_termini(peptide, NTERM, CTERM)
    }

    pub fn with_termini(peptide: &str, nterm: &str, cterm: &str) -> Self {
        let mut groups = Vec::with_capacity(peptide.len() + 2);
        groups.push(Group::Nterm(nterm.into()));
        groups.extend(peptide.chars().map(Group::Residue));
        groups.push(Group::Cterm(cterm.into()));
        Composition { groups }
    }

    /// Residues only, termini stripped
    pub fn sequence(&self) -> String {
        self.groups
            .iter()
            .filter_map(|g| match g {
                Group::Residue(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for group in &self.groups {
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}

/// A composition referenced a symbol with no entry in the [`MassTable`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownResidue {
    pub residue: String,
    pub peptide: String,
}

impl std::fmt::Display for UnknownResidue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown residue `{}` in peptide {}",
            self.residue, self.peptide
        )
    }
}

impl std::error::Error for UnknownResidue {}

/// Monoisotopic mass contribution of every residue and terminal group
/// that may appear in a [`Composition`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MassTable {
    residues: FnvHashMap<char, f64>,
    termini: FnvHashMap<String, f64>,
}

impl Default for MassTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl MassTable {
    /// The 20 standard amino acids plus unmodified termini
    pub fn standard() -> Self {
        let residues = STANDARD_AA
            .iter()
            .filter_map(|&aa| monoisotopic(aa).map(|mass| (aa as char, mass)))
            .collect();

        let mut termini = FnvHashMap::default();
        termini.insert(NTERM.to_string(), H);
        termini.insert(CTERM.to_string(), OH);

        MassTable { residues, termini }
    }

    /// Standard table, plus selenocysteine (U) and pyrrolysine (O)
    pub fn extended() -> Self {
        let mut table = Self::standard();
        for aa in EXTENDED_AA {
            if let Some(mass) = monoisotopic(aa) {
                table.residues.insert(aa as char, mass);
            }
        }
        table
    }

    fn check_mass(symbol: &str, mass: f64) -> Result<(), Error> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(Error::Configuration(format!(
                "mass for `{}` must be a finite, non-negative number: {}",
                symbol, mass
            )));
        }
        Ok(())
    }

    /// Provision (or override) a residue, e.g. an ambiguity code like `X`
    pub fn insert_residue(&mut self, residue: char, mass: f64) -> Result<(), Error> {
        if !residue.is_ascii_uppercase() {
            return Err(Error::Configuration(format!(
                "residue symbol must be an uppercase letter: `{}`",
                residue
            )));
        }
        Self::check_mass(residue.encode_utf8(&mut [0; 4]), mass)?;
        self.residues.insert(residue, mass);
        Ok(())
    }

    /// Provision a terminal group. N-terminal symbols end with `-`,
    /// C-terminal symbols start with `-`.
    pub fn insert_terminus(&mut self, symbol: &str, mass: f64) -> Result<(), Error> {
        let valid = symbol.len() > 1 && (symbol.ends_with('-') ^ symbol.starts_with('-'));
        if !valid {
            return Err(Error::Configuration(format!(
                "terminal group must be written as `X-` or `-X`: `{}`",
                symbol
            )));
        }
        Self::check_mass(symbol, mass)?;
        self.termini.insert(symbol.into(), mass);
        Ok(())
    }

    pub fn get(&self, group: &Group) -> Option<f64> {
        match group {
            Group::Residue(c) => self.residues.get(c).copied(),
            Group::Nterm(s) | Group::Cterm(s) => self.termini.get(s).copied(),
        }
    }

    /// Sum the mass of every group in the composition, termini included
    pub fn calculate_mass(&self, composition: &Composition) -> Result<f64, UnknownResidue> {
        composition.groups.iter().try_fold(0.0, |acc, group| {
            self.get(group)
                .map(|mass| acc + mass)
                .ok_or_else(|| UnknownResidue {
                    residue: group.to_string(),
                    peptide: composition.sequence(),
                })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn smoke() {
        for ch in STANDARD_AA.iter().chain(EXTENDED_AA.iter()) {
            assert!(monoisotopic(*ch).unwrap() > 0.0);
        }
        assert_eq!(monoisotopic(b'X'), None);
        assert_eq!(monoisotopic(b'B'), None);
    }

    #[test]
    fn water() {
        assert!((H2O - 18.0105646837).abs() < 1e-9);
        let table = MassTable::standard();
        let mass = table.calculate_mass(&Composition::new("")).unwrap();
        assert_eq!(mass, H2O);
    }

    #[test]
    fn explicit_termini() {
        let comp = Composition::new("PEPTIDE");
        assert_eq!(comp.to_string(), "H-PEPTIDE-OH");
        assert_eq!(comp.sequence(), "PEPTIDE");
        assert_eq!(comp.groups.len(), 9);
        assert_eq!(comp.groups[0], Group::Nterm("H-".into()));
        assert_eq!(comp.groups[8], Group::Cterm("-OH".into()));
    }

    #[test]
    fn peptide_mass() {
        let table = MassTable::standard();
        let mass = table.calculate_mass(&Composition::new("PEPTIDE")).unwrap();
        assert!((mass - 799.35996).abs() < 1e-4, "{}", mass);

        let mass = table
            .calculate_mass(&Composition::new("LQSRPAAPPAPGPGQLTLR"))
            .unwrap();
        assert!((mass - 1926.07993).abs() < 1e-4, "{}", mass);
    }

    #[test]
    fn unknown_residue() {
        let table = MassTable::standard();
        let err = table.calculate_mass(&Composition::new("AU")).unwrap_err();
        assert_eq!(
            err,
            UnknownResidue {
                residue: "U".into(),
                peptide: "AU".into()
            }
        );

        let table = MassTable::extended();
        assert!(table.calculate_mass(&Composition::new("AU")).is_ok());
    }

    #[test]
    fn modified_terminus() {
        let mut table = MassTable::standard();
        let comp = Composition::with_termini("PEPTIDE", "Ac-", "-NH2");
        assert_eq!(
            table.calculate_mass(&comp).unwrap_err().residue,
            "Ac-".to_string()
        );

        table.insert_terminus("Ac-", 43.01838971).unwrap();
        table.insert_terminus("-NH2", 16.01872406).unwrap();
        let acetylated = table.calculate_mass(&comp).unwrap();
        let plain = table.calculate_mass(&Composition::new("PEPTIDE")).unwrap();
        assert!((acetylated - plain - 42.0105646837 + 0.9840155848).abs() < 1e-6);

        assert!(table.insert_terminus("Ac", 1.0).is_err());
        assert!(table.insert_terminus("-", 1.0).is_err());
    }

    #[test]
    fn custom_residue() {
        let mut table = MassTable::standard();
        assert!(table.insert_residue('x', 1.0).is_err());
        assert!(table.insert_residue('X', f64::NAN).is_err());
        assert!(table.insert_residue('X', -1.0).is_err());
        table.insert_residue('X', 110.0).unwrap();
        let mass = table.calculate_mass(&Composition::new("X")).unwrap();
        assert_eq!(mass, H + 110.0 + OH);
    }
}
