use crate::enzyme::{Enzyme, EnzymeParameters};
use crate::fasta::Fasta;
use crate::mass::{Group, MassTable, CTERM, NTERM};
use crate::peptide::{PeptideCache, PeptideData};
use crate::Error;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct EnzymeBuilder {
    /// Name of a predefined cleavage rule, see [`crate::enzyme::RULES`]
    pub name: Option<String>,
    /// How many missed cleavages to use
    pub missed_cleavages: Option<u8>,
    /// Custom rule: residues to cleave at. Conflicts with `name`
    pub cleave_at: Option<String>,
    /// Custom rule: don't cleave next to this residue
    pub restrict: Option<char>,
    /// Custom rule: cleave after (true) or before (false) `cleave_at`
    pub c_terminal: Option<bool>,
}

impl Default for EnzymeBuilder {
    fn default() -> Self {
        Self {
            name: Some("trypsin".into()),
            missed_cleavages: Some(1),
            cleave_at: None,
            restrict: None,
            c_terminal: None,
        }
    }
}

impl EnzymeBuilder {
    /// Fill in defaults and check that the rule can be built
    fn resolve(self) -> Result<Self, Error> {
        let resolved = match (self.name, self.cleave_at) {
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "enzyme: set either `name` or `cleave_at`, not both".into(),
                ))
            }
            (None, Some(cleave_at)) => EnzymeBuilder {
                name: None,
                missed_cleavages: self.missed_cleavages,
                cleave_at: Some(cleave_at),
                restrict: self.restrict,
                c_terminal: Some(self.c_terminal.unwrap_or(true)),
            },
            (name, None) => {
                if self.restrict.is_some() || self.c_terminal.is_some() {
                    return Err(Error::Configuration(
                        "enzyme: `restrict` and `c_terminal` require `cleave_at`".into(),
                    ));
                }
                EnzymeBuilder {
                    name: Some(name.unwrap_or_else(|| "trypsin".into()).to_ascii_lowercase()),
                    missed_cleavages: self.missed_cleavages,
                    ..Default::default()
                }
            }
        };
        let resolved = EnzymeBuilder {
            missed_cleavages: Some(resolved.missed_cleavages.unwrap_or(1)),
            ..resolved
        };
        resolved.make_parameters()?;
        Ok(resolved)
    }

    pub fn make_parameters(&self) -> Result<EnzymeParameters, Error> {
        let enzyme = match (&self.name, &self.cleave_at) {
            (_, Some(cleave_at)) => {
                Enzyme::new(cleave_at, self.restrict, self.c_terminal.unwrap_or(true))?
            }
            (Some(name), None) => Enzyme::named(name)?,
            (None, None) => Enzyme::named("trypsin")?,
        };
        Ok(EnzymeParameters {
            missed_cleavages: self.missed_cleavages.unwrap_or(1),
            enzyme,
        })
    }
}

#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// File order, then record order, then digestion order
    #[default]
    Input,
    /// Stable sort by sequence id, then peptide
    Sorted,
}

#[derive(Deserialize, Serialize, Default, Clone, Debug)]
/// Run parameters, as deserialized from a JSON file
pub struct Builder {
    /// Peptides must be heavier than this (exclusive)
    pub min_mass: Option<f64>,
    /// Peptides must be lighter than this (exclusive)
    pub max_mass: Option<f64>,
    pub enzyme: Option<EnzymeBuilder>,
    /// Add selenocysteine (U) and pyrrolysine (O) to the mass table
    pub extended_residues: Option<bool>,
    /// Additional residue masses, e.g. for ambiguity codes
    pub custom_residues: Option<BTreeMap<char, f64>>,
    /// Additional terminal groups, written `Ac-` (N-terminal) or `-NH2`
    /// (C-terminal)
    pub custom_termini: Option<BTreeMap<String, f64>>,
    /// Group capping the N-terminus of every peptide, default `H-`
    pub n_terminus: Option<String>,
    /// Group capping the C-terminus of every peptide, default `-OH`
    pub c_terminus: Option<String>,
    /// Sort output rows by sequence id, then peptide
    pub sort: Option<bool>,
}

impl Builder {
    pub fn make_parameters(self) -> Result<Parameters, Error> {
        let parameters = Parameters {
            min_mass: self.min_mass.unwrap_or(600.0),
            max_mass: self.max_mass.unwrap_or(3500.0),
            enzyme: self.enzyme.unwrap_or_default().resolve()?,
            extended_residues: self.extended_residues.unwrap_or(false),
            custom_residues: self.custom_residues.unwrap_or_default(),
            custom_termini: self.custom_termini.unwrap_or_default(),
            n_terminus: self.n_terminus.unwrap_or_else(|| NTERM.into()),
            c_terminus: self.c_terminus.unwrap_or_else(|| CTERM.into()),
            order: match self.sort.unwrap_or(false) {
                true => Order::Sorted,
                false => Order::Input,
            },
        };

        if !parameters.min_mass.is_finite() || !parameters.max_mass.is_finite() {
            return Err(Error::Configuration(format!(
                "mass bounds must be finite: ({}, {})",
                parameters.min_mass, parameters.max_mass
            )));
        }
        if parameters.min_mass >= parameters.max_mass {
            return Err(Error::Configuration(format!(
                "`min_mass` ({}) must be less than `max_mass` ({})",
                parameters.min_mass, parameters.max_mass
            )));
        }
        let table = parameters.mass_table()?;

        let n_terminus = &parameters.n_terminus;
        if n_terminus.starts_with('-') || !n_terminus.ends_with('-') {
            return Err(Error::Configuration(format!(
                "`n_terminus` must be written as `X-`: `{}`",
                n_terminus
            )));
        }
        let c_terminus = &parameters.c_terminus;
        if c_terminus.ends_with('-') || !c_terminus.starts_with('-') {
            return Err(Error::Configuration(format!(
                "`c_terminus` must be written as `-X`: `{}`",
                c_terminus
            )));
        }
        let termini = [
            Group::Nterm(n_terminus.clone()),
            Group::Cterm(c_terminus.clone()),
        ];
        for group in termini {
            if table.get(&group).is_none() {
                return Err(Error::Configuration(format!(
                    "terminal group `{}` has no mass, add it to `custom_termini`",
                    group
                )));
            }
        }

        Ok(parameters)
    }
}

/// Validated run parameters
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Parameters {
    pub min_mass: f64,
    pub max_mass: f64,
    pub enzyme: EnzymeBuilder,
    pub extended_residues: bool,
    pub custom_residues: BTreeMap<char, f64>,
    pub custom_termini: BTreeMap<String, f64>,
    pub n_terminus: String,
    pub c_terminus: String,
    pub order: Order,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            min_mass: 600.0,
            max_mass: 3500.0,
            enzyme: EnzymeBuilder {
                missed_cleavages: Some(1),
                ..Default::default()
            },
            extended_residues: false,
            custom_residues: BTreeMap::default(),
            custom_termini: BTreeMap::default(),
            n_terminus: NTERM.into(),
            c_terminus: CTERM.into(),
            order: Order::Input,
        }
    }
}

impl Parameters {
    pub fn mass_table(&self) -> Result<MassTable, Error> {
        let mut table = match self.extended_residues {
            true => MassTable::extended(),
            false => MassTable::standard(),
        };
        for (&residue, &mass) in &self.custom_residues {
            table.insert_residue(residue, mass)?;
        }
        for (symbol, &mass) in &self.custom_termini {
            table.insert_terminus(symbol, mass)?;
        }
        Ok(table)
    }

    pub fn build(&self) -> Result<Pipeline, Error> {
        Ok(Pipeline {
            enzyme: self.enzyme.make_parameters()?,
            cache: PeptideCache::with_termini(
                self.mass_table()?,
                &self.n_terminus,
                &self.c_terminus,
            ),
            min_mass: self.min_mass,
            max_mass: self.max_mass,
            order: self.order,
        })
    }
}

/// One output row: a peptide of a protein whose mass passed the filter
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub sequence_id: Arc<String>,
    pub peptide: Arc<PeptideData>,
}

impl Row {
    pub fn peptide_mass(&self) -> f64 {
        self.peptide.monoisotopic
    }
}

/// A protein or peptide that could not be processed
#[derive(Debug)]
pub struct Failure {
    pub sequence_id: Arc<String>,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct Report {
    pub rows: Vec<Row>,
    pub failures: Vec<Failure>,
    /// Number of protein records read
    pub proteins: usize,
    /// Number of (protein, peptide) pairs produced by digestion
    pub peptides: usize,
}

impl Report {
    fn extend(&mut self, other: Report) {
        self.rows.extend(other.rows);
        self.failures.extend(other.failures);
        self.proteins += other.proteins;
        self.peptides += other.peptides;
    }
}

pub struct Pipeline {
    enzyme: EnzymeParameters,
    cache: PeptideCache,
    min_mass: f64,
    max_mass: f64,
    order: Order,
}

impl Pipeline {
    fn process_record(&self, sequence_id: &Arc<String>, sequence: &str) -> Report {
        let mut report = Report {
            proteins: 1,
            ..Default::default()
        };

        let digested = match sequence_id.is_empty() {
            true => Err(Error::InvalidSequence("record has no identifier".into())),
            false => self.enzyme.digest(sequence),
        };

        let peptides = match digested {
            Ok(peptides) => peptides,
            Err(error) => {
                log::warn!("skipping protein `{}`: {}", sequence_id, error);
                report.failures.push(Failure {
                    sequence_id: sequence_id.clone(),
                    error,
                });
                return report;
            }
        };

        report.peptides = peptides.len();
        for peptide in peptides {
            match self.cache.get_or_compute(peptide) {
                Ok(data) => {
                    if data.monoisotopic > self.min_mass && data.monoisotopic < self.max_mass {
                        report.rows.push(Row {
                            sequence_id: sequence_id.clone(),
                            peptide: data,
                        });
                    }
                }
                Err(err) => report.failures.push(Failure {
                    sequence_id: sequence_id.clone(),
                    error: err.into(),
                }),
            }
        }
        report
    }

    /// Digest and weigh every protein of a single file. Rows are in record
    /// order; the peptide cache is shared with every other call on `self`.
    pub fn process(&self, fasta: &Fasta) -> Report {
        fasta
            .targets
            .par_iter()
            .map(|(id, sequence)| self.process_record(id, sequence))
            .collect::<Vec<_>>()
            .into_iter()
            .fold(Report::default(), |mut acc, report| {
                acc.extend(report);
                acc
            })
    }

    /// Process files in the order given, concatenating their rows, then apply
    /// the configured [`Order`]
    pub fn run<'a, I>(&self, inputs: I) -> Report
    where
        I: IntoIterator<Item = &'a Fasta>,
    {
        let mut report = Report::default();
        for fasta in inputs {
            report.extend(self.process(fasta));
        }

        if self.order == Order::Sorted {
            log::trace!("sorting {} rows", report.rows.len());
            report.rows.par_sort_by(|a, b| {
                a.sequence_id
                    .cmp(&b.sequence_id)
                    .then_with(|| a.peptide.sequence.cmp(&b.peptide.sequence))
            });
        }
        report
    }

    pub fn cache(&self) -> &PeptideCache {
        &self.cache
    }
}
