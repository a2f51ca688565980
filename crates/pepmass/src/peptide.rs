use dashmap::DashMap;
use fnv::FnvBuildHasher;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::mass::{Composition, MassTable, UnknownResidue, CTERM, NTERM};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeptideData {
    pub sequence: String,
    /// Residues plus explicit N- and C-terminal groups
    pub composition: Composition,
    pub monoisotopic: f64,
}

type Entry = Result<Arc<PeptideData>, UnknownResidue>;

/// Run-scoped memo of peptide masses.
///
/// Each distinct peptide string is parsed and weighed at most once, no matter
/// how many proteins (or threads) produce it. Failures are cached as well.
pub struct PeptideCache {
    table: MassTable,
    nterm: String,
    cterm: String,
    peptides: DashMap<String, Entry, FnvBuildHasher>,
    computed: AtomicUsize,
}

impl Default for PeptideCache {
    fn default() -> Self {
        Self::new(MassTable::default())
    }
}

impl PeptideCache {
    pub fn new(table: MassTable) -> Self {
        Self::with_termini(table, NTERM, CTERM)
    }

    /// Every peptide is capped with `nterm` and `cterm`, which must have an
    /// entry in `table` for any mass to be computed
    pub fn with_termini(table: MassTable, nterm: &str, cterm: &str) -> Self {
        PeptideCache {
            table,
            nterm: nterm.into(),
            cterm: cterm.into(),
            peptides: DashMap::default(),
            computed: AtomicUsize::new(0),
        }
    }

    fn compute(&self, peptide: &str) -> Entry {
        self.computed.fetch_add(1, Ordering::Relaxed);
        let composition = Composition::with_termini(peptide, &self.nterm, &self.cterm);
        match self.table.calculate_mass(&composition) {
            Ok(monoisotopic) => Ok(Arc::new(PeptideData {
                sequence: peptide.into(),
                composition,
                monoisotopic,
            })),
            Err(err) => {
                log::warn!("{}", err);
                Err(err)
            }
        }
    }

    pub fn get_or_compute(&self, peptide: &str) -> Entry {
        if let Some(entry) = self.peptides.get(peptide) {
            return entry.value().clone();
        }
        // The shard stays write-locked while `compute` runs, so a racing
        // thread waits here and then reads the stored value
        self.peptides
            .entry(peptide.to_string())
            .or_insert_with(|| self.compute(peptide))
            .value()
            .clone()
    }

    /// Number of distinct peptides seen so far
    pub fn len(&self) -> usize {
        self.peptides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peptides.is_empty()
    }

    /// How many times a mass has actually been calculated
    pub fn computations(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}
