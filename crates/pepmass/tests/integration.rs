//! Properties of the digestion and mass model over random proteins

use pepmass_core::enzyme::{cleave, elementary_fragments, CleavageRule, Enzyme, RULES};
use pepmass_core::mass::{Composition, MassTable, H2O};
use pepmass_core::peptide::PeptideCache;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use std::collections::HashSet;

// Heavy on K, R and P so that sites and proline exceptions are common
const ALPHABET: &[u8] = b"ACDEFGHIKLMNPQRSTVWYKKRRPP";

#[derive(Clone, Debug)]
struct Protein(String);

impl Arbitrary for Protein {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = 1 + usize::arbitrary(g) % 60;
        Protein(
            (0..len)
                .map(|_| *g.choose(ALPHABET).expect("non-empty alphabet") as char)
                .collect(),
        )
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(
            self.0
                .shrink()
                .filter(|s| !s.is_empty() && s.bytes().all(|b| ALPHABET.contains(&b)))
                .map(Protein),
        )
    }
}

fn trypsin() -> Enzyme {
    Enzyme::named("trypsin").unwrap()
}

#[quickcheck]
fn zero_missed_cleavages_is_partition(protein: Protein) -> bool {
    let tryp = trypsin();
    let fragments = elementary_fragments(&protein.0, &tryp).unwrap();
    let peptides = cleave(&protein.0, &tryp, 0).unwrap();

    let unique = fragments.iter().copied().collect::<HashSet<_>>();
    fragments.concat() == protein.0
        && fragments.iter().all(|f| !f.is_empty())
        && peptides.iter().copied().collect::<HashSet<_>>() == unique
        && peptides.len() == unique.len()
}

#[quickcheck]
fn missed_cleavages_are_monotonic(protein: Protein, k: u8) -> bool {
    let k = (k % 4) as usize + 1;
    let tryp = trypsin();
    let fewer = cleave(&protein.0, &tryp, k - 1)
        .unwrap()
        .into_iter()
        .collect::<HashSet<_>>();
    let more = cleave(&protein.0, &tryp, k)
        .unwrap()
        .into_iter()
        .collect::<HashSet<_>>();

    // Every peptide must be a run of at most k + 1 consecutive fragments
    let fragments = elementary_fragments(&protein.0, &tryp).unwrap();
    let runs = (1..=k + 1)
        .flat_map(|n| fragments.windows(n).map(|w| w.concat()))
        .collect::<HashSet<_>>();

    fewer.is_subset(&more) && more.iter().all(|p| runs.contains(*p))
}

#[quickcheck]
fn every_rule_scan_matches_predicate(protein: Protein) -> bool {
    let sequence = protein.0.as_bytes();
    RULES.iter().all(|(name, ..)| {
        let enzyme = Enzyme::named(name).unwrap();
        let scanned = (0..sequence.len() - 1)
            .filter(|&p| enzyme.cleaves_after(sequence, p))
            .map(|p| p + 1)
            .collect::<Vec<_>>();
        scanned == enzyme.cleavage_sites(sequence)
    })
}

#[quickcheck]
fn mass_is_additive(a: Protein, b: Protein) -> bool {
    let table = MassTable::standard();
    let mass = |s: &str| table.calculate_mass(&Composition::new(s)).unwrap();
    let joined = format!("{}{}", a.0, b.0);
    (mass(&joined) - (mass(&a.0) + mass(&b.0) - H2O)).abs() < 1e-6
}

#[quickcheck]
fn cache_matches_direct_calculation(protein: Protein) -> bool {
    let cache = PeptideCache::default();
    let table = MassTable::standard();
    let peptides = cleave(&protein.0, &trypsin(), 2).unwrap();
    for peptide in &peptides {
        let cached = cache.get_or_compute(peptide).unwrap();
        let direct = table.calculate_mass(&Composition::new(peptide)).unwrap();
        if cached.monoisotopic.to_bits() != direct.to_bits() {
            return false;
        }
    }
    for peptide in &peptides {
        cache.get_or_compute(peptide).unwrap();
    }
    cache.computations() == peptides.len()
}
