use fnv::FnvHashSet;
use regex::bytes::Regex;
use std::ops::Range;

use crate::Error;

/// Decides where an enzyme cuts a protein sequence
pub trait CleavageRule: Send + Sync {
    /// Does the enzyme cut between `sequence[position]` and `sequence[position + 1]`?
    ///
    /// Only called for `position < sequence.len() - 1`: the end of the
    /// sequence is always a boundary.
    fn cleaves_after(&self, sequence: &[u8], position: usize) -> bool;

    /// Positions at which the sequence is cut, in ascending order,
    /// excluding the implicit boundaries at `0` and `sequence.len()`
    fn cleavage_sites(&self, sequence: &[u8]) -> Vec<usize> {
        (0..sequence.len().saturating_sub(1))
            .filter(|&position| self.cleaves_after(sequence, position))
            .map(|position| position + 1)
            .collect()
    }
}

/// Named rules: (name, cleave_at, restrict, c_terminal)
pub const RULES: [(&str, &str, Option<char>, bool); 8] = [
    ("trypsin", "KR", Some('P'), true),
    ("trypsin/p", "KR", None, true),
    ("lys-c", "K", None, true),
    ("arg-c", "R", Some('P'), true),
    ("asp-n", "D", None, false),
    ("chymotrypsin", "FWY", Some('P'), true),
    ("glu-c", "E", None, true),
    ("none", "", None, true),
];

#[derive(Clone, Debug)]
pub struct Enzyme {
    // Skip cleaving if the site is followed matching this AA
    pub skip_suffix: Option<char>,
    // Regex for matching cleavage sites, `None` never cleaves
    regex: Option<Regex>,
    // Cleave at c-terminal?
    pub c_terminal: bool,
}

impl Enzyme {
    pub fn new(cleave: &str, skip_suffix: Option<char>, c_terminal: bool) -> Result<Self, Error> {
        if !cleave.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::Configuration(format!(
                "enzyme cleavage sequence contains non-amino acid characters: {}",
                cleave
            )));
        }

        if let Some(skip) = skip_suffix {
            if !skip.is_ascii_uppercase() {
                return Err(Error::Configuration(format!(
                    "enzyme cleavage restriction is non-amino acid character: {}",
                    skip
                )));
            }
        }

        let regex = match cleave {
            "" => None,
            _ => Some(
                Regex::new(&format!("[{}]", cleave))
                    .map_err(|e| Error::Configuration(e.to_string()))?,
            ),
        };

        Ok(Enzyme {
            regex,
            skip_suffix,
            c_terminal,
        })
    }

    /// Look up one of the [`RULES`] by (case-insensitive) name
    pub fn named(name: &str) -> Result<Self, Error> {
        RULES
            .iter()
            .find(|(rule, ..)| rule.eq_ignore_ascii_case(name))
            .map(|&(_, cleave, skip, c_terminal)| Enzyme::new(cleave, skip, c_terminal))
            .unwrap_or_else(|| {
                Err(Error::Configuration(format!(
                    "unknown cleavage rule `{}`, expected one of: {}",
                    name,
                    RULES.map(|r| r.0).join(", ")
                )))
            })
    }

    fn restricted(&self, residue: u8) -> bool {
        self.skip_suffix
            .map(|skip| skip as u32 == residue as u32)
            .unwrap_or(false)
    }
}

impl CleavageRule for Enzyme {
    fn cleaves_after(&self, sequence: &[u8], position: usize) -> bool {
        let regex = match &self.regex {
            Some(regex) => regex,
            None => return false,
        };
        // C-terminal enzymes match the residue before the cut and check the
        // one after it; N-terminal enzymes the other way around
        let (site, neighbour) = match self.c_terminal {
            true => (position, position + 1),
            false => (position + 1, position),
        };
        regex.is_match(&sequence[site..site + 1]) && !self.restricted(sequence[neighbour])
    }

    fn cleavage_sites(&self, sequence: &[u8]) -> Vec<usize> {
        let regex = match &self.regex {
            Some(regex) => regex,
            None => return Vec::new(),
        };
        let mut sites = Vec::new();
        for mat in regex.find_iter(sequence) {
            let (cut, neighbour) = match self.c_terminal {
                true => (mat.end(), mat.end()),
                false => (mat.start(), mat.start().wrapping_sub(1)),
            };
            if cut == 0 || cut == sequence.len() {
                continue;
            }
            if self.restricted(sequence[neighbour]) {
                continue;
            }
            sites.push(cut);
        }
        sites
    }
}

/// Cleavage rule plus the number of missed cleavages to produce
#[derive(Clone, Debug)]
pub struct EnzymeParameters {
    /// Number of missed cleavages to produce
    pub missed_cleavages: u8,
    pub enzyme: Enzyme,
}

impl EnzymeParameters {
    pub fn digest<'s>(&self, sequence: &'s str) -> Result<Vec<&'s str>, Error> {
        cleave(sequence, &self.enzyme, self.missed_cleavages as usize)
    }
}

/// Only uppercase ASCII letters are accepted; whether a letter has a mass
/// is decided later by the [`crate::mass::MassTable`]
pub fn validate_sequence(sequence: &str) -> Result<(), Error> {
    if sequence.is_empty() {
        return Err(Error::InvalidSequence("empty sequence".into()));
    }
    match sequence.char_indices().find(|(_, c)| !c.is_ascii_uppercase()) {
        Some((idx, c)) => Err(Error::InvalidSequence(format!(
            "invalid residue `{}` at position {}",
            c,
            idx + 1
        ))),
        None => Ok(()),
    }
}

fn fragment_ranges<R: CleavageRule + ?Sized>(sequence: &str, rule: &R) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut left = 0;
    for right in rule.cleavage_sites(sequence.as_bytes()) {
        if right > left {
            ranges.push(left..right);
            left = right;
        }
    }
    ranges.push(left..sequence.len());
    ranges
}

/// Cut at every available site: zero missed cleavages
pub fn elementary_fragments<'s, R: CleavageRule + ?Sized>(
    sequence: &'s str,
    rule: &R,
) -> Result<Vec<&'s str>, Error> {
    validate_sequence(sequence)?;
    Ok(fragment_ranges(sequence, rule)
        .into_iter()
        .map(|range| &sequence[range])
        .collect())
}

/// Every distinct peptide spanning 1 to `missed_cleavages + 1` consecutive
/// elementary fragments. Peptides are ordered by the number of fragments
/// they span, then by position; repeats within the sequence are dropped.
pub fn cleave<'s, R: CleavageRule + ?Sized>(
    sequence: &'s str,
    rule: &R,
    missed_cleavages: usize,
) -> Result<Vec<&'s str>, Error> {
    validate_sequence(sequence)?;
    let sites = fragment_ranges(sequence, rule);

    // Keep a set of peptides that have been digested from this sequence
    // - handles cases where the same peptide occurs multiple times in a protein
    let mut seen = FnvHashSet::default();
    let mut peptides = Vec::new();

    for cleavage in 1..=missed_cleavages.saturating_add(1).min(sites.len()) {
        for win in sites.windows(cleavage) {
            let start = win[0].start;
            let end = win[cleavage - 1].end;
            let peptide = &sequence[start..end];
            if !peptide.is_empty() && seen.insert(peptide) {
                peptides.push(peptide);
            }
        }
    }
    Ok(peptides)
}
