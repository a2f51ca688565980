pub mod enzyme;
pub mod fasta;
pub mod mass;
pub mod peptide;
pub mod pipeline;

use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum Error {
    /// Empty or malformed protein record; only that record is skipped
    InvalidSequence(String),
    /// A peptide contains a residue without a mass; only that peptide is skipped
    UnknownResidue(mass::UnknownResidue),
    /// Invalid run parameters, fatal before any processing
    Configuration(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSequence(e) => write!(f, "invalid sequence: {}", e),
            Self::UnknownResidue(e) => write!(f, "{}", e),
            Self::Configuration(e) => write!(f, "configuration error: {}", e),
            Self::Io(e) => write!(f, "{}", e),
            Self::Json(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<mass::UnknownResidue> for Error {
    fn from(value: mass::UnknownResidue) -> Self {
        Self::UnknownResidue(value)
    }
}

/// Read a FASTA database from any reader, e.g. STDIN
pub fn read_fasta_from<R: Read>(mut reader: R) -> Result<fasta::Fasta, Error> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents).map_err(Error::Io)?;
    Ok(fasta::Fasta::parse(&contents))
}

pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<fasta::Fasta, Error> {
    std::fs::File::open(path)
        .map_err(Error::Io)
        .and_then(read_fasta_from)
}

pub fn read_json<P, T>(path: P) -> Result<T, Error>
where
    P: AsRef<Path>,
    T: for<'de> serde::Deserialize<'de>,
{
    let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
    serde_json::from_str(&contents).map_err(Error::Json)
}
