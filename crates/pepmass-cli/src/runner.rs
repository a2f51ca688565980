use super::input::Search;
use super::output;
use anyhow::Context;
use log::info;
use pepmass_core::fasta::Fasta;
use pepmass_core::pipeline::{Pipeline, Report};
use std::io::{Read, Write};
use std::time::Instant;

pub struct Runner {
    pub pipeline: Pipeline,
    pub parameters: Search,
    start: Instant,
}

impl Runner {
    pub fn new(parameters: Search) -> anyhow::Result<Self> {
        let start = Instant::now();
        let pipeline = parameters
            .parameters
            .build()
            .context("Failed to configure digestion")?;
        Ok(Self {
            pipeline,
            parameters,
            start,
        })
    }

    /// Read every input in order. No paths at all means `stdin`, as does `-`
    fn read_inputs<R: Read>(&self, mut stdin: R) -> anyhow::Result<Vec<Fasta>> {
        if self.parameters.fasta_paths.is_empty() {
            log::trace!("reading fasta from stdin");
            let fasta = pepmass_core::read_fasta_from(stdin)
                .context("Failed to read FASTA from STDIN")?;
            return Ok(vec![fasta]);
        }

        self.parameters
            .fasta_paths
            .iter()
            .map(|path| -> anyhow::Result<Fasta> {
                let start = Instant::now();
                let fasta = match path.as_str() {
                    "-" => pepmass_core::read_fasta_from(&mut stdin),
                    _ => pepmass_core::read_fasta(path),
                }
                .with_context(|| format!("Failed to read FASTA from `{}`", path))?;
                info!(
                    "read {} proteins from {} in {:#?}",
                    fasta.len(),
                    path,
                    start.elapsed()
                );
                Ok(fasta)
            })
            .collect()
    }

    /// Digest all inputs and write rows to `writer`
    pub fn run_to<W: Write>(&self, writer: W) -> anyhow::Result<Report> {
        self.run_from(std::io::stdin().lock(), writer)
    }

    /// Like [`Runner::run_to`], with `stdin` standing in for STDIN
    pub fn run_from<R: Read, W: Write>(&self, stdin: R, writer: W) -> anyhow::Result<Report> {
        let inputs = self.read_inputs(stdin)?;
        let report = self.pipeline.run(&inputs);

        info!(
            "digested {} proteins into {} peptides ({} unique), {} within ({}, {}) Da in {:#?}",
            report.proteins,
            report.peptides,
            self.pipeline.cache().len(),
            report.rows.len(),
            self.parameters.parameters.min_mass,
            self.parameters.parameters.max_mass,
            self.start.elapsed()
        );
        if !report.failures.is_empty() {
            log::warn!(
                "{} proteins or peptides could not be processed",
                report.failures.len()
            );
        }

        output::write_rows(&report.rows, self.parameters.header, writer)?;
        Ok(report)
    }

    pub fn run(&self) -> anyhow::Result<Report> {
        let report = match &self.parameters.output {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create `{}`", path))?;
                let report = self.run_to(std::io::BufWriter::new(file))?;
                info!("wrote {} rows to {}", report.rows.len(), path);
                report
            }
            None => self.run_to(std::io::stdout().lock())?,
        };
        info!("finished in {:#?}", self.start.elapsed());
        Ok(report)
    }
}
