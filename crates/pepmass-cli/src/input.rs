use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command, ValueHint};
use pepmass_core::pipeline::{Builder, EnzymeBuilder, Parameters};
use serde::{Deserialize, Serialize};

pub fn command() -> Command {
    Command::new("pepmass")
        .version(clap::crate_version!())
        .about("Extract tryptic peptides and their monoisotopic masses from FASTA files")
        .arg(
            Arg::new("fasta_paths")
                .num_args(0..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "FASTA files containing protein sequences. Rows from all files are \
                     concatenated in the order given. Reads STDIN if no files (or `-`) are given.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("parameters")
                .short('p')
                .long("parameters")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("minmass")
                .long("minmass")
                .value_parser(value_parser!(f64))
                .help("Minimum peptide mass (exclusive, default = 600.0)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("maxmass")
                .long("maxmass")
                .value_parser(value_parser!(f64))
                .help("Maximum peptide mass (exclusive, default = 3500.0)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("enzyme")
                .short('e')
                .long("enzyme")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Cleavage rule: trypsin (default), trypsin/p, lys-c, arg-c, asp-n, \
                     chymotrypsin, glu-c or none",
                )
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("missed-cleavages")
                .long("missed-cleavages")
                .value_parser(value_parser!(u8))
                .help("Maximum number of missed cleavages (default = 1)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .action(clap::ArgAction::SetTrue)
                .help("Sort rows by sequence id, then peptide, instead of input order"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Write rows to this file instead of STDOUT")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .action(clap::ArgAction::SetTrue)
                .help("Write a `sequence_id,peptide,peptide_mass` header line"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_parser(value_parser!(u16).range(1..))
                .help("Number of worker threads (default = # of CPUs)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("print-parameters")
                .long("print-parameters")
                .action(clap::ArgAction::SetTrue)
                .help("Print the effective parameters as JSON and exit"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}

#[derive(Serialize, Debug)]
/// Actual run settings - may include overrides or default values not set by user
pub struct Search {
    pub version: String,
    pub parameters: Parameters,
    pub fasta_paths: Vec<String>,
    pub output: Option<String>,
    pub header: bool,
}

#[derive(Deserialize, Default, Debug)]
/// Input parameters deserialized from JSON file
pub struct Input {
    #[serde(flatten)]
    database: Builder,
    fasta_paths: Option<Vec<String>>,
    output: Option<String>,
    header: Option<bool>,
}

impl Input {
    pub fn from_arguments(matches: &ArgMatches) -> anyhow::Result<Self> {
        let mut input = match matches.get_one::<String>("parameters") {
            Some(path) => Input::load(path)
                .with_context(|| format!("Failed to read parameters from `{path}`"))?,
            None => Input::default(),
        };

        // Handle JSON configuration overrides
        if let Some(min_mass) = matches.get_one::<f64>("minmass") {
            log::trace!("overriding `min_mass` parameter.");
            input.database.min_mass = Some(*min_mass);
        }
        if let Some(max_mass) = matches.get_one::<f64>("maxmass") {
            log::trace!("overriding `max_mass` parameter.");
            input.database.max_mass = Some(*max_mass);
        }
        if let Some(name) = matches.get_one::<String>("enzyme") {
            log::trace!("overriding `enzyme.name` parameter.");
            let missed_cleavages = input
                .database
                .enzyme
                .as_ref()
                .and_then(|enzyme| enzyme.missed_cleavages);
            input.database.enzyme = Some(EnzymeBuilder {
                name: Some(name.into()),
                missed_cleavages,
                cleave_at: None,
                restrict: None,
                c_terminal: None,
            });
        }
        if let Some(missed_cleavages) = matches.get_one::<u8>("missed-cleavages") {
            log::trace!("overriding `enzyme.missed_cleavages` parameter.");
            input
                .database
                .enzyme
                .get_or_insert_with(EnzymeBuilder::default)
                .missed_cleavages = Some(*missed_cleavages);
        }
        if matches.get_flag("sort") {
            input.database.sort = Some(true);
        }
        if let Some(fasta_paths) = matches.get_many::<String>("fasta_paths") {
            log::trace!("overriding `fasta_paths` parameter.");
            input.fasta_paths = Some(fasta_paths.cloned().collect());
        }
        if let Some(output) = matches.get_one::<String>("output") {
            log::trace!("overriding `output` parameter.");
            input.output = Some(output.into());
        }
        if matches.get_flag("header") {
            input.header = Some(true);
        }

        Ok(input)
    }

    pub fn load<S: AsRef<str>>(path: S) -> anyhow::Result<Self> {
        pepmass_core::read_json(path.as_ref()).map_err(anyhow::Error::from)
    }

    pub fn build(self) -> anyhow::Result<Search> {
        let parameters = self.database.make_parameters()?;

        if parameters.min_mass < 0.0 {
            log::warn!(
                "`min_mass` is negative ({}): every peptide lighter than `max_mass` is kept",
                parameters.min_mass
            );
        }
        if parameters.enzyme.missed_cleavages.unwrap_or(0) > 3 {
            log::warn!(
                "{} missed cleavages requested, typical values are 0-2",
                parameters.enzyme.missed_cleavages.unwrap_or(0)
            );
        }

        Ok(Search {
            version: clap::crate_version!().into(),
            parameters,
            fasta_paths: self.fasta_paths.unwrap_or_default(),
            output: self.output,
            header: self.header.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pepmass_core::pipeline::Order;

    fn search(args: &[&str]) -> anyhow::Result<Search> {
        let matches = command().try_get_matches_from(args)?;
        Input::from_arguments(&matches)?.build()
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let search = search(&["pepmass"])?;
        assert_eq!(search.parameters, Parameters::default());
        assert!(search.fasta_paths.is_empty());
        assert!(!search.header);
        assert_eq!(search.output, None);
        Ok(())
    }

    #[test]
    fn overrides() -> anyhow::Result<()> {
        let search = search(&[
            "pepmass",
            "a.fasta",
            "b.fasta",
            "--minmass",
            "500",
            "--maxmass",
            "4000.5",
            "--enzyme",
            "Lys-C",
            "--missed-cleavages",
            "2",
            "--sort",
            "--header",
        ])?;
        assert_eq!(search.fasta_paths, vec!["a.fasta", "b.fasta"]);
        assert_eq!(search.parameters.min_mass, 500.0);
        assert_eq!(search.parameters.max_mass, 4000.5);
        assert_eq!(search.parameters.enzyme.name.as_deref(), Some("lys-c"));
        assert_eq!(search.parameters.enzyme.missed_cleavages, Some(2));
        assert_eq!(search.parameters.order, Order::Sorted);
        assert!(search.header);
        Ok(())
    }

    #[test]
    fn configuration_errors() {
        assert!(search(&["pepmass", "--minmass", "4000", "--maxmass", "100"]).is_err());
        assert!(search(&["pepmass", "--enzyme", "pepsin"]).is_err());
        assert!(search(&["pepmass", "--threads", "0"]).is_err());
    }

    #[test]
    fn json_parameters() -> anyhow::Result<()> {
        let input: Input = serde_json::from_str(
            r#"{
                "max_mass": 2000.0,
                "enzyme": { "cleave_at": "K", "restrict": "P" },
                "custom_residues": { "X": 110.0 },
                "custom_termini": { "-NH2": 16.01872406 },
                "c_terminus": "-NH2",
                "fasta_paths": ["x.fasta"],
                "header": true
            }"#,
        )?;
        let search = input.build()?;
        assert_eq!(search.parameters.max_mass, 2000.0);
        assert_eq!(search.parameters.enzyme.cleave_at.as_deref(), Some("K"));
        assert_eq!(search.parameters.enzyme.c_terminal, Some(true));
        assert_eq!(search.parameters.custom_residues.get(&'X'), Some(&110.0));
        assert_eq!(search.parameters.n_terminus, "H-");
        assert_eq!(search.parameters.c_terminus, "-NH2");
        assert_eq!(search.fasta_paths, vec!["x.fasta"]);
        assert!(search.header);
        Ok(())
    }
}
