use std::sync::Arc;

/// Protein records in file order. Each record is keyed by the first
/// whitespace-delimited token of its description line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fasta {
    pub targets: Vec<(Arc<String>, String)>,
}

impl Fasta {
    fn accession(description: &str) -> Arc<String> {
        Arc::new(
            description
                .split_ascii_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }

    /// Translated records may end with a stop codon; a `*` anywhere else is
    /// left in place and rejected at digestion
    fn finish(mut sequence: String) -> String {
        if sequence.ends_with('*') {
            sequence.pop();
        }
        sequence
    }

    // Parse a string into a fasta database
    //
    // Headers without sequence lines are kept (with an empty sequence) so that
    // they can be reported downstream instead of silently vanishing
    pub fn parse(contents: &str) -> Fasta {
        let mut targets = Vec::new();
        let mut last_id: Option<&str> = None;
        let mut s = String::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(id) = line.strip_prefix('>') {
                if last_id.is_some() || !s.is_empty() {
                    let acc = Self::accession(last_id.unwrap_or_default());
                    targets.push((acc, Self::finish(std::mem::take(&mut s))));
                }
                last_id = Some(id);
            } else {
                s.push_str(line);
            }
        }

        if last_id.is_some() || !s.is_empty() {
            let acc = Self::accession(last_id.unwrap_or_default());
            targets.push((acc, Self::finish(s)));
        }

        Fasta { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        let fasta = Fasta::parse(
            r#"
>sp|Q99536|VAT1_HUMAN Synaptic vesicle membrane protein
MSDEREVAEAATGEDASSPPPKTEAASDPQHPAASEGAAAAAASPPLLRCLVLTGFGGYD
KVKLQSRPAAPPAPGPGQLTLR

; a comment line
>second	tab separated
  MKPRK
>empty
"#,
        );

        assert_eq!(fasta.len(), 3);
        assert_eq!(fasta.targets[0].0.as_str(), "sp|Q99536|VAT1_HUMAN");
        assert_eq!(
            fasta.targets[0].1,
            "MSDEREVAEAATGEDASSPPPKTEAASDPQHPAASEGAAAAAASPPLLRCLVLTGFGGYDKVKLQSRPAAPPAPGPGQLTLR"
        );
        assert_eq!(fasta.targets[1].0.as_str(), "second");
        assert_eq!(fasta.targets[1].1, "MKPRK");
        assert_eq!(fasta.targets[2].0.as_str(), "empty");
        assert!(fasta.targets[2].1.is_empty());
    }

    #[test]
    fn missing_description() {
        let fasta = Fasta::parse(">\nPEPTIDE\nPEPTIDE\n>  \nK");
        assert_eq!(fasta.len(), 2);
        assert!(fasta.targets.iter().all(|(id, _)| id.is_empty()));
        assert_eq!(fasta.targets[0].1, "PEPTIDEPEPTIDE");
    }

    #[test]
    fn stop_codon() {
        let fasta = Fasta::parse(">p\nPEPK*\n>q\nMKP\nRK*\n>r\nPE*PK\n>s\nPEPK**");
        let sequences = fasta
            .targets
            .iter()
            .map(|(_, s)| s.as_str())
            .collect::<Vec<_>>();
        assert_eq!(sequences, vec!["PEPK", "MKPRK", "PE*PK", "PEPK*"]);
        assert!(Fasta::parse(">only\n*").targets[0].1.is_empty());
    }

    #[test]
    fn empty() {
        assert!(Fasta::parse("").is_empty());
        assert!(Fasta::parse("\n\n   \n").is_empty());
    }
}
