use std::io::Write;

use pepmass_core::pipeline::Row;

pub fn serialize_row(row: &Row) -> csv::ByteRecord {
    let mut record = csv::ByteRecord::new();
    record.push_field(row.sequence_id.as_bytes());
    record.push_field(row.peptide.sequence.as_bytes());
    // Shortest representation that round-trips: no precision is lost
    record.push_field(ryu::Buffer::new().format(row.peptide_mass()).as_bytes());
    record
}

/// Write `sequence_id,peptide,peptide_mass` rows
pub fn write_rows<W: Write>(rows: &[Row], header: bool, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if header {
        wtr.write_byte_record(&csv::ByteRecord::from(vec![
            "sequence_id",
            "peptide",
            "peptide_mass",
        ]))?;
    }

    for row in rows {
        wtr.write_byte_record(&serialize_row(row))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pepmass_core::peptide::PeptideCache;
    use std::sync::Arc;

    #[test]
    fn rows() -> anyhow::Result<()> {
        let cache = PeptideCache::default();
        let rows = vec![
            Row {
                sequence_id: Arc::new("sp|P1|A".into()),
                peptide: cache.get_or_compute("PEPTIDE").unwrap(),
            },
            Row {
                sequence_id: Arc::new("odd,id".into()),
                peptide: cache.get_or_compute("K").unwrap(),
            },
        ];

        let mut buf = Vec::new();
        write_rows(&rows, true, &mut buf)?;
        let text = String::from_utf8(buf)?;
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "sequence_id,peptide,peptide_mass");
        assert!(lines[1].starts_with("sp|P1|A,PEPTIDE,799.3599"));
        assert!(lines[2].starts_with("\"odd,id\",K,146.1055"));

        // Masses are written at full precision
        let mass = lines[1].rsplit(',').next().unwrap().parse::<f64>()?;
        assert_eq!(mass.to_bits(), rows[0].peptide_mass().to_bits());
        Ok(())
    }
}
