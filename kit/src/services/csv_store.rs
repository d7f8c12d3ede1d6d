use crate::{
    error::{KitError, Result},
    models::IndicatorTable,
    services::folder_resolver::ensure_dir,
    utils::{Logger, Timer},
};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Temp file in `folder` that ends up with the same mode as a plain
/// `File::create` (0666 minus umask) once persisted.
fn staging_file(folder: &Path) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".result").suffix(".csv.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    Ok(builder.tempfile_in(folder)?)
}

/// Write a table as CSV: index column first, then one column per indicator.
///
/// The file is written next to its destination and renamed into place, so a
/// failed run never leaves a half-written result behind.
pub fn write_table(table: &IndicatorTable, path: &Path) -> Result<()> {
    let logger = Logger::new("CSV_STORE");
    let timer = Timer::start("csv write");

    let folder = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(folder)?;

    let tmp = staging_file(folder)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        let mut header = Vec::with_capacity(table.columns().len() + 1);
        header.push(table.index_name());
        header.extend(table.columns().iter().map(String::as_str));
        writer.write_record(&header)?;

        for (label, values) in table.rows() {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(label.to_string());
            record.extend(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| KitError::Io(e.error))?;

    logger.info(&format!("Wrote {} rows to {}", table.len(), path.display()));
    timer.log_elapsed("CSV_STORE");
    Ok(())
}

/// Read a table written by [`write_table`].
pub fn read_table(path: &Path) -> Result<IndicatorTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut names = headers.iter();
    let index_name = names
        .next()
        .ok_or_else(|| KitError::InvalidTable(format!("{} has no header", path.display())))?;
    let mut table = IndicatorTable::new(index_name, names.map(str::to_string).collect());

    for record in reader.records() {
        let record = record?;
        let mut fields = record.iter();
        let label = fields.next().unwrap_or_default();
        let values = fields
            .map(|field| {
                if field.is_empty() {
                    Ok(None)
                } else {
                    field.parse::<f64>().map(Some).map_err(|_| {
                        KitError::InvalidTable(format!("{}: not a number: {}", label, field))
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        table.push_row(label, values)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> IndicatorTable {
        let mut table = IndicatorTable::new(
            "country",
            vec![
                "GDP".to_string(),
                "population".to_string(),
                "rd_expend_per_gdp".to_string(),
            ],
        );
        table
            .push_row("AUT", vec![Some(3.86e11), Some(8_300_000.0), Some(2.43)])
            .unwrap();
        table
            .push_row("USA", vec![Some(1.45e13), Some(301_231_207.0), None])
            .unwrap();
        table
            .push_row("FIN", vec![Some(0.1 + 0.2), Some(5_288_720.0), Some(3.35)])
            .unwrap();
        table
    }

    #[test]
    fn test_round_trip_preserves_columns_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("research_outcome.csv");
        let table = sample();

        write_table(&table, &path).unwrap();
        let back = read_table(&path).unwrap();

        assert_eq!(back.index_name(), "country");
        assert_eq!(back.columns(), table.columns());
        assert_eq!(back.index(), table.index());
        assert_eq!(back, table);
    }

    #[test]
    fn test_layout_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&sample(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "country,GDP,population,rd_expend_per_gdp");
        assert_eq!(lines.next().unwrap(), "AUT,386000000000,8300000,2.43");
        assert_eq!(lines.next().unwrap(), "USA,14500000000000,301231207,");
    }

    #[test]
    fn test_overwrites_existing_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old").unwrap();

        write_table(&sample(), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("country,"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_result_mode_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.csv");
        fs::File::create(&plain).unwrap();
        let path = dir.path().join("out.csv");
        write_table(&sample(), &path).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }

    #[test]
    fn test_rejects_non_numeric_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "country,GDP\nAUT,lots\n").unwrap();
        assert!(matches!(read_table(&path), Err(KitError::InvalidTable(_))));
    }
}
