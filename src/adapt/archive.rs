// src/adapt/archive.rs

use std::{collections::HashSet, fs::File, io::Read, path::Path};
use tracing::{debug, info, instrument};
use zip::ZipArchive;

use super::{utils, AdaptContext, FormatAdapter};
use crate::{
    error::{MigrationError, Result},
    extract::{extract_rows, RawCell},
    types::{AgiUnit, CanonicalRecord, SourceFile},
};

/// Column positions inside a legacy workbook. Positions are fixed per
/// release era; the sheets carry no usable header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub dest_state_fips: usize,
    pub dest_county_fips: usize,
    pub origin_state_fips: usize,
    pub origin_county_fips: usize,
    pub origin_state: usize,
    pub origin_label: usize,
    pub returns: usize,
    pub exemptions: usize,
    pub agi: usize,
}

pub const LEGACY_A_LAYOUT: ColumnLayout = ColumnLayout {
    origin_state_fips: 0,
    origin_county_fips: 1,
    dest_state_fips: 2,
    dest_county_fips: 3,
    origin_state: 4,
    origin_label: 5,
    returns: 6,
    exemptions: 7,
    agi: 8,
};

pub const LEGACY_B_LAYOUT: ColumnLayout = ColumnLayout {
    dest_state_fips: 0,
    dest_county_fips: 1,
    origin_state_fips: 2,
    origin_county_fips: 3,
    origin_state: 4,
    origin_label: 5,
    returns: 6,
    exemptions: 7,
    agi: 8,
};

/// The two zipped-workbook release eras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveVariant {
    /// Two-year span per archive, raw-dollar AGI, strict rows.
    LegacyA,
    /// One year per archive, AGI in thousands, trailing junk rows tolerated.
    LegacyB,
}

impl ArchiveVariant {
    pub fn layout(&self) -> ColumnLayout {
        match self {
            ArchiveVariant::LegacyA => LEGACY_A_LAYOUT,
            ArchiveVariant::LegacyB => LEGACY_B_LAYOUT,
        }
    }

    pub fn agi_unit(&self) -> AgiUnit {
        match self {
            ArchiveVariant::LegacyA => AgiUnit::Dollars,
            ArchiveVariant::LegacyB => AgiUnit::Thousands,
        }
    }

    /// Whether rows with a non-integer destination FIPS are skipped
    /// instead of failing the source.
    pub fn skips_non_numeric_rows(&self) -> bool {
        matches!(self, ArchiveVariant::LegacyB)
    }

    /// Member names to try, in priority order. Order matters: some
    /// archives hold more than one plausible name and only the earlier one
    /// is the inflow sheet.
    pub fn member_candidates(&self, archive_path: &Path) -> Result<Vec<String>> {
        match self {
            ArchiveVariant::LegacyA => {
                let (start, end) = utils::span_years(archive_path)?;
                let s2 = format!("{:02}", start % 100);
                let e2 = format!("{:02}", end % 100);
                let e1 = format!("{}", end % 10);
                Ok(vec![
                    format!("co{}{}iTX.xls", s2, e2),
                    format!("CO{}{}ITX.XLS", s2, e2),
                    format!("co{}{}itx.xls", s2, e2),
                    format!("co{}{}iTX.xls", s2, e1),
                    format!("CO{}{}ITX.XLS", s2, e1),
                ])
            }
            ArchiveVariant::LegacyB => {
                let slug = utils::stem_suffix(archive_path, 4)?;
                Ok(vec![
                    format!("co{}iTx.xls", slug),
                    format!("co{}TXi.xls", slug),
                    format!("co{}Txi.xls", slug),
                    format!("co{}iTX.xls", slug),
                    format!("co{}itx.xls", slug),
                ])
            }
        }
    }
}

/// First candidate present in the archive listing.
pub fn resolve_member<'a, I>(member_names: I, candidates: &[String]) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: HashSet<&str> = member_names.into_iter().collect();
    candidates
        .iter()
        .find(|c| present.contains(c.as_str()))
        .cloned()
}

/// Resolve and read the workbook member of `archive_path` into memory.
/// The archive is closed before this returns.
pub fn read_member(archive_path: &Path, candidates: &[String]) -> Result<(String, Vec<u8>)> {
    let file = File::open(archive_path).map_err(|e| MigrationError::io(archive_path, e))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| MigrationError::unreadable(archive_path, e))?;

    let member = resolve_member(archive.file_names(), candidates).ok_or_else(|| {
        MigrationError::MemberNotFound {
            path: archive_path.to_path_buf(),
            candidates: candidates.to_vec(),
        }
    })?;

    let mut entry = archive
        .by_name(&member)
        .map_err(|e| MigrationError::unreadable(archive_path, e))?;
    let mut buf = Vec::new();
    entry
        .read_to_end(&mut buf)
        .map_err(|e| MigrationError::unreadable(archive_path, e))?;

    Ok((member, buf))
}

fn cell_at(row: &[RawCell], i: usize) -> &RawCell {
    static EMPTY: RawCell = RawCell::Empty;
    row.get(i).unwrap_or(&EMPTY)
}

/// One adapter for both legacy archive eras, parameterized by variant.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveAdapter {
    variant: ArchiveVariant,
}

impl ArchiveAdapter {
    pub fn new(variant: ArchiveVariant) -> Self {
        Self { variant }
    }
}

impl FormatAdapter for ArchiveAdapter {
    #[instrument(level = "info", skip(self, source, ctx), fields(path = %source.path.display(), year = %source.year))]
    fn adapt(&self, source: &SourceFile, ctx: &AdaptContext<'_>) -> Result<Vec<CanonicalRecord>> {
        let candidates = self.variant.member_candidates(&source.path)?;
        let (member, bytes) = read_member(&source.path, &candidates)?;
        info!(member = %member, "parsing {}", source.year);

        let rows = extract_rows(ctx.decoder, &source.path, &bytes, ctx.header_rows)?;
        let layout = self.variant.layout();

        let mut output = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let cell = |i: usize| cell_at(row, i);

            let (state, county) = match (
                cell(layout.dest_state_fips).as_integer(),
                cell(layout.dest_county_fips).as_integer(),
            ) {
                (Some(state), Some(county)) => (state, county),
                _ if self.variant.skips_non_numeric_rows() => {
                    debug!(row = idx, "skipping row without numeric destination FIPS");
                    continue;
                }
                _ => {
                    return Err(MigrationError::MalformedRow {
                        path: source.path.clone(),
                        row: idx,
                        reason: format!(
                            "destination FIPS {:?}/{:?} is not an integer",
                            cell(layout.dest_state_fips),
                            cell(layout.dest_county_fips)
                        ),
                    })
                }
            };

            if !ctx.target.matches(state, county) {
                continue;
            }

            output.push(CanonicalRecord {
                year2: source.year.clone(),
                year1_state_fips: cell(layout.origin_state_fips).to_plain_string(),
                year1_county_fips: cell(layout.origin_county_fips).to_plain_string(),
                year1_state: cell(layout.origin_state).to_plain_string(),
                year1_county: ctx
                    .normalizer
                    .normalize(&cell(layout.origin_label).to_plain_string()),
                returns: cell(layout.returns).to_plain_string(),
                exemptions: cell(layout.exemptions).to_plain_string(),
                agi: cell(layout.agi).to_plain_string(),
                agi_unit: self.variant.agi_unit(),
            });
        }

        info!(records = output.len(), "parsed {}", source.year);
        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        adapt::Target, extract::tests::TextSheetDecoder, labels::LabelNormalizer,
        types::SourceKind,
    };
    use std::{io::Write, path::PathBuf};
    use tempfile::tempdir;
    use zip::{write::FileOptions, CompressionMethod};

    pub(crate) const HEADER_BAND: &str = "Inflow\n\nCounty\n\nState,County\n\n\nCode,Code\n";

    /// Write a zip at `dir/name` containing `members` (name, contents).
    pub(crate) fn write_zip(dir: &Path, name: &str, members: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (member, contents) in members {
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(*member, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn run(kind: SourceKind, variant: ArchiveVariant, path: PathBuf) -> Result<Vec<CanonicalRecord>> {
        let normalizer = LabelNormalizer::default();
        let ctx = AdaptContext {
            target: Target::default(),
            normalizer: &normalizer,
            decoder: &TextSheetDecoder,
            header_rows: crate::extract::DEFAULT_HEADER_ROWS,
            encoding: encoding_rs::WINDOWS_1252,
        };
        let source = SourceFile {
            year: crate::adapt::destination_year(kind, &path)?,
            kind,
            path,
        };
        ArchiveAdapter::new(variant).adapt(&source, &ctx)
    }

    #[test]
    fn legacy_a_keeps_only_target_rows() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sheet = format!(
            "{}'48,'001,48,423,TX,Anderson County,10,21,350000\n\
             48,1,48,1,TX,Anderson County,4,9,1000\n",
            HEADER_BAND
        );
        let path = write_zip(
            dir.path(),
            "county_migration_1995_1996.zip",
            &[("co9596iTX.xls", sheet.as_str())],
        );

        let records = run(SourceKind::LegacyArchiveA, ArchiveVariant::LegacyA, path)?;
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.year2, "1996");
        // text cells keep their zero padding
        assert_eq!(r.year1_county_fips, "001");
        assert_eq!(r.year1_county, "Anderson County");
        assert_eq!(r.exemptions, "21");
        assert_eq!(r.agi, "350000");
        assert_eq!(r.agi_unit, AgiUnit::Dollars);
        Ok(())
    }

    #[test]
    fn legacy_a_rejects_non_numeric_destination() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sheet = format!("{}48,1,Total,423,TX,Footer,1,1,1\n", HEADER_BAND);
        let path = write_zip(
            dir.path(),
            "county_migration_1995_1996.zip",
            &[("co9596iTX.xls", sheet.as_str())],
        );

        let err = run(SourceKind::LegacyArchiveA, ArchiveVariant::LegacyA, path).unwrap_err();
        assert!(matches!(err, MigrationError::MalformedRow { row: 0, .. }));
        Ok(())
    }

    #[test]
    fn legacy_b_keeps_only_target_rows_and_skips_footer() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sheet = format!(
            "{}48,423,48,423,TX,Smith County Non-migrants,41000,95000,1500000\n\
             48,1,48,423,TX,Smith County Non-migrants,1,1,1\n\
             Source: Statistics of Income,,,,,,,,\n",
            HEADER_BAND
        );
        let path = write_zip(dir.path(), "county0405.zip", &[("co0405iTx.xls", sheet.as_str())]);

        let records = run(SourceKind::LegacyArchiveB, ArchiveVariant::LegacyB, path)?;
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.year2, "2005");
        assert_eq!(r.year1_state_fips, "48");
        assert_eq!(r.year1_county, "Smith County Non-Migrants");
        assert_eq!(r.agi_unit, AgiUnit::Thousands);
        Ok(())
    }

    #[test]
    fn missing_member_names_the_archive() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = write_zip(dir.path(), "county0405.zip", &[("readme.txt", "hi")]);

        match run(SourceKind::LegacyArchiveB, ArchiveVariant::LegacyB, path.clone()) {
            Err(MigrationError::MemberNotFound {
                path: p,
                candidates,
            }) => {
                assert_eq!(p, path);
                assert_eq!(candidates.len(), 5);
            }
            other => panic!("expected MemberNotFound, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn first_candidate_in_order_wins() -> anyhow::Result<()> {
        let candidates = ArchiveVariant::LegacyB.member_candidates(Path::new("county0405.zip"))?;
        let listing = ["co0405itx.xls", "co0405TXi.xls", "notes.doc"];
        assert_eq!(
            resolve_member(listing, &candidates).as_deref(),
            Some("co0405TXi.xls")
        );
        assert_eq!(resolve_member(["other.xls"], &candidates), None);
        Ok(())
    }

    #[test]
    fn legacy_a_reads_the_first_candidate_present() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let lower = format!("{}'48,'001,48,423,TX,Anderson County,1,1,1\n", HEADER_BAND);
        let upper = format!("{}'48,'005,48,423,TX,Angelina County,2,2,2\n", HEADER_BAND);
        // the later candidate is stored first in the archive
        let path = write_zip(
            dir.path(),
            "county_migration_1995_1996.zip",
            &[("CO9596ITX.XLS", upper.as_str()), ("co9596iTX.xls", lower.as_str())],
        );

        let records = run(SourceKind::LegacyArchiveA, ArchiveVariant::LegacyA, path)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year1_county, "Anderson County");
        assert_eq!(records[0].year1_county_fips, "001");
        Ok(())
    }

    #[test]
    fn legacy_a_candidates_cover_short_suffix() -> anyhow::Result<()> {
        let candidates =
            ArchiveVariant::LegacyA.member_candidates(Path::new("migration_1999_2000.zip"))?;
        assert_eq!(candidates[0], "co9900iTX.xls");
        assert_eq!(candidates[3], "co990iTX.xls");
        assert_eq!(candidates[4], "CO990ITX.XLS");
        Ok(())
    }

    #[test]
    fn declared_member_size_is_not_trusted() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let contents = "48,423,48,423,TX,Smith County Non-Migrants,1,1,1\n";
        let path = write_zip(dir.path(), "county0405.zip", &[("co0405iTx.xls", contents)]);

        // claim a ~4 GiB uncompressed size in the central directory entry
        let mut bytes = std::fs::read(&path)?;
        let central = bytes
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .expect("central directory header");
        bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        std::fs::write(&path, &bytes)?;

        let candidates = ArchiveVariant::LegacyB.member_candidates(&path)?;
        match read_member(&path, &candidates) {
            Ok((member, buf)) => {
                assert_eq!(member, "co0405iTx.xls");
                assert_eq!(buf, contents.as_bytes());
            }
            Err(MigrationError::UnreadableSource { .. }) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn corrupt_archive_is_unreadable() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("county0405.zip");
        std::fs::write(&path, b"not a zip")?;
        let err = run(SourceKind::LegacyArchiveB, ArchiveVariant::LegacyB, path).unwrap_err();
        assert!(matches!(err, MigrationError::UnreadableSource { .. }));
        Ok(())
    }
}
