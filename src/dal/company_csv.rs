use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::domain::company::CompanyRecord;

const SNAPSHOT_COLUMNS: [&str; 7] = [
    "name",
    "address_line1",
    "address_line2",
    "city",
    "state",
    "phone",
    "website",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportKind {
    Snapshot,
    Enriched,
}

pub fn write_companies<W: Write>(
    writer: W,
    companies: &[CompanyRecord],
    kind: ExportKind,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    let mut header = SNAPSHOT_COLUMNS.to_vec();
    if kind == ExportKind::Enriched {
        header.push("description");
    }
    csv_writer.write_record(&header)?;

    for company in companies {
        let mut row = vec![
            company.name.as_str(),
            company.address_line1.as_str(),
            company.address_line2.as_str(),
            company.city.as_str(),
            company.state.as_str(),
            company.phone.as_export(),
            company.website.as_export(),
        ];
        if kind == ExportKind::Enriched {
            row.push(company.description.as_export());
        }
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes next to `path` first and renames, so a crash never leaves a
/// truncated export behind.
pub fn export_companies(
    path: &Path,
    companies: &[CompanyRecord],
    kind: ExportKind,
) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let tmp_path = PathBuf::from(format!("{}.{}.tmp", path.display(), uuid::Uuid::new_v4()));
    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    let written = write_companies(file, companies, kind)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))
        .and_then(|_| {
            fs::rename(&tmp_path, path)
                .with_context(|| format!("Failed to move export into {}", path.display()))
        });
    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            log::warn!("Failed to remove {}: {}", tmp_path.display(), e);
        }
    }
    written?;

    log::info!("Exported {} companies to {}", companies.len(), path.display());
    Ok(())
}
