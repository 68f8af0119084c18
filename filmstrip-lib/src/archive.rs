//! JSON export and import of a whole library.
//!
//! ```json
//! [{ "id": 1, "name": "walk", "blob": [2, 2, 0, 0] }, ...]
//! ```
//!
//! Blobs are written as arrays of signed bytes (-128..=127), which is how the
//! original application's exports look. Import accepts both signed and
//! unsigned (0..=255) values.

use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("couldn't parse archive")]
    Json(#[from] serde_json::Error),

    #[error("couldn't read library")]
    Library(#[from] LibraryError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(with = "signed_bytes")]
    pub blob: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub renamed: usize,
    pub skipped: usize,
}

pub fn export_records(library: &impl Library) -> Result<Vec<Record>, ArchiveError> {
    library
        .list_saves()
        .into_iter()
        .map(|entry| {
            Ok(Record {
                id: Some(entry.id.0),
                blob: library.load_save(entry.id)?,
                name: entry.name,
            })
        })
        .collect()
}

pub fn export_json(library: &impl Library) -> Result<String, ArchiveError> {
    Ok(serde_json::to_string(&export_records(library)?)?)
}

/// Merges `records` into `library`, matching them by name:
///
/// - a record whose name and blob both match an existing save is skipped,
/// - a record whose name is taken by a different blob is stored as
///   `"name (1)"`, `"name (2)"`, ...,
/// - everything else is added as-is.
pub fn import_records(
    library: &mut impl Library,
    records: Vec<Record>,
) -> Result<ImportReport, ArchiveError> {
    let mut report = ImportReport::default();
    let mut taken: HashSet<String> = HashSet::new();
    let mut known: HashMap<String, (usize, Vec<u8>)> = HashMap::new();

    for entry in library.list_saves() {
        taken.insert(entry.name.clone());

        if !known.contains_key(&entry.name) {
            let blob = library.load_save(entry.id)?;
            known.insert(entry.name, (1, blob));
        }
    }

    for record in records {
        let name = match known.get_mut(&record.name) {
            Some((_, blob)) if *blob == record.blob => {
                log::debug!("skipping duplicate `{}`", record.name);
                report.skipped += 1;
                continue;
            }

            Some((suffix, _)) => {
                let mut name = format!("{} ({})", record.name, suffix);
                *suffix += 1;

                while taken.contains(&name) {
                    name = format!("{} ({})", record.name, suffix);
                    *suffix += 1;
                }

                log::debug!("importing `{}` as `{}`", record.name, name);
                report.renamed += 1;
                name
            }

            None => {
                known.insert(record.name.clone(), (1, record.blob.clone()));
                report.added += 1;
                record.name
            }
        };

        library.save_new(&name, record.blob);
        taken.insert(name);
    }

    log::info!(
        "imported {} save(s), renamed {}, skipped {}",
        report.added + report.renamed,
        report.renamed,
        report.skipped
    );

    Ok(report)
}

pub fn import_json(library: &mut impl Library, json: &str) -> Result<ImportReport, ArchiveError> {
    let records: Vec<Record> = serde_json::from_str(json)?;

    import_records(library, records)
}

/// Builds a library holding exactly the given records, in order.
pub fn library_from_json(json: &str) -> Result<MemoryLibrary, ArchiveError> {
    let records: Vec<Record> = serde_json::from_str(json)?;
    let mut library = MemoryLibrary::new();

    for record in records {
        library.save_new(&record.name, record.blob);
    }

    Ok(library)
}

mod signed_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(bytes.iter().map(|&b| b as i8))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<i16>::deserialize(deserializer)?
            .into_iter()
            .map(|value| match value {
                -128..=-1 => Ok(value as i8 as u8),
                0..=255 => Ok(value as u8),
                _ => Err(<D::Error as de::Error>::custom(format!(
                    "{} is not a byte",
                    value
                ))),
            })
            .collect()
    }
}
