use std::collections::HashMap;
use std::fs::File;
use std::hash::Hash;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;

use crate::error::LoadError;

/// Reads every row of a headered CSV file into `T`
///
/// Columns are matched by header name, so column order does not matter and
/// extra columns are ignored. Each name in `required` must be present in the
/// header row, otherwise the file is rejected before any row is parsed.
pub fn read_rows<T: DeserializeOwned>(
    path: &Path,
    required: &[&'static str],
) -> Result<Vec<T>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    if let Some(&column) = required
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Groups `(key, value)` pairs into an index, keeping file order within each key
pub fn group_by_key<K, V, I>(pairs: I) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut index: HashMap<K, Vec<V>> = HashMap::new();
    for (key, value) in pairs {
        index.entry(key).or_default().push(value);
    }
    index
}

/// The first `k` entries of an ordered list, or all of them when fewer exist
pub fn head<T>(items: &[T], k: usize) -> &[T] {
    &items[..k.min(items.len())]
}
