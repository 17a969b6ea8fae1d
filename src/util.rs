//! Private utility module
use std::path::Path;

/// Check whether the given path names a gzip-compressed volume:
/// either an ".mgz" file or any file ending in ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| {
            let name = a.to_string_lossy();
            name.ends_with(".mgz") || name.ends_with(".gz")
        })
        .unwrap_or(false)
}

/// Retrieve the file name of a path as an owned string, or an empty
/// string if the path has no final component.
pub fn file_name_of<P>(path: P) -> String
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_default()
}
