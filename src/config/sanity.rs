// src/config/sanity.rs

//! Pre-flight sanity check over the whole sync list.
//!
//! Runs before anything is watched or copied. Every problem found is
//! collected so the user can fix the config in one pass; a single problem
//! rejects the whole list.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::SyncSpec;
use crate::errors::{EspSyncError, Result};
use crate::fs::{normalize_lexically, FileSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Destination,
}

#[derive(Debug)]
struct Resolved<'a> {
    role: Role,
    job: usize,
    given: &'a Path,
    path: PathBuf,
}

/// Reject duplicate or overlapping sources/destinations, missing paths,
/// destination type mismatches and source/destination pairs that share a
/// volume.
pub fn check_sync_list(list: &[SyncSpec], fs: &dyn FileSystem) -> Result<()> {
    let mut problems = Vec::new();
    let mut all: Vec<Resolved<'_>> = Vec::new();

    for (job, spec) in list.iter().enumerate() {
        check_paths_exist(spec, fs, &mut problems);

        all.push(Resolved {
            role: Role::Source,
            job,
            given: &spec.source,
            path: resolve(&spec.source, fs),
        });
        for dest in &spec.destinations {
            all.push(Resolved {
                role: Role::Destination,
                job,
                given: dest,
                path: resolve(dest, fs),
            });
        }
    }

    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            if let Some(problem) = overlap(a, b) {
                problems.push(problem);
            }
        }
    }

    if problems.is_empty() {
        debug!(jobs = list.len(), "sync list passed sanity check");
        Ok(())
    } else {
        Err(EspSyncError::SanityError(problems))
    }
}

fn check_paths_exist(spec: &SyncSpec, fs: &dyn FileSystem, problems: &mut Vec<String>) {
    let src = &spec.source;
    if !fs.exists(src) {
        problems.push(format!("source {} does not exist", src.display()));
    }

    for dest in &spec.destinations {
        if !fs.exists(dest) {
            problems.push(format!("destination {} does not exist", dest.display()));
            continue;
        }
        if !fs.exists(src) {
            continue;
        }

        if fs.is_dir(src) != fs.is_dir(dest) || fs.is_file(src) != fs.is_file(dest) {
            problems.push(format!(
                "source {} and destination {} are not the same type",
                src.display(),
                dest.display()
            ));
        }

        match (fs.device_id(src), fs.device_id(dest)) {
            (Ok(s), Ok(d)) if s == d => problems.push(format!(
                "source {} and destination {} are on the same volume",
                src.display(),
                dest.display()
            )),
            (Ok(_), Ok(_)) => {}
            (Err(e), _) | (_, Err(e)) => problems.push(format!(
                "cannot determine volume of {} / {}: {e}",
                src.display(),
                dest.display()
            )),
        }
    }
}

fn resolve(path: &Path, fs: &dyn FileSystem) -> PathBuf {
    if fs.exists(path) {
        if let Ok(canonical) = fs.canonicalize(path) {
            return canonical;
        }
    }
    normalize_lexically(path)
}

fn overlap(a: &Resolved<'_>, b: &Resolved<'_>) -> Option<String> {
    let same = a.path == b.path;
    let nested = a.path.starts_with(&b.path) || b.path.starts_with(&a.path);
    if !same && !nested {
        return None;
    }

    let (a_name, b_name) = (a.given.display(), b.given.display());
    let msg = match (a.role, b.role, same) {
        (Role::Source, Role::Source, true) => format!("duplicate source {a_name}"),
        (Role::Destination, Role::Destination, true) => {
            format!("duplicate destination {a_name}")
        }
        (Role::Source, Role::Destination, true) => format!(
            "source {a_name} (entry #{}) is also a destination (entry #{})",
            a.job + 1,
            b.job + 1
        ),
        (Role::Destination, Role::Source, true) => format!(
            "source {b_name} (entry #{}) is also a destination (entry #{})",
            b.job + 1,
            a.job + 1
        ),
        (_, _, false) => format!("{a_name} and {b_name} overlap (one contains the other)"),
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn two_volumes() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("/efi0", 1).add_dir("/efi1", 2).add_dir("/efi2", 3);
        fs
    }

    fn problems(list: &[SyncSpec], fs: &dyn FileSystem) -> Vec<String> {
        match check_sync_list(list, fs) {
            Err(EspSyncError::SanityError(p)) => p,
            Err(other) => panic!("expected SanityError, got {other:?}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn distinct_volumes_pass() {
        let fs = two_volumes();
        let list = vec![SyncSpec::new("/efi0/", ["/efi1/"], Vec::<String>::new())];
        assert!(check_sync_list(&list, &fs).is_ok());
    }

    #[test]
    fn trailing_slash_does_not_hide_duplicates() {
        let fs = two_volumes();
        let list = vec![
            SyncSpec::new("/efi0/", ["/efi1"], Vec::<String>::new()),
            SyncSpec::new("/efi0", ["/efi2"], Vec::<String>::new()),
        ];
        let p = problems(&list, &fs);
        assert_eq!(p.len(), 1);
        assert!(p[0].contains("duplicate source"));
    }

    #[test]
    fn nested_destination_and_source_overlap() {
        let fs = two_volumes();
        fs.add_dir("/efi1/EFI", 2);
        let list = vec![
            SyncSpec::new("/efi0", ["/efi1"], Vec::<String>::new()),
            SyncSpec::new("/efi1/EFI", ["/efi2"], Vec::<String>::new()),
        ];
        let p = problems(&list, &fs);
        assert!(p.iter().any(|m| m.contains("overlap")), "{p:?}");
    }

    #[test]
    fn file_destination_for_directory_source_is_a_type_mismatch() {
        let fs = two_volumes();
        fs.add_file("/mnt/blob", 9);
        let list = vec![SyncSpec::new("/efi0", ["/mnt/blob"], Vec::<String>::new())];
        let p = problems(&list, &fs);
        assert!(p.iter().any(|m| m.contains("not the same type")), "{p:?}");
    }

    #[test]
    fn all_problems_are_reported_together() {
        let fs = two_volumes();
        let list = vec![
            SyncSpec::new("/missing", ["/efi1"], Vec::<String>::new()),
            SyncSpec::new("/efi0", ["/nowhere"], Vec::<String>::new()),
        ];
        let p = problems(&list, &fs);
        assert!(p.iter().any(|m| m.contains("source /missing does not exist")));
        assert!(p.iter().any(|m| m.contains("destination /nowhere does not exist")));
    }
}
