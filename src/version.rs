use std::path::Path;

use chrono::DateTime;
use git2::{DescribeFormatOptions, DescribeOptions, Repository};
use log::{debug, warn};

const SEMVER_TAG_PATTERN: &str = "v[0-9]*.[0-9]*.[0-9]*";
const UNTAGGED_VERSION: &str = "v0.0.0";
const PSEUDO_VERSION_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const PSEUDO_VERSION_HASH_LENGTH: usize = 12;

/// Version of the sources checked out in a directory, from its git history.
///
/// A checkout of a semver tag is that tag. Anything else is a Go style
/// pseudo-version `<tag>-<commit time>-<commit hash prefix>` based on the
/// closest tag, or on `v0.0.0` when there is none. Returns `None` when the
/// directory is not in a git repository.
pub fn source_version(dir: &Path) -> Option<String> {
    match describe(dir) {
        Ok(version) => {
            debug!("Version of {} is {}", dir.display(), version);
            Some(version)
        }
        Err(error) => {
            warn!(
                "Could not derive a version for {} from git: {}",
                dir.display(),
                error.message()
            );
            None
        }
    }
}

fn describe(dir: &Path) -> Result<String, git2::Error> {
    let repository = Repository::discover(dir)?;
    let head = repository.head()?.peel_to_commit()?;
    let tag = closest_tag(&repository);

    let mut revwalk = repository.revwalk()?;
    revwalk.push(head.id())?;
    if let Some(tag) = &tag {
        let tagged = repository.revparse_single(tag)?.peel_to_commit()?;
        revwalk.hide(tagged.id())?;
    }
    let commits_since_tag = revwalk.count();

    let tag = tag.unwrap_or_else(|| UNTAGGED_VERSION.to_string());
    if commits_since_tag == 0 {
        return Ok(tag);
    }

    let time = DateTime::from_timestamp(head.time().seconds(), 0)
        .ok_or_else(|| git2::Error::from_str("commit time out of range"))?;
    let hash = head.id().to_string();
    let short_hash = hash.get(..PSEUDO_VERSION_HASH_LENGTH).unwrap_or(hash.as_str());
    Ok(format!(
        "{}-{}-{}",
        tag,
        time.format(PSEUDO_VERSION_TIME_FORMAT),
        short_hash
    ))
}

fn closest_tag(repository: &Repository) -> Option<String> {
    let mut options = DescribeOptions::new();
    options.describe_tags().pattern(SEMVER_TAG_PATTERN);
    let description = repository.describe(&options).ok()?;

    let mut format = DescribeFormatOptions::new();
    format.abbreviated_size(0);
    description.format(Some(&format)).ok()
}

#[cfg(test)]
mod tests {
    use git2::{Commit, Oid, Signature, Time};

    use super::*;

    use pretty_assertions::assert_eq;

    const COMMIT_TIME: i64 = 1_700_000_000;

    fn commit(repository: &Repository, message: &str, time: i64) -> Oid {
        let signature = Signature::new("Tester", "tester@example.com", &Time::new(time, 0)).unwrap();
        let tree_id = repository.index().unwrap().write_tree().unwrap();
        let tree = repository.find_tree(tree_id).unwrap();
        let parent = repository
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents = parent.iter().collect::<Vec<&Commit>>();
        repository
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }

    fn tag(repository: &Repository, name: &str, commit: Oid) {
        let object = repository.find_object(commit, None).unwrap();
        repository.tag_lightweight(name, &object, false).unwrap();
    }

    #[test]
    fn tagged_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::init(dir.path()).unwrap();
        let first = commit(&repository, "first", COMMIT_TIME);
        tag(&repository, "v1.2.3", first);

        assert_eq!(source_version(dir.path()), Some("v1.2.3".to_string()));
    }

    #[test]
    fn commits_after_tag() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::init(dir.path()).unwrap();
        let first = commit(&repository, "first", COMMIT_TIME - 60);
        tag(&repository, "v1.2.3", first);
        tag(&repository, "not-a-version", first);
        let second = commit(&repository, "second", COMMIT_TIME);

        let expected = format!("v1.2.3-20231114221320-{}", &second.to_string()[..12]);
        assert_eq!(source_version(dir.path()), Some(expected));
    }

    #[test]
    fn untagged() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::init(dir.path()).unwrap();
        let head = commit(&repository, "first", COMMIT_TIME);

        let expected = format!("v0.0.0-20231114221320-{}", &head.to_string()[..12]);
        assert_eq!(source_version(dir.path()), Some(expected));
    }

    #[test]
    fn subdirectory_of_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Repository::init(dir.path()).unwrap();
        let first = commit(&repository, "first", COMMIT_TIME);
        tag(&repository, "v0.4.0", first);
        std::fs::create_dir_all(dir.path().join("nested/module")).unwrap();

        assert_eq!(
            source_version(&dir.path().join("nested/module")),
            Some("v0.4.0".to_string())
        );
    }

    #[test]
    fn not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("plain");
        std::fs::create_dir_all(&nested).unwrap();
        if Repository::discover(&nested).is_err() {
            assert_eq!(source_version(&nested), None);
        }
    }
}
