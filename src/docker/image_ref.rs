use crate::docker::models::DockerImage;
use std::collections::HashMap;

/// A parsed image reference plus the canonical string used for engine lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageRef {
    pub repo: String,
    pub tag: String,
    pub digest: String,
    pub lookup: String,
}

/// Split a `repo[:tag][@digest]` reference, stripping configured registry
/// prefixes first. `lookup` reassembles the preferred engine-facing form;
/// when everything parses away, the original input is kept.
pub fn normalize_image_ref(reference: &str, ignored_prefixes: &[String]) -> ImageRef {
    let mut stripped = reference;
    for prefix in ignored_prefixes {
        if !prefix.is_empty() {
            if let Some(rest) = stripped.strip_prefix(prefix.as_str()) {
                stripped = rest;
            }
        }
    }

    let (repo_part, digest) = match stripped.split_once('@') {
        Some((repo, digest)) => (repo, digest),
        None => (stripped, ""),
    };
    let (repo, tag) = match repo_part.split_once(':') {
        Some((repo, tag)) => (repo, tag),
        None => (repo_part, ""),
    };

    let lookup = if !digest.is_empty() {
        format!("{repo}@{digest}")
    } else if !tag.is_empty() {
        format!("{repo}:{tag}")
    } else {
        repo.to_string()
    };
    let lookup = if lookup.is_empty() {
        reference.to_string()
    } else {
        lookup
    };

    ImageRef {
        repo: repo.to_string(),
        tag: tag.to_string(),
        digest: digest.to_string(),
        lookup,
    }
}

// Registry mirrors spell the same repo several ways; the well-known hub
// prefixes collapse onto the bare repo name.
fn bare_repo(parsed: &ImageRef) -> String {
    let mut repo = parsed.repo.as_str();
    if let Some(rest) = repo.strip_prefix("docker.io/") {
        repo = rest;
    }
    if let Some(rest) = repo.strip_prefix("library/") {
        repo = rest;
    }
    repo.to_string()
}

/// Candidate map keys for a reference, most specific first.
pub fn repo_candidates(reference: &str, ignored_prefixes: &[String]) -> Vec<String> {
    let parsed = normalize_image_ref(reference, ignored_prefixes);
    let repo = bare_repo(&parsed);
    let mut candidates = Vec::new();
    if !repo.is_empty() {
        if !parsed.tag.is_empty() && !parsed.digest.is_empty() {
            candidates.push(format!("{repo}:{}@{}", parsed.tag, parsed.digest));
        }
        if !parsed.digest.is_empty() {
            candidates.push(format!("{repo}@{}", parsed.digest));
        }
        if !parsed.tag.is_empty() {
            candidates.push(format!("{repo}:{}", parsed.tag));
        }
        candidates.push(repo);
    }
    if candidates.is_empty() {
        candidates.push(reference.to_string());
    }
    candidates
}

/// Find the local image an engine reference points at: exact key first, then
/// the candidate chain, then any key sharing the bare repo.
pub fn match_image_for_ref<'a>(
    image_map: &'a HashMap<String, DockerImage>,
    reference: &str,
    ignored_prefixes: &[String],
) -> Option<&'a DockerImage> {
    if let Some(image) = image_map.get(reference) {
        return Some(image);
    }
    for key in repo_candidates(reference, ignored_prefixes) {
        if let Some(image) = image_map.get(&key) {
            return Some(image);
        }
    }
    let parsed = normalize_image_ref(reference, ignored_prefixes);
    let repo = bare_repo(&parsed);
    if repo.is_empty() {
        return None;
    }
    let tagged = format!("{repo}:");
    let digested = format!("{repo}@");
    image_map
        .iter()
        .find(|(key, _)| key.starts_with(&tagged) || key.starts_with(&digested))
        .map(|(_, image)| image)
}

/// First non-empty value among the candidate label names.
pub fn first_label(labels: Option<&HashMap<String, String>>, candidates: &[String]) -> String {
    let Some(labels) = labels else {
        return String::new();
    };
    for candidate in candidates {
        if let Some(value) = labels.get(candidate) {
            if !value.is_empty() {
                return value.clone();
            }
        }
    }
    String::new()
}

/// Derive a homepage for an image: explicit label first, `ghcr.io` images
/// point at GitHub, everything else at Docker Hub.
pub fn homepage_url_for_image(
    image_ref: &str,
    labels: Option<&HashMap<String, String>>,
    homepage_labels: &[String],
) -> String {
    let labeled = first_label(labels, homepage_labels);
    if !labeled.is_empty() {
        return labeled;
    }
    if image_ref.is_empty() {
        return String::new();
    }
    let mut repo = image_ref;
    if let Some((head, _)) = repo.split_once('@') {
        repo = head;
    }
    if let Some((head, _)) = repo.split_once(':') {
        repo = head;
    }
    let repo = repo
        .strip_prefix("docker.io/")
        .unwrap_or(repo);
    let repo = repo.strip_prefix("library/").unwrap_or(repo);
    if let Some(rest) = repo.strip_prefix("ghcr.io/") {
        return format!("http://github.com/{rest}");
    }
    format!("http://hub.docker.com/r/{repo}")
}
