//! Canonical page naming for rasteriser output.
//!
//! `pdftoppm` names its output after the page number but pads it to the
//! width of the page count (`page-1.png` for a 9-page PDF, `page-01.png` for
//! a 10-page one, `page-001.png` beyond 99), and other rasterisers add
//! their own prefixes or suffixes. The OCR stage and the final `png/`
//! directory want plain `1.png`, `2.png`, … instead.
//!
//! [`plan_canonical_names`] is a pure function from a directory listing to a
//! rename plan, so it can be tested against recorded listings without
//! running any external program.
//!
//! ## Mapping
//!
//! 1. Every `.png` name (case-insensitive) is keyed by the **last** run of
//!    ASCII digits in its stem; names without digits get no key.
//! 2. Images are ordered by `(key, name)`, keyless ones last.
//! 3. The i-th image in that order becomes `{i}.png`, starting at 1.
//!
//! The result is dense (`1..=N`, no gaps), deterministic, and total: every
//! image in the listing gets exactly one canonical name.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_LAST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\D*$").unwrap());

/// One entry of a rename plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRename {
    /// Name the rasteriser emitted.
    pub from: String,
    /// 1-based canonical page number.
    pub page: usize,
}

impl PageRename {
    /// Canonical file name, e.g. `3.png`.
    pub fn to_name(&self) -> String {
        canonical_name(self.page)
    }

    /// Whether the file already carries its canonical name.
    pub fn is_identity(&self) -> bool {
        self.from == self.to_name()
    }
}

/// Canonical file name for a 1-based page number.
pub fn canonical_name(page: usize) -> String {
    format!("{page}.png")
}

/// Page number encoded in a file name, if any.
///
/// ```
/// use pdf2rmd::pipeline::naming::page_key;
///
/// assert_eq!(page_key("page-007.png"), Some(7));
/// assert_eq!(page_key("scan_v2-12.png"), Some(12));
/// assert_eq!(page_key("cover.png"), None);
/// ```
pub fn page_key(name: &str) -> Option<u64> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    RE_LAST_NUMBER
        .captures(stem)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}

/// Whether `name` looks like a PNG image.
pub fn is_png(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("png"))
}

/// Build the rename plan for a directory listing.
///
/// Non-PNG names are ignored. The plan is returned in page order.
pub fn plan_canonical_names<S: AsRef<str>>(listing: &[S]) -> Vec<PageRename> {
    let mut images: Vec<(Option<u64>, &str)> = listing
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| is_png(name))
        .map(|name| (page_key(name), name))
        .collect();

    images.sort_by(|(ka, na), (kb, nb)| match (ka, kb) {
        (Some(a), Some(b)) => a.cmp(b).then_with(|| na.cmp(nb)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => na.cmp(nb),
    });
    images.dedup_by(|(_, a), (_, b)| a == b);

    images
        .into_iter()
        .enumerate()
        .map(|(i, (_, name))| PageRename {
            from: name.to_string(),
            page: i + 1,
        })
        .collect()
}

/// Whether applying `plan` in one pass could overwrite a file that has not
/// been renamed yet, i.e. some target equals a different source name.
pub fn needs_two_phase(plan: &[PageRename]) -> bool {
    let sources: HashSet<&str> = plan.iter().map(|r| r.from.as_str()).collect();
    plan.iter()
        .any(|r| !r.is_identity() && sources.contains(r.to_name().as_str()))
}
