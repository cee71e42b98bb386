use crate::config::MissingTermPolicy;
use crate::index::InvertedIndex;
use crate::normalizer::Normalizer;
use crate::DocId;

/// Implicit-AND query: normalizes `text` and intersects the postings of every
/// resulting term. Returns ascending ids; no terms means no results.
pub fn conjunctive_query(index: &InvertedIndex, normalizer: &Normalizer, text: &str, missing: MissingTermPolicy) -> Vec<DocId> {
    let terms = normalizer.normalize(text);
    let mut lists: Vec<&[DocId]> = Vec::with_capacity(terms.len());
    for term in &terms {
        match index.postings(term) {
            Some(postings) => lists.push(postings),
            None if missing == MissingTermPolicy::Empty => {
                tracing::debug!(term = term.as_str(), "query term not indexed");
                return Vec::new();
            }
            None => {}
        }
    }
    // Shortest list first keeps the running intersection small.
    lists.sort_by_key(|l| l.len());
    let mut iter = lists.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    iter.fold(first.to_vec(), |acc, list| intersect(&acc, list))
}

/// Merge-intersection of two ascending lists.
fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
