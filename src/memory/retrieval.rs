use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMemory {
    pub memory_id: i64,
    pub content: String,
    pub created_at: i64,
}

pub fn query_terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.chars().count() > 1)
        .map(|term| term.to_lowercase())
        .collect()
}

/// Number of distinct query terms that occur in `content`.
pub fn lexical_score(terms: &BTreeSet<String>, content: &str) -> usize {
    let content_terms = query_terms(content);
    terms.intersection(&content_terms).count()
}

/// Highest term overlap first, newest first on ties. Entries sharing no term
/// with the query are dropped.
pub fn rank_memories(query: &str, memories: Vec<StoredMemory>, k: usize) -> Vec<StoredMemory> {
    let terms = query_terms(query);
    if terms.is_empty() || k == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, StoredMemory)> = memories
        .into_iter()
        .map(|memory| (lexical_score(&terms, &memory.content), memory))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.created_at.cmp(&a.1.created_at))
            .then_with(|| b.1.memory_id.cmp(&a.1.memory_id))
    });
    scored.truncate(k);
    scored.into_iter().map(|(_, memory)| memory).collect()
}
