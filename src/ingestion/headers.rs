use std::collections::HashSet;

/// Make header names usable as Parquet column names.
///
/// Names are kept as written, surrounding whitespace included. Empty or whitespace-only names
/// become `Unnamed: <index>`; repeated names get `.1`, `.2`, ... suffixes in order of
/// appearance, skipping suffixes that would collide with a later literal name.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let named: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            }
        })
        .collect();

    let literal: HashSet<&str> = named.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(named.len());
    let mut out = Vec::with_capacity(named.len());
    for name in &named {
        if used.insert(name.clone()) {
            out.push(name.clone());
            continue;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{name}.{n}");
            if !literal.contains(candidate.as_str()) && used.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }
    out
}
