use std::collections::HashMap;
use std::hash::Hash;

/// Keep at most `max_per_key` items per key, walking `items` in order.
/// Survivors keep their relative order.
pub fn cap_per_key<T, K, F>(items: Vec<T>, max_per_key: usize, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: HashMap<K, usize> = HashMap::new();
    items
        .into_iter()
        .filter(|item| {
            let count = seen.entry(key(item)).or_insert(0);
            *count += 1;
            *count <= max_per_key
        })
        .collect()
}
