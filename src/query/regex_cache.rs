//! Thread-local cache of compiled `#match?` regexes.
//!
//! Queries built repeatedly from the same source (one per file in a batch
//! run, say) compile the same expressions over and over. Entries are keyed
//! by the xxh3 hash of the pattern; the pattern text is kept alongside so a
//! hash collision falls through to a fresh compile. When the cache reaches
//! its capacity it is cleared and rebuilt on demand.

use regex::bytes::Regex;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_CAPACITY: usize = 256;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<u64, (String, Regex)>> = RefCell::new(HashMap::new());
    static CAPACITY: Cell<usize> = const { Cell::new(DEFAULT_CAPACITY) };
}

/// Get a compiled regex from the cache, or compile and cache it.
pub fn get_or_compile(pattern: &str) -> Result<Regex, regex::Error> {
    let key = xxh3_64(pattern.as_bytes());

    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some((cached, regex)) = cache.get(&key) {
            if cached == pattern {
                return Ok(regex.clone());
            }
        }

        let compiled = Regex::new(pattern)?;

        let capacity = CAPACITY.with(Cell::get);
        if capacity == 0 {
            return Ok(compiled);
        }
        if cache.len() >= capacity {
            cache.clear();
        }
        cache.insert(key, (pattern.to_string(), compiled.clone()));
        Ok(compiled)
    })
}

/// Set this thread's capacity. Zero disables caching.
pub fn set_capacity(capacity: usize) {
    CAPACITY.with(|cell| cell.set(capacity));
    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() > capacity {
            cache.clear();
        }
    });
}

pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_reuse_the_compiled_regex() {
        clear_cache();
        let first = get_or_compile("^[a-z]+$").unwrap();
        let second = get_or_compile("^[a-z]+$").unwrap();
        assert_eq!(cache_size(), 1);
        assert_eq!(first.as_str(), second.as_str());
        assert!(second.is_match(b"abc"));
    }

    #[test]
    fn invalid_patterns_are_not_cached() {
        clear_cache();
        assert!(get_or_compile("(unclosed").is_err());
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn cache_clears_at_capacity() {
        clear_cache();
        set_capacity(2);
        get_or_compile("a").unwrap();
        get_or_compile("b").unwrap();
        assert_eq!(cache_size(), 2);
        get_or_compile("c").unwrap();
        assert_eq!(cache_size(), 1);

        set_capacity(0);
        get_or_compile("d").unwrap();
        assert_eq!(cache_size(), 0);
        set_capacity(DEFAULT_CAPACITY);
    }
}
