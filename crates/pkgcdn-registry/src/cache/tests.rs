//! Unit tests for the resolution cache

use super::*;
use crate::api::VersionsAndTags;
use std::collections::HashMap;

const MINUTE: Duration = Duration::from_secs(60);

fn create_test_versions() -> VersionsAndTags {
    VersionsAndTags {
        versions: vec!["1.0.0".to_string(), "1.1.0".to_string()],
        tags: HashMap::from([("latest".to_string(), "1.1.0".to_string())]),
    }
}

#[test]
fn test_set_and_get() {
    let cache = ResolutionCache::new(1024);
    let versions = create_test_versions();

    cache.set("versions-test-package", &versions, MINUTE).unwrap();

    assert_eq!(cache.get::<VersionsAndTags>("versions-test-package"), CacheLookup::Hit(versions));
}

#[test]
fn test_get_nonexistent() {
    let cache = ResolutionCache::new(1024);
    assert_eq!(cache.get::<VersionsAndTags>("versions-nonexistent"), CacheLookup::Miss);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_negative_entries() {
    let cache = ResolutionCache::new(1024);

    cache.set_negative("versions-missing", MINUTE);

    assert_eq!(cache.get::<VersionsAndTags>("versions-missing"), CacheLookup::Negative);
    assert_eq!(cache.stats().negative_hits, 1);
}

#[test]
fn test_positive_replaces_negative() {
    let cache = ResolutionCache::new(1024);

    cache.set_negative("config-pkg-1.0.0", MINUTE);
    cache.set("config-pkg-1.0.0", &"value", MINUTE).unwrap();

    assert_eq!(cache.get::<String>("config-pkg-1.0.0"), CacheLookup::Hit("value".to_string()));
    assert_eq!(cache.stats().total_entries, 1);
}

#[test]
fn test_entries_expire() {
    let cache = ResolutionCache::new(1024);

    cache.set("short", &1u32, Duration::from_millis(20)).unwrap();
    cache.set_negative("short-negative", Duration::from_millis(20));
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(cache.get::<u32>("short"), CacheLookup::Miss);
    assert_eq!(cache.get::<u32>("short-negative"), CacheLookup::Miss);
    assert_eq!(cache.stats().total_bytes, 0);
}

#[test]
fn test_capacity_is_bytes_not_entries() {
    // "k1" + "\"aaaa\"" = 8 bytes each
    let cache = ResolutionCache::new(20);

    cache.set("k1", &"aaaa", MINUTE).unwrap();
    cache.set("k2", &"aaaa", MINUTE).unwrap();
    assert_eq!(cache.stats().total_bytes, 16);

    cache.set("k3", &"aaaa", MINUTE).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.evictions, 1);
    assert!(stats.total_bytes <= 20);
    assert_eq!(cache.get::<String>("k1"), CacheLookup::Miss);
}

#[test]
fn test_lru_order_follows_reads() {
    let cache = ResolutionCache::new(20);

    cache.set("k1", &"aaaa", MINUTE).unwrap();
    cache.set("k2", &"aaaa", MINUTE).unwrap();

    // Touch k1 so k2 becomes the eviction candidate
    assert!(matches!(cache.get::<String>("k1"), CacheLookup::Hit(_)));
    cache.set("k3", &"aaaa", MINUTE).unwrap();

    assert!(matches!(cache.get::<String>("k1"), CacheLookup::Hit(_)));
    assert_eq!(cache.get::<String>("k2"), CacheLookup::Miss);
    assert!(matches!(cache.get::<String>("k3"), CacheLookup::Hit(_)));
}

#[test]
fn test_oversized_values_are_not_stored() {
    let cache = ResolutionCache::new(8);

    cache.set("key", &"a value that is far too large", MINUTE).unwrap();

    assert_eq!(cache.get::<String>("key"), CacheLookup::Miss);
    assert_eq!(cache.stats().total_bytes, 0);
}

#[test]
fn test_type_mismatch_is_a_miss() {
    let cache = ResolutionCache::new(1024);

    cache.set("key", &"not a number", MINUTE).unwrap();

    assert_eq!(cache.get::<u64>("key"), CacheLookup::Miss);
    assert_eq!(cache.stats().total_entries, 0);
}

#[test]
fn test_cleanup_drops_only_stale_entries() {
    let cache = ResolutionCache::new(1024);

    cache.set("stale", &1u8, Duration::from_millis(10)).unwrap();
    cache.set("fresh", &2u8, MINUTE).unwrap();
    std::thread::sleep(Duration::from_millis(30));

    let stats = cache.stats();
    assert_eq!(stats.fresh_entries, 1);
    assert_eq!(stats.stale_entries, 1);

    assert_eq!(cache.cleanup(), 1);
    let stats = cache.stats();
    assert_eq!(stats.total_entries, 1);
    // "fresh" + "2"
    assert_eq!(stats.total_bytes, 6);
    assert_eq!(cache.get::<u8>("fresh"), CacheLookup::Hit(2));

    assert_eq!(cache.cleanup(), 0);
}
