mod common;

use adaptive_qf::{Filter, FilterConfigBuilder, FilterError, HashMode, Insert, OpFlags};
use common::test_utils::{compose, distinct_fingerprints, random_hashes};
use std::collections::HashMap;

fn create_test_filter(qbits: u8, rbits: u8) -> Filter {
    Filter::new(qbits, rbits).expect("Failed to create test filter")
}

#[cfg(test)]
mod basic_operations_tests {
    use super::*;

    #[test]
    fn test_insert_query_duplicate_and_extend() {
        let mut filter = create_test_filter(8, 7);
        let flags = OpFlags::hashed();

        let h1 = 1u64;
        let Insert::Inserted { slot, .. } = filter.insert(h1, 1, flags).unwrap() else {
            panic!("first insert must store the key");
        };
        assert!(filter.contains(h1, flags));
        assert!(!filter.contains(2, flags));

        let Insert::DuplicateOrCollision(found) = filter.insert(h1, 1, flags).unwrap() else {
            panic!("reinsert must be reported");
        };
        assert_eq!(found.slot, slot);
        assert_eq!(filter.len(), 1);

        let h3 = h1 + (1 << 15);
        let Insert::DuplicateOrCollision(found) = filter.insert(h3, 1, flags).unwrap() else {
            panic!("same quotient and remainder must collide");
        };
        let ext = filter.extend(found.slot, h3, h1, flags).unwrap();
        assert!(ext.length > 7);

        let a = filter.query(h1, flags).unwrap();
        let b = filter.query(h3, flags).unwrap();
        assert_ne!(a.slot, b.slot);
        assert_ne!(a.remainder, b.remainder);
        filter.verify().unwrap();
    }

    #[test]
    fn test_empty_filter_reports_absent() {
        let filter = create_test_filter(10, 8);
        for hash in random_hashes(100, 1) {
            assert!(!filter.contains(hash, OpFlags::hashed()));
            assert_eq!(filter.count(hash, OpFlags::hashed()), 0);
        }
        assert!(filter.is_empty());
        assert_eq!(filter.entries().count(), 0);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut filter = create_test_filter(8, 8);
        filter.insert(7, 1, OpFlags::hashed()).unwrap();
        assert!(filter.remove(8, OpFlags::hashed()).unwrap().is_none());
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut filter = create_test_filter(8, 8);
        assert!(matches!(
            filter.insert(1, 0, OpFlags::hashed()),
            Err(FilterError::InvalidArgument(_))
        ));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_string_items() {
        let mut filter = create_test_filter(10, 10);
        for i in 0..200 {
            filter.insert_item(format!("item_{i:04}").as_bytes()).unwrap();
        }
        for i in 0..200 {
            assert!(filter.contains_item(format!("item_{i:04}").as_bytes()));
        }
        assert!(filter.remove_item(b"item_0000").unwrap());
        assert!(!filter.remove_item(b"never_inserted_item").unwrap());
        filter.verify().unwrap();
    }
}

#[cfg(test)]
mod no_false_negative_tests {
    use super::*;

    #[test]
    fn test_random_inserts_are_all_found() {
        let mut filter = create_test_filter(12, 9);
        let flags = OpFlags::hashed();
        let hashes = random_hashes(3000, 42);
        for &hash in &hashes {
            filter.insert(hash, 1, flags).unwrap();
        }
        for &hash in &hashes {
            assert!(filter.contains(hash, flags), "missing hash {hash:#x}");
        }
        filter.verify().unwrap();
    }

    #[test]
    fn test_every_hash_mode_finds_its_keys() {
        for mode in [HashMode::Murmur3, HashMode::Fnv, HashMode::Invertible] {
            let config = FilterConfigBuilder::default()
                .qbits(10)
                .rbits(8)
                .hash_mode(mode)
                .seed(7)
                .build()
                .unwrap();
            let mut filter = Filter::create(config).unwrap();
            for key in 0..500u64 {
                filter.insert(key, 1, OpFlags::default()).unwrap();
            }
            for key in 0..500u64 {
                assert!(filter.contains(key, OpFlags::default()), "{mode:?} lost {key}");
            }
        }
    }

    #[test]
    fn test_interleaved_removes_keep_the_rest() {
        let mut filter = create_test_filter(10, 10);
        let flags = OpFlags::hashed();
        let hashes = distinct_fingerprints(800, 9, 20);
        for &hash in &hashes {
            filter.insert(hash, 1, flags).unwrap();
        }
        for &hash in hashes.iter().step_by(2) {
            assert!(filter.remove(hash, flags).unwrap().is_some());
        }
        for &hash in hashes.iter().skip(1).step_by(2) {
            assert!(filter.contains(hash, flags));
        }
        filter.verify().unwrap();
        assert_eq!(filter.len(), 400);
    }
}

#[cfg(test)]
mod run_layout_tests {
    use super::*;

    #[test]
    fn test_dense_quotient_spills_across_blocks() {
        let mut filter = create_test_filter(8, 8);
        let flags = OpFlags::hashed();
        // 100 entries in one run push every later run out of block 0.
        for remainder in 0..100u64 {
            filter.insert(compose(8, 8, 3, remainder, 0), 1, flags).unwrap();
        }
        for quotient in [4u64, 63, 64, 65, 130] {
            filter.insert(compose(8, 8, quotient, 1, 0), 1, flags).unwrap();
        }
        filter.verify().unwrap();
        for remainder in 0..100u64 {
            assert!(filter.contains(compose(8, 8, 3, remainder, 0), flags));
        }
        for quotient in [4u64, 63, 64, 65, 130] {
            let found = filter.query(compose(8, 8, quotient, 1, 0), flags).unwrap();
            assert_eq!(found.quotient, quotient as usize);
        }
        assert!(!filter.contains(compose(8, 8, 5, 1, 0), flags));

        for remainder in 0..100u64 {
            filter.remove(compose(8, 8, 3, remainder, 0), flags).unwrap();
        }
        filter.verify().unwrap();
        let homes: Vec<(usize, usize)> = filter.entries().map(|m| (m.quotient, m.slot)).collect();
        assert_eq!(homes, vec![(4, 4), (63, 63), (64, 64), (65, 65), (130, 130)]);
    }

    #[test]
    fn test_entries_are_ordered_within_runs() {
        let mut filter = create_test_filter(6, 8);
        let flags = OpFlags::hashed();
        for remainder in [200u64, 5, 90, 17, 255, 0] {
            filter.insert(compose(6, 8, 2, remainder, 0), 1, flags).unwrap();
        }
        let remainders: Vec<u64> = filter.entries().map(|m| m.remainder).collect();
        assert_eq!(remainders, vec![0, 5, 17, 90, 200, 255]);
    }

    #[test]
    fn test_full_filter_reports_no_space() {
        let mut filter = create_test_filter(4, 8);
        let flags = OpFlags::hashed();
        let total = filter.total_slots();
        let mut stored = 0;
        let mut result = Ok(());
        for (i, hash) in random_hashes(total * 2, 3).into_iter().enumerate() {
            match filter.insert(hash, 1, flags) {
                Ok(Insert::Inserted { .. }) => stored += 1,
                Ok(Insert::DuplicateOrCollision(_)) => {}
                Err(e) => {
                    result = Err((i, e));
                    break;
                }
            }
        }
        assert!(matches!(result, Err((_, FilterError::NoSpace))));
        assert!(stored <= total);
        filter.verify().unwrap();
    }
}

#[cfg(test)]
mod counting_tests {
    use super::*;

    #[test]
    fn test_counts_follow_inserts_and_removes() {
        let mut filter = create_test_filter(10, 9);
        let flags = OpFlags::hashed();
        let mut expected = HashMap::new();
        for (i, hash) in random_hashes(50, 11).into_iter().enumerate() {
            let copies = (i % 4 + 1) as u64;
            if let Insert::Inserted { count, .. } = filter.insert(hash, copies, flags).unwrap() {
                assert_eq!(count, copies);
                expected.insert(hash, copies);
            }
        }
        for (&hash, &copies) in &expected {
            assert!(filter.count(hash, flags) >= copies);
        }
        assert_eq!(filter.len() as u64, expected.values().sum::<u64>());

        let (&hash, &copies) = expected.iter().max_by_key(|(_, c)| **c).unwrap();
        filter.remove(hash, flags).unwrap();
        assert_eq!(filter.count(hash, flags), copies - 1);
        filter.verify().unwrap();
    }
}
