mod common;

use adaptive_qf::{Backing, Filter, FilterConfig, FilterConfigBuilder, FilterError};
use common::test_utils::TestFile;

fn build(builder: FilterConfigBuilder) -> FilterConfig {
    builder.build().expect("Failed to build config")
}

#[cfg(test)]
mod width_validation_tests {
    use super::*;

    #[test]
    fn test_zero_qbits_fails() {
        let config = build(FilterConfigBuilder::default().qbits(0));
        match config.validate().unwrap_err() {
            FilterError::InvalidConfig(msg) => {
                assert!(msg.contains("Quotient bits must be greater than 0"));
            }
            e => panic!("Unexpected error: {e:?}"),
        }
    }

    #[test]
    fn test_zero_rbits_fails() {
        let config = build(FilterConfigBuilder::default().rbits(0));
        match config.validate().unwrap_err() {
            FilterError::InvalidConfig(msg) => {
                assert!(msg.contains("Remainder bits must be greater than 0"));
            }
            e => panic!("Unexpected error: {e:?}"),
        }
    }

    #[test]
    fn test_widths_beyond_hash_fail() {
        let config = build(FilterConfigBuilder::default().qbits(33).rbits(32));
        assert!(matches!(
            config.validate(),
            Err(FilterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_qbits_over_limit_fails() {
        let config = build(FilterConfigBuilder::default().qbits(41).rbits(4));
        match config.validate().unwrap_err() {
            FilterError::InvalidConfig(msg) => assert!(msg.contains("at most 40")),
            e => panic!("Unexpected error: {e:?}"),
        }
    }

    #[test]
    fn test_boundary_widths_pass() {
        for (qbits, rbits) in [(1, 1), (1, 63), (40, 24), (8, 56)] {
            let config = build(FilterConfigBuilder::default().qbits(qbits).rbits(rbits));
            assert!(
                config.validate().is_ok(),
                "qbits={qbits} rbits={rbits} should be valid"
            );
        }
    }
}

#[cfg(test)]
mod setting_validation_tests {
    use super::*;

    #[test]
    fn test_load_factor_range() {
        for factor in [0.0, -0.5, 1.01, f64::NAN] {
            let config = build(FilterConfigBuilder::default().resize_load_factor(factor));
            assert!(config.validate().is_err(), "factor {factor} accepted");
        }
        for factor in [0.5, 1.0] {
            let config = build(FilterConfigBuilder::default().resize_load_factor(factor));
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_create_validates_first() {
        let file = TestFile::new("create_validates_first");
        let config = build(
            FilterConfigBuilder::default()
                .qbits(0)
                .backing(Backing::File(file.path())),
        );
        assert!(matches!(
            Filter::create(config),
            Err(FilterError::InvalidConfig(_))
        ));
        assert!(!file.path().exists());
    }

    #[test]
    fn test_extension_cap_defaults_to_hash_width() {
        let filter = Filter::new(10, 6).unwrap();
        assert_eq!(filter.max_extension_chunks(), (64 - 16) / 6);

        let config = build(
            FilterConfigBuilder::default()
                .qbits(10)
                .rbits(6)
                .max_extension_chunks(Some(2)),
        );
        let filter = Filter::create(config).unwrap();
        assert_eq!(filter.max_extension_chunks(), 2);
    }

    #[test]
    fn test_small_filter_geometry() {
        let filter = Filter::new(8, 7).unwrap();
        assert_eq!(filter.total_slots(), 448);
        assert_eq!(filter.key_bits(), 15);
        assert!(filter.is_empty());
    }
}
