// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bootstrap and teardown of the process-wide registry
//!
//! Every test touches the global registry, so they run one at a time.

use std::io::Write;

use conngen::config::{load_config_str, ConnGenConfig};
use conngen::prelude::*;
use conngen::protocol::registry::{self, ProviderLibrary};
use conngen::runtime::{bootstrap, shutdown};
use parking_lot::Mutex;

static GLOBAL_LOCK: Mutex<()> = parking_lot::const_mutex(());

const TABLE: &str = "\
0 0 0.1
0 1 0.2
1 0 0.3
1 1 0.4
2 0 0.5
2 1 0.6
";

#[cfg(feature = "builtin-engine")]
#[test]
fn test_bootstrap_registers_builtin_engine() {
    let _serial = GLOBAL_LOCK.lock();
    shutdown();

    let registry = bootstrap(&ConnGenConfig::default()).unwrap();
    assert_eq!(registry.library_names(), vec!["linktable"]);

    let handle = registry.parse_text(None, TABLE).unwrap();
    let mut gen = ConnectionGenerator::new(handle);
    let scheme = PartitionScheme::blocks(2, 3, 2).unwrap();
    scheme.verify(3, 2).unwrap();

    let mut per_partition = Vec::new();
    for local in 0..scheme.len() {
        gen.set_masks(scheme.masks(), local).unwrap();
        let sources: Vec<Index> = gen.links().unwrap().map(|l| l.unwrap().source).collect();
        per_partition.push(sources);
    }
    // Blocks of 2 and 1 sources
    assert_eq!(per_partition, vec![vec![0, 0, 1, 1], vec![2, 2]]);

    assert!(shutdown());
    assert!(matches!(
        registry::global(),
        Err(ConnGenError::ProviderUnavailable(_))
    ));
}

#[test]
fn test_bootstrap_is_init_once() {
    let _serial = GLOBAL_LOCK.lock();
    shutdown();

    let first = bootstrap(&ConnGenConfig::default()).unwrap();
    let mut other = ConnGenConfig::default();
    other.provider.file_mode = "reject".to_string();
    let second = bootstrap(&other).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    shutdown();
}

#[test]
fn test_invalid_config_installs_nothing() {
    let _serial = GLOBAL_LOCK.lock();
    shutdown();

    let mut config = ConnGenConfig::default();
    config.logging.format = "xml".to_string();
    assert!(bootstrap(&config).is_err());
    assert!(registry::global().is_err());
}

#[test]
fn test_file_mode_from_config() {
    let _serial = GLOBAL_LOCK.lock();
    shutdown();

    let config = load_config_str(
        "[provider]\ndefault_library = \"echo\"\nfile_mode = \"pass_path\"\n",
        None,
    )
    .unwrap();
    let registry = bootstrap(&config).unwrap();
    // Text-only library: the file path itself is handed to the parser
    registry.register_library(ProviderLibrary::new("echo").with_text_parser(|text| {
        if text.ends_with(".conn") {
            conngen_engine::parse_table("0 0 1.0\n").map(ProviderHandle::new)
        } else {
            Err(ConnGenError::Provider(format!("unexpected input '{}'", text)))
        }
    }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.conn");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(TABLE.as_bytes()).unwrap();

    let handle = registry.parse_file(None, &path).unwrap();
    assert_eq!(ConnectionGenerator::new(handle).size().unwrap(), 1);

    // The link-table library has its own file parser
    #[cfg(feature = "builtin-engine")]
    {
        let handle = registry.parse_file(Some("linktable"), &path).unwrap();
        assert_eq!(ConnectionGenerator::new(handle).size().unwrap(), 6);
    }
    shutdown();
}
