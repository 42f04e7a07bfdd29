use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use distpatch_diff::{Classification, Classifier, DiffConfig, DiffReport, DistributionTree};
use distpatch_scan::{ArchiveEntry, DistError, TreeBuilder, ZipDistribution};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn build(config: &DiffConfig, root: &str, files: &[(&str, &str)], dirs: &[&str]) -> DistributionTree {
    let mut entries: Vec<Result<ArchiveEntry, DistError>> = Vec::new();
    for dir in dirs {
        entries.push(Ok(ArchiveEntry::directory(format!("{root}/{dir}/"))));
    }
    for (file, contents) in files {
        entries.push(Ok(ArchiveEntry::file(
            format!("{root}/{file}"),
            contents.as_bytes().to_vec(),
        )));
    }
    TreeBuilder::new(config.clone()).build(entries).unwrap()
}

fn plain_config() -> DiffConfig {
    DiffConfig::builder()
        .features_root(None::<String>)
        .build()
        .unwrap()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn assert_disjoint(c: &Classification) {
    for path in &c.modified {
        assert!(!c.removed_files.contains(path), "{path} modified and removed");
        assert!(!c.removed_directories.contains(path), "{path} modified and removed");
        assert!(!c.added.contains(path), "{path} modified and added");
        assert!(!c.is_removed(path), "{path} modified below a removed directory");
    }
}

#[test]
fn test_identity() {
    let config = plain_config();
    let files = [
        ("bin/run.sh", "run"),
        ("repository/conf/carbon.xml", "<Server/>"),
        ("repository/components/plugins/a.jar", "a"),
    ];
    let previous = build(&config, "p-1.0", &files, &["bin", "repository/logs"]);
    let updated = build(&config, "p-1.1", &files, &["bin", "repository/logs"]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert!(result.is_empty());
}

#[test]
fn test_disjointness() {
    let config = plain_config();
    let previous = build(
        &config,
        "p",
        &[("a.txt", "1"), ("b.txt", "1"), ("lib/c.jar", "1"), ("dir/x", "1")],
        &[],
    );
    let updated = build(
        &config,
        "p",
        &[("a.txt", "2"), ("lib/d.jar", "1"), ("dir/x/y", "1"), ("e.txt", "1")],
        &[],
    );

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_disjoint(&result);
    assert_eq!(result.modified, set(&["a.txt"]));
    assert_eq!(result.removed_files, set(&["b.txt", "dir/x", "lib/c.jar"]));
    assert_eq!(result.added, set(&["dir/x/y", "e.txt", "lib/d.jar"]));
}

#[test]
fn test_completeness() {
    let config = plain_config();
    let previous = build(
        &config,
        "p",
        &[
            ("lib/a.jar", "a"),
            ("lib/b.jar", "b"),
            ("lib/sub/c.jar", "c"),
            ("plugins/x.jar", "x"),
            ("plugins/y.jar", "y"),
            ("keep.txt", "k"),
        ],
        &[],
    );
    let updated = build(&config, "p", &[("lib/a.jar", "a"), ("keep.txt", "k")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);

    for missing in ["lib/b.jar", "lib/sub/c.jar", "plugins/x.jar", "plugins/y.jar"] {
        assert!(result.is_removed(missing), "{missing} not covered");
    }
    assert_eq!(result.removed_files, set(&["lib/b.jar"]));
    assert_eq!(result.removed_directories, set(&["lib/sub", "plugins"]));
}

#[test]
fn test_directory_collapse() {
    let config = plain_config();
    let previous = build(
        &config,
        "p",
        &[("pluginDir/a.jar", "a"), ("pluginDir/b.jar", "b"), ("other.txt", "o")],
        &["pluginDir"],
    );
    let updated = build(&config, "p", &[("other.txt", "o")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.removed_directories, set(&["pluginDir"]));
    assert!(result.removed_files.is_empty());
}

#[test]
fn test_directory_collapse_without_directory_entries() {
    // Same archive shape, but the directory is only implied by file paths.
    let config = plain_config();
    let previous = build(
        &config,
        "p",
        &[("pluginDir/a.jar", "a"), ("pluginDir/b.jar", "b")],
        &[],
    );
    let updated = build(&config, "p", &[("other.txt", "o")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.removed_directories, set(&["pluginDir"]));
    assert!(result.removed_files.is_empty());
}

#[test]
fn test_segment_aware_ancestors() {
    let config = plain_config();
    let previous = build(&config, "p", &[("lib/a/x.jar", "x"), ("lib/ab.jar", "ab")], &[]);
    let updated = build(&config, "p", &[("lib/keep.jar", "k")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.removed_directories, set(&["lib/a"]));
    assert_eq!(result.removed_files, set(&["lib/ab.jar"]));
}

#[test]
fn test_modification_detection() {
    let config = plain_config();
    let previous = build(&config, "p", &[("conf/a.xml", "one"), ("conf/b.xml", "same")], &[]);
    let updated = build(&config, "p", &[("conf/a.xml", "two"), ("conf/b.xml", "same")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.modified, set(&["conf/a.xml"]));
    assert!(result.removed_files.is_empty());
    assert!(result.added.is_empty());
}

#[test]
fn test_addition_detection() {
    let config = plain_config();
    let previous = build(&config, "p", &[("a.txt", "a")], &[]);
    let updated = build(&config, "p", &[("a.txt", "a"), ("new/dir/b.txt", "b")], &["new"]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.added, set(&["new/dir/b.txt"]));
    assert_eq!(result.total_changes(), 1);
}

#[test]
fn test_order_independence() {
    let config = plain_config();
    let previous = build(&config, "p", &[("x/1", "1"), ("y/2", "2"), ("z", "3")], &["x"]);

    let forward = build(&config, "p", &[("x/1", "9"), ("w", "4")], &["x"]);
    let mut entries: Vec<Result<ArchiveEntry, DistError>> = vec![
        ArchiveEntry::file("p/w", b"4".to_vec()),
        ArchiveEntry::file("p/x/1", b"9".to_vec()),
        ArchiveEntry::directory("p/x/"),
    ]
    .into_iter()
    .map(Ok)
    .collect();
    entries.reverse();
    let backward = TreeBuilder::new(config.clone()).build(entries).unwrap();

    let classifier = Classifier::new(config);
    assert_eq!(
        classifier.classify(&previous, &forward),
        classifier.classify(&previous, &backward)
    );
}

#[test]
fn test_end_to_end_with_features_root() {
    let config = DiffConfig::builder()
        .features_root("features".to_string())
        .build()
        .unwrap();
    let previous = build(
        &config,
        "p-1.0",
        &[
            ("config/a.xml", "D1"),
            ("lib/old.jar", "D2"),
            ("features/foo/bar.jar", "F"),
        ],
        &[],
    );
    let updated = build(
        &config,
        "p-1.1",
        &[
            ("config/a.xml", "D1"),
            ("lib/old.jar", "D3"),
            ("features/baz/qux.jar", "Q"),
        ],
        &[],
    );

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.modified, set(&["lib/old.jar"]));
    assert_eq!(result.removed_directories, set(&["features/foo"]));
    assert!(result.removed_files.is_empty());
    assert_eq!(result.added, set(&["features/baz/qux.jar"]));
    assert_disjoint(&result);
}

#[test]
fn test_feature_root_keeps_partial_removal() {
    let config = DiffConfig::builder()
        .features_root("features".to_string())
        .build()
        .unwrap();
    let previous = build(
        &config,
        "p",
        &[
            ("features/foo/a.jar", "a"),
            ("features/foo/b.jar", "b"),
            ("features/foo/plugins/c.jar", "c"),
        ],
        &[],
    );
    let updated = build(&config, "p", &[("features/foo/a.jar", "a")], &[]);

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.removed_files, set(&["features/foo/b.jar"]));
    assert_eq!(result.removed_directories, set(&["features/foo/plugins"]));
    assert!(!result.is_removed("features/foo/a.jar"));
}

#[test]
fn test_modified_file_in_partially_removed_feature() {
    let config = DiffConfig::builder()
        .features_root("features".to_string())
        .build()
        .unwrap();
    let previous = build(
        &config,
        "p",
        &[
            ("features/foo/a.jar", "v1"),
            ("features/foo/b.jar", "b"),
            ("features/foo/keep.jar", "k"),
        ],
        &[],
    );
    let updated = build(
        &config,
        "p",
        &[("features/foo/a.jar", "v2"), ("features/foo/keep.jar", "k")],
        &[],
    );

    let result = Classifier::new(config).classify(&previous, &updated);
    assert_eq!(result.modified, set(&["features/foo/a.jar"]));
    assert_eq!(result.removed_files, set(&["features/foo/b.jar"]));
    assert!(result.removed_directories.is_empty());
    assert!(result.added.is_empty());
    assert!(!result.is_removed("features/foo/a.jar"));
    assert!(!result.is_removed("features/foo/keep.jar"));
    assert_disjoint(&result);
}

fn write_distribution(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(format!("{name}.zip"));
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();
    for (file, contents) in files {
        writer.start_file(format!("{name}/{file}"), options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
    path
}

#[test]
fn test_report_from_archives() {
    let temp = TempDir::new().unwrap();
    let previous_zip = write_distribution(
        temp.path(),
        "product-1.0.0",
        &[("conf/a.xml", b"v1"), ("lib/gone.jar", b"g")],
    );
    let updated_zip = write_distribution(
        temp.path(),
        "product-1.0.1",
        &[("conf/a.xml", b"v2"), ("lib/new.jar", b"n")],
    );

    let config = plain_config();
    let builder = TreeBuilder::new(config.clone());
    let previous = builder
        .build_from_archive(&mut ZipDistribution::open(&previous_zip).unwrap())
        .unwrap();
    let updated = builder
        .build_from_archive(&mut ZipDistribution::open(&updated_zip).unwrap())
        .unwrap();

    let changes = Classifier::new(config).classify(&previous, &updated);
    let report = DiffReport::new(&previous, &updated, changes);

    assert!(report.has_changes());
    assert_eq!(report.previous, "product-1.0.0");
    assert_eq!(report.updated, "product-1.0.1");
    assert_eq!(report.summary.modified, 1);
    assert_eq!(report.summary.removed_files, 1);
    assert_eq!(report.summary.added, 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["changes"]["added"][0], "lib/new.jar");
    assert_eq!(json["summary"]["modified"], 1);
}
