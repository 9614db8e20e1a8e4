// tests/copy_assets.rs

use std::path::{Path, PathBuf};

use buildwatch::build::{collect_files, copy_assets};
use buildwatch::fs::mock::MockFileSystem;
use buildwatch::fs::FileSystem;

fn ignore(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn copies_tree_and_skips_ignored_top_level_entries() {
    let fs = MockFileSystem::new();
    fs.add_file("public/favicon.ico", "icon");
    fs.add_file("public/js/app.js", "compiled elsewhere");
    fs.add_file("public/css/main.css", "compiled elsewhere");
    fs.add_file("public/img/logo.png", "png");
    fs.add_file("public/vendor/js/lib.js", "nested js dir");

    let copied = copy_assets(
        &fs,
        Path::new("public"),
        Path::new("build/public"),
        &ignore(&["js", "css"]),
    )
    .unwrap();

    assert_eq!(copied, 3);
    let copied_files: Vec<PathBuf> = fs
        .file_paths()
        .into_iter()
        .filter(|p| p.starts_with("build"))
        .collect();
    assert_eq!(
        copied_files,
        vec![
            PathBuf::from("build/public/favicon.ico"),
            PathBuf::from("build/public/img/logo.png"),
            PathBuf::from("build/public/vendor/js/lib.js"),
        ]
    );
    assert_eq!(
        fs.read_to_string(Path::new("build/public/vendor/js/lib.js")).unwrap(),
        "nested js dir"
    );
}

#[test]
fn overwrites_existing_destination_files() {
    let fs = MockFileSystem::new();
    fs.add_file("public/robots.txt", "new");
    fs.add_file("build/public/robots.txt", "old");

    copy_assets(&fs, Path::new("public"), Path::new("build/public"), &[]).unwrap();

    assert_eq!(
        fs.read_to_string(Path::new("build/public/robots.txt")).unwrap(),
        "new"
    );
}

#[test]
fn missing_source_copies_nothing() {
    let fs = MockFileSystem::new();

    let copied = copy_assets(&fs, Path::new("public"), Path::new("build/public"), &[]).unwrap();

    assert_eq!(copied, 0);
    assert!(!fs.exists(Path::new("build/public")));
}

#[test]
fn collect_files_lists_relative_paths_sorted() {
    let fs = MockFileSystem::new();
    fs.add_file("src/z.ts", "");
    fs.add_file("src/a/b.ts", "");
    fs.add_file("src/a.ts", "");

    let files = collect_files(&fs, Path::new("src")).unwrap();

    assert_eq!(
        files,
        vec![
            PathBuf::from("a/b.ts"),
            PathBuf::from("a.ts"),
            PathBuf::from("z.ts"),
        ]
    );
}

#[test]
fn remove_dir_all_drops_subtree_only() {
    let fs = MockFileSystem::new();
    fs.add_file("build/app", "bin");
    fs.add_file("build/public/index.html", "html");
    fs.add_file("public/index.html", "html");

    fs.remove_dir_all(Path::new("build")).unwrap();
    fs.remove_dir_all(Path::new("not-there")).unwrap();

    assert_eq!(fs.file_paths(), vec![PathBuf::from("public/index.html")]);
    assert!(!fs.exists(Path::new("build")));
    assert!(fs.is_dir(Path::new("public")));
}
