// tests/script_mirror_property.rs

use std::path::{Path, PathBuf};

use buildwatch::build::plan_script_jobs;
use proptest::prelude::*;

// Relative paths of 1-4 short components, each file ending in one of a few
// extensions.
fn rel_path_strategy() -> impl Strategy<Value = PathBuf> {
    (
        proptest::collection::vec("[a-z]{1,6}", 0..3),
        "[a-z]{1,8}",
        prop_oneof![Just("ts"), Just("js"), Just("css"), Just("d.ts")],
    )
        .prop_map(|(dirs, stem, ext)| {
            let mut path: PathBuf = dirs.iter().collect();
            path.push(format!("{stem}.{ext}"));
            path
        })
}

proptest! {
    #[test]
    fn every_script_maps_into_mirrored_directory(
        rel_paths in proptest::collection::vec(rel_path_strategy(), 0..20)
    ) {
        let src = Path::new("internal/pages/ts");
        let dest = Path::new("public/js");

        let jobs = plan_script_jobs(src, dest, &rel_paths, "ts");

        let expected: Vec<&PathBuf> = rel_paths
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "ts"))
            .collect();
        prop_assert_eq!(jobs.len(), expected.len());

        for (job, rel) in jobs.iter().zip(expected) {
            prop_assert_eq!(&job.input, &src.join(rel));
            prop_assert_eq!(&job.output, &dest.join(rel).with_extension("js"));
            prop_assert!(job.output.starts_with(&job.out_dir));
            prop_assert_eq!(job.output.parent(), Some(job.out_dir.as_path()));
            prop_assert!(job.out_dir.starts_with(dest));
        }
    }

    #[test]
    fn planning_ignores_other_extensions(stem in "[a-z]{1,8}") {
        let rel = vec![
            PathBuf::from(format!("{stem}.css")),
            PathBuf::from(format!("{stem}.js")),
        ];
        let jobs = plan_script_jobs(Path::new("src"), Path::new("out"), &rel, "ts");
        prop_assert!(jobs.is_empty());
    }
}

#[test]
fn nested_script_lands_in_nested_out_dir() {
    let rel = [PathBuf::from("a.ts"), PathBuf::from("sub/b.ts")];
    let jobs = plan_script_jobs(Path::new("scripts"), Path::new("out"), &rel, "ts");

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].out_dir, PathBuf::from("out"));
    assert_eq!(jobs[0].output, PathBuf::from("out/a.js"));
    assert_eq!(jobs[1].input, PathBuf::from("scripts/sub/b.ts"));
    assert_eq!(jobs[1].out_dir, PathBuf::from("out/sub"));
    assert_eq!(jobs[1].output, PathBuf::from("out/sub/b.js"));
}
