//! Fixture-driven integration suite (SPEC_FULL.md §10.5 / spec.md §6 "Test
//! fixtures"): globs `tests/fixtures/test_*.yml`, and for every `cases.<name>`
//! entry either asserts the evaluated result equals `expect` or that the
//! raised error's payload equals `rescue`.

use std::fs;

use jspr::document::from_yaml;
use jspr::environment::Environment;
use jspr::kernel::{eval_do_seq, load_kernel};
use jspr::value::Value;

fn fixtures_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

struct Case {
    name: String,
    env: Option<Value>,
    code: Value,
    expect: Option<Value>,
    rescue: Option<Value>,
}

fn load_cases(path: &std::path::Path) -> Vec<Case> {
    let text = fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap_or_else(|e| panic!("parsing {}: {e}", path.display()));
    let root = from_yaml(doc).unwrap_or_else(|e| panic!("converting {}: {e}", path.display()));
    let cases_map = root
        .as_mapping()
        .unwrap_or_else(|| panic!("{}: top-level document must be a mapping", path.display()))
        .get("cases")
        .unwrap_or_else(|| panic!("{}: missing top-level `cases` key", path.display()))
        .as_mapping()
        .unwrap_or_else(|| panic!("{}: `cases` must be a mapping", path.display()));

    cases_map
        .iter()
        .map(|(name, case)| {
            let case = case
                .as_mapping()
                .unwrap_or_else(|| panic!("{}: case {name} must be a mapping", path.display()));
            let expect = case.get("expect").cloned();
            let rescue = case.get("rescue").cloned();
            assert!(
                expect.is_some() ^ rescue.is_some(),
                "{}: case {name} must have exactly one of expect/rescue",
                path.display()
            );
            Case {
                name: name.clone(),
                env: case.get("env").cloned(),
                code: case
                    .get("code")
                    .unwrap_or_else(|| panic!("{}: case {name} missing `code`", path.display()))
                    .clone(),
                expect,
                rescue,
            }
        })
        .collect()
}

fn run_case(case: &Case) {
    let env = Environment::new();
    load_kernel(&env);
    if let Some(prelude) = &case.env {
        let bindings = prelude.as_mapping().expect("case env must be a mapping");
        for (name, value) in bindings {
            env.define(name.clone(), value.clone());
        }
    }

    match (eval_do_seq(&case.code, &env), &case.expect, &case.rescue) {
        (Ok(result), Some(expect), None) => {
            assert_eq!(&result, expect, "case {} expected {expect:?}, got {result:?}", case.name);
        }
        (Err(err), None, Some(rescue)) => {
            assert_eq!(err.payload(), rescue, "case {} expected error {rescue:?}, got {:?}", case.name, err.payload());
        }
        (Ok(result), None, Some(rescue)) => {
            panic!("case {}: expected error {rescue:?}, but evaluation succeeded with {result:?}", case.name);
        }
        (Err(err), Some(expect), None) => {
            panic!("case {}: expected {expect:?}, but raised {:?}", case.name, err.payload());
        }
        _ => unreachable!("exactly one of expect/rescue was validated at load time"),
    }
}

#[test]
fn fixture_suite() {
    let pattern = fixtures_dir().join("test_*.yml");
    let mut ran = 0;
    for entry in glob::glob(pattern.to_str().unwrap()).expect("invalid glob pattern") {
        let path = entry.expect("glob entry error");
        for case in load_cases(&path) {
            run_case(&case);
            ran += 1;
        }
    }
    assert!(ran > 0, "no fixture cases found under {}", fixtures_dir().display());
}
