use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use super::*;
use crate::index::SymbolKind;

const APP: &str = r#"include "root" {
  path = find_in_parent_folders("root.hcl")
}

terraform {
  source = "../modules/app"
}

dependency "base" {
  config_path = "../base"
}

inputs = {
  vpc_id = dependency.base.outputs.vpc_id
}
"#;

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("terragrunt-analyzer-{name}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn later() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

fn untitled() -> Url {
    Url::parse("untitled:Untitled-1").unwrap()
}

#[test]
fn unapplied_dependencies_decode_cleanly() {
    let adapter = ParseAdapter::default();
    let parse = adapter.parse(&untitled(), Arc::from(APP), 3, later(), &|| false).unwrap();

    assert_eq!(parse.version_parsed, 3);
    assert!(parse.diagnostics.is_empty(), "{:#?}", parse.diagnostics);
    assert!(!parse.has_errors());
    assert_eq!(parse.dependencies.len(), 1);
    assert_eq!(parse.line_index().text(), APP);
}

#[test]
fn errors_carry_the_configured_source() {
    let adapter = ParseAdapter::new(AdapterOptions {
        resolve_dependencies: false,
        source: "tg".to_owned(),
    });
    let parse = adapter.parse(&untitled(), Arc::from("locals {\n  a = \n"), 1, later(), &|| false).unwrap();
    assert!(parse.has_errors());
    assert!(parse.diagnostics.iter().all(|diag| diag.source == "tg"));
}

#[test]
fn warnings_alone_are_not_errors() {
    let parse = ParseAdapter::default()
        .parse(&untitled(), Arc::from("terrafrom {\n}\n"), 1, later(), &|| false)
        .unwrap();
    assert_eq!(parse.diagnostics.len(), 1);
    assert_eq!(parse.diagnostics[0].severity, Severity::Warning);
    assert!(!parse.has_errors());
}

#[test]
fn dependency_targets_resolve_on_disk() {
    let root = scratch_dir("adapter");
    fs::create_dir_all(root.join("base")).unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(root.join("base/terragrunt.hcl"), "terraform {\n  source = \"../modules/vpc\"\n}\n").unwrap();
    let app_path = root.join("app/terragrunt.hcl");
    fs::write(&app_path, APP).unwrap();
    let uri = Url::from_file_path(&app_path).unwrap();

    let parse = ParseAdapter::default().parse(&uri, Arc::from(APP), 1, later(), &|| false).unwrap();
    let offset = APP.find("base.outputs").unwrap();
    let symbol = parse.index.lookup(offset).unwrap();
    assert_eq!(symbol.kind, SymbolKind::DependencyReference);
    assert_eq!(
        symbol.resolved_target_uri(),
        Some(&Url::from_file_path(root.join("base/terragrunt.hcl")).unwrap())
    );

    let disabled = ParseAdapter::new(AdapterOptions {
        resolve_dependencies: false,
        ..AdapterOptions::default()
    });
    let parse = disabled.parse(&uri, Arc::from(APP), 1, later(), &|| false).unwrap();
    assert_eq!(parse.index.lookup(offset).and_then(Symbol::resolved_target_uri), None);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn missing_dependency_config_is_not_a_diagnostic() {
    let root = scratch_dir("adapter-missing");
    let uri = Url::from_file_path(root.join("terragrunt.hcl")).unwrap();
    let parse = ParseAdapter::default().parse(&uri, Arc::from(APP), 1, later(), &|| false).unwrap();
    assert!(parse.diagnostics.is_empty());
    let symbol = parse.index.lookup(APP.find("base.outputs").unwrap()).unwrap();
    assert!(symbol.target.is_none());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn past_deadline_times_out() {
    let deadline = Instant::now() - Duration::from_millis(1);
    let result = ParseAdapter::default().parse(&untitled(), Arc::from(APP), 1, deadline, &|| false);
    assert_eq!(result.err(), Some(ParseAbort::Timeout));
}

#[test]
fn cancellation_wins_over_timeout() {
    let deadline = Instant::now() - Duration::from_millis(1);
    let result = ParseAdapter::default().parse(&untitled(), Arc::from(APP), 1, deadline, &|| true);
    assert_eq!(result.err(), Some(ParseAbort::Cancelled));
}

#[test]
fn parsing_is_deterministic() {
    let adapter = ParseAdapter::default();
    let text: Arc<str> = Arc::from("locals {\n  a = local.b\n  b = 1 +\n}\nunit \"x\" {}\n");
    let first = adapter.parse(&untitled(), Arc::clone(&text), 1, later(), &|| false).unwrap();
    let second = adapter.parse(&untitled(), text, 1, later(), &|| false).unwrap();
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.symbols(), second.symbols());
    assert_eq!(first.dependencies, second.dependencies);
}

#[test]
fn missing_equals_reports_a_single_diagnostic() {
    let text = "locals {\n  env prod\n}\n";
    let parse = ParseAdapter::default().parse(&untitled(), Arc::from(text), 1, later(), &|| false).unwrap();
    assert_eq!(parse.diagnostics.len(), 1, "{:#?}", parse.diagnostics);
    assert_eq!(parse.diagnostics[0].severity, Severity::Error);
    assert!(parse.diagnostics[0].message.contains('='), "{}", parse.diagnostics[0].message);

    let symbol = parse.index.lookup(text.find("env").unwrap()).unwrap();
    assert_eq!(symbol.kind, SymbolKind::Attribute);
}
