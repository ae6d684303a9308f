use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("terragrunt-analyzer-{name}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn decl(
    name: &str,
    config_path: Option<&str>,
    mock_outputs: Option<Value>,
) -> DependencyDecl {
    DependencyDecl {
        name: name.to_owned(),
        config_path: config_path.map(str::to_owned),
        mock_outputs,
        span: 0..0,
        header_span: 0..0,
    }
}

#[test]
fn placeholder_always_yields_unknown() {
    let value = PlaceholderResolver.resolve_outputs(&decl("vpc", None, None)).unwrap();
    assert!(value.is_unknown());
}

#[test]
fn config_file_defaults_to_terragrunt_hcl() {
    let resolver = DiskResolver::new("/repo/live/app");
    assert_eq!(
        resolver.config_file(&decl("vpc", Some("../vpc"), None)).unwrap(),
        PathBuf::from("/repo/live/vpc/terragrunt.hcl")
    );
    assert_eq!(
        resolver.config_file(&decl("root", Some("../../root.hcl"), None)).unwrap(),
        PathBuf::from("/repo/root.hcl")
    );
    assert!(matches!(
        resolver.config_file(&decl("vpc", None, None)),
        Err(Unresolvable::NoConfigPath { name }) if name == "vpc"
    ));
}

#[test]
fn normalize_path_is_lexical() {
    assert_eq!(normalize_path(Path::new("/a/b/./../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
}

#[test]
fn for_document_requires_a_file_uri() {
    let uri = Url::parse("untitled:Untitled-1").unwrap();
    assert!(matches!(DiskResolver::for_document(&uri), Err(Unresolvable::NotAFile { .. })));

    let dir = scratch_dir("for-document");
    let uri = Url::from_file_path(dir.join("terragrunt.hcl")).unwrap();
    assert_eq!(DiskResolver::for_document(&uri).unwrap().base_dir(), dir.as_path());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn locate_points_at_the_terraform_block() {
    let root = scratch_dir("locate");
    fs::create_dir_all(root.join("vpc")).unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(root.join("vpc/terragrunt.hcl"), "locals {\n  a = 1\n}\n\nterraform {\n  source = \"x\"\n}\n").unwrap();

    let resolver = DiskResolver::new(root.join("app"));
    let target = resolver.locate(&decl("vpc", Some("../vpc"), None)).unwrap();
    assert_eq!(target.uri, Url::from_file_path(root.join("vpc/terragrunt.hcl")).unwrap());
    assert_eq!(target.range, Range::new(Position::new(4, 0), Position::new(4, 9)));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn locate_without_terraform_block_targets_file_start() {
    let root = scratch_dir("locate-start");
    fs::create_dir_all(root.join("db")).unwrap();
    fs::write(root.join("db/terragrunt.hcl"), "inputs = {}\n").unwrap();

    let target = DiskResolver::new(&root).locate(&decl("db", Some("db"), None)).unwrap();
    assert_eq!(target.range, Range::default());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn locate_reports_missing_and_broken_configs() {
    let root = scratch_dir("locate-errors");
    let resolver = DiskResolver::new(&root);
    assert!(matches!(
        resolver.locate(&decl("gone", Some("gone"), None)),
        Err(Unresolvable::MissingConfig { .. })
    ));

    fs::create_dir_all(root.join("broken")).unwrap();
    fs::write(root.join("broken/terragrunt.hcl"), "terraform {\n  source = \n").unwrap();
    assert!(matches!(
        resolver.locate(&decl("broken", Some("broken"), None)),
        Err(Unresolvable::InvalidConfig { count, .. }) if count > 0
    ));
    let _ = fs::remove_dir_all(root);
}
