use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use tower_lsp::lsp_types::{Hover, HoverContents, Position, Url};

use super::*;
use crate::analysis::{AdapterOptions, ParseAdapter, ParseResult};

const UNIT: &str = r#"terraform {
  source = "../modules/app"
}

dependency "base" {
  config_path = "../base"
  mock_outputs = {
    vpc_id = "vpc-mock"
  }
}

inputs = {
  vpc_id = dependency.base.outputs.vpc_id
}
"#;

fn parse_at(
    uri: &Url,
    text: &str,
) -> ParseResult {
    ParseAdapter::new(AdapterOptions::default())
        .parse(uri, Arc::from(text), 1, Instant::now() + Duration::from_secs(30), &|| false)
        .unwrap()
}

fn untitled_parse(text: &str) -> ParseResult {
    parse_at(&Url::parse("untitled:Untitled-1").unwrap(), text)
}

fn markdown(hover: &Hover) -> &str {
    match &hover.contents {
        HoverContents::Markup(markup) => &markup.value,
        other => panic!("expected markdown, got {other:?}"),
    }
}

#[test]
fn hover_on_block_shows_keyword_docs() {
    let parse = untitled_parse(UNIT);
    let hover = HoverProvider::new().provide(&parse, Position::new(0, 4)).unwrap();
    let md = markdown(&hover);
    assert!(md.starts_with("```hcl\nterraform\n```\n"), "{md}");
    assert!(md.contains("*(block)*"));
    assert!(md.contains("Where the Terraform module lives"));
    assert_eq!(hover.range.map(|r| (r.start, r.end)), Some((Position::new(0, 0), Position::new(0, 9))));
}

#[test]
fn hover_on_attribute_shows_shape() {
    let parse = untitled_parse(UNIT);
    let hover = HoverProvider::new().provide(&parse, Position::new(1, 3)).unwrap();
    let md = markdown(&hover);
    assert!(md.contains("```hcl\nsource\n```"));
    assert!(md.contains("*(attribute)*"));
    assert!(md.contains("```hcl\nstring\n```"));
    assert!(!md.contains("---"));
}

#[test]
fn hover_on_dependency_reference() {
    let parse = untitled_parse(UNIT);
    let hover = HoverProvider::new().provide(&parse, Position::new(12, 16)).unwrap();
    let md = markdown(&hover);
    assert!(md.contains("```hcl\ndependency.base\n```"));
    assert!(md.contains("*(dependency reference)*"));
    assert!(md.contains("config_path = \"../base\"\nmock_outputs: vpc_id"));
    assert!(!md.contains("Defined in"));

    let range = hover.range.unwrap();
    assert_eq!(range.start, Position::new(12, 11));
    assert_eq!(range.end, Position::new(12, 11 + "dependency.base.outputs.vpc_id".len() as u32));
}

#[test]
fn hover_outside_any_symbol_is_empty() {
    let parse = untitled_parse(UNIT);
    assert!(HoverProvider::new().provide(&parse, Position::new(3, 0)).is_none());
    assert!(HoverProvider::new().provide(&parse, Position::new(99, 0)).is_none());
}

#[test]
fn hover_names_the_resolved_config() {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let root: PathBuf = std::env::temp_dir().join(format!("terragrunt-analyzer-hover-{}-{nanos}", std::process::id()));
    fs::create_dir_all(root.join("base")).unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(root.join("base/terragrunt.hcl"), "terraform {}\n").unwrap();

    let uri = Url::from_file_path(root.join("app/terragrunt.hcl")).unwrap();
    let parse = parse_at(&uri, UNIT);
    let hover = HoverProvider::new().provide(&parse, Position::new(4, 14)).unwrap();
    let md = markdown(&hover);
    let expected = format!("Defined in `{}`", root.join("base/terragrunt.hcl").display());
    assert!(md.contains(&expected), "{md}");
    assert!(md.contains("Another unit whose outputs"));

    let _ = fs::remove_dir_all(root);
}
