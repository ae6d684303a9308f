use std::cell::Cell;

use super::*;
use crate::{analysis::PlaceholderResolver, syntax::parser::Parser};

struct FixedOutputs(Value);

impl ModuleResolver for FixedOutputs {
    fn resolve_outputs(
        &self,
        _dependency: &DependencyDecl,
    ) -> Result<Value, DependencyUnresolved> {
        Ok(self.0.clone())
    }
}

struct NeverApplied;

impl ModuleResolver for NeverApplied {
    fn resolve_outputs(
        &self,
        dependency: &DependencyDecl,
    ) -> Result<Value, DependencyUnresolved> {
        Err(DependencyUnresolved::NotApplied {
            name: dependency.name.clone(),
        })
    }
}

fn run(
    src: &str,
    resolver: &dyn ModuleResolver,
) -> Evaluation {
    let (tree, reports) = Parser::new(src).parse();
    assert!(reports.is_empty(), "syntax errors in fixture: {reports:#?}");
    evaluate(&tree.body(), resolver, &|| false).unwrap()
}

fn messages(evaluation: &Evaluation) -> Vec<&str> {
    evaluation.reports.iter().map(|r| r.message.as_str()).collect()
}

fn shape_of(
    src: &str,
    evaluation: &Evaluation,
    key: &str,
) -> Shape {
    let mut line_start = 0;
    let mut offset = None;
    for line in src.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        if rest.strip_prefix(key).is_some_and(|tail| tail.trim_start().starts_with('=')) {
            offset = Some(line_start + indent);
            break;
        }
        line_start += line.len();
    }
    let offset = offset.unwrap_or_else(|| panic!("no attribute `{key}` in fixture"));
    evaluation.shapes.get(&offset).copied().unwrap_or_else(|| panic!("no shape for `{key}`"))
}

const UNIT: &str = r#"
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

#[test]
fn placeholder_outputs_evaluate_without_errors() {
    let evaluation = run(UNIT, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    assert_eq!(shape_of(UNIT, &evaluation, "vpc_id"), Shape::Unknown);
    assert_eq!(shape_of(UNIT, &evaluation, "inputs"), Shape::Object);
    assert_eq!(shape_of(UNIT, &evaluation, "source"), Shape::String);

    assert_eq!(evaluation.dependencies.len(), 1);
    let base = &evaluation.dependencies[0];
    assert_eq!(base.name, "base");
    assert_eq!(base.config_path.as_deref(), Some("../base"));
    assert_eq!(&UNIT[base.header_span.clone()], "dependency \"base\"");
}

#[test]
fn resolver_failures_are_tagged_as_unresolved() {
    let evaluation = run(UNIT, &NeverApplied);
    assert_eq!(evaluation.reports.len(), 1);
    let report = &evaluation.reports[0];
    assert_eq!(report.kind, ErrorKind::DependencyUnresolved);
    assert_eq!(&UNIT[report.span.clone()], "dependency.base.outputs");
    assert!(report.message.contains("`base`"));
}

#[test]
fn resolved_outputs_are_type_checked() {
    let outputs = Value::Object(BTreeMap::from([("vpc_id".to_owned(), Value::String("vpc-1".to_owned()))]));
    let evaluation = run(UNIT, &FixedOutputs(outputs.clone()));
    assert!(evaluation.reports.is_empty());
    assert_eq!(shape_of(UNIT, &evaluation, "vpc_id"), Shape::String);

    let src = UNIT.replace("outputs.vpc_id", "outputs.subnet_ids");
    let evaluation = run(&src, &FixedOutputs(outputs));
    assert_eq!(messages(&evaluation), vec!["Object has no attribute `subnet_ids`"]);
    assert_eq!(evaluation.reports[0].kind, ErrorKind::Type);
}

#[test]
fn undeclared_dependency_is_a_reference_error() {
    let src = "inputs = {\n  db = dependency.db.outputs.url\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(
        messages(&evaluation),
        vec!["Unknown dependency `db`; declare it with a `dependency \"db\"` block"]
    );
    let report = &evaluation.reports[0];
    assert_eq!(report.kind, ErrorKind::Reference);
    assert_eq!(&src[report.span.clone()], "dependency.db");
}

#[test]
fn dependency_declared_by_an_include_is_not_an_error() {
    let src = r#"
include "root" {
  path = find_in_parent_folders("root.hcl")
}

inputs = {
  vpc_id = dependency.vpc.outputs.vpc_id
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    assert_eq!(shape_of(src, &evaluation, "vpc_id"), Shape::Unknown);
    assert!(evaluation.dependencies.is_empty());
}

#[test]
fn recovered_attributes_are_not_checked() {
    let src = "locals {\n  env prod\n  region = local.env\n}\n";
    let (tree, syntax_reports) = Parser::new(src).parse();
    assert_eq!(syntax_reports.len(), 1, "{syntax_reports:#?}");

    let evaluation = evaluate(&tree.body(), &PlaceholderResolver, &|| false).unwrap();
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    assert_eq!(evaluation.shapes.get(&11), Some(&Shape::Unknown));
    assert_eq!(shape_of(src, &evaluation, "region"), Shape::Unknown);
}

#[test]
fn long_local_chains_stop_at_the_evaluation_depth() {
    let count = 1_000;
    let mut src = "locals {\n".to_owned();
    for i in 0..count - 1 {
        src.push_str(&format!("  a{i} = local.a{}\n", i + 1));
    }
    src.push_str(&format!("  a{} = 1\n}}\n", count - 1));

    let evaluation = run(&src, &PlaceholderResolver);
    assert_eq!(messages(&evaluation), vec!["Expression is nested too deeply to evaluate"]);
    assert_eq!(evaluation.reports[0].level, ErrorLevel::Warning);
    assert_eq!(shape_of(&src, &evaluation, "a0"), Shape::Unknown);
    assert_eq!(shape_of(&src, &evaluation, &format!("a{}", count - 1)), Shape::Number);
}

#[test]
fn mock_outputs_are_recorded_on_the_declaration() {
    let src = r#"
inputs = {
  id = dependency.vpc.outputs.id
}

dependency "vpc" {
  config_path = "../vpc"
  mock_outputs = {
    id      = "mock"
    subnets = ["a", "b"]
  }
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    let Some(Value::Object(mock)) = &evaluation.dependencies[0].mock_outputs else {
        panic!("mock_outputs should be captured");
    };
    assert_eq!(mock.keys().collect::<Vec<_>>(), vec!["id", "subnets"]);
    assert_eq!(mock.get("subnets").map(Value::shape), Some(Shape::List));
}

#[test]
fn dependency_declaration_errors() {
    let src = r#"
dependency {
  config_path = "../a"
}

dependency "vpc" {
  config_path = "../vpc"
}

dependency "vpc" {
  config_path = "../vpc2"
}

dependency "db" {
  mock_outputs = {}
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(
        messages(&evaluation),
        vec![
            "A `dependency` block requires a name label",
            "Dependency `vpc` is already declared",
            "Dependency `db` is missing the required `config_path` attribute",
        ]
    );
    assert!(evaluation.reports.iter().all(|r| r.kind == ErrorKind::Structure && r.level == ErrorLevel::Error));
    let names: Vec<_> = evaluation.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["vpc", "db"]);
    assert_eq!(evaluation.dependencies[1].config_path, None);
}

#[test]
fn unknown_block_type_is_a_warning() {
    let src = "terrafrom {\n  source = \"x\"\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(messages(&evaluation), vec!["Unknown block type `terrafrom`"]);
    assert_eq!(evaluation.reports[0].level, ErrorLevel::Warning);
    assert_eq!(evaluation.reports[0].kind, ErrorKind::Structure);
    assert_eq!(&src[evaluation.reports[0].span.clone()], "terrafrom");
}

#[test]
fn duplicate_attributes_are_reported_per_scope() {
    let src = "inputs = {}\ninputs = {}\nterraform {\n  source = \"a\"\n  source = \"b\"\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(
        messages(&evaluation),
        vec![
            "Attribute `inputs` is already defined in this file",
            "Attribute `source` is already defined in `terraform`",
        ]
    );
}

#[test]
fn locals_fold_across_blocks() {
    let src = r#"
locals {
  name = "app"
}

locals {
  full    = "${local.name}-prod"
  replica = local.full == "app-prod" ? 2 : "none"
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    assert_eq!(shape_of(src, &evaluation, "full"), Shape::String);
    assert_eq!(shape_of(src, &evaluation, "replica"), Shape::Number);
}

#[test]
fn local_reference_errors() {
    let src = "locals {\n  a = local.b\n  b = local.a\n  c = local.missing\n}\nlocals {\n  c = 2\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(
        messages(&evaluation),
        vec!["Local `c` is already defined", "Local `a` refers to itself", "Unknown local `missing`"]
    );
    assert_eq!(&src[evaluation.reports[1].span.clone()], "local.a");
    assert_eq!(&src[evaluation.reports[2].span.clone()], "local.missing");
}

#[test]
fn include_references() {
    let labeled = "include \"root\" {\n  path = \"../root.hcl\"\n}\ninputs = {\n  a = include.root.locals.x\n  b = include.env.locals.y\n}\n";
    let evaluation = run(labeled, &PlaceholderResolver);
    assert_eq!(messages(&evaluation), vec!["Unknown include `env`"]);

    let unlabeled = "include {\n  path = \"../root.hcl\"\n}\ninputs = {\n  b = include.env.locals.y\n}\n";
    let evaluation = run(unlabeled, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty());
}

#[test]
fn runtime_roots_and_unknown_variables() {
    let src = "inputs = {\n  a = feature.flag.value\n  b = values.region\n  c = region\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(messages(&evaluation), vec!["Unknown variable `region`"]);
    assert_eq!(evaluation.reports[0].kind, ErrorKind::Reference);
}

#[test]
fn literal_type_errors() {
    let src = r#"
locals {
  a = 1 + "x"
  b = 1 / 0
  c = 1 ? "y" : "n"
  d = "${[1]}"
  e = [1, 2][5]
  f = !3
  g = "s".name
  h = null.name
  i = [for s in 5 : s]
  j = "${null}"
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(
        messages(&evaluation),
        vec![
            "Operator `+` requires number operands, found number and string",
            "Division by zero",
            "Condition must be a bool, found number",
            "Cannot include a list value in a string template",
            "Index 5 is out of range for a list of 2 elements",
            "Operator `!` requires a bool, found number",
            "Cannot get attribute `name` from a string value",
            "Attempt to get attribute `name` from a null value",
            "Cannot iterate over a number value",
            "Cannot include a null value in a string template",
        ]
    );
    assert!(evaluation.reports.iter().all(|r| r.kind == ErrorKind::Type));
}

#[test]
fn numeric_strings_convert_like_terraform() {
    let src = "locals {\n  a = \"2\" * 3\n  b = \"true\" && true\n  c = \"x${1.5}\"\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    assert_eq!(shape_of(src, &evaluation, "a"), Shape::Number);
    assert_eq!(shape_of(src, &evaluation, "b"), Shape::Bool);
    assert_eq!(shape_of(src, &evaluation, "c"), Shape::String);
}

#[test]
fn unknown_values_propagate_silently() {
    let src = r#"
dependency "a" {
  config_path = "../a"
}

inputs = {
  sum      = dependency.a.outputs.count + 1
  item     = dependency.a.outputs.list[0]
  text     = "id-${dependency.a.outputs.name}"
  choice   = dependency.a.outputs.flag ? 1 : 2
  names    = [for s in dependency.a.outputs.list : s.name if s.enabled]
  by_name  = { for k, v in dependency.a.outputs.map : k => v.id }
  upper    = upper(dependency.a.outputs.name)
  ids      = dependency.a.outputs.list[*].id
  negated  = !dependency.a.outputs.flag
  minus    = -dependency.a.outputs.count
  nested   = dependency.a.outputs.deep.er.still.unknown
}
"#;
    let evaluation = run(src, &PlaceholderResolver);
    assert!(evaluation.reports.is_empty(), "{:#?}", evaluation.reports);
    for key in ["sum", "item", "text", "choice", "names", "by_name", "upper", "ids", "negated", "minus", "nested"] {
        assert_eq!(shape_of(src, &evaluation, key), Shape::Unknown, "{key}");
    }
}

#[test]
fn for_iterators_shadow_nothing_outside() {
    let src = "locals {\n  l = [for s in [\"a\"] : s.name]\n  m = s\n}\n";
    let evaluation = run(src, &PlaceholderResolver);
    assert_eq!(messages(&evaluation), vec!["Unknown variable `s`"]);
}

#[test]
fn interruption_stops_evaluation() {
    let (tree, _) = Parser::new(UNIT).parse();
    let body = tree.body();
    assert!(evaluate(&body, &PlaceholderResolver, &|| true).is_err());

    let polls = Cell::new(0);
    let interrupt_later = || {
        polls.set(polls.get() + 1);
        polls.get() > 2
    };
    assert_eq!(evaluate(&body, &PlaceholderResolver, &interrupt_later).err(), Some(Interrupted));
    assert_eq!(polls.get(), 3);
}

#[test]
fn shape_names() {
    assert_eq!(Value::List(Vec::new()).shape().to_string(), "list");
    assert_eq!(Shape::Unknown.name(), "unknown");
    assert!(Value::Unknown.is_unknown());
}
