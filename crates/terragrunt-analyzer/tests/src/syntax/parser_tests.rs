use super::*;
use crate::syntax::ast::*;

fn parse(src: &str) -> (Body, Vec<Report>) {
    let (tree, reports) = Parser::new(src).parse();
    assert_eq!(tree.syntax().text().to_string(), src, "tree must keep every byte");
    (tree.body(), reports)
}

fn parse_clean(src: &str) -> Body {
    let (body, reports) = parse(src);
    assert!(reports.is_empty(), "unexpected reports for {src:?}: {reports:#?}");
    body
}

fn value_of(
    body: &Body,
    key: &str,
) -> Expr {
    body.get_attribute(key)
        .unwrap_or_else(|| panic!("missing attribute `{key}`"))
        .value()
        .unwrap_or_else(|| panic!("attribute `{key}` has no value"))
}

fn text_of(
    src: &str,
    expr: Option<Expr>,
) -> &str {
    &src[expr.expect("expression").span()]
}

#[test]
fn parses_unit_configuration() {
    let src = r#"
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
    let body = parse_clean(src);
    assert_eq!(body.items().count(), 3);

    let blocks: Vec<_> = body.blocks().collect();
    assert_eq!(blocks[0].ident().name, "terraform");
    assert!(blocks[0].labels().is_empty());
    assert!(blocks[0].is_closed());
    assert_eq!(blocks[1].header_text(), "dependency \"base\"");
    assert_eq!(blocks[1].first_label().as_deref(), Some("base"));
    assert_eq!(
        blocks[1].get_attribute("config_path").and_then(|attr| attr.value()).and_then(|value| value.as_static_string()),
        Some("../base".to_owned())
    );
    assert_eq!(&src[blocks[1].header_span()], "dependency \"base\"");
    assert_eq!(&src[blocks[1].span()], "dependency \"base\" {\n  config_path = \"../base\"\n}");

    let Expr::Object(object) = value_of(&body, "inputs") else {
        panic!("inputs should be an object");
    };
    let items: Vec<_> = object.items().collect();
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0].key(), Some(ObjectKey::Ident(ident)) if ident.name == "vpc_id"));
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let body = parse_clean("# leading\n\n// another\nlocals { /* inline */\n  a = 1 # trailing\n}\n");
    assert_eq!(body.items().count(), 1);
    let locals = body.blocks().next().unwrap();
    let attr = locals.get_attribute("a").unwrap();
    assert_eq!(attr.span(), 46..51);
}

#[test]
fn missing_equals_reports_once_on_offending_token() {
    let src = "locals {\n  env \"dev\"\n}\n";
    let (body, reports) = parse(src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].span, 15..20);
    assert_eq!(&src[reports[0].span.clone()], "\"dev\"");
    assert_eq!(reports[0].message, "Expected `=` or `{`, found string");
    assert_eq!(reports[0].kind, ErrorKind::Syntax);
    assert_eq!(reports[0].level, ErrorLevel::Error);

    // The value is still kept for navigation, marked as recovered.
    let locals = body.blocks().next().unwrap();
    let env = locals.get_attribute("env").unwrap();
    assert!(env.is_recovered());
    assert_eq!(env.value().and_then(|value| value.as_static_string()).as_deref(), Some("dev"));
}

#[test]
fn attributes_with_equals_are_not_recovered() {
    let body = parse_clean("a = 1\n");
    assert!(!body.get_attribute("a").unwrap().is_recovered());
}

#[test]
fn unterminated_block_reports_once_on_open_brace() {
    let src = "terraform {\n  source = \"x\"\n";
    let (body, reports) = parse(src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].span, 10..11);
    assert!(reports[0].message.starts_with("Unclosed block"));

    let block = body.blocks().next().unwrap();
    assert!(!block.is_closed());
    assert!(block.get_attribute("source").is_some());
}

#[test]
fn nested_unclosed_delimiters_report_only_the_innermost() {
    let src = "locals {\n  a = {\n    b = 1\n";
    let (_, reports) = parse(src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].span, 15..16);
    assert!(reports[0].message.starts_with("Unclosed object"));
}

#[test]
fn bare_identifier_reports_missing_equals() {
    let (body, reports) = parse("locals {\n  env\n}\n");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Expected `=` or `{` after `env`");
    assert_eq!(reports[0].span, 11..14);
    assert_eq!(body.blocks().next().unwrap().items().count(), 0);
}

#[test]
fn stray_closing_brace_is_reported_and_skipped() {
    let (body, reports) = parse("}\nx = 1\n");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Unexpected `}` outside of a block");
    assert!(body.get_attribute("x").is_some());
}

#[test]
fn statement_must_start_with_identifier() {
    let (body, reports) = parse("= 1\nok = true\n");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Expected an attribute or block, found `=`");
    assert!(body.get_attribute("ok").is_some());
}

#[test]
fn trailing_tokens_after_value_report_once() {
    let (body, reports) = parse("a = 1 2\nb = 3\n");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Expected a newline, found number");
    assert!(body.get_attribute("b").is_some());
}

#[test]
fn unterminated_string_is_reported_without_cascade() {
    let src = "x = \"abc\ny = 1\n";
    let (body, reports) = parse(src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].message, "Unterminated string literal");
    assert_eq!(&src[reports[0].span.clone()], "\"abc");
    assert!(body.get_attribute("y").is_some());
}

#[test]
fn unterminated_heredoc_reports_only_the_marker() {
    let src = "x = <<EOF\nnever closed\n";
    let (_, reports) = parse(src);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Unterminated heredoc");
    assert_eq!(&src[reports[0].span.clone()], "<<EOF");
}

#[test]
fn invalid_character_is_reported() {
    let (_, reports) = parse("x = @\n");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Invalid character");
    assert_eq!(reports[0].span, 4..5);
}

#[test]
fn binary_precedence() {
    let body = parse_clean("x = 1 + 2 * 3 == 7 && !false\n");
    let Expr::Binary(and) = value_of(&body, "x") else {
        panic!("expected binary expression");
    };
    assert_eq!(and.op(), Some(BinaryOperator::And));
    assert!(matches!(and.rhs(), Some(Expr::Unary(not)) if not.op() == UnaryOperator::Not));

    let Some(Expr::Binary(eq)) = and.lhs() else {
        panic!("expected comparison");
    };
    assert_eq!(eq.op(), Some(BinaryOperator::Eq));
    let Some(Expr::Binary(add)) = eq.lhs() else {
        panic!("expected addition");
    };
    assert_eq!(add.op(), Some(BinaryOperator::Add));
    assert!(matches!(add.rhs(), Some(Expr::Binary(mul)) if mul.op() == Some(BinaryOperator::Mul)));
}

#[test]
fn conditional_with_traversals() {
    let src = "x = local.enabled ? dependency.vpc.outputs.ids[0] : null\n";
    let body = parse_clean(src);
    let Expr::Conditional(conditional) = value_of(&body, "x") else {
        panic!("expected conditional");
    };
    assert_eq!(text_of(src, conditional.cond()), "local.enabled");
    assert_eq!(text_of(src, conditional.then_expr()), "dependency.vpc.outputs.ids[0]");
    assert!(matches!(conditional.else_expr(), Some(Expr::Literal(literal)) if literal.value() == Literal::Null));

    let Some(Expr::Traversal(traversal)) = conditional.then_expr() else {
        panic!("expected traversal");
    };
    assert!(matches!(traversal.root(), Some(Expr::Variable(variable)) if variable.ident().name == "dependency"));
    let operators = traversal.operators();
    assert_eq!(operators.len(), 4);
    assert!(matches!(&operators[0], TraversalOperator::GetAttr(ident) if ident.span == (31..34)));
    assert!(matches!(&operators[3], TraversalOperator::Index(_)));
}

#[test]
fn legacy_numeric_indices_are_split() {
    let body = parse_clean("x = a.0.1\n");
    let Expr::Traversal(traversal) = value_of(&body, "x") else {
        panic!("expected traversal");
    };
    let operators = traversal.operators();
    assert_eq!(operators.len(), 2);
    assert!(matches!(operators[0], TraversalOperator::LegacyIndex { index: 0, .. }));
    assert!(matches!(operators[1], TraversalOperator::LegacyIndex { index: 1, .. }));
    assert_eq!(operators[1].span(), 8..9);
}

#[test]
fn splat_operators() {
    let body = parse_clean("x = a[*].id\ny = a.*.id\n");
    let Expr::Traversal(full) = value_of(&body, "x") else {
        panic!("expected traversal");
    };
    assert!(matches!(full.operators()[0], TraversalOperator::FullSplat(_)));
    let Expr::Traversal(attr) = value_of(&body, "y") else {
        panic!("expected traversal");
    };
    assert!(matches!(attr.operators()[0], TraversalOperator::AttrSplat(_)));
}

#[test]
fn function_calls_with_expansion_and_newlines() {
    let body = parse_clean("x = merge(\n  local.a,\n  local.b...\n)\ny = timestamp()\n");
    let Expr::FuncCall(merge) = value_of(&body, "x") else {
        panic!("expected call");
    };
    assert_eq!(merge.name().name, "merge");
    assert_eq!(merge.args().count(), 2);
    assert!(merge.expands_final());

    assert!(matches!(value_of(&body, "y"), Expr::FuncCall(call) if call.args().count() == 0));
}

#[test]
fn newline_before_parenthesis_is_not_a_call() {
    let (body, reports) = parse("x = f\n(1)\n");
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert!(matches!(value_of(&body, "x"), Expr::Variable(_)));
}

#[test]
fn objects_accept_both_separators_and_trailing_commas() {
    let body = parse_clean("x = {\n  a = 1,\n  \"b\": 2\n  (local.k) = 3,\n}\n");
    let Expr::Object(object) = value_of(&body, "x") else {
        panic!("expected object");
    };
    let items: Vec<_> = object.items().collect();
    assert_eq!(items.len(), 3);
    assert!(matches!(items[1].key(), Some(ObjectKey::Expr(expr)) if expr.as_static_string().as_deref() == Some("b")));
    assert!(matches!(items[2].key(), Some(ObjectKey::Expr(Expr::Parenthesized(_)))));
    assert!(items.iter().all(|item| item.value().is_some()));
}

#[test]
fn tuples_span_lines() {
    let body = parse_clean("x = [\n  1,\n  \"two\",\n  [3],\n]\n");
    assert!(matches!(value_of(&body, "x"), Expr::Tuple(tuple) if tuple.items().count() == 3));
}

#[test]
fn for_expressions() {
    let body = parse_clean(
        "x = [for k, v in local.m : v if v != null]\ny = { for s in local.l : s => upper(s)... }\n",
    );
    let Expr::For(tuple_for) = value_of(&body, "x") else {
        panic!("expected tuple for");
    };
    assert!(!tuple_for.is_object());
    assert_eq!(tuple_for.key_var().map(|k| k.name), Some("k".to_owned()));
    assert_eq!(tuple_for.value_var().name, "v");
    assert!(matches!(tuple_for.collection(), Some(Expr::Traversal(_))));
    assert!(tuple_for.key_expr().is_none());
    assert!(matches!(tuple_for.value_expr(), Some(Expr::Variable(_))));
    assert!(matches!(tuple_for.cond(), Some(Expr::Binary(_))));

    let Expr::For(object_for) = value_of(&body, "y") else {
        panic!("expected object for");
    };
    assert!(object_for.is_object());
    assert!(object_for.key_var().is_none());
    assert!(matches!(object_for.key_expr(), Some(Expr::Variable(_))));
    assert!(matches!(object_for.value_expr(), Some(Expr::FuncCall(_))));
    assert!(object_for.is_grouping());
    assert!(object_for.cond().is_none());
}

#[test]
fn template_interpolations_have_absolute_spans() {
    let src = "x = \"${foo}-suffix\"\n";
    let body = parse_clean(src);
    let Expr::Template(template) = value_of(&body, "x") else {
        panic!("expected template");
    };
    let parts = template.parts();
    assert_eq!(parts.len(), 2);
    let TemplatePart::Interpolation(inner) = &parts[0] else {
        panic!("expected interpolation");
    };
    assert_eq!(inner.span(), 7..10);
    assert!(matches!(inner, Expr::Variable(variable) if variable.ident().name == "foo"));
    assert_eq!(parts[1], TemplatePart::Literal("-suffix".to_owned()));
    assert!(template.as_literal().is_none());
}

#[test]
fn template_escapes_and_literal_markers() {
    let body = parse_clean("x = \"a\\nb $${raw} %%{raw} \\u00e9\"\n");
    assert_eq!(value_of(&body, "x").as_static_string().as_deref(), Some("a\nb ${raw} %{raw} é"));
}

#[test]
fn template_directives_are_flagged() {
    let body = parse_clean("x = \"%{ if true }y%{ endif }\"\n");
    let Expr::Template(template) = value_of(&body, "x") else {
        panic!("expected template");
    };
    assert!(template.has_directives());
    assert!(template.as_literal().is_none());
}

#[test]
fn interpolation_errors_are_located_inside_the_string() {
    let src = "x = \"${}\"\ny = \"${a b}\"\n";
    let (_, reports) = parse(src);
    assert_eq!(reports.len(), 2, "{reports:#?}");
    assert_eq!(reports[0].message, "Empty interpolation");
    assert_eq!(&src[reports[0].span.clone()], "${}");
    assert_eq!(reports[1].message, "Expected end of interpolation, found identifier");
    assert_eq!(&src[reports[1].span.clone()], "b");
}

#[test]
fn heredoc_body_is_a_literal() {
    let body = parse_clean("x = <<EOF\nhello ${name}\nEOF\ny = <<-EOT\n  indented\n  EOT\n");
    assert_eq!(value_of(&body, "x").as_static_string().as_deref(), Some("hello ${name}\n"));
    assert_eq!(value_of(&body, "y").as_static_string().as_deref(), Some("  indented\n"));
}

#[test]
fn block_labels_may_be_bare_identifiers() {
    let body = parse_clean("generate provider {\n  path = \"provider.tf\"\n}\n");
    let block = body.blocks().next().unwrap();
    assert_eq!(block.labels()[0].value, "provider");
    assert_eq!(block.header_text(), "generate \"provider\"");
}

#[test]
fn empty_document() {
    let body = parse_clean("");
    assert_eq!(body.items().count(), 0);
}

#[test]
fn deeply_nested_parentheses_report_once() {
    let depth = 10_000;
    let src = format!("x = {}1{}\ny = 2\n", "(".repeat(depth), ")".repeat(depth));
    let (body, reports) = parse(&src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].message, "Expression is nested too deeply");
    assert_eq!(reports[0].span, 4 + MAX_NESTING_DEPTH..5 + MAX_NESTING_DEPTH);
    assert!(body.get_attribute("y").is_some());

    let decoded = crate::syntax::decode(&src, &crate::analysis::PlaceholderResolver, &|| false).unwrap();
    assert_eq!(decoded.errors.len(), 1, "{:#?}", decoded.errors);
}

#[test]
fn deeply_nested_operators_report_once() {
    let depth = 10_000;
    for src in [
        format!("x = {}1\n", "-".repeat(depth)),
        format!("x = {}1\n", "1 + ".repeat(depth)),
        format!("x = {}1{}\n", "[".repeat(depth), "]".repeat(depth)),
        format!("x = {}1{}\n", "\"${".repeat(depth), "}\"".repeat(depth)),
    ] {
        let (body, reports) = parse(&src);
        assert_eq!(reports.len(), 1, "{reports:#?}");
        assert_eq!(reports[0].message, "Expression is nested too deeply");
        assert!(body.get_attribute("x").is_some());
        crate::syntax::decode(&src, &crate::analysis::PlaceholderResolver, &|| false).unwrap();
    }
}

#[test]
fn deeply_nested_blocks_report_once() {
    let depth = 10_000;
    let src = format!("{}{}after = 1\n", "a {\n".repeat(depth), "}\n".repeat(depth));
    let (body, reports) = parse(&src);
    assert_eq!(reports.len(), 1, "{reports:#?}");
    assert_eq!(reports[0].message, "Block is nested too deeply");
    assert_eq!(&src[reports[0].span.clone()], "{");
    assert_eq!(reports[0].span.start, MAX_NESTING_DEPTH * 4 + 2);
    assert!(body.get_attribute("after").is_some());
    assert!(body.blocks().next().unwrap().is_closed());
}
