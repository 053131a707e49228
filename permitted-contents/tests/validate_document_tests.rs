//! Integration tests for `permitted_contents::validate_document`.

use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use permitted_contents::{
    Condition, ContentModel, ContentModelError, Document, RuleSource, SelectorList,
    SpecRepository, TagSpec, UserContentRule, ValidationConfig, ValidationReport, ViolationReason,
    validate_document,
};
use serde_json::{Value, json};

fn html_spec() -> SpecRepository {
    SpecRepository::from_json_str(include_str!("fixtures/html-spec.json")).unwrap()
}

fn validate(tree: Value) -> ValidationReport {
    validate_with(tree, &ValidationConfig::default())
}

fn validate_with(tree: Value, config: &ValidationConfig) -> ValidationReport {
    let doc = Document::from_value(tree).unwrap();
    validate_document(&doc, &html_spec(), config).unwrap()
}

fn el(name: &str, children: Value) -> Value {
    json!({ "name": name, "children": children })
}

#[test]
fn test_valid_document() {
    let report = validate(el(
        "div",
        json!([
            "\n  ",
            el("h1", json!(["Title"])),
            el("p", json!(["Some ", el("em", json!(["text"])), el("br", json!([]))])),
            el("ul", json!(["\n", el("li", json!(["one"])), "\n", el("li", json!([el("p", json!([]))]))])),
        ]),
    ));
    assert!(report.ok, "unexpected violations: {:?}", report.violations);
    assert_eq!(report.elements_checked, 9);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_element_without_spec_always_passes() {
    let report = validate(el(
        "my-widget",
        json!(["text", el("div", json!([])), el("tr", json!([])), el("li", json!([]))]),
    ));
    assert!(report.ok, "unexpected violations: {:?}", report.violations);
}

#[test]
fn test_scenario_phrasing_rejects_flow_child() {
    let report = validate(el("p", json!([el("span", json!([])), el("div", json!([]))])));
    assert_eq!(report.violations.len(), 1);
    let v = &report.violations[0];
    assert_eq!(v.tag, "p");
    assert_eq!(v.reason, ViolationReason::ShapeMismatch);
    assert_eq!(v.source, RuleSource::Spec);
    assert_eq!(v.message_key, "invalid-content-spec");
}

#[test]
fn test_scenario_link_inherits_parent_model() {
    // <p><a href="#"><div>x</div></a></p>: the transparent link takes on <p>'s model.
    let report = validate(el(
        "p",
        json!([{ "name": "a", "attrs": { "href": "#" }, "children": [el("div", json!(["x"]))] }]),
    ));
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].tag, "a");
    assert_eq!(report.violations[0].reason, ViolationReason::ShapeMismatch);

    // The same link inside a flow container is fine.
    let report = validate(el(
        "div",
        json!([{ "name": "a", "attrs": { "href": "#" }, "children": [el("div", json!(["x"]))] }]),
    ));
    assert!(report.ok, "unexpected violations: {:?}", report.violations);
}

#[test]
fn test_scenario_link_without_href_uses_default() {
    // Without href the default phrasing-only model applies, whatever the parent allows.
    let report = validate(el("div", json!([el("a", json!([el("div", json!(["x"]))]))])));
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].tag, "a");
    assert_eq!(report.violations[0].reason, ViolationReason::ShapeMismatch);
}

#[test]
fn test_scenario_user_rule_is_independent() {
    let config = ValidationConfig::default().with_rules(vec![UserContentRule::new(
        "section",
        ContentModel::Sequence(vec![
            ContentModel::Tag("h1".to_owned()),
            ContentModel::Any,
        ]),
    )]);

    // The spec allows a lone <p> in <section>; the rule does not.
    let report = validate_with(el("section", json!([el("p", json!(["x"]))])), &config);
    assert_eq!(report.violations.len(), 1);
    let v = &report.violations[0];
    assert_eq!(v.source, RuleSource::UserRule(0));
    assert_eq!(v.message_key, "invalid-content-rule");
    assert_eq!(v.message, "Invalid content in \"section\" element on rule settings");

    let report = validate_with(
        el("section", json!([el("h1", json!(["T"])), el("p", json!([]))])),
        &config,
    );
    assert!(report.ok, "unexpected violations: {:?}", report.violations);
}

#[test]
fn test_spec_and_rule_violations_both_reported() {
    let config = ValidationConfig::default().with_rules(vec![UserContentRule::new(
        "P",
        ContentModel::Sequence(vec![]),
    )]);
    let report = validate_with(el("p", json!([el("div", json!([]))])), &config);
    let sources: Vec<RuleSource> = report.violations.iter().map(|v| v.source).collect();
    assert_eq!(sources, vec![RuleSource::Spec, RuleSource::UserRule(0)]);
}

#[test]
fn test_deep_forbidden_descendant() {
    let report = validate(el(
        "div",
        json!([el(
            "button",
            json!([el(
                "span",
                json!([el("span", json!([{ "name": "a", "attrs": { "href": "#" }, "children": ["x"] }]))])
            )])
        )]),
    ));
    assert_eq!(report.violations.len(), 1, "{:?}", report.violations);
    let v = &report.violations[0];
    assert_eq!(v.tag, "button");
    assert_eq!(v.reason, ViolationReason::ForbiddenDescendant);
    assert_eq!(v.message_key, "forbidden-descendant");
    assert_eq!(v.offending_tag.as_deref(), Some("span"));
    assert!(v.offending.is_some());
}

#[test]
fn test_forbidden_descendant_inside_transparent_region() {
    let report = validate(el(
        "div",
        json!([{ "name": "a", "attrs": { "href": "#" }, "children": [el("button", json!([]))] }]),
    ));
    assert_eq!(report.violations.len(), 1, "{:?}", report.violations);
    assert_eq!(report.violations[0].tag, "a");
    assert_eq!(report.violations[0].reason, ViolationReason::ForbiddenDescendant);
    assert_eq!(report.violations[0].offending_tag.as_deref(), Some("button"));
}

#[test]
fn test_whitespace_text_is_not_content() {
    let report = validate(el("ul", json!(["\n  ", el("li", json!([])), " \t\r\n"])));
    assert!(report.ok, "unexpected violations: {:?}", report.violations);

    let report = validate(el("ul", json!(["stray", el("li", json!([]))])));
    assert!(!report.ok);

    let report = validate(el("br", json!(["  \n"])));
    assert!(report.ok);
}

#[test]
fn test_bounded_sequence() {
    let report = validate(el("table", json!([el("caption", json!([])), el("tr", json!([]))])));
    assert!(report.ok);

    let report = validate(el("table", json!([el("caption", json!([]))])));
    assert_eq!(report.violations.len(), 1);

    let report = validate(el("table", json!([el("tr", json!([])), el("caption", json!([]))])));
    assert_eq!(report.violations.len(), 1);
}

#[test]
fn test_top_level_transparent_is_a_warning() {
    let report = validate(json!({ "name": "a", "attrs": { "href": "#" }, "children": ["x"] }));
    assert!(report.ok, "warnings do not fail the report");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].tag, "a");
}

#[test]
fn test_conditional_order_decides_model() {
    let categories = BTreeMap::new();
    let doc = Document::from_value(json!({
        "name": "nav",
        "children": [{ "name": "a", "attrs": { "href": "/" }, "children": ["home"] }]
    }))
    .unwrap();

    let text_only = ContentModel::Repeated {
        item: Box::new(ContentModel::Text),
        min: 0,
        max: None,
    };
    let nothing = ContentModel::Sequence(vec![]);
    let by_attr = Condition::AttributePresent("href".to_owned());
    let by_parent = Condition::ParentMatches(SelectorList::parse("nav").unwrap());

    let specs = BTreeMap::from([(
        "a".to_owned(),
        TagSpec::new(ContentModel::Any)
            .with_conditional(by_attr.clone(), text_only.clone())
            .with_conditional(by_parent.clone(), nothing.clone()),
    )]);
    let repo = SpecRepository::new(specs, &categories).unwrap();
    let report = validate_document(&doc, &repo, &ValidationConfig::default()).unwrap();
    assert!(report.ok, "first conditional (text allowed) should apply");

    let specs = BTreeMap::from([(
        "a".to_owned(),
        TagSpec::new(ContentModel::Any)
            .with_conditional(by_parent, nothing)
            .with_conditional(by_attr, text_only),
    )]);
    let repo = SpecRepository::new(specs, &categories).unwrap();
    let report = validate_document(&doc, &repo, &ValidationConfig::default()).unwrap();
    assert_eq!(report.violations.len(), 1, "first conditional (nothing allowed) should apply");
}

#[test]
fn test_cyclic_categories_validate() {
    let repo = SpecRepository::from_value(json!({
        "categories": {
            "#a": ["x", "#b"],
            "#b": ["y", "#a"]
        },
        "specs": [{ "tag": "box", "contents": [{ "zeroOrMore": "#a" }] }]
    }))
    .unwrap();
    let doc = Document::from_value(el("box", json!([el("y", json!([])), el("x", json!([]))]))).unwrap();
    let report = validate_document(&doc, &repo, &ValidationConfig::default()).unwrap();
    assert!(report.ok);

    let doc = Document::from_value(el("box", json!([el("z", json!([]))]))).unwrap();
    let report = validate_document(&doc, &repo, &ValidationConfig::default()).unwrap();
    assert!(!report.ok);
}

#[test]
fn test_unknown_category_in_user_rule_is_fatal() {
    let doc = Document::from_value(el("p", json!([]))).unwrap();
    let config = ValidationConfig::default().with_rules(vec![UserContentRule::new(
        "p",
        ContentModel::Category("#nope".to_owned()),
    )]);
    let err = validate_document(&doc, &html_spec(), &config).unwrap_err();
    assert_eq!(
        err,
        ContentModelError::UnknownCategory {
            name: "#nope".to_owned()
        }
    );
}

#[test]
fn test_parallel_matches_sequential_in_document_order() {
    let section = |n: usize| {
        el(
            "section",
            json!([
                el("p", json!([el("div", json!([]))])),
                { "name": "a", "attrs": { "href": "#" }, "children": [el("button", json!([format!("b{n}")]))] },
                el("ul", json!([el("p", json!([]))])),
            ]),
        )
    };
    let tree = Value::Array((0..40).map(section).collect());
    let doc = Document::from_value(tree).unwrap();
    let repo = html_spec();

    let sequential = validate_document(&doc, &repo, &ValidationConfig::default()).unwrap();
    let parallel =
        validate_document(&doc, &repo, &ValidationConfig::default().with_parallel(true)).unwrap();

    assert_eq!(sequential.violations.len(), 120);
    assert_eq!(sequential.violations, parallel.violations);
    assert_eq!(sequential.warnings, parallel.warnings);
    assert!(
        sequential
            .violations
            .windows(2)
            .all(|pair| pair[0].element <= pair[1].element)
    );
}

#[test]
fn test_failing_link_inside_paragraph_reports_promptly() {
    // <p><a href><span/>x40<div/></a></p>: the link's model nests <p>'s repeat.
    let mut children: Vec<Value> = (0..40).map(|_| el("span", json!([]))).collect();
    children.push(el("div", json!([])));
    let tree = el(
        "p",
        json!([{ "name": "a", "attrs": { "href": "#" }, "children": children }]),
    );

    let started = Instant::now();
    let report = validate(tree);
    let elapsed = started.elapsed();

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].tag, "a");
    assert_eq!(report.violations[0].reason, ViolationReason::ShapeMismatch);
    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
}

#[test]
fn test_very_wide_child_list_on_small_stack() {
    let handle = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let mut children: Vec<Value> = (0..100_000).map(|_| el("span", json!([]))).collect();
            let valid = validate(el("p", Value::Array(children.clone())));
            children.push(el("div", json!([])));
            let invalid = validate(el("p", Value::Array(children)));
            (valid, invalid)
        })
        .unwrap();
    let (valid, invalid) = handle.join().unwrap();

    assert!(valid.ok, "unexpected violations: {:?}", valid.violations);
    assert_eq!(valid.elements_checked, 100_001);
    assert_eq!(invalid.violations.len(), 1);
    assert_eq!(invalid.violations[0].tag, "p");
}
