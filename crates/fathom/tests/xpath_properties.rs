//! Property-based tests for path expression synthesis.
//!
//! Uses proptest to check that building is deterministic and that
//! positions and predicates land where they should for arbitrary input.

use fathom::{Locator, SelectorKind, XPath};
use proptest::prelude::*;

fn tag() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}"
}

fn build(tags: &[String], attr: &str, value: &str) -> XPath {
    let mut xpath = XPath::at(tags[0].as_str());
    for tag in &tags[1..] {
        xpath = xpath.select(tag.as_str());
    }
    xpath.attribute(attr).be(value)
}

proptest! {
    /// Identical builder calls yield identical trees and strings.
    #[test]
    fn prop_building_is_deterministic(
        tags in prop::collection::vec(tag(), 1..6),
        attr in "[a-z]{1,8}",
        value in "[a-zA-Z0-9 ]{0,12}",
    ) {
        let first = build(&tags, &attr, &value);
        let second = build(&tags, &attr, &value);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first.to_string(), first.to_string());
    }

    /// Bare tags are matched anywhere below the previous node.
    #[test]
    fn prop_bare_tags_become_descendants(tags in prop::collection::vec(tag(), 1..6)) {
        let mut xpath = XPath::at(tags[0].as_str());
        for tag in &tags[1..] {
            xpath = xpath.select(tag.as_str());
        }
        let expected: String = tags.iter().map(|t| format!("//{t}")).collect();
        prop_assert_eq!(xpath.to_string(), expected);
    }

    /// Predicates attach to the most recently selected node.
    #[test]
    fn prop_predicate_on_last_node(
        tags in prop::collection::vec(tag(), 2..5),
        value in "[a-z]{1,8}",
    ) {
        let built = build(&tags, "id", &value).to_string();
        let suffix = format!("//{}[@id='{value}']", tags[tags.len() - 1]);
        prop_assert!(built.ends_with(&suffix), "{} does not end with {}", built, suffix);
        prop_assert_eq!(built.matches('[').count(), 1);
    }

    /// Positions 0 and 1 both select the first match.
    #[test]
    fn prop_zero_and_one_equivalent(tag in tag()) {
        prop_assert_eq!(
            XPath::at_nth(tag.as_str(), 0).to_string(),
            XPath::at_nth(tag.as_str(), 1).to_string()
        );
    }

    /// Any negative position selects the last match.
    #[test]
    fn prop_negative_is_last(tag in tag(), position in i32::MIN..0) {
        prop_assert_eq!(
            XPath::at_nth(tag.as_str(), position).to_string(),
            format!("//{tag}[last()]")
        );
    }

    /// Positive positions are kept as is.
    #[test]
    fn prop_positive_position_kept(tag in tag(), position in 1..1000i32) {
        prop_assert_eq!(
            XPath::at_nth(tag.as_str(), position).to_string(),
            format!("//{tag}[{position}]")
        );
    }

    /// Literals with either quote kind survive as a single string expression.
    #[test]
    fn prop_quoted_literals_balanced(value in "[a-z'\"]{0,10}") {
        let built = XPath::at("a").attribute("title").be(&value).to_string();
        prop_assert!(built.starts_with("//a[@title="));
        prop_assert!(built.ends_with(']'));
        if value.contains('\'') && value.contains('"') {
            prop_assert!(built.contains("concat("));
        }
    }

    /// Rebuilding from serialized sub-paths reproduces the same expression.
    #[test]
    fn prop_rebuild_from_fragments(
        steps in prop::collection::vec((tag(), -3..4i32), 1..5),
        inner in tag(),
        value in "[a-z]{1,8}",
    ) {
        let (first, first_position) = &steps[0];
        let mut built = XPath::at_nth(first.as_str(), *first_position);
        let mut rebuilt = XPath::at_nth(XPath::at(first.as_str()), *first_position);
        for (tag, position) in &steps[1..] {
            built = built.select_nth(tag.as_str(), *position);
            rebuilt = rebuilt.select_nth(XPath::at(tag.as_str()), *position);
        }
        let built = built.encloses(inner.as_str()).attribute("id").be(&value);
        let rebuilt = rebuilt.encloses(XPath::at(inner.as_str()).attribute("id").be(&value));

        prop_assert_eq!(built.to_string(), rebuilt.to_string());
        let again = XPath::at(&built);
        prop_assert_eq!(again.to_string(), built.to_string());
    }

    /// Converting a path expression into a locator keeps its text.
    #[test]
    fn prop_locator_conversion(tags in prop::collection::vec(tag(), 1..4)) {
        let mut xpath = XPath::at(tags[0].as_str());
        for tag in &tags[1..] {
            xpath = xpath.select(tag.as_str());
        }
        let locator = Locator::from(&xpath);
        prop_assert_eq!(locator.kind(), SelectorKind::XPath);
        prop_assert_eq!(locator.value(), xpath.to_string());
    }
}
