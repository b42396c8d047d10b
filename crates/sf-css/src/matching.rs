//! Selector matching against the arena DOM.

use crate::parser::AttributeOperator;
use crate::parser::AttributeSelector;
use crate::parser::Combinator;
use crate::parser::CompoundSelector;
use crate::parser::Nth;
use crate::parser::PseudoClass;
use crate::parser::Selector;
use crate::parser::SelectorSegment;
use sf_dom::Document;
use sf_dom::NodeId;

pub(crate) fn matches_selector(selector: &Selector, doc: &Document, node: NodeId) -> bool {
    let Some((first, rest)) = selector.segments.split_first() else {
        return false;
    };
    matches_compound(&first.compound, doc, node)
        && matches_chain(rest, first.combinator_to_next, doc, node)
}

/// Matches the remaining `segments` leftward from `cursor`, which is linked
/// to the first of them by `combinator`. Descendant steps try every matching
/// ancestor before giving up.
fn matches_chain(
    segments: &[SelectorSegment],
    combinator: Option<Combinator>,
    doc: &Document,
    cursor: NodeId,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return true;
    };
    let continues_from = |candidate: NodeId| {
        matches_compound(&segment.compound, doc, candidate)
            && matches_chain(rest, segment.combinator_to_next, doc, candidate)
    };

    match combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => doc
            .parent(cursor)
            .filter(|id| doc.is_element(*id))
            .is_some_and(continues_from),
        Combinator::Descendant => doc
            .ancestors(cursor)
            .filter(|id| doc.is_element(*id))
            .any(continues_from),
    }
}

fn matches_compound(compound: &CompoundSelector, doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };

    if compound.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
        return false;
    }

    if let Some(id) = &compound.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }

    if !compound
        .classes
        .iter()
        .all(|class_name| doc.has_class(node, class_name))
    {
        return false;
    }

    if !compound
        .attributes
        .iter()
        .all(|attribute| matches_attribute(attribute, element.attr(&attribute.name)))
    {
        return false;
    }

    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| matches_pseudo_class(*pseudo, doc, node))
}

fn matches_attribute(selector: &AttributeSelector, actual: Option<&str>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let expected = selector.value.as_str();

    match selector.operator {
        AttributeOperator::Exists => true,
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => actual.split_ascii_whitespace().any(|word| word == expected),
        // Empty substrings never match for the substring operators.
        AttributeOperator::Contains => !expected.is_empty() && actual.contains(expected),
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
    }
}

fn matches_pseudo_class(pseudo: PseudoClass, doc: &Document, node: NodeId) -> bool {
    match pseudo {
        PseudoClass::Checked => doc.is_checkable(node) && doc.is_checked(node),
        PseudoClass::FirstChild => element_position(doc, node) == Some(1),
        PseudoClass::NthChild(nth) => {
            let Some(position) = element_position(doc, node) else {
                return false;
            };
            match nth {
                Nth::Index(index) => position == index,
                Nth::Odd => position % 2 == 1,
                Nth::Even => position % 2 == 0,
            }
        }
    }
}

/// 1-based position among element siblings.
fn element_position(doc: &Document, node: NodeId) -> Option<usize> {
    let parent = doc.parent(node)?;
    doc.element_children(parent)
        .iter()
        .position(|sibling| *sibling == node)
        .map(|index| index + 1)
}
