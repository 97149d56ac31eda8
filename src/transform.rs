/*!
 * Endnote inlining transformation for a single TEI document
 *
 * Converts endnotes stored under `back/div[@type="notes"]` into inline
 * notes at each referencing `ref` element, then removes the emptied
 * containers. The document is mutated in place; per-document statistics
 * are returned alongside the outcome classification.
 */

use std::collections::HashMap;

use crate::bail;
use crate::error::Result;
use crate::types::{Outcome, Stats, Status};
use crate::xml::{Document, Element, Node};

/// TEI P5 namespace
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// Inline all endnote references of one document, in place.
///
/// Returns `Status::NoEndnotes` and leaves the document untouched when it has
/// no `back/div[@type="notes"]`. Otherwise every `ref` outside the document
/// header whose `target` names an endnote is replaced by an independent copy
/// of that endnote's content, the notes division is removed, and a `back`
/// left childless by the removal is dropped as well.
///
/// Dangling internal references are warnings, never errors; a document with
/// more than one notes division fails with a `Structure` error.
pub fn transform(doc: &mut Document) -> Result<Outcome> {
    let mut stats = Stats::default();

    let Some(division) = detach_notes_division(&mut doc.root)? else {
        return Ok(Outcome {
            status: Status::NoEndnotes,
            stats,
        });
    };

    let notes = collect_endnotes(&division, &mut stats);
    stats.endnotes_found = notes.len();

    inline_references(&mut doc.root, &notes, &mut stats);
    prune_empty_back(&mut doc.root);

    Ok(Outcome {
        status: Status::Processed,
        stats,
    })
}

/// Remove the notes division from its `back` parent and return it.
///
/// The division's trailing whitespace goes with it. Finding a second
/// division anywhere in the document is a structure error.
fn detach_notes_division(elem: &mut Element) -> Result<Option<Element>> {
    let mut detached = None;
    detach_notes_division_from(elem, &mut detached)?;
    Ok(detached)
}

fn detach_notes_division_from(elem: &mut Element, detached: &mut Option<Element>) -> Result<()> {
    if elem.is_named(TEI_NS, "back") {
        let mut i = 0;
        while i < elem.children.len() {
            let is_notes = elem.children[i]
                .as_element()
                .is_some_and(is_notes_division);
            if is_notes {
                if detached.is_some() {
                    bail!(Structure, "more than one notes division in back matter");
                }
                if let Node::Element(division) = elem.children.remove(i) {
                    *detached = Some(division);
                }
                remove_following_whitespace(elem, i);
                continue;
            }
            i += 1;
        }
    }
    for child in elem.children.iter_mut() {
        if let Node::Element(e) = child {
            detach_notes_division_from(e, detached)?;
        }
    }
    Ok(())
}

fn is_notes_division(elem: &Element) -> bool {
    elem.is_named(TEI_NS, "div") && elem.attr("type") == Some("notes")
}

/// Map endnote identifiers to their note elements.
///
/// Only direct `note` children carrying an `xml:id` are eligible. A
/// duplicated identifier keeps the first occurrence and records a warning.
fn collect_endnotes(division: &Element, stats: &mut Stats) -> HashMap<String, Element> {
    let mut notes: HashMap<String, Element> = HashMap::new();
    for note in division.elements() {
        if !note.is_named(TEI_NS, "note") {
            continue;
        }
        let Some(id) = note.attr("xml:id") else {
            continue;
        };
        if notes.contains_key(id) {
            stats.warnings.push(format!(
                "duplicate endnote identifier \"{id}\"; keeping the first occurrence"
            ));
            continue;
        }
        notes.insert(id.to_string(), note.clone());
    }
    notes
}

/// Replace referencing `ref` elements with inline notes, in document order.
///
/// The `teiHeader` subtree is skipped. Replaced subtrees are not revisited,
/// so a reference inside copied endnote content stays as it was written.
fn inline_references(elem: &mut Element, notes: &HashMap<String, Element>, stats: &mut Stats) {
    for child in elem.children.iter_mut() {
        let Node::Element(e) = child else { continue };
        if e.is_named(TEI_NS, "teiHeader") {
            continue;
        }
        if e.is_named(TEI_NS, "ref") {
            if let Some(id) = internal_target(e) {
                if let Some(note) = notes.get(&id) {
                    let inlined = make_inline_note(e.prefix(), note);
                    *e = inlined;
                    stats.references_inlined += 1;
                    continue;
                }
                stats.dangling_references += 1;
                stats
                    .warnings
                    .push(format!("reference to #{id} has no matching endnote"));
            }
        }
        inline_references(e, notes, stats);
    }
}

/// Identifier named by a `target="#..."` attribute, if this is an internal pointer.
fn internal_target(elem: &Element) -> Option<String> {
    elem.attr("target")
        .and_then(|target| target.strip_prefix('#'))
        .map(str::to_string)
}

/// Build the inline replacement for one reference to one endnote.
///
/// The content subtree is cloned per call, so every occurrence owns an
/// independent copy. The identifier and any other attributes of the endnote
/// are not carried over; the element reuses the namespace prefix of the
/// `ref` it replaces.
fn make_inline_note(prefix: Option<&str>, endnote: &Element) -> Element {
    let name = match prefix {
        Some(prefix) => format!("{prefix}:note"),
        None => "note".to_string(),
    };
    Element {
        name,
        ns: Some(TEI_NS.to_string()),
        attrs: vec![("place".to_string(), "inline".to_string())],
        children: endnote.children.clone(),
    }
}

/// Drop any `back` element left with nothing but whitespace.
fn prune_empty_back(elem: &mut Element) {
    let mut i = 0;
    while i < elem.children.len() {
        let is_empty_back = elem.children[i]
            .as_element()
            .is_some_and(|e| e.is_named(TEI_NS, "back") && e.is_effectively_empty());
        if is_empty_back {
            elem.children.remove(i);
            remove_following_whitespace(elem, i);
            continue;
        }
        if let Some(e) = elem.children.get_mut(i).and_then(Node::as_element_mut) {
            prune_empty_back(e);
        }
        i += 1;
    }
}

/// Remove the whitespace text node that trailed a removed element, if any.
fn remove_following_whitespace(elem: &mut Element, index: usize) {
    if elem.children.get(index).is_some_and(Node::is_whitespace) {
        elem.children.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeinlineError;
    use crate::xml::{parse_str, write_document};

    fn tei(body: &str, back: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <TEI xmlns=\"http://www.tei-c.org/ns/1.0\">\
             <teiHeader><fileDesc/></teiHeader>\
             <text><body>{body}</body>{back}</text></TEI>"
        )
    }

    fn run(input: &str) -> (String, Outcome) {
        let mut doc = parse_str(input).unwrap();
        let outcome = transform(&mut doc).unwrap();
        let output = String::from_utf8(write_document(&doc).unwrap()).unwrap();
        (output, outcome)
    }

    fn notes_back(notes: &str) -> String {
        format!("<back><div type=\"notes\">{notes}</div></back>")
    }

    /// Depth-first search for the nth `note place="inline"` element.
    fn nth_inline_note_mut<'a>(elem: &'a mut Element, n: &mut usize) -> Option<&'a mut Element> {
        for child in elem.children.iter_mut() {
            if let Node::Element(e) = child {
                if e.is_named(TEI_NS, "note") && e.attr("place") == Some("inline") {
                    if *n == 0 {
                        return Some(e);
                    }
                    *n -= 1;
                } else if let Some(found) = nth_inline_note_mut(e, n) {
                    return Some(found);
                }
            }
        }
        None
    }

    #[test]
    fn test_basic_inlining() {
        let input = tei(
            "<p>Text<ref target=\"#N1\"/>.</p>",
            &notes_back("<note xml:id=\"N1\">Content.</note>"),
        );
        let (output, outcome) = run(&input);

        assert!(output.contains("<p>Text<note place=\"inline\">Content.</note>.</p>"));
        assert!(!output.contains("<back"));
        assert!(!output.contains("type=\"notes\""));
        assert_eq!(outcome.status, Status::Processed);
        assert_eq!(outcome.stats.endnotes_found, 1);
        assert_eq!(outcome.stats.references_inlined, 1);
        assert!(outcome.stats.warnings.is_empty());
    }

    #[test]
    fn test_no_notes_division_passes_through_unchanged() {
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", "");
        let (output, outcome) = run(&input);

        assert_eq!(output, input);
        assert_eq!(outcome.status, Status::NoEndnotes);
        assert_eq!(outcome.stats.endnotes_found, 0);
        assert_eq!(outcome.stats.references_inlined, 0);
    }

    #[test]
    fn test_duplicated_reference_yields_independent_copies() {
        let input = tei(
            "<p>One<ref target=\"#N1\"/> two<ref target=\"#N1\"/>.</p>",
            &notes_back("<note xml:id=\"N1\">Content.</note>"),
        );
        let mut doc = parse_str(&input).unwrap();
        let outcome = transform(&mut doc).unwrap();
        assert_eq!(outcome.stats.references_inlined, 2);

        // Mutating the first copy must not leak into the second.
        let first = nth_inline_note_mut(&mut doc.root, &mut 0).unwrap();
        first.children.push(Node::Text(" mutated".to_string()));
        let second = nth_inline_note_mut(&mut doc.root, &mut 1).unwrap();
        assert_eq!(second.text_content(), "Content.");
    }

    #[test]
    fn test_external_reference_is_left_untouched() {
        let input = tei(
            "<p>See <ref target=\"http://example.com\">here</ref>.</p>",
            &notes_back("<note xml:id=\"N1\">Content.</note>"),
        );
        let (output, outcome) = run(&input);

        assert!(output.contains("<ref target=\"http://example.com\">here</ref>"));
        assert_eq!(outcome.stats.references_inlined, 0);
        assert_eq!(outcome.stats.dangling_references, 0);
        assert_eq!(outcome.status, Status::Processed);
    }

    #[test]
    fn test_dangling_reference_warns_but_still_processes() {
        let input = tei(
            "<p>Text<ref target=\"#N9\"/>.</p>",
            &notes_back("<note xml:id=\"N1\">Content.</note>"),
        );
        let (output, outcome) = run(&input);

        assert!(output.contains("<ref target=\"#N9\"/>"));
        assert_eq!(outcome.status, Status::Processed);
        assert_eq!(outcome.stats.dangling_references, 1);
        assert_eq!(outcome.stats.warnings.len(), 1);
        assert!(outcome.stats.warnings[0].contains("#N9"));
    }

    #[test]
    fn test_back_with_other_divisions_is_retained() {
        let back = "<back><div type=\"notes\">\
                    <note xml:id=\"N1\">Content.</note></div>\
                    <div type=\"bibliography\"><bibl>Works</bibl></div></back>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", back);
        let (output, _) = run(&input);

        assert!(output.contains("<back>"));
        assert!(output.contains("<div type=\"bibliography\"><bibl>Works</bibl></div>"));
        assert!(!output.contains("type=\"notes\""));
    }

    #[test]
    fn test_nested_markup_is_preserved_in_copies() {
        let note = "<note xml:id=\"N1\"><p>First <hi rend=\"italic\">emphatic</hi> \
                    and <foreign xml:lang=\"la\">latina</foreign>.</p><p>Second.</p></note>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", &notes_back(note));
        let (output, outcome) = run(&input);

        assert!(output.contains(
            "<note place=\"inline\"><p>First <hi rend=\"italic\">emphatic</hi> \
             and <foreign xml:lang=\"la\">latina</foreign>.</p><p>Second.</p></note>"
        ));
        assert_eq!(outcome.stats.references_inlined, 1);
    }

    #[test]
    fn test_identifier_is_not_carried_onto_copies() {
        let input = tei(
            "<p>Text<ref target=\"#N1\"/>.</p>",
            &notes_back("<note xml:id=\"N1\" n=\"7\">Content.</note>"),
        );
        let (output, _) = run(&input);

        assert!(!output.contains("xml:id=\"N1\""));
        assert!(!output.contains("n=\"7\""));
        assert!(output.contains("<note place=\"inline\">Content.</note>"));
    }

    #[test]
    fn test_header_references_are_skipped() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <TEI xmlns=\"http://www.tei-c.org/ns/1.0\">\
             <teiHeader><fileDesc><ref target=\"#N1\"/></fileDesc></teiHeader>\
             <text><body><p>Text<ref target=\"#N1\"/>.</p></body>\
             <back><div type=\"notes\"><note xml:id=\"N1\">Content.</note></div></back>\
             </text></TEI>";
        let (output, outcome) = run(input);

        assert!(output.contains("<teiHeader><fileDesc><ref target=\"#N1\"/></fileDesc></teiHeader>"));
        assert_eq!(outcome.stats.references_inlined, 1);
    }

    #[test]
    fn test_reference_inside_copied_content_is_not_revisited() {
        let notes = "<note xml:id=\"N1\">See also<ref target=\"#N2\"/>.</note>\
                     <note xml:id=\"N2\">Other.</note>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", &notes_back(notes));
        let (output, outcome) = run(&input);

        assert!(output.contains("<note place=\"inline\">See also<ref target=\"#N2\"/>.</note>"));
        assert_eq!(outcome.stats.references_inlined, 1);
        assert!(outcome.stats.warnings.is_empty());
    }

    #[test]
    fn test_unreferenced_endnotes_are_discarded_with_the_division() {
        let notes = "<note xml:id=\"N1\">Used.</note><note xml:id=\"N2\">Unused.</note>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", &notes_back(notes));
        let (output, outcome) = run(&input);

        assert!(!output.contains("Unused."));
        assert_eq!(outcome.stats.endnotes_found, 2);
        assert_eq!(outcome.stats.references_inlined, 1);
        assert_eq!(outcome.status, Status::Processed);
    }

    #[test]
    fn test_note_without_identifier_is_ineligible() {
        let notes = "<note>Anonymous.</note><note xml:id=\"N1\">Named.</note>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", &notes_back(notes));
        let (output, outcome) = run(&input);

        assert_eq!(outcome.stats.endnotes_found, 1);
        assert!(!output.contains("Anonymous."));
        assert!(output.contains("<note place=\"inline\">Named.</note>"));
    }

    #[test]
    fn test_duplicate_identifier_keeps_first_and_warns() {
        let notes = "<note xml:id=\"N1\">First.</note><note xml:id=\"N1\">Second.</note>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", &notes_back(notes));
        let (output, outcome) = run(&input);

        assert!(output.contains("<note place=\"inline\">First.</note>"));
        assert!(!output.contains("Second."));
        assert_eq!(outcome.stats.endnotes_found, 1);
        assert_eq!(outcome.stats.warnings.len(), 1);
        assert!(outcome.stats.warnings[0].contains("duplicate"));
    }

    #[test]
    fn test_multiple_notes_divisions_fail_structurally() {
        let back = "<back><div type=\"notes\"><note xml:id=\"N1\">A.</note></div>\
                    <div type=\"notes\"><note xml:id=\"N2\">B.</note></div></back>";
        let input = tei("<p>Text<ref target=\"#N1\"/>.</p>", back);
        let mut doc = parse_str(&input).unwrap();

        let err = transform(&mut doc).unwrap_err();
        assert!(matches!(err, TeinlineError::Structure(_)));
    }

    #[test]
    fn test_division_without_eligible_notes_is_still_removed() {
        let input = tei(
            "<p>Text.</p>",
            "<back><div type=\"notes\"><note>Anonymous.</note></div></back>",
        );
        let (output, outcome) = run(&input);

        assert_eq!(outcome.status, Status::Processed);
        assert_eq!(outcome.stats.endnotes_found, 0);
        assert!(!output.contains("<back"));
    }

    #[test]
    fn test_empty_division_removed_with_whitespace_only_back() {
        let input = tei(
            "<p>Text.</p>",
            "<back>\n  <div type=\"notes\">\n    <note xml:id=\"N1\">A.</note>\n  </div>\n</back>",
        );
        let (output, outcome) = run(&input);

        assert_eq!(outcome.status, Status::Processed);
        assert!(!output.contains("<back"));
    }

    #[test]
    fn test_prefixed_document_produces_prefixed_inline_notes() {
        let input = "<tei:TEI xmlns:tei=\"http://www.tei-c.org/ns/1.0\">\
             <tei:text><tei:body><tei:p>Text<tei:ref target=\"#N1\"/>.</tei:p></tei:body>\
             <tei:back><tei:div type=\"notes\">\
             <tei:note xml:id=\"N1\">Content.</tei:note></tei:div></tei:back>\
             </tei:text></tei:TEI>";
        let (output, outcome) = run(input);

        assert!(output.contains("<tei:note place=\"inline\">Content.</tei:note>"));
        assert!(!output.contains("tei:back"));
        assert_eq!(outcome.stats.references_inlined, 1);
    }

    #[test]
    fn test_document_order_of_untouched_elements_is_preserved() {
        let body = "<p>A<ref target=\"#N1\"/></p><p>B</p><lg><l>line</l></lg><p>C</p>";
        let input = tei(body, &notes_back("<note xml:id=\"N1\">n</note>"));
        let (output, _) = run(&input);

        let expected = "<p>A<note place=\"inline\">n</note></p><p>B</p><lg><l>line</l></lg><p>C</p>";
        assert!(output.contains(expected));
    }
}
