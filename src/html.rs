//! HTML diff rendering (§4.F): reconstructs a tag tree from the flat symbol
//! diff the HTML parser produces, then emits HTML that visibly marks the
//! inserted/deleted regions without ever letting a marker straddle a tag
//! delimiter.

use crate::diff::Operation;
use crate::engine::Dmp;
use crate::error::{Error, Result};
use crate::parser::parse_html;
use crate::templates::{self, TemplateName, TextData};

/// Tag names that never need an explicit `/` to be self-closing.
const ALWAYS_SELF_CLOSING: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr", "!doctype",
];

/// A node of the reconstructed HTML-diff tree.
///
/// Invariant: `children` is `Some` only when `is_tag && is_start_tag &&
/// !self_closing` — every other kind of segment is a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSeg {
    pub text: String,
    pub op: Operation,
    pub is_tag: bool,
    pub is_start_tag: bool,
    pub self_closing: bool,
    pub tag_name: String,
    pub children: Option<Vec<DiffSeg>>,
}

impl DiffSeg {
    /// This segment's children, or [`Error::LogicError`] if it's a leaf —
    /// reading children from a non-container segment is a programming
    /// mistake in the caller, not a recoverable condition.
    pub fn children(&self) -> Result<&[DiffSeg]> {
        self.children
            .as_deref()
            .ok_or_else(|| Error::LogicError(format!("diff segment {:?} has no children", self.text)))
    }
}

/// Classifies one symbol's text into a childless [`DiffSeg`], per the
/// flattening rules: a leading `<!--` is a (self-closing) comment, a leading
/// `<` is a tag (start/end/self-closing determined by its own text), and
/// anything else is plain text.
fn classify(text: &str, op: Operation) -> DiffSeg {
    let trimmed = text.trim();

    if trimmed.starts_with("<!--") {
        return DiffSeg {
            text: text.to_string(),
            op,
            is_tag: true,
            is_start_tag: true,
            self_closing: true,
            tag_name: String::new(),
            children: None,
        };
    }

    if let Some(rest) = trimmed.strip_prefix('<') {
        let is_start_tag = !rest.starts_with('/');
        let name_start = if is_start_tag { 0 } else { 1 };
        let tag_name: String = rest[name_start..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect::<String>()
            .to_lowercase();
        let self_closing = trimmed.ends_with("/>") || ALWAYS_SELF_CLOSING.contains(&tag_name.as_str());
        return DiffSeg {
            text: text.to_string(),
            op,
            is_tag: true,
            is_start_tag,
            self_closing,
            tag_name,
            children: None,
        };
    }

    DiffSeg { text: text.to_string(), op, is_tag: false, is_start_tag: false, self_closing: false, tag_name: String::new(), children: None }
}

fn is_matching_end_tag(seg: &DiffSeg, open_name: &str) -> bool {
    seg.is_tag && !seg.is_start_tag && !seg.self_closing && seg.tag_name == open_name
}

/// Recursive grouping: consumes `segs[*pos..]`, stopping (without consuming)
/// when it would need to return control to a caller looking for its own
/// `open_name`'s matching end tag. A start tag recurses to find its own
/// matching end tag; when found, the parent's `op` is overwritten with the
/// end tag's `op` (the diff engine tends to attribute closing tags to
/// whichever change surrounds them) and the end tag becomes the final
/// child. A start tag that runs off the end of `segs` instead gets a
/// synthesized end tag carrying its own (pre-overwrite) operation.
fn collect_until(segs: &[DiffSeg], pos: &mut usize, open_name: &str) -> (Vec<DiffSeg>, Option<DiffSeg>) {
    let mut children = Vec::new();

    while *pos < segs.len() {
        if !open_name.is_empty() && is_matching_end_tag(&segs[*pos], open_name) {
            let end = segs[*pos].clone();
            *pos += 1;
            return (children, Some(end));
        }

        let seg = segs[*pos].clone();
        *pos += 1;

        if seg.is_tag && seg.is_start_tag && !seg.self_closing {
            let mut node = seg;
            let name = node.tag_name.clone();
            let (mut sub_children, end_seg) = collect_until(segs, pos, &name);
            match end_seg {
                Some(end) => {
                    node.op = end.op;
                    sub_children.push(end);
                }
                None => {
                    sub_children.push(DiffSeg {
                        text: format!("</{name}>"),
                        op: node.op,
                        is_tag: true,
                        is_start_tag: false,
                        self_closing: false,
                        tag_name: name,
                        children: None,
                    });
                }
            }
            node.children = Some(sub_children);
            children.push(node);
        } else {
            children.push(seg);
        }
    }

    (children, None)
}

fn subtree_same_op(seg: &DiffSeg) -> bool {
    match &seg.children {
        None => true,
        Some(children) => children.iter().all(|c| c.op == seg.op && subtree_same_op(c)),
    }
}

fn collect_raw(seg: &DiffSeg, out: &mut String) {
    out.push_str(&seg.text);
    if let Some(children) = &seg.children {
        for c in children {
            collect_raw(c, out);
        }
    }
}

fn emit(seg: &DiffSeg, formatter: &dyn Formatter, out: &mut String) {
    if !seg.is_tag {
        out.push_str(&formatter.text_for_change(&seg.text, seg.op));
        return;
    }

    if subtree_same_op(seg) {
        let mut raw = String::new();
        collect_raw(seg, &mut raw);
        out.push_str(&formatter.text_for_change(&raw, seg.op));
        return;
    }

    out.push_str(&seg.text);
    if let Some(children) = &seg.children {
        emit_children_coalesced(children, formatter, out);
    }
}

/// Scans a mixed-operation tag's children left to right, coalescing maximal
/// runs of same-operation uniform subtrees into one formatter call each,
/// and recursing into any subtree that is itself mixed.
fn emit_children_coalesced(children: &[DiffSeg], formatter: &dyn Formatter, out: &mut String) {
    let mut i = 0;
    while i < children.len() {
        if !subtree_same_op(&children[i]) {
            emit(&children[i], formatter, out);
            i += 1;
            continue;
        }

        let op = children[i].op;
        let mut raw = String::new();
        let mut j = i;
        while j < children.len() && subtree_same_op(&children[j]) && children[j].op == op {
            collect_raw(&children[j], &mut raw);
            j += 1;
        }
        out.push_str(&formatter.text_for_change(&raw, op));
        i = j;
    }
}

/// A pluggable `(text, op) -> string` rendering capability for leaf text and
/// uniform-operation subtrees.
pub trait Formatter {
    fn text_for_change(&self, text: &str, op: Operation) -> String;
}

/// Wraps deleted text in a line-through red `<del>` and inserted text in an
/// underlined green `<ins>`; equal text passes through unchanged.
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn text_for_change(&self, text: &str, op: Operation) -> String {
        match op {
            Operation::Equal => text.to_string(),
            Operation::Delete => templates::render(TemplateName::Del, &TextData { text }),
            Operation::Insert => templates::render(TemplateName::Ins, &TextData { text }),
        }
    }
}

/// Parses `a` and `b` as HTML, diffs them, and renders the result as an
/// HTML string with `formatter` marking the inserted/deleted regions. The
/// surrounding markup stays syntactically valid: markers never straddle a
/// tag delimiter.
pub fn html_diff(dmp: &Dmp, a: &str, b: &str, formatter: &impl Formatter) -> Result<String> {
    let sa = parse_html(a);
    let sb = parse_html(b);

    let mut diffs = dmp.diff_main(&sa, &sb);
    dmp.diff_cleanup_semantic(&mut diffs);

    let flat: Vec<DiffSeg> = diffs
        .iter()
        .flat_map(|d| d.symbols.iter().map(move |s| classify(&s.to_text(), d.op)))
        .collect();

    let mut pos = 0;
    let (roots, _) = collect_until(&flat, &mut pos, "");

    let mut out = String::new();
    for seg in &roots {
        emit(seg, formatter, &mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_only_the_inserted_word() {
        let dmp = Dmp::new();
        let out = html_diff(&dmp, "<p>Hello world</p>", "<p>Hello brave world</p>", &DefaultFormatter).unwrap();
        assert!(out.starts_with("<p>Hello "));
        assert!(out.contains("<ins"));
        assert!(out.contains("brave"));
        assert!(out.ends_with("world</p>"));
        assert!(!out.contains("<de"));
    }

    #[test]
    fn identical_input_has_no_markers() {
        let dmp = Dmp::new();
        let out = html_diff(&dmp, "<p>Hello world</p>", "<p>Hello world</p>", &DefaultFormatter).unwrap();
        assert_eq!(out, "<p>Hello world</p>");
    }

    #[test]
    fn whole_paragraph_deletion_wraps_the_tag_pair_together() {
        let dmp = Dmp::new();
        let out = html_diff(&dmp, "<p>Gone</p><p>Stays</p>", "<p>Stays</p>", &DefaultFormatter).unwrap();
        assert!(out.contains("<del"));
        assert!(out.contains("<p>Stays</p>"));
    }

    #[test]
    fn self_closing_void_tag_is_classified_without_children() {
        let seg = classify("<br>", Operation::Equal);
        assert!(seg.is_tag);
        assert!(seg.self_closing);
        assert_eq!(seg.tag_name, "br");
    }

    #[test]
    fn explicit_self_closing_slash_is_honored() {
        let seg = classify("<custom-widget/>", Operation::Equal);
        assert!(seg.self_closing);
    }

    #[test]
    fn comment_is_a_self_closing_leaf() {
        let seg = classify("<!-- note -->", Operation::Insert);
        assert!(seg.is_tag);
        assert!(seg.self_closing);
    }

    #[test]
    fn unclosed_tag_gets_a_synthesized_end_tag() {
        let segs = vec![classify("<div>", Operation::Equal), classify("text", Operation::Equal)];
        let mut pos = 0;
        let (roots, _) = collect_until(&segs, &mut pos, "");
        assert_eq!(roots.len(), 1);
        let children = roots[0].children().unwrap();
        assert_eq!(children.last().unwrap().text, "</div>");
        assert_eq!(children.last().unwrap().op, roots[0].op);
    }

    #[test]
    fn leaf_children_accessor_errors() {
        let seg = classify("text", Operation::Equal);
        assert!(seg.children().is_err());
    }
}
