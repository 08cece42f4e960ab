use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;

// (ids, classes, tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity(u16, u16, u16);

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

// Descendant combinator chain, outermost ancestor first.
#[derive(Debug, Clone)]
struct Selector {
    parts: Vec<Compound>,
    specificity: Specificity,
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    declarations: String,
    order: usize,
}

/// Rules from every embedded `<style>` element. Only type, class, id and
/// descendant selectors are understood; rules using anything else are dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn from_document(doc: &roxmltree::Document<'_>) -> Self {
        let mut out = Stylesheet::default();
        let mut order = 0usize;

        for node in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("style"))
        {
            let css: String = node
                .children()
                .filter_map(|c| c.text())
                .collect::<Vec<_>>()
                .join("");
            let css = css.trim();
            if css.is_empty() {
                continue;
            }
            let Ok(sheet) = StyleSheet::parse(css, ParserOptions::default()) else {
                continue;
            };
            collect_rules(sheet.rules, &mut out.rules, &mut order);
        }

        out
    }

    /// Declaration blocks of the rules matching `node`, in cascade order
    /// (specificity, then source order).
    pub fn matching(&self, node: roxmltree::Node<'_, '_>) -> Vec<&str> {
        if self.rules.is_empty() || !node.is_element() {
            return Vec::new();
        }
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| selector_matches(node, &rule.selector))
            .collect();
        matched.sort_by(|a, b| {
            a.selector
                .specificity
                .cmp(&b.selector.specificity)
                .then(a.order.cmp(&b.order))
        });
        matched.into_iter().map(|r| r.declarations.as_str()).collect()
    }
}

fn collect_rules(rules: CssRuleList<'_>, out: &mut Vec<Rule>, order: &mut usize) {
    for rule in rules.0 {
        match rule {
            CssRule::Style(style_rule) => {
                let selectors = style_rule
                    .selectors
                    .to_css_string(PrinterOptions::default())
                    .unwrap_or_default();
                let declarations = style_rule
                    .declarations
                    .to_css_string(PrinterOptions::default())
                    .unwrap_or_default();
                if !declarations.trim().is_empty() {
                    for raw in selectors.split(',') {
                        if let Some(selector) = parse_selector(raw) {
                            out.push(Rule {
                                selector,
                                declarations: declarations.clone(),
                                order: *order,
                            });
                        }
                    }
                }
                *order += 1;
            }
            CssRule::Media(media) => collect_rules(media.rules, out, order),
            _ => {}
        }
    }
}

fn parse_selector(raw: &str) -> Option<Selector> {
    let parts: Vec<Compound> = raw
        .split_whitespace()
        .map(parse_compound)
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }
    let ids = parts.iter().filter(|p| p.id.is_some()).count() as u16;
    let classes = parts.iter().map(|p| p.classes.len()).sum::<usize>() as u16;
    let tags = parts.iter().filter(|p| p.tag.is_some()).count() as u16;
    Some(Selector {
        parts,
        specificity: Specificity(ids, classes, tags),
    })
}

fn parse_compound(token: &str) -> Option<Compound> {
    if token.is_empty() || token.contains([':', '[', ']', '>', '+', '~']) {
        return None;
    }
    let bytes = token.as_bytes();
    let mut i = 0usize;
    let mut out = Compound::default();

    if bytes[0] == b'*' {
        i = 1;
    } else if is_ident_start(bytes[0]) {
        while i < bytes.len() && is_ident_char(bytes[i]) {
            i += 1;
        }
        out.tag = Some(token[..i].to_string());
    }

    while i < bytes.len() {
        let marker = bytes[i];
        i += 1;
        let start = i;
        while i < bytes.len() && is_ident_char(bytes[i]) {
            i += 1;
        }
        if start == i {
            return None;
        }
        let name = token[start..i].to_string();
        match marker {
            b'.' => out.classes.push(name),
            b'#' if out.id.is_none() => out.id = Some(name),
            _ => return None,
        }
    }

    if out.tag.is_none() && out.id.is_none() && out.classes.is_empty() && bytes[0] != b'*' {
        return None;
    }
    Some(out)
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, b'_' | b'-')
}

fn compound_matches(node: roxmltree::Node<'_, '_>, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        // SVG tag names are case-sensitive (linearGradient).
        if node.tag_name().name() != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attribute("id") != Some(id.as_str()) {
            return false;
        }
    }
    if compound.classes.is_empty() {
        return true;
    }
    let Some(node_classes) = node.attribute("class") else {
        return false;
    };
    compound
        .classes
        .iter()
        .all(|wanted| node_classes.split_whitespace().any(|c| c == wanted))
}

fn parent_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.ancestors().skip(1).find(|n| n.is_element())
}

fn selector_matches(node: roxmltree::Node<'_, '_>, selector: &Selector) -> bool {
    let Some((last, ancestors)) = selector.parts.split_last() else {
        return false;
    };
    if !compound_matches(node, last) {
        return false;
    }

    let mut anchor = parent_element(node);
    for part in ancestors.iter().rev() {
        let mut probe = anchor;
        loop {
            let Some(candidate) = probe else {
                return false;
            };
            if compound_matches(candidate, part) {
                anchor = parent_element(candidate);
                break;
            }
            probe = parent_element(candidate);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_by_id<'a, 'input>(
        doc: &'a roxmltree::Document<'input>,
        id: &str,
    ) -> roxmltree::Node<'a, 'input> {
        doc.descendants()
            .find(|n| n.attribute("id") == Some(id))
            .expect("node with id exists")
    }

    #[test]
    fn matches_type_class_id_and_descendant_selectors() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <style>
                rect { fill: red }
                .warn { stroke: orange }
                #hero { stroke-width: 3 }
                g.layer path { fill: blue }
                a:hover { fill: pink }
            </style>
            <g class="layer"><path id="p" d="M0 0"/></g>
            <rect id="hero" class="warn big"/>
        </svg>"##;
        let doc = roxmltree::Document::parse(svg).expect("test svg should parse");
        let sheet = Stylesheet::from_document(&doc);

        let rect = sheet.matching(node_by_id(&doc, "hero"));
        assert_eq!(rect.len(), 3);
        // Type selector first, id selector last.
        assert!(rect[0].contains("fill"));
        assert!(rect[2].contains("stroke-width"));

        let path = sheet.matching(node_by_id(&doc, "p"));
        assert_eq!(path.len(), 1);
        assert!(path[0].contains("fill"));
    }

    #[test]
    fn equal_specificity_keeps_source_order() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <style>.a { stroke-width: 1 } .b { stroke-width: 7 }</style>
            <rect id="r" class="b a"/>
        </svg>"##;
        let doc = roxmltree::Document::parse(svg).expect("test svg should parse");
        let sheet = Stylesheet::from_document(&doc);
        let blocks = sheet.matching(node_by_id(&doc, "r"));
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].contains('7'));
    }

    #[test]
    fn unsupported_selectors_are_dropped() {
        assert!(parse_selector("a:hover").is_none());
        assert!(parse_selector("g > rect").is_none());
        assert!(parse_selector("rect[fill]").is_none());
        assert!(parse_selector("*").is_some());
        let s = parse_selector("g.x #y").expect("descendant selector");
        assert_eq!(s.specificity, Specificity(1, 1, 1));
    }
}
