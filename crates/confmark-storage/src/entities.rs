//! Entity references in storage markup.
//!
//! Confluence emits HTML entities (`&nbsp;`, `&rsquo;`) that XML does not
//! define. They are resolved when the reader reports a reference, so CDATA
//! content is never touched.

use quick_xml::escape::resolve_predefined_entity;

/// Named entities and their Unicode replacements.
const HTML_ENTITIES: &[(&str, &str)] = &[
    // Spacing and punctuation
    ("nbsp", "\u{00a0}"),
    ("ensp", "\u{2002}"),
    ("emsp", "\u{2003}"),
    ("thinsp", "\u{2009}"),
    ("zwnj", "\u{200c}"),
    ("zwj", "\u{200d}"),
    ("shy", "\u{00ad}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{00b7}"),
    ("iexcl", "\u{00a1}"),
    ("iquest", "\u{00bf}"),
    // Quotes
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("sbquo", "\u{201a}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("bdquo", "\u{201e}"),
    ("laquo", "\u{00ab}"),
    ("raquo", "\u{00bb}"),
    ("lsaquo", "\u{2039}"),
    ("rsaquo", "\u{203a}"),
    // Arrows
    ("larr", "\u{2190}"),
    ("uarr", "\u{2191}"),
    ("rarr", "\u{2192}"),
    ("darr", "\u{2193}"),
    ("harr", "\u{2194}"),
    ("rArr", "\u{21d2}"),
    ("lArr", "\u{21d0}"),
    // Math
    ("le", "\u{2264}"),
    ("ge", "\u{2265}"),
    ("ne", "\u{2260}"),
    ("asymp", "\u{2248}"),
    ("plusmn", "\u{00b1}"),
    ("times", "\u{00d7}"),
    ("divide", "\u{00f7}"),
    ("minus", "\u{2212}"),
    ("infin", "\u{221e}"),
    ("deg", "\u{00b0}"),
    ("micro", "\u{00b5}"),
    ("frac14", "\u{00bc}"),
    ("frac12", "\u{00bd}"),
    ("frac34", "\u{00be}"),
    ("sup1", "\u{00b9}"),
    ("sup2", "\u{00b2}"),
    ("sup3", "\u{00b3}"),
    // Symbols
    ("copy", "\u{00a9}"),
    ("reg", "\u{00ae}"),
    ("trade", "\u{2122}"),
    ("sect", "\u{00a7}"),
    ("para", "\u{00b6}"),
    ("dagger", "\u{2020}"),
    ("Dagger", "\u{2021}"),
    ("check", "\u{2713}"),
    ("euro", "\u{20ac}"),
    ("pound", "\u{00a3}"),
    ("yen", "\u{00a5}"),
    ("cent", "\u{00a2}"),
    // Latin letters common in names
    ("auml", "\u{00e4}"),
    ("ouml", "\u{00f6}"),
    ("uuml", "\u{00fc}"),
    ("Auml", "\u{00c4}"),
    ("Ouml", "\u{00d6}"),
    ("Uuml", "\u{00dc}"),
    ("szlig", "\u{00df}"),
    ("eacute", "\u{00e9}"),
    ("egrave", "\u{00e8}"),
    ("aacute", "\u{00e1}"),
    ("oacute", "\u{00f3}"),
    ("ntilde", "\u{00f1}"),
    ("ccedil", "\u{00e7}"),
];

/// Resolve a named entity: the five XML entities first, then HTML ones.
pub(crate) fn resolve_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or_else(|| lookup(name))
}

fn lookup(name: &str) -> Option<&'static str> {
    HTML_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, value)| *value)
}

/// Decode an entity reference body (`lt`, `nbsp`, `#233`, `#x41`).
///
/// Unknown references are returned in their original `&name;` form.
pub(crate) fn decode_reference(name: &str) -> String {
    if let Some(value) = resolve_entity(name) {
        return value.to_owned();
    }
    name.strip_prefix('#')
        .and_then(|num| match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        })
        .and_then(char::from_u32)
        .map_or_else(|| format!("&{name};"), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_html_entities() {
        assert_eq!(resolve_entity("nbsp"), Some("\u{00a0}"));
        assert_eq!(resolve_entity("rsquo"), Some("\u{2019}"));
        assert_eq!(resolve_entity("bogus"), None);
    }

    #[test]
    fn test_resolve_xml_entities() {
        assert_eq!(resolve_entity("amp"), Some("&"));
        assert_eq!(resolve_entity("lt"), Some("<"));
        assert_eq!(resolve_entity("quot"), Some("\""));
    }

    #[test]
    fn test_decode_reference() {
        assert_eq!(decode_reference("lt"), "<");
        assert_eq!(decode_reference("ldquo"), "\u{201c}");
        assert_eq!(decode_reference("#233"), "\u{00e9}");
        assert_eq!(decode_reference("#x41"), "A");
        assert_eq!(decode_reference("#xZZ"), "&#xZZ;");
        assert_eq!(decode_reference("bogus"), "&bogus;");
    }
}
