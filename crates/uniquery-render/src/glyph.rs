//! Glyph sanitization for the Latin-1 target repertoire.
//!
//! [`sanitize`] composes its input (NFC), then runs three tiers in order:
//!
//! 1. [`GLYPH_MAP`] replaces known symbols with ASCII equivalents
//!    (`π` becomes `pi`, `≤` becomes `<=`).
//! 2. Characters outside Latin-1 are decomposed with NFKD and keep their
//!    ASCII part (`ŝ` becomes `s`, `ﬁ` becomes `fi`).
//! 3. Anything left is replaced: letters and digits by `?`, everything
//!    else by a single space.
//!
//! The result always encodes as Latin-1 and `sanitize(sanitize(t)) == sanitize(t)`.

use phf::phf_map;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Replacement used for letters and digits that have no representable form.
pub const UNKNOWN_GLYPH: char = '?';

/// Known out-of-repertoire symbols and their ASCII replacements.
///
/// Keys are never ASCII and values are always ASCII, so a second pass over
/// sanitized text finds nothing to replace.
pub static GLYPH_MAP: phf::Map<char, &'static str> = phf_map! {
    // quotes
    '\u{2018}' => "'",
    '\u{2019}' => "'",
    '\u{201A}' => "'",
    '\u{201B}' => "'",
    '\u{201C}' => "\"",
    '\u{201D}' => "\"",
    '\u{201E}' => "\"",
    '\u{201F}' => "\"",
    '\u{2032}' => "'",
    '\u{2033}' => "\"",
    '\u{2039}' => "<",
    '\u{203A}' => ">",
    // dashes
    '\u{2010}' => "-",
    '\u{2011}' => "-",
    '\u{2012}' => "-",
    '\u{2013}' => "-",
    '\u{2014}' => "-",
    '\u{2015}' => "-",
    '\u{2212}' => "-",
    // ellipsis and spacing
    '\u{2026}' => "...",
    '\u{2002}' => " ",
    '\u{2003}' => " ",
    '\u{2009}' => " ",
    '\u{200A}' => " ",
    '\u{200B}' => "",
    '\u{202F}' => " ",
    '\u{FEFF}' => "",
    // currency
    '\u{20AC}' => "EUR",
    '\u{00A3}' => "GBP",
    '\u{00A5}' => "JPY",
    '\u{20B9}' => "INR",
    '\u{20A9}' => "KRW",
    '\u{20BD}' => "RUB",
    '\u{20BA}' => "TRY",
    '\u{20BF}' => "BTC",
    // marks
    '\u{00A9}' => "(c)",
    '\u{00AE}' => "(r)",
    '\u{2122}' => "(tm)",
    '\u{2120}' => "(sm)",
    // math
    '\u{00B0}' => " degrees",
    '\u{00B1}' => "+/-",
    '\u{00D7}' => "x",
    '\u{00F7}' => "/",
    '\u{2264}' => "<=",
    '\u{2265}' => ">=",
    '\u{2260}' => "!=",
    '\u{2248}' => "~=",
    '\u{2261}' => "==",
    '\u{221E}' => "infinity",
    '\u{221A}' => "sqrt",
    '\u{2211}' => "sum",
    '\u{220F}' => "product",
    '\u{222B}' => "integral",
    '\u{2202}' => "d",
    '\u{2206}' => "Delta",
    '\u{2207}' => "nabla",
    '\u{221D}' => "proportional to",
    '\u{2208}' => "in",
    '\u{2209}' => "not in",
    '\u{2282}' => "subset of",
    '\u{2286}' => "subset of",
    '\u{222A}' => "union",
    '\u{2229}' => "intersection",
    '\u{2200}' => "for all",
    '\u{2203}' => "exists",
    '\u{2227}' => "and",
    '\u{2228}' => "or",
    '\u{2217}' => "*",
    '\u{22C5}' => "*",
    '\u{226A}' => "<<",
    '\u{226B}' => ">>",
    // bullets
    '\u{2022}' => "-",
    '\u{2023}' => "-",
    '\u{2043}' => "-",
    '\u{25E6}' => "-",
    '\u{25AA}' => "-",
    '\u{25AB}' => "-",
    '\u{25CF}' => "-",
    '\u{25CB}' => "-",
    '\u{25A0}' => "-",
    '\u{25A1}' => "-",
    '\u{2713}' => "v",
    '\u{2714}' => "v",
    '\u{2717}' => "x",
    '\u{2718}' => "x",
    // arrows
    '\u{2192}' => "->",
    '\u{2190}' => "<-",
    '\u{2191}' => "^",
    '\u{2193}' => "v",
    '\u{2194}' => "<->",
    '\u{21D2}' => "=>",
    '\u{21D0}' => "<=",
    '\u{21D4}' => "<=>",
    '\u{279C}' => "->",
    '\u{2794}' => "->",
    '\u{27A1}' => "->",
    // greek lowercase
    '\u{03B1}' => "alpha",
    '\u{03B2}' => "beta",
    '\u{03B3}' => "gamma",
    '\u{03B4}' => "delta",
    '\u{03B5}' => "epsilon",
    '\u{03B6}' => "zeta",
    '\u{03B7}' => "eta",
    '\u{03B8}' => "theta",
    '\u{03B9}' => "iota",
    '\u{03BA}' => "kappa",
    '\u{03BB}' => "lambda",
    '\u{03BC}' => "mu",
    '\u{03BD}' => "nu",
    '\u{03BE}' => "xi",
    '\u{03BF}' => "omicron",
    '\u{03C0}' => "pi",
    '\u{03C1}' => "rho",
    '\u{03C2}' => "sigma",
    '\u{03C3}' => "sigma",
    '\u{03C4}' => "tau",
    '\u{03C5}' => "upsilon",
    '\u{03C6}' => "phi",
    '\u{03C7}' => "chi",
    '\u{03C8}' => "psi",
    '\u{03C9}' => "omega",
    // greek uppercase
    '\u{0391}' => "Alpha",
    '\u{0392}' => "Beta",
    '\u{0393}' => "Gamma",
    '\u{0394}' => "Delta",
    '\u{0395}' => "Epsilon",
    '\u{0396}' => "Zeta",
    '\u{0397}' => "Eta",
    '\u{0398}' => "Theta",
    '\u{0399}' => "Iota",
    '\u{039A}' => "Kappa",
    '\u{039B}' => "Lambda",
    '\u{039C}' => "Mu",
    '\u{039D}' => "Nu",
    '\u{039E}' => "Xi",
    '\u{039F}' => "Omicron",
    '\u{03A0}' => "Pi",
    '\u{03A1}' => "Rho",
    '\u{03A3}' => "Sigma",
    '\u{03A4}' => "Tau",
    '\u{03A5}' => "Upsilon",
    '\u{03A6}' => "Phi",
    '\u{03A7}' => "Chi",
    '\u{03A8}' => "Psi",
    '\u{03A9}' => "Omega",
    // fractions
    '\u{00BD}' => "1/2",
    '\u{00BC}' => "1/4",
    '\u{00BE}' => "3/4",
    '\u{2153}' => "1/3",
    '\u{2154}' => "2/3",
    '\u{2155}' => "1/5",
    '\u{2156}' => "2/5",
    '\u{2157}' => "3/5",
    '\u{2158}' => "4/5",
    '\u{2159}' => "1/6",
    '\u{215A}' => "5/6",
    '\u{215B}' => "1/8",
    '\u{215C}' => "3/8",
    '\u{215D}' => "5/8",
    '\u{215E}' => "7/8",
    // superscripts
    '\u{2070}' => "^0",
    '\u{00B9}' => "^1",
    '\u{00B2}' => "^2",
    '\u{00B3}' => "^3",
    '\u{2074}' => "^4",
    '\u{2075}' => "^5",
    '\u{2076}' => "^6",
    '\u{2077}' => "^7",
    '\u{2078}' => "^8",
    '\u{2079}' => "^9",
    '\u{207A}' => "^+",
    '\u{207B}' => "^-",
    '\u{207F}' => "^n",
    // subscripts
    '\u{2080}' => "0",
    '\u{2081}' => "1",
    '\u{2082}' => "2",
    '\u{2083}' => "3",
    '\u{2084}' => "4",
    '\u{2085}' => "5",
    '\u{2086}' => "6",
    '\u{2087}' => "7",
    '\u{2088}' => "8",
    '\u{2089}' => "9",
    // sections
    '\u{00A7}' => "Section",
    '\u{00B6}' => "Paragraph",
    '\u{2020}' => "+",
    '\u{2021}' => "++",
    '\u{2030}' => " per mille",
    '\u{2031}' => " per ten thousand",
};

/// Whether `c` is in the target repertoire.
pub fn is_representable(c: char) -> bool {
    (c as u32) <= 0xFF
}

/// Whether every character of `text` is in the target repertoire.
pub fn is_encodable(text: &str) -> bool {
    text.chars().all(is_representable)
}

/// Encode text as Latin-1 bytes, or `None` if any character is out of range.
pub fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(c as u32).ok())
        .collect()
}

/// Map arbitrary text into the target repertoire.
///
/// Input is composed (NFC) first, so `e` followed by U+0301 arrives at the
/// table as `é` and passes through unchanged.
pub fn sanitize(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for c in text.nfc() {
        match GLYPH_MAP.get(&c) {
            Some(replacement) => mapped.push_str(replacement),
            None => mapped.push(c),
        }
    }

    if is_encodable(&mapped) {
        return mapped;
    }

    let mut out = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if is_representable(c) {
            out.push(c);
        } else {
            push_fallback(c, &mut out);
        }
    }
    out
}

fn push_fallback(c: char, out: &mut String) {
    // A stray diacritic has nothing to attach to once its base is gone.
    if is_combining_mark(c) {
        return;
    }

    let before = out.len();
    out.extend(std::iter::once(c).nfkd().filter(char::is_ascii));
    if out.len() > before {
        return;
    }

    if c.is_alphanumeric() {
        out.push(UNKNOWN_GLYPH);
    } else {
        out.push(' ');
    }
}
