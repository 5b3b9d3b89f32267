use std::collections::HashMap;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::ast::{AnnotatedName, Flag, FlagSet};

#[derive(Parser)]
#[grammar = "parser/annotation.pest"] // relative to src
pub struct AnnotationParser;

lazy_static! {
    static ref FLAG_KEYWORDS: HashMap<&'static str, Flag> =
        Flag::ALL.iter().map(|f| (f.keyword(), *f)).collect();
}

impl AnnotationParser {
    /// Splits `"(flag ...) name"` into its flags and bare name.
    ///
    /// Returns `None` when the key is not an annotated name. Keys that look
    /// like an annotation but do not match the grammar (an unknown token, an
    /// empty flag list, a missing name) are also `None`; callers use the key
    /// verbatim in that case.
    pub fn parse_annotated_name(key: &str) -> Option<AnnotatedName> {
        if !key.starts_with('(') {
            return None;
        }
        let mut pairs = match AnnotationParser::parse(Rule::annotated_name, key) {
            Ok(pairs) => pairs,
            Err(_) => {
                log::debug!("annotation fallback: {:?} is used as a literal name", key);
                return None;
            }
        };
        let root = pairs.next()?;
        Some(build_annotated_name(root))
    }
}

fn build_annotated_name(pair: Pair<Rule>) -> AnnotatedName {
    let mut flags = FlagSet::empty();
    let mut name = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::flag => {
                if let Some(flag) = FLAG_KEYWORDS.get(inner.as_str()) {
                    flags.insert(*flag);
                }
            }
            Rule::name => name = inner.as_str().to_string(),
            _ => { /* EOI */ }
        }
    }
    AnnotatedName { flags, name }
}
