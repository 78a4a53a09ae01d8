//! Built-in fingerprint catalog for well-known Android protectors.
//!
//! Priorities are spaced by 10 so operators can splice custom rules between
//! the defaults. Where one vendor's fingerprint is a strict subset of
//! another's, the stricter rule carries the lower (earlier) priority.

use once_cell::sync::Lazy;

use crate::core::rule::{MatchMode, Predicate, SignatureRule};
use crate::scan::catalog::SignatureCatalog;

fn name_is(pattern: &str) -> Predicate {
    Predicate::EntryName {
        pattern: pattern.to_string(),
        match_mode: MatchMode::Exact,
    }
}

fn name_starts(pattern: &str) -> Predicate {
    Predicate::EntryName {
        pattern: pattern.to_string(),
        match_mode: MatchMode::StartsWith,
    }
}

fn path_is(pattern: &str) -> Predicate {
    Predicate::EntryPath {
        pattern: pattern.to_string(),
        match_mode: MatchMode::Exact,
    }
}

fn path_starts(pattern: &str) -> Predicate {
    Predicate::EntryPath {
        pattern: pattern.to_string(),
        match_mode: MatchMode::StartsWith,
    }
}

fn any_of(conditions: Vec<Predicate>) -> Predicate {
    Predicate::AnyOf { conditions }
}

fn rule(packer_id: &str, priority: u32, predicate: Predicate) -> SignatureRule {
    SignatureRule {
        packer_id: packer_id.to_string(),
        priority,
        predicate,
    }
}

static BUILTIN: Lazy<SignatureCatalog> = Lazy::new(|| {
    let rules = vec![
        rule(
            "bangcle",
            10,
            any_of(vec![
                name_is("libsecexe.so"),
                name_is("libsecmain.so"),
                name_is("libSecShell.so"),
            ]),
        ),
        rule("qihoo360", 20, name_starts("libjiagu")),
        rule(
            "tencent_legu",
            30,
            any_of(vec![
                name_starts("libshella"),
                name_is("libshell.so"),
                path_is("assets/tosversion"),
            ]),
        ),
        rule(
            "ijiami",
            40,
            any_of(vec![
                Predicate::EntryPath {
                    pattern: "ijiami.dat".to_string(),
                    match_mode: MatchMode::EndsWith,
                },
                Predicate::AllOf {
                    conditions: vec![name_is("libexec.so"), name_is("libexecmain.so")],
                },
            ]),
        ),
        rule("baidu", 50, name_starts("libbaiduprotect")),
        rule(
            "alibaba",
            60,
            any_of(vec![
                name_starts("libsgmain"),
                name_starts("libmobisec"),
                Predicate::EntryPath {
                    pattern: "aliprotect.dat".to_string(),
                    match_mode: MatchMode::EndsWith,
                },
            ]),
        ),
        rule("nqshield", 70, name_starts("libnqshield")),
        rule("naga", 80, name_is("libddog.so")),
        rule(
            "apkprotect",
            90,
            any_of(vec![
                name_is("libAPKProtect.so"),
                Predicate::EntryContent {
                    entry: "classes.dex".to_string(),
                    needle: "apkprotect.com".to_string(),
                },
            ]),
        ),
        rule("payegis", 100, name_starts("libegis")),
        rule(
            "kiwisec",
            110,
            any_of(vec![name_starts("libkwscmm"), name_is("kdpdata.so")]),
        ),
        rule("dexprotector", 120, path_starts("assets/dp.arm")),
    ];
    SignatureCatalog::new(rules).expect("built-in catalog must validate")
});

/// The default catalog shipped with the engine.
pub fn builtin_catalog() -> &'static SignatureCatalog {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_validates_and_is_ordered() {
        let catalog = builtin_catalog();
        assert!(catalog.len() >= 12);
        let priorities: Vec<u32> = catalog
            .rules_in_priority_order()
            .iter()
            .map(|r| r.priority)
            .collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn builtin_catalog_has_one_rule_per_packer() {
        let catalog = builtin_catalog();
        let mut ids: Vec<&str> = catalog
            .rules_in_priority_order()
            .iter()
            .map(|r| r.packer_id.as_str())
            .collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
