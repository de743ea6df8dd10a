use std::collections::{BTreeSet, HashMap};

use crate::libraries::current_os_key;
use crate::manifest::{ArgValue, Argument, Rule, VersionData};

/// Placeholder values substituted into `${name}` tokens.
pub type Replacements<'a> = HashMap<&'a str, String>;

/// Expands the version's jvm and game argument templates. Versions without the
/// modern `arguments` block use the flat `minecraftArguments` string and get the
/// jvm arguments older launchers always passed.
pub fn build_arguments(
    version: &VersionData,
    replacements: &Replacements<'_>,
) -> Result<(Vec<String>, Vec<String>), String> {
    if let Some(arguments) = &version.arguments {
        let jvm = expand_args(&arguments.jvm, replacements);
        let game = expand_args(&arguments.game, replacements);
        if !jvm.is_empty() || version.minecraft_arguments.is_none() {
            return Ok((jvm, game));
        }
    }

    let raw = version
        .minecraft_arguments
        .as_deref()
        .ok_or_else(|| format!("Missing arguments in version metadata for {}", version.id))?;
    let game = raw
        .split_whitespace()
        .map(|arg| replace_tokens(arg, replacements))
        .collect();
    let jvm = ["-cp", "${classpath}"]
        .iter()
        .map(|arg| replace_tokens(arg, replacements))
        .collect();

    Ok((jvm, game))
}

pub fn unresolved_tokens(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| extract_tokens(arg))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn expand_args(args: &[Argument], replacements: &Replacements<'_>) -> Vec<String> {
    let mut expanded = Vec::new();
    for arg in args {
        match arg {
            Argument::String(value) => expanded.push(replace_tokens(value, replacements)),
            Argument::Rule { rules, value } => {
                if !rules_allow(Some(rules)) {
                    continue;
                }
                match value {
                    ArgValue::String(value) => expanded.push(replace_tokens(value, replacements)),
                    ArgValue::List(list) => expanded
                        .extend(list.iter().map(|item| replace_tokens(item, replacements))),
                }
            }
        }
    }
    expanded
}

pub(crate) fn replace_tokens(input: &str, replacements: &Replacements<'_>) -> String {
    let mut cursor = 0usize;
    let mut output = String::with_capacity(input.len());
    while let Some(start_rel) = input[cursor..].find("${") {
        let start = cursor + start_rel;
        output.push_str(&input[cursor..start]);

        let token_start = start + 2;
        let Some(end_rel) = input[token_start..].find('}') else {
            output.push_str(&input[start..]);
            cursor = input.len();
            break;
        };
        let end = token_start + end_rel;
        match replacements.get(&input[token_start..end]) {
            Some(value) => output.push_str(value),
            None => output.push_str(&input[start..=end]),
        }
        cursor = end + 1;
    }
    output.push_str(&input[cursor..]);
    output
}

fn extract_tokens(input: &str) -> Vec<String> {
    let mut cursor = 0usize;
    let mut tokens = Vec::new();
    while let Some(start_rel) = input[cursor..].find("${") {
        let start = cursor + start_rel + 2;
        let Some(end_rel) = input[start..].find('}') else {
            break;
        };
        let end = start + end_rel;
        if end > start {
            tokens.push(input[start..end].to_string());
        }
        cursor = end + 1;
    }
    tokens
}

/// Last matching rule wins; no rules means allowed, rules with no match mean
/// disallowed.
pub fn rules_allow(rules: Option<&[Rule]>) -> bool {
    let Some(rules) = rules else {
        return true;
    };

    let mut allowed = false;
    for rule in rules {
        let os_applies = rule
            .os
            .as_ref()
            .map(|os| {
                let name_ok = os
                    .name
                    .as_deref()
                    .map(|name| name == current_os_key())
                    .unwrap_or(true);
                let arch_ok = os
                    .arch
                    .as_deref()
                    .map(|arch| arch == current_rule_arch())
                    .unwrap_or(true);
                name_ok && arch_ok
            })
            .unwrap_or(true);

        if os_applies && features_match(rule.features.as_ref()) {
            allowed = rule.action == "allow";
        }
    }
    allowed
}

fn features_match(features: Option<&HashMap<String, bool>>) -> bool {
    let Some(features) = features else {
        return true;
    };
    // Demo mode, custom resolution and quick play are never requested.
    features.values().all(|expected| !*expected)
}

fn current_rule_arch() -> &'static str {
    if cfg!(target_arch = "x86") {
        "x86"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "x86_64"
    }
}
