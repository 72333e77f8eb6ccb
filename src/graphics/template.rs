//! `$name` / `${name}` substitution for the bundled `.dot` templates.
//!
//! `$$` yields a literal `$`. A placeholder with no value is an error so a
//! renamed key cannot silently produce a broken graph. A `$` that does not
//! start a placeholder is also an error.

use anyhow::{bail, Result};
use std::collections::BTreeMap;

pub fn substitute(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], &braced[end + 1..]),
                None => bail!("unterminated placeholder near '${}'", preview(after)),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], &after[end..])
        };

        if !is_identifier(name) {
            bail!("invalid placeholder near '${}'", preview(after));
        }
        match values.get(name) {
            Some(value) => out.push_str(value),
            None => bail!("no value for template placeholder '{}'", name),
        }
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(16) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_braced_and_bare_placeholders() {
        let v = values(&[("ds_bins__count", "3"), ("name", "x")]);
        let out = substitute("rowspan=\"${ds_bins__count}\" $name;", &v).unwrap();
        assert_eq!(out, "rowspan=\"3\" x;");
    }

    #[test]
    fn test_dollar_escape() {
        let out = substitute("cost: $$5", &BTreeMap::new()).unwrap();
        assert_eq!(out, "cost: $5");
    }

    #[test]
    fn test_missing_key_is_error() {
        let err = substitute("${absent}", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_unterminated_and_invalid_placeholders() {
        assert!(substitute("${open", &BTreeMap::new()).is_err());
        assert!(substitute("$ alone", &BTreeMap::new()).is_err());
        assert!(substitute("${1abc}", &values(&[("1abc", "x")])).is_err());
    }

    #[test]
    fn test_value_is_not_rescanned() {
        let v = values(&[("a", "$b")]);
        assert_eq!(substitute("${a}", &v).unwrap(), "$b");
    }
}
