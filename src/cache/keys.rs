/// 缺省过滤条件的占位值
pub const ABSENT_FILTER: &str = "all";

/// 生成数据集查询的缓存键
///
/// 格式为 `{resource}:limit={..}:offset={..}:{name}={..}...`。出现的值用 JSON
/// 字符串编码（带引号），缺省的过滤条件写成不带引号的 `all`，因此字面值 `"all"`
/// 与缺省不会混淆，值中的 `:` 或 `=` 也不会造成冲突。
pub fn dataset_key(
    resource: &str,
    limit: &str,
    offset: &str,
    filters: &[(&str, Option<&str>)],
) -> String {
    let mut key = format!(
        "{}:limit={}:offset={}",
        resource,
        quote(limit),
        quote(offset)
    );
    for (name, value) in filters {
        key.push(':');
        key.push_str(name);
        key.push('=');
        match value {
            Some(v) => key.push_str(&quote(v)),
            None => key.push_str(ABSENT_FILTER),
        }
    }
    key
}

fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_query_same_key() {
        let a = dataset_key("receitas", "10", "0", &[("orgao", Some("SEFAZ")), ("categoria", None)]);
        let b = dataset_key("receitas", "10", "0", &[("orgao", Some("SEFAZ")), ("categoria", None)]);
        assert_eq!(a, b);
        assert_eq!(a, r#"receitas:limit="10":offset="0":orgao="SEFAZ":categoria=all"#);
    }

    #[test]
    fn every_parameter_changes_the_key() {
        let base = dataset_key("receitas", "10", "0", &[("orgao", None), ("categoria", None)]);
        let variants = [
            dataset_key("despesas", "10", "0", &[("orgao", None), ("categoria", None)]),
            dataset_key("receitas", "11", "0", &[("orgao", None), ("categoria", None)]),
            dataset_key("receitas", "10", "1", &[("orgao", None), ("categoria", None)]),
            dataset_key("receitas", "10", "0", &[("orgao", Some("x")), ("categoria", None)]),
            dataset_key("receitas", "10", "0", &[("orgao", None), ("categoria", Some("x"))]),
        ];
        for variant in variants {
            assert_ne!(base, variant);
        }
    }

    #[test]
    fn literal_all_does_not_alias_absent_filter() {
        let absent = dataset_key("despesas", "100", "0", &[("categoria", None), ("orgao", None)]);
        let literal = dataset_key("despesas", "100", "0", &[("categoria", Some("all")), ("orgao", None)]);
        assert_ne!(absent, literal);
    }

    #[test]
    fn separators_inside_values_do_not_collide() {
        let a = dataset_key("receitas", "10", "0", &[("orgao", Some("a:categoria=b")), ("categoria", None)]);
        let b = dataset_key("receitas", "10", "0", &[("orgao", Some("a")), ("categoria", Some("b"))]);
        assert_ne!(a, b);

        let c = dataset_key("receitas", "10", "0", &[("orgao", Some(r#"x":categoria="y"#)), ("categoria", None)]);
        let d = dataset_key("receitas", "10", "0", &[("orgao", Some("x")), ("categoria", Some("y"))]);
        assert_ne!(c, d);
    }
}
