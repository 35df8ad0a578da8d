//! Name conversion between Kubernetes and Terraform conventions

/// Prefix shared by every block type name
pub const TYPE_PREFIX: &str = "k8s";

/// Suffix appended to the type name of the manifest data source
pub const MANIFEST_SUFFIX: &str = "_manifest";

/// Build the block type name for a CRD version
///
/// `execution.furiko.io` / `JobConfig` / `v1alpha1` becomes
/// `k8s_execution_furiko_io_job_config_v1alpha1`.
pub fn type_name(group: &str, kind: &str, version: &str) -> String {
    let group = group.replace(['.', '-'], "_");
    if group.is_empty() {
        format!("{}_{}_{}", TYPE_PREFIX, to_snake_case(kind), version)
    } else {
        format!(
            "{}_{}_{}_{}",
            TYPE_PREFIX,
            group,
            to_snake_case(kind),
            version
        )
    }
}

/// Type name of the manifest data source for a resource type name
pub fn manifest_type_name(type_name: &str) -> String {
    format!("{}{}", type_name, MANIFEST_SUFFIX)
}

/// Convert a camelCase / PascalCase JSON key into a valid attribute name
///
/// Acronym runs are kept together (`HTTPServer` -> `http_server`), characters
/// outside `[a-z0-9_]` become `_`, and a leading digit gets a `_` prefix.
pub fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_simple() {
        assert_eq!(to_snake_case("name"), "name");
        assert_eq!(to_snake_case("maxRetryAttempts"), "max_retry_attempts");
        assert_eq!(to_snake_case("apiVersion"), "api_version");
        assert_eq!(to_snake_case("JobConfig"), "job_config");
        assert_eq!(to_snake_case("LokiStack"), "loki_stack");
    }

    #[test]
    fn test_snake_case_acronyms() {
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("caURL"), "ca_url");
        assert_eq!(to_snake_case("tlsCAPath"), "tls_ca_path");
        assert_eq!(to_snake_case("s3Bucket"), "s3_bucket");
    }

    #[test]
    fn test_snake_case_special_characters() {
        assert_eq!(to_snake_case("$ref"), "_ref");
        assert_eq!(to_snake_case("x-kubernetes-int"), "x_kubernetes_int");
        assert_eq!(to_snake_case("3scale"), "_3scale");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(
            type_name("execution.furiko.io", "JobConfig", "v1alpha1"),
            "k8s_execution_furiko_io_job_config_v1alpha1"
        );
        assert_eq!(
            type_name("loki.grafana.com", "AlertingRule", "v1"),
            "k8s_loki_grafana_com_alerting_rule_v1"
        );
        assert_eq!(
            type_name("my-group.example.com", "Widget", "v2"),
            "k8s_my_group_example_com_widget_v2"
        );
    }

    #[test]
    fn test_manifest_type_name() {
        assert_eq!(
            manifest_type_name("k8s_loki_grafana_com_loki_stack_v1"),
            "k8s_loki_grafana_com_loki_stack_v1_manifest"
        );
    }
}
