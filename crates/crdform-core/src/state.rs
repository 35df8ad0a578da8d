//! Block state derived from objects read back from the cluster

use serde_json::{Map, Value};

use crate::catalog::ResourceType;
use crate::convert::from_wire_object;
use crate::model::{ObjectId, ResourceOptions};
use crate::schema::Schema;

/// Identity of an object as read from the cluster
pub fn object_id(object: &Value) -> Option<ObjectId> {
    let metadata = object.get("metadata")?;
    let name = metadata.get("name")?.as_str()?;
    Some(match metadata.get("namespace").and_then(Value::as_str) {
        Some(ns) => ObjectId::namespaced(ns, name),
        None => ObjectId::cluster(name),
    })
}

/// Resource state from an object, carrying the options over from `config`
///
/// Options never reach the cluster, so the configured values are the only
/// source for them; unset options are stored as null.
pub fn resource_state(rt: &ResourceType, object: &Value, config: &Value) -> Value {
    let mut state = from_schema(rt.resource_schema(), object);
    for name in ResourceOptions::ATTRIBUTES {
        let value = config.get(name).cloned().unwrap_or(Value::Null);
        state.insert(name.to_string(), value);
    }
    Value::Object(state)
}

/// Resource state of an imported object
///
/// There is no configuration to carry options over from, so options with a
/// schema default (`force_conflicts`, `deletion_propagation`) get that default
/// and the others stay null.
pub fn imported_state(rt: &ResourceType, object: &Value) -> Value {
    let defaults: Map<String, Value> = rt
        .resource_schema()
        .attributes
        .iter()
        .filter(|(name, _)| ResourceOptions::ATTRIBUTES.contains(&name.as_str()))
        .filter_map(|(name, attr)| attr.default.clone().map(|d| (name.clone(), d)))
        .collect();
    resource_state(rt, object, &Value::Object(defaults))
}

/// Data source state from an object
pub fn data_source_state(rt: &ResourceType, object: &Value) -> Value {
    Value::Object(from_schema(rt.data_source_schema(), object))
}

fn from_schema(schema: &Schema, object: &Value) -> Map<String, Value> {
    let mut state = match from_wire_object(object, &schema.attributes) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let id = object_id(object)
        .map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::Null);
    state.insert("id".to_string(), id);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use serde_json::json;

    fn recording_rule() -> ResourceType {
        Catalog::builtin()
            .unwrap()
            .get("k8s_loki_grafana_com_recording_rule_v1")
            .unwrap()
            .clone()
    }

    fn object() -> Value {
        json!({
            "apiVersion": "loki.grafana.com/v1",
            "kind": "RecordingRule",
            "metadata": {
                "name": "rates",
                "namespace": "logging",
                "uid": "0d7c",
                "resourceVersion": "42",
                "labels": {"team": "obs"}
            },
            "spec": {
                "tenantID": "application",
                "groups": [{
                    "name": "rates",
                    "interval": "1m",
                    "rules": [{"record": "job:rate", "expr": "sum(rate({job=\"a\"}[1m]))"}]
                }]
            },
            "status": {"conditions": []}
        })
    }

    #[test]
    fn test_resource_state() {
        let config = json!({"force_conflicts": true, "field_manager": null});
        let state = resource_state(&recording_rule(), &object(), &config);

        assert_eq!(state["id"], "logging/rates");
        assert_eq!(state["api_version"], "loki.grafana.com/v1");
        assert_eq!(state["kind"], "RecordingRule");
        assert_eq!(state["metadata"]["name"], "rates");
        assert_eq!(state["metadata"]["annotations"], Value::Null);
        assert!(state["metadata"].get("uid").is_none());
        assert_eq!(state["spec"]["tenant_id"], "application");
        assert_eq!(state["spec"]["groups"][0]["limit"], Value::Null);
        assert_eq!(state["spec"]["groups"][0]["rules"][0]["record"], "job:rate");
        assert!(state.get("status").is_none());

        assert_eq!(state["force_conflicts"], true);
        assert_eq!(state["wait_for_delete"], Value::Null);
    }

    #[test]
    fn test_imported_state_has_option_defaults() {
        let state = imported_state(&recording_rule(), &object());

        assert_eq!(state["id"], "logging/rates");
        assert_eq!(state["force_conflicts"], false);
        assert_eq!(state["deletion_propagation"], "Background");
        assert_eq!(state["field_manager"], Value::Null);
        assert_eq!(state["wait_for_upsert"], Value::Null);
        assert_eq!(state["wait_for_delete"], Value::Null);
    }

    #[test]
    fn test_data_source_state() {
        let state = data_source_state(&recording_rule(), &object());
        assert_eq!(state["id"], "logging/rates");
        assert_eq!(state["metadata"]["labels"]["team"], "obs");
        assert!(state.get("force_conflicts").is_none());
    }

    #[test]
    fn test_object_id() {
        assert_eq!(
            object_id(&object()),
            Some(ObjectId::namespaced("logging", "rates"))
        );
        assert_eq!(
            object_id(&json!({"metadata": {"name": "global"}})),
            Some(ObjectId::cluster("global"))
        );
        assert_eq!(object_id(&json!({})), None);
    }
}
