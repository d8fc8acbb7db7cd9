use serde_json::Value;

use crate::connector::{
    nlp::scalar_to_string,
    types::{FormField, FormFieldType},
};

const VALUE_CANDIDATES: [&str; 3] = ["value", "defaultValue", "default"];

pub fn field_type_for(kind: &str) -> Option<FormFieldType> {
    let field_type = match kind {
        "textField" | "textArea" | "text" | "email" | "phoneNumber" | "password" | "url"
        | "address" => FormFieldType::Text,
        "number" | "rangeSlider" | "slider" | "range" => FormFieldType::Number,
        "radio" | "radioButton" | "checkbox" | "checkBox" => FormFieldType::RadioSet,
        "dropdown" | "select" => FormFieldType::ChoiceSet,
        "date" | "dateTime" => FormFieldType::Date,
        "toggle" | "switch" => FormFieldType::Toggle,
        _ => return None,
    };
    Some(field_type)
}

/// Derives form fields from `body.form.components`. Sub-components are lifted
/// one level; anything without usable metadata is skipped.
pub fn extract_forms(body: &Value) -> Vec<FormField> {
    let Some(components) = body
        .get("form")
        .and_then(|form| form.get("components"))
        .and_then(Value::as_array)
        .filter(|components| !components.is_empty())
    else {
        return Vec::new();
    };

    leaf_components(components)
        .into_iter()
        .filter_map(form_field)
        .collect()
}

fn leaf_components(components: &[Value]) -> Vec<&Value> {
    let mut leaves = Vec::new();
    for component in components {
        match component.get("components").and_then(Value::as_array) {
            Some(children) if !children.is_empty() => leaves.extend(children.iter()),
            _ => leaves.push(component),
        }
    }
    leaves
}

fn form_field(component: &Value) -> Option<FormField> {
    let Some(meta) = component.get("metaData").filter(|meta| meta.is_object()) else {
        tracing::debug!(
            target: "connector",
            component = %component,
            "form_component_without_metadata_dropped"
        );
        return None;
    };

    let Some(name) = meta.get("name").and_then(Value::as_str) else {
        tracing::debug!(target: "connector", "form_component_without_name_dropped");
        return None;
    };

    let kind = meta
        .get("type")
        .or_else(|| component.get("cType"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(field_type) = field_type_for(kind) else {
        tracing::warn!(
            target: "connector",
            name = name,
            kind = kind,
            "unsupported_form_component_type"
        );
        return None;
    };

    let label = meta
        .get("displayName")
        .and_then(Value::as_str)
        .unwrap_or(name)
        .to_string();

    Some(FormField {
        name: name.to_string(),
        label,
        field_type,
        value: default_value(meta, field_type),
    })
}

fn default_value(meta: &Value, field_type: FormFieldType) -> Option<String> {
    let candidate = VALUE_CANDIDATES
        .iter()
        .filter_map(|key| meta.get(*key))
        .map(unwrap_value)
        .find(|value| !value.is_null());

    if let Some(value) = candidate {
        return Some(scalar_to_string(value));
    }

    if matches!(field_type, FormFieldType::RadioSet | FormFieldType::ChoiceSet) {
        return meta
            .get("values")
            .and_then(Value::as_array)?
            .iter()
            .find(|option| option.get("selected").and_then(Value::as_bool) == Some(true))
            .and_then(|option| option.get("value"))
            .filter(|value| !value.is_null())
            .map(scalar_to_string);
    }

    None
}

/// Values are sometimes wrapped as `{"type": "static", "value": ...}`.
fn unwrap_value(value: &Value) -> &Value {
    match value.get("value") {
        Some(inner) if value.is_object() => inner,
        _ => value,
    }
}
