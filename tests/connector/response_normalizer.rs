use serde_json::{Value, json};

use koreai_connector::connector::{
    content_router::ContentRouter,
    response_normalizer::ResponseNormalizer,
    types::{Button, FormFieldType, NlpIntent, NlpResult, RawResponse},
};

fn winning(name: &str) -> NlpResult {
    NlpResult {
        intent: Some(NlpIntent {
            name: name.to_string(),
            incomprehension: None,
        }),
        entities: vec![],
    }
}

fn carousel_segment(element_buttons: &[usize]) -> String {
    let elements = element_buttons
        .iter()
        .enumerate()
        .map(|(index, count)| {
            let buttons = (0..*count)
                .map(|button| {
                    json!({
                        "type": "postback",
                        "title": format!("B{}", button),
                        "payload": format!("p{}", button)
                    })
                })
                .collect::<Vec<_>>();
            json!({"title": format!("Item {}", index), "buttons": buttons})
        })
        .collect::<Vec<_>>();

    json!({
        "type": "template",
        "payload": {"template_type": "carousel", "elements": elements}
    })
    .to_string()
}

#[test]
fn given_mixed_reply_when_normalized_twice_then_output_is_identical() {
    let body = json!({
        "text": [
            "Plain",
            "Confirm?\nYes, No, ",
            carousel_segment(&[1, 2]),
            json!({"type": "vertical", "elements": [{"type": "text", "text": "rich"}]}).to_string()
        ],
        "form": {"components": [{"metaData": {"name": "city", "type": "textField"}}]}
    });

    let first = ResponseNormalizer.normalize(&body, Some(winning("Greeting")));
    let second = ResponseNormalizer.normalize(&body, Some(winning("Greeting")));
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn given_carousel_template_when_normalized_then_cards_mirror_elements() {
    let body = json!({"text": carousel_segment(&[0, 3, 1])});
    let messages = ResponseNormalizer.normalize(&body, None);

    assert_eq!(messages.len(), 1);
    let per_card = messages[0]
        .cards
        .iter()
        .map(|card| card.buttons.len())
        .collect::<Vec<_>>();
    assert_eq!(per_card, vec![0, 3, 1]);
}

#[test]
fn given_button_template_when_normalized_then_button_keeps_title_and_payload() {
    let body = json!({
        "text": json!({
            "type": "template",
            "payload": {
                "template_type": "button",
                "text": "Pick",
                "buttons": [{"type": "postback", "title": "A", "payload": "a"}]
            }
        })
        .to_string()
    });
    let messages = ResponseNormalizer.normalize(&body, None);

    assert_eq!(messages[0].message_text.as_deref(), Some("Pick"));
    assert_eq!(
        messages[0].buttons,
        vec![Button::new("A", Some("a".to_string()))]
    );
    assert_eq!(
        serde_json::to_value(&messages[0].buttons[0]).expect("button should serialize"),
        json!({"text": "A", "payload": "a"})
    );
}

#[test]
fn given_yes_no_suffix_when_normalized_then_two_buttons_follow_stripped_text() {
    let messages = ResponseNormalizer.normalize(&json!({"text": "Continue?\nYes, No, "}), None);
    assert_eq!(messages[0].message_text.as_deref(), Some("Continue?"));
    assert_eq!(
        messages[0]
            .buttons
            .iter()
            .map(|button| button.text.as_str())
            .collect::<Vec<_>>(),
        vec!["Yes", "No"]
    );
}

#[test]
fn given_nlp_and_several_segments_when_normalized_then_only_first_message_carries_nlp() {
    let messages = ResponseNormalizer.normalize(
        &json!({"text": ["one", "two", "three"]}),
        Some(winning("BookFlight")),
    );
    let carriers = messages
        .iter()
        .map(|message| message.nlp.is_some())
        .collect::<Vec<_>>();
    assert_eq!(carriers, vec![true, false, false]);
    for message in &messages {
        assert_eq!(message.source_data["text"], json!(["one", "two", "three"]));
    }
}

#[test]
fn given_form_with_city_default_when_normalized_then_text_field_is_attached() {
    let body = json!({
        "text": "Fill in the form",
        "form": {
            "components": [{
                "cType": "textField",
                "metaData": {
                    "name": "city",
                    "displayName": "City",
                    "type": "textField",
                    "defaultValue": "Berlin"
                }
            }]
        }
    });
    let messages = ResponseNormalizer.normalize(&body, None);

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].forms.len(), 1);
    let field = &messages[0].forms[0];
    assert_eq!(field.field_type, FormFieldType::Text);
    assert_eq!(
        serde_json::to_value(field).expect("field should serialize"),
        json!({"name": "city", "label": "City", "type": "Text", "value": "Berlin"})
    );
}

#[test]
fn given_rich_content_segment_when_normalized_then_text_and_buttons_are_flattened() {
    let segment = json!({
        "structuredContent": {
            "type": "vertical",
            "elements": [
                {"type": "text", "text": "How can I help?"},
                {
                    "type": "button",
                    "title": "Billing",
                    "click": {"actions": [{"type": "publishText", "text": "billing"}]}
                }
            ]
        }
    })
    .to_string();
    let messages = ResponseNormalizer.normalize(&json!({"text": [segment]}), None);

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_text.as_deref(), Some("How can I help?"));
    assert_eq!(
        messages[0].buttons,
        vec![Button::new("Billing", Some("billing".to_string()))]
    );
}

#[test]
fn given_non_json_content_types_when_routed_then_text_equals_raw_body() {
    let router = ContentRouter::default();
    for content_type in [Some("text/plain"), Some("text/html"), None] {
        let raw = "<b>raw</b>\nYes, No, ";
        let messages = router.route(&RawResponse::new(200, content_type, raw), None);
        assert_eq!(messages.len(), 1, "content type {:?}", content_type);
        assert_eq!(messages[0].message_text.as_deref(), Some(raw));
        assert_eq!(messages[0].source_data, Value::String(raw.to_string()));
    }
}
