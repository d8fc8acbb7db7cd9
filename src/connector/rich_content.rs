//! Customer-specific structured content: a `structuredContent` wrapper (with
//! optional `quickReplies`), a `ContentEvent` wrapper, or a bare element tree
//! rooted at a layout or button element.

use serde_json::Value;

use crate::connector::types::{Button, Card, Media};

const TREE_ROOT_TYPES: [&str; 5] = ["vertical", "horizontal", "carousel", "accordion", "button"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichContent {
    pub text: Option<String>,
    pub cards: Vec<Card>,
    pub buttons: Vec<Button>,
}

pub fn is_rich_content(value: &Value) -> bool {
    if !value.is_object() {
        return false;
    }
    if value.get("structuredContent").is_some_and(Value::is_object) {
        return true;
    }
    if is_content_event(value) {
        return true;
    }
    element_type(value).is_some_and(|kind| TREE_ROOT_TYPES.contains(&kind))
}

pub fn flatten_rich_content(value: &Value) -> RichContent {
    let mut texts = Vec::new();
    let mut content = RichContent::default();

    if is_content_event(value) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            texts.push(message.to_string());
        }
        if let Some(structured) = value.get("structuredContent") {
            flatten_element(structured, &mut texts, &mut content);
        }
    } else if let Some(structured) = value.get("structuredContent") {
        flatten_element(structured, &mut texts, &mut content);
    } else {
        flatten_element(value, &mut texts, &mut content);
    }

    if let Some(replies) = value
        .get("quickReplies")
        .and_then(|quick_replies| quick_replies.get("replies"))
        .and_then(Value::as_array)
    {
        content
            .buttons
            .extend(replies.iter().filter_map(button_from_element));
    }

    if !texts.is_empty() {
        content.text = Some(texts.join("\n"));
    }
    content
}

fn is_content_event(value: &Value) -> bool {
    element_type(value) == Some("ContentEvent")
}

fn element_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn flatten_element(element: &Value, texts: &mut Vec<String>, content: &mut RichContent) {
    match element_type(element) {
        Some("vertical" | "horizontal") => {
            for child in children(element) {
                flatten_element(child, texts, content);
            }
        }
        Some("carousel" | "accordion") => {
            content.cards.extend(children(element).map(card_from_element));
        }
        Some("text") => {
            if let Some(text) = element.get("text").and_then(Value::as_str) {
                texts.push(text.to_string());
            }
        }
        Some("button") => {
            if let Some(button) = button_from_element(element) {
                content.buttons.push(button);
            }
        }
        Some("image") => {
            tracing::debug!(
                target: "connector",
                "rich_content_image_outside_card_skipped"
            );
        }
        other => {
            tracing::warn!(
                target: "connector",
                element_type = other.unwrap_or("-"),
                "unsupported_rich_content_element"
            );
        }
    }
}

fn children(element: &Value) -> impl Iterator<Item = &Value> {
    element
        .get("elements")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn card_from_element(element: &Value) -> Card {
    let mut texts = Vec::new();
    let mut card = Card::default();
    collect_card(element, &mut texts, &mut card);
    if !texts.is_empty() {
        card.text = Some(texts.join("\n"));
    }
    card
}

fn collect_card(element: &Value, texts: &mut Vec<String>, card: &mut Card) {
    match element_type(element) {
        Some("vertical" | "horizontal") => {
            if let Some(title) = element.get("title").and_then(Value::as_str) {
                texts.push(title.to_string());
            }
            for child in children(element) {
                collect_card(child, texts, card);
            }
        }
        Some("text") => {
            if let Some(text) = element.get("text").and_then(Value::as_str) {
                texts.push(text.to_string());
            }
        }
        Some("image") => {
            if card.image.is_none()
                && let Some(url) = element.get("url").and_then(Value::as_str)
            {
                card.image = Some(Media {
                    media_uri: url.to_string(),
                    alt_text: element
                        .get("tooltip")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }
        Some("button") => {
            if let Some(button) = button_from_element(element) {
                card.buttons.push(button);
            }
        }
        other => {
            tracing::warn!(
                target: "connector",
                element_type = other.unwrap_or("-"),
                "unsupported_rich_content_card_element"
            );
        }
    }
}

/// Buttons only carry actions that publish text back or open a link.
fn button_from_element(element: &Value) -> Option<Button> {
    let title = element.get("title").and_then(Value::as_str)?;
    let actions = element
        .get("click")
        .and_then(|click| click.get("actions"))
        .and_then(Value::as_array)?;

    for action in actions {
        match action.get("type").and_then(Value::as_str) {
            Some("publishText") => {
                return Some(Button::new(
                    title,
                    action
                        .get("text")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                ));
            }
            Some("link") => {
                return Some(Button::new(
                    title,
                    action.get("uri").and_then(Value::as_str).map(str::to_string),
                ));
            }
            other => {
                tracing::warn!(
                    target: "connector",
                    title = title,
                    action_type = other.unwrap_or("-"),
                    "unsupported_rich_content_action"
                );
            }
        }
    }

    None
}
