use serde_json::Value;

use crate::connector::{
    rich_content::{RichContent, flatten_rich_content, is_rich_content},
    types::{Button, Card, Media},
};

pub const YES_NO_SUFFIX: &str = "\nYes, No, ";

/// One text segment of a webhook reply, classified by shape. Shapes are tried
/// in declaration order; the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedContent {
    Rich(RichContent),
    FileLink(Media),
    Text(String),
    Template(TemplateContent),
    Unsupported(Value),
    NotJson(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateContent {
    pub text: Option<String>,
    pub buttons: Vec<Button>,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SegmentParts {
    pub message_text: Option<String>,
    pub buttons: Vec<Button>,
    pub media: Vec<Media>,
    pub cards: Vec<Card>,
}

impl SegmentParts {
    pub fn is_empty(&self) -> bool {
        self.message_text.is_none()
            && self.buttons.is_empty()
            && self.media.is_empty()
            && self.cards.is_empty()
    }
}

impl DecodedContent {
    pub fn decode(segment: &str) -> Self {
        let unescaped = html_escape::decode_html_entities(segment);
        let parsed = match serde_json::from_str::<Value>(&unescaped) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
            _ => return Self::NotJson(segment.to_string()),
        };

        if is_rich_content(&parsed) {
            return Self::Rich(flatten_rich_content(&parsed));
        }
        if let Some(media) = file_link(&parsed) {
            return Self::FileLink(media);
        }
        if let Some(text) = parsed.get("text").and_then(Value::as_str) {
            return Self::Text(text.to_string());
        }
        if let Some(template) = template(&parsed) {
            return Self::Template(template);
        }

        Self::Unsupported(parsed)
    }

    pub fn into_parts(self) -> SegmentParts {
        match self {
            Self::Rich(rich) => SegmentParts {
                message_text: rich.text,
                buttons: rich.buttons,
                cards: rich.cards,
                ..SegmentParts::default()
            },
            Self::FileLink(media) => SegmentParts {
                media: vec![media],
                ..SegmentParts::default()
            },
            Self::Text(text) => SegmentParts {
                message_text: Some(text),
                ..SegmentParts::default()
            },
            Self::Template(template) => SegmentParts {
                message_text: template.text,
                buttons: template.buttons,
                cards: template.cards,
                ..SegmentParts::default()
            },
            Self::Unsupported(value) => {
                tracing::warn!(
                    target: "connector",
                    payload = %value,
                    "unsupported_segment_shape"
                );
                SegmentParts::default()
            }
            Self::NotJson(raw) => match raw.strip_suffix(YES_NO_SUFFIX) {
                Some(stripped) => SegmentParts {
                    message_text: Some(stripped.to_string()),
                    buttons: vec![Button::new("Yes", None), Button::new("No", None)],
                    ..SegmentParts::default()
                },
                None => SegmentParts {
                    message_text: Some(raw),
                    ..SegmentParts::default()
                },
            },
        }
    }
}

fn file_link(parsed: &Value) -> Option<Media> {
    let file = parsed.get("file")?;
    if file.get("type").and_then(Value::as_str) != Some("link") {
        return None;
    }

    let payload = file.get("payload").unwrap_or(file);
    let media_uri = payload.get("url").and_then(Value::as_str)?;
    Some(Media {
        media_uri: media_uri.to_string(),
        alt_text: payload
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// `None` when the value is not a template or carries an unknown
/// `template_type`; the caller then treats the segment as unsupported.
fn template(parsed: &Value) -> Option<TemplateContent> {
    if parsed.get("type").and_then(Value::as_str) != Some("template") {
        return None;
    }
    let payload = parsed.get("payload")?;
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string);

    match payload.get("template_type").and_then(Value::as_str) {
        Some("button") => Some(TemplateContent {
            text,
            buttons: template_buttons(payload.get("buttons")),
            cards: Vec::new(),
        }),
        Some("quick_replies") => Some(TemplateContent {
            text,
            buttons: template_buttons(payload.get("quick_replies")),
            cards: Vec::new(),
        }),
        Some("carousel") => Some(TemplateContent {
            text,
            buttons: Vec::new(),
            cards: payload
                .get("elements")
                .and_then(Value::as_array)
                .map(|elements| elements.iter().map(carousel_card).collect())
                .unwrap_or_default(),
        }),
        other => {
            tracing::warn!(
                target: "connector",
                template_type = other.unwrap_or("-"),
                "unsupported_template_type"
            );
            None
        }
    }
}

fn template_buttons(buttons: Option<&Value>) -> Vec<Button> {
    buttons
        .and_then(Value::as_array)
        .map(|buttons| buttons.iter().map(template_button).collect())
        .unwrap_or_default()
}

fn template_button(button: &Value) -> Button {
    let title = button
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let payload = button
        .get("payload")
        .and_then(Value::as_str)
        .or_else(|| button.get("url").and_then(Value::as_str))
        .map(str::to_string);
    Button::new(title, payload)
}

fn carousel_card(element: &Value) -> Card {
    let lines = ["title", "subtitle"]
        .iter()
        .filter_map(|key| element.get(*key).and_then(Value::as_str))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    Card {
        text: (!lines.is_empty()).then(|| lines.join("\n")),
        image: element
            .get("image_url")
            .and_then(Value::as_str)
            .map(|url| Media {
                media_uri: url.to_string(),
                alt_text: None,
            }),
        buttons: template_buttons(element.get("buttons")),
    }
}
