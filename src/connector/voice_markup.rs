use roxmltree::{Document, Node};
use serde_json::Value;

use crate::connector::types::{Button, CanonicalMessage};

/// Elements whose content is spoken as part of a prompt.
const SPOKEN_CONTAINERS: [&str; 9] = [
    "prompt", "emphasis", "prosody", "say-as", "s", "p", "sub", "voice", "speak",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceContent {
    pub message_text: Option<String>,
    pub buttons: Vec<Button>,
}

impl VoiceContent {
    fn raw(raw: &str) -> Self {
        Self {
            message_text: (!raw.is_empty()).then(|| raw.to_string()),
            buttons: Vec::new(),
        }
    }
}

#[derive(Default, Clone, Copy)]
pub struct VoiceMarkupDecoder;

impl VoiceMarkupDecoder {
    pub fn decode(&self, raw: &str) -> VoiceContent {
        let document = match Document::parse(raw) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(
                    target: "connector",
                    error = %err,
                    "voice_markup_malformed_falling_back_to_raw_text"
                );
                return VoiceContent::raw(raw);
            }
        };

        let mut walker = DialogWalker::default();
        for top in element_children(document.root_element()) {
            match top.tag_name().name() {
                "form" => walker.walk_form(top),
                "menu" => walker.walk_menu(top),
                _ => {}
            }
        }

        walker.finish()
    }

    pub fn to_messages(&self, raw: &str) -> Vec<CanonicalMessage> {
        let content = self.decode(raw);
        let mut message = CanonicalMessage::new(Value::String(raw.to_string()));
        message.message_text = content.message_text;
        message.buttons = content.buttons;

        if message.carries_content() {
            vec![message]
        } else {
            tracing::debug!(target: "connector", "voice_markup_without_prompts_or_options");
            Vec::new()
        }
    }
}

#[derive(Default)]
struct DialogWalker {
    prompts: Vec<String>,
    buttons: Vec<Button>,
}

impl DialogWalker {
    fn walk_form(&mut self, form: Node<'_, '_>) {
        for child in element_children(form) {
            match child.tag_name().name() {
                "block" => self.push_prompt(render_spoken(child)),
                "field" => self.walk_field(child),
                "menu" => self.walk_menu(child),
                _ => {}
            }
        }
    }

    fn walk_field(&mut self, field: Node<'_, '_>) {
        self.push_prompt(render_prompts(field));

        let mut options = Vec::new();
        for child in element_children(field) {
            match child.tag_name().name() {
                "option" => {
                    let value = child
                        .attribute("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| collapse_whitespace(&text_content(child)));
                    options.push((child.attribute("dtmf"), value));
                }
                "grammar" => {
                    options.extend(grammar_items(child).into_iter().map(|value| (None, value)));
                }
                _ => {}
            }
        }
        self.push_options(options);
    }

    fn walk_menu(&mut self, menu: Node<'_, '_>) {
        self.push_prompt(render_prompts(menu));

        let options = element_children(menu)
            .filter(|child| child.tag_name().name() == "choice")
            .map(|choice| {
                (
                    choice.attribute("dtmf"),
                    collapse_whitespace(&text_content(choice)),
                )
            })
            .collect::<Vec<_>>();
        self.push_options(options);
    }

    fn push_prompt(&mut self, prompt: String) {
        if !prompt.is_empty() {
            self.prompts.push(prompt);
        }
    }

    /// Labels use the explicit key when present, else the 1-based position
    /// within the owning field or menu.
    fn push_options(&mut self, options: Vec<(Option<&str>, String)>) {
        for (index, (key, value)) in options.into_iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let key = key.map(str::to_string).unwrap_or_else(|| (index + 1).to_string());
            self.buttons
                .push(Button::new(format!("{}. {}", key, value), Some(value)));
        }
    }

    fn finish(self) -> VoiceContent {
        let text = self.prompts.join(" ");
        VoiceContent {
            message_text: (!text.is_empty()).then_some(text),
            buttons: self.buttons,
        }
    }
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn render_prompts(node: Node<'_, '_>) -> String {
    let rendered = element_children(node)
        .filter(|child| child.tag_name().name() == "prompt")
        .map(render_spoken)
        .filter(|prompt| !prompt.is_empty())
        .collect::<Vec<_>>();
    rendered.join(" ")
}

fn render_spoken(node: Node<'_, '_>) -> String {
    let mut pieces = Vec::new();
    collect_spoken(node, &mut pieces);
    collapse_whitespace(&pieces.concat())
}

fn collect_spoken(node: Node<'_, '_>, pieces: &mut Vec<String>) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                pieces.push(text.to_string());
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }

        match child.tag_name().name() {
            "audio" => {
                let source = child
                    .attribute("src")
                    .or_else(|| child.attribute("expr"))
                    .unwrap_or("-");
                pieces.push(format!("[audio: {}]", source));
            }
            "value" => {
                if let Some(expr) = child.attribute("expr") {
                    pieces.push(format!("{{{}}}", expr));
                }
            }
            name if SPOKEN_CONTAINERS.contains(&name) => collect_spoken(child, pieces),
            _ => {}
        }
    }
}

fn grammar_items(grammar: Node<'_, '_>) -> Vec<String> {
    grammar
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "item")
        .filter(|item| {
            !item
                .descendants()
                .skip(1)
                .any(|inner| inner.is_element() && inner.tag_name().name() == "item")
        })
        .map(|item| collapse_whitespace(&text_content(item)))
        .filter(|value| !value.is_empty())
        .collect()
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|descendant| descendant.is_text())
        .filter_map(|descendant| descendant.text())
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
