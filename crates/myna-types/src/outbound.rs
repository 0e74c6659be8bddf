//! Outbound reply data handed to the messaging gateway

use serde::{Deserialize, Serialize};

/// One field of a paged listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl PageField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    /// Ask the renderer to place this field beside its neighbors
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }
}

/// One page of a listing, statistics, or search reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<PageField>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: PageField) -> Self {
        self.fields.push(field);
        self
    }
}

/// A reply the engine asks the gateway to deliver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Text(String),
    Pages(Vec<Page>),
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }
}
