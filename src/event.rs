use core::fmt;

use crate::{
    error::{Error, Result},
    json,
    value::Value,
};

pub const MAX_AGGREGATION_KEY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    Low,
}
impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Error,
    Warning,
    Info,
    Success,
}
impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Error => "error",
            AlertType::Warning => "warning",
            AlertType::Info => "info",
            AlertType::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    User,
    MyApps,
}
impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::User => "user",
            SourceType::MyApps => "my apps",
        }
    }
}

/// A discrete event, rendered to its JSON body when built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    json: String,
}
impl Event {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        Self::builder().title(title).text(text).build()
    }
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    pub fn as_str(&self) -> &str {
        &self.json
    }
    pub fn as_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }
}
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    title: Option<String>,
    text: Option<String>,
    timestamp: Option<i64>,
    priority: Option<Priority>,
    tags: Vec<String>,
    alert_type: Option<AlertType>,
    aggregation_key: Option<String>,
    source_type: Option<SourceType>,
}
impl EventBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
    pub fn alert_type(mut self, alert_type: AlertType) -> Self {
        self.alert_type = Some(alert_type);
        self
    }
    pub fn aggregation_key(mut self, key: impl Into<String>) -> Self {
        self.aggregation_key = Some(key.into());
        self
    }
    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    pub fn build(self) -> Result<Event> {
        let title = self
            .title
            .ok_or(Error::Validation("title must not be null"))?;
        let text = self.text.ok_or(Error::Validation("text must not be null"))?;
        if let Some(key) = &self.aggregation_key {
            if key.encode_utf16().count() > MAX_AGGREGATION_KEY_LEN {
                return Err(Error::Validation("aggregation key cannot exceed 100 characters"));
            }
        }

        let mut buf = vec![];
        buf.extend_from_slice(b"{\"title\":");
        json::write_str(&mut buf, &title)?;
        buf.extend_from_slice(b",\"text\":");
        json::write_str(&mut buf, &text)?;
        if let Some(timestamp) = self.timestamp {
            buf.extend_from_slice(b",\"timestamp\":");
            Value::Integer(timestamp).write_to(&mut buf)?;
        }
        if let Some(priority) = self.priority {
            buf.extend_from_slice(b",\"priority\":");
            json::write_str(&mut buf, priority.as_str())?;
        }
        if !self.tags.is_empty() {
            buf.extend_from_slice(b",\"tags\":");
            json::write_str_array(&mut buf, &self.tags)?;
        }
        if let Some(alert_type) = self.alert_type {
            buf.extend_from_slice(b",\"alert_type\":");
            json::write_str(&mut buf, alert_type.as_str())?;
        }
        if let Some(key) = &self.aggregation_key {
            buf.extend_from_slice(b",\"aggregation_key\":");
            json::write_str(&mut buf, key)?;
        }
        if let Some(source_type) = self.source_type {
            buf.extend_from_slice(b",\"source_type\":");
            json::write_str(&mut buf, source_type.as_str())?;
        }
        buf.push(b'}');

        let json = String::from_utf8(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Event { json })
    }
}
