use crate::{
    error::{Error, Result},
    json,
    value::Value,
    writer::{BodyWriter, WriterState},
};

const PREAMBLE: &[u8] = b"{\"series\":[";
const POSTAMBLE: &[u8] = b"]}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}
impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub timestamp: i64,
    pub value: Value,
    pub metric_type: Option<MetricType>,
    pub host: Option<String>,
    pub tags: Vec<String>,
}
impl MetricSample {
    pub fn new(name: impl Into<String>, timestamp: i64, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value: value.into(),
            metric_type: None,
            host: None,
            tags: vec![],
        }
    }
    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Streams a `{"series":[...]}` document into `W`, one entry per call.
#[derive(Debug)]
pub struct SeriesEncoder<W: BodyWriter> {
    wtr: W,
    entry: Vec<u8>,
    first: bool,
    closed: bool,
}
impl<W: BodyWriter> SeriesEncoder<W> {
    pub fn new(mut wtr: W) -> Result<Self> {
        wtr.write(PREAMBLE)?;
        Ok(Self {
            wtr,
            entry: vec![],
            first: true,
            closed: false,
        })
    }

    /// Writes a gauge.
    pub fn write_metric(
        &mut self,
        name: &str,
        timestamp: i64,
        value: Value,
        host: Option<&str>,
        tags: &[String],
    ) -> Result<()> {
        self.write_entry(name, timestamp, value, Some(MetricType::Gauge), host, tags)
    }

    pub fn write_sample(&mut self, sample: &MetricSample) -> Result<()> {
        self.write_entry(
            &sample.name,
            sample.timestamp,
            sample.value,
            sample.metric_type,
            sample.host.as_deref(),
            &sample.tags,
        )
    }

    fn write_entry(
        &mut self,
        name: &str,
        timestamp: i64,
        value: Value,
        metric_type: Option<MetricType>,
        host: Option<&str>,
        tags: &[String],
    ) -> Result<()> {
        if self.closed {
            return Err(Error::ProtocolState {
                op: "write",
                state: WriterState::Closed,
            });
        }

        // The entry is rendered in full before it reaches the writer so a bad
        // value never leaves a half-written object behind.
        let buf = &mut self.entry;
        buf.clear();
        if !self.first {
            buf.push(b',');
        }
        buf.extend_from_slice(b"{\"metric\":");
        json::write_str(buf, name)?;
        buf.extend_from_slice(b",\"points\":[[");
        Value::Integer(timestamp).write_to(buf)?;
        buf.push(b',');
        value.write_to(buf)?;
        buf.extend_from_slice(b"]]");
        if let Some(metric_type) = metric_type {
            buf.extend_from_slice(b",\"type\":");
            json::write_str(buf, metric_type.as_str())?;
        }
        if let Some(host) = host {
            buf.extend_from_slice(b",\"host\":");
            json::write_str(buf, host)?;
        }
        if !tags.is_empty() {
            buf.extend_from_slice(b",\"tags\":");
            json::write_str_array(buf, tags)?;
        }
        buf.push(b'}');

        self.wtr.write(&self.entry)?;
        self.first = false;
        Ok(())
    }

    /// Terminates the document and closes the underlying writer, which for an
    /// HTTP writer sends the request.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.wtr.write(POSTAMBLE)?;
        self.wtr.close()
    }

    pub fn get_ref(&self) -> &W {
        &self.wtr
    }
    pub fn into_inner(self) -> W {
        self.wtr
    }
}
