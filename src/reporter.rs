use std::{
    future::Future,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::{
    error::{Error, Result},
    event::Event,
    registry::{name, Meter, Metric, MetricSet, Snapshot},
    series::SeriesEncoder,
    strategy::{
        AliasStrategy, Lifecycle, LifecycleEventStrategy, NoAliases, NoEvents, NoTags, TagStrategy,
    },
    transport::{Endpoints, HttpTransportFactory, TransportFactory, DEFAULT_BASE_URL},
    value::Value,
    writer::BodyWriter,
};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
    }
}

type Filter = Box<dyn Fn(&str, &Metric) -> bool + Send + Sync>;

pub struct DatadogReporterBuilder<M, F> {
    metrics: M,
    factory: F,
    base_url: String,
    clock: Box<dyn Clock>,
    filter: Filter,
    rate_unit: Duration,
    duration_unit: Duration,
    alias: Box<dyn AliasStrategy + Send + Sync>,
    tags: Box<dyn TagStrategy + Send + Sync>,
    lifecycle: Box<dyn LifecycleEventStrategy + Send + Sync>,
}
impl<M: MetricSet> DatadogReporterBuilder<M, HttpTransportFactory> {
    fn new(metrics: M) -> Self {
        Self {
            metrics,
            factory: HttpTransportFactory::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            clock: Box::new(SystemClock),
            filter: Box::new(|_: &str, _: &Metric| true),
            rate_unit: Duration::from_secs(1),
            duration_unit: Duration::from_millis(1),
            alias: Box::new(NoAliases),
            tags: Box::new(NoTags),
            lifecycle: Box::new(NoEvents),
        }
    }
}
impl<M: MetricSet, F: TransportFactory> DatadogReporterBuilder<M, F> {
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
    pub fn filter(
        mut self,
        filter: impl Fn(&str, &Metric) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Box::new(filter);
        self
    }
    pub fn convert_rates_to(mut self, unit: Duration) -> Self {
        self.rate_unit = unit;
        self
    }
    pub fn convert_durations_to(mut self, unit: Duration) -> Self {
        self.duration_unit = unit;
        self
    }
    pub fn alias_using(mut self, alias: impl AliasStrategy + Send + Sync + 'static) -> Self {
        self.alias = Box::new(alias);
        self
    }
    pub fn tag_using(mut self, tags: impl TagStrategy + Send + Sync + 'static) -> Self {
        self.tags = Box::new(tags);
        self
    }
    pub fn lifecycle_events_using(
        mut self,
        lifecycle: impl LifecycleEventStrategy + Send + Sync + 'static,
    ) -> Self {
        self.lifecycle = Box::new(lifecycle);
        self
    }
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
    pub fn transport<F2: TransportFactory>(self, factory: F2) -> DatadogReporterBuilder<M, F2> {
        DatadogReporterBuilder {
            metrics: self.metrics,
            factory,
            base_url: self.base_url,
            clock: self.clock,
            filter: self.filter,
            rate_unit: self.rate_unit,
            duration_unit: self.duration_unit,
            alias: self.alias,
            tags: self.tags,
            lifecycle: self.lifecycle,
        }
    }

    pub fn build(
        self,
        host: Option<String>,
        api_key: &str,
    ) -> anyhow::Result<DatadogReporter<M, F>> {
        let endpoints = Endpoints::new(&self.base_url, api_key)?;
        if self.duration_unit.is_zero() || self.rate_unit.is_zero() {
            anyhow::bail!("rate and duration units must be non-zero");
        }
        Ok(DatadogReporter {
            metrics: self.metrics,
            factory: self.factory,
            endpoints,
            host,
            clock: self.clock,
            filter: self.filter,
            rate_factor: self.rate_unit.as_secs_f64(),
            duration_factor: 1.0 / self.duration_unit.as_nanos() as f64,
            alias: self.alias,
            tags: self.tags,
            lifecycle: self.lifecycle,
        })
    }
}

/// Ships every metric of `M` to the series endpoint once per cycle.
pub struct DatadogReporter<M, F = HttpTransportFactory> {
    metrics: M,
    factory: F,
    endpoints: Endpoints,
    host: Option<String>,
    clock: Box<dyn Clock>,
    filter: Filter,
    rate_factor: f64,
    duration_factor: f64,
    alias: Box<dyn AliasStrategy + Send + Sync>,
    tags: Box<dyn TagStrategy + Send + Sync>,
    lifecycle: Box<dyn LifecycleEventStrategy + Send + Sync>,
}
impl<M: MetricSet> DatadogReporter<M> {
    pub fn builder(metrics: M) -> DatadogReporterBuilder<M, HttpTransportFactory> {
        DatadogReporterBuilder::new(metrics)
    }
}
impl<M: MetricSet, F: TransportFactory> DatadogReporter<M, F> {
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// One reporting cycle. Failures are logged and never escape.
    pub fn report(&self) {
        match self.try_report() {
            Ok(()) => debug!("reported metrics to datadog"),
            Err(e) => log_failure("unable to report metrics to datadog", &e),
        }
    }

    /// Blocking I/O
    pub fn try_report(&self) -> Result<()> {
        let timestamp = i64::try_from(self.clock.now_millis() / 1000).unwrap_or(i64::MAX);
        let mut metrics: Vec<_> = self
            .metrics
            .metrics()
            .into_iter()
            .filter(|(name, metric)| (self.filter)(name, metric))
            .collect();
        metrics.sort_by(|(a_name, a), (b_name, b)| {
            kind_order(a)
                .cmp(&kind_order(b))
                .then_with(|| a_name.cmp(b_name))
        });

        let wtr = self.factory.open(&self.endpoints.series)?;
        let mut series = SeriesEncoder::new(wtr)?;
        for (name, metric) in &metrics {
            self.write_metric(&mut series, name, metric, timestamp)?;
        }
        series.close()
    }

    pub fn report_event(&self, event: &Event) {
        if let Err(e) = self.try_report_event(event) {
            log_failure("unable to report event to datadog", &e);
        }
    }

    /// Blocking I/O
    pub fn try_report_event(&self, event: &Event) -> Result<()> {
        let mut wtr = self.factory.open(&self.endpoints.events)?;
        wtr.write(event.as_bytes())?;
        wtr.close()
    }

    pub fn start(&self) {
        if let Some(event) = self.lifecycle.event(Lifecycle::Start) {
            self.report_event(&event);
        }
        info!("datadog reporter started");
    }

    pub fn stop(&self) {
        if let Some(event) = self.lifecycle.event(Lifecycle::Stop) {
            self.report_event(&event);
        }
        info!("datadog reporter stopped");
    }

    /// Reports every `period` until `shutdown` resolves. Each cycle runs to
    /// completion on the blocking pool before the next tick is awaited.
    pub async fn run(self: Arc<Self>, period: Duration, shutdown: impl Future<Output = ()>)
    where
        M: Send + Sync + 'static,
        F: Send + Sync + 'static,
    {
        self.blocking(Self::start).await;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.blocking(Self::report).await;
                }
                () = &mut shutdown => break,
            }
        }
        self.blocking(Self::stop).await;
    }

    async fn blocking(self: &Arc<Self>, f: fn(&Self))
    where
        M: Send + Sync + 'static,
        F: Send + Sync + 'static,
    {
        let this = Arc::clone(self);
        if let Err(e) = tokio::task::spawn_blocking(move || f(&this)).await {
            error!("reporting task failed: {e}");
        }
    }

    fn write_metric<W: BodyWriter>(
        &self,
        series: &mut SeriesEncoder<W>,
        original_name: &str,
        metric: &Metric,
        timestamp: i64,
    ) -> Result<()> {
        let alias = self.alias.alias(original_name, metric);
        let tags = self.tags.tags(original_name, metric);
        let host = self.host.as_deref();
        let mut write = |suffix: &str, value: Value| {
            series.write_metric(&name(&alias, suffix), timestamp, value, host, &tags)
        };
        match metric {
            Metric::Gauge(None) => (),
            Metric::Gauge(Some(value)) => write("", *value)?,
            Metric::Counter(count) => write("count", Value::from(*count))?,
            Metric::Histogram(histogram) => {
                write("count", Value::from(histogram.count))?;
                write_snapshot(&mut write, &histogram.snapshot, 1.0)?;
            }
            Metric::Meter(meter) => write_meter(&mut write, meter, self.rate_factor)?,
            Metric::Timer(timer) => {
                write_snapshot(&mut write, &timer.snapshot, self.duration_factor)?;
                write_meter(&mut write, &timer.meter, self.rate_factor)?;
            }
        }
        Ok(())
    }
}

fn write_snapshot(
    write: &mut impl FnMut(&str, Value) -> Result<()>,
    snapshot: &Snapshot,
    factor: f64,
) -> Result<()> {
    for (suffix, value) in snapshot.fields() {
        write(suffix, Value::from(value * factor))?;
    }
    Ok(())
}

fn write_meter(
    write: &mut impl FnMut(&str, Value) -> Result<()>,
    meter: &Meter,
    rate_factor: f64,
) -> Result<()> {
    write("count", Value::from(meter.count))?;
    write("m1_rate", Value::from(meter.m1_rate * rate_factor))?;
    write("m5_rate", Value::from(meter.m5_rate * rate_factor))?;
    write("m15_rate", Value::from(meter.m15_rate * rate_factor))?;
    write("mean_rate", Value::from(meter.mean_rate * rate_factor))
}

fn kind_order(metric: &Metric) -> u8 {
    match metric {
        Metric::Gauge(_) => 0,
        Metric::Counter(_) => 1,
        Metric::Histogram(_) => 2,
        Metric::Meter(_) => 3,
        Metric::Timer(_) => 4,
    }
}

fn log_failure(msg: &str, e: &Error) {
    match e {
        Error::Http { status, body } => error!(
            status,
            "datadog rejected request with status: {status} and response: {}",
            body.as_deref().unwrap_or("<none>")
        ),
        e => error!("{msg}: {e}"),
    }
}
