use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use datadog_metrics::{
    config::ReporterConfig,
    event::{AlertType, Event},
    registry::Metric,
    strategy::Lifecycle,
    DatadogReporter, Value,
};
use poem::{handler, http::StatusCode, listener::TcpListener, post, Route, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
api_key = "demo"
host = "localhost"
base_url = "http://127.0.0.1:3000/api/v1"
period = "2s"
"#;

#[handler]
async fn series(body: String) -> StatusCode {
    info!(%body, "collector received series");
    StatusCode::ACCEPTED
}

#[handler]
async fn events(body: String) -> StatusCode {
    info!(%body, "collector received event");
    StatusCode::ACCEPTED
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = Route::new()
        .at("/api/v1/series", post(series))
        .at("/api/v1/events", post(events));
    tokio::spawn(Server::new(TcpListener::bind("127.0.0.1:3000")).run(app));

    let cpu = Arc::new(Mutex::new(None));
    {
        let cpu = cpu.clone();
        std::thread::spawn(move || {
            let mut sys = sysinfo::System::new_all();
            loop {
                std::thread::sleep(Duration::from_secs(1));
                sys.refresh_cpu_usage();
                if let Ok(mut cpu) = cpu.lock() {
                    *cpu = Some(Value::from(sys.global_cpu_usage()));
                }
            }
        });
    }
    let metrics = move || {
        let reading = cpu.lock().ok().and_then(|cpu| *cpu);
        vec![("system.cpu".to_string(), Metric::Gauge(reading))]
    };

    let config = ReporterConfig::from_toml_str(CONFIG)?;
    let reporter = DatadogReporter::builder(metrics)
        .base_url(config.base_url.clone())
        .transport(config.transport())
        .tag_using(|_: &str, _: &Metric| vec!["demo:true".to_string()])
        .lifecycle_events_using(|lifecycle: Lifecycle| {
            let title = match lifecycle {
                Lifecycle::Start => "reporter started",
                Lifecycle::Stop => "reporter stopped",
            };
            Event::builder()
                .title(title)
                .text("demo reporter")
                .alert_type(AlertType::Info)
                .build()
                .ok()
        })
        .build(config.host.clone(), &config.api_key)?;

    println!(
        "- reporting to {} every {:?}",
        reporter.endpoints().series,
        config.period
    );
    println!("- ctrl-c to stop");
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    Arc::new(reporter).run(config.period, shutdown).await;
    Ok(())
}
