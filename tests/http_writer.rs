use std::time::Duration;

use datadog_metrics::{
    transport::{Endpoints, HttpTransportFactory, TransportConfig, TransportFactory},
    writer::{BodyWriter, WriterState},
    Error, Event, SeriesEncoder, Value,
};
use serde_json::{json, Value as Json};
use wiremock::{
    matchers::{body_json, header, header_exists, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::new(&format!("{}/api/v1", server.uri()), "secret").unwrap()
}

async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn series_is_posted_once_with_fixed_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/series"))
        .and(query_param("api_key", "secret"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(header("accept", "*/*"))
        .and(header_exists("content-length"))
        .respond_with(ResponseTemplate::new(202).set_body_string("{\"status\":\"ok\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoints(&server).series;
    let state = blocking(move || {
        let factory = HttpTransportFactory::default();
        let mut series = SeriesEncoder::new(factory.open(&url)?)?;
        series.write_metric("cpu", 1_700_000_000, Value::from(0.256), Some("web-1"), &[])?;
        series.write_metric(
            "jobs.count",
            1_700_000_000,
            Value::from(3),
            None,
            &["q:a".into()],
        )?;
        series.close()?;
        series.close()?;
        Ok::<_, Error>(series.into_inner().state())
    })
    .await
    .unwrap();
    assert_eq!(state, WriterState::Closed);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("transfer-encoding").is_none());
    let body: Json = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!({"series": [
            {"metric": "cpu", "points": [[1_700_000_000, 0.26]], "type": "gauge",
             "host": "web-1"},
            {"metric": "jobs.count", "points": [[1_700_000_000, 3]], "type": "gauge",
             "tags": ["q:a"]},
        ]})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn error_statuses_capture_the_response_body() {
    for (status, body) in [(400, "bad payload"), (403, "forbidden"), (500, "boom")] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let url = endpoints(&server).series;
        let res = blocking(move || {
            let mut wtr = HttpTransportFactory::default().open(&url)?;
            wtr.write(b"{\"series\":[]}")?;
            wtr.flush()
        })
        .await;
        match res {
            Err(Error::Http { status: s, body: b }) => {
                assert_eq!(s, status);
                assert_eq!(b.as_deref(), Some(body));
            }
            other => panic!("{status}: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn event_body_is_sent_verbatim() {
    let server = MockServer::start().await;
    let expected = json!({"title": "started", "text": "reporter up", "priority": "low"});
    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoints(&server).events;
    blocking(move || {
        let event = Event::builder()
            .title("started")
            .text("reporter up")
            .priority(datadog_metrics::event::Priority::Low)
            .build()?;
        let mut wtr = HttpTransportFactory::default().open(&url)?;
        wtr.write(event.as_bytes())?;
        wtr.close()
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_collector_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let url = endpoints(&server).series;
    let res = blocking(move || {
        let factory = HttpTransportFactory::new(TransportConfig {
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(200),
        });
        let mut wtr = factory.open(&url)?;
        wtr.write(b"{}")?;
        let res = wtr.flush();
        assert_eq!(wtr.state(), WriterState::Flushed);
        res
    })
    .await;
    assert!(matches!(res, Err(Error::Transport(_))), "{res:?}");
}

#[test]
fn unreachable_collector_is_a_transport_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = Endpoints::new(&format!("http://127.0.0.1:{port}/api/v1"), "secret")
        .unwrap()
        .series;

    let mut wtr = HttpTransportFactory::default().open(&url).unwrap();
    let res = wtr.flush();
    assert!(matches!(res, Err(Error::Transport(_))), "{res:?}");
    assert_eq!(wtr.state(), WriterState::Flushed);
    wtr.close().unwrap();
}
