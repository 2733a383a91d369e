use anyhow::Result as AnyResult;
use conduit_adapters::{BrokerSink, HttpLog, HttpServer, HttpServerConfig, InMemoryBroker};
use conduit_core::flow::Map;
use conduit_core::readable::{Envelope, Payload, Readable};
use conduit_core::{BoxError, EventCollector, EventKind, Flow, Sink};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

async fn post(addr: std::net::SocketAddr, body: &str) -> AnyResult<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "POST /ingest HTTP/1.1\r\nHost: localhost\r\n\
        Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

fn wrap(log: HttpLog) -> Result<Envelope<Payload, HttpLog>, BoxError> {
    let data = log.read()?;
    let line = String::from_utf8(data)?;
    Ok(Envelope::new(Payload::from(line.trim_end()), log))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn posted_lines_are_published_to_the_broker() -> AnyResult<()> {
    let errors = Arc::new(AtomicUsize::new(0));
    let collector = {
        let errors = errors.clone();
        EventCollector::builder()
            .workers(2)
            .typed_callback(EventKind::Error, move |_| {
                errors.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    };
    let events = collector.collect();

    let broker = Arc::new(InMemoryBroker::default());
    let sink = BrokerSink::new(broker.clone(), "http.lines")?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = HttpServer::new(HttpServerConfig::builder().endpoint("/ingest").build());
    let token = CancellationToken::new();

    let logs = server.extract_with_listener(listener, token.clone(), events.clone());
    let envelopes = Map::new(wrap).transform(logs, events.clone());
    let loading = tokio::spawn(async move { sink.load(envelopes, events).await });

    for body in ["first", "second\n", ""] {
        post(addr, body).await?;
    }

    let published = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let published = broker.published("http.lines");
            if published.len() == 2 {
                return published;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    assert_eq!(published, vec![b"first".to_vec(), b"second".to_vec()]);

    token.cancel();
    tokio::time::timeout(Duration::from_secs(2), loading).await??;
    collector.close().await;

    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(broker.acked_count(), 0, "http logs carry no ack capability");
    Ok(())
}
