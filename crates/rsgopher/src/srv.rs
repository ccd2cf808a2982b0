//! Asynchronous Gopher server.
//!
//! # Protocol
//! RFC 1436: one request line, one response, then the server closes the
//! connection.

use {
    crate::{
        codec::{LineCodec, SelectorCodec},
        config::Config,
        item::MenuEntry,
        menu::Menu,
        selector, serialize,
        utils::Result,
    },
    async_trait::async_trait,
    futures::sink::SinkExt,
    log::{debug, error, info, warn},
    std::{fmt, future::Future, net::SocketAddr, sync::Arc, time::Duration},
    tokio::{
        fs,
        io::{AsyncRead, AsyncWrite, AsyncWriteExt},
        net::TcpListener,
        task::JoinSet,
    },
    tokio_stream::StreamExt,
    tokio_util::codec::{FramedRead, FramedWrite},
};

/// What to send back for a request.
#[derive(Debug)]
pub enum Response {
    /// A directory menu, closed by the `.` terminator.
    Menu(Menu),
    /// A text file, re-framed line by line with CRLF.
    Text(fs::File),
    /// Any other file, copied byte for byte.
    Binary(fs::File),
    /// A single type `3` line without terminator.
    Error(MenuEntry),
}

impl Response {
    fn kind(&self) -> &'static str {
        match *self {
            Response::Menu(_) => "menu",
            Response::Text(_) => "text",
            Response::Binary(_) => "binary",
            Response::Error(_) => "error",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Response::Menu(ref menu) => write!(f, "menu ({} entries)", menu.len()),
            Response::Error(ref entry) => write!(f, "error {:?}", entry.display),
            _ => f.write_str(self.kind()),
        }
    }
}

/// Request handler trait, the seam between the transport and whatever
/// decides what a selector means.
///
/// Returning `Err` is not fatal: the server logs the error and answers with
/// the standard not-found line.
///
/// # Example
/// ```no_run
/// use rsgopher::{Config, Result, srv::{Handler, Response}, MenuEntry};
/// use async_trait::async_trait;
///
/// struct Nothing(Config);
///
/// #[async_trait]
/// impl Handler for Nothing {
///     fn config(&self) -> &Config {
///         &self.0
///     }
///
///     async fn handle(&self, selector: &str) -> Result<Response> {
///         Ok(Response::Error(MenuEntry::not_found(selector, &self.0)))
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    /// Configuration the server reads its limits and advertised origin from.
    fn config(&self) -> &Config;

    /// Decide the response for a selector. The selector has already been
    /// trimmed and stripped of any Gopher+ or search suffix.
    async fn handle(&self, selector: &str) -> Result<Response>;
}

/// Write a response and return the number of bytes sent.
pub async fn respond<W>(writer: &mut W, response: Response) -> Result<u64>
where
    W: AsyncWrite + Send + Unpin,
{
    let sent = match response {
        Response::Menu(menu) => {
            let bytes = serialize::menu_bytes(&menu);
            writer.write_all(&bytes).await?;
            bytes.len() as u64
        }
        Response::Error(entry) => {
            let mut bytes = Vec::new();
            serialize::write_error(&mut bytes, &entry)?;
            writer.write_all(&bytes).await?;
            bytes.len() as u64
        }
        Response::Text(file) => {
            let mut frames = FramedRead::new(file, LineCodec::default());
            let mut framedwrite = FramedWrite::new(&mut *writer, LineCodec::default());
            let mut sent = 0;
            while let Some(frame) = frames.next().await {
                let frame = frame?;
                sent += frame.wire_len() as u64;
                framedwrite.feed(frame).await?;
            }
            framedwrite.flush().await?;
            sent
        }
        Response::Binary(mut file) => tokio::io::copy(&mut file, writer).await?,
    };

    writer.flush().await?;
    Ok(sent)
}

async fn read_request<Reader>(reader: Reader, config: &Config) -> Result<Option<String>>
where
    Reader: AsyncRead + Send + Unpin,
{
    let mut framedread = FramedRead::new(reader, SelectorCodec::new(config.max_selector_len));

    let line = match config.request_timeout {
        Some(limit) => match tokio::time::timeout(limit, framedread.next()).await {
            Ok(line) => line,
            Err(_) => {
                warn!("No selector received within {:?}, closing", limit);
                return Ok(None);
            }
        },
        None => framedread.next().await,
    };

    Ok(line.transpose()?)
}

/// Serve exactly one request on a connection.
///
/// The write side is shut down once the response has been sent, whichever
/// branch produced it.
pub async fn dispatch<H, Reader, Writer>(
    handler: Arc<H>,
    reader: Reader,
    mut writer: Writer,
) -> Result<()>
where
    H: Handler + ?Sized,
    Reader: AsyncRead + Send + Unpin,
    Writer: AsyncWrite + Send + Unpin,
{
    let config = handler.config();

    let line = match read_request(reader, config).await? {
        Some(line) => line,
        None => {
            debug!("Connection closed without a request");
            return Ok(());
        }
    };

    let (selector, suffix) = selector::split_request(&line);
    info!("\t← {:?}", selector);
    if let Some(suffix) = suffix {
        debug!("Ignoring request suffix {:?}", suffix);
    }

    let response = handler.handle(selector).await.unwrap_or_else(|e| {
        error!("{:?}: Error: \"{}\": {:?}", selector, e, e);
        Response::Error(MenuEntry::not_found(selector, config))
    });

    let summary = response.to_string();
    let sent = respond(&mut writer, response).await?;
    info!("\t→ {} ({} bytes)", summary, sent);

    writer.shutdown().await?;
    Ok(())
}

/// Accept connections on `listener` until `shutdown` completes, serving each
/// one on its own task.
///
/// Connections already accepted when `shutdown` completes are served to the
/// end before this returns.
pub async fn serve<H, F>(handler: H, listener: TcpListener, shutdown: F) -> Result<()>
where
    H: 'static + Handler,
    F: Future<Output = ()>,
{
    let handler = Arc::new(handler);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Failed to accept: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };
                info!("accepted: {:?}", peer);

                let handler = handler.clone();
                connections.spawn(async move {
                    let (readhalf, writehalf) = stream.into_split();
                    let res = dispatch(handler, readhalf, writehalf).await;
                    if let Err(e) = res {
                        error!("{}: Error: {}: {:?}", peer, e, e);
                    }
                });
            }
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    error!("Connection task failed: {}", e);
                }
            }
        }
    }

    if !connections.is_empty() {
        info!("Waiting for {} connection(s) to finish", connections.len());
    }
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            error!("Connection task failed: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Bind `addr` and serve until SIGINT or SIGTERM.
pub async fn srv_async<H>(handler: H, addr: SocketAddr) -> Result<()>
where
    H: 'static + Handler,
{
    use tokio::signal::unix::{SignalKind, signal};

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
            }
        }
    };

    serve(handler, listener, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::errno::*, item::ItemType};
    use tokio::io::{AsyncReadExt, duplex};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    /// Echoes the selector back as a one-line menu, fails on "/fail".
    struct Echo(Config);

    #[async_trait]
    impl Handler for Echo {
        fn config(&self) -> &Config {
            &self.0
        }

        async fn handle(&self, selector: &str) -> Result<Response> {
            if selector == "/fail" {
                return Err(EIO.into());
            }
            Ok(Response::Menu(Menu::from(vec![MenuEntry::info(selector, &self.0)])))
        }
    }

    fn echo() -> Arc<Echo> {
        Arc::new(Echo(Config {
            host: "h".to_owned(),
            ..Config::default()
        }))
    }

    async fn exchange<H: Handler + 'static>(handler: Arc<H>, request: &[u8]) -> String {
        let (mut client, server) = duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        let task = tokio::spawn(async move { dispatch(handler, reader, writer).await });

        client.write_all(request).await.unwrap();
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn selector_reaches_handler_trimmed() {
        let out = exchange(echo(), b"/docs  \r\n").await;
        assert_eq!(out, "i/docs\t\th\t70\r\n.\r\n");
    }

    #[tokio::test]
    async fn gopher_plus_suffix_is_ignored() {
        let out = exchange(echo(), b"/docs\t$\r\n").await;
        assert_eq!(out, "i/docs\t\th\t70\r\n.\r\n");
    }

    #[tokio::test]
    async fn handler_error_becomes_not_found_line() {
        let out = exchange(echo(), b"/fail\r\n").await;
        assert_eq!(out, "3'/fail' doesn't exist!\t\th\t70\r\n");
    }

    #[tokio::test]
    async fn closed_connection_gets_no_response() {
        let (client, server) = duplex(1024);
        let (reader, writer) = tokio::io::split(server);
        drop(client);
        dispatch(echo(), reader, writer).await.unwrap();
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let handler = Arc::new(Echo(Config {
            request_timeout: Some(Duration::from_millis(20)),
            ..Config::default()
        }));
        let (mut client, server) = duplex(1024);
        let (reader, writer) = tokio::io::split(server);
        let task = tokio::spawn(async move { dispatch(handler, reader, writer).await });

        task.await.unwrap().unwrap();
        let mut out = Vec::new();
        let _ = client.read_to_end(&mut out).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn respond_error_line() {
        let mut out = Vec::new();
        let entry = MenuEntry {
            item_type: ItemType::Error,
            display: "nope".to_owned(),
            selector: String::new(),
            host: "h".to_owned(),
            port: 70,
        };
        let sent = respond(&mut out, Response::Error(entry)).await.unwrap();
        assert_eq!(out, b"3nope\t\th\t70\r\n");
        assert_eq!(sent, out.len() as u64);
    }

    #[tokio::test]
    async fn serve_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handler = Echo(Config::default());
        let server = tokio::spawn(serve(handler, listener, async move {
            let _ = stopped.await;
        }));

        for selector in ["/one", "/two"] {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(format!("{}\r\n", selector).as_bytes())
                .await
                .unwrap();
            let mut out = String::new();
            stream.read_to_string(&mut out).await.unwrap();
            assert!(out.starts_with(&format!("i{}\t", selector)), "{:?}", out);
            assert!(out.ends_with(".\r\n"));
        }

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_waits_for_accepted_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handler = Echo(Config::default());
        let server = tokio::spawn(serve(handler, listener, async move {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"/la").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        stop.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!server.is_finished());

        stream.write_all(b"te\r\n").await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "i/late\t\tlocalhost\t70\r\n.\r\n");

        server.await.unwrap().unwrap();
    }
}
