use cinder_dns_domain::wire::{MAX_TCP_MESSAGE_SIZE, MAX_UDP_PAYLOAD};
use cinder_dns_infrastructure::DnsRequestHandler;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TCP_IDLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub async fn run_udp_server(
    bind_addr: String,
    handler: Arc<DnsRequestHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = bind_addr.parse()?;
    let socket = Arc::new(create_udp_socket(socket_addr)?);
    info!(bind_address = %socket_addr, "UDP DNS listener started");

    let mut recv_buf = [0u8; 4096];
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("UDP DNS listener: shutting down");
                return Ok(());
            }
            received = socket.recv_from(&mut recv_buf) => {
                let (n, from) = match received {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "UDP recv error");
                        continue;
                    }
                };

                let request: Arc<[u8]> = Arc::from(&recv_buf[..n]);
                let handler = handler.clone();
                let socket = socket.clone();
                tokio::spawn(async move {
                    if let Some(response) = handler.handle(&request, MAX_UDP_PAYLOAD).await {
                        if let Err(e) = socket.send_to(&response, from).await {
                            debug!(client = %from, error = %e, "UDP send failed");
                        }
                    }
                });
            }
        }
    }
}

pub async fn run_tcp_server(
    bind_addr: String,
    handler: Arc<DnsRequestHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = bind_addr.parse()?;
    let listener = create_tcp_listener(socket_addr)?;
    info!(bind_address = %socket_addr, "TCP DNS listener started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("TCP DNS listener: shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        warn!(error = %e, "TCP accept error");
                        continue;
                    }
                };

                let handler = handler.clone();
                let conn_shutdown = shutdown.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = conn_shutdown.cancelled() => {}
                        _ = serve_tcp_connection(stream, peer, handler) => {}
                    }
                });
            }
        }
    }
}

/// RFC 1035 §4.2.2 framing: each message is preceded by a two-byte
/// big-endian length. The connection stays open for follow-up queries
/// until the client closes it or goes idle.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<DnsRequestHandler>,
) {
    loop {
        let len = match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_u16()).await {
            Ok(Ok(len)) => len as usize,
            Ok(Err(_)) => return,
            Err(_) => {
                debug!(client = %peer, "TCP connection idle, closing");
                return;
            }
        };
        if len == 0 {
            return;
        }

        let mut request = vec![0u8; len];
        if stream.read_exact(&mut request).await.is_err() {
            return;
        }

        let Some(response) = handler.handle(&request, MAX_TCP_MESSAGE_SIZE).await else {
            continue;
        };

        if stream.write_u16(response.len() as u16).await.is_err() {
            return;
        }
        if stream.write_all(&response).await.is_err() {
            return;
        }
    }
}

fn create_udp_socket(socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain_for(socket_addr), Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain_for(socket_addr), Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}

fn domain_for(socket_addr: SocketAddr) -> Domain {
    if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}
