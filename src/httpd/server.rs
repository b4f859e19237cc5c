use crate::httpd::web_service::WebService;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// Binds the web service and returns the serving future together with the
/// actually bound address (useful with port 0).
pub fn setup_server(
    service: WebService,
    bind_addr: Option<IpAddr>,
    port: u16,
) -> (impl Future<Output = Result<(), hyper::Error>>, IpAddr, u16) {
    let bind_addr = bind_addr.unwrap_or_else(|| IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    let socket_addr = SocketAddr::new(bind_addr, port);
    let service = Arc::new(service);
    let make_service = make_service_fn(move |_conn| {
        let service = service.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let service = service.clone();
                async move { service.handle(req).await }
            }))
        }
    });
    let server = Server::bind(&socket_addr).serve(make_service);
    let port = server.local_addr().port();
    let addr = server.local_addr().ip();
    (server, addr, port)
}
