#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::info;
use poem::listener::{Acceptor, Listener, TcpListener};
use poem::Route;
use poem_openapi::OpenApiService;

// Hello Utilities
use crate::api::greeting::GreetingApi;
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx};
use crate::utils::errors::Errors;

// Modules
mod api;
mod utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "HelloServer"; // for poem logging
const API_TITLE   : &str = "Hello Server";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't resolve our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Hello ---------------
    // Announce ourselves.
    println!("Starting hello_server!");

    // Initialize the server.
    hello_init();

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let hello_url = format!("http://{}:{}",
        RUNTIME_CTX.parms.config.http_addr,
        RUNTIME_CTX.parms.config.http_port);

    // Create the routes.
    let app = build_app(hello_url);

    // Bind the listening socket.  A bind failure, such as the port already
    // being occupied, propagates out of main and aborts the process.
    let addr = format!("{}:{}",
        RUNTIME_CTX.parms.config.http_addr,
        RUNTIME_CTX.parms.config.http_port);
    let acceptor = TcpListener::bind(addr).into_acceptor().await?;

    // Report the resolved port on stdout.  When port 0 is requested the
    // kernel chooses the port, so we read it back from the acceptor.
    let port = resolved_port(&acceptor, RUNTIME_CTX.parms.config.http_port);
    println!("✅ Server running on port {}", port);

    // ------------------ Main Loop -------------------
    poem::Server::new_with_acceptor(acceptor)
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// hello_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems other than those needed to configure the main
 * loop processor.
 */
fn hello_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of the
    // runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// build_app:
// ---------------------------------------------------------------------------
/** Assemble the route table.  The single OpenAPI endpoint is nested at the
 * root, so every unmatched path falls through to poem's 404 response.
 */
fn build_app(server_url: String) -> Route {
    let api_service =
        OpenApiService::new(GreetingApi, API_TITLE,
                            option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))
        .server(server_url);
    Route::new().nest("/", api_service)
}

// ---------------------------------------------------------------------------
// resolved_port:
// ---------------------------------------------------------------------------
/** Read the actual bound port back from the acceptor, falling back to the
 * configured port when the acceptor reports no socket address.
 */
fn resolved_port<A: Acceptor>(acceptor: &A, fallback: u16) -> u16 {
    acceptor.local_addr()
        .first()
        .and_then(|a| a.as_socket_addr().map(|s| s.port()))
        .unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("Running hello_server version {}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"));
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use poem::http::StatusCode;
    use poem::listener::{Listener, TcpListener};
    use poem::test::TestClient;

    use crate::api::greeting::GREETING;
    use crate::{build_app, resolved_port};

    fn test_app() -> poem::Route {
        build_app("http://localhost:3000".to_string())
    }

    #[tokio::test]
    async fn get_root_returns_greeting() {
        let cli = TestClient::new(test_app());
        let resp = cli.get("/").send().await;
        resp.assert_status_is_ok();
        resp.assert_text(GREETING).await;
    }

    #[tokio::test]
    async fn other_paths_return_404() {
        let cli = TestClient::new(test_app());
        let resp = cli.get("/anything-else").send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_to_root_is_not_ok() {
        // Only GET is routed on the root path.
        let cli = TestClient::new(test_app());
        let resp = cli.post("/").send().await;
        resp.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn bind_reports_resolved_port() {
        // Port 0 asks the kernel for an ephemeral port.
        let acceptor = TcpListener::bind("127.0.0.1:0")
            .into_acceptor().await.unwrap();
        assert_ne!(resolved_port(&acceptor, 0), 0);
    }

    #[tokio::test]
    async fn second_bind_on_same_port_fails() {
        let first = TcpListener::bind("127.0.0.1:0")
            .into_acceptor().await.unwrap();
        let port = resolved_port(&first, 0);
        let second = TcpListener::bind(format!("127.0.0.1:{}", port))
            .into_acceptor().await;
        assert!(second.is_err());
    }
}
