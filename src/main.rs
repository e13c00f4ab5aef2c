use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

use twopc_kv::coordinator::client::{HttpCoordinator, HttpParticipant};
use twopc_kv::coordinator::handlers::{
    CoordinatorState, handle_broadcast_commit, handle_broadcast_delete, handle_broadcast_prepare,
    handle_broadcast_put, handle_register,
};
use twopc_kv::coordinator::protocol::{
    ENDPOINT_BROADCAST_COMMIT, ENDPOINT_BROADCAST_DELETE, ENDPOINT_BROADCAST_PREPARE,
    ENDPOINT_BROADCAST_PUT, ENDPOINT_REGISTER,
};
use twopc_kv::coordinator::roster::load_roster;
use twopc_kv::coordinator::service::Coordinator;
use twopc_kv::participant::handlers::{
    handle_apply_delete, handle_apply_put, handle_command, handle_get, handle_get_busy,
    handle_set_busy, handle_set_idle, handle_vote_commit, handle_vote_prepare,
};
use twopc_kv::participant::protocol::{
    CommandRequest, CommandResponse, ENDPOINT_APPLY_DELETE, ENDPOINT_APPLY_PUT, ENDPOINT_KV,
    ENDPOINT_REQUEST, ENDPOINT_STATE_BUSY, ENDPOINT_STATE_IDLE, ENDPOINT_VOTE_COMMIT,
    ENDPOINT_VOTE_PREPARE,
};
use twopc_kv::participant::service::Participant;
use twopc_kv::participant::vote::AutoApprove;
use twopc_kv::store::persistence::load_snapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "coordinator" => run_coordinator(&args[2..]).await,
        "participant" => run_participant(&args[2..]).await,
        "client" => run_client(&args[2..]).await,
        other => {
            eprintln!("Unknown role '{}'", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} coordinator --bind <addr:port> [--roster <file>]",
        program
    );
    eprintln!(
        "  {} participant --bind <addr:port> --coordinator <addr:port> [--data <file>]",
        program
    );
    eprintln!("  {} client <participant-addr:port>...", program);
}

async fn run_coordinator(args: &[String]) -> anyhow::Result<()> {
    let mut bind_addr: Option<SocketAddr> = None;
    let mut roster_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--roster" => {
                roster_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    tracing::info!("Starting coordinator on {}", bind_addr);

    let coordinator = Coordinator::new();
    let state = CoordinatorState::new(coordinator.clone(), roster_path.clone());

    // Reconnect to participants known from a previous run
    if let Some(path) = &roster_path {
        let addrs = load_roster(path)?;
        let mut addresses = state.addresses.write().await;
        for addr in addrs {
            coordinator
                .add_participant(Arc::new(HttpParticipant::new(addr)))
                .await;
            addresses.push(addr);
        }
    }

    let app = Router::new()
        .route(ENDPOINT_REGISTER, post(handle_register))
        .route(ENDPOINT_BROADCAST_PREPARE, post(handle_broadcast_prepare))
        .route(ENDPOINT_BROADCAST_COMMIT, post(handle_broadcast_commit))
        .route(ENDPOINT_BROADCAST_PUT, post(handle_broadcast_put))
        .route(ENDPOINT_BROADCAST_DELETE, post(handle_broadcast_delete))
        .layer(Extension(state));

    tracing::info!("Coordinator is setup and ready to go");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_participant(args: &[String]) -> anyhow::Result<()> {
    let mut bind_addr: Option<SocketAddr> = None;
    let mut coordinator_addr: Option<SocketAddr> = None;
    let mut data_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--coordinator" => {
                coordinator_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--data" => {
                data_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let coordinator_addr = coordinator_addr.expect("--coordinator is required");
    let data_path =
        data_path.unwrap_or_else(|| PathBuf::from(format!("kv_store_{}.json", bind_addr.port())));

    tracing::info!(
        "Starting participant on {} (coordinator {})",
        bind_addr,
        coordinator_addr
    );

    let store = load_snapshot(&data_path)?;
    let coordinator = Arc::new(HttpCoordinator::new(coordinator_addr));
    let participant = Participant::new(
        store,
        Arc::new(AutoApprove),
        coordinator.clone(),
        Some(data_path),
    );

    let app = Router::new()
        .route(ENDPOINT_REQUEST, post(handle_command))
        .route(ENDPOINT_VOTE_PREPARE, post(handle_vote_prepare))
        .route(ENDPOINT_VOTE_COMMIT, post(handle_vote_commit))
        .route(&format!("{}/:key", ENDPOINT_KV), get(handle_get))
        .route(ENDPOINT_APPLY_PUT, post(handle_apply_put))
        .route(ENDPOINT_APPLY_DELETE, post(handle_apply_delete))
        .route(
            ENDPOINT_STATE_BUSY,
            get(handle_get_busy).post(handle_set_busy),
        )
        .route(ENDPOINT_STATE_IDLE, post(handle_set_idle))
        .layer(Extension(participant));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    let registered = coordinator.register(bind_addr).await?;
    tracing::info!(
        "Registered with coordinator ({} participant(s) in roster)",
        registered
    );

    tracing::info!("Participant ready at {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_client(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        eprintln!("At least one participant address is required");
        std::process::exit(1);
    }

    let participants: Vec<SocketAddr> = args
        .iter()
        .map(|arg| arg.parse())
        .collect::<Result<_, _>>()?;
    let client = reqwest::Client::new();

    println!("All valid request formats (tab separated):");
    println!("  server_i\tGET\tkey");
    println!("  server_i\tPUT\tkey\tvalue");
    println!("  server_i\tDELETE\tkey");
    println!("  STOP");
    println!();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        println!("REQ to send:");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        // Bare STOP goes to the first participant and ends the session
        if line.eq_ignore_ascii_case("stop") {
            send_command(&client, participants[0], "STOP").await;
            break;
        }

        let Some((server, command)) = parse_target(&line) else {
            eprintln!(
                "Please prefix the request with server_i (i from 1 to {})",
                participants.len()
            );
            continue;
        };
        if server == 0 || server > participants.len() {
            eprintln!(
                "Please specify a number from 1 to {} which is the current number of servers",
                participants.len()
            );
            continue;
        }

        send_command(&client, participants[server - 1], command).await;
    }

    Ok(())
}

/// Splits `server_i<TAB>command` into the 1-based server index and the
/// remaining command text.
fn parse_target(line: &str) -> Option<(usize, &str)> {
    let rest = line.strip_prefix("server_")?;
    let (number, command) = rest.split_once('\t')?;
    let server: usize = number.trim().parse().ok()?;
    Some((server, command.trim()))
}

async fn send_command(client: &reqwest::Client, addr: SocketAddr, command: &str) {
    let url = format!("http://{}{}", addr, ENDPOINT_REQUEST);
    let result = client
        .post(url)
        .json(&CommandRequest {
            command: command.to_string(),
        })
        .send()
        .await;

    match result {
        Ok(response) => match response.json::<CommandResponse>().await {
            Ok(body) => match (body.response, body.error) {
                (Some(response), _) => println!("RES: {}", response),
                (None, Some(error)) => println!("ERR: {}", error),
                (None, None) => println!("ERR: empty response"),
            },
            Err(err) => eprintln!("Failed to decode response from {}: {}", addr, err),
        },
        Err(err) => eprintln!("Failed to reach participant {}: {}", addr, err),
    }
}
