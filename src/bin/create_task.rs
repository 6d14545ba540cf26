use std::path::PathBuf;

use clap::Parser;
use orabridge::client::TaskClient;
use orabridge::task::CreateTaskRequest;

/// Send a create-task request to an orabridge server
#[derive(Parser, Debug)]
#[command(name = "create-task", version, about, long_about = None)]
struct Cli {
  /// Server base URL
  #[arg(long, default_value = "http://127.0.0.1:8900", env = "ORABRIDGE_SERVER")]
  server: String,

  /// JSON file holding the request (taskUUID is generated when missing)
  #[arg(long)]
  request: PathBuf,

  /// Overrides taskName from the request file
  #[arg(long)]
  task_name: Option<String>,
}

fn print_json<T: serde::Serialize>(value: &T) {
  match serde_json::to_string_pretty(value) {
    Ok(s) => println!("{}", s),
    Err(e) => eprintln!("failed to serialize: {}", e),
  }
}

fn load_request(cli: &Cli) -> Result<CreateTaskRequest, String> {
  let raw = std::fs::read_to_string(&cli.request)
    .map_err(|e| format!("failed to read {}: {}", cli.request.display(), e))?;
  let mut req: CreateTaskRequest = serde_json::from_str(&raw)
    .map_err(|e| format!("invalid request {}: {}", cli.request.display(), e))?;
  if req.task_uuid.trim().is_empty() {
    req.task_uuid = uuid::Uuid::new_v4().to_string();
  }
  if let Some(name) = &cli.task_name {
    req.task_name = name.clone();
  }
  Ok(req)
}

async fn cmd_create(cli: &Cli) -> i32 {
  let req = match load_request(cli) { Ok(r) => r, Err(e) => { eprintln!("{}", e); return 2; } };
  let client = match TaskClient::new(&cli.server) { Ok(c) => c, Err(e) => { eprintln!("{}", e); return 3; } };

  match client.create_task(&req).await {
    Ok(envelope) => {
      print_json(&envelope);
      if envelope.is_success() { 0 } else { 1 }
    }
    Err(e) => { eprintln!("{}", e); 3 }
  }
}

#[tokio::main]
async fn main() {
  orabridge::logging::init(&std::env::var("ORABRIDGE_LOG").unwrap_or_else(|_| "warn".to_string()));
  let cli = Cli::parse();
  std::process::exit(cmd_create(&cli).await);
}
