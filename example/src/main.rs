// example/src/main.rs

use std::path::Path;
use std::sync::Arc;
use std::thread;

use brine_thrift::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SERVICE: &str = "HealthService";

/// What the client learned from the server, printed as JSON at the end.
#[derive(Debug, Serialize)]
struct Report {
    ok:       bool,
    message:  String,
    status:   String,
    sum:      i32,
    too_loud: Option<i32>,
}

fn health_processor(schema: Arc<Schema>) -> Processor {
    let mut processor = Processor::new(schema, SERVICE);
    processor
        .register("check", |_| {
            Ok(Some(Value::new_struct("Healthcheck", vec![
                ("ok", Value::Bool(true)),
                ("message", Value::from("still kicking")),
                ("status", Value::from("ALIVE")),
            ])))
        })
        .register("volume_up", |args| {
            let volume: i32 = args.value(0)?;
            if volume > 10 {
                return Err(HandlerError::Declared(Value::new_struct("RockTooHard", vec![
                    ("volume", Value::I32(volume)),
                ])));
            }
            Ok(Some(Value::I32(volume + 1)))
        })
        .register("make_bitcoins", |_| {
            info!("mining");
            Ok(None)
        })
        .register("add", |args| Ok(Some(Value::I32(args.value::<i32>(0)? + args.value::<i32>(1)?))));
    processor
}

fn run() -> Result<Report, Box<dyn std::error::Error>> {
    let idl = Path::new(env!("CARGO_MANIFEST_DIR")).join("health.thrift");
    let schema = Arc::new(compile_file(&idl)?);
    info!(namespace = ?schema.namespace, "compiled {}", idl.display());

    let (client_end, server_end) = pipe();
    let processor = health_processor(Arc::clone(&schema));
    let server = thread::spawn(move || {
        let mut protocol = BinaryProtocol::new(LogTransport::new("server", server_end));
        processor.serve_duplex(&mut protocol)
    });

    let mut client = Client::new(schema, SERVICE, BinaryProtocol::new(LogTransport::new("client", client_end)));

    let check = client
        .call("check", vec![])?
        .ok_or("check returned nothing")?;

    client.call("make_bitcoins", vec![])?;

    let sum = client
        .call("add", vec![Value::I32(3), Value::from("4")])?
        .map_or(0, |v| v.as_i32());

    let too_loud = match client.call("volume_up", vec![Value::I32(11)]) {
        Err(CallError::Declared(exc)) => {
            warn!(exception = ?exc, "the server refused to turn it up");
            exc.get("volume").map(Value::as_i32)
        }
        Ok(_) => None,
        Err(err) => return Err(err.into()),
    };

    drop(client);
    if let Err(err) = server.join().map_err(|_| "server thread panicked")? {
        return Err(err.into());
    }

    Ok(Report {
        ok: check.get("ok").is_some_and(Value::as_bool),
        message: check.get("message").map_or("", Value::as_string).to_owned(),
        status: check.get("status").map_or("", Value::as_string).to_owned(),
        sum,
        too_loud,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    match run() {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("Error: {}", err),
        },
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
