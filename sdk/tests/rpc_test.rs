#![cfg(test)]

use std::{
    collections::VecDeque,
    sync::{mpsc, Arc, Mutex},
    thread,
};

use brine_thrift::{
    compile_str, pipe, ApplicationException, ApplicationExceptionKind, BinaryProtocol, CallError, Client,
    HandlerError, LogTransport, MessageIdentifier, MessageType, PipeEnd, Processor, Protocol, Schema, Value,
};

const IDL: &str = r#"
enum RelationshipStatus { SINGLE, DATING, ENGAGED, MARRIED, ITS_COMPLICATED }

struct Healthcheck {
    1: bool ok,
    2: string message
}

struct UserRelationship {
    1: i32 user,
    2: RelationshipStatus status
}

exception RockTooHard {
    1: i32 volume
}

service Health {
    Healthcheck check(),
    i32 volume_up() throws (1: RockTooHard exc),
    oneway void make_bitcoins(1: i32 amount),
    i32 add(1: i32 a, 2: i32 b),
    UserRelationship user_relationship(1: i32 user),
    void set_user_relationship(1: UserRelationship relationship),
    bool echo(1: bool value),
    i32 broken(),
    i32 failing(),
    i32 unhandled()
}
"#;

fn schema() -> Arc<Schema> {
    Arc::new(compile_str(IDL).expect("compile failed"))
}

/// `make_bitcoins` blocks until `gate` yields, then reports on `events`.
fn processor(schema: Arc<Schema>, events: mpsc::Sender<String>, gate: mpsc::Receiver<()>) -> Processor {
    let mut processor = Processor::new(schema, "Health");
    let bitcoins = events.clone();
    let gate = Mutex::new(gate);
    processor
        .register("check", |_| {
            Ok(Some(Value::new_struct("Healthcheck", vec![
                ("ok", Value::Bool(true)),
                ("message", Value::from("all good")),
            ])))
        })
        .register("volume_up", |_| {
            Err(HandlerError::Declared(Value::new_struct("RockTooHard", vec![("volume", Value::I32(11))])))
        })
        .register("make_bitcoins", move |args| {
            let amount: i32 = args.value(0)?;
            gate.lock().unwrap().recv().map_err(HandlerError::failed)?;
            bitcoins.send(format!("bitcoins {}", amount)).map_err(HandlerError::failed)?;
            Ok(None)
        })
        .register("add", |args| {
            let a: i32 = args.value(0)?;
            let b: i32 = args.value(1)?;
            Ok(Some(Value::I32(a + b)))
        })
        .register("user_relationship", |args| {
            let user: i32 = args.value(0)?;
            Ok(Some(Value::new_struct("UserRelationship", vec![
                ("user", Value::I32(user)),
                ("status", Value::I32(4)),
            ])))
        })
        .register("set_user_relationship", move |args| {
            let relationship = args.named("relationship").ok_or_else(|| HandlerError::failed("no relationship"))?;
            let status = relationship.get("status").map_or("", Value::as_string);
            events.send(format!("status {}", status)).map_err(HandlerError::failed)?;
            Ok(None)
        })
        .register("echo", |args| Ok(args.get(0).cloned()))
        .register("broken", |_| Ok(Some(Value::from("not a number"))))
        .register("failing", |_| Err(HandlerError::failed("database is down")));
    processor
}

struct Harness {
    client: Client<BinaryProtocol<LogTransport<PipeEnd>>>,
    server: thread::JoinHandle<Result<(), brine_thrift::ProcessError>>,
    events: mpsc::Receiver<String>,
    release: mpsc::Sender<()>,
}

fn start() -> Harness {
    let schema = schema();
    let (client_end, server_end) = pipe();
    let (tx, events) = mpsc::channel();
    let (release, gate) = mpsc::channel();
    let processor = processor(Arc::clone(&schema), tx, gate);

    let server = thread::spawn(move || {
        let mut protocol = BinaryProtocol::new(LogTransport::new("server", server_end));
        processor.serve_duplex(&mut protocol)
    });
    let client = Client::new(schema, "Health", BinaryProtocol::new(LogTransport::new("client", client_end)));

    Harness { client, server, events, release }
}

impl Harness {
    fn shutdown(self) {
        drop(self.client);
        self.server.join().unwrap().unwrap();
    }
}

#[test]
fn test_check() {
    let mut h = start();
    let result = h.client.call("check", vec![]).unwrap().unwrap();
    assert_eq!(result.get("ok"), Some(&Value::Bool(true)));
    assert_eq!(result.get("message").map(Value::as_string), Some("all good"));
    h.shutdown();
}

#[test]
fn test_declared_exception() {
    let mut h = start();
    match h.client.call("volume_up", vec![]) {
        Err(CallError::Declared(exc)) => {
            assert!(matches!(exc, Value::Struct(ref name, _) if name == "RockTooHard"));
            assert_eq!(exc.get("volume"), Some(&Value::I32(11)));
        }
        other => panic!("unexpected {:?}", other),
    }
    h.shutdown();
}

#[test]
fn test_oneway_does_not_wait_for_a_reply() {
    let mut h = start();
    // The handler is still blocked when the call returns.
    assert_eq!(h.client.call("make_bitcoins", vec![Value::I32(3)]).unwrap(), None);
    assert!(h.events.try_recv().is_err());

    h.release.send(()).unwrap();
    assert_eq!(h.events.recv().unwrap(), "bitcoins 3");
    // The next call is answered even though the oneway call produced no reply.
    assert_eq!(h.client.call("add", vec![Value::I32(1), Value::I32(1)]).unwrap(), Some(Value::I32(2)));
    h.shutdown();
}

#[test]
fn test_arguments_are_coerced() {
    let mut h = start();
    let sum = h.client.call("add", vec![Value::I32(3), Value::from("4")]).unwrap();
    assert_eq!(sum, Some(Value::I32(7)));
    h.shutdown();
}

#[test]
fn test_enums_travel_as_codes() {
    let mut h = start();

    let relationship = h.client.call("user_relationship", vec![Value::I32(7)]).unwrap().unwrap();
    assert_eq!(
        relationship.get("status"),
        Some(&Value::new_enum("RelationshipStatus", "ITS_COMPLICATED"))
    );

    let update = Value::new_struct("UserRelationship", vec![("user", Value::I32(7)), ("status", Value::I32(1))]);
    assert_eq!(h.client.call("set_user_relationship", vec![update]).unwrap(), None);
    assert_eq!(h.events.recv().unwrap(), "status DATING");
    h.shutdown();
}

#[test]
fn test_false_is_not_absent() {
    let mut h = start();
    assert_eq!(h.client.call("echo", vec![Value::Bool(false)]).unwrap(), Some(Value::Bool(false)));
    assert_eq!(h.client.call("echo", vec![]).unwrap(), None);
    h.shutdown();
}

#[test]
fn test_unknown_method() {
    let mut h = start();
    match h.client.call("unhandled", vec![]) {
        Err(CallError::Application(exc)) => assert_eq!(exc.kind, ApplicationExceptionKind::UnknownMethod),
        other => panic!("unexpected {:?}", other),
    }
    // The connection survives.
    assert_eq!(h.client.call("add", vec![Value::I32(2), Value::I32(2)]).unwrap(), Some(Value::I32(4)));
    h.shutdown();
}

#[test]
fn test_handler_failures_are_internal_errors() {
    let mut h = start();
    for function in ["broken", "failing"] {
        match h.client.call(function, vec![]) {
            Err(CallError::Application(exc)) => assert_eq!(exc.kind, ApplicationExceptionKind::InternalError),
            other => panic!("unexpected {:?} from {}", other, function),
        }
    }
    h.shutdown();
}

#[test]
fn test_client_side_errors() {
    let mut h = start();
    assert!(matches!(
        h.client.call("nope", vec![]),
        Err(CallError::UnknownFunction { ref function, .. }) if function == "nope"
    ));
    assert!(matches!(
        h.client.call("add", vec![Value::I32(1), Value::I32(2), Value::I32(3)]),
        Err(CallError::Codec(_))
    ));
    assert!(matches!(
        h.client.call("add", vec![Value::from("three"), Value::I32(2)]),
        Err(CallError::Codec(_))
    ));
    h.shutdown();
}

#[test]
fn test_process_with_separate_streams() {
    let schema = schema();
    let (tx, _events) = mpsc::channel();
    let (_release, gate) = mpsc::channel();
    let processor = processor(Arc::clone(&schema), tx, gate);

    let mut input = BinaryProtocol::new(VecDeque::new());
    input.write_message_begin(&MessageIdentifier::new("nope", MessageType::Call, 9)).unwrap();
    input.write_struct_begin("nope_args").unwrap();
    input.write_field_stop().unwrap();
    input.write_struct_end().unwrap();
    input.write_message_end().unwrap();

    let mut output = BinaryProtocol::new(VecDeque::new());
    assert!(processor.process(&mut input, &mut output).unwrap());

    let id = output.read_message_begin().unwrap();
    assert_eq!(id.name, "nope");
    assert_eq!(id.message_type, MessageType::Exception);
    assert_eq!(id.sequence_id, 9);
    let exc = ApplicationException::read(&mut output).unwrap();
    assert_eq!(exc.kind, ApplicationExceptionKind::UnknownMethod);

    // Nothing left to read.
    assert!(processor.process(&mut input, &mut output).unwrap_err().is_eof());
}

#[test]
fn test_unknown_oneway_gets_no_reply() {
    let schema = schema();
    let (tx, _events) = mpsc::channel();
    let (_release, gate) = mpsc::channel();
    let processor = processor(Arc::clone(&schema), tx, gate);

    let mut input = BinaryProtocol::new(VecDeque::new());
    input.write_message_begin(&MessageIdentifier::new("nope", MessageType::Oneway, 0)).unwrap();
    input.write_struct_begin("nope_args").unwrap();
    input.write_field_stop().unwrap();
    input.write_struct_end().unwrap();
    input.write_message_end().unwrap();

    let mut output = BinaryProtocol::new(VecDeque::new());
    assert!(!processor.process(&mut input, &mut output).unwrap());
    assert!(output.transport().is_empty());
    assert!(input.transport().is_empty());
}
