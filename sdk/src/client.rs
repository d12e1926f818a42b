use std::sync::Arc;

use brine_thrift_schema::{
    Codec, CodecError, FunctionDescriptor, MessageIdentifier, MessageType, Protocol, Schema, Value, WireType,
};

use crate::exception::{ApplicationException, ApplicationExceptionKind, CallError};

/// Calls the functions of one service over a protocol.
///
/// One call is in flight at a time and every message carries sequence id 0.
pub struct Client<P: Protocol> {
    schema:   Arc<Schema>,
    service:  String,
    protocol: P,
}

impl<P: Protocol> Client<P> {
    pub fn new(schema: Arc<Schema>, service: &str, protocol: P) -> Client<P> {
        Client {
            schema,
            service: service.to_owned(),
            protocol,
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    pub fn into_inner(self) -> P {
        self.protocol
    }

    /// Calls `function` with positional arguments.
    ///
    /// Returns the result of a non-void function, or `None` for void and
    /// oneway functions. Oneway calls return as soon as the request is
    /// flushed.
    pub fn call(&mut self, function: &str, args: Vec<Value>) -> Result<Option<Value>, CallError> {
        let schema = Arc::clone(&self.schema);
        let descriptor = self.function(&schema, function)?;
        let codec = Codec::new(&schema);

        let args_def = descriptor.args_struct();
        if args.len() > descriptor.arguments.len() {
            return Err(CallError::Codec(CodecError::mismatch(
                format!("at most {} arguments to {}", descriptor.arguments.len(), function),
                args.len(),
            )));
        }
        let args = Value::new_struct(
            &args_def.name,
            descriptor.arguments.iter().map(|f| f.name.clone()).zip(args),
        );
        let args = codec.prepare_struct(&args_def, &args)?;

        self.protocol
            .write_message_begin(&MessageIdentifier::new(function, MessageType::Call, 0))?;
        codec.write_prepared_struct(&mut self.protocol, &args_def, &args)?;
        self.protocol.write_message_end()?;
        self.protocol.flush()?;

        if descriptor.oneway {
            return Ok(None);
        }
        self.receive(&codec, descriptor)
    }

    fn function<'s>(&self, schema: &'s Schema, function: &str) -> Result<&'s FunctionDescriptor, CallError> {
        schema
            .service(&self.service)
            .and_then(|service| service.function(function))
            .ok_or_else(|| CallError::UnknownFunction {
                service:  self.service.clone(),
                function: function.to_owned(),
            })
    }

    fn receive(&mut self, codec: &Codec, descriptor: &FunctionDescriptor) -> Result<Option<Value>, CallError> {
        let id = self.protocol.read_message_begin()?;
        match id.message_type {
            MessageType::Reply => {}
            MessageType::Exception => {
                let exc = ApplicationException::read(&mut self.protocol)?;
                self.protocol.read_message_end()?;
                return Err(CallError::Application(exc));
            }
            other => {
                self.protocol.skip(WireType::Struct)?;
                self.protocol.read_message_end()?;
                return Err(CallError::Application(ApplicationException::new(
                    ApplicationExceptionKind::InvalidMessageType,
                    format!("Expected a reply to {}, got {:?}", descriptor.name, other),
                )));
            }
        }

        let result = codec.read_struct(&mut self.protocol, &descriptor.result_struct())?;
        self.protocol.read_message_end()?;

        if id.name != descriptor.name {
            return Err(CallError::Application(ApplicationException::new(
                ApplicationExceptionKind::WrongMethodName,
                format!("Expected a reply to {}, got one to {}", descriptor.name, id.name),
            )));
        }

        for field in &descriptor.throws {
            if let Some(exc) = result.get(&field.name) {
                return Err(CallError::Declared(exc.clone()));
            }
        }
        Ok(result.get("success").cloned())
    }
}
