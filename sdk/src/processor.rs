use std::{collections::HashMap, sync::Arc};

use brine_thrift_schema::{
    Codec, CodecError, FromValue, FunctionDescriptor, MessageIdentifier, MessageType, Protocol,
    Schema, Value, WireType,
};
use tracing::{debug, warn};

use crate::exception::{ApplicationException, ApplicationExceptionKind, HandlerError, ProcessError};

/// The decoded arguments of one call, in declaration order. An argument the
/// caller left out is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    names:  Vec<String>,
    values: Vec<Option<Value>>,
}

impl Arguments {
    fn from_struct(function: &FunctionDescriptor, args: &Value) -> Arguments {
        Arguments {
            names:  function.arguments.iter().map(|f| f.name.clone()).collect(),
            values: function.arguments.iter().map(|f| args.get(&f.name).cloned()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position).and_then(Option::as_ref)
    }

    pub fn named(&self, name: &str) -> Option<&Value> {
        let position = self.names.iter().position(|n| n == name)?;
        self.get(position)
    }

    /// Converts the argument at `position`, failing if it is absent.
    pub fn value<T: FromValue>(&self, position: usize) -> Result<T, HandlerError> {
        match self.get(position) {
            Some(value) => Ok(T::from_value(value)?),
            None => {
                let name = self.names.get(position).map_or("?", String::as_str);
                Err(CodecError::MissingField(name.to_owned()).into())
            }
        }
    }
}

pub type Handler = Box<dyn Fn(&Arguments) -> Result<Option<Value>, HandlerError> + Send + Sync>;

/// Where requests are read from and replies written to.
enum Endpoints<'a> {
    Split(&'a mut dyn Protocol, &'a mut dyn Protocol),
    Shared(&'a mut dyn Protocol),
}

impl<'a> Endpoints<'a> {
    fn input(&mut self) -> &mut (dyn Protocol + 'a) {
        match self {
            Endpoints::Split(input, _) => &mut **input,
            Endpoints::Shared(protocol) => &mut **protocol,
        }
    }

    fn output(&mut self) -> &mut (dyn Protocol + 'a) {
        match self {
            Endpoints::Split(_, output) => &mut **output,
            Endpoints::Shared(protocol) => &mut **protocol,
        }
    }
}

/// Serves the functions of one service.
///
/// Handlers are registered by function name. Requests for functions the
/// service does not declare, or that have no handler, are answered with an
/// `UnknownMethod` exception.
pub struct Processor {
    schema:   Arc<Schema>,
    service:  String,
    handlers: HashMap<String, Handler>,
}

impl Processor {
    pub fn new(schema: Arc<Schema>, service: &str) -> Processor {
        Processor {
            schema,
            service: service.to_owned(),
            handlers: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, function: &str, handler: F) -> &mut Processor
    where
        F: Fn(&Arguments) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(function.to_owned(), Box::new(handler));
        self
    }

    /// Handles requests until the peer closes the connection.
    pub fn serve(&self, input: &mut dyn Protocol, output: &mut dyn Protocol) -> Result<(), ProcessError> {
        self.serve_endpoints(Endpoints::Split(input, output))
    }

    /// Like [serve](Processor::serve), reading and replying on one protocol.
    pub fn serve_duplex(&self, protocol: &mut dyn Protocol) -> Result<(), ProcessError> {
        self.serve_endpoints(Endpoints::Shared(protocol))
    }

    /// Handles one request. Returns whether a reply was written.
    pub fn process(&self, input: &mut dyn Protocol, output: &mut dyn Protocol) -> Result<bool, ProcessError> {
        self.process_endpoints(&mut Endpoints::Split(input, output))
    }

    pub fn process_duplex(&self, protocol: &mut dyn Protocol) -> Result<bool, ProcessError> {
        self.process_endpoints(&mut Endpoints::Shared(protocol))
    }

    fn serve_endpoints(&self, mut io: Endpoints<'_>) -> Result<(), ProcessError> {
        loop {
            match self.process_endpoints(&mut io) {
                Ok(_) => {}
                Err(err) if err.is_eof() => {
                    debug!(service = %self.service, "peer closed the connection");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn process_endpoints(&self, io: &mut Endpoints<'_>) -> Result<bool, ProcessError> {
        let id = io.input().read_message_begin()?;

        if !matches!(id.message_type, MessageType::Call | MessageType::Oneway) {
            io.input().skip(WireType::Struct)?;
            io.input().read_message_end()?;
            let exc = ApplicationException::new(
                ApplicationExceptionKind::InvalidMessageType,
                format!("Expected a call, got {:?}", id.message_type),
            );
            self.reply_exception(io.output(), &id, &exc)?;
            return Ok(true);
        }

        let service = self
            .schema
            .service(&self.service)
            .ok_or_else(|| ProcessError::UnknownService(self.service.clone()))?;
        let function = service.function(&id.name);
        let handler = self.handlers.get(&id.name);
        let (function, handler) = match (function, handler) {
            (Some(function), Some(handler)) => (function, handler),
            _ => {
                warn!(service = %self.service, method = %id.name, "unknown method");
                io.input().skip(WireType::Struct)?;
                io.input().read_message_end()?;
                if id.message_type == MessageType::Oneway {
                    return Ok(false);
                }
                let exc = ApplicationException::new(
                    ApplicationExceptionKind::UnknownMethod,
                    format!("Unknown function {}", id.name),
                );
                self.reply_exception(io.output(), &id, &exc)?;
                return Ok(true);
            }
        };

        let codec = Codec::new(&self.schema);
        let args = codec.read_struct(io.input(), &function.args_struct())?;
        io.input().read_message_end()?;

        let outcome = handler(&Arguments::from_struct(function, &args));

        if function.oneway {
            if let Err(err) = outcome {
                warn!(method = %id.name, error = %err, "oneway handler failed");
            }
            return Ok(false);
        }

        let result_def = function.result_struct();
        let result = match outcome {
            Ok(value) => {
                let success = value.filter(|_| function.return_type.is_some());
                Value::new_struct(&result_def.name, success.map(|v| ("success", v)))
            }
            Err(HandlerError::Declared(exc)) => {
                let field = match exc {
                    Value::Struct(ref name, _) => function.throws_field_for(name),
                    _ => None,
                };
                match field {
                    Some(field) => Value::new_struct(&result_def.name, vec![(field.name.clone(), exc)]),
                    None => {
                        warn!(method = %id.name, exception = ?exc, "handler raised an undeclared exception");
                        return self.internal_error(io.output(), &id, format!("Undeclared exception {:?}", exc));
                    }
                }
            }
            Err(HandlerError::Failed(message)) => {
                warn!(method = %id.name, error = %message, "handler failed");
                return self.internal_error(io.output(), &id, message);
            }
        };

        let result = match codec.prepare_struct(&result_def, &result) {
            Ok(result) => result,
            Err(err) => {
                warn!(method = %id.name, error = %err, "handler result does not match the declared type");
                return self.internal_error(io.output(), &id, err.to_string());
            }
        };

        let output = io.output();
        output.write_message_begin(&MessageIdentifier::new(&id.name, MessageType::Reply, id.sequence_id))?;
        codec.write_prepared_struct(output, &result_def, &result)?;
        output.write_message_end()?;
        output.flush()?;
        Ok(true)
    }

    fn internal_error(&self, output: &mut dyn Protocol, id: &MessageIdentifier, message: String) -> Result<bool, ProcessError> {
        let exc = ApplicationException::new(ApplicationExceptionKind::InternalError, message);
        self.reply_exception(output, id, &exc)?;
        Ok(true)
    }

    fn reply_exception(&self, output: &mut dyn Protocol, id: &MessageIdentifier, exc: &ApplicationException) -> Result<(), ProcessError> {
        output.write_message_begin(&MessageIdentifier::new(&id.name, MessageType::Exception, id.sequence_id))?;
        exc.write(output)?;
        output.write_message_end()?;
        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brine_thrift_schema::{FieldDescriptor, Primitive, TypeRef};

    fn add() -> FunctionDescriptor {
        FunctionDescriptor {
            name:        "add".to_owned(),
            return_type: Some(TypeRef::Primitive(Primitive::I32)),
            arguments:   vec![
                FieldDescriptor::new(1, "a", TypeRef::Primitive(Primitive::I32)),
                FieldDescriptor::new(2, "b", TypeRef::Primitive(Primitive::I32)),
            ],
            throws:      vec![],
            oneway:      false,
        }
    }

    #[test]
    fn arguments_are_positional() {
        let args = Value::new_struct("add_args", vec![("b", Value::I32(4))]);
        let args = Arguments::from_struct(&add(), &args);

        assert_eq!(args.len(), 2);
        assert_eq!(args.get(0), None);
        assert_eq!(args.get(1), Some(&Value::I32(4)));
        assert_eq!(args.named("b"), Some(&Value::I32(4)));
        assert_eq!(args.value::<i32>(1), Ok(4));
        assert_eq!(
            args.value::<i32>(0),
            Err(HandlerError::Failed("Missing required field \"a\"".to_owned()))
        );
    }
}
