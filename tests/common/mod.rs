#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::interpreter::Interpreter;

/// `Write` sink whose contents stay readable after the interpreter owns it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter() -> (Interpreter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Interpreter::with_output(Box::new(buffer.clone())), buffer)
}

/// Run `source` in a fresh interpreter, returning printed lines and errors.
pub fn run(source: &str) -> (Vec<String>, Result<(), Vec<LoxError>>) {
    let (mut interpreter, buffer) = interpreter();
    let result = rox::run(&mut interpreter, source);
    (buffer.lines(), result)
}

/// Run `source`, which must succeed, and return what it printed.
pub fn output(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        panic!("program failed: {:?}", messages);
    }
    lines
}

/// Run `source`, which must fail, and return the error messages.
pub fn errors(source: &str) -> Vec<String> {
    match run(source).1 {
        Ok(()) => panic!("program unexpectedly succeeded"),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}

/// The single runtime error raised by `source`.
pub fn runtime_error(source: &str) -> rox::error::RuntimeError {
    match run(source).1 {
        Err(mut errors) if errors.len() == 1 => match errors.remove(0) {
            LoxError::Runtime(e) => e,
            other => panic!("expected a runtime error, got: {}", other),
        },
        Err(errors) => panic!("expected one runtime error, got {}", errors.len()),
        Ok(()) => panic!("program unexpectedly succeeded"),
    }
}
