use serde_json::Value;

use crate::context::Context;
use crate::error::{Outcome, Result};
use crate::registry::TypeRegistry;

/// A successfully read value and the number of bytes it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    pub size: usize,
}

impl Decoded {
    pub fn new(value: impl Into<Value>, size: usize) -> Self {
        Self {
            value: value.into(),
            size,
        }
    }
}

/// The read / write / sizeOf contract every registered type satisfies.
///
/// `args` are always concrete: placeholders are resolved before a type sees
/// them. `registry` is the registry the call came through, so composite
/// types dispatch nested fields with `registry.read(..)` and friends.
///
/// Contract:
/// - `read` consumes exactly `Decoded::size` bytes starting at `offset`
/// - `write` writes exactly as many bytes as `size_of` reports for the same
///   value, arguments and context, and returns that count
/// - `size_of` has no side effects beyond scoped context bookkeeping
///
/// Faults (the outer `Result`) abort the packet operation. Error values (the
/// inner [`Outcome`]) are returned to the caller, which decides what to do.
pub trait DataType: Send + Sync {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>>;

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>>;

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize>;

    /// Constant wire size, when it does not depend on value or arguments.
    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

type ReadFn = dyn Fn(&TypeRegistry, &[u8], usize, &Value, &mut Context) -> Result<Outcome<Decoded>>
    + Send
    + Sync;
type WriteFn = dyn Fn(
        &TypeRegistry,
        &Value,
        &mut [u8],
        usize,
        &Value,
        &mut Context,
    ) -> Result<Outcome<usize>>
    + Send
    + Sync;
type SizeFn = dyn Fn(&TypeRegistry, &Value, &Value, &mut Context) -> Result<usize> + Send + Sync;

/// Size half of a function triple: a constant or a computation.
pub enum SizeOf {
    Fixed(usize),
    Computed(Box<SizeFn>),
}

impl SizeOf {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&TypeRegistry, &Value, &Value, &mut Context) -> Result<usize> + Send + Sync + 'static,
    {
        Self::Computed(Box::new(f))
    }
}

/// A raw type assembled from three closures.
///
/// Handy for one-off protocol-specific types that do not deserve a struct.
pub struct FnType {
    read: Box<ReadFn>,
    write: Box<WriteFn>,
    size: SizeOf,
}

impl FnType {
    pub fn new<R, W>(read: R, write: W, size: SizeOf) -> Self
    where
        R: Fn(&TypeRegistry, &[u8], usize, &Value, &mut Context) -> Result<Outcome<Decoded>>
            + Send
            + Sync
            + 'static,
        W: Fn(
                &TypeRegistry,
                &Value,
                &mut [u8],
                usize,
                &Value,
                &mut Context,
            ) -> Result<Outcome<usize>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            read: Box::new(read),
            write: Box::new(write),
            size,
        }
    }
}

impl DataType for FnType {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        (self.read)(registry, buf, offset, args, ctx)
    }

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        (self.write)(registry, value, buf, offset, args, ctx)
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        match &self.size {
            SizeOf::Fixed(size) => Ok(*size),
            SizeOf::Computed(f) => f(registry, value, args, ctx),
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.size {
            SizeOf::Fixed(size) => Some(size),
            SizeOf::Computed(_) => None,
        }
    }
}
