//! Leaf operations: typed handler functions behind a uniform calling convention.
//!
//! Any `Fn(A1, .., An) -> R` whose arguments implement [`Argument`] and whose
//! result implements [`IntoOutput`] converts into an [`Operation`]. The
//! parameter list (and therefore the arity used for overload selection) is
//! read off the signature when the controller table is built.

use std::fmt;

use crate::binder::{ParameterReader, bind};
use crate::command::IntoOutput;
use crate::context::CommandContext;
use crate::error::Result;
use crate::types::{Argument, BoundValue, ParamType, TypeParsers};

use super::Tag;

type OperationFn = Box<dyn Fn(Vec<Option<BoundValue>>) -> Result<String> + Send + Sync>;

/// A handler function that can become an [`Operation`].
///
/// `Args` is the tuple of the function's argument types; it only exists to
/// keep the per-arity implementations apart.
pub trait IntoOperation<Args>: Send + Sync + 'static {
    fn params() -> Vec<ParamType>;

    fn into_handler(self) -> OperationFn;
}

macro_rules! impl_into_operation {
    ($($ty:ident $var:ident),*) => {
        impl<F, R, $($ty,)*> IntoOperation<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoOutput,
            $($ty: Argument,)*
        {
            fn params() -> Vec<ParamType> {
                vec![$($ty::param_type()),*]
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn into_handler(self) -> OperationFn {
                Box::new(move |bound| {
                    let mut bound = bound.into_iter();
                    let mut index = 0usize;
                    $(
                        let $var = $ty::from_bound(bound.next().flatten(), index)?;
                        index += 1;
                    )*
                    self($($var),*).into_output()
                })
            }
        }
    };
}

impl_into_operation!();
impl_into_operation!(A1 a1);
impl_into_operation!(A1 a1, A2 a2);
impl_into_operation!(A1 a1, A2 a2, A3 a3);
impl_into_operation!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_into_operation!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_into_operation!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_into_operation!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_into_operation!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// One tagged operation of a controller scope.
pub struct Operation {
    name: String,
    declared_name: String,
    is_default: bool,
    params: Vec<ParamType>,
    handler: OperationFn,
}

impl Operation {
    pub fn new<H, Args>(tag: &Tag, declared_name: &str, handler: H) -> Self
    where
        H: IntoOperation<Args>,
    {
        Self {
            name: tag.effective_name(declared_name).to_string(),
            declared_name: declared_name.to_string(),
            is_default: tag.is_default(),
            params: H::params(),
            handler: handler.into_handler(),
        }
    }

    /// The name path segments are matched against.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Number of positional tokens the signature asks for.
    pub fn arity(&self) -> usize {
        self.params.iter().filter(|p| p.takes_token()).count()
    }

    /// `name <type> <type>`, flags parameters left out.
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .filter(|p| p.takes_token())
            .fold(self.name.clone(), |mut sig, p| {
                sig.push_str(&format!(" <{p}>"));
                sig
            })
    }

    /// Bind the context's parameters to the signature and call the handler.
    pub fn invoke(&self, context: &CommandContext, parsers: &TypeParsers) -> Result<String> {
        let mut reader = ParameterReader::new(context, parsers);
        let bound = bind(&self.params, &mut reader)?;
        (self.handler)(bound)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("declared_name", &self.declared_name)
            .field("is_default", &self.is_default)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
