//! Static handler decoration.
//!
//! A [`Decorator`] turns one value into another, typically a [`RequestHandler`](crate::handler::RequestHandler)
//! into a wrapping handler. Every middleware in this crate is a decorator over any inner handler, and any
//! decorator producing a handler can be registered as middleware.

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}

impl<In, D: Decorator<In> + ?Sized> Decorator<In> for &D {
    type Out = D::Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (**self).decorate(raw)
    }
}

/// Two decorators applied as one: `inner` decorates first, `outer` wraps its result.
#[derive(Debug, Clone, Copy)]
pub struct Stacked<Inner, Outer> {
    inner: Inner,
    outer: Outer,
}

/// Stacks `outer` around `inner`, listed outermost first like middleware registration.
///
/// No boxing happens between the two layers, so a stack of middleware registers as a single layer.
pub fn stack<Outer, Inner>(outer: Outer, inner: Inner) -> Stacked<Inner, Outer> {
    Stacked { inner, outer }
}

impl<In, Inner, Outer> Decorator<In> for Stacked<Inner, Outer>
where
    Inner: Decorator<In>,
    Outer: Decorator<Inner::Out>,
{
    type Out = Outer::Out;

    fn decorate(&self, raw: In) -> Self::Out {
        self.outer.decorate(self.inner.decorate(raw))
    }
}

#[derive(Clone, Copy)]
pub struct DecoratorFn<F> {
    f: F,
}

/// Adapts a closure into a decorator
pub fn decorator_fn<In, Out, F>(f: F) -> DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    DecoratorFn { f }
}

impl<In, Out, F> Decorator<In> for DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    type Out = Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (self.f)(raw)
    }
}

impl<F> std::fmt::Debug for DecoratorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratorFn").finish_non_exhaustive()
    }
}
