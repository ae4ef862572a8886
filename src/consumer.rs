use crate::Event;

/// A trait that defines the behavior of an event consumer.
///
/// An event consumer is a handler the [`Dispatcher`](crate::Dispatcher) calls for every published
/// event matching the type it was subscribed under. Consumers run synchronously on the publishing
/// thread; returning an error aborts the rest of that `publish` call.
///
/// Consumers are shared behind `Arc`, so state they keep needs interior mutability.
pub trait EventConsumer: Send + Sync {
    /// A name used in logs and in [`MentcareError::Handler`](crate::MentcareError::Handler).
    fn name(&self) -> &str;

    fn process(&self, event: &Event) -> anyhow::Result<()>;
}

/// Wraps a closure as an [`EventConsumer`].
///
/// ```rust
/// use mentcare_events::{EventConsumer, FnConsumer};
///
/// let printer = FnConsumer::new("printer", |event| {
///     println!("{}", event.event_type());
///     Ok(())
/// });
/// assert_eq!(printer.name(), "printer");
/// ```
pub struct FnConsumer<F> {
    name: String,
    f: F,
}

impl<F> FnConsumer<F>
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EventConsumer for FnConsumer<F>
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, event: &Event) -> anyhow::Result<()> {
        (self.f)(event)
    }
}
