use crate::{event::Event, registry::Metric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Start,
    Stop,
}

pub trait AliasStrategy {
    fn alias(&self, name: &str, metric: &Metric) -> String;
}
pub trait TagStrategy {
    fn tags(&self, name: &str, metric: &Metric) -> Vec<String>;
}
/// `None` means no event is published for that transition.
pub trait LifecycleEventStrategy {
    fn event(&self, lifecycle: Lifecycle) -> Option<Event>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;
impl AliasStrategy for NoAliases {
    fn alias(&self, name: &str, _metric: &Metric) -> String {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoTags;
impl TagStrategy for NoTags {
    fn tags(&self, _name: &str, _metric: &Metric) -> Vec<String> {
        vec![]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;
impl LifecycleEventStrategy for NoEvents {
    fn event(&self, _lifecycle: Lifecycle) -> Option<Event> {
        None
    }
}

impl<F> AliasStrategy for F
where
    F: Fn(&str, &Metric) -> String,
{
    fn alias(&self, name: &str, metric: &Metric) -> String {
        self(name, metric)
    }
}
impl<F> TagStrategy for F
where
    F: Fn(&str, &Metric) -> Vec<String>,
{
    fn tags(&self, name: &str, metric: &Metric) -> Vec<String> {
        self(name, metric)
    }
}
impl<F> LifecycleEventStrategy for F
where
    F: Fn(Lifecycle) -> Option<Event>,
{
    fn event(&self, lifecycle: Lifecycle) -> Option<Event> {
        self(lifecycle)
    }
}
