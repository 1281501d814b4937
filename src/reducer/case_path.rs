//! Lenses into struct fields and case paths into enum variants.

use std::sync::Arc;

/// Mutable focus on one part of a `Root` value.
///
/// Usually built with [`lens!`](crate::lens).
pub struct Lens<Root, Value> {
    get_mut: Arc<dyn Fn(&mut Root) -> &mut Value + Send + Sync>,
}

impl<Root: 'static, Value: 'static> Lens<Root, Value> {
    pub fn new<F>(get_mut: F) -> Self
    where
        F: Fn(&mut Root) -> &mut Value + Send + Sync + 'static,
    {
        Self {
            get_mut: Arc::new(get_mut),
        }
    }
}

impl<Root, Value> Lens<Root, Value> {
    pub fn get_mut<'a>(&self, root: &'a mut Root) -> &'a mut Value {
        (self.get_mut)(root)
    }
}

impl<Root, Value> Clone for Lens<Root, Value> {
    fn clone(&self) -> Self {
        Self {
            get_mut: Arc::clone(&self.get_mut),
        }
    }
}

/// A total `embed` and a partial `extract` between a sum type and one of
/// its cases.
///
/// Usually built with [`case_path!`](crate::case_path).
pub struct CasePath<Root, Value> {
    embed: Arc<dyn Fn(Value) -> Root + Send + Sync>,
    extract: Arc<dyn Fn(Root) -> Option<Value> + Send + Sync>,
}

impl<Root: 'static, Value: 'static> CasePath<Root, Value> {
    pub fn new<E, X>(embed: E, extract: X) -> Self
    where
        E: Fn(Value) -> Root + Send + Sync + 'static,
        X: Fn(Root) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            embed: Arc::new(embed),
            extract: Arc::new(extract),
        }
    }
}

impl<Root, Value> CasePath<Root, Value> {
    pub fn embed(&self, value: Value) -> Root {
        (self.embed)(value)
    }

    pub fn extract(&self, root: Root) -> Option<Value> {
        (self.extract)(root)
    }

    /// Shared handle to the embedding, for re-tagging effect output.
    pub(crate) fn embedder(&self) -> Arc<dyn Fn(Value) -> Root + Send + Sync> {
        Arc::clone(&self.embed)
    }
}

impl<Root, Value> Clone for CasePath<Root, Value> {
    fn clone(&self) -> Self {
        Self {
            embed: Arc::clone(&self.embed),
            extract: Arc::clone(&self.extract),
        }
    }
}

/// Builds a [`Lens`] from a type and a field path.
///
/// ```
/// use velostore::lens;
///
/// struct Garage { settings: Settings }
/// struct Settings { metric: bool }
///
/// let metric = lens!(Garage => settings.metric);
/// let mut garage = Garage { settings: Settings { metric: false } };
/// *metric.get_mut(&mut garage) = true;
/// assert!(garage.settings.metric);
/// ```
#[macro_export]
macro_rules! lens {
    ($root:ty => $($field:tt).+) => {
        $crate::Lens::new(|root: &mut $root| &mut root.$($field).+)
    };
}

/// Builds a [`CasePath`] for an enum variant.
///
/// Single-field variants take the variant path alone; multi-field variants
/// list field names, and the case value becomes a tuple of those fields.
///
/// ```
/// use velostore::case_path;
///
/// #[derive(Debug, PartialEq)]
/// enum Action { Counter(i32), Row(u8, bool), Reset }
///
/// let counter = case_path!(Action::Counter);
/// assert_eq!(counter.extract(Action::Counter(3)), Some(3));
/// assert_eq!(counter.extract(Action::Reset), None);
///
/// let row = case_path!(Action::Row(id, flag));
/// assert_eq!(row.embed((1, true)), Action::Row(1, true));
/// ```
#[macro_export]
macro_rules! case_path {
    ($($variant:ident)::+ ( $($field:ident),+ $(,)? )) => {
        $crate::CasePath::new(
            |($($field),+)| $($variant)::+($($field),+),
            |root| match root {
                $($variant)::+($($field),+) => ::std::option::Option::Some(($($field),+)),
                #[allow(unreachable_patterns)]
                _ => ::std::option::Option::None,
            },
        )
    };
    ($($variant:ident)::+) => {
        $crate::CasePath::new($($variant)::+, |root| match root {
            $($variant)::+(value) => ::std::option::Option::Some(value),
            #[allow(unreachable_patterns)]
            _ => ::std::option::Option::None,
        })
    };
}
